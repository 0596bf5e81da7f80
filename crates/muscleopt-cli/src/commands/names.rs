use crate::cli::{GroupsArgs, NamesArgs};
use crate::error::{CliError, Result};
use muscleopt::core::io::settings::SettingsDocument;
use muscleopt::core::model::ModelCatalog;
use muscleopt::core::model::manifest::ModelManifest;
use muscleopt::core::quantity::QuantityKind;
use muscleopt::core::quantity::selection::Selection;
use muscleopt::engine::error::EngineError;
use muscleopt::engine::filter::FilterController;
use std::fmt::Write;
use std::path::Path;
use tracing::info;

pub async fn run_names(args: NamesArgs) -> Result<()> {
    let manifest = load_manifest(&args.model)?;
    let kind = args.kind.kind();

    let selection = match &args.setup {
        Some(path) => {
            let doc = SettingsDocument::read_from_path(path).map_err(EngineError::SettingsLoad)?;
            match kind {
                QuantityKind::Coordinate => doc.muscle_optimizer.coordinates,
                QuantityKind::Muscle => doc.muscle_optimizer.muscles,
            }
        }
        None => Selection::All,
    };

    let mut filter = FilterController::new(manifest.registry(kind));
    filter.selection_mut().mark_selected(&selection);
    if let Some(pattern) = &args.pattern {
        filter.set_pattern_text(pattern)?;
    }
    if let Some(group) = &args.group {
        filter.select_group(&manifest, group)?;
    }

    info!(
        "Listing {} of '{}' with filter '{}'",
        kind.plural(),
        manifest.model_name(),
        filter.compiled_pattern()
    );
    print!("{}", render_names(&filter));
    Ok(())
}

pub async fn run_groups(args: GroupsArgs) -> Result<()> {
    let manifest = load_manifest(&args.model)?;
    print!("{}", render_groups(&manifest));
    Ok(())
}

fn load_manifest(path: &Path) -> Result<ModelManifest> {
    ModelManifest::read_from_path(path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

/// One line per shown name, `[x]` when selected, then a summary line.
fn render_names(filter: &FilterController) -> String {
    let set = filter.selection();
    let mut out = String::new();
    for quantity in set.quantities().iter().filter(|q| q.shown) {
        let mark = if quantity.selected { 'x' } else { ' ' };
        let _ = writeln!(out, "[{mark}] {}", quantity.name);
    }
    let _ = writeln!(
        out,
        "{} shown, {} of {} {} selected ({} hidden)",
        set.count_shown(),
        set.count_selected(),
        set.quantities().len(),
        filter.kind().plural(),
        set.count_selected() - set.count_shown_and_selected(),
    );
    out
}

fn render_groups(catalog: &dyn ModelCatalog) -> String {
    let groups = catalog.group_names();
    if groups.is_empty() {
        return format!("Model '{}' defines no groups.\n", catalog.model_name());
    }
    let width = groups.iter().map(String::len).max().unwrap_or(0);
    let mut out = String::new();
    for group in &groups {
        let members = catalog.group_members(group).map_or(0, |m| m.len());
        let _ = writeln!(out, "{group:<width$}  {members} muscles");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> ModelManifest {
        ModelManifest::from_toml_str(
            r#"
name = "gait2392"
coordinates = ["hip_flexion_r", "hip_rotation_r", "knee_angle_r"]
muscles = ["glut_med1_r", "glut_med2_r", "psoas_r"]

[[group]]
name = "R_hip_abd"
members = ["glut_med1_r", "glut_med2_r"]

[[group]]
name = "R_hip_flex"
members = ["psoas_r"]
"#,
        )
        .unwrap()
    }

    #[test]
    fn render_names_lists_shown_rows_and_hidden_selections() {
        let catalog = manifest();
        let mut filter = FilterController::new(catalog.registry(QuantityKind::Coordinate));
        filter
            .selection_mut()
            .mark_selected(&Selection::subset(["hip_rotation_r", "knee_angle_r"]));
        filter.set_pattern_text("hip").unwrap();

        let rendered = render_names(&filter);

        assert_eq!(
            rendered,
            "[ ] hip_flexion_r\n[x] hip_rotation_r\n2 shown, 2 of 3 coordinates selected (1 hidden)\n"
        );
    }

    #[test]
    fn render_groups_aligns_names_and_counts_members() {
        let rendered = render_groups(&manifest());
        assert_eq!(rendered, "R_hip_abd   2 muscles\nR_hip_flex  1 muscles\n");
    }

    #[test]
    fn render_groups_reports_models_without_groups() {
        let catalog = ModelManifest::from_toml_str("name = \"bare\"").unwrap();
        assert_eq!(render_groups(&catalog), "Model 'bare' defines no groups.\n");
    }
}

use crate::cli::PrintSetupArgs;
use crate::error::{CliError, Result};
use muscleopt::core::model::ModelCatalog;
use muscleopt::core::model::manifest::ModelManifest;
use muscleopt::engine::config::OptimizerSettings;
use muscleopt::engine::error::EngineError;
use std::path::PathBuf;
use tracing::info;

const UNNAMED_MODEL: &str = "model";

pub async fn run(args: PrintSetupArgs) -> Result<()> {
    let written = write_default_setup(&args)?;
    println!("Default settings written to: {}", written.display());
    Ok(())
}

fn write_default_setup(args: &PrintSetupArgs) -> Result<PathBuf> {
    let mut settings = OptimizerSettings::for_model(UNNAMED_MODEL);
    if let Some(manifest_path) = &args.model {
        let manifest =
            ModelManifest::read_from_path(manifest_path).map_err(|e| CliError::FileParsing {
                path: manifest_path.clone(),
                source: e.into(),
            })?;
        settings = OptimizerSettings::for_model(manifest.model_name());
        settings.model_path = manifest.path.clone();
    }

    info!("Writing default settings for '{}'", settings.name);
    settings
        .to_document()
        .write_to_path(&args.output)
        .map_err(|e| CliError::Engine(EngineError::SettingsSave(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use muscleopt::core::io::settings::SettingsDocument;
    use muscleopt::core::quantity::selection::Selection;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn default_setup_round_trips_with_default_values() {
        let dir = tempdir().unwrap();
        let args = PrintSetupArgs {
            output: dir.path().join("setup"),
            model: None,
        };

        let written = write_default_setup(&args).unwrap();
        let doc = SettingsDocument::read_from_path(&written).unwrap();

        assert_eq!(written, dir.path().join("setup.toml"));
        assert_eq!(doc.name, "model-optimized");
        assert_eq!(doc.muscle_optimizer.n_evaluation_points, 10);
        assert_eq!(doc.muscle_optimizer.min_degrees_increment, 2.5);
        assert_eq!(doc.muscle_optimizer.coordinates, Selection::All);
        assert_eq!(doc.reference_model, "Unassigned");
    }

    #[test]
    fn manifest_names_the_optimized_model() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("gait.toml");
        fs::write(&manifest, "name = \"gait2392\"\npath = \"gait2392.osim\"\n").unwrap();
        let args = PrintSetupArgs {
            output: dir.path().join("setup.toml"),
            model: Some(manifest),
        };

        let written = write_default_setup(&args).unwrap();
        let doc = SettingsDocument::read_from_path(&written).unwrap();

        assert_eq!(doc.name, "gait2392-optimized");
        assert_eq!(doc.model, dir.path().join("gait2392.osim").display().to_string());
    }

    #[test]
    fn unreadable_manifest_is_reported_with_its_path() {
        let dir = tempdir().unwrap();
        let args = PrintSetupArgs {
            output: dir.path().join("setup.toml"),
            model: Some(dir.path().join("missing.toml")),
        };

        let result = write_default_setup(&args);

        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}

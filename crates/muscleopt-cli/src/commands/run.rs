use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use crate::optimizer::ProcessOptimizer;
use crate::utils::progress::CliProgressHandler;
use muscleopt::core::model::manifest::ModelManifest;
use muscleopt::core::model::{ModelCatalog, ModelHandle};
use muscleopt::core::quantity::QuantityKind;
use muscleopt::engine::optimizer::ModelOptimizer;
use muscleopt::engine::progress::ProgressReporter;
use muscleopt::workflows::session::OptimizeSession;
use std::sync::Arc;
use tracing::{info, warn};

pub async fn run(args: RunArgs) -> Result<()> {
    info!("Loading model manifest from {:?}", &args.model);
    let manifest =
        ModelManifest::read_from_path(&args.model).map_err(|e| CliError::FileParsing {
            path: args.model.clone(),
            source: e.into(),
        })?;

    let optimizer = ProcessOptimizer::new(args.optimizer.clone(), manifest.path.clone())?;
    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_sink(progress_handler.sink());
    let mut session = OptimizeSession::new(manifest, optimizer, reporter);

    let outcome = match prepare(&mut session, &args) {
        Ok(()) => execute(&session).await,
        Err(e) => Err(e),
    };
    session.dispose();

    let model = outcome?;
    match &model.path {
        Some(path) => println!(
            "✓ Optimized model '{}' written to: {}",
            model.name,
            path.display()
        ),
        None => println!("✓ Optimized model '{}' is ready.", model.name),
    }
    Ok(())
}

/// Loads the settings into the session and applies the command-line overrides.
fn prepare<C: ModelCatalog, O: ModelOptimizer>(
    session: &mut OptimizeSession<C, O>,
    args: &RunArgs,
) -> Result<()> {
    session.load_settings(&args.setup)?;

    let narrowing = [
        (QuantityKind::Coordinate, args.coordinates_pattern.as_deref()),
        (QuantityKind::Muscle, args.muscles_pattern.as_deref()),
    ];
    for (kind, pattern) in narrowing {
        if let Some(pattern) = pattern {
            narrow_selection(session, kind, pattern, args.select_shown)?;
        }
    }

    if let Some(output) = &args.output {
        session.configuration().set_output_model(Some(output.clone()));
    }

    for kind in QuantityKind::ALL {
        let selected = session.filter(kind).selection().count_selected();
        info!("{} {} selected for the run.", selected, kind.plural());
        if selected == 0 {
            warn!("No {} are selected.", kind.plural());
        }
    }
    Ok(())
}

/// Drops selected names hidden by `pattern`; with `select_shown` every shown name is
/// selected as well.
fn narrow_selection<C: ModelCatalog, O: ModelOptimizer>(
    session: &mut OptimizeSession<C, O>,
    kind: QuantityKind,
    pattern: &str,
    select_shown: bool,
) -> Result<()> {
    session.set_pattern(kind, pattern)?;
    let hidden: Vec<String> = session
        .filter(kind)
        .selection()
        .quantities()
        .iter()
        .filter(|q| q.selected && !q.shown)
        .map(|q| q.name.clone())
        .collect();
    for name in &hidden {
        session.toggle(kind, name, false);
    }
    if select_shown {
        session.select_shown(kind, true);
    }
    Ok(())
}

async fn execute<C: ModelCatalog, O: ModelOptimizer>(
    session: &OptimizeSession<C, O>,
) -> Result<Arc<ModelHandle>> {
    let Some(run) = session.execute()? else {
        return Err(CliError::Argument(
            "the optimizer is already running or nothing changed".to_string(),
        ));
    };

    let wait = run.wait();
    tokio::pin!(wait);
    let result = tokio::select! {
        result = &mut wait => result,
        Ok(()) = tokio::signal::ctrl_c() => {
            session.request_cancel();
            (&mut wait).await
        }
    };
    Ok(result?)
}

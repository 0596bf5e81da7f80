use muscleopt::core::io::settings;
use muscleopt::core::model::ModelHandle;
use muscleopt::engine::config::ToolSnapshot;
use muscleopt::engine::error::EngineError;
use muscleopt::engine::optimizer::ModelOptimizer;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use tracing::{debug, error, info, warn};

/// Runs an external optimizer executable once per run.
///
/// Each run gets its own settings file in a scratch directory; the program is called
/// as `<program> -S <settings>`. A run succeeds when the program exits with status 0
/// and, if an output model file is configured, that file exists afterwards.
pub struct ProcessOptimizer {
    program: PathBuf,
    model_path: Option<PathBuf>,
    scratch: Mutex<Option<TempDir>>,
    runs: AtomicUsize,
}

impl ProcessOptimizer {
    /// `model_path` is used when the settings do not name an input model.
    pub fn new(program: PathBuf, model_path: Option<PathBuf>) -> std::io::Result<Self> {
        let scratch = tempfile::Builder::new().prefix("muscleopt-").tempdir()?;
        debug!("Optimizer scratch directory: {:?}", scratch.path());
        Ok(Self {
            program,
            model_path,
            scratch: Mutex::new(Some(scratch)),
            runs: AtomicUsize::new(0),
        })
    }

    fn write_run_settings(
        &self,
        model: &ModelHandle,
        reference: &Path,
        snapshot: &ToolSnapshot,
    ) -> Result<PathBuf, String> {
        let guard = self
            .scratch
            .lock()
            .map_err(|_| "scratch directory lock poisoned".to_string())?;
        let scratch = guard
            .as_ref()
            .ok_or_else(|| "optimizer was already released".to_string())?;

        let run = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
        let mut doc = snapshot.settings.to_document();
        doc.model = settings::path_property(model.path.as_deref());
        doc.reference_model = reference.display().to_string();

        let path = scratch.path().join(format!("run{run}_Setup_MuscleOptimize.toml"));
        doc.write_to_path(&path).map_err(|e| e.to_string())
    }
}

impl ModelOptimizer for ProcessOptimizer {
    fn working_copy(&self, snapshot: &ToolSnapshot) -> Result<ModelHandle, EngineError> {
        let source = snapshot
            .settings
            .model_path
            .clone()
            .or_else(|| self.model_path.clone())
            .ok_or_else(|| EngineError::Setup("no input model file is configured".to_string()))?;
        if !source.exists() {
            return Err(EngineError::Setup(format!(
                "input model file '{}' does not exist",
                source.display()
            )));
        }
        Ok(ModelHandle::new(snapshot.settings.name.clone(), Some(source)))
    }

    fn process_model(
        &self,
        model: &mut ModelHandle,
        reference: &Path,
        snapshot: &ToolSnapshot,
    ) -> bool {
        let settings_path = match self.write_run_settings(model, reference, snapshot) {
            Ok(path) => path,
            Err(e) => {
                error!("Could not prepare the optimizer settings: {}", e);
                return false;
            }
        };

        info!(
            "Invoking {} -S {}",
            self.program.display(),
            settings_path.display()
        );
        match Command::new(&self.program).arg("-S").arg(&settings_path).status() {
            Ok(status) if status.success() => {}
            Ok(status) => {
                warn!("Optimizer exited with {}", status);
                return false;
            }
            Err(e) => {
                error!("Failed to start optimizer '{}': {}", self.program.display(), e);
                return false;
            }
        }

        if let Some(output) = &snapshot.settings.output_model {
            if !output.exists() {
                warn!(
                    "Optimizer reported success but '{}' was not written",
                    output.display()
                );
                return false;
            }
            model.path = Some(output.clone());
        }
        true
    }

    fn release(&self) {
        if let Ok(mut scratch) = self.scratch.lock() {
            if let Some(dir) = scratch.take() {
                debug!("Removing optimizer scratch directory {:?}", dir.path());
            }
        }
    }
}

use super::config::{ConfigChange, ToolConfiguration, ToolSnapshot};
use super::error::EngineError;
use super::lock;
use super::optimizer::ModelOptimizer;
use super::progress::{Progress, ProgressReporter};
use crate::core::model::ModelHandle;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Idle,
    Running,
    CancelRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    Rejected,
    Cancelled,
    Panicked,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Rejected => write!(f, "the optimizer reported failure"),
            FailureReason::Cancelled => write!(f, "the run was cancelled"),
            FailureReason::Panicked => write!(f, "the optimizer panicked"),
        }
    }
}

#[derive(Debug)]
struct Lifecycle {
    state: ExecutionState,
    dispose_requested: bool,
    released: bool,
}

struct Shared<O> {
    optimizer: O,
    configuration: Arc<Mutex<ToolConfiguration>>,
    lifecycle: Mutex<Lifecycle>,
    published: watch::Sender<Option<Arc<ModelHandle>>>,
    reporter: ProgressReporter,
}

/// Runs the optimizer at most once at a time and publishes its result.
///
/// A run is accepted only while idle with a modified configuration. The published
/// model is replaced as a whole on success and never touched on failure.
pub struct ExecutionController<O: ModelOptimizer> {
    shared: Arc<Shared<O>>,
}

/// The background run started by [`ExecutionController::execute`].
#[derive(Debug)]
pub struct RunHandle {
    join: JoinHandle<Result<Arc<ModelHandle>, EngineError>>,
}

impl RunHandle {
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Resolves to the published model, or the reason nothing was published.
    pub async fn wait(self) -> Result<Arc<ModelHandle>, EngineError> {
        self.join
            .await
            .map_err(|e| EngineError::Internal(format!("optimizer task did not complete: {e}")))?
    }
}

impl<O: ModelOptimizer> ExecutionController<O> {
    pub fn new(optimizer: O, configuration: Arc<Mutex<ToolConfiguration>>) -> Self {
        Self::with_progress(optimizer, configuration, ProgressReporter::silent())
    }

    pub fn with_progress(
        optimizer: O,
        configuration: Arc<Mutex<ToolConfiguration>>,
        reporter: ProgressReporter,
    ) -> Self {
        let (published, _) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                optimizer,
                configuration,
                lifecycle: Mutex::new(Lifecycle {
                    state: ExecutionState::Idle,
                    dispose_requested: false,
                    released: false,
                }),
                published,
                reporter,
            }),
        }
    }

    pub fn state(&self) -> ExecutionState {
        lock(&self.shared.lifecycle).state
    }

    pub fn is_executing(&self) -> bool {
        self.state() != ExecutionState::Idle
    }

    pub fn optimizer(&self) -> &O {
        &self.shared.optimizer
    }

    /// The most recently published model, if any run has succeeded.
    pub fn published(&self) -> Option<Arc<ModelHandle>> {
        self.shared.published.borrow().clone()
    }

    pub fn subscribe_published(&self) -> watch::Receiver<Option<Arc<ModelHandle>>> {
        self.shared.published.subscribe()
    }

    /// Starts a run in the background.
    ///
    /// Returns `Ok(None)` without doing anything when a run is in progress, the
    /// configuration is unmodified, or the controller was disposed. Setup errors are
    /// returned before the state leaves [`ExecutionState::Idle`]. Must be called from
    /// within a tokio runtime.
    pub fn execute(&self) -> Result<Option<RunHandle>, EngineError> {
        let mut lifecycle = lock(&self.shared.lifecycle);
        if lifecycle.dispose_requested {
            debug!("Ignoring execute request on a disposed controller.");
            return Ok(None);
        }
        if lifecycle.state != ExecutionState::Idle {
            debug!("Ignoring execute request; a run is already in progress.");
            return Ok(None);
        }
        let snapshot = {
            let configuration = lock(&self.shared.configuration);
            if !configuration.is_dirty() {
                debug!("Ignoring execute request; nothing changed since the last run.");
                return Ok(None);
            }
            configuration.snapshot()
        };

        let runtime = Handle::try_current()
            .map_err(|e| EngineError::Setup(format!("no async runtime available: {e}")))?;
        let reference = match (&snapshot.settings.reference_model, snapshot.settings.enabled) {
            (_, false) => None,
            (Some(reference), true) => Some(reference.clone()),
            (None, true) => return Err(EngineError::MissingReferenceModel),
        };
        let working = self.shared.optimizer.working_copy(&snapshot)?;

        lifecycle.state = ExecutionState::Running;
        drop(lifecycle);

        info!(model = %working.name, revision = snapshot.revision, "Optimizer run started.");
        self.shared.notify_state();
        self.shared.reporter.emit(Progress::RunStarted { model: working.name.clone() });

        let shared = Arc::clone(&self.shared);
        let join = runtime.spawn_blocking(move || shared.run(working, reference, snapshot));
        Ok(Some(RunHandle { join }))
    }

    /// Asks a running optimization to stop. Its outcome becomes a failure.
    pub fn request_cancel(&self) -> bool {
        let mut lifecycle = lock(&self.shared.lifecycle);
        if lifecycle.state != ExecutionState::Running {
            return false;
        }
        lifecycle.state = ExecutionState::CancelRequested;
        drop(lifecycle);

        info!("Cancellation requested for the running optimization.");
        self.shared.notify_state();
        self.shared
            .reporter
            .note("Cancellation requested; waiting for the optimizer to stop...");
        true
    }

    /// Stops accepting runs and releases the optimizer.
    ///
    /// While a run is in progress the release is deferred to its completion.
    pub fn dispose(&self) -> bool {
        let mut lifecycle = lock(&self.shared.lifecycle);
        if lifecycle.dispose_requested {
            return false;
        }
        lifecycle.dispose_requested = true;
        if lifecycle.state != ExecutionState::Idle {
            info!("Disposal deferred until the running optimization completes.");
            return true;
        }
        lifecycle.released = true;
        drop(lifecycle);

        self.shared.optimizer.release();
        debug!("Execution controller disposed.");
        true
    }

    pub fn is_disposed(&self) -> bool {
        lock(&self.shared.lifecycle).released
    }
}

impl<O: ModelOptimizer> Shared<O> {
    #[instrument(skip_all, name = "optimizer_run", fields(model = %working.name))]
    fn run(
        &self,
        mut working: ModelHandle,
        reference: Option<PathBuf>,
        snapshot: ToolSnapshot,
    ) -> Result<Arc<ModelHandle>, EngineError> {
        let outcome = match &reference {
            None => {
                info!("Optimizer step disabled; publishing the working copy unchanged.");
                Ok(())
            }
            Some(reference) => {
                self.reporter.note(format!(
                    "Scaling '{}' against {}",
                    working.name,
                    reference.display()
                ));
                let call = panic::catch_unwind(AssertUnwindSafe(|| {
                    self.optimizer.process_model(&mut working, reference, &snapshot)
                }));
                match call {
                    Ok(true) => Ok(()),
                    Ok(false) => Err(FailureReason::Rejected),
                    Err(_) => {
                        error!("The optimizer panicked during the run.");
                        Err(FailureReason::Panicked)
                    }
                }
            }
        };
        self.finish(outcome, working, snapshot.revision)
    }

    fn finish(
        &self,
        outcome: Result<(), FailureReason>,
        working: ModelHandle,
        revision: u64,
    ) -> Result<Arc<ModelHandle>, EngineError> {
        let mut lifecycle = lock(&self.lifecycle);
        let outcome = if lifecycle.state == ExecutionState::CancelRequested {
            Err(FailureReason::Cancelled)
        } else {
            outcome
        };

        let result = outcome.map(|()| {
            let model = Arc::new(working);
            self.published.send_replace(Some(Arc::clone(&model)));
            if !lock(&self.configuration).mark_executed(revision) {
                info!("Configuration changed during the run; it stays modified.");
            }
            model
        });

        lifecycle.state = ExecutionState::Idle;
        let release = lifecycle.dispose_requested && !lifecycle.released;
        lifecycle.released |= release;
        drop(lifecycle);

        match &result {
            Ok(model) => info!(model = %model.name, "Optimizer run succeeded; model published."),
            Err(reason) => warn!("Optimizer run failed: {}. Nothing was published.", reason),
        }
        if release {
            self.optimizer.release();
            debug!("Deferred disposal completed.");
        }
        self.notify_state();
        self.reporter.emit(Progress::RunFinished { published: result.is_ok() });

        result.map_err(|reason| EngineError::OptimizationFailed { reason })
    }

    fn notify_state(&self) {
        lock(&self.configuration).emit(ConfigChange::ExecutionStateChanged);
    }
}

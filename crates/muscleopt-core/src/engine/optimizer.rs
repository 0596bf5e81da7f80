use super::config::ToolSnapshot;
use super::error::EngineError;
use crate::core::model::ModelHandle;
use std::path::Path;

/// The native optimizer as seen by the execution controller.
///
/// `working_copy` runs on the caller's thread when a run is accepted; `process_model`
/// runs on a blocking worker thread and is the only call allowed to block.
pub trait ModelOptimizer: Send + Sync + 'static {
    /// Prepares the model the run will modify, named after the snapshot's `name`.
    fn working_copy(&self, snapshot: &ToolSnapshot) -> Result<ModelHandle, EngineError>;

    /// Scales the working copy against the reference model. Returns `true` on success.
    fn process_model(
        &self,
        model: &mut ModelHandle,
        reference: &Path,
        snapshot: &ToolSnapshot,
    ) -> bool;

    /// Releases resources held for the controller. Called once, after the last run.
    fn release(&self) {}
}

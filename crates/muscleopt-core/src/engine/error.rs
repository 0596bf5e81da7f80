use thiserror::Error;

use super::config::ConfigError;
use super::execution::FailureReason;
use super::filter::FilterError;
use crate::core::io::settings::SettingsError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to load settings: {0}")]
    SettingsLoad(#[source] SettingsError),

    #[error("Failed to save settings: {0}")]
    SettingsSave(#[source] SettingsError),

    #[error("The optimizer step is enabled but no reference model is set")]
    MissingReferenceModel,

    #[error("Muscle optimization failed: {reason}")]
    OptimizationFailed { reason: FailureReason },

    #[error("Run setup failed: {0}")]
    Setup(String),

    #[error("Internal logic error: {0}")]
    Internal(String),
}

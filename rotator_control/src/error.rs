//! Startup error type for the rotator binary.

use thiserror::Error;

use rotator_common::config::ConfigError;
use rotator_common::rotator::error::InitError;
use rotator_common::store::StoreError;

/// Failure that prevents the controller from running.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Config file missing, unparsable or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Settings store could not be opened.
    #[error("settings store: {0}")]
    Store(#[from] StoreError),

    /// Controller init reported a fatal flag.
    #[error("rotator init failed: {0:?}")]
    Init(InitError),

    /// Scheduler refused a task the binary cannot run without.
    #[error("task {0} could not be scheduled")]
    Task(&'static str),

    /// Signal handler installation failed.
    #[error("signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

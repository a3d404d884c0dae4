//! Runner errors.

use std::path::PathBuf;

use thiserror::Error;

use nightloop_core::CoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Game loop is not running")]
    LoopStopped,

    #[error("Game loop thread panicked")]
    LoopPanicked,
}

use std::time::Duration;

use thiserror::Error;

/// Errors originating from the rendering pipeline.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("invalid worker count: {0} (must be >= 1)")]
    InvalidWorkerCount(usize),

    #[error("invalid canvas dimensions: {width}×{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("worker failed on tile {tile} of generation {generation}: {message}")]
    WorkerFailed {
        generation: u64,
        tile: usize,
        message: String,
    },

    #[error("frame {generation} timed out after {waited:?}")]
    Timeout { generation: u64, waited: Duration },

    #[error("no frame in progress")]
    NoFrameInProgress,

    #[error("worker mailbox disconnected")]
    Disconnected,

    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),

    #[error("export failed: {0}")]
    Export(String),

    #[error(transparent)]
    Core(#[from] tilebrot_core::CoreError),
}

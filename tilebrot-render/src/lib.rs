pub mod buffer;
pub mod compute;
pub mod error;
pub mod export;
pub mod iteration_buffer;
pub mod orchestrator;
pub mod palette;
pub mod pool;
pub mod tile;

pub use buffer::RenderBuffer;
pub use compute::compute_tile;
pub use error::RenderError;
pub use export::{export_png, ExportMetadata};
pub use iteration_buffer::IterationBuffer;
pub use orchestrator::{
    EngineConfig, Frame, FrameAccumulator, FrameSink, FrameStatus, NullSink, Orchestrator,
    RedrawOutcome,
};
pub use palette::{Palette, INTERIOR_COLOR};
pub use pool::{WorkerMessage, WorkerPool};
pub use tile::{partition, RenderJob, TileRequest, TileResult};

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;

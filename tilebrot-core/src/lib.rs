pub mod complex;
pub mod error;
pub mod grid;
pub mod kernel;
pub mod params;
pub mod view;

// Re-export primary types for convenience.
pub use complex::Complex;
pub use error::CoreError;
pub use grid::Grid;
pub use kernel::{evaluate, iterate, Escape};
pub use params::FractalParams;
pub use view::{PlaneExtent, PlaneWindow, ViewState, ZOOM_STEP};

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;

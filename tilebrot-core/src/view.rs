use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::error::CoreError;

/// Zoom factor applied by one wheel notch.
pub const ZOOM_STEP: f64 = 1.3;

/// Where the camera is looking.
///
/// A frame takes one snapshot of this value at dispatch time and copies it
/// into every tile request, so all strips of a frame see the same view even
/// if the caller moves on before the workers finish.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub center_x: f64,
    pub center_y: f64,
    pub zoom: f64,
}

impl ViewState {
    pub fn new(center_x: f64, center_y: f64, zoom: f64) -> crate::Result<Self> {
        let view = Self {
            center_x,
            center_y,
            zoom,
        };
        view.validate()?;
        Ok(view)
    }

    /// Check that the view maps to a finite, non-degenerate window.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.center_x.is_finite() || !self.center_y.is_finite() {
            return Err(CoreError::InvalidView {
                reason: format!(
                    "center must be finite, got ({}, {})",
                    self.center_x, self.center_y
                ),
            });
        }
        if self.zoom <= 0.0 || !self.zoom.is_finite() {
            return Err(CoreError::InvalidView {
                reason: format!("zoom must be positive and finite, got {}", self.zoom),
            });
        }
        Ok(())
    }

    pub fn zoomed_in(self) -> Self {
        Self {
            zoom: self.zoom * ZOOM_STEP,
            ..self
        }
    }

    pub fn zoomed_out(self) -> Self {
        Self {
            zoom: self.zoom / ZOOM_STEP,
            ..self
        }
    }

    /// The complex-plane window this view shows for the given base extent.
    pub fn window(&self, extent: &PlaneExtent) -> PlaneWindow {
        PlaneWindow {
            re_start: extent.re_min / self.zoom + self.center_x,
            re_end: extent.re_max / self.zoom + self.center_x,
            im_start: extent.im_min / self.zoom + self.center_y,
            im_end: extent.im_max / self.zoom + self.center_y,
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            center_x: 0.0,
            center_y: 0.0,
            zoom: 1.0,
        }
    }
}

/// The region of the complex plane visible at zoom 1, relative to the
/// view centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneExtent {
    pub re_min: f64,
    pub re_max: f64,
    pub im_min: f64,
    pub im_max: f64,
}

impl Default for PlaneExtent {
    /// Frames the whole set at zoom 1: `[-2.1, 0.5] × [-1, 1]`.
    fn default() -> Self {
        Self {
            re_min: -2.1,
            re_max: 0.5,
            im_min: -1.0,
            im_max: 1.0,
        }
    }
}

/// An absolute complex-plane rectangle, ready for pixel mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneWindow {
    pub re_start: f64,
    pub re_end: f64,
    pub im_start: f64,
    pub im_end: f64,
}

impl PlaneWindow {
    /// Map canvas pixel `(px, py)` of a `total_width × total_height` canvas
    /// to a point on the plane.
    ///
    /// Interpolation runs across the whole canvas, never a single tile, so
    /// every strip computes exactly the coordinates a single full-frame pass
    /// would.
    #[inline]
    pub fn pixel_to_complex(&self, px: u32, py: u32, total_width: u32, total_height: u32) -> Complex {
        Complex::new(
            lerp(self.re_start, self.re_end, px as f64 / total_width as f64),
            lerp(self.im_start, self.im_end, py as f64 / total_height as f64),
        )
    }
}

#[inline]
pub fn lerp(start: f64, end: f64, t: f64) -> f64 {
    start + (end - start) * t
}

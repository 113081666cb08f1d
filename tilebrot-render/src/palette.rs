use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::buffer::RenderBuffer;
use crate::iteration_buffer::IterationBuffer;

/// Color used for points that never escaped.
pub const INTERIOR_COLOR: [u8; 3] = [0, 0, 0];

/// Hue reached at the top of the range. Stopping short of a full turn keeps
/// the lowest and highest counts visibly apart.
const HUE_SPAN: f64 = 270.0;
const SATURATION: f64 = 0.5;
const LIGHTNESS: f64 = 0.5;

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// How escape counts are turned into colors. Chosen once, when the engine
/// is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Palette {
    /// Brightness grows with the escape count.
    Grayscale,
    /// Hue sweeps linearly with the escape count at fixed saturation and
    /// lightness.
    #[default]
    Hue,
    /// Like `Hue`, but on the continuous (log-log) count derived from the
    /// escape radius, which removes banding.
    SmoothHue,
}

impl Palette {
    pub const ALL: [Palette; 3] = [Palette::Grayscale, Palette::Hue, Palette::SmoothHue];

    pub fn name(self) -> &'static str {
        match self {
            Self::Grayscale => "Grayscale",
            Self::Hue => "Hue",
            Self::SmoothHue => "Smooth hue",
        }
    }

    /// Whether workers must record `|z|²` at escape for this palette.
    pub fn needs_escape_radius(self) -> bool {
        matches!(self, Self::SmoothHue)
    }

    /// Map one pixel to RGB.
    ///
    /// `iterations >= max_iterations` is the interior sentinel. A frame in
    /// which nothing escaped has `global_max == 0` and is entirely interior.
    pub fn color_of(
        self,
        iterations: u32,
        global_max: u32,
        max_iterations: u32,
        escape_radius_sq: Option<f64>,
    ) -> [u8; 3] {
        if iterations >= max_iterations || global_max == 0 {
            return INTERIOR_COLOR;
        }
        let range = global_max as f64;
        match self {
            Self::Grayscale => {
                let t = (iterations as f64 / range).clamp(0.0, 1.0);
                let v = (32.0 + 223.0 * t.sqrt()).round() as u8;
                [v, v, v]
            }
            Self::Hue => {
                let t = (iterations as f64 / range).clamp(0.0, 1.0);
                hsl_to_rgb(t * HUE_SPAN, SATURATION, LIGHTNESS)
            }
            Self::SmoothHue => {
                let nu = match escape_radius_sq {
                    Some(r) => smooth_iteration(iterations, r),
                    None => iterations as f64,
                };
                let t = (nu / range).clamp(0.0, 1.0);
                hsl_to_rgb(t * HUE_SPAN, SATURATION, LIGHTNESS)
            }
        }
    }

    /// Colorize an entire iteration buffer into an RGBA pixel buffer.
    pub fn colorize(self, iter_buf: &IterationBuffer, global_max: u32) -> RenderBuffer {
        let len = iter_buf.counts.len();
        let mut pixels = vec![0u8; len * 4];
        pixels
            .par_chunks_mut(4)
            .enumerate()
            .for_each(|(idx, pixel)| {
                let radius = iter_buf.escape_radius_sq.as_ref().map(|r| r[idx]);
                let [r, g, b] =
                    self.color_of(iter_buf.counts[idx], global_max, iter_buf.max_iterations, radius);
                pixel.copy_from_slice(&[r, g, b, 255]);
            });
        RenderBuffer {
            width: iter_buf.width,
            height: iter_buf.height,
            pixels,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Compute the smooth (continuous) iteration count.
///
/// Uses the standard renormalization formula:
///   ν = n + 1 − log₂(ln(|zₙ|))
fn smooth_iteration(iterations: u32, norm_sq: f64) -> f64 {
    let log_zn = norm_sq.ln() * 0.5; // ln(|z_n|)
    if log_zn <= 0.0 {
        return iterations as f64;
    }
    iterations as f64 + 1.0 - log_zn.ln() / std::f64::consts::LN_2
}

/// `hue` in degrees, `saturation` and `lightness` in `[0, 1]`.
fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> [u8; 3] {
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let sector = hue.rem_euclid(360.0) / 60.0;
    let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
    let (r, g, b) = match sector as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = lightness - chroma / 2.0;
    let to_byte = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    [to_byte(r), to_byte(g), to_byte(b)]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

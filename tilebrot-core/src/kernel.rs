//! The escape-time kernel: `z_{n+1} = z_n² + c`, starting from `z₀ = 0`.
//!
//! A point that never reaches the bailout radius within the iteration budget
//! is reported with `iterations == max_iterations`. Real escapes always land
//! in `[0, max_iterations)`, so the budget itself doubles as the interior
//! sentinel and no separate flag has to travel across the worker boundary.

use crate::complex::Complex;

/// Outcome of iterating a single point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Escape {
    /// Step index at which `|z|²` first reached the threshold, or
    /// `max_iterations` if it never did.
    pub iterations: u32,
    /// The orbit value at the moment iteration stopped. `(0, 0)` when the
    /// point was classified by the interior shortcut.
    pub z: Complex,
}

impl Escape {
    /// `true` if the point never escaped within `max_iterations`.
    #[inline]
    pub fn is_interior(&self, max_iterations: u32) -> bool {
        self.iterations >= max_iterations
    }

    /// `|z|²` at the moment iteration stopped.
    #[inline]
    pub fn escape_radius_sq(&self) -> f64 {
        self.z.norm_sq()
    }
}

/// Returns `true` if `c = re + im·i` lies inside the main cardioid.
///
/// With `q = (re − ¼)² + im²`, the cardioid is `q·(q + (re − ¼)) ≤ ¼·im²`.
/// The real part is shifted, the imaginary part is squared.
#[inline]
pub fn in_main_cardioid(re: f64, im: f64) -> bool {
    let shifted = re - 0.25;
    let im2 = im * im;
    let q = shifted * shifted + im2;
    q * (q + shifted) <= 0.25 * im2
}

/// Returns `true` if `c` lies inside the period-2 bulb, the disc of radius
/// ¼ centred on `-1`.
#[inline]
pub fn in_period2_bulb(re: f64, im: f64) -> bool {
    (re + 1.0) * (re + 1.0) + im * im <= 0.0625
}

/// Classify `c = c_re + c_im·i`.
///
/// Points inside the main cardioid or the period-2 bulb are reported as
/// interior without iterating. Everything else goes through [`iterate`].
#[inline]
pub fn evaluate(c_re: f64, c_im: f64, max_iterations: u32, escape_threshold_sq: f64) -> Escape {
    if in_main_cardioid(c_re, c_im) || in_period2_bulb(c_re, c_im) {
        return Escape {
            iterations: max_iterations,
            z: Complex::ZERO,
        };
    }
    iterate(Complex::new(c_re, c_im), max_iterations, escape_threshold_sq)
}

/// Run the recurrence for `c` with no shortcuts.
///
/// The bailout test happens at the top of each step, before `z` is
/// advanced, so the reported count is the index of the first orbit value
/// whose squared magnitude reached `escape_threshold_sq`.
pub fn iterate(c: Complex, max_iterations: u32, escape_threshold_sq: f64) -> Escape {
    let mut z = Complex::ZERO;
    for n in 0..max_iterations {
        if z.norm_sq() >= escape_threshold_sq {
            return Escape { iterations: n, z };
        }
        z = z.square_add(c);
    }
    Escape {
        iterations: max_iterations,
        z,
    }
}

use serde::{Deserialize, Serialize};

/// A complex number represented as two `f64` components.
///
/// Only the handful of operations the escape-time loop needs are provided;
/// the kernel works on the components directly so the hot loop can reuse
/// the squared terms for both the bailout test and the next step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const ZERO: Self = Self { re: 0.0, im: 0.0 };

    #[inline]
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// Returns `re² + im²` without taking the square root.
    #[inline]
    pub fn norm_sq(self) -> f64 {
        self.re * self.re + self.im * self.im
    }

    /// One step of the quadratic map: `self² + c`.
    #[inline]
    pub fn square_add(self, c: Self) -> Self {
        Self {
            re: self.re * self.re - self.im * self.im + c.re,
            im: 2.0 * self.re * self.im + c.im,
        }
    }
}

impl std::fmt::Display for Complex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.im >= 0.0 {
            write!(f, "{} + {}i", self.re, self.im)
        } else {
            write!(f, "{} - {}i", self.re, -self.im)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn zero_constant() {
        let z = Complex::ZERO;
        assert_eq!(z.re, 0.0);
        assert_eq!(z.im, 0.0);
    }

    #[test]
    fn norm_sq() {
        let a = Complex::new(3.0, 4.0);
        assert!(approx_eq(a.norm_sq(), 25.0));
    }

    #[test]
    fn square_add_matches_expansion() {
        // (1 + i)² + (0.5 - 0.25i) = 2i + 0.5 - 0.25i = 0.5 + 1.75i
        let z = Complex::new(1.0, 1.0).square_add(Complex::new(0.5, -0.25));
        assert!(approx_eq(z.re, 0.5));
        assert!(approx_eq(z.im, 1.75));
    }

    #[test]
    fn display_signs() {
        assert_eq!(Complex::new(1.5, -2.0).to_string(), "1.5 - 2i");
        assert_eq!(Complex::new(-0.5, 0.25).to_string(), "-0.5 + 0.25i");
    }
}

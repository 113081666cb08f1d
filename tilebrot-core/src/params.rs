use crate::error::CoreError;

/// Parameters controlling escape-time iteration.
///
/// The cached `escape_radius_sq` field is automatically recomputed on
/// deserialization so settings files always stay consistent.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct FractalParams {
    /// Iteration budget. A point that survives this many steps is interior,
    /// and the kernel reports exactly this value for it.
    pub max_iterations: u32,

    /// Bailout radius. Once `|z|` reaches this, the orbit has escaped.
    pub escape_radius: f64,

    /// Cached `escape_radius * escape_radius` for the inner loop.
    #[serde(skip)]
    escape_radius_sq: f64,
}

/// Goes through `new` so the cached square is recomputed on load.
impl<'de> serde::Deserialize<'de> for FractalParams {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        struct Raw {
            #[serde(default = "default_max_iterations")]
            max_iterations: u32,
            #[serde(default = "default_escape_radius")]
            escape_radius: f64,
        }
        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.max_iterations, raw.escape_radius).map_err(serde::de::Error::custom)
    }
}

fn default_max_iterations() -> u32 {
    FractalParams::DEFAULT_MAX_ITERATIONS
}

fn default_escape_radius() -> f64 {
    FractalParams::DEFAULT_ESCAPE_RADIUS
}

impl FractalParams {
    pub const DEFAULT_MAX_ITERATIONS: u32 = 1000;
    pub const DEFAULT_ESCAPE_RADIUS: f64 = 10.0;

    pub fn new(max_iterations: u32, escape_radius: f64) -> crate::Result<Self> {
        if max_iterations < 1 {
            return Err(CoreError::InvalidMaxIterations(max_iterations));
        }
        if escape_radius <= 0.0 || !escape_radius.is_finite() {
            return Err(CoreError::InvalidEscapeRadius(escape_radius));
        }
        Ok(Self {
            max_iterations,
            escape_radius,
            escape_radius_sq: escape_radius * escape_radius,
        })
    }

    /// Pre-computed squared escape radius for the inner loop.
    #[inline]
    pub fn escape_radius_sq(&self) -> f64 {
        self.escape_radius_sq
    }

    /// Return a copy with a different `max_iterations` value.
    pub fn with_max_iterations(self, max_iterations: u32) -> crate::Result<Self> {
        Self::new(max_iterations, self.escape_radius)
    }
}

impl Default for FractalParams {
    fn default() -> Self {
        Self {
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            escape_radius: Self::DEFAULT_ESCAPE_RADIUS,
            escape_radius_sq: Self::DEFAULT_ESCAPE_RADIUS * Self::DEFAULT_ESCAPE_RADIUS,
        }
    }
}

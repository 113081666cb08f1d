use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use tilebrot_core::{FractalParams, PlaneExtent, ViewState};
use tilebrot_render::{EngineConfig, Palette};

use crate::app_dir;

// ---------------------------------------------------------------------------
// Engine settings
// ---------------------------------------------------------------------------

/// Everything the driver needs, as stored in `settings.json`.
///
/// Every field has a default so partial files stay valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default = "default_canvas_width")]
    pub canvas_width: u32,
    #[serde(default = "default_canvas_height")]
    pub canvas_height: u32,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default)]
    pub params: FractalParams,
    #[serde(default)]
    pub extent: PlaneExtent,
    #[serde(default)]
    pub palette: Palette,
    /// Seconds a frame may stay in flight before it is abandoned. 0 waits forever.
    #[serde(default = "default_frame_timeout_secs")]
    pub frame_timeout_secs: u64,
    /// First view of the run.
    #[serde(default)]
    pub view: ViewState,
    /// Number of frames to render, zooming in one wheel notch between each.
    #[serde(default = "default_zoom_steps")]
    pub zoom_steps: u32,
    /// Where frames are written. When empty, an `images/` folder next to the executable is used.
    #[serde(default)]
    pub output_dir: String,
}

fn default_canvas_width() -> u32 {
    800
}
fn default_canvas_height() -> u32 {
    600
}
fn default_worker_count() -> usize {
    8
}
fn default_frame_timeout_secs() -> u64 {
    30
}
fn default_zoom_steps() -> u32 {
    1
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            canvas_width: default_canvas_width(),
            canvas_height: default_canvas_height(),
            worker_count: default_worker_count(),
            params: FractalParams::default(),
            extent: PlaneExtent::default(),
            palette: Palette::default(),
            frame_timeout_secs: default_frame_timeout_secs(),
            view: ViewState::default(),
            zoom_steps: default_zoom_steps(),
            output_dir: String::new(),
        }
    }
}

impl EngineSettings {
    /// Load settings from `path` (or the default location), falling back to defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.map(Path::to_path_buf).unwrap_or_else(app_dir::default_settings_path);
        if !path.exists() {
            debug!("No settings file at {}", path.display());
            return Self::default();
        }
        match fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str::<EngineSettings>(&json) {
                Ok(settings) => {
                    info!("Loaded settings from {}", path.display());
                    return settings;
                }
                Err(e) => error!("Failed to parse settings: {e}"),
            },
            Err(e) => error!("Failed to read settings file: {e}"),
        }
        Self::default()
    }

    /// Persist settings to `path` (or the default location).
    pub fn save(&self, path: Option<&Path>) {
        let path = path.map(Path::to_path_buf).unwrap_or_else(app_dir::default_settings_path);
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create settings directory: {e}");
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = fs::write(&path, &json) {
                    error!("Failed to write settings: {e}");
                } else {
                    info!("Saved settings to {}", path.display());
                }
            }
            Err(e) => error!("Failed to serialize settings: {e}"),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            canvas_width: self.canvas_width,
            canvas_height: self.canvas_height,
            worker_count: self.worker_count,
            params: self.params,
            extent: self.extent,
            palette: self.palette,
            frame_timeout: (self.frame_timeout_secs > 0)
                .then(|| Duration::from_secs(self.frame_timeout_secs)),
        }
    }

    pub fn output_directory(&self) -> PathBuf {
        if self.output_dir.trim().is_empty() {
            app_dir::default_output_dir()
        } else {
            PathBuf::from(&self.output_dir)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        let s: EngineSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(s.canvas_width, 800);
        assert_eq!(s.worker_count, 8);
        assert_eq!(s.params, FractalParams::default());
        assert_eq!(s.palette, Palette::Hue);
        assert_eq!(s.view, ViewState::default());
    }

    #[test]
    fn partial_json_overrides_fields() {
        let s: EngineSettings = serde_json::from_str(
            r#"{"worker_count": 3, "palette": "smooth_hue", "params": {"max_iterations": 64}}"#,
        )
        .unwrap();
        assert_eq!(s.worker_count, 3);
        assert_eq!(s.palette, Palette::SmoothHue);
        assert_eq!(s.params.max_iterations, 64);
        assert!((s.params.escape_radius - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_timeout_disables_deadline() {
        let s = EngineSettings {
            frame_timeout_secs: 0,
            ..EngineSettings::default()
        };
        assert!(s.engine_config().frame_timeout.is_none());
        assert_eq!(
            EngineSettings::default().engine_config().frame_timeout,
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = std::env::temp_dir().join("tilebrot_test_settings");
        let path = dir.join("settings.json");
        let s = EngineSettings {
            canvas_width: 320,
            zoom_steps: 4,
            palette: Palette::Grayscale,
            ..EngineSettings::default()
        };
        s.save(Some(&path));
        let loaded = EngineSettings::load(Some(&path));
        assert_eq!(loaded.canvas_width, 320);
        assert_eq!(loaded.zoom_steps, 4);
        assert_eq!(loaded.palette, Palette::Grayscale);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join("tilebrot_test_settings_bad");
        let _ = fs::create_dir_all(&dir);
        let path = dir.join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        let loaded = EngineSettings::load(Some(&path));
        assert_eq!(loaded.canvas_width, 800);
        let _ = fs::remove_dir_all(&dir);
    }
}

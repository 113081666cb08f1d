use std::path::PathBuf;

use tracing::{debug, error, info};

use tilebrot_core::FractalParams;
use tilebrot_render::{export_png, ExportMetadata, Frame, FrameSink, Palette, RenderError};

/// Writes every finished frame to `frame_NNNN.png` in an output directory.
///
/// Export failures cannot be returned from the sink callbacks, so they are
/// logged and kept for the driver to inspect after the run.
pub struct PngSink {
    output_dir: PathBuf,
    params: FractalParams,
    palette: Palette,
    worker_count: usize,
    written: Vec<PathBuf>,
    failures: Vec<RenderError>,
}

impl PngSink {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        params: FractalParams,
        palette: Palette,
        worker_count: usize,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            params,
            palette,
            worker_count,
            written: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Files written so far, in render order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Export and engine errors seen so far.
    pub fn failures(&self) -> &[RenderError] {
        &self.failures
    }

    fn next_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("frame_{:04}.png", self.written.len()))
    }
}

impl FrameSink for PngSink {
    fn on_progress(&mut self, tiles_done: usize, tiles_total: usize) {
        debug!("{tiles_done}/{tiles_total} tiles");
    }

    fn on_frame(&mut self, frame: &Frame) {
        let path = self.next_path();
        let metadata =
            ExportMetadata::for_frame(frame, &self.params, self.palette, self.worker_count);
        match export_png(&frame.pixels, &path, &metadata) {
            Ok(()) => {
                info!(
                    "Frame {} written to {} ({:.1} ms, global max {})",
                    frame.generation,
                    path.display(),
                    frame.elapsed.as_secs_f64() * 1000.0,
                    frame.global_max,
                );
                self.written.push(path);
            }
            Err(e) => {
                error!("{e}");
                self.failures.push(e);
            }
        }
    }

    fn on_error(&mut self, error: &RenderError) {
        error!("Frame abandoned: {error}");
        self.failures.push(error.clone());
    }
}

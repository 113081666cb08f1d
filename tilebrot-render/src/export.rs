//! PNG export with embedded metadata (tEXt chunks).

use std::io::BufWriter;
use std::path::Path;

use tracing::debug;

use tilebrot_core::FractalParams;

use crate::buffer::RenderBuffer;
use crate::error::RenderError;
use crate::orchestrator::Frame;
use crate::palette::Palette;

const SOFTWARE: &str = "tilebrot";

/// Metadata to embed in an exported PNG as tEXt chunks.
pub struct ExportMetadata {
    pub center_x: f64,
    pub center_y: f64,
    pub zoom: f64,
    pub max_iterations: u32,
    pub escape_radius: f64,
    pub global_max: u32,
    pub palette: Palette,
    pub worker_count: usize,
    pub width: u32,
    pub height: u32,
}

impl ExportMetadata {
    pub fn for_frame(
        frame: &Frame,
        params: &FractalParams,
        palette: Palette,
        worker_count: usize,
    ) -> Self {
        Self {
            center_x: frame.view.center_x,
            center_y: frame.view.center_y,
            zoom: frame.view.zoom,
            max_iterations: params.max_iterations,
            escape_radius: params.escape_radius,
            global_max: frame.global_max,
            palette,
            worker_count,
            width: frame.pixels.width,
            height: frame.pixels.height,
        }
    }
}

/// Write an RGBA pixel buffer as a PNG file with embedded render metadata.
///
/// Uses the `png` crate directly to inject custom tEXt chunks readable by
/// exiftool and most image viewers.
pub fn export_png(buffer: &RenderBuffer, path: &Path, metadata: &ExportMetadata) -> crate::Result<()> {
    let file = std::fs::File::create(path)
        .map_err(|e| RenderError::Export(format!("failed to create {}: {e}", path.display())))?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, buffer.width, buffer.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Default);

    encoder
        .add_text_chunk("Software".to_string(), SOFTWARE.to_string())
        .map_err(|e| RenderError::Export(format!("failed to add text chunk: {e}")))?;
    encoder
        .add_text_chunk("Description".to_string(), build_description(metadata))
        .map_err(|e| RenderError::Export(format!("failed to add text chunk: {e}")))?;
    for (key, value) in build_metadata_pairs(metadata) {
        encoder
            .add_text_chunk(key.clone(), value)
            .map_err(|e| RenderError::Export(format!("failed to add text chunk '{key}': {e}")))?;
    }

    let mut png_writer = encoder
        .write_header()
        .map_err(|e| RenderError::Export(format!("failed to write PNG header: {e}")))?;
    png_writer
        .write_image_data(&buffer.pixels)
        .map_err(|e| RenderError::Export(format!("failed to write PNG image data: {e}")))?;

    debug!(
        "Exported PNG {}x{} to {}",
        buffer.width,
        buffer.height,
        path.display()
    );
    Ok(())
}

fn build_description(meta: &ExportMetadata) -> String {
    format!(
        "Mandelbrot - Center: {} {}i, Zoom: {}, Iterations: {}",
        meta.center_x, meta.center_y, meta.zoom, meta.max_iterations,
    )
}

fn build_metadata_pairs(meta: &ExportMetadata) -> Vec<(String, String)> {
    vec![
        ("tilebrot.CenterX".into(), meta.center_x.to_string()),
        ("tilebrot.CenterY".into(), meta.center_y.to_string()),
        ("tilebrot.Zoom".into(), meta.zoom.to_string()),
        ("tilebrot.MaxIterations".into(), meta.max_iterations.to_string()),
        ("tilebrot.EscapeRadius".into(), meta.escape_radius.to_string()),
        ("tilebrot.GlobalMax".into(), meta.global_max.to_string()),
        ("tilebrot.Palette".into(), meta.palette.name().to_string()),
        ("tilebrot.Workers".into(), meta.worker_count.to_string()),
        (
            "tilebrot.Resolution".into(),
            format!("{}x{}", meta.width, meta.height),
        ),
    ]
}

mod app_dir;
mod settings;
mod sink;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};

use tilebrot_core::ViewState;
use tilebrot_render::{Orchestrator, Palette, RedrawOutcome, RenderError};

use settings::EngineSettings;
use sink::PngSink;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PaletteArg {
    Grayscale,
    Hue,
    SmoothHue,
}

impl From<PaletteArg> for Palette {
    fn from(arg: PaletteArg) -> Self {
        match arg {
            PaletteArg::Grayscale => Palette::Grayscale,
            PaletteArg::Hue => Palette::Hue,
            PaletteArg::SmoothHue => Palette::SmoothHue,
        }
    }
}

/// Command-line values override whatever the settings file says.
#[derive(Debug, Parser)]
#[command(name = "tilebrot")]
#[command(about = "Render Mandelbrot frames with a pool of strip workers")]
struct Cli {
    /// Settings file. Defaults to settings.json next to the executable.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Canvas width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Canvas height in pixels.
    #[arg(long)]
    height: Option<u32>,

    /// Number of workers, and therefore strips per frame.
    #[arg(short, long)]
    workers: Option<usize>,

    /// Iteration cap per pixel.
    #[arg(short = 'i', long)]
    max_iterations: Option<u32>,

    #[arg(long, value_enum)]
    palette: Option<PaletteArg>,

    /// Real part of the view centre.
    #[arg(long, allow_hyphen_values = true)]
    center_x: Option<f64>,

    /// Imaginary part of the view centre.
    #[arg(long, allow_hyphen_values = true)]
    center_y: Option<f64>,

    #[arg(short, long)]
    zoom: Option<f64>,

    /// Frames to render, zooming in one step between each.
    #[arg(short, long)]
    steps: Option<u32>,

    /// Directory for the PNG frames.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the effective settings back to the settings file.
    #[arg(long)]
    save_settings: bool,
}

impl Cli {
    fn apply(&self, settings: &mut EngineSettings) -> Result<(), RenderError> {
        if let Some(w) = self.width {
            settings.canvas_width = w;
        }
        if let Some(h) = self.height {
            settings.canvas_height = h;
        }
        if let Some(n) = self.workers {
            settings.worker_count = n;
        }
        if let Some(max) = self.max_iterations {
            settings.params = settings.params.with_max_iterations(max)?;
        }
        if let Some(p) = self.palette {
            settings.palette = p.into();
        }
        if self.center_x.is_some() || self.center_y.is_some() || self.zoom.is_some() {
            settings.view = ViewState::new(
                self.center_x.unwrap_or(settings.view.center_x),
                self.center_y.unwrap_or(settings.view.center_y),
                self.zoom.unwrap_or(settings.view.zoom),
            )?;
        }
        if let Some(steps) = self.steps {
            settings.zoom_steps = steps;
        }
        if let Some(dir) = &self.output {
            settings.output_dir = dir.display().to_string();
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

fn run(cli: &Cli) -> Result<(), RenderError> {
    let mut settings = EngineSettings::load(cli.config.as_deref());
    cli.apply(&mut settings)?;
    if cli.save_settings {
        settings.save(cli.config.as_deref());
    }

    let output_dir = settings.output_directory();
    std::fs::create_dir_all(&output_dir).map_err(|e| {
        RenderError::Export(format!("failed to create {}: {e}", output_dir.display()))
    })?;

    let sink = PngSink::new(&output_dir, settings.params, settings.palette, settings.worker_count);
    let mut orchestrator = Orchestrator::new(settings.engine_config(), sink)?;

    info!(
        "Rendering {} frame(s) at {}x{} with {} workers into {}",
        settings.zoom_steps,
        settings.canvas_width,
        settings.canvas_height,
        settings.worker_count,
        output_dir.display(),
    );

    let mut view = settings.view;
    for step in 0..settings.zoom_steps {
        match orchestrator.redraw(view)? {
            RedrawOutcome::Dispatched { generation, tiles } => {
                info!("Step {step}: generation {generation}, {tiles} tiles, zoom {}", view.zoom);
            }
            RedrawOutcome::Dropped => warn!("Step {step}: redraw dropped"),
        }
        orchestrator.wait_frame()?;
        view = view.zoomed_in();
    }

    let stale = orchestrator.stale_discarded();
    if stale > 0 {
        info!("Discarded {stale} stale tile result(s)");
    }

    match orchestrator.sink().failures().first() {
        Some(e) => Err(e.clone()),
        None => {
            info!("Wrote {} frame(s)", orchestrator.sink().written().len());
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    info!("Starting tilebrot");

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

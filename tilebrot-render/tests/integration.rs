use std::time::Duration;

use tilebrot_core::{FractalParams, ViewState};
use tilebrot_render::{
    compute_tile, partition, EngineConfig, Frame, FrameSink, FrameStatus, NullSink, Orchestrator,
    Palette, RedrawOutcome, RenderError, RenderJob, INTERIOR_COLOR,
};

fn config(width: u32, height: u32, workers: usize, palette: Palette) -> EngineConfig {
    EngineConfig {
        canvas_width: width,
        canvas_height: height,
        worker_count: workers,
        palette,
        frame_timeout: Some(Duration::from_secs(60)),
        ..EngineConfig::default()
    }
}

fn render_once(cfg: EngineConfig, view: ViewState) -> Frame {
    let mut orch = Orchestrator::new(cfg, NullSink).unwrap();
    assert!(matches!(
        orch.redraw(view).unwrap(),
        RedrawOutcome::Dispatched { .. }
    ));
    orch.wait_frame().unwrap()
}

fn is_black(px: [u8; 4]) -> bool {
    px[..3] == INTERIOR_COLOR
}

#[test]
fn four_by_four_two_workers() {
    let cfg = config(4, 4, 2, Palette::Hue);
    let view = ViewState::default();

    let job = RenderJob {
        params: cfg.params,
        ..RenderJob::new(view)
    };
    let strips = partition(4, 4, 2, &job).unwrap();
    assert_eq!(strips.len(), 2);
    assert_eq!((strips[0].origin_y, strips[0].width, strips[0].height), (0, 4, 2));
    assert_eq!((strips[1].origin_y, strips[1].width, strips[1].height), (2, 4, 2));

    let local_max = strips
        .iter()
        .map(|s| compute_tile(s).local_max_iterations)
        .max()
        .unwrap();

    let frame = render_once(cfg, view);
    assert_eq!(frame.global_max, local_max);
    assert_eq!(frame.pixels.pixels.len(), 64);

    // (3, 2) maps to -0.15 + 0i, inside the main cardioid.
    assert!(is_black(frame.pixels.pixel(3, 2)));
    // (0, 0) maps to -2.1 - 1i, which escapes after a few steps.
    assert!(!is_black(frame.pixels.pixel(0, 0)));
    assert!(frame.pixels.pixels.chunks_exact(4).all(|px| px[3] == 255));
}

#[test]
fn worker_count_does_not_change_the_image() {
    let view = ViewState::new(-0.7435, 0.1314, 40.0).unwrap();
    let reference = render_once(config(60, 45, 1, Palette::SmoothHue), view);

    for workers in [2, 3, 5, 8, 45, 64] {
        let frame = render_once(config(60, 45, workers, Palette::SmoothHue), view);
        assert_eq!(frame.iterations.counts, reference.iterations.counts);
        assert_eq!(frame.global_max, reference.global_max);
        assert_eq!(
            frame.pixels, reference.pixels,
            "{workers} workers changed the image"
        );
    }
}

#[test]
fn degenerate_frame_is_all_interior() {
    let view = ViewState::new(-0.1, 0.0, 100.0).unwrap();
    for palette in Palette::ALL {
        let frame = render_once(config(24, 16, 4, palette), view);
        assert_eq!(frame.global_max, 0);
        assert!(frame
            .pixels
            .pixels
            .chunks_exact(4)
            .all(|px| px == [0, 0, 0, 255]));
    }
}

#[test]
fn render_determinism() {
    let view = ViewState::new(-0.5, 0.0, 1.5).unwrap();
    let a = render_once(config(80, 60, 4, Palette::Hue), view);
    let b = render_once(config(80, 60, 4, Palette::Hue), view);
    assert_eq!(a.pixels, b.pixels);
    assert_eq!(a.iterations.counts, b.iterations.counts);
}

#[test]
fn palettes_share_iteration_data() {
    let view = ViewState::default();
    let hue = render_once(config(64, 48, 4, Palette::Hue), view);
    let gray = render_once(config(64, 48, 4, Palette::Grayscale), view);
    assert_eq!(hue.iterations.counts, gray.iterations.counts);
    assert_ne!(hue.pixels, gray.pixels);
    assert!(hue.iterations.escape_radius_sq.is_none());

    let smooth = render_once(config(64, 48, 4, Palette::SmoothHue), view);
    assert!(smooth.iterations.escape_radius_sq.is_some());
}

#[derive(Default)]
struct CountingSink {
    progress: Vec<(usize, usize)>,
    frames: usize,
    errors: usize,
}

impl FrameSink for CountingSink {
    fn on_progress(&mut self, done: usize, total: usize) {
        self.progress.push((done, total));
    }
    fn on_frame(&mut self, _frame: &Frame) {
        self.frames += 1;
    }
    fn on_error(&mut self, _error: &RenderError) {
        self.errors += 1;
    }
}

#[test]
fn sink_sees_progress_then_frame() {
    let mut orch =
        Orchestrator::new(config(40, 30, 5, Palette::Hue), CountingSink::default()).unwrap();
    orch.redraw(ViewState::default()).unwrap();
    orch.wait_frame().unwrap();

    let sink = orch.sink();
    assert_eq!(sink.progress, vec![(1, 5), (2, 5), (3, 5), (4, 5), (5, 5)]);
    assert_eq!(sink.frames, 1);
    assert_eq!(sink.errors, 0);
}

#[test]
fn poll_eventually_yields_frame() {
    let mut orch = Orchestrator::new(config(32, 32, 4, Palette::Hue), NullSink).unwrap();
    orch.redraw(ViewState::default()).unwrap();

    let deadline = std::time::Instant::now() + Duration::from_secs(60);
    let frame = loop {
        if let Some(frame) = orch.poll().unwrap() {
            break frame;
        }
        assert!(std::time::Instant::now() < deadline, "frame never arrived");
        std::thread::sleep(Duration::from_millis(1));
    };
    assert_eq!(frame.tile_count, 4);
    assert_eq!(orch.status(), FrameStatus::Idle);
}

#[test]
fn pool_resize_mid_frame_yields_clean_next_frame() {
    let cfg = EngineConfig {
        params: FractalParams::new(2000, 10.0).unwrap(),
        ..config(96, 64, 2, Palette::Hue)
    };
    let mut orch = Orchestrator::new(cfg, NullSink).unwrap();
    let view = ViewState::new(-0.75, 0.05, 8.0).unwrap();

    orch.redraw(view).unwrap();
    orch.resize_worker_pool(6).unwrap();
    orch.redraw(view).unwrap();
    let frame = orch.wait_frame().unwrap();
    assert_eq!(frame.tile_count, 6);

    let reference = render_once(
        EngineConfig {
            worker_count: 1,
            ..cfg
        },
        view,
    );
    assert_eq!(frame.pixels, reference.pixels);
}

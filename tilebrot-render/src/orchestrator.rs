use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use tilebrot_core::{FractalParams, PlaneExtent, ViewState};

use crate::buffer::RenderBuffer;
use crate::error::RenderError;
use crate::iteration_buffer::IterationBuffer;
use crate::palette::Palette;
use crate::pool::{WorkerMessage, WorkerPool};
use crate::tile::{partition, RenderJob, TileResult};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Everything needed to stand up an [`Orchestrator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub worker_count: usize,
    pub params: FractalParams,
    pub extent: PlaneExtent,
    pub palette: Palette,
    /// Longest a frame may stay in flight. `None` waits forever.
    pub frame_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            canvas_width: 800,
            canvas_height: 600,
            worker_count: 8,
            params: FractalParams::default(),
            extent: PlaneExtent::default(),
            palette: Palette::default(),
            frame_timeout: Some(Duration::from_secs(30)),
        }
    }
}

// ---------------------------------------------------------------------------
// Presentation side
// ---------------------------------------------------------------------------

/// A finished, colored frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub generation: u64,
    pub view: ViewState,
    /// Largest escape count over all tiles; `0` when nothing escaped.
    pub global_max: u32,
    pub tile_count: usize,
    pub iterations: IterationBuffer,
    pub pixels: RenderBuffer,
    /// Time from dispatch to the last tile being colored.
    pub elapsed: Duration,
}

/// Receives everything the orchestrator wants to show the user.
pub trait FrameSink {
    /// Called after each tile of the current frame arrives.
    fn on_progress(&mut self, _tiles_done: usize, _tiles_total: usize) {}

    fn on_frame(&mut self, frame: &Frame);

    /// Called when a frame is abandoned because a worker failed or timed out.
    fn on_error(&mut self, _error: &RenderError) {}
}

/// A sink that ignores everything; for callers that only use return values.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn on_frame(&mut self, _frame: &Frame) {}
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Idle,
    InProgress,
}

/// What happened to a redraw request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawOutcome {
    Dispatched { generation: u64, tiles: usize },
    /// A frame was already being collected; the request was discarded.
    Dropped,
}

/// Tile results gathered so far for the frame in flight.
#[derive(Debug)]
pub struct FrameAccumulator {
    generation: u64,
    job: RenderJob,
    expected_count: usize,
    collected: Vec<TileResult>,
    received: Vec<bool>,
    started: Instant,
}

impl FrameAccumulator {
    fn new(generation: u64, job: RenderJob, expected_count: usize) -> Self {
        Self {
            generation,
            job,
            expected_count,
            collected: Vec::with_capacity(expected_count),
            received: vec![false; expected_count],
            started: Instant::now(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn expected_count(&self) -> usize {
        self.expected_count
    }

    /// Results in arrival order.
    pub fn collected(&self) -> &[TileResult] {
        &self.collected
    }

    pub fn is_complete(&self) -> bool {
        self.collected.len() == self.expected_count
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Splits frames into strips, farms them out, and reassembles the answers.
///
/// The orchestrator is driven from a single thread. Workers never touch its
/// state; they post [`WorkerMessage`]s to a mailbox that only
/// [`poll`](Self::poll) and [`wait_frame`](Self::wait_frame) read, so the
/// accumulator has exactly one writer.
pub struct Orchestrator<S: FrameSink> {
    config: EngineConfig,
    pool: WorkerPool,
    sink: S,
    generation: u64,
    accumulator: Option<FrameAccumulator>,
    mailbox_tx: Sender<WorkerMessage>,
    mailbox: Receiver<WorkerMessage>,
    stale_discarded: u64,
}

impl<S: FrameSink> Orchestrator<S> {
    pub fn new(config: EngineConfig, sink: S) -> crate::Result<Self> {
        check_canvas(config.canvas_width, config.canvas_height)?;
        let pool = WorkerPool::new(config.worker_count)?;
        let (mailbox_tx, mailbox) = mpsc::channel();
        Ok(Self {
            config,
            pool,
            sink,
            generation: 0,
            accumulator: None,
            mailbox_tx,
            mailbox,
            stale_discarded: 0,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn status(&self) -> FrameStatus {
        if self.accumulator.is_some() {
            FrameStatus::InProgress
        } else {
            FrameStatus::Idle
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn accumulator(&self) -> Option<&FrameAccumulator> {
        self.accumulator.as_ref()
    }

    /// How many results from abandoned generations have been thrown away.
    pub fn stale_discarded(&self) -> u64 {
        self.stale_discarded
    }

    /// Start computing a frame for `view`.
    ///
    /// While a frame is in flight further requests are dropped, not queued.
    /// Configuration errors are reported before anything is dispatched.
    pub fn redraw(&mut self, view: ViewState) -> crate::Result<RedrawOutcome> {
        if let Some(acc) = &self.accumulator {
            debug!(
                in_flight = acc.generation,
                "Redraw dropped, frame still in progress"
            );
            return Ok(RedrawOutcome::Dropped);
        }

        view.validate()?;
        let job = RenderJob {
            view,
            params: self.config.params,
            extent: self.config.extent,
            record_escape_radius: self.config.palette.needs_escape_radius(),
        };
        let requests = partition(
            self.config.canvas_width,
            self.config.canvas_height,
            self.pool.size(),
            &job,
        )?;

        self.generation += 1;
        let generation = self.generation;
        let tiles = requests.len();
        debug!(
            generation,
            tiles,
            width = self.config.canvas_width,
            height = self.config.canvas_height,
            zoom = view.zoom,
            "Dispatching frame"
        );

        for (index, request) in requests.into_iter().enumerate() {
            self.pool
                .dispatch(generation, index, request, self.mailbox_tx.clone());
        }
        self.accumulator = Some(FrameAccumulator::new(generation, job, tiles));

        Ok(RedrawOutcome::Dispatched { generation, tiles })
    }

    /// Change the canvas size. Any frame in flight is abandoned.
    pub fn resize(&mut self, canvas_width: u32, canvas_height: u32) -> crate::Result<()> {
        check_canvas(canvas_width, canvas_height)?;
        self.invalidate("canvas resized");
        self.config.canvas_width = canvas_width;
        self.config.canvas_height = canvas_height;
        Ok(())
    }

    /// Replace the worker pool. Any frame in flight is abandoned, and
    /// results still coming from the old pool will be discarded.
    pub fn resize_worker_pool(&mut self, worker_count: usize) -> crate::Result<()> {
        let pool = WorkerPool::new(worker_count)?;
        self.invalidate("worker pool resized");
        self.pool = pool;
        self.config.worker_count = worker_count;
        Ok(())
    }

    /// Process everything currently in the mailbox without blocking.
    ///
    /// Returns the frame if one was completed.
    pub fn poll(&mut self) -> crate::Result<Option<Frame>> {
        loop {
            match self.mailbox.try_recv() {
                Ok(message) => {
                    if let Some(frame) = self.handle_message(message)? {
                        return Ok(Some(frame));
                    }
                }
                Err(TryRecvError::Empty) => {
                    self.check_deadline()?;
                    return Ok(None);
                }
                Err(TryRecvError::Disconnected) => return Err(RenderError::Disconnected),
            }
        }
    }

    /// Block until the frame in flight completes, fails, or times out.
    pub fn wait_frame(&mut self) -> crate::Result<Frame> {
        loop {
            if self.accumulator.is_none() {
                return Err(RenderError::NoFrameInProgress);
            }

            let message = match self.time_left() {
                Some(left) => match self.mailbox.recv_timeout(left) {
                    Ok(message) => message,
                    Err(RecvTimeoutError::Timeout) => {
                        self.check_deadline()?;
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => return Err(RenderError::Disconnected),
                },
                None => self
                    .mailbox
                    .recv()
                    .map_err(|_| RenderError::Disconnected)?,
            };

            if let Some(frame) = self.handle_message(message)? {
                return Ok(frame);
            }
        }
    }

    /// Time left before the frame in flight is abandoned, or `None` when
    /// there is no frame or no deadline.
    fn time_left(&self) -> Option<Duration> {
        let acc = self.accumulator.as_ref()?;
        let timeout = self.config.frame_timeout?;
        Some(timeout.saturating_sub(acc.started.elapsed()))
    }

    /// Abandon the frame in flight if it has outlived `frame_timeout`.
    fn check_deadline(&mut self) -> crate::Result<()> {
        let (Some(acc), Some(timeout)) = (&self.accumulator, self.config.frame_timeout) else {
            return Ok(());
        };
        if acc.started.elapsed() < timeout {
            return Ok(());
        }
        let err = RenderError::Timeout {
            generation: acc.generation,
            waited: timeout,
        };
        Err(self.fail_frame(err))
    }

    /// Apply one worker message to the current frame.
    ///
    /// Results from other generations are dropped. A failure abandons the
    /// frame, notifies the sink, and is returned as the error.
    pub fn handle_message(&mut self, message: WorkerMessage) -> crate::Result<Option<Frame>> {
        let generation = message.generation();
        let index = message.index();

        let Some(acc) = self.accumulator.as_mut().filter(|a| a.generation == generation) else {
            self.stale_discarded += 1;
            trace!(generation, index, current = self.generation, "Discarding stale tile");
            return Ok(None);
        };

        match message {
            WorkerMessage::Failed { message, .. } => {
                let err = RenderError::WorkerFailed {
                    generation,
                    tile: index,
                    message,
                };
                Err(self.fail_frame(err))
            }
            WorkerMessage::Completed { result, .. } => {
                if index >= acc.expected_count || acc.received[index] {
                    debug!(generation, index, "Ignoring duplicate or unknown tile");
                    return Ok(None);
                }
                acc.received[index] = true;
                acc.collected.push(*result);

                let (done, total) = (acc.collected.len(), acc.expected_count);
                debug!(generation, done, total, "Tile received");
                self.sink.on_progress(done, total);

                if !acc.is_complete() {
                    return Ok(None);
                }
                let Some(acc) = self.accumulator.take() else {
                    return Ok(None);
                };
                let frame = self.finish_frame(acc);
                self.sink.on_frame(&frame);
                Ok(Some(frame))
            }
        }
    }

    fn finish_frame(&self, acc: FrameAccumulator) -> Frame {
        let FrameAccumulator {
            generation,
            job,
            mut collected,
            started,
            ..
        } = acc;

        collected.sort_by_key(|t| (t.request.origin_y, t.request.origin_x));
        let global_max = collected
            .iter()
            .map(|t| t.local_max_iterations)
            .max()
            .unwrap_or(0);

        let mut iterations = IterationBuffer::new(
            self.config.canvas_width,
            self.config.canvas_height,
            job.params.max_iterations,
            job.record_escape_radius,
        );
        for tile in &collected {
            iterations.blit_tile(tile);
        }
        let pixels = self.config.palette.colorize(&iterations, global_max);

        let elapsed = started.elapsed();
        info!(
            generation,
            elapsed_ms = elapsed.as_millis(),
            global_max,
            tiles = collected.len(),
            "Frame complete"
        );

        Frame {
            generation,
            view: job.view,
            global_max,
            tile_count: collected.len(),
            iterations,
            pixels,
            elapsed,
        }
    }

    /// Abandon the frame in flight and tell the sink why.
    fn fail_frame(&mut self, err: RenderError) -> RenderError {
        warn!(error = %err, "Frame abandoned");
        self.invalidate("frame failed");
        self.sink.on_error(&err);
        err
    }

    /// Move to a fresh generation so nothing already dispatched can land in
    /// a later frame.
    fn invalidate(&mut self, reason: &str) {
        if let Some(acc) = self.accumulator.take() {
            debug!(
                generation = acc.generation,
                collected = acc.collected.len(),
                expected = acc.expected_count,
                reason,
                "Abandoning frame in progress"
            );
        }
        self.generation += 1;
    }
}

fn check_canvas(width: u32, height: u32) -> crate::Result<()> {
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidDimensions { width, height });
    }
    Ok(())
}

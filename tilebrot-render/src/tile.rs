use serde::{Deserialize, Serialize};

use tilebrot_core::{FractalParams, Grid, PlaneExtent, ViewState};

use crate::error::RenderError;

/// Everything about a frame that is the same for every strip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderJob {
    pub view: ViewState,
    pub params: FractalParams,
    pub extent: PlaneExtent,
    /// Ask workers to keep `|z|²` at escape for every pixel.
    pub record_escape_radius: bool,
}

impl RenderJob {
    pub fn new(view: ViewState) -> Self {
        Self {
            view,
            params: FractalParams::default(),
            extent: PlaneExtent::default(),
            record_escape_radius: false,
        }
    }
}

/// One worker's assignment: a pixel rectangle plus the full-canvas context
/// needed to map it onto the plane without looking at any other tile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileRequest {
    /// Pixel x of the top-left corner.
    pub origin_x: u32,
    /// Pixel y of the top-left corner.
    pub origin_y: u32,
    pub width: u32,
    pub height: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub job: RenderJob,
}

/// What a worker sends back for one [`TileRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileResult {
    /// The request this result answers, echoed back unchanged.
    pub request: TileRequest,
    /// `width × height` escape counts; `max_iterations` marks interior.
    pub iterations: Grid<u32>,
    /// `|z|²` at escape, present only when the job asked for it.
    pub escape_radius_sq: Option<Grid<f64>>,
    /// Largest escape count in the tile, ignoring interior pixels.
    pub local_max_iterations: u32,
}

/// Split a canvas into `worker_count` full-width horizontal strips.
///
/// Every strip is `ceil(canvas_height / worker_count)` rows tall except the
/// last, which is clipped to the canvas. When there are more workers than
/// rows the trailing strips would be empty; those are not emitted, so the
/// result can be shorter than `worker_count` but never leaves a row out.
pub fn partition(
    canvas_width: u32,
    canvas_height: u32,
    worker_count: usize,
    job: &RenderJob,
) -> crate::Result<Vec<TileRequest>> {
    if canvas_width == 0 || canvas_height == 0 {
        return Err(RenderError::InvalidDimensions {
            width: canvas_width,
            height: canvas_height,
        });
    }
    if worker_count == 0 {
        return Err(RenderError::InvalidWorkerCount(worker_count));
    }

    let workers = u32::try_from(worker_count).unwrap_or(u32::MAX);
    let strip_height = canvas_height.div_ceil(workers);

    let mut tiles = Vec::with_capacity(worker_count);
    let mut y = 0;
    while y < canvas_height && tiles.len() < worker_count {
        let height = strip_height.min(canvas_height - y);
        tiles.push(TileRequest {
            origin_x: 0,
            origin_y: y,
            width: canvas_width,
            height,
            canvas_width,
            canvas_height,
            job: *job,
        });
        y += height;
    }
    Ok(tiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> RenderJob {
        RenderJob::new(ViewState::default())
    }

    fn assert_exact_cover(width: u32, height: u32, workers: usize) {
        let tiles = partition(width, height, workers, &job()).unwrap();
        assert!(tiles.len() <= workers);
        let mut covered = vec![false; (width * height) as usize];
        for tile in &tiles {
            assert!(tile.height > 0);
            assert!(tile.origin_y + tile.height <= height, "strip past canvas bottom");
            for py in tile.origin_y..tile.origin_y + tile.height {
                for px in tile.origin_x..tile.origin_x + tile.width {
                    let idx = (py * width + px) as usize;
                    assert!(!covered[idx], "pixel ({px}, {py}) covered twice");
                    covered[idx] = true;
                }
            }
        }
        assert!(
            covered.iter().all(|&c| c),
            "{width}×{height} / {workers}: all pixels must be covered"
        );
    }

    #[test]
    fn strips_cover_canvas_exactly() {
        for &(w, h) in &[(1, 1), (4, 4), (7, 13), (200, 150), (3, 2), (5, 97)] {
            for workers in 1..=12 {
                assert_exact_cover(w, h, workers);
            }
        }
    }

    #[test]
    fn even_split_gives_equal_strips() {
        let tiles = partition(4, 4, 2, &job()).unwrap();
        assert_eq!(tiles.len(), 2);
        assert_eq!((tiles[0].origin_y, tiles[0].height), (0, 2));
        assert_eq!((tiles[1].origin_y, tiles[1].height), (2, 2));
        assert!(tiles.iter().all(|t| t.width == 4 && t.origin_x == 0));
    }

    #[test]
    fn last_strip_is_clipped() {
        let tiles = partition(10, 10, 4, &job()).unwrap();
        let heights: Vec<_> = tiles.iter().map(|t| t.height).collect();
        assert_eq!(heights, vec![3, 3, 3, 1]);
    }

    #[test]
    fn more_workers_than_rows() {
        let tiles = partition(8, 2, 5, &job()).unwrap();
        assert_eq!(tiles.len(), 2);
        assert_eq!(tiles[1].origin_y, 1);
    }

    #[test]
    fn requests_carry_canvas_and_view() {
        let view = ViewState::new(-0.5, 0.25, 3.0).unwrap();
        let tiles = partition(64, 48, 3, &RenderJob::new(view)).unwrap();
        for tile in &tiles {
            assert_eq!((tile.canvas_width, tile.canvas_height), (64, 48));
            assert_eq!(tile.job.view, view);
        }
    }

    #[test]
    fn rejects_bad_configuration() {
        assert!(matches!(
            partition(0, 10, 2, &job()),
            Err(RenderError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            partition(10, 0, 2, &job()),
            Err(RenderError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            partition(10, 10, 0, &job()),
            Err(RenderError::InvalidWorkerCount(0))
        ));
    }
}

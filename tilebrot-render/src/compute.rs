use tilebrot_core::{evaluate, Grid};

use crate::tile::{TileRequest, TileResult};

/// Evaluate the escape-time kernel over every pixel of one tile.
///
/// Pure and deterministic: the same request always yields a bit-identical
/// result, whichever worker runs it and whatever else is in flight.
pub fn compute_tile(request: &TileRequest) -> TileResult {
    let job = &request.job;
    let max_iter = job.params.max_iterations;
    let threshold_sq = job.params.escape_radius_sq();
    let window = job.view.window(&job.extent);

    let mut iterations = Grid::filled(request.width, request.height, 0u32);
    let mut radii = job
        .record_escape_radius
        .then(|| Grid::filled(request.width, request.height, 0.0f64));
    let mut local_max = 0;

    for (y, py) in (request.origin_y..request.origin_y + request.height).enumerate() {
        for (x, px) in (request.origin_x..request.origin_x + request.width).enumerate() {
            let c = window.pixel_to_complex(px, py, request.canvas_width, request.canvas_height);
            let escape = evaluate(c.re, c.im, max_iter, threshold_sq);

            // Interior pixels carry the sentinel and must not stretch the
            // colour range.
            if !escape.is_interior(max_iter) && escape.iterations > local_max {
                local_max = escape.iterations;
            }
            iterations.set(x as u32, y as u32, escape.iterations);
            if let Some(radii) = radii.as_mut() {
                radii.set(x as u32, y as u32, escape.escape_radius_sq());
            }
        }
    }

    TileResult {
        request: *request,
        iterations,
        escape_radius_sq: radii,
        local_max_iterations: local_max,
    }
}

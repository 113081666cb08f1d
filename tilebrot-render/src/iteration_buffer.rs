use crate::tile::TileResult;

/// Per-pixel escape data for a full frame, assembled from tile results.
///
/// This is the raw output of the workers before coloring. Each tile is
/// written at its own origin, so assembly does not depend on the order in
/// which results arrived.
#[derive(Debug, Clone)]
pub struct IterationBuffer {
    pub width: u32,
    pub height: u32,
    pub max_iterations: u32,
    pub counts: Vec<u32>,
    /// `|z|²` at escape, present when every tile recorded it.
    pub escape_radius_sq: Option<Vec<f64>>,
}

impl IterationBuffer {
    /// A buffer with every pixel marked interior.
    pub fn new(width: u32, height: u32, max_iterations: u32, with_radii: bool) -> Self {
        let size = width as usize * height as usize;
        Self {
            width,
            height,
            max_iterations,
            counts: vec![max_iterations; size],
            escape_radius_sq: with_radii.then(|| vec![0.0; size]),
        }
    }

    /// Copy a tile's data into the region its request describes.
    pub fn blit_tile(&mut self, tile: &TileResult) {
        let req = &tile.request;
        if req.origin_x >= self.width {
            return;
        }
        let copy_w = req.width.min(self.width - req.origin_x) as usize;
        for py in 0..req.height {
            let buf_y = req.origin_y + py;
            if buf_y >= self.height {
                break;
            }
            let dst_start = buf_y as usize * self.width as usize + req.origin_x as usize;
            self.counts[dst_start..dst_start + copy_w]
                .copy_from_slice(&tile.iterations.row(py)[..copy_w]);
            if let (Some(dst), Some(src)) = (self.escape_radius_sq.as_mut(), &tile.escape_radius_sq) {
                dst[dst_start..dst_start + copy_w].copy_from_slice(&src.row(py)[..copy_w]);
            }
        }
    }

    #[inline]
    pub fn count(&self, x: u32, y: u32) -> u32 {
        self.counts[y as usize * self.width as usize + x as usize]
    }
}

use serde::{Deserialize, Serialize};

/// A dense, row-major 2D array.
///
/// Used for per-tile iteration counts and escape radii. Index `(x, y)` is
/// column `x` of row `y`, both relative to the grid's own origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: u32,
    height: u32,
    data: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// A `width × height` grid with every cell set to `fill`.
    pub fn filled(width: u32, height: u32, fill: T) -> Self {
        Self {
            width,
            height,
            data: vec![fill; width as usize * height as usize],
        }
    }
}

impl<T> Grid<T> {
    /// Wrap an existing row-major buffer.
    ///
    /// Returns `None` if `data.len() != width * height`.
    pub fn from_vec(width: u32, height: u32, data: Vec<T>) -> Option<Self> {
        if data.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<&T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(self.index(x, y))
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: T) {
        debug_assert!(x < self.width && y < self.height);
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Row `y` as a slice.
    pub fn row(&self, y: u32) -> &[T] {
        let start = y as usize * self.width as usize;
        &self.data[start..start + self.width as usize]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        // `chunks_exact(0)` panics, and a zero-width grid has no cells anyway.
        self.data.chunks_exact(self.width.max(1) as usize)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

//! Height grid input data
//!
//! Samples are stored row-major: the row index runs along the depth (Z) axis
//! and the column index along the width (X) axis, so sample `(x, z)` lives at
//! `heights[z * width + x]`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rectangular grid of height samples
///
/// Dimensions are not checked against the sample count on assignment; the
/// build pipeline validates them when a shape is requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeightGrid {
    /// Number of columns (X axis)
    pub width: i32,
    /// Number of rows (Z axis)
    pub depth: i32,
    /// Row-major samples
    pub heights: Vec<f32>,
}

impl HeightGrid {
    pub fn new(width: i32, depth: i32, heights: Vec<f32>) -> Self {
        Self {
            width,
            depth,
            heights,
        }
    }

    /// A grid where every sample has the same height
    pub fn flat(width: i32, depth: i32, height: f32) -> Self {
        Self::from_fn(width, depth, |_, _| height)
    }

    /// Build a grid by evaluating `f(x, z)` for every sample in scan order
    pub fn from_fn(width: i32, depth: i32, mut f: impl FnMut(i32, i32) -> f32) -> Self {
        let mut heights = Vec::with_capacity((width.max(0) as usize) * (depth.max(0) as usize));
        for z in 0..depth {
            for x in 0..width {
                heights.push(f(x, z));
            }
        }
        Self::new(width, depth, heights)
    }

    pub fn height_count(&self) -> usize {
        self.heights.len()
    }

    /// `width * depth`, widened so that it cannot overflow
    pub fn expected_count(&self) -> i64 {
        i64::from(self.width) * i64::from(self.depth)
    }

    /// Whether the sample count matches the dimensions
    pub fn is_consistent(&self) -> bool {
        self.height_count() as i64 == self.expected_count()
    }

    /// Index of sample `(x, z)` in `heights`, or `None` outside the grid
    pub fn index(&self, x: i32, z: i32) -> Option<usize> {
        if x < 0 || z < 0 || x >= self.width || z >= self.depth {
            return None;
        }
        Some(z as usize * self.width as usize + x as usize)
    }

    /// Sample at `(x, z)`, or `None` outside the grid
    pub fn height(&self, x: i32, z: i32) -> Option<f32> {
        self.index(x, z).and_then(|i| self.heights.get(i).copied())
    }

    /// Offsets that center the grid on the origin in the XZ plane
    ///
    /// Samples are one unit apart, so the grid spans `width - 1` by
    /// `depth - 1` units.
    pub fn centering_offset(&self) -> (f32, f32) {
        let quad_count_x = self.width - 1;
        let quad_count_z = self.depth - 1;
        (-(quad_count_x as f32) / 2.0, -(quad_count_z as f32) / 2.0)
    }

    /// Copy of the samples with the row order reversed
    ///
    /// Row `z` of the grid becomes row `depth - 1 - z`; columns keep their
    /// order. Only meaningful for a consistent grid.
    pub fn mirrored_rows(&self) -> Vec<f32> {
        let width = self.width.max(0) as usize;
        if width == 0 {
            return Vec::new();
        }
        self.heights
            .chunks_exact(width)
            .rev()
            .flatten()
            .copied()
            .collect()
    }

    pub fn summary(&self) -> GridSummary {
        GridSummary {
            height_count: self.height_count(),
            width: self.width,
            depth: self.depth,
        }
    }
}

impl fmt::Display for HeightGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.summary(), f)
    }
}

/// Compact description of a grid used in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSummary {
    pub height_count: usize,
    pub width: i32,
    pub depth: i32,
}

impl fmt::Display for GridSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{height_count={} width={} depth={}}}",
            self.height_count, self.width, self.depth
        )
    }
}

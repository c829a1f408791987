//! Regular-grid height field
//!
//! Samples form a square `sample_count x sample_count` grid. The grid is
//! divided into blocks of `block_size x block_size` quads; every block keeps
//! the height range of the samples it owns and each sample is stored as a
//! `bits_per_sample` wide index into that range. Triangles are never stored,
//! they are derived from the samples on demand.
//!
//! Block ranges only serve quantization. Ray casts and height queries use the
//! default [`CollisionShape::cast_ray`] and test every triangle.
//!
//! Quad `(x, y)` is split along the diagonal from `(x, y)` to `(x + 1, y + 1)`:
//!
//! ```text
//!  (x, y+1) ---- (x+1, y+1)
//!     |        /     |
//!     |     /        |
//!   (x, y) ------ (x+1, y)
//! ```

use super::active_edges::ActiveEdges;
use super::triangle::to_point;
use super::{CollisionShape, ShapeKind};
use crate::error::EngineError;
use glam::Vec3;
use rapier3d::parry::bounding_volume::Aabb;
use rapier3d::parry::shape::Triangle;

/// Settings for creating a [`HeightFieldShape`]
#[derive(Debug, Clone, PartialEq)]
pub struct HeightFieldSettings {
    /// Row-major samples, `sample_count` per row
    pub samples: Vec<f32>,
    /// Position of sample `(0, 0)`
    pub offset: Vec3,
    /// Spacing along X and Z, multiplier for heights along Y
    pub scale: Vec3,
    /// Samples per row and per column
    pub sample_count: u32,
    /// Quads per block side
    pub block_size: u32,
    pub bits_per_sample: u32,
    /// Cosine of the active edge threshold angle
    pub active_edge_cos_threshold: f32,
}

impl HeightFieldSettings {
    pub const DEFAULT_BLOCK_SIZE: u32 = 2;
    pub const MIN_BLOCK_SIZE: u32 = 2;
    pub const MAX_BLOCK_SIZE: u32 = 8;
    pub const MAX_BITS_PER_SAMPLE: u32 = 8;

    /// cos(5°)
    pub const DEFAULT_ACTIVE_EDGE_COS_THRESHOLD: f32 = 0.996_195;

    pub fn new(samples: Vec<f32>, offset: Vec3, scale: Vec3, sample_count: u32) -> Self {
        Self {
            samples,
            offset,
            scale,
            sample_count,
            block_size: Self::DEFAULT_BLOCK_SIZE,
            bits_per_sample: Self::MAX_BITS_PER_SAMPLE,
            active_edge_cos_threshold: Self::DEFAULT_ACTIVE_EDGE_COS_THRESHOLD,
        }
    }

    /// Smallest bit depth that stores every sample within `max_error`
    ///
    /// Falls back to [`Self::MAX_BITS_PER_SAMPLE`] when no bit depth is
    /// precise enough. Only meaningful for settings that pass validation.
    pub fn calculate_bits_per_sample_for_error(&self, max_error: f32) -> u32 {
        let Some(layout) = BlockLayout::new(self.sample_count, self.block_size) else {
            return Self::MAX_BITS_PER_SAMPLE;
        };
        let ranges = layout.ranges(&self.samples);

        (1..=Self::MAX_BITS_PER_SAMPLE)
            .find(|&bits| {
                self.samples.iter().enumerate().all(|(index, &height)| {
                    let range = ranges[layout.owner_of_index(index)];
                    let stored = range.dequantize(range.quantize(height, bits), bits);
                    (stored - height).abs() <= max_error
                })
            })
            .unwrap_or(Self::MAX_BITS_PER_SAMPLE)
    }

    fn validate(&self) -> Result<BlockLayout, EngineError> {
        if !(Self::MIN_BLOCK_SIZE..=Self::MAX_BLOCK_SIZE).contains(&self.block_size) {
            return Err(EngineError::new(format!(
                "block size must be between {} and {}, got {}",
                Self::MIN_BLOCK_SIZE,
                Self::MAX_BLOCK_SIZE,
                self.block_size
            )));
        }
        if !(1..=Self::MAX_BITS_PER_SAMPLE).contains(&self.bits_per_sample) {
            return Err(EngineError::new(format!(
                "bits per sample must be between 1 and {}, got {}",
                Self::MAX_BITS_PER_SAMPLE,
                self.bits_per_sample
            )));
        }
        if self.sample_count < self.block_size {
            return Err(EngineError::new(format!(
                "sample count {} is smaller than the block size {}",
                self.sample_count, self.block_size
            )));
        }
        let expected = self.sample_count as usize * self.sample_count as usize;
        if self.samples.len() != expected {
            return Err(EngineError::new(format!(
                "expected {} samples for a sample count of {}, got {}",
                expected,
                self.sample_count,
                self.samples.len()
            )));
        }
        if self.samples.iter().any(|h| !h.is_finite()) {
            return Err(EngineError::new("height field samples must be finite"));
        }
        if !self.offset.is_finite() {
            return Err(EngineError::new("height field offset must be finite"));
        }
        if !self.scale.is_finite() || self.scale.cmpeq(Vec3::ZERO).any() {
            return Err(EngineError::new(
                "height field scale must be finite and non-zero",
            ));
        }

        let layout = BlockLayout::new(self.sample_count, self.block_size)
            .ok_or_else(|| EngineError::new("height field has no quads"))?;
        if layout
            .ranges(&self.samples)
            .iter()
            .any(|range| !(range.max - range.min).is_finite())
        {
            return Err(EngineError::new(
                "height field block range is too large to quantize",
            ));
        }

        Ok(layout)
    }

    /// Validate the settings and build the shape
    pub fn create(self) -> Result<HeightFieldShape, EngineError> {
        let layout = self.validate()?;
        let ranges = layout.ranges(&self.samples);
        let bits = self.bits_per_sample;

        let mut quantized = Vec::with_capacity(self.samples.len());
        let mut max_error = 0.0f32;
        for (index, &height) in self.samples.iter().enumerate() {
            let range = ranges[layout.owner_of_index(index)];
            let stored = range.quantize(height, bits);
            let error = (range.dequantize(stored, bits) - height).abs();
            if !error.is_finite() {
                return Err(EngineError::new(format!(
                    "sample {} cannot be quantized within its block range",
                    index
                )));
            }
            max_error = max_error.max(error);
            quantized.push(stored);
        }

        let mut shape = HeightFieldShape {
            sample_count: self.sample_count,
            block_size: self.block_size,
            bits_per_sample: bits,
            offset: self.offset,
            scale: self.scale,
            layout,
            ranges,
            quantized,
            max_error,
            active_edges: ActiveEdges::default(),
            aabb: Aabb::new_invalid(),
        };

        let positions: Vec<Vec3> = (0..shape.sample_count)
            .flat_map(|y| (0..shape.sample_count).map(move |x| (x, y)))
            .map(|(x, y)| shape.position(x, y))
            .collect();

        let mut aabb = Aabb::new_invalid();
        for position in &positions {
            aabb.take_point(to_point(*position));
        }
        shape.aabb = aabb;

        let triangles: Vec<[u32; 3]> = shape.triangle_indices().collect();
        shape.active_edges =
            ActiveEdges::compute(&positions, &triangles, self.active_edge_cos_threshold);

        Ok(shape)
    }
}

/// Height range of one block
#[derive(Debug, Clone, Copy, PartialEq)]
struct BlockRange {
    min: f32,
    max: f32,
}

impl BlockRange {
    fn levels(bits: u32) -> u32 {
        (1 << bits) - 1
    }

    fn quantize(&self, height: f32, bits: u32) -> u8 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0;
        }
        let levels = Self::levels(bits) as f32;
        ((height - self.min) / span * levels)
            .round()
            .clamp(0.0, levels) as u8
    }

    fn dequantize(&self, stored: u8, bits: u32) -> f32 {
        let levels = Self::levels(bits);
        if stored as u32 >= levels {
            return self.max;
        }
        let span = self.max - self.min;
        self.min + span * (stored as f32 / levels as f32)
    }
}

/// How samples map onto blocks
///
/// A sample belongs to the block containing the quad it is the lower corner
/// of; samples on the far edges belong to the last block in that direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlockLayout {
    sample_count: u32,
    block_size: u32,
    blocks_per_side: u32,
}

impl BlockLayout {
    fn new(sample_count: u32, block_size: u32) -> Option<Self> {
        if sample_count < 2 || block_size == 0 {
            return None;
        }
        let quads = sample_count - 1;
        Some(Self {
            sample_count,
            block_size,
            blocks_per_side: quads.div_ceil(block_size),
        })
    }

    fn block_coord(&self, sample: u32) -> u32 {
        (sample / self.block_size).min(self.blocks_per_side - 1)
    }

    fn owner(&self, x: u32, y: u32) -> usize {
        (self.block_coord(y) * self.blocks_per_side + self.block_coord(x)) as usize
    }

    fn owner_of_index(&self, index: usize) -> usize {
        let x = index as u32 % self.sample_count;
        let y = index as u32 / self.sample_count;
        self.owner(x, y)
    }

    fn ranges(&self, samples: &[f32]) -> Vec<BlockRange> {
        let block_count = (self.blocks_per_side * self.blocks_per_side) as usize;
        let mut ranges = vec![
            BlockRange {
                min: f32::MAX,
                max: f32::MIN,
            };
            block_count
        ];

        for (index, &height) in samples.iter().enumerate() {
            let range = &mut ranges[self.owner_of_index(index)];
            range.min = range.min.min(height);
            range.max = range.max.max(height);
        }

        ranges
    }
}

/// Quantized regular-grid height field
#[derive(Debug, Clone)]
pub struct HeightFieldShape {
    sample_count: u32,
    block_size: u32,
    bits_per_sample: u32,
    offset: Vec3,
    scale: Vec3,
    layout: BlockLayout,
    ranges: Vec<BlockRange>,
    quantized: Vec<u8>,
    max_error: f32,
    active_edges: ActiveEdges,
    aabb: Aabb,
}

impl HeightFieldShape {
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Blocks along one side of the grid
    pub fn blocks_per_side(&self) -> u32 {
        self.layout.blocks_per_side
    }

    pub fn bits_per_sample(&self) -> u32 {
        self.bits_per_sample
    }

    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Largest difference between a stored sample and its source height
    pub fn max_quantization_error(&self) -> f32 {
        self.max_error
    }

    /// Stored height of sample `(x, y)` before scaling
    pub fn sample(&self, x: u32, y: u32) -> f32 {
        let index = (y * self.sample_count + x) as usize;
        let range = self.ranges[self.layout.owner(x, y)];
        range.dequantize(self.quantized[index], self.bits_per_sample)
    }

    /// Shape-space position of sample `(x, y)`
    pub fn position(&self, x: u32, y: u32) -> Vec3 {
        self.offset + self.scale * Vec3::new(x as f32, self.sample(x, y), y as f32)
    }

    /// Sample-index triangles, two per quad in scan order
    pub fn triangle_indices(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        let count = self.sample_count;
        let quads = count - 1;
        let index = move |x: u32, y: u32| y * count + x;

        (0..quads)
            .flat_map(move |y| (0..quads).map(move |x| (x, y)))
            .flat_map(move |(x, y)| {
                let v00 = index(x, y);
                let v10 = index(x + 1, y);
                let v01 = index(x, y + 1);
                let v11 = index(x + 1, y + 1);
                [[v00, v01, v11], [v00, v11, v10]]
            })
    }
}

impl CollisionShape for HeightFieldShape {
    fn kind(&self) -> ShapeKind {
        ShapeKind::HeightField
    }

    fn local_aabb(&self) -> Aabb {
        self.aabb
    }

    fn triangle_count(&self) -> usize {
        let quads = (self.sample_count - 1) as usize;
        quads * quads * 2
    }

    fn visit_triangles(&self, visitor: &mut dyn FnMut(&Triangle)) {
        let count = self.sample_count;
        let vertex = |index: u32| to_point(self.position(index % count, index / count));

        for [a, b, c] in self.triangle_indices() {
            visitor(&Triangle::new(vertex(a), vertex(b), vertex(c)));
        }
    }

    fn active_edge_count(&self) -> usize {
        self.active_edges.count()
    }

    fn as_height_field(&self) -> Option<&HeightFieldShape> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(sample_count: u32, f: impl Fn(u32, u32) -> f32) -> HeightFieldSettings {
        let samples = (0..sample_count)
            .flat_map(|y| (0..sample_count).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        HeightFieldSettings::new(samples, Vec3::ZERO, Vec3::ONE, sample_count)
    }

    #[test]
    fn test_flat_field_needs_one_bit() {
        let settings = settings(5, |_, _| 3.0);
        assert_eq!(settings.calculate_bits_per_sample_for_error(0.0), 1);
    }

    #[test]
    fn test_two_level_blocks_need_one_bit() {
        // Every block only holds its own min and max
        let settings = settings(5, |x, _| if x % 2 == 0 { 0.0 } else { 1.0 });
        assert_eq!(settings.calculate_bits_per_sample_for_error(0.0), 1);
    }

    #[test]
    fn test_bits_fall_back_to_max() {
        let settings = settings(5, |x, y| (x * 7 + y * 3) as f32 * 0.013);
        assert_eq!(
            settings.calculate_bits_per_sample_for_error(0.0),
            HeightFieldSettings::MAX_BITS_PER_SAMPLE
        );
        // A generous tolerance is met with fewer bits
        assert!(settings.calculate_bits_per_sample_for_error(1.0) < 8);
    }

    #[test]
    fn test_quantization_error_is_bounded() {
        let mut settings = settings(9, |x, y| ((x as f32) * 0.7).sin() + y as f32 * 0.25);
        settings.bits_per_sample = 8;
        let shape = settings.clone().create().unwrap();

        for y in 0..9 {
            for x in 0..9 {
                let source = settings.samples[(y * 9 + x) as usize];
                assert!((shape.sample(x, y) - source).abs() <= shape.max_quantization_error());
            }
        }
        // Block spans stay below 3 units, so 8 bits keep the error small
        assert!(shape.max_quantization_error() < 3.0 / 255.0);
    }

    #[test]
    fn test_block_layout() {
        let shape = settings(5, |_, _| 0.0).create().unwrap();
        assert_eq!(shape.block_size(), 2);
        assert_eq!(shape.blocks_per_side(), 2);
        assert_eq!(shape.triangle_count(), 32);

        // 5 quads need 3 blocks of 2
        let shape = settings(6, |_, _| 0.0).create().unwrap();
        assert_eq!(shape.blocks_per_side(), 3);
    }

    #[test]
    fn test_triangulation_follows_main_diagonal() {
        let shape = settings(2, |_, _| 0.0).create().unwrap();
        let triangles: Vec<_> = shape.triangle_indices().collect();
        assert_eq!(triangles, vec![[0, 2, 3], [0, 3, 1]]);
    }

    #[test]
    fn test_positions_use_offset_and_scale() {
        let mut settings = settings(3, |x, y| (x + y) as f32);
        settings.offset = Vec3::new(-1.0, 0.5, -1.0);
        settings.scale = Vec3::new(2.0, 1.0, 2.0);
        let shape = settings.create().unwrap();

        let p = shape.position(2, 1);
        assert!((p - Vec3::new(3.0, 3.5, 1.0)).length() < 0.02);

        let aabb = shape.local_aabb();
        assert!((aabb.mins.x + 1.0).abs() < 1e-6);
        assert!((aabb.maxs.z - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_triangles_face_up() {
        let shape = settings(3, |x, y| (x * y) as f32 * 0.1).create().unwrap();
        shape.visit_triangles(&mut |tri| {
            assert!(crate::shape::triangle_normal(tri).y > 0.0);
        });
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let mut bad = settings(3, |_, _| 0.0);
        bad.samples.pop();
        assert!(bad.create().is_err());

        let mut bad = settings(3, |_, _| 0.0);
        bad.samples[4] = f32::NAN;
        let err = bad.create().unwrap_err();
        assert!(err.message().contains("finite"));

        let mut bad = settings(3, |_, _| 0.0);
        bad.block_size = 1;
        assert!(bad.create().is_err());

        let mut bad = settings(3, |_, _| 0.0);
        bad.bits_per_sample = 9;
        assert!(bad.create().is_err());

        let mut bad = settings(3, |_, _| 0.0);
        bad.block_size = 4;
        assert!(bad.create().is_err(), "sample count below block size");

        let mut bad = settings(3, |_, _| 0.0);
        bad.scale = Vec3::new(1.0, 0.0, 1.0);
        assert!(bad.create().is_err());
    }

    #[test]
    fn test_rejects_overflowing_block_range() {
        // Each sample is finite but the block span is not
        let bad = settings(4, |x, y| if (x + y) % 2 == 0 { -3.0e38 } else { 3.0e38 });
        let err = bad.create().unwrap_err();
        assert!(err.message().contains("too large"));

        // Near the limit is still fine
        let ok = settings(4, |x, y| if (x + y) % 2 == 0 { -1.0e38 } else { 1.0e38 });
        let shape = ok.create().unwrap();
        assert!(shape.max_quantization_error().is_finite());
    }
}

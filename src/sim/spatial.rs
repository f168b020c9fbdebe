//! Bucketed obstacle index
//!
//! Blocking obstacles are quantized into integer cells so "is this critter
//! touching a rock?" is a hash lookup instead of a scan over the field.
//! One index exists per bucket granularity; all of them are built at track
//! setup and stay read-only while a race runs.

use std::collections::{HashMap, HashSet};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::state::Obstacle;
use crate::error::RaceError;

/// Cell granularity per axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BucketSize {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl BucketSize {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Same granularity on every axis
    pub fn uniform(size: f32) -> Self {
        Self::new(size, size, size)
    }

    pub fn validate(&self) -> Result<(), RaceError> {
        for (axis, v) in [("x", self.x), ("y", self.y), ("z", self.z)] {
            if !(v.is_finite() && v > 0.0) {
                return Err(RaceError::invalid(format!(
                    "bucket size on {axis} must be positive, got {v}"
                )));
            }
        }
        Ok(())
    }

    /// Hashable identity (bit pattern of each axis)
    fn key(&self) -> BucketKey {
        BucketKey(self.x.to_bits(), self.y.to_bits(), self.z.to_bits())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct BucketKey(u32, u32, u32);

/// Integer cell coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellKey(pub i32, pub i32, pub i32);

/// Set of occupied cells for one bucket size
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    bucket: BucketSize,
    cells: HashSet<CellKey>,
}

impl SpatialIndex {
    /// Quantize every blocking obstacle into the cell set
    pub fn build(obstacles: &[Obstacle], bucket: BucketSize) -> Result<Self, RaceError> {
        bucket.validate()?;
        let cells = obstacles
            .iter()
            .filter(|o| o.kind.is_blocking())
            .map(|o| quantize(o.pos, bucket))
            .collect();
        Ok(Self { bucket, cells })
    }

    pub fn bucket(&self) -> BucketSize {
        self.bucket
    }

    /// Number of distinct occupied cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// True if the cell of `point` is occupied
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.cells.contains(&quantize(point, self.bucket))
    }

    /// Test a critter of the given half width centred on `point`.
    ///
    /// Left edge, centre and right edge are checked in the same y/z cell so a
    /// wide critter cannot slip past a rock that only overlaps its side.
    pub fn query(&self, point: Vec3, half_width: f32) -> bool {
        [-half_width, 0.0, half_width]
            .iter()
            .any(|dx| self.contains_point(point + Vec3::new(*dx, 0.0, 0.0)))
    }
}

/// Cell containing `point` at the given granularity
pub fn quantize(point: Vec3, bucket: BucketSize) -> CellKey {
    CellKey(
        (point.x / bucket.x).floor() as i32,
        (point.y / bucket.y).floor() as i32,
        (point.z / bucket.z).floor() as i32,
    )
}

/// Prebuilt indices keyed by bucket size
#[derive(Debug, Clone, Default)]
pub struct ObstacleIndexCache {
    indices: HashMap<BucketKey, SpatialIndex>,
}

impl ObstacleIndexCache {
    /// Build one index per requested granularity
    pub fn build(obstacles: &[Obstacle], buckets: &[BucketSize]) -> Result<Self, RaceError> {
        let mut cache = Self::default();
        for bucket in buckets {
            cache.ensure(obstacles, *bucket)?;
        }
        Ok(cache)
    }

    /// Build the index for `bucket` if it is not cached yet
    pub fn ensure(
        &mut self,
        obstacles: &[Obstacle],
        bucket: BucketSize,
    ) -> Result<&SpatialIndex, RaceError> {
        bucket.validate()?;
        let index = match self.indices.entry(bucket.key()) {
            std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
            std::collections::hash_map::Entry::Vacant(e) => {
                let index = SpatialIndex::build(obstacles, bucket)?;
                log::debug!("Built obstacle index {:?} with {} cells", bucket, index.len());
                e.insert(index)
            }
        };
        Ok(&*index)
    }

    pub fn get(&self, bucket: BucketSize) -> Option<&SpatialIndex> {
        self.indices.get(&bucket.key())
    }

    /// Query a prebuilt index; an unknown granularity never reports a hit
    pub fn query(&self, bucket: BucketSize, point: Vec3, half_width: f32) -> bool {
        match self.get(bucket) {
            Some(index) => index.query(point, half_width),
            None => {
                log::warn!("Obstacle query with unbuilt bucket size {:?}", bucket);
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

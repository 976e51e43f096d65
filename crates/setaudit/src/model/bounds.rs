//! Axis-aligned bounding volumes.

use serde::{Deserialize, Serialize};

/// A point in model space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    /// Create a point.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    fn min(self, other: Point3) -> Point3 {
        Point3::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    fn max(self, other: Point3) -> Point3 {
        Point3::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }
}

/// Axis-aligned min/max box.
///
/// Invariant: `min <= max` componentwise. Constructors normalize swapped
/// corners and inflation never shrinks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingVolume {
    pub min: Point3,
    pub max: Point3,
}

impl BoundingVolume {
    /// Create a volume from two opposite corners in any order.
    pub fn new(a: Point3, b: Point3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create a volume from raw coordinates.
    pub fn from_coords(min: [f64; 3], max: [f64; 3]) -> Self {
        Self::new(
            Point3::new(min[0], min[1], min[2]),
            Point3::new(max[0], max[1], max[2]),
        )
    }

    /// Smallest volume containing both `self` and `other`.
    pub fn union(&self, other: &BoundingVolume) -> BoundingVolume {
        BoundingVolume {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Union of every volume in `volumes`, or `None` when there are none.
    pub fn union_all<'a>(volumes: impl IntoIterator<Item = &'a BoundingVolume>) -> Option<Self> {
        volumes
            .into_iter()
            .fold(None, |acc: Option<BoundingVolume>, v| match acc {
                Some(u) => Some(u.union(v)),
                None => Some(*v),
            })
    }

    /// Grow the volume by `distance` on every side. Negative distances are
    /// treated as zero.
    pub fn inflate(&self, distance: f64) -> BoundingVolume {
        let d = if distance.is_finite() { distance.max(0.0) } else { 0.0 };
        BoundingVolume {
            min: Point3::new(self.min.x - d, self.min.y - d, self.min.z - d),
            max: Point3::new(self.max.x + d, self.max.y + d, self.max.z + d),
        }
    }

    /// Inclusive AABB overlap test. Touching faces count as intersecting.
    pub fn intersects(&self, other: &BoundingVolume) -> bool {
        !(self.max.x < other.min.x
            || other.max.x < self.min.x
            || self.max.y < other.min.y
            || other.max.y < self.min.y
            || self.max.z < other.min.z
            || other.max.z < self.min.z)
    }

    /// Whether the point lies inside or on the boundary.
    pub fn contains_point(&self, p: &Point3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }
}

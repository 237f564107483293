use crate::{Interval, Ray, Vec3};

/// Axis-aligned bounding box stored as its min and max corners.
///
/// `Aabb::EMPTY` has inverted corners so that growing it by any point or box
/// yields exactly that point or box.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create an AABB from two corner points in any order.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Smallest box enclosing all `points`.
    pub fn enclosing<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        points
            .into_iter()
            .fold(Aabb::EMPTY, |acc, p| acc.grow_point(p))
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(a: &Aabb, b: &Aabb) -> Self {
        Self {
            min: a.min.min(b.min),
            max: a.max.max(b.max),
        }
    }

    /// Returns this box extended to include `p`.
    pub fn grow_point(&self, p: Vec3) -> Self {
        Self {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the longest extent.
    pub fn longest_axis(&self) -> usize {
        let extent = self.max - self.min;
        if extent.x > extent.y && extent.x > extent.z {
            0
        } else if extent.y > extent.z {
            1
        } else {
            2
        }
    }

    /// Slab test against the ray parameter range `ray_t`.
    ///
    /// Conservative: a ray that touches the box within `ray_t` is never
    /// rejected. Axis-parallel rays produce infinite reciprocal components;
    /// `f32::max`/`f32::min` discard the NaN produced when the origin lies on
    /// a slab plane, which keeps the test conservative.
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> bool {
        let inv_dir = ray.inv_direction();
        let mut t_min = ray_t.min;
        let mut t_max = ray_t.max;

        for axis in 0..3 {
            let mut t0 = (self.min[axis] - ray.origin[axis]) * inv_dir[axis];
            let mut t1 = (self.max[axis] - ray.origin[axis]) * inv_dir[axis];
            if inv_dir[axis] < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return false;
            }
        }

        true
    }
}

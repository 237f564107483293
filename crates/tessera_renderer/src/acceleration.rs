//! Bounding-volume acceleration structure.
//!
//! Triangles are grouped into `AccelerationVolume` leaves whose boxes are the
//! union of their members' bounds. Leaves sit under a binary hierarchy built
//! by recursive median split, so a ray skips every subtree whose box it
//! misses before any triangle test is attempted.

use tessera_math::{Aabb, Interval, Ray};

use crate::{Payload, Triangle};

/// Maximum triangles per leaf before splitting.
const LEAF_MAX_SIZE: usize = 4;

/// A bin of triangles with their enclosing box.
#[derive(Debug, Clone, Default)]
pub struct AccelerationVolume {
    triangles: Vec<Triangle>,
    bbox: Aabb,
}

impl AccelerationVolume {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.bbox = Aabb::surrounding(&self.bbox, &triangle.bounding_box());
        self.triangles.push(triangle);
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Conservative slab test: false only if the ray cannot reach the box
    /// within `ray_t`.
    pub fn aabb_test(&self, ray: &Ray, ray_t: Interval) -> bool {
        !self.is_empty() && self.bbox.hit(ray, ray_t)
    }

    fn closest_hit(&self, ray: &Ray, ray_t: Interval) -> Option<(Payload, &Triangle)> {
        if !self.aabb_test(ray, ray_t) {
            return None;
        }

        let mut closest = None;
        let mut range = ray_t;
        for triangle in &self.triangles {
            let payload = triangle.intersect(ray);
            if payload.is_hit_within(range) {
                range.max = payload.t;
                closest = Some((payload, triangle));
            }
        }
        closest
    }

    fn any_hit(&self, ray: &Ray, ray_t: Interval) -> Option<(Payload, &Triangle)> {
        if !self.aabb_test(ray, ray_t) {
            return None;
        }

        self.triangles.iter().find_map(|triangle| {
            let payload = triangle.intersect(ray);
            payload.is_hit_within(ray_t).then_some((payload, triangle))
        })
    }
}

impl FromIterator<Triangle> for AccelerationVolume {
    fn from_iter<I: IntoIterator<Item = Triangle>>(iter: I) -> Self {
        let mut volume = AccelerationVolume::new();
        for triangle in iter {
            volume.add_triangle(triangle);
        }
        volume
    }
}

/// BVH node - either a branch with two children or a leaf volume.
#[derive(Debug, Clone)]
pub enum BvhNode {
    /// Internal node with two children.
    Branch {
        left: Box<BvhNode>,
        right: Box<BvhNode>,
        bbox: Aabb,
    },
    /// Leaf holding a small number of triangles.
    Leaf(AccelerationVolume),
    /// No geometry.
    Empty,
}

impl BvhNode {
    /// Build a hierarchy over `triangles`.
    pub fn new(triangles: Vec<Triangle>) -> Self {
        if triangles.is_empty() {
            return BvhNode::Empty;
        }
        Self::build(triangles)
    }

    /// Recursive median split: sort by centroid along the axis of greatest
    /// centroid spread, split in half, recurse.
    fn build(mut triangles: Vec<Triangle>) -> Self {
        let n = triangles.len();
        if n <= LEAF_MAX_SIZE {
            return BvhNode::Leaf(triangles.into_iter().collect());
        }

        let bbox = triangles.iter().fold(Aabb::EMPTY, |acc, t| {
            Aabb::surrounding(&acc, &t.bounding_box())
        });
        let axis = Aabb::enclosing(triangles.iter().map(Triangle::centroid)).longest_axis();

        triangles.sort_unstable_by(|a, b| {
            a.centroid()[axis]
                .partial_cmp(&b.centroid()[axis])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let right_triangles = triangles.split_off(n / 2);
        let left = Self::build(triangles);
        let right = Self::build(right_triangles);

        BvhNode::Branch {
            left: Box::new(left),
            right: Box::new(right),
            bbox,
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        match self {
            BvhNode::Empty => Aabb::EMPTY,
            BvhNode::Leaf(volume) => volume.bounding_box(),
            BvhNode::Branch { bbox, .. } => *bbox,
        }
    }

    /// Nearest hit strictly inside `ray_t`. Ties keep the first hit found.
    pub fn closest_hit(&self, ray: &Ray, ray_t: Interval) -> Option<(Payload, &Triangle)> {
        match self {
            BvhNode::Empty => None,
            BvhNode::Leaf(volume) => volume.closest_hit(ray, ray_t),
            BvhNode::Branch { left, right, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return None;
                }

                let hit_left = left.closest_hit(ray, ray_t);

                // Only check right up to closest hit
                let right_max = hit_left.map_or(ray_t.max, |(payload, _)| payload.t);
                let hit_right = right.closest_hit(ray, Interval::new(ray_t.min, right_max));

                hit_right.or(hit_left)
            }
        }
    }

    /// First hit found strictly inside `ray_t`, in traversal order.
    pub fn any_hit(&self, ray: &Ray, ray_t: Interval) -> Option<(Payload, &Triangle)> {
        match self {
            BvhNode::Empty => None,
            BvhNode::Leaf(volume) => volume.any_hit(ray, ray_t),
            BvhNode::Branch { left, right, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return None;
                }
                left.any_hit(ray, ray_t)
                    .or_else(|| right.any_hit(ray, ray_t))
            }
        }
    }

    /// Number of leaf volumes.
    pub fn volume_count(&self) -> usize {
        match self {
            BvhNode::Empty => 0,
            BvhNode::Leaf(_) => 1,
            BvhNode::Branch { left, right, .. } => left.volume_count() + right.volume_count(),
        }
    }

    pub fn triangle_count(&self) -> usize {
        match self {
            BvhNode::Empty => 0,
            BvhNode::Leaf(volume) => volume.len(),
            BvhNode::Branch { left, right, .. } => left.triangle_count() + right.triangle_count(),
        }
    }
}

use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::orientation::Orientation;

/// Axis-aligned bounding volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    pub fn new(a: DVec3, b: DVec3) -> Self {
        Self { min: a.min(b), max: a.max(b) }
    }

    pub fn contains(&self, point: DVec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// First point where the ray `origin + t * direction` (t >= 0) meets the box.
    pub fn ray_entry(&self, origin: DVec3, direction: DVec3) -> Option<DVec3> {
        let mut t_min = 0.0_f64;
        let mut t_max = f64::INFINITY;

        for axis in 0..3 {
            let (o, d) = (origin[axis], direction[axis]);
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if d.abs() < 1.0e-12 {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let (near, far) = {
                let a = (lo - o) / d;
                let b = (hi - o) / d;
                if a <= b { (a, b) } else { (b, a) }
            };
            t_min = t_min.max(near);
            t_max = t_max.min(far);
            if t_min > t_max {
                return None;
            }
        }

        Some(origin + direction * t_min)
    }
}

/// Ranks candidate orientations and picks where on a target to aim.
pub trait OrientationPreference {
    fn compare(&self, a: &Orientation, b: &Orientation) -> Ordering;

    fn preferred_spot(&self, eyes: DVec3, range: f64) -> DVec3;

    fn preferred_spot_on_box(&self, bounds: &Aabb, eyes: DVec3, range: f64) -> DVec3;

    /// Best of `candidates` under [`Self::compare`].
    fn pick<'a>(&self, candidates: &'a [Orientation]) -> Option<&'a Orientation> {
        candidates.iter().min_by(|a, b| self.compare(a, b))
    }
}

/// Prefers whichever candidate turns the least from a base orientation,
/// or aims straight at a fixed point when one is given.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeastDifference {
    base: Orientation,
    base_point: Option<DVec3>,
}

impl LeastDifference {
    pub fn new(base: Orientation) -> Self {
        Self { base, base_point: None }
    }

    /// Least change from the override in effect, else the natural facing.
    pub fn to_current(effective: Option<Orientation>, natural: Orientation) -> Self {
        Self::new(effective.unwrap_or(natural))
    }

    pub fn to_point(eyes: DVec3, point: DVec3) -> Self {
        Self {
            base: Orientation::looking_at(point, eyes),
            base_point: Some(point),
        }
    }

    pub fn base(&self) -> Orientation {
        self.base
    }
}

impl OrientationPreference for LeastDifference {
    fn compare(&self, a: &Orientation, b: &Orientation) -> Ordering {
        self.base.angle_to(a).total_cmp(&self.base.angle_to(b))
    }

    fn preferred_spot(&self, eyes: DVec3, range: f64) -> DVec3 {
        match self.base_point {
            Some(point) => point,
            None => eyes + self.base.direction_vector() * range,
        }
    }

    fn preferred_spot_on_box(&self, bounds: &Aabb, eyes: DVec3, range: f64) -> DVec3 {
        if let Some(point) = self.base_point {
            return point;
        }

        let spot = self.preferred_spot(eyes, range);
        if bounds.contains(spot) {
            return spot;
        }

        bounds
            .ray_entry(eyes, spot - eyes)
            .filter(|hit| hit.distance_squared(eyes) <= range * range)
            .unwrap_or(spot)
    }
}

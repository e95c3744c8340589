use crate::math::{Real, Vec2, RayCastInput, RayCastHit, UnitVec2, MAX_FLOAT};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Axis-Aligned Bounding Box (AABB) used by the broad phase
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Minimum corner of the AABB
    pub min: Vec2,

    /// Maximum corner of the AABB
    pub max: Vec2,
}

impl Aabb {
    /// Creates a new AABB from minimum and maximum points
    #[inline]
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Creates the smallest AABB enclosing both points
    #[inline]
    pub fn from_points(a: Vec2, b: Vec2) -> Self {
        Self { min: a.min(&b), max: a.max(&b) }
    }

    /// An inverted AABB, the identity for `union`
    #[inline]
    pub fn empty() -> Self {
        Self {
            min: Vec2::new(MAX_FLOAT, MAX_FLOAT),
            max: Vec2::new(-MAX_FLOAT, -MAX_FLOAT),
        }
    }

    /// Returns the center of the AABB
    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Returns the extents of the AABB in each dimension
    #[inline]
    pub fn extents(&self) -> Vec2 {
        self.max - self.min
    }

    /// Returns the perimeter. Used as the insertion cost for the dynamic tree.
    #[inline]
    pub fn perimeter(&self) -> Real {
        let e = self.extents();
        2.0 * (e.x + e.y)
    }

    /// Checks if this AABB overlaps another. Touching edges count as overlap.
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Checks if this AABB fully contains another
    #[inline]
    pub fn contains(&self, other: &Self) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }

    /// Returns the union of this AABB and another
    #[inline]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(&other.min),
            max: self.max.max(&other.max),
        }
    }

    /// Expands this AABB to include a point
    #[inline]
    pub fn include(&mut self, point: Vec2) {
        self.min = self.min.min(&point);
        self.max = self.max.max(&point);
    }

    /// Returns this AABB grown on every side by `amount`
    #[inline]
    pub fn get_fattened(&self, amount: Real) -> Self {
        let d = Vec2::new(amount, amount);
        Self { min: self.min - d, max: self.max + d }
    }

    /// Returns this AABB stretched in the direction of `displacement`
    #[inline]
    pub fn get_displaced(&self, displacement: Vec2) -> Self {
        let mut result = *self;
        if displacement.x < 0.0 {
            result.min.x += displacement.x;
        } else {
            result.max.x += displacement.x;
        }
        if displacement.y < 0.0 {
            result.min.y += displacement.y;
        } else {
            result.max.y += displacement.y;
        }
        result
    }

    /// Returns this AABB moved by `v`
    #[inline]
    pub fn moved(&self, v: Vec2) -> Self {
        Self { min: self.min + v, max: self.max + v }
    }

    /// Casts a ray against this AABB using the slab method
    pub fn ray_cast(&self, input: &RayCastInput) -> Option<RayCastHit> {
        let mut tmin = -MAX_FLOAT;
        let mut tmax = MAX_FLOAT;

        let p = input.p1;
        let d = input.p2 - input.p1;
        let abs_d = d.abs();
        let mut normal = Vec2::zero();

        for axis in 0..2 {
            let (p_i, d_i, abs_i, lo, hi) = if axis == 0 {
                (p.x, d.x, abs_d.x, self.min.x, self.max.x)
            } else {
                (p.y, d.y, abs_d.y, self.min.y, self.max.y)
            };

            if abs_i < crate::math::EPSILON {
                // Parallel
                if p_i < lo || hi < p_i {
                    return None;
                }
            } else {
                let inv_d = 1.0 / d_i;
                let mut t1 = (lo - p_i) * inv_d;
                let mut t2 = (hi - p_i) * inv_d;

                // Sign of the normal vector
                let mut s = -1.0;
                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                    s = 1.0;
                }

                if t1 > tmin {
                    normal = if axis == 0 { Vec2::new(s, 0.0) } else { Vec2::new(0.0, s) };
                    tmin = t1;
                }

                tmax = tmax.min(t2);
                if tmin > tmax {
                    return None;
                }
            }
        }

        // Does the ray start inside the box?
        // Does the ray intersect beyond the max fraction?
        if tmin < 0.0 || input.max_fraction < tmin {
            return None;
        }

        Some(RayCastHit {
            normal: UnitVec2::from_vec(normal)?,
            fraction: tmin,
        })
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

/// Ray cast against an AABB, with the ray and box in the same frame
#[inline]
pub fn cast_aabb(input: &RayCastInput, aabb: &Aabb) -> Option<RayCastHit> {
    aabb.ray_cast(input)
}

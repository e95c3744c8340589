use crate::collision::{Manifold, ManifoldType};
use crate::math::{Real, Transformation, UnitVec2, Vec2, EPSILON, MAX_MANIFOLD_POINTS};

/// A manifold expressed in world coordinates: one shared normal pointing
/// from A to B, and per point the world position halfway between the two
/// surfaces together with its signed separation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorldManifold {
    normal: Option<UnitVec2>,
    points: [Vec2; MAX_MANIFOLD_POINTS],
    separations: [Real; MAX_MANIFOLD_POINTS],
    count: usize,
}

impl WorldManifold {
    /// Evaluates `manifold` at the given transformations and vertex radii
    pub fn new(
        manifold: &Manifold,
        xf_a: &Transformation,
        radius_a: Real,
        xf_b: &Transformation,
        radius_b: Real,
    ) -> Self {
        let mut result = Self::default();
        if manifold.get_point_count() == 0 {
            return result;
        }

        match manifold.get_type() {
            ManifoldType::Unset => {}
            ManifoldType::Circles => {
                let point_a = xf_a.transform(manifold.get_local_point());
                let point_b = xf_b.transform(manifold.get_point(0).local_point);
                let delta = point_b - point_a;
                if delta.length_squared() > EPSILON * EPSILON {
                    let normal = UnitVec2::from_vec(delta);
                    if let Some(n) = normal {
                        let c_a = point_a + n.to_vec() * radius_a;
                        let c_b = point_b - n.to_vec() * radius_b;
                        result.normal = normal;
                        result.push((c_a + c_b) * 0.5, n.dot(&delta) - radius_a - radius_b);
                    }
                } else {
                    // Coincident centers have no meaningful normal.
                    result.push((point_a + point_b) * 0.5, -radius_a - radius_b);
                }
            }
            ManifoldType::FaceA => {
                let Some(local_normal) = manifold.get_local_normal() else {
                    return result;
                };
                let normal = xf_a.q.rotate_unit(local_normal);
                let plane_point = xf_a.transform(manifold.get_local_point());
                for mp in manifold.points() {
                    let clip_point = xf_b.transform(mp.local_point);
                    let s = normal.dot(&(clip_point - plane_point));
                    let c_a = clip_point + normal.to_vec() * (radius_a - s);
                    let c_b = clip_point - normal.to_vec() * radius_b;
                    result.push((c_a + c_b) * 0.5, s - radius_a - radius_b);
                }
                result.normal = Some(normal);
            }
            ManifoldType::FaceB => {
                let Some(local_normal) = manifold.get_local_normal() else {
                    return result;
                };
                let normal = xf_b.q.rotate_unit(local_normal);
                let plane_point = xf_b.transform(manifold.get_local_point());
                for mp in manifold.points() {
                    let clip_point = xf_a.transform(mp.local_point);
                    let s = normal.dot(&(clip_point - plane_point));
                    let c_b = clip_point + normal.to_vec() * (radius_b - s);
                    let c_a = clip_point - normal.to_vec() * radius_a;
                    result.push((c_a + c_b) * 0.5, s - radius_a - radius_b);
                }
                // Ensure normal points from A to B.
                result.normal = Some(-normal);
            }
        }
        result
    }

    fn push(&mut self, point: Vec2, separation: Real) {
        self.points[self.count] = point;
        self.separations[self.count] = separation;
        self.count += 1;
    }

    /// World normal pointing from A to B, if one could be established
    pub fn get_normal(&self) -> Option<UnitVec2> {
        self.normal
    }

    /// Number of points
    pub fn get_point_count(&self) -> usize {
        self.count
    }

    /// World point `index`
    pub fn get_point(&self, index: usize) -> Vec2 {
        debug_assert!(index < self.count);
        self.points[index]
    }

    /// Signed separation at point `index`; negative means overlap
    pub fn get_separation(&self, index: usize) -> Real {
        debug_assert!(index < self.count);
        self.separations[index]
    }
}

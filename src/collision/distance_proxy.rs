use crate::math::{Aabb, Real, RayCastHit, RayCastInput, Transformation, UnitVec2, Vec2, MAX_FLOAT};

/// A convex point set with a rounding radius, used as the input to the
/// distance, manifold and time of impact algorithms.
///
/// A single vertex with a radius describes a disk. Two vertices describe a
/// rounded segment. Three or more describe a rounded convex polygon, with
/// one outward normal per edge (edge `i` goes from vertex `i` to `i + 1`).
/// A two-vertex proxy carries two opposing normals so the polygon routines
/// can treat it as a degenerate polygon.
#[derive(Debug, Clone, Copy)]
pub struct DistanceProxy<'a> {
    vertices: &'a [Vec2],
    normals: &'a [UnitVec2],
    vertex_radius: Real,
}

impl<'a> DistanceProxy<'a> {
    /// Creates a proxy over the given vertices and normals
    pub fn new(vertex_radius: Real, vertices: &'a [Vec2], normals: &'a [UnitVec2]) -> Self {
        debug_assert!(!vertices.is_empty());
        debug_assert!(vertices.len() == 1 || normals.len() == vertices.len());
        Self { vertices, normals, vertex_radius }
    }

    /// Rounding radius of every vertex
    #[inline]
    pub fn get_vertex_radius(&self) -> Real {
        self.vertex_radius
    }

    /// Number of vertices
    #[inline]
    pub fn get_vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Vertex at `index`
    #[inline]
    pub fn get_vertex(&self, index: usize) -> Vec2 {
        self.vertices[index]
    }

    /// Normal of the edge starting at vertex `index`
    #[inline]
    pub fn get_normal(&self, index: usize) -> UnitVec2 {
        self.normals[index]
    }

    /// All vertices
    #[inline]
    pub fn vertices(&self) -> &'a [Vec2] {
        self.vertices
    }

    /// All edge normals
    #[inline]
    pub fn normals(&self) -> &'a [UnitVec2] {
        self.normals
    }

    /// Index of the vertex furthest along direction `d`
    pub fn get_support_index(&self, d: Vec2) -> usize {
        let mut best_index = 0;
        let mut best_value = -MAX_FLOAT;
        for (i, v) in self.vertices.iter().enumerate() {
            let value = v.dot(&d);
            if best_value < value {
                best_value = value;
                best_index = i;
            }
        }
        best_index
    }

    /// World AABB of the proxy, including its vertex radius
    pub fn compute_aabb(&self, xf: &Transformation) -> Aabb {
        let mut aabb = Aabb::empty();
        for v in self.vertices {
            aabb.include(xf.transform(*v));
        }
        aabb.get_fattened(self.vertex_radius)
    }
}

/// Casts a ray against a disk of `radius` centered at `center`
pub fn ray_cast_disk(radius: Real, center: Vec2, input: &RayCastInput) -> Option<RayCastHit> {
    // Collision equation: || p1 + t * d - center ||^2 = radius^2
    let s = input.p1 - center;
    let b = s.length_squared() - radius * radius;

    // Solve the quadratic equation.
    let r = input.p2 - input.p1;
    let c = s.dot(&r);
    let rr = r.length_squared();
    let sigma = c * c - rr * b;

    // Check for negative discriminant and short segment.
    if sigma < 0.0 || rr < crate::math::EPSILON {
        return None;
    }

    // Find the point of intersection of the line with the circle.
    let a = -(c + sigma.sqrt());

    // Is the intersection point on the segment?
    if 0.0 <= a && a <= input.max_fraction * rr {
        let fraction = a / rr;
        let normal = UnitVec2::from_vec(s + r * fraction)?;
        return Some(RayCastHit { normal, fraction });
    }
    None
}

/// Casts a ray against a single segment from `v1` to `v2`, ignoring any
/// vertex radius. Both sides of the segment can be hit.
pub fn ray_cast_edge(v1: Vec2, v2: Vec2, input: &RayCastInput) -> Option<RayCastHit> {
    let p1 = input.p1;
    let d = input.p2 - p1;

    let e = v2 - v1;
    let normal = UnitVec2::from_vec(e.fwd_perpendicular())?;

    // q = p1 + t * d
    // dot(normal, q - v1) = 0
    let numerator = normal.dot(&(v1 - p1));
    let denominator = normal.dot(&d);
    if denominator == 0.0 {
        return None;
    }

    let t = numerator / denominator;
    if t < 0.0 || input.max_fraction < t {
        return None;
    }

    let q = p1 + d * t;

    // q = v1 + s * r
    let rr = e.length_squared();
    if rr == 0.0 {
        return None;
    }
    let s = (q - v1).dot(&e) / rr;
    if !(0.0..=1.0).contains(&s) {
        return None;
    }

    let normal = if numerator > 0.0 { -normal } else { normal };
    Some(RayCastHit { normal, fraction: t })
}

/// Casts a ray in world coordinates against a proxy positioned by
/// `transform`. The returned normal is in world coordinates.
pub fn ray_cast_proxy(
    proxy: &DistanceProxy,
    input: &RayCastInput,
    transform: &Transformation,
) -> Option<RayCastHit> {
    // Put the ray into the proxy's frame of reference.
    let local = RayCastInput::new(
        transform.inverse_transform(input.p1),
        transform.inverse_transform(input.p2),
        input.max_fraction,
    );

    let hit = match proxy.get_vertex_count() {
        1 => ray_cast_disk(proxy.get_vertex_radius(), proxy.get_vertex(0), &local),
        2 => ray_cast_edge(proxy.get_vertex(0), proxy.get_vertex(1), &local),
        _ => ray_cast_polygon(proxy, &local),
    }?;

    Some(RayCastHit {
        normal: transform.q.rotate_unit(hit.normal),
        fraction: hit.fraction,
    })
}

fn ray_cast_polygon(proxy: &DistanceProxy, input: &RayCastInput) -> Option<RayCastHit> {
    let p1 = input.p1;
    let d = input.p2 - p1;

    let mut lower: Real = 0.0;
    let mut upper = input.max_fraction;
    let mut index = None;

    for i in 0..proxy.get_vertex_count() {
        // p = p1 + a * d
        // dot(normal, p - v) = 0
        // dot(normal, p1 - v) + a * dot(normal, d) = 0
        let normal = proxy.get_normal(i);
        let numerator = normal.dot(&(proxy.get_vertex(i) - p1));
        let denominator = normal.dot(&d);

        if denominator == 0.0 {
            if numerator < 0.0 {
                return None;
            }
        } else if denominator < 0.0 && numerator < lower * denominator {
            // The segment enters this half-space.
            lower = numerator / denominator;
            index = Some(i);
        } else if denominator > 0.0 && numerator < upper * denominator {
            // The segment exits this half-space.
            upper = numerator / denominator;
        }

        if upper < lower {
            return None;
        }
    }

    index.map(|i| RayCastHit { normal: proxy.get_normal(i), fraction: lower })
}

use crate::collision::DistanceProxy;
use crate::error::PhysicsError;
use crate::math::{Real, UnitVec2, Vec2, LINEAR_SLOP, MAX_POLYGON_VERTICES};
use crate::shapes::MassData;
use crate::Result;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// A solid convex polygon with counter-clockwise winding
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct PolygonShape {
    /// Vertices in counter-clockwise order
    vertices: Vec<Vec2>,

    /// Outward normal of each edge; edge `i` runs from vertex `i` to `i + 1`
    normals: Vec<UnitVec2>,

    /// Area centroid
    centroid: Vec2,

    /// Rounding radius
    vertex_radius: Real,
}

impl PolygonShape {
    /// Creates a polygon from the convex hull of the given points.
    ///
    /// Points closer together than half the linear slop are welded. Fails
    /// if fewer than three points remain or they are collinear.
    pub fn new(points: &[Vec2]) -> Result<Self> {
        let hull = compute_hull(points)?;
        Ok(Self::from_hull(hull))
    }

    /// Creates an axis aligned box with the given half extents centered on
    /// the body origin
    pub fn new_box(hx: Real, hy: Real) -> Self {
        let vertices = vec![
            Vec2::new(hx, -hy),
            Vec2::new(hx, hy),
            Vec2::new(-hx, hy),
            Vec2::new(-hx, -hy),
        ];
        let normals = vec![UnitVec2::RIGHT, UnitVec2::TOP, UnitVec2::LEFT, UnitVec2::BOTTOM];
        Self {
            vertices,
            normals,
            centroid: Vec2::zero(),
            vertex_radius: LINEAR_SLOP * 2.0,
        }
    }

    /// Creates a box with the given half extents, rotated by `angle` and
    /// centered on `center`
    pub fn new_oriented_box(hx: Real, hy: Real, center: Vec2, angle: Real) -> Self {
        let mut shape = Self::new_box(hx, hy);
        let q = UnitVec2::from_angle(angle);
        for v in shape.vertices.iter_mut() {
            *v = q.rotate(*v) + center;
        }
        for n in shape.normals.iter_mut() {
            *n = q.rotate_unit(*n);
        }
        shape.centroid = center;
        shape
    }

    fn from_hull(vertices: Vec<Vec2>) -> Self {
        let count = vertices.len();
        let normals = (0..count)
            .map(|i| {
                let edge = vertices[(i + 1) % count] - vertices[i];
                // The hull guarantees non-degenerate edges.
                UnitVec2::from_vec(edge.fwd_perpendicular()).unwrap_or(UnitVec2::RIGHT)
            })
            .collect();
        let centroid = compute_centroid(&vertices);
        Self {
            vertices,
            normals,
            centroid,
            vertex_radius: LINEAR_SLOP * 2.0,
        }
    }

    /// Returns this polygon with a different vertex radius
    pub fn with_vertex_radius(mut self, vertex_radius: Real) -> Self {
        self.vertex_radius = vertex_radius;
        self
    }

    /// Number of vertices
    pub fn get_vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Vertex at `index`
    pub fn get_vertex(&self, index: usize) -> Vec2 {
        self.vertices[index]
    }

    /// Normal of the edge starting at vertex `index`
    pub fn get_normal(&self, index: usize) -> UnitVec2 {
        self.normals[index]
    }

    /// Area centroid
    pub fn get_centroid(&self) -> Vec2 {
        self.centroid
    }

    /// Rounding radius
    pub fn get_vertex_radius(&self) -> Real {
        self.vertex_radius
    }

    /// Distance proxy for the single child of a polygon
    pub fn child(&self) -> DistanceProxy<'_> {
        DistanceProxy::new(self.vertex_radius, &self.vertices, &self.normals)
    }

    /// Mass of the polygon at the given density, ignoring vertex rounding
    pub fn compute_mass(&self, density: Real) -> MassData {
        const INV3: Real = 1.0 / 3.0;

        let count = self.vertices.len();
        let mut center = Vec2::zero();
        let mut area = 0.0;
        let mut inertia = 0.0;

        // The reference point keeps round-off down for polygons far from
        // the origin.
        let s = self.vertices[0];

        for i in 0..count {
            let e1 = self.vertices[i] - s;
            let e2 = self.vertices[(i + 1) % count] - s;

            let d = e1.cross(&e2);

            let triangle_area = 0.5 * d;
            area += triangle_area;

            // Area weighted centroid
            center += (e1 + e2) * (triangle_area * INV3);

            let intx2 = e1.x * e1.x + e2.x * e1.x + e2.x * e2.x;
            let inty2 = e1.y * e1.y + e2.y * e1.y + e2.y * e2.y;

            inertia += (0.25 * INV3 * d) * (intx2 + inty2);
        }

        let mass = density * area;
        if area <= 0.0 {
            return MassData { mass: 0.0, center: self.centroid, inertia: 0.0 };
        }

        center = center * (1.0 / area);
        let mass_center = center + s;

        // Inertia relative to the reference point, then moved to the origin.
        let mut rot_inertia = density * inertia;
        rot_inertia += mass * (mass_center.length_squared() - center.length_squared());

        MassData { mass, center: mass_center, inertia: rot_inertia }
    }
}

fn compute_centroid(vertices: &[Vec2]) -> Vec2 {
    const INV3: Real = 1.0 / 3.0;

    let count = vertices.len();
    let s = vertices[0];
    let mut c = Vec2::zero();
    let mut area = 0.0;

    for i in 0..count {
        let e1 = vertices[i] - s;
        let e2 = vertices[(i + 1) % count] - s;
        let triangle_area = 0.5 * e1.cross(&e2);
        area += triangle_area;
        c += (e1 + e2) * (triangle_area * INV3);
    }

    if area > 0.0 {
        c * (1.0 / area) + s
    } else {
        s
    }
}

/// Gift wrapping hull starting from the rightmost point, lowest on ties.
/// The result is counter-clockwise.
fn compute_hull(points: &[Vec2]) -> Result<Vec<Vec2>> {
    let weld_distance_sq = (0.5 * LINEAR_SLOP) * (0.5 * LINEAR_SLOP);

    let mut ps: Vec<Vec2> = Vec::with_capacity(points.len());
    for p in points {
        if !p.is_finite() {
            return Err(PhysicsError::InvalidArgument(format!("polygon point {} isn't finite", p)));
        }
        if ps.iter().all(|q| p.distance_squared(q) > weld_distance_sq) {
            ps.push(*p);
        }
    }

    let n = ps.len();
    if n < 3 {
        return Err(PhysicsError::InvalidArgument(format!(
            "polygon needs at least 3 distinct points, got {}", n
        )));
    }
    if n > MAX_POLYGON_VERTICES {
        return Err(PhysicsError::InvalidArgument(format!(
            "polygon can have at most {} points, got {}", MAX_POLYGON_VERTICES, n
        )));
    }

    let mut i0 = 0;
    let mut x0 = ps[0].x;
    for (i, p) in ps.iter().enumerate().skip(1) {
        if p.x > x0 || (p.x == x0 && p.y < ps[i0].y) {
            i0 = i;
            x0 = p.x;
        }
    }

    let mut hull: Vec<usize> = Vec::with_capacity(n);
    let mut ih = i0;
    loop {
        if hull.len() >= n {
            // Only reachable with degenerate input.
            return Err(PhysicsError::InvalidArgument("polygon hull didn't close".to_string()));
        }
        hull.push(ih);

        let current = ps[ih];
        let mut ie = 0;
        for j in 1..n {
            if ie == ih {
                ie = j;
                continue;
            }

            let r = ps[ie] - current;
            let v = ps[j] - current;
            let c = r.cross(&v);
            if c < 0.0 {
                ie = j;
            }

            // Collinear points: keep the furthest.
            if c == 0.0 && v.length_squared() > r.length_squared() {
                ie = j;
            }
        }

        ih = ie;
        if ie == i0 {
            break;
        }
    }

    if hull.len() < 3 {
        return Err(PhysicsError::InvalidArgument("polygon points are collinear".to_string()));
    }

    Ok(hull.into_iter().map(|i| ps[i]).collect())
}

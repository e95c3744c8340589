use crate::collision::clip_list::{clip_segment_to_line, ClipList, ClipVertex};
use crate::collision::{ContactFeature, DistanceProxy, Manifold, ManifoldConf, ManifoldPoint, ManifoldType};
use crate::math::{Real, Transformation, EPSILON, MAX_FLOAT};

/// Calculates the contact manifold of two convex proxies.
///
/// Dispatches on the vertex counts: one-vertex proxies are disks, every
/// other proxy is treated as a (possibly two-vertex) polygon. The vertex
/// radii of both proxies are applied. The manifold type tells which shape
/// holds the reference face; a manifold without points never has a normal.
pub fn collide_shapes(
    proxy_a: &DistanceProxy,
    xf_a: &Transformation,
    proxy_b: &DistanceProxy,
    xf_b: &Transformation,
    conf: ManifoldConf,
) -> Manifold {
    match (proxy_a.get_vertex_count(), proxy_b.get_vertex_count()) {
        (0, _) | (_, 0) => Manifold::new(),
        (1, 1) => collide_circles(proxy_a, xf_a, proxy_b, xf_b),
        (_, 1) => collide_polygon_circle(proxy_a, xf_a, proxy_b, xf_b),
        (1, _) => flipped(collide_polygon_circle(proxy_b, xf_b, proxy_a, xf_a)),
        _ => collide_polygons(proxy_a, xf_a, proxy_b, xf_b, conf),
    }
}

fn collide_circles(
    proxy_a: &DistanceProxy,
    xf_a: &Transformation,
    proxy_b: &DistanceProxy,
    xf_b: &Transformation,
) -> Manifold {
    let local_a = proxy_a.get_vertex(0);
    let local_b = proxy_b.get_vertex(0);
    let p_a = xf_a.transform(local_a);
    let p_b = xf_b.transform(local_b);
    let total_radius = proxy_a.get_vertex_radius() + proxy_b.get_vertex_radius();

    if p_a.distance_squared(&p_b) > total_radius * total_radius {
        return Manifold::new();
    }
    Manifold::circles(local_a, ManifoldPoint::new(local_b, ContactFeature::vertex_vertex(0, 0)))
}

// Polygon (or edge) A against disk B, producing a face-A manifold when the
// center lies in the face region and a circles manifold near a vertex.
fn collide_polygon_circle(
    polygon: &DistanceProxy,
    xf_a: &Transformation,
    circle: &DistanceProxy,
    xf_b: &Transformation,
) -> Manifold {
    // Compute circle position in the frame of the polygon.
    let c_local = xf_a.inverse_transform(xf_b.transform(circle.get_vertex(0)));
    let total_radius = polygon.get_vertex_radius() + circle.get_vertex_radius();
    let count = polygon.get_vertex_count();

    // Find the min separating edge.
    let mut normal_index = 0;
    let mut separation = -MAX_FLOAT;
    for i in 0..count {
        let s = polygon.get_normal(i).dot(&(c_local - polygon.get_vertex(i)));
        if s > total_radius {
            // Early out.
            return Manifold::new();
        }
        if s > separation {
            separation = s;
            normal_index = i;
        }
    }

    // Vertices that subtend the incident face.
    let index1 = normal_index;
    let index2 = (index1 + 1) % count;
    let v1 = polygon.get_vertex(index1);
    let v2 = polygon.get_vertex(index2);
    let local_b = circle.get_vertex(0);

    // If the center is inside the polygon.
    if separation < EPSILON {
        let mut manifold = Manifold::face_a(polygon.get_normal(normal_index), (v1 + v2) * 0.5);
        manifold.add_point(ManifoldPoint::new(local_b, ContactFeature::face_vertex(index1 as u8, 0)));
        return manifold;
    }

    // Compute barycentric coordinates
    let u1 = (c_local - v1).dot(&(v2 - v1));
    let u2 = (c_local - v2).dot(&(v1 - v2));

    if u1 <= 0.0 {
        if c_local.distance_squared(&v1) > total_radius * total_radius {
            return Manifold::new();
        }
        return Manifold::circles(v1, ManifoldPoint::new(local_b, ContactFeature::vertex_vertex(index1 as u8, 0)));
    }

    if u2 <= 0.0 {
        if c_local.distance_squared(&v2) > total_radius * total_radius {
            return Manifold::new();
        }
        return Manifold::circles(v2, ManifoldPoint::new(local_b, ContactFeature::vertex_vertex(index2 as u8, 0)));
    }

    let face_center = (v1 + v2) * 0.5;
    if (c_local - face_center).dot(&polygon.get_normal(index1).to_vec()) > total_radius {
        return Manifold::new();
    }
    let mut manifold = Manifold::face_a(polygon.get_normal(index1), face_center);
    manifold.add_point(ManifoldPoint::new(local_b, ContactFeature::face_vertex(index1 as u8, 0)));
    manifold
}

// Re-expresses a manifold computed with the shapes' roles swapped.
fn flipped(manifold: Manifold) -> Manifold {
    if manifold.get_point_count() == 0 {
        return manifold;
    }
    let point = *manifold.get_point(0);
    let feature = point.contact_feature.flip();
    match manifold.get_type() {
        ManifoldType::Circles => {
            // The reference point moves to the other side.
            Manifold::circles(point.local_point, ManifoldPoint::new(manifold.get_local_point(), feature))
        }
        _ => {
            let mut result = match manifold.get_local_normal() {
                Some(normal) => Manifold::face_b(normal, manifold.get_local_point()),
                None => return Manifold::new(),
            };
            result.add_point(ManifoldPoint::new(point.local_point, feature));
            result
        }
    }
}

// Finds the edge normal of `proxy1` with the largest separation from
// `proxy2`.
fn find_max_separation(
    proxy1: &DistanceProxy,
    xf1: &Transformation,
    proxy2: &DistanceProxy,
    xf2: &Transformation,
) -> (usize, Real) {
    // Work in the frame of proxy2.
    let xf = xf2.mul_t(xf1);

    let mut best_index = 0;
    let mut max_separation = -MAX_FLOAT;
    for i in 0..proxy1.get_vertex_count() {
        // Get proxy1 normal and vertex in frame2.
        let n = xf.q.rotate_unit(proxy1.get_normal(i));
        let v1 = xf.transform(proxy1.get_vertex(i));

        // Find deepest point for normal i.
        let si = proxy2
            .vertices()
            .iter()
            .map(|v2| n.dot(&(*v2 - v1)))
            .fold(MAX_FLOAT, Real::min);

        if si > max_separation {
            max_separation = si;
            best_index = i;
        }
    }
    (best_index, max_separation)
}

// The edge of `proxy2` most anti-parallel to reference edge `edge1` of
// `proxy1`, as two world-space clip vertices.
fn find_incident_edge(
    proxy1: &DistanceProxy,
    xf1: &Transformation,
    edge1: usize,
    proxy2: &DistanceProxy,
    xf2: &Transformation,
) -> ClipList {
    // Get the normal of the reference edge in proxy2's frame.
    let normal1 = xf2.q.inverse_rotate_unit(xf1.q.rotate_unit(proxy1.get_normal(edge1)));

    // Find the incident edge on proxy2.
    let mut index = 0;
    let mut min_dot = MAX_FLOAT;
    for (i, n) in proxy2.normals().iter().enumerate() {
        let dot = normal1.dot(&n.to_vec());
        if dot < min_dot {
            min_dot = dot;
            index = i;
        }
    }

    let i1 = index;
    let i2 = (i1 + 1) % proxy2.get_vertex_count();

    ClipList::from_slice(&[
        ClipVertex::new(
            xf2.transform(proxy2.get_vertex(i1)),
            ContactFeature::face_vertex(edge1 as u8, i1 as u8),
        ),
        ClipVertex::new(
            xf2.transform(proxy2.get_vertex(i2)),
            ContactFeature::face_vertex(edge1 as u8, i2 as u8),
        ),
    ])
}

// SAT on both polygons' normals, then clipping of the incident edge against
// the side planes of the reference edge.
fn collide_polygons(
    proxy_a: &DistanceProxy,
    xf_a: &Transformation,
    proxy_b: &DistanceProxy,
    xf_b: &Transformation,
    conf: ManifoldConf,
) -> Manifold {
    let total_radius = proxy_a.get_vertex_radius() + proxy_b.get_vertex_radius();

    let (edge_a, separation_a) = find_max_separation(proxy_a, xf_a, proxy_b, xf_b);
    if separation_a > total_radius {
        return Manifold::new();
    }

    let (edge_b, separation_b) = find_max_separation(proxy_b, xf_b, proxy_a, xf_a);
    if separation_b > total_radius {
        return Manifold::new();
    }

    let k_tol = 0.1 * conf.linear_slop;
    let flip = separation_b > separation_a + k_tol;
    let (proxy1, xf1, proxy2, xf2, edge1) = if flip {
        (proxy_b, xf_b, proxy_a, xf_a, edge_b)
    } else {
        (proxy_a, xf_a, proxy_b, xf_b, edge_a)
    };

    let incident_edge = find_incident_edge(proxy1, xf1, edge1, proxy2, xf2);

    let count1 = proxy1.get_vertex_count();
    let iv1 = edge1;
    let iv2 = (edge1 + 1) % count1;

    let local_v11 = proxy1.get_vertex(iv1);
    let local_v12 = proxy1.get_vertex(iv2);

    let local_normal = proxy1.get_normal(edge1);
    let local_tangent = local_normal.rev_perpendicular();
    let plane_point = (local_v11 + local_v12) * 0.5;

    let tangent = xf1.q.rotate_unit(local_tangent);
    let normal = tangent.fwd_perpendicular();

    let v11 = xf1.transform(local_v11);
    let v12 = xf1.transform(local_v12);

    // Face offset.
    let front_offset = normal.dot(&v11);

    // Side offsets, extended by the total radius.
    let side_offset1 = -tangent.dot(&v11) + total_radius;
    let side_offset2 = tangent.dot(&v12) + total_radius;

    // Clip incident edge against extruded edge1 side edges.
    let clip_points1 = clip_segment_to_line(&incident_edge, -tangent, side_offset1, iv1 as u8);
    if clip_points1.len() < 2 {
        return Manifold::new();
    }

    let clip_points2 = clip_segment_to_line(&clip_points1, tangent, side_offset2, iv2 as u8);
    if clip_points2.len() < 2 {
        return Manifold::new();
    }

    let mut manifold = if flip {
        Manifold::face_b(local_normal, plane_point)
    } else {
        Manifold::face_a(local_normal, plane_point)
    };

    for cp in clip_points2.as_slice() {
        let separation = normal.dot(&cp.v) - front_offset;
        if separation <= total_radius {
            let feature = if flip { cp.cf.flip() } else { cp.cf };
            manifold.add_point(ManifoldPoint::new(xf2.inverse_transform(cp.v), feature));
        }
    }

    manifold
}

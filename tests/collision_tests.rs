use approx::assert_abs_diff_eq;
use phys2d::collision::{
    clip_segment_to_line, collide_shapes, ray_cast_disk, ray_cast_edge, ray_cast_proxy, should_collide, ClipList,
    ClipVertex, CollisionGroup, ContactFeature, Filter, Manifold, ManifoldConf, ManifoldType, WorldManifold,
};
use phys2d::math::{RayCastInput, Transformation, UnitVec2, Vec2, MAX_MANIFOLD_POINTS, PI};
use phys2d::shapes::{DiskShape, EdgeShape, PolygonShape};

fn xf(x: f32, y: f32, angle: f32) -> Transformation {
    Transformation::from_position_angle(Vec2::new(x, y), angle)
}

fn world_manifold(manifold: &Manifold, xf_a: &Transformation, ra: f32, xf_b: &Transformation, rb: f32) -> WorldManifold {
    WorldManifold::new(manifold, xf_a, ra, xf_b, rb)
}

#[test]
fn test_circle_circle_manifold() {
    let a = DiskShape::new(1.0);
    let b = DiskShape::new(1.0);
    let (xf_a, xf_b) = (xf(0.0, 0.0, 0.0), xf(1.5, 0.0, 0.0));

    let manifold = collide_shapes(&a.child(), &xf_a, &b.child(), &xf_b, ManifoldConf::default());
    assert_eq!(manifold.get_type(), ManifoldType::Circles);
    assert_eq!(manifold.get_point_count(), 1);

    let wm = world_manifold(&manifold, &xf_a, 1.0, &xf_b, 1.0);
    let normal = wm.get_normal().unwrap();
    assert_abs_diff_eq!(normal.get_x(), 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(normal.get_y(), 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(wm.get_separation(0), -0.5, epsilon = 1e-5);
    assert_abs_diff_eq!(wm.get_point(0).x, 0.75, epsilon = 1e-5);
}

#[test]
fn test_separated_circles_have_no_points_or_normal() {
    let a = DiskShape::new(1.0);
    let b = DiskShape::new(1.0);
    let (xf_a, xf_b) = (xf(0.0, 0.0, 0.0), xf(2.5, 0.0, 0.0));

    let manifold = collide_shapes(&a.child(), &xf_a, &b.child(), &xf_b, ManifoldConf::default());
    assert_eq!(manifold.get_point_count(), 0);
    assert!(manifold.get_local_normal().is_none());
    assert!(world_manifold(&manifold, &xf_a, 1.0, &xf_b, 1.0).get_normal().is_none());
}

#[test]
fn test_polygon_circle_manifold() {
    let square = PolygonShape::new_box(1.0, 1.0);
    let disk = DiskShape::new(0.5);
    let (xf_a, xf_b) = (xf(0.0, 0.0, 0.0), xf(1.4, 0.0, 0.0));

    let manifold = collide_shapes(&square.child(), &xf_a, &disk.child(), &xf_b, ManifoldConf::default());
    assert_eq!(manifold.get_type(), ManifoldType::FaceA);
    assert_eq!(manifold.get_point_count(), 1);

    let wm = world_manifold(&manifold, &xf_a, square.get_vertex_radius(), &xf_b, 0.5);
    let normal = wm.get_normal().unwrap();
    assert_abs_diff_eq!(normal.get_x(), 1.0, epsilon = 1e-5);
    assert_abs_diff_eq!(wm.get_separation(0), 0.4 - 0.5 - square.get_vertex_radius(), epsilon = 1e-4);

    // Circle first flips the reference
    let flipped = collide_shapes(&disk.child(), &xf_b, &square.child(), &xf_a, ManifoldConf::default());
    assert_eq!(flipped.get_type(), ManifoldType::FaceB);
    assert_eq!(flipped.get_point_count(), 1);
}

#[test]
fn test_square_square_manifold() {
    let a = PolygonShape::new_box(1.0, 1.0);
    let b = PolygonShape::new_box(1.0, 1.0);
    let (xf_a, xf_b) = (xf(0.0, 0.0, 0.0), xf(1.9, 0.0, 0.0));
    let radius = a.get_vertex_radius();

    let manifold = collide_shapes(&a.child(), &xf_a, &b.child(), &xf_b, ManifoldConf::default());
    assert_eq!(manifold.get_point_count(), 2);
    assert!(matches!(manifold.get_type(), ManifoldType::FaceA | ManifoldType::FaceB));

    let wm = world_manifold(&manifold, &xf_a, radius, &xf_b, radius);
    let normal = wm.get_normal().unwrap();
    assert_abs_diff_eq!(normal.get_x(), 1.0, epsilon = 1e-5);
    assert_abs_diff_eq!(normal.get_y(), 0.0, epsilon = 1e-5);
    for i in 0..2 {
        assert_abs_diff_eq!(wm.get_separation(i), -0.1 - 2.0 * radius, epsilon = 1e-4);
    }

    // The two points are the ends of the overlap, above and below the axis
    let (p0, p1) = (wm.get_point(0), wm.get_point(1));
    assert!(p0.y * p1.y < 0.0);
}

#[test]
fn test_corner_under_face_manifold() {
    let ground = PolygonShape::new_box(1.0, 1.0);
    let diamond = PolygonShape::new_box(0.5, 0.5);
    let radius = ground.get_vertex_radius();

    // The diamond's lowest corner sinks 0.05 into the ground's top face
    let corner_height = 0.5 * 2.0f32.sqrt();
    let (xf_a, xf_b) = (xf(0.0, 0.0, 0.0), xf(0.0, 1.0 + corner_height - 0.05, PI / 4.0));

    let manifold = collide_shapes(&ground.child(), &xf_a, &diamond.child(), &xf_b, ManifoldConf::default());
    assert_eq!(manifold.get_type(), ManifoldType::FaceA);
    assert_eq!(manifold.get_point_count(), 1);

    let wm = world_manifold(&manifold, &xf_a, radius, &xf_b, radius);
    let normal = wm.get_normal().unwrap();
    assert_abs_diff_eq!(normal.get_x(), 0.0, epsilon = 1e-5);
    assert_abs_diff_eq!(normal.get_y(), 1.0, epsilon = 1e-5);
    assert_abs_diff_eq!(wm.get_separation(0), -0.05 - 2.0 * radius, epsilon = 1e-3);
}

#[test]
fn test_collide_symmetry() {
    let a = PolygonShape::new_box(1.0, 0.5);
    let b = PolygonShape::new_box(0.75, 0.75);
    let radius = a.get_vertex_radius();
    let placements = [
        (xf(0.0, 0.0, 0.0), xf(1.6, 0.2, 0.0)),
        (xf(0.0, 0.0, 0.3), xf(0.5, 1.1, -0.4)),
        (xf(1.0, 1.0, 1.0), xf(2.2, 1.3, 2.0)),
        (xf(0.0, 0.0, 0.0), xf(0.0, 1.2, PI / 4.0)),
    ];

    for (xf_a, xf_b) in placements {
        let ab = collide_shapes(&a.child(), &xf_a, &b.child(), &xf_b, ManifoldConf::default());
        let ba = collide_shapes(&b.child(), &xf_b, &a.child(), &xf_a, ManifoldConf::default());
        assert_eq!(ab.get_point_count(), ba.get_point_count());

        let n_ab = world_manifold(&ab, &xf_a, radius, &xf_b, radius).get_normal();
        let n_ba = world_manifold(&ba, &xf_b, radius, &xf_a, radius).get_normal();
        match (n_ab, n_ba) {
            (Some(n1), Some(n2)) => {
                assert_abs_diff_eq!(n1.get_x(), -n2.get_x(), epsilon = 1e-4);
                assert_abs_diff_eq!(n1.get_y(), -n2.get_y(), epsilon = 1e-4);
            }
            (None, None) => {}
            other => panic!("normals disagree: {:?}", other),
        }
    }
}

#[test]
fn test_manifold_point_count_bound() {
    let a = PolygonShape::new_box(1.0, 1.0);
    let b = PolygonShape::new_box(0.5, 1.5);
    let disk = DiskShape::new(0.6);

    let mut angle = 0.0;
    while angle < 2.0 * PI {
        for step in 0..12 {
            let offset = Vec2::new(0.25 * step as f32 - 1.5, 0.1 * step as f32);
            let xf_a = xf(0.0, 0.0, 0.0);
            let xf_b = xf(offset.x, offset.y, angle);

            let polygons = collide_shapes(&a.child(), &xf_a, &b.child(), &xf_b, ManifoldConf::default());
            assert!(polygons.get_point_count() <= MAX_MANIFOLD_POINTS);
            if polygons.get_point_count() == 0 {
                assert!(polygons.get_local_normal().is_none());
            }

            let circle = collide_shapes(&a.child(), &xf_a, &disk.child(), &xf_b, ManifoldConf::default());
            assert!(circle.get_point_count() <= 1);
        }
        angle += 0.4;
    }
}

#[test]
fn test_clip_segment_to_line() {
    let cf = ContactFeature::face_vertex(0, 1);
    let segment = ClipList::from_slice(&[
        ClipVertex::new(Vec2::new(-1.0, 0.0), cf),
        ClipVertex::new(Vec2::new(1.0, 0.0), cf),
    ]);

    // Both ends behind the line
    let kept = clip_segment_to_line(&segment, UnitVec2::RIGHT, 2.0, 0);
    assert_eq!(kept.len(), 2);

    // Both ends in front
    let gone = clip_segment_to_line(&segment, UnitVec2::RIGHT, -2.0, 0);
    assert!(gone.is_empty());

    // Straddling: one end kept, one created on the line
    let split = clip_segment_to_line(&segment, UnitVec2::RIGHT, 0.5, 3);
    assert_eq!(split.len(), 2);
    assert_eq!(split[0].v, Vec2::new(-1.0, 0.0));
    assert_abs_diff_eq!(split[1].v.x, 0.5, epsilon = 1e-6);
    assert_eq!(split[1].cf.index_a, 3);

    // Only segments are clipped
    let single = ClipList::from_slice(&[ClipVertex::new(Vec2::zero(), cf)]);
    assert!(clip_segment_to_line(&single, UnitVec2::RIGHT, 1.0, 0).is_empty());
}

#[test]
fn test_collision_filter_rules() {
    let default = Filter::default();
    assert!(should_collide(&default, &default));

    // Positive shared group always collides, even with disjoint masks
    let friend_a = Filter { mask_bits: CollisionGroup::STATIC, group_index: 2, ..Filter::default() };
    let friend_b = Filter { mask_bits: CollisionGroup::STATIC, group_index: 2, ..Filter::default() };
    assert!(should_collide(&friend_a, &friend_b));

    // Negative shared group never collides
    let foe = Filter { group_index: -1, ..Filter::default() };
    assert!(!should_collide(&foe, &foe));

    // Different groups fall back to the masks
    let debris = Filter::new(CollisionGroup::DEBRIS.bits(), !CollisionGroup::DEBRIS.bits(), -1);
    let other_debris = Filter::new(CollisionGroup::DEBRIS.bits(), !CollisionGroup::DEBRIS.bits(), -2);
    assert!(!should_collide(&debris, &other_debris));
    assert!(should_collide(&debris, &default));
}

#[test]
fn test_ray_casts() {
    let input = RayCastInput::new(Vec2::new(-4.0, 0.0), Vec2::new(4.0, 0.0), 1.0);

    let hit = ray_cast_disk(1.0, Vec2::zero(), &input).unwrap();
    assert_abs_diff_eq!(hit.fraction, 3.0 / 8.0, epsilon = 1e-5);
    assert_abs_diff_eq!(hit.normal.get_x(), -1.0, epsilon = 1e-5);

    let hit = ray_cast_edge(Vec2::new(1.0, -1.0), Vec2::new(1.0, 1.0), &input).unwrap();
    assert_abs_diff_eq!(hit.fraction, 5.0 / 8.0, epsilon = 1e-5);

    // A ray along the edge's line misses it
    let parallel = RayCastInput::new(Vec2::new(1.0, -4.0), Vec2::new(1.0, -2.0), 1.0);
    assert!(ray_cast_edge(Vec2::new(1.0, -1.0), Vec2::new(1.0, 1.0), &parallel).is_none());

    // The proxy test works in the shape's frame and hits the polygon's core
    let square = PolygonShape::new_box(0.5, 0.5);
    let hit = ray_cast_proxy(&square.child(), &input, &xf(1.0, 0.0, 0.0)).unwrap();
    assert_abs_diff_eq!(hit.fraction, 4.5 / 8.0, epsilon = 1e-5);
    assert_abs_diff_eq!(hit.normal.get_x(), -1.0, epsilon = 1e-5);

    let edge = EdgeShape::new(Vec2::new(0.0, 5.0), Vec2::new(1.0, 5.0));
    assert!(ray_cast_proxy(&edge.child(), &input, &Transformation::identity()).is_none());
}

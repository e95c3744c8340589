use approx::assert_abs_diff_eq;
use phys2d::collision::distance::get_surface_distance;
use phys2d::collision::{
    distance, get_toi_via_sat, test_overlap, DistanceConf, IndexPair, SeparationFinder, SeparationType, ToiState,
};
use phys2d::core::StepConf;
use phys2d::math::{Position, Sweep, Transformation, Vec2};
use phys2d::shapes::{DiskShape, PolygonShape};

fn at(x: f32, y: f32) -> Transformation {
    Transformation::from_position_angle(Vec2::new(x, y), 0.0)
}

fn sweep(from: Vec2, to: Vec2) -> Sweep {
    let mut sweep = Sweep::new(Position::new(from, 0.0), Vec2::zero());
    sweep.pos1 = Position::new(to, 0.0);
    sweep
}

#[test]
fn test_distance_between_boxes() {
    let a = PolygonShape::new_box(1.0, 1.0);
    let b = PolygonShape::new_box(1.0, 1.0);

    let output = distance(&a.child(), &at(0.0, 0.0), &b.child(), &at(3.0, 0.5), DistanceConf::default());
    assert_abs_diff_eq!(output.distance(), 1.0, epsilon = 1e-5);

    let (witness_a, witness_b) = output.witness_points();
    assert_abs_diff_eq!(witness_a.x, 1.0, epsilon = 1e-5);
    assert_abs_diff_eq!(witness_b.x, 2.0, epsilon = 1e-5);
    assert!(output.iterations > 0);
}

#[test]
fn test_distance_between_disks() {
    let a = DiskShape::new(1.0);
    let b = DiskShape::new(0.5);
    let (xf_a, xf_b) = (at(0.0, 0.0), at(3.0, 4.0));

    // Cores are the centers
    let output = distance(&a.child(), &xf_a, &b.child(), &xf_b, DistanceConf::default());
    assert_abs_diff_eq!(output.distance(), 5.0, epsilon = 1e-5);

    let surface = get_surface_distance(&a.child(), &xf_a, &b.child(), &xf_b, DistanceConf::default());
    assert_abs_diff_eq!(surface, 3.5, epsilon = 1e-5);
    assert!(!test_overlap(&a.child(), &xf_a, &b.child(), &xf_b, DistanceConf::default()));
    assert!(test_overlap(&a.child(), &xf_a, &b.child(), &at(1.0, 0.0), DistanceConf::default()));
}

#[test]
fn test_separation_finder_types() {
    let a = PolygonShape::new_box(1.0, 1.0);
    let b = PolygonShape::new_box(1.0, 1.0);
    let (xf_a, xf_b) = (at(0.0, 0.0), at(3.0, 0.0));

    // One vertex each: the axis runs between the points
    let points = SeparationFinder::get(&[IndexPair::new(0, 3)], a.child(), &xf_a, b.child(), &xf_b);
    assert_eq!(points.get_type(), SeparationType::Points);
    assert_abs_diff_eq!(points.find_min_separation(&xf_a, &xf_b).distance, 1.0, epsilon = 1e-5);

    // Two vertices on A: A's right face is the reference
    let face_a = SeparationFinder::get(
        &[IndexPair::new(0, 3), IndexPair::new(1, 3)],
        a.child(),
        &xf_a,
        b.child(),
        &xf_b,
    );
    assert_eq!(face_a.get_type(), SeparationType::FaceA);
    assert_abs_diff_eq!(face_a.get_axis().get_x(), 1.0, epsilon = 1e-5);
    assert_abs_diff_eq!(face_a.find_min_separation(&xf_a, &xf_b).distance, 1.0, epsilon = 1e-5);

    // Two vertices on B: B's left face, pointing back at A
    let face_b = SeparationFinder::get(
        &[IndexPair::new(0, 3), IndexPair::new(0, 2)],
        a.child(),
        &xf_a,
        b.child(),
        &xf_b,
    );
    assert_eq!(face_b.get_type(), SeparationType::FaceB);
    assert_abs_diff_eq!(face_b.get_axis().get_x(), -1.0, epsilon = 1e-5);
    assert_abs_diff_eq!(face_b.find_min_separation(&xf_a, &xf_b).distance, 1.0, epsilon = 1e-5);

    // Moving B closer shrinks the separation along the same axis
    let closer = at(2.5, 0.0);
    assert_abs_diff_eq!(face_a.evaluate(IndexPair::new(0, 3), &xf_a, &closer), 0.5, epsilon = 1e-5);
}

#[test]
fn test_toi_of_disk_hitting_box() {
    let wall = PolygonShape::new_box(0.5, 0.5);
    let ball = DiskShape::new(0.5);
    let conf = StepConf::default().get_toi_conf();

    let sweep_wall = sweep(Vec2::zero(), Vec2::zero());
    let sweep_ball = sweep(Vec2::new(-5.0, 0.0), Vec2::new(5.0, 0.0));

    let output = get_toi_via_sat(&wall.child(), &sweep_wall, &ball.child(), &sweep_ball, conf);
    assert_eq!(output.state, ToiState::Touching);

    // Touching means the cores are within the target separation
    let total_radius = wall.get_vertex_radius() + ball.get_radius();
    let target = total_radius - conf.target_depth;
    let expected = (-0.5 - target + 5.0) / 10.0;
    assert_abs_diff_eq!(output.time, expected, epsilon = 1e-3);
    assert!(output.stats.toi_iters > 0);
}

#[test]
fn test_toi_of_missing_sweep() {
    let wall = PolygonShape::new_box(0.5, 0.5);
    let ball = DiskShape::new(0.5);
    let conf = StepConf::default().get_toi_conf();

    let sweep_wall = sweep(Vec2::zero(), Vec2::zero());
    let sweep_ball = sweep(Vec2::new(-5.0, 3.0), Vec2::new(5.0, 3.0));

    let output = get_toi_via_sat(&wall.child(), &sweep_wall, &ball.child(), &sweep_ball, conf);
    assert_eq!(output.state, ToiState::Separated);
    assert_eq!(output.time, conf.t_max);
}

#[test]
fn test_toi_of_overlapping_shapes() {
    let a = PolygonShape::new_box(1.0, 1.0);
    let b = PolygonShape::new_box(1.0, 1.0);
    let conf = StepConf::default().get_toi_conf();

    let sweep_a = sweep(Vec2::zero(), Vec2::zero());
    let sweep_b = sweep(Vec2::new(0.5, 0.0), Vec2::new(4.0, 0.0));

    let output = get_toi_via_sat(&a.child(), &sweep_a, &b.child(), &sweep_b, conf);
    assert_eq!(output.state, ToiState::Overlapped);
    assert_eq!(output.time, 0.0);
}

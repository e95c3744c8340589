use approx::{assert_abs_diff_eq, assert_relative_eq};
use phys2d::math::{
    cast_aabb, get_fwd_rotational_angle, get_normalized, get_rev_rotational_angle, get_shortest_delta, Aabb, Mat33,
    Position, RayCastInput, Sweep, Transformation, UnitVec2, Vec2, Vec3, PI, TWO_PI,
};

#[test]
fn test_vec2_operations() {
    let v1 = Vec2::new(1.0, 2.0);
    let v2 = Vec2::new(3.0, -4.0);

    assert_eq!(v1 + v2, Vec2::new(4.0, -2.0));
    assert_eq!(v2 - v1, Vec2::new(2.0, -6.0));
    assert_eq!(v1 * 2.0, Vec2::new(2.0, 4.0));
    assert_eq!(-v1, Vec2::new(-1.0, -2.0));

    assert_eq!(v1.dot(&v2), 3.0 - 8.0);
    assert_eq!(v1.cross(&v2), 1.0 * -4.0 - 2.0 * 3.0);
    assert_relative_eq!(v2.length(), 5.0);

    // Perpendiculars are rotations by a quarter turn
    assert_eq!(Vec2::new(1.0, 0.0).fwd_perpendicular(), Vec2::new(0.0, -1.0));
    assert_eq!(Vec2::new(1.0, 0.0).rev_perpendicular(), Vec2::new(0.0, 1.0));

    let (unit, length) = v2.get_unit_vector().unwrap();
    assert_relative_eq!(length, 5.0);
    assert_relative_eq!(unit.length(), 1.0);
    assert!(Vec2::zero().get_unit_vector().is_none());
}

#[test]
fn test_unit_vec2() {
    let u = UnitVec2::from_angle(PI / 2.0);
    assert_abs_diff_eq!(u.get_x(), 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(u.get_y(), 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(u.get_angle(), PI / 2.0, epsilon = 1e-6);

    let v = Vec2::new(2.0, 1.0);
    let rotated = u.rotate(v);
    assert_abs_diff_eq!(rotated.x, -1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(rotated.y, 2.0, epsilon = 1e-6);
    let back = u.inverse_rotate(rotated);
    assert_abs_diff_eq!(back.x, v.x, epsilon = 1e-6);
    assert_abs_diff_eq!(back.y, v.y, epsilon = 1e-6);

    assert!(UnitVec2::from_vec(Vec2::zero()).is_none());
    assert_eq!(UnitVec2::RIGHT.fwd_perpendicular(), UnitVec2::BOTTOM);
    assert_eq!(UnitVec2::RIGHT.rev_perpendicular(), UnitVec2::TOP);
}

#[test]
fn test_get_normalized_range_and_periodicity() {
    let mut angle = -20.0;
    while angle < 20.0 {
        let normalized = get_normalized(angle);
        assert!(normalized >= -PI && normalized < PI, "{} normalized to {}", angle, normalized);

        // Whole turns do not change the result
        assert_abs_diff_eq!(get_normalized(angle + TWO_PI), normalized, epsilon = 1e-4);
        angle += 0.37;
    }

    assert_abs_diff_eq!(get_normalized(PI / 4.0), PI / 4.0, epsilon = 1e-6);
    assert_abs_diff_eq!(get_normalized(3.0 * PI / 2.0), -PI / 2.0, epsilon = 1e-5);
    assert_abs_diff_eq!(get_shortest_delta(0.1, -0.1), -0.2, epsilon = 1e-6);
}

#[test]
fn test_rotational_angles() {
    // Counter-clockwise quarter turn
    assert_abs_diff_eq!(get_rev_rotational_angle(0.0, PI / 2.0), PI / 2.0, epsilon = 1e-5);
    assert_abs_diff_eq!(get_fwd_rotational_angle(0.0, PI / 2.0), -3.0 * PI / 2.0, epsilon = 1e-5);

    // Same angle
    assert_abs_diff_eq!(get_rev_rotational_angle(1.0, 1.0), 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(get_fwd_rotational_angle(1.0, 1.0), 0.0, epsilon = 1e-6);

    let rev = get_rev_rotational_angle(0.3, 2.9);
    assert!((0.0..TWO_PI).contains(&rev));
    let fwd = get_fwd_rotational_angle(0.3, 2.9);
    assert!(fwd <= 0.0 && fwd > -TWO_PI);
    assert_abs_diff_eq!(rev - fwd, TWO_PI, epsilon = 1e-4);
}

#[test]
fn test_transformation_round_trip() {
    let xf = Transformation::from_position_angle(Vec2::new(3.0, -2.0), 0.7);
    let points = [Vec2::new(0.0, 0.0), Vec2::new(1.5, 2.5), Vec2::new(-4.0, 0.25)];

    for p in points {
        let back = xf.inverse_transform(xf.transform(p));
        assert_abs_diff_eq!(back.x, p.x, epsilon = 1e-5);
        assert_abs_diff_eq!(back.y, p.y, epsilon = 1e-5);
    }

    // Composition against its inverse yields the identity
    let other = Transformation::from_position_angle(Vec2::new(-1.0, 4.0), -1.2);
    let relative = xf.mul_t(&xf.mul(&other));
    assert_abs_diff_eq!(relative.p.x, other.p.x, epsilon = 1e-5);
    assert_abs_diff_eq!(relative.p.y, other.p.y, epsilon = 1e-5);
    assert_abs_diff_eq!(relative.q.get_angle(), other.q.get_angle(), epsilon = 1e-5);
}

#[test]
fn test_aabb_operations() {
    let a = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(2.0, 2.0));
    let b = Aabb::new(Vec2::new(1.0, 1.0), Vec2::new(3.0, 3.0));
    let c = Aabb::new(Vec2::new(5.0, 5.0), Vec2::new(6.0, 6.0));

    assert!(a.overlaps(&b));
    assert!(!a.overlaps(&c));
    assert_eq!(a.center(), Vec2::new(1.0, 1.0));
    assert_eq!(a.perimeter(), 8.0);

    let union = a.union(&c);
    assert!(union.contains(&a));
    assert!(union.contains(&c));

    let fat = a.get_fattened(0.5);
    assert_eq!(fat.min, Vec2::new(-0.5, -0.5));
    assert_eq!(fat.max, Vec2::new(2.5, 2.5));

    let displaced = a.get_displaced(Vec2::new(1.0, -1.0));
    assert_eq!(displaced.min, Vec2::new(0.0, -1.0));
    assert_eq!(displaced.max, Vec2::new(3.0, 2.0));
}

#[test]
fn test_aabb_ray_cast() {
    let aabb = Aabb::new(Vec2::new(-1.0, -1.0), Vec2::new(1.0, 1.0));

    let hit = aabb.ray_cast(&RayCastInput::new(Vec2::new(-3.0, 0.0), Vec2::new(3.0, 0.0), 1.0)).unwrap();
    assert_relative_eq!(hit.fraction, 1.0 / 3.0, epsilon = 1e-6);
    assert_eq!(hit.normal, UnitVec2::LEFT);

    let input = RayCastInput::new(Vec2::new(0.0, -4.0), Vec2::new(0.0, 4.0), 1.0);
    let hit = cast_aabb(&input, &aabb).unwrap();
    assert_relative_eq!(hit.fraction, 3.0 / 8.0, epsilon = 1e-6);
    assert_eq!(hit.normal, UnitVec2::BOTTOM);

    // Too short
    assert!(aabb.ray_cast(&RayCastInput::new(Vec2::new(-3.0, 0.0), Vec2::new(3.0, 0.0), 0.2)).is_none());

    // Passing beside the box
    assert!(aabb.ray_cast(&RayCastInput::new(Vec2::new(-3.0, 2.0), Vec2::new(3.0, 2.0), 1.0)).is_none());
}

#[test]
fn test_sweep_interpolation() {
    let mut sweep = Sweep::new(Position::new(Vec2::new(0.0, 0.0), 0.0), Vec2::zero());
    sweep.pos1 = Position::new(Vec2::new(4.0, 0.0), PI / 2.0);

    let mid = sweep.get_transform(0.5);
    assert_abs_diff_eq!(mid.p.x, 2.0, epsilon = 1e-6);
    assert_abs_diff_eq!(mid.q.get_angle(), PI / 4.0, epsilon = 1e-6);

    sweep.advance0(0.5);
    assert_eq!(sweep.alpha0, 0.5);
    assert_abs_diff_eq!(sweep.pos0.linear.x, 2.0, epsilon = 1e-6);

    // The end of the sweep is unchanged
    let end = sweep.get_transform1();
    assert_abs_diff_eq!(end.p.x, 4.0, epsilon = 1e-6);
}

#[test]
fn test_mat33_inverses() {
    let k = Mat33::new(Vec3::new(4.0, 1.0, 0.0), Vec3::new(1.0, 3.0, 1.0), Vec3::new(0.0, 1.0, 2.0));

    // The symmetric inverse undoes the matrix
    let inverse = k.get_sym_inverse33();
    for (column, expected) in [(k.ex, Vec3::new(1.0, 0.0, 0.0)), (k.ey, Vec3::new(0.0, 1.0, 0.0))] {
        let product = inverse * column;
        assert_abs_diff_eq!(product.x, expected.x, epsilon = 1e-5);
        assert_abs_diff_eq!(product.y, expected.y, epsilon = 1e-5);
        assert_abs_diff_eq!(product.z, expected.z, epsilon = 1e-5);
    }
    let solved = k.solve33(Vec3::new(1.0, 2.0, 3.0));
    let via_inverse = inverse * Vec3::new(1.0, 2.0, 3.0);
    assert_abs_diff_eq!(solved.x, via_inverse.x, epsilon = 1e-5);
    assert_abs_diff_eq!(solved.z, via_inverse.z, epsilon = 1e-5);

    // Only the upper block is inverted: [[4, 1], [1, 3]] has determinant 11
    let block = k.get_inverse22();
    assert_abs_diff_eq!(block.ex.x, 3.0 / 11.0, epsilon = 1e-6);
    assert_abs_diff_eq!(block.ey.x, -1.0 / 11.0, epsilon = 1e-6);
    assert_abs_diff_eq!(block.ey.y, 4.0 / 11.0, epsilon = 1e-6);
    assert_eq!(block.ez, Vec3::zero());
    assert_eq!(block.ex.z, 0.0);

    // Singular matrices give zero
    assert_eq!(Mat33::default().get_sym_inverse33(), Mat33::default());
}

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use approx::assert_abs_diff_eq;
use phys2d::constraints::{FrictionJointConf, LimitState, PrismaticJointConf, TargetJointConf};
use phys2d::error::PhysicsError;
use phys2d::math::{UnitVec2, Velocity};
use phys2d::shapes::{DiskShape, PolygonShape};
use phys2d::{BodyConf, BodyId, JointConf, Shape, StepConf, Vec2, World, WorldConf};

fn zero_gravity() -> World {
    World::new(WorldConf::default().with_gravity(Vec2::zero()))
}

fn add_dynamic(world: &mut World, conf: BodyConf, shape: Shape) -> BodyId {
    let body = world.create_body(conf).unwrap();
    let shape = world.create_shape(shape).unwrap();
    world.attach(body, shape).unwrap();
    body
}

fn unit_box() -> Shape {
    Shape::polygon(PolygonShape::new_box(0.5, 0.5)).with_density(1.0)
}

fn slider(world: &mut World, conf: BodyConf) -> (BodyId, BodyId, PrismaticJointConf) {
    let anchor = world.create_body(BodyConf::new_static()).unwrap();
    let body = add_dynamic(world, conf, unit_box());
    let joint = PrismaticJointConf::from_world(
        anchor,
        world.body(anchor).unwrap(),
        body,
        world.body(body).unwrap(),
        Vec2::zero(),
        UnitVec2::RIGHT,
    );
    (anchor, body, joint)
}

#[test]
fn test_prismatic_limit_stops_the_body() {
    let mut world = zero_gravity();
    let push = BodyConf::new_dynamic().with_linear_velocity(Vec2::new(5.0, 3.0)).with_angular_velocity(2.0);
    let (anchor, body, conf) = slider(&mut world, push);
    let joint = world.create_joint(conf.with_limits(-1.0, 2.0).into()).unwrap();

    for _ in 0..120 {
        world.step(&StepConf::default()).unwrap();
    }

    // Only the motion along the axis survives, up to the upper limit
    let b = world.body(body).unwrap();
    assert_abs_diff_eq!(b.get_location().y, 0.0, epsilon = 1e-3);
    assert_abs_diff_eq!(b.get_angle(), 0.0, epsilon = 1e-3);

    let prismatic = world.joint(joint).unwrap().as_prismatic().unwrap();
    let translation = prismatic.get_joint_translation(world.body(anchor).unwrap(), b);
    assert_abs_diff_eq!(translation, 2.0, epsilon = 0.01);
    assert_eq!(prismatic.get_limit_state(), LimitState::AtUpper);
    assert!(b.get_linear_velocity().length() < 0.01);
}

#[test]
fn test_prismatic_motor_holds_speed_against_gravity() {
    let mut world = World::default();
    let (anchor, body, conf) = slider(&mut world, BodyConf::new_dynamic());
    let joint = world.create_joint(conf.with_motor(1.5, 1000.0).into()).unwrap();

    for _ in 0..60 {
        world.step(&StepConf::default()).unwrap();
    }

    let a = world.body(anchor).unwrap();
    let b = world.body(body).unwrap();
    let prismatic = world.joint(joint).unwrap().as_prismatic().unwrap();
    assert_abs_diff_eq!(prismatic.get_joint_speed(a, b), 1.5, epsilon = 1e-2);
    assert_abs_diff_eq!(prismatic.get_joint_translation(a, b), 1.5, epsilon = 0.05);

    // The axis is horizontal, so the joint carries the weight
    assert_abs_diff_eq!(b.get_location().y, 0.0, epsilon = 1e-3);

    // Reversing the motor through the world wakes and drives the body back
    world.joint_mut(joint, |j| j.as_prismatic_mut().map(|p| p.set_motor_speed(-1.5))).unwrap();
    for _ in 0..10 {
        world.step(&StepConf::default()).unwrap();
    }
    let speed = {
        let prismatic = world.joint(joint).unwrap().as_prismatic().unwrap();
        prismatic.get_joint_speed(world.body(anchor).unwrap(), world.body(body).unwrap())
    };
    assert_abs_diff_eq!(speed, -1.5, epsilon = 1e-2);
}

#[test]
fn test_friction_joint_slows_the_body() {
    let mut world = zero_gravity();
    let ground = world.create_body(BodyConf::new_static()).unwrap();
    let conf = BodyConf::new_dynamic().with_linear_velocity(Vec2::new(4.0, 0.0)).with_angular_velocity(3.0);
    let puck = add_dynamic(&mut world, conf.clone(), Shape::disk(DiskShape::new(0.5)).with_density(1.0));
    let free = add_dynamic(
        &mut world,
        conf.with_location(Vec2::new(0.0, 5.0)),
        Shape::disk(DiskShape::new(0.5)).with_density(1.0),
    );

    let joint = FrictionJointConf::new(ground, puck).with_max(10.0, 5.0);
    world.create_joint(joint.into()).unwrap();

    // Decelerating at max_force / mass takes about a third of a second
    let mut previous = 4.0;
    for _ in 0..60 {
        world.step(&StepConf::default()).unwrap();
        let speed = world.body(puck).unwrap().get_linear_velocity().length();
        assert!(speed <= previous + 1e-5);
        previous = speed;
    }

    let p = world.body(puck).unwrap();
    assert!(p.get_linear_velocity().length() < 1e-3);
    assert!(p.get_angular_velocity().abs() < 1e-3);
    assert!(p.get_location().x > 0.5 && p.get_location().x < 1.0);

    let f = world.body(free).unwrap();
    assert_abs_diff_eq!(f.get_linear_velocity().x, 4.0, epsilon = 1e-5);
}

#[test]
fn test_target_joint_pulls_to_target() {
    let mut world = World::default();
    let body = add_dynamic(&mut world, BodyConf::new_dynamic(), Shape::disk(DiskShape::new(0.5)).with_density(1.0));
    let mass = world.body(body).unwrap().get_mass();

    let target = Vec2::new(2.0, 3.0);
    let conf = TargetJointConf::new(body, world.body(body).unwrap(), target)
        .with_max_force(1000.0 * mass)
        .with_spring(5.0, 0.7);
    let joint = world.create_joint(JointConf::from(conf)).unwrap();
    assert!(world.joint(joint).unwrap().get_body_a().is_none());

    // The anchor starts at the body's origin
    let (_, anchor) = world.get_joint_anchors(joint).unwrap();
    assert_abs_diff_eq!((anchor - target).length(), target.length(), epsilon = 1e-5);

    for _ in 0..300 {
        world.step(&StepConf::default()).unwrap();
    }
    let (target_anchor, body_anchor) = world.get_joint_anchors(joint).unwrap();
    assert_eq!(target_anchor, target);
    assert!((body_anchor - target).length() < 0.05);

    // Moving the target drags the body along
    let next = Vec2::new(-2.0, 3.0);
    world.joint_mut(joint, |j| j.as_target_mut().map(|t| t.set_target(next))).unwrap();
    for _ in 0..300 {
        world.step(&StepConf::default()).unwrap();
    }
    assert!((world.body(body).unwrap().get_location() - next).length() < 0.05);

    // The target lives in world coordinates and follows origin shifts
    world.shift_origin(Vec2::new(1.0, 0.0)).unwrap();
    let shifted = world.joint(joint).unwrap().as_target().unwrap().get_target();
    assert_abs_diff_eq!(shifted.x, -3.0, epsilon = 1e-5);
}

#[test]
fn test_joint_keeps_bodies_from_colliding() {
    let build = |collide: bool| {
        let mut world = zero_gravity();
        let a = add_dynamic(&mut world, BodyConf::new_dynamic(), unit_box());
        let b = add_dynamic(&mut world, BodyConf::new_dynamic().with_location(Vec2::new(0.5, 0.0)), unit_box());
        let conf = PrismaticJointConf::new(a, b).with_collide_connected(collide);
        world.create_joint(conf.into()).unwrap();
        world.step(&StepConf::default()).unwrap();
        world.contact_count()
    };

    assert_eq!(build(false), 0);
    assert_eq!(build(true), 1);
}

#[test]
fn test_destroying_a_body_destroys_its_joints() {
    let mut world = zero_gravity();
    let (anchor, body, conf) = slider(&mut world, BodyConf::new_dynamic());
    let joint = world.create_joint(conf.into()).unwrap();
    let friction = world.create_joint(FrictionJointConf::new(anchor, body).into()).unwrap();
    assert_eq!(world.joint_count(), 2);

    let destroyed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&destroyed);
    world.set_joint_destruction_listener(Box::new(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    world.destroy_body(body).unwrap();
    assert_eq!(destroyed.load(Ordering::SeqCst), 2);
    assert_eq!(world.joint_count(), 0);
    assert!(world.joint(joint).is_err());
    assert!(world.joint(friction).is_err());
    assert!(world.body(anchor).unwrap().get_joints().is_empty());

    // An explicit destroy doesn't call the listener
    let other = add_dynamic(&mut world, BodyConf::new_dynamic(), unit_box());
    let again = world.create_joint(FrictionJointConf::new(anchor, other).into()).unwrap();
    world.destroy_joint(again).unwrap();
    assert_eq!(destroyed.load(Ordering::SeqCst), 2);
}

#[test]
fn test_invalid_joints_are_rejected() {
    let mut world = zero_gravity();
    let body = add_dynamic(&mut world, BodyConf::new_dynamic(), unit_box());
    let gone = world.create_body(BodyConf::new_dynamic()).unwrap();
    world.destroy_body(gone).unwrap();

    let this_body = PrismaticJointConf::new(body, body);
    assert!(matches!(world.create_joint(this_body.into()), Err(PhysicsError::InvalidArgument(_))));

    let stale = FrictionJointConf::new(body, gone);
    assert!(matches!(world.create_joint(stale.into()), Err(PhysicsError::OutOfRange(_))));
    assert_eq!(world.joint_count(), 0);

    // Joints wake their bodies when changed
    let ground = world.create_body(BodyConf::new_static()).unwrap();
    let joint = world.create_joint(FrictionJointConf::new(ground, body).into()).unwrap();
    world.unset_awake(body).unwrap();
    world.joint_mut(joint, |j| j.as_friction_mut().map(|f| f.set_max_force(2.0))).unwrap();
    assert!(world.body(body).unwrap().is_awake());
    assert_eq!(world.body(body).unwrap().get_velocity(), Velocity::zero());
}

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use approx::assert_abs_diff_eq;
use phys2d::collision::Filter;
use phys2d::core::{BodyEventType, ContactEventType, ObjectPool};
use phys2d::error::PhysicsError;
use phys2d::math::{Aabb, RayCastOpcode, Velocity};
use phys2d::shapes::{DiskShape, EdgeShape, PolygonShape};
use phys2d::{BodyConf, BodyId, Real, Shape, StepConf, Vec2, World, WorldConf};

fn zero_gravity() -> World {
    World::new(WorldConf::default().with_gravity(Vec2::zero()))
}

fn add_body(world: &mut World, conf: BodyConf, shape: Shape) -> BodyId {
    let body = world.create_body(conf).unwrap();
    let shape = world.create_shape(shape).unwrap();
    world.attach(body, shape).unwrap();
    body
}

fn add_ground(world: &mut World) -> BodyId {
    let edge = Shape::edge(EdgeShape::new(Vec2::new(-40.0, 0.0), Vec2::new(40.0, 0.0))).with_friction(0.6);
    add_body(world, BodyConf::new_static(), edge)
}

fn add_box(world: &mut World, location: Vec2) -> BodyId {
    let square = Shape::polygon(PolygonShape::new_box(0.5, 0.5)).with_density(1.0).with_friction(0.6);
    add_body(world, BodyConf::new_dynamic().with_location(location), square)
}

fn location(world: &World, id: BodyId) -> Vec2 {
    world.body(id).unwrap().get_location()
}

#[test]
fn test_zero_step_is_idempotent() {
    let mut world = World::default();
    add_ground(&mut world);
    let a = add_box(&mut world, Vec2::new(0.0, 0.5));
    let b = add_box(&mut world, Vec2::new(0.9, 0.5));

    // A zero step only finds contacts
    let stats = world.step(&StepConf::new(0.0)).unwrap();
    assert!(stats.pre.added > 0);
    assert_eq!(stats.reg.islands_found, 0);
    let contacts = world.contact_count();
    let before = (location(&world, a), location(&world, b));

    world.step(&StepConf::new(0.0)).unwrap();
    assert_eq!(world.contact_count(), contacts);
    assert_eq!((location(&world, a), location(&world, b)), before);
    assert_eq!(world.body(a).unwrap().get_linear_velocity(), Vec2::zero());
}

#[test]
fn test_free_fall() {
    let mut world = World::default();
    let ball = add_body(&mut world, BodyConf::new_dynamic(), Shape::disk(DiskShape::new(0.5)).with_density(1.0));

    let conf = StepConf::new(1.0 / 60.0);
    for _ in 0..60 {
        world.step(&conf).unwrap();
    }

    // Semi-implicit Euler: v is exact, y sums the updated velocities
    let body = world.body(ball).unwrap();
    assert_abs_diff_eq!(body.get_linear_velocity().y, -9.81, epsilon = 1e-3);
    let expected_y = -9.81 * (1.0 / 3600.0) * (60.0 * 61.0 / 2.0);
    assert_abs_diff_eq!(body.get_location().y, expected_y, epsilon = 1e-2);
    assert_eq!(body.get_linear_velocity().x, 0.0);
}

/// Checks the islands of the last step: no non-static body or contact is
/// in two islands, island contacts touch and join island bodies, and every
/// awake body and every touching contact of an islanded body was solved.
fn assert_islands_partition(world: &World) {
    let mut bodies = HashSet::new();
    let mut contacts = HashSet::new();
    for island in world.get_islands() {
        for &id in &island.bodies {
            if world.body(id).unwrap().is_speedable() {
                assert!(bodies.insert(id), "{} in two islands", id);
            }
        }
        for &id in &island.contacts {
            let contact = world.contact(id).unwrap();
            assert!(contact.is_touching() && contact.is_enabled() && !contact.is_sensor());
            assert!(island.bodies.contains(&contact.get_body_a()));
            assert!(island.bodies.contains(&contact.get_body_b()));
            assert!(contacts.insert(id), "{} in two islands", id);
        }
    }

    for (id, body) in world.bodies() {
        if body.is_speedable() && body.is_awake() {
            assert!(bodies.contains(&id), "awake {} not solved", id);
        }
    }
    for (id, contact) in world.contacts() {
        let islanded = bodies.contains(&contact.get_body_a()) || bodies.contains(&contact.get_body_b());
        if islanded && contact.is_touching() && contact.is_enabled() && !contact.is_sensor() {
            assert!(contacts.contains(&id), "touching {} not solved", id);
        }
    }
}

#[test]
fn test_islands_partition_bodies() {
    let mut world = World::default();
    let ground = add_ground(&mut world);
    let stacks: Vec<Vec<BodyId>> = [-6.0, 0.0, 6.0]
        .iter()
        .map(|&x| (0..3).map(|i| add_box(&mut world, Vec2::new(x, 0.55 + 1.05 * i as f32))).collect())
        .collect();
    let conf = StepConf { do_toi: false, ..StepConf::default() };

    // Boxes start apart and fall into contact
    for _ in 0..60 {
        let stats = world.step(&conf).unwrap();
        assert_eq!(stats.reg.islands_found as usize, world.get_islands().len());
        assert_islands_partition(&world);
    }

    // The shared static ground doesn't join the stacks together
    for _ in 0..30 {
        let stats = world.step(&conf).unwrap();
        assert_eq!(stats.reg.islands_found, 3);
        assert_islands_partition(&world);
    }
    for island in world.get_islands() {
        assert!(island.bodies.contains(&ground));
        let stack = stacks.iter().find(|s| island.bodies.contains(&s[0])).unwrap();
        assert!(stack.iter().all(|id| island.bodies.contains(id)));
        assert_eq!(island.bodies.len(), 4);
        assert_eq!(island.contacts.len(), 3);
    }

    // Once asleep there is nothing to solve
    for _ in 0..600 {
        world.step(&conf).unwrap();
        if stacks.iter().flatten().all(|&id| !world.body(id).unwrap().is_awake()) {
            break;
        }
    }
    assert!(stacks.iter().flatten().all(|&id| !world.body(id).unwrap().is_awake()));
    let stats = world.step(&conf).unwrap();
    assert_eq!(stats.reg.islands_found, 0);
    assert!(world.get_islands().is_empty());

    // Waking the top box pulls its whole stack back into one island
    world.set_awake(stacks[1][2]).unwrap();
    let stats = world.step(&conf).unwrap();
    assert_eq!(stats.reg.islands_found, 1);
    let island = &world.get_islands()[0];
    assert!(stacks[1].iter().all(|id| island.bodies.contains(id)));
    assert!(!island.bodies.contains(&stacks[0][0]));
    assert_eq!(island.contacts.len(), 3);
    assert_islands_partition(&world);

    for stack in &stacks {
        world.set_awake(stack[0]).unwrap();
    }
    let stats = world.step(&conf).unwrap();
    assert_eq!(stats.reg.islands_found, 3);
    assert_islands_partition(&world);
    assert_eq!(world.get_islands().iter().filter(|i| i.bodies.contains(&ground)).count(), 3);

    // A zero step solves nothing
    world.step(&StepConf::new(0.0)).unwrap();
    assert!(world.get_islands().is_empty());
}

#[test]
fn test_pool_slots_survive_removal() {
    let mut pool: ObjectPool<&str, BodyId> = ObjectPool::new();
    assert!(pool.is_empty());
    let a = pool.insert("a").unwrap();
    let b = pool.insert("b").unwrap();
    let c = pool.insert("c").unwrap();
    pool.remove(b).unwrap();

    // Walking the slot range finds the live objects only
    let live: Vec<BodyId> = (0..pool.range()).filter_map(|i| pool.id_at(i)).collect();
    assert_eq!(live, vec![a, c]);
    assert_eq!(pool.range(), 3);
    assert_eq!(pool.len(), 2);
    assert!(!pool.contains(b));

    // The freed slot is reused under a new generation
    let d = pool.insert("d").unwrap();
    assert_eq!(pool.id_at(1), Some(d));
    assert_ne!(d, b);
    assert!(pool.get(b).is_err());
    assert_eq!(pool.get(d), Ok(&"d"));
    assert_eq!(pool.id_at(7), None);
}

#[test]
fn test_vertical_stack_settles_and_sleeps() {
    let mut world = World::default();
    add_ground(&mut world);
    let boxes: Vec<BodyId> = (0..15).map(|i| add_box(&mut world, Vec2::new(0.0, 0.55 + 1.05 * i as f32))).collect();

    let conf = StepConf::default();
    let mut slept = Vec::new();
    for _ in 0..1200 {
        world.step(&conf).unwrap();
        slept.extend(
            world.drain_body_events().filter(|e| e.event_type == BodyEventType::Sleep).map(|e| e.body),
        );
        if boxes.iter().all(|&id| !world.body(id).unwrap().is_awake()) {
            break;
        }
    }

    for &id in &boxes {
        let body = world.body(id).unwrap();
        assert!(!body.is_awake(), "{} still awake", id);
        assert!(slept.contains(&id));
        assert_eq!(body.get_velocity(), Velocity::zero());
        assert!(body.get_location().x.abs() < 0.1);
    }

    // Still stacked, in order, overlapping by no more than the slop
    let slop = conf.linear_slop;
    assert!((0.5 - slop - 1e-3..0.6).contains(&location(&world, boxes[0]).y));
    for pair in boxes.windows(2) {
        let gap = location(&world, pair[1]).y - location(&world, pair[0]).y;
        assert!((1.0 - slop - 1e-4..1.1).contains(&gap), "gap {}", gap);
    }
}

#[test]
fn test_disks_collide_head_on() {
    let mut world = zero_gravity();
    let disk = || Shape::disk(DiskShape::new(0.5)).with_density(1.0);
    let a = add_body(
        &mut world,
        BodyConf::new_dynamic().with_location(Vec2::new(-2.0, 0.0)).with_linear_velocity(Vec2::new(5.0, 0.0)),
        disk(),
    );
    let b = add_body(
        &mut world,
        BodyConf::new_dynamic().with_location(Vec2::new(2.0, 0.0)).with_linear_velocity(Vec2::new(-5.0, 0.0)),
        disk(),
    );

    let mut began = 0;
    for _ in 0..60 {
        world.step(&StepConf::default()).unwrap();
        began += world.drain_contact_events().filter(|e| e.event_type == ContactEventType::Begin).count();

        // Equal and opposite: momentum stays at zero
        let va = world.body(a).unwrap().get_linear_velocity();
        let vb = world.body(b).unwrap().get_linear_velocity();
        assert_abs_diff_eq!(va.x + vb.x, 0.0, epsilon = 1e-3);
    }
    assert_eq!(began, 1);

    // Inelastic, so both come to rest touching
    let gap = location(&world, b).x - location(&world, a).x;
    assert!(gap > 0.98 && gap < 1.05, "gap {}", gap);
    assert!(world.body(a).unwrap().get_linear_velocity().x.abs() < 0.1);
    assert_abs_diff_eq!(location(&world, a).y, 0.0, epsilon = 1e-4);
}

#[test]
fn test_box_rests_on_box() {
    let mut world = World::default();
    let base = Shape::polygon(PolygonShape::new_box(0.5, 0.5)).with_friction(0.6);
    add_body(&mut world, BodyConf::new_static(), base);
    let top = add_box(&mut world, Vec2::new(0.0, 2.0));

    for _ in 0..180 {
        world.step(&StepConf::default()).unwrap();
    }

    let body = world.body(top).unwrap();
    assert!(body.get_location().y > 0.98 && body.get_location().y < 1.05);
    assert_abs_diff_eq!(body.get_location().x, 0.0, epsilon = 1e-3);
    assert_abs_diff_eq!(body.get_angle(), 0.0, epsilon = 1e-3);
    assert!(body.get_linear_velocity().length() < 0.05);
}

fn fire_bullet(do_toi: bool) -> f32 {
    let mut world = zero_gravity();
    let wall = Shape::polygon(PolygonShape::new_box(0.05, 2.0));
    add_body(&mut world, BodyConf::new_static(), wall);
    let bullet = add_body(
        &mut world,
        BodyConf::new_dynamic()
            .with_location(Vec2::new(-3.0, 0.0))
            .with_linear_velocity(Vec2::new(200.0, 0.0))
            .with_bullet(true),
        Shape::disk(DiskShape::new(0.1)).with_density(1.0),
    );

    let conf = StepConf { do_toi, ..StepConf::default() };
    for _ in 0..10 {
        world.step(&conf).unwrap();
    }
    location(&world, bullet).x
}

#[test]
fn test_bullet_does_not_tunnel() {
    // Without continuous collision the bullet skips over the wall
    assert!(fire_bullet(false) > 0.0);

    let x = fire_bullet(true);
    assert!(x < -0.05, "bullet ended at {}", x);
    assert!(x > -0.2, "bullet ended at {}", x);
}

#[test]
fn test_bullet_bounces_off_impact_surface() {
    let mut world = zero_gravity();
    let wall = Shape::polygon(PolygonShape::new_box(0.05, 4.0)).with_friction(0.0);
    add_body(&mut world, BodyConf::new_static(), wall);
    let bullet = add_body(
        &mut world,
        BodyConf::new_dynamic()
            .with_location(Vec2::new(-3.0, 0.0))
            .with_linear_velocity(Vec2::new(200.0, 50.0))
            .with_bullet(true),
        Shape::disk(DiskShape::new(0.1)).with_density(1.0).with_friction(0.0).with_restitution(1.0),
    );

    // Impact happens within the first step
    let stats = world.step(&StepConf::default()).unwrap();
    assert!(stats.toi.contacts_found > 0);
    let velocity = world.body(bullet).unwrap().get_velocity();
    assert!(velocity.linear.x.is_finite() && velocity.linear.y.is_finite());
    assert!(velocity.linear.x < -180.0, "vx {}", velocity.linear.x);
    assert!(velocity.linear.x > -220.0, "vx {}", velocity.linear.x);
    assert_abs_diff_eq!(velocity.linear.y, 50.0, epsilon = 1.0);
    assert_abs_diff_eq!(velocity.angular, 0.0, epsilon = 1e-3);

    // Moving away from the wall, never through it
    assert!(location(&world, bullet).x < -0.15 + 1e-3);
    world.step(&StepConf::default()).unwrap();
    assert!(location(&world, bullet).x < -1.0);
}

#[test]
fn test_sub_stepping_leaves_step_incomplete() {
    let mut world = zero_gravity();
    add_body(&mut world, BodyConf::new_static(), Shape::polygon(PolygonShape::new_box(0.05, 2.0)));
    add_body(
        &mut world,
        BodyConf::new_dynamic().with_location(Vec2::new(-1.0, 0.0)).with_linear_velocity(Vec2::new(100.0, 0.0)),
        Shape::disk(DiskShape::new(0.1)).with_density(1.0),
    );

    // The contact only appears once the ball's swept proxy reaches the wall
    let conf = StepConf { sub_stepping: true, ..StepConf::default() };
    world.step(&StepConf::new(0.0)).unwrap();
    let stats = world.step(&conf).unwrap();
    assert_eq!(stats.toi.contacts_found, 1);
    assert!(!world.is_step_complete());

    // A step without continuous collision completes it
    world.step(&StepConf { do_toi: false, ..StepConf::default() }).unwrap();
    assert!(world.is_step_complete());
}

#[test]
fn test_stale_and_invalid_handles() {
    let mut world = World::default();
    let body = world.create_body(BodyConf::new_dynamic()).unwrap();
    world.destroy_body(body).unwrap();

    assert!(matches!(world.body(body), Err(PhysicsError::OutOfRange(_))));
    assert!(matches!(world.destroy_body(body), Err(PhysicsError::OutOfRange(_))));

    // The slot is reused, but the stale id still doesn't resolve
    let reused = world.create_body(BodyConf::new_dynamic()).unwrap();
    assert_ne!(reused, body);
    assert!(world.body(reused).is_ok());
    assert!(world.body(body).is_err());

    // Vertex radius below the world's minimum
    let tiny = Shape::disk(DiskShape::new(0.001));
    assert!(matches!(world.create_shape(tiny), Err(PhysicsError::InvalidArgument(_))));

    let negative = Shape::disk(DiskShape::new(1.0)).with_density(-1.0);
    assert!(matches!(world.create_shape(negative), Err(PhysicsError::InvalidArgument(_))));

    assert!(matches!(world.step(&StepConf::new(-1.0)), Err(PhysicsError::InvalidArgument(_))));
    assert!(matches!(
        world.set_transform(reused, Vec2::new(Real::NAN, 0.0), 0.0),
        Err(PhysicsError::InvalidArgument(_))
    ));

    let shape = world.create_shape(Shape::disk(DiskShape::new(1.0))).unwrap();
    world.attach(reused, shape).unwrap();
    assert!(matches!(world.attach(reused, shape), Err(PhysicsError::InvalidArgument(_))));
    world.detach(reused, shape).unwrap();
    assert!(matches!(world.detach(reused, shape), Err(PhysicsError::InvalidArgument(_))));
}

#[test]
fn test_listener_sees_locked_world() {
    let mut world = zero_gravity();
    let disk = || Shape::disk(DiskShape::new(0.5)).with_density(1.0);
    let a = add_body(&mut world, BodyConf::new_dynamic().with_location(Vec2::new(-1.0, 0.0)), disk());
    add_body(&mut world, BodyConf::new_dynamic().with_location(Vec2::new(-0.1, 0.0)), disk());

    let results: Arc<Mutex<Vec<(bool, Result<(), PhysicsError>)>>> = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&results);
    world.set_begin_contact_listener(Box::new(move |world, contact| {
        let mut recorded = recorded.lock().unwrap();
        recorded.push((world.is_locked(), world.create_body(BodyConf::new_dynamic()).map(|_| ())));
        recorded.push((world.is_locked(), world.destroy_body(a)));
        recorded.push((world.is_locked(), world.step(&StepConf::default()).map(|_| ())));

        // Non-structural changes are fine
        recorded.push((world.is_locked(), world.set_contact_friction(contact, 0.1)));
    }));

    world.step(&StepConf::default()).unwrap();
    assert!(!world.is_locked());

    let results = results.lock().unwrap();
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|(locked, _)| *locked));
    for (_, result) in &results[..3] {
        assert!(matches!(result, Err(PhysicsError::WrongState(_))));
    }
    assert!(results[3].1.is_ok());
    assert_eq!(world.body_count(), 2);
}

#[test]
fn test_contact_begin_and_end() {
    let mut world = zero_gravity();
    let ground = add_ground(&mut world);
    let ball = add_body(
        &mut world,
        BodyConf::new_dynamic().with_location(Vec2::new(0.0, 1.0)).with_linear_velocity(Vec2::new(0.0, -3.0)),
        Shape::disk(DiskShape::new(0.5)).with_density(1.0),
    );

    let begins = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&begins);
    world.set_begin_contact_listener(Box::new(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    let mut events = Vec::new();
    for _ in 0..30 {
        world.step(&StepConf::default()).unwrap();
        events.extend(world.drain_contact_events());
    }
    assert_eq!(begins.load(Ordering::SeqCst), 1);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, ContactEventType::Begin);
    assert!([events[0].body_a, events[0].body_b].contains(&ground));
    assert!([events[0].body_a, events[0].body_b].contains(&ball));

    let contact = world.body(ball).unwrap().get_contacts()[0];
    assert!(world.contact(contact).unwrap().is_touching());

    // Lift off
    world.set_velocity(ball, Velocity::new(Vec2::new(0.0, 5.0), 0.0)).unwrap();
    events.clear();
    for _ in 0..5 {
        world.step(&StepConf::default()).unwrap();
        events.extend(world.drain_contact_events());
    }
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, ContactEventType::End);
}

#[test]
fn test_sensor_reports_without_response() {
    let mut world = World::default();
    let sensor = Shape::polygon(PolygonShape::new_box(2.0, 0.5)).with_sensor(true);
    add_body(&mut world, BodyConf::new_static(), sensor);
    let ball = add_body(
        &mut world,
        BodyConf::new_dynamic().with_location(Vec2::new(0.0, 2.0)),
        Shape::disk(DiskShape::new(0.25)).with_density(1.0),
    );

    let mut kinds = Vec::new();
    for _ in 0..90 {
        world.step(&StepConf::default()).unwrap();
        kinds.extend(world.drain_contact_events().map(|e| e.event_type));
    }

    // Falls straight through
    assert!(location(&world, ball).y < -2.0);
    assert_eq!(kinds, vec![ContactEventType::Begin, ContactEventType::End]);
}

#[test]
fn test_filter_group_prevents_contact() {
    let mut world = World::default();
    let group = Filter::new(0x0001, 0xFFFF, -3);
    let square = || Shape::polygon(PolygonShape::new_box(0.5, 0.5)).with_density(1.0).with_filter(group);
    add_body(&mut world, BodyConf::new_dynamic(), square());
    add_body(&mut world, BodyConf::new_dynamic().with_location(Vec2::new(0.5, 0.0)), square());

    world.step(&StepConf::default()).unwrap();
    assert_eq!(world.contact_count(), 0);
}

#[test]
fn test_conveyor_tangent_speed() {
    let mut world = World::default();
    let belt = Shape::polygon(PolygonShape::new_box(20.0, 0.5)).with_friction(0.8);
    add_body(&mut world, BodyConf::new_static(), belt);
    let cargo = add_box(&mut world, Vec2::new(0.0, 1.01));

    world.set_pre_solve_listener(Box::new(|world, contact, _old_manifold| {
        let _ = world.set_contact_tangent_speed(contact, 3.0);
    }));

    for _ in 0..120 {
        world.step(&StepConf::default()).unwrap();
    }

    // The belt drags the box along at its speed
    let velocity = world.body(cargo).unwrap().get_linear_velocity();
    assert_abs_diff_eq!(velocity.x.abs(), 3.0, epsilon = 0.1);
    assert!(location(&world, cargo).x.abs() > 3.0);
}

#[test]
fn test_clone_steps_identically() {
    let mut world = World::default();
    add_ground(&mut world);
    let boxes: Vec<BodyId> =
        (0..5).map(|i| add_box(&mut world, Vec2::new(0.3 * i as f32, 0.6 + 1.2 * i as f32))).collect();
    for _ in 0..10 {
        world.step(&StepConf::default()).unwrap();
    }

    let mut copy = world.clone();
    for _ in 0..60 {
        world.step(&StepConf::default()).unwrap();
        copy.step(&StepConf::default()).unwrap();
    }

    for &id in &boxes {
        let original = world.body(id).unwrap();
        let cloned = copy.body(id).unwrap();
        assert_eq!(original.get_location(), cloned.get_location());
        assert_eq!(original.get_angle(), cloned.get_angle());
        assert_eq!(original.get_velocity(), cloned.get_velocity());
    }
    assert_eq!(world.contact_count(), copy.contact_count());
    assert_eq!(world.get_islands(), copy.get_islands());
}

#[test]
fn test_ray_cast_and_aabb_query() {
    let mut world = zero_gravity();
    let near = add_box(&mut world, Vec2::new(2.0, 0.0));
    let far = add_box(&mut world, Vec2::new(5.0, 0.0));

    // Proxies are created by the next step
    let mut hits = 0;
    world.ray_cast(Vec2::zero(), Vec2::new(10.0, 0.0), |_| {
        hits += 1;
        RayCastOpcode::ResetRay
    });
    assert_eq!(hits, 0);
    world.step(&StepConf::new(0.0)).unwrap();

    let mut all = Vec::new();
    world.ray_cast(Vec2::zero(), Vec2::new(10.0, 0.0), |hit| {
        all.push(hit.contactable.body);
        RayCastOpcode::ResetRay
    });
    all.sort();
    let mut expected = vec![near, far];
    expected.sort();
    assert_eq!(all, expected);

    let mut closest = None;
    world.ray_cast(Vec2::zero(), Vec2::new(10.0, 0.0), |hit| {
        closest = Some(*hit);
        RayCastOpcode::ClipRay
    });
    let closest = closest.unwrap();
    assert_eq!(closest.contactable.body, near);
    assert_abs_diff_eq!(closest.fraction, 0.15, epsilon = 1e-4);
    assert_abs_diff_eq!(closest.point.x, 1.5, epsilon = 1e-3);
    assert_abs_diff_eq!(closest.normal.get_x(), -1.0, epsilon = 1e-5);

    let mut found = Vec::new();
    world.query_aabb(&Aabb::new(Vec2::new(4.8, -0.2), Vec2::new(5.2, 0.2)), |contactable| {
        found.push(contactable.body);
        true
    });
    assert_eq!(found, vec![far]);
}

#[test]
fn test_clear_and_shift_origin() {
    let mut world = World::default();
    add_ground(&mut world);
    let body = add_box(&mut world, Vec2::new(5.0, 5.0));
    world.step(&StepConf::default()).unwrap();
    let moved = location(&world, body);

    world.shift_origin(Vec2::new(2.0, 3.0)).unwrap();
    let shifted = location(&world, body);
    assert_abs_diff_eq!(shifted.x, moved.x - 2.0, epsilon = 1e-5);
    assert_abs_diff_eq!(shifted.y, moved.y - 3.0, epsilon = 1e-5);
    assert!(world.get_tree().validate());

    // The broad-phase moved with the bodies
    let mut found = Vec::new();
    let around = Aabb::new(shifted - Vec2::new(0.1, 0.1), shifted + Vec2::new(0.1, 0.1));
    world.query_aabb(&around, |contactable| {
        found.push(contactable.body);
        true
    });
    assert!(found.contains(&body));

    world.clear().unwrap();
    assert_eq!(world.body_count(), 0);
    assert_eq!(world.contact_count(), 0);
    assert_eq!(world.get_tree().leaf_count(), 0);
    assert!(world.body(body).is_err());
    assert!(world.get_islands().is_empty());
    world.step(&StepConf::default()).unwrap();

    // Reused step storage starts over with the new bodies
    add_ground(&mut world);
    let fresh = add_box(&mut world, Vec2::new(0.0, 0.5));
    for _ in 0..5 {
        world.step(&StepConf::default()).unwrap();
    }
    let islands = world.get_islands();
    assert_eq!(islands.len(), 1);
    assert!(islands[0].bodies.contains(&fresh));
    assert!(islands[0].bodies.iter().all(|&id| world.body(id).is_ok()));
}

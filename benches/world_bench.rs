//! Benchmarks for phys2d
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use phys2d::collision::{collide_shapes, DynamicTree, ManifoldConf};
use phys2d::math::{Aabb, Transformation};
use phys2d::shapes::{EdgeShape, PolygonShape};
use phys2d::{BodyConf, BodyId, Shape, StepConf, Vec2, World, WorldConf};

fn build_stack(height: usize) -> (World, Vec<BodyId>) {
    let mut world = World::new(WorldConf::default());

    let ground = world.create_body(BodyConf::new_static()).unwrap();
    let edge = world
        .create_shape(Shape::edge(EdgeShape::new(Vec2::new(-40.0, 0.0), Vec2::new(40.0, 0.0))))
        .unwrap();
    world.attach(ground, edge).unwrap();

    let square = world
        .create_shape(Shape::polygon(PolygonShape::new_box(0.5, 0.5)).with_density(1.0).with_friction(0.6))
        .unwrap();
    let boxes = (0..height)
        .map(|i| {
            let conf = BodyConf::new_dynamic().with_location(Vec2::new(0.0, 0.55 + 1.05 * i as f32));
            let body = world.create_body(conf).unwrap();
            world.attach(body, square).unwrap();
            body
        })
        .collect();
    (world, boxes)
}

fn bench_world_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_step");

    group.bench_function("stack_of_20_for_60_steps", |b| {
        b.iter(|| {
            let (mut world, boxes) = build_stack(20);
            let conf = StepConf::default();
            for _ in 0..60 {
                world.step(black_box(&conf)).unwrap();
            }
            world.body(boxes[19]).unwrap().get_location()
        });
    });

    // Stepping a settled stack: contacts persist, nothing new is found
    let (mut settled, _) = build_stack(20);
    let conf = StepConf { allow_sleep: false, ..StepConf::default() };
    for _ in 0..120 {
        settled.step(&conf).unwrap();
    }
    group.bench_function("settled_stack_of_20_single_step", |b| {
        b.iter(|| settled.step(black_box(&conf)).unwrap());
    });

    group.finish();
}

fn bench_collision(c: &mut Criterion) {
    let mut group = c.benchmark_group("collision");

    let a = PolygonShape::new_box(0.5, 0.5);
    let b = PolygonShape::new_box(0.5, 0.5);
    let xf_a = Transformation::identity();
    let xf_b = Transformation::from_position_angle(Vec2::new(0.3, 0.9), 0.2);
    group.bench_function("collide_boxes", |bench| {
        bench.iter(|| {
            collide_shapes(&a.child(), black_box(&xf_a), &b.child(), black_box(&xf_b), ManifoldConf::default())
        });
    });

    let mut tree = DynamicTree::new();
    for i in 0..32 {
        for j in 0..32 {
            let min = Vec2::new(i as f32 * 2.0, j as f32 * 2.0);
            tree.create_proxy(Aabb::new(min, min + Vec2::new(1.5, 1.5)), i * 32 + j);
        }
    }
    let query = Aabb::new(Vec2::new(20.0, 20.0), Vec2::new(30.0, 30.0));
    group.bench_function("tree_query_1024_leaves", |bench| {
        bench.iter(|| {
            let mut found = 0;
            tree.query(black_box(&query), |_| {
                found += 1;
                true
            });
            found
        });
    });

    group.finish();
}

criterion_group!(benches, bench_world_step, bench_collision);
criterion_main!(benches);

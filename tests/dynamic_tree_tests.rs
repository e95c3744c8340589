use std::collections::{BTreeSet, HashMap};

use approx::assert_abs_diff_eq;
use phys2d::collision::{DynamicTree, ProxyId};
use phys2d::math::{Aabb, RayCastInput, Vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_aabb(rng: &mut StdRng) -> Aabb {
    let center = Vec2::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0));
    let half = Vec2::new(rng.gen_range(0.1..3.0), rng.gen_range(0.1..3.0));
    Aabb::new(center - half, center + half)
}

fn brute_force(tree: &DynamicTree<u32>, live: &HashMap<ProxyId, u32>, query: &Aabb) -> BTreeSet<ProxyId> {
    live.keys().copied().filter(|&id| tree.get_aabb(id).overlaps(query)).collect()
}

fn tree_query(tree: &DynamicTree<u32>, query: &Aabb) -> BTreeSet<ProxyId> {
    let mut found = BTreeSet::new();
    tree.query(query, |id| {
        found.insert(id);
        true
    });
    found
}

#[test]
fn test_tree_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut tree = DynamicTree::new();
    let mut live = HashMap::new();

    for i in 0..200u32 {
        let id = tree.create_proxy(random_aabb(&mut rng), i);
        live.insert(id, i);
    }
    assert_eq!(tree.leaf_count(), 200);
    assert!(tree.validate());

    for round in 0..20 {
        // Move a handful of proxies
        let ids: Vec<ProxyId> = live.keys().copied().collect();
        for &id in ids.iter().take(25) {
            let aabb = random_aabb(&mut rng);
            let displacement = Vec2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
            tree.move_proxy(id, aabb, displacement, 0.1);
        }

        // Remove a few and insert replacements
        for &id in ids.iter().skip(25).take(5) {
            assert_eq!(tree.destroy_proxy(id), live.remove(&id));
        }
        for i in 0..5u32 {
            let data = 1000 + round * 5 + i;
            let id = tree.create_proxy(random_aabb(&mut rng), data);
            live.insert(id, data);
        }

        assert!(tree.validate(), "invalid tree after round {}", round);
        assert_eq!(tree.leaf_count(), live.len());

        for _ in 0..10 {
            let query = random_aabb(&mut rng).get_fattened(5.0);
            assert_eq!(tree_query(&tree, &query), brute_force(&tree, &live, &query));
        }
    }

    for (&id, data) in &live {
        assert_eq!(tree.get_user_data(id), Some(data));
    }

    // Balancing keeps the tree shallow
    assert!(tree.get_height() < 20);
    assert!(tree.get_max_balance() <= 4);
    assert!(tree.get_area_ratio() >= 1.0);
}

#[test]
fn test_move_proxy_within_fat_aabb() {
    let mut tree = DynamicTree::new();
    let aabb = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0));
    let id = tree.create_proxy(aabb.get_fattened(0.1), ());

    // Still enclosed: nothing to do
    let nudged = Aabb::new(Vec2::new(0.05, 0.0), Vec2::new(1.05, 1.0));
    assert!(!tree.move_proxy(id, nudged, Vec2::zero(), 0.1));
    assert_eq!(tree.get_aabb(id), aabb.get_fattened(0.1));

    // Leaving the enclosure reinserts with a fresh fat AABB
    let moved = Aabb::new(Vec2::new(3.0, 0.0), Vec2::new(4.0, 1.0));
    assert!(tree.move_proxy(id, moved, Vec2::zero(), 0.1));
    assert!(tree.get_aabb(id).contains(&moved));
    assert!(tree.validate());
}

#[test]
fn test_tree_ray_cast_clips() {
    let mut tree = DynamicTree::new();
    let near = tree.create_proxy(Aabb::new(Vec2::new(2.0, -1.0), Vec2::new(3.0, 1.0)), "near");
    tree.create_proxy(Aabb::new(Vec2::new(6.0, -1.0), Vec2::new(7.0, 1.0)), "far");
    tree.create_proxy(Aabb::new(Vec2::new(4.0, 5.0), Vec2::new(5.0, 6.0)), "off");

    // Each hit clips the ray, so the nearest box wins whatever the visiting order
    let input = RayCastInput::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), 1.0);
    let mut closest = None;
    tree.ray_cast(&input, |sub_input, id| match tree.get_aabb(id).ray_cast(sub_input) {
        Some(hit) => {
            closest = Some((id, hit.fraction));
            hit.fraction
        }
        None => -1.0,
    });

    let (id, fraction) = closest.unwrap();
    assert_eq!(id, near);
    assert_abs_diff_eq!(fraction, 0.2, epsilon = 1e-6);
}

#[test]
fn test_shift_origin_and_destroy_all() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut tree = DynamicTree::with_capacity(16);
    let ids: Vec<ProxyId> = (0..16).map(|i| tree.create_proxy(random_aabb(&mut rng), i)).collect();
    let before: Vec<Aabb> = ids.iter().map(|&id| tree.get_aabb(id)).collect();

    let origin = Vec2::new(10.0, -5.0);
    tree.shift_origin(origin);
    for (&id, aabb) in ids.iter().zip(before.iter()) {
        let shifted = tree.get_aabb(id);
        assert_abs_diff_eq!(shifted.min.x, aabb.min.x - origin.x, epsilon = 1e-4);
        assert_abs_diff_eq!(shifted.max.y, aabb.max.y - origin.y, epsilon = 1e-4);
    }
    assert!(tree.validate());

    for id in ids {
        assert!(tree.destroy_proxy(id).is_some());
    }
    assert_eq!(tree.leaf_count(), 0);
    assert_eq!(tree.node_count(), 0);
    assert_eq!(tree.get_height(), 0);
    assert!(tree.validate());
}

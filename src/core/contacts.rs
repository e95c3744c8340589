//! Broad-phase proxies and the contact lifecycle: finding new contacts,
//! filtering and destroying stale ones, and updating manifolds.

use std::mem;

use tracing::{trace, warn};

use crate::collision::{should_collide, DistanceConf, ManifoldConf, ProxyId};
use crate::core::contact::{ContactFlags, ContactUpdateConf};
use crate::core::listeners::fire_listener;
use crate::core::{
    mix_friction, mix_restitution, BodyId, Contact, ContactEvent, ContactEventType, ContactId, ContactKey,
    Contactable, PreStepStats, ShapeId, StepConf, World,
};
use crate::math::{Real, Vec2};
use crate::Result;

/// Manifold update settings of a step
pub(crate) fn contact_update_conf(conf: &StepConf) -> ContactUpdateConf {
    ContactUpdateConf {
        distance: DistanceConf { max_iterations: conf.max_distance_iters, ..DistanceConf::default() },
        manifold: ManifoldConf { linear_slop: conf.linear_slop },
    }
}

impl World {
    /// Creates the proxies of fixtures attached since the last step
    pub(crate) fn create_pending_proxies(&mut self, extension: Real) {
        let pending = mem::take(&mut self.fixtures_for_proxies);
        for (body_id, shape_id) in pending {
            let (Ok(body), Ok(shape)) = (self.bodies.get_mut(body_id), self.shapes.get(shape_id)) else {
                continue;
            };
            if !body.is_enabled() {
                continue;
            }
            let xf = body.get_transformation();
            let Some(fixture) = body.fixtures_mut().iter_mut().find(|f| f.shape == shape_id) else {
                continue;
            };
            if !fixture.proxies.is_empty() {
                continue;
            }

            for child in 0..shape.get_child_count() {
                let aabb = shape.compute_aabb(child, &xf).get_fattened(extension);
                let proxy = self.tree.create_proxy(aabb, Contactable { body: body_id, shape: shape_id, child });
                fixture.proxies.push(proxy);
                self.proxy_keys.push(proxy);
            }
        }
    }

    /// Resynchronizes the proxies of bodies moved by hand. Returns the
    /// number of proxies that moved in the tree.
    pub(crate) fn synchronize_moved_bodies(&mut self, extension: Real) -> u32 {
        let pending = mem::take(&mut self.bodies_for_proxies);
        pending
            .into_iter()
            .map(|id| self.synchronize_proxies(id, Vec2::zero(), extension))
            .sum()
    }

    /// Moves a body's proxies to cover its sweep from the start of the step
    /// to its current transformation, predicting further motion by
    /// `displacement`. Returns the number of proxies reinserted in the tree.
    pub(crate) fn synchronize_proxies(&mut self, id: BodyId, displacement: Vec2, extension: Real) -> u32 {
        let Ok(body) = self.bodies.get(id) else {
            return 0;
        };
        let xf0 = body.get_sweep().get_transform0();
        let xf = body.get_transformation();
        let mut moved = 0;
        for fixture in body.get_fixtures() {
            let Ok(shape) = self.shapes.get(fixture.shape) else {
                continue;
            };
            for (child, proxy) in fixture.proxies.iter().enumerate() {
                let aabb = shape.compute_aabb(child, &xf0).union(&shape.compute_aabb(child, &xf));
                if self.tree.move_proxy(*proxy, aabb, displacement, extension) {
                    self.proxy_keys.push(*proxy);
                    moved += 1;
                }
            }
        }
        moved
    }

    /// Destroys the proxies of one fixture
    pub(crate) fn destroy_fixture_proxies(&mut self, body_id: BodyId, shape_id: ShapeId) {
        let Ok(body) = self.bodies.get_mut(body_id) else {
            return;
        };
        let Some(fixture) = body.fixtures_mut().iter_mut().find(|f| f.shape == shape_id) else {
            return;
        };
        for proxy in mem::take(&mut fixture.proxies) {
            self.tree.destroy_proxy(proxy);
            self.proxy_keys.retain(|p| *p != proxy);
        }
    }

    /// Searches the tree around every queued proxy and creates the contacts
    /// that are missing. Returns the number created.
    pub(crate) fn find_new_contacts(&mut self) -> u32 {
        let mut proxies = mem::take(&mut self.proxy_keys);
        proxies.sort_unstable();
        proxies.dedup();

        let mut keys = mem::take(&mut self.buffers.pair_keys);
        keys.clear();
        for &proxy in &proxies {
            let aabb = self.tree.get_aabb(proxy);
            self.tree.query(&aabb, |other| {
                if other != proxy {
                    keys.push(ContactKey::new(proxy, other));
                }
                true
            });
        }
        proxies.clear();
        self.proxy_keys = proxies;

        keys.sort_unstable();
        keys.dedup();
        let added = self.add_new_contacts(&keys);
        self.buffers.pair_keys = keys;
        added
    }

    /// Creates contacts for the given sorted and deduplicated proxy
    /// pairs, skipping the pairs that must not collide or already have a
    /// contact. Returns the number created.
    pub(crate) fn add_new_contacts(&mut self, keys: &[ContactKey]) -> u32 {
        let mut added = 0;
        for key in keys {
            if self.contact_keys.contains_key(key) {
                continue;
            }
            let (Some(a), Some(b)) = (self.contactable(key.get_min()), self.contactable(key.get_max())) else {
                continue;
            };
            if a.body == b.body || !self.can_collide(a, b) {
                continue;
            }
            match self.create_contact(*key, a, b) {
                Ok(_) => added += 1,
                Err(err) => {
                    warn!(%err, "contact not created");
                    break;
                }
            }
        }
        if added > 0 {
            trace!(added, "contacts added");
        }
        added
    }

    fn contactable(&self, proxy: ProxyId) -> Option<Contactable> {
        self.tree.get_user_data(proxy).copied()
    }

    /// Whether two shape children on different bodies may have a contact
    fn can_collide(&self, a: Contactable, b: Contactable) -> bool {
        let (Ok(body_a), Ok(body_b)) = (self.bodies.get(a.body), self.bodies.get(b.body)) else {
            return false;
        };
        // At least one body must be dynamic.
        if !body_a.is_accelerable() && !body_b.is_accelerable() {
            return false;
        }
        if self.joint_prevents_collision(a.body, b.body) {
            return false;
        }
        match (self.shapes.get(a.shape), self.shapes.get(b.shape)) {
            (Ok(shape_a), Ok(shape_b)) => should_collide(&shape_a.filter, &shape_b.filter),
            _ => false,
        }
    }

    fn create_contact(&mut self, key: ContactKey, a: Contactable, b: Contactable) -> Result<ContactId> {
        let shape_a = self.shapes.get(a.shape)?;
        let shape_b = self.shapes.get(b.shape)?;
        let body_a = self.bodies.get(a.body)?;
        let body_b = self.bodies.get(b.body)?;

        let mut flags = ContactFlags::empty();
        flags.set(ContactFlags::SENSOR, shape_a.is_sensor || shape_b.is_sensor);
        flags.set(ContactFlags::IMPENETRABLE, body_a.is_impenetrable() || body_b.is_impenetrable());

        let contact = Contact::new(
            key,
            a.body,
            a.shape,
            a.child,
            b.body,
            b.shape,
            b.child,
            mix_friction(shape_a.friction, shape_b.friction),
            mix_restitution(shape_a.restitution, shape_b.restitution),
            flags,
        );
        let id = self.contacts.insert(contact)?;
        self.contact_keys.insert(key, id);
        self.bodies.get_mut(a.body)?.add_contact(id);
        self.bodies.get_mut(b.body)?.add_contact(id);
        Ok(id)
    }

    /// Destroys a contact. Ending a touch fires the end-contact listener,
    /// and a contact that had points wakes its bodies.
    pub(crate) fn destroy_contact(&mut self, id: ContactId) {
        let Ok(contact) = self.contacts.get(id) else {
            return;
        };
        let event = ContactEvent {
            event_type: ContactEventType::End,
            contact: id,
            body_a: contact.get_body_a(),
            shape_a: contact.get_shape_a(),
            body_b: contact.get_body_b(),
            shape_b: contact.get_shape_b(),
        };
        let key = contact.get_key();
        let touching = contact.is_touching();
        let wakes = contact.get_manifold().get_point_count() > 0 && !contact.is_sensor();

        if touching {
            self.events.add_contact_event(event);
            fire_listener!(self, end_contact, id);
        }

        self.contact_keys.remove(&key);
        if self.contacts.remove(id).is_err() {
            return;
        }
        for body in [event.body_a, event.body_b] {
            if let Ok(body) = self.bodies.get_mut(body) {
                body.remove_contact(id);
            }
        }
        if wakes {
            self.wake_body(event.body_a);
            self.wake_body(event.body_b);
        }
    }

    /// Destroys the contacts of a body, or only those of one of its shapes
    pub(crate) fn destroy_contacts_of(&mut self, body_id: BodyId, shape_id: Option<ShapeId>) {
        let Ok(body) = self.bodies.get(body_id) else {
            return;
        };
        let doomed: Vec<ContactId> = body
            .get_contacts()
            .iter()
            .copied()
            .filter(|id| match shape_id {
                None => true,
                Some(shape) => self
                    .contacts
                    .get(*id)
                    .map(|c| {
                        (c.get_body_a() == body_id && c.get_shape_a() == shape)
                            || (c.get_body_b() == body_id && c.get_shape_b() == shape)
                    })
                    .unwrap_or(false),
            })
            .collect();
        for id in doomed {
            self.destroy_contact(id);
        }
    }

    /// Destroys contacts that the filtering rules now reject and contacts
    /// whose proxies stopped overlapping. Returns the number destroyed.
    pub(crate) fn destroy_stale_contacts(&mut self) -> u32 {
        let mut destroyed = 0;
        for index in 0..self.contacts.range() {
            let Some(id) = self.contacts.id_at(index) else {
                continue;
            };
            let Ok(contact) = self.contacts.get(id) else {
                continue;
            };
            let key = contact.get_key();

            if contact.needs_filtering() {
                let a = Contactable {
                    body: contact.get_body_a(),
                    shape: contact.get_shape_a(),
                    child: contact.get_child_a(),
                };
                let b = Contactable {
                    body: contact.get_body_b(),
                    shape: contact.get_shape_b(),
                    child: contact.get_child_b(),
                };
                if !self.can_collide(a, b) {
                    self.destroy_contact(id);
                    destroyed += 1;
                    continue;
                }
                if let Ok(contact) = self.contacts.get_mut(id) {
                    contact.set_flag(ContactFlags::NEEDS_FILTERING, false);
                }
            }

            if !self.tree.get_aabb(key.get_min()).overlaps(&self.tree.get_aabb(key.get_max())) {
                self.destroy_contact(id);
                destroyed += 1;
            }
        }
        destroyed
    }

    fn is_body_active(&self, id: BodyId) -> bool {
        self.bodies.get(id).map(|b| b.is_awake() && b.is_speedable()).unwrap_or(false)
    }

    /// Re-enables the contacts of awake bodies and updates those flagged
    /// for updating
    pub(crate) fn update_contacts(&mut self, conf: &ContactUpdateConf, stats: &mut PreStepStats) {
        for index in 0..self.contacts.range() {
            let Some(id) = self.contacts.id_at(index) else {
                continue;
            };
            let Ok(contact) = self.contacts.get(id) else {
                continue;
            };
            if !self.is_body_active(contact.get_body_a()) && !self.is_body_active(contact.get_body_b()) {
                stats.ignored += 1;
                continue;
            }
            let needs_updating = contact.needs_updating();
            if let Ok(contact) = self.contacts.get_mut(id) {
                contact.set_flag(ContactFlags::ENABLED, true);
            }
            if needs_updating {
                self.update_contact(id, conf);
                stats.updated += 1;
            } else {
                stats.skipped += 1;
            }
        }
    }

    /// Recomputes a contact's manifold at its bodies' current
    /// transformations and reports touching transitions. Returns whether
    /// the contact now touches.
    pub(crate) fn update_contact(&mut self, id: ContactId, conf: &ContactUpdateConf) -> bool {
        let Ok(contact) = self.contacts.get(id) else {
            return false;
        };
        let (body_a, body_b) = (contact.get_body_a(), contact.get_body_b());
        let (shape_a, shape_b) = (contact.get_shape_a(), contact.get_shape_b());
        let (Ok(ba), Ok(bb), Ok(sa), Ok(sb)) = (
            self.bodies.get(body_a),
            self.bodies.get(body_b),
            self.shapes.get(shape_a),
            self.shapes.get(shape_b),
        ) else {
            return false;
        };
        let xf_a = ba.get_transformation();
        let xf_b = bb.get_transformation();
        let Ok(contact) = self.contacts.get_mut(id) else {
            return false;
        };
        let update = contact.update(sa, &xf_a, sb, &xf_b, conf);
        let sensor = contact.is_sensor();

        let event_type = match (update.was_touching, update.now_touching) {
            (false, true) => Some(ContactEventType::Begin),
            (true, false) => Some(ContactEventType::End),
            _ => None,
        };
        if let Some(event_type) = event_type {
            self.events.add_contact_event(ContactEvent { event_type, contact: id, body_a, shape_a, body_b, shape_b });
            match event_type {
                ContactEventType::Begin => fire_listener!(self, begin_contact, id),
                ContactEventType::End => fire_listener!(self, end_contact, id),
            }
            if !sensor {
                self.wake_body(body_a);
                self.wake_body(body_b);
            }
        }

        if !sensor && update.was_touching && update.now_touching {
            fire_listener!(self, pre_solve, id, &update.old_manifold);
        }
        update.now_touching
    }
}

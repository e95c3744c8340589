use std::collections::HashMap;
use std::fmt;

use tracing::warn;

use crate::bodies::{body_flags::BodyFlags, Body, BodyConf, BodyType};
use crate::collision::{ray_cast_proxy, DynamicTree, ProxyId};
use crate::constraints::{Constraint, Joint, JointConf};
use crate::core::contact::ContactFlags;
use crate::core::island::Islanded;
use crate::core::solver::StepBuffers;
use crate::core::listeners::{fire_listener, Listeners};
use crate::core::{
    BodyEvent, BodyEventType, BodyId, Contact, ContactEvent, ContactId, ContactKey, ContactListener,
    Contactable, DetachListener, EventQueue, Island, JointId, JointListener, ObjectPool, PostSolveListener,
    PreSolveListener, ShapeId, ShapeListener, WorldConf,
};
use crate::error::PhysicsError;
use crate::math::{Aabb, RayCastInput, RayCastOpcode, Real, Transformation, UnitVec2, Vec2, Velocity};
use crate::shapes::Shape;
use crate::Result;

/// A shape child hit by [`World::ray_cast`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeRayHit {
    /// What was hit
    pub contactable: Contactable,

    /// World point of the hit
    pub point: Vec2,

    /// Surface normal at the hit
    pub normal: UnitVec2,

    /// Fraction along the ray from its start to its end
    pub fraction: Real,
}

/// The physics world: owns every body, shape, joint and contact and
/// advances them with [`step`](World::step).
///
/// Entities are referenced by generation-checked identifiers. Structural
/// changes (creating, destroying, attaching, moving bodies by hand) are
/// rejected with [`PhysicsError::WrongState`] while the world is locked,
/// which it is during a step and while a listener runs.
pub struct World {
    pub(crate) conf: WorldConf,

    pub(crate) bodies: ObjectPool<Body, BodyId>,

    pub(crate) shapes: ObjectPool<Shape, ShapeId>,

    pub(crate) joints: ObjectPool<Joint, JointId>,

    pub(crate) contacts: ObjectPool<Contact, ContactId>,

    /// Contact of every proxy pair that has one
    pub(crate) contact_keys: HashMap<ContactKey, ContactId>,

    /// Broad-phase tree over every child of every attached shape
    pub(crate) tree: DynamicTree<Contactable>,

    /// Proxies whose overlaps must be searched for new contacts
    pub(crate) proxy_keys: Vec<ProxyId>,

    /// Newly attached fixtures still waiting for proxies
    pub(crate) fixtures_for_proxies: Vec<(BodyId, ShapeId)>,

    /// Bodies moved by hand whose proxies must be resynchronized
    pub(crate) bodies_for_proxies: Vec<BodyId>,

    pub(crate) listeners: Listeners,

    pub(crate) events: EventQueue,

    pub(crate) islanded: Islanded,

    /// Island of the time of impact phase
    pub(crate) island: Island,

    /// Islands of the last regular phase. Only the first `island_count`
    /// are current; the rest keep their buffers for later steps.
    pub(crate) islands: Vec<Island>,

    pub(crate) island_count: usize,

    pub(crate) buffers: StepBuffers,

    /// Inverse of the last positive time step
    pub(crate) inv_delta_time: Real,

    pub(crate) locked: bool,

    /// False while a sub-stepped step still has time of impact events left
    pub(crate) step_complete: bool,
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConf::default())
    }
}

impl Clone for World {
    fn clone(&self) -> Self {
        Self {
            conf: self.conf.clone(),
            bodies: self.bodies.clone(),
            shapes: self.shapes.clone(),
            joints: self.joints.clone(),
            contacts: self.contacts.clone(),
            contact_keys: self.contact_keys.clone(),
            tree: self.tree.clone(),
            proxy_keys: self.proxy_keys.clone(),
            fixtures_for_proxies: self.fixtures_for_proxies.clone(),
            bodies_for_proxies: self.bodies_for_proxies.clone(),
            listeners: Listeners::default(),
            events: self.events.clone(),
            islanded: Islanded::default(),
            island: Island::new(),
            islands: self.get_islands().to_vec(),
            island_count: self.island_count,
            buffers: StepBuffers::default(),
            inv_delta_time: self.inv_delta_time,
            locked: false,
            step_complete: self.step_complete,
        }
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("bodies", &self.bodies.len())
            .field("shapes", &self.shapes.len())
            .field("joints", &self.joints.len())
            .field("contacts", &self.contacts.len())
            .field("locked", &self.locked)
            .field("step_complete", &self.step_complete)
            .finish_non_exhaustive()
    }
}

impl World {
    /// Creates an empty world
    pub fn new(conf: WorldConf) -> Self {
        Self {
            bodies: ObjectPool::with_capacity(conf.body_capacity),
            shapes: ObjectPool::with_capacity(conf.shape_capacity),
            joints: ObjectPool::with_capacity(conf.joint_capacity),
            contacts: ObjectPool::with_capacity(conf.contact_capacity),
            contact_keys: HashMap::with_capacity(conf.contact_capacity),
            tree: DynamicTree::with_capacity(conf.proxy_capacity),
            proxy_keys: Vec::new(),
            fixtures_for_proxies: Vec::new(),
            bodies_for_proxies: Vec::new(),
            listeners: Listeners::default(),
            events: EventQueue::new(),
            islanded: Islanded::default(),
            island: Island::new(),
            islands: Vec::new(),
            island_count: 0,
            buffers: StepBuffers::default(),
            inv_delta_time: 0.0,
            locked: false,
            step_complete: true,
            conf,
        }
    }

    /// The configuration the world was created with
    pub fn get_conf(&self) -> &WorldConf {
        &self.conf
    }

    /// Acceleration applied to dynamic bodies
    pub fn get_gravity(&self) -> Vec2 {
        self.conf.gravity
    }

    /// Whether structural changes are currently rejected
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// False when the last step stopped after a time of impact sub-step
    pub fn is_step_complete(&self) -> bool {
        self.step_complete
    }

    /// Inverse of the last positive time step
    pub fn get_inv_delta_time(&self) -> Real {
        self.inv_delta_time
    }

    /// The broad-phase tree
    pub fn get_tree(&self) -> &DynamicTree<Contactable> {
        &self.tree
    }

    /// One past the highest body slot ever used
    pub fn get_body_range(&self) -> usize {
        self.bodies.range()
    }

    /// One past the highest shape slot ever used
    pub fn get_shape_range(&self) -> usize {
        self.shapes.range()
    }

    /// One past the highest joint slot ever used
    pub fn get_joint_range(&self) -> usize {
        self.joints.range()
    }

    /// One past the highest contact slot ever used
    pub fn get_contact_range(&self) -> usize {
        self.contacts.range()
    }

    /// Islands solved by the regular phase of the last step, in solving
    /// order. Empty after a zero step or a step that only continued time
    /// of impact sub-stepping.
    pub fn get_islands(&self) -> &[Island] {
        &self.islands[..self.island_count]
    }

    /// Removes and yields the recorded contact events
    pub fn drain_contact_events(&mut self) -> impl Iterator<Item = ContactEvent> + '_ {
        self.events.drain_contact_events()
    }

    /// Removes and yields the recorded body events
    pub fn drain_body_events(&mut self) -> impl Iterator<Item = BodyEvent> + '_ {
        self.events.drain_body_events()
    }

    pub(crate) fn ensure_unlocked(&self, operation: &str) -> Result<()> {
        if self.locked {
            warn!(operation, "rejected, world is locked");
            return Err(PhysicsError::WrongState(format!("cannot {} while the world is locked", operation)));
        }
        Ok(())
    }

    // Listeners

    /// Sets the listener called before a shape is destroyed
    pub fn set_shape_destruction_listener(&mut self, listener: ShapeListener) {
        self.listeners.shape_destruction = Some(listener);
    }

    /// Sets the listener called when a destroy cascade detaches a shape
    pub fn set_detach_listener(&mut self, listener: DetachListener) {
        self.listeners.detach = Some(listener);
    }

    /// Sets the listener called when a joint goes away with its body
    pub fn set_joint_destruction_listener(&mut self, listener: JointListener) {
        self.listeners.joint_destruction = Some(listener);
    }

    /// Sets the listener called when a contact starts touching
    pub fn set_begin_contact_listener(&mut self, listener: ContactListener) {
        self.listeners.begin_contact = Some(listener);
    }

    /// Sets the listener called when a contact stops touching
    pub fn set_end_contact_listener(&mut self, listener: ContactListener) {
        self.listeners.end_contact = Some(listener);
    }

    /// Sets the listener called after a touching contact is updated
    pub fn set_pre_solve_listener(&mut self, listener: PreSolveListener) {
        self.listeners.pre_solve = Some(listener);
    }

    /// Sets the listener called with the solved impulses of a contact
    pub fn set_post_solve_listener(&mut self, listener: PostSolveListener) {
        self.listeners.post_solve = Some(listener);
    }

    /// Removes every listener
    pub fn clear_listeners(&mut self) {
        self.listeners = Listeners::default();
    }

    // Bodies

    /// Creates a body with no shapes attached
    pub fn create_body(&mut self, conf: BodyConf) -> Result<BodyId> {
        self.ensure_unlocked("create a body")?;
        if !conf.location.is_finite() || !conf.angle.is_finite() {
            return Err(PhysicsError::InvalidArgument("body placement must be finite".to_string()));
        }
        if conf.linear_damping < 0.0 || conf.angular_damping < 0.0 {
            return Err(PhysicsError::InvalidArgument("damping must not be negative".to_string()));
        }

        let mut body = Body::new(&conf);
        body.reset_mass_data(std::iter::empty());
        self.bodies.insert(body)
    }

    /// Destroys a body together with its joints, contacts and fixtures
    pub fn destroy_body(&mut self, id: BodyId) -> Result<()> {
        self.ensure_unlocked("destroy a body")?;
        let body = self.bodies.get(id)?;
        let joints = body.get_joints().to_vec();
        let contacts = body.get_contacts().to_vec();
        let shapes: Vec<ShapeId> = body.get_shapes().collect();

        for joint in joints {
            fire_listener!(self, joint_destruction, joint);
            self.remove_joint(joint)?;
        }
        for contact in contacts {
            self.destroy_contact(contact);
        }
        for shape in shapes {
            fire_listener!(self, detach, id, shape);
            self.destroy_fixture_proxies(id, shape);
        }

        self.bodies.remove(id)?;
        self.fixtures_for_proxies.retain(|(body, _)| *body != id);
        self.bodies_for_proxies.retain(|body| *body != id);
        Ok(())
    }

    /// The body identified by `id`
    pub fn body(&self, id: BodyId) -> Result<&Body> {
        self.bodies.get(id)
    }

    /// Iterates over the bodies
    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &Body)> + '_ {
        self.bodies.iter()
    }

    /// Number of bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    // Shapes

    fn validate_shape(&self, shape: &Shape) -> Result<()> {
        let radius = shape.get_vertex_radius();
        if !(self.conf.min_vertex_radius..=self.conf.max_vertex_radius).contains(&radius) {
            return Err(PhysicsError::InvalidArgument(format!(
                "vertex radius {} outside of [{}, {}]",
                radius, self.conf.min_vertex_radius, self.conf.max_vertex_radius
            )));
        }
        if !(shape.density >= 0.0) || !(shape.friction >= 0.0) || !(shape.restitution >= 0.0) {
            return Err(PhysicsError::InvalidArgument(
                "density, friction and restitution must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Stores a shape so it can be attached to bodies
    pub fn create_shape(&mut self, shape: Shape) -> Result<ShapeId> {
        self.ensure_unlocked("create a shape")?;
        self.validate_shape(&shape)?;
        self.shapes.insert(shape)
    }

    /// Detaches a shape from every body then destroys it
    pub fn destroy_shape(&mut self, id: ShapeId) -> Result<()> {
        self.ensure_unlocked("destroy a shape")?;
        self.shapes.get(id)?;

        for body in self.bodies_with_shape(id) {
            fire_listener!(self, detach, body, id);
            self.detach_internal(body, id)?;
        }
        fire_listener!(self, shape_destruction, id);
        self.shapes.remove(id)?;
        Ok(())
    }

    /// Replaces a shape. Bodies it's attached to get new proxies and mass.
    pub fn set_shape(&mut self, id: ShapeId, shape: Shape) -> Result<()> {
        self.ensure_unlocked("set a shape")?;
        self.validate_shape(&shape)?;
        *self.shapes.get_mut(id)? = shape;

        for body in self.bodies_with_shape(id) {
            self.destroy_contacts_of(body, Some(id));
            self.destroy_fixture_proxies(body, id);
            if self.bodies.get(body)?.is_enabled() {
                self.fixtures_for_proxies.push((body, id));
            }
            self.reset_mass_data(body)?;
        }
        Ok(())
    }

    /// The shape identified by `id`
    pub fn shape(&self, id: ShapeId) -> Result<&Shape> {
        self.shapes.get(id)
    }

    /// Iterates over the shapes
    pub fn shapes(&self) -> impl Iterator<Item = (ShapeId, &Shape)> + '_ {
        self.shapes.iter()
    }

    fn bodies_with_shape(&self, shape: ShapeId) -> Vec<BodyId> {
        self.bodies
            .iter()
            .filter(|(_, body)| body.get_shapes().any(|s| s == shape))
            .map(|(id, _)| id)
            .collect()
    }

    // Fixtures

    /// Attaches a shape to a body. The body's mass is recomputed right
    /// away; its proxies are created by the next step.
    pub fn attach(&mut self, body_id: BodyId, shape_id: ShapeId) -> Result<()> {
        self.ensure_unlocked("attach a shape")?;
        self.shapes.get(shape_id)?;
        let body = self.bodies.get_mut(body_id)?;
        if body.get_shapes().any(|s| s == shape_id) {
            return Err(PhysicsError::InvalidArgument(format!("{} is already attached to {}", shape_id, body_id)));
        }
        body.add_fixture(shape_id);
        if body.is_enabled() {
            self.fixtures_for_proxies.push((body_id, shape_id));
        }
        self.reset_mass_data(body_id)
    }

    /// Detaches a shape from a body, destroying the contacts it had
    pub fn detach(&mut self, body_id: BodyId, shape_id: ShapeId) -> Result<()> {
        self.ensure_unlocked("detach a shape")?;
        self.shapes.get(shape_id)?;
        if !self.bodies.get(body_id)?.get_shapes().any(|s| s == shape_id) {
            return Err(PhysicsError::InvalidArgument(format!("{} is not attached to {}", shape_id, body_id)));
        }
        self.detach_internal(body_id, shape_id)
    }

    fn detach_internal(&mut self, body_id: BodyId, shape_id: ShapeId) -> Result<()> {
        self.destroy_contacts_of(body_id, Some(shape_id));
        self.destroy_fixture_proxies(body_id, shape_id);
        self.bodies.get_mut(body_id)?.remove_fixture(shape_id);
        self.fixtures_for_proxies.retain(|f| *f != (body_id, shape_id));
        self.reset_mass_data(body_id)
    }

    pub(crate) fn reset_mass_data(&mut self, id: BodyId) -> Result<()> {
        let body = self.bodies.get_mut(id)?;
        let shape_ids: Vec<ShapeId> = body.get_shapes().collect();
        let shapes = &self.shapes;
        body.reset_mass_data(shape_ids.iter().filter_map(|s| shapes.get(*s).ok()));
        Ok(())
    }

    // Joints

    /// Creates a joint between the bodies named by `conf`
    pub fn create_joint(&mut self, conf: JointConf) -> Result<JointId> {
        self.ensure_unlocked("create a joint")?;
        let body_b = conf
            .get_body_b()
            .ok_or_else(|| PhysicsError::InvalidArgument("a joint needs a body".to_string()))?;
        self.bodies.get(body_b)?;
        let body_a = conf.get_body_a();
        if let Some(body_a) = body_a {
            self.bodies.get(body_a)?;
            if body_a == body_b {
                return Err(PhysicsError::InvalidArgument(format!("{} can't be jointed to itself", body_a)));
            }
        }

        let joint = Joint::new(&conf);
        let collide_connected = joint.get_collide_connected();
        let id = self.joints.insert(joint)?;

        if let Some(body_a) = body_a {
            self.bodies.get_mut(body_a)?.add_joint(id);
        }
        self.bodies.get_mut(body_b)?.add_joint(id);

        if let (Some(body_a), false) = (body_a, collide_connected) {
            self.flag_contacts_for_filtering(body_a, body_b);
        }
        Ok(id)
    }

    /// Destroys a joint and wakes its bodies
    pub fn destroy_joint(&mut self, id: JointId) -> Result<()> {
        self.ensure_unlocked("destroy a joint")?;
        self.remove_joint(id)?;
        Ok(())
    }

    fn remove_joint(&mut self, id: JointId) -> Result<Joint> {
        let joint = self.joints.remove(id)?;
        let body_a = joint.get_body_a();
        let body_b = joint.get_body_b();
        for body in [body_a, body_b].into_iter().flatten() {
            if let Ok(b) = self.bodies.get_mut(body) {
                b.remove_joint(id);
            }
            self.wake_body(body);
        }
        if let (Some(a), Some(b), false) = (body_a, body_b, joint.get_collide_connected()) {
            self.flag_contacts_for_filtering(a, b);
        }
        Ok(joint)
    }

    /// The joint identified by `id`
    pub fn joint(&self, id: JointId) -> Result<&Joint> {
        self.joints.get(id)
    }

    /// Iterates over the joints
    pub fn joints(&self) -> impl Iterator<Item = (JointId, &Joint)> + '_ {
        self.joints.iter()
    }

    /// Number of joints
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Changes a joint through `f` and wakes its bodies.
    ///
    /// ```ignore
    /// world.joint_mut(id, |j| j.as_prismatic_mut().map(|p| p.set_motor_speed(2.0)))?;
    /// ```
    pub fn joint_mut<R>(&mut self, id: JointId, f: impl FnOnce(&mut Joint) -> R) -> Result<R> {
        let joint = self.joints.get_mut(id)?;
        let result = f(&mut *joint);
        let bodies = [joint.get_body_a(), joint.get_body_b()];
        for body in bodies.into_iter().flatten() {
            self.wake_body(body);
        }
        Ok(result)
    }

    /// World anchors of a joint on its two bodies
    pub fn get_joint_anchors(&self, id: JointId) -> Result<(Vec2, Vec2)> {
        let joint = self.joints.get(id)?;
        let xf_a = match joint.get_body_a() {
            Some(body) => self.bodies.get(body)?.get_transformation(),
            None => Transformation::identity(),
        };
        let xf_b = match joint.get_body_b() {
            Some(body) => self.bodies.get(body)?.get_transformation(),
            None => Transformation::identity(),
        };
        Ok((joint.get_anchor_a(&xf_a), joint.get_anchor_b(&xf_b)))
    }

    fn flag_contacts_for_filtering(&mut self, body_a: BodyId, body_b: BodyId) {
        let Ok(body) = self.bodies.get(body_b) else {
            return;
        };
        for contact_id in body.get_contacts() {
            if let Ok(contact) = self.contacts.get_mut(*contact_id) {
                if contact.get_other_body(body_b) == body_a {
                    contact.set_flag(ContactFlags::NEEDS_FILTERING, true);
                }
            }
        }
    }

    /// Whether a joint between the two bodies keeps their shapes from
    /// colliding
    pub(crate) fn joint_prevents_collision(&self, body_a: BodyId, body_b: BodyId) -> bool {
        let Ok(body) = self.bodies.get(body_b) else {
            return false;
        };
        body.get_joints().iter().any(|id| {
            self.joints
                .get(*id)
                .map(|joint| joint.get_other_body(body_b) == Some(body_a) && !joint.get_collide_connected())
                .unwrap_or(false)
        })
    }

    // Contacts

    /// The contact identified by `id`
    pub fn contact(&self, id: ContactId) -> Result<&Contact> {
        self.contacts.get(id)
    }

    /// Iterates over the contacts
    pub fn contacts(&self) -> impl Iterator<Item = (ContactId, &Contact)> + '_ {
        self.contacts.iter()
    }

    /// Number of contacts, touching or not
    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    /// Copies the adjustable properties of `contact` onto the contact
    /// `id`: friction, restitution, tangent speed, and the enabled and
    /// impenetrable flags.
    ///
    /// The bodies, shapes and children of `contact` must be those of the
    /// contact being set, and it can only be made impenetrable when one of
    /// its bodies is.
    pub fn set_contact(&mut self, id: ContactId, contact: Contact) -> Result<()> {
        let current = self.contacts.get(id)?;
        let same_identity = current.get_key() == contact.get_key()
            && current.get_body_a() == contact.get_body_a()
            && current.get_body_b() == contact.get_body_b()
            && current.get_shape_a() == contact.get_shape_a()
            && current.get_shape_b() == contact.get_shape_b()
            && current.get_child_a() == contact.get_child_a()
            && current.get_child_b() == contact.get_child_b();
        if !same_identity {
            return Err(PhysicsError::InvalidArgument(format!("contact doesn't match {}", id)));
        }
        if !(contact.get_friction() >= 0.0) || !(contact.get_restitution() >= 0.0) {
            return Err(PhysicsError::InvalidArgument(
                "friction and restitution must not be negative".to_string(),
            ));
        }
        if contact.is_impenetrable() && !current.is_impenetrable() {
            let a = self.bodies.get(current.get_body_a())?;
            let b = self.bodies.get(current.get_body_b())?;
            if !a.is_impenetrable() && !b.is_impenetrable() {
                return Err(PhysicsError::InvalidArgument(format!(
                    "neither body of {} is impenetrable",
                    id
                )));
            }
        }

        let target = self.contacts.get_mut(id)?;
        target.set_friction(contact.get_friction());
        target.set_restitution(contact.get_restitution());
        target.set_tangent_speed(contact.get_tangent_speed());
        target.set_enabled(contact.is_enabled());
        target.set_impenetrable(contact.is_impenetrable());
        Ok(())
    }

    /// Enables or disables a contact until its next update
    pub fn set_contact_enabled(&mut self, id: ContactId, enabled: bool) -> Result<()> {
        self.contacts.get_mut(id)?.set_enabled(enabled);
        Ok(())
    }

    /// Overrides a contact's mixed friction
    pub fn set_contact_friction(&mut self, id: ContactId, friction: Real) -> Result<()> {
        if !(friction >= 0.0) {
            return Err(PhysicsError::InvalidArgument(format!("friction {} is negative", friction)));
        }
        self.contacts.get_mut(id)?.set_friction(friction);
        Ok(())
    }

    /// Overrides a contact's mixed restitution
    pub fn set_contact_restitution(&mut self, id: ContactId, restitution: Real) -> Result<()> {
        if !(restitution >= 0.0) {
            return Err(PhysicsError::InvalidArgument(format!("restitution {} is negative", restitution)));
        }
        self.contacts.get_mut(id)?.set_restitution(restitution);
        Ok(())
    }

    /// Sets a contact's tangent speed
    pub fn set_contact_tangent_speed(&mut self, id: ContactId, speed: Real) -> Result<()> {
        self.contacts.get_mut(id)?.set_tangent_speed(speed);
        Ok(())
    }

    pub(crate) fn refresh_impenetrable(&mut self, body_id: BodyId) {
        let Ok(body) = self.bodies.get(body_id) else {
            return;
        };
        for contact_id in body.get_contacts() {
            let Ok(contact) = self.contacts.get(*contact_id) else {
                continue;
            };
            let impenetrable = [contact.get_body_a(), contact.get_body_b()]
                .iter()
                .any(|b| self.bodies.get(*b).map(|b| b.is_impenetrable()).unwrap_or(false));
            if let Ok(contact) = self.contacts.get_mut(*contact_id) {
                contact.set_flag(ContactFlags::IMPENETRABLE, impenetrable);
            }
        }
    }

    // Body state

    /// Wakes a body, recording a wake event if it was asleep
    pub(crate) fn wake_body(&mut self, id: BodyId) {
        if let Ok(body) = self.bodies.get_mut(id) {
            if body.set_awake() {
                self.events.add_body_event(BodyEvent { event_type: BodyEventType::Wake, body: id });
            }
        }
    }

    /// Moves a body's origin to `location` at `angle`
    pub fn set_transform(&mut self, id: BodyId, location: Vec2, angle: Real) -> Result<()> {
        self.ensure_unlocked("set a body's transformation")?;
        if !location.is_finite() || !angle.is_finite() {
            return Err(PhysicsError::InvalidArgument("body placement must be finite".to_string()));
        }
        let body = self.bodies.get_mut(id)?;
        body.set_transformation(location, angle);
        let contacts = body.get_contacts().to_vec();
        for contact in contacts {
            if let Ok(contact) = self.contacts.get_mut(contact) {
                contact.set_flag(ContactFlags::NEEDS_UPDATING, true);
            }
        }
        if !self.bodies_for_proxies.contains(&id) {
            self.bodies_for_proxies.push(id);
        }
        Ok(())
    }

    /// Sets the velocity. A non-zero velocity wakes the body.
    pub fn set_velocity(&mut self, id: BodyId, velocity: Velocity) -> Result<()> {
        if !velocity.linear.is_finite() || !velocity.angular.is_finite() {
            return Err(PhysicsError::InvalidArgument("velocity must be finite".to_string()));
        }
        if self.bodies.get_mut(id)?.set_velocity(velocity) {
            self.wake_body(id);
        }
        Ok(())
    }

    /// Sets the acceleration applied on top of gravity. Forces applied
    /// with [`apply_force`](World::apply_force) add to it.
    pub fn set_acceleration(&mut self, id: BodyId, linear: Vec2, angular: Real) -> Result<()> {
        let body = self.bodies.get_mut(id)?;
        if !body.is_accelerable() {
            return Ok(());
        }
        body.set_acceleration(linear, angular);
        if linear != Vec2::zero() || angular != 0.0 {
            self.wake_body(id);
        }
        Ok(())
    }

    /// Changes a body's type, rebuilding its contacts
    pub fn set_type(&mut self, id: BodyId, body_type: BodyType) -> Result<()> {
        self.ensure_unlocked("set a body's type")?;
        if self.bodies.get(id)?.get_type() == body_type {
            return Ok(());
        }
        self.bodies.get_mut(id)?.set_type(body_type);
        self.reset_mass_data(id)?;
        self.destroy_contacts_of(id, None);
        self.wake_body(id);

        let body = self.bodies.get(id)?;
        self.proxy_keys.extend(body.get_fixtures().iter().flat_map(|f| f.proxies.iter().copied()));
        if !self.bodies_for_proxies.contains(&id) {
            self.bodies_for_proxies.push(id);
        }
        Ok(())
    }

    /// Wakes a body
    pub fn set_awake(&mut self, id: BodyId) -> Result<()> {
        self.bodies.get(id)?;
        self.wake_body(id);
        Ok(())
    }

    /// Puts a body to sleep, zeroing its velocity
    pub fn unset_awake(&mut self, id: BodyId) -> Result<()> {
        let body = self.bodies.get_mut(id)?;
        if body.is_awake() {
            body.unset_awake();
            self.events.add_body_event(BodyEvent { event_type: BodyEventType::Sleep, body: id });
        }
        Ok(())
    }

    /// Adds a body to or removes it from the simulation. A disabled body
    /// keeps its shapes and joints but has no proxies or contacts.
    pub fn set_enabled(&mut self, id: BodyId, enabled: bool) -> Result<()> {
        self.ensure_unlocked("enable or disable a body")?;
        let body = self.bodies.get_mut(id)?;
        if body.is_enabled() == enabled {
            return Ok(());
        }
        body.set_flag(BodyFlags::ENABLED, enabled);
        let shapes: Vec<ShapeId> = body.get_shapes().collect();

        if enabled {
            self.fixtures_for_proxies.extend(shapes.into_iter().map(|s| (id, s)));
        } else {
            self.destroy_contacts_of(id, None);
            for shape in shapes {
                self.destroy_fixture_proxies(id, shape);
            }
            self.fixtures_for_proxies.retain(|(body, _)| *body != id);
        }
        Ok(())
    }

    /// Sets whether a body gets continuous collision against dynamic bodies
    pub fn set_bullet(&mut self, id: BodyId, bullet: bool) -> Result<()> {
        self.bodies.get_mut(id)?.set_flag(BodyFlags::BULLET, bullet);
        self.refresh_impenetrable(id);
        Ok(())
    }

    /// Prevents or allows rotation. The angular velocity is zeroed.
    pub fn set_fixed_rotation(&mut self, id: BodyId, fixed: bool) -> Result<()> {
        let body = self.bodies.get_mut(id)?;
        if body.is_fixed_rotation() == fixed {
            return Ok(());
        }
        body.set_flag(BodyFlags::FIXED_ROTATION, fixed);
        let linear = body.get_linear_velocity();
        body.set_solved_velocity(Velocity::new(linear, 0.0));
        self.reset_mass_data(id)
    }

    /// Sets whether a body's island may sleep. Disallowing it wakes the body.
    pub fn set_sleeping_allowed(&mut self, id: BodyId, allowed: bool) -> Result<()> {
        self.bodies.get_mut(id)?.set_flag(BodyFlags::AUTO_SLEEP, allowed);
        if !allowed {
            self.wake_body(id);
        }
        Ok(())
    }

    /// Sets a body's linear damping
    pub fn set_linear_damping(&mut self, id: BodyId, damping: Real) -> Result<()> {
        if !(damping >= 0.0) {
            return Err(PhysicsError::InvalidArgument(format!("damping {} is negative", damping)));
        }
        let body = self.bodies.get_mut(id)?;
        let angular = body.get_angular_damping();
        body.set_damping(damping, angular);
        Ok(())
    }

    /// Sets a body's angular damping
    pub fn set_angular_damping(&mut self, id: BodyId, damping: Real) -> Result<()> {
        if !(damping >= 0.0) {
            return Err(PhysicsError::InvalidArgument(format!("damping {} is negative", damping)));
        }
        let body = self.bodies.get_mut(id)?;
        let linear = body.get_linear_damping();
        body.set_damping(linear, damping);
        Ok(())
    }

    fn wake_accelerable(&mut self, id: BodyId) -> Result<bool> {
        if !self.bodies.get(id)?.is_accelerable() {
            return Ok(false);
        }
        self.wake_body(id);
        Ok(true)
    }

    /// Applies a force at a world point, waking the body. The force keeps
    /// acting until the acceleration is reset.
    pub fn apply_force(&mut self, id: BodyId, force: Vec2, point: Vec2) -> Result<()> {
        if self.wake_accelerable(id)? {
            self.bodies.get_mut(id)?.apply_force(force, point);
        }
        Ok(())
    }

    /// Applies a torque, waking the body
    pub fn apply_torque(&mut self, id: BodyId, torque: Real) -> Result<()> {
        if self.wake_accelerable(id)? {
            self.bodies.get_mut(id)?.apply_torque(torque);
        }
        Ok(())
    }

    /// Applies an impulse at a world point, waking the body
    pub fn apply_linear_impulse(&mut self, id: BodyId, impulse: Vec2, point: Vec2) -> Result<()> {
        if self.wake_accelerable(id)? {
            self.bodies.get_mut(id)?.apply_linear_impulse(impulse, point);
        }
        Ok(())
    }

    /// Applies an angular impulse, waking the body
    pub fn apply_angular_impulse(&mut self, id: BodyId, impulse: Real) -> Result<()> {
        if self.wake_accelerable(id)? {
            self.bodies.get_mut(id)?.apply_angular_impulse(impulse);
        }
        Ok(())
    }

    // Queries

    /// Casts a ray from `p1` to `p2` against every attached shape child.
    ///
    /// The callback sees hits in no particular order and steers the cast
    /// through the returned opcode.
    pub fn ray_cast<F>(&self, p1: Vec2, p2: Vec2, mut callback: F)
    where
        F: FnMut(&ShapeRayHit) -> RayCastOpcode,
    {
        let input = RayCastInput::new(p1, p2, 1.0);
        let tree = &self.tree;
        let bodies = &self.bodies;
        let shapes = &self.shapes;

        tree.ray_cast(&input, |sub_input, proxy| {
            let Some(contactable) = tree.get_user_data(proxy).copied() else {
                return sub_input.max_fraction;
            };
            let (Ok(body), Ok(shape)) = (bodies.get(contactable.body), shapes.get(contactable.shape)) else {
                return sub_input.max_fraction;
            };
            let child = shape.get_child(contactable.child);
            let Some(hit) = ray_cast_proxy(&child, sub_input, &body.get_transformation()) else {
                return sub_input.max_fraction;
            };

            let point = p1 + (p2 - p1) * hit.fraction;
            let shape_hit = ShapeRayHit { contactable, point, normal: hit.normal, fraction: hit.fraction };
            match callback(&shape_hit) {
                RayCastOpcode::Terminate => 0.0,
                RayCastOpcode::IgnoreFixture => -1.0,
                RayCastOpcode::ClipRay => hit.fraction,
                RayCastOpcode::ResetRay => input.max_fraction,
            }
        });
    }

    /// Calls `callback` for every shape child whose fat AABB overlaps
    /// `aabb`, until it returns false
    pub fn query_aabb<F>(&self, aabb: &Aabb, mut callback: F)
    where
        F: FnMut(Contactable) -> bool,
    {
        self.tree.query(aabb, |proxy| match self.tree.get_user_data(proxy) {
            Some(contactable) => callback(*contactable),
            None => true,
        });
    }

    /// Destroys every entity. Listeners are kept and not called.
    pub fn clear(&mut self) -> Result<()> {
        self.ensure_unlocked("clear the world")?;
        self.bodies.clear();
        self.shapes.clear();
        self.joints.clear();
        self.contacts.clear();
        self.contact_keys.clear();
        self.tree = DynamicTree::with_capacity(self.conf.proxy_capacity);
        self.proxy_keys.clear();
        self.fixtures_for_proxies.clear();
        self.bodies_for_proxies.clear();
        self.events.clear();
        self.island.clear();
        self.island_count = 0;
        self.inv_delta_time = 0.0;
        self.step_complete = true;
        Ok(())
    }

    /// Moves the world origin to `new_origin`. Everything is translated by
    /// `-new_origin`.
    pub fn shift_origin(&mut self, new_origin: Vec2) -> Result<()> {
        self.ensure_unlocked("shift the origin")?;
        for (_, body) in self.bodies.iter_mut() {
            body.shift_origin(new_origin);
        }
        for (_, joint) in self.joints.iter_mut() {
            if let Some(target) = joint.as_target_mut() {
                target.shift_origin(new_origin);
            }
        }
        self.tree.shift_origin(new_origin);
        Ok(())
    }
}

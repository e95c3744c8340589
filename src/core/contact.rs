use bitflags::bitflags;

use crate::collision::{collide_shapes, test_overlap, DistanceConf, Manifold, ManifoldConf, ProxyId};
use crate::core::{BodyId, ShapeId};
use crate::math::{Real, Transformation};
use crate::shapes::Shape;

bitflags! {
    /// State flags of a contact
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ContactFlags: u32 {
        /// The manifold has at least one point, or the sensor overlaps
        const TOUCHING = 0x01;

        /// The contact takes part in solving. Reset every step.
        const ENABLED = 0x02;

        /// The filtering rules must be re-checked
        const NEEDS_FILTERING = 0x04;

        /// The manifold must be recomputed
        const NEEDS_UPDATING = 0x08;

        /// Either shape is a sensor
        const SENSOR = 0x10;

        /// Either body is a bullet, static or kinematic
        const IMPENETRABLE = 0x20;

        /// The cached time of impact is current
        const TOI_VALID = 0x40;
    }
}

/// Identifies a contact by its two broad-phase proxies, smaller first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContactKey {
    min: ProxyId,
    max: ProxyId,
}

impl ContactKey {
    /// Creates the key of a proxy pair, in either order
    pub fn new(a: ProxyId, b: ProxyId) -> Self {
        if a < b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    /// The smaller proxy id
    #[inline]
    pub fn get_min(&self) -> ProxyId {
        self.min
    }

    /// The larger proxy id
    #[inline]
    pub fn get_max(&self) -> ProxyId {
        self.max
    }
}

/// Settings of a manifold update
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ContactUpdateConf {
    pub distance: DistanceConf,
    pub manifold: ManifoldConf,
}

/// Touching states around a manifold update
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ContactUpdate {
    pub old_manifold: Manifold,
    pub was_touching: bool,
    pub now_touching: bool,
}

/// Friction from mixing two shapes' coefficients
#[inline]
pub fn mix_friction(friction_a: Real, friction_b: Real) -> Real {
    (friction_a * friction_b).sqrt()
}

/// Restitution from mixing two shapes' coefficients
#[inline]
pub fn mix_restitution(restitution_a: Real, restitution_b: Real) -> Real {
    restitution_a.max(restitution_b)
}

/// A potential or actual touch between children of two shapes on two
/// bodies.
///
/// Contacts are created by the world when the children's fat AABBs start
/// overlapping and destroyed when they stop, so a contact is not
/// necessarily touching.
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    key: ContactKey,

    body_a: BodyId,

    shape_a: ShapeId,

    child_a: usize,

    body_b: BodyId,

    shape_b: ShapeId,

    child_b: usize,

    manifold: Manifold,

    friction: Real,

    restitution: Real,

    tangent_speed: Real,

    toi: Real,

    toi_count: u8,

    flags: ContactFlags,
}

impl Contact {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        key: ContactKey,
        body_a: BodyId,
        shape_a: ShapeId,
        child_a: usize,
        body_b: BodyId,
        shape_b: ShapeId,
        child_b: usize,
        friction: Real,
        restitution: Real,
        flags: ContactFlags,
    ) -> Self {
        Self {
            key,
            body_a,
            shape_a,
            child_a,
            body_b,
            shape_b,
            child_b,
            manifold: Manifold::new(),
            friction,
            restitution,
            tangent_speed: 0.0,
            toi: 0.0,
            toi_count: 0,
            flags: flags | ContactFlags::ENABLED | ContactFlags::NEEDS_UPDATING,
        }
    }

    /// Proxy pair key
    pub fn get_key(&self) -> ContactKey {
        self.key
    }

    /// Body of shape A
    pub fn get_body_a(&self) -> BodyId {
        self.body_a
    }

    /// Shape A
    pub fn get_shape_a(&self) -> ShapeId {
        self.shape_a
    }

    /// Child index of shape A
    pub fn get_child_a(&self) -> usize {
        self.child_a
    }

    /// Body of shape B
    pub fn get_body_b(&self) -> BodyId {
        self.body_b
    }

    /// Shape B
    pub fn get_shape_b(&self) -> ShapeId {
        self.shape_b
    }

    /// Child index of shape B
    pub fn get_child_b(&self) -> usize {
        self.child_b
    }

    /// The body on the other side of `body`
    pub fn get_other_body(&self, body: BodyId) -> BodyId {
        if self.body_a == body {
            self.body_b
        } else {
            self.body_a
        }
    }

    /// Manifold from the last update
    pub fn get_manifold(&self) -> &Manifold {
        &self.manifold
    }

    /// Mixed friction
    pub fn get_friction(&self) -> Real {
        self.friction
    }

    /// Mixed restitution
    pub fn get_restitution(&self) -> Real {
        self.restitution
    }

    /// Speed of shape B's surface relative to shape A's, along the tangent
    pub fn get_tangent_speed(&self) -> Real {
        self.tangent_speed
    }

    /// Cached time of impact, meaningful while [`has_valid_toi`](Self::has_valid_toi)
    pub fn get_toi(&self) -> Real {
        self.toi
    }

    /// Number of TOI events this contact took part in during the step
    pub fn get_toi_count(&self) -> u8 {
        self.toi_count
    }

    /// Whether the shapes touch
    pub fn is_touching(&self) -> bool {
        self.flags.contains(ContactFlags::TOUCHING)
    }

    /// Whether the contact takes part in solving
    pub fn is_enabled(&self) -> bool {
        self.flags.contains(ContactFlags::ENABLED)
    }

    /// Whether either shape is a sensor
    pub fn is_sensor(&self) -> bool {
        self.flags.contains(ContactFlags::SENSOR)
    }

    /// Whether continuous collision applies to this contact
    pub fn is_impenetrable(&self) -> bool {
        self.flags.contains(ContactFlags::IMPENETRABLE)
    }

    /// Whether filtering must be re-checked
    pub fn needs_filtering(&self) -> bool {
        self.flags.contains(ContactFlags::NEEDS_FILTERING)
    }

    /// Whether the manifold must be recomputed
    pub fn needs_updating(&self) -> bool {
        self.flags.contains(ContactFlags::NEEDS_UPDATING)
    }

    /// Whether the cached time of impact is current
    pub fn has_valid_toi(&self) -> bool {
        self.flags.contains(ContactFlags::TOI_VALID)
    }

    pub(crate) fn set_flag(&mut self, flag: ContactFlags, value: bool) {
        self.flags.set(flag, value);
    }

    /// Sets the friction. Takes effect through `World::set_contact`.
    pub fn set_friction(&mut self, friction: Real) {
        self.friction = friction;
    }

    /// Sets the restitution
    pub fn set_restitution(&mut self, restitution: Real) {
        self.restitution = restitution;
    }

    /// Sets the tangent speed, e.g. for conveyor belts
    pub fn set_tangent_speed(&mut self, speed: Real) {
        self.tangent_speed = speed;
    }

    /// Enables or disables the contact for the current step
    pub fn set_enabled(&mut self, enabled: bool) {
        self.flags.set(ContactFlags::ENABLED, enabled);
    }

    /// Requests continuous collision for the contact. The world only
    /// accepts this when one of the bodies is impenetrable.
    pub fn set_impenetrable(&mut self, impenetrable: bool) {
        self.flags.set(ContactFlags::IMPENETRABLE, impenetrable);
    }

    pub(crate) fn set_toi(&mut self, toi: Real) {
        self.toi = toi;
        self.flags.insert(ContactFlags::TOI_VALID);
    }

    pub(crate) fn unset_toi(&mut self) {
        self.flags.remove(ContactFlags::TOI_VALID);
    }

    pub(crate) fn reset_toi_count(&mut self) {
        self.toi_count = 0;
    }

    pub(crate) fn increment_toi_count(&mut self) {
        self.toi_count = self.toi_count.saturating_add(1);
    }

    pub(crate) fn get_manifold_mut(&mut self) -> &mut Manifold {
        &mut self.manifold
    }

    /// Recomputes the manifold and touching state from the shapes at the
    /// given body transformations. Impulses of points whose features match
    /// the previous manifold's are carried over.
    pub(crate) fn update(
        &mut self,
        shape_a: &Shape,
        xf_a: &Transformation,
        shape_b: &Shape,
        xf_b: &Transformation,
        conf: &ContactUpdateConf,
    ) -> ContactUpdate {
        let old_manifold = self.manifold;
        let was_touching = self.is_touching();

        let proxy_a = shape_a.get_child(self.child_a);
        let proxy_b = shape_b.get_child(self.child_b);

        let now_touching = if self.is_sensor() {
            self.manifold = Manifold::new();
            test_overlap(&proxy_a, xf_a, &proxy_b, xf_b, conf.distance)
        } else {
            let mut manifold = collide_shapes(&proxy_a, xf_a, &proxy_b, xf_b, conf.manifold);
            manifold.copy_matching_impulses(&old_manifold);
            self.manifold = manifold;
            manifold.get_point_count() > 0
        };

        self.flags.set(ContactFlags::TOUCHING, now_touching);
        self.flags.remove(ContactFlags::NEEDS_UPDATING);

        ContactUpdate { old_manifold, was_touching, now_touching }
    }
}

use crate::bodies::{body_flags::BodyFlags, BodyType};
use crate::collision::ProxyId;
use crate::core::{ContactId, JointId, ShapeId};
use crate::math::{cross_sv, Position, Real, Sweep, Transformation, UnitVec2, Vec2, Velocity};
use crate::shapes::Shape;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Everything needed to create a body
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct BodyConf {
    /// The body's type
    pub body_type: BodyType,

    /// World location of the body's origin
    pub location: Vec2,

    /// World angle in radians
    pub angle: Real,

    /// Linear velocity of the body's origin
    pub linear_velocity: Vec2,

    /// Angular velocity in radians per second
    pub angular_velocity: Real,

    /// Linear acceleration applied on top of gravity every step
    pub linear_acceleration: Vec2,

    /// Angular acceleration applied every step
    pub angular_acceleration: Real,

    /// Linear velocity damping, 0 for none
    pub linear_damping: Real,

    /// Angular velocity damping, 0 for none
    pub angular_damping: Real,

    /// Time the body has already been still
    pub under_active_time: Real,

    /// Whether the body's island may go to sleep
    pub allow_sleep: bool,

    /// Whether the body starts awake
    pub awake: bool,

    /// Whether the body is prevented from rotating
    pub fixed_rotation: bool,

    /// Whether the body gets continuous collision against dynamic bodies
    pub bullet: bool,

    /// Whether the body starts out taking part in the simulation
    pub enabled: bool,
}

impl Default for BodyConf {
    fn default() -> Self {
        Self {
            body_type: BodyType::Static,
            location: Vec2::zero(),
            angle: 0.0,
            linear_velocity: Vec2::zero(),
            angular_velocity: 0.0,
            linear_acceleration: Vec2::zero(),
            angular_acceleration: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            under_active_time: 0.0,
            allow_sleep: true,
            awake: true,
            fixed_rotation: false,
            bullet: false,
            enabled: true,
        }
    }
}

impl BodyConf {
    /// Configuration of a body of the given type at the origin
    pub fn new(body_type: BodyType) -> Self {
        Self { body_type, ..Self::default() }
    }

    /// Static body configuration
    pub fn new_static() -> Self {
        Self::new(BodyType::Static)
    }

    /// Kinematic body configuration
    pub fn new_kinematic() -> Self {
        Self::new(BodyType::Kinematic)
    }

    /// Dynamic body configuration
    pub fn new_dynamic() -> Self {
        Self::new(BodyType::Dynamic)
    }

    /// Sets the location
    pub fn with_location(mut self, location: Vec2) -> Self {
        self.location = location;
        self
    }

    /// Sets the angle
    pub fn with_angle(mut self, angle: Real) -> Self {
        self.angle = angle;
        self
    }

    /// Sets the linear velocity
    pub fn with_linear_velocity(mut self, velocity: Vec2) -> Self {
        self.linear_velocity = velocity;
        self
    }

    /// Sets the angular velocity
    pub fn with_angular_velocity(mut self, velocity: Real) -> Self {
        self.angular_velocity = velocity;
        self
    }

    /// Sets the linear acceleration
    pub fn with_linear_acceleration(mut self, acceleration: Vec2) -> Self {
        self.linear_acceleration = acceleration;
        self
    }

    /// Sets the linear damping
    pub fn with_linear_damping(mut self, damping: Real) -> Self {
        self.linear_damping = damping;
        self
    }

    /// Sets the angular damping
    pub fn with_angular_damping(mut self, damping: Real) -> Self {
        self.angular_damping = damping;
        self
    }

    /// Sets whether sleeping is allowed
    pub fn with_allow_sleep(mut self, allow: bool) -> Self {
        self.allow_sleep = allow;
        self
    }

    /// Sets whether the body starts awake
    pub fn with_awake(mut self, awake: bool) -> Self {
        self.awake = awake;
        self
    }

    /// Sets whether rotation is fixed
    pub fn with_fixed_rotation(mut self, fixed: bool) -> Self {
        self.fixed_rotation = fixed;
        self
    }

    /// Sets whether the body is a bullet
    pub fn with_bullet(mut self, bullet: bool) -> Self {
        self.bullet = bullet;
        self
    }

    /// Sets whether the body starts enabled
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// A shape attached to a body, with one broad-phase proxy per child once
/// the world has synchronized it
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    /// The attached shape
    pub shape: ShapeId,

    /// Proxies of the shape's children, empty until the next step
    pub proxies: Vec<ProxyId>,
}

/// A rigid body.
///
/// Bodies are owned by a world and changed through it; the world keeps the
/// body's attached shapes, contacts and joints listed here in sync.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    /// The body's type
    body_type: BodyType,

    /// The body's flags
    flags: BodyFlags,

    /// Transformation of the body's origin
    xf: Transformation,

    /// Center of mass motion over the current step
    sweep: Sweep,

    /// Linear velocity of the center of mass and angular velocity
    velocity: Velocity,

    /// Linear acceleration, not including gravity
    linear_acceleration: Vec2,

    /// Angular acceleration
    angular_acceleration: Real,

    /// Mass, zero for static and kinematic bodies
    mass: Real,

    /// Inverse of the mass
    inv_mass: Real,

    /// Rotational inertia about the center of mass
    rot_inertia: Real,

    /// Inverse of the rotational inertia
    inv_rot_inertia: Real,

    /// Linear velocity damping
    linear_damping: Real,

    /// Angular velocity damping
    angular_damping: Real,

    /// How long the body has been still
    under_active_time: Real,

    /// Attached shapes
    fixtures: Vec<Fixture>,

    /// Contacts the body takes part in
    contacts: Vec<ContactId>,

    /// Joints attached to the body
    joints: Vec<JointId>,
}

impl Body {
    /// Creates a body from its configuration, with no shapes attached
    pub fn new(conf: &BodyConf) -> Self {
        let mut flags = BodyFlags::empty();
        flags.set(BodyFlags::AUTO_SLEEP, conf.allow_sleep);
        flags.set(BodyFlags::AWAKE, conf.awake && conf.body_type.is_speedable());
        flags.set(BodyFlags::FIXED_ROTATION, conf.fixed_rotation);
        flags.set(BodyFlags::BULLET, conf.bullet);
        flags.set(BodyFlags::ENABLED, conf.enabled);

        let xf = Transformation::from_position_angle(conf.location, conf.angle);
        let (inv_mass, mass) = if conf.body_type.is_accelerable() { (1.0, 1.0) } else { (0.0, 0.0) };
        let velocity = if conf.body_type.is_speedable() {
            Velocity::new(conf.linear_velocity, conf.angular_velocity)
        } else {
            Velocity::zero()
        };

        Self {
            body_type: conf.body_type,
            flags,
            xf,
            sweep: Sweep::new(Position::new(conf.location, conf.angle), Vec2::zero()),
            velocity,
            linear_acceleration: conf.linear_acceleration,
            angular_acceleration: conf.angular_acceleration,
            mass,
            inv_mass,
            rot_inertia: 0.0,
            inv_rot_inertia: 0.0,
            linear_damping: conf.linear_damping,
            angular_damping: conf.angular_damping,
            under_active_time: conf.under_active_time,
            fixtures: Vec::new(),
            contacts: Vec::new(),
            joints: Vec::new(),
        }
    }

    /// The body's type
    pub fn get_type(&self) -> BodyType {
        self.body_type
    }

    /// Transformation of the body's origin
    pub fn get_transformation(&self) -> Transformation {
        self.xf
    }

    /// World location of the body's origin
    pub fn get_location(&self) -> Vec2 {
        self.xf.p
    }

    /// World angle
    pub fn get_angle(&self) -> Real {
        self.sweep.pos1.angular
    }

    /// The rotation of the body
    pub fn get_rotation(&self) -> UnitVec2 {
        self.xf.q
    }

    /// Center of mass motion over the current step
    pub fn get_sweep(&self) -> &Sweep {
        &self.sweep
    }

    /// World position of the center of mass
    pub fn get_world_center(&self) -> Vec2 {
        self.sweep.pos1.linear
    }

    /// Center of mass in body coordinates
    pub fn get_local_center(&self) -> Vec2 {
        self.sweep.local_center
    }

    /// Velocity of the center of mass
    pub fn get_velocity(&self) -> Velocity {
        self.velocity
    }

    /// Linear velocity of the center of mass
    pub fn get_linear_velocity(&self) -> Vec2 {
        self.velocity.linear
    }

    /// Angular velocity
    pub fn get_angular_velocity(&self) -> Real {
        self.velocity.angular
    }

    /// Linear acceleration, not including gravity
    pub fn get_linear_acceleration(&self) -> Vec2 {
        self.linear_acceleration
    }

    /// Angular acceleration
    pub fn get_angular_acceleration(&self) -> Real {
        self.angular_acceleration
    }

    /// Mass
    pub fn get_mass(&self) -> Real {
        self.mass
    }

    /// Inverse mass
    pub fn get_inv_mass(&self) -> Real {
        self.inv_mass
    }

    /// Rotational inertia about the center of mass
    pub fn get_rot_inertia(&self) -> Real {
        self.rot_inertia
    }

    /// Inverse rotational inertia
    pub fn get_inv_rot_inertia(&self) -> Real {
        self.inv_rot_inertia
    }

    /// Linear damping
    pub fn get_linear_damping(&self) -> Real {
        self.linear_damping
    }

    /// Angular damping
    pub fn get_angular_damping(&self) -> Real {
        self.angular_damping
    }

    /// Time the body has been still
    pub fn get_under_active_time(&self) -> Real {
        self.under_active_time
    }

    /// Attached shapes and their proxies
    pub fn get_fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    /// Identifiers of the attached shapes
    pub fn get_shapes(&self) -> impl Iterator<Item = ShapeId> + '_ {
        self.fixtures.iter().map(|f| f.shape)
    }

    /// Contacts the body takes part in
    pub fn get_contacts(&self) -> &[ContactId] {
        &self.contacts
    }

    /// Joints attached to the body
    pub fn get_joints(&self) -> &[JointId] {
        &self.joints
    }

    /// Whether the body is awake
    pub fn is_awake(&self) -> bool {
        self.flags.contains(BodyFlags::AWAKE)
    }

    /// Whether the body takes part in the simulation
    pub fn is_enabled(&self) -> bool {
        self.flags.contains(BodyFlags::ENABLED)
    }

    /// Whether the body is a bullet
    pub fn is_bullet(&self) -> bool {
        self.flags.contains(BodyFlags::BULLET)
    }

    /// Whether the body's rotation is fixed
    pub fn is_fixed_rotation(&self) -> bool {
        self.flags.contains(BodyFlags::FIXED_ROTATION)
    }

    /// Whether the body's island may sleep
    pub fn is_sleeping_allowed(&self) -> bool {
        self.flags.contains(BodyFlags::AUTO_SLEEP)
    }

    /// Whether the body may have a velocity
    pub fn is_speedable(&self) -> bool {
        self.body_type.is_speedable()
    }

    /// Whether forces and contacts affect the body
    pub fn is_accelerable(&self) -> bool {
        self.body_type.is_accelerable()
    }

    /// Whether contacts with this body get continuous collision
    pub fn is_impenetrable(&self) -> bool {
        self.is_bullet() || !self.is_accelerable()
    }

    pub(crate) fn set_flag(&mut self, flag: BodyFlags, value: bool) {
        self.flags.set(flag, value);
    }

    /// Wakes the body. Returns whether it was asleep.
    pub(crate) fn set_awake(&mut self) -> bool {
        if !self.is_speedable() {
            return false;
        }
        let was_asleep = !self.is_awake();
        if was_asleep {
            self.flags.insert(BodyFlags::AWAKE);
            self.under_active_time = 0.0;
        }
        was_asleep
    }

    /// Puts the body to sleep, zeroing its velocity
    pub(crate) fn unset_awake(&mut self) {
        self.flags.remove(BodyFlags::AWAKE);
        self.under_active_time = 0.0;
        self.velocity = Velocity::zero();
    }

    /// Sets the velocity. Ignored for static bodies. Returns whether the
    /// velocity is non-zero.
    pub(crate) fn set_velocity(&mut self, velocity: Velocity) -> bool {
        if !self.is_speedable() {
            return false;
        }
        self.velocity = velocity;
        velocity.linear.length_squared() > 0.0 || velocity.angular != 0.0
    }

    /// Sets the velocity computed by the solver
    pub(crate) fn set_solved_velocity(&mut self, velocity: Velocity) {
        self.velocity = velocity;
    }

    pub(crate) fn set_acceleration(&mut self, linear: Vec2, angular: Real) {
        self.linear_acceleration = linear;
        self.angular_acceleration = angular;
    }

    pub(crate) fn set_damping(&mut self, linear: Real, angular: Real) {
        self.linear_damping = linear;
        self.angular_damping = angular;
    }

    pub(crate) fn set_under_active_time(&mut self, time: Real) {
        self.under_active_time = time;
    }

    /// Moves the origin to `location` at `angle`, stopping any sweep in
    /// progress
    pub(crate) fn set_transformation(&mut self, location: Vec2, angle: Real) {
        self.xf = Transformation::from_position_angle(location, angle);
        let center = self.xf.transform(self.sweep.local_center);
        self.sweep = Sweep::new(Position::new(center, angle), self.sweep.local_center);
    }

    /// Sets the sweep and the transformation at its end
    pub(crate) fn set_sweep(&mut self, sweep: Sweep) {
        self.sweep = sweep;
        self.xf = sweep.get_transform1();
    }

    pub(crate) fn sweep_mut(&mut self) -> &mut Sweep {
        &mut self.sweep
    }

    /// Sets the transformation to the sweep's end
    pub(crate) fn synchronize_transform(&mut self) {
        self.xf = self.sweep.get_transform1();
    }

    /// Advances the sweep to `alpha` of the step and puts the body there
    pub(crate) fn advance(&mut self, alpha: Real) {
        self.sweep.advance0(alpha);
        self.sweep.pos1 = self.sweep.pos0;
        self.xf = self.sweep.get_transform1();
    }

    pub(crate) fn set_type(&mut self, body_type: BodyType) {
        self.body_type = body_type;
        if !body_type.is_speedable() {
            self.velocity = Velocity::zero();
            self.flags.remove(BodyFlags::AWAKE);
        }
        if !body_type.is_accelerable() {
            self.linear_acceleration = Vec2::zero();
            self.angular_acceleration = 0.0;
        }
        self.sweep.pos0 = self.sweep.pos1;
    }

    pub(crate) fn fixtures_mut(&mut self) -> &mut Vec<Fixture> {
        &mut self.fixtures
    }

    pub(crate) fn add_fixture(&mut self, shape: ShapeId) {
        self.fixtures.push(Fixture { shape, proxies: Vec::new() });
    }

    /// Removes the fixture of `shape`, returning it
    pub(crate) fn remove_fixture(&mut self, shape: ShapeId) -> Option<Fixture> {
        let index = self.fixtures.iter().position(|f| f.shape == shape)?;
        Some(self.fixtures.remove(index))
    }

    pub(crate) fn add_contact(&mut self, contact: ContactId) {
        self.contacts.push(contact);
    }

    pub(crate) fn remove_contact(&mut self, contact: ContactId) {
        self.contacts.retain(|c| *c != contact);
    }

    pub(crate) fn add_joint(&mut self, joint: JointId) {
        self.joints.push(joint);
    }

    pub(crate) fn remove_joint(&mut self, joint: JointId) {
        self.joints.retain(|j| *j != joint);
    }

    /// Applies a force at a world point. Forces accumulate into the
    /// body's acceleration until cleared.
    pub(crate) fn apply_force(&mut self, force: Vec2, point: Vec2) {
        if !self.is_accelerable() {
            return;
        }
        self.linear_acceleration += force * self.inv_mass;
        self.angular_acceleration += self.inv_rot_inertia * (point - self.get_world_center()).cross(&force);
    }

    pub(crate) fn apply_torque(&mut self, torque: Real) {
        if !self.is_accelerable() {
            return;
        }
        self.angular_acceleration += torque * self.inv_rot_inertia;
    }

    pub(crate) fn apply_linear_impulse(&mut self, impulse: Vec2, point: Vec2) {
        if !self.is_accelerable() {
            return;
        }
        self.velocity.linear += impulse * self.inv_mass;
        self.velocity.angular += self.inv_rot_inertia * (point - self.get_world_center()).cross(&impulse);
    }

    pub(crate) fn apply_angular_impulse(&mut self, impulse: Real) {
        if !self.is_accelerable() {
            return;
        }
        self.velocity.angular += impulse * self.inv_rot_inertia;
    }

    /// Recomputes mass, center of mass and rotational inertia from the
    /// attached shapes.
    ///
    /// Only shapes with positive density contribute. A dynamic body whose
    /// shapes add up to no mass gets a mass of one so that it still falls.
    /// Moving the center of mass keeps the velocity of the origin.
    pub(crate) fn reset_mass_data<'a>(&mut self, shapes: impl IntoIterator<Item = &'a Shape>) {
        self.mass = 0.0;
        self.inv_mass = 0.0;
        self.rot_inertia = 0.0;
        self.inv_rot_inertia = 0.0;

        if !self.is_accelerable() {
            self.sweep.local_center = Vec2::zero();
            self.sweep.pos0.linear = self.xf.p;
            self.sweep.pos1.linear = self.xf.p;
            return;
        }

        let mut mass: Real = 0.0;
        let mut local_center = Vec2::zero();
        let mut inertia: Real = 0.0;
        for shape in shapes {
            if shape.density <= 0.0 {
                continue;
            }
            let data = shape.compute_mass();
            mass += data.mass;
            local_center += data.center * data.mass;
            inertia += data.inertia;
        }

        if mass > 0.0 {
            self.mass = mass;
            self.inv_mass = 1.0 / mass;
            local_center *= self.inv_mass;
        } else {
            self.mass = 1.0;
            self.inv_mass = 1.0;
        }

        if inertia > 0.0 && !self.is_fixed_rotation() {
            // Shift the inertia to the center of mass.
            self.rot_inertia = inertia - self.mass * local_center.dot(&local_center);
            if self.rot_inertia > 0.0 {
                self.inv_rot_inertia = 1.0 / self.rot_inertia;
            } else {
                self.rot_inertia = 0.0;
            }
        }

        let old_center = self.sweep.pos1.linear;
        self.sweep.local_center = local_center;
        self.sweep.pos1.linear = self.xf.transform(local_center);
        self.sweep.pos0.linear = self.sweep.pos1.linear;

        self.velocity.linear += cross_sv(self.velocity.angular, self.sweep.pos1.linear - old_center);
    }

    /// Moves the body by `-new_origin`
    pub(crate) fn shift_origin(&mut self, new_origin: Vec2) {
        self.xf.p -= new_origin;
        self.sweep.pos0.linear -= new_origin;
        self.sweep.pos1.linear -= new_origin;
    }
}

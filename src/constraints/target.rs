use crate::bodies::Body;
use crate::constraints::{BodyConstraint, BodyPair, Constraint, JointStepConf};
use crate::core::BodyId;
use crate::math::{cross_sv, Mat22, Real, Transformation, UnitVec2, Vec2, PI};

/// Everything needed to create a target joint
#[derive(Debug, Clone, PartialEq)]
pub struct TargetJointConf {
    /// The dragged body
    pub body: BodyId,

    /// Unused by single body joints but kept for symmetry with the others
    pub collide_connected: bool,

    /// World point the body is pulled toward
    pub target: Vec2,

    /// Attachment point in the body's coordinates
    pub local_anchor_b: Vec2,

    /// Largest pulling force, typically a multiple of the body's weight
    pub max_force: Real,

    /// Response speed in hertz
    pub frequency: Real,

    /// Zero is no damping, one is critical damping
    pub damping_ratio: Real,
}

impl TargetJointConf {
    /// Attaches the body at the world point `target`
    pub fn new(body_id: BodyId, body: &Body, target: Vec2) -> Self {
        Self {
            body: body_id,
            collide_connected: false,
            target,
            local_anchor_b: body.get_transformation().inverse_transform(target),
            max_force: 0.0,
            frequency: 5.0,
            damping_ratio: 0.7,
        }
    }

    /// Sets the largest pulling force
    pub fn with_max_force(mut self, max_force: Real) -> Self {
        self.max_force = max_force;
        self
    }

    /// Sets the spring response
    pub fn with_spring(mut self, frequency: Real, damping_ratio: Real) -> Self {
        self.frequency = frequency;
        self.damping_ratio = damping_ratio;
        self
    }
}

/// Soft constraint pulling a point on a body toward a world target
#[derive(Debug, Clone, PartialEq)]
pub struct TargetJoint {
    body: BodyId,
    collide_connected: bool,

    target: Vec2,
    local_anchor_b: Vec2,
    max_force: Real,
    frequency: Real,
    damping_ratio: Real,

    impulse: Vec2,
    gamma: Real,
    bias: Vec2,
    r_b: Vec2,
    mass: Mat22,
}

impl TargetJoint {
    /// Creates a target joint
    pub fn new(conf: &TargetJointConf) -> Self {
        Self {
            body: conf.body,
            collide_connected: conf.collide_connected,
            target: conf.target,
            local_anchor_b: conf.local_anchor_b,
            max_force: conf.max_force,
            frequency: conf.frequency,
            damping_ratio: conf.damping_ratio,
            impulse: Vec2::zero(),
            gamma: 0.0,
            bias: Vec2::zero(),
            r_b: Vec2::zero(),
            mass: Mat22::zero(),
        }
    }

    /// The dragged body
    pub fn get_body(&self) -> BodyId {
        self.body
    }

    pub fn get_collide_connected(&self) -> bool {
        self.collide_connected
    }

    /// Current world target
    pub fn get_target(&self) -> Vec2 {
        self.target
    }

    /// Moves the target. Go through the world so the body gets woken.
    pub fn set_target(&mut self, target: Vec2) {
        self.target = target;
    }

    pub fn get_local_anchor_b(&self) -> Vec2 {
        self.local_anchor_b
    }

    pub fn get_max_force(&self) -> Real {
        self.max_force
    }

    pub fn set_max_force(&mut self, force: Real) {
        debug_assert!(force >= 0.0);
        self.max_force = force;
    }

    pub fn get_frequency(&self) -> Real {
        self.frequency
    }

    pub fn set_frequency(&mut self, hz: Real) {
        debug_assert!(hz >= 0.0);
        self.frequency = hz;
    }

    pub fn get_damping_ratio(&self) -> Real {
        self.damping_ratio
    }

    pub fn set_damping_ratio(&mut self, ratio: Real) {
        debug_assert!(ratio >= 0.0);
        self.damping_ratio = ratio;
    }

    /// Accumulated impulse
    pub fn get_impulse(&self) -> Vec2 {
        self.impulse
    }

    pub(crate) fn shift_origin(&mut self, new_origin: Vec2) {
        self.target -= new_origin;
    }
}

impl Constraint for TargetJoint {
    fn init_velocity(&mut self, bodies: &mut [BodyConstraint], pair: BodyPair, step: &JointStepConf) {
        let bb = bodies[pair.b];
        let q_b = UnitVec2::from_angle(bb.position.angular);

        let inv_mass = bb.inv_mass;
        let inv_i = bb.inv_rot_inertia;
        let mass = if inv_mass > 0.0 { 1.0 / inv_mass } else { 0.0 };

        let omega = 2.0 * PI * self.frequency;
        // Damping coefficient
        let d = 2.0 * mass * self.damping_ratio * omega;
        // Spring stiffness
        let k = mass * omega * omega;

        // gamma has units of inverse mass, beta of inverse time
        let h = step.delta_time;
        self.gamma = h * (d + h * k);
        if self.gamma != 0.0 {
            self.gamma = 1.0 / self.gamma;
        }
        let beta = h * k * self.gamma;

        self.r_b = q_b.rotate(self.local_anchor_b - bb.local_center);
        let r_b = self.r_b;

        let k11 = inv_mass + inv_i * r_b.y * r_b.y + self.gamma;
        let k12 = -inv_i * r_b.x * r_b.y;
        let k22 = inv_mass + inv_i * r_b.x * r_b.x + self.gamma;
        self.mass = Mat22::new(Vec2::new(k11, k12), Vec2::new(k12, k22)).get_inverse();

        self.bias = (bb.position.linear + r_b - self.target) * beta;

        let b = &mut bodies[pair.b];
        b.velocity.angular *= 0.98;

        if step.do_warm_start {
            self.impulse *= step.dt_ratio;
            b.velocity.linear += self.impulse * inv_mass;
            b.velocity.angular += inv_i * r_b.cross(&self.impulse);
        } else {
            self.impulse = Vec2::zero();
        }
    }

    fn solve_velocity(&mut self, bodies: &mut [BodyConstraint], pair: BodyPair, step: &JointStepConf) -> bool {
        let (inv_mass, inv_i) = (bodies[pair.b].inv_mass, bodies[pair.b].inv_rot_inertia);
        let mut vb = bodies[pair.b].velocity;

        let cdot = vb.linear + cross_sv(vb.angular, self.r_b);
        let impulse = self.mass * -(cdot + self.bias + self.impulse * self.gamma);

        let old_impulse = self.impulse;
        self.impulse += impulse;
        let max_impulse = step.delta_time * self.max_force;
        if self.impulse.length_squared() > max_impulse * max_impulse {
            self.impulse = self.impulse.normalize() * max_impulse;
        }
        let impulse = self.impulse - old_impulse;

        vb.linear += impulse * inv_mass;
        vb.angular += inv_i * self.r_b.cross(&impulse);
        bodies[pair.b].velocity = vb;

        impulse == Vec2::zero()
    }

    fn solve_position(&self, _bodies: &mut [BodyConstraint], _pair: BodyPair, _step: &JointStepConf) -> bool {
        true
    }

    fn get_anchor_a(&self, _xf_a: &Transformation) -> Vec2 {
        self.target
    }

    fn get_anchor_b(&self, xf_b: &Transformation) -> Vec2 {
        xf_b.transform(self.local_anchor_b)
    }

    fn get_reaction_force(&self, inv_dt: Real) -> Vec2 {
        self.impulse * inv_dt
    }

    fn get_reaction_torque(&self, _inv_dt: Real) -> Real {
        0.0
    }
}

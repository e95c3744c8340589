use crate::bodies::Body;
use crate::constraints::{BodyConstraint, BodyPair, Constraint, JointStepConf};
use crate::core::BodyId;
use crate::math::{clamp, cross_sv, Mat22, Real, Transformation, UnitVec2, Vec2};

/// Everything needed to create a friction joint
#[derive(Debug, Clone, PartialEq)]
pub struct FrictionJointConf {
    /// First body
    pub body_a: BodyId,

    /// Second body
    pub body_b: BodyId,

    /// Whether the bodies' shapes collide with each other
    pub collide_connected: bool,

    /// Anchor in body A's coordinates
    pub local_anchor_a: Vec2,

    /// Anchor in body B's coordinates
    pub local_anchor_b: Vec2,

    /// Largest friction force
    pub max_force: Real,

    /// Largest friction torque
    pub max_torque: Real,
}

impl FrictionJointConf {
    /// Configuration with both anchors at the bodies' origins
    pub fn new(body_a: BodyId, body_b: BodyId) -> Self {
        Self {
            body_a,
            body_b,
            collide_connected: false,
            local_anchor_a: Vec2::zero(),
            local_anchor_b: Vec2::zero(),
            max_force: 0.0,
            max_torque: 0.0,
        }
    }

    /// Configuration anchored at a world point
    pub fn from_world(body_a: BodyId, a: &Body, body_b: BodyId, b: &Body, anchor: Vec2) -> Self {
        Self {
            local_anchor_a: a.get_transformation().inverse_transform(anchor),
            local_anchor_b: b.get_transformation().inverse_transform(anchor),
            ..Self::new(body_a, body_b)
        }
    }

    /// Sets the force and torque limits
    pub fn with_max(mut self, max_force: Real, max_torque: Real) -> Self {
        self.max_force = max_force;
        self.max_torque = max_torque;
        self
    }
}

/// Top-down friction: resists relative translation and rotation of two
/// bodies up to a maximum force and torque
#[derive(Debug, Clone, PartialEq)]
pub struct FrictionJoint {
    body_a: BodyId,
    body_b: BodyId,
    collide_connected: bool,

    local_anchor_a: Vec2,
    local_anchor_b: Vec2,

    linear_impulse: Vec2,
    angular_impulse: Real,
    max_force: Real,
    max_torque: Real,

    r_a: Vec2,
    r_b: Vec2,
    linear_mass: Mat22,
    angular_mass: Real,
}

impl FrictionJoint {
    /// Creates a friction joint
    pub fn new(conf: &FrictionJointConf) -> Self {
        Self {
            body_a: conf.body_a,
            body_b: conf.body_b,
            collide_connected: conf.collide_connected,
            local_anchor_a: conf.local_anchor_a,
            local_anchor_b: conf.local_anchor_b,
            linear_impulse: Vec2::zero(),
            angular_impulse: 0.0,
            max_force: conf.max_force,
            max_torque: conf.max_torque,
            r_a: Vec2::zero(),
            r_b: Vec2::zero(),
            linear_mass: Mat22::zero(),
            angular_mass: 0.0,
        }
    }

    /// First body
    pub fn get_body_a(&self) -> BodyId {
        self.body_a
    }

    /// Second body
    pub fn get_body_b(&self) -> BodyId {
        self.body_b
    }

    /// Whether the bodies' shapes collide with each other
    pub fn get_collide_connected(&self) -> bool {
        self.collide_connected
    }

    /// Largest friction force
    pub fn get_max_force(&self) -> Real {
        self.max_force
    }

    /// Sets the largest friction force
    pub fn set_max_force(&mut self, force: Real) {
        debug_assert!(force >= 0.0);
        self.max_force = force;
    }

    /// Largest friction torque
    pub fn get_max_torque(&self) -> Real {
        self.max_torque
    }

    /// Sets the largest friction torque
    pub fn set_max_torque(&mut self, torque: Real) {
        debug_assert!(torque >= 0.0);
        self.max_torque = torque;
    }

    /// Accumulated linear impulse
    pub fn get_linear_impulse(&self) -> Vec2 {
        self.linear_impulse
    }

    /// Accumulated angular impulse
    pub fn get_angular_impulse(&self) -> Real {
        self.angular_impulse
    }
}

impl Constraint for FrictionJoint {
    fn init_velocity(&mut self, bodies: &mut [BodyConstraint], pair: BodyPair, step: &JointStepConf) {
        let ba = bodies[pair.a];
        let bb = bodies[pair.b];

        let q_a = UnitVec2::from_angle(ba.position.angular);
        let q_b = UnitVec2::from_angle(bb.position.angular);

        // Compute the effective mass matrix.
        self.r_a = q_a.rotate(self.local_anchor_a - ba.local_center);
        self.r_b = q_b.rotate(self.local_anchor_b - bb.local_center);

        let (m_a, m_b) = (ba.inv_mass, bb.inv_mass);
        let (i_a, i_b) = (ba.inv_rot_inertia, bb.inv_rot_inertia);
        let (r_a, r_b) = (self.r_a, self.r_b);

        let k11 = m_a + m_b + i_a * r_a.y * r_a.y + i_b * r_b.y * r_b.y;
        let k12 = -i_a * r_a.x * r_a.y - i_b * r_b.x * r_b.y;
        let k22 = m_a + m_b + i_a * r_a.x * r_a.x + i_b * r_b.x * r_b.x;
        self.linear_mass = Mat22::new(Vec2::new(k11, k12), Vec2::new(k12, k22)).get_inverse();

        self.angular_mass = i_a + i_b;
        if self.angular_mass > 0.0 {
            self.angular_mass = 1.0 / self.angular_mass;
        }

        if step.do_warm_start {
            // Scale impulses to support a variable time step.
            self.linear_impulse *= step.dt_ratio;
            self.angular_impulse *= step.dt_ratio;

            let p = self.linear_impulse;
            let a = &mut bodies[pair.a];
            a.velocity.linear -= p * m_a;
            a.velocity.angular -= i_a * (r_a.cross(&p) + self.angular_impulse);
            let b = &mut bodies[pair.b];
            b.velocity.linear += p * m_b;
            b.velocity.angular += i_b * (r_b.cross(&p) + self.angular_impulse);
        } else {
            self.linear_impulse = Vec2::zero();
            self.angular_impulse = 0.0;
        }
    }

    fn solve_velocity(&mut self, bodies: &mut [BodyConstraint], pair: BodyPair, step: &JointStepConf) -> bool {
        let (m_a, i_a) = (bodies[pair.a].inv_mass, bodies[pair.a].inv_rot_inertia);
        let (m_b, i_b) = (bodies[pair.b].inv_mass, bodies[pair.b].inv_rot_inertia);
        let mut va = bodies[pair.a].velocity;
        let mut vb = bodies[pair.b].velocity;

        let h = step.delta_time;
        let old_linear = self.linear_impulse;
        let old_angular = self.angular_impulse;

        // Solve angular friction
        {
            let cdot = vb.angular - va.angular;
            let impulse = -self.angular_mass * cdot;

            let previous = self.angular_impulse;
            let max_impulse = h * self.max_torque;
            self.angular_impulse = clamp(self.angular_impulse + impulse, -max_impulse, max_impulse);
            let impulse = self.angular_impulse - previous;

            va.angular -= i_a * impulse;
            vb.angular += i_b * impulse;
        }

        // Solve linear friction
        {
            let cdot = vb.linear + cross_sv(vb.angular, self.r_b) - va.linear - cross_sv(va.angular, self.r_a);

            let impulse = -(self.linear_mass * cdot);
            let previous = self.linear_impulse;
            self.linear_impulse += impulse;

            let max_impulse = h * self.max_force;
            if self.linear_impulse.length_squared() > max_impulse * max_impulse {
                self.linear_impulse = self.linear_impulse.normalize() * max_impulse;
            }

            let impulse = self.linear_impulse - previous;

            va.linear -= impulse * m_a;
            va.angular -= i_a * self.r_a.cross(&impulse);
            vb.linear += impulse * m_b;
            vb.angular += i_b * self.r_b.cross(&impulse);
        }

        bodies[pair.a].velocity = va;
        bodies[pair.b].velocity = vb;

        old_linear == self.linear_impulse && old_angular == self.angular_impulse
    }

    fn solve_position(&self, _bodies: &mut [BodyConstraint], _pair: BodyPair, _step: &JointStepConf) -> bool {
        true
    }

    fn get_anchor_a(&self, xf_a: &Transformation) -> Vec2 {
        xf_a.transform(self.local_anchor_a)
    }

    fn get_anchor_b(&self, xf_b: &Transformation) -> Vec2 {
        xf_b.transform(self.local_anchor_b)
    }

    fn get_reaction_force(&self, inv_dt: Real) -> Vec2 {
        self.linear_impulse * inv_dt
    }

    fn get_reaction_torque(&self, inv_dt: Real) -> Real {
        inv_dt * self.angular_impulse
    }
}

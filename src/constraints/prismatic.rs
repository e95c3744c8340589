use crate::bodies::Body;
use crate::constraints::{BodyConstraint, BodyPair, Constraint, JointStepConf};
use crate::core::BodyId;
use crate::math::{clamp, cross_sv, Mat22, Mat33, Real, UnitVec2, Vec2, Vec3, Transformation};

/// State of a joint limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LimitState {
    /// The limit isn't reached
    #[default]
    Inactive,

    /// At the lower bound
    AtLower,

    /// At the upper bound
    AtUpper,

    /// Lower and upper bounds are within slop of each other
    Equal,
}

/// Everything needed to create a prismatic joint
#[derive(Debug, Clone, PartialEq)]
pub struct PrismaticJointConf {
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

    /// Translation axis in body A's coordinates
    pub local_axis_a: UnitVec2,

    /// Body B's angle minus body A's angle in the reference state
    pub reference_angle: Real,

    /// Whether the translation limit applies
    pub enable_limit: bool,

    /// Lower translation limit
    pub lower_translation: Real,

    /// Upper translation limit
    pub upper_translation: Real,

    /// Whether the motor drives the joint
    pub enable_motor: bool,

    /// Largest force the motor may apply
    pub max_motor_force: Real,

    /// Desired translation speed
    pub motor_speed: Real,
}

impl PrismaticJointConf {
    /// Configuration with explicit local frames
    pub fn new(body_a: BodyId, body_b: BodyId) -> Self {
        Self {
            body_a,
            body_b,
            collide_connected: false,
            local_anchor_a: Vec2::zero(),
            local_anchor_b: Vec2::zero(),
            local_axis_a: UnitVec2::RIGHT,
            reference_angle: 0.0,
            enable_limit: false,
            lower_translation: 0.0,
            upper_translation: 0.0,
            enable_motor: false,
            max_motor_force: 0.0,
            motor_speed: 0.0,
        }
    }

    /// Configuration from a world anchor and world axis, using the bodies'
    /// current placement as the reference state
    pub fn from_world(
        body_a: BodyId,
        a: &Body,
        body_b: BodyId,
        b: &Body,
        anchor: Vec2,
        axis: UnitVec2,
    ) -> Self {
        let xf_a = a.get_transformation();
        let xf_b = b.get_transformation();
        Self {
            local_anchor_a: xf_a.inverse_transform(anchor),
            local_anchor_b: xf_b.inverse_transform(anchor),
            local_axis_a: xf_a.q.inverse_rotate_unit(axis),
            reference_angle: b.get_angle() - a.get_angle(),
            ..Self::new(body_a, body_b)
        }
    }

    /// Enables the limit with the given bounds
    pub fn with_limits(mut self, lower: Real, upper: Real) -> Self {
        self.enable_limit = true;
        self.lower_translation = lower;
        self.upper_translation = upper;
        self
    }

    /// Enables the motor
    pub fn with_motor(mut self, speed: Real, max_force: Real) -> Self {
        self.enable_motor = true;
        self.motor_speed = speed;
        self.max_motor_force = max_force;
        self
    }

    /// Sets whether the bodies' shapes collide
    pub fn with_collide_connected(mut self, collide: bool) -> Self {
        self.collide_connected = collide;
        self
    }
}

/// A prismatic joint: body B slides along an axis fixed in body A, with no
/// relative rotation. An optional limit bounds the translation and an
/// optional motor drives it.
#[derive(Debug, Clone, PartialEq)]
pub struct PrismaticJoint {
    body_a: BodyId,
    body_b: BodyId,
    collide_connected: bool,

    local_anchor_a: Vec2,
    local_anchor_b: Vec2,
    local_x_axis_a: UnitVec2,
    local_y_axis_a: UnitVec2,
    reference_angle: Real,

    /// Accumulated perpendicular, angular and limit impulses
    impulse: Vec3,
    motor_impulse: Real,

    lower_translation: Real,
    upper_translation: Real,
    max_motor_force: Real,
    motor_speed: Real,
    enable_limit: bool,
    enable_motor: bool,
    limit_state: LimitState,

    // Solver temporaries
    axis: Vec2,
    perp: Vec2,
    s1: Real,
    s2: Real,
    a1: Real,
    a2: Real,
    k: Mat33,
    motor_mass: Real,
}

impl PrismaticJoint {
    /// Creates a prismatic joint
    pub fn new(conf: &PrismaticJointConf) -> Self {
        Self {
            body_a: conf.body_a,
            body_b: conf.body_b,
            collide_connected: conf.collide_connected,
            local_anchor_a: conf.local_anchor_a,
            local_anchor_b: conf.local_anchor_b,
            local_x_axis_a: conf.local_axis_a,
            local_y_axis_a: conf.local_axis_a.rev_perpendicular(),
            reference_angle: conf.reference_angle,
            impulse: Vec3::zero(),
            motor_impulse: 0.0,
            lower_translation: conf.lower_translation,
            upper_translation: conf.upper_translation,
            max_motor_force: conf.max_motor_force,
            motor_speed: conf.motor_speed,
            enable_limit: conf.enable_limit,
            enable_motor: conf.enable_motor,
            limit_state: LimitState::Inactive,
            axis: Vec2::zero(),
            perp: Vec2::zero(),
            s1: 0.0,
            s2: 0.0,
            a1: 0.0,
            a2: 0.0,
            k: Mat33::default(),
            motor_mass: 0.0,
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

    /// Anchor in body A's coordinates
    pub fn get_local_anchor_a(&self) -> Vec2 {
        self.local_anchor_a
    }

    /// Anchor in body B's coordinates
    pub fn get_local_anchor_b(&self) -> Vec2 {
        self.local_anchor_b
    }

    /// Translation axis in body A's coordinates
    pub fn get_local_axis_a(&self) -> UnitVec2 {
        self.local_x_axis_a
    }

    /// Reference angle
    pub fn get_reference_angle(&self) -> Real {
        self.reference_angle
    }

    /// Accumulated perpendicular, angular and limit impulses
    pub fn get_linear_impulse(&self) -> Vec3 {
        self.impulse
    }

    /// Accumulated motor impulse
    pub fn get_motor_impulse(&self) -> Real {
        self.motor_impulse
    }

    /// Current limit state
    pub fn get_limit_state(&self) -> LimitState {
        self.limit_state
    }

    /// Whether the limit is enabled
    pub fn is_limit_enabled(&self) -> bool {
        self.enable_limit
    }

    /// Lower translation limit
    pub fn get_lower_limit(&self) -> Real {
        self.lower_translation
    }

    /// Upper translation limit
    pub fn get_upper_limit(&self) -> Real {
        self.upper_translation
    }

    /// Whether the motor is enabled
    pub fn is_motor_enabled(&self) -> bool {
        self.enable_motor
    }

    /// Motor speed
    pub fn get_motor_speed(&self) -> Real {
        self.motor_speed
    }

    /// Largest motor force
    pub fn get_max_motor_force(&self) -> Real {
        self.max_motor_force
    }

    /// Motor force of the last step
    pub fn get_motor_force(&self, inv_dt: Real) -> Real {
        inv_dt * self.motor_impulse
    }

    /// Enables or disables the limit. Changing it resets the limit impulse.
    pub fn enable_limit(&mut self, flag: bool) {
        if self.enable_limit != flag {
            self.enable_limit = flag;
            self.impulse.z = 0.0;
        }
    }

    /// Sets the translation limits. Changing them resets the limit impulse.
    pub fn set_limits(&mut self, lower: Real, upper: Real) {
        debug_assert!(lower <= upper);
        if lower != self.lower_translation || upper != self.upper_translation {
            self.lower_translation = lower;
            self.upper_translation = upper;
            self.impulse.z = 0.0;
        }
    }

    /// Enables or disables the motor
    pub fn enable_motor(&mut self, flag: bool) {
        self.enable_motor = flag;
    }

    /// Sets the motor speed
    pub fn set_motor_speed(&mut self, speed: Real) {
        self.motor_speed = speed;
    }

    /// Sets the largest motor force
    pub fn set_max_motor_force(&mut self, force: Real) {
        self.max_motor_force = force;
    }

    /// Translation of body B's anchor from body A's along the axis
    pub fn get_joint_translation(&self, a: &Body, b: &Body) -> Real {
        let p_a = a.get_transformation().transform(self.local_anchor_a);
        let p_b = b.get_transformation().transform(self.local_anchor_b);
        let axis = a.get_rotation().rotate(self.local_x_axis_a.to_vec());
        (p_b - p_a).dot(&axis)
    }

    /// Rate of change of the joint translation
    pub fn get_joint_speed(&self, a: &Body, b: &Body) -> Real {
        let r_a = a.get_rotation().rotate(self.local_anchor_a - a.get_local_center());
        let r_b = b.get_rotation().rotate(self.local_anchor_b - b.get_local_center());
        let p1 = a.get_world_center() + r_a;
        let p2 = b.get_world_center() + r_b;
        let d = p2 - p1;
        let axis = a.get_rotation().rotate(self.local_x_axis_a.to_vec());

        let (v_a, w_a) = (a.get_linear_velocity(), a.get_angular_velocity());
        let (v_b, w_b) = (b.get_linear_velocity(), b.get_angular_velocity());

        d.dot(&cross_sv(w_a, axis)) + axis.dot(&(v_b + cross_sv(w_b, r_b) - v_a - cross_sv(w_a, r_a)))
    }

    fn apply(bodies: &mut [BodyConstraint], pair: BodyPair, p: Vec2, l_a: Real, l_b: Real) {
        let a = &mut bodies[pair.a];
        a.velocity.linear -= p * a.inv_mass;
        a.velocity.angular -= a.inv_rot_inertia * l_a;

        let b = &mut bodies[pair.b];
        b.velocity.linear += p * b.inv_mass;
        b.velocity.angular += b.inv_rot_inertia * l_b;
    }
}

impl Constraint for PrismaticJoint {
    fn init_velocity(&mut self, bodies: &mut [BodyConstraint], pair: BodyPair, step: &JointStepConf) {
        let ba = bodies[pair.a];
        let bb = bodies[pair.b];

        let q_a = UnitVec2::from_angle(ba.position.angular);
        let q_b = UnitVec2::from_angle(bb.position.angular);

        // Compute the effective masses.
        let r_a = q_a.rotate(self.local_anchor_a - ba.local_center);
        let r_b = q_b.rotate(self.local_anchor_b - bb.local_center);
        let d = (bb.position.linear - ba.position.linear) + r_b - r_a;

        let (m_a, m_b) = (ba.inv_mass, bb.inv_mass);
        let (i_a, i_b) = (ba.inv_rot_inertia, bb.inv_rot_inertia);

        // Compute motor Jacobian and effective mass.
        self.axis = q_a.rotate(self.local_x_axis_a.to_vec());
        self.a1 = (d + r_a).cross(&self.axis);
        self.a2 = r_b.cross(&self.axis);
        self.motor_mass = m_a + m_b + i_a * self.a1 * self.a1 + i_b * self.a2 * self.a2;
        if self.motor_mass > 0.0 {
            self.motor_mass = 1.0 / self.motor_mass;
        }

        // Prismatic constraint.
        self.perp = q_a.rotate(self.local_y_axis_a.to_vec());
        self.s1 = (d + r_a).cross(&self.perp);
        self.s2 = r_b.cross(&self.perp);

        let k11 = m_a + m_b + i_a * self.s1 * self.s1 + i_b * self.s2 * self.s2;
        let k12 = i_a * self.s1 + i_b * self.s2;
        let k13 = i_a * self.s1 * self.a1 + i_b * self.s2 * self.a2;
        let mut k22 = i_a + i_b;
        if k22 == 0.0 {
            // For bodies with fixed rotation.
            k22 = 1.0;
        }
        let k23 = i_a * self.a1 + i_b * self.a2;
        let k33 = m_a + m_b + i_a * self.a1 * self.a1 + i_b * self.a2 * self.a2;
        self.k = Mat33::new(Vec3::new(k11, k12, k13), Vec3::new(k12, k22, k23), Vec3::new(k13, k23, k33));

        // Compute motor and limit terms.
        if self.enable_limit {
            let translation = self.axis.dot(&d);
            if (self.upper_translation - self.lower_translation).abs() < 2.0 * step.linear_slop {
                self.limit_state = LimitState::Equal;
            } else if translation <= self.lower_translation {
                if self.limit_state != LimitState::AtLower {
                    self.limit_state = LimitState::AtLower;
                    self.impulse.z = 0.0;
                }
            } else if translation >= self.upper_translation {
                if self.limit_state != LimitState::AtUpper {
                    self.limit_state = LimitState::AtUpper;
                    self.impulse.z = 0.0;
                }
            } else {
                self.limit_state = LimitState::Inactive;
                self.impulse.z = 0.0;
            }
        } else {
            self.limit_state = LimitState::Inactive;
            self.impulse.z = 0.0;
        }

        if !self.enable_motor {
            self.motor_impulse = 0.0;
        }

        if step.do_warm_start {
            // Account for variable time step.
            self.impulse *= step.dt_ratio;
            self.motor_impulse *= step.dt_ratio;

            let axial = self.motor_impulse + self.impulse.z;
            let p = self.perp * self.impulse.x + self.axis * axial;
            let l_a = self.impulse.x * self.s1 + self.impulse.y + axial * self.a1;
            let l_b = self.impulse.x * self.s2 + self.impulse.y + axial * self.a2;
            Self::apply(bodies, pair, p, l_a, l_b);
        } else {
            self.impulse = Vec3::zero();
            self.motor_impulse = 0.0;
        }
    }

    fn solve_velocity(&mut self, bodies: &mut [BodyConstraint], pair: BodyPair, step: &JointStepConf) -> bool {
        let old_impulse = self.impulse;
        let old_motor_impulse = self.motor_impulse;

        // Solve linear motor constraint.
        if self.enable_motor && self.limit_state != LimitState::Equal {
            let (va, vb) = (bodies[pair.a].velocity, bodies[pair.b].velocity);
            let cdot = self.axis.dot(&(vb.linear - va.linear)) + self.a2 * vb.angular - self.a1 * va.angular;
            let impulse = self.motor_mass * (self.motor_speed - cdot);
            let previous = self.motor_impulse;
            let max_impulse = step.delta_time * self.max_motor_force;
            self.motor_impulse = clamp(self.motor_impulse + impulse, -max_impulse, max_impulse);
            let impulse = self.motor_impulse - previous;

            Self::apply(bodies, pair, self.axis * impulse, impulse * self.a1, impulse * self.a2);
        }

        let (va, vb) = (bodies[pair.a].velocity, bodies[pair.b].velocity);
        let cdot1 = Vec2::new(
            self.perp.dot(&(vb.linear - va.linear)) + self.s2 * vb.angular - self.s1 * va.angular,
            vb.angular - va.angular,
        );

        if self.enable_limit && self.limit_state != LimitState::Inactive {
            // Solve prismatic and limit constraint in block form.
            let cdot2 = self.axis.dot(&(vb.linear - va.linear)) + self.a2 * vb.angular - self.a1 * va.angular;
            let cdot = Vec3::new(cdot1.x, cdot1.y, cdot2);

            let f1 = self.impulse;
            self.impulse += self.k.solve33(-cdot);

            match self.limit_state {
                LimitState::AtLower => self.impulse.z = self.impulse.z.max(0.0),
                LimitState::AtUpper => self.impulse.z = self.impulse.z.min(0.0),
                _ => {}
            }

            // f2(1:2) = invK(1:2,1:2) * (-Cdot(1:2) - K(1:2,3) * (f2(3) - f1(3))) + f1(1:2)
            let b = -cdot1 - Vec2::new(self.k.ez.x, self.k.ez.y) * (self.impulse.z - f1.z);
            let f2r = self.k.solve22(b) + Vec2::new(f1.x, f1.y);
            self.impulse.x = f2r.x;
            self.impulse.y = f2r.y;

            let df = self.impulse - f1;
            let p = self.perp * df.x + self.axis * df.z;
            let l_a = df.x * self.s1 + df.y + df.z * self.a1;
            let l_b = df.x * self.s2 + df.y + df.z * self.a2;
            Self::apply(bodies, pair, p, l_a, l_b);
        } else {
            // Limit is inactive, just solve the prismatic constraint in block form.
            let df = self.k.solve22(-cdot1);
            self.impulse.x += df.x;
            self.impulse.y += df.y;

            let p = self.perp * df.x;
            let l_a = df.x * self.s1 + df.y;
            let l_b = df.x * self.s2 + df.y;
            Self::apply(bodies, pair, p, l_a, l_b);
        }

        old_impulse == self.impulse && old_motor_impulse == self.motor_impulse
    }

    fn solve_position(&self, bodies: &mut [BodyConstraint], pair: BodyPair, step: &JointStepConf) -> bool {
        let ba = bodies[pair.a];
        let bb = bodies[pair.b];

        let (mut c_a, mut a_a) = (ba.position.linear, ba.position.angular);
        let (mut c_b, mut a_b) = (bb.position.linear, bb.position.angular);

        let q_a = UnitVec2::from_angle(a_a);
        let q_b = UnitVec2::from_angle(a_b);

        let (m_a, m_b) = (ba.inv_mass, bb.inv_mass);
        let (i_a, i_b) = (ba.inv_rot_inertia, bb.inv_rot_inertia);

        // Compute fresh Jacobians
        let r_a = q_a.rotate(self.local_anchor_a - ba.local_center);
        let r_b = q_b.rotate(self.local_anchor_b - bb.local_center);
        let d = c_b + r_b - c_a - r_a;

        let axis = q_a.rotate(self.local_x_axis_a.to_vec());
        let a1 = (d + r_a).cross(&axis);
        let a2 = r_b.cross(&axis);
        let perp = q_a.rotate(self.local_y_axis_a.to_vec());

        let s1 = (d + r_a).cross(&perp);
        let s2 = r_b.cross(&perp);

        let c1 = Vec2::new(perp.dot(&d), a_b - a_a - self.reference_angle);

        let mut linear_error = c1.x.abs();
        let angular_error = c1.y.abs();

        let max_correction = step.max_linear_correction;
        let mut active = false;
        let mut c2: Real = 0.0;
        if self.enable_limit {
            let translation = axis.dot(&d);
            if (self.upper_translation - self.lower_translation).abs() < 2.0 * step.linear_slop {
                // Prevent large angular corrections
                c2 = clamp(translation, -max_correction, max_correction);
                linear_error = linear_error.max(translation.abs());
                active = true;
            } else if translation <= self.lower_translation {
                // Prevent large linear corrections and allow some slop.
                c2 = clamp(translation - self.lower_translation + step.linear_slop, -max_correction, 0.0);
                linear_error = linear_error.max(self.lower_translation - translation);
                active = true;
            } else if translation >= self.upper_translation {
                c2 = clamp(translation - self.upper_translation - step.linear_slop, 0.0, max_correction);
                linear_error = linear_error.max(translation - self.upper_translation);
                active = true;
            }
        }

        let k11 = m_a + m_b + i_a * s1 * s1 + i_b * s2 * s2;
        let k12 = i_a * s1 + i_b * s2;
        let mut k22 = i_a + i_b;
        if k22 == 0.0 {
            // For fixed rotation
            k22 = 1.0;
        }

        let impulse = if active {
            let k13 = i_a * s1 * a1 + i_b * s2 * a2;
            let k23 = i_a * a1 + i_b * a2;
            let k33 = m_a + m_b + i_a * a1 * a1 + i_b * a2 * a2;
            let k = Mat33::new(Vec3::new(k11, k12, k13), Vec3::new(k12, k22, k23), Vec3::new(k13, k23, k33));
            k.solve33(-Vec3::new(c1.x, c1.y, c2))
        } else {
            let k = Mat22::new(Vec2::new(k11, k12), Vec2::new(k12, k22));
            let impulse1 = k.solve(-c1);
            Vec3::new(impulse1.x, impulse1.y, 0.0)
        };

        let p = perp * impulse.x + axis * impulse.z;
        let l_a = impulse.x * s1 + impulse.y + impulse.z * a1;
        let l_b = impulse.x * s2 + impulse.y + impulse.z * a2;

        c_a -= p * m_a;
        a_a -= i_a * l_a;
        c_b += p * m_b;
        a_b += i_b * l_b;

        bodies[pair.a].position.linear = c_a;
        bodies[pair.a].position.angular = a_a;
        bodies[pair.b].position.linear = c_b;
        bodies[pair.b].position.angular = a_b;

        linear_error <= step.linear_slop && angular_error <= step.angular_slop
    }

    fn get_anchor_a(&self, xf_a: &Transformation) -> Vec2 {
        xf_a.transform(self.local_anchor_a)
    }

    fn get_anchor_b(&self, xf_b: &Transformation) -> Vec2 {
        xf_b.transform(self.local_anchor_b)
    }

    fn get_reaction_force(&self, inv_dt: Real) -> Vec2 {
        (self.perp * self.impulse.x + self.axis * (self.motor_impulse + self.impulse.z)) * inv_dt
    }

    fn get_reaction_torque(&self, inv_dt: Real) -> Real {
        inv_dt * self.impulse.y
    }
}

use crate::constraints::{
    BodyConstraint, FrictionJoint, FrictionJointConf, PrismaticJoint, PrismaticJointConf, TargetJoint,
    TargetJointConf,
};
use crate::core::BodyId;
use crate::math::{Real, Transformation, Vec2};

/// Step data the joint solvers need
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointStepConf {
    /// Time step
    pub delta_time: Real,

    /// Inverse of the time step
    pub inv_delta_time: Real,

    /// Ratio of this step's time step to the previous one's
    pub dt_ratio: Real,

    /// Whether last step's impulses seed this step
    pub do_warm_start: bool,

    /// Linear position tolerance
    pub linear_slop: Real,

    /// Angular position tolerance
    pub angular_slop: Real,

    /// Largest linear correction per position iteration
    pub max_linear_correction: Real,

    /// Largest angular correction per position iteration
    pub max_angular_correction: Real,
}

/// Indices of a joint's two bodies in the island's body constraint array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyPair {
    /// Index of body A
    pub a: usize,

    /// Index of body B
    pub b: usize,
}

/// The solver seam every joint type implements.
///
/// The island solver calls `init_velocity` once per step, then
/// `solve_velocity` per velocity iteration and `solve_position` per
/// position iteration, all against the island's working body state.
pub trait Constraint {
    /// Computes Jacobians and effective masses and applies the warm
    /// start impulses
    fn init_velocity(&mut self, bodies: &mut [BodyConstraint], pair: BodyPair, step: &JointStepConf);

    /// One velocity iteration. Returns true if no impulse changed.
    fn solve_velocity(&mut self, bodies: &mut [BodyConstraint], pair: BodyPair, step: &JointStepConf) -> bool;

    /// One position iteration. Returns true if the position error is
    /// within tolerance.
    fn solve_position(&self, bodies: &mut [BodyConstraint], pair: BodyPair, step: &JointStepConf) -> bool;

    /// World anchor on body A, given A's transformation
    fn get_anchor_a(&self, xf_a: &Transformation) -> Vec2;

    /// World anchor on body B, given B's transformation
    fn get_anchor_b(&self, xf_b: &Transformation) -> Vec2;

    /// Reaction force on body B at the anchor
    fn get_reaction_force(&self, inv_dt: Real) -> Vec2;

    /// Reaction torque on body B
    fn get_reaction_torque(&self, inv_dt: Real) -> Real;
}

/// Everything needed to create a joint
#[derive(Debug, Clone, PartialEq)]
pub enum JointConf {
    /// A prismatic joint
    Prismatic(PrismaticJointConf),

    /// A friction joint
    Friction(FrictionJointConf),

    /// A target joint
    Target(TargetJointConf),
}

impl JointConf {
    /// Body A, absent for single body joints
    pub fn get_body_a(&self) -> Option<BodyId> {
        match self {
            JointConf::Prismatic(conf) => Some(conf.body_a),
            JointConf::Friction(conf) => Some(conf.body_a),
            JointConf::Target(_) => None,
        }
    }

    /// Body B
    pub fn get_body_b(&self) -> Option<BodyId> {
        match self {
            JointConf::Prismatic(conf) => Some(conf.body_b),
            JointConf::Friction(conf) => Some(conf.body_b),
            JointConf::Target(conf) => Some(conf.body),
        }
    }
}

impl From<PrismaticJointConf> for JointConf {
    fn from(conf: PrismaticJointConf) -> Self {
        JointConf::Prismatic(conf)
    }
}

impl From<FrictionJointConf> for JointConf {
    fn from(conf: FrictionJointConf) -> Self {
        JointConf::Friction(conf)
    }
}

impl From<TargetJointConf> for JointConf {
    fn from(conf: TargetJointConf) -> Self {
        JointConf::Target(conf)
    }
}

/// A joint between bodies
#[derive(Debug, Clone, PartialEq)]
pub enum Joint {
    /// Translation along one axis, no relative rotation
    Prismatic(PrismaticJoint),

    /// Top-down friction between two bodies
    Friction(FrictionJoint),

    /// Drags a body toward a world point
    Target(TargetJoint),
}

macro_rules! for_each_joint {
    ($self:expr, $joint:ident => $body:expr) => {
        match $self {
            Joint::Prismatic($joint) => $body,
            Joint::Friction($joint) => $body,
            Joint::Target($joint) => $body,
        }
    };
}

impl Joint {
    /// Creates a joint from its configuration
    pub fn new(conf: &JointConf) -> Self {
        match conf {
            JointConf::Prismatic(conf) => Joint::Prismatic(PrismaticJoint::new(conf)),
            JointConf::Friction(conf) => Joint::Friction(FrictionJoint::new(conf)),
            JointConf::Target(conf) => Joint::Target(TargetJoint::new(conf)),
        }
    }

    /// Body A, absent for single body joints
    pub fn get_body_a(&self) -> Option<BodyId> {
        match self {
            Joint::Prismatic(joint) => Some(joint.get_body_a()),
            Joint::Friction(joint) => Some(joint.get_body_a()),
            Joint::Target(_) => None,
        }
    }

    /// Body B
    pub fn get_body_b(&self) -> Option<BodyId> {
        match self {
            Joint::Prismatic(joint) => Some(joint.get_body_b()),
            Joint::Friction(joint) => Some(joint.get_body_b()),
            Joint::Target(joint) => Some(joint.get_body()),
        }
    }

    /// The body on the other side of `body`, if any
    pub fn get_other_body(&self, body: BodyId) -> Option<BodyId> {
        match (self.get_body_a(), self.get_body_b()) {
            (Some(a), b) if a == body => b,
            (a, Some(b)) if b == body => a,
            _ => None,
        }
    }

    /// Whether the bodies' shapes may collide with each other
    pub fn get_collide_connected(&self) -> bool {
        for_each_joint!(self, joint => joint.get_collide_connected())
    }

    /// The prismatic joint, if this is one
    pub fn as_prismatic(&self) -> Option<&PrismaticJoint> {
        match self {
            Joint::Prismatic(joint) => Some(joint),
            _ => None,
        }
    }

    /// The prismatic joint, mutably, if this is one
    pub fn as_prismatic_mut(&mut self) -> Option<&mut PrismaticJoint> {
        match self {
            Joint::Prismatic(joint) => Some(joint),
            _ => None,
        }
    }

    /// The friction joint, if this is one
    pub fn as_friction(&self) -> Option<&FrictionJoint> {
        match self {
            Joint::Friction(joint) => Some(joint),
            _ => None,
        }
    }

    /// The friction joint, mutably, if this is one
    pub fn as_friction_mut(&mut self) -> Option<&mut FrictionJoint> {
        match self {
            Joint::Friction(joint) => Some(joint),
            _ => None,
        }
    }

    /// The target joint, if this is one
    pub fn as_target(&self) -> Option<&TargetJoint> {
        match self {
            Joint::Target(joint) => Some(joint),
            _ => None,
        }
    }

    /// The target joint, mutably, if this is one
    pub fn as_target_mut(&mut self) -> Option<&mut TargetJoint> {
        match self {
            Joint::Target(joint) => Some(joint),
            _ => None,
        }
    }
}

impl Constraint for Joint {
    fn init_velocity(&mut self, bodies: &mut [BodyConstraint], pair: BodyPair, step: &JointStepConf) {
        for_each_joint!(self, joint => joint.init_velocity(bodies, pair, step))
    }

    fn solve_velocity(&mut self, bodies: &mut [BodyConstraint], pair: BodyPair, step: &JointStepConf) -> bool {
        for_each_joint!(self, joint => joint.solve_velocity(bodies, pair, step))
    }

    fn solve_position(&self, bodies: &mut [BodyConstraint], pair: BodyPair, step: &JointStepConf) -> bool {
        for_each_joint!(self, joint => joint.solve_position(bodies, pair, step))
    }

    fn get_anchor_a(&self, xf_a: &Transformation) -> Vec2 {
        for_each_joint!(self, joint => joint.get_anchor_a(xf_a))
    }

    fn get_anchor_b(&self, xf_b: &Transformation) -> Vec2 {
        for_each_joint!(self, joint => joint.get_anchor_b(xf_b))
    }

    fn get_reaction_force(&self, inv_dt: Real) -> Vec2 {
        for_each_joint!(self, joint => joint.get_reaction_force(inv_dt))
    }

    fn get_reaction_torque(&self, inv_dt: Real) -> Real {
        for_each_joint!(self, joint => joint.get_reaction_torque(inv_dt))
    }
}

mod body_constraint;
mod constraint;
mod prismatic;
mod friction;
mod target;

pub use self::body_constraint::{cap, BodyConstraint, MovementConf};
pub use self::constraint::{BodyPair, Constraint, Joint, JointConf, JointStepConf};
pub use self::prismatic::{LimitState, PrismaticJoint, PrismaticJointConf};
pub use self::friction::{FrictionJoint, FrictionJointConf};
pub use self::target::{TargetJoint, TargetJointConf};

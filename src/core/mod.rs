pub mod world;
pub mod config;
pub mod storage;
pub mod events;
mod contact;
mod contacts;
mod island;
mod listeners;
mod solver;
mod step_stats;

pub use self::world::{ShapeRayHit, World};
pub use self::config::{StepConf, WorldConf};
pub use self::storage::{BodyId, ContactId, JointId, ObjectPool, PoolId, ShapeId};
pub use self::events::{BodyEvent, BodyEventType, ContactEvent, ContactEventType};
pub(crate) use self::events::EventQueue;
pub use self::contact::{mix_friction, mix_restitution, Contact, ContactFlags, ContactKey};
pub use self::island::Island;
pub use self::listeners::{
    ContactListener, DetachListener, JointListener, PostSolveListener, PreSolveListener, ShapeListener,
};
pub use self::step_stats::{PreStepStats, RegStepStats, StepStats, ToiStepStats};

/// What a broad-phase proxy stands for: one child of a shape attached to
/// a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Contactable {
    /// The body
    pub body: BodyId,

    /// The attached shape
    pub shape: ShapeId,

    /// Child index within the shape
    pub child: usize,
}

pub mod math;
pub mod core;
pub mod bodies;
pub mod shapes;
pub mod collision;
pub mod constraints;

/// Re-export common types for easier usage
pub use crate::core::{World, WorldConf, StepConf, StepStats, BodyId, ShapeId, JointId, ContactId};
pub use crate::bodies::{Body, BodyConf, BodyType};
pub use crate::shapes::{Shape, Geometry};
pub use crate::constraints::{Joint, JointConf};
pub use crate::math::{Real, Vec2};

/// Error types for the physics engine
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum PhysicsError {
        /// An argument would violate an invariant of the world
        #[error("Invalid argument: {0}")]
        InvalidArgument(String),

        /// An identifier doesn't refer to a live entity
        #[error("Out of range: {0}")]
        OutOfRange(String),

        /// The world is locked in the middle of a step
        #[error("Wrong state: {0}")]
        WrongState(String),

        /// A pool ran out of identifiers
        #[error("Length error: {0}")]
        LengthError(String),
    }
}

/// Result type for physics engine operations
pub type Result<T> = std::result::Result<T, error::PhysicsError>;

/// Engine version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

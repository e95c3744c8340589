mod body;
mod body_type;

pub use self::body::{Body, BodyConf, Fixture};
pub use self::body_type::BodyType;
pub use self::body_flags::BodyFlags;

/// Flags for controlling body behavior
pub mod body_flags {
    use bitflags::bitflags;

    bitflags! {
        /// Flags for controlling the behavior of bodies
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct BodyFlags: u32 {
            /// Body is awake and gets solved
            const AWAKE = 0x01;

            /// Body's island may go to sleep
            const AUTO_SLEEP = 0x02;

            /// Body opts into continuous collision against dynamic bodies
            const BULLET = 0x04;

            /// Body doesn't rotate from contacts or joints
            const FIXED_ROTATION = 0x08;

            /// Body takes part in the simulation at all
            const ENABLED = 0x10;
        }
    }
}

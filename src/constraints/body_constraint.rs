use crate::math::{get_transformation, Position, Real, Transformation, Vec2, Velocity};

/// A body's state as seen by the constraint solvers of one island: the
/// mass properties plus a working copy of the position and velocity that
/// the solvers update in place and the world writes back afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodyConstraint {
    /// Inverse mass, zero for static and kinematic bodies
    pub inv_mass: Real,

    /// Inverse rotational inertia about the center of mass
    pub inv_rot_inertia: Real,

    /// Center of mass in body coordinates
    pub local_center: Vec2,

    /// World position of the center of mass and angle
    pub position: Position,

    /// Linear and angular velocity
    pub velocity: Velocity,
}

impl BodyConstraint {
    /// Creates a new body constraint
    pub fn new(
        inv_mass: Real,
        inv_rot_inertia: Real,
        local_center: Vec2,
        position: Position,
        velocity: Velocity,
    ) -> Self {
        Self { inv_mass, inv_rot_inertia, local_center, position, velocity }
    }

    /// The body's transformation at its working position
    #[inline]
    pub fn get_transformation(&self) -> Transformation {
        get_transformation(self.position, self.local_center)
    }
}

/// Limits on how far a body may move in a single step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementConf {
    /// Maximum translation per step
    pub max_translation: Real,

    /// Maximum rotation per step
    pub max_rotation: Real,
}

/// Scales `velocity` down so that integrating it over `h` moves no further
/// than the limits of `conf`
pub fn cap(velocity: Velocity, h: Real, conf: &MovementConf) -> Velocity {
    let mut result = velocity;

    let translation = velocity.linear * h;
    let length_squared = translation.length_squared();
    if length_squared > conf.max_translation * conf.max_translation {
        result.linear *= conf.max_translation / length_squared.sqrt();
    }

    let rotation = h * velocity.angular;
    if rotation * rotation > conf.max_rotation * conf.max_rotation {
        result.angular *= conf.max_rotation / rotation.abs();
    }

    result
}

use crate::collision::contact_solver::{ConstraintSolverConf, ContactSolverConf};
use crate::collision::ToiConf;
use crate::constraints::MovementConf;
use crate::math::{to_radians, Real, Vec2, ANGULAR_SLOP, LINEAR_SLOP, PI};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Configuration of a world, fixed at construction
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct WorldConf {
    /// Acceleration applied to every dynamic body
    pub gravity: Vec2,

    /// Smallest vertex radius a shape may have
    pub min_vertex_radius: Real,

    /// Largest vertex radius a shape may have
    pub max_vertex_radius: Real,

    /// Initial capacity of the body pool
    pub body_capacity: usize,

    /// Initial capacity of the shape pool
    pub shape_capacity: usize,

    /// Initial capacity of the joint pool
    pub joint_capacity: usize,

    /// Initial capacity of the contact pool
    pub contact_capacity: usize,

    /// Initial capacity of the broad-phase tree
    pub proxy_capacity: usize,
}

impl Default for WorldConf {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -9.81),
            min_vertex_radius: 2.0 * LINEAR_SLOP,
            max_vertex_radius: 255.0,
            body_capacity: 1024,
            shape_capacity: 1024,
            joint_capacity: 1024,
            contact_capacity: 1024,
            proxy_capacity: 1024,
        }
    }
}

impl WorldConf {
    /// Sets the gravity
    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }
}

/// Configuration of a single call to `World::step`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct StepConf {
    /// Time to advance, in seconds. Zero updates contacts without moving
    /// anything.
    pub delta_time: Real,

    /// Velocity iterations of the regular phase
    pub reg_velocity_iterations: u32,

    /// Position iterations of the regular phase
    pub reg_position_iterations: u32,

    /// Velocity iterations per time of impact event
    pub toi_velocity_iterations: u32,

    /// Position iterations per time of impact event
    pub toi_position_iterations: u32,

    /// Collision and constraint tolerance
    pub linear_slop: Real,

    /// Angular constraint tolerance
    pub angular_slop: Real,

    /// Largest linear position correction per iteration
    pub max_linear_correction: Real,

    /// Largest angular position correction per iteration
    pub max_angular_correction: Real,

    /// Largest distance a body may travel in one step
    pub max_translation: Real,

    /// Largest angle a body may turn in one step
    pub max_rotation: Real,

    /// Relative normal speed below which restitution applies
    pub velocity_threshold: Real,

    /// Fraction of overlap resolved per position iteration, regular phase
    pub reg_resolution_rate: Real,

    /// Fraction of overlap resolved per position iteration, TOI phase
    pub toi_resolution_rate: Real,

    /// Regular position iterations stop once every contact separates by
    /// at least this much
    pub reg_min_separation: Real,

    /// TOI position iterations stop once every contact separates by at
    /// least this much
    pub toi_min_separation: Real,

    /// Regular velocity iterations stop once no impulse changes by more
    /// than this
    pub reg_min_momentum: Real,

    /// Depth into the vertex radii where the TOI target separation lies
    pub target_depth: Real,

    /// Tolerance around the TOI target separation
    pub tolerance: Real,

    /// Outer iteration cap of a TOI calculation
    pub max_toi_iters: u8,

    /// Root finder iteration cap of a TOI calculation
    pub max_toi_root_iters: u8,

    /// Iteration cap of a distance query
    pub max_distance_iters: u8,

    /// TOI events a single contact may take part in per step
    pub max_sub_steps: u8,

    /// Margin added around proxies in the broad-phase tree
    pub aabb_extension: Real,

    /// Multiplier of a body's displacement used to predict its proxies'
    /// AABBs
    pub displace_multiplier: Real,

    /// Time a body must stay under the sleep tolerances before its island
    /// may sleep
    pub min_still_time_to_sleep: Real,

    /// Linear speed under which a body counts as still
    pub linear_sleep_tolerance: Real,

    /// Angular speed under which a body counts as still
    pub angular_sleep_tolerance: Real,

    /// Whether cached impulses seed the velocity solver
    pub do_warm_start: bool,

    /// Whether continuous collision runs
    pub do_toi: bool,

    /// Whether two point contacts are solved as a block
    pub do_block_solve: bool,

    /// Whether islands may go to sleep
    pub allow_sleep: bool,

    /// Whether a step stops after a single TOI event
    pub sub_stepping: bool,
}

impl Default for StepConf {
    fn default() -> Self {
        Self {
            delta_time: 1.0 / 60.0,
            reg_velocity_iterations: 8,
            reg_position_iterations: 3,
            toi_velocity_iterations: 8,
            toi_position_iterations: 20,
            linear_slop: LINEAR_SLOP,
            angular_slop: ANGULAR_SLOP,
            max_linear_correction: 0.2,
            max_angular_correction: to_radians(8.0),
            max_translation: 2.0,
            max_rotation: PI / 2.0,
            velocity_threshold: 1.0,
            reg_resolution_rate: 0.2,
            toi_resolution_rate: 0.75,
            reg_min_separation: -3.0 * LINEAR_SLOP,
            toi_min_separation: -1.5 * LINEAR_SLOP,
            reg_min_momentum: 0.0,
            target_depth: 3.0 * LINEAR_SLOP,
            tolerance: LINEAR_SLOP / 4.0,
            max_toi_iters: 20,
            max_toi_root_iters: 30,
            max_distance_iters: 20,
            max_sub_steps: 8,
            aabb_extension: 0.1,
            displace_multiplier: 2.0,
            min_still_time_to_sleep: 0.5,
            linear_sleep_tolerance: 0.01,
            angular_sleep_tolerance: to_radians(2.0),
            do_warm_start: true,
            do_toi: true,
            do_block_solve: true,
            allow_sleep: true,
            sub_stepping: false,
        }
    }
}

impl StepConf {
    /// Creates a configuration stepping by `delta_time`
    pub fn new(delta_time: Real) -> Self {
        Self { delta_time, ..Self::default() }
    }

    /// Sets the time step
    pub fn with_delta_time(mut self, delta_time: Real) -> Self {
        self.delta_time = delta_time;
        self
    }

    /// Sets the regular phase iteration counts
    pub fn with_iterations(mut self, velocity: u32, position: u32) -> Self {
        self.reg_velocity_iterations = velocity;
        self.reg_position_iterations = position;
        self
    }

    /// Inverse of the time step, zero for a zero step
    #[inline]
    pub fn get_inv_delta_time(&self) -> Real {
        if self.delta_time != 0.0 {
            1.0 / self.delta_time
        } else {
            0.0
        }
    }

    /// Time of impact configuration derived from this step
    pub fn get_toi_conf(&self) -> ToiConf {
        ToiConf {
            t_max: 1.0,
            linear_slop: self.linear_slop,
            target_depth: self.target_depth,
            tolerance: self.tolerance,
            max_root_iters: self.max_toi_root_iters,
            max_toi_iters: self.max_toi_iters,
            max_dist_iters: self.max_distance_iters,
        }
    }

    /// Contact velocity solver configuration for a step with `dt_ratio`
    pub fn get_contact_solver_conf(&self, dt_ratio: Real, do_warm_start: bool) -> ContactSolverConf {
        ContactSolverConf {
            dt_ratio,
            do_warm_start,
            do_block_solve: self.do_block_solve,
            velocity_threshold: self.velocity_threshold,
        }
    }

    /// Regular phase position solver configuration
    pub fn get_reg_constraint_solver_conf(&self) -> ConstraintSolverConf {
        ConstraintSolverConf {
            resolution_rate: self.reg_resolution_rate,
            linear_slop: self.linear_slop,
            max_linear_correction: self.max_linear_correction,
        }
    }

    /// TOI phase position solver configuration
    pub fn get_toi_constraint_solver_conf(&self) -> ConstraintSolverConf {
        ConstraintSolverConf {
            resolution_rate: self.toi_resolution_rate,
            linear_slop: self.linear_slop,
            max_linear_correction: self.max_linear_correction,
        }
    }

    /// Per-step movement limits
    pub fn get_movement_conf(&self) -> MovementConf {
        MovementConf { max_translation: self.max_translation, max_rotation: self.max_rotation }
    }
}

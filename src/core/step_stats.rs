use crate::math::{Real, MAX_FLOAT};

/// Counters of the bookkeeping that runs before any solving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreStepStats {
    /// Proxies whose fat AABB was enlarged or moved
    pub proxies_moved: u32,

    /// Contacts destroyed because their proxies stopped overlapping or
    /// their filtering changed
    pub destroyed: u32,

    /// Contacts created from new proxy pairs
    pub added: u32,

    /// Contacts left alone because neither body could move
    pub ignored: u32,

    /// Contacts whose manifold was recomputed
    pub updated: u32,

    /// Contacts that didn't need their manifold recomputed
    pub skipped: u32,
}

/// Counters of the regular (discrete) phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegStepStats {
    /// Smallest contact separation after position iterations
    pub min_separation: Real,

    /// Largest incremental impulse of any velocity iteration
    pub max_inc_impulse: Real,

    /// Islands built
    pub islands_found: u32,

    /// Islands whose position iterations converged
    pub islands_solved: u32,

    /// Contacts created after proxies moved
    pub contacts_added: u32,

    /// Bodies put to sleep
    pub bodies_slept: u32,

    /// Proxies whose fat AABB was enlarged or moved
    pub proxies_moved: u32,

    /// Position iterations run, over all islands
    pub sum_pos_iters: u32,

    /// Velocity iterations run, over all islands
    pub sum_vel_iters: u32,
}

impl Default for RegStepStats {
    fn default() -> Self {
        Self {
            min_separation: MAX_FLOAT,
            max_inc_impulse: 0.0,
            islands_found: 0,
            islands_solved: 0,
            contacts_added: 0,
            bodies_slept: 0,
            proxies_moved: 0,
            sum_pos_iters: 0,
            sum_vel_iters: 0,
        }
    }
}

/// Counters of the time of impact phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToiStepStats {
    /// Smallest contact separation after position iterations
    pub min_separation: Real,

    /// Largest incremental impulse of any velocity iteration
    pub max_inc_impulse: Real,

    /// TOI islands built
    pub islands_found: u32,

    /// TOI islands whose position iterations converged
    pub islands_solved: u32,

    /// TOI events found
    pub contacts_found: u32,

    /// Contacts skipped for having reached the sub-step cap
    pub contacts_at_max_sub_steps: u32,

    /// Contacts whose time of impact was recomputed
    pub contacts_updated_toi: u32,

    /// Contacts whose manifold was recomputed while processing an event
    pub contacts_updated_touching: u32,

    /// Contacts not recomputed while processing an event
    pub contacts_skipped_touching: u32,

    /// Contacts created after proxies moved
    pub contacts_added: u32,

    /// Proxies whose fat AABB was enlarged or moved
    pub proxies_moved: u32,

    /// Position iterations run, over all events
    pub sum_pos_iters: u32,

    /// Velocity iterations run, over all events
    pub sum_vel_iters: u32,

    /// Most distance iterations of a single query
    pub max_dist_iters: u8,

    /// Most outer TOI iterations of a single calculation
    pub max_toi_iters: u8,

    /// Most root finder iterations of a single push-back
    pub max_root_iters: u8,
}

impl Default for ToiStepStats {
    fn default() -> Self {
        Self {
            min_separation: MAX_FLOAT,
            max_inc_impulse: 0.0,
            islands_found: 0,
            islands_solved: 0,
            contacts_found: 0,
            contacts_at_max_sub_steps: 0,
            contacts_updated_toi: 0,
            contacts_updated_touching: 0,
            contacts_skipped_touching: 0,
            contacts_added: 0,
            proxies_moved: 0,
            sum_pos_iters: 0,
            sum_vel_iters: 0,
            max_dist_iters: 0,
            max_toi_iters: 0,
            max_root_iters: 0,
        }
    }
}

/// Everything a call to `World::step` counted
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepStats {
    /// Bookkeeping before solving
    pub pre: PreStepStats,

    /// Regular phase
    pub reg: RegStepStats,

    /// Time of impact phase
    pub toi: ToiStepStats,
}

/// Result of solving one island
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct IslandStats {
    pub min_separation: Real,
    pub max_inc_impulse: Real,
    pub solved: bool,
    pub position_iters: u32,
    pub velocity_iters: u32,
    pub bodies_slept: u32,
}

impl Default for IslandStats {
    fn default() -> Self {
        Self {
            min_separation: MAX_FLOAT,
            max_inc_impulse: 0.0,
            solved: false,
            position_iters: 0,
            velocity_iters: 0,
            bodies_slept: 0,
        }
    }
}

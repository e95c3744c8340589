use crate::collision::distance::{distance, DistanceConf};
use crate::collision::{DistanceProxy, SeparationFinder, SimplexCache};
use crate::math::{Real, Sweep, LINEAR_SLOP, MAX_POLYGON_VERTICES};

/// Configuration of a time of impact calculation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToiConf {
    /// Sweep interval upper bound, in [0,1]
    pub t_max: Real,

    /// Lower bound of the target separation
    pub linear_slop: Real,

    /// How deep into the combined vertex radii the target separation lies
    pub target_depth: Real,

    /// Tolerance around the target separation
    pub tolerance: Real,

    /// Maximum number of root finder iterations per push-back
    pub max_root_iters: u8,

    /// Maximum number of outer iterations
    pub max_toi_iters: u8,

    /// Maximum number of iterations per distance query
    pub max_dist_iters: u8,
}

impl Default for ToiConf {
    fn default() -> Self {
        Self {
            t_max: 1.0,
            linear_slop: LINEAR_SLOP,
            target_depth: 3.0 * LINEAR_SLOP,
            tolerance: LINEAR_SLOP / 4.0,
            max_root_iters: 30,
            max_toi_iters: 20,
            max_dist_iters: 20,
        }
    }
}

/// How a time of impact calculation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToiState {
    /// Not run
    #[default]
    Unknown,

    /// The separation couldn't be brought back to the target
    Failed,

    /// The proxies' cores overlap at the start of the interval
    Overlapped,

    /// The proxies reach the target separation at the output time
    Touching,

    /// The proxies stay apart over the whole interval
    Separated,

    /// The outer iteration cap was reached
    MaxToiIters,

    /// The root finder's iteration cap was reached
    MaxRootIters,
}

/// Iteration statistics of a time of impact calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ToiStats {
    /// Outer iterations
    pub toi_iters: u8,

    /// Total distance iterations
    pub sum_dist_iters: u16,

    /// Most distance iterations of a single query
    pub max_dist_iters: u8,

    /// Total root finder iterations
    pub sum_root_iters: u16,

    /// Most root finder iterations of a single push-back
    pub max_root_iters: u8,
}

/// Output of [`get_toi_via_sat`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ToiOutput {
    /// Time of impact as a fraction of the sweeps' remaining interval
    pub time: Real,

    /// How the calculation ended
    pub state: ToiState,

    /// Iteration statistics
    pub stats: ToiStats,
}

impl ToiOutput {
    fn new(time: Real, state: ToiState, stats: ToiStats) -> Self {
        Self { time, state, stats }
    }
}

/// Computes the upper bound on the time before two moving proxies come
/// within the target separation, using conservative advancement along
/// separating axes.
///
/// `time` is only a valid time of impact for [`ToiState::Touching`]. The
/// other states say the proxies stay apart, start out overlapped, or that
/// an iteration cap stopped the search; none of them is an error.
pub fn get_toi_via_sat(
    proxy_a: &DistanceProxy,
    sweep_a: &Sweep,
    proxy_b: &DistanceProxy,
    sweep_b: &Sweep,
    conf: ToiConf,
) -> ToiOutput {
    let mut stats = ToiStats::default();

    let t_max = conf.t_max;
    let total_radius = proxy_a.get_vertex_radius() + proxy_b.get_vertex_radius();
    let target = conf.linear_slop.max(total_radius - conf.target_depth);
    let tolerance = conf.tolerance;
    let max_target = target + tolerance;
    let min_target = target - tolerance;
    debug_assert!(min_target > 0.0);

    let mut t1: Real = 0.0;
    let mut cache = SimplexCache::new();

    // The outer loop progressively attempts to compute new separating axes.
    // This loop terminates when an axis is repeated (no progress is made).
    loop {
        let xf_a = sweep_a.get_transform(t1);
        let xf_b = sweep_b.get_transform(t1);

        // Get the distance between shapes. We can also use the results
        // to get a separating axis.
        let output = distance(
            proxy_a,
            &xf_a,
            proxy_b,
            &xf_b,
            DistanceConf { cache, max_iterations: conf.max_dist_iters },
        );
        stats.sum_dist_iters += u16::from(output.iterations);
        stats.max_dist_iters = stats.max_dist_iters.max(output.iterations);
        cache = output.simplex.to_cache();

        let dist = output.distance();

        // If the shapes are overlapped, we give up on continuous collision.
        if dist <= 0.0 {
            return ToiOutput::new(0.0, ToiState::Overlapped, stats);
        }

        if dist < max_target {
            // Victory!
            return ToiOutput::new(t1, ToiState::Touching, stats);
        }

        // Initialize the separating axis.
        let index_pairs = output.simplex.get_index_pairs();
        let fcn = SeparationFinder::get(&index_pairs, *proxy_a, &xf_a, *proxy_b, &xf_b);

        // Compute the TOI on the separating axis. We do this by successively
        // resolving the deepest point. This loop is bounded by the number of
        // vertices.
        let mut t2 = t_max;
        let mut push_back_iter = 0;
        loop {
            // Find the deepest point at t2. Store the witness point indices.
            let min_sep = fcn.find_min_separation(&sweep_a.get_transform(t2), &sweep_b.get_transform(t2));
            let mut s2 = min_sep.distance;

            // Is the final configuration separated?
            if s2 > max_target {
                return ToiOutput::new(t_max, ToiState::Separated, stats);
            }

            // Has the separation reached tolerance?
            if s2 > min_target {
                // Advance the sweeps
                t1 = t2;
                break;
            }

            // Compute the initial separation of the witness points.
            let mut s1 = fcn.evaluate(min_sep.indices, &sweep_a.get_transform(t1), &sweep_b.get_transform(t1));

            // Check for initial overlap. This might happen if the root finder
            // runs out of iterations.
            if s1 < min_target {
                return ToiOutput::new(t1, ToiState::Failed, stats);
            }

            // Check for touching
            if s1 <= max_target {
                // Victory! t1 should hold the TOI (could be 0.0).
                return ToiOutput::new(t1, ToiState::Touching, stats);
            }

            // Compute 1D root of: f(x) - target = 0
            let mut root_iters: u8 = 0;
            let mut a1 = t1;
            let mut a2 = t2;
            let mut converged = false;
            loop {
                // Use a mix of the secant rule and bisection.
                let t = if root_iters % 2 == 1 {
                    a1 + (target - s1) * (a2 - a1) / (s2 - s1)
                } else {
                    0.5 * (a1 + a2)
                };
                root_iters += 1;

                let s = fcn.evaluate(min_sep.indices, &sweep_a.get_transform(t), &sweep_b.get_transform(t));

                if (s - target).abs() < tolerance {
                    // t2 holds a tentative value for t1
                    t2 = t;
                    converged = true;
                    break;
                }

                // Ensure we continue to bracket the root.
                if s > target {
                    a1 = t;
                    s1 = s;
                } else {
                    a2 = t;
                    s2 = s;
                }

                if root_iters >= conf.max_root_iters {
                    break;
                }
            }

            stats.sum_root_iters += u16::from(root_iters);
            stats.max_root_iters = stats.max_root_iters.max(root_iters);

            if !converged {
                return ToiOutput::new(t2, ToiState::MaxRootIters, stats);
            }

            push_back_iter += 1;
            if push_back_iter == MAX_POLYGON_VERTICES {
                break;
            }
        }

        stats.toi_iters += 1;
        if stats.toi_iters == conf.max_toi_iters {
            // Root finder got stuck. Semi-victory.
            return ToiOutput::new(t1, ToiState::MaxToiIters, stats);
        }
    }
}

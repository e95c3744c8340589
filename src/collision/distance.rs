use crate::collision::simplex::make_edge;
use crate::collision::{DistanceProxy, Simplex, SimplexCache};
use crate::math::{Real, Transformation, Vec2, EPSILON};

/// Default maximum number of GJK iterations
pub const DEFAULT_MAX_DISTANCE_ITERS: u8 = 20;

/// Configuration of a distance query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceConf {
    /// Simplex of a previous query to warm start from
    pub cache: SimplexCache,

    /// Maximum number of iterations
    pub max_iterations: u8,
}

impl Default for DistanceConf {
    fn default() -> Self {
        Self { cache: SimplexCache::new(), max_iterations: DEFAULT_MAX_DISTANCE_ITERS }
    }
}

/// Why a distance query stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceState {
    /// Not run
    Unknown,

    /// The simplex grew to a triangle: the origin is inside, the cores overlap
    MaxPointsReached,

    /// The search direction degenerated; the origin lies on the simplex
    UnfitSearchDirection,

    /// The new support point was already in the simplex: converged
    DuplicateIndexPair,

    /// Iteration cap reached; the current simplex is the best estimate
    MaxItersReached,
}

/// Result of a distance query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceOutput {
    /// Final simplex
    pub simplex: Simplex,

    /// Number of iterations used
    pub iterations: u8,

    /// Why the query stopped
    pub state: DistanceState,
}

impl DistanceOutput {
    /// The closest points on A and B
    pub fn witness_points(&self) -> (Vec2, Vec2) {
        self.simplex.get_witness_points()
    }

    /// Distance between the proxies' cores, ignoring vertex radii
    pub fn distance(&self) -> Real {
        let (a, b) = self.witness_points();
        a.distance(&b)
    }
}

/// Computes the closest points between two convex proxies using GJK.
///
/// Vertex radii are not applied: the result describes the proxies' cores.
/// On iteration exhaustion the best simplex so far is returned with state
/// [`DistanceState::MaxItersReached`].
pub fn distance(
    proxy_a: &DistanceProxy,
    xf_a: &Transformation,
    proxy_b: &DistanceProxy,
    xf_b: &Transformation,
    conf: DistanceConf,
) -> DistanceOutput {
    let mut simplex = Simplex::from_cache(&conf.cache, proxy_a, xf_a, proxy_b, xf_b);

    let mut state = DistanceState::Unknown;
    let mut iterations: u8 = 0;

    while iterations < conf.max_iterations {
        // Remember the simplex's vertices to detect cycling.
        let saved = simplex;

        simplex.solve();

        // If we have 3 points, then the origin is in the corresponding triangle.
        if simplex.size() == 3 {
            state = DistanceState::MaxPointsReached;
            break;
        }

        let d = simplex.get_search_direction();

        // Ensure the search direction is numerically fit.
        if d.length_squared() < EPSILON * EPSILON {
            // The origin is probably contained by a line segment or
            // triangle. Thus the shapes are overlapped.
            state = DistanceState::UnfitSearchDirection;
            break;
        }

        // Compute a tentative new simplex vertex using support points.
        let index_a = proxy_a.get_support_index(xf_a.q.inverse_rotate(-d));
        let index_b = proxy_b.get_support_index(xf_b.q.inverse_rotate(d));

        iterations += 1;

        // Check for duplicate support points. This is the main termination
        // criteria.
        if saved.edges().iter().any(|e| e.indices.a == index_a && e.indices.b == index_b) {
            state = DistanceState::DuplicateIndexPair;
            break;
        }

        // New vertex is ok and needed.
        simplex.add_edge(make_edge(proxy_a, xf_a, index_a, proxy_b, xf_b, index_b));
    }

    if state == DistanceState::Unknown {
        // The last vertex added hasn't been through a solve yet.
        simplex.solve();
        state = DistanceState::MaxItersReached;
    }

    DistanceOutput { simplex, iterations, state }
}

/// Distance between the proxies' surfaces: the core distance minus both
/// vertex radii. Negative values mean overlap.
pub fn get_surface_distance(
    proxy_a: &DistanceProxy,
    xf_a: &Transformation,
    proxy_b: &DistanceProxy,
    xf_b: &Transformation,
    conf: DistanceConf,
) -> Real {
    let output = distance(proxy_a, xf_a, proxy_b, xf_b, conf);
    output.distance() - proxy_a.get_vertex_radius() - proxy_b.get_vertex_radius()
}

/// Whether two proxies overlap, rounding included
pub fn test_overlap(
    proxy_a: &DistanceProxy,
    xf_a: &Transformation,
    proxy_b: &DistanceProxy,
    xf_b: &Transformation,
    conf: DistanceConf,
) -> bool {
    get_surface_distance(proxy_a, xf_a, proxy_b, xf_b, conf) < 10.0 * EPSILON
}

use crate::collision::DistanceProxy;
use crate::math::{Real, Transformation, Vec2, EPSILON};

/// Index marking "no vertex" in an [`IndexPair`]
pub const INVALID_INDEX: usize = usize::MAX;

/// A pair of vertex indices, one into each of two distance proxies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IndexPair {
    /// Index into proxy A
    pub a: usize,

    /// Index into proxy B
    pub b: usize,
}

impl IndexPair {
    /// Creates a new index pair
    #[inline]
    pub fn new(a: usize, b: usize) -> Self {
        Self { a, b }
    }

    /// A pair with neither index set
    #[inline]
    pub fn invalid() -> Self {
        Self { a: INVALID_INDEX, b: INVALID_INDEX }
    }
}

/// One vertex of the simplex, a point on the Minkowski difference B - A
/// together with the two support points it came from
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimplexEdge {
    /// Support point on A in world coordinates
    pub w_a: Vec2,

    /// Support point on B in world coordinates
    pub w_b: Vec2,

    /// The vertex indices the support points came from
    pub indices: IndexPair,
}

impl SimplexEdge {
    /// Creates a new simplex vertex
    #[inline]
    pub fn new(w_a: Vec2, index_a: usize, w_b: Vec2, index_b: usize) -> Self {
        Self { w_a, w_b, indices: IndexPair::new(index_a, index_b) }
    }

    /// The Minkowski difference point `w_b - w_a`
    #[inline]
    pub fn w(&self) -> Vec2 {
        self.w_b - self.w_a
    }
}

/// Indices of a previous simplex, used to warm start the next distance query
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimplexCache {
    /// Length or area of the cached simplex
    metric: Real,

    /// Cached vertex index pairs
    indices: [IndexPair; 3],

    /// Number of cached pairs
    count: usize,
}

impl SimplexCache {
    /// An empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached index pairs
    pub fn get_count(&self) -> usize {
        self.count
    }

    /// The cached index pairs
    pub fn get_indices(&self) -> &[IndexPair] {
        &self.indices[..self.count]
    }

    /// The cached metric
    pub fn get_metric(&self) -> Real {
        self.metric
    }
}

/// A 1 to 3 vertex simplex used by the distance algorithm, with the
/// barycentric coefficients of the point closest to the origin
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Simplex {
    edges: [SimplexEdge; 3],
    coefficients: [Real; 3],
    count: usize,
}

impl Simplex {
    /// Creates a new empty simplex
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a simplex from a cache, or from the first vertices when the
    /// cache is empty or stale
    pub fn from_cache(
        cache: &SimplexCache,
        proxy_a: &DistanceProxy,
        xf_a: &Transformation,
        proxy_b: &DistanceProxy,
        xf_b: &Transformation,
    ) -> Self {
        let mut simplex = Self::new();
        for pair in cache.get_indices() {
            simplex.add_edge(make_edge(proxy_a, xf_a, pair.a, proxy_b, xf_b, pair.b));
        }

        // If the metric changed a lot the cache is of little use; flush it.
        if simplex.count > 1 {
            let metric1 = cache.metric;
            let metric2 = simplex.get_metric();
            if metric2 < 0.5 * metric1 || 2.0 * metric1 < metric2 || metric2 < EPSILON {
                simplex.count = 0;
            }
        }

        if simplex.count == 0 {
            simplex.add_edge(make_edge(proxy_a, xf_a, 0, proxy_b, xf_b, 0));
        }
        simplex
    }

    /// Writes this simplex's indices and metric to a cache
    pub fn to_cache(&self) -> SimplexCache {
        let mut cache = SimplexCache { metric: self.get_metric(), ..Default::default() };
        for (i, edge) in self.edges().iter().enumerate() {
            cache.indices[i] = edge.indices;
        }
        cache.count = self.count;
        cache
    }

    /// Appends a vertex. The coefficients are reset by the next solve.
    pub fn add_edge(&mut self, edge: SimplexEdge) {
        debug_assert!(self.count < 3);
        self.edges[self.count] = edge;
        self.coefficients[self.count] = 1.0;
        self.count += 1;
    }

    /// Gets the number of vertices in the simplex
    pub fn size(&self) -> usize {
        self.count
    }

    /// The simplex vertices
    pub fn edges(&self) -> &[SimplexEdge] {
        &self.edges[..self.count]
    }

    /// The index pairs of the simplex vertices
    pub fn get_index_pairs(&self) -> Vec<IndexPair> {
        self.edges().iter().map(|e| e.indices).collect()
    }

    /// Reduces the simplex to the feature closest to the origin
    pub fn solve(&mut self) {
        match self.count {
            2 => self.solve2(),
            3 => self.solve3(),
            _ => {}
        }
    }

    /// Direction in which to look for the next support point
    pub fn get_search_direction(&self) -> Vec2 {
        match self.count {
            1 => -self.edges[0].w(),
            2 => {
                let w1 = self.edges[0].w();
                let e12 = self.edges[1].w() - w1;
                let sgn = e12.cross(&-w1);
                if sgn > 0.0 {
                    // Origin is left of e12.
                    e12.rev_perpendicular()
                } else {
                    // Origin is right of e12.
                    e12.fwd_perpendicular()
                }
            }
            _ => Vec2::zero(),
        }
    }

    /// The closest points on A and B
    pub fn get_witness_points(&self) -> (Vec2, Vec2) {
        match self.count {
            1 => (self.edges[0].w_a, self.edges[0].w_b),
            2 => {
                let a = self.edges[0].w_a * self.coefficients[0] + self.edges[1].w_a * self.coefficients[1];
                let b = self.edges[0].w_b * self.coefficients[0] + self.edges[1].w_b * self.coefficients[1];
                (a, b)
            }
            3 => {
                let a = self.edges[0].w_a * self.coefficients[0]
                    + self.edges[1].w_a * self.coefficients[1]
                    + self.edges[2].w_a * self.coefficients[2];
                (a, a)
            }
            _ => (Vec2::zero(), Vec2::zero()),
        }
    }

    /// Length of a 2-simplex or area (times two) of a 3-simplex
    pub fn get_metric(&self) -> Real {
        match self.count {
            2 => self.edges[0].w().distance(&self.edges[1].w()),
            3 => {
                let w1 = self.edges[0].w();
                (self.edges[1].w() - w1).cross(&(self.edges[2].w() - w1))
            }
            _ => 0.0,
        }
    }

    // Solve a line segment using barycentric coordinates.
    //
    // p = a1 * w1 + a2 * w2
    // a1 + a2 = 1
    //
    // The vector from the origin to the closest point on the line is
    // perpendicular to the line.
    // e12 = w2 - w1
    // dot(p, e) = 0
    // a1 * dot(w1, e) + a2 * dot(w2, e) = 0
    fn solve2(&mut self) {
        let w1 = self.edges[0].w();
        let w2 = self.edges[1].w();
        let e12 = w2 - w1;

        // w1 region
        let d12_2 = -w1.dot(&e12);
        if d12_2 <= 0.0 {
            // a2 <= 0, so we clamp it to 0
            self.coefficients[0] = 1.0;
            self.count = 1;
            return;
        }

        // w2 region
        let d12_1 = w2.dot(&e12);
        if d12_1 <= 0.0 {
            // a1 <= 0, so we clamp it to 0
            self.edges[0] = self.edges[1];
            self.coefficients[0] = 1.0;
            self.count = 1;
            return;
        }

        // Must be in e12 region.
        let inv_d12 = 1.0 / (d12_1 + d12_2);
        self.coefficients[0] = d12_1 * inv_d12;
        self.coefficients[1] = d12_2 * inv_d12;
        self.count = 2;
    }

    // Possible regions:
    // - points[2]
    // - edge points[0]-points[2]
    // - edge points[1]-points[2]
    // - inside the triangle
    fn solve3(&mut self) {
        let w1 = self.edges[0].w();
        let w2 = self.edges[1].w();
        let w3 = self.edges[2].w();

        // Edge12
        let e12 = w2 - w1;
        let d12_1 = w2.dot(&e12);
        let d12_2 = -w1.dot(&e12);

        // Edge13
        let e13 = w3 - w1;
        let d13_1 = w3.dot(&e13);
        let d13_2 = -w1.dot(&e13);

        // Edge23
        let e23 = w3 - w2;
        let d23_1 = w3.dot(&e23);
        let d23_2 = -w2.dot(&e23);

        // Triangle123
        let n123 = e12.cross(&e13);

        let d123_1 = n123 * w2.cross(&w3);
        let d123_2 = n123 * w3.cross(&w1);
        let d123_3 = n123 * w1.cross(&w2);

        // w1 region
        if d12_2 <= 0.0 && d13_2 <= 0.0 {
            self.coefficients[0] = 1.0;
            self.count = 1;
            return;
        }

        // e12
        if d12_1 > 0.0 && d12_2 > 0.0 && d123_3 <= 0.0 {
            let inv_d12 = 1.0 / (d12_1 + d12_2);
            self.coefficients[0] = d12_1 * inv_d12;
            self.coefficients[1] = d12_2 * inv_d12;
            self.count = 2;
            return;
        }

        // e13
        if d13_1 > 0.0 && d13_2 > 0.0 && d123_2 <= 0.0 {
            let inv_d13 = 1.0 / (d13_1 + d13_2);
            self.coefficients[0] = d13_1 * inv_d13;
            self.coefficients[1] = d13_2 * inv_d13;
            self.edges[1] = self.edges[2];
            self.count = 2;
            return;
        }

        // w2 region
        if d12_1 <= 0.0 && d23_2 <= 0.0 {
            self.edges[0] = self.edges[1];
            self.coefficients[0] = 1.0;
            self.count = 1;
            return;
        }

        // w3 region
        if d13_1 <= 0.0 && d23_1 <= 0.0 {
            self.edges[0] = self.edges[2];
            self.coefficients[0] = 1.0;
            self.count = 1;
            return;
        }

        // e23
        if d23_1 > 0.0 && d23_2 > 0.0 && d123_1 <= 0.0 {
            let inv_d23 = 1.0 / (d23_1 + d23_2);
            self.edges[0] = self.edges[2];
            self.coefficients[0] = d23_2 * inv_d23;
            self.coefficients[1] = d23_1 * inv_d23;
            self.count = 2;
            return;
        }

        // Must be in triangle123
        let inv_d123 = 1.0 / (d123_1 + d123_2 + d123_3);
        self.coefficients[0] = d123_1 * inv_d123;
        self.coefficients[1] = d123_2 * inv_d123;
        self.coefficients[2] = d123_3 * inv_d123;
        self.count = 3;
    }
}

/// Builds a simplex vertex from vertex `index_a` of A and `index_b` of B
pub(crate) fn make_edge(
    proxy_a: &DistanceProxy,
    xf_a: &Transformation,
    index_a: usize,
    proxy_b: &DistanceProxy,
    xf_b: &Transformation,
    index_b: usize,
) -> SimplexEdge {
    SimplexEdge::new(
        xf_a.transform(proxy_a.get_vertex(index_a)),
        index_a,
        xf_b.transform(proxy_b.get_vertex(index_b)),
        index_b,
    )
}

use crate::collision::{Manifold, ManifoldType, WorldManifold};
use crate::constraints::BodyConstraint;
use crate::math::{clamp, cross_sv, Mat22, Real, UnitVec2, Vec2, MAX_FLOAT, MAX_MANIFOLD_POINTS};

/// Largest condition number of the block matrix for which both points of a
/// two-point contact are solved together
const MAX_CONDITION_NUMBER: Real = 1000.0;

/// Configuration of the contact velocity solver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactSolverConf {
    /// Ratio of this step's delta time to the previous one's
    pub dt_ratio: Real,

    /// Whether to start from last step's impulses
    pub do_warm_start: bool,

    /// Whether two-point contacts are solved as a block
    pub do_block_solve: bool,

    /// Relative normal speed below which restitution is ignored
    pub velocity_threshold: Real,
}

/// Configuration of the contact position solver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintSolverConf {
    /// Fraction of the overlap resolved per iteration
    pub resolution_rate: Real,

    /// Allowed overlap
    pub linear_slop: Real,

    /// Largest correction applied per iteration
    pub max_linear_correction: Real,
}

/// Solver data of one contact point
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VelocityConstraintPoint {
    /// Contact point relative to body A's center of mass
    pub r_a: Vec2,

    /// Contact point relative to body B's center of mass
    pub r_b: Vec2,

    /// Accumulated normal impulse
    pub normal_impulse: Real,

    /// Accumulated tangent impulse
    pub tangent_impulse: Real,

    /// Effective mass along the normal
    pub normal_mass: Real,

    /// Effective mass along the tangent
    pub tangent_mass: Real,

    /// Target normal velocity from restitution
    pub velocity_bias: Real,
}

/// Velocity constraint of one contact, built once per step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityConstraint {
    /// Index of the contact this constraint came from
    pub contact_index: usize,

    /// Island-local index of body A
    pub body_a: usize,

    /// Island-local index of body B
    pub body_b: usize,

    /// World normal from A to B
    pub normal: Vec2,

    /// Coefficient of friction
    pub friction: Real,

    /// Coefficient of restitution
    pub restitution: Real,

    /// Surface speed along the tangent
    pub tangent_speed: Real,

    points: [VelocityConstraintPoint; MAX_MANIFOLD_POINTS],

    point_count: usize,

    /// Block matrix of the two normal constraints
    k: Mat22,

    /// Inverse of `k`
    normal_mass: Mat22,

    block_solve: bool,
}

impl VelocityConstraint {
    /// Builds the constraint of a contact from its manifold and the
    /// island's body state
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        contact_index: usize,
        manifold: &Manifold,
        friction: Real,
        restitution: Real,
        tangent_speed: Real,
        body_a: usize,
        radius_a: Real,
        body_b: usize,
        radius_b: Real,
        bodies: &[BodyConstraint],
        conf: &ContactSolverConf,
    ) -> Self {
        let ba = &bodies[body_a];
        let bb = &bodies[body_b];

        let world_manifold = WorldManifold::new(
            manifold,
            &ba.get_transformation(),
            radius_a,
            &bb.get_transformation(),
            radius_b,
        );
        let normal = world_manifold.get_normal().unwrap_or(UnitVec2::RIGHT).to_vec();
        let tangent = normal.fwd_perpendicular();

        let (m_a, i_a) = (ba.inv_mass, ba.inv_rot_inertia);
        let (m_b, i_b) = (bb.inv_mass, bb.inv_rot_inertia);
        let (c_a, c_b) = (ba.position.linear, bb.position.linear);
        let (v_a, w_a) = (ba.velocity.linear, ba.velocity.angular);
        let (v_b, w_b) = (bb.velocity.linear, bb.velocity.angular);

        let mut vc = Self {
            contact_index,
            body_a,
            body_b,
            normal,
            friction,
            restitution,
            tangent_speed,
            points: [VelocityConstraintPoint::default(); MAX_MANIFOLD_POINTS],
            point_count: world_manifold.get_point_count(),
            k: Mat22::zero(),
            normal_mass: Mat22::zero(),
            block_solve: false,
        };

        for j in 0..vc.point_count {
            let mp = manifold.get_point(j);
            let vcp = &mut vc.points[j];

            if conf.do_warm_start {
                vcp.normal_impulse = conf.dt_ratio * mp.normal_impulse;
                vcp.tangent_impulse = conf.dt_ratio * mp.tangent_impulse;
            }

            vcp.r_a = world_manifold.get_point(j) - c_a;
            vcp.r_b = world_manifold.get_point(j) - c_b;

            let rn_a = vcp.r_a.cross(&normal);
            let rn_b = vcp.r_b.cross(&normal);
            let k_normal = m_a + m_b + i_a * rn_a * rn_a + i_b * rn_b * rn_b;
            vcp.normal_mass = if k_normal > 0.0 { 1.0 / k_normal } else { 0.0 };

            let rt_a = vcp.r_a.cross(&tangent);
            let rt_b = vcp.r_b.cross(&tangent);
            let k_tangent = m_a + m_b + i_a * rt_a * rt_a + i_b * rt_b * rt_b;
            vcp.tangent_mass = if k_tangent > 0.0 { 1.0 / k_tangent } else { 0.0 };

            // Setup a velocity bias for restitution.
            let dv = v_b + cross_sv(w_b, vcp.r_b) - v_a - cross_sv(w_a, vcp.r_a);
            let v_rel = normal.dot(&dv);
            if v_rel < -conf.velocity_threshold {
                vcp.velocity_bias = -restitution * v_rel;
            }
        }

        // If we have two points, then prepare the block solver.
        if vc.point_count == 2 && conf.do_block_solve {
            let vcp1 = vc.points[0];
            let vcp2 = vc.points[1];

            let rn1_a = vcp1.r_a.cross(&normal);
            let rn1_b = vcp1.r_b.cross(&normal);
            let rn2_a = vcp2.r_a.cross(&normal);
            let rn2_b = vcp2.r_b.cross(&normal);

            let k11 = m_a + m_b + i_a * rn1_a * rn1_a + i_b * rn1_b * rn1_b;
            let k22 = m_a + m_b + i_a * rn2_a * rn2_a + i_b * rn2_b * rn2_b;
            let k12 = m_a + m_b + i_a * rn1_a * rn2_a + i_b * rn1_b * rn2_b;

            // Ensure a reasonable condition number.
            if k11 * k11 < MAX_CONDITION_NUMBER * (k11 * k22 - k12 * k12) {
                // K is safe to invert.
                vc.k = Mat22::new(Vec2::new(k11, k12), Vec2::new(k12, k22));
                vc.normal_mass = vc.k.get_inverse();
                vc.block_solve = true;
            } else {
                // The constraints are redundant, just use one.
                vc.point_count = 1;
            }
        }

        vc
    }

    /// Number of points
    pub fn get_point_count(&self) -> usize {
        self.point_count
    }

    /// Point `index`
    pub fn get_point(&self, index: usize) -> &VelocityConstraintPoint {
        &self.points[index]
    }

    /// The tangent direction
    pub fn get_tangent(&self) -> Vec2 {
        self.normal.fwd_perpendicular()
    }

    fn uses_block_solve(&self) -> bool {
        self.block_solve && self.point_count == 2
    }
}

/// Position constraint of one contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionConstraint {
    /// Manifold in the shapes' local frames
    pub manifold: Manifold,

    /// Island-local index of body A
    pub body_a: usize,

    /// Vertex radius of shape A
    pub radius_a: Real,

    /// Island-local index of body B
    pub body_b: usize,

    /// Vertex radius of shape B
    pub radius_b: Real,
}

/// Impulses applied at the points of a contact, passed to post-solve
/// listeners
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContactImpulses {
    normal: [Real; MAX_MANIFOLD_POINTS],
    tangent: [Real; MAX_MANIFOLD_POINTS],
    count: usize,
}

impl ContactImpulses {
    /// The impulses of a solved velocity constraint
    pub fn from_constraint(vc: &VelocityConstraint) -> Self {
        let mut result = Self { count: vc.point_count, ..Default::default() };
        for j in 0..vc.point_count {
            result.normal[j] = vc.points[j].normal_impulse;
            result.tangent[j] = vc.points[j].tangent_impulse;
        }
        result
    }

    /// Number of points
    pub fn get_count(&self) -> usize {
        self.count
    }

    /// Normal impulse at point `index`
    pub fn get_normal(&self, index: usize) -> Real {
        self.normal[index]
    }

    /// Tangent impulse at point `index`
    pub fn get_tangent(&self, index: usize) -> Real {
        self.tangent[index]
    }
}

fn apply_impulse(bodies: &mut [BodyConstraint], vc: &VelocityConstraint, r_a: Vec2, r_b: Vec2, p: Vec2) {
    let a = &mut bodies[vc.body_a];
    a.velocity.linear -= p * a.inv_mass;
    a.velocity.angular -= a.inv_rot_inertia * r_a.cross(&p);

    let b = &mut bodies[vc.body_b];
    b.velocity.linear += p * b.inv_mass;
    b.velocity.angular += b.inv_rot_inertia * r_b.cross(&p);
}

fn relative_velocity(bodies: &[BodyConstraint], vc: &VelocityConstraint, vcp: &VelocityConstraintPoint) -> Vec2 {
    let a = &bodies[vc.body_a];
    let b = &bodies[vc.body_b];
    b.velocity.linear + cross_sv(b.velocity.angular, vcp.r_b)
        - a.velocity.linear
        - cross_sv(a.velocity.angular, vcp.r_a)
}

/// Applies the constraint's accumulated impulses to its bodies
pub fn warm_start(vc: &VelocityConstraint, bodies: &mut [BodyConstraint]) {
    let tangent = vc.get_tangent();
    for vcp in &vc.points[..vc.point_count] {
        let p = vc.normal * vcp.normal_impulse + tangent * vcp.tangent_impulse;
        apply_impulse(bodies, vc, vcp.r_a, vcp.r_b, p);
    }
}

/// One Gauss-Seidel pass over a contact's friction and normal constraints.
/// Returns the largest incremental impulse applied.
pub fn solve_velocity_constraint(vc: &mut VelocityConstraint, bodies: &mut [BodyConstraint]) -> Real {
    let mut max_incremental: Real = 0.0;
    let normal = vc.normal;
    let tangent = vc.get_tangent();

    // Solve tangent constraints first because non-penetration is more
    // important than friction.
    for j in 0..vc.point_count {
        let vcp = vc.points[j];
        let dv = relative_velocity(bodies, vc, &vcp);

        // Compute tangent force
        let vt = dv.dot(&tangent) - vc.tangent_speed;
        let lambda = vcp.tangent_mass * -vt;

        // Clamp the accumulated force
        let max_friction = vc.friction * vcp.normal_impulse;
        let new_impulse = clamp(vcp.tangent_impulse + lambda, -max_friction, max_friction);
        let lambda = new_impulse - vcp.tangent_impulse;
        vc.points[j].tangent_impulse = new_impulse;
        max_incremental = max_incremental.max(lambda.abs());

        apply_impulse(bodies, vc, vcp.r_a, vcp.r_b, tangent * lambda);
    }

    if !vc.uses_block_solve() {
        for j in 0..vc.point_count {
            let vcp = vc.points[j];
            let dv = relative_velocity(bodies, vc, &vcp);

            // Compute normal impulse
            let vn = dv.dot(&normal);
            let lambda = -vcp.normal_mass * (vn - vcp.velocity_bias);

            // Clamp the accumulated impulse
            let new_impulse = (vcp.normal_impulse + lambda).max(0.0);
            let lambda = new_impulse - vcp.normal_impulse;
            vc.points[j].normal_impulse = new_impulse;
            max_incremental = max_incremental.max(lambda.abs());

            apply_impulse(bodies, vc, vcp.r_a, vcp.r_b, normal * lambda);
        }
        return max_incremental;
    }

    // Block solver developed in collaboration with Dirk Gregorius.
    //
    // Build the mini LCP for this contact patch
    //
    // vn = A * x + b, vn >= 0, x >= 0 and vn_i * x_i = 0 with i = 1..2
    //
    // A = J * W * JT and J = ( -n, -r1 x n, n, r2 x n )
    // b = vn0 - velocityBias
    //
    // The system is solved using the "Total enumeration method" (s. Murty).
    // The complementary constraint vn_i * x_i implies that we must have in
    // any solution either vn_i = 0 or x_i = 0. So for the 2D contact problem
    // the cases vn1 = 0 and vn2 = 0, x1 = 0 and x2 = 0, x1 = 0 and vn2 = 0,
    // x2 = 0 and vn1 = 0 need to be tested. The first valid solution that
    // satisfies the problem is chosen.
    //
    // In order to account for the accumulated impulse 'a' (because of the
    // iterative nature of the solver which only requires that the
    // accumulated impulse is clamped and not the incremental impulse) we
    // change the impulse variable (x_i).
    //
    // Substitute:
    //
    // x = a + d
    //
    // a := old total impulse
    // x := new total impulse
    // d := incremental impulse
    //
    // For the current iteration we extend the formula for the incremental
    // impulse to compute the new total impulse:
    //
    // vn = A * d + b
    //    = A * (x - a) + b
    //    = A * x + b - A * a
    //    = A * x + b'
    // b' = b - A * a
    let cp1 = vc.points[0];
    let cp2 = vc.points[1];

    let a = Vec2::new(cp1.normal_impulse, cp2.normal_impulse);
    debug_assert!(a.x >= 0.0 && a.y >= 0.0);

    // Compute normal velocity
    let vn1 = relative_velocity(bodies, vc, &cp1).dot(&normal);
    let vn2 = relative_velocity(bodies, vc, &cp2).dot(&normal);

    // Compute b'
    let b = Vec2::new(vn1 - cp1.velocity_bias, vn2 - cp2.velocity_bias) - vc.k * a;

    let x = {
        // Case 1: vn = 0
        //
        // 0 = A * x + b'
        //
        // Solve for x:
        //
        // x = - inv(A) * b'
        let x = -(vc.normal_mass * b);
        if x.x >= 0.0 && x.y >= 0.0 {
            Some(x)
        } else {
            // Case 2: vn1 = 0 and x2 = 0
            //
            //   0 = a11 * x1 + a12 * 0 + b1'
            // vn2 = a21 * x1 + a22 * 0 + b2'
            let x1 = -cp1.normal_mass * b.x;
            let vn2 = vc.k.ex.y * x1 + b.y;
            if x1 >= 0.0 && vn2 >= 0.0 {
                Some(Vec2::new(x1, 0.0))
            } else {
                // Case 3: vn2 = 0 and x1 = 0
                //
                // vn1 = a11 * 0 + a12 * x2 + b1'
                //   0 = a21 * 0 + a22 * x2 + b2'
                let x2 = -cp2.normal_mass * b.y;
                let vn1 = vc.k.ey.x * x2 + b.x;
                if x2 >= 0.0 && vn1 >= 0.0 {
                    Some(Vec2::new(0.0, x2))
                } else if b.x >= 0.0 && b.y >= 0.0 {
                    // Case 4: x1 = x2 = 0
                    //
                    // vn1 = b1
                    // vn2 = b2;
                    Some(Vec2::zero())
                } else {
                    // No solution, give up. This is hit sometimes, but it
                    // doesn't seem to matter.
                    None
                }
            }
        }
    };

    if let Some(x) = x {
        // Get the incremental impulse
        let d = x - a;

        // Apply incremental impulse
        apply_impulse(bodies, vc, cp1.r_a, cp1.r_b, normal * d.x);
        apply_impulse(bodies, vc, cp2.r_a, cp2.r_b, normal * d.y);

        // Accumulate
        vc.points[0].normal_impulse = x.x;
        vc.points[1].normal_impulse = x.y;
        max_incremental = max_incremental.max(d.x.abs()).max(d.y.abs());
    }

    max_incremental
}

/// Separation data of one manifold point at the bodies' current positions
struct PositionSolverManifold {
    normal: Vec2,
    point: Vec2,
    separation: Real,
}

impl PositionSolverManifold {
    fn new(pc: &PositionConstraint, a: &BodyConstraint, b: &BodyConstraint, index: usize) -> Self {
        let xf_a = a.get_transformation();
        let xf_b = b.get_transformation();
        let manifold = &pc.manifold;
        let total_radius = pc.radius_a + pc.radius_b;

        match manifold.get_type() {
            ManifoldType::Circles => {
                let point_a = xf_a.transform(manifold.get_local_point());
                let point_b = xf_b.transform(manifold.get_point(0).local_point);
                let delta = point_b - point_a;
                let normal = delta.get_unit_vector().map(|(n, _)| n).unwrap_or(Vec2::unit_x());
                Self {
                    normal,
                    point: (point_a + point_b) * 0.5,
                    separation: delta.dot(&normal) - total_radius,
                }
            }
            ManifoldType::FaceA => {
                let normal = manifold
                    .get_local_normal()
                    .map(|n| xf_a.q.rotate_unit(n).to_vec())
                    .unwrap_or(Vec2::unit_x());
                let plane_point = xf_a.transform(manifold.get_local_point());
                let clip_point = xf_b.transform(manifold.get_point(index).local_point);
                Self {
                    normal,
                    point: clip_point,
                    separation: (clip_point - plane_point).dot(&normal) - total_radius,
                }
            }
            ManifoldType::FaceB => {
                let normal = manifold
                    .get_local_normal()
                    .map(|n| xf_b.q.rotate_unit(n).to_vec())
                    .unwrap_or(Vec2::unit_x());
                let plane_point = xf_b.transform(manifold.get_local_point());
                let clip_point = xf_a.transform(manifold.get_point(index).local_point);
                // Ensure normal points from A to B
                Self {
                    normal: -normal,
                    point: clip_point,
                    separation: (clip_point - plane_point).dot(&normal) - total_radius,
                }
            }
            ManifoldType::Unset => Self { normal: Vec2::unit_x(), point: Vec2::zero(), separation: MAX_FLOAT },
        }
    }
}

/// One pass of position correction over a contact. Only bodies flagged
/// movable are moved. Returns the smallest separation found before the
/// corrections were applied, or `MAX_FLOAT` for a manifold without points.
pub fn solve_position_constraint(
    pc: &PositionConstraint,
    move_a: bool,
    move_b: bool,
    bodies: &mut [BodyConstraint],
    conf: &ConstraintSolverConf,
) -> Real {
    let mut min_separation = MAX_FLOAT;

    let (m_a, i_a) = if move_a {
        (bodies[pc.body_a].inv_mass, bodies[pc.body_a].inv_rot_inertia)
    } else {
        (0.0, 0.0)
    };
    let (m_b, i_b) = if move_b {
        (bodies[pc.body_b].inv_mass, bodies[pc.body_b].inv_rot_inertia)
    } else {
        (0.0, 0.0)
    };

    // Solve normal constraints
    for j in 0..pc.manifold.get_point_count() {
        let psm = PositionSolverManifold::new(pc, &bodies[pc.body_a], &bodies[pc.body_b], j);

        let r_a = psm.point - bodies[pc.body_a].position.linear;
        let r_b = psm.point - bodies[pc.body_b].position.linear;

        // Track max constraint error.
        min_separation = min_separation.min(psm.separation);

        // Prevent large corrections and allow slop.
        let c = clamp(
            conf.resolution_rate * (psm.separation + conf.linear_slop),
            -conf.max_linear_correction,
            0.0,
        );

        // Compute the effective mass.
        let rn_a = r_a.cross(&psm.normal);
        let rn_b = r_b.cross(&psm.normal);
        let k = m_a + m_b + i_a * rn_a * rn_a + i_b * rn_b * rn_b;

        // Compute normal impulse
        let impulse = if k > 0.0 { -c / k } else { 0.0 };
        let p = psm.normal * impulse;

        let a = &mut bodies[pc.body_a];
        a.position.linear -= p * m_a;
        a.position.angular -= i_a * r_a.cross(&p);

        let b = &mut bodies[pc.body_b];
        b.position.linear += p * m_b;
        b.position.angular += i_b * r_b.cross(&p);
    }

    min_separation
}

//! The step pipeline: island building, the regular sequential impulse
//! solve and continuous collision.

use std::collections::HashMap;
use std::mem;

use tracing::{debug, trace};

use crate::bodies::Body;
use crate::collision::contact_solver::{solve_position_constraint, solve_velocity_constraint, warm_start};
use crate::collision::{get_toi_via_sat, ContactImpulses, PositionConstraint, ToiState, VelocityConstraint};
use crate::constraints::{cap, BodyConstraint, BodyPair, Constraint, JointStepConf};
use crate::core::contact::{ContactFlags, ContactUpdateConf};
use crate::core::contacts::contact_update_conf;
use crate::core::listeners::fire_listener;
use crate::core::step_stats::IslandStats;
use crate::core::{
    BodyEvent, BodyEventType, BodyId, Contact, ContactId, ContactKey, Island, JointId, RegStepStats, StepConf,
    StepStats, ToiStepStats, World,
};
use crate::error::PhysicsError;
use crate::math::{Real, MAX_FLOAT};
use crate::Result;

/// Solver state of an island: the working copies of its bodies plus the
/// bodies it only references, and its contact and joint constraints
#[derive(Default)]
struct IslandSolver {
    bodies: Vec<BodyConstraint>,
    index_of: HashMap<BodyId, usize>,
    velocity_constraints: Vec<VelocityConstraint>,
    position_constraints: Vec<PositionConstraint>,
    joints: Vec<(JointId, BodyPair)>,
}

/// Scratch space of the step pipeline. The world keeps it between steps so
/// that stepping reuses its allocations.
#[derive(Default)]
pub(crate) struct StepBuffers {
    /// Proxy pairs found by the broad-phase
    pub(crate) pair_keys: Vec<ContactKey>,

    solver: IslandSolver,

    /// Traversal stack of island building
    stack: Vec<BodyId>,

    /// Bodies whose proxies need synchronizing after the regular phase
    moved: Vec<BodyId>,
}

impl IslandSolver {
    /// Empties the solver, keeping its buffers
    fn clear(&mut self) {
        self.bodies.clear();
        self.index_of.clear();
        self.velocity_constraints.clear();
        self.position_constraints.clear();
        self.joints.clear();
    }

    fn add_body(&mut self, id: BodyId, constraint: BodyConstraint) -> usize {
        let index = self.bodies.len();
        self.bodies.push(constraint);
        self.index_of.insert(id, index);
        index
    }

    /// Adds a body the island does not own. It takes part in the solve as
    /// if it had infinite mass and is never written back.
    fn add_reference(&mut self, id: BodyId, body: &Body) -> usize {
        if let Some(index) = self.index_of.get(&id) {
            return *index;
        }
        let constraint =
            BodyConstraint::new(0.0, 0.0, body.get_local_center(), body.get_sweep().pos1, body.get_velocity());
        self.add_body(id, constraint)
    }

    fn integrate_positions(&mut self, h: Real, conf: &StepConf) {
        let movement = conf.get_movement_conf();
        for constraint in &mut self.bodies {
            let velocity = cap(constraint.velocity, h, &movement);
            constraint.velocity = velocity;
            constraint.position.linear += velocity.linear * h;
            constraint.position.angular += velocity.angular * h;
        }
    }
}

fn body_constraint(body: &Body) -> BodyConstraint {
    BodyConstraint::new(
        body.get_inv_mass(),
        body.get_inv_rot_inertia(),
        body.get_local_center(),
        body.get_sweep().pos1,
        body.get_velocity(),
    )
}

impl World {
    /// Advances the world by `conf.delta_time`.
    ///
    /// Contacts are found and updated, islands are solved, and when
    /// enabled continuous collision runs on the fast movers. A zero time
    /// step only creates pending proxies and contacts. Fails with
    /// `WrongState` while the world is locked.
    pub fn step(&mut self, conf: &StepConf) -> Result<StepStats> {
        self.ensure_unlocked("step")?;
        if !conf.delta_time.is_finite() || conf.delta_time < 0.0 {
            return Err(PhysicsError::InvalidArgument(format!(
                "time step {} must be finite and non-negative",
                conf.delta_time
            )));
        }

        self.locked = true;
        self.events.clear();
        self.island_count = 0;
        let mut stats = StepStats::default();

        self.create_pending_proxies(conf.aabb_extension);
        stats.pre.proxies_moved = self.synchronize_moved_bodies(conf.aabb_extension);
        stats.pre.added = self.find_new_contacts();

        if conf.delta_time > 0.0 {
            let dt_ratio = conf.delta_time * self.inv_delta_time;
            self.inv_delta_time = conf.get_inv_delta_time();

            stats.pre.destroyed = self.destroy_stale_contacts();
            let update_conf = contact_update_conf(conf);
            self.update_contacts(&update_conf, &mut stats.pre);

            if self.step_complete {
                stats.reg = self.solve_reg(conf, dt_ratio);
            }
            if conf.do_toi {
                stats.toi = self.solve_toi(conf, &update_conf);
            } else {
                self.step_complete = true;
            }
        }

        self.locked = false;
        trace!(
            added = stats.pre.added,
            destroyed = stats.pre.destroyed,
            updated = stats.pre.updated,
            islands = stats.reg.islands_found,
            toi_events = stats.toi.contacts_found,
            "step finished"
        );
        Ok(stats)
    }

    // Regular phase

    fn solve_reg(&mut self, conf: &StepConf, dt_ratio: Real) -> RegStepStats {
        let mut stats = RegStepStats::default();
        self.islanded.reset(self.bodies.range(), self.contacts.range(), self.joints.range());
        let mut moved = mem::take(&mut self.buffers.moved);
        moved.clear();

        for index in 0..self.bodies.range() {
            let Some(seed) = self.bodies.id_at(index) else {
                continue;
            };
            if self.islanded.is_body(seed) {
                continue;
            }
            let Ok(body) = self.bodies.get(seed) else {
                continue;
            };
            if !body.is_speedable() || !body.is_awake() || !body.is_enabled() {
                continue;
            }

            if self.island_count == self.islands.len() {
                self.islands.push(Island::new());
            }
            let mut island = mem::take(&mut self.islands[self.island_count]);
            island.clear();
            self.build_island(seed, &mut island);
            stats.islands_found += 1;

            let result = self.solve_reg_island(&island, conf, dt_ratio);
            if result.solved {
                stats.islands_solved += 1;
            }
            stats.min_separation = stats.min_separation.min(result.min_separation);
            stats.max_inc_impulse = stats.max_inc_impulse.max(result.max_inc_impulse);
            stats.sum_pos_iters += result.position_iters;
            stats.sum_vel_iters += result.velocity_iters;
            stats.bodies_slept += result.bodies_slept;

            for &id in &island.bodies {
                match self.bodies.get(id) {
                    // Static bodies may join later islands.
                    Ok(body) if !body.is_speedable() => self.islanded.set_body(id, false),
                    Ok(_) => moved.push(id),
                    Err(_) => {}
                }
            }
            self.islands[self.island_count] = island;
            self.island_count += 1;
        }

        for &id in &moved {
            let Ok(body) = self.bodies.get(id) else {
                continue;
            };
            let sweep = body.get_sweep();
            let displacement = (sweep.pos1.linear - sweep.pos0.linear) * conf.displace_multiplier;
            stats.proxies_moved += self.synchronize_proxies(id, displacement, conf.aabb_extension);
        }
        moved.clear();
        self.buffers.moved = moved;

        stats.contacts_added = self.find_new_contacts();
        stats
    }

    /// Collects the bodies reachable from `seed` through enabled touching
    /// contacts and joints. Every body added is woken.
    fn build_island(&mut self, seed: BodyId, island: &mut Island) {
        let mut stack = mem::take(&mut self.buffers.stack);
        stack.clear();
        stack.push(seed);
        self.islanded.set_body(seed, true);

        while let Some(id) = stack.pop() {
            island.bodies.push(id);
            self.wake_body(id);

            let Ok(body) = self.bodies.get(id) else {
                continue;
            };
            // Islands do not propagate across bodies that contacts cannot move.
            if !body.is_accelerable() {
                continue;
            }

            for &contact_id in body.get_contacts() {
                if self.islanded.is_contact(contact_id) {
                    continue;
                }
                let Ok(contact) = self.contacts.get(contact_id) else {
                    continue;
                };
                if !contact.is_enabled() || !contact.is_touching() || contact.is_sensor() {
                    continue;
                }
                self.islanded.set_contact(contact_id, true);
                island.contacts.push(contact_id);

                let other = contact.get_other_body(id);
                if !self.islanded.is_body(other) {
                    self.islanded.set_body(other, true);
                    stack.push(other);
                }
            }

            for &joint_id in body.get_joints() {
                if self.islanded.is_joint(joint_id) {
                    continue;
                }
                let Ok(joint) = self.joints.get(joint_id) else {
                    continue;
                };
                match joint.get_other_body(id) {
                    Some(other) => {
                        if !self.bodies.get(other).map(|b| b.is_enabled()).unwrap_or(false) {
                            continue;
                        }
                        self.islanded.set_joint(joint_id, true);
                        island.joints.push(joint_id);
                        if !self.islanded.is_body(other) {
                            self.islanded.set_body(other, true);
                            stack.push(other);
                        }
                    }
                    None => {
                        self.islanded.set_joint(joint_id, true);
                        island.joints.push(joint_id);
                    }
                }
            }
        }
        self.buffers.stack = stack;
    }

    /// Builds the position and joint constraints of an island over the
    /// body constraints already in `solver`
    fn prepare_constraints(&self, island: &Island, solver: &mut IslandSolver) {
        // Bodies owned by another island still take part as references.
        for &contact_id in &island.contacts {
            let Ok(contact) = self.contacts.get(contact_id) else {
                continue;
            };
            for id in [contact.get_body_a(), contact.get_body_b()] {
                if let Ok(body) = self.bodies.get(id) {
                    solver.add_reference(id, body);
                }
            }
        }
        let mut anchorless: Option<usize> = None;
        for &joint_id in &island.joints {
            let Ok(joint) = self.joints.get(joint_id) else {
                continue;
            };
            let mut index = |id: Option<BodyId>| -> Option<usize> {
                match id {
                    Some(id) => self.bodies.get(id).ok().map(|body| solver.add_reference(id, body)),
                    None => Some(*anchorless.get_or_insert_with(|| {
                        let index = solver.bodies.len();
                        solver.bodies.push(BodyConstraint::default());
                        index
                    })),
                }
            };
            let (Some(a), Some(b)) = (index(joint.get_body_a()), index(joint.get_body_b())) else {
                continue;
            };
            solver.joints.push((joint_id, BodyPair { a, b }));
        }

        for &contact_id in &island.contacts {
            let Ok(contact) = self.contacts.get(contact_id) else {
                continue;
            };
            let Some((a, radius_a, b, radius_b)) = self.constraint_bodies(solver, contact) else {
                continue;
            };
            solver.position_constraints.push(PositionConstraint {
                manifold: *contact.get_manifold(),
                body_a: a,
                radius_a,
                body_b: b,
                radius_b,
            });
        }
    }

    /// Builds the velocity constraints of an island's contacts from the
    /// current positions of the bodies in `solver`
    fn prepare_velocity_constraints(
        &self,
        island: &Island,
        solver: &mut IslandSolver,
        conf: &StepConf,
        dt_ratio: Real,
        warm: bool,
    ) {
        let solver_conf = conf.get_contact_solver_conf(dt_ratio, warm);
        for (i, &contact_id) in island.contacts.iter().enumerate() {
            let Ok(contact) = self.contacts.get(contact_id) else {
                continue;
            };
            let Some((a, radius_a, b, radius_b)) = self.constraint_bodies(solver, contact) else {
                continue;
            };
            solver.velocity_constraints.push(VelocityConstraint::new(
                i,
                contact.get_manifold(),
                contact.get_friction(),
                contact.get_restitution(),
                contact.get_tangent_speed(),
                a,
                radius_a,
                b,
                radius_b,
                &solver.bodies,
                &solver_conf,
            ));
        }
    }

    /// Island-local indices and vertex radii of a contact's two sides
    fn constraint_bodies(&self, solver: &IslandSolver, contact: &Contact) -> Option<(usize, Real, usize, Real)> {
        let a = *solver.index_of.get(&contact.get_body_a())?;
        let b = *solver.index_of.get(&contact.get_body_b())?;
        let radius_a = self.shapes.get(contact.get_shape_a()).map(|s| s.get_vertex_radius()).unwrap_or(0.0);
        let radius_b = self.shapes.get(contact.get_shape_b()).map(|s| s.get_vertex_radius()).unwrap_or(0.0);
        Some((a, radius_a, b, radius_b))
    }

    fn joint_step_conf(conf: &StepConf, delta_time: Real, dt_ratio: Real, do_warm_start: bool) -> JointStepConf {
        JointStepConf {
            delta_time,
            inv_delta_time: if delta_time != 0.0 { 1.0 / delta_time } else { 0.0 },
            dt_ratio,
            do_warm_start,
            linear_slop: conf.linear_slop,
            angular_slop: conf.angular_slop,
            max_linear_correction: conf.max_linear_correction,
            max_angular_correction: conf.max_angular_correction,
        }
    }

    fn solve_reg_island(&mut self, island: &Island, conf: &StepConf, dt_ratio: Real) -> IslandStats {
        let h = conf.delta_time;
        let gravity = self.conf.gravity;
        let mut stats = IslandStats::default();
        let mut solver = mem::take(&mut self.buffers.solver);
        solver.clear();

        // Integrate velocities and start the sweeps at the current positions.
        for &id in &island.bodies {
            let Ok(body) = self.bodies.get_mut(id) else {
                continue;
            };
            let sweep = body.sweep_mut();
            sweep.pos0 = sweep.pos1;

            let mut constraint = body_constraint(body);
            if body.is_accelerable() {
                let v = &mut constraint.velocity;
                v.linear += (gravity + body.get_linear_acceleration()) * h;
                v.angular += body.get_angular_acceleration() * h;
                v.linear *= 1.0 / (1.0 + h * body.get_linear_damping());
                v.angular *= 1.0 / (1.0 + h * body.get_angular_damping());
            }
            solver.add_body(id, constraint);
        }
        let owned = solver.bodies.len();

        self.prepare_constraints(island, &mut solver);
        self.prepare_velocity_constraints(island, &mut solver, conf, dt_ratio, conf.do_warm_start);
        let joint_conf = Self::joint_step_conf(conf, h, dt_ratio, conf.do_warm_start);

        if conf.do_warm_start {
            for vc in &solver.velocity_constraints {
                warm_start(vc, &mut solver.bodies);
            }
        }
        for (joint_id, pair) in &solver.joints {
            if let Ok(joint) = self.joints.get_mut(*joint_id) {
                joint.init_velocity(&mut solver.bodies, *pair, &joint_conf);
            }
        }

        for i in 0..conf.reg_velocity_iterations {
            let mut joints_okay = true;
            for (joint_id, pair) in &solver.joints {
                if let Ok(joint) = self.joints.get_mut(*joint_id) {
                    joints_okay &= joint.solve_velocity(&mut solver.bodies, *pair, &joint_conf);
                }
            }
            let mut max_inc_impulse: Real = 0.0;
            for vc in &mut solver.velocity_constraints {
                max_inc_impulse = max_inc_impulse.max(solve_velocity_constraint(vc, &mut solver.bodies));
            }
            stats.max_inc_impulse = stats.max_inc_impulse.max(max_inc_impulse);
            stats.velocity_iters = i + 1;
            if joints_okay && max_inc_impulse <= conf.reg_min_momentum {
                break;
            }
        }

        solver.integrate_positions(h, conf);

        let position_conf = conf.get_reg_constraint_solver_conf();
        for i in 0..conf.reg_position_iterations {
            let mut min_separation = MAX_FLOAT;
            for pc in &solver.position_constraints {
                min_separation =
                    min_separation.min(solve_position_constraint(pc, true, true, &mut solver.bodies, &position_conf));
            }
            let mut joints_okay = true;
            for (joint_id, pair) in &solver.joints {
                if let Ok(joint) = self.joints.get(*joint_id) {
                    joints_okay &= joint.solve_position(&mut solver.bodies, *pair, &joint_conf);
                }
            }
            stats.min_separation = min_separation;
            stats.position_iters = i + 1;
            if min_separation >= conf.reg_min_separation && joints_okay {
                stats.solved = true;
                break;
            }
        }

        // Store impulses for warm starting.
        for vc in &solver.velocity_constraints {
            let Ok(contact) = self.contacts.get_mut(island.contacts[vc.contact_index]) else {
                continue;
            };
            let manifold = contact.get_manifold_mut();
            for j in 0..vc.get_point_count() {
                let point = vc.get_point(j);
                manifold.set_point_impulses(j, point.normal_impulse, point.tangent_impulse);
            }
        }

        self.write_back(&island.bodies, &solver.bodies[..owned]);

        for vc in &solver.velocity_constraints {
            let impulses = ContactImpulses::from_constraint(vc);
            fire_listener!(self, post_solve, island.contacts[vc.contact_index], &impulses, stats.position_iters);
        }

        self.buffers.solver = solver;

        if conf.allow_sleep {
            stats.bodies_slept = self.sleep_island(island, stats.solved, conf);
        }
        stats
    }

    /// Copies solved positions and velocities to the non-static bodies and
    /// flags their contacts for updating
    fn write_back(&mut self, ids: &[BodyId], constraints: &[BodyConstraint]) {
        for (id, constraint) in ids.iter().zip(constraints) {
            let Ok(body) = self.bodies.get_mut(*id) else {
                continue;
            };
            if !body.is_speedable() {
                continue;
            }
            body.sweep_mut().pos1 = constraint.position;
            body.synchronize_transform();
            body.set_solved_velocity(constraint.velocity);
            for contact_id in body.get_contacts() {
                if let Ok(contact) = self.contacts.get_mut(*contact_id) {
                    contact.set_flag(ContactFlags::NEEDS_UPDATING, true);
                }
            }
        }
    }

    /// Advances the bodies' still times and puts the island to sleep once
    /// all of them stayed still long enough. Returns the number of bodies
    /// put to sleep.
    fn sleep_island(&mut self, island: &Island, solved: bool, conf: &StepConf) -> u32 {
        let linear_tolerance_squared = conf.linear_sleep_tolerance * conf.linear_sleep_tolerance;
        let angular_tolerance_squared = conf.angular_sleep_tolerance * conf.angular_sleep_tolerance;

        let mut min_still_time = MAX_FLOAT;
        for &id in &island.bodies {
            let Ok(body) = self.bodies.get_mut(id) else {
                continue;
            };
            if !body.is_speedable() {
                continue;
            }
            let v = body.get_velocity();
            if !body.is_sleeping_allowed()
                || v.angular * v.angular > angular_tolerance_squared
                || v.linear.length_squared() > linear_tolerance_squared
            {
                body.set_under_active_time(0.0);
                min_still_time = 0.0;
            } else {
                let time = body.get_under_active_time() + conf.delta_time;
                body.set_under_active_time(time);
                min_still_time = min_still_time.min(time);
            }
        }

        if !solved || min_still_time < conf.min_still_time_to_sleep {
            return 0;
        }

        let mut slept = 0;
        for &id in &island.bodies {
            let Ok(body) = self.bodies.get_mut(id) else {
                continue;
            };
            if body.is_speedable() && body.is_awake() {
                body.unset_awake();
                self.events.add_body_event(BodyEvent { event_type: BodyEventType::Sleep, body: id });
                slept += 1;
            }
        }
        debug!(bodies = slept, "island went to sleep");
        slept
    }

    // Continuous phase

    fn solve_toi(&mut self, conf: &StepConf, update_conf: &ContactUpdateConf) -> ToiStepStats {
        let mut stats = ToiStepStats::default();

        if self.step_complete {
            for (_, body) in self.bodies.iter_mut() {
                body.sweep_mut().alpha0 = 0.0;
            }
            for (_, contact) in self.contacts.iter_mut() {
                contact.unset_toi();
                contact.reset_toi_count();
            }
        }
        self.islanded.reset(self.bodies.range(), self.contacts.range(), self.joints.range());

        loop {
            let Some((contact_id, toi)) = self.update_contact_tois(conf, &mut stats) else {
                self.step_complete = true;
                break;
            };
            stats.contacts_found += 1;
            self.solve_toi_contact(contact_id, toi, conf, update_conf, &mut stats);

            if conf.sub_stepping {
                self.step_complete = false;
                break;
            }
        }

        if stats.contacts_at_max_sub_steps > 0 {
            debug!(contacts = stats.contacts_at_max_sub_steps, "contacts reached the sub-step limit");
        }
        stats
    }

    /// Computes the missing times of impact and returns the soonest
    /// contact impacting within the step
    fn update_contact_tois(&mut self, conf: &StepConf, stats: &mut ToiStepStats) -> Option<(ContactId, Real)> {
        let toi_conf = conf.get_toi_conf();
        let mut soonest: Option<(ContactId, Real)> = None;

        for index in 0..self.contacts.range() {
            let Some(id) = self.contacts.id_at(index) else {
                continue;
            };
            let Ok(contact) = self.contacts.get(id) else {
                continue;
            };
            if !contact.is_enabled() || contact.is_sensor() || !contact.is_impenetrable() {
                continue;
            }
            if contact.get_toi_count() >= conf.max_sub_steps {
                stats.contacts_at_max_sub_steps += 1;
                continue;
            }

            let toi = if contact.has_valid_toi() {
                contact.get_toi()
            } else {
                let (body_a, body_b) = (contact.get_body_a(), contact.get_body_b());
                let (Ok(ba), Ok(bb)) = (self.bodies.get(body_a), self.bodies.get(body_b)) else {
                    continue;
                };
                let active_a = ba.is_awake() && ba.is_speedable();
                let active_b = bb.is_awake() && bb.is_speedable();
                if !active_a && !active_b {
                    continue;
                }
                let (Ok(shape_a), Ok(shape_b)) =
                    (self.shapes.get(contact.get_shape_a()), self.shapes.get(contact.get_shape_b()))
                else {
                    continue;
                };
                let proxy_a = shape_a.get_child(contact.get_child_a());
                let proxy_b = shape_b.get_child(contact.get_child_b());

                // Put the sweeps onto the same time interval.
                let alpha0 = ba.get_sweep().alpha0.max(bb.get_sweep().alpha0);
                let mut sweep_a = *ba.get_sweep();
                let mut sweep_b = *bb.get_sweep();
                if sweep_a.alpha0 < alpha0 {
                    sweep_a.advance0(alpha0);
                    if let Ok(body) = self.bodies.get_mut(body_a) {
                        body.set_sweep(sweep_a);
                    }
                }
                if sweep_b.alpha0 < alpha0 {
                    sweep_b.advance0(alpha0);
                    if let Ok(body) = self.bodies.get_mut(body_b) {
                        body.set_sweep(sweep_b);
                    }
                }

                let output = get_toi_via_sat(&proxy_a, &sweep_a, &proxy_b, &sweep_b, toi_conf);
                stats.max_dist_iters = stats.max_dist_iters.max(output.stats.max_dist_iters);
                stats.max_toi_iters = stats.max_toi_iters.max(output.stats.toi_iters);
                stats.max_root_iters = stats.max_root_iters.max(output.stats.max_root_iters);

                let toi = match output.state {
                    ToiState::Touching => (alpha0 + (1.0 - alpha0) * output.time).min(1.0),
                    ToiState::Separated => 1.0,
                    state => {
                        debug!(contact = ?id, ?state, "time of impact not found");
                        1.0
                    }
                };
                if let Ok(contact) = self.contacts.get_mut(id) {
                    contact.set_toi(toi);
                }
                stats.contacts_updated_toi += 1;
                toi
            };

            if toi < soonest.map(|(_, t)| t).unwrap_or(1.0) {
                soonest = Some((id, toi));
            }
        }

        soonest.filter(|(_, toi)| *toi < 1.0 - 10.0 * Real::EPSILON)
    }

    /// Moves the two bodies of a contact to its time of impact, solves the
    /// contacts they make there and integrates them over the rest of the
    /// step
    fn solve_toi_contact(
        &mut self,
        contact_id: ContactId,
        toi: Real,
        conf: &StepConf,
        update_conf: &ContactUpdateConf,
        stats: &mut ToiStepStats,
    ) {
        let Ok(contact) = self.contacts.get(contact_id) else {
            return;
        };
        let (body_a, body_b) = (contact.get_body_a(), contact.get_body_b());
        let (Ok(ba), Ok(bb)) = (self.bodies.get(body_a), self.bodies.get(body_b)) else {
            return;
        };
        let backup_a = *ba.get_sweep();
        let backup_b = *bb.get_sweep();

        for id in [body_a, body_b] {
            if let Ok(body) = self.bodies.get_mut(id) {
                body.advance(toi);
            }
        }

        // The contact likely has new points at the time of impact.
        let touching = self.update_contact(contact_id, update_conf);
        stats.contacts_updated_touching += 1;
        let Ok(contact) = self.contacts.get_mut(contact_id) else {
            return;
        };
        contact.unset_toi();
        contact.increment_toi_count();

        if !touching || !contact.is_enabled() {
            contact.set_flag(ContactFlags::ENABLED, false);
            for (id, backup) in [(body_a, backup_a), (body_b, backup_b)] {
                if let Ok(body) = self.bodies.get_mut(id) {
                    body.set_sweep(backup);
                }
            }
            return;
        }

        self.wake_body(body_a);
        self.wake_body(body_b);

        let mut island = mem::take(&mut self.island);
        island.clear();
        island.bodies.extend([body_a, body_b]);
        island.contacts.push(contact_id);
        self.islanded.set_body(body_a, true);
        self.islanded.set_body(body_b, true);
        self.islanded.set_contact(contact_id, true);

        for id in [body_a, body_b] {
            self.gather_toi_partners(id, toi, &mut island, update_conf, stats);
        }

        stats.islands_found += 1;
        self.solve_toi_island(&island, toi, conf, stats);

        // Reset the marks and invalidate the times of impact of everything
        // that moved.
        for &id in &island.bodies {
            self.islanded.set_body(id, false);
            let Ok(body) = self.bodies.get(id) else {
                continue;
            };
            if !body.is_accelerable() {
                continue;
            }
            let sweep = body.get_sweep();
            let displacement = (sweep.pos1.linear - sweep.pos0.linear) * conf.displace_multiplier;
            stats.proxies_moved += self.synchronize_proxies(id, displacement, conf.aabb_extension);

            let Ok(body) = self.bodies.get(id) else {
                continue;
            };
            for other in body.get_contacts() {
                if let Ok(contact) = self.contacts.get_mut(*other) {
                    contact.unset_toi();
                }
                self.islanded.set_contact(*other, false);
            }
        }
        for &id in &island.contacts {
            self.islanded.set_contact(id, false);
        }
        self.island = island;

        // Commit fixture proxy movements to the broad-phase so that new
        // contacts are created.
        stats.contacts_added += self.find_new_contacts();
    }

    /// Adds the impenetrable partners of a TOI body, advanced to the time
    /// of impact, to the island
    fn gather_toi_partners(
        &mut self,
        id: BodyId,
        toi: Real,
        island: &mut Island,
        update_conf: &ContactUpdateConf,
        stats: &mut ToiStepStats,
    ) {
        let Ok(body) = self.bodies.get(id) else {
            return;
        };
        if !body.is_accelerable() {
            return;
        }
        let bullet = body.is_bullet();
        let count = body.get_contacts().len();

        // Updating contacts never changes a body's contact list.
        for i in 0..count {
            let Some(contact_id) = self.bodies.get(id).ok().and_then(|b| b.get_contacts().get(i).copied()) else {
                break;
            };
            if self.islanded.is_contact(contact_id) {
                stats.contacts_skipped_touching += 1;
                continue;
            }
            let Ok(contact) = self.contacts.get(contact_id) else {
                continue;
            };
            if contact.is_sensor() || !contact.is_enabled() {
                continue;
            }
            let other = contact.get_other_body(id);
            let Ok(other_body) = self.bodies.get(other) else {
                continue;
            };
            // Dynamic partners only join through bullets.
            if other_body.is_accelerable() && !bullet && !other_body.is_bullet() {
                continue;
            }

            let backup = *other_body.get_sweep();
            let other_islanded = self.islanded.is_body(other);
            if !other_islanded {
                if let Ok(other_body) = self.bodies.get_mut(other) {
                    other_body.advance(toi);
                }
            }

            let touching = self.update_contact(contact_id, update_conf);
            stats.contacts_updated_touching += 1;
            let enabled = self.contacts.get(contact_id).map(|c| c.is_enabled()).unwrap_or(false);
            if !touching || !enabled {
                if let Ok(other_body) = self.bodies.get_mut(other) {
                    other_body.set_sweep(backup);
                }
                continue;
            }

            self.islanded.set_contact(contact_id, true);
            island.contacts.push(contact_id);
            if other_islanded {
                continue;
            }
            self.islanded.set_body(other, true);
            self.wake_body(other);
            island.bodies.push(other);
        }
    }

    fn solve_toi_island(&mut self, island: &Island, toi: Real, conf: &StepConf, stats: &mut ToiStepStats) {
        let h = (1.0 - toi) * conf.delta_time;
        let mut solver = mem::take(&mut self.buffers.solver);
        solver.clear();
        for &id in &island.bodies {
            if let Ok(body) = self.bodies.get(id) {
                solver.add_body(id, body_constraint(body));
            }
        }
        let owned = solver.bodies.len();
        self.prepare_constraints(island, &mut solver);

        // Only the two bodies of the impact are moved into a safe state.
        let position_conf = conf.get_toi_constraint_solver_conf();
        let mut solved = false;
        let mut position_iters = 0;
        while position_iters < conf.toi_position_iterations {
            let mut min_separation = MAX_FLOAT;
            for pc in &solver.position_constraints {
                let move_a = pc.body_a < 2;
                let move_b = pc.body_b < 2;
                min_separation = min_separation
                    .min(solve_position_constraint(pc, move_a, move_b, &mut solver.bodies, &position_conf));
            }
            stats.min_separation = stats.min_separation.min(min_separation);
            position_iters += 1;
            if min_separation >= conf.toi_min_separation {
                solved = true;
                break;
            }
        }
        stats.sum_pos_iters += position_iters;
        if solved {
            stats.islands_solved += 1;
        }

        // Leap of faith to the new safe state.
        for (id, constraint) in island.bodies.iter().zip(&solver.bodies).take(2) {
            if let Ok(body) = self.bodies.get_mut(*id) {
                body.sweep_mut().pos0 = constraint.position;
            }
        }

        // The velocity constraints see the corrected positions. Warm
        // starting impulses were applied by the regular phase.
        self.prepare_velocity_constraints(island, &mut solver, conf, 1.0, false);
        for _ in 0..conf.toi_velocity_iterations {
            let mut max_inc_impulse: Real = 0.0;
            for vc in &mut solver.velocity_constraints {
                max_inc_impulse = max_inc_impulse.max(solve_velocity_constraint(vc, &mut solver.bodies));
            }
            stats.max_inc_impulse = stats.max_inc_impulse.max(max_inc_impulse);
            stats.sum_vel_iters += 1;
        }

        solver.integrate_positions(h, conf);
        self.write_back(&island.bodies, &solver.bodies[..owned]);

        for vc in &solver.velocity_constraints {
            let impulses = ContactImpulses::from_constraint(vc);
            fire_listener!(self, post_solve, island.contacts[vc.contact_index], &impulses, position_iters);
        }
        self.buffers.solver = solver;
    }
}

//! Sequential impulse solver
//!
//! One world step is split into substeps so no body travels more than half
//! a bubble radius per substep. Each substep:
//! 1. Integrate velocities (gravity, damping)
//! 2. Find contacts
//! 3. Solve velocity constraints (friction, then normal with restitution)
//! 4. Integrate positions
//! 5. Push overlapping bodies apart (Baumgarte position correction)

use glam::Vec2;

use super::body::{Body, Material, Shape};
use super::collision::{CollisionResult, circle_circle, circle_edge};
use crate::consts::MAX_SUBSTEPS;

/// Approach speed (m/s) below which contacts are inelastic
const VELOCITY_THRESHOLD: f32 = 0.5;
/// Allowed overlap (m) before position correction kicks in
const LINEAR_SLOP: f32 = 0.0005;
/// Fraction of the overlap removed per position iteration
const BAUMGARTE: f32 = 0.2;
/// Largest position correction per iteration (m)
const MAX_LINEAR_CORRECTION: f32 = 0.01;
/// Max travel per substep as a fraction of the smallest bubble radius
const MAX_TRAVEL_FRACTION: f32 = 0.5;

#[derive(Debug, Clone, Copy)]
pub struct SolverConfig {
    pub velocity_iterations: u32,
    pub position_iterations: u32,
}

/// A touching fixture pair. Normal points from body `a` to body `b`;
/// `b` is always the circle.
#[derive(Debug, Clone)]
struct Contact {
    a: usize,
    fixture_a: usize,
    b: usize,
    fixture_b: usize,
    normal: Vec2,
    point: Vec2,
    friction: f32,
    restitution: f32,
    ra: Vec2,
    rb: Vec2,
    normal_mass: f32,
    tangent_mass: f32,
    velocity_bias: f32,
    normal_impulse: f32,
    tangent_impulse: f32,
}

/// Angular velocity `w` crossed with offset `r`
#[inline]
fn cross_sv(w: f32, r: Vec2) -> Vec2 {
    r.perp() * w
}

#[inline]
fn tangent_of(normal: Vec2) -> Vec2 {
    Vec2::new(normal.y, -normal.x)
}

/// Number of substeps needed so nothing moves more than half the smallest
/// bubble radius per substep
pub fn substeps_for(bodies: &[Body], gravity: Vec2, dt: f32) -> u32 {
    let min_radius = bodies
        .iter()
        .filter(|b| b.is_dynamic())
        .map(|b| b.circle_radius())
        .filter(|r| *r > 0.0)
        .fold(f32::INFINITY, f32::min);
    if !min_radius.is_finite() {
        return 1;
    }

    let max_travel = bodies
        .iter()
        .map(|b| {
            let speed = if b.is_dynamic() {
                b.linear_velocity.length() + gravity.length() * dt
            } else {
                b.linear_velocity.length()
            };
            speed * dt
        })
        .fold(0.0, f32::max);

    let needed = (max_travel / (min_radius * MAX_TRAVEL_FRACTION)).ceil();
    if needed.is_finite() {
        (needed as u32).clamp(1, MAX_SUBSTEPS)
    } else {
        MAX_SUBSTEPS
    }
}

/// Advance all bodies by `dt`. Returns the substep count used.
pub fn advance(bodies: &mut [Body], gravity: Vec2, dt: f32, config: SolverConfig) -> u32 {
    let substeps = substeps_for(bodies, gravity, dt);
    let h = dt / substeps as f32;

    for _ in 0..substeps {
        integrate_velocities(bodies, gravity, h);

        let mut contacts = find_contacts(bodies);
        prepare_contacts(bodies, &mut contacts);
        for _ in 0..config.velocity_iterations {
            solve_velocities(bodies, &mut contacts);
        }

        integrate_positions(bodies, h);

        for _ in 0..config.position_iterations {
            solve_positions(bodies, &contacts);
        }
    }

    substeps
}

fn integrate_velocities(bodies: &mut [Body], gravity: Vec2, h: f32) {
    for body in bodies.iter_mut().filter(|b| b.is_dynamic()) {
        body.linear_velocity += gravity * h;
        // Pade approximation of exp(-damping * h), stable for large damping
        body.linear_velocity *= 1.0 / (1.0 + h * body.linear_damping);
    }
}

fn integrate_positions(bodies: &mut [Body], h: f32) {
    for body in bodies.iter_mut() {
        body.position += body.linear_velocity * h;
        body.angle += body.angular_velocity * h;
    }
}

/// Test one fixture pair in current positions. The normal points toward
/// body `b`, which must own the circle.
fn collide(bodies: &[Body], a: usize, fixture_a: usize, b: usize, fixture_b: usize) -> CollisionResult {
    let body_a = &bodies[a];
    let body_b = &bodies[b];
    let Shape::Circle { radius: radius_b } = body_b.fixtures[fixture_b].shape else {
        return CollisionResult::miss();
    };

    match body_a.fixtures[fixture_a].shape {
        Shape::Circle { radius } => {
            circle_circle(body_a.position, radius, body_b.position, radius_b)
        }
        Shape::Edge { a: ea, b: eb } => circle_edge(
            body_b.position,
            radius_b,
            body_a.world_point(ea),
            body_a.world_point(eb),
        ),
    }
}

fn find_contacts(bodies: &[Body]) -> Vec<Contact> {
    let mut contacts = Vec::new();

    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            if !bodies[i].is_dynamic() && !bodies[j].is_dynamic() {
                continue;
            }
            for fi in 0..bodies[i].fixtures.len() {
                for fj in 0..bodies[j].fixtures.len() {
                    // Orient so `b` owns the circle
                    let (a, fixture_a, b, fixture_b) =
                        match (bodies[i].fixtures[fi].shape, bodies[j].fixtures[fj].shape) {
                            (_, Shape::Circle { .. }) => (i, fi, j, fj),
                            (Shape::Circle { .. }, Shape::Edge { .. }) => (j, fj, i, fi),
                            (Shape::Edge { .. }, Shape::Edge { .. }) => continue,
                        };

                    let result = collide(bodies, a, fixture_a, b, fixture_b);
                    if !result.hit {
                        continue;
                    }

                    let mat_a = &bodies[a].fixtures[fixture_a].material;
                    let mat_b = &bodies[b].fixtures[fixture_b].material;
                    contacts.push(Contact {
                        a,
                        fixture_a,
                        b,
                        fixture_b,
                        normal: result.normal,
                        point: result.point,
                        friction: Material::mix_friction(mat_a, mat_b),
                        restitution: Material::mix_restitution(mat_a, mat_b),
                        ra: Vec2::ZERO,
                        rb: Vec2::ZERO,
                        normal_mass: 0.0,
                        tangent_mass: 0.0,
                        velocity_bias: 0.0,
                        normal_impulse: 0.0,
                        tangent_impulse: 0.0,
                    });
                }
            }
        }
    }

    contacts
}

fn prepare_contacts(bodies: &[Body], contacts: &mut [Contact]) {
    for c in contacts.iter_mut() {
        let body_a = &bodies[c.a];
        let body_b = &bodies[c.b];
        let (ima, iia) = (body_a.inv_mass(), body_a.inv_inertia());
        let (imb, iib) = (body_b.inv_mass(), body_b.inv_inertia());

        c.ra = c.point - body_a.position;
        c.rb = c.point - body_b.position;

        let rna = c.ra.perp_dot(c.normal);
        let rnb = c.rb.perp_dot(c.normal);
        let k_normal = ima + imb + iia * rna * rna + iib * rnb * rnb;
        c.normal_mass = if k_normal > 0.0 { 1.0 / k_normal } else { 0.0 };

        let tangent = tangent_of(c.normal);
        let rta = c.ra.perp_dot(tangent);
        let rtb = c.rb.perp_dot(tangent);
        let k_tangent = ima + imb + iia * rta * rta + iib * rtb * rtb;
        c.tangent_mass = if k_tangent > 0.0 { 1.0 / k_tangent } else { 0.0 };

        let dv = body_b.linear_velocity + cross_sv(body_b.angular_velocity, c.rb)
            - body_a.linear_velocity
            - cross_sv(body_a.angular_velocity, c.ra);
        let vn = dv.dot(c.normal);
        c.velocity_bias = if vn < -VELOCITY_THRESHOLD {
            -c.restitution * vn
        } else {
            0.0
        };
    }
}

fn solve_velocities(bodies: &mut [Body], contacts: &mut [Contact]) {
    for c in contacts.iter_mut() {
        let (mut va, mut wa, ima, iia) = {
            let body = &bodies[c.a];
            (
                body.linear_velocity,
                body.angular_velocity,
                body.inv_mass(),
                body.inv_inertia(),
            )
        };
        let (mut vb, mut wb, imb, iib) = {
            let body = &bodies[c.b];
            (
                body.linear_velocity,
                body.angular_velocity,
                body.inv_mass(),
                body.inv_inertia(),
            )
        };

        let tangent = tangent_of(c.normal);

        // Friction first so the normal constraint has the last word
        let dv = vb + cross_sv(wb, c.rb) - va - cross_sv(wa, c.ra);
        let vt = dv.dot(tangent);
        let max_friction = c.friction * c.normal_impulse;
        let new_impulse =
            (c.tangent_impulse - c.tangent_mass * vt).clamp(-max_friction, max_friction);
        let lambda = new_impulse - c.tangent_impulse;
        c.tangent_impulse = new_impulse;
        let p = tangent * lambda;
        va -= p * ima;
        wa -= iia * c.ra.perp_dot(p);
        vb += p * imb;
        wb += iib * c.rb.perp_dot(p);

        let dv = vb + cross_sv(wb, c.rb) - va - cross_sv(wa, c.ra);
        let vn = dv.dot(c.normal);
        let new_impulse = (c.normal_impulse - c.normal_mass * (vn - c.velocity_bias)).max(0.0);
        let lambda = new_impulse - c.normal_impulse;
        c.normal_impulse = new_impulse;
        let p = c.normal * lambda;
        va -= p * ima;
        wa -= iia * c.ra.perp_dot(p);
        vb += p * imb;
        wb += iib * c.rb.perp_dot(p);

        let body = &mut bodies[c.a];
        body.linear_velocity = va;
        body.angular_velocity = wa;
        let body = &mut bodies[c.b];
        body.linear_velocity = vb;
        body.angular_velocity = wb;
    }
}

fn solve_positions(bodies: &mut [Body], contacts: &[Contact]) {
    for c in contacts {
        let result = collide(bodies, c.a, c.fixture_a, c.b, c.fixture_b);
        if !result.hit {
            continue;
        }
        let ima = bodies[c.a].inv_mass();
        let imb = bodies[c.b].inv_mass();
        let k = ima + imb;
        if k <= 0.0 {
            continue;
        }

        let correction =
            (BAUMGARTE * (LINEAR_SLOP - result.penetration)).clamp(-MAX_LINEAR_CORRECTION, 0.0);
        let p = result.normal * (-correction / k);
        bodies[c.a].position -= p * ima;
        bodies[c.b].position += p * imb;
    }
}

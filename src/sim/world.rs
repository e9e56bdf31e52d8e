//! The physics world
//!
//! Owns every rigid body plus the barrier/bubble entities they mirror.
//! Bodies reference their entity through [`BodyOwner`]; entities never hold
//! bodies.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::body::{Body, BodyDef, BodyHandle, BodyKind, BodyOwner, Fixture, Material, Shape};
use super::solver::{self, SolverConfig};
use super::state::{Barrier, Bubble, BubbleId, BubblePose, Frame};
use crate::error::SimError;
use crate::tuning::Tuning;
use crate::Scale;

/// Rigid-body world holding one barrier and any number of bubbles.
///
/// `H` is the caller's visual handle type carried by each bubble.
#[derive(Debug)]
pub struct PhysicsWorld<H> {
    pub(crate) tuning: Tuning,
    pub(crate) scale: Scale,
    /// m/s²
    pub(crate) gravity: Vec2,
    pub(crate) bodies: Vec<Body>,
    pub(crate) barrier_body: Option<BodyHandle>,
    pub(crate) barrier: Option<Barrier>,
    /// Indexed by `BubbleId`
    pub(crate) bubbles: Vec<Bubble<H>>,
    rng: Pcg32,
    /// Completed ticks
    pub(crate) time_ticks: u64,
}

impl<H> PhysicsWorld<H> {
    /// Create an empty world. Fails if the tuning does not validate.
    pub fn new(tuning: Tuning) -> Result<Self, SimError> {
        tuning.validate()?;
        let seed = tuning.seed.unwrap_or_else(rand::random);
        log::debug!("Physics world created (seed {})", seed);
        Ok(Self {
            scale: tuning.scale(),
            gravity: tuning.gravity,
            tuning,
            bodies: Vec::new(),
            barrier_body: None,
            barrier: None,
            bubbles: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            time_ticks: 0,
        })
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Current gravity (m/s²)
    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn barrier(&self) -> Option<&Barrier> {
        self.barrier.as_ref()
    }

    pub fn bubble(&self, id: BubbleId) -> Option<&Bubble<H>> {
        self.bubbles.get(id.0 as usize)
    }

    /// Bubbles in creation order
    pub fn bubbles(&self) -> impl Iterator<Item = (BubbleId, &Bubble<H>)> {
        self.bubbles
            .iter()
            .enumerate()
            .map(|(i, b)| (BubbleId(i as u32), b))
    }

    pub fn bubble_count(&self) -> usize {
        self.bubbles.len()
    }

    /// Completed ticks since creation
    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    /// Velocity currently commanded to the barrier body (m/s)
    pub fn barrier_velocity(&self) -> Option<Vec2> {
        self.barrier_body
            .map(|handle| self.bodies[handle.0].linear_velocity)
    }

    fn material(&self) -> Material {
        Material {
            friction: self.tuning.friction,
            restitution: self.tuning.restitution,
            density: self.tuning.density,
        }
    }

    fn insert_body(&mut self, body: Body) -> BodyHandle {
        self.bodies.push(body);
        BodyHandle(self.bodies.len() - 1)
    }

    /// Create the kinematic container body. A second call is ignored.
    ///
    /// The body gets left, right and bottom edges; the top stays open so
    /// bubbles can drop in.
    pub fn init_barrier(&mut self, barrier: Barrier) {
        if self.barrier_body.is_some() {
            log::debug!("Barrier already initialized, ignoring");
            return;
        }

        let half = self.scale.vec_to_meters(barrier.half_extents());
        let mut body = Body::new(BodyDef {
            kind: BodyKind::Kinematic,
            position: self.scale.vec_to_meters(barrier.center()),
            angle: 0.0,
            linear_damping: 0.0,
            owner: BodyOwner::Barrier,
        });

        let material = self.material();
        let edges = [
            // Left
            (Vec2::new(-half.x, half.y), Vec2::new(-half.x, -half.y)),
            // Right
            (Vec2::new(half.x, -half.y), Vec2::new(half.x, half.y)),
            // Bottom
            (Vec2::new(half.x, half.y), Vec2::new(-half.x, half.y)),
        ];
        for (a, b) in edges {
            body.add_fixture(Fixture {
                shape: Shape::Edge { a, b },
                material,
            });
        }

        log::info!(
            "Barrier {}x{} at ({}, {})",
            barrier.width(),
            barrier.height(),
            barrier.center().x,
            barrier.center().y
        );
        self.barrier_body = Some(self.insert_body(body));
        self.barrier = Some(barrier);
    }

    /// Drop a new bubble in through the open top of the barrier.
    ///
    /// X is uniformly random across the barrier width (minus the bubble's
    /// diameter), Y is one radius above the world origin. The bubble gets a
    /// one-time kick with a random horizontal component.
    pub fn create_bubble(&mut self, bubble: Bubble<H>) -> Result<BubbleId, SimError> {
        let barrier = self.barrier.as_ref().ok_or(SimError::UninitializedBarrier)?;
        if bubble.radius() * 2.0 > barrier.width() {
            return Err(SimError::BubbleTooLarge {
                radius: bubble.radius(),
                barrier_width: barrier.width(),
            });
        }

        let id = BubbleId(self.bubbles.len() as u32);
        let spawn_x = barrier.spawn_x(bubble.radius(), self.rng.random::<f32>());
        let radius = self.scale.to_meters(bubble.radius());
        let position = Vec2::new(self.scale.to_meters(spawn_x), -radius);

        let mut body = Body::new(BodyDef {
            kind: BodyKind::Dynamic,
            position,
            angle: 0.0,
            linear_damping: self.tuning.linear_damping,
            owner: BodyOwner::Bubble(id),
        });
        body.add_fixture(Fixture {
            shape: Shape::Circle { radius },
            material: self.material(),
        });

        // Give the body an initial speed
        let magnitude = self.tuning.initial_impulse;
        let impulse = Vec2::new(
            (self.rng.random::<f32>() * 2.0 - 1.0) * magnitude,
            magnitude,
        );
        body.apply_linear_impulse(impulse);

        log::debug!(
            "Created {} r={} at ({:.4}, {:.4}) m, impulse {:?}",
            id,
            bubble.radius(),
            position.x,
            position.y,
            impulse
        );

        // The entity keeps its off-screen sentinel until the first tick
        self.insert_body(body);
        self.bubbles.push(bubble);
        Ok(id)
    }

    /// Replace gravity (m/s²); applies from the next tick
    pub fn update_gravity(&mut self, gx: f32, gy: f32) {
        self.gravity = Vec2::new(gx, gy);
    }

    /// Command the barrier toward `dest` (pixels).
    ///
    /// The kinematic body gets the velocity that closes the gap in exactly
    /// one tick; the position itself is integrated by the next step.
    pub fn move_barrier(&mut self, dest: Vec2) -> Result<(), SimError> {
        let handle = self.barrier_body.ok_or(SimError::UninitializedBarrier)?;
        let barrier = self.barrier.as_mut().ok_or(SimError::UninitializedBarrier)?;
        barrier.dest_center = dest;

        let delta_px = barrier.dest_center - barrier.center;
        let velocity = self.scale.vec_to_meters(delta_px * self.tuning.tick_rate);
        self.bodies[handle.0].linear_velocity = velocity;
        log::debug!("Barrier commanded to {:?} at {:?} m/s", dest, velocity);
        Ok(())
    }

    /// Snapshot of every pose, for the renderer
    pub fn frame(&self) -> Frame {
        Frame {
            tick: self.time_ticks,
            barrier: self.barrier.as_ref().map(Barrier::pose),
            bubbles: self
                .bubbles()
                .map(|(id, bubble)| BubblePose {
                    id,
                    radius: bubble.radius(),
                    pose: bubble.pose(),
                })
                .collect(),
        }
    }

    /// Run the solver for `dt` seconds (no entity bookkeeping)
    pub(crate) fn advance(&mut self, dt: f32) -> u32 {
        let config = SolverConfig {
            velocity_iterations: self.tuning.velocity_iterations,
            position_iterations: self.tuning.position_iterations,
        };
        solver::advance(&mut self.bodies, self.gravity, dt, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> PhysicsWorld<u32> {
        let mut world = PhysicsWorld::new(Tuning::seeded(7)).unwrap();
        world.init_barrier(Barrier::new(300.0, 600.0, 150.0, 0.0).unwrap());
        world
    }

    #[test]
    fn test_invalid_tuning_rejected() {
        let tuning = Tuning {
            density: 0.0,
            ..Tuning::default()
        };
        assert!(matches!(
            PhysicsWorld::<()>::new(tuning),
            Err(SimError::Tuning(_))
        ));
    }

    #[test]
    fn test_barrier_body_has_three_edges() {
        let world = world();
        let handle = world.barrier_body.unwrap();
        let body = &world.bodies[handle.0];
        assert_eq!(body.kind, BodyKind::Kinematic);
        assert_eq!(body.owner, BodyOwner::Barrier);
        assert_eq!(body.fixtures.len(), 3);
        assert!((body.position.x - 0.075).abs() < 1e-6);

        // No edge runs along the top (y = -half height)
        let top = -0.15;
        for fixture in &body.fixtures {
            let Shape::Edge { a, b } = fixture.shape else {
                panic!("barrier must only have edges");
            };
            assert!(!((a.y - top).abs() < 1e-6 && (b.y - top).abs() < 1e-6));
        }
    }

    #[test]
    fn test_second_init_barrier_ignored() {
        let mut world = world();
        world.init_barrier(Barrier::new(50.0, 50.0, 0.0, 0.0).unwrap());
        let barrier = world.barrier().unwrap();
        assert_eq!(barrier.width(), 300.0);
        assert_eq!(barrier.height(), 600.0);
        assert_eq!(world.bodies.len(), 1);
        let body = &world.bodies[world.barrier_body.unwrap().0];
        assert!((body.position.x - 0.075).abs() < 1e-6);
    }

    #[test]
    fn test_bubble_before_barrier_fails() {
        let mut world = PhysicsWorld::new(Tuning::seeded(1)).unwrap();
        let result = world.create_bubble(Bubble::new(0u32, 20.0).unwrap());
        assert!(matches!(result, Err(SimError::UninitializedBarrier)));
        assert_eq!(world.bubble_count(), 0);
    }

    #[test]
    fn test_bubble_too_large_rejected() {
        let mut world = world();
        let result = world.create_bubble(Bubble::new(0, 151.0).unwrap());
        assert!(matches!(result, Err(SimError::BubbleTooLarge { .. })));
    }

    #[test]
    fn test_create_bubble_spawn_and_impulse() {
        let mut world = world();
        for handle in 0..20 {
            world.create_bubble(Bubble::new(handle, 20.0).unwrap()).unwrap();
        }
        assert_eq!(world.bubble_count(), 20);

        let mut horizontal = Vec::new();
        for body in world.bodies.iter().filter(|b| b.is_dynamic()) {
            // Spawn inside the barrier width, one radius above the origin
            let x_px = body.position.x * 2000.0;
            assert!((19.99..=280.01).contains(&x_px));
            assert!((body.position.y + 0.01).abs() < 1e-6);

            // Vertical kick is fixed and down-screen
            let expected_vy = 0.005 * body.inv_mass();
            assert!((body.linear_velocity.y - expected_vy).abs() < 1e-3);
            assert!(body.linear_velocity.x.abs() <= expected_vy + 1e-3);
            horizontal.push(body.linear_velocity.x);
        }
        // Distinct trajectories
        assert!(horizontal.windows(2).any(|w| (w[0] - w[1]).abs() > 1e-3));

        let (id, bubble) = world.bubbles().nth(3).unwrap();
        assert_eq!(id, BubbleId(3));
        assert_eq!(*bubble.handle(), 3);
        assert_eq!(bubble.center(), Vec2::splat(crate::consts::UNPLACED_POSITION));
    }

    #[test]
    fn test_same_seed_same_spawns() {
        let mut a = world();
        let mut b = world();
        a.create_bubble(Bubble::new(0, 10.0).unwrap()).unwrap();
        b.create_bubble(Bubble::new(0, 10.0).unwrap()).unwrap();
        assert_eq!(a.bodies[1].position, b.bodies[1].position);
        assert_eq!(a.bodies[1].linear_velocity, b.bodies[1].linear_velocity);
    }

    #[test]
    fn test_update_gravity() {
        let mut world = world();
        assert_eq!(world.gravity(), Vec2::new(0.0, 9.8));
        world.update_gravity(-0.6, 0.0);
        assert_eq!(world.gravity(), Vec2::new(-0.6, 0.0));
    }

    #[test]
    fn test_move_barrier_velocity() {
        let mut world = world();
        world.move_barrier(Vec2::new(160.0, -20.0)).unwrap();
        let velocity = world.barrier_velocity().unwrap();
        // 10 px * 120 Hz / 2000 px/m
        assert!((velocity.x - 0.6).abs() < 1e-5);
        assert!((velocity.y + 1.2).abs() < 1e-5);
        assert_eq!(world.barrier().unwrap().dest_center(), Vec2::new(160.0, -20.0));
    }

    #[test]
    fn test_move_barrier_logged_at_debug() {
        crate::test_log::capture();
        let mut world = world();
        world.move_barrier(Vec2::new(161.0, -21.0)).unwrap();
        assert!(crate::test_log::logged(log::Level::Debug, "161.0, -21.0"));
    }

    #[test]
    fn test_move_barrier_before_init_fails() {
        let mut world = PhysicsWorld::<()>::new(Tuning::default()).unwrap();
        assert!(matches!(
            world.move_barrier(Vec2::ZERO),
            Err(SimError::UninitializedBarrier)
        ));
    }

    #[test]
    fn test_frame_lists_bubbles_in_id_order() {
        let mut world = world();
        world.create_bubble(Bubble::new(0, 10.0).unwrap()).unwrap();
        world.create_bubble(Bubble::new(1, 15.0).unwrap()).unwrap();
        let frame = world.frame();
        assert_eq!(frame.tick, 0);
        assert_eq!(frame.barrier.unwrap().center, Vec2::new(150.0, 0.0));
        let ids: Vec<_> = frame.bubbles.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![BubbleId(0), BubbleId(1)]);
        assert_eq!(frame.bubbles[1].radius, 15.0);
    }
}

//! Fixed timestep simulation tick
//!
//! Advances the solver, then mirrors every body back into its entity:
//! the barrier takes its new center and stops, bubbles take their pose and
//! are put back inside the barrier if they escaped.

use glam::Vec2;

use super::body::BodyOwner;
use super::world::PhysicsWorld;

impl<H> PhysicsWorld<H> {
    /// Advance the world by `dt` seconds and update every entity.
    ///
    /// Only the simulation driver calls this.
    pub(crate) fn step(&mut self, dt: f32) {
        let substeps = self.advance(dt);
        self.time_ticks += 1;
        log::trace!("Tick {} ({} substeps)", self.time_ticks, substeps);

        let scale = self.scale;

        // Barrier first, so bubbles are checked against where it is now
        if let (Some(handle), Some(barrier)) = (self.barrier_body, self.barrier.as_mut()) {
            let body = &mut self.bodies[handle.0];
            // A move command lasts exactly one tick
            body.linear_velocity = Vec2::ZERO;
            barrier.center = scale.vec_to_pixels(body.position);
            barrier.dest_center = barrier.center;
        }

        let Some(barrier) = self.barrier.as_ref() else {
            return;
        };

        for body in self.bodies.iter_mut() {
            let BodyOwner::Bubble(id) = body.owner else {
                continue;
            };
            let Some(bubble) = self.bubbles.get_mut(id.0 as usize) else {
                continue;
            };

            bubble.center = scale.vec_to_pixels(body.position);
            if let Some(fixed) = barrier.confine(bubble.center, bubble.radius()) {
                log::warn!(
                    "{} escaped at ({:.1}, {:.1}), moved to ({:.1}, {:.1})",
                    id,
                    bubble.center.x,
                    bubble.center.y,
                    fixed.x,
                    fixed.y
                );
                body.set_transform(scale.vec_to_meters(fixed), body.angle);
                body.linear_velocity = Vec2::ZERO;
                bubble.center = fixed;
            }
            bubble.rotation = body.angle.to_degrees();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::{Barrier, Bubble, BubbleId};
    use crate::tuning::Tuning;
    use proptest::prelude::*;

    fn world_with(tuning: Tuning) -> PhysicsWorld<u32> {
        let mut world = PhysicsWorld::new(tuning).unwrap();
        world.init_barrier(Barrier::new(300.0, 600.0, 150.0, 0.0).unwrap());
        world
    }

    fn body_index(world: &PhysicsWorld<u32>, id: BubbleId) -> usize {
        world
            .bodies
            .iter()
            .position(|b| b.owner == BodyOwner::Bubble(id))
            .unwrap()
    }

    #[test]
    fn test_first_tick_places_bubble() {
        let mut world = world_with(Tuning::seeded(3));
        let id = world.create_bubble(Bubble::new(0, 20.0).unwrap()).unwrap();
        world.step(SIM_DT);
        let bubble = world.bubble(id).unwrap();
        assert!(world.barrier().unwrap().contains(bubble.center()));
        assert_eq!(world.time_ticks(), 1);
    }

    #[test]
    fn test_bubble_falls_then_settles_on_bottom() {
        let tuning = Tuning {
            initial_impulse: 0.0,
            ..Tuning::seeded(11)
        };
        let mut world = world_with(tuning);
        let id = world.create_bubble(Bubble::new(0, 20.0).unwrap()).unwrap();

        world.step(SIM_DT);
        let mut prev_y = world.bubble(id).unwrap().center().y;
        assert!(prev_y > -20.0);

        // Strictly increasing while clear of the floor
        let mut ticks = 1;
        while prev_y < 260.0 {
            world.step(SIM_DT);
            let y = world.bubble(id).unwrap().center().y;
            assert!(y > prev_y, "tick {}: {} <= {}", ticks, y, prev_y);
            prev_y = y;
            ticks += 1;
            assert!(ticks < 120, "bubble never reached the floor");
        }

        for _ in 0..600 {
            world.step(SIM_DT);
        }
        let bubble = world.bubble(id).unwrap();
        // Resting on the bottom edge: center one radius above y = 300
        assert!((bubble.center().y - 280.0).abs() < 1.5, "y = {}", bubble.center().y);
    }

    #[test]
    fn test_bubble_above_open_top_snaps_to_bottom() {
        let mut world = world_with(Tuning::seeded(5));
        let id = world.create_bubble(Bubble::new(0, 20.0).unwrap()).unwrap();
        world.update_gravity(0.0, 0.0);
        world.step(SIM_DT);

        // Hold the bubble well above the barrier's open top, right of it
        let index = body_index(&world, id);
        world.bodies[index].position = Vec2::new(0.2, -0.2);
        world.bodies[index].linear_velocity = Vec2::ZERO;
        world.bodies[index].angular_velocity = 0.0;

        world.step(SIM_DT);
        let bubble = world.bubble(id).unwrap();
        assert_eq!(bubble.center(), Vec2::new(280.0, 280.0));
        assert_eq!(world.bodies[index].linear_velocity, Vec2::ZERO);

        // Stays put without further disturbance
        for _ in 0..10 {
            world.step(SIM_DT);
            let center = world.bubble(id).unwrap().center();
            assert!((center.x - 280.0).abs() < 1e-2);
            assert!((center.y - 280.0).abs() < 1e-2);
        }
    }

    #[test]
    fn test_escape_on_x_only_still_lands_on_bottom() {
        let mut world = world_with(Tuning::seeded(5));
        let id = world.create_bubble(Bubble::new(0, 20.0).unwrap()).unwrap();
        world.update_gravity(0.0, 0.0);
        world.step(SIM_DT);

        let index = body_index(&world, id);
        // Left of the barrier, mid-height
        world.bodies[index].position = Vec2::new(-0.05, 0.0);
        world.bodies[index].linear_velocity = Vec2::ZERO;
        world.step(SIM_DT);
        assert_eq!(world.bubble(id).unwrap().center(), Vec2::new(20.0, 280.0));
    }

    #[test]
    fn test_escape_logged_as_warning() {
        crate::test_log::capture();
        let mut world = world_with(Tuning::seeded(8));
        let id = world.create_bubble(Bubble::new(0, 25.0).unwrap()).unwrap();
        world.update_gravity(0.0, 0.0);
        world.step(SIM_DT);

        let index = body_index(&world, id);
        world.bodies[index].position = Vec2::new(-0.1, 0.0);
        world.bodies[index].linear_velocity = Vec2::ZERO;
        world.step(SIM_DT);
        assert!(crate::test_log::logged(
            log::Level::Warn,
            "moved to (25.0, 275.0)"
        ));
    }

    #[test]
    fn test_rotation_reported_in_degrees() {
        let mut world = world_with(Tuning::seeded(9));
        let id = world.create_bubble(Bubble::new(0, 20.0).unwrap()).unwrap();
        world.update_gravity(0.0, 0.0);

        let index = body_index(&world, id);
        world.bodies[index].position = Vec2::new(0.075, 0.0);
        world.bodies[index].linear_velocity = Vec2::ZERO;
        world.bodies[index].angular_velocity = 1.0;
        world.step(SIM_DT);

        let expected = SIM_DT.to_degrees();
        assert!((world.bubble(id).unwrap().rotation() - expected).abs() < 1e-4);
    }

    #[test]
    fn test_barrier_reaches_target_in_one_tick() {
        let mut world = world_with(Tuning::seeded(1));
        let target = Vec2::new(200.0, 100.0);
        world.move_barrier(target).unwrap();
        world.step(SIM_DT);

        let barrier = world.barrier().unwrap();
        assert!((barrier.center() - target).length() < 1e-2);
        assert_eq!(barrier.dest_center(), barrier.center());
        assert_eq!(world.barrier_velocity(), Some(Vec2::ZERO));
        // Geometry never changes
        assert_eq!(barrier.width(), 300.0);

        // No new destination: exactly zero velocity
        let current = barrier.center();
        world.move_barrier(current).unwrap();
        assert_eq!(world.barrier_velocity(), Some(Vec2::ZERO));

        // Same target again: zero within rounding
        world.move_barrier(target).unwrap();
        assert!(world.barrier_velocity().unwrap().length() < 1e-3);
    }

    #[test]
    fn test_barrier_drag_carries_bubbles() {
        let tuning = Tuning {
            initial_impulse: 0.0,
            ..Tuning::seeded(2)
        };
        let mut world = world_with(tuning);
        let id = world.create_bubble(Bubble::new(0, 20.0).unwrap()).unwrap();
        for _ in 0..240 {
            world.step(SIM_DT);
        }

        // Drag up 10 px per tick for 30 ticks
        for i in 1..=30 {
            world.move_barrier(Vec2::new(150.0, -10.0 * i as f32)).unwrap();
            world.step(SIM_DT);
            let barrier = world.barrier().unwrap();
            let bubble = world.bubble(id).unwrap();
            assert!(barrier.contains(bubble.center()));
        }
        let bubble_y = world.bubble(id).unwrap().center().y;
        // Floor now at y = 0, bubble resting on it
        assert!(bubble_y < 0.0 && bubble_y > -25.0, "y = {}", bubble_y);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_bubbles_stay_inside_barrier(
            seed in any::<u64>(),
            radii in prop::collection::vec(10.0f32..30.0, 1..5),
            gravities in prop::collection::vec((-30.0f32..30.0, -30.0f32..30.0), 1..4),
        ) {
            let mut world = world_with(Tuning::seeded(seed));
            for (i, radius) in radii.iter().enumerate() {
                world.create_bubble(Bubble::new(i as u32, *radius).unwrap()).unwrap();
            }
            for (gx, gy) in gravities {
                world.update_gravity(gx, gy);
                for _ in 0..30 {
                    world.step(SIM_DT);
                    let barrier = world.barrier().unwrap();
                    for (_, bubble) in world.bubbles() {
                        prop_assert!(barrier.contains(bubble.center()));
                    }
                }
            }
        }
    }
}

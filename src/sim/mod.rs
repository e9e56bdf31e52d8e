//! Rigid-body simulation module
//!
//! Everything that touches simulation state lives here:
//! - Meters internally, pixels at the entity boundary
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (bodies by creation, bubbles by id)

pub mod body;
pub mod collision;
pub mod solver;
pub mod state;
pub mod tick;
pub mod world;

pub use body::{Body, BodyHandle, BodyKind, BodyOwner, Material, Shape};
pub use collision::{CollisionResult, circle_circle, circle_edge};
pub use state::{Barrier, Bubble, BubbleId, BubblePose, Frame, Pose};
pub use world::PhysicsWorld;

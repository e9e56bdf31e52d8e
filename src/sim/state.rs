//! Entity state mirrored out of the simulation
//!
//! Barrier and bubbles hold caller-facing pixel values. The world owns the
//! rigid bodies and overwrites these poses once per tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::UNPLACED_POSITION;
use crate::error::SimError;

/// Stable identifier of a bubble inside its world
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BubbleId(pub u32);

impl std::fmt::Display for BubbleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bubble#{}", self.0)
    }
}

/// Position + rotation in pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub center: Vec2,
    /// Degrees
    pub rotation: f32,
}

/// Open-topped rectangular container
///
///   |         |
///   |         |   <- the top of the barrier is open
///   |_ _ _ _ _|
///   |  o  o   |
///   | o  o   o|
///   |_ _ _ _ _|
///
/// Width and height are fixed at creation. `center` is written by the
/// simulation after every tick; `dest_center` is the caller's target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Barrier {
    width: f32,
    height: f32,
    pub(crate) center: Vec2,
    pub(crate) dest_center: Vec2,
}

impl Barrier {
    /// Create a barrier (pixels). Size must be finite and positive.
    pub fn new(width: f32, height: f32, center_x: f32, center_y: f32) -> Result<Self, SimError> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if !valid(width) || !valid(height) || !center_x.is_finite() || !center_y.is_finite() {
            return Err(SimError::InvalidBarrier { width, height });
        }
        let center = Vec2::new(center_x, center_y);
        Ok(Self {
            width,
            height,
            center,
            dest_center: center,
        })
    }

    /// Barrier for a container laid out at `width` x `height`.
    ///
    /// The barrier is as wide as the container and twice as tall, centered
    /// on the container's top edge, so bubbles enter from a full container
    /// height above the visible area.
    pub fn for_container(width: f32, height: f32) -> Result<Self, SimError> {
        Self::new(width, height * 2.0, width * 0.5, 0.0)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Half width / half height
    #[inline]
    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Current center (authoritative right after a tick)
    #[inline]
    pub fn center(&self) -> Vec2 {
        self.center
    }

    /// Where the caller wants the barrier to be
    #[inline]
    pub fn dest_center(&self) -> Vec2 {
        self.dest_center
    }

    pub fn pose(&self) -> Pose {
        Pose {
            center: self.center,
            rotation: 0.0,
        }
    }

    /// Current rectangle as (left, top, right, bottom), e.g. for a debug overlay
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        let half = self.half_extents();
        (
            self.center.x - half.x,
            self.center.y - half.y,
            self.center.x + half.x,
            self.center.y + half.y,
        )
    }

    /// Inclusive point-in-rectangle test on both axes
    pub fn contains(&self, point: Vec2) -> bool {
        let (left, top, right, bottom) = self.bounds();
        (left..=right).contains(&point.x) && (top..=bottom).contains(&point.y)
    }

    /// Where a bubble at `center` must be moved to, or `None` if it is inside.
    ///
    /// Any violation lands the bubble on the bottom interior row: X is
    /// clamped between the side walls and Y is forced to
    /// `center.y + half_height - radius`, whichever axis escaped.
    pub fn confine(&self, center: Vec2, radius: f32) -> Option<Vec2> {
        if self.contains(center) {
            return None;
        }
        let half = self.half_extents();
        let min_x = self.center.x - half.x + radius;
        let max_x = self.center.x + half.x - radius;
        Some(Vec2::new(
            center.x.clamp(min_x, max_x),
            self.center.y + half.y - radius,
        ))
    }

    /// Spawn X for a bubble given a uniform sample `u` in [0, 1)
    pub fn spawn_x(&self, radius: f32, u: f32) -> f32 {
        self.center.x + (self.width - radius * 2.0) * (u - 0.5)
    }
}

/// A circular dynamic body with an attached visual handle.
///
/// The handle is opaque to the simulation: it is stored and handed back,
/// never inspected.
#[derive(Debug, Clone)]
pub struct Bubble<H> {
    handle: H,
    radius: f32,
    pub(crate) center: Vec2,
    /// Degrees
    pub(crate) rotation: f32,
}

impl<H> Bubble<H> {
    /// Create an unplaced bubble. Radius must be finite and positive.
    pub fn new(handle: H, radius: f32) -> Result<Self, SimError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(SimError::InvalidRadius(radius));
        }
        Ok(Self {
            handle,
            radius,
            center: Vec2::splat(UNPLACED_POSITION),
            rotation: 0.0,
        })
    }

    #[inline]
    pub fn handle(&self) -> &H {
        &self.handle
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.center
    }

    /// Rotation in degrees
    #[inline]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn pose(&self) -> Pose {
        Pose {
            center: self.center,
            rotation: self.rotation,
        }
    }
}

/// Pose of one bubble in a published frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BubblePose {
    pub id: BubbleId,
    pub radius: f32,
    pub pose: Pose,
}

impl BubblePose {
    /// Integer layout box as (left, top, diameter).
    ///
    /// Halves round toward positive infinity, so -2.5 lays out at -2.
    pub fn layout_rect(&self) -> (i32, i32, i32) {
        let left = round_half_up(self.pose.center.x - self.radius);
        let top = round_half_up(self.pose.center.y - self.radius);
        let diameter = round_half_up(self.radius * 2.0);
        (left, top, diameter)
    }
}

#[inline]
fn round_half_up(v: f32) -> i32 {
    (v + 0.5).floor() as i32
}

/// Everything a renderer needs after one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Tick counter of the world that produced this frame
    pub tick: u64,
    pub barrier: Option<Pose>,
    /// Sorted by id
    pub bubbles: Vec<BubblePose>,
}

//! Rigid bodies, shapes and fixtures
//!
//! Everything here is in simulation units (meters, kilograms, radians).
//! Bodies never own their entity: `owner` is an identifier the world
//! resolves against its own storage.

use glam::Vec2;

use super::state::BubbleId;

/// Index of a body inside its world (bodies are never removed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub usize);

/// How the solver treats a body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Moved by its velocity only; infinite mass, pushes but is never pushed
    Kinematic,
    /// Moved by forces, impulses and contacts
    Dynamic,
}

/// Back-reference from a body to the entity mirroring it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyOwner {
    Barrier,
    Bubble(BubbleId),
}

/// Surface material of a fixture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub friction: f32,
    pub restitution: f32,
    pub density: f32,
}

impl Material {
    /// Friction mixing (geometric mean)
    #[inline]
    pub fn mix_friction(a: &Material, b: &Material) -> f32 {
        (a.friction * b.friction).sqrt()
    }

    /// Restitution mixing (bounciest wins)
    #[inline]
    pub fn mix_restitution(a: &Material, b: &Material) -> f32 {
        a.restitution.max(b.restitution)
    }
}

/// Collision shape in body-local coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Circle { radius: f32 },
    /// Two-sided line segment
    Edge { a: Vec2, b: Vec2 },
}

impl Shape {
    /// Mass and rotational inertia about the body origin for a density
    pub fn mass_properties(&self, density: f32) -> (f32, f32) {
        match *self {
            Shape::Circle { radius } => {
                let mass = density * std::f32::consts::PI * radius * radius;
                (mass, 0.5 * mass * radius * radius)
            }
            // Edges have no area
            Shape::Edge { .. } => (0.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fixture {
    pub shape: Shape,
    pub material: Material,
}

/// Description used to create a body
#[derive(Debug, Clone)]
pub struct BodyDef {
    pub kind: BodyKind,
    pub position: Vec2,
    pub angle: f32,
    pub linear_damping: f32,
    pub owner: BodyOwner,
}

/// A rigid body
#[derive(Debug, Clone)]
pub struct Body {
    pub kind: BodyKind,
    pub owner: BodyOwner,
    pub position: Vec2,
    /// Radians
    pub angle: f32,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    pub linear_damping: f32,
    pub fixtures: Vec<Fixture>,
    mass: f32,
    inv_mass: f32,
    inv_inertia: f32,
}

impl Body {
    pub fn new(def: BodyDef) -> Self {
        Self {
            kind: def.kind,
            owner: def.owner,
            position: def.position,
            angle: def.angle,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            linear_damping: def.linear_damping,
            fixtures: Vec::new(),
            mass: 0.0,
            inv_mass: 0.0,
            inv_inertia: 0.0,
        }
    }

    /// Attach a fixture and recompute mass data
    pub fn add_fixture(&mut self, fixture: Fixture) {
        self.fixtures.push(fixture);
        self.reset_mass_data();
    }

    fn reset_mass_data(&mut self) {
        self.mass = 0.0;
        self.inv_mass = 0.0;
        self.inv_inertia = 0.0;
        if self.kind != BodyKind::Dynamic {
            return;
        }

        let (mass, inertia) = self
            .fixtures
            .iter()
            .map(|f| f.shape.mass_properties(f.material.density))
            .fold((0.0, 0.0), |(m, i), (fm, fi)| (m + fm, i + fi));

        self.mass = mass;
        if mass > 0.0 {
            self.inv_mass = 1.0 / mass;
        }
        if inertia > 0.0 {
            self.inv_inertia = 1.0 / inertia;
        }
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[inline]
    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    #[inline]
    pub fn inv_inertia(&self) -> f32 {
        self.inv_inertia
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic
    }

    /// Apply an impulse at the center of mass
    pub fn apply_linear_impulse(&mut self, impulse: Vec2) {
        if self.is_dynamic() {
            self.linear_velocity += impulse * self.inv_mass;
        }
    }

    /// Teleport, keeping velocities
    pub fn set_transform(&mut self, position: Vec2, angle: f32) {
        self.position = position;
        self.angle = angle;
    }

    /// Local point to world space
    #[inline]
    pub fn world_point(&self, local: Vec2) -> Vec2 {
        self.position + Vec2::from_angle(self.angle).rotate(local)
    }

    /// Bounding radius of all circle fixtures (0 for edge-only bodies)
    pub fn circle_radius(&self) -> f32 {
        self.fixtures
            .iter()
            .filter_map(|f| match f.shape {
                Shape::Circle { radius } => Some(radius),
                Shape::Edge { .. } => None,
            })
            .fold(0.0, f32::max)
    }
}

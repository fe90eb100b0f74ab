//! Kinematic state and circle collider for every object in the simulation
//!
//! A body knows nothing about gameplay: it is position, rotation, velocity,
//! and a circle. Behavior (ships, bullets, shields) lives in the entity
//! layer; detection lives in [`super::world`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::facing_from_degrees;

/// Opaque handle to a body registered in a [`super::CollisionWorld`].
///
/// Ids are allocated by the world and never reused within a session, so a
/// stale handle after deregistration simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u32);

/// Mutable kinematic state plus a circle collider.
///
/// Rotation is a single scalar in degrees (positive = counterclockwise);
/// angular velocity is deg/s. The collider is a local-space offset and radius
/// scaled by the body's transform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsBody {
    /// World position (authoritative)
    pub position: Vec2,
    /// Rotation around +Z, degrees
    pub rotation: f32,
    /// Velocity, units/s
    pub velocity: Vec2,
    /// Angular velocity, deg/s
    pub angular_velocity: f32,
    /// Local-space offset of the collider circle center
    pub circle_offset: Vec2,
    /// Local-space (unscaled) collider radius
    pub circle_radius: f32,
    /// Non-uniform scale multiplier
    pub scale: Vec2,
    /// Integer collision layer tag used by gameplay responses
    pub layer: i32,
}

impl PhysicsBody {
    pub fn new(position: Vec2, circle_radius: f32, layer: i32) -> Self {
        Self {
            position,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            circle_offset: Vec2::ZERO,
            circle_radius,
            scale: Vec2::ONE,
            layer,
        }
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.circle_offset = offset;
        self
    }

    /// Unit "up" vector of this body's frame
    #[inline]
    pub fn facing(&self) -> Vec2 {
        facing_from_degrees(self.rotation)
    }

    /// World-space center of the collider circle
    pub fn world_circle_center(&self) -> Vec2 {
        let local = self.circle_offset * self.scale;
        let rad = self.rotation.to_radians();
        let (sin, cos) = rad.sin_cos();
        let rotated = Vec2::new(local.x * cos - local.y * sin, local.x * sin + local.y * cos);
        self.position + rotated
    }

    /// World-space collider radius: local radius scaled by the largest axis
    #[inline]
    pub fn world_circle_radius(&self) -> f32 {
        self.circle_radius * self.scale.x.max(self.scale.y)
    }

    /// Basic physics tick: move and rotate according to the current
    /// velocities. Collision and custom logic happen elsewhere.
    pub fn integrate(&mut self, dt: f32) {
        self.position += self.velocity * dt;
        self.rotation += self.angular_velocity * dt;
    }
}

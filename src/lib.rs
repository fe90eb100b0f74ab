//! Starbreak - a top-down arcade space shooter core
//!
//! Core modules:
//! - `sim`: Deterministic headless simulation (circle physics, ships,
//!   shield objectives, wave-driven level progression)
//!
//! Rendering, input devices, audio, and particles are external collaborators:
//! they feed a [`sim::TickInput`] in each frame and consume the
//! [`sim::GameEvent`]s and state snapshots that come back out.

pub mod sim;

pub use sim::{GameEvent, GameState, TickInput};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Duration of the death shrink animation (seconds)
    pub const DEATH_SHRINK_SECS: f32 = 0.6;

    /// Collision layer shared by the player ship and enemy bullets
    pub const LAYER_PLAYER_SIDE: i32 = 0;
    /// Collision layer shared by enemy ships, shield stations, and player bullets
    pub const LAYER_ENEMY_SIDE: i32 = 1;

    /// Collision layer for trigger regions that nothing collides *into*
    /// (bullet attractor fields)
    pub const LAYER_SENSOR: i32 = 2;

    /// Lethal damage dealt to every surviving enemy when a level ends
    pub const LEVEL_CLEAR_DAMAGE: f32 = 10_000.0;
}

/// Unit "up" vector of a frame rotated by `degrees` around +Z
#[inline]
pub fn facing_from_degrees(degrees: f32) -> Vec2 {
    let rad = degrees.to_radians();
    Vec2::new(-rad.sin(), rad.cos())
}

/// Normalize an angle in degrees to [-180, 180)
#[inline]
pub fn normalize_degrees(mut angle: f32) -> f32 {
    while angle >= 180.0 {
        angle -= 360.0;
    }
    while angle < -180.0 {
        angle += 360.0;
    }
    angle
}

/// Move `current` toward `goal` (both degrees) by at most `max_delta`,
/// taking the shorter way around the circle
pub fn move_toward_degrees(current: f32, goal: f32, max_delta: f32) -> f32 {
    let delta = normalize_degrees(goal - current);
    current + delta.clamp(-max_delta, max_delta)
}

/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Hermite smoothstep on [0, 1]
#[inline]
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Ease-out quadratic: fast start, gentle stop
#[inline]
pub fn ease_out_quad(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Ease-in-back: pulls slightly negative before accelerating to 1
pub fn ease_in_back(t: f32) -> f32 {
    const C1: f32 = 1.70158;
    const C3: f32 = C1 + 1.0;
    let t = t.clamp(0.0, 1.0);
    C3 * t * t * t - C1 * t * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_from_degrees() {
        let up = facing_from_degrees(0.0);
        assert!((up - Vec2::Y).length() < 1e-6);

        // Rotating 90 degrees counterclockwise points "up" to the left
        let left = facing_from_degrees(90.0);
        assert!((left - Vec2::new(-1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_move_toward_degrees_wraps() {
        // 350 -> 10 should go through 360, not backward through 180
        let next = move_toward_degrees(350.0, 10.0, 15.0);
        assert!(normalize_degrees(next - 365.0).abs() < 1e-4);
    }

    #[test]
    fn test_reflect() {
        let v = Vec2::new(100.0, 0.0);
        let n = Vec2::new(-1.0, 0.0);
        let r = reflect(v, n);
        assert!((r.x + 100.0).abs() < 1e-4);
        assert!(r.y.abs() < 1e-4);
    }

    #[test]
    fn test_ease_in_back_endpoints() {
        assert!(ease_in_back(0.0).abs() < 1e-6);
        assert!((ease_in_back(1.0) - 1.0).abs() < 1e-4);
        // Dips below zero early on
        assert!(ease_in_back(0.2) < 0.0);
    }
}

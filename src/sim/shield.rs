//! Shield stations: stationary destructible objectives gating level progress
//!
//! A station has health but no mobility and cannot be stunned. Once health
//! reaches zero the deactivation is permanent for the session, and its
//! attached bullet attractor shuts off with it.

use glam::Vec2;

/// Outcome of a [`ShieldObjective::damage`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShieldDamage {
    /// Health actually removed (zero once the station is down)
    pub delta: f32,
    /// True exactly once, on the hit that drove health to zero
    pub deactivated: bool,
}

/// A stationary destructible shield station.
#[derive(Debug, Clone)]
pub struct ShieldObjective {
    pub max_health: f32,
    pub health: f32,
    pub score_per_damage: i32,
    pub score_on_destroy: i32,
    /// Seconds of stun applied to any ship that bumps the station
    pub contact_stun_secs: f32,
    /// Knockback speed given to a ship that bumps the station
    pub contact_stun_impulse: f32,
    /// Max angular knockback (deg/s, randomized within +/-) for a bump
    pub contact_stun_angular_impulse: f32,
}

impl ShieldObjective {
    pub fn new(max_health: f32) -> Self {
        Self {
            max_health,
            health: max_health,
            score_per_damage: 0,
            score_on_destroy: 0,
            contact_stun_secs: 0.0,
            contact_stun_impulse: 0.0,
            contact_stun_angular_impulse: 0.0,
        }
    }

    /// A station is active until its health first reaches zero.
    pub fn is_active(&self) -> bool {
        self.health > 0.0
    }

    /// Removes up to `amount` health. No-op once deactivated; the
    /// deactivation transition fires exactly once no matter how many more
    /// hits land afterwards.
    pub fn damage(&mut self, amount: f32) -> ShieldDamage {
        let old = self.health;
        if old <= 0.0 {
            return ShieldDamage {
                delta: 0.0,
                deactivated: false,
            };
        }

        self.health = (self.health - amount).max(0.0);
        ShieldDamage {
            delta: old - self.health,
            deactivated: self.health == 0.0,
        }
    }
}

/// Region around a shield station that pulls bullets toward it.
///
/// One-sided interaction: the attractor bends the bullet's flight path, the
/// bullet's own contact handler never reacts to the attractor.
#[derive(Debug, Clone, Copy)]
pub struct BulletAttractor {
    /// Pull strength, divided by squared distance (inverse-square law)
    pub force: f32,
    /// Only bullets on this collision layer are affected
    pub target_layer: i32,
    active: bool,
}

impl BulletAttractor {
    pub fn new(force: f32, target_layer: i32) -> Self {
        Self {
            force,
            target_layer,
            active: true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Permanently disables the pull (called when the station goes down).
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Bend `velocity` toward the attractor, preserving speed. `normal`
    /// points from the attractor toward the bullet; `dist_sq` is the squared
    /// center distance.
    pub fn steer(&self, velocity: Vec2, normal: Vec2, dist_sq: f32, dt: f32) -> Vec2 {
        let speed = velocity.length();
        if !self.active || speed <= f32::EPSILON {
            return velocity;
        }

        let dir = velocity / speed;
        let pull = self.force / dist_sq.max(f32::EPSILON);
        let new_dir = (dir - normal * pull * dt).normalize_or_zero();
        if new_dir == Vec2::ZERO {
            return velocity;
        }
        new_dir * speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_clamps_and_reports_delta() {
        let mut shield = ShieldObjective::new(100.0);
        let hit = shield.damage(30.0);
        assert_eq!(hit.delta, 30.0);
        assert!(!hit.deactivated);

        let hit = shield.damage(500.0);
        assert_eq!(hit.delta, 70.0);
        assert!(hit.deactivated);
        assert!(!shield.is_active());
    }

    #[test]
    fn test_deactivation_fires_once() {
        let mut shield = ShieldObjective::new(40.0);
        assert!(shield.damage(40.0).deactivated);

        for _ in 0..3 {
            let hit = shield.damage(10.0);
            assert_eq!(hit.delta, 0.0);
            assert!(!hit.deactivated, "deactivation fired twice");
        }
    }

    #[test]
    fn test_attractor_preserves_speed() {
        let attractor = BulletAttractor::new(50.0, 1);
        let velocity = Vec2::new(0.0, 10.0);
        let normal = Vec2::new(1.0, 0.0);

        let steered = attractor.steer(velocity, normal, 4.0, 1.0 / 60.0);
        assert!((steered.length() - 10.0).abs() < 1e-4);
        // Pulled opposite the outward normal, toward the attractor
        assert!(steered.x < 0.0);
    }

    #[test]
    fn test_attractor_inactive_is_identity() {
        let mut attractor = BulletAttractor::new(50.0, 1);
        attractor.deactivate();

        let velocity = Vec2::new(3.0, 4.0);
        assert_eq!(
            attractor.steer(velocity, Vec2::X, 1.0, 1.0 / 60.0),
            velocity
        );
    }

    #[test]
    fn test_attractor_pull_falls_off_with_distance() {
        let attractor = BulletAttractor::new(50.0, 1);
        let velocity = Vec2::new(0.0, 10.0);
        let normal = Vec2::new(1.0, 0.0);
        let dt = 1.0 / 60.0;

        let near = attractor.steer(velocity, normal, 1.0, dt);
        let far = attractor.steer(velocity, normal, 100.0, dt);
        assert!(near.x.abs() > far.x.abs());
    }
}

//! Health, stun, and death sequencing shared by every spaceship
//!
//! `ShipVitals` is composed into the player and enemy entities rather than
//! inherited: the entity owns its body and behavior, the vitals own the
//! damage/stun state machine. States: alive-active, alive-stunned,
//! dead-animating (shrink), destroyed (removed by the tick's flush).

use crate::consts::DEATH_SHRINK_SECS;
use crate::ease_in_back;

/// Outcome of a [`ShipVitals::damage`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageResult {
    /// Health actually removed; less than the requested amount if the hit
    /// would have taken health below zero, and zero once already dead.
    pub delta: f32,
    /// True exactly once, on the hit that drove health to zero.
    pub died: bool,
}

/// Damage/stun state machine layered on a physics body.
#[derive(Debug, Clone)]
pub struct ShipVitals {
    pub max_health: f32,
    pub health: f32,
    /// Minimum seconds after a stun ends before the next one can land
    pub stun_cooldown: f32,
    /// Seconds the damage flash stays visible after a hit
    pub damage_flash_secs: f32,
    pub can_be_stunned: bool,
    pub can_receive_impulse: bool,
    /// Score awarded per point of health removed (when the hit is scored)
    pub score_per_damage: i32,
    /// One-time score awarded when the death animation completes
    pub score_on_death: i32,
    stunned: bool,
    stun_start: f32,
    stun_end: f32,
    flash_until: f32,
    /// Seconds elapsed in the death animation, once dead
    dying: Option<f32>,
}

impl ShipVitals {
    pub fn new(max_health: f32) -> Self {
        Self {
            max_health,
            health: max_health,
            stun_cooldown: 0.0,
            damage_flash_secs: 0.1,
            can_be_stunned: true,
            can_receive_impulse: true,
            score_per_damage: 0,
            score_on_death: 0,
            stunned: false,
            stun_start: 0.0,
            stun_end: f32::NEG_INFINITY,
            flash_until: f32::NEG_INFINITY,
            dying: None,
        }
    }

    pub fn is_stunned(&self) -> bool {
        self.stunned
    }

    /// Dead means the death animation is running or finished; dead ships are
    /// inert and take no further damage.
    pub fn is_dead(&self) -> bool {
        self.dying.is_some()
    }

    pub fn flash_active(&self, now: f32) -> bool {
        now < self.flash_until
    }

    pub fn stun_end_time(&self) -> f32 {
        self.stun_end
    }

    /// Attempts to stun this ship, suspending its movement and shooting.
    ///
    /// Query-like command: returns false (with no state change) if the ship
    /// is already stunned, dead, un-stunnable, still in the post-stun
    /// cooldown, or `seconds` is not positive. Callers must check the result.
    pub fn stun(&mut self, seconds: f32, now: f32) -> bool {
        if self.can_be_stunned
            && !self.stunned
            && self.dying.is_none()
            && seconds > 0.0
            && now - self.stun_end >= self.stun_cooldown
        {
            self.stunned = true;
            self.stun_start = now;
            self.stun_end = now + seconds;
            true
        } else {
            false
        }
    }

    /// Removes up to `amount` health, clamping at zero, and starts the
    /// damage flash. Death fires exactly once; later calls are no-ops that
    /// return a zero delta.
    pub fn damage(&mut self, amount: f32, now: f32) -> DamageResult {
        self.flash_until = now + self.damage_flash_secs;

        let old = self.health;
        let mut died = false;
        if old > 0.0 {
            self.health = (self.health - amount).max(0.0);
            if self.health == 0.0 {
                self.dying = Some(0.0);
                died = true;
            }
        }

        DamageResult {
            delta: old - self.health,
            died,
        }
    }

    /// Per-tick housekeeping: auto-unstun once the stun window has passed
    /// and advance the death animation. Returns true on the tick the death
    /// animation completes; the caller then deregisters and removes the
    /// entity and awards `score_on_death`.
    pub fn update(&mut self, now: f32, dt: f32) -> bool {
        if self.stunned && now >= self.stun_end {
            self.stunned = false;
        }
        if let Some(elapsed) = &mut self.dying {
            let was_running = *elapsed < DEATH_SHRINK_SECS;
            *elapsed += dt;
            return was_running && *elapsed >= DEATH_SHRINK_SECS;
        }
        false
    }

    /// Scale multiplier for the death shrink (ease-in-back, clamped so the
    /// collider never goes negative), or None while alive.
    pub fn death_scale(&self) -> Option<f32> {
        self.dying
            .map(|elapsed| (1.0 - ease_in_back(elapsed / DEATH_SHRINK_SECS)).max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_returns_actual_delta() {
        let mut vitals = ShipVitals::new(100.0);
        let result = vitals.damage(30.0, 0.0);
        assert_eq!(result.delta, 30.0);
        assert!(!result.died);

        // Overkill is clamped: only 70 health remained
        let result = vitals.damage(500.0, 1.0);
        assert_eq!(result.delta, 70.0);
        assert!(result.died);
        assert_eq!(vitals.health, 0.0);
    }

    #[test]
    fn test_damage_idempotent_past_death() {
        let mut vitals = ShipVitals::new(50.0);
        assert!(vitals.damage(50.0, 0.0).died);

        for i in 0..4 {
            let result = vitals.damage(25.0, i as f32);
            assert_eq!(result.delta, 0.0);
            assert!(!result.died, "death fired twice");
        }
    }

    #[test]
    fn test_death_animation_completes_once() {
        let mut vitals = ShipVitals::new(10.0);
        vitals.damage(10.0, 0.0);

        let dt = 0.1;
        let mut now = 0.0;
        let mut completions = 0;
        for _ in 0..20 {
            now += dt;
            if vitals.update(now, dt) {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
        assert_eq!(vitals.death_scale(), Some(0.0));
    }

    #[test]
    fn test_stun_preconditions() {
        let mut vitals = ShipVitals::new(100.0);
        vitals.stun_cooldown = 2.0;

        assert!(!vitals.stun(0.0, 10.0), "zero duration must fail");
        assert!(vitals.stun(5.0, 10.0));
        assert!(vitals.is_stunned());

        // Already stunned
        assert!(!vitals.stun(5.0, 12.0));
        let end_before = vitals.stun_end_time();

        // Unstun at t=15, then re-stun within the 2s cooldown fails and
        // leaves timestamps untouched
        vitals.update(15.0, 0.0);
        assert!(!vitals.is_stunned());
        assert!(!vitals.stun(5.0, 16.0));
        assert_eq!(vitals.stun_end_time(), end_before);

        // After the cooldown it lands again
        assert!(vitals.stun(5.0, 17.1));
    }

    #[test]
    fn test_unstunnable_ship_never_stuns() {
        let mut vitals = ShipVitals::new(100.0);
        vitals.can_be_stunned = false;
        assert!(!vitals.stun(3.0, 0.0));
    }

    #[test]
    fn test_dead_ship_cannot_be_stunned() {
        let mut vitals = ShipVitals::new(10.0);
        vitals.damage(10.0, 0.0);
        assert!(!vitals.stun(3.0, 0.1));
    }

    #[test]
    fn test_death_scale_shrinks() {
        let mut vitals = ShipVitals::new(10.0);
        assert_eq!(vitals.death_scale(), None);
        vitals.damage(10.0, 0.0);

        let start = vitals.death_scale().unwrap();
        vitals.update(0.5, 0.5);
        let late = vitals.death_scale().unwrap();
        assert!(start >= 1.0, "ease-in-back starts at or above full scale");
        assert!(late < start);
    }
}

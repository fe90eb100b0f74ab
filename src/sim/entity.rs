//! Game entities: a body handle plus kind-specific state
//!
//! Instead of a class hierarchy with virtual collision overrides, every
//! entity is a [`PhysicsBody`] handle plus one [`EntityKind`] variant, and
//! the tick's contact responder pattern-matches on the variant. Behavior
//! state (AI wander direction, burst progress, shoot timers) lives inside
//! the variant.
//!
//! [`PhysicsBody`]: super::body::PhysicsBody

use glam::Vec2;

use super::body::BodyId;
use super::config::{BoulderTuning, BulletTuning, PlayerTuning, RaiderTuning};
use super::shield::{BulletAttractor, ShieldObjective};
use super::ship::ShipVitals;

/// Stable handle to an entity, independent of its slot in the entity list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub u32);

/// One object in the game: its physics handle plus behavior state.
#[derive(Debug)]
pub struct Entity {
    pub id: EntityId,
    pub body: BodyId,
    pub kind: EntityKind,
    /// Marked during contact response, flushed at end of tick
    pub despawn: bool,
}

#[derive(Debug)]
pub enum EntityKind {
    Player(PlayerShip),
    Enemy(EnemyShip),
    Bullet(Bullet),
    Shield(ShieldStation),
    Attractor(AttractorRegion),
}

impl Entity {
    pub fn vitals(&self) -> Option<&ShipVitals> {
        match &self.kind {
            EntityKind::Player(p) => Some(&p.vitals),
            EntityKind::Enemy(e) => Some(&e.vitals),
            _ => None,
        }
    }

    pub fn vitals_mut(&mut self) -> Option<&mut ShipVitals> {
        match &mut self.kind {
            EntityKind::Player(p) => Some(&mut p.vitals),
            EntityKind::Enemy(e) => Some(&mut e.vitals),
            _ => None,
        }
    }

    /// True for player and enemy ships (the things bullets damage and
    /// shields knock back).
    pub fn is_ship(&self) -> bool {
        matches!(self.kind, EntityKind::Player(_) | EntityKind::Enemy(_))
    }
}

/// The player's ship: vitals plus shoot-rate bookkeeping. Movement comes
/// from the per-tick input.
#[derive(Debug)]
pub struct PlayerShip {
    pub vitals: ShipVitals,
    pub tuning: PlayerTuning,
    pub last_shot_time: f32,
}

impl PlayerShip {
    pub fn new(tuning: PlayerTuning) -> Self {
        let mut vitals = ShipVitals::new(tuning.max_health);
        vitals.stun_cooldown = tuning.stun_cooldown;
        Self {
            vitals,
            tuning,
            last_shot_time: f32::NEG_INFINITY,
        }
    }
}

/// An AI-controlled enemy ship.
#[derive(Debug)]
pub struct EnemyShip {
    pub vitals: ShipVitals,
    pub ai: EnemyAi,
}

/// Kind-specific AI state. Both variants are simple arithmetic over the
/// physics primitives; the hard part is the machinery around them.
#[derive(Debug)]
pub enum EnemyAi {
    /// Wanders in a random direction, drifts angularly, and sprays radial
    /// fragment bullets - extra sprays triggered by accumulated damage.
    Boulder {
        tuning: BoulderTuning,
        move_dir: Vec2,
        /// Per-ship phase so boulders drift out of sync
        noise_phase: f32,
        accumulated_damage: f32,
        /// Fragment bursts owed from damage taken, spawned next update
        pending_bursts: u32,
    },
    /// Chases the player and fires aimed bursts; a burst in progress is
    /// aborted when the ship is stunned.
    Raider {
        tuning: RaiderTuning,
        burst: Option<Burst>,
    },
}

/// Progress of a multi-shot burst, advanced once per tick.
#[derive(Debug, Clone, Copy)]
pub struct Burst {
    pub remaining: u32,
    pub next_shot_in: f32,
}

impl EnemyShip {
    pub fn boulder(tuning: BoulderTuning, move_dir: Vec2, noise_phase: f32) -> Self {
        let mut vitals = ShipVitals::new(tuning.max_health);
        vitals.stun_cooldown = tuning.stun_cooldown;
        vitals.score_per_damage = tuning.score_per_damage;
        vitals.score_on_death = tuning.score_on_death;
        Self {
            vitals,
            ai: EnemyAi::Boulder {
                tuning,
                move_dir,
                noise_phase,
                accumulated_damage: 0.0,
                pending_bursts: 0,
            },
        }
    }

    pub fn raider(tuning: RaiderTuning) -> Self {
        let mut vitals = ShipVitals::new(tuning.max_health);
        vitals.stun_cooldown = tuning.stun_cooldown;
        vitals.score_per_damage = tuning.score_per_damage;
        vitals.score_on_death = tuning.score_on_death;
        Self {
            vitals,
            ai: EnemyAi::Raider {
                tuning,
                burst: None,
            },
        }
    }
}

/// A bullet in flight. `origin` exempts the shooter from its own shots.
#[derive(Debug)]
pub struct Bullet {
    pub tuning: BulletTuning,
    pub origin: Option<EntityId>,
}

/// A shield station entity: the objective plus a link to its attractor
/// entity so deactivation can shut the pull off.
#[derive(Debug)]
pub struct ShieldStation {
    pub shield: ShieldObjective,
    pub attractor: EntityId,
}

/// The attraction region around a station. Separate entity because it is a
/// separate (much larger) collider.
#[derive(Debug)]
pub struct AttractorRegion {
    pub attractor: BulletAttractor,
    pub station: EntityId,
}

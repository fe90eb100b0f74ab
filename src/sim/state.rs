//! Game state: world, entities, score, RNG, and the per-tick event feed
//!
//! All gameplay state lives here. The simulation is deterministic: one
//! seeded RNG, fixed iteration order, no platform dependencies. The
//! presentation layer drains [`GameState::events`] after each tick and reads
//! entity/body state as read-only snapshots.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::body::{BodyId, PhysicsBody};
use super::config::{BulletTuning, Campaign, EnemyKind, Tuning};
use super::director::Director;
use super::entity::{
    AttractorRegion, Bullet, EnemyShip, Entity, EntityId, EntityKind, PlayerShip, ShieldStation,
};
use super::shield::{BulletAttractor, ShieldObjective};
use super::world::{Bounds, CollisionWorld};
use crate::consts::{LAYER_ENEMY_SIDE, LAYER_PLAYER_SIDE, LAYER_SENSOR};

/// Which spawn door an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorSide {
    Left,
    Right,
}

/// Whether the run is still going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Playing,
    Won,
    Lost,
}

/// One-shot notifications for the presentation layer (score popups, door and
/// laser animations, explosions). Drained by the caller each tick; the core
/// never reads them back.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    ScoreChanged { total: i64 },
    ScorePopup { delta: i64, position: Vec2 },
    BulletExploded { position: Vec2 },
    ShieldDeactivated { entity: EntityId },
    EnemySpawned { entity: EntityId, door: DoorSide },
    DoorOpened { door: DoorSide },
    DoorClosed { door: DoorSide },
    LevelStarted { level: usize },
    LaserOpening { level: usize },
    LaserOpened { level: usize },
    LevelCompleted { level: usize },
    GameWon { score: i64 },
    GameOver { score: i64, level: usize },
}

/// Complete simulation state for one run.
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    /// In-game clock, seconds since the run started
    pub time: f32,
    pub score: i64,
    pub phase: RunPhase,
    pub world: CollisionWorld,
    pub entities: Vec<Entity>,
    pub director: Director,
    pub tuning: Tuning,
    /// Drained by the caller after each tick
    pub events: Vec<GameEvent>,
    next_entity_id: u32,
}

impl GameState {
    pub fn new(seed: u64, campaign: Campaign, tuning: Tuning) -> Self {
        debug_assert!(!campaign.levels.is_empty(), "campaign has no levels");

        let first = &campaign.levels[0];
        let bounds = Bounds::new(first.bounds_min, first.bounds_max);
        let player_start = campaign.player_start;

        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time: 0.0,
            score: 0,
            phase: RunPhase::Playing,
            world: CollisionWorld::new(bounds),
            entities: Vec::new(),
            director: Director::new(campaign),
            tuning,
            events: Vec::new(),
            next_entity_id: 1,
        };

        state.spawn_player(player_start);
        super::director::begin(&mut state);
        state
    }

    fn alloc_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_entity_id);
        self.next_entity_id += 1;
        id
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn entity_by_body(&self, body: BodyId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.body == body)
    }

    pub fn player_id(&self) -> Option<EntityId> {
        self.entities
            .iter()
            .find(|e| matches!(e.kind, EntityKind::Player(_)))
            .map(|e| e.id)
    }

    /// World position of an entity's body, if it is still registered.
    pub fn position_of(&self, id: EntityId) -> Option<Vec2> {
        let entity = self.entity(id)?;
        self.world.body(entity.body).map(|b| b.position)
    }

    pub fn add_score(&mut self, delta: i64) {
        if delta <= 0 {
            return;
        }
        self.score += delta;
        self.events.push(GameEvent::ScoreChanged { total: self.score });
    }

    /// Score plus a floating score popup at `position` (enemy kills, shield
    /// takedowns).
    pub fn add_score_with_popup(&mut self, delta: i64, position: Vec2) {
        if delta <= 0 {
            return;
        }
        self.add_score(delta);
        self.events.push(GameEvent::ScorePopup { delta, position });
    }

    pub fn spawn_player(&mut self, position: Vec2) -> EntityId {
        let tuning = self.tuning.player.clone();
        let body = self
            .world
            .register(PhysicsBody::new(position, tuning.radius, LAYER_PLAYER_SIDE));
        let id = self.alloc_entity_id();
        self.entities.push(Entity {
            id,
            body,
            kind: EntityKind::Player(PlayerShip::new(tuning)),
            despawn: false,
        });
        id
    }

    /// Spawn a bullet at `position` flying along `rotation` degrees.
    pub fn spawn_bullet(
        &mut self,
        position: Vec2,
        rotation: f32,
        tuning: BulletTuning,
        origin: Option<EntityId>,
        layer: i32,
    ) -> EntityId {
        let mut body = PhysicsBody::new(position, tuning.radius, layer).with_rotation(rotation);
        body.velocity = body.facing() * tuning.speed;
        let body = self.world.register(body);

        let id = self.alloc_entity_id();
        self.entities.push(Entity {
            id,
            body,
            kind: EntityKind::Bullet(Bullet { tuning, origin }),
            despawn: false,
        });
        id
    }

    /// Spawn an enemy launched from a door: stunned, rotated to its launch
    /// direction, moving at `speed` along it.
    pub fn spawn_enemy(
        &mut self,
        kind: EnemyKind,
        position: Vec2,
        rotation: f32,
        stun_secs: f32,
        speed: f32,
    ) -> EntityId {
        let mut ship = match kind {
            EnemyKind::Boulder => {
                let dir_rad = self.rng.random::<f32>() * std::f32::consts::TAU;
                let noise_phase = self.rng.random::<f32>() * 100.0;
                EnemyShip::boulder(
                    self.tuning.boulder.clone(),
                    Vec2::new(dir_rad.cos(), dir_rad.sin()),
                    noise_phase,
                )
            }
            EnemyKind::Raider => EnemyShip::raider(self.tuning.raider.clone()),
        };
        ship.vitals.stun(stun_secs, self.time);

        let radius = match kind {
            EnemyKind::Boulder => self.tuning.boulder.radius,
            EnemyKind::Raider => self.tuning.raider.radius,
        };
        let mut body = PhysicsBody::new(position, radius, LAYER_ENEMY_SIDE).with_rotation(rotation);
        body.velocity = body.facing() * speed;
        let body = self.world.register(body);

        let id = self.alloc_entity_id();
        self.entities.push(Entity {
            id,
            body,
            kind: EntityKind::Enemy(ship),
            despawn: false,
        });
        id
    }

    /// Spawn a shield station plus its bullet-attractor region.
    pub fn spawn_shield(&mut self, position: Vec2) -> EntityId {
        let tuning = self.tuning.shield.clone();
        let mut shield = ShieldObjective::new(tuning.max_health);
        shield.score_per_damage = tuning.score_per_damage;
        shield.score_on_destroy = tuning.score_on_destroy;
        shield.contact_stun_secs = tuning.contact_stun_secs;
        shield.contact_stun_impulse = tuning.contact_stun_impulse;
        shield.contact_stun_angular_impulse = tuning.contact_stun_angular_impulse;

        let station_body = self
            .world
            .register(PhysicsBody::new(position, tuning.radius, LAYER_ENEMY_SIDE));
        let attractor_body = self
            .world
            .register(PhysicsBody::new(position, tuning.attractor_radius, LAYER_SENSOR));

        let station_id = self.alloc_entity_id();
        let attractor_id = self.alloc_entity_id();

        self.entities.push(Entity {
            id: station_id,
            body: station_body,
            kind: EntityKind::Shield(ShieldStation {
                shield,
                attractor: attractor_id,
            }),
            despawn: false,
        });
        self.entities.push(Entity {
            id: attractor_id,
            body: attractor_body,
            kind: EntityKind::Attractor(AttractorRegion {
                attractor: BulletAttractor::new(tuning.attractor_force, LAYER_ENEMY_SIDE),
                station: station_id,
            }),
            despawn: false,
        });

        station_id
    }

    /// Remove every entity marked for despawn, deregistering its body first.
    /// Runs after all of a tick's contacts have been handled so responses
    /// never mutate the registered set mid-pass.
    pub fn flush_despawns(&mut self) {
        let mut removed = Vec::new();
        self.entities.retain(|e| {
            if e.despawn {
                removed.push(e.body);
                false
            } else {
                true
            }
        });
        for body in removed {
            self.world.deregister(body);
        }
    }

    /// Frame-rate-independent Bernoulli trial: a per-second probability
    /// converted to this tick's probability via 1 - (1-p)^dt.
    pub fn chance_per_second(&mut self, p: f32, dt: f32) -> bool {
        let per_tick = 1.0 - (1.0 - p.clamp(0.0, 1.0)).powf(dt);
        self.rng.random::<f32>() < per_tick
    }
}

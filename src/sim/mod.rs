//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (insertion order)
//! - No rendering or platform dependencies

pub mod body;
pub mod config;
pub mod director;
pub mod entity;
pub mod shield;
pub mod ship;
pub mod state;
pub mod tick;
pub mod world;

pub use body::{BodyId, PhysicsBody};
pub use config::{
    BulletTuning, Campaign, DoorPlacement, EnemyKind, LevelConfig, Tuning, WaveConfig,
};
pub use director::{Director, LevelPhase, wave_index};
pub use entity::{Entity, EntityId, EntityKind};
pub use ship::{DamageResult, ShipVitals};
pub use shield::{BulletAttractor, ShieldDamage, ShieldObjective};
pub use state::{DoorSide, GameEvent, GameState, RunPhase};
pub use tick::{TickInput, tick};
pub use world::{Bounds, CollisionWorld, Contact};

//! Data-driven game balance
//!
//! Every gameplay number lives here as a serde struct with defaults, so
//! balance passes are JSON edits instead of code changes. Loaded with
//! [`Campaign::from_json`] / [`Tuning::from_json`]; the defaults mirror the
//! shipped campaign.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Handling and combat numbers for the player ship.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub max_health: f32,
    pub radius: f32,
    /// Forward acceleration, units/s^2
    pub acceleration: f32,
    /// Max change in angular velocity, deg/s^2
    pub turn_acceleration: f32,
    /// Commanded turn rate per degree of heading error, ^-1 s^-1
    pub turn_to_velocity: f32,
    pub drag: f32,
    pub angular_drag: f32,
    pub brake_damper: f32,
    pub brake_deceleration: f32,
    pub brake_angular_damper: f32,
    pub brake_angular_deceleration: f32,
    pub braking_turn_to_velocity: f32,
    pub braking_turn_acceleration: f32,
    /// Velocity retained along the wall normal after a bounce (0..1)
    pub wall_bounce: f32,
    pub stun_cooldown: f32,
    pub collision_stun_secs: f32,
    pub collision_stun_impulse: f32,
    pub collision_stun_angular_impulse: f32,
    /// Max fire rate when tapping the trigger, shots/s
    pub click_shoot_rate: f32,
    /// Fire rate while holding the trigger, shots/s
    pub hold_shoot_rate: f32,
    pub shoot_recoil: f32,
    pub bullet: BulletTuning,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            radius: 0.5,
            acceleration: 14.0,
            turn_acceleration: 1440.0,
            turn_to_velocity: 10.0,
            drag: 0.12,
            angular_drag: 0.015,
            brake_damper: 1.6,
            brake_deceleration: 4.0,
            brake_angular_damper: 2.0,
            brake_angular_deceleration: 30.0,
            braking_turn_to_velocity: 4.0,
            braking_turn_acceleration: 360.0,
            wall_bounce: 0.55,
            stun_cooldown: 1.0,
            collision_stun_secs: 1.2,
            collision_stun_impulse: 6.0,
            collision_stun_angular_impulse: 180.0,
            click_shoot_rate: 8.0,
            hold_shoot_rate: 4.0,
            shoot_recoil: 0.6,
            bullet: BulletTuning {
                damage: 10.0,
                stun_secs: 0.0,
                impulse: 1.5,
                speed: 18.0,
                radius: 0.12,
            },
        }
    }
}

/// Numbers for one bullet kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletTuning {
    pub damage: f32,
    /// Seconds of stun applied to the ship this bullet hits
    pub stun_secs: f32,
    /// Knockback speed applied along the bullet's flight direction
    pub impulse: f32,
    pub speed: f32,
    pub radius: f32,
}

impl Default for BulletTuning {
    fn default() -> Self {
        Self {
            damage: 5.0,
            stun_secs: 0.0,
            impulse: 1.0,
            speed: 14.0,
            radius: 0.12,
        }
    }
}

/// The boulder: wanders randomly and sprays fragment bullets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoulderTuning {
    pub max_health: f32,
    pub radius: f32,
    pub acceleration: f32,
    /// Max random angular acceleration, deg/s^2
    pub angular_acceleration: f32,
    pub drag: f32,
    pub angular_drag: f32,
    pub wall_bounce: f32,
    pub stun_cooldown: f32,
    /// Chance per second of picking a new wander direction
    pub move_switch_chance_per_sec: f32,
    /// Chance per second of spraying a fragment burst
    pub shoot_chance_per_sec: f32,
    pub min_burst: u32,
    pub max_burst: u32,
    /// Accumulated damage required to force an extra fragment burst
    pub damage_per_shot: f32,
    /// Backward kick per fragment shot
    pub shoot_recoil: f32,
    pub score_per_damage: i32,
    pub score_on_death: i32,
    pub bullet: BulletTuning,
}

impl Default for BoulderTuning {
    fn default() -> Self {
        Self {
            max_health: 60.0,
            radius: 0.9,
            acceleration: 3.0,
            angular_acceleration: 120.0,
            drag: 0.25,
            angular_drag: 0.01,
            wall_bounce: 0.9,
            stun_cooldown: 0.5,
            move_switch_chance_per_sec: 0.25,
            shoot_chance_per_sec: 0.08,
            min_burst: 3,
            max_burst: 6,
            damage_per_shot: 20.0,
            shoot_recoil: 0.3,
            score_per_damage: 2,
            score_on_death: 150,
            bullet: BulletTuning {
                damage: 6.0,
                stun_secs: 0.0,
                impulse: 2.0,
                speed: 8.0,
                radius: 0.15,
            },
        }
    }
}

/// The raider: chases the player and fires aimed bursts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RaiderTuning {
    pub max_health: f32,
    pub radius: f32,
    pub acceleration: f32,
    /// Max turn toward the target, deg/s
    pub turn_rate: f32,
    pub drag: f32,
    pub wall_bounce: f32,
    pub stun_cooldown: f32,
    /// Preferred standoff distance from the target
    pub hold_distance: f32,
    /// Chance per second of starting a burst
    pub burst_chance_per_sec: f32,
    pub burst_size: u32,
    /// Seconds between shots within a burst
    pub burst_gap_secs: f32,
    pub shoot_recoil: f32,
    pub score_per_damage: i32,
    pub score_on_death: i32,
    pub bullet: BulletTuning,
}

impl Default for RaiderTuning {
    fn default() -> Self {
        Self {
            max_health: 40.0,
            radius: 0.55,
            acceleration: 8.0,
            turn_rate: 220.0,
            drag: 0.2,
            wall_bounce: 0.7,
            stun_cooldown: 0.5,
            hold_distance: 5.0,
            burst_chance_per_sec: 0.35,
            burst_size: 3,
            burst_gap_secs: 0.18,
            shoot_recoil: 0.3,
            score_per_damage: 3,
            score_on_death: 250,
            bullet: BulletTuning {
                damage: 8.0,
                stun_secs: 0.4,
                impulse: 3.0,
                speed: 12.0,
                radius: 0.12,
            },
        }
    }
}

/// Shield stations and their bullet attractors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShieldTuning {
    pub max_health: f32,
    pub radius: f32,
    pub score_per_damage: i32,
    pub score_on_destroy: i32,
    pub contact_stun_secs: f32,
    pub contact_stun_impulse: f32,
    pub contact_stun_angular_impulse: f32,
    /// Inverse-square pull strength on player bullets
    pub attractor_force: f32,
    /// Radius of the attraction region
    pub attractor_radius: f32,
}

impl Default for ShieldTuning {
    fn default() -> Self {
        Self {
            max_health: 120.0,
            radius: 0.8,
            score_per_damage: 1,
            score_on_destroy: 500,
            contact_stun_secs: 1.0,
            contact_stun_impulse: 5.0,
            contact_stun_angular_impulse: 120.0,
            attractor_force: 40.0,
            attractor_radius: 4.0,
        }
    }
}

/// Spawn door animation and launch numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DoorTuning {
    pub open_secs: f32,
    pub hold_secs: f32,
    pub close_secs: f32,
    /// Seconds between individual enemies leaving the same door
    pub spawn_gap_secs: f32,
    /// Seconds enemies are stunned when launched
    pub spawn_stun_secs: f32,
    pub spawn_speed_min: f32,
    pub spawn_speed_max: f32,
    /// Max degrees of launch-direction jitter, either side
    pub spawn_rotation_jitter: f32,
}

impl Default for DoorTuning {
    fn default() -> Self {
        Self {
            open_secs: 0.5,
            hold_secs: 0.8,
            close_secs: 0.5,
            spawn_gap_secs: 0.4,
            spawn_stun_secs: 1.5,
            spawn_speed_min: 4.0,
            spawn_speed_max: 7.0,
            spawn_rotation_jitter: 25.0,
        }
    }
}

/// Level-wide enemy spawn cadence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    /// Chance per second that a spawn batch fires (frame-rate independent)
    pub chance_per_sec: f32,
    /// Minimum seconds between spawn batches
    pub cooldown_secs: f32,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            chance_per_sec: 0.3,
            cooldown_secs: 2.5,
        }
    }
}

/// All tuning in one bundle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub boulder: BoulderTuning,
    pub raider: RaiderTuning,
    pub shield: ShieldTuning,
    pub door: DoorTuning,
    pub spawn: SpawnTuning,
}

impl Tuning {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Enemy variants a wave can schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    Boulder,
    Raider,
}

/// One wave: an ordered batch of enemies and a cap on how many of them can
/// be alive at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveConfig {
    pub max_on_map: usize,
    pub enemies: Vec<EnemyKind>,
}

/// Where a spawn door sits and which way it launches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DoorPlacement {
    pub position: Vec2,
    /// Launch direction, degrees
    pub facing: f32,
}

/// One level: its map bounds, objectives, doors, and waves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelConfig {
    pub bounds_min: Vec2,
    pub bounds_max: Vec2,
    /// The final level: reaching it ends the game with a win
    #[serde(default)]
    pub is_win_level: bool,
    pub shield_positions: Vec<Vec2>,
    pub door_left: DoorPlacement,
    pub door_right: DoorPlacement,
    pub waves: Vec<WaveConfig>,
    /// Duration of the exit-laser deactivation animation
    #[serde(default = "default_laser_secs")]
    pub laser_secs: f32,
}

fn default_laser_secs() -> f32 {
    2.0
}

/// The full run: player start plus an ordered list of levels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub player_start: Vec2,
    pub levels: Vec<LevelConfig>,
}

impl Campaign {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for Campaign {
    fn default() -> Self {
        let level = |offset_y: f32, waves: Vec<WaveConfig>| LevelConfig {
            bounds_min: Vec2::new(-12.0, offset_y),
            bounds_max: Vec2::new(12.0, offset_y + 20.0),
            is_win_level: false,
            shield_positions: vec![
                Vec2::new(-8.0, offset_y + 16.0),
                Vec2::new(8.0, offset_y + 16.0),
            ],
            door_left: DoorPlacement {
                position: Vec2::new(-11.0, offset_y + 10.0),
                facing: -90.0,
            },
            door_right: DoorPlacement {
                position: Vec2::new(11.0, offset_y + 10.0),
                facing: 90.0,
            },
            waves,
            laser_secs: 2.0,
        };

        Self {
            player_start: Vec2::new(0.0, 3.0),
            levels: vec![
                level(
                    0.0,
                    vec![
                        WaveConfig {
                            max_on_map: 2,
                            enemies: vec![EnemyKind::Boulder, EnemyKind::Boulder],
                        },
                        WaveConfig {
                            max_on_map: 3,
                            enemies: vec![
                                EnemyKind::Boulder,
                                EnemyKind::Raider,
                                EnemyKind::Boulder,
                            ],
                        },
                    ],
                ),
                level(
                    24.0,
                    vec![
                        WaveConfig {
                            max_on_map: 3,
                            enemies: vec![
                                EnemyKind::Raider,
                                EnemyKind::Boulder,
                                EnemyKind::Raider,
                            ],
                        },
                        WaveConfig {
                            max_on_map: 4,
                            enemies: vec![
                                EnemyKind::Boulder,
                                EnemyKind::Boulder,
                                EnemyKind::Raider,
                                EnemyKind::Raider,
                            ],
                        },
                        WaveConfig {
                            max_on_map: 4,
                            enemies: vec![
                                EnemyKind::Raider,
                                EnemyKind::Raider,
                                EnemyKind::Raider,
                                EnemyKind::Boulder,
                            ],
                        },
                    ],
                ),
                LevelConfig {
                    bounds_min: Vec2::new(-12.0, 48.0),
                    bounds_max: Vec2::new(12.0, 68.0),
                    is_win_level: true,
                    shield_positions: Vec::new(),
                    door_left: DoorPlacement {
                        position: Vec2::new(-11.0, 58.0),
                        facing: -90.0,
                    },
                    door_right: DoorPlacement {
                        position: Vec2::new(11.0, 58.0),
                        facing: 90.0,
                    },
                    waves: Vec::new(),
                    laser_secs: 2.0,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuning_json_round_trip() {
        let tuning = Tuning::default();
        let json = tuning.to_json().unwrap();
        let back = Tuning::from_json(&json).unwrap();
        assert_eq!(back.player.max_health, tuning.player.max_health);
        assert_eq!(back.boulder.bullet.speed, tuning.boulder.bullet.speed);
    }

    #[test]
    fn test_partial_tuning_json_uses_defaults() {
        let tuning = Tuning::from_json(r#"{"player": {"max_health": 250.0}}"#).unwrap();
        assert_eq!(tuning.player.max_health, 250.0);
        assert_eq!(tuning.shield.max_health, ShieldTuning::default().max_health);
    }

    #[test]
    fn test_default_campaign_shape() {
        let campaign = Campaign::default();
        assert!(campaign.levels.len() >= 2);
        assert!(campaign.levels.last().unwrap().is_win_level);
        for level in &campaign.levels {
            assert!(level.bounds_min.x < level.bounds_max.x);
            assert!(level.bounds_min.y < level.bounds_max.y);
            if !level.is_win_level {
                assert!(!level.waves.is_empty());
                assert!(!level.shield_positions.is_empty());
            }
        }
    }

    #[test]
    fn test_campaign_json_round_trip() {
        let campaign = Campaign::default();
        let json = campaign.to_json().unwrap();
        let back = Campaign::from_json(&json).unwrap();
        assert_eq!(back.levels.len(), campaign.levels.len());
        assert_eq!(back.player_start, campaign.player_start);
    }
}

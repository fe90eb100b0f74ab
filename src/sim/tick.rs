//! Fixed timestep simulation tick
//!
//! One call advances the whole game by `dt`: director, player control,
//! enemy AI, damage/death bookkeeping, integration, then a single collision
//! detection pass whose contacts are answered per entity kind. Structural
//! changes (spawn/despawn) are deferred to the end of the tick so contact
//! handling never mutates the registered set mid-pass.

use glam::Vec2;
use rand::Rng;

use super::body::{BodyId, PhysicsBody};
use super::director;
use super::entity::{Burst, EnemyAi, EntityId, EntityKind};
use super::state::{GameEvent, GameState, RunPhase};
use super::world::Contact;
use crate::consts::*;
use crate::{facing_from_degrees, normalize_degrees, reflect};

/// Gap between a muzzle and the bullet it spawns
const MUZZLE_CLEARANCE: f32 = 0.05;
/// Cap on commanded turn rate, deg/s
const MAX_TURN_RATE: f32 = 720.0;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Desired thrust direction in world space; zero means coast
    pub move_dir: Vec2,
    pub brake: bool,
    /// Trigger newly pressed this tick (taps fire faster than holds)
    pub shoot_pressed: bool,
    pub shoot_held: bool,
}

/// Advance the game state by one fixed timestep.
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if state.phase != RunPhase::Playing {
        return;
    }

    state.events.clear();
    state.time += dt;

    director::update(state, dt);

    let player = state.player_id().and_then(|id| {
        let alive = state
            .entity(id)
            .and_then(|e| e.vitals())
            .is_some_and(|v| !v.is_dead());
        let pos = state.position_of(id)?;
        alive.then_some((id, pos))
    });

    // Entities come out of the state for the update pass so each entity can
    // freely use the world, the RNG, and the spawn helpers. Bullets spawned
    // during the pass accumulate in state.entities and are merged back.
    let now = state.time;
    let mut entities = std::mem::take(&mut state.entities);
    for entity in entities.iter_mut() {
        match &mut entity.kind {
            EntityKind::Player(ship) => update_player(state, entity.id, entity.body, ship, input, dt),
            EntityKind::Enemy(ship) => update_enemy(state, entity.id, entity.body, ship, player, dt),
            _ => {}
        }
    }

    // Death bookkeeping: advance stun/death timers, shrink dying ships, and
    // queue score awards for deaths that completed this tick.
    let mut finished: Vec<(bool, i64, Vec2)> = Vec::new();
    for entity in entities.iter_mut() {
        let is_player = matches!(entity.kind, EntityKind::Player(_));
        let body_id = entity.body;
        let Some(vitals) = entity.vitals_mut() else {
            continue;
        };
        if vitals.update(now, dt) {
            entity.despawn = true;
            let pos = state
                .world
                .body(body_id)
                .map(|b| b.position)
                .unwrap_or_default();
            let award = entity
                .vitals()
                .map(|v| v.score_on_death as i64)
                .unwrap_or(0);
            finished.push((is_player, award, pos));
        } else if let Some(scale) = entity.vitals().and_then(|v| v.death_scale()) {
            if let Some(body) = state.world.body_mut(body_id) {
                body.scale = Vec2::splat(scale);
            }
        }
    }
    entities.append(&mut state.entities);
    state.entities = entities;

    state.world.integrate_all(dt);
    let contacts = state.world.step();
    for contact in &contacts {
        match *contact {
            Contact::Boundary { id, point, normal } => boundary_response(state, id, point, normal),
            Contact::Body {
                id,
                other,
                point,
                normal,
            } => body_response(state, id, other, point, normal, dt),
        }
    }

    state.flush_despawns();

    let mut player_died = false;
    for (is_player, award, pos) in finished {
        if is_player {
            player_died = true;
        } else {
            state.add_score_with_popup(award, pos);
        }
    }
    if player_died {
        let level = state.director.level_index();
        log::info!("player destroyed on level {level}, final score {}", state.score);
        state.phase = RunPhase::Lost;
        state.events.push(GameEvent::GameOver {
            score: state.score,
            level,
        });
    }
}

/// Heading in degrees whose facing vector is `dir` (inverse of
/// [`facing_from_degrees`]).
fn heading_degrees(dir: Vec2) -> f32 {
    (-dir.x).atan2(dir.y).to_degrees()
}

/// Move a scalar toward a target without overshooting.
fn approach(current: f32, target: f32, max_delta: f32) -> f32 {
    current + (target - current).clamp(-max_delta, max_delta)
}

fn update_player(
    state: &mut GameState,
    id: EntityId,
    body_id: BodyId,
    ship: &mut super::entity::PlayerShip,
    input: &TickInput,
    dt: f32,
) {
    if ship.vitals.is_dead() {
        return;
    }
    let now = state.time;
    let stunned = ship.vitals.is_stunned();
    let t = ship.tuning.clone();

    let mut shot: Option<(Vec2, f32)> = None;
    if let Some(body) = state.world.body_mut(body_id) {
        if !stunned {
            if input.brake {
                body.velocity /= 1.0 + t.brake_damper * dt;
                let speed = body.velocity.length();
                if speed > 0.0 {
                    let slowed = (speed - t.brake_deceleration * dt).max(0.0);
                    body.velocity *= slowed / speed;
                }
                body.angular_velocity /= 1.0 + t.brake_angular_damper * dt;
                body.angular_velocity = approach(
                    body.angular_velocity,
                    0.0,
                    t.brake_angular_deceleration * dt,
                );
            }
            if input.move_dir.length_squared() > 1e-6 {
                let dir = input.move_dir.normalize();
                body.velocity += dir * t.acceleration * dt;

                let (gain, turn_accel) = if input.brake {
                    (t.braking_turn_to_velocity, t.braking_turn_acceleration)
                } else {
                    (t.turn_to_velocity, t.turn_acceleration)
                };
                let error = normalize_degrees(heading_degrees(dir) - body.rotation);
                let target_rate = (error * gain).clamp(-MAX_TURN_RATE, MAX_TURN_RATE);
                body.angular_velocity = approach(body.angular_velocity, target_rate, turn_accel * dt);
            }

            let firing = input.shoot_pressed || input.shoot_held;
            let rate = if input.shoot_pressed {
                t.click_shoot_rate
            } else {
                t.hold_shoot_rate
            };
            if firing && rate > 0.0 && now - ship.last_shot_time >= 1.0 / rate {
                let facing = body.facing();
                let muzzle = body.world_circle_center()
                    + facing * (body.world_circle_radius() + t.bullet.radius + MUZZLE_CLEARANCE);
                shot = Some((muzzle, body.rotation));
                body.velocity -= facing * t.shoot_recoil;
            }
        }
        body.velocity /= 1.0 + t.drag * dt;
        body.angular_velocity /= 1.0 + t.angular_drag * dt;
    }

    if let Some((muzzle, rotation)) = shot {
        state.spawn_bullet(muzzle, rotation, t.bullet, Some(id), LAYER_ENEMY_SIDE);
        ship.last_shot_time = now;
    }
}

fn update_enemy(
    state: &mut GameState,
    id: EntityId,
    body_id: BodyId,
    ship: &mut super::entity::EnemyShip,
    player: Option<(EntityId, Vec2)>,
    dt: f32,
) {
    if ship.vitals.is_dead() {
        return;
    }
    let stunned = ship.vitals.is_stunned();

    match &mut ship.ai {
        EnemyAi::Boulder {
            tuning,
            move_dir,
            noise_phase,
            pending_bursts,
            ..
        } => {
            let t = tuning.clone();
            if !stunned {
                if state.chance_per_second(t.move_switch_chance_per_sec, dt) {
                    let angle = state.rng.random::<f32>() * std::f32::consts::TAU;
                    *move_dir = Vec2::new(angle.cos(), angle.sin());
                }
                if state.chance_per_second(t.shoot_chance_per_sec, dt) {
                    *pending_bursts += 1;
                }
            }

            let mut spray: Option<(Vec2, f32)> = None;
            if let Some(body) = state.world.body_mut(body_id) {
                if !stunned {
                    body.velocity += *move_dir * t.acceleration * dt;
                    body.angular_velocity +=
                        (state.time + *noise_phase).sin() * t.angular_acceleration * dt;
                }
                body.velocity /= 1.0 + t.drag * dt;
                body.angular_velocity /= 1.0 + t.angular_drag * dt;

                if !stunned && *pending_bursts > 0 {
                    *pending_bursts -= 1;
                    let reach =
                        body.world_circle_radius() + t.bullet.radius + MUZZLE_CLEARANCE;
                    spray = Some((body.world_circle_center(), reach));
                }
            }

            // Fragment spray: every shard flies in its own random direction
            // and kicks the boulder back a little.
            if let Some((center, reach)) = spray {
                let count = state.rng.random_range(t.min_burst..=t.max_burst).max(1);
                let mut recoil = Vec2::ZERO;
                for _ in 0..count {
                    let rotation = state.rng.random::<f32>() * 360.0;
                    let dir = facing_from_degrees(rotation);
                    state.spawn_bullet(center + dir * reach, rotation, t.bullet, Some(id), LAYER_PLAYER_SIDE);
                    recoil -= dir * t.shoot_recoil;
                }
                if let Some(body) = state.world.body_mut(body_id) {
                    body.velocity += recoil;
                }
            }
        }
        EnemyAi::Raider { tuning, burst } => {
            let t = tuning.clone();
            if stunned {
                // A stun mid-burst cancels the rest of the burst.
                *burst = None;
            } else if burst.is_none() && state.chance_per_second(t.burst_chance_per_sec, dt) {
                *burst = Some(Burst {
                    remaining: t.burst_size,
                    next_shot_in: 0.0,
                });
            }

            let mut shot: Option<(Vec2, f32)> = None;
            if let Some(body) = state.world.body_mut(body_id) {
                if !stunned {
                    if let Some((_, target)) = player {
                        let to_target = target - body.position;
                        if to_target.length_squared() > 1e-6 {
                            let goal = heading_degrees(to_target.normalize());
                            body.rotation =
                                crate::move_toward_degrees(body.rotation, goal, t.turn_rate * dt);
                        }
                        if to_target.length() > t.hold_distance {
                            body.velocity += body.facing() * t.acceleration * dt;
                        }
                    }
                    if let Some(b) = burst {
                        b.next_shot_in -= dt;
                        if b.next_shot_in <= 0.0 && b.remaining > 0 {
                            let facing = body.facing();
                            let muzzle = body.world_circle_center()
                                + facing
                                    * (body.world_circle_radius()
                                        + t.bullet.radius
                                        + MUZZLE_CLEARANCE);
                            shot = Some((muzzle, body.rotation));
                            body.velocity -= facing * t.shoot_recoil;
                            b.remaining -= 1;
                            b.next_shot_in = t.burst_gap_secs;
                        }
                        if b.remaining == 0 {
                            *burst = None;
                        }
                    }
                }
                body.velocity /= 1.0 + t.drag * dt;
            }

            if let Some((muzzle, rotation)) = shot {
                state.spawn_bullet(muzzle, rotation, t.bullet, Some(id), LAYER_PLAYER_SIDE);
            }
        }
    }
}

/// Wall response shared by ships: correct penetration, reflect, and damp
/// the rebound by the tuned bounce factor.
fn bounce_off_wall(body: &mut PhysicsBody, point: Vec2, normal: Vec2, bounce: f32) {
    let approaching = body.velocity.dot(normal);
    if approaching >= 0.0 {
        return;
    }
    let center = body.world_circle_center();
    let radius = body.world_circle_radius();
    body.position += point + normal * radius - center;
    body.velocity = reflect(body.velocity, normal);
    body.velocity += normal * approaching * (1.0 - bounce);
}

fn boundary_response(state: &mut GameState, id: BodyId, point: Vec2, normal: Vec2) {
    let Some(index) = state.entities.iter().position(|e| e.body == id) else {
        return;
    };
    if state.entities[index].despawn {
        return;
    }
    let entity = &mut state.entities[index];
    match &mut entity.kind {
        EntityKind::Bullet(_) => {
            entity.despawn = true;
            state
                .events
                .push(GameEvent::BulletExploded { position: point });
        }
        EntityKind::Player(ship) => {
            let bounce = ship.tuning.wall_bounce;
            if let Some(body) = state.world.body_mut(id) {
                bounce_off_wall(body, point, normal, bounce);
            }
        }
        EntityKind::Enemy(ship) => {
            let bounce = match &mut ship.ai {
                EnemyAi::Boulder {
                    tuning, move_dir, ..
                } => {
                    // Wandering into a wall turns the wander around too.
                    if move_dir.dot(normal) < 0.0 {
                        *move_dir = reflect(*move_dir, normal);
                    }
                    tuning.wall_bounce
                }
                EnemyAi::Raider { tuning, .. } => tuning.wall_bounce,
            };
            if let Some(body) = state.world.body_mut(id) {
                bounce_off_wall(body, point, normal, bounce);
            }
        }
        EntityKind::Shield(_) | EntityKind::Attractor(_) => {}
    }
}

/// What a contact responder needs to know about the body it touched.
#[derive(Clone, Copy)]
enum OtherInfo {
    Ship {
        id: EntityId,
        dead: bool,
    },
    Bullet {
        origin: Option<EntityId>,
        tuning: super::config::BulletTuning,
        /// Unit flight direction, zero if the bullet is somehow at rest
        dir: Vec2,
    },
    Shield {
        active: bool,
        stun_secs: f32,
        impulse: f32,
        angular_impulse: f32,
    },
    Attractor,
}

fn body_response(
    state: &mut GameState,
    id: BodyId,
    other: BodyId,
    point: Vec2,
    normal: Vec2,
    dt: f32,
) {
    let now = state.time;
    let Some(my_layer) = state.world.body(id).map(|b| b.layer) else {
        return;
    };
    let Some(other_body) = state.world.body(other) else {
        return;
    };
    let other_layer = other_body.layer;
    let other_dir = other_body.velocity.normalize_or_zero();

    let Some(other_entity) = state.entity_by_body(other) else {
        return;
    };
    let info = match &other_entity.kind {
        EntityKind::Player(ship) => OtherInfo::Ship {
            id: other_entity.id,
            dead: ship.vitals.is_dead(),
        },
        EntityKind::Enemy(ship) => OtherInfo::Ship {
            id: other_entity.id,
            dead: ship.vitals.is_dead(),
        },
        EntityKind::Bullet(bullet) => OtherInfo::Bullet {
            origin: bullet.origin,
            tuning: bullet.tuning,
            dir: other_dir,
        },
        EntityKind::Shield(station) => OtherInfo::Shield {
            active: station.shield.is_active(),
            stun_secs: station.shield.contact_stun_secs,
            impulse: station.shield.contact_stun_impulse,
            angular_impulse: station.shield.contact_stun_angular_impulse,
        },
        EntityKind::Attractor(_) => OtherInfo::Attractor,
    };

    let Some(index) = state.entities.iter().position(|e| e.body == id) else {
        return;
    };
    if state.entities[index].despawn {
        return;
    }

    match &state.entities[index].kind {
        EntityKind::Bullet(_) => {
            bullet_contact(state, index, my_layer, other_layer, point, info);
        }
        EntityKind::Player(_) | EntityKind::Enemy(_) => {
            ship_contact(state, index, my_layer, other_layer, normal, now, info);
        }
        EntityKind::Shield(_) => {
            shield_contact(state, index, my_layer, other_layer, info);
        }
        EntityKind::Attractor(_) => {
            attractor_contact(state, index, id, other, other_layer, normal, dt, info);
        }
    }
}

/// A bullet destroys itself against anything it meaningfully hit; the hit
/// object's own mirrored contact applies the damage.
fn bullet_contact(
    state: &mut GameState,
    index: usize,
    my_layer: i32,
    other_layer: i32,
    point: Vec2,
    info: OtherInfo,
) {
    let my_origin = match &state.entities[index].kind {
        EntityKind::Bullet(b) => b.origin,
        _ => return,
    };
    let explode = match info {
        OtherInfo::Ship { id, dead } => {
            other_layer == my_layer && Some(id) != my_origin && !dead
        }
        OtherInfo::Shield { active, .. } => other_layer == my_layer && active,
        // Opposing bullets annihilate; fragments from the same origin pass
        // through each other.
        OtherInfo::Bullet { origin, .. } => other_layer != my_layer && origin != my_origin,
        OtherInfo::Attractor => false,
    };
    if explode {
        state.entities[index].despawn = true;
        state
            .events
            .push(GameEvent::BulletExploded { position: point });
    }
}

fn ship_contact(
    state: &mut GameState,
    index: usize,
    my_layer: i32,
    other_layer: i32,
    normal: Vec2,
    now: f32,
    info: OtherInfo,
) {
    let my_id = state.entities[index].id;
    let body_id = state.entities[index].body;
    let mut score_points = 0i64;

    match info {
        OtherInfo::Bullet {
            origin,
            tuning,
            dir,
            ..
        } => {
            // A bullet hits ships on its own layer, never its shooter.
            if other_layer != my_layer || origin == Some(my_id) {
                return;
            }
            let entity = &mut state.entities[index];
            let Some(vitals) = entity.vitals_mut() else {
                return;
            };
            if vitals.is_dead() {
                return;
            }
            let result = vitals.damage(tuning.damage, now);
            score_points = (result.delta * vitals.score_per_damage as f32).floor() as i64;
            if tuning.stun_secs > 0.0 {
                vitals.stun(tuning.stun_secs, now);
            }
            let can_push = vitals.can_receive_impulse;
            let delta = result.delta;

            if let EntityKind::Enemy(ship) = &mut entity.kind {
                if let EnemyAi::Boulder {
                    tuning: boulder,
                    accumulated_damage,
                    pending_bursts,
                    ..
                } = &mut ship.ai
                {
                    // Enough chip damage forces extra fragment sprays.
                    *accumulated_damage += delta;
                    while *accumulated_damage >= boulder.damage_per_shot {
                        *accumulated_damage -= boulder.damage_per_shot;
                        *pending_bursts += 1;
                    }
                }
            }

            if can_push {
                let push = if dir.length_squared() > 0.0 { dir } else { -normal };
                if let Some(body) = state.world.body_mut(body_id) {
                    body.velocity += push * tuning.impulse;
                }
            }
        }
        OtherInfo::Ship { dead, .. } => {
            if dead {
                return;
            }
            // Only the player reacts to ramming another ship; enemies bump
            // past each other without a stun response.
            let EntityKind::Player(ship) = &state.entities[index].kind else {
                return;
            };
            let (stun_secs, impulse, angular_impulse) = (
                ship.tuning.collision_stun_secs,
                ship.tuning.collision_stun_impulse,
                ship.tuning.collision_stun_angular_impulse,
            );
            knockback_stun(state, index, body_id, normal, now, stun_secs, impulse, angular_impulse);
        }
        OtherInfo::Shield {
            active,
            stun_secs,
            impulse,
            angular_impulse,
        } => {
            if active {
                knockback_stun(state, index, body_id, normal, now, stun_secs, impulse, angular_impulse);
            }
        }
        OtherInfo::Attractor => {}
    }

    if score_points > 0 {
        state.add_score(score_points);
    }
}

/// Ram response: if the stun lands, the ship is thrown back along the
/// contact normal with a random spin.
#[allow(clippy::too_many_arguments)]
fn knockback_stun(
    state: &mut GameState,
    index: usize,
    body_id: BodyId,
    normal: Vec2,
    now: f32,
    stun_secs: f32,
    impulse: f32,
    angular_impulse: f32,
) {
    let Some(vitals) = state.entities[index].vitals_mut() else {
        return;
    };
    if vitals.stun(stun_secs, now) {
        let spin: f32 = state.rng.random_range(-1.0..=1.0);
        if let Some(body) = state.world.body_mut(body_id) {
            body.velocity = -normal * impulse;
            body.angular_velocity = spin * angular_impulse;
        }
    }
}

fn shield_contact(
    state: &mut GameState,
    index: usize,
    my_layer: i32,
    other_layer: i32,
    info: OtherInfo,
) {
    let OtherInfo::Bullet { tuning, .. } = info else {
        return;
    };
    if other_layer != my_layer {
        return;
    }

    let my_id = state.entities[index].id;
    let body_id = state.entities[index].body;
    let (result, per_damage, on_destroy, attractor_id) = {
        let EntityKind::Shield(station) = &mut state.entities[index].kind else {
            return;
        };
        (
            station.shield.damage(tuning.damage),
            station.shield.score_per_damage,
            station.shield.score_on_destroy,
            station.attractor,
        )
    };

    let points = (result.delta * per_damage as f32).floor() as i64;
    state.add_score(points);

    if result.deactivated {
        let position = state
            .world
            .body(body_id)
            .map(|b| b.position)
            .unwrap_or_default();
        if let Some(region) = state.entity_mut(attractor_id) {
            if let EntityKind::Attractor(region) = &mut region.kind {
                region.attractor.deactivate();
            }
        }
        log::info!("shield objective down");
        state
            .events
            .push(GameEvent::ShieldDeactivated { entity: my_id });
        state.add_score_with_popup(on_destroy as i64, position);
    }
}

/// One-sided pull: the attractor bends bullets of its target layer toward
/// its center, preserving speed. The bullet never reacts on its own side.
#[allow(clippy::too_many_arguments)]
fn attractor_contact(
    state: &mut GameState,
    index: usize,
    id: BodyId,
    other: BodyId,
    other_layer: i32,
    normal: Vec2,
    dt: f32,
    info: OtherInfo,
) {
    let OtherInfo::Bullet { .. } = info else {
        return;
    };
    let EntityKind::Attractor(region) = &state.entities[index].kind else {
        return;
    };
    if !region.attractor.is_active() || other_layer != region.attractor.target_layer {
        return;
    }
    let steer = region.attractor;

    let Some(my_center) = state.world.body(id).map(|b| b.world_circle_center()) else {
        return;
    };
    if let Some(bullet) = state.world.body_mut(other) {
        let dist_sq = (bullet.world_circle_center() - my_center).length_squared();
        bullet.velocity = steer.steer(bullet.velocity, normal, dist_sq, dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::config::{Campaign, EnemyKind, Tuning};

    fn idle() -> TickInput {
        TickInput::default()
    }

    fn new_state(seed: u64) -> GameState {
        GameState::new(seed, Campaign::default(), Tuning::default())
    }

    #[test]
    fn test_determinism_same_seed_same_run() {
        let mut a = new_state(42);
        let mut b = new_state(42);
        let input = TickInput {
            move_dir: Vec2::new(0.3, 1.0),
            shoot_held: true,
            ..TickInput::default()
        };
        for _ in 0..600 {
            tick(&mut a, &input, SIM_DT);
            tick(&mut b, &input, SIM_DT);
        }
        assert_eq!(a.score, b.score);
        assert_eq!(a.entities.len(), b.entities.len());
        let pa = a.player_id().and_then(|id| a.position_of(id));
        let pb = b.player_id().and_then(|id| b.position_of(id));
        assert_eq!(pa, pb);
    }

    #[test]
    fn test_first_tick_announces_level_start() {
        let mut state = new_state(9);
        tick(&mut state, &idle(), SIM_DT);
        assert!(
            state
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::LevelStarted { level: 0 })),
            "level 0 start must be observable after the first tick"
        );
    }

    #[test]
    fn test_player_accelerates_toward_input() {
        let mut state = new_state(1);
        let input = TickInput {
            move_dir: Vec2::Y,
            ..TickInput::default()
        };
        let start = state.position_of(state.player_id().unwrap()).unwrap();
        for _ in 0..60 {
            tick(&mut state, &input, SIM_DT);
        }
        let end = state.position_of(state.player_id().unwrap()).unwrap();
        assert!(end.y > start.y + 1.0);
    }

    #[test]
    fn test_tap_fires_one_bullet() {
        let mut state = new_state(2);
        let press = TickInput {
            shoot_pressed: true,
            shoot_held: true,
            ..TickInput::default()
        };
        tick(&mut state, &press, SIM_DT);
        let bullets = state
            .entities
            .iter()
            .filter(|e| matches!(e.kind, EntityKind::Bullet(_)))
            .count();
        assert_eq!(bullets, 1);
    }

    #[test]
    fn test_bullet_explodes_on_boundary() {
        let mut state = new_state(3);
        let top = state.world.bounds().max;
        state.spawn_bullet(
            Vec2::new(0.0, top.y - 0.3),
            0.0, // facing +Y, straight at the wall
            crate::sim::config::BulletTuning::default(),
            None,
            LAYER_ENEMY_SIDE,
        );
        for _ in 0..30 {
            tick(&mut state, &idle(), SIM_DT);
            if state
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::BulletExploded { .. }))
            {
                return;
            }
        }
        panic!("bullet never exploded on the boundary");
    }

    #[test]
    fn test_bullet_kills_enemy_and_scores() {
        let mut state = new_state(4);
        let enemy = state.spawn_enemy(EnemyKind::Raider, Vec2::new(5.0, 8.0), 0.0, 600.0, 0.0);
        let mut lethal = crate::sim::config::BulletTuning::default();
        lethal.damage = 10_000.0;
        state.spawn_bullet(Vec2::new(5.0, 6.5), 0.0, lethal, None, LAYER_ENEMY_SIDE);

        for _ in 0..120 {
            tick(&mut state, &idle(), SIM_DT);
        }
        assert!(state.entity(enemy).is_none(), "enemy should be destroyed");
        assert!(state.score > 0);
    }

    #[test]
    fn test_stun_aborts_raider_burst() {
        let mut state = new_state(5);
        let enemy = state.spawn_enemy(EnemyKind::Raider, Vec2::new(5.0, 8.0), 0.0, 0.0, 0.0);
        let now = state.time;
        {
            let EntityKind::Enemy(ship) = &mut state.entity_mut(enemy).unwrap().kind else {
                panic!("expected enemy");
            };
            let EnemyAi::Raider { burst, .. } = &mut ship.ai else {
                panic!("expected raider");
            };
            *burst = Some(Burst {
                remaining: 3,
                next_shot_in: 1.0,
            });
            ship.vitals.stun(2.0, now);
        }
        tick(&mut state, &idle(), SIM_DT);
        let EntityKind::Enemy(ship) = &state.entity(enemy).unwrap().kind else {
            panic!("expected enemy");
        };
        let EnemyAi::Raider { burst, .. } = &ship.ai else {
            panic!("expected raider");
        };
        assert!(burst.is_none(), "stun must cancel an in-flight burst");
    }

    #[test]
    fn test_ship_ram_stuns_only_the_player() {
        let mut state = new_state(12);
        let player = state.player_id().unwrap();
        let player_pos = state.position_of(player).unwrap();
        let enemy = state.spawn_enemy(
            EnemyKind::Raider,
            player_pos + Vec2::new(0.6, 0.0),
            0.0,
            0.0,
            0.0,
        );
        tick(&mut state, &idle(), SIM_DT);

        let player_vitals = state.entity(player).unwrap().vitals().unwrap();
        assert!(player_vitals.is_stunned(), "ramming an enemy stuns the player");
        let enemy_vitals = state.entity(enemy).unwrap().vitals().unwrap();
        assert!(
            !enemy_vitals.is_stunned(),
            "enemies have no ship-contact response"
        );
    }

    #[test]
    fn test_boulder_spray_recoils() {
        let mut tuning = Tuning::default();
        // Keep the wander AI still so the spray is the only velocity source.
        tuning.boulder.acceleration = 0.0;
        tuning.boulder.angular_acceleration = 0.0;
        let mut state = GameState::new(14, Campaign::default(), tuning);
        let id = state.spawn_enemy(EnemyKind::Boulder, Vec2::new(5.0, 8.0), 0.0, 0.0, 0.0);
        let body_id = state.entity(id).unwrap().body;
        {
            let EntityKind::Enemy(ship) = &mut state.entity_mut(id).unwrap().kind else {
                panic!("expected enemy");
            };
            let EnemyAi::Boulder { pending_bursts, .. } = &mut ship.ai else {
                panic!("expected boulder");
            };
            *pending_bursts = 1;
        }
        tick(&mut state, &idle(), SIM_DT);

        let body = state.world.body(body_id).unwrap();
        assert!(
            body.velocity.length() > 0.0,
            "the fragment spray should kick the boulder back"
        );
    }

    #[test]
    fn test_player_bounces_off_wall() {
        let mut state = new_state(6);
        let player = state.player_id().unwrap();
        let body_id = state.entity(player).unwrap().body;
        let right = state.world.bounds().max.x;
        {
            let body = state.world.body_mut(body_id).unwrap();
            body.position = Vec2::new(right - 0.2, 5.0);
            body.velocity = Vec2::new(10.0, 0.0);
        }
        tick(&mut state, &idle(), SIM_DT);
        let body = state.world.body(body_id).unwrap();
        assert!(body.velocity.x < 0.0, "velocity should reflect off the wall");
        assert!(
            body.velocity.x.abs() < 10.0,
            "bounce should lose speed along the normal"
        );
    }

    #[test]
    fn test_player_death_ends_the_run() {
        let mut state = new_state(7);
        let player = state.player_id().unwrap();
        let now = state.time;
        state
            .entity_mut(player)
            .unwrap()
            .vitals_mut()
            .unwrap()
            .damage(10_000.0, now);

        let ticks = (DEATH_SHRINK_SECS / SIM_DT) as usize + 10;
        for _ in 0..ticks {
            tick(&mut state, &idle(), SIM_DT);
        }
        assert_eq!(state.phase, RunPhase::Lost);
        assert!(state
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::GameOver { .. })));
        // Terminal state freezes: further ticks change nothing.
        let entities = state.entities.len();
        tick(&mut state, &idle(), SIM_DT);
        assert_eq!(state.entities.len(), entities);
    }

    #[test]
    fn test_shield_damage_scores_and_deactivates() {
        let mut state = new_state(8);
        let shield = state.spawn_shield(Vec2::new(0.0, 10.0));
        let mut lethal = crate::sim::config::BulletTuning::default();
        lethal.damage = 10_000.0;
        state.spawn_bullet(Vec2::new(0.0, 8.8), 0.0, lethal, None, LAYER_ENEMY_SIDE);

        for _ in 0..60 {
            tick(&mut state, &idle(), SIM_DT);
            if state
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::ShieldDeactivated { .. }))
            {
                let EntityKind::Shield(station) = &state.entity(shield).unwrap().kind else {
                    panic!("expected shield");
                };
                assert!(!station.shield.is_active());
                let EntityKind::Attractor(region) =
                    &state.entity(station.attractor).unwrap().kind
                else {
                    panic!("expected attractor");
                };
                assert!(!region.attractor.is_active());
                assert!(state.score > 0);
                return;
            }
        }
        panic!("shield never deactivated");
    }
}

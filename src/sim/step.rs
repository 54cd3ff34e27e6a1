/// The step function: advances the map by one frame.
///
/// Processing order:
///   1. Dead player: rebuild the level, nothing else this frame
///   2. Player motion: gravity/thrust, X pass, contact, Y pass, contact
///   3. Player bookkeeping (fuel, animation, lifecycle)
///   4. Entities, in collection order:
///        creatures  motion, bounce, animation, boss behaviour
///        pickups    animation only
///        projectiles  homing, tile hit, shot resolution
///   5. Compaction of removed entities
///
/// Anything outside NORMAL is frozen in place: it animates and its clock
/// runs, but it does not move.
/// A level change from a portal aborts the rest of the frame.

use glam::Vec2;

use crate::domain::collision::{pixel_collision, sprite_collision, tile_collision, tiles_to_pixels};
use crate::domain::entity::{Body, CreatureKind, LifeState, Owner, PowerUpKind};
use crate::domain::physics::{apply_gravity, step_x, step_y};
use super::event::{Cue, GameEvent};
use super::world::GameMap;

/// Medallion count that opens the portal on each level.
const PORTAL_GATES: [(usize, u32); 4] = [(0, 9), (1, 20), (2, 10), (3, 160)];

const FUEL_PICKUP: f32 = 2500.0;
const AMMO_PICKUP: u32 = 3;
/// Lives granted when the last one is lost.
const LIVES_ON_RESET: u32 = 3;

#[derive(Clone, Copy, Debug)]
pub struct FrameContext {
    /// Milliseconds since the previous frame.
    pub dt_ms: u64,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Flow {
    Continue,
    Reloaded,
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn update(map: &mut GameMap, ctx: FrameContext) -> Vec<GameEvent> {
    let mut events = Vec::new();

    if map.player.life.state() == LifeState::Dead {
        tracing::debug!(level = map.level, "player dead, rebuilding level");
        events.extend(map.initialize());
        return events;
    }

    if move_player(map, ctx.dt_ms, &mut events) == Flow::Reloaded {
        return events;
    }
    map.player.update(ctx.dt_ms);

    let count = map.entities.len();
    for i in 0..count {
        if map.entities[i].removed { continue; }
        match map.entities[i].body {
            Body::Creature(_) => {
                if map.entities[i].life_state() == Some(LifeState::Dead) {
                    map.entities[i].removed = true;
                    continue;
                }
                update_creature(map, i, ctx.dt_ms, &mut events);
            }
            Body::PowerUp(_) => map.entities[i].sprite.advance(ctx.dt_ms),
            Body::Projectile(_) => update_projectile(map, i, ctx.dt_ms, &mut events),
            Body::Decoration => {}
        }
    }

    map.entities.retain(|e| !e.removed);
    map.follow_player();
    events
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

fn move_player(map: &mut GameMap, dt: u64, events: &mut Vec<GameEvent>) -> Flow {
    if !map.player.life.is_normal() {
        return Flow::Continue;
    }
    let dt_f = dt as f32;
    let gravity = map.config.physics.gravity;
    let thrust = map.player.thrust_amount();
    apply_gravity(&mut map.player.sprite.vel, gravity, thrust, dt_f);

    let step = step_x(&map.tiles, map.tile_size, &map.player.sprite, dt_f);
    if step.blocked {
        map.player.collide_horizontal();
    }
    map.player.set_position(step.pos);
    if check_player_collision(map, events) == Flow::Reloaded {
        return Flow::Reloaded;
    }

    let old_y = map.player.sprite.pos.y;
    let step = step_y(&map.tiles, map.tile_size, &map.player.sprite, dt_f);
    if step.blocked {
        map.player.collide_vertical();
    }
    map.player.set_position(step.pos);
    map.player_descending = step.pos.y > old_y;
    check_player_collision(map, events)
}

/// Resolve the first entity the player touches, if any.
fn check_player_collision(map: &mut GameMap, events: &mut Vec<GameEvent>) -> Flow {
    if !map.player.life.is_normal() {
        return Flow::Continue;
    }
    let Some(j) = sprite_collision(&map.player, &map.entities) else {
        return Flow::Continue;
    };
    if !pixel_collision(&map.player.sprite, &map.entities[j].sprite) {
        return Flow::Continue;
    }

    let contact = match &map.entities[j].body {
        Body::Creature(c) if c.is_lava() => Contact::Lava,
        Body::Creature(_) => Contact::Hostile,
        Body::Projectile(p) if p.owner == Owner::Enemy => Contact::Hostile,
        Body::PowerUp(kind) => Contact::Pickup(*kind),
        Body::Projectile(_) | Body::Decoration => Contact::Harmless,
    };

    match contact {
        Contact::Lava => {
            tracing::debug!("player fell into lava");
            map.medallions = 0;
            kill_player(map);
            events.push(GameEvent::Sound(Cue::Hurt));
        }
        Contact::Hostile => hurt_player(map, events),
        Contact::Pickup(kind) => {
            map.entities[j].removed = true;
            return acquire(map, kind, events);
        }
        Contact::Harmless => {}
    }
    Flow::Continue
}

enum Contact {
    Lava,
    Hostile,
    Pickup(PowerUpKind),
    Harmless,
}

fn kill_player(map: &mut GameMap) {
    let player = &mut map.player;
    player.life.set_state(LifeState::Dying, &mut player.sprite);
    player.jetpack_off();
}

/// The last life restarts the game with fresh lives, then the hit is charged
/// against them like any other: a final death leaves `LIVES_ON_RESET`.
fn hurt_player(map: &mut GameMap, events: &mut Vec<GameEvent>) {
    if map.lives == 1 {
        tracing::info!(level = map.level, "last life lost, back to level 0");
        map.level = 0;
        map.medallions = 0;
        map.ammo = map.config.player.ammo;
        map.lives += LIVES_ON_RESET;
        events.push(GameEvent::Sound(Cue::FinalDeath));
        events.push(GameEvent::GameReset);
    }
    if map.lives > 1 {
        map.lives -= 1;
        map.medallions = 0;
        events.push(GameEvent::Sound(Cue::Hurt));
        events.push(GameEvent::PlayerHurt { lives: map.lives });
    }
    kill_player(map);
}

fn acquire(map: &mut GameMap, kind: PowerUpKind, events: &mut Vec<GameEvent>) -> Flow {
    match kind {
        PowerUpKind::Star => {
            if map.config.audio.event_sounds {
                map.medallions += 1;
                events.push(GameEvent::Sound(Cue::Prize));
            }
        }
        PowerUpKind::Music => {}
        PowerUpKind::Heart => {
            if PORTAL_GATES.contains(&(map.level, map.medallions)) {
                tracing::info!(level = map.level, medallions = map.medallions, "portal opened");
                events.push(GameEvent::Sound(Cue::Portal));
                map.level += 1;
                map.medallions = 0;
                events.extend(map.initialize());
                return Flow::Reloaded;
            }
        }
        PowerUpKind::AmmoBox => {
            map.ammo += AMMO_PICKUP;
            events.push(GameEvent::Sound(Cue::Ammo));
        }
        PowerUpKind::Power => {
            map.player.add_fuel(FUEL_PICKUP);
            events.push(GameEvent::Sound(Cue::Boost));
        }
        PowerUpKind::ExtraLife => {
            if map.lives > 0 {
                map.lives += 1;
                events.push(GameEvent::Sound(Cue::ExtraLife));
            }
        }
    }
    Flow::Continue
}

// ══════════════════════════════════════════════════════════════
// Creatures
// ══════════════════════════════════════════════════════════════

fn update_creature(map: &mut GameMap, i: usize, dt: u64, events: &mut Vec<GameEvent>) {
    let normal = map.entities[i].creature().map_or(false, |c| c.life.is_normal());
    if normal {
        move_creature(map, i, dt);
    }
    map.entities[i].update_creature(dt);
    update_boss(map, i, events);
}

fn move_creature(map: &mut GameMap, i: usize, dt: u64) {
    let dt_f = dt as f32;
    let gravity = map.config.physics.gravity;
    let e = &mut map.entities[i];
    if !e.is_flying() {
        apply_gravity(&mut e.sprite.vel, gravity, 0.0, dt_f);
    }

    let step = step_x(&map.tiles, map.tile_size, &e.sprite, dt_f);
    if step.blocked {
        e.collide_horizontal();
    }
    e.sprite.pos = step.pos;

    let step = step_y(&map.tiles, map.tile_size, &e.sprite, dt_f);
    if step.blocked {
        e.collide_vertical();
    }
    e.sprite.pos = step.pos;

    // Creatures turn around on touching anything but a projectile.
    if let Some(j) = sprite_collision(&map.entities[i], &map.entities) {
        if !map.entities[j].is_projectile()
            && pixel_collision(&map.entities[i].sprite, &map.entities[j].sprite)
        {
            map.entities[i].sprite.vel = -map.entities[i].sprite.vel;
        }
    }
}

fn update_boss(map: &mut GameMap, i: usize, events: &mut Vec<GameEvent>) {
    let GameMap { entities, rng, config, tiles, tile_size, player, .. } = map;
    let e = &mut entities[i];
    let Body::Creature(c) = &mut e.body else { return };
    if !c.life.is_normal() { return; }
    let state_time = c.life.state_time();
    let CreatureKind::Boss(boss) = &mut c.kind else { return };

    let plan = boss.plan(state_time, &config.boss, rng);
    if let Some(frac) = plan.teleport {
        let max_x = tiles_to_pixels(tiles.width() as i32 - 1, *tile_size);
        let max_y = tiles_to_pixels(tiles.height() as i32 - 1, *tile_size);
        e.sprite.pos = Vec2::new(frac.x * max_x, frac.y * max_y);
        tracing::debug!(x = e.sprite.pos.x, y = e.sprite.pos.y, "boss teleported");
    }
    let Some(spit) = plan.spit else { return };

    let mut origin = e.sprite.pos;
    if spit.right_claw {
        origin.x += config.boss.claw_offset;
    }
    let speed = config.boss.spit_speed;
    let vel = if spit.aim_at_player {
        (player.sprite.pos - origin).normalize_or_zero() * speed
    } else {
        spit.direction * speed
    };
    let template = if spit.homing {
        config.boss.homing_template.clone()
    } else {
        config.boss.spit_template.clone()
    };

    if let Some(k) = map.spawn_at(&template, origin) {
        let goo = &mut map.entities[k];
        goo.sprite.vel = vel;
        if let Body::Projectile(p) = &mut goo.body {
            p.homing |= spit.homing;
        }
        events.push(GameEvent::BossSpat { id: goo.id });
    }
}

// ══════════════════════════════════════════════════════════════
// Projectiles
// ══════════════════════════════════════════════════════════════

fn update_projectile(map: &mut GameMap, i: usize, dt: u64, events: &mut Vec<GameEvent>) {
    let Body::Projectile(proj) = map.entities[i].body else { return };

    if proj.homing {
        let p = &map.player.sprite;
        let target = p.pos + Vec2::new(p.width() as f32, p.height() as f32) / 2.0;
        let speed = map.config.physics.homing_speed;
        let s = &mut map.entities[i].sprite;
        s.vel = (target - s.pos).normalize_or_zero() * speed;
    }

    let candidate = {
        let s = &map.entities[i].sprite;
        s.pos + s.vel * dt as f32
    };
    if tile_collision(&map.tiles, map.tile_size, &map.entities[i].sprite, candidate).is_some() {
        map.entities[i].removed = true;
        return;
    }

    if proj.owner == Owner::Player {
        if let Some(j) = sprite_collision(&map.entities[i], &map.entities) {
            let shootable = map.entities[j].creature().map_or(false, |c| c.is_shootable());
            if shootable {
                let id = map.entities[j].id;
                map.entities[j].kill();
                map.entities[i].removed = true;
                tracing::debug!(id, "creature shot");
                events.push(GameEvent::Sound(Cue::Hit));
                events.push(GameEvent::CreatureShot { id });
                return;
            }
        }
    }

    map.entities[i].sprite.pos = candidate;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::config::GameConfig;
    use crate::domain::entity::{EntityKind, Projectile};
    use crate::sim::assets::tests::fixture;

    fn map_with(levels: &[&str], cfg: impl FnOnce(&mut GameConfig)) -> GameMap {
        let mut config = GameConfig::default();
        config.general.seed = Some(42);
        cfg(&mut config);
        GameMap::new(Arc::new(fixture(levels)), config).unwrap()
    }

    /// One open row, eleven tiles wide.
    const WIDE: &str = "0          \n";

    fn map(levels: &[&str]) -> GameMap {
        map_with(levels, |_| {})
    }

    fn frame(map: &mut GameMap, dt_ms: u64) -> Vec<GameEvent> {
        update(map, FrameContext { dt_ms })
    }

    /// Put the player's box exactly on entity `j`.
    fn touch(map: &mut GameMap, j: usize) {
        map.player.sprite.pos = map.entities[j].sprite.pos;
        map.player.sprite.vel = Vec2::ZERO;
    }

    #[test]
    fn player_falls_and_lands_on_floor() {
        let mut m = map(&["0 \n  \nAA\n"]);
        for _ in 0..200 {
            frame(&mut m, 16);
            if m.player.on_ground { break; }
        }
        assert!(m.player.on_ground);
        assert_eq!(m.player.sprite.pos.y, 64.0 - 32.0);
        assert_eq!(m.player.sprite.vel.y, 0.0);
    }

    #[test]
    fn heart_opens_portal_at_gate_count() {
        let mut m = map(&["0  h\n", "0\n"]);
        m.medallions = 9;
        touch(&mut m, 0);
        let events = frame(&mut m, 0);
        assert!(events.contains(&GameEvent::Sound(Cue::Portal)));
        assert!(events.contains(&GameEvent::LevelLoaded { level: 1 }));
        assert_eq!((m.level, m.medallions), (1, 0));
    }

    #[test]
    fn heart_below_gate_is_just_consumed() {
        let mut m = map(&["0  h\n", "0\n"]);
        m.medallions = 8;
        touch(&mut m, 0);
        let events = frame(&mut m, 0);
        assert!(events.is_empty());
        assert_eq!((m.level, m.medallions), (0, 8));
        assert!(m.entities.is_empty());
    }

    #[test]
    fn shipped_levels_hold_exactly_their_gate_in_stars() {
        use crate::sim::assets::Resources;
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/assets.toml");
        let res = Resources::load(&path).unwrap();
        // the boss level is left out
        for &(level, gate) in &PORTAL_GATES[..3] {
            let def = res.level(level).unwrap();
            let stars = def.spawns.iter()
                .filter(|s| res.template(&s.template).map_or(false, |t| t.kind == EntityKind::Star))
                .count();
            assert_eq!(stars as u32, gate, "level {level}");
        }
    }

    #[test]
    fn star_counts_only_with_event_sounds() {
        let mut m = map(&["0  *\n"]);
        touch(&mut m, 0);
        assert_eq!(frame(&mut m, 0), vec![GameEvent::Sound(Cue::Prize)]);
        assert_eq!(m.medallions, 1);

        let mut m = map_with(&["0  *\n"], |c| c.audio.event_sounds = false);
        touch(&mut m, 0);
        assert!(frame(&mut m, 0).is_empty());
        assert_eq!(m.medallions, 0);
        assert!(m.entities.is_empty());
    }

    #[test]
    fn pickups_grant_ammo_fuel_and_lives() {
        let mut m = map(&["0 a p +\n"]);
        m.player.fuel = 7000.0;
        // each pickup is compacted away, so the next one moves to index 0
        for _ in 0..3 {
            touch(&mut m, 0);
            frame(&mut m, 0);
        }
        assert!(m.entities.is_empty());
        assert_eq!(m.ammo, 3 + 3);
        assert_eq!(m.player.fuel, 7500.0);
        assert_eq!(m.lives, 4);
    }

    #[test]
    fn music_pickup_is_silent() {
        let mut m = map(&["0  m\n"]);
        touch(&mut m, 0);
        assert!(frame(&mut m, 0).is_empty());
        assert!(m.entities.is_empty());
    }

    #[test]
    fn creature_contact_costs_a_life() {
        let mut m = map(&["0  g\n"]);
        m.medallions = 5;
        touch(&mut m, 0);
        let events = frame(&mut m, 0);
        assert_eq!(events, vec![GameEvent::Sound(Cue::Hurt), GameEvent::PlayerHurt { lives: 2 }]);
        assert_eq!(m.medallions, 0);
        assert_eq!(m.player.life.state(), LifeState::Dying);
    }

    #[test]
    fn final_death_resets_counters_and_grants_lives() {
        let mut m = map(&["0\n", "0  g\n"]);
        m.level = 1;
        m.initialize();
        m.lives = 1;
        m.ammo = 0;
        m.medallions = 7;
        touch(&mut m, 0);
        let events = frame(&mut m, 0);
        assert_eq!(
            events,
            vec![
                GameEvent::Sound(Cue::FinalDeath),
                GameEvent::GameReset,
                GameEvent::Sound(Cue::Hurt),
                GameEvent::PlayerHurt { lives: 3 },
            ]
        );
        assert_eq!((m.level, m.lives, m.medallions, m.ammo), (0, 3, 0, 3));
        assert_eq!(m.player.life.state(), LifeState::Dying);
    }

    #[test]
    fn lava_kills_without_costing_a_life() {
        let mut m = map(&["0  l\n"]);
        m.medallions = 3;
        touch(&mut m, 0);
        assert_eq!(frame(&mut m, 0), vec![GameEvent::Sound(Cue::Hurt)]);
        assert_eq!((m.lives, m.medallions), (3, 0));
        assert_eq!(m.player.life.state(), LifeState::Dying);
    }

    #[test]
    fn dying_player_is_frozen_then_level_rebuilds() {
        let mut m = map(&["0  g\n"]);
        touch(&mut m, 0);
        frame(&mut m, 0);
        let pos = m.player.sprite.pos;
        frame(&mut m, 600);
        assert_eq!(m.player.sprite.pos, pos);
        frame(&mut m, 500);
        assert_eq!(m.player.life.state(), LifeState::Dead);
        let events = frame(&mut m, 16);
        assert_eq!(events, vec![GameEvent::LevelLoaded { level: 0 }]);
        assert!(m.player.life.is_normal());
        assert_eq!(m.lives, 2);
    }

    #[test]
    fn jetpack_burns_fuel_per_ms() {
        let mut m = map(&["0 \nAA\n"]);
        m.player.fuel = 100.0;
        m.player.jetpack_on();
        frame(&mut m, 50);
        assert_eq!(m.player.fuel, 100.0 - m.player.burn_rate * 50.0);
        m.player.jetpack_off();
        frame(&mut m, 50);
        assert_eq!(m.player.fuel, 50.0);
    }

    #[test]
    fn projectile_removed_on_first_tile_contact() {
        // bullet spawned at tile 1, wall at tile 4; 0.55 px/ms
        let mut m = map(&["0x  A\nAAAAA\n"]);
        let id = m.entities[0].id;
        let mut frames = 0;
        loop {
            let e = m.entities.iter().find(|e| e.id == id).unwrap();
            let candidate = e.sprite.pos + e.sprite.vel * 16.0;
            let blocked = tile_collision(&m.tiles, m.tile_size, &e.sprite, candidate).is_some();
            frame(&mut m, 16);
            frames += 1;
            let kept = m.entities.iter().find(|e| e.id == id);
            assert_eq!(kept.is_none(), blocked, "frame {frames}");
            match kept {
                Some(e) => assert_eq!(e.sprite.pos, candidate),
                None => break,
            }
            assert!(frames < 100);
        }
        assert!(frames > 1);
        frame(&mut m, 16);
        assert!(m.entities.iter().all(|e| e.id != id));
    }

    #[test]
    fn player_bullet_kills_shootable_creature() {
        let mut m = map(&[WIDE]);
        let g = m.spawn_at("grub", Vec2::new(200.0, 0.0)).unwrap();
        let b = m.spawn_at("blast", Vec2::new(197.0, 0.0)).unwrap();
        let (gid, bid) = (m.entities[g].id, m.entities[b].id);
        let events = frame(&mut m, 1);
        assert!(events.contains(&GameEvent::CreatureShot { id: gid }));
        assert!(m.entities.iter().all(|e| e.id != bid));
        let grub = m.entities.iter().find(|e| e.id == gid).unwrap();
        assert_eq!(grub.life_state(), Some(LifeState::Dying));
    }

    #[test]
    fn lava_ignores_player_bullets() {
        let mut m = map(&[WIDE]);
        let l = m.spawn_at("lava", Vec2::new(200.0, 0.0)).unwrap();
        let b = m.spawn_at("blast", Vec2::new(198.0, 0.0)).unwrap();
        let lid = m.entities[l].id;
        let events = frame(&mut m, 1);
        assert!(events.is_empty());
        assert!(m.entities[b].sprite.pos.x > 198.0);
        assert!(m.entities.iter().any(|e| e.id == lid && e.life_state() == Some(LifeState::Normal)));
    }

    #[test]
    fn dead_creatures_are_compacted() {
        let mut m = map(&["0  g\n"]);
        m.entities[0].kill();
        frame(&mut m, 600);
        frame(&mut m, 500);
        assert_eq!(m.entities.len(), 1);
        frame(&mut m, 16);
        assert!(m.entities.is_empty());
    }

    #[test]
    fn creatures_bounce_off_walls() {
        let mut m = map(&["A g A\nAAAAA\n0\n"]);
        m.entities[0].wake_up();
        let mut turned = false;
        for _ in 0..400 {
            frame(&mut m, 16);
            if m.entities[0].sprite.vel.x > 0.0 {
                turned = true;
                break;
            }
        }
        assert!(turned);
        assert_eq!(m.entities[0].sprite.animation_name(), "right");
    }

    #[test]
    fn creatures_bounce_off_each_other() {
        let mut m = map(&[WIDE]);
        let a = m.spawn_at("grub", Vec2::new(100.0, 0.0)).unwrap();
        let b = m.spawn_at("grub", Vec2::new(102.0, 0.0)).unwrap();
        m.entities[a].sprite.vel.x = 0.05;
        m.entities[b].sprite.vel.x = -0.05;
        frame(&mut m, 1);
        assert_eq!(m.entities[a].sprite.vel.x, -0.05);
        assert_eq!(m.entities[b].sprite.vel.x, 0.05);
        assert_eq!(m.entities[a].sprite.animation_name(), "left");
        assert_eq!(m.entities[b].sprite.animation_name(), "right");
    }

    #[test]
    fn boss_teleports_inside_the_map() {
        let mut m = map_with(&["0     \n      \n  b   \nAAAAAA\n"], |c| {
            c.boss.teleport_chance = 1.0;
            c.boss.spit_interval_ms = u64::MAX;
        });
        let max_x = tiles_to_pixels(6 - 1, m.tile_size);
        let max_y = tiles_to_pixels(4 - 1, m.tile_size);
        let mut last = m.entities[0].sprite.pos;
        let mut moved = 0;
        for _ in 0..40 {
            frame(&mut m, 16);
            let pos = m.entities[0].sprite.pos;
            assert!((0.0..=max_x).contains(&pos.x), "x out of bounds: {pos:?}");
            assert!((0.0..=max_y).contains(&pos.y), "y out of bounds: {pos:?}");
            if pos != last {
                moved += 1;
            }
            last = pos;
        }
        assert_eq!(m.entities.len(), 1);
        assert!(moved > 30);
    }

    #[test]
    fn boss_spits_with_a_seeded_rng() {
        let mut m = map_with(&["0     \n      \n  b   \nAAAAAA\n"], |c| {
            c.boss.teleport_chance = 0.0;
        });
        let mut spat = None;
        for _ in 0..400 {
            let events = frame(&mut m, 16);
            if let Some(GameEvent::BossSpat { id }) = events.iter().find(|e| matches!(e, GameEvent::BossSpat { .. })) {
                spat = Some(*id);
                break;
            }
        }
        let id = spat.expect("boss never spat");
        let goo = m.entities.iter().find(|e| e.id == id).unwrap();
        assert_eq!(goo.kind, EntityKind::EnemyProjectile);
        assert!(matches!(goo.body, Body::Projectile(Projectile { owner: Owner::Enemy, .. })));
        let speed = goo.sprite.vel.length();
        let cfg = GameConfig::default();
        assert!((speed - cfg.boss.spit_speed).abs() < 1e-3 || (speed - cfg.physics.homing_speed).abs() < 1e-3);
    }

    #[test]
    fn homing_goo_steers_toward_player() {
        let mut m = map(&[WIDE]);
        let k = m.spawn_at("goo2", Vec2::new(300.0, 300.0)).unwrap();
        frame(&mut m, 16);
        let goo = &m.entities[k];
        assert!(goo.sprite.vel.x < 0.0 && goo.sprite.vel.y < 0.0);
        assert!((goo.sprite.vel.length() - 0.05).abs() < 1e-4);
    }

    #[test]
    fn entities_spawned_mid_frame_wait_a_frame() {
        let mut m = map_with(&["0     \n      \n  b   \nAAAAAA\n"], |c| {
            c.boss.teleport_chance = 0.0;
            c.boss.spit_interval_ms = 1;
            c.boss.homing_chance = 0.0;
            c.boss.aim_chance = 0.0;
        });
        let events = frame(&mut m, 16);
        let Some(GameEvent::BossSpat { id }) = events.last().cloned() else {
            panic!("expected a spit, got {events:?}");
        };
        let goo = m.entities.iter().find(|e| e.id == id).unwrap();
        let boss = &m.entities[0];
        assert!(goo.sprite.pos == boss.sprite.pos
            || goo.sprite.pos == boss.sprite.pos + Vec2::new(m.config.boss.claw_offset, 0.0));
    }
}

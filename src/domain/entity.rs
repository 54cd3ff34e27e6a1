/// Entities: the player, creatures, pickups, projectiles and decorations.
///
/// Templates are built once from the asset manifest and shared; instances
/// carry only their sprite (position, velocity, playheads) and the state
/// their kind needs. Dispatch is an exhaustive match on `Body`.

use std::sync::Arc;

use glam::Vec2;
use rand::Rng;

use crate::config::{BossConfig, GameConfig};
use super::animation::AnimationSet;
use super::collision::round_px;
use super::sprite::Sprite;

/// Kind tag from the manifest's `type` field.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EntityKind {
    Player,
    Creature,
    Sprite,
    Grub,
    Fly,
    Alien,
    Fireball,
    Lava,
    FinalBoss,
    PowerUp,
    Star,
    Music,
    Heart,
    AmmoBox,
    Power,
    Projectile,
    Bullet,
    EnemyProjectile,
}

impl EntityKind {
    pub fn from_tag(tag: &str) -> Option<EntityKind> {
        let kind = match tag {
            "Player" => EntityKind::Player,
            "Creature" => EntityKind::Creature,
            "Sprite" => EntityKind::Sprite,
            "Grub" => EntityKind::Grub,
            "Fly" => EntityKind::Fly,
            "Alien" => EntityKind::Alien,
            "Fireball" => EntityKind::Fireball,
            "Lava" => EntityKind::Lava,
            "FinalBoss" => EntityKind::FinalBoss,
            "PowerUp" => EntityKind::PowerUp,
            "Star" => EntityKind::Star,
            "Music" => EntityKind::Music,
            "Heart" => EntityKind::Heart,
            "AmmoBox" => EntityKind::AmmoBox,
            "Power" => EntityKind::Power,
            "Projectile" => EntityKind::Projectile,
            "Bullet" => EntityKind::Bullet,
            "EnemyProjectile" => EntityKind::EnemyProjectile,
            _ => return None,
        };
        Some(kind)
    }
}

/// Immutable definition shared by every instance spawned from it.
#[derive(Debug)]
pub struct Template {
    pub name: String,
    pub kind: EntityKind,
    pub anims: Arc<AnimationSet>,
}

// ══════════════════════════════════════════════════════════════
// Lifecycle
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LifeState {
    Normal,
    Dying,
    Dead,
}

#[derive(Clone, Debug)]
pub struct Lifecycle {
    state: LifeState,
    /// Milliseconds spent in the current state.
    state_time: u64,
    die_time: u64,
}

impl Lifecycle {
    pub fn new(die_time: u64) -> Self {
        Lifecycle { state: LifeState::Normal, state_time: 0, die_time }
    }

    pub fn state(&self) -> LifeState { self.state }
    pub fn state_time(&self) -> u64 { self.state_time }
    pub fn is_normal(&self) -> bool { self.state == LifeState::Normal }

    /// Change state. Entering DYING stops the sprite and switches to the
    /// matching death animation.
    pub fn set_state(&mut self, state: LifeState, sprite: &mut Sprite) {
        if state == self.state { return; }
        self.state = state;
        self.state_time = 0;
        if state == LifeState::Dying {
            sprite.vel = Vec2::ZERO;
            if sprite.faces_left() {
                sprite.set_animation("deadLeft");
            } else if sprite.faces_right() {
                sprite.set_animation("deadRight");
            }
        }
    }

    /// Return to NORMAL without touching the clock.
    fn revive(&mut self) {
        self.state = LifeState::Normal;
    }

    pub fn tick(&mut self, dt: u64) {
        self.state_time += dt;
        if self.state == LifeState::Dying && self.state_time > self.die_time {
            self.state = LifeState::Dead;
            self.state_time = 0;
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Creatures
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub enum CreatureKind {
    Basic,
    Grub,
    Fly,
    Alien,
    Fireball,
    Lava,
    Boss(BossState),
}

#[derive(Clone, Debug)]
pub struct Creature {
    pub kind: CreatureKind,
    pub life: Lifecycle,
    pub max_speed: f32,
}

impl Creature {
    pub fn is_flying(&self) -> bool {
        matches!(self.kind, CreatureKind::Fly | CreatureKind::Alien | CreatureKind::Fireball)
            && self.life.is_normal()
    }

    pub fn is_lava(&self) -> bool {
        matches!(self.kind, CreatureKind::Lava)
    }

    /// Lava and fireballs shrug off player shots.
    pub fn is_shootable(&self) -> bool {
        !matches!(self.kind, CreatureKind::Lava | CreatureKind::Fireball)
    }
}

#[derive(Clone, Debug)]
pub struct BossState {
    pub lives: u32,
    pub last_spit: u64,
    pub spit_follows: bool,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct SpitPlan {
    pub homing: bool,
    pub right_claw: bool,
    pub aim_at_player: bool,
    /// Random unit vector, used unless aiming.
    pub direction: Vec2,
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct BossPlan {
    /// Fractions of the map extent to teleport to.
    pub teleport: Option<Vec2>,
    pub spit: Option<SpitPlan>,
}

impl BossState {
    pub fn new(cfg: &BossConfig) -> Self {
        BossState { lives: cfg.lives, last_spit: 0, spit_follows: cfg.spit_follows }
    }

    /// Roll this frame's behaviour. Spitting becomes likelier with the
    /// square of the time since the last spit, in units of the interval.
    pub fn plan<R: Rng>(&mut self, state_time: u64, cfg: &BossConfig, rng: &mut R) -> BossPlan {
        let mut plan = BossPlan::default();
        if rng.gen::<f64>() < cfg.teleport_chance {
            plan.teleport = Some(Vec2::new(rng.gen(), rng.gen()));
        }
        let since = state_time.saturating_sub(self.last_spit) as f64;
        let ramp = (since / cfg.spit_interval_ms as f64).powi(2);
        if rng.gen::<f64>() < ramp {
            let homing = self.spit_follows && rng.gen::<f64>() < cfg.homing_chance;
            let right_claw = rng.gen::<bool>();
            let angle = rng.gen::<f32>() * std::f32::consts::TAU;
            let aim_at_player = rng.gen::<f64>() < cfg.aim_chance;
            plan.spit = Some(SpitPlan {
                homing,
                right_claw,
                aim_at_player,
                direction: Vec2::new(angle.cos(), angle.sin()),
            });
            self.last_spit = state_time;
        }
        plan
    }
}

// ══════════════════════════════════════════════════════════════
// Pickups and projectiles
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PowerUpKind {
    Star,
    Music,
    Heart,
    AmmoBox,
    Power,
    /// Plain `PowerUp` tag: grants a life.
    ExtraLife,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Owner {
    Player,
    Enemy,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Projectile {
    pub owner: Owner,
    pub homing: bool,
}

#[derive(Clone, Debug)]
pub enum Body {
    Creature(Creature),
    PowerUp(PowerUpKind),
    Projectile(Projectile),
    Decoration,
}

#[derive(Clone, Debug)]
pub struct Entity {
    pub id: u32,
    pub kind: EntityKind,
    pub sprite: Sprite,
    pub body: Body,
    /// Marked for removal; compacted out at the end of the frame.
    pub removed: bool,
}

impl Entity {
    /// Instantiate a non-player template. Returns `None` for `Player`.
    pub fn spawn(id: u32, template: &Template, cfg: &GameConfig) -> Option<Entity> {
        let mut sprite = Sprite::new(template.anims.clone());
        let creature = |kind: CreatureKind, max_speed: f32| {
            Body::Creature(Creature { kind, life: Lifecycle::new(cfg.physics.die_time_ms), max_speed })
        };
        let body = match template.kind {
            EntityKind::Player => return None,
            EntityKind::Creature => creature(CreatureKind::Basic, 0.0),
            EntityKind::Grub => creature(CreatureKind::Grub, cfg.physics.grub_speed),
            EntityKind::Fly => creature(CreatureKind::Fly, cfg.physics.fly_speed),
            EntityKind::Alien => creature(CreatureKind::Alien, cfg.physics.fly_speed),
            EntityKind::Fireball => creature(CreatureKind::Fireball, cfg.physics.fly_speed),
            EntityKind::Lava => creature(CreatureKind::Lava, 0.0),
            EntityKind::FinalBoss => creature(CreatureKind::Boss(BossState::new(&cfg.boss)), 0.0),
            EntityKind::Sprite => Body::Decoration,
            EntityKind::PowerUp => Body::PowerUp(PowerUpKind::ExtraLife),
            EntityKind::Star => Body::PowerUp(PowerUpKind::Star),
            EntityKind::Music => Body::PowerUp(PowerUpKind::Music),
            EntityKind::Heart => Body::PowerUp(PowerUpKind::Heart),
            EntityKind::AmmoBox => Body::PowerUp(PowerUpKind::AmmoBox),
            EntityKind::Power => Body::PowerUp(PowerUpKind::Power),
            EntityKind::Projectile | EntityKind::Bullet => {
                sprite.vel = Vec2::new(cfg.physics.projectile_speed, 0.0);
                Body::Projectile(Projectile { owner: Owner::Player, homing: false })
            }
            EntityKind::EnemyProjectile => {
                sprite.vel = Vec2::new(cfg.physics.projectile_speed, 0.0);
                let homing = template.name == cfg.boss.homing_template;
                Body::Projectile(Projectile { owner: Owner::Enemy, homing })
            }
        };
        Some(Entity { id, kind: template.kind, sprite, body, removed: false })
    }

    pub fn creature(&self) -> Option<&Creature> {
        match &self.body {
            Body::Creature(c) => Some(c),
            _ => None,
        }
    }

    pub fn life_state(&self) -> Option<LifeState> {
        self.creature().map(|c| c.life.state())
    }

    pub fn is_flying(&self) -> bool {
        match &self.body {
            Body::Creature(c) => c.is_flying(),
            Body::Projectile(_) => true,
            Body::PowerUp(_) | Body::Decoration => false,
        }
    }

    pub fn is_projectile(&self) -> bool {
        matches!(self.body, Body::Projectile(_))
    }

    /// Point the projectile left or right, keeping its speed.
    pub fn set_heading_right(&mut self, right: bool) {
        let speed = self.sprite.vel.x.abs();
        self.sprite.vel.x = if right { speed } else { -speed };
    }

    /// Stop and play the death animation. No-op for non-creatures.
    pub fn kill(&mut self) {
        let Entity { sprite, body, .. } = self;
        if let Body::Creature(c) = body {
            c.life.set_state(LifeState::Dying, sprite);
        }
    }

    /// Start walking toward the player's side of the screen.
    pub fn wake_up(&mut self) {
        let Entity { sprite, body, .. } = self;
        if let Body::Creature(c) = body {
            if c.life.is_normal() && sprite.vel.x == 0.0 {
                sprite.vel.x = -c.max_speed;
            }
        }
    }

    /// Default tile response: bounce horizontally, stop vertically.
    pub fn collide_horizontal(&mut self) {
        self.sprite.vel.x = -self.sprite.vel.x;
    }

    pub fn collide_vertical(&mut self) {
        self.sprite.vel.y = 0.0;
    }

    /// Per-frame creature bookkeeping: facing animation, lifecycle clock and
    /// the boss's extra lives.
    pub fn update_creature(&mut self, dt: u64) {
        let Entity { sprite, body, .. } = self;
        let c = match body {
            Body::Creature(c) => c,
            _ => return,
        };
        let facing = if sprite.vel.x < 0.0 {
            Some("left")
        } else if sprite.vel.x > 0.0 {
            Some("right")
        } else {
            None
        };
        sprite.switch_or_advance(facing, dt);
        c.life.tick(dt);

        if let CreatureKind::Boss(boss) = &mut c.kind {
            if c.life.state() == LifeState::Dead {
                boss.lives = boss.lives.saturating_sub(1);
                if boss.lives > 0 {
                    tracing::debug!(lives = boss.lives, "boss revived");
                    c.life.revive();
                    sprite.set_animation("left");
                }
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

/// The player never shares an id with a spawned entity.
pub const PLAYER_ID: u32 = 0;

#[derive(Clone, Debug)]
pub struct Player {
    pub sprite: Sprite,
    pub life: Lifecycle,
    pub max_speed: f32,
    pub jump_speed: f32,
    pub thrust: f32,
    pub fuel: f32,
    pub max_fuel: f32,
    pub burn_rate: f32,
    pub on_ground: bool,
    pub jetpack_on: bool,
}

impl Player {
    pub fn spawn(template: &Template, cfg: &GameConfig) -> Player {
        Player {
            sprite: Sprite::new(template.anims.clone()),
            life: Lifecycle::new(cfg.physics.die_time_ms),
            max_speed: cfg.player.max_speed,
            jump_speed: cfg.player.jump_speed,
            thrust: cfg.player.thrust,
            fuel: cfg.player.max_fuel,
            max_fuel: cfg.player.max_fuel,
            burn_rate: cfg.player.fuel_burn_rate,
            on_ground: false,
            jetpack_on: false,
        }
    }

    /// Upward acceleration while the jetpack runs.
    pub fn thrust_amount(&self) -> f32 {
        if self.jetpack_on { self.thrust } else { 0.0 }
    }

    pub fn collide_horizontal(&mut self) {
        self.sprite.vel.x = 0.0;
    }

    pub fn collide_vertical(&mut self) {
        if self.sprite.vel.y > 0.0 {
            self.on_ground = true;
        }
        self.sprite.vel.y = 0.0;
    }

    /// Commit a position. Moving down by a whole pixel leaves the ground.
    pub fn set_position(&mut self, pos: Vec2) {
        if round_px(pos.y) > round_px(self.sprite.pos.y) {
            self.on_ground = false;
        }
        self.sprite.pos = pos;
    }

    pub fn jump(&mut self, force: bool) {
        if self.on_ground || force {
            self.on_ground = false;
            self.sprite.vel = Vec2::new(0.0, -self.jump_speed);
        }
    }

    pub fn jetpack_on(&mut self) {
        self.jetpack_on = true;
        self.on_ground = false;
    }

    pub fn jetpack_off(&mut self) {
        self.jetpack_on = false;
    }

    pub fn add_fuel(&mut self, amount: f32) {
        self.fuel = (self.fuel + amount).min(self.max_fuel);
    }

    fn burn_fuel(&mut self, dt: u64) {
        if self.jetpack_on {
            self.fuel -= self.burn_rate * dt as f32;
        }
        if self.fuel <= 0.0 {
            self.fuel = 0.0;
            self.jetpack_on = false;
        }
    }

    pub fn update(&mut self, dt: u64) {
        let mut next = None;
        if self.life.is_normal() {
            self.burn_fuel(dt);
            let vx = self.sprite.vel.x;
            next = Some(match (vx < 0.0, vx > 0.0, self.jetpack_on) {
                (true, _, true) => "jetLeft",
                (true, _, false) => "left",
                (_, true, true) => "jetRight",
                (_, true, false) => "right",
                (_, _, true) if self.sprite.faces_left() => "jetLeft",
                (_, _, true) => "jetRight",
                _ if self.sprite.faces_left() => "stillLeft",
                _ => "stillRight",
            });
        }
        self.sprite.switch_or_advance(next, dt);
        self.life.tick(dt);
    }
}

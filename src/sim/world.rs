/// GameMap: the complete state of a running level.
///
/// ## Counters
///
/// `level`, `lives`, `medallions` and `ammo` survive `initialize()`; only the
/// tile layer, the entity list and the player are rebuilt. Whoever wants a
/// counter reset (portal, final death, restart) sets it explicitly.
///
/// ## Camera / Viewport
///
/// World coordinates are pixels. The camera is a pixel window into the world
/// that follows the player with a dead zone; maps smaller than the window are
/// centered.

use std::sync::Arc;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::GameConfig;
use crate::domain::collision::tiles_to_pixels;
use crate::domain::entity::{Entity, Player};
use crate::domain::tile::TileGrid;
use super::assets::Resources;
use super::event::GameEvent;
use super::level::{LevelDef, Spawn};

/// Camera: a viewport into the world, in pixels.
///
/// `(x, y)` is the world pixel at the top-left of the view.
/// `(view_w, view_h)` is set by the renderer from the terminal size.
#[derive(Clone, Debug, Default)]
pub struct Camera {
    /// Can be negative when a narrow map is centered.
    pub x: i32,
    pub y: i32,
    pub view_w: i32,
    pub view_h: i32,
}

impl Camera {
    pub fn new() -> Self {
        Camera::default()
    }

    /// Follow a target with a dead zone: the view only scrolls once the
    /// target leaves the inner 60% of the window.
    pub fn follow(&mut self, target: Vec2, world_w: i32, world_h: i32) {
        if self.view_w <= 0 || self.view_h <= 0 { return; }
        self.x = follow_axis(self.x, target.x as i32, self.view_w, world_w);
        self.y = follow_axis(self.y, target.y as i32, self.view_h, world_h);
    }

    /// Snap so the target is centered. Used on level load.
    pub fn center_on(&mut self, target: Vec2, world_w: i32, world_h: i32) {
        if self.view_w <= 0 || self.view_h <= 0 { return; }
        self.x = center_axis(target.x as i32, self.view_w, world_w);
        self.y = center_axis(target.y as i32, self.view_h, world_h);
    }

    /// Horizontal pixel span covered by the view.
    pub fn span_x(&self) -> (f32, f32) {
        (self.x as f32, (self.x + self.view_w) as f32)
    }
}

fn follow_axis(pos: i32, target: i32, view: i32, world: i32) -> i32 {
    if world <= view {
        return -((view - world) / 2);
    }
    let margin = view / 5;
    let mut pos = pos;
    if target < pos + margin {
        pos = target - margin;
    } else if target > pos + view - margin - 1 {
        pos = target - view + margin + 1;
    }
    pos.max(0).min((world - view).max(0))
}

fn center_axis(target: i32, view: i32, world: i32) -> i32 {
    if world <= view {
        return -((view - world) / 2);
    }
    (target - view / 2).max(0).min((world - view).max(0))
}

// ══════════════════════════════════════════════════════════════
// GameMap
// ══════════════════════════════════════════════════════════════

pub struct GameMap {
    // ── Persistent counters ──
    pub level: usize,
    pub lives: u32,
    pub medallions: u32,
    pub ammo: u32,

    // ── Level state ──
    pub tiles: TileGrid,
    pub tile_size: u32,
    pub entities: Vec<Entity>,
    pub player: Player,
    pub parallax_layers: Vec<String>,
    pub music: Option<String>,
    /// The last vertical pass moved the player down.
    pub player_descending: bool,

    pub camera: Camera,

    resources: Arc<Resources>,
    pub(crate) config: GameConfig,
    pub(crate) rng: StdRng,
    next_id: u32,
}

impl GameMap {
    /// Build the map at level 0 with fresh counters.
    pub fn new(resources: Arc<Resources>, config: GameConfig) -> Option<Self> {
        let rng = match config.general.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let def = resources.level(0)?;
        let tile_size = resources.tile_size;
        let player = spawn_player(&resources, &config, &def.player, tile_size)?;
        let mut map = GameMap {
            level: 0,
            lives: config.player.lives,
            medallions: 0,
            ammo: config.player.ammo,
            tiles: TileGrid::new(0, 0),
            tile_size,
            entities: Vec::new(),
            player,
            parallax_layers: Vec::new(),
            music: None,
            player_descending: false,
            camera: Camera::new(),
            resources,
            config,
            rng,
            next_id: 1,
        };
        map.initialize();
        Some(map)
    }

    pub fn resources(&self) -> &Arc<Resources> {
        &self.resources
    }

    /// World size in pixels.
    pub fn pixel_size(&self) -> (i32, i32) {
        let ts = self.tile_size as i32;
        (self.tiles.width() as i32 * ts, self.tiles.height() as i32 * ts)
    }

    /// Rebuild the current level from its definition. Past the last level
    /// the game is finished and the map wraps to level 0.
    pub fn initialize(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.level >= self.resources.level_count() {
            tracing::info!(level = self.level, "past the last level, game finished");
            self.level = 0;
            events.push(GameEvent::GameFinished);
        }

        let resources = self.resources.clone();
        let Some(def) = resources.level(self.level) else {
            return events;
        };
        self.build(def);
        tracing::info!(
            level = self.level,
            entities = self.entities.len(),
            width = self.tiles.width(),
            height = self.tiles.height(),
            "level loaded"
        );
        events.push(GameEvent::LevelLoaded { level: self.level });
        events
    }

    fn build(&mut self, def: &LevelDef) {
        self.tiles = def.tiles.clone();
        self.parallax_layers = def.parallax_layers.clone();
        self.music = def.music.clone();
        self.player_descending = false;

        match spawn_player(&self.resources, &self.config, &def.player, self.tile_size) {
            Some(player) => self.player = player,
            None => tracing::warn!(template = %def.player.template, "player template missing"),
        }

        self.entities.clear();
        for spawn in &def.spawns {
            let Some(mut entity) = self.create(&spawn.template) else { continue };
            entity.sprite.pos = spawn_position(spawn, self.tile_size, entity.sprite.width(), entity.sprite.height());
            self.entities.push(entity);
        }

        let (w, h) = self.pixel_size();
        let target = self.player.sprite.pos;
        self.camera.center_on(target, w, h);
    }

    /// Instantiate a template with a fresh id, not yet placed in the map.
    fn create(&mut self, template: &str) -> Option<Entity> {
        let Some(t) = self.resources.template(template) else {
            tracing::warn!(template, "cannot spawn unknown template");
            return None;
        };
        let entity = Entity::spawn(self.next_id, t, &self.config)?;
        self.next_id += 1;
        Some(entity)
    }

    /// Spawn a template at `pos` and append it. Entities appended during a
    /// frame are not visited until the next one.
    pub fn spawn_at(&mut self, template: &str, pos: Vec2) -> Option<usize> {
        let mut entity = self.create(template)?;
        entity.sprite.pos = pos;
        self.entities.push(entity);
        Some(self.entities.len() - 1)
    }

    /// Wake every creature whose x lies strictly inside `(left, right)`.
    pub fn wake_up_visible(&mut self, left: f32, right: f32) {
        for e in &mut self.entities {
            let x = e.sprite.pos.x;
            if x > left && x < right {
                e.wake_up();
            }
        }
    }

    /// Keep the camera on the player.
    pub fn follow_player(&mut self) {
        let (w, h) = self.pixel_size();
        let s = &self.player.sprite;
        let center = s.pos + Vec2::new(s.width() as f32, s.height() as f32) / 2.0;
        self.camera.follow(center, w, h);
    }
}

/// Bottom-aligned in the spawn tile, centered on its right edge.
fn spawn_position(spawn: &Spawn, tile_size: u32, w: u32, h: u32) -> Vec2 {
    let ts = tile_size as f32;
    Vec2::new(
        tiles_to_pixels(spawn.x as i32, tile_size) + ts - w as f32 / 2.0,
        tiles_to_pixels(spawn.y as i32, tile_size) + ts - h as f32,
    )
}

fn spawn_player(resources: &Resources, config: &GameConfig, spawn: &Spawn, tile_size: u32) -> Option<Player> {
    let template = resources.template(&spawn.template)?;
    let mut player = Player::spawn(template, config);
    player.sprite.pos = spawn_position(spawn, tile_size, player.sprite.width(), player.sprite.height());
    Some(player)
}

/// Game: loading, running and finished states around the map.
///
/// One `frame()` call per rendered frame:
///   Loading   poll the asset loader; nothing is simulated
///   Running   actions -> map update
///   Finished  only restart and stop are honoured
///
/// The caller runs `InputManager::check_input` before `frame()` so the
/// actions are fresh.

use std::sync::Arc;

use glam::Vec2;

use crate::config::GameConfig;
use crate::error::{AssetError, GameError};
use super::assets::{AssetLoader, Resources};
use super::event::{Cue, GameEvent};
use super::input::{Action, InputManager};
use super::step::{self, FrameContext};
use super::world::GameMap;

/// Bullet launch offsets from the player's position.
const SHOT_OFFSET_RIGHT: Vec2 = Vec2::new(40.0, 25.0);
const SHOT_OFFSET_LEFT: Vec2 = Vec2::new(-30.0, 25.0);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameState {
    Loading,
    Running,
    Finished,
}

pub struct Game {
    state: GameState,
    loader: Option<AssetLoader>,
    map: Option<GameMap>,
    config: GameConfig,
}

impl Game {
    /// Start loading assets in the background.
    pub fn new(loader: AssetLoader, config: GameConfig) -> Self {
        Game { state: GameState::Loading, loader: Some(loader), map: None, config }
    }

    /// Start from already-loaded resources.
    pub fn with_resources(resources: Resources, config: GameConfig) -> Result<Self, GameError> {
        let mut game = Game { state: GameState::Loading, loader: None, map: None, config };
        game.start(resources)?;
        Ok(game)
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn map(&self) -> Option<&GameMap> {
        self.map.as_ref()
    }

    pub fn map_mut(&mut self) -> Option<&mut GameMap> {
        self.map.as_mut()
    }

    fn start(&mut self, resources: Resources) -> Result<Vec<GameEvent>, GameError> {
        let map = GameMap::new(Arc::new(resources), self.config.clone())
            .ok_or(AssetError::NoLevels)?;
        let events = vec![GameEvent::LevelLoaded { level: map.level }];
        self.map = Some(map);
        self.state = GameState::Running;
        Ok(events)
    }

    pub fn frame<K: PartialEq>(
        &mut self,
        ctx: FrameContext,
        input: &InputManager<K>,
    ) -> Result<Vec<GameEvent>, GameError> {
        match self.state {
            GameState::Loading => self.poll_loader(),
            GameState::Running => self.run(ctx, input),
            GameState::Finished => self.finished(input),
        }
    }

    fn poll_loader(&mut self) -> Result<Vec<GameEvent>, GameError> {
        let Some(loader) = &self.loader else {
            return Ok(Vec::new());
        };
        match loader.poll() {
            None => Ok(Vec::new()),
            Some(result) => {
                self.loader = None;
                let resources = result?;
                self.start(resources)
            }
        }
    }

    fn run<K: PartialEq>(
        &mut self,
        ctx: FrameContext,
        input: &InputManager<K>,
    ) -> Result<Vec<GameEvent>, GameError> {
        let Some(map) = self.map.as_mut() else {
            return Ok(Vec::new());
        };
        let mut events = process_actions(map, input)?;
        events.extend(step::update(map, ctx));
        if events.contains(&GameEvent::GameFinished) {
            tracing::info!("game finished");
            self.state = GameState::Finished;
        }
        Ok(events)
    }

    fn finished<K: PartialEq>(&mut self, input: &InputManager<K>) -> Result<Vec<GameEvent>, GameError> {
        if input.action(Action::Stop).is_begin_press() {
            return Err(GameError::Stopped);
        }
        let Some(map) = self.map.as_mut() else {
            return Ok(Vec::new());
        };
        if !input.action(Action::Restart).is_begin_press() {
            return Ok(Vec::new());
        }
        let events = restart(map);
        self.state = GameState::Running;
        Ok(events)
    }
}

fn restart(map: &mut GameMap) -> Vec<GameEvent> {
    tracing::info!(level = map.level, "restart");
    let events = map.initialize();
    map.medallions = 0;
    events
}

// ══════════════════════════════════════════════════════════════
// Actions
// ══════════════════════════════════════════════════════════════

/// Apply this frame's actions to the player.
pub fn process_actions<K: PartialEq>(
    map: &mut GameMap,
    input: &InputManager<K>,
) -> Result<Vec<GameEvent>, GameError> {
    let mut events = Vec::new();
    let normal = map.player.life.is_normal();
    let player = &mut map.player;

    player.sprite.vel.x = 0.0;
    if normal && input.action(Action::MoveRight).is_pressed() {
        player.sprite.vel.x = player.max_speed;
    }
    if normal && input.action(Action::MoveLeft).is_pressed() {
        player.sprite.vel.x = -player.max_speed;
    }
    if normal && input.action(Action::Jump).is_pressed() {
        player.jump(false);
    }

    if input.action(Action::Stop).is_begin_press() {
        return Err(GameError::Stopped);
    }

    let propel = input.action(Action::Propel);
    if normal && propel.is_begin_press() && player.fuel > 0.0 {
        player.jetpack_on();
    }
    if normal && propel.is_end_press() {
        player.jetpack_off();
    }

    if normal && input.action(Action::Shoot).is_begin_press() && map.ammo > 0 {
        shoot(map, &mut events);
    }

    if input.action(Action::Restart).is_begin_press() {
        events.extend(restart(map));
    }
    Ok(events)
}

fn shoot(map: &mut GameMap, events: &mut Vec<GameEvent>) {
    let right = !map.player.sprite.faces_left();
    let offset = if right { SHOT_OFFSET_RIGHT } else { SHOT_OFFSET_LEFT };
    let pos = map.player.sprite.pos + offset;
    let template = map.config.player.bullet_template.clone();
    let Some(k) = map.spawn_at(&template, pos) else { return };
    map.entities[k].set_heading_right(right);
    map.ammo -= 1;
    events.push(GameEvent::Sound(Cue::Shoot));
}

/// Entry point and frame loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::File;
use std::io;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags};
use crossterm::{execute, terminal};
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use error::GameError;
use sim::assets::AssetLoader;
use sim::event::GameEvent;
use sim::game::Game;
use sim::input::InputManager;
use sim::step::FrameContext;
use ui::gamepad::GamepadState;
use ui::input::{bindings, Devices, InputState, PhysicalKey};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

fn main() {
    let config = GameConfig::load();
    init_logging(&config);
    tracing::info!(assets = %config.general.assets.display(), "starting");

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }
    let honor_release = enable_key_release();

    let sound = SoundEngine::new();
    let loader = AssetLoader::spawn(config.general.assets.clone());
    let mut game = Game::new(loader, config.clone());

    let result = game_loop(&mut game, &mut renderer, sound.as_ref(), &config, honor_release);

    if honor_release {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    match result {
        Ok(()) | Err(GameError::Stopped) => tracing::info!("stopped"),
        Err(e) => {
            tracing::error!("game error: {e}");
            eprintln!("Game error: {e}");
        }
    }
    if let Some(map) = game.map() {
        println!("Reached level {} with {} medallions.", map.level + 1, map.medallions);
    }
}

/// Log to the configured file; the terminal belongs to the renderer.
/// `RUST_LOG` overrides the default `info` filter.
fn init_logging(config: &GameConfig) {
    let file = match File::create(&config.general.log_file) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("cannot open log file {}: {e}", config.general.log_file.display());
            return;
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

/// Ask the terminal for key release events. Without them held keys
/// expire on a timeout instead.
fn enable_key_release() -> bool {
    if !terminal::supports_keyboard_enhancement().unwrap_or(false) {
        tracing::info!("keyboard enhancement unsupported, using hold timeout");
        return false;
    }
    let flags = KeyboardEnhancementFlags::REPORT_EVENT_TYPES;
    execute!(io::stdout(), PushKeyboardEnhancementFlags(flags)).is_ok()
}

fn game_loop(
    game: &mut Game,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    honor_release: bool,
) -> Result<(), GameError> {
    let mut keys = InputState::new();
    keys.honor_release = honor_release;
    let mut pad = GamepadState::new();
    tracing::info!(connected = pad.connected, "gamepad");
    let mut input: InputManager<PhysicalKey> = bindings(&config.keys, &config.gamepad);

    let frame_time = Duration::from_millis(config.general.frame_ms);
    let mut last_frame = Instant::now();

    loop {
        let frame_start = Instant::now();
        keys.drain_events()?;
        pad.update();

        // Esc and Ctrl+C always quit, whatever the bindings say.
        if keys.esc_pressed() || keys.ctrl_c_pressed() {
            return Ok(());
        }
        input.check_input(&Devices { keys: &keys, pad: &pad });

        let elapsed = last_frame.elapsed().as_millis() as u64;
        last_frame = Instant::now();
        let ctx = FrameContext { dt_ms: elapsed.clamp(1, config.general.max_frame_ms) };

        let events = game.frame(ctx, &input)?;
        process_events(sound, &events);

        let state = game.state();
        renderer.render(state, game.map_mut())?;

        if let Some(rest) = frame_time.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }
}

fn process_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::Sound(cue) => {
                if let Some(sfx) = sound {
                    sfx.play(*cue);
                }
            }
            GameEvent::LevelLoaded { level } => tracing::info!(level, "level loaded"),
            GameEvent::GameFinished => tracing::info!("all levels cleared"),
            GameEvent::PlayerHurt { lives } => tracing::debug!(lives, "player hurt"),
            GameEvent::GameReset => tracing::info!("out of lives, counters reset"),
            GameEvent::CreatureShot { id } => tracing::debug!(id, "creature shot"),
            GameEvent::BossSpat { id } => tracing::trace!(id, "boss spat"),
        }
    }
}

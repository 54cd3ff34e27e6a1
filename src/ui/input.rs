/// Input state tracker and the bridge to logical actions.
///
/// Tracks which keys are currently held down so actions can be sampled once
/// per frame. Uses crossterm's keyboard enhancement for Release events when
/// available and falls back to timeout-based release detection on terminals
/// that don't support it.
///
/// `Devices` combines the keyboard and the gamepad into one `KeySource`
/// so both feed the same input manager.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, ModifierKeyCode};

use crate::config::{GamepadConfig, KeyConfig};
use crate::sim::input::{Action, InputManager, KeySource};
use super::gamepad::{Btn, GamepadState, PadInput};

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Raw key events collected during drain, for meta-key handling.
    raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before sampling actions.
    pub fn drain_events(&mut self) -> std::io::Result<()> {
        self.raw_events.clear();

        while poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                self.record(key, Instant::now());
            }
        }

        // Expire keys that have timed out (fallback for terminals without Release)
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
        Ok(())
    }

    fn record(&mut self, key: KeyEvent, at: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            // Release without confirmed enhancement: rely on the timeout.
            KeyEventKind::Release => {}
            _ => {
                self.last_active.insert(key.code, at);
            }
        }
    }

    /// Is this key currently held down?
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    /// Was Esc pressed this frame? Always quits, whatever the bindings.
    pub fn esc_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| k.code == KeyCode::Esc && k.kind != KeyEventKind::Release)
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        use crossterm::event::KeyModifiers;
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

// ══════════════════════════════════════════════════════════════
// Physical keys
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PhysicalKey {
    Key(KeyCode),
    Pad(PadInput),
}

/// Parse a key name from config.toml: a single character, or a named key.
pub fn parse_key(name: &str) -> Option<KeyCode> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(KeyCode::Char(c.to_ascii_lowercase()));
    }
    let code = match name.to_lowercase().as_str() {
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "space" => KeyCode::Char(' '),
        "enter" | "return" => KeyCode::Enter,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "shift" | "lshift" => KeyCode::Modifier(ModifierKeyCode::LeftShift),
        "rshift" => KeyCode::Modifier(ModifierKeyCode::RightShift),
        "ctrl" | "lctrl" => KeyCode::Modifier(ModifierKeyCode::LeftControl),
        "alt" | "lalt" => KeyCode::Modifier(ModifierKeyCode::LeftAlt),
        other => {
            let n = other.strip_prefix('f')?.parse::<u8>().ok()?;
            KeyCode::F(n)
        }
    };
    Some(code)
}

/// Build the input manager from config. Unknown names are logged and skipped.
pub fn bindings(keys: &KeyConfig, pad: &GamepadConfig) -> InputManager<PhysicalKey> {
    let mut manager = InputManager::new();

    let key_lists: [(&[String], Action); 7] = [
        (keys.move_left.as_slice(), Action::MoveLeft),
        (keys.move_right.as_slice(), Action::MoveRight),
        (keys.jump.as_slice(), Action::Jump),
        (keys.propel.as_slice(), Action::Propel),
        (keys.shoot.as_slice(), Action::Shoot),
        (keys.restart.as_slice(), Action::Restart),
        (keys.stop.as_slice(), Action::Stop),
    ];
    for (names, action) in key_lists {
        for name in names {
            match parse_key(name) {
                Some(code) => manager.bind(PhysicalKey::Key(code), action),
                None => tracing::warn!(key = %name, ?action, "unknown key name in config"),
            }
        }
    }

    manager.bind(PhysicalKey::Pad(PadInput::Left), Action::MoveLeft);
    manager.bind(PhysicalKey::Pad(PadInput::Right), Action::MoveRight);
    let pad_lists: [(&[String], Action); 5] = [
        (pad.jump.as_slice(), Action::Jump),
        (pad.propel.as_slice(), Action::Propel),
        (pad.shoot.as_slice(), Action::Shoot),
        (pad.restart.as_slice(), Action::Restart),
        (pad.stop.as_slice(), Action::Stop),
    ];
    for (names, action) in pad_lists {
        for name in names {
            match Btn::from_name(name) {
                Some(btn) => manager.bind(PhysicalKey::Pad(PadInput::Button(btn)), action),
                None => tracing::warn!(button = %name, ?action, "unknown gamepad button in config"),
            }
        }
    }
    manager
}

/// Keyboard and gamepad, sampled together.
pub struct Devices<'a> {
    pub keys: &'a InputState,
    pub pad: &'a GamepadState,
}

impl KeySource<PhysicalKey> for Devices<'_> {
    fn is_down(&self, key: &PhysicalKey) -> bool {
        match key {
            PhysicalKey::Key(code) => self.keys.is_held(*code),
            PhysicalKey::Pad(input) => self.pad.is_held(*input),
        }
    }
}

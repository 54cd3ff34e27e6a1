/// Input manager: maps physical keys to logical actions.
///
/// Many keys may drive one action. Each frame `check_input` reads the key
/// source once and updates every bound action exactly once: pressed if any
/// of its keys is down, released otherwise. Actions with no bindings are
/// left alone.

use crate::domain::action::GameAction;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Action {
    MoveLeft,
    MoveRight,
    Jump,
    Propel,
    Shoot,
    Restart,
    Stop,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::MoveLeft,
        Action::MoveRight,
        Action::Jump,
        Action::Propel,
        Action::Shoot,
        Action::Restart,
        Action::Stop,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Anything that can answer "is this key down right now".
pub trait KeySource<K> {
    fn is_down(&self, key: &K) -> bool;
}

pub struct InputManager<K> {
    /// One entry per key; binding a key again moves it to the new action.
    bindings: Vec<(K, Action)>,
    actions: [GameAction; 7],
}

impl<K: PartialEq> Default for InputManager<K> {
    fn default() -> Self {
        InputManager::new()
    }
}

impl<K: PartialEq> InputManager<K> {
    pub fn new() -> Self {
        InputManager { bindings: Vec::new(), actions: Default::default() }
    }

    pub fn bind(&mut self, key: K, action: Action) {
        match self.bindings.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = action,
            None => self.bindings.push((key, action)),
        }
    }

    pub fn unbind(&mut self, key: &K) {
        self.bindings.retain(|(k, _)| k != key);
    }

    pub fn is_bound(&self, action: Action) -> bool {
        self.bindings.iter().any(|(_, a)| *a == action)
    }

    /// Release every action without touching the bindings.
    pub fn reset(&mut self) {
        for action in &mut self.actions {
            action.reset();
        }
    }

    pub fn check_input(&mut self, source: &impl KeySource<K>) {
        for action in Action::ALL {
            let mut bound = false;
            let mut down = false;
            for (key, _) in self.bindings.iter().filter(|(_, a)| *a == action) {
                bound = true;
                down |= source.is_down(key);
            }
            if !bound { continue; }
            let state = &mut self.actions[action.index()];
            if down { state.press() } else { state.release() }
        }
    }

    pub fn action(&self, action: Action) -> &GameAction {
        &self.actions[action.index()]
    }
}

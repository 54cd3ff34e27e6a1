/// Edge-detecting logical button.
///
/// The input bridge calls `press()` or `release()` exactly once per frame,
/// so the first frame a key is down reads as `BeginPress` and the first
/// frame it is up again reads as `EndPress`.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ActionState {
    #[default]
    Released,
    BeginPress,
    Pressed,
    EndPress,
}

#[derive(Clone, Debug, Default)]
pub struct GameAction {
    state: ActionState,
}

impl GameAction {
    pub fn new() -> Self {
        GameAction { state: ActionState::Released }
    }

    pub fn state(&self) -> ActionState {
        self.state
    }

    pub fn press(&mut self) {
        self.state = match self.state {
            ActionState::Released | ActionState::EndPress => ActionState::BeginPress,
            ActionState::BeginPress | ActionState::Pressed => ActionState::Pressed,
        };
    }

    pub fn release(&mut self) {
        self.state = match self.state {
            ActionState::BeginPress | ActionState::Pressed => ActionState::EndPress,
            ActionState::EndPress | ActionState::Released => ActionState::Released,
        };
    }

    pub fn reset(&mut self) {
        self.state = ActionState::Released;
    }

    pub fn is_begin_press(&self) -> bool {
        self.state == ActionState::BeginPress
    }

    /// True for the whole press, including the frame it ends on.
    pub fn is_pressed(&self) -> bool {
        self.state != ActionState::Released
    }

    pub fn is_end_press(&self) -> bool {
        self.state == ActionState::EndPress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_state(state: ActionState) -> GameAction {
        GameAction { state }
    }

    #[test]
    fn full_press_cycle() {
        let mut a = GameAction::new();
        a.press();
        assert_eq!(a.state(), ActionState::BeginPress);
        a.press();
        assert_eq!(a.state(), ActionState::Pressed);
        a.press();
        assert_eq!(a.state(), ActionState::Pressed);
        a.release();
        assert_eq!(a.state(), ActionState::EndPress);
        a.release();
        assert_eq!(a.state(), ActionState::Released);
        a.release();
        assert_eq!(a.state(), ActionState::Released);
    }

    #[test]
    fn repress_during_end_press_begins_again() {
        let mut a = in_state(ActionState::EndPress);
        a.press();
        assert!(a.is_begin_press());
    }

    #[test]
    fn release_from_begin_press_ends() {
        let mut a = in_state(ActionState::BeginPress);
        a.release();
        assert!(a.is_end_press());
    }

    #[test]
    fn queries_per_state() {
        let cases = [
            (ActionState::Released, false, false, false),
            (ActionState::BeginPress, true, true, false),
            (ActionState::Pressed, false, true, false),
            (ActionState::EndPress, false, true, true),
        ];
        for (state, begin, pressed, end) in cases {
            let a = in_state(state);
            assert_eq!(a.is_begin_press(), begin, "{state:?}");
            assert_eq!(a.is_pressed(), pressed, "{state:?}");
            assert_eq!(a.is_end_press(), end, "{state:?}");
        }
    }

    #[test]
    fn reset_from_any_state() {
        for state in [ActionState::BeginPress, ActionState::Pressed, ActionState::EndPress] {
            let mut a = in_state(state);
            a.reset();
            assert_eq!(a.state(), ActionState::Released);
        }
    }
}

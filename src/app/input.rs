use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Explore,
    Exit,
    Quit,
    ToggleWaxPanel,
    None,
}

/// Mouse state for orbit dragging.
#[derive(Default, Debug, Clone, Copy)]
pub struct InputState {
    pub dragging: bool,
    pub cursor: Option<(f32, f32)>,
}

impl InputState {
    pub fn handle_key(&mut self, key: PhysicalKey, pressed: bool) -> InputAction {
        if !pressed {
            return InputAction::None;
        }
        match key {
            PhysicalKey::Code(KeyCode::KeyE) => InputAction::Explore,
            PhysicalKey::Code(KeyCode::Backspace) => InputAction::Exit,
            PhysicalKey::Code(KeyCode::Escape) => InputAction::Quit,
            PhysicalKey::Code(KeyCode::F1) => InputAction::ToggleWaxPanel,
            _ => InputAction::None,
        }
    }

    /// Records a cursor move and returns the drag delta when the left button
    /// is held.
    pub fn cursor_moved(&mut self, x: f32, y: f32) -> Option<(f32, f32)> {
        let previous = self.cursor.replace((x, y));
        match previous {
            Some((px, py)) if self.dragging => Some((x - px, y - py)),
            _ => None,
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = None;
        self.dragging = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortcuts_fire_on_press_only() {
        let mut input = InputState::default();
        let e = PhysicalKey::Code(KeyCode::KeyE);
        assert_eq!(input.handle_key(e, true), InputAction::Explore);
        assert_eq!(input.handle_key(e, false), InputAction::None);
        assert_eq!(
            input.handle_key(PhysicalKey::Code(KeyCode::Backspace), true),
            InputAction::Exit
        );
        assert_eq!(
            input.handle_key(PhysicalKey::Code(KeyCode::KeyQ), true),
            InputAction::None
        );
    }

    #[test]
    fn drag_delta_requires_button_and_previous_position() {
        let mut input = InputState::default();
        assert_eq!(input.cursor_moved(10.0, 10.0), None);
        assert_eq!(input.cursor_moved(12.0, 15.0), None);
        input.dragging = true;
        assert_eq!(input.cursor_moved(20.0, 10.0), Some((8.0, -5.0)));
        input.cursor_left();
        assert_eq!(input.cursor_moved(0.0, 0.0), None);
    }
}

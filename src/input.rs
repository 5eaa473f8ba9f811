//! Keyboard state polled once per frame, and mouse drags for head look.

use std::collections::HashSet;

use winit::event::ElementState;
use winit::keyboard::KeyCode;

/// Set of keys currently held down
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    pressed: HashSet<KeyCode>,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key event from the window
    pub fn handle(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => self.press(key),
            ElementState::Released => self.release(key),
        }
    }

    pub fn press(&mut self, key: KeyCode) {
        self.pressed.insert(key);
    }

    pub fn release(&mut self, key: KeyCode) {
        self.pressed.remove(&key);
    }

    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    /// True if any of `keys` is held
    pub fn any_pressed(&self, keys: &[KeyCode]) -> bool {
        keys.iter().any(|&k| self.is_pressed(k))
    }

    pub fn control_held(&self) -> bool {
        self.any_pressed(&[KeyCode::ControlLeft, KeyCode::ControlRight])
    }

    /// Ctrl+Q or Escape ends the session
    pub fn quit_requested(&self) -> bool {
        self.is_pressed(KeyCode::Escape) || (self.control_held() && self.is_pressed(KeyCode::KeyQ))
    }

    /// Forget every held key (focus lost)
    pub fn clear(&mut self) {
        self.pressed.clear();
    }
}

/// Cursor movement while the left mouse button is held
#[derive(Debug, Clone, Default)]
pub struct MouseDrag {
    held: bool,
    last_cursor: Option<(f64, f64)>,
}

impl MouseDrag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_button(&mut self, state: ElementState) {
        self.held = state == ElementState::Pressed;
    }

    /// Record a cursor position (pixels); returns the movement since the last
    /// position while the button is held
    pub fn cursor_moved(&mut self, x: f64, y: f64) -> Option<(f32, f32)> {
        let previous = self.last_cursor.replace((x, y));
        match previous {
            Some((px, py)) if self.held => Some(((x - px) as f32, (y - py) as f32)),
            _ => None,
        }
    }

    /// Drop the button and the last position (focus or cursor lost)
    pub fn clear(&mut self) {
        self.held = false;
        self.last_cursor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_release() {
        let mut keys = KeyboardState::new();
        keys.handle(KeyCode::KeyW, ElementState::Pressed);
        assert!(keys.is_pressed(KeyCode::KeyW));
        keys.handle(KeyCode::KeyW, ElementState::Released);
        assert!(!keys.is_pressed(KeyCode::KeyW));
    }

    #[test]
    fn test_quit_combinations() {
        let mut keys = KeyboardState::new();
        keys.press(KeyCode::KeyQ);
        assert!(!keys.quit_requested(), "Q alone must not quit");

        keys.press(KeyCode::ControlRight);
        assert!(keys.quit_requested());

        keys.clear();
        keys.press(KeyCode::Escape);
        assert!(keys.quit_requested());
    }

    #[test]
    fn test_drag_reports_movement_only_while_held() {
        let mut drag = MouseDrag::new();
        assert_eq!(drag.cursor_moved(10.0, 10.0), None);
        assert_eq!(drag.cursor_moved(20.0, 10.0), None);

        drag.handle_button(ElementState::Pressed);
        assert_eq!(drag.cursor_moved(25.0, 7.0), Some((5.0, -3.0)));

        drag.handle_button(ElementState::Released);
        assert_eq!(drag.cursor_moved(40.0, 7.0), None);

        // No jump from the stale position after focus comes back
        drag.clear();
        drag.handle_button(ElementState::Pressed);
        assert_eq!(drag.cursor_moved(100.0, 100.0), None);
        assert_eq!(drag.cursor_moved(101.0, 100.0), Some((1.0, 0.0)));
    }
}

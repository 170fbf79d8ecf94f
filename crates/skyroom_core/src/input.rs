use std::collections::HashSet;

/// Re-exported key and mouse enums from `winit` so callers configuring the
/// camera controller don't need to depend on winit themselves.
pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;

/// Keyboard and mouse state accumulated from window events.
///
/// The app runner feeds this from `winit` events; the viewer reads it in
/// `update` to move the camera.  Mouse motion and scroll are accumulated
/// until consumed so no movement is lost between frames.
#[derive(Default)]
pub struct InputState {
    keys_down: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    mouse_buttons: HashSet<MouseButton>,
    mouse_pos: Option<(f64, f64)>,
    mouse_delta: (f32, f32),
    scroll_delta: f32,
}

impl InputState {
    pub fn new() -> Self {
        Default::default()
    }

    /// Called by the event loop when a keyboard event arrives.
    pub fn update_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            if self.keys_down.insert(key) {
                self.keys_pressed.insert(key);
            }
        } else {
            self.keys_down.remove(&key);
        }
    }

    /// True while `key` is held.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// True only on the frame `key` went down.
    pub fn just_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn update_mouse_button(&mut self, button: MouseButton, pressed: bool) {
        if pressed {
            self.mouse_buttons.insert(button);
        } else {
            self.mouse_buttons.remove(&button);
        }
    }

    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons.contains(&button)
    }

    /// Records a new cursor position.  The first position after startup
    /// produces no delta, so the camera doesn't jump when the cursor enters
    /// the window.
    pub fn set_mouse_position(&mut self, x: f64, y: f64) {
        if let Some((px, py)) = self.mouse_pos {
            self.mouse_delta.0 += (x - px) as f32;
            self.mouse_delta.1 += (y - py) as f32;
        }
        self.mouse_pos = Some((x, y));
    }

    pub fn mouse_position(&self) -> (f64, f64) {
        self.mouse_pos.unwrap_or((0.0, 0.0))
    }

    /// Returns and resets the accumulated cursor movement in pixels.
    pub fn consume_mouse_delta(&mut self) -> (f32, f32) {
        std::mem::take(&mut self.mouse_delta)
    }

    /// Accumulates wheel movement in lines (positive = away from the user).
    pub fn add_scroll(&mut self, lines: f32) {
        self.scroll_delta += lines;
    }

    pub fn consume_scroll(&mut self) -> f32 {
        std::mem::take(&mut self.scroll_delta)
    }

    /// Clears per-frame edge state.  Called by the runner after every frame.
    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_tracking() {
        let mut state = InputState::new();
        assert!(!state.is_key_pressed(KeyCode::KeyW));
        state.update_key(KeyCode::KeyW, true);
        assert!(state.is_key_pressed(KeyCode::KeyW));
        assert!(state.just_pressed(KeyCode::KeyW));
        state.end_frame();
        assert!(state.is_key_pressed(KeyCode::KeyW));
        assert!(!state.just_pressed(KeyCode::KeyW));
        state.update_key(KeyCode::KeyW, false);
        assert!(!state.is_key_pressed(KeyCode::KeyW));
    }

    #[test]
    fn held_key_repeat_is_not_a_new_press() {
        let mut state = InputState::new();
        state.update_key(KeyCode::Space, true);
        state.end_frame();
        state.update_key(KeyCode::Space, true);
        assert!(!state.just_pressed(KeyCode::Space));
    }

    #[test]
    fn mouse_tracking() {
        let mut state = InputState::new();
        state.update_mouse_button(MouseButton::Right, true);
        assert!(state.is_button_down(MouseButton::Right));
        state.update_mouse_button(MouseButton::Right, false);
        assert!(!state.is_button_down(MouseButton::Right));

        // first sample only establishes the origin
        state.set_mouse_position(10.0, 20.0);
        assert_eq!(state.consume_mouse_delta(), (0.0, 0.0));
        state.set_mouse_position(15.0, 25.0);
        state.set_mouse_position(17.0, 24.0);
        assert_eq!(state.consume_mouse_delta(), (7.0, 4.0));
        assert_eq!(state.consume_mouse_delta(), (0.0, 0.0));
        assert_eq!(state.mouse_position(), (17.0, 24.0));
    }

    #[test]
    fn scroll_accumulates_until_consumed() {
        let mut state = InputState::new();
        state.add_scroll(1.0);
        state.add_scroll(0.5);
        assert_eq!(state.consume_scroll(), 1.5);
        assert_eq!(state.consume_scroll(), 0.0);
    }
}

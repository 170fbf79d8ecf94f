use std::collections::HashMap;

use crate::input::{InputState, KeyCode};
use crate::scene::camera::{Camera, CameraMovement};

/// Maps keys to camera movements and stores the camera-motion parameters.
///
/// ```rust,ignore
/// let mut controller = Controller::with_default_wasd();
/// controller.bind(KeyCode::ArrowUp, CameraMovement::Forward);
/// controller.speed = 2.0;
/// controller.apply(&mut camera, &mut input, time.delta);
/// ```
#[derive(Debug, Clone)]
pub struct Controller {
    mappings: HashMap<KeyCode, CameraMovement>,

    /// Translation speed in world units per second.
    ///
    /// Default: `2.5`
    pub speed: f32,

    /// Degrees of rotation per pixel of mouse movement.
    ///
    /// Default: `0.1`
    pub mouse_sensitivity: f32,

    /// Mouse look is only applied while this button is held.  `None` means
    /// the camera always follows the cursor.
    pub look_button: Option<crate::input::MouseButton>,
}

impl Controller {
    /// Empty controller: no bindings, default parameters.
    pub fn new() -> Self {
        Self {
            mappings: HashMap::new(),
            speed: 2.5,
            mouse_sensitivity: 0.1,
            look_button: Some(crate::input::MouseButton::Right),
        }
    }

    /// WASD for the horizontal plane, Space / left Shift for up and down.
    pub fn with_default_wasd() -> Self {
        let mut ctl = Self::new();
        ctl.bind(KeyCode::KeyW, CameraMovement::Forward);
        ctl.bind(KeyCode::KeyS, CameraMovement::Backward);
        ctl.bind(KeyCode::KeyA, CameraMovement::Left);
        ctl.bind(KeyCode::KeyD, CameraMovement::Right);
        ctl.bind(KeyCode::Space, CameraMovement::Up);
        ctl.bind(KeyCode::ShiftLeft, CameraMovement::Down);
        ctl
    }

    /// Binding the same key twice overwrites the old movement.
    pub fn bind(&mut self, key: KeyCode, movement: CameraMovement) {
        self.mappings.insert(key, movement);
    }

    pub fn unbind(&mut self, key: KeyCode) {
        self.mappings.remove(&key);
    }

    /// Movements whose keys are currently held.
    pub fn active_movements<'s>(
        &'s self,
        input: &'s InputState,
    ) -> impl Iterator<Item = CameraMovement> + 's {
        self.mappings
            .iter()
            .filter(|(key, _)| input.is_key_pressed(**key))
            .map(|(_, movement)| *movement)
    }

    /// Moves and rotates `camera` from this frame's input.  Consumes the
    /// accumulated mouse and scroll deltas.
    pub fn apply(&self, camera: &mut Camera, input: &mut InputState, dt: f32) {
        for movement in self.active_movements(input) {
            camera.process_movement(movement, dt, self.speed);
        }

        let (dx, dy) = input.consume_mouse_delta();
        let looking = self.look_button.map_or(true, |b| input.is_button_down(b));
        if looking && (dx != 0.0 || dy != 0.0) {
            // window y grows downwards; pitch grows upwards
            camera.process_mouse_movement(dx, -dy, self.mouse_sensitivity);
        }

        let scroll = input.consume_scroll();
        if scroll != 0.0 {
            camera.process_mouse_scroll(scroll);
        }
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::with_default_wasd()
    }
}

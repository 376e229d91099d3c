//! Input management system
//!
//! Platform events update an [`InputManager`]; once per frame the game takes a
//! [`KeyState`] snapshot and hands the same snapshot to every actor, so all
//! actors see identical input for the frame.

use std::collections::HashSet;

use crate::foundation::math::Vec2;

/// Input manager
#[derive(Debug)]
pub struct InputManager {
    pressed: HashSet<KeyCode>,
    mouse_delta: Vec2,
    mouse_position: Option<(f64, f64)>,
}

impl InputManager {
    /// Create a new input manager
    pub fn new() -> Self {
        Self {
            pressed: HashSet::new(),
            mouse_delta: Vec2::zeros(),
            mouse_position: None,
        }
    }

    /// Handle key input
    pub fn handle_key_input(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.pressed.insert(key);
        } else {
            self.pressed.remove(&key);
        }
    }

    /// Accumulate relative mouse motion
    pub fn handle_mouse_motion(&mut self, dx: f32, dy: f32) {
        self.mouse_delta += Vec2::new(dx, dy);
    }

    /// Handle an absolute cursor position, converting it to relative motion
    pub fn handle_mouse_move(&mut self, x: f64, y: f64) {
        if let Some((last_x, last_y)) = self.mouse_position {
            self.handle_mouse_motion((x - last_x) as f32, (y - last_y) as f32);
        }
        self.mouse_position = Some((x, y));
    }

    /// Forget the last cursor position (after the cursor mode changes)
    pub fn reset_cursor(&mut self) {
        self.mouse_position = None;
    }

    /// Snapshot the current state and clear the per-frame mouse motion
    pub fn take_snapshot(&mut self) -> KeyState {
        let snapshot = KeyState {
            pressed: self.pressed.clone(),
            mouse_delta: self.mouse_delta,
        };
        self.mouse_delta = Vec2::zeros();
        snapshot
    }

    /// Whether a key is currently held
    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Input snapshot for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct KeyState {
    pressed: HashSet<KeyCode>,
    mouse_delta: Vec2,
}

impl KeyState {
    /// Build a snapshot directly (tests and scripted input)
    pub fn new(pressed: impl IntoIterator<Item = KeyCode>, mouse_delta: Vec2) -> Self {
        Self {
            pressed: pressed.into_iter().collect(),
            mouse_delta,
        }
    }

    /// Snapshot with nothing pressed and no motion
    pub fn empty() -> Self {
        Self::new([], Vec2::zeros())
    }

    /// Whether the key was held when the snapshot was taken
    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    /// +1 when `positive` is held, -1 for `negative`, 0 for both or neither
    pub fn axis(&self, positive: KeyCode, negative: KeyCode) -> f32 {
        let mut value = 0.0;
        if self.is_pressed(positive) {
            value += 1.0;
        }
        if self.is_pressed(negative) {
            value -= 1.0;
        }
        value
    }

    /// Mouse motion accumulated since the previous snapshot, in pixels
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }
}

/// Key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A key
    A,
    /// D key
    D,
    /// E key
    E,
    /// Q key
    Q,
    /// S key
    S,
    /// W key
    W,
    /// Space key
    Space,
    /// Left shift
    LeftShift,
    /// Enter key
    Enter,
    /// Escape key
    Escape,
    /// F1 key
    F1,
    /// F2 key
    F2,
    /// F3 key
    F3,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
}

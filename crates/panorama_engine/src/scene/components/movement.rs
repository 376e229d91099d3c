//! Movement component for actors that walk and turn
//!
//! Speeds are expressed in the owner's local frame: forward along the
//! rotation's -Z, strafe along its +X, vertical along world +Y. Yaw turns
//! about world Y and pitch about the local X axis, so the horizon stays level.

use crate::foundation::math::{Quat, Transform, Vec3};
use crate::input::{KeyCode, KeyState};

/// Keys that drive a [`MovementComponent`] directly
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementBindings {
    /// Walk forward
    pub forward: KeyCode,
    /// Walk backward
    pub back: KeyCode,
    /// Strafe left
    pub left: KeyCode,
    /// Strafe right
    pub right: KeyCode,
    /// Rise
    pub up: KeyCode,
    /// Sink
    pub down: KeyCode,
    /// Units per second at full input
    pub speed: f32,
}

impl Default for MovementBindings {
    fn default() -> Self {
        Self {
            forward: KeyCode::W,
            back: KeyCode::S,
            left: KeyCode::A,
            right: KeyCode::D,
            up: KeyCode::Space,
            down: KeyCode::LeftShift,
            speed: 3.0,
        }
    }
}

/// Component for actors that can move
#[derive(Debug, Clone, PartialEq)]
pub struct MovementComponent {
    /// Speed along the forward axis in units per second
    pub forward_speed: f32,

    /// Speed along the right axis in units per second
    pub strafe_speed: f32,

    /// Speed along world up in units per second
    pub vertical_speed: f32,

    /// Turn rate about world Y in radians per second
    pub yaw_speed: f32,

    /// Turn rate about local X in radians per second
    pub pitch_speed: f32,

    /// Whether movement is enabled
    pub enabled: bool,

    bindings: Option<MovementBindings>,
}

impl MovementComponent {
    /// Create a stationary movement component
    pub const fn new() -> Self {
        Self {
            forward_speed: 0.0,
            strafe_speed: 0.0,
            vertical_speed: 0.0,
            yaw_speed: 0.0,
            pitch_speed: 0.0,
            enabled: true,
            bindings: None,
        }
    }

    /// Create a movement component whose speeds follow the keyboard
    pub fn with_bindings(bindings: MovementBindings) -> Self {
        let mut movement = Self::new();
        movement.bindings = Some(bindings);
        movement
    }

    /// Keyboard bindings, if keyboard-driven
    pub fn bindings(&self) -> Option<&MovementBindings> {
        self.bindings.as_ref()
    }

    /// Set forward speed
    pub fn set_forward_speed(&mut self, speed: f32) {
        self.forward_speed = speed;
    }

    /// Set strafe speed
    pub fn set_strafe_speed(&mut self, speed: f32) {
        self.strafe_speed = speed;
    }

    /// Set vertical speed
    pub fn set_vertical_speed(&mut self, speed: f32) {
        self.vertical_speed = speed;
    }

    /// Set turn rates
    pub fn set_angular_speed(&mut self, yaw: f32, pitch: f32) {
        self.yaw_speed = yaw;
        self.pitch_speed = pitch;
    }

    /// Enable or disable movement
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Stop all movement
    pub fn stop(&mut self) {
        self.forward_speed = 0.0;
        self.strafe_speed = 0.0;
        self.vertical_speed = 0.0;
        self.yaw_speed = 0.0;
        self.pitch_speed = 0.0;
    }

    /// Read speeds from the keyboard when bound
    pub fn input(&mut self, keys: &KeyState) {
        let Some(b) = self.bindings else {
            return;
        };
        self.forward_speed = keys.axis(b.forward, b.back) * b.speed;
        self.strafe_speed = keys.axis(b.right, b.left) * b.speed;
        self.vertical_speed = keys.axis(b.up, b.down) * b.speed;
    }

    /// Integrate one step; `delta` is already clamped by the frame timer
    pub fn update(&self, transform: &mut Transform, delta: f32) {
        if !self.enabled {
            return;
        }

        let step = transform.forward() * (self.forward_speed * delta)
            + transform.right() * (self.strafe_speed * delta)
            + Vec3::y() * (self.vertical_speed * delta);
        transform.position += step;

        turn(transform, self.yaw_speed * delta, self.pitch_speed * delta);
    }
}

impl Default for MovementComponent {
    fn default() -> Self {
        Self::new()
    }
}

/// Rotate by `yaw` about world Y and `pitch` about the local X axis
pub fn turn(transform: &mut Transform, yaw: f32, pitch: f32) {
    if yaw != 0.0 {
        transform.rotation = Quat::from_axis_angle(&Vec3::y_axis(), yaw) * transform.rotation;
    }
    if pitch != 0.0 {
        transform.rotation *= Quat::from_axis_angle(&Vec3::x_axis(), pitch);
    }
}

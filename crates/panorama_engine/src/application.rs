//! Platform boundary
//!
//! The window system feeds the game through [`Platform`]: it turns native
//! events into [`AppEvent`]s, marks frame boundaries and owns cursor
//! state. [`GlfwPlatform`](crate::render::window::GlfwPlatform) drives a real
//! window; [`ScriptedPlatform`] replays a fixed script for headless runs.

use std::collections::VecDeque;

use crate::input::KeyCode;

/// Application events
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Application asked to quit
    Quit,

    /// Window close requested
    WindowCloseRequested,

    /// Window was resized
    WindowResized {
        /// New window width
        width: u32,
        /// New window height
        height: u32,
    },

    /// Key input event
    KeyInput {
        /// The key that was pressed/released
        key: KeyCode,
        /// Whether the key was pressed (true) or released (false)
        pressed: bool,
    },

    /// Absolute cursor position
    MouseMoved {
        /// New X coordinate
        x: f64,
        /// New Y coordinate
        y: f64,
    },

    /// Relative mouse motion
    MouseMotion {
        /// Horizontal motion in pixels
        dx: f32,
        /// Vertical motion in pixels
        dy: f32,
    },
}

impl AppEvent {
    /// Key press shorthand
    pub const fn key_down(key: KeyCode) -> Self {
        Self::KeyInput { key, pressed: true }
    }

    /// Key release shorthand
    pub const fn key_up(key: KeyCode) -> Self {
        Self::KeyInput { key, pressed: false }
    }
}

/// What the driver should do after a frame or event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppControl {
    /// Keep running
    Continue,
    /// Leave the loop
    Quit,
}

/// Window system seam
pub trait Platform {
    /// Drain pending native events
    fn poll_events(&mut self) -> Vec<AppEvent>;

    /// End the frame
    fn end_frame(&mut self);

    /// Capture (true) or release (false) the mouse
    fn set_relative_mouse(&mut self, enabled: bool);

    /// Framebuffer size in pixels
    fn size(&self) -> (u32, u32);
}

/// Headless platform replaying scripted events
///
/// Each call to [`Platform::poll_events`] returns the events scripted for the
/// current frame. Once the frame budget is used up it reports
/// [`AppEvent::Quit`].
#[derive(Debug)]
pub struct ScriptedPlatform {
    frame: u64,
    max_frames: Option<u64>,
    script: VecDeque<(u64, AppEvent)>,
    size: (u32, u32),
    relative_mouse: bool,
}

impl ScriptedPlatform {
    /// Create a platform of the given size that runs for `max_frames` frames
    /// (forever when `None`)
    pub fn new(width: u32, height: u32, max_frames: Option<u64>) -> Self {
        Self {
            frame: 0,
            max_frames,
            script: VecDeque::new(),
            size: (width, height),
            relative_mouse: false,
        }
    }

    /// Deliver `event` before frame `frame` runs
    #[must_use]
    pub fn with_event(mut self, frame: u64, event: AppEvent) -> Self {
        let at = self.script.partition_point(|(f, _)| *f <= frame);
        self.script.insert(at, (frame, event));
        self
    }

    /// Frames ended so far
    pub fn frames_ended(&self) -> u64 {
        self.frame
    }

    /// Last requested mouse mode
    pub fn relative_mouse(&self) -> bool {
        self.relative_mouse
    }
}

impl Platform for ScriptedPlatform {
    fn poll_events(&mut self) -> Vec<AppEvent> {
        let mut events = Vec::new();
        while self.script.front().is_some_and(|(f, _)| *f <= self.frame) {
            if let Some((_, event)) = self.script.pop_front() {
                if let AppEvent::WindowResized { width, height } = event {
                    self.size = (width, height);
                }
                events.push(event);
            }
        }
        if self.max_frames.is_some_and(|max| self.frame >= max) {
            events.push(AppEvent::Quit);
        }
        events
    }

    fn end_frame(&mut self) {
        self.frame += 1;
    }

    fn set_relative_mouse(&mut self, enabled: bool) {
        self.relative_mouse = enabled;
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }
}

//! Window management using GLFW
//!
//! Opens a window without a client API and translates its events into
//! [`AppEvent`]s. Drawing and presentation belong to the
//! [`WgpuDevice`](super::WgpuDevice) built by [`GlfwPlatform::create_device`],
//! which shares the native window with the platform.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::application::{AppEvent, Platform};
use crate::input::KeyCode;
use crate::render::device::RenderResult;
use crate::render::wgpu_device::WgpuDevice;

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// GLFW could not start
    #[error("GLFW initialization failed: {0}")]
    InitializationFailed(String),

    /// Window could not be created
    #[error("Window creation failed")]
    CreationFailed,
}

/// Result type for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// GLFW window
pub struct GlfwPlatform {
    glfw: glfw::Glfw,
    window: Rc<RefCell<glfw::PWindow>>,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
    relative_mouse: Option<bool>,
}

impl GlfwPlatform {
    /// Open a window
    pub fn new(title: &str, width: u32, height: u32) -> WindowResult<Self> {
        let mut glfw = glfw::init(glfw::fail_on_errors)
            .map_err(|e| WindowError::InitializationFailed(format!("{e:?}")))?;

        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        let (mut window, events) = glfw
            .create_window(width, height, title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        window.set_key_polling(true);
        window.set_cursor_pos_polling(true);
        window.set_close_polling(true);
        window.set_framebuffer_size_polling(true);

        log::info!("Created {}x{} window \"{}\"", width, height, title);

        Ok(Self {
            glfw,
            window: Rc::new(RefCell::new(window)),
            events,
            relative_mouse: None,
        })
    }

    /// Build a wgpu device that presents to this window
    ///
    /// The device keeps the window alive for as long as it exists.
    pub fn create_device(&self, vsync: bool) -> RenderResult<WgpuDevice> {
        let (width, height) = self.size();
        WgpuDevice::for_window(Rc::clone(&self.window), width, height, vsync)
    }
}

impl Platform for GlfwPlatform {
    fn poll_events(&mut self) -> Vec<AppEvent> {
        self.glfw.poll_events();
        glfw::flush_messages(&self.events)
            .filter_map(|(_, event)| translate_event(event))
            .collect()
    }

    fn end_frame(&mut self) {
        // The device presented its surface while drawing
    }

    fn set_relative_mouse(&mut self, enabled: bool) {
        if self.relative_mouse == Some(enabled) {
            return;
        }
        self.relative_mouse = Some(enabled);
        let mode = if enabled {
            glfw::CursorMode::Disabled
        } else {
            glfw::CursorMode::Normal
        };
        self.window.borrow_mut().set_cursor_mode(mode);
    }

    fn size(&self) -> (u32, u32) {
        let (width, height) = self.window.borrow().get_framebuffer_size();
        (width.max(0) as u32, height.max(0) as u32)
    }
}

fn translate_event(event: glfw::WindowEvent) -> Option<AppEvent> {
    match event {
        glfw::WindowEvent::Close => Some(AppEvent::WindowCloseRequested),
        glfw::WindowEvent::FramebufferSize(width, height) => Some(AppEvent::WindowResized {
            width: width.max(0) as u32,
            height: height.max(0) as u32,
        }),
        glfw::WindowEvent::CursorPos(x, y) => Some(AppEvent::MouseMoved { x, y }),
        glfw::WindowEvent::Key(key, _, action, _) => {
            let key = map_key(key)?;
            match action {
                glfw::Action::Press => Some(AppEvent::key_down(key)),
                glfw::Action::Release => Some(AppEvent::key_up(key)),
                glfw::Action::Repeat => None,
            }
        }
        _ => None,
    }
}

fn map_key(key: glfw::Key) -> Option<KeyCode> {
    let code = match key {
        glfw::Key::A => KeyCode::A,
        glfw::Key::D => KeyCode::D,
        glfw::Key::E => KeyCode::E,
        glfw::Key::Q => KeyCode::Q,
        glfw::Key::S => KeyCode::S,
        glfw::Key::W => KeyCode::W,
        glfw::Key::Space => KeyCode::Space,
        glfw::Key::LeftShift => KeyCode::LeftShift,
        glfw::Key::Enter => KeyCode::Enter,
        glfw::Key::Escape => KeyCode::Escape,
        glfw::Key::F1 => KeyCode::F1,
        glfw::Key::F2 => KeyCode::F2,
        glfw::Key::F3 => KeyCode::F3,
        glfw::Key::Up => KeyCode::Up,
        glfw::Key::Down => KeyCode::Down,
        glfw::Key::Left => KeyCode::Left,
        glfw::Key::Right => KeyCode::Right,
        _ => return None,
    };
    Some(code)
}

//! Headless graphics device
//!
//! [`RecordingDevice`] implements [`GraphicsDevice`] without a GPU. Every call
//! is appended to a command log and resource lifetimes are tracked, so tests
//! can assert on draw order, uniforms and leaks. Clones share the same log.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::foundation::math::Mat4;
use crate::render::device::{
    GpuTextureHandle, GraphicsDevice, PolygonMode, ProgramHandle, RenderError, RenderResult, TextureTarget,
    TextureUpload, VertexArrayHandle,
};
use crate::render::mesh::Vertex;

/// One recorded device call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Program compiled and linked
    CreateProgram {
        /// New program
        program: ProgramHandle,
        /// Name it was built under
        name: String,
    },
    /// Program deleted
    DeleteProgram(ProgramHandle),
    /// Program made current
    UseProgram(ProgramHandle),
    /// Matrix uniform set
    SetUniformMat4 {
        /// Target program
        program: ProgramHandle,
        /// Uniform name
        name: String,
        /// Value
        value: Mat4,
    },
    /// Integer uniform set
    SetUniformI32 {
        /// Target program
        program: ProgramHandle,
        /// Uniform name
        name: String,
        /// Value
        value: i32,
    },
    /// Texture created
    CreateTexture {
        /// New texture
        texture: GpuTextureHandle,
        /// Target
        target: TextureTarget,
        /// Number of faces uploaded
        faces: usize,
    },
    /// Texture deleted
    DeleteTexture(GpuTextureHandle),
    /// Texture bound to a unit
    BindTexture {
        /// Texture unit
        unit: u32,
        /// Target
        target: TextureTarget,
        /// Texture
        texture: GpuTextureHandle,
    },
    /// Vertex array created
    CreateVertexArray {
        /// New vertex array
        vertex_array: VertexArrayHandle,
        /// Vertex count
        vertices: usize,
        /// Index count
        indices: usize,
    },
    /// Vertex array deleted
    DeleteVertexArray(VertexArrayHandle),
    /// Vertex array bound
    BindVertexArray(VertexArrayHandle),
    /// Indexed draw issued
    DrawElements {
        /// Program current at draw time
        program: Option<ProgramHandle>,
        /// Vertex array bound at draw time
        vertex_array: Option<VertexArrayHandle>,
        /// Index count
        index_count: u32,
    },
    /// Framebuffer cleared
    Clear([f32; 4]),
    /// Viewport changed
    SetViewport {
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },
    /// Rasterization mode changed
    SetPolygonMode(PolygonMode),
    /// Vertical sync toggled
    SetVsync(bool),
    /// Frame shown
    Present,
}

#[derive(Debug, Default)]
struct RecordingState {
    commands: Vec<DrawCommand>,
    next_id: u32,
    programs: HashSet<ProgramHandle>,
    textures: HashSet<GpuTextureHandle>,
    vertex_arrays: HashSet<VertexArrayHandle>,
    current_program: Option<ProgramHandle>,
    current_vertex_array: Option<VertexArrayHandle>,
}

impl RecordingState {
    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

/// Device that records commands instead of drawing
#[derive(Debug, Clone, Default)]
pub struct RecordingDevice {
    state: Rc<RefCell<RecordingState>>,
}

impl RecordingDevice {
    /// Create an empty device
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the command log
    pub fn commands(&self) -> Vec<DrawCommand> {
        self.state.borrow().commands.clone()
    }

    /// Forget recorded commands (resources stay alive)
    pub fn clear_commands(&self) {
        self.state.borrow_mut().commands.clear();
    }

    /// Number of draw calls in the log
    pub fn draw_calls(&self) -> usize {
        self.state
            .borrow()
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::DrawElements { .. }))
            .count()
    }

    /// Values set for a matrix uniform, in call order
    pub fn mat4_uniforms(&self, uniform: &str) -> Vec<(ProgramHandle, Mat4)> {
        self.state
            .borrow()
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::SetUniformMat4 { program, name, value } if name == uniform => Some((*program, *value)),
                _ => None,
            })
            .collect()
    }

    /// Programs not yet deleted
    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    /// Textures not yet deleted
    pub fn live_textures(&self) -> usize {
        self.state.borrow().textures.len()
    }

    /// Vertex arrays not yet deleted
    pub fn live_vertex_arrays(&self) -> usize {
        self.state.borrow().vertex_arrays.len()
    }

    fn record(&self, command: DrawCommand) {
        log::trace!("device: {:?}", command);
        self.state.borrow_mut().commands.push(command);
    }
}

fn validate_upload(upload: &TextureUpload<'_>) -> RenderResult<()> {
    let image = upload.image;
    let expected = image.width as usize * image.height as usize * usize::from(image.channels);
    if image.data.len() == expected {
        Ok(())
    } else {
        Err(RenderError::InvalidTexture(format!(
            "{}x{}x{} image carries {} bytes",
            image.width,
            image.height,
            image.channels,
            image.data.len()
        )))
    }
}

impl GraphicsDevice for RecordingDevice {
    fn create_program(&mut self, name: &str, vertex_src: &str, fragment_src: &str) -> RenderResult<ProgramHandle> {
        for (stage, source) in [("vertex", vertex_src), ("fragment", fragment_src)] {
            if source.trim().is_empty() {
                return Err(RenderError::ShaderCompile {
                    name: name.to_string(),
                    log: format!("{stage} shader is empty"),
                });
            }
            if let Some(line) = source.lines().find(|line| line.trim_start().starts_with("#error")) {
                return Err(RenderError::ShaderCompile {
                    name: name.to_string(),
                    log: format!("{stage} shader: {}", line.trim()),
                });
            }
        }

        let program = {
            let mut state = self.state.borrow_mut();
            let program = ProgramHandle(state.next());
            state.programs.insert(program);
            program
        };
        self.record(DrawCommand::CreateProgram {
            program,
            name: name.to_string(),
        });
        Ok(program)
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.state.borrow_mut().programs.remove(&program);
        self.record(DrawCommand::DeleteProgram(program));
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.state.borrow_mut().current_program = Some(program);
        self.record(DrawCommand::UseProgram(program));
    }

    fn set_uniform_mat4(&mut self, program: ProgramHandle, name: &str, value: &Mat4) {
        self.record(DrawCommand::SetUniformMat4 {
            program,
            name: name.to_string(),
            value: *value,
        });
    }

    fn set_uniform_i32(&mut self, program: ProgramHandle, name: &str, value: i32) {
        self.record(DrawCommand::SetUniformI32 {
            program,
            name: name.to_string(),
            value,
        });
    }

    fn create_texture(&mut self, target: TextureTarget, faces: &[TextureUpload<'_>]) -> RenderResult<GpuTextureHandle> {
        let expected = match target {
            TextureTarget::Texture2D => 1,
            TextureTarget::CubeMap => 6,
        };
        if faces.len() != expected {
            return Err(RenderError::InvalidTexture(format!(
                "{target:?} needs {expected} images, got {}",
                faces.len()
            )));
        }
        for upload in faces {
            validate_upload(upload)?;
        }

        let texture = {
            let mut state = self.state.borrow_mut();
            let texture = GpuTextureHandle(state.next());
            state.textures.insert(texture);
            texture
        };
        self.record(DrawCommand::CreateTexture {
            texture,
            target,
            faces: faces.len(),
        });
        Ok(texture)
    }

    fn delete_texture(&mut self, texture: GpuTextureHandle) {
        self.state.borrow_mut().textures.remove(&texture);
        self.record(DrawCommand::DeleteTexture(texture));
    }

    fn bind_texture(&mut self, unit: u32, target: TextureTarget, texture: GpuTextureHandle) {
        self.record(DrawCommand::BindTexture { unit, target, texture });
    }

    fn create_vertex_array(&mut self, vertices: &[Vertex], indices: &[u32]) -> RenderResult<VertexArrayHandle> {
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(RenderError::Device(format!(
                "index {bad} out of range for {} vertices",
                vertices.len()
            )));
        }

        let vertex_array = {
            let mut state = self.state.borrow_mut();
            let vertex_array = VertexArrayHandle(state.next());
            state.vertex_arrays.insert(vertex_array);
            vertex_array
        };
        self.record(DrawCommand::CreateVertexArray {
            vertex_array,
            vertices: vertices.len(),
            indices: indices.len(),
        });
        Ok(vertex_array)
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayHandle) {
        self.state.borrow_mut().vertex_arrays.remove(&vertex_array);
        self.record(DrawCommand::DeleteVertexArray(vertex_array));
    }

    fn bind_vertex_array(&mut self, vertex_array: VertexArrayHandle) {
        self.state.borrow_mut().current_vertex_array = Some(vertex_array);
        self.record(DrawCommand::BindVertexArray(vertex_array));
    }

    fn draw_elements(&mut self, index_count: u32) {
        let (program, vertex_array) = {
            let state = self.state.borrow();
            (state.current_program, state.current_vertex_array)
        };
        self.record(DrawCommand::DrawElements {
            program,
            vertex_array,
            index_count,
        });
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.record(DrawCommand::Clear(color));
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.record(DrawCommand::SetViewport { width, height });
    }

    fn set_polygon_mode(&mut self, mode: PolygonMode) {
        self.record(DrawCommand::SetPolygonMode(mode));
    }

    fn set_vsync(&mut self, enabled: bool) {
        self.record(DrawCommand::SetVsync(enabled));
    }

    fn present(&mut self) -> RenderResult<()> {
        self.record(DrawCommand::Present);
        Ok(())
    }

    fn info(&self) -> Vec<(String, String)> {
        vec![
            ("Vendor".to_string(), "panorama".to_string()),
            ("Renderer".to_string(), "recording device".to_string()),
            ("Version".to_string(), env!("CARGO_PKG_VERSION").to_string()),
        ]
    }
}

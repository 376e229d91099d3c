//! Graphics device abstraction
//!
//! The renderer, the resource managers and the mesh draw path talk to the GPU
//! only through [`GraphicsDevice`]. The engine ships two implementations:
//! [`WgpuDevice`](super::WgpuDevice) draws into a window, and
//! [`RecordingDevice`](super::RecordingDevice) records every call for tests
//! and headless runs.
//!
//! Bound state (current program, textures, vertex array) is global to the
//! device and consumed by the next draw call, so callers must issue commands in
//! a deterministic order.

use thiserror::Error;

use crate::assets::{AssetError, ImageData, PixelFormat};
use crate::foundation::math::Mat4;
use crate::render::mesh::Vertex;

/// Result type for device operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Rendering errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// Shader failed to compile or link
    #[error("Shader compilation failed for {name}: {log}")]
    ShaderCompile {
        /// Shader pair being built
        name: String,
        /// Compiler/linker output
        log: String,
    },

    /// Handle does not refer to a live resource
    #[error("Invalid {kind} handle: {id}")]
    InvalidHandle {
        /// Resource kind
        kind: &'static str,
        /// Handle as printed
        id: String,
    },

    /// Index buffer longer than a draw call can address
    #[error("Mesh has {0} indices, more than a draw call can submit")]
    TooManyIndices(usize),

    /// Texture data does not match its declared layout
    #[error("Invalid texture data: {0}")]
    InvalidTexture(String),

    /// Source or image for a resource could not be read
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Backend-specific failure
    #[error("Device error: {0}")]
    Device(String),
}

/// Linked shader program owned by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Texture object owned by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuTextureHandle(pub u32);

/// Vertex array (vertex + index buffers) owned by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayHandle(pub u32);

/// Texture target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    /// Plain 2D texture
    Texture2D,
    /// Six-face cubemap (+X, -X, +Y, -Y, +Z, -Z)
    CubeMap,
}

/// One image to upload, with its validated layout
#[derive(Debug, Clone, Copy)]
pub struct TextureUpload<'a> {
    /// Decoded pixels
    pub image: &'a ImageData,
    /// Layout the pixels are in
    pub format: PixelFormat,
}

/// Polygon rasterization mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolygonMode {
    /// Filled triangles
    Fill,
    /// Wireframe
    Line,
}

/// GPU command interface
pub trait GraphicsDevice {
    /// Compile and link a program from vertex and fragment sources
    fn create_program(&mut self, name: &str, vertex_src: &str, fragment_src: &str) -> RenderResult<ProgramHandle>;

    /// Delete a program
    fn delete_program(&mut self, program: ProgramHandle);

    /// Make a program current
    fn use_program(&mut self, program: ProgramHandle);

    /// Set a 4x4 matrix uniform on a program
    fn set_uniform_mat4(&mut self, program: ProgramHandle, name: &str, value: &Mat4);

    /// Set an integer uniform (sampler units)
    fn set_uniform_i32(&mut self, program: ProgramHandle, name: &str, value: i32);

    /// Create a texture; a cubemap takes exactly six faces
    fn create_texture(&mut self, target: TextureTarget, faces: &[TextureUpload<'_>]) -> RenderResult<GpuTextureHandle>;

    /// Delete a texture
    fn delete_texture(&mut self, texture: GpuTextureHandle);

    /// Bind a texture to a texture unit
    fn bind_texture(&mut self, unit: u32, target: TextureTarget, texture: GpuTextureHandle);

    /// Upload vertex and index data into a new vertex array
    fn create_vertex_array(&mut self, vertices: &[Vertex], indices: &[u32]) -> RenderResult<VertexArrayHandle>;

    /// Delete a vertex array
    fn delete_vertex_array(&mut self, vertex_array: VertexArrayHandle);

    /// Bind a vertex array
    fn bind_vertex_array(&mut self, vertex_array: VertexArrayHandle);

    /// Draw indexed triangles from the bound vertex array with the bound program
    fn draw_elements(&mut self, index_count: u32);

    /// Clear color and depth
    fn clear(&mut self, color: [f32; 4]);

    /// Set the viewport size
    fn set_viewport(&mut self, width: u32, height: u32);

    /// Switch between filled and wireframe rasterization
    fn set_polygon_mode(&mut self, mode: PolygonMode);

    /// Wait for vertical sync when presenting
    fn set_vsync(&mut self, _enabled: bool) {}

    /// Show the frame drawn since the last clear
    fn present(&mut self) -> RenderResult<()> {
        Ok(())
    }

    /// Human-readable adapter/driver description
    fn info(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

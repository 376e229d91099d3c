//! # Rendering System
//!
//! Everything between the scene and the GPU:
//! - **Device**: the [`GraphicsDevice`] command interface, the windowed
//!   [`WgpuDevice`] and the headless [`RecordingDevice`]
//! - **Resources**: name-keyed [`ShaderManager`] and [`TextureManager`]
//!   caches whose handles survive hot reload, and uploaded [`Mesh`]es
//! - **Renderer**: per-frame draw sequencing
//! - **Window**: the GLFW platform that owns the native window

pub mod device;
pub mod mesh;
pub mod recording;
pub mod renderer;
pub mod shader_manager;
pub mod texture_manager;
pub mod wgpu_device;
pub mod window;

pub use device::{
    GpuTextureHandle, GraphicsDevice, PolygonMode, ProgramHandle, RenderError, RenderResult, TextureTarget,
    TextureUpload, VertexArrayHandle,
};
pub use mesh::{Mesh, MeshData, MeshTexture, TextureRole, Vertex};
pub use recording::{DrawCommand, RecordingDevice};
pub use renderer::{CameraMatrices, DrawContext, FrameDrawStats, Renderer, CLEAR_COLOR};
pub use shader_manager::{ShaderId, ShaderManager};
pub use texture_manager::{Texture, TextureId, TextureManager};
pub use wgpu_device::WgpuDevice;
pub use window::{GlfwPlatform, WindowError};

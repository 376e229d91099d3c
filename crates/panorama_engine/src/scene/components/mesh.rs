//! Drawable mesh component

use crate::foundation::math::Transform;
use crate::render::{DrawContext, GraphicsDevice, Mesh, RenderResult, ShaderId};

/// Mesh drawn at the owner's transform with one shader
#[derive(Debug, PartialEq)]
pub struct MeshComponent {
    mesh: Mesh,
    shader: ShaderId,
    visible: bool,
}

impl MeshComponent {
    /// Wrap an uploaded mesh
    pub fn new(mesh: Mesh, shader: ShaderId) -> Self {
        Self {
            mesh,
            shader,
            visible: true,
        }
    }

    /// Shader the mesh is drawn with
    pub fn shader(&self) -> ShaderId {
        self.shader
    }

    /// The uploaded geometry
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Whether the mesh is drawn
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Show or hide the mesh
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Upload `model = T*S*R` and draw; returns the indices submitted
    pub fn draw(&self, transform: &Transform, ctx: &mut DrawContext<'_>) -> RenderResult<u32> {
        if !self.visible {
            return Ok(0);
        }

        let program = ctx.shaders.program(self.shader)?;
        ctx.device.use_program(program);
        ctx.device.set_uniform_mat4(program, "model", &transform.model_matrix());
        self.mesh.draw(ctx.device, ctx.textures, program)?;
        Ok(self.mesh.index_count())
    }

    /// Free the mesh's device objects
    pub fn release(&self, device: &mut dyn GraphicsDevice) {
        self.mesh.release(device);
    }
}

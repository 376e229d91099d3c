//! Frame renderer
//!
//! Draw order per frame is fixed: clear, then `view`/`projection` on every
//! distinct program in first-use order, then each drawable in the order it
//! was handed in (active actor order, then component priority), then present.

use crate::foundation::math::{Mat4, Transform};
use crate::render::device::{GraphicsDevice, RenderResult};
use crate::render::shader_manager::{ShaderId, ShaderManager};
use crate::render::texture_manager::TextureManager;
use crate::scene::{Component, ComponentKind};

/// Background color
pub const CLEAR_COLOR: [f32; 4] = [0.1, 0.1, 0.1, 1.0];

/// Borrowed GPU state for one frame
pub struct DrawContext<'a> {
    /// Device commands go to
    pub device: &'a mut dyn GraphicsDevice,
    /// Program lookup
    pub shaders: &'a ShaderManager,
    /// Texture lookup
    pub textures: &'a TextureManager,
}

/// Camera matrices uploaded once per program per frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMatrices {
    /// World to view
    pub view: Mat4,
    /// View to clip
    pub projection: Mat4,
}

impl Default for CameraMatrices {
    fn default() -> Self {
        Self {
            view: Mat4::identity(),
            projection: Mat4::identity(),
        }
    }
}

/// Counters for the last drawn frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameDrawStats {
    /// Draw calls issued
    pub draw_calls: u32,
    /// Indices submitted
    pub indices: u64,
}

/// Viewport owner and draw sequencer
#[derive(Debug)]
pub struct Renderer {
    width: u32,
    height: u32,
    last_frame: FrameDrawStats,
}

impl Renderer {
    /// Create a renderer and size the viewport
    pub fn new(device: &mut dyn GraphicsDevice, width: u32, height: u32) -> Self {
        device.set_viewport(width, height);
        Self {
            width,
            height,
            last_frame: FrameDrawStats::default(),
        }
    }

    /// Resize the viewport
    pub fn set_dimensions(&mut self, device: &mut dyn GraphicsDevice, width: u32, height: u32) {
        log::debug!("Viewport resized to {}x{}", width, height);
        self.width = width;
        self.height = height;
        device.set_viewport(width, height);
    }

    /// Viewport width
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Viewport height
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width over height; 1.0 for a degenerate viewport
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Counters from the last [`Renderer::draw`]
    pub fn last_frame(&self) -> FrameDrawStats {
        self.last_frame
    }

    /// Print device information
    pub fn log_info(&self, device: &dyn GraphicsDevice) {
        for (key, value) in device.info() {
            log::info!("{:<10} : {}", key, value);
        }
        log::info!("Viewport   : {}x{}", self.width, self.height);
    }

    /// Draw one frame
    ///
    /// Without a camera both matrices are identity.
    pub fn draw(
        &mut self,
        ctx: &mut DrawContext<'_>,
        camera: Option<CameraMatrices>,
        drawables: &[(&Component, &Transform)],
    ) -> RenderResult<FrameDrawStats> {
        ctx.device.clear(CLEAR_COLOR);
        let camera = camera.unwrap_or_default();

        let mut seen: Vec<ShaderId> = Vec::new();
        for (component, _) in drawables {
            if let ComponentKind::Mesh(mesh) = component.kind() {
                if mesh.is_visible() && !seen.contains(&mesh.shader()) {
                    seen.push(mesh.shader());
                }
            }
        }
        for &shader in &seen {
            let program = ctx.shaders.program(shader)?;
            ctx.device.use_program(program);
            ctx.device.set_uniform_mat4(program, "view", &camera.view);
            ctx.device.set_uniform_mat4(program, "projection", &camera.projection);
        }

        let mut stats = FrameDrawStats::default();
        for (component, transform) in drawables {
            let indices = component.draw(transform, ctx)?;
            if indices > 0 {
                stats.draw_calls += 1;
                stats.indices += u64::from(indices);
            }
        }

        ctx.device.present()?;

        log::trace!("Drew {} meshes ({} indices)", stats.draw_calls, stats.indices);
        self.last_frame = stats;
        Ok(stats)
    }
}

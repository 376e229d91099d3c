//! Components attached to actors
//!
//! The set of component kinds is closed, so dispatch is a single `match` per
//! hook; a kind with nothing to do for a hook simply falls through.

use crate::foundation::math::Transform;
use crate::input::KeyState;
use crate::render::{DrawContext, GraphicsDevice, RenderResult};
use crate::scene::actor::ActorId;
use crate::scene::components::{CameraComponent, MeshComponent, MovementComponent};

/// Default priority for movement and mesh components
pub const DEFAULT_PRIORITY: i32 = 100;

/// Default priority for cameras, so they see this frame's movement
pub const CAMERA_PRIORITY: i32 = 200;

/// Per-frame values components may need during update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    /// Viewport width over height
    pub aspect: f32,
}

impl Default for FrameInfo {
    fn default() -> Self {
        Self { aspect: 1.0 }
    }
}

/// Component variant data
#[derive(Debug, PartialEq)]
pub enum ComponentKind {
    /// Integrates speeds into the owner's transform
    Movement(MovementComponent),
    /// Computes view and projection from the owner's transform
    Camera(CameraComponent),
    /// Draws geometry at the owner's transform
    Mesh(MeshComponent),
}

impl ComponentKind {
    /// Priority used when none is given
    pub const fn default_priority(&self) -> i32 {
        match self {
            Self::Camera(_) => CAMERA_PRIORITY,
            Self::Movement(_) | Self::Mesh(_) => DEFAULT_PRIORITY,
        }
    }
}

/// A component owned by one actor
#[derive(Debug, PartialEq)]
pub struct Component {
    owner: ActorId,
    priority: i32,
    kind: ComponentKind,
}

impl Component {
    pub(crate) const fn new(owner: ActorId, priority: i32, kind: ComponentKind) -> Self {
        Self { owner, priority, kind }
    }

    /// Actor this component belongs to
    pub fn owner(&self) -> ActorId {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: ActorId) {
        self.owner = owner;
    }

    /// Lower priorities run first
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Variant data
    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    /// Mutable variant data
    pub fn kind_mut(&mut self) -> &mut ComponentKind {
        &mut self.kind
    }

    /// Per-frame input
    pub fn input(&mut self, keys: &KeyState) {
        match &mut self.kind {
            ComponentKind::Movement(movement) => movement.input(keys),
            ComponentKind::Camera(_) | ComponentKind::Mesh(_) => {}
        }
    }

    /// Per-frame update with the owner's transform
    pub fn update(&mut self, transform: &mut Transform, delta: f32, frame: &FrameInfo) {
        match &mut self.kind {
            ComponentKind::Movement(movement) => movement.update(transform, delta),
            ComponentKind::Camera(camera) => camera.update(transform, frame.aspect),
            ComponentKind::Mesh(_) => {}
        }
    }

    /// Draw with the owner's transform; returns the indices submitted
    pub fn draw(&self, transform: &Transform, ctx: &mut DrawContext<'_>) -> RenderResult<u32> {
        match &self.kind {
            ComponentKind::Mesh(mesh) => mesh.draw(transform, ctx),
            ComponentKind::Movement(_) | ComponentKind::Camera(_) => Ok(0),
        }
    }

    /// Free device objects held by the component
    pub fn release(&self, device: &mut dyn GraphicsDevice) {
        if let ComponentKind::Mesh(mesh) = &self.kind {
            mesh.release(device);
        }
    }
}

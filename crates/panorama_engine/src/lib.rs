//! # Panorama Engine
//!
//! A small actor/component engine for viewing 3D panoramas.
//!
//! ## Features
//!
//! - **Actors and components**: movement, camera and mesh components dispatched
//!   in priority order, plus per-actor behaviour hooks
//! - **Safe mutation during iteration**: actors can spawn or remove actors from
//!   their own hooks; additions are merged and dead actors reaped after update
//! - **Resource caches**: shaders and textures are loaded once and reloaded in
//!   place, so handles stay valid across hot reload
//! - **Injectable collaborators**: graphics device, asset source, clock and
//!   platform are traits, which keeps the whole frame loop testable headless
//! - **Rendering**: `WgpuDevice` draws into a glfw window through wgpu, and
//!   `RecordingDevice` records the same commands without a GPU
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use panorama_engine::prelude::*;
//!
//! fn main() -> Result<(), EngineError> {
//!     let config = EngineConfig::default();
//!     let mut overlay = DebugOverlay::new(&config.window);
//!     let mut platform = ScriptedPlatform::new(config.window.width, config.window.height, Some(60));
//!     let mut game = Game::new(
//!         config,
//!         Box::new(RecordingDevice::new()),
//!         Box::new(FsAssetSource::new()),
//!         Box::new(SystemClock::new()),
//!     );
//!
//!     let id = game.spawn(|id, _| {
//!         Ok(ActorBuilder::new(id, "viewer")
//!             .component(ComponentKind::Camera(CameraComponent::default()))
//!             .build())
//!     })?;
//!     game.set_camera(id);
//!
//!     engine::run(&mut game, &mut platform, &mut overlay);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::cast_precision_loss)]

pub mod application;
pub mod assets;
pub mod config;
pub mod core;
pub mod debug;
pub mod engine;
pub mod foundation;
pub mod input;
pub mod render;
pub mod scene;

pub use engine::{EngineError, EngineResult, RunSummary};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        application::{AppControl, AppEvent, Platform, ScriptedPlatform},
        assets::{AssetError, AssetSource, FsAssetSource, ImageData, MemoryAssetSource},
        core::config::{Config, EngineConfig},
        debug::DebugOverlay,
        engine::{self, EngineError, EngineResult, RunSummary},
        foundation::{
            math::{Mat4, Quat, Transform, Vec3},
            time::{Clock, ManualClock, SystemClock},
        },
        input::{KeyCode, KeyState},
        render::{
            GraphicsDevice, Mesh, MeshData, MeshTexture, RecordingDevice, ShaderId, TextureId, TextureRole,
        },
        scene::{
            Actor, ActorBehavior, ActorBuilder, ActorId, ActorState, CameraComponent, ComponentKind, Game,
            MeshComponent, MovementBindings, MovementComponent,
        },
    };
}

//! Scenario tests for the actor lifecycle and the frame loop
//!
//! Every scenario runs a real [`Game`] against a recording device, an
//! in-memory asset source and a hand-driven clock. The harness keeps clones of
//! all three so tests can inspect device calls, edit assets and move time.

mod frame;

use std::cell::RefCell;
use std::rc::Rc;

use crate::assets::MemoryAssetSource;
use crate::core::EngineConfig;
use crate::engine::EngineResult;
use crate::foundation::math::Vec3;
use crate::foundation::time::ManualClock;
use crate::render::{MeshData, RecordingDevice};
use crate::scene::{Actor, ActorBuilder, ActorId, CameraComponent, ComponentKind, Game, MeshComponent};

pub(super) const VERTEX_SOURCE: &str = "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }\n";
pub(super) const FRAGMENT_SOURCE: &str = "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }\n";

pub(super) struct Harness {
    pub game: Game,
    pub device: RecordingDevice,
    pub assets: MemoryAssetSource,
    pub clock: ManualClock,
}

pub(super) fn quiet_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.debug.hot_reload = false;
    config.debug.pause_on_error = false;
    config.window.width = 800;
    config.window.height = 600;
    config
}

pub(super) fn harness() -> Harness {
    harness_with(quiet_config())
}

pub(super) fn harness_with(config: EngineConfig) -> Harness {
    let device = RecordingDevice::new();
    let assets = MemoryAssetSource::new();
    let clock = ManualClock::new();
    assets.insert_text("shaders/basic.vert", VERTEX_SOURCE);
    assets.insert_text("shaders/basic.frag", FRAGMENT_SOURCE);

    let game = Game::new(
        config,
        Box::new(device.clone()),
        Box::new(assets.clone()),
        Box::new(clock.clone()),
    );
    Harness {
        game,
        device,
        assets,
        clock,
    }
}

/// Shared log behaviours write into
pub(super) type Journal = Rc<RefCell<Vec<String>>>;

pub(super) fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

pub(super) fn spawn_empty(game: &mut Game, name: &str) -> ActorId {
    let name = name.to_string();
    game.spawn(move |id, _| Ok(ActorBuilder::new(id, name).build()))
        .unwrap()
}

pub(super) fn spawn_camera(game: &mut Game, position: Vec3) -> ActorId {
    let id = game
        .spawn(|id, _| {
            Ok(ActorBuilder::new(id, "camera")
                .position(position)
                .component(ComponentKind::Camera(CameraComponent::default()))
                .build())
        })
        .unwrap();
    assert!(game.set_camera(id));
    id
}

pub(super) fn cube_actor(id: ActorId, game: &mut Game, position: Vec3) -> EngineResult<Actor> {
    let shader = game.shader("basic.vert", "basic.frag")?;
    let mesh = game.create_mesh(&MeshData::cube(), Vec::new())?;
    Ok(ActorBuilder::new(id, "cube")
        .position(position)
        .component(ComponentKind::Mesh(MeshComponent::new(mesh, shader)))
        .build())
}

pub(super) fn spawn_cube(game: &mut Game, position: Vec3) -> ActorId {
    game.spawn(|id, game| cube_actor(id, game, position)).unwrap()
}

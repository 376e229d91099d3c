//! The player: a walking camera with mouse look

use panorama_engine::core::ControlsConfig;
use panorama_engine::prelude::*;
use panorama_engine::scene::turn;

/// Mouse-look behaviour; walking is handled by the movement component
#[derive(Debug, Clone, Copy)]
pub struct Player {
    sensitivity: f32,
}

impl Player {
    /// Player turning `sensitivity` radians per pixel of mouse motion
    pub fn new(sensitivity: f32) -> Self {
        Self { sensitivity }
    }
}

impl ActorBehavior for Player {
    fn input(&mut self, actor: &mut Actor, keys: &KeyState, _game: &mut Game) {
        let motion = keys.mouse_delta();
        if motion.x == 0.0 && motion.y == 0.0 {
            return;
        }
        turn(actor.transform_mut(), -motion.x * self.sensitivity, -motion.y * self.sensitivity);
    }
}

/// Spawn the player at the origin and make it the active camera
pub fn spawn_player(game: &mut Game) -> EngineResult<ActorId> {
    let controls: ControlsConfig = game.config().controls.clone();
    let camera = CameraComponent::from_config(&game.config().camera);

    let id = game.spawn(|id, _| {
        let bindings = MovementBindings {
            speed: controls.move_speed,
            ..MovementBindings::default()
        };
        Ok(ActorBuilder::new(id, "player")
            .component(ComponentKind::Movement(MovementComponent::with_bindings(bindings)))
            .component(ComponentKind::Camera(camera))
            .behavior(Player::new(controls.mouse_sensitivity))
            .build())
    })?;

    game.set_camera(id);
    log::info!("Player ready");
    Ok(id)
}

//! Frame timing, draw submission and event handling

use approx::assert_relative_eq;

use super::*;
use crate::application::{AppControl, AppEvent};
use crate::debug::DebugOverlay;
use crate::input::KeyCode;
use crate::render::{DrawCommand, CLEAR_COLOR};
use crate::scene::{MovementBindings, MovementComponent};

#[test]
fn test_delta_is_clamped() {
    let mut h = harness();

    h.clock.advance(16);
    assert_relative_eq!(h.game.update(), 0.016, epsilon = 1e-6);

    h.clock.advance(500);
    assert_relative_eq!(h.game.update(), 0.05, epsilon = 1e-6);
    assert_relative_eq!(h.game.last_delta(), 0.05, epsilon = 1e-6);

    // A clock that did not move yields a zero delta
    assert_relative_eq!(h.game.update(), 0.0);
}

#[test]
fn test_clamp_follows_config() {
    let mut config = quiet_config();
    config.timing.max_delta_seconds = 0.1;
    let mut h = harness_with(config);

    h.clock.advance(1_000);
    assert_relative_eq!(h.game.update(), 0.1, epsilon = 1e-6);
}

#[test]
fn test_draw_sets_camera_once_per_shader_then_models() {
    let mut h = harness();
    spawn_camera(&mut h.game, Vec3::new(0.0, 0.0, 4.0));
    let a = spawn_cube(&mut h.game, Vec3::new(-1.0, 0.0, 0.0));
    let b = spawn_cube(&mut h.game, Vec3::new(1.0, 0.0, 0.0));
    h.game.update();
    h.device.clear_commands();

    let drawn = h.game.draw().unwrap();
    assert_eq!(drawn.draw_calls, 2);
    assert_eq!(drawn.indices, 72);

    let commands = h.device.commands();
    assert_eq!(commands[0], DrawCommand::Clear(CLEAR_COLOR));
    assert_eq!(commands.last(), Some(&DrawCommand::Present));
    assert_eq!(h.device.mat4_uniforms("view").len(), 1);
    assert_eq!(h.device.mat4_uniforms("projection").len(), 1);
    assert_eq!(h.device.draw_calls(), 2);

    let models = h.device.mat4_uniforms("model");
    assert_eq!(models.len(), 2);
    assert_eq!(models[0].1, h.game.actor(a).unwrap().model_matrix());
    assert_eq!(models[1].1, h.game.actor(b).unwrap().model_matrix());

    let (_, view) = h.device.mat4_uniforms("view")[0];
    assert_relative_eq!(view[(2, 3)], -4.0, epsilon = 1e-5);

    // Camera uniforms are set before the first model matrix
    let first_view = commands
        .iter()
        .position(|c| matches!(c, DrawCommand::SetUniformMat4 { name, .. } if name == "view"))
        .unwrap();
    let first_model = commands
        .iter()
        .position(|c| matches!(c, DrawCommand::SetUniformMat4 { name, .. } if name == "model"))
        .unwrap();
    assert!(first_view < first_model);
}

#[test]
fn test_draw_without_camera_uses_identity() {
    let mut h = harness();
    spawn_cube(&mut h.game, Vec3::zeros());
    h.game.draw().unwrap();

    let (_, view) = h.device.mat4_uniforms("view")[0];
    let (_, projection) = h.device.mat4_uniforms("projection")[0];
    assert_eq!(view, crate::foundation::math::Mat4::identity());
    assert_eq!(projection, crate::foundation::math::Mat4::identity());
}

#[test]
fn test_removing_camera_actor_clears_camera() {
    let mut h = harness();
    let camera = spawn_camera(&mut h.game, Vec3::zeros());
    assert_eq!(h.game.camera(), Some(camera));

    assert!(h.game.remove_actor(camera));
    assert_eq!(h.game.camera(), None);
}

#[test]
fn test_degenerate_camera_config_does_not_reach_projection() {
    let mut config = quiet_config();
    config.camera.near = 2.0;
    config.camera.far = 2.0;
    let mut h = harness_with(config);

    let id = h
        .game
        .spawn(|id, game| {
            Ok(ActorBuilder::new(id, "camera")
                .component(ComponentKind::Camera(CameraComponent::from_config(&game.config().camera)))
                .build())
        })
        .unwrap();
    assert!(h.game.set_camera(id));

    h.clock.advance(16);
    h.game.update();
    h.game.draw().unwrap();

    let (_, projection) = h.device.mat4_uniforms("projection")[0];
    assert!(projection.iter().all(|c| c.is_finite()));
    assert_ne!(projection, crate::foundation::math::Mat4::identity());
}

#[test]
fn test_set_camera_requires_camera_component() {
    let mut h = harness();
    let plain = spawn_empty(&mut h.game, "plain");
    assert!(!h.game.set_camera(plain));
    assert_eq!(h.game.camera(), None);
}

#[test]
fn test_held_key_moves_actor_through_iterate() {
    let mut h = harness();
    let mut overlay = DebugOverlay::default();
    let walker = h
        .game
        .spawn(|id, _| {
            Ok(ActorBuilder::new(id, "walker")
                .component(ComponentKind::Movement(MovementComponent::with_bindings(
                    MovementBindings::default(),
                )))
                .component(ComponentKind::Camera(CameraComponent::default()))
                .build())
        })
        .unwrap();
    h.game.set_camera(walker);

    h.game.event(&AppEvent::key_down(KeyCode::W), &mut overlay).unwrap();
    h.clock.advance(20);
    h.game.iterate(&mut overlay).unwrap();

    let z = h.game.actor(walker).unwrap().position().z;
    assert_relative_eq!(z, -0.06, epsilon = 1e-5);
    assert_eq!(overlay.stats.camera_position, Some(Vec3::new(0.0, 0.0, z)));
    assert_eq!(overlay.stats.frames, 1);
    assert_eq!(h.game.stats().frames, 1);
}

#[test]
fn test_pause_freezes_simulation_and_timer() {
    let mut h = harness();
    let mut overlay = DebugOverlay::default();
    let walker = h
        .game
        .spawn(|id, _| {
            let mut movement = MovementComponent::new();
            movement.set_forward_speed(1.0);
            Ok(ActorBuilder::new(id, "walker")
                .component(ComponentKind::Movement(movement))
                .build())
        })
        .unwrap();

    h.game.event(&AppEvent::key_down(KeyCode::F3), &mut overlay).unwrap();
    assert!(h.game.is_paused());

    h.clock.advance(1_000);
    h.game.iterate(&mut overlay).unwrap();
    assert_eq!(h.game.actor(walker).unwrap().position(), Vec3::zeros());
    assert!(!overlay.relative_mouse);
    assert_eq!(h.device.draw_calls(), 0);

    h.game.event(&AppEvent::key_down(KeyCode::F3), &mut overlay).unwrap();
    assert!(!h.game.is_paused());

    // Time spent paused is not handed to the next update
    h.clock.advance(10);
    h.game.iterate(&mut overlay).unwrap();
    assert_relative_eq!(h.game.last_delta(), 0.01, epsilon = 1e-6);
    assert_relative_eq!(h.game.actor(walker).unwrap().position().z, -0.01, epsilon = 1e-6);
}

#[test]
fn test_quit_events() {
    let mut h = harness();
    let mut overlay = DebugOverlay::default();

    assert_eq!(h.game.event(&AppEvent::Quit, &mut overlay).unwrap(), AppControl::Quit);
    assert_eq!(
        h.game.event(&AppEvent::WindowCloseRequested, &mut overlay).unwrap(),
        AppControl::Quit
    );
    assert_eq!(
        h.game.event(&AppEvent::key_down(KeyCode::Escape), &mut overlay).unwrap(),
        AppControl::Quit
    );
    assert_eq!(
        h.game.event(&AppEvent::key_up(KeyCode::Escape), &mut overlay).unwrap(),
        AppControl::Continue
    );
}

#[test]
fn test_f1_toggles_relative_mouse() {
    let mut h = harness();
    let mut overlay = DebugOverlay::default();
    let before = overlay.relative_mouse;

    h.game.event(&AppEvent::key_down(KeyCode::F1), &mut overlay).unwrap();
    assert_eq!(overlay.relative_mouse, !before);
    h.game.event(&AppEvent::key_up(KeyCode::F1), &mut overlay).unwrap();
    assert_eq!(overlay.relative_mouse, !before);
}

#[test]
fn test_resize_updates_viewport_and_aspect() {
    let mut h = harness();
    let mut overlay = DebugOverlay::default();
    h.device.clear_commands();

    h.game
        .event(
            &AppEvent::WindowResized {
                width: 1000,
                height: 500,
            },
            &mut overlay,
        )
        .unwrap();

    assert_eq!(
        h.device.commands(),
        vec![DrawCommand::SetViewport {
            width: 1000,
            height: 500
        }]
    );
    assert_relative_eq!(h.game.frame_info().aspect, 2.0);
}

#[test]
fn test_wireframe_toggle_reaches_device() {
    let mut h = harness();
    let mut overlay = DebugOverlay::default();
    overlay.wireframe = true;
    h.game.iterate(&mut overlay).unwrap();
    assert!(h
        .device
        .commands()
        .contains(&DrawCommand::SetPolygonMode(crate::render::PolygonMode::Line)));
}

#[test]
fn test_mouse_motion_only_counts_while_captured() {
    struct Recorder(Journal);
    impl crate::scene::ActorBehavior for Recorder {
        fn input(&mut self, _actor: &mut Actor, keys: &crate::input::KeyState, _game: &mut Game) {
            let d = keys.mouse_delta();
            self.0.borrow_mut().push(format!("{} {}", d.x, d.y));
        }
    }

    let mut h = harness();
    let log = journal();
    let recorder = Recorder(std::rc::Rc::clone(&log));
    h.game
        .spawn(move |id, _| Ok(ActorBuilder::new(id, "recorder").behavior(recorder).build()))
        .unwrap();
    let mut overlay = DebugOverlay::default();

    overlay.relative_mouse = false;
    h.game.event(&AppEvent::MouseMotion { dx: 3.0, dy: 4.0 }, &mut overlay).unwrap();
    h.game.input();

    overlay.relative_mouse = true;
    h.game.event(&AppEvent::MouseMotion { dx: 3.0, dy: 4.0 }, &mut overlay).unwrap();
    h.game.input();
    // The snapshot drained the motion
    h.game.input();

    assert_eq!(log.borrow().as_slice(), ["0 0", "3 4", "0 0"]);
}

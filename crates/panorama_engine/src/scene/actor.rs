//! Actors: game objects made of components
//!
//! An actor owns a transform and a priority-ordered list of components fixed
//! at build time. Per frame, input and update are forwarded to every
//! component in ascending priority and then to the actor's optional
//! [`ActorBehavior`]. Only [`ActorState::Active`] actors receive input or
//! update; [`ActorState::Dead`] is terminal and the game reaps such actors
//! after the update pass.

use std::fmt;

use slotmap::new_key_type;

use crate::foundation::math::{Mat4, Quat, Transform, Vec3};
use crate::input::KeyState;
use crate::render::GraphicsDevice;
use crate::scene::component::{Component, ComponentKind, FrameInfo};
use crate::scene::components::{CameraComponent, MeshComponent, MovementComponent};
use crate::scene::game::Game;

new_key_type! {
    /// Generation-checked actor handle
    pub struct ActorId;
}

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorState {
    /// Receives input and updates
    Active,
    /// Still drawn, but skipped by input and update
    Paused,
    /// Reaped after the current update pass; cannot be revived
    Dead,
}

/// Actor-specific per-frame logic
///
/// Hooks run after the actor's components and get the whole game, so they
/// can spawn or remove actors and reach the resource managers.
pub trait ActorBehavior {
    /// Called once per frame with the frame's input snapshot
    fn input(&mut self, _actor: &mut Actor, _keys: &KeyState, _game: &mut Game) {}

    /// Called once per frame with the clamped delta in seconds
    fn update(&mut self, _actor: &mut Actor, _delta: f32, _game: &mut Game) {}
}

/// A game object
pub struct Actor {
    id: ActorId,
    name: String,
    state: ActorState,
    transform: Transform,
    components: Vec<Component>,
    behavior: Option<Box<dyn ActorBehavior>>,
}

impl fmt::Debug for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state)
            .field("transform", &self.transform)
            .field("components", &self.components.len())
            .field("behavior", &self.behavior.is_some())
            .finish()
    }
}

impl Actor {
    /// Handle the actor is registered under
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Name used in logs
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lifecycle state
    pub fn state(&self) -> ActorState {
        self.state
    }

    /// Change lifecycle state; leaving `Dead` is refused
    pub fn set_state(&mut self, state: ActorState) {
        if self.state == ActorState::Dead && state != ActorState::Dead {
            log::warn!("Actor {} is dead and cannot become {:?}", self.name, state);
            return;
        }
        self.state = state;
    }

    /// Mark for removal at the end of the update pass
    pub fn kill(&mut self) {
        self.set_state(ActorState::Dead);
    }

    /// Position, rotation and scale
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Mutable transform
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    /// World position
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// Move to a world position
    pub fn set_position(&mut self, position: Vec3) {
        self.transform.position = position;
    }

    /// Orientation
    pub fn rotation(&self) -> Quat {
        self.transform.rotation
    }

    /// Set orientation
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.transform.rotation = rotation;
    }

    /// Scale factors
    pub fn scale(&self) -> Vec3 {
        self.transform.scale
    }

    /// Set scale factors
    pub fn set_scale(&mut self, scale: Vec3) {
        self.transform.scale = scale;
    }

    /// `T * S * R` model matrix
    pub fn model_matrix(&self) -> Mat4 {
        self.transform.model_matrix()
    }

    /// Components in dispatch order
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// First movement component
    pub fn movement(&self) -> Option<&MovementComponent> {
        self.components.iter().find_map(|c| match c.kind() {
            ComponentKind::Movement(movement) => Some(movement),
            _ => None,
        })
    }

    /// First movement component, mutably
    pub fn movement_mut(&mut self) -> Option<&mut MovementComponent> {
        self.components.iter_mut().find_map(|c| match c.kind_mut() {
            ComponentKind::Movement(movement) => Some(movement),
            _ => None,
        })
    }

    /// First camera component
    pub fn camera(&self) -> Option<&CameraComponent> {
        self.components.iter().find_map(|c| match c.kind() {
            ComponentKind::Camera(camera) => Some(camera),
            _ => None,
        })
    }

    /// First camera component, mutably
    pub fn camera_mut(&mut self) -> Option<&mut CameraComponent> {
        self.components.iter_mut().find_map(|c| match c.kind_mut() {
            ComponentKind::Camera(camera) => Some(camera),
            _ => None,
        })
    }

    /// Mesh components in dispatch order
    pub fn meshes(&self) -> impl Iterator<Item = &MeshComponent> {
        self.components.iter().filter_map(|c| match c.kind() {
            ComponentKind::Mesh(mesh) => Some(mesh),
            _ => None,
        })
    }

    /// Mesh components, mutably
    pub fn meshes_mut(&mut self) -> impl Iterator<Item = &mut MeshComponent> {
        self.components.iter_mut().filter_map(|c| match c.kind_mut() {
            ComponentKind::Mesh(mesh) => Some(mesh),
            _ => None,
        })
    }

    /// Forward input to components, then to the behaviour
    pub fn input(&mut self, keys: &KeyState, game: &mut Game) {
        if self.state != ActorState::Active {
            return;
        }

        for component in &mut self.components {
            component.input(keys);
        }

        if let Some(mut behavior) = self.behavior.take() {
            behavior.input(self, keys, game);
            self.behavior = Some(behavior);
        }
    }

    /// Forward a clamped delta to components, then to the behaviour
    pub fn update(&mut self, delta: f32, game: &mut Game) {
        if self.state != ActorState::Active {
            return;
        }
        debug_assert!(delta >= 0.0, "negative frame delta {delta}");

        self.update_components(delta, &game.frame_info());

        if let Some(mut behavior) = self.behavior.take() {
            behavior.update(self, delta, game);
            self.behavior = Some(behavior);
        }
    }

    /// Refresh components without a game, for headless tools and tests
    pub fn update_components(&mut self, delta: f32, frame: &FrameInfo) {
        if self.state != ActorState::Active {
            return;
        }
        for component in &mut self.components {
            component.update(&mut self.transform, delta, frame);
        }
    }

    /// Free device objects held by components
    pub fn release_resources(&self, device: &mut dyn GraphicsDevice) {
        for component in &self.components {
            component.release(device);
        }
    }

    pub(crate) fn rebind(&mut self, id: ActorId) {
        self.id = id;
        for component in &mut self.components {
            component.set_owner(id);
        }
    }
}

/// Builds an [`Actor`]; the only way to attach components
#[must_use]
pub struct ActorBuilder {
    id: ActorId,
    name: String,
    transform: Transform,
    components: Vec<(i32, ComponentKind)>,
    behavior: Option<Box<dyn ActorBehavior>>,
}

impl ActorBuilder {
    /// Start an actor for a reserved id
    pub fn new(id: ActorId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            transform: Transform::identity(),
            components: Vec::new(),
            behavior: None,
        }
    }

    /// Initial position
    pub fn position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    /// Initial rotation
    pub fn rotation(mut self, rotation: Quat) -> Self {
        self.transform.rotation = rotation;
        self
    }

    /// Initial scale
    pub fn scale(mut self, scale: Vec3) -> Self {
        self.transform.scale = scale;
        self
    }

    /// Attach a component at its default priority
    pub fn component(self, kind: ComponentKind) -> Self {
        let priority = kind.default_priority();
        self.component_with_priority(kind, priority)
    }

    /// Attach a component at an explicit priority
    pub fn component_with_priority(mut self, kind: ComponentKind, priority: i32) -> Self {
        self.components.push((priority, kind));
        self
    }

    /// Attach actor-specific logic
    pub fn behavior(mut self, behavior: impl ActorBehavior + 'static) -> Self {
        self.behavior = Some(Box::new(behavior));
        self
    }

    /// Finish; components are ordered by priority, ties keep insertion order
    pub fn build(mut self) -> Actor {
        self.components.sort_by_key(|(priority, _)| *priority);
        let id = self.id;
        Actor {
            id,
            name: self.name,
            state: ActorState::Active,
            transform: self.transform,
            components: self
                .components
                .into_iter()
                .map(|(priority, kind)| Component::new(id, priority, kind))
                .collect(),
            behavior: self.behavior,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn id() -> ActorId {
        ActorId::from(KeyData::from_ffi(7))
    }

    #[test]
    fn test_builder_defaults() {
        let actor = ActorBuilder::new(id(), "empty").build();
        assert_eq!(actor.state(), ActorState::Active);
        assert_eq!(actor.transform(), &Transform::identity());
        assert!(actor.components().is_empty());
    }

    #[test]
    fn test_components_sorted_stably_by_priority() {
        let mut fast = MovementComponent::new();
        fast.set_forward_speed(2.0);
        let actor = ActorBuilder::new(id(), "sorted")
            .component(ComponentKind::Camera(CameraComponent::default()))
            .component_with_priority(ComponentKind::Movement(MovementComponent::new()), 100)
            .component_with_priority(ComponentKind::Movement(fast), 100)
            .component_with_priority(ComponentKind::Movement(MovementComponent::new()), 5)
            .build();

        let priorities: Vec<i32> = actor.components().iter().map(Component::priority).collect();
        assert_eq!(priorities, vec![5, 100, 100, 200]);
        assert!(matches!(
            actor.components()[2].kind(),
            ComponentKind::Movement(m) if m.forward_speed == 2.0
        ));
        assert!(actor.components().iter().all(|c| c.owner() == id()));
    }

    #[test]
    fn test_dead_is_terminal() {
        let mut actor = ActorBuilder::new(id(), "mortal").build();
        actor.kill();
        actor.set_state(ActorState::Active);
        assert_eq!(actor.state(), ActorState::Dead);
    }

    #[test]
    fn test_movement_runs_before_camera() {
        let mut movement = MovementComponent::new();
        movement.set_forward_speed(1.0);
        let mut actor = ActorBuilder::new(id(), "walker")
            .component(ComponentKind::Camera(CameraComponent::default()))
            .component(ComponentKind::Movement(movement))
            .build();

        actor.update_components(0.5, &FrameInfo::default());
        assert_eq!(actor.position(), Vec3::new(0.0, 0.0, -0.5));
        // The camera saw the moved position in the same update
        let view = actor.camera().map(CameraComponent::view_matrix).unwrap();
        assert!((view[(2, 3)] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_paused_actor_skips_update() {
        let mut movement = MovementComponent::new();
        movement.set_forward_speed(1.0);
        let mut actor = ActorBuilder::new(id(), "sleeper")
            .component(ComponentKind::Movement(movement))
            .build();
        actor.set_state(ActorState::Paused);
        actor.update_components(0.5, &FrameInfo::default());
        assert_eq!(actor.position(), Vec3::zeros());
    }

    #[test]
    fn test_model_matrix_matches_transform() {
        let actor = ActorBuilder::new(id(), "placed")
            .position(Vec3::new(1.0, 2.0, 3.0))
            .scale(Vec3::new(2.0, 2.0, 2.0))
            .build();
        assert_eq!(actor.model_matrix(), actor.transform().model_matrix());
    }
}

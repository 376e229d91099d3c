//! Actors, components and the frame scheduler
//!
//! ```text
//! Game (owns actors, resources, device)
//!   └── Actor (transform + behaviour)
//!         └── Component (movement, camera, mesh; ordered by priority)
//! ```
//!
//! Actors are registered with [`Game::spawn`] and addressed by [`ActorId`].
//! Components are attached only through [`ActorBuilder`], so an actor's
//! component set never changes while the game is iterating it.

pub mod actor;
pub mod component;
pub mod components;
pub mod game;

#[cfg(test)]
mod tests;

pub use actor::{Actor, ActorBehavior, ActorBuilder, ActorId, ActorState};
pub use component::{Component, ComponentKind, FrameInfo, CAMERA_PRIORITY, DEFAULT_PRIORITY};
pub use components::{turn, CameraComponent, MeshComponent, MovementBindings, MovementComponent};
pub use game::{Game, GameStats};

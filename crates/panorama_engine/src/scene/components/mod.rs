//! Concrete component kinds

pub mod camera;
pub mod mesh;
pub mod movement;

pub use camera::CameraComponent;
pub use mesh::MeshComponent;
pub use movement::{turn, MovementBindings, MovementComponent};

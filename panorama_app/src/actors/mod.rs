//! Actors the viewer spawns

pub mod player;
pub mod world;

pub use player::{spawn_player, Player};
pub use world::{spawn_world, World};

//! ECS Systems module

pub mod lifetime;
pub mod movement;

pub use lifetime::LifetimeSystem;
pub use movement::MovementSystem;

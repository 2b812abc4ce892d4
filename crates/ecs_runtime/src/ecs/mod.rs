//! Entity-Component-System implementation
//!
//! The [`World`] owns entities, components and systems. Entities are built
//! from [`Prefab`]s and owned either by the caller (saved) or by the system
//! that created them (temporary). Systems run once per tick in registration
//! order; removals are deferred to the end of the tick.

pub mod component;
pub mod components;
pub mod entity;
pub mod error;
pub mod events;
pub mod ownership;
mod scheduler;
pub mod system;
pub mod systems;
pub mod world;

#[cfg(test)]
mod tests;

pub use component::{Component, ComponentKind};
pub use entity::{Blank, Entity, EntityBuilder, EntityId, EntityKind, Prefab};
pub use error::EcsError;
pub use ownership::Tenure;
pub use system::{LoadStatus, System};
pub use world::{EntityMut, World};

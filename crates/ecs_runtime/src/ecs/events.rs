//! Events emitted by the world
//!
//! Payloads that concern an entity variant or a component type are generic
//! over it, and the bound is part of the type: `ComponentAttached<T>` does not
//! exist for a `T` that is not a [`Component`].

use super::component::Component;
use super::entity::{EntityId, EntityKind, Prefab};
use crate::events::Event;
use std::marker::PhantomData;

/// An entity built from prefab `P` went live
#[derive(Debug)]
pub struct EntityCreated<P: Prefab> {
    /// New entity
    pub entity: EntityId,
    _prefab: PhantomData<fn() -> P>,
}

impl<P: Prefab> EntityCreated<P> {
    pub(crate) fn new(entity: EntityId) -> Self {
        Self {
            entity,
            _prefab: PhantomData,
        }
    }

    /// Variant tag of the new entity
    pub fn kind(&self) -> EntityKind {
        P::KIND
    }
}

impl<P: Prefab> Event for EntityCreated<P> {}

/// An entity was destroyed; its components were announced as detached first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDestroyed {
    /// Destroyed entity
    pub entity: EntityId,
    /// Its variant tag
    pub kind: EntityKind,
}

impl Event for EntityDestroyed {}

/// A component became visible to global queries
#[derive(Debug, Clone)]
pub struct ComponentAttached<C: Component> {
    /// Owning entity
    pub entity: EntityId,
    /// Snapshot of the component as attached
    pub component: C,
}

impl<C: Component> ComponentAttached<C> {
    pub(crate) fn new(entity: EntityId, component: C) -> Self {
        Self { entity, component }
    }
}

impl<C: Component> Event for ComponentAttached<C> {}

/// A component is about to be removed
#[derive(Debug, Clone)]
pub struct ComponentDetached<C: Component> {
    /// Owning entity
    pub entity: EntityId,
    /// Snapshot of the component taken before removal
    pub component: C,
}

impl<C: Component> ComponentDetached<C> {
    pub(crate) fn new(entity: EntityId, component: C) -> Self {
        Self { entity, component }
    }
}

impl<C: Component> Event for ComponentDetached<C> {}

/// A system finished setup and joined the run order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemLoaded {
    /// Registration name
    pub name: String,
    /// Position in the run order
    pub ordinal: u64,
}

impl Event for SystemLoaded {}

/// A system was torn down
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemDestroyed {
    /// Registration name
    pub name: String,
}

impl Event for SystemDestroyed {}

/// Free-text notice meant for humans, not for program logic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Message text
    pub message: String,
}

impl Event for Notice {}

/// Broadcast once before the engine tears every system down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Shutdown;

impl Event for Shutdown {}

//! Component trait and the closed set of component kinds
//!
//! Components are keyed by an explicit [`ComponentKind`] rather than by
//! runtime type identity. Each stored component is kept behind a small
//! object-safe table ([`ComponentBox`]) that knows how to downcast it and how
//! to announce it on the event mediator with its concrete type.

use super::entity::EntityId;
use super::error::EcsError;
use super::events::{ComponentAttached, ComponentDetached};
use crate::events::Mediator;
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;

/// Key under which a component is stored and indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentKind {
    /// Spatial transform
    Transform,
    /// Linear and angular velocity
    Velocity,
    /// Remaining time before despawn
    Lifetime,
    /// Human-readable name
    Label,
    /// Component declared outside the runtime, usually by a loaded module
    ///
    /// The name lives in the declaring module's memory. Entities holding such
    /// a component must be destroyed before that module is released; see
    /// [`World::create`](crate::ecs::World::create).
    Custom(&'static str),
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transform => f.write_str("Transform"),
            Self::Velocity => f.write_str("Velocity"),
            Self::Lifetime => f.write_str("Lifetime"),
            Self::Label => f.write_str("Label"),
            Self::Custom(name) => f.write_str(name),
        }
    }
}

/// Typed data attached to exactly one entity
///
/// Events about a component carry a snapshot of it, hence the `Clone` bound.
pub trait Component: Clone + 'static {
    /// Kind this type is stored under; at most one per entity
    const KIND: ComponentKind;
}

/// Object-safe view of a stored component
pub(crate) trait ComponentBox {
    fn kind(&self) -> ComponentKind;
    fn type_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn announce_attached(&self, entity: EntityId, events: &mut Mediator);
    fn announce_detached(&self, entity: EntityId, events: &mut Mediator);
}

impl<C: Component> ComponentBox for C {
    fn kind(&self) -> ComponentKind {
        C::KIND
    }

    fn type_name(&self) -> &'static str {
        type_name::<C>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn announce_attached(&self, entity: EntityId, events: &mut Mediator) {
        events.send_with(|| ComponentAttached::new(entity, self.clone()));
    }

    fn announce_detached(&self, entity: EntityId, events: &mut Mediator) {
        events.send_with(|| ComponentDetached::new(entity, self.clone()));
    }
}

/// Components owned by one entity, in attach order
#[derive(Default)]
pub(crate) struct ComponentSet {
    slots: HashMap<ComponentKind, Box<dyn ComponentBox>>,
    order: Vec<ComponentKind>,
}

impl ComponentSet {
    pub(crate) fn insert<C: Component>(&mut self, owner: EntityId, component: C) -> Result<&mut C, EcsError> {
        if self.slots.contains_key(&C::KIND) {
            return Err(EcsError::DuplicateComponent { entity: owner, kind: C::KIND });
        }
        self.order.push(C::KIND);
        let slot = self.slots.entry(C::KIND).or_insert_with(|| Box::new(component));
        downcast_mut(&mut **slot, C::KIND)
    }

    pub(crate) fn contains(&self, kind: ComponentKind) -> bool {
        self.slots.contains_key(&kind)
    }

    /// `Ok(None)` when the kind is absent, an error when it holds another type
    pub(crate) fn find<C: Component>(&self) -> Result<Option<&C>, EcsError> {
        match self.slots.get(&C::KIND) {
            None => Ok(None),
            Some(slot) => slot
                .as_any()
                .downcast_ref::<C>()
                .map(Some)
                .ok_or_else(|| type_mismatch::<C>(&**slot)),
        }
    }

    pub(crate) fn get<C: Component>(&self, owner: EntityId) -> Result<&C, EcsError> {
        self.find::<C>()?
            .ok_or(EcsError::ComponentNotFound { entity: owner, kind: C::KIND })
    }

    pub(crate) fn get_mut<C: Component>(&mut self, owner: EntityId) -> Result<&mut C, EcsError> {
        let slot = self
            .slots
            .get_mut(&C::KIND)
            .ok_or(EcsError::ComponentNotFound { entity: owner, kind: C::KIND })?;
        downcast_mut(&mut **slot, C::KIND)
    }

    pub(crate) fn slot(&self, kind: ComponentKind) -> Option<&dyn ComponentBox> {
        self.slots.get(&kind).map(|slot| &**slot)
    }

    pub(crate) fn remove(&mut self, kind: ComponentKind) -> Option<Box<dyn ComponentBox>> {
        let slot = self.slots.remove(&kind)?;
        self.order.retain(|k| *k != kind);
        Some(slot)
    }

    /// Remove everything, most recently attached first
    pub(crate) fn drain(&mut self) -> Vec<Box<dyn ComponentBox>> {
        let order = std::mem::take(&mut self.order);
        order
            .into_iter()
            .rev()
            .filter_map(|kind| self.slots.remove(&kind))
            .collect()
    }

    pub(crate) fn kinds(&self) -> &[ComponentKind] {
        &self.order
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }
}

fn downcast_mut<C: Component>(slot: &mut dyn ComponentBox, kind: ComponentKind) -> Result<&mut C, EcsError> {
    let found = slot.type_name();
    slot.as_any_mut()
        .downcast_mut::<C>()
        .ok_or(EcsError::InvalidTypeUsage { kind, expected: type_name::<C>(), found })
}

fn type_mismatch<C: Component>(slot: &dyn ComponentBox) -> EcsError {
    EcsError::InvalidTypeUsage {
        kind: C::KIND,
        expected: type_name::<C>(),
        found: slot.type_name(),
    }
}

//! Entity implementation
//!
//! Entities are only ever constructed by the [`World`](super::World). A
//! [`Prefab`] describes an entity variant: its [`EntityKind`] tag, the
//! components attached while it is being built, and a hook that runs once the
//! entity is live.

use super::component::{Component, ComponentKind, ComponentSet};
use super::error::EcsError;
use super::world::EntityMut;
use std::fmt;

/// Entity identifier, unique for the lifetime of a world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    pub(crate) fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw id
    pub fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Concrete variant tag of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityKind(&'static str);

impl EntityKind {
    /// Declare a kind
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Name of the kind
    pub fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Blueprint for one entity variant
pub trait Prefab: 'static {
    /// Variant tag stamped on every entity built from this prefab
    const KIND: EntityKind;

    /// Attach the initial components
    ///
    /// Runs before the entity is announced; the components are indexed and
    /// announced right after the creation event.
    fn build(&mut self, _entity: &mut EntityBuilder) -> Result<(), EcsError> {
        Ok(())
    }

    /// Runs once the entity is live and its initial components are announced
    fn after_build(&mut self, _entity: &mut EntityMut<'_>) -> Result<(), EcsError> {
        Ok(())
    }
}

/// Prefab for an entity with no initial components
#[derive(Debug, Clone, Copy, Default)]
pub struct Blank;

impl Prefab for Blank {
    const KIND: EntityKind = EntityKind::new("Entity");
}

/// Entity under construction, not yet visible to the world
pub struct EntityBuilder {
    id: EntityId,
    kind: EntityKind,
    components: ComponentSet,
}

impl EntityBuilder {
    pub(crate) fn new(id: EntityId, kind: EntityKind) -> Self {
        Self {
            id,
            kind,
            components: ComponentSet::default(),
        }
    }

    /// Id the entity will have
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Variant being built
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Attach a component; it is announced once the entity goes live
    pub fn attach<C: Component>(&mut self, component: C) -> Result<&mut C, EcsError> {
        self.components.insert(self.id, component)
    }

    /// Check whether a component kind was attached
    pub fn has<C: Component>(&self) -> bool {
        self.components.contains(C::KIND)
    }

    /// Read an attached component
    pub fn get<C: Component>(&self) -> Result<&C, EcsError> {
        self.components.get(self.id)
    }

    /// Mutate an attached component
    pub fn get_mut<C: Component>(&mut self) -> Result<&mut C, EcsError> {
        self.components.get_mut(self.id)
    }

    pub(crate) fn finish(self) -> Entity {
        Entity {
            id: self.id,
            kind: self.kind,
            components: self.components,
        }
    }
}

/// A live entity: identity, variant tag and its components
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    pub(crate) components: ComponentSet,
}

impl Entity {
    /// Get the entity ID
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Get the concrete variant tag
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Check whether a component of type `C` is attached
    pub fn has<C: Component>(&self) -> bool {
        matches!(self.components.find::<C>(), Ok(Some(_)))
    }

    /// Read a component
    pub fn get<C: Component>(&self) -> Result<&C, EcsError> {
        self.components.get(self.id)
    }

    /// Kinds of the attached components, in attach order
    pub fn component_kinds(&self) -> &[ComponentKind] {
        self.components.kinds()
    }

    /// Number of attached components
    pub fn component_count(&self) -> usize {
        self.components.len()
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("components", &self.components.kinds())
            .finish()
    }
}

//! ECS World implementation
//!
//! The world is the registry: it owns every entity, the per-kind component
//! index, the ownership records, the live systems and the event mediator.
//!
//! A tick advances the clock, runs every system that was live when the tick
//! started in ascending ordinal order, then drains the deferred-removal queue.
//! While a system runs (or sets up) it is the *current system*: entities it
//! creates and events it subscribes to are attributed to it.

use super::component::{Component, ComponentKind};
use super::entity::{Entity, EntityBuilder, EntityId, EntityKind, Prefab};
use super::error::EcsError;
use super::events::{EntityCreated, EntityDestroyed, Notice, SystemDestroyed, SystemLoaded};
use super::ownership::{Ownership, Tenure};
use super::scheduler::{ActiveSystem, Effect, PendingEffects, SystemEntry, SystemTable};
use super::system::{LoadStatus, System};
use crate::events::{Event, Mediator, SubscriberId};
use crate::foundation::time::Timer;
use crate::plugin::{DylibLoader, LoadedModule, ModuleArgs, ModuleHandle, ModuleLoader};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// ECS World containing all entities, components and systems
pub struct World {
    next_entity_id: u32,
    entities: HashMap<EntityId, Entity>,
    component_index: HashMap<ComponentKind, BTreeSet<EntityId>>,
    ownership: Ownership,
    systems: SystemTable,
    pending: PendingEffects,
    current: Option<ActiveSystem>,
    events: Mediator,
    timer: Timer,
    loader: Box<dyn ModuleLoader>,
    loaded_paths: HashMap<PathBuf, String>,
    // Declared last: module code must outlive every value it may have produced.
    modules: HashMap<String, ModuleHandle>,
    // Modules whose systems left saved entities behind; released with the world.
    retired_modules: Vec<ModuleHandle>,
}

impl World {
    /// Create a new world that loads modules as shared libraries
    pub fn new() -> Self {
        Self::with_loader(Box::new(DylibLoader::new()))
    }

    /// Create a new world with a custom module loader
    pub fn with_loader(loader: Box<dyn ModuleLoader>) -> Self {
        Self {
            next_entity_id: 0,
            entities: HashMap::new(),
            component_index: HashMap::new(),
            ownership: Ownership::default(),
            systems: SystemTable::default(),
            pending: PendingEffects::default(),
            current: None,
            events: Mediator::new(),
            timer: Timer::new(),
            loader,
            loaded_paths: HashMap::new(),
            modules: HashMap::new(),
            retired_modules: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------

    /// Create a saved entity from `prefab`
    ///
    /// The entity lives until [`World::destroy`] is called for it; the current
    /// system is recorded as its creator.
    ///
    /// Components boxed by module code point into that module. When a loaded
    /// system is torn down while saved entities it created are still live,
    /// its module stays mapped until the world is dropped instead of being
    /// released with the system.
    pub fn create<P: Prefab>(&mut self, prefab: P) -> Result<EntityId, EcsError> {
        let creator = self.require_current("create")?.name.clone();
        self.spawn(prefab, Tenure::Saved { creator: Some(creator) })
    }

    /// Create a temporary entity leased to the current system
    ///
    /// The entity is destroyed when the system is torn down, unless it was
    /// destroyed earlier.
    pub fn create_scoped<P: Prefab>(&mut self, prefab: P) -> Result<EntityId, EcsError> {
        let owner = self.require_current("create_scoped")?.name.clone();
        self.spawn(prefab, Tenure::Temporary { owner })
    }

    fn spawn<P: Prefab>(&mut self, mut prefab: P, tenure: Tenure) -> Result<EntityId, EcsError> {
        let id = EntityId::new(self.next_entity_id);
        self.next_entity_id += 1;

        let mut builder = EntityBuilder::new(id, P::KIND);
        prefab.build(&mut builder)?;
        let entity = builder.finish();
        let queued = entity.component_kinds().to_vec();
        self.entities.insert(id, entity);
        self.ownership.record(id, tenure);

        self.events.send_with(|| EntityCreated::<P>::new(id));
        for kind in queued {
            self.index_and_announce(id, kind);
        }

        let mut handle = EntityMut::new(self, id, P::KIND);
        if let Err(err) = prefab.after_build(&mut handle) {
            self.destroy(id);
            return Err(err);
        }
        Ok(id)
    }

    /// Destroy an entity, announcing each of its components as detached first
    ///
    /// Returns `false` when the entity is not tracked (for example when it
    /// was already destroyed).
    pub fn destroy(&mut self, id: EntityId) -> bool {
        let Some(tenure) = self.ownership.release(id) else {
            log::debug!("Destroy of untracked entity {}", id);
            return false;
        };
        match &tenure {
            Tenure::Saved { creator } => log::debug!(
                "Destroying saved entity {} created by {}",
                id,
                creator.as_deref().unwrap_or("<none>")
            ),
            Tenure::Temporary { owner } => log::debug!("Destroying temporary entity {} leased to {}", id, owner),
        }
        self.dispose(id);
        true
    }

    fn dispose(&mut self, id: EntityId) {
        let Some(mut entity) = self.entities.remove(&id) else {
            return;
        };
        for slot in entity.components.drain() {
            slot.announce_detached(id, &mut self.events);
            self.unindex(id, slot.kind());
        }
        self.events.send(EntityDestroyed { entity: id, kind: entity.kind() });
    }

    /// Read-only view of an entity
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Mutable handle on an entity
    pub fn entity_mut(&mut self, id: EntityId) -> Option<EntityMut<'_>> {
        let kind = self.entities.get(&id)?.kind();
        Some(EntityMut::new(self, id, kind))
    }

    /// Check whether an entity is live
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of live saved entities
    pub fn saved_count(&self) -> usize {
        self.ownership.saved_count()
    }

    /// Number of live temporary entities
    pub fn temporary_count(&self) -> usize {
        self.ownership.temporary_count()
    }

    /// Ownership regime of an entity
    pub fn tenure(&self, id: EntityId) -> Option<Tenure> {
        self.ownership.tenure(id)
    }

    /// System holding the lease on a temporary entity
    pub fn owner_of(&self, id: EntityId) -> Option<String> {
        match self.ownership.tenure(id)? {
            Tenure::Temporary { owner } => Some(owner),
            Tenure::Saved { .. } => None,
        }
    }

    /// System that created a saved entity
    pub fn creator_of(&self, id: EntityId) -> Option<String> {
        match self.ownership.tenure(id)? {
            Tenure::Saved { creator } => creator,
            Tenure::Temporary { .. } => None,
        }
    }

    /// Temporary entities leased to `system`, in creation order
    pub fn leased_by(&self, system: &str) -> &[EntityId] {
        self.ownership.leased_by(system)
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    /// Attach a component to a live entity
    ///
    /// Fails with [`EcsError::DuplicateComponent`] and leaves the existing
    /// component untouched when the entity already has one of this kind.
    pub fn attach<C: Component>(&mut self, id: EntityId, component: C) -> Result<&mut C, EcsError> {
        let entity = self.entities.get_mut(&id).ok_or(EcsError::EntityNotFound(id))?;
        entity.components.insert(id, component)?;
        self.index_and_announce(id, C::KIND);
        self.get_mut::<C>(id)
    }

    /// Detach a component, returning `false` when the entity has none of this kind
    ///
    /// The detach event is sent while the component is still attached.
    pub fn detach<C: Component>(&mut self, id: EntityId) -> Result<bool, EcsError> {
        let entity = self.entities.get(&id).ok_or(EcsError::EntityNotFound(id))?;
        if entity.components.find::<C>()?.is_none() {
            return Ok(false);
        }
        if let Some(slot) = entity.components.slot(C::KIND) {
            slot.announce_detached(id, &mut self.events);
        }
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.components.remove(C::KIND);
        }
        self.unindex(id, C::KIND);
        Ok(true)
    }

    /// Read a component
    pub fn get<C: Component>(&self, id: EntityId) -> Result<&C, EcsError> {
        self.entities
            .get(&id)
            .ok_or(EcsError::EntityNotFound(id))?
            .components
            .get(id)
    }

    /// Mutate a component
    pub fn get_mut<C: Component>(&mut self, id: EntityId) -> Result<&mut C, EcsError> {
        self.entities
            .get_mut(&id)
            .ok_or(EcsError::EntityNotFound(id))?
            .components
            .get_mut(id)
    }

    /// Check whether a live entity has a component of type `C`
    pub fn has<C: Component>(&self, id: EntityId) -> bool {
        self.entities.get(&id).is_some_and(Entity::has::<C>)
    }

    /// Every component of type `C`, in ascending entity id order
    pub fn query<C: Component>(&self) -> Vec<(EntityId, &C)> {
        let Some(ids) = self.component_index.get(&C::KIND) else {
            return Vec::new();
        };
        ids.iter()
            .filter_map(|id| {
                let component = self.entities.get(id)?.components.find::<C>().ok()??;
                Some((*id, component))
            })
            .collect()
    }

    /// Ids of every entity holding a component of type `C`, ascending
    pub fn query_entities<C: Component>(&self) -> Vec<EntityId> {
        self.query::<C>().into_iter().map(|(id, _)| id).collect()
    }

    fn index_and_announce(&mut self, id: EntityId, kind: ComponentKind) {
        let Some(slot) = self.entities.get(&id).and_then(|entity| entity.components.slot(kind)) else {
            return;
        };
        self.component_index.entry(kind).or_default().insert(id);
        slot.announce_attached(id, &mut self.events);
    }

    fn unindex(&mut self, id: EntityId, kind: ComponentKind) {
        if let Some(ids) = self.component_index.get_mut(&kind) {
            ids.remove(&id);
            if ids.is_empty() {
                self.component_index.remove(&kind);
            }
        }
    }

    // ------------------------------------------------------------------
    // Systems
    // ------------------------------------------------------------------

    /// Register a system
    ///
    /// A name collision is not an error: the new system is dropped, a notice
    /// is emitted and the returned status reports `loaded: false`.
    pub fn add_system<S: System + 'static>(&mut self, system: S) -> Result<LoadStatus, EcsError> {
        self.install(Box::new(system), None)
    }

    /// Register a boxed system
    pub fn add_boxed_system(&mut self, system: Box<dyn System>) -> Result<LoadStatus, EcsError> {
        self.install(system, None)
    }

    /// Build a system from the module at `path` and register it
    ///
    /// Loading a path that is already loaded is rejected with a diagnostic.
    /// A loader failure leaves the world untouched.
    pub fn load_system(&mut self, path: impl AsRef<Path>, args: &ModuleArgs) -> Result<LoadStatus, EcsError> {
        let path = path.as_ref();
        let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if let Some(name) = self.loaded_paths.get(&key) {
            log::warn!("Module {} is already loaded as [{}]", path.display(), name);
            return Ok(LoadStatus::rejected(name.clone()));
        }

        let LoadedModule { system, handle } = self.loader.load(path, args)?;
        match self.install(system, Some(key.clone())) {
            Ok(status) if status.loaded => {
                log::debug!("Module {} provides [{}]", handle.path().display(), status.name);
                self.loaded_paths.insert(key, status.name.clone());
                self.modules.insert(status.name.clone(), handle);
                Ok(status)
            }
            other => {
                drop(handle);
                other
            }
        }
    }

    fn install(&mut self, mut system: Box<dyn System>, origin: Option<PathBuf>) -> Result<LoadStatus, EcsError> {
        let name = system.name().to_string();
        if self.systems.contains(&name) {
            self.notice(format!("[{name}] already loaded."));
            return Ok(LoadStatus::rejected(name));
        }

        let subscriber = self.events.register_subscriber();
        let previous = self.current.replace(ActiveSystem { name: name.clone(), subscriber });
        let outcome = system.setup(self);
        self.current = previous;

        if let Err(err) = outcome {
            log::error!("[{}] setup failed: {}", name, err);
            self.events.erase(subscriber);
            for id in self.ownership.revoke_leases(&name) {
                self.dispose(id);
            }
            return Err(err);
        }

        // Setup may have registered another system under the same name.
        if self.systems.contains(&name) {
            self.events.erase(subscriber);
            self.notice(format!("[{name}] already loaded."));
            return Ok(LoadStatus::rejected(name));
        }

        let ordinal = self.systems.allocate_ordinal();
        self.systems.insert(SystemEntry {
            name: name.clone(),
            ordinal,
            subscriber,
            system: Some(system),
            origin,
        });
        self.notice(format!("[{name}] loaded."));
        self.events.send(SystemLoaded { name: name.clone(), ordinal });
        Ok(LoadStatus::loaded(name))
    }

    /// Request removal of a system at the end of the current tick
    ///
    /// Returns `false` if the removal was already queued.
    pub fn remove_system(&mut self, name: &str) -> bool {
        self.pending.push_removal(name)
    }

    /// Request removal of every live system
    pub fn remove_all_systems(&mut self) {
        let names: Vec<String> = self.systems.names().map(str::to_string).collect();
        for name in names {
            self.pending.push_removal(&name);
        }
    }

    /// Tear every system down now
    ///
    /// Has no effect on the queue while a system is running.
    pub fn shutdown(&mut self) {
        self.remove_all_systems();
        self.flush_removals();
    }

    /// Run one tick, returning the number of systems that ran
    pub fn tick(&mut self) -> usize {
        if let Some(active) = &self.current {
            log::warn!("[{}] cannot tick the world from inside a system", active.name);
            return 0;
        }

        let elapsed = self.timer.update();
        let mut ran = 0;
        for ordinal in self.systems.ordinals() {
            let Some((mut system, active)) = self.systems.take(ordinal) else {
                continue;
            };
            let name = active.name.clone();
            self.current = Some(active);
            let outcome = system.run(self, elapsed);
            self.current = None;
            self.systems.restore(ordinal, system);
            ran += 1;

            if let Err(err) = outcome {
                log::error!("[{}] run failed: {}", name, err);
            }
        }

        self.flush_removals();
        ran
    }

    /// Apply every queued removal
    pub fn flush_removals(&mut self) {
        if self.current.is_some() {
            return;
        }
        while let Some(effect) = self.pending.pop() {
            match effect {
                Effect::RemoveSystem(name) => {
                    if let Err(err) = self.teardown_system(&name) {
                        log::warn!("Failed to erase {}: {}", name, err);
                    }
                }
            }
        }
    }

    fn teardown_system(&mut self, name: &str) -> Result<(), EcsError> {
        let entry = self
            .systems
            .remove(name)
            .ok_or_else(|| EcsError::MissingRemovalTarget(name.to_string()))?;

        self.events.erase(entry.subscriber);
        let leased = self.ownership.revoke_leases(name);
        let killed = leased.len();
        for id in leased {
            self.dispose(id);
        }

        self.events.send(SystemDestroyed { name: name.to_string() });
        self.notice(format!("[{name}] shutdown. Killed {killed} entities."));

        if let Some(mut system) = entry.system {
            system.teardown(self);
            drop(system);
        }
        if let Some(origin) = entry.origin {
            self.loaded_paths.remove(&origin);
        }
        if let Some(handle) = self.modules.remove(name) {
            let survivors = self.ownership.saved_by(name);
            if survivors > 0 {
                log::warn!(
                    "[{}] left {} saved entities; keeping {} mapped until the world is dropped",
                    name,
                    survivors,
                    handle.path().display()
                );
                self.retired_modules.push(handle);
            } else {
                log::debug!("Releasing module {}", handle.path().display());
                drop(handle);
            }
        }
        Ok(())
    }

    /// Number of live systems
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Check whether a system is registered under `name`
    pub fn has_system(&self, name: &str) -> bool {
        self.systems.contains(name)
    }

    /// Names of the live systems in run order
    pub fn system_names(&self) -> Vec<String> {
        self.systems.names().map(str::to_string).collect()
    }

    /// Check whether a removal is queued for `name`
    pub fn is_pending_removal(&self, name: &str) -> bool {
        self.pending.contains_removal(name)
    }

    /// Name of the system currently running or setting up
    pub fn current_system(&self) -> Option<&str> {
        self.current.as_ref().map(|active| active.name.as_str())
    }

    /// Number of ticks run so far
    pub fn tick_count(&self) -> u64 {
        self.timer.tick_count()
    }

    fn require_current(&self, operation: &'static str) -> Result<&ActiveSystem, EcsError> {
        self.current.as_ref().ok_or(EcsError::NoActiveSystem { operation })
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Log a human-facing message and broadcast it as a [`Notice`]
    pub fn notice(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::info!("{}", message);
        self.events.send(Notice { message });
    }

    /// Broadcast an event
    pub fn send<E: Event>(&mut self, event: E) -> usize {
        self.events.send(event)
    }

    /// Subscribe the current system to events of type `E`
    ///
    /// The handler is revoked when the system is torn down.
    pub fn subscribe<E, F>(&mut self, handler: F) -> Result<SubscriberId, EcsError>
    where
        E: Event,
        F: FnMut(&E) + 'static,
    {
        let subscriber = self.require_current("subscribe")?.subscriber;
        self.events.require(subscriber, handler);
        Ok(subscriber)
    }

    /// The event mediator
    pub fn events(&self) -> &Mediator {
        &self.events
    }

    /// The event mediator, for subscribers that are not systems
    pub fn events_mut(&mut self) -> &mut Mediator {
        &mut self.events
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for World {
    fn drop(&mut self) {
        let saved = self.ownership.saved_count();
        let temporary = self.ownership.temporary_count();
        if saved + temporary > 0 {
            log::warn!(
                "Leaking {} entities ({} saved, {} temporary).",
                saved + temporary,
                saved,
                temporary
            );
        } else {
            log::info!("Clean exit.");
        }
    }
}

/// Mutable handle on one live entity
pub struct EntityMut<'w> {
    world: &'w mut World,
    id: EntityId,
    kind: EntityKind,
}

impl<'w> EntityMut<'w> {
    fn new(world: &'w mut World, id: EntityId, kind: EntityKind) -> Self {
        Self { world, id, kind }
    }

    /// Get the entity ID
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Get the concrete variant tag
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Attach a component
    pub fn attach<C: Component>(&mut self, component: C) -> Result<&mut C, EcsError> {
        self.world.attach(self.id, component)
    }

    /// Detach a component
    pub fn detach<C: Component>(&mut self) -> Result<bool, EcsError> {
        self.world.detach::<C>(self.id)
    }

    /// Read a component
    pub fn get<C: Component>(&self) -> Result<&C, EcsError> {
        self.world.get(self.id)
    }

    /// Mutate a component
    pub fn get_mut<C: Component>(&mut self) -> Result<&mut C, EcsError> {
        self.world.get_mut(self.id)
    }

    /// Check whether a component of type `C` is attached
    pub fn has<C: Component>(&self) -> bool {
        self.world.has::<C>(self.id)
    }

    /// The world the entity lives in
    pub fn world(&mut self) -> &mut World {
        self.world
    }
}

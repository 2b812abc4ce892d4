//! Typed publish/subscribe mediator
//!
//! Key principles:
//! - Handlers are registered per event type (only interested handlers are notified)
//! - Delivery is immediate and synchronous, in registration order
//! - Every handler belongs to a [`SubscriberId`]; [`Mediator::erase`] revokes
//!   all of a subscriber's handlers at once
//!
//! Event payloads are plain Rust types implementing [`Event`]. Generic payloads
//! carry their capability bound in the type definition, so an event about a
//! component cannot be declared for a type that is not a component.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

/// Marker trait for event payloads
pub trait Event: 'static {}

/// Opaque identity that owns a group of handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Raw numeric value, for diagnostics
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscriber#{}", self.0)
    }
}

type Handler<E> = Box<dyn FnMut(&E)>;

struct HandlerList<E: Event> {
    entries: Vec<(SubscriberId, Handler<E>)>,
}

/// Type-erased access to a handler list, for operations that do not need the event type
trait ErasedHandlers {
    fn erase(&mut self, subscriber: SubscriberId) -> usize;
    fn count_for(&self, subscriber: SubscriberId) -> usize;
    fn is_empty(&self) -> bool;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<E: Event> ErasedHandlers for HandlerList<E> {
    fn erase(&mut self, subscriber: SubscriberId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(owner, _)| *owner != subscriber);
        before - self.entries.len()
    }

    fn count_for(&self, subscriber: SubscriberId) -> usize {
        self.entries.iter().filter(|(owner, _)| *owner == subscriber).count()
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Event mediator with per-subscriber bulk unsubscription
pub struct Mediator {
    handlers: HashMap<TypeId, Box<dyn ErasedHandlers>>,
    next_subscriber: u64,
}

impl Mediator {
    /// Create a new mediator with no handlers
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            next_subscriber: 0,
        }
    }

    /// Allocate a fresh subscriber identity
    pub fn register_subscriber(&mut self) -> SubscriberId {
        let id = SubscriberId(self.next_subscriber);
        self.next_subscriber += 1;
        id
    }

    /// Register `handler` for events of type `E` under `subscriber`
    pub fn require<E, F>(&mut self, subscriber: SubscriberId, handler: F)
    where
        E: Event,
        F: FnMut(&E) + 'static,
    {
        let list = self
            .handlers
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(HandlerList::<E> { entries: Vec::new() }));
        // Lists are keyed by the TypeId of their own event type
        if let Some(list) = list.as_any_mut().downcast_mut::<HandlerList<E>>() {
            list.entries.push((subscriber, Box::new(handler)));
        }
    }

    /// Broadcast `event` to every handler registered for its type
    ///
    /// Returns the number of handlers that ran.
    pub fn send<E: Event>(&mut self, event: E) -> usize {
        self.dispatch(&event)
    }

    /// Broadcast an event built by `build`, only if anyone listens for it
    ///
    /// Returns the number of handlers that ran; `build` is not called when
    /// that number would be zero.
    pub fn send_with<E, F>(&mut self, build: F) -> usize
    where
        E: Event,
        F: FnOnce() -> E,
    {
        if !self.has_subscribers::<E>() {
            return 0;
        }
        self.dispatch(&build())
    }

    /// Remove every handler registered under `subscriber`
    ///
    /// Returns the number of handlers removed.
    pub fn erase(&mut self, subscriber: SubscriberId) -> usize {
        let mut removed = 0;
        for list in self.handlers.values_mut() {
            removed += list.erase(subscriber);
        }
        self.handlers.retain(|_, list| !list.is_empty());
        removed
    }

    /// Check whether any handler listens for `E`
    pub fn has_subscribers<E: Event>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<E>())
    }

    /// Number of handlers `subscriber` currently owns, across all event types
    pub fn subscription_count(&self, subscriber: SubscriberId) -> usize {
        self.handlers.values().map(|list| list.count_for(subscriber)).sum()
    }

    fn dispatch<E: Event>(&mut self, event: &E) -> usize {
        let Some(list) = self
            .handlers
            .get_mut(&TypeId::of::<E>())
            .and_then(|list| list.as_any_mut().downcast_mut::<HandlerList<E>>())
        else {
            return 0;
        };
        for (_, handler) in &mut list.entries {
            handler(event);
        }
        list.entries.len()
    }
}

impl Default for Mediator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Mediator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mediator")
            .field("event_types", &self.handlers.len())
            .field("next_subscriber", &self.next_subscriber)
            .finish()
    }
}

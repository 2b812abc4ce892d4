//! System ordering and deferred structural changes
//!
//! Systems run in ascending ordinal order. Ordinals are handed out once per
//! registration and never reused, so the order of a system never changes.
//! Removals requested while systems run are queued as [`Effect`]s and only
//! applied when the world drains the queue at the end of the tick.

use super::system::System;
use crate::events::SubscriberId;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::PathBuf;

/// Identity of the system currently running or setting up
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ActiveSystem {
    pub(crate) name: String,
    pub(crate) subscriber: SubscriberId,
}

pub(crate) struct SystemEntry {
    pub(crate) name: String,
    pub(crate) ordinal: u64,
    pub(crate) subscriber: SubscriberId,
    /// `None` while checked out for `run`
    pub(crate) system: Option<Box<dyn System>>,
    /// Module path the system was loaded from
    pub(crate) origin: Option<PathBuf>,
}

/// Live systems indexed by name and by ordinal
#[derive(Default)]
pub(crate) struct SystemTable {
    by_name: HashMap<String, u64>,
    order: BTreeMap<u64, SystemEntry>,
    next_ordinal: u64,
}

impl SystemTable {
    pub(crate) fn allocate_ordinal(&mut self) -> u64 {
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        ordinal
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub(crate) fn insert(&mut self, entry: SystemEntry) {
        debug_assert!(!self.by_name.contains_key(&entry.name), "duplicate system name");
        self.by_name.insert(entry.name.clone(), entry.ordinal);
        self.order.insert(entry.ordinal, entry);
    }

    /// Snapshot of the run order
    pub(crate) fn ordinals(&self) -> Vec<u64> {
        self.order.keys().copied().collect()
    }

    /// Check a system out for running
    pub(crate) fn take(&mut self, ordinal: u64) -> Option<(Box<dyn System>, ActiveSystem)> {
        let entry = self.order.get_mut(&ordinal)?;
        let system = entry.system.take()?;
        let active = ActiveSystem {
            name: entry.name.clone(),
            subscriber: entry.subscriber,
        };
        Some((system, active))
    }

    /// Return a checked-out system to its slot
    pub(crate) fn restore(&mut self, ordinal: u64, system: Box<dyn System>) {
        if let Some(entry) = self.order.get_mut(&ordinal) {
            entry.system = Some(system);
        }
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<SystemEntry> {
        let ordinal = self.by_name.remove(name)?;
        self.order.remove(&ordinal)
    }

    /// Names in run order
    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.order.values().map(|entry| entry.name.as_str())
    }

    pub(crate) fn len(&self) -> usize {
        self.by_name.len()
    }
}

/// Deferred structural change
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Effect {
    RemoveSystem(String),
}

/// Queue of effects applied at the end of a tick
#[derive(Debug, Default)]
pub(crate) struct PendingEffects {
    queue: VecDeque<Effect>,
}

impl PendingEffects {
    /// Queue a removal unless one is already queued for `name`
    pub(crate) fn push_removal(&mut self, name: &str) -> bool {
        if self.contains_removal(name) {
            return false;
        }
        self.queue.push_back(Effect::RemoveSystem(name.to_string()));
        true
    }

    pub(crate) fn contains_removal(&self, name: &str) -> bool {
        self.queue
            .iter()
            .any(|effect| matches!(effect, Effect::RemoveSystem(queued) if queued == name))
    }

    pub(crate) fn pop(&mut self) -> Option<Effect> {
        self.queue.pop_front()
    }
}

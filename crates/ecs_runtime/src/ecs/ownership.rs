//! Entity ownership records
//!
//! Every live entity is tracked under exactly one regime:
//! - *saved*: lives until an explicit destroy; the creating system is kept
//!   for diagnostics only
//! - *temporary*: leased to the creating system and destroyed with it at the
//!   latest

use super::entity::EntityId;
use std::collections::HashMap;

/// How a live entity is owned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tenure {
    /// Caller-owned; `creator` is `None` when created outside any system
    Saved {
        /// System that created the entity
        creator: Option<String>,
    },
    /// Leased to a system
    Temporary {
        /// System holding the lease
        owner: String,
    },
}

#[derive(Debug, Default)]
pub(crate) struct Ownership {
    saved: HashMap<EntityId, Option<String>>,
    temporary: HashMap<EntityId, String>,
    leases: HashMap<String, Vec<EntityId>>,
}

impl Ownership {
    pub(crate) fn record(&mut self, entity: EntityId, tenure: Tenure) {
        match tenure {
            Tenure::Saved { creator } => {
                self.saved.insert(entity, creator);
            }
            Tenure::Temporary { owner } => {
                self.leases.entry(owner.clone()).or_default().push(entity);
                self.temporary.insert(entity, owner);
            }
        }
    }

    /// Stop tracking `entity`, saved regime first
    pub(crate) fn release(&mut self, entity: EntityId) -> Option<Tenure> {
        if let Some(creator) = self.saved.remove(&entity) {
            return Some(Tenure::Saved { creator });
        }
        let owner = self.temporary.remove(&entity)?;
        if let Some(leased) = self.leases.get_mut(&owner) {
            leased.retain(|id| *id != entity);
            if leased.is_empty() {
                self.leases.remove(&owner);
            }
        }
        Some(Tenure::Temporary { owner })
    }

    /// End every lease held by `system`, returning the entities in creation order
    pub(crate) fn revoke_leases(&mut self, system: &str) -> Vec<EntityId> {
        let leased = self.leases.remove(system).unwrap_or_default();
        leased
            .into_iter()
            .filter(|id| self.temporary.remove(id).is_some())
            .collect()
    }

    pub(crate) fn tenure(&self, entity: EntityId) -> Option<Tenure> {
        if let Some(creator) = self.saved.get(&entity) {
            return Some(Tenure::Saved { creator: creator.clone() });
        }
        self.temporary
            .get(&entity)
            .map(|owner| Tenure::Temporary { owner: owner.clone() })
    }

    pub(crate) fn leased_by(&self, system: &str) -> &[EntityId] {
        self.leases.get(system).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Live saved entities created by `system`
    pub(crate) fn saved_by(&self, system: &str) -> usize {
        self.saved
            .values()
            .filter(|creator| creator.as_deref() == Some(system))
            .count()
    }

    pub(crate) fn saved_count(&self) -> usize {
        self.saved.len()
    }

    pub(crate) fn temporary_count(&self) -> usize {
        self.temporary.len()
    }
}

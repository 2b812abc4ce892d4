//! ECS error types

use super::component::ComponentKind;
use super::entity::EntityId;
use crate::plugin::ModuleLoadError;
use thiserror::Error;

/// Errors raised by entity, component and system operations
#[derive(Error, Debug)]
pub enum EcsError {
    /// The entity already holds a component of this kind
    #[error("Entity {entity} cannot have the same component twice ({kind})")]
    DuplicateComponent {
        /// Entity the attach targeted
        entity: EntityId,
        /// Kind that is already present
        kind: ComponentKind,
    },

    /// A required component is absent
    #[error("Entity {entity} does not have requested component: {kind}")]
    ComponentNotFound {
        /// Entity that was queried
        entity: EntityId,
        /// Kind that was requested
        kind: ComponentKind,
    },

    /// The stored value for a kind is not of the requested type
    #[error("Component kind {kind} holds {found}, not {expected}")]
    InvalidTypeUsage {
        /// Kind that was looked up
        kind: ComponentKind,
        /// Type the caller asked for
        expected: &'static str,
        /// Type actually stored under the kind
        found: &'static str,
    },

    /// No live entity has this id
    #[error("Entity {0} does not exist")]
    EntityNotFound(EntityId),

    /// The operation needs a system to be running or setting up
    #[error("{operation} requires an active system")]
    NoActiveSystem {
        /// Operation that was attempted
        operation: &'static str,
    },

    /// A queued removal names a system that is no longer registered
    #[error("System {0} is not registered")]
    MissingRemovalTarget(String),

    /// A module could not be turned into a system
    #[error(transparent)]
    ModuleLoad(#[from] ModuleLoadError),

    /// Failure reported by system code
    #[error("[{system}] {message}")]
    System {
        /// Name of the failing system
        system: String,
        /// What went wrong
        message: String,
    },
}

impl EcsError {
    /// Build a failure reported by system code
    pub fn system(system: impl Into<String>, message: impl Into<String>) -> Self {
        Self::System {
            system: system.into(),
            message: message.into(),
        }
    }
}

//! System trait and registration results

use super::error::EcsError;
use super::world::World;

/// A named unit of per-tick behavior
///
/// The name is the registration key: a second system with the same name is
/// rejected. While `setup` and `run` execute, the world attributes entity
/// creation and event subscriptions to this system.
pub trait System {
    /// Unique registration name
    fn name(&self) -> &str;

    /// Called once after the system is wired into the world, before it joins the run order
    ///
    /// An error aborts the registration and rolls back anything the system did.
    fn setup(&mut self, _world: &mut World) -> Result<(), EcsError> {
        Ok(())
    }

    /// Called once per tick with the seconds elapsed since the previous tick
    fn run(&mut self, world: &mut World, elapsed: f32) -> Result<(), EcsError>;

    /// Called once after the system left the run order and its temporary entities were destroyed
    fn teardown(&mut self, _world: &mut World) {}
}

/// Outcome of a registration request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadStatus {
    /// Whether the system joined the run order
    pub loaded: bool,
    /// Name of the system concerned, empty when unknown
    pub name: String,
}

impl LoadStatus {
    pub(crate) fn loaded(name: impl Into<String>) -> Self {
        Self {
            loaded: true,
            name: name.into(),
        }
    }

    pub(crate) fn rejected(name: impl Into<String>) -> Self {
        Self {
            loaded: false,
            name: name.into(),
        }
    }
}

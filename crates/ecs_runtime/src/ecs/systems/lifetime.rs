//! Lifetime system
//!
//! Counts every [`Lifetime`] down and destroys the entities whose time is up.

use crate::ecs::components::Lifetime;
use crate::ecs::{EcsError, System, World};

/// Despawns expired entities
#[derive(Debug, Default)]
pub struct LifetimeSystem {
    expired_total: usize,
}

impl LifetimeSystem {
    /// Registration name
    pub const NAME: &'static str = "lifetime";

    /// Create a new lifetime system
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entities this system has despawned
    pub fn expired_total(&self) -> usize {
        self.expired_total
    }
}

impl System for LifetimeSystem {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&mut self, world: &mut World, elapsed: f32) -> Result<(), EcsError> {
        let mut expired = Vec::new();
        for id in world.query_entities::<Lifetime>() {
            if world.get_mut::<Lifetime>(id)?.tick(elapsed) {
                expired.push(id);
            }
        }

        for id in expired {
            if world.destroy(id) {
                self.expired_total += 1;
            }
        }
        Ok(())
    }
}

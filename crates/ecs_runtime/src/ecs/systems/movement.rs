//! Movement system
//!
//! Integrates [`Velocity`] into [`Transform`] for every entity that has both.

use crate::ecs::components::{Transform, Velocity};
use crate::ecs::{EcsError, System, World};

/// Integrates velocities each tick
#[derive(Debug, Default)]
pub struct MovementSystem;

impl MovementSystem {
    /// Registration name
    pub const NAME: &'static str = "movement";

    /// Create a new movement system
    pub fn new() -> Self {
        Self
    }
}

impl System for MovementSystem {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&mut self, world: &mut World, elapsed: f32) -> Result<(), EcsError> {
        for id in world.query_entities::<Velocity>() {
            if !world.has::<Transform>(id) {
                continue;
            }
            let velocity = world.get::<Velocity>(id)?.clone();
            velocity.apply(world.get_mut::<Transform>(id)?, elapsed);
        }
        Ok(())
    }
}

//! # Sample Plugin
//!
//! A system module for the ECS runtime. Build it as a `cdylib`, drop the
//! library into the host's systems directory and the runtime picks it up.
//!
//! The [`Heartbeat`] system keeps one temporary marker entity alive, counts
//! its ticks and unregisters itself after a configurable number of beats.
//! The first module argument sets that number.

#![warn(missing_docs)]

use ecs_runtime::export_system;
use ecs_runtime::prelude::*;

/// Beats before the system stops itself when no argument is given
pub const DEFAULT_BEATS: u32 = 5;

/// Marker entity kept alive while the heartbeat runs
struct Pulse;

impl Prefab for Pulse {
    const KIND: EntityKind = EntityKind::new("Pulse");

    fn build(&mut self, entity: &mut EntityBuilder) -> Result<(), EcsError> {
        entity.attach(Label::new(Heartbeat::NAME))?;
        entity.attach(Lifetime::infinite())?;
        Ok(())
    }
}

/// Counts ticks and unregisters itself after `limit` of them
#[derive(Debug)]
pub struct Heartbeat {
    beats: u32,
    limit: u32,
    marker: Option<EntityId>,
}

impl Heartbeat {
    /// Registration name
    pub const NAME: &'static str = "heartbeat";

    /// Stop after `limit` beats; zero beats forever
    pub fn new(limit: u32) -> Self {
        Self {
            beats: 0,
            limit,
            marker: None,
        }
    }

    /// Build from module arguments: `[limit]`
    pub fn from_args(args: &ModuleArgs) -> Self {
        Self::new(args.parse(0).unwrap_or(DEFAULT_BEATS))
    }

    /// Ticks seen so far
    pub fn beats(&self) -> u32 {
        self.beats
    }

    /// The marker entity, once set up
    pub fn marker(&self) -> Option<EntityId> {
        self.marker
    }
}

impl System for Heartbeat {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn setup(&mut self, world: &mut World) -> Result<(), EcsError> {
        self.marker = Some(world.create_scoped(Pulse)?);
        world.subscribe::<Shutdown, _>(|_| log::info!("[{}] shutdown broadcast received", Heartbeat::NAME))?;
        Ok(())
    }

    fn run(&mut self, world: &mut World, elapsed: f32) -> Result<(), EcsError> {
        self.beats += 1;
        log::debug!("[{}] beat {} after {:.3}s", Self::NAME, self.beats, elapsed);

        if self.limit > 0 && self.beats >= self.limit {
            world.notice(format!("[{}] {} beats, stopping.", Self::NAME, self.beats));
            world.remove_system(Self::NAME);
        }
        Ok(())
    }

    fn teardown(&mut self, _world: &mut World) {
        log::info!("[{}] stopped after {} beats", Self::NAME, self.beats);
    }
}

export_system!(Heartbeat, Heartbeat::from_args);

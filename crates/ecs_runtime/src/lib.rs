//! # ECS Runtime
//!
//! An entity-component-system runtime core with deterministic scheduling and
//! hot-pluggable systems.
//!
//! ## Features
//!
//! - **Registry**: entities built from prefabs, typed components with a global index
//! - **Ownership**: saved entities live until destroyed, temporary ones are leased to a system
//! - **Scheduling**: systems run in registration order, removals are deferred to the end of a tick
//! - **Events**: typed publish/subscribe with per-system bulk unsubscription
//! - **Plugins**: systems loaded from shared libraries and released after teardown
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ecs_runtime::prelude::*;
//!
//! struct Greeter;
//!
//! impl System for Greeter {
//!     fn name(&self) -> &str {
//!         "greeter"
//!     }
//!
//!     fn setup(&mut self, world: &mut World) -> Result<(), EcsError> {
//!         let id = world.create_scoped(Blank)?;
//!         world.attach(id, Label::new("hello"))?;
//!         Ok(())
//!     }
//!
//!     fn run(&mut self, world: &mut World, _elapsed: f32) -> Result<(), EcsError> {
//!         world.remove_system("greeter");
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::new(EngineConfig::default());
//!     engine.add_system(Greeter)?;
//!     std::process::exit(engine.run());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core runtime modules
pub mod core;

pub mod config;
pub mod ecs;
pub mod events;
pub mod foundation;
pub mod plugin;

mod engine;

#[cfg(test)]
mod testing;

pub use engine::{Engine, EngineError};

// Used by `export_system!` so modules forward to the logging facade they were built against
#[doc(hidden)]
pub use log;

/// Common imports for runtime users
pub mod prelude {
    pub use crate::{
        core::config::{Config, DiscoveryFlags, EngineConfig, RuntimeConfig, StartParameters},
        ecs::{
            components::{Label, Lifetime, Transform, Velocity},
            events::{
                ComponentAttached, ComponentDetached, EntityCreated, EntityDestroyed, Notice, Shutdown,
                SystemDestroyed, SystemLoaded,
            },
            systems::{LifetimeSystem, MovementSystem},
            Blank, Component, ComponentKind, EcsError, Entity, EntityBuilder, EntityId, EntityKind, EntityMut,
            LoadStatus, Prefab, System, World,
        },
        events::{Event, Mediator, SubscriberId},
        foundation::{
            cancel::CancellationToken,
            math::{Quat, Vec3},
            time::{Stopwatch, Timer},
        },
        plugin::{ModuleArgs, ModuleLoader},
        Engine, EngineError,
    };
}

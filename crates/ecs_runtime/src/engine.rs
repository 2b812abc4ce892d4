//! Core engine implementation
//!
//! The engine wraps a [`World`] with plugin discovery and the outer run loop.
//! The loop runs until the last system unregisters itself, the cancellation
//! token is set (usually by the interrupt handler) or the configured tick
//! limit is reached. It then broadcasts [`Shutdown`] and tears every remaining
//! system down.

use crate::core::config::{DiscoveryFlags, EngineConfig, StartParameters};
use crate::ecs::events::Shutdown;
use crate::ecs::{EcsError, LoadStatus, System, World};
use crate::foundation::cancel::CancellationToken;
use crate::foundation::signal;
use crate::foundation::time::Stopwatch;
use crate::plugin::{ModuleArgs, ModuleLoader};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use walkdir::WalkDir;

/// Main engine struct
///
/// The engine coordinates plugin discovery and manages the main loop.
pub struct Engine {
    /// ECS world containing all entities, components, and systems
    world: World,

    /// Cooperative stop flag, polled once per loop iteration
    cancel: CancellationToken,

    /// Engine configuration
    config: EngineConfig,
}

impl Engine {
    /// Create a new engine that loads modules as shared libraries
    pub fn new(config: EngineConfig) -> Self {
        log::info!("Initializing engine...");
        Self::from_world(World::new(), config)
    }

    /// Create a new engine with a custom module loader
    pub fn with_loader(config: EngineConfig, loader: Box<dyn ModuleLoader>) -> Self {
        Self::from_world(World::with_loader(loader), config)
    }

    fn from_world(world: World, config: EngineConfig) -> Self {
        Self {
            world,
            cancel: CancellationToken::new(),
            config,
        }
    }

    /// Token that stops the run loop when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel the run loop on Ctrl-C / SIGINT
    pub fn install_interrupt_handler(&self) -> Result<(), EngineError> {
        signal::install_interrupt_handler(self.cancel.clone())?;
        Ok(())
    }

    /// Discover and load every module under `params.systems_dir`, then run one tick
    pub fn start(&mut self, params: &StartParameters) -> Result<i32, EngineError> {
        let loaded = self.load_system_dir(&params.systems_dir, params.discovery_flags(), &params.module_args)?;
        self.world.notice(format!("Engine loaded {loaded} systems."));
        self.world.tick();
        Ok(0)
    }

    /// Load every regular file under `root` as a module
    ///
    /// Entries are visited in file name order. A file that fails to load is
    /// logged and skipped. Returns the number of systems that were loaded.
    pub fn load_system_dir(
        &mut self,
        root: impl AsRef<Path>,
        flags: DiscoveryFlags,
        args: &ModuleArgs,
    ) -> Result<usize, EngineError> {
        let root = root.as_ref();
        let max_depth = if flags.contains(DiscoveryFlags::RECURSIVE) { usize::MAX } else { 1 };
        let walker = WalkDir::new(root)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(flags.contains(DiscoveryFlags::FOLLOW_SYMLINKS))
            .sort_by_file_name();

        let mut loaded = 0;
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => return Err(EngineError::Discovery(err)),
                Err(err) => {
                    log::warn!("Skipping unreadable entry: {}", err);
                    continue;
                }
            };

            if flags.contains(DiscoveryFlags::LOG) {
                log::info!("Discovered {}", entry.path().display());
            }
            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            if file_type.is_symlink() {
                log::debug!("Not following symbolic link {}", entry.path().display());
                continue;
            }

            match self.world.load_system(entry.path(), args) {
                Ok(status) if status.loaded => loaded += 1,
                Ok(_) => {}
                Err(err) => log::warn!("Failed to load {}: {}", entry.path().display(), err),
            }
        }
        Ok(loaded)
    }

    /// Run until no system is left, the token is cancelled or the tick limit is hit
    ///
    /// Always returns a zero exit status.
    pub fn run(&mut self) -> i32 {
        self.world.notice("Engine running...");
        let budget = tick_budget(self.config.tick_rate);

        let mut ticks: u64 = 0;
        let mut pacer = Stopwatch::new();
        while self.should_continue(ticks) {
            pacer.restart();
            self.world.tick();
            ticks += 1;

            if let Some(left) = budget.and_then(|budget| pacer.remaining(budget)) {
                std::thread::sleep(left);
            }
        }

        self.world.notice(format!("Engine shutting down. Ran {ticks} times."));
        self.world.send(Shutdown);
        self.world.shutdown();
        0
    }

    fn should_continue(&self, ticks: u64) -> bool {
        if self.cancel.is_cancelled() {
            log::info!("Stop requested");
            return false;
        }
        if self.world.system_count() == 0 {
            log::info!("No systems left");
            return false;
        }
        if self.config.max_ticks.is_some_and(|max| ticks >= max) {
            log::info!("Tick limit reached");
            return false;
        }
        true
    }

    /// Register a system
    pub fn add_system<S: System + 'static>(&mut self, system: S) -> Result<LoadStatus, EcsError> {
        self.world.add_system(system)
    }

    /// Load one module
    pub fn load_system(&mut self, path: impl AsRef<Path>, args: &ModuleArgs) -> Result<LoadStatus, EcsError> {
        self.world.load_system(path, args)
    }

    /// Request removal of a system at the end of the current tick
    pub fn remove_system(&mut self, name: &str) -> bool {
        self.world.remove_system(name)
    }

    /// Get the world
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get the world mutably
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Get the engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// The discovery root could not be read
    #[error("Plugin discovery failed: {0}")]
    Discovery(#[from] walkdir::Error),

    /// The interrupt handler could not be installed
    #[error("Signal handler error: {0}")]
    Signal(#[from] ctrlc::Error),

    /// Registry failure
    #[error(transparent)]
    Ecs(#[from] EcsError),
}

/// Time one tick may take at `rate` ticks per second
///
/// `None` (unpaced) for missing or non-positive rates and for rates so small
/// that the period does not fit in a [`Duration`].
fn tick_budget(rate: Option<f32>) -> Option<Duration> {
    let rate = rate.filter(|rate| *rate > 0.0)?;
    match Duration::try_from_secs_f32(rate.recip()) {
        Ok(budget) => Some(budget),
        Err(err) => {
            log::warn!("Ignoring tick rate {}: {}", rate, err);
            None
        }
    }
}

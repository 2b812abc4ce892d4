//! Test doubles shared by the registry and façade tests

use crate::ecs::{EcsError, System, World};
use crate::plugin::{LoadedModule, ModuleArgs, ModuleHandle, ModuleLoadError, ModuleLoader};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

/// Ordered record of what happened, shared between doubles and assertions
#[derive(Debug, Clone, Default)]
pub(crate) struct Journal(Rc<RefCell<Vec<String>>>);

impl Journal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, line: impl Into<String>) {
        self.0.borrow_mut().push(line.into());
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub(crate) fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Position of the first line equal to `line`
    pub(crate) fn position(&self, line: &str) -> Option<usize> {
        self.0.borrow().iter().position(|l| l == line)
    }
}

type Hook = Box<dyn FnMut(&mut World) -> Result<(), EcsError>>;

/// System driven by closures that journals its lifecycle
pub(crate) struct Probe {
    name: String,
    journal: Journal,
    on_setup: Option<Hook>,
    on_run: Option<Hook>,
}

impl Probe {
    pub(crate) fn new(name: &str, journal: &Journal) -> Self {
        Self {
            name: name.to_string(),
            journal: journal.clone(),
            on_setup: None,
            on_run: None,
        }
    }

    pub(crate) fn on_setup(mut self, hook: impl FnMut(&mut World) -> Result<(), EcsError> + 'static) -> Self {
        self.on_setup = Some(Box::new(hook));
        self
    }

    pub(crate) fn on_run(mut self, hook: impl FnMut(&mut World) -> Result<(), EcsError> + 'static) -> Self {
        self.on_run = Some(Box::new(hook));
        self
    }
}

impl System for Probe {
    fn name(&self) -> &str {
        &self.name
    }

    fn setup(&mut self, world: &mut World) -> Result<(), EcsError> {
        self.journal.push(format!("setup {}", self.name));
        match &mut self.on_setup {
            Some(hook) => hook(world),
            None => Ok(()),
        }
    }

    fn run(&mut self, world: &mut World, _elapsed: f32) -> Result<(), EcsError> {
        self.journal.push(format!("run {}", self.name));
        match &mut self.on_run {
            Some(hook) => hook(world),
            None => Ok(()),
        }
    }

    fn teardown(&mut self, _world: &mut World) {
        self.journal.push(format!("teardown {}", self.name));
    }
}

impl Drop for Probe {
    fn drop(&mut self) {
        self.journal.push(format!("drop {}", self.name));
    }
}

type Factory = Box<dyn Fn(&ModuleArgs) -> Box<dyn System>>;

/// Module loader that builds systems from in-memory factories keyed by file stem
pub(crate) struct StaticLoader {
    factories: HashMap<String, Factory>,
    journal: Journal,
}

impl StaticLoader {
    pub(crate) fn new(journal: &Journal) -> Self {
        Self {
            factories: HashMap::new(),
            journal: journal.clone(),
        }
    }

    pub(crate) fn register(mut self, stem: &str, factory: impl Fn(&ModuleArgs) -> Box<dyn System> + 'static) -> Self {
        self.factories.insert(stem.to_string(), Box::new(factory));
        self
    }
}

impl ModuleLoader for StaticLoader {
    fn load(&mut self, path: &Path, args: &ModuleArgs) -> Result<LoadedModule, ModuleLoadError> {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default().to_string();
        let factory = self.factories.get(&stem).ok_or_else(|| ModuleLoadError::MissingSymbol {
            path: path.to_path_buf(),
            symbol: "ecs_runtime_create_system",
        })?;
        self.journal.push(format!("open {stem}"));
        let system = factory(args);
        let mapping = Mapping {
            stem,
            journal: self.journal.clone(),
        };
        Ok(LoadedModule {
            system,
            handle: ModuleHandle::new(path, mapping),
        })
    }
}

/// Stands in for a mapped library; journals when it is released
struct Mapping {
    stem: String,
    journal: Journal,
}

impl Drop for Mapping {
    fn drop(&mut self) {
        self.journal.push(format!("close {}", self.stem));
    }
}

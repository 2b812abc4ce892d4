//! Dynamic module loading
//!
//! A module is a shared library that exports four symbols:
//! - `ecs_runtime_abi_version`, returning the [`ABI_VERSION`] it was built against
//! - `ecs_runtime_build_fingerprint`, returning its [`build_fingerprint`]
//! - `ecs_runtime_init_logger`, pointing the module's `log` facade at the host logger
//! - `ecs_runtime_create_system`, building one boxed [`System`] from a [`ModuleArgs`]
//!
//! All are generated by [`export_system!`](crate::export_system). Components
//! and events are matched by type identity, which only agrees between the host
//! and a module compiled in the same build of this crate (same compiler,
//! profile and features); the fingerprint captures exactly that, and a module
//! whose fingerprint differs is rejected before its factory runs.
//!
//! The [`ModuleHandle`] returned with the system keeps the library mapped; the
//! world drops it only after the system itself was torn down and dropped.

mod dylib;

pub use dylib::DylibLoader;

use crate::ecs::components::Label;
use crate::ecs::events::ComponentAttached;
use crate::ecs::{System, World};
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Version of the module contract; bumped whenever it changes
pub const ABI_VERSION: u32 = 1;

/// Name of the exported factory symbol
pub const CREATE_SYMBOL: &[u8] = b"ecs_runtime_create_system\0";

/// Name of the exported ABI version symbol
pub const ABI_SYMBOL: &[u8] = b"ecs_runtime_abi_version\0";

/// Name of the exported build fingerprint symbol
pub const FINGERPRINT_SYMBOL: &[u8] = b"ecs_runtime_build_fingerprint\0";

/// Name of the exported logger hook
pub const LOGGER_SYMBOL: &[u8] = b"ecs_runtime_init_logger\0";

/// Signature of `ecs_runtime_abi_version`
pub type AbiVersionFn = unsafe extern "C" fn() -> u32;

/// Signature of `ecs_runtime_build_fingerprint`
pub type FingerprintFn = unsafe extern "C" fn() -> u64;

/// Signature of `ecs_runtime_init_logger`
#[allow(improper_ctypes_definitions)]
pub type InitLoggerFn = unsafe extern "C" fn(&'static dyn log::Log, log::LevelFilter);

/// Signature of `ecs_runtime_create_system`
#[allow(improper_ctypes_definitions)]
pub type CreateSystemFn = unsafe extern "C" fn(*const ModuleArgs) -> *mut Box<dyn System>;

/// Identity of this build of the runtime
///
/// Mixes the compiler version and target with the type identities of the
/// world, the system trait and a component event. Two copies of the crate
/// produce the same value only when their types are interchangeable.
pub fn build_fingerprint() -> u64 {
    let mut hasher = DefaultHasher::new();
    env!("ECS_RUNTIME_RUSTC_VERSION").hash(&mut hasher);
    env!("ECS_RUNTIME_BUILD_TARGET").hash(&mut hasher);
    ABI_VERSION.hash(&mut hasher);
    TypeId::of::<World>().hash(&mut hasher);
    TypeId::of::<dyn System>().hash(&mut hasher);
    TypeId::of::<ComponentAttached<Label>>().hash(&mut hasher);
    hasher.finish()
}

/// Point this copy of the `log` facade at `logger`
///
/// Modules link their own copy of `log`; the generated
/// `ecs_runtime_init_logger` forwards here. Only the first call installs the
/// logger, later calls just update the level.
pub fn adopt_logger(logger: &'static dyn log::Log, level: log::LevelFilter) {
    if log::set_logger(logger).is_err() {
        log::trace!("Logger already installed, updating level only");
    }
    log::set_max_level(level);
}

/// Constructor arguments handed to a module's factory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleArgs(Vec<String>);

impl ModuleArgs {
    /// Empty argument list
    pub fn new() -> Self {
        Self::default()
    }

    /// Argument at `index`
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// Parse the argument at `index`, `None` when absent or malformed
    pub fn parse<T: FromStr>(&self, index: usize) -> Option<T> {
        self.get(index)?.parse().ok()
    }

    /// Iterate over the arguments
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether there are no arguments
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for ModuleArgs {
    fn from(args: Vec<String>) -> Self {
        Self(args)
    }
}

impl<'a> FromIterator<&'a str> for ModuleArgs {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_string).collect())
    }
}

/// Keeps a loaded module alive
pub struct ModuleHandle {
    path: PathBuf,
    _keep_alive: Box<dyn Any>,
}

impl ModuleHandle {
    /// Wrap whatever keeps the module's code mapped
    pub fn new(path: impl Into<PathBuf>, keep_alive: impl Any) -> Self {
        Self {
            path: path.into(),
            _keep_alive: Box::new(keep_alive),
        }
    }

    /// Path the module was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleHandle").field("path", &self.path).finish_non_exhaustive()
    }
}

/// A system built by a loader together with the handle that keeps its code alive
pub struct LoadedModule {
    /// The system the module produced
    pub system: Box<dyn System>,
    /// Must be dropped after `system`
    pub handle: ModuleHandle,
}

/// Builds systems from module files
pub trait ModuleLoader {
    /// Load the module at `path` and build its system with `args`
    fn load(&mut self, path: &Path, args: &ModuleArgs) -> Result<LoadedModule, ModuleLoadError>;
}

/// Module loading errors
#[derive(Error, Debug)]
pub enum ModuleLoadError {
    /// The file could not be opened as a module
    #[error("Failed to open module {}: {source}", path.display())]
    Open {
        /// Module path
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A required symbol is not exported
    #[error("Module {} does not export {symbol}", path.display())]
    MissingSymbol {
        /// Module path
        path: PathBuf,
        /// Missing symbol name
        symbol: &'static str,
    },

    /// The module was built against another contract version
    #[error("Module {} uses ABI version {found}, expected {expected}", path.display())]
    IncompatibleAbi {
        /// Module path
        path: PathBuf,
        /// Version this runtime implements
        expected: u32,
        /// Version the module reports
        found: u32,
    },

    /// The module was compiled against a different build of this crate
    #[error("Module {} was built with runtime fingerprint {found:016x}, expected {expected:016x}", path.display())]
    IncompatibleBuild {
        /// Module path
        path: PathBuf,
        /// Fingerprint of the host
        expected: u64,
        /// Fingerprint the module reports
        found: u64,
    },

    /// The factory returned no system
    #[error("Module {} did not produce a system", path.display())]
    NullInstance {
        /// Module path
        path: PathBuf,
    },
}

/// Export a system type as a loadable module
///
/// `$constructor` is called with the [`ModuleArgs`] passed to the loader and
/// must return a `$system`.
///
/// ```ignore
/// ecs_runtime::export_system!(Heartbeat, Heartbeat::from_args);
/// ```
#[macro_export]
macro_rules! export_system {
    ($system:ty, $constructor:path) => {
        #[no_mangle]
        #[allow(unsafe_code)]
        pub extern "C" fn ecs_runtime_abi_version() -> u32 {
            $crate::plugin::ABI_VERSION
        }

        #[no_mangle]
        #[allow(unsafe_code)]
        pub extern "C" fn ecs_runtime_build_fingerprint() -> u64 {
            $crate::plugin::build_fingerprint()
        }

        #[no_mangle]
        #[allow(unsafe_code, improper_ctypes_definitions)]
        pub extern "C" fn ecs_runtime_init_logger(
            logger: &'static dyn $crate::log::Log,
            level: $crate::log::LevelFilter,
        ) {
            $crate::plugin::adopt_logger(logger, level);
        }

        /// # Safety
        ///
        /// `args` must be null or point to a live `ModuleArgs`.
        #[no_mangle]
        #[allow(unsafe_code, improper_ctypes_definitions)]
        pub unsafe extern "C" fn ecs_runtime_create_system(
            args: *const $crate::plugin::ModuleArgs,
        ) -> *mut ::std::boxed::Box<dyn $crate::ecs::System> {
            let empty = $crate::plugin::ModuleArgs::default();
            let args = if args.is_null() { &empty } else { &*args };
            match ::std::panic::catch_unwind(|| -> $system { $constructor(args) }) {
                Ok(system) => {
                    let system: ::std::boxed::Box<dyn $crate::ecs::System> = ::std::boxed::Box::new(system);
                    ::std::boxed::Box::into_raw(::std::boxed::Box::new(system))
                }
                Err(_) => ::std::ptr::null_mut(),
            }
        }
    };
}

//! Shared library module loader

#![allow(unsafe_code)]

use super::{
    build_fingerprint, AbiVersionFn, CreateSystemFn, FingerprintFn, InitLoggerFn, LoadedModule, ModuleArgs,
    ModuleHandle, ModuleLoadError, ModuleLoader, ABI_SYMBOL, ABI_VERSION, CREATE_SYMBOL, FINGERPRINT_SYMBOL,
    LOGGER_SYMBOL,
};
use libloading::{Library, Symbol};
use std::path::Path;

/// Loads modules with the platform dynamic linker
#[derive(Debug, Default)]
pub struct DylibLoader {
    _private: (),
}

impl DylibLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModuleLoader for DylibLoader {
    fn load(&mut self, path: &Path, args: &ModuleArgs) -> Result<LoadedModule, ModuleLoadError> {
        log::debug!("Opening module {}", path.display());

        // SAFETY: module initializers run here; modules are built against this crate.
        let library = unsafe { Library::new(path) }.map_err(|source| ModuleLoadError::Open {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;

        // SAFETY: the symbol type matches the one generated by `export_system!`.
        let found = unsafe {
            let abi: Symbol<'_, AbiVersionFn> = library.get(ABI_SYMBOL).map_err(|_| ModuleLoadError::MissingSymbol {
                path: path.to_path_buf(),
                symbol: "ecs_runtime_abi_version",
            })?;
            abi()
        };
        if found != ABI_VERSION {
            return Err(ModuleLoadError::IncompatibleAbi {
                path: path.to_path_buf(),
                expected: ABI_VERSION,
                found,
            });
        }

        // SAFETY: same ABI version, so the symbol type matches `FingerprintFn`.
        let fingerprint = unsafe {
            let fingerprint: Symbol<'_, FingerprintFn> =
                library.get(FINGERPRINT_SYMBOL).map_err(|_| ModuleLoadError::MissingSymbol {
                    path: path.to_path_buf(),
                    symbol: "ecs_runtime_build_fingerprint",
                })?;
            fingerprint()
        };
        verify_fingerprint(path, fingerprint)?;

        // SAFETY: the fingerprint matched, so the module shares this build's types.
        unsafe {
            let init_logger: Symbol<'_, InitLoggerFn> =
                library.get(LOGGER_SYMBOL).map_err(|_| ModuleLoadError::MissingSymbol {
                    path: path.to_path_buf(),
                    symbol: "ecs_runtime_init_logger",
                })?;
            init_logger(log::logger(), log::max_level());
        }

        // SAFETY: same build, so the factory signature matches `CreateSystemFn`.
        let raw = unsafe {
            let create: Symbol<'_, CreateSystemFn> =
                library.get(CREATE_SYMBOL).map_err(|_| ModuleLoadError::MissingSymbol {
                    path: path.to_path_buf(),
                    symbol: "ecs_runtime_create_system",
                })?;
            create(args)
        };
        if raw.is_null() {
            return Err(ModuleLoadError::NullInstance { path: path.to_path_buf() });
        }

        // SAFETY: non-null pointers from the factory come from `Box::into_raw`.
        let system = unsafe { *Box::from_raw(raw) };
        Ok(LoadedModule {
            system,
            handle: ModuleHandle::new(path, library),
        })
    }
}

/// Reject modules compiled against another build of the runtime
fn verify_fingerprint(path: &Path, found: u64) -> Result<(), ModuleLoadError> {
    let expected = build_fingerprint();
    if found == expected {
        Ok(())
    } else {
        Err(ModuleLoadError::IncompatibleBuild {
            path: path.to_path_buf(),
            expected,
            found,
        })
    }
}

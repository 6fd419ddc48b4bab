//! Load a script file by path and pull values out of it.
//!
//! A loaded file is a Rhai script. Loading runs its top-level statements once
//! and returns every top-level name it left behind as an [`ExecutedUnit`].
//! While the script runs, its own directory sits at the front of the
//! [`search_path`] of the loading thread, so `import "helper" as h;` finds
//! `helper.rhai` next to it. Functions of the unit keep those imports when
//! called later.
//!
//! # Safety of loaded code
//!
//! Loading executes the file in this process with this process's privileges.
//! Host functions registered through [`ModuleLoader::with_engine_setup`] are
//! reachable from the script. Only load files you trust.
//!
//! # Example
//! ```ignore
//! use simple_func::ModuleLoader;
//!
//! // plugin.rhai: fn run() { 42 }
//! let run = ModuleLoader::new().load_attribute("plugin.rhai", "run")?;
//! let value = run.as_callable().unwrap().call(vec![])?;
//! assert_eq!(value.as_int().unwrap(), 42);
//! ```

pub mod search_path;
mod unit;

pub use unit::{Binding, Callable, ExecutedUnit};

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rhai::module_resolvers::{FileModuleResolver, ModuleResolversCollection};
use rhai::Engine;
use tracing::{debug, info};

use crate::error::ImportError;
use search_path::SearchPathGuard;

/// File extension a loadable script must have.
pub const SCRIPT_EXTENSION: &str = "rhai";

type EngineSetup = Arc<dyn Fn(&mut Engine) + Send + Sync>;

/// What [`ModuleLoader::import`] hands back.
#[derive(Debug, Clone)]
pub enum Loaded {
    Unit(ExecutedUnit),
    Attribute(Binding),
}

/// Loads script files. Every load builds a fresh engine; nothing is cached.
#[derive(Clone, Default)]
pub struct ModuleLoader {
    setup: Option<EngineSetup>,
}

impl fmt::Debug for ModuleLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleLoader")
            .field("engine_setup", &self.setup.is_some())
            .finish()
    }
}

impl ModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `setup` on every engine before the script is compiled, e.g. to
    /// register host functions.
    ///
    /// The loader sets its own variable definition callback after `setup`
    /// runs; one set here is replaced.
    pub fn with_engine_setup<F>(mut self, setup: F) -> Self
    where
        F: Fn(&mut Engine) + Send + Sync + 'static,
    {
        self.setup = Some(Arc::new(setup));
        self
    }

    /// Load `path` and return the whole unit, or only `attribute` if given.
    pub fn import(
        &self,
        path: impl AsRef<Path>,
        attribute: Option<&str>,
    ) -> Result<Loaded, ImportError> {
        match attribute {
            Some(name) => self.load_attribute(path, name).map(Loaded::Attribute),
            None => self.load(path).map(Loaded::Unit),
        }
    }

    /// Load `path` and return one top-level binding from it.
    pub fn load_attribute(
        &self,
        path: impl AsRef<Path>,
        attribute: &str,
    ) -> Result<Binding, ImportError> {
        self.load(path)?.into_binding(attribute)
    }

    /// Load `path` and return every top-level binding it produced.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<ExecutedUnit, ImportError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ImportError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let file_path = path.canonicalize().map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parent_dir = file_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));

        let guard = SearchPathGuard::acquire(&parent_dir);
        self.execute(&file_path, guard.entries())
    }

    fn execute(
        &self,
        file_path: &Path,
        search_path: &[PathBuf],
    ) -> Result<ExecutedUnit, ImportError> {
        if file_path.extension().and_then(|ext| ext.to_str()) != Some(SCRIPT_EXTENSION) {
            return Err(ImportError::UnsupportedExtension {
                path: file_path.to_path_buf(),
                expected: SCRIPT_EXTENSION,
            });
        }

        let unit_name = file_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();

        let source = fs::read_to_string(file_path).map_err(|source| ImportError::Io {
            path: file_path.to_path_buf(),
            source,
        })?;

        let mut engine = Engine::new();
        engine.set_module_resolver(resolvers_for(search_path));
        if let Some(setup) = &self.setup {
            setup(&mut engine);
        }
        unit::capture_top_level(&mut engine);

        let mut ast = engine.compile(&source).map_err(|source| ImportError::Compile {
            path: file_path.to_path_buf(),
            source,
        })?;
        ast.set_source(file_path.to_string_lossy().to_string());

        debug!(unit = %unit_name, path = %file_path.display(), "Executing script");
        let unit = ExecutedUnit::run(unit_name, file_path.to_path_buf(), engine, ast).map_err(
            |source| ImportError::Execution {
                path: file_path.to_path_buf(),
                source,
            },
        )?;
        info!(unit = %unit.name(), bindings = unit.bindings().len(), "Loaded script");

        Ok(unit)
    }
}

/// One file resolver per search path entry, tried in order.
fn resolvers_for(search_path: &[PathBuf]) -> ModuleResolversCollection {
    let mut collection = ModuleResolversCollection::new();
    for dir in search_path {
        let mut resolver = FileModuleResolver::new_with_path_and_extension(dir, SCRIPT_EXTENSION);
        resolver.enable_cache(false);
        collection.push(resolver);
    }
    collection
}

/// Load `file_path` with a default [`ModuleLoader`].
///
/// Returns the whole unit when `attribute_name` is `None`, otherwise just
/// that binding.
pub fn import_from_file(
    file_path: impl AsRef<Path>,
    attribute_name: Option<&str>,
) -> Result<Loaded, ImportError> {
    ModuleLoader::new().import(file_path, attribute_name)
}

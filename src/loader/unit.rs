//! The result of executing a script: its top-level bindings.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rhai::{Dynamic, Engine, EvalAltResult, FnAccess, FnPtr, Module, Scope, Shared, AST};

use crate::error::ImportError;

/// Defined after a script's last statement. Reaching it marks every
/// top-level variable still in scope for export.
const UNIT_END: &str = "__unit_end";

/// One top-level name produced by a script.
#[derive(Clone)]
pub enum Binding {
    /// A variable or constant left in the top-level scope.
    Value(Dynamic),
    /// A public script function defined at top level.
    Function(Callable),
    /// A module imported at top level with `import "..." as name;`.
    Module(Shared<Module>),
}

impl Binding {
    pub fn as_value(&self) -> Option<&Dynamic> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Self::Function(callable) => Some(callable),
            _ => None,
        }
    }

    pub fn as_module(&self) -> Option<&Module> {
        match self {
            Self::Module(module) => Some(&**module),
            _ => None,
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Function(callable) => f.debug_tuple("Function").field(callable).finish(),
            Self::Module(module) => f.debug_tuple("Module").field(&module.id()).finish(),
        }
    }
}

/// A script function bound to the environment its script ran in.
///
/// The function sees the script's top-level imports, its constants through
/// `global::NAME`, and the other functions of the script. Calls do not re-run
/// the script's top-level statements.
#[derive(Clone)]
pub struct Callable {
    unit: String,
    name: String,
    engine: Arc<Engine>,
    lib: Arc<AST>,
}

impl Callable {
    pub(crate) fn new(unit: &str, name: &str, engine: Arc<Engine>, lib: Arc<AST>) -> Self {
        Self {
            unit: unit.to_string(),
            name: name.to_string(),
            engine,
            lib,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the function. Overloads are picked by argument count.
    pub fn call(&self, args: Vec<Dynamic>) -> Result<Dynamic, ImportError> {
        FnPtr::new(self.name.as_str())
            .and_then(|function| function.call::<Dynamic>(&self.engine, &self.lib, args))
            .map_err(|source| ImportError::Call {
                unit: self.unit.clone(),
                function: self.name.clone(),
                source,
            })
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("unit", &self.unit)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Make scripts run by [`ExecutedUnit::run`] on `engine` keep every
/// top-level variable, not only the `export`ed ones.
///
/// Replaces any variable definition callback already set on `engine`.
pub(crate) fn capture_top_level(engine: &mut Engine) {
    #[allow(deprecated)]
    engine.on_def_var(|is_runtime, info, mut context| {
        if is_runtime && info.name() == UNIT_END {
            let scope = context.scope_mut();
            let names: Vec<String> = scope
                .iter_raw()
                .map(|(name, _, _)| name.to_string())
                .collect();
            for name in names {
                scope.set_alias(name.as_str(), name.as_str());
            }
        }
        Ok(true)
    });
}

/// A fully executed script file.
///
/// Bindings are the unit's top-level variables and constants, its public
/// script functions and the modules it imported at top level. `private fn`
/// helpers stay reachable from the unit's own functions but are not
/// bindings. A top-level `return` ends the script early; only `export`ed
/// variables are kept then.
#[derive(Debug, Clone)]
pub struct ExecutedUnit {
    name: String,
    path: PathBuf,
    bindings: BTreeMap<String, Binding>,
}

impl ExecutedUnit {
    /// Run `ast` once on `engine` and collect what it left behind.
    ///
    /// `engine` must have been prepared with [`capture_top_level`]. Imports
    /// go in first, then functions, then variables, so a variable wins over
    /// a function of the same name, matching last-binding-wins at top level.
    pub(crate) fn run(
        name: String,
        path: PathBuf,
        engine: Engine,
        mut ast: AST,
    ) -> Result<Self, Box<EvalAltResult>> {
        ast.combine(engine.compile(format!("let {UNIT_END} = ();"))?);

        let module: Shared<Module> =
            Module::eval_ast_as_new(Scope::new(), &ast, &engine)?.into();
        let engine = Arc::new(engine);
        let lib = Arc::new(AST::new_from_module(module.clone()));

        let mut bindings = BTreeMap::new();

        for (alias, imported) in module.iter_sub_modules() {
            bindings.insert(alias.to_string(), Binding::Module(imported.clone()));
        }

        for function in ast.iter_functions() {
            if matches!(function.access, FnAccess::Private) {
                continue;
            }
            let callable = Callable::new(&name, function.name, engine.clone(), lib.clone());
            bindings.insert(function.name.to_string(), Binding::Function(callable));
        }

        for (var, value) in module.iter_var() {
            bindings.insert(var.to_string(), Binding::Value(value.clone()));
        }

        Ok(Self {
            name,
            path,
            bindings,
        })
    }

    /// Unit name, the file stem of the loaded file.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical path the unit was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, attribute: &str) -> Option<&Binding> {
        self.bindings.get(attribute)
    }

    pub fn contains(&self, attribute: &str) -> bool {
        self.bindings.contains_key(attribute)
    }

    /// All top-level names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    /// Names bound to script functions.
    pub fn functions(&self) -> impl Iterator<Item = &str> {
        self.bindings
            .iter()
            .filter(|(_, binding)| matches!(binding, Binding::Function(_)))
            .map(|(name, _)| name.as_str())
    }

    pub fn bindings(&self) -> &BTreeMap<String, Binding> {
        &self.bindings
    }

    /// Take one binding out of the unit.
    pub fn into_binding(mut self, attribute: &str) -> Result<Binding, ImportError> {
        self.bindings
            .remove(attribute)
            .ok_or_else(|| ImportError::AttributeNotFound {
                unit: self.name.clone(),
                attribute: attribute.to_string(),
            })
    }
}

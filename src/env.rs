//! The typed environment: local bindings, the global definition registry,
//! and the current-definition marker.
//!
//! An `Env` is cheap to clone: `locals` is a persistent `im::Vector` and
//! `definitions` an `Rc`-shared `im::HashMap`, so a closure can snapshot the
//! environment in force at its creation without copying it, and extending a
//! callee's environment never mutates (or is visible to) the caller's.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use im::{HashMap, Vector};

use crate::config::EvalConfig;
use crate::error::{Error, Result};
use crate::ident::Local;
use crate::term::{Parameter, RcTerm};
use crate::value::RcValue;

/// A local binding: its current value and its type.
#[derive(Clone, Debug)]
pub struct Typed {
    pub value: RcValue,
    pub ty: RcValue,
}

impl Typed {
    pub fn new(value: RcValue, ty: RcValue) -> Typed {
        Typed { value, ty }
    }
}

/// A function taking already-evaluated, final argument values and producing
/// a value directly, bypassing `eval` on a defined body. Used for built-in
/// operations (arithmetic, comparisons, and the like) that the elaborator's
/// prelude registers as [`Definition::Native`].
pub type NativeFn = Rc<dyn Fn(&[RcValue]) -> Result<RcValue>>;

/// A registered global definition.
#[derive(Clone)]
pub enum Definition {
    Function {
        params: Vec<Parameter>,
        result_type: RcTerm,
        body: RcTerm,
        /// Whether this definition may call itself; drives the
        /// self-call-freezing rule in `eval`'s `FunctionInvoke` case.
        recursive: bool,
    },
    Native {
        params: Vec<Parameter>,
        result_type: RcTerm,
        implementation: NativeFn,
    },
    /// An ad-hoc-polymorphic function: a named set of `Function`/`Native`
    /// candidates sharing arity, resolved by [`crate::overload`].
    Overloaded { candidates: Vec<String> },
    Inductive {
        params: Vec<Parameter>,
        result_type: RcTerm,
        constructors: Vec<String>,
    },
    Constructor {
        inductive: String,
        params: Vec<Parameter>,
    },
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Definition::Function { recursive, .. } => {
                f.debug_struct("Function").field("recursive", recursive).finish()
            }
            Definition::Native { .. } => f.debug_struct("Native").finish(),
            Definition::Overloaded { candidates } => {
                f.debug_struct("Overloaded").field("candidates", candidates).finish()
            }
            Definition::Inductive { constructors, .. } => f
                .debug_struct("Inductive")
                .field("constructors", constructors)
                .finish(),
            Definition::Constructor { inductive, .. } => {
                f.debug_struct("Constructor").field("inductive", inductive).finish()
            }
        }
    }
}

/// An RAII guard that decrements the shared recursion-depth counter when
/// dropped, however the enclosing call returns (including via `?`).
pub struct DepthGuard {
    depth: Rc<Cell<u32>>,
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        self.depth.set(self.depth.get() - 1);
    }
}

/// The typed environment threaded through `eval`/`infer`/`readBack`/`unify`.
#[derive(Clone, Debug)]
pub struct Env {
    locals: Vector<(Local, Typed)>,
    definitions: HashMap<String, Rc<Definition>>,
    current_definition: Option<String>,
    config: Rc<EvalConfig>,
    depth: Rc<Cell<u32>>,
}

impl Env {
    pub fn new(config: EvalConfig) -> Env {
        Env {
            locals: Vector::new(),
            definitions: HashMap::new(),
            current_definition: None,
            config: Rc::new(config),
            depth: Rc::new(Cell::new(0)),
        }
    }

    /// Extend with a local binding, scoped to whatever the caller does with
    /// the returned `Env`; the original `Env` (and anyone else holding it,
    /// e.g. a sibling closure) is untouched.
    pub fn extend_local(&self, ident: Local, value: RcValue, ty: RcValue) -> Env {
        let mut locals = self.locals.clone();
        locals.push_back((ident, Typed::new(value, ty)));
        Env {
            locals,
            ..self.clone()
        }
    }

    pub fn lookup_local(&self, ident: &Local) -> Option<&Typed> {
        self.locals
            .iter()
            .rev()
            .find(|(id, _)| id == ident)
            .map(|(_, typed)| typed)
    }

    /// Register a global definition, returning an extended environment.
    /// Definitions are otherwise read-only during evaluation, as the spec
    /// requires: they are populated once by the elaborator before the core
    /// runs.
    pub fn register_definition(&self, name: impl Into<String>, def: Definition) -> Env {
        let mut definitions = self.definitions.clone();
        definitions.insert(name.into(), Rc::new(def));
        Env {
            definitions,
            ..self.clone()
        }
    }

    pub fn lookup_definition(&self, name: &str) -> Option<Rc<Definition>> {
        self.definitions.get(name).cloned()
    }

    /// Mark `name` as the definition currently being evaluated, freezing its
    /// own recursive calls into neutrals.
    pub fn with_current_definition(&self, name: Option<String>) -> Env {
        Env {
            current_definition: name,
            ..self.clone()
        }
    }

    pub fn current_definition(&self) -> Option<&str> {
        self.current_definition.as_deref()
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Enter one more level of recursion, returning a guard that exits it on
    /// drop. Raises [`Error::DepthExceeded`] if the configured limit would be
    /// exceeded, implementing the spec's resource-limit note without a full
    /// trampoline rewrite of the recursive-descent algorithms.
    pub fn enter_scope(&self) -> Result<DepthGuard> {
        let depth = self.depth.get() + 1;
        if depth > self.config.max_depth {
            return Err(Error::DepthExceeded {
                max_depth: self.config.max_depth,
            });
        }
        self.depth.set(depth);
        Ok(DepthGuard {
            depth: self.depth.clone(),
        })
    }
}

//! Local identifiers and global references.
//!
//! A [`Local`] is compared by identity, never by name: two locals with the
//! same user-facing name but different identities are distinct variables.
//! This is what lets `eval`/`readBack` rename binders freely without ever
//! confusing one `x` for another.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// A local variable identifier.
///
/// `PartialEq`/`Hash` are derived from `id` alone; `name` is carried purely
/// for diagnostics and pretty-printing.
#[derive(Clone, Debug, Eq)]
pub struct Local {
    name: String,
    id: u64,
}

impl Local {
    /// Mint a fresh identifier with the given display name.
    ///
    /// Distinct calls, even with the same `name`, always produce distinct
    /// identities.
    pub fn fresh(name: impl Into<String>) -> Local {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        Local {
            name: name.into(),
            id,
        }
    }

    /// Mint a fresh identifier reusing another's display name.
    ///
    /// Used by `readBack` when it needs to produce a binder that prints the
    /// same as the one it is replacing, without aliasing its identity.
    pub fn rename(of: &Local) -> Local {
        Local::fresh(of.name.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl PartialEq for Local {
    fn eq(&self, other: &Local) -> bool {
        self.id == other.id
    }
}

impl std::hash::Hash for Local {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Local {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

/// Discriminates the species of global definition a [`Global`] resolves to.
///
/// Kept as a plain runtime tag (rather than a phantom type parameter on
/// `Global<K>`) since it exists solely to make lookups in the definition
/// table unambiguous and to drive a `debug_assert!` at resolution sites; it
/// carries no type-level invariant worth encoding in Rust's type system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    Function,
    Overloaded,
    Inductive,
    Constructor,
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DefinitionKind::Function => "function",
            DefinitionKind::Overloaded => "overloaded function",
            DefinitionKind::Inductive => "inductive type",
            DefinitionKind::Constructor => "constructor",
        };
        write!(f, "{}", s)
    }
}

/// A qualified reference to a global definition.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Global {
    pub name: String,
    pub kind: DefinitionKind,
}

impl Global {
    pub fn new(name: impl Into<String>, kind: DefinitionKind) -> Global {
        Global {
            name: name.into(),
            kind,
        }
    }
}

impl fmt::Display for Global {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_locals_are_never_equal() {
        let x1 = Local::fresh("x");
        let x2 = Local::fresh("x");
        assert_ne!(x1, x2, "same name, different identity");
    }

    #[test]
    fn rename_preserves_display_name_not_identity() {
        let x = Local::fresh("x");
        let x_renamed = Local::rename(&x);
        assert_eq!(x.name(), x_renamed.name());
        assert_ne!(x, x_renamed);
    }
}

//! Resource-limit configuration for the evaluator.
//!
//! The spec leaves recursion depth "bounded only by the host stack" and asks
//! implementations to "trampoline or bound it explicitly for adversarial
//! inputs". Full continuation-passing trampolining would be a disproportionate
//! rewrite of the straightforward recursive-descent algorithms the spec
//! describes, so instead every recursive entry point in `eval`/`infer`/
//! `readBack`/`unify` is guarded by a depth counter checked against
//! [`EvalConfig::max_depth`].

/// How aggressively `readBack` unfolds definitions it encounters.
///
/// Mirrors the `Unfold::{Never, Always}` distinction used by the wider
/// normalization-by-evaluation lineage this core descends from: a `Never`
/// read-back is useful for an elaborator that wants a shallow term for a
/// diagnostic without paying for (or exposing) a fully unfolded normal form.
/// The core itself only ever needs `Always` (that is what `normalize` means)
/// but exposes the choice since `readBack` is public API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unfold {
    Never,
    Always,
}

/// Tunable limits for a single `eval`/`infer` call tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvalConfig {
    /// Maximum recursion depth across `eval`, `infer`, `readBack`, and
    /// `unify` before `Error::DepthExceeded` is raised.
    pub max_depth: u32,
}

impl Default for EvalConfig {
    fn default() -> EvalConfig {
        EvalConfig { max_depth: 4_096 }
    }
}

impl EvalConfig {
    pub fn with_max_depth(max_depth: u32) -> EvalConfig {
        EvalConfig { max_depth }
    }
}

//! Errors raised by the core.
//!
//! Every fallible operation returns `Result<_, Error>`. Errors carry a
//! human-readable message (via `thiserror`) plus an optional opaque
//! [`Span`] handed in by the caller; the core never constructs a `Span` from
//! source text and never formats one beyond `Debug`; that remains the
//! elaborator's job.

use thiserror::Error;

/// An opaque source-span handle.
///
/// Wraps a `codespan::Span<usize>` (byte offsets into whatever source file
/// table the elaborator maintains) so the core can thread spans through
/// without knowing anything about source files, line numbers, or
/// diagnostics rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span(pub codespan::Span<usize>);

impl From<codespan::Span<usize>> for Span {
    fn from(span: codespan::Span<usize>) -> Span {
        Span(span)
    }
}

/// Errors the core can raise.
#[derive(Debug, Error)]
pub enum Error {
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: String,
        found: String,
        span: Option<Span>,
    },

    #[error("not a function: {found}")]
    NotAFunction { found: String, span: Option<Span> },

    #[error("not a record: {found}")]
    NotARecord { found: String, span: Option<Span> },

    #[error("not an inductive value: {found}")]
    NotAnInductive { found: String, span: Option<Span> },

    #[error("missing field: {field}")]
    MissingField {
        field: String,
        span: Option<Span>,
    },

    #[error("unbound variable: {name}")]
    UnboundVariable { name: String, span: Option<Span> },

    #[error("no overload of `{name}` matches the given arguments")]
    OverloadNoMatch { name: String, span: Option<Span> },

    #[error("ambiguous overload of `{name}`: multiple candidates remain equally specific")]
    OverloadAmbiguous { name: String, span: Option<Span> },

    #[error("overloaded definition `{name}` is ambiguous: its states could not be merged")]
    OverloadedDefinitionAmbiguous { name: String, span: Option<Span> },

    #[error("non-exhaustive match: no clause matched the scrutinees")]
    NonExhaustiveMatch { span: Option<Span> },

    #[error("match clauses disagree on type: {first} vs {other}")]
    ClauseTypeMismatch {
        first: String,
        other: String,
        span: Option<Span>,
    },

    /// A `Variable` whose identifier resolves to nothing in `locals` and is
    /// not registered as a neutral binding either. Unlike `UnboundVariable`
    /// (a name the elaborator could not resolve), this indicates a
    /// miscompiled term reaching the core, e.g. a binder substituted
    /// incorrectly upstream.
    #[error("internal error: unsubstituted local `{name}` escaped its binding scope")]
    UnsubstitutedLocal { name: String, span: Option<Span> },

    #[error("recursion depth exceeded ({max_depth}); the term may be non-terminating")]
    DepthExceeded { max_depth: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;

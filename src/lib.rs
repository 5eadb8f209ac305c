//! Semantic core of a dependently-typed functional language: terms, values,
//! evaluation by normalization-by-evaluation, bidirectional inference,
//! unification, pattern matching, and overload resolution for ad-hoc
//! polymorphism via overloaded-lambda "superpositions".
//!
//! This crate receives fully elaborated [`term::Term`]s and a populated
//! [`env::Env`]; it does not parse source and does not produce diagnostics
//! beyond a message plus an optional opaque [`error::Span`]. The surface
//! parser, elaborator, and module registry are external collaborators.

pub mod config;
pub mod env;
pub mod error;
pub mod eval;
pub mod finality;
pub mod ident;
pub mod infer;
pub mod literal;
pub mod overload;
pub mod pattern;
pub mod readback;
pub mod term;
pub mod unify;
pub mod value;

pub use config::{EvalConfig, Unfold};
pub use env::{Definition, Env, NativeFn, Typed};
pub use error::{Error, Result, Span};
pub use eval::eval;
pub use ident::{DefinitionKind, Global, Local};
pub use infer::{infer, infer_value};
pub use literal::{Literal, LiteralType};
pub use readback::{normalize, read_back};
pub use term::{Clause, OverloadedState, Parameter, Pattern, RcTerm, Term};
pub use unify::{subtype, unify};
pub use value::{Closure, Fields, Neutral, RcValue, Value, ValueState};

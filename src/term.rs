//! The term syntax handed to the core by the elaborator.
//!
//! Terms are immutable once produced; we share them behind `Rc` the way the
//! teacher shares `Rc<Term>` everywhere, so that a definition's body can be
//! referenced from many call sites without being deep-cloned.

use std::rc::Rc;

use crate::ident::{Global, Local};
use crate::literal::{Literal, LiteralType};

/// A shared, immutable term.
pub type RcTerm = Rc<Term>;

/// A lambda/Pi parameter: a binder paired with its (unevaluated) type.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    pub ident: Local,
    pub ty: RcTerm,
}

impl Parameter {
    pub fn new(ident: Local, ty: impl Into<RcTerm>) -> Parameter {
        Parameter {
            ident,
            ty: ty.into(),
        }
    }
}

/// One state of an [`Term::OverloadedPi`] / [`Term::OverloadedLambda`]
/// superposition: a parameter paired with the codomain/body that applies
/// when the argument matches that parameter's type.
#[derive(Clone, Debug, PartialEq)]
pub struct OverloadedState {
    pub param: Parameter,
    pub body: RcTerm,
}

/// A single `match` clause: patterns paired with a body that may reference
/// the patterns' bound variables.
#[derive(Clone, Debug, PartialEq)]
pub struct Clause {
    pub patterns: Vec<Pattern>,
    pub body: RcTerm,
}

/// A pattern, matched against a scrutinee value during `eval`/`infer` of a
/// [`Term::Match`].
#[derive(Clone, Debug, PartialEq)]
pub enum Pattern {
    Primitive(Literal),
    Bind(Local),
    Cons(Global, Vec<Pattern>),
    Record(Vec<(String, Pattern)>),
}

/// The core term language.
#[derive(Clone, Debug, PartialEq)]
pub enum Term {
    /// The sole type universe.
    Universe,
    Primitive(Literal),
    PrimitiveType(LiteralType),
    Variable(Local),

    /// Call to a named ordinary (non-overloaded) function.
    FunctionInvoke(Global, Vec<RcTerm>),
    /// Call to a named overloaded function; resolution is deferred to
    /// `eval`/`infer` time.
    OverloadInvoke(Global, Vec<RcTerm>),

    InductiveType(Global, Vec<RcTerm>),
    InductiveVariant(RcTerm, Global, Vec<RcTerm>),

    Match(Vec<RcTerm>, Vec<Clause>),

    Pi(Parameter, RcTerm),
    Sigma(Parameter, RcTerm),
    /// A superposition of Pi states sharing a head, collapsed by overload
    /// resolution at application time.
    OverloadedPi(Vec<OverloadedState>),
    /// A superposition of Lambda states sharing a head.
    OverloadedLambda(Vec<OverloadedState>),

    Lambda(Parameter, RcTerm),
    Apply(RcTerm, RcTerm),

    Record(Vec<(String, RcTerm)>),
    RecordType(Vec<(String, RcTerm)>),
    Projection(RcTerm, String),
}

impl Term {
    /// Wrap in an `Rc`, for terse construction at call sites.
    pub fn rc(self) -> RcTerm {
        Rc::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_equality_follows_identifier_identity() {
        let x = Local::fresh("x");
        let p1 = Parameter::new(x.clone(), Term::Universe.rc());
        let p2 = Parameter::new(x, Term::Universe.rc());
        assert_eq!(p1, p2);

        let y = Local::fresh("x");
        let p3 = Parameter::new(y, Term::Universe.rc());
        assert_ne!(p1, p3, "same name, fresh identity, still distinct");
    }
}

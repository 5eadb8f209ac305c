//! The semantic domain: values, neutrals, and closures.
//!
//! This is the `eval`-side mirror of [`crate::term::Term`]. Where a `Term`
//! is syntax the elaborator handed us, a `Value` is what `eval` produces:
//! ground data, or a closure capturing the environment it was built in, or a
//! [`Neutral`], a stuck computation retaining a head variable or global
//! call so it can be residualized back into a `Term` by `readBack`.

use std::rc::Rc;

use crate::env::Env;
use crate::error::Result;
use crate::ident::{Global, Local};
use crate::literal::{Literal, LiteralType};
use crate::term::{Pattern, RcTerm};

/// A shared, immutable value.
pub type RcValue = Rc<Value>;

/// A function/Pi/Sigma closure: a term paired with the environment it
/// closes over.
///
/// Two closures are never compared structurally; see [`crate::unify`],
/// which applies both to a fresh neutral variable and compares the results.
/// Each closure owns an immutable snapshot of the environment in force at
/// its creation (locals is a persistent `im::Vector`, definitions an `Rc`-
/// shared map), so later extensions to the defining scope never leak in.
#[derive(Clone, Debug)]
pub struct Closure {
    env: Env,
    param: Local,
    body: RcTerm,
}

impl Closure {
    pub fn new(env: Env, param: Local, body: RcTerm) -> Closure {
        Closure { env, param, body }
    }

    /// Apply this closure to an argument value.
    pub fn apply(&self, arg: RcValue, arg_ty: RcValue) -> Result<RcValue> {
        let env = self.env.extend_local(self.param.clone(), arg, arg_ty);
        crate::eval::eval(&self.body, &env)
    }

    /// The identifier the closure's body may reference; used by `readBack`
    /// and by overload-state merging, which needs to rebuild a closure
    /// keeping the same captured environment but a different body/param.
    pub fn param_hint(&self) -> &Local {
        &self.param
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn body(&self) -> &RcTerm {
        &self.body
    }
}

/// One state of an [`Value::OverloadedPi`] / [`Value::OverloadedLambda`]
/// superposition.
///
/// Per the spec's invariant, keys (`param_ty`) are compared up to
/// unification rather than syntactically, so states live in a flat `Vec`
/// rather than a hash map; see [`crate::overload`].
#[derive(Clone, Debug)]
pub struct ValueState {
    pub param_ty: RcValue,
    pub closure: Closure,
}

/// A record's fields, evaluated pointwise, in declaration order.
pub type Fields = Vec<(String, RcValue)>;

/// The semantic domain.
#[derive(Clone, Debug)]
pub enum Value {
    Universe,
    Primitive(Literal),
    PrimitiveType(LiteralType),

    Pi(RcValue, Closure),
    Sigma(RcValue, Closure),
    Lambda(RcValue, Closure),

    OverloadedPi(Vec<ValueState>),
    OverloadedLambda(Vec<ValueState>),

    InductiveType(Global, Vec<RcValue>),
    InductiveVariant(RcValue, Global, Vec<RcValue>),

    Record(Fields),
    RecordType(Fields),

    Neutral(Neutral),
}

impl Value {
    pub fn rc(self) -> RcValue {
        Rc::new(self)
    }

    pub fn neutral_var(id: Local) -> RcValue {
        Value::Neutral(Neutral::Variable(id)).rc()
    }

    /// A short, stable tag naming the value's head constructor; used in
    /// error messages and tracing spans, never in normal-form comparisons.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Universe => "Universe",
            Value::Primitive(_) => "Primitive",
            Value::PrimitiveType(_) => "PrimitiveType",
            Value::Pi(..) => "Pi",
            Value::Sigma(..) => "Sigma",
            Value::Lambda(..) => "Lambda",
            Value::OverloadedPi(_) => "OverloadedPi",
            Value::OverloadedLambda(_) => "OverloadedLambda",
            Value::InductiveType(..) => "InductiveType",
            Value::InductiveVariant(..) => "InductiveVariant",
            Value::Record(_) => "Record",
            Value::RecordType(_) => "RecordType",
            Value::Neutral(_) => "Neutral",
        }
    }
}

/// A residualized `match` clause: patterns paired with a pre-evaluated body.
///
/// Built when `eval` cannot decide a `Match` because some scrutinee is
/// neutral: the environment is extended with fresh neutral variables for
/// each pattern binder (typed by the inferred scrutinee type) and the body
/// is evaluated under those bindings, so the residual clause never needs to
/// re-enter `eval` on a raw term again.
#[derive(Clone, Debug)]
pub struct ClauseValue {
    pub patterns: Vec<Pattern>,
    pub body: RcValue,
}

/// A stuck computation.
#[derive(Clone, Debug)]
pub enum Neutral {
    Variable(Local),
    Apply(Box<Neutral>, RcValue),
    Projection(Box<Neutral>, String),
    Match(Vec<RcValue>, Vec<ClauseValue>),
    /// A call to a named function frozen because it is either the
    /// currently-evaluating recursive definition or because not all of its
    /// arguments are final (see [`crate::finality`]).
    FunctionInvoke(Global, Vec<RcValue>),
}

impl Neutral {
    pub fn rc(self) -> RcValue {
        Value::Neutral(self).rc()
    }
}

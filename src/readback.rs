//! Reification: turning a `Value` back into a `Term`, the structural
//! inverse of `eval` up to alpha-renaming.

use crate::config::Unfold;
use crate::env::Env;
use crate::error::Result;
use crate::ident::Local;
use crate::term::{Clause, OverloadedState, Parameter, RcTerm, Term};
use crate::value::{Closure, ClauseValue, Neutral, RcValue, Value, ValueState};

/// Reify a value as a term.
///
/// `unfold` is threaded through for API symmetry with the wider NbE lineage
/// this design descends from (glued values that can print either a bound
/// name or its fully unfolded definition). This representation has no glued
/// values: globals are only ever reached through `FunctionInvoke`/
/// `InductiveType`, never aliased through a local `Variable`, so `unfold`
/// has no observable effect on today's read-back; it stays part of the
/// signature because `readBack` is public API and future callers may grow a
/// glued representation that needs it.
pub fn read_back(value: &RcValue, env: &Env, unfold: Unfold) -> Result<RcTerm> {
    let _guard = env.enter_scope()?;

    match value.as_ref() {
        Value::Universe => Ok(Term::Universe.rc()),
        Value::Primitive(lit) => Ok(Term::Primitive(lit.clone()).rc()),
        Value::PrimitiveType(ty) => Ok(Term::PrimitiveType(*ty).rc()),

        Value::Pi(param_ty, closure) => {
            let (param, body) = read_back_closure(param_ty, closure, env, unfold)?;
            Ok(Term::Pi(param, body).rc())
        }
        Value::Sigma(param_ty, closure) => {
            let (param, body) = read_back_closure(param_ty, closure, env, unfold)?;
            Ok(Term::Sigma(param, body).rc())
        }
        Value::Lambda(param_ty, closure) => {
            let (param, body) = read_back_closure(param_ty, closure, env, unfold)?;
            Ok(Term::Lambda(param, body).rc())
        }

        Value::OverloadedPi(states) => {
            Ok(Term::OverloadedPi(read_back_states(states, env, unfold)?).rc())
        }
        Value::OverloadedLambda(states) => {
            Ok(Term::OverloadedLambda(read_back_states(states, env, unfold)?).rc())
        }

        Value::InductiveType(global, args) => {
            let args = args
                .iter()
                .map(|a| read_back(a, env, unfold))
                .collect::<Result<Vec<_>>>()?;
            Ok(Term::InductiveType(global.clone(), args).rc())
        }
        Value::InductiveVariant(inductive, cons, args) => {
            let inductive = read_back(inductive, env, unfold)?;
            let args = args
                .iter()
                .map(|a| read_back(a, env, unfold))
                .collect::<Result<Vec<_>>>()?;
            Ok(Term::InductiveVariant(inductive, cons.clone(), args).rc())
        }

        Value::Record(fields) => {
            let fields = fields
                .iter()
                .map(|(name, v)| Ok((name.clone(), read_back(v, env, unfold)?)))
                .collect::<Result<Vec<_>>>()?;
            Ok(Term::Record(fields).rc())
        }
        Value::RecordType(fields) => {
            let fields = fields
                .iter()
                .map(|(name, v)| Ok((name.clone(), read_back(v, env, unfold)?)))
                .collect::<Result<Vec<_>>>()?;
            Ok(Term::RecordType(fields).rc())
        }

        Value::Neutral(n) => read_back_neutral(n, env, unfold),
    }
}

/// The closure read-back helper (§4.6): pick a fresh name, apply the closure
/// to a neutral variable of that name, and reify both the parameter type and
/// the applied result.
fn read_back_closure(
    param_ty: &RcValue,
    closure: &Closure,
    env: &Env,
    unfold: Unfold,
) -> Result<(Parameter, RcTerm)> {
    let fresh = Local::rename(closure.param_hint());
    let param_term = read_back(param_ty, env, unfold)?;
    let applied = closure.apply(Value::neutral_var(fresh.clone()), param_ty.clone())?;
    let body_term = read_back(&applied, env, unfold)?;
    Ok((Parameter::new(fresh, param_term), body_term))
}

fn read_back_states(
    states: &[ValueState],
    env: &Env,
    unfold: Unfold,
) -> Result<Vec<OverloadedState>> {
    states
        .iter()
        .map(|state| {
            let (param, body) = read_back_closure(&state.param_ty, &state.closure, env, unfold)?;
            Ok(OverloadedState { param, body })
        })
        .collect()
}

fn read_back_neutral(neutral: &Neutral, env: &Env, unfold: Unfold) -> Result<RcTerm> {
    match neutral {
        Neutral::Variable(id) => Ok(Term::Variable(id.clone()).rc()),

        Neutral::Apply(head, arg) => {
            let head = read_back_neutral(head, env, unfold)?;
            let arg = read_back(arg, env, unfold)?;
            Ok(Term::Apply(head, arg).rc())
        }

        Neutral::Projection(head, field) => {
            let head = read_back_neutral(head, env, unfold)?;
            Ok(Term::Projection(head, field.clone()).rc())
        }

        Neutral::Match(scrutinees, clauses) => {
            let scrutinees = scrutinees
                .iter()
                .map(|s| read_back(s, env, unfold))
                .collect::<Result<Vec<_>>>()?;
            let clauses = clauses
                .iter()
                .map(|c| read_back_clause(c, env, unfold))
                .collect::<Result<Vec<_>>>()?;
            Ok(Term::Match(scrutinees, clauses).rc())
        }

        Neutral::FunctionInvoke(global, args) => {
            let args = args
                .iter()
                .map(|a| read_back(a, env, unfold))
                .collect::<Result<Vec<_>>>()?;
            Ok(Term::FunctionInvoke(global.clone(), args).rc())
        }
    }
}

fn read_back_clause(clause: &ClauseValue, env: &Env, unfold: Unfold) -> Result<Clause> {
    Ok(Clause {
        patterns: clause.patterns.clone(),
        body: read_back(&clause.body, env, unfold)?,
    })
}

/// `normalize(term, env) = readBack(eval(term, env), Unfold::Always)`.
pub fn normalize(term: &RcTerm, env: &Env) -> Result<RcTerm> {
    let value = crate::eval::eval(term, env)?;
    read_back(&value, env, Unfold::Always)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvalConfig;
    use crate::literal::Literal;

    #[test]
    fn primitive_round_trips() {
        let env = Env::new(EvalConfig::default());
        let v = Value::Primitive(Literal::Int(3)).rc();
        let t = read_back(&v, &env, Unfold::Always).unwrap();
        assert_eq!(*t, Term::Primitive(Literal::Int(3)));
    }

    #[test]
    fn lambda_reifies_with_a_fresh_binder() {
        let env = Env::new(EvalConfig::default());
        let x = Local::fresh("x");
        let closure = Closure::new(env.clone(), x.clone(), Term::Variable(x).rc());
        let v = Value::Lambda(Value::Universe.rc(), closure).rc();
        let t = read_back(&v, &env, Unfold::Always).unwrap();
        match t.as_ref() {
            Term::Lambda(param, body) => {
                assert_eq!(**body, Term::Variable(param.ident.clone()));
            }
            other => panic!("expected Lambda, got {other:?}"),
        }
    }
}

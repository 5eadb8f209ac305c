//! Structural equivalence with alpha-renaming and eta, compared directly on
//! values rather than via literal substitution into reified terms: a
//! binder's renaming is realized by applying both sides' closures to the
//! *same* fresh neutral variable and recursing, the standard NbE technique
//! for avoiding a capture-avoiding substitution pass.

use crate::env::Env;
use crate::error::Result;
use crate::ident::Local;
use crate::value::{Neutral, RcValue, Value, ValueState};

/// Structural equivalence of two values, up to alpha-renaming and eta.
pub fn unify(v1: &RcValue, v2: &RcValue, env: &Env) -> Result<bool> {
    let _guard = env.enter_scope()?;

    match (v1.as_ref(), v2.as_ref()) {
        (Value::Universe, Value::Universe) => Ok(true),
        (Value::Primitive(a), Value::Primitive(b)) => Ok(a == b),
        (Value::PrimitiveType(a), Value::PrimitiveType(b)) => Ok(a == b),

        (Value::Neutral(n1), Value::Neutral(n2)) => unify_neutral(n1, n2, env),

        (Value::Pi(pty1, c1), Value::Pi(pty2, c2)) => unify_binder(pty1, c1, pty2, c2, env),
        (Value::Sigma(pty1, c1), Value::Sigma(pty2, c2)) => unify_binder(pty1, c1, pty2, c2, env),
        (Value::Lambda(pty1, c1), Value::Lambda(pty2, c2)) => unify_binder(pty1, c1, pty2, c2, env),

        // Mixed case: one side is a lambda, the other an applicable
        // non-lambda (a neutral or an overloaded lambda), eta-expand by
        // comparing the lambda's body to the other side applied to the same
        // fresh variable.
        (Value::Lambda(pty, c), _) if is_applicable(v2) => {
            eta_expand(pty, c, v2, env)
        }
        (_, Value::Lambda(pty, c)) if is_applicable(v1) => {
            eta_expand(pty, c, v1, env)
        }

        (Value::InductiveType(g1, args1), Value::InductiveType(g2, args2)) => {
            Ok(g1 == g2 && unify_args(args1, args2, env)?)
        }
        (Value::InductiveVariant(ind1, c1, args1), Value::InductiveVariant(ind2, c2, args2)) => {
            Ok(c1 == c2 && unify(ind1, ind2, env)? && unify_args(args1, args2, env)?)
        }

        (Value::Record(f1), Value::Record(f2)) => unify_fields(f1, f2, env),
        (Value::RecordType(f1), Value::RecordType(f2)) => unify_fields(f1, f2, env),

        (Value::OverloadedPi(s1), Value::OverloadedPi(s2)) => unify_state_lists(s1, s2, env),
        (Value::OverloadedLambda(s1), Value::OverloadedLambda(s2)) => unify_state_lists(s1, s2, env),

        _ => Ok(false),
    }
}

fn is_applicable(v: &RcValue) -> bool {
    matches!(v.as_ref(), Value::Neutral(_) | Value::OverloadedLambda(_))
}

fn unify_binder(
    pty1: &RcValue,
    c1: &crate::value::Closure,
    pty2: &RcValue,
    c2: &crate::value::Closure,
    env: &Env,
) -> Result<bool> {
    if !unify(pty1, pty2, env)? {
        return Ok(false);
    }
    let fresh = Local::fresh(c1.param_hint().name());
    let arg = Value::neutral_var(fresh);
    let r1 = c1.apply(arg.clone(), pty1.clone())?;
    let r2 = c2.apply(arg, pty2.clone())?;
    unify(&r1, &r2, env)
}

fn eta_expand(
    pty: &RcValue,
    closure: &crate::value::Closure,
    other: &RcValue,
    env: &Env,
) -> Result<bool> {
    let fresh = Local::fresh(closure.param_hint().name());
    let arg = Value::neutral_var(fresh);
    let lhs = closure.apply(arg.clone(), pty.clone())?;
    let rhs = crate::eval::apply_value(other, arg, env)?;
    unify(&lhs, &rhs, env)
}

fn unify_args(a1: &[RcValue], a2: &[RcValue], env: &Env) -> Result<bool> {
    if a1.len() != a2.len() {
        return Ok(false);
    }
    for (x, y) in a1.iter().zip(a2) {
        if !unify(x, y, env)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn unify_fields(f1: &[(String, RcValue)], f2: &[(String, RcValue)], env: &Env) -> Result<bool> {
    if f1.len() != f2.len() {
        return Ok(false);
    }
    for (name, v1) in f1 {
        let Some((_, v2)) = f2.iter().find(|(n, _)| n == name) else {
            return Ok(false);
        };
        if !unify(v1, v2, env)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Compare two overloaded-state superpositions as maps whose keys are
/// compared up to unification: find a unifying bijection between the two
/// state lists and require every paired body to unify too. The invariant
/// that states within one superposition are pairwise non-unifiable (see
/// `crate::term`) makes this bijection unique when it exists.
fn unify_state_lists(s1: &[ValueState], s2: &[ValueState], env: &Env) -> Result<bool> {
    if s1.len() != s2.len() {
        return Ok(false);
    }
    let mut used = vec![false; s2.len()];
    for a in s1 {
        let mut found = false;
        for (j, b) in s2.iter().enumerate() {
            if used[j] {
                continue;
            }
            if unify(&a.param_ty, &b.param_ty, env)? {
                let fresh = Local::fresh(a.closure.param_hint().name());
                let arg = Value::neutral_var(fresh);
                let av = a.closure.apply(arg.clone(), a.param_ty.clone())?;
                let bv = b.closure.apply(arg, b.param_ty.clone())?;
                if unify(&av, &bv, env)? {
                    used[j] = true;
                    found = true;
                    break;
                }
            }
        }
        if !found {
            return Ok(false);
        }
    }
    Ok(true)
}

fn unify_neutral(n1: &Neutral, n2: &Neutral, env: &Env) -> Result<bool> {
    match (n1, n2) {
        (Neutral::Variable(a), Neutral::Variable(b)) => Ok(a == b),

        (Neutral::Apply(h1, a1), Neutral::Apply(h2, a2)) => {
            Ok(unify_neutral(h1, h2, env)? && unify(a1, a2, env)?)
        }

        (Neutral::Projection(h1, f1), Neutral::Projection(h2, f2)) => {
            Ok(f1 == f2 && unify_neutral(h1, h2, env)?)
        }

        (Neutral::FunctionInvoke(g1, args1), Neutral::FunctionInvoke(g2, args2)) => {
            Ok(g1 == g2 && unify_args(args1, args2, env)?)
        }

        (Neutral::Match(s1, c1), Neutral::Match(s2, c2)) => {
            if !unify_args(s1, s2, env)? || c1.len() != c2.len() {
                return Ok(false);
            }
            for (ca, cb) in c1.iter().zip(c2) {
                if ca.patterns != cb.patterns || !unify(&ca.body, &cb.body, env)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }

        _ => Ok(false),
    }
}

/// `subtype` is the same relation as `unify`: the source distinguishes the
/// two names for API clarity at call sites, but a future widening of `<:`
/// beyond `unify` has not materialized, so this stays a thin alias.
pub fn subtype(v1: &RcValue, v2: &RcValue, env: &Env) -> Result<bool> {
    unify(v1, v2, env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvalConfig;
    use crate::literal::Literal;
    use crate::value::Closure;

    #[test]
    fn primitives_unify_by_value() {
        let env = Env::new(EvalConfig::default());
        let a = Value::Primitive(Literal::Int(1)).rc();
        let b = Value::Primitive(Literal::Int(1)).rc();
        let c = Value::Primitive(Literal::Int(2)).rc();
        assert!(unify(&a, &b, &env).unwrap());
        assert!(!unify(&a, &c, &env).unwrap());
    }

    #[test]
    fn alpha_renamed_lambdas_unify() {
        let env = Env::new(EvalConfig::default());
        let x = Local::fresh("x");
        let y = Local::fresh("y");
        let lam_x = Value::Lambda(
            Value::Universe.rc(),
            Closure::new(env.clone(), x.clone(), crate::term::Term::Variable(x).rc()),
        )
        .rc();
        let lam_y = Value::Lambda(
            Value::Universe.rc(),
            Closure::new(env.clone(), y.clone(), crate::term::Term::Variable(y).rc()),
        )
        .rc();
        assert!(unify(&lam_x, &lam_y, &env).unwrap());
    }

    #[test]
    fn different_universes_of_primitive_types_do_not_unify() {
        let env = Env::new(EvalConfig::default());
        let a = Value::PrimitiveType(crate::literal::LiteralType::Int).rc();
        let b = Value::PrimitiveType(crate::literal::LiteralType::Bool).rc();
        assert!(!unify(&a, &b, &env).unwrap());
    }
}

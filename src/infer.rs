//! The bidirectional-style type inferencer: `Term → Value`, where a term's
//! type is itself represented as a `Value`.

use crate::config::Unfold;
use crate::env::{Definition, Env};
use crate::error::{Error, Result};
use crate::readback;
use crate::term::{RcTerm, Term};
use crate::value::{Closure, RcValue, Value, ValueState};

/// Infer the type of `term` under `env`.
pub fn infer(term: &RcTerm, env: &Env) -> Result<RcValue> {
    let _guard = env.enter_scope()?;
    let _span = tracing::trace_span!("infer", term = term_kind_name(term)).entered();

    match term.as_ref() {
        Term::Universe
        | Term::PrimitiveType(_)
        | Term::Pi(..)
        | Term::Sigma(..)
        | Term::OverloadedPi(_)
        | Term::RecordType(_) => Ok(Value::Universe.rc()),

        Term::Primitive(lit) => Ok(Value::PrimitiveType(lit.ty()).rc()),

        Term::Variable(id) => env
            .lookup_local(id)
            .map(|typed| typed.ty.clone())
            .ok_or_else(|| Error::UnboundVariable {
                name: id.name().to_string(),
                span: None,
            }),

        Term::FunctionInvoke(fn_ref, _) => {
            let def = env
                .lookup_definition(&fn_ref.name)
                .ok_or_else(|| Error::UnboundVariable {
                    name: fn_ref.name.clone(),
                    span: None,
                })?;
            let result_type = function_result_type(&def, &fn_ref.name)?;
            crate::eval::eval(&result_type, env)
        }

        Term::OverloadInvoke(fn_ref, args) => {
            let args_v = args
                .iter()
                .map(|a| crate::eval::eval(a, env))
                .collect::<Result<Vec<_>>>()?;
            let resolved = crate::overload::resolve_overload(&fn_ref.name, &args_v, env)?;
            let def = env
                .lookup_definition(&resolved)
                .ok_or_else(|| Error::UnboundVariable {
                    name: resolved.clone(),
                    span: None,
                })?;
            let params = function_params(&def, &resolved)?;
            let result_type = function_result_type(&def, &resolved)?;

            let mut bind_env = env.clone();
            for param in params {
                let param_ty = crate::eval::eval(&param.ty, &bind_env)?;
                let neutral = Value::neutral_var(param.ident.clone());
                bind_env = bind_env.extend_local(param.ident.clone(), neutral, param_ty);
            }
            crate::eval::eval(&result_type, &bind_env)
        }

        Term::InductiveType(ind_ref, _) => {
            let def = env
                .lookup_definition(&ind_ref.name)
                .ok_or_else(|| Error::UnboundVariable {
                    name: ind_ref.name.clone(),
                    span: None,
                })?;
            match def.as_ref() {
                Definition::Inductive { result_type, .. } => crate::eval::eval(result_type, env),
                _ => Err(Error::NotAnInductive {
                    found: ind_ref.name.clone(),
                    span: None,
                }),
            }
        }

        Term::InductiveVariant(inductive, _, _) => crate::eval::eval(inductive, env),

        Term::Match(scrutinees, clauses) => {
            let scrutinee_tys = scrutinees
                .iter()
                .map(|s| infer(s, env))
                .collect::<Result<Vec<_>>>()?;

            let mut result_ty: Option<RcValue> = None;
            for clause in clauses {
                let mut clause_env = env.clone();
                for (pattern, scrutinee_ty) in clause.patterns.iter().zip(&scrutinee_tys) {
                    for (ident, ty) in crate::pattern::bind_types_for_pattern(pattern, scrutinee_ty, env)? {
                        let neutral = Value::neutral_var(ident.clone());
                        clause_env = clause_env.extend_local(ident, neutral, ty);
                    }
                }
                let body_ty = infer(&clause.body, &clause_env)?;
                match &result_ty {
                    None => result_ty = Some(body_ty),
                    Some(first) => {
                        if !crate::unify::unify(first, &body_ty, env)? {
                            return Err(Error::ClauseTypeMismatch {
                                first: format!("{first:?}"),
                                other: format!("{body_ty:?}"),
                                span: None,
                            });
                        }
                    }
                }
            }
            result_ty.ok_or(Error::NonExhaustiveMatch { span: None })
        }

        Term::Record(fields) => {
            let fields = fields
                .iter()
                .map(|(name, t)| Ok((name.clone(), infer(t, env)?)))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::RecordType(fields).rc())
        }

        Term::Apply(f, arg) => {
            let f_ty = infer(f, env)?;
            match f_ty.as_ref() {
                Value::Pi(param_ty, codomain) => {
                    let arg_ty = infer(arg, env)?;
                    if !crate::unify::unify(param_ty, &arg_ty, env)? {
                        return Err(Error::TypeMismatch {
                            expected: format!("{param_ty:?}"),
                            found: format!("{arg_ty:?}"),
                            span: None,
                        });
                    }
                    let arg_v = crate::eval::eval(arg, env)?;
                    codomain.apply(arg_v, param_ty.clone())
                }

                Value::OverloadedPi(states) => {
                    let arg_ty = infer(arg, env)?;
                    let candidates = crate::overload::select_matching_states(states, &arg_ty, env)?;
                    if candidates.is_empty() {
                        return Err(Error::OverloadNoMatch {
                            name: "<overloaded pi>".to_string(),
                            span: None,
                        });
                    }
                    let minimal = crate::overload::minimal_states(&candidates, states, env)?;
                    match minimal.len() {
                        1 => {
                            let state = &states[minimal[0]];
                            let arg_v = crate::eval::eval(arg, env)?;
                            state.closure.apply(arg_v, state.param_ty.clone())
                        }
                        _ => Err(Error::OverloadAmbiguous {
                            name: "<overloaded pi>".to_string(),
                            span: None,
                        }),
                    }
                }

                other => Err(Error::NotAFunction {
                    found: other.kind_name().to_string(),
                    span: None,
                }),
            }
        }

        Term::Lambda(param, body) => {
            let (param_ty, closure) = infer_binder(param, body, env)?;
            Ok(Value::Pi(param_ty, closure).rc())
        }

        Term::OverloadedLambda(states) => {
            let value_states = states
                .iter()
                .map(|state| {
                    let (param_ty, closure) = infer_binder(&state.param, &state.body, env)?;
                    Ok(ValueState { param_ty, closure })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::OverloadedPi(merge_overloaded_pi_states(value_states, env)?).rc())
        }

        Term::Projection(r, field) => {
            let r_ty = infer(r, env)?;
            match r_ty.as_ref() {
                Value::RecordType(fields) => fields
                    .iter()
                    .find(|(name, _)| name == field)
                    .map(|(_, ty)| ty.clone())
                    .ok_or_else(|| Error::MissingField {
                        field: field.clone(),
                        span: None,
                    }),
                other => Err(Error::NotARecord {
                    found: other.kind_name().to_string(),
                    span: None,
                }),
            }
        }
    }
}

/// Infer a `Lambda`/`OverloadedLambda` state's Pi codomain. `infer` and
/// `eval` are different functions, so the codomain closure can't just wrap
/// the body term the way `eval`'s Pi/Lambda cases do (that would evaluate
/// the body, not infer its type). Instead: infer the body's type once at a
/// generic point (the parameter bound to a neutral standing for an
/// arbitrary well-typed argument), read that type back into a term, and
/// build an ordinary closure over the read-back term. Applying the rebuilt
/// closure to any concrete argument value substitutes for the neutral via
/// ordinary `eval`, correctly generalizing the dependent case (see the
/// dependent-application property in the test suite).
fn infer_binder(
    param: &crate::term::Parameter,
    body: &RcTerm,
    env: &Env,
) -> Result<(RcValue, Closure)> {
    let param_ty = crate::eval::eval(&param.ty, env)?;
    let neutral = Value::neutral_var(param.ident.clone());
    let body_env = env.extend_local(param.ident.clone(), neutral, param_ty.clone());
    let body_ty = infer(body, &body_env)?;
    let body_ty_term = readback::read_back(&body_ty, env, Unfold::Never)?;
    let closure = Closure::new(env.clone(), param.ident.clone(), body_ty_term);
    Ok((param_ty, closure))
}

/// Run the same unifiable-key merge `eval` applies to `OverloadedPi`
/// construction over inferred codomains, defensively: a well-formed
/// `OverloadedLambda` already has pairwise non-unifiable states, so in
/// practice every group is a singleton and this is a no-op pass-through.
fn merge_overloaded_pi_states(states: Vec<ValueState>, env: &Env) -> Result<Vec<ValueState>> {
    crate::eval::merge_pi_states(states, env)
}

fn function_result_type(def: &Definition, name: &str) -> Result<RcTerm> {
    match def {
        Definition::Function { result_type, .. } => Ok(result_type.clone()),
        Definition::Native { result_type, .. } => Ok(result_type.clone()),
        _ => Err(Error::NotAFunction {
            found: name.to_string(),
            span: None,
        }),
    }
}

fn function_params(def: &Definition, name: &str) -> Result<Vec<crate::term::Parameter>> {
    match def {
        Definition::Function { params, .. } => Ok(params.clone()),
        Definition::Native { params, .. } => Ok(params.clone()),
        _ => Err(Error::NotAFunction {
            found: name.to_string(),
            span: None,
        }),
    }
}

/// Infer the type of an already-evaluated value by reifying it and
/// inferring the reified term. Used wherever a caller has a `Value` in hand
/// rather than the `Term` it came from: pattern binders, overload-argument
/// typing, and eta-expansion's argument-type lookups.
pub fn infer_value(value: &RcValue, env: &Env) -> Result<RcValue> {
    let term = readback::read_back(value, env, Unfold::Always)?;
    infer(&term, env)
}

fn term_kind_name(term: &Term) -> &'static str {
    match term {
        Term::Universe => "Universe",
        Term::Primitive(_) => "Primitive",
        Term::PrimitiveType(_) => "PrimitiveType",
        Term::Variable(_) => "Variable",
        Term::FunctionInvoke(..) => "FunctionInvoke",
        Term::OverloadInvoke(..) => "OverloadInvoke",
        Term::InductiveType(..) => "InductiveType",
        Term::InductiveVariant(..) => "InductiveVariant",
        Term::Match(..) => "Match",
        Term::Pi(..) => "Pi",
        Term::Sigma(..) => "Sigma",
        Term::OverloadedPi(_) => "OverloadedPi",
        Term::OverloadedLambda(_) => "OverloadedLambda",
        Term::Lambda(..) => "Lambda",
        Term::Apply(..) => "Apply",
        Term::Record(_) => "Record",
        Term::RecordType(_) => "RecordType",
        Term::Projection(..) => "Projection",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvalConfig;
    use crate::ident::Local;
    use crate::literal::{Literal, LiteralType};

    #[test]
    fn identity_on_nat_infers_to_primitive_type_nat() {
        let env = Env::new(EvalConfig::default());
        let x = Local::fresh("x");
        let id = Term::Lambda(
            crate::term::Parameter::new(x.clone(), Term::PrimitiveType(LiteralType::Int).rc()),
            Term::Variable(x).rc(),
        )
        .rc();
        let three = Term::Primitive(Literal::Int(3)).rc();
        let applied = Term::Apply(id, three).rc();

        let ty = infer(&applied, &env).unwrap();
        assert!(matches!(ty.as_ref(), Value::PrimitiveType(LiteralType::Int)));
    }

    #[test]
    fn projection_of_an_absent_field_errors() {
        let env = Env::new(EvalConfig::default());
        let record = Term::Record(vec![("a".to_string(), Term::Primitive(Literal::Int(1)).rc())]).rc();
        let proj = Term::Projection(record, "c".to_string()).rc();
        assert!(matches!(infer(&proj, &env), Err(Error::MissingField { .. })));
    }

    #[test]
    fn unbound_variable_is_an_inference_error() {
        let env = Env::new(EvalConfig::default());
        let x = Local::fresh("x");
        assert!(matches!(
            infer(&Term::Variable(x).rc(), &env),
            Err(Error::UnboundVariable { .. })
        ));
    }
}

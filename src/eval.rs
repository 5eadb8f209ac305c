//! The evaluator: `Term → Value` under an environment, the heart of
//! normalization-by-evaluation.

use crate::config::Unfold;
use crate::env::{Definition, Env};
use crate::error::{Error, Result};
use crate::finality::{self, Bound};
use crate::ident::{Global, Local};
use crate::readback;
use crate::term::{OverloadedState, RcTerm, Term};
use crate::value::{Closure, ClauseValue, Neutral, RcValue, Value, ValueState};

/// Evaluate a term to a value under `env`.
pub fn eval(term: &RcTerm, env: &Env) -> Result<RcValue> {
    let _guard = env.enter_scope()?;
    let _span = tracing::trace_span!("eval", term = term_kind_name(term)).entered();

    match term.as_ref() {
        Term::Universe => Ok(Value::Universe.rc()),
        Term::Primitive(lit) => Ok(Value::Primitive(lit.clone()).rc()),
        Term::PrimitiveType(ty) => Ok(Value::PrimitiveType(*ty).rc()),

        Term::Variable(id) => env
            .lookup_local(id)
            .map(|typed| typed.value.clone())
            .ok_or_else(|| Error::UnsubstitutedLocal {
                name: id.name().to_string(),
                span: None,
            }),

        Term::Pi(param, codomain) => {
            let param_ty = eval(&param.ty, env)?;
            let closure = Closure::new(env.clone(), param.ident.clone(), codomain.clone());
            Ok(Value::Pi(param_ty, closure).rc())
        }
        Term::Sigma(param, codomain) => {
            let param_ty = eval(&param.ty, env)?;
            let closure = Closure::new(env.clone(), param.ident.clone(), codomain.clone());
            Ok(Value::Sigma(param_ty, closure).rc())
        }
        Term::Lambda(param, body) => {
            let param_ty = eval(&param.ty, env)?;
            let closure = Closure::new(env.clone(), param.ident.clone(), body.clone());
            Ok(Value::Lambda(param_ty, closure).rc())
        }

        Term::OverloadedPi(states) => {
            let states = eval_states(states, env)?;
            Ok(Value::OverloadedPi(merge_pi_states(states, env)?).rc())
        }
        Term::OverloadedLambda(states) => {
            let states = eval_states(states, env)?;
            Ok(Value::OverloadedLambda(merge_lambda_states(states, env)?).rc())
        }

        Term::Record(fields) => {
            let fields = fields
                .iter()
                .map(|(name, t)| Ok((name.clone(), eval(t, env)?)))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::Record(fields).rc())
        }
        Term::RecordType(fields) => {
            let fields = fields
                .iter()
                .map(|(name, t)| Ok((name.clone(), eval(t, env)?)))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::RecordType(fields).rc())
        }

        Term::InductiveType(global, args) => {
            let args = args.iter().map(|a| eval(a, env)).collect::<Result<Vec<_>>>()?;
            Ok(Value::InductiveType(global.clone(), args).rc())
        }
        Term::InductiveVariant(inductive, cons, args) => {
            let inductive = eval(inductive, env)?;
            match inductive.as_ref() {
                Value::InductiveType(..) | Value::Neutral(_) => {}
                other => {
                    return Err(Error::NotAnInductive {
                        found: other.kind_name().to_string(),
                        span: None,
                    })
                }
            }
            let args = args.iter().map(|a| eval(a, env)).collect::<Result<Vec<_>>>()?;
            Ok(Value::InductiveVariant(inductive, cons.clone(), args).rc())
        }

        Term::Projection(record, field) => {
            let record = eval(record, env)?;
            match record.as_ref() {
                Value::Record(fields) => fields
                    .iter()
                    .find(|(name, _)| name == field)
                    .map(|(_, v)| v.clone())
                    .ok_or_else(|| Error::MissingField {
                        field: field.clone(),
                        span: None,
                    }),
                Value::Neutral(n) => Ok(Neutral::Projection(Box::new(n.clone()), field.clone()).rc()),
                other => Err(Error::NotARecord {
                    found: other.kind_name().to_string(),
                    span: None,
                }),
            }
        }

        Term::Apply(f, arg) => {
            let fv = eval(f, env)?;
            let av = eval(arg, env)?;
            apply_value(&fv, av, env)
        }

        Term::FunctionInvoke(fn_ref, args) => invoke_function(fn_ref, args, env),

        Term::OverloadInvoke(fn_ref, args) => {
            let args_v = args.iter().map(|a| eval(a, env)).collect::<Result<Vec<_>>>()?;
            let resolved = crate::overload::resolve_overload(&fn_ref.name, &args_v, env)?;
            let resolved_ref = Global::new(resolved, crate::ident::DefinitionKind::Function);
            invoke_function(&resolved_ref, args, env)
        }

        Term::Match(scrutinees, clauses) => {
            let scrutinees_v = scrutinees.iter().map(|s| eval(s, env)).collect::<Result<Vec<_>>>()?;
            match crate::pattern::try_match(&scrutinees_v, clauses, env)? {
                crate::pattern::MatchOutcome::Matched(bindings, clause) => {
                    let mut call_env = env.clone();
                    for binding in bindings {
                        call_env = call_env.extend_local(binding.ident, binding.value, binding.ty);
                    }
                    eval(&clause.body, &call_env)
                }
                crate::pattern::MatchOutcome::NoClauseMatched { any_undecidable } => {
                    if !any_undecidable && all_values_final(&scrutinees_v, env)? {
                        return Err(Error::NonExhaustiveMatch { span: None });
                    }
                    residualize_match(scrutinees_v, clauses, env)
                }
            }
        }
    }
}

/// Apply an already-evaluated function value to an already-evaluated
/// argument. Shared between `Apply`'s term-level case, eta-expansion in
/// `unify`, and overload-state merging (all of which need to apply a value
/// without going through a `Term::Apply` node).
pub(crate) fn apply_value(fn_value: &RcValue, arg: RcValue, env: &Env) -> Result<RcValue> {
    match fn_value.as_ref() {
        Value::Lambda(param_ty, closure) => {
            let arg_ty = crate::infer::infer_value(&arg, env)?;
            if !crate::unify::subtype(param_ty, &arg_ty, env)? {
                return Err(Error::TypeMismatch {
                    expected: format!("{param_ty:?}"),
                    found: format!("{arg_ty:?}"),
                    span: None,
                });
            }
            closure.apply(arg, param_ty.clone())
        }

        Value::OverloadedLambda(states) => {
            let arg_ty = crate::infer::infer_value(&arg, env)?;
            let matching = crate::overload::select_matching_states(states, &arg_ty, env)?;
            match matching.len() {
                0 => Err(Error::OverloadNoMatch {
                    name: "<overloaded lambda>".to_string(),
                    span: None,
                }),
                1 => {
                    let state = &states[matching[0]];
                    state.closure.apply(arg, state.param_ty.clone())
                }
                _ => {
                    let mut collected = Vec::new();
                    for idx in matching {
                        let state = &states[idx];
                        let result = state.closure.apply(arg.clone(), state.param_ty.clone())?;
                        match result.as_ref() {
                            Value::OverloadedLambda(inner) => collected.extend(inner.clone()),
                            _ => {
                                return Err(Error::OverloadedDefinitionAmbiguous {
                                    name: "<overloaded lambda>".to_string(),
                                    span: None,
                                })
                            }
                        }
                    }
                    Ok(Value::OverloadedLambda(merge_lambda_states(collected, env)?).rc())
                }
            }
        }

        Value::Neutral(n) => Ok(Neutral::Apply(Box::new(n.clone()), arg).rc()),

        other => Err(Error::NotAFunction {
            found: other.kind_name().to_string(),
            span: None,
        }),
    }
}

fn invoke_function(fn_ref: &Global, args: &[RcTerm], env: &Env) -> Result<RcValue> {
    if env.current_definition() == Some(fn_ref.name.as_str()) {
        let args_v = args.iter().map(|a| eval(a, env)).collect::<Result<Vec<_>>>()?;
        return Ok(Neutral::FunctionInvoke(fn_ref.clone(), args_v).rc());
    }

    let args_v = args.iter().map(|a| eval(a, env)).collect::<Result<Vec<_>>>()?;
    let def = env
        .lookup_definition(&fn_ref.name)
        .ok_or_else(|| Error::UnboundVariable {
            name: fn_ref.name.clone(),
            span: None,
        })?;

    match def.as_ref() {
        Definition::Function {
            params,
            body,
            recursive,
            ..
        } => {
            if *recursive && !all_values_final(&args_v, env)? {
                return Ok(Neutral::FunctionInvoke(fn_ref.clone(), args_v).rc());
            }
            let mut call_env = env.clone();
            for (param, arg_v) in params.iter().zip(&args_v) {
                let param_ty = eval(&param.ty, &call_env)?;
                call_env = call_env.extend_local(param.ident.clone(), arg_v.clone(), param_ty);
            }
            let call_env = call_env.with_current_definition(Some(fn_ref.name.clone()));
            eval(body, &call_env)
        }

        Definition::Native { implementation, .. } => {
            if all_values_final(&args_v, env)? {
                implementation(&args_v)
            } else {
                Ok(Neutral::FunctionInvoke(fn_ref.clone(), args_v).rc())
            }
        }

        _ => Err(Error::NotAFunction {
            found: fn_ref.name.clone(),
            span: None,
        }),
    }
}

fn residualize_match(scrutinees_v: Vec<RcValue>, clauses: &[crate::term::Clause], env: &Env) -> Result<RcValue> {
    let scrutinee_tys = scrutinees_v
        .iter()
        .map(|s| crate::infer::infer_value(s, env))
        .collect::<Result<Vec<_>>>()?;

    let mut clause_values = Vec::with_capacity(clauses.len());
    for clause in clauses {
        let mut binder_env = env.clone();
        for (pattern, scrutinee_ty) in clause.patterns.iter().zip(&scrutinee_tys) {
            for (ident, ty) in crate::pattern::bind_types_for_pattern(pattern, scrutinee_ty, env)? {
                let neutral = Value::neutral_var(ident.clone());
                binder_env = binder_env.extend_local(ident, neutral, ty);
            }
        }
        let body = eval(&clause.body, &binder_env)?;
        clause_values.push(ClauseValue {
            patterns: clause.patterns.clone(),
            body,
        });
    }

    Ok(Neutral::Match(scrutinees_v, clause_values).rc())
}

fn eval_states(states: &[OverloadedState], env: &Env) -> Result<Vec<ValueState>> {
    states
        .iter()
        .map(|state| {
            let param_ty = eval(&state.param.ty, env)?;
            let closure = Closure::new(env.clone(), state.param.ident.clone(), state.body.clone());
            Ok(ValueState { param_ty, closure })
        })
        .collect()
}

/// Group states by unifiable parameter type and, within a group larger than
/// one, require the codomain values to unify directly: a type-level
/// superposition only makes sense if every state sharing a key denotes the
/// same codomain.
pub(crate) fn merge_pi_states(states: Vec<ValueState>, env: &Env) -> Result<Vec<ValueState>> {
    let groups = group_by_unifiable_param(states, env)?;
    let mut merged = Vec::with_capacity(groups.len());
    for group in groups {
        if group.len() == 1 {
            merged.push(group.into_iter().next().unwrap());
            continue;
        }
        let param_ty = group[0].param_ty.clone();
        let fresh = Local::fresh(group[0].closure.param_hint().name());
        let arg = Value::neutral_var(fresh);
        let first = group[0].closure.apply(arg.clone(), param_ty.clone())?;
        for other in &group[1..] {
            let applied = other.closure.apply(arg.clone(), param_ty.clone())?;
            if !crate::unify::unify(&first, &applied, env)? {
                return Err(Error::OverloadedDefinitionAmbiguous {
                    name: "<overloaded pi>".to_string(),
                    span: None,
                });
            }
        }
        merged.push(group.into_iter().next().unwrap());
    }
    Ok(merged)
}

/// Group states by unifiable parameter type and, within a group larger than
/// one, merge their bodies recursively per §4.1: each body must itself be
/// overloadable (a `Lambda` or `OverloadedLambda`), and the merge is
/// realized by applying every state's closure to one shared fresh variable,
/// recursively merging the resulting states, and rebuilding a single
/// closure over the read-back of the merged result (the same technique the
/// closure read-back helper uses).
fn merge_lambda_states(states: Vec<ValueState>, env: &Env) -> Result<Vec<ValueState>> {
    let groups = group_by_unifiable_param(states, env)?;
    let mut merged = Vec::with_capacity(groups.len());
    for group in groups {
        if group.len() == 1 {
            merged.push(group.into_iter().next().unwrap());
            continue;
        }

        let param_ty = group[0].param_ty.clone();
        let fresh = Local::fresh(group[0].closure.param_hint().name());
        let arg = Value::neutral_var(fresh.clone());

        let mut inner_states = Vec::new();
        for state in &group {
            let applied = state.closure.apply(arg.clone(), param_ty.clone())?;
            match applied.as_ref() {
                Value::Lambda(pty, c) => inner_states.push(ValueState {
                    param_ty: pty.clone(),
                    closure: c.clone(),
                }),
                Value::OverloadedLambda(inner) => inner_states.extend(inner.clone()),
                _ => {
                    return Err(Error::OverloadedDefinitionAmbiguous {
                        name: "<overloaded lambda>".to_string(),
                        span: None,
                    })
                }
            }
        }

        let merged_inner = merge_lambda_states(inner_states, env)?;
        let merged_value = if merged_inner.len() == 1 {
            let state = merged_inner.into_iter().next().unwrap();
            Value::Lambda(state.param_ty, state.closure)
        } else {
            Value::OverloadedLambda(merged_inner)
        }
        .rc();

        let body_term = readback::read_back(&merged_value, env, Unfold::Never)?;
        let closure = Closure::new(env.clone(), fresh, body_term);
        merged.push(ValueState { param_ty, closure });
    }
    Ok(merged)
}

fn group_by_unifiable_param(states: Vec<ValueState>, env: &Env) -> Result<Vec<Vec<ValueState>>> {
    let mut groups: Vec<Vec<ValueState>> = Vec::new();
    'states: for state in states {
        for group in groups.iter_mut() {
            if crate::unify::unify(&group[0].param_ty, &state.param_ty, env)? {
                group.push(state);
                continue 'states;
            }
        }
        groups.push(vec![state]);
    }
    Ok(groups)
}

fn all_values_final(values: &[RcValue], env: &Env) -> Result<bool> {
    for value in values {
        let term = readback::read_back(value, env, Unfold::Never)?;
        if !finality::is_final(&term, &Bound::new()) {
            return Ok(false);
        }
    }
    Ok(true)
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
    use crate::literal::{Literal, LiteralType};

    #[test]
    fn identity_on_a_literal_evaluates_to_the_literal() {
        let env = Env::new(EvalConfig::default());
        let x = Local::fresh("x");
        let id = Term::Lambda(
            crate::term::Parameter::new(x.clone(), Term::PrimitiveType(LiteralType::Int).rc()),
            Term::Variable(x).rc(),
        )
        .rc();
        let three = Term::Primitive(Literal::Int(3)).rc();
        let applied = Term::Apply(id, three).rc();

        let result = eval(&applied, &env).unwrap();
        assert!(matches!(result.as_ref(), Value::Primitive(Literal::Int(3))));
    }

    #[test]
    fn record_projection_reads_the_named_field() {
        let env = Env::new(EvalConfig::default());
        let record = Term::Record(vec![
            ("a".to_string(), Term::Primitive(Literal::Int(1)).rc()),
            ("b".to_string(), Term::Primitive(Literal::Int(2)).rc()),
        ])
        .rc();
        let proj = Term::Projection(record, "a".to_string()).rc();
        let result = eval(&proj, &env).unwrap();
        assert!(matches!(result.as_ref(), Value::Primitive(Literal::Int(1))));
    }

    #[test]
    fn missing_field_projection_errors() {
        let env = Env::new(EvalConfig::default());
        let record = Term::Record(vec![("a".to_string(), Term::Primitive(Literal::Int(1)).rc())]).rc();
        let proj = Term::Projection(record, "c".to_string()).rc();
        assert!(matches!(eval(&proj, &env), Err(Error::MissingField { .. })));
    }

    #[test]
    fn self_recursive_call_freezes_into_a_neutral() {
        let env = Env::new(EvalConfig::default());
        let n = Local::fresh("n");
        let fn_ref = Global::new("loop", crate::ident::DefinitionKind::Function);
        let body = Term::FunctionInvoke(fn_ref.clone(), vec![Term::Variable(n.clone()).rc()]).rc();
        let def = Definition::Function {
            params: vec![crate::term::Parameter::new(
                n.clone(),
                Term::PrimitiveType(LiteralType::Int).rc(),
            )],
            result_type: Term::PrimitiveType(LiteralType::Int).rc(),
            body,
            recursive: true,
        };
        let env = env.register_definition("loop", def);

        let call = Term::FunctionInvoke(fn_ref, vec![Term::Primitive(Literal::Int(0)).rc()]).rc();
        let result = eval(&call, &env).unwrap();
        assert!(matches!(
            result.as_ref(),
            Value::Neutral(Neutral::FunctionInvoke(..))
        ));
    }
}

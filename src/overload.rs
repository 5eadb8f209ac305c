//! Overload resolution: selecting the most specific candidate of a named
//! `Overloaded` definition, and the narrower state-selection rules used when
//! `eval`/`infer` apply an `OverloadedLambda`/`OverloadedPi` value directly.

use crate::env::{Definition, Env};
use crate::error::{Error, Result};
use crate::value::{RcValue, ValueState};

#[derive(Clone)]
struct Candidate {
    name: String,
    param_tys: Vec<RcValue>,
}

/// Resolve a call to a named overloaded function against its argument
/// values, per §4.7:
///
/// 1. filter to candidates of matching arity whose every parameter type is a
///    supertype of the corresponding argument's inferred type;
/// 2. iteratively drop, position by position, any candidate dominated by a
///    strictly more specific rival at that position;
/// 3. the run succeeds only when exactly one candidate survives.
pub fn resolve_overload(name: &str, args: &[RcValue], env: &Env) -> Result<String> {
    let def = env
        .lookup_definition(name)
        .ok_or_else(|| Error::UnboundVariable {
            name: name.to_string(),
            span: None,
        })?;
    let Definition::Overloaded { candidates } = def.as_ref() else {
        return Err(Error::UnboundVariable {
            name: name.to_string(),
            span: None,
        });
    };

    let mut pool = Vec::new();
    for cname in candidates {
        let Some(cdef) = env.lookup_definition(cname) else {
            continue;
        };
        let params = match cdef.as_ref() {
            Definition::Function { params, .. } => params,
            Definition::Native { params, .. } => params,
            _ => continue,
        };
        if params.len() != args.len() {
            continue;
        }
        let param_tys = params
            .iter()
            .map(|p| crate::eval::eval(&p.ty, env))
            .collect::<Result<Vec<_>>>()?;

        let mut matches = true;
        for (pty, arg) in param_tys.iter().zip(args) {
            let arg_ty = crate::infer::infer_value(arg, env)?;
            if !crate::unify::subtype(pty, &arg_ty, env)? {
                matches = false;
                break;
            }
        }
        if matches {
            pool.push(Candidate {
                name: cname.clone(),
                param_tys,
            });
        }
    }

    if pool.is_empty() {
        return Err(Error::OverloadNoMatch {
            name: name.to_string(),
            span: None,
        });
    }

    for position in 0..args.len() {
        if pool.len() <= 1 {
            break;
        }
        let mut retained = Vec::with_capacity(pool.len());
        for (i, candidate) in pool.iter().enumerate() {
            let mut dominated = false;
            for (j, other) in pool.iter().enumerate() {
                if i == j {
                    continue;
                }
                let c_sub_other =
                    crate::unify::subtype(&candidate.param_tys[position], &other.param_tys[position], env)?;
                let other_sub_c =
                    crate::unify::subtype(&other.param_tys[position], &candidate.param_tys[position], env)?;
                if !c_sub_other && other_sub_c {
                    dominated = true;
                    break;
                }
            }
            if !dominated {
                retained.push(candidate.clone());
            }
        }
        pool = retained;
    }

    match pool.len() {
        1 => Ok(pool.into_iter().next().unwrap().name),
        _ => Err(Error::OverloadAmbiguous {
            name: name.to_string(),
            span: None,
        }),
    }
}

/// States of a superposition whose parameter type is a supertype of
/// `arg_ty`, the candidate set consulted when applying an
/// `OverloadedLambda`/`OverloadedPi` value directly (§4.1, §4.2).
pub fn select_matching_states(states: &[ValueState], arg_ty: &RcValue, env: &Env) -> Result<Vec<usize>> {
    let mut out = Vec::new();
    for (i, state) in states.iter().enumerate() {
        if crate::unify::subtype(&state.param_ty, arg_ty, env)? {
            out.push(i);
        }
    }
    Ok(out)
}

/// Of a candidate set of state indices, keep only those with no other
/// candidate strictly more specific at the parameter position, i.e. no
/// other candidate's parameter type is a subtype of this one's. Used by
/// `infer`'s `Apply` case against an `OverloadedPi`.
pub fn minimal_states(candidates: &[usize], states: &[ValueState], env: &Env) -> Result<Vec<usize>> {
    let mut out = Vec::new();
    for &i in candidates {
        let mut dominated = false;
        for &j in candidates {
            if i == j {
                continue;
            }
            if crate::unify::subtype(&states[j].param_ty, &states[i].param_ty, env)? {
                dominated = true;
                break;
            }
        }
        if !dominated {
            out.push(i);
        }
    }
    Ok(out)
}

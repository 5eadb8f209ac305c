//! The pattern matcher.
//!
//! Attempts to match a list of scrutinee values against a `match`'s clauses
//! in order. A clause whose outcome cannot be decided, because some
//! scrutinee is a neutral value whose shape we can't yet see through,
//! is treated as a non-match for the purposes of trying later clauses, but
//! the overall attempt remembers that this happened so the caller (`eval`)
//! knows to residualize rather than raise a non-exhaustive-match error.

use crate::env::Env;
use crate::error::Result;
use crate::ident::Local;
use crate::term::{Clause, Pattern};
use crate::value::{RcValue, Value};

/// A pattern variable bound during a successful match, together with the
/// type it was inferred to have.
pub struct Binding {
    pub ident: Local,
    pub value: RcValue,
    pub ty: RcValue,
}

enum PatternOutcome {
    Matched(Vec<Binding>),
    NoMatch,
    Undecidable,
}

enum ClauseOutcome {
    Matched(Vec<Binding>),
    NoMatch,
    Undecidable,
}

/// The result of attempting to match scrutinees against a clause list.
pub enum MatchOutcome<'a> {
    Matched(Vec<Binding>, &'a Clause),
    /// No clause definitively matched. `any_undecidable` records whether at
    /// least one clause could not be decided (some scrutinee was neutral),
    /// which tells `eval` whether to residualize or raise
    /// `NonExhaustiveMatch`.
    NoClauseMatched { any_undecidable: bool },
}

pub fn try_match<'a>(
    scrutinees: &[RcValue],
    clauses: &'a [Clause],
    env: &Env,
) -> Result<MatchOutcome<'a>> {
    let mut any_undecidable = false;

    for clause in clauses {
        match match_clause(scrutinees, &clause.patterns, env)? {
            ClauseOutcome::Matched(bindings) => return Ok(MatchOutcome::Matched(bindings, clause)),
            ClauseOutcome::Undecidable => any_undecidable = true,
            ClauseOutcome::NoMatch => {}
        }
    }

    Ok(MatchOutcome::NoClauseMatched { any_undecidable })
}

fn match_clause(scrutinees: &[RcValue], patterns: &[Pattern], env: &Env) -> Result<ClauseOutcome> {
    debug_assert_eq!(scrutinees.len(), patterns.len());

    let mut bindings = Vec::new();
    let mut undecidable = false;

    for (scrutinee, pattern) in scrutinees.iter().zip(patterns) {
        match match_pattern(scrutinee, pattern, env)? {
            PatternOutcome::NoMatch => return Ok(ClauseOutcome::NoMatch),
            PatternOutcome::Undecidable => undecidable = true,
            PatternOutcome::Matched(mut bs) => bindings.append(&mut bs),
        }
    }

    if undecidable {
        Ok(ClauseOutcome::Undecidable)
    } else {
        Ok(ClauseOutcome::Matched(bindings))
    }
}

fn match_pattern(value: &RcValue, pattern: &Pattern, env: &Env) -> Result<PatternOutcome> {
    match pattern {
        Pattern::Bind(ident) => {
            let ty = crate::infer::infer_value(value, env)?;
            Ok(PatternOutcome::Matched(vec![Binding {
                ident: ident.clone(),
                value: value.clone(),
                ty,
            }]))
        }

        Pattern::Primitive(lit) => match value.as_ref() {
            Value::Primitive(found) if found == lit => Ok(PatternOutcome::Matched(Vec::new())),
            Value::Primitive(_) => Ok(PatternOutcome::NoMatch),
            Value::Neutral(_) => Ok(PatternOutcome::Undecidable),
            _ => Ok(PatternOutcome::NoMatch),
        },

        Pattern::Cons(cons_ref, sub_patterns) => match value.as_ref() {
            Value::InductiveVariant(_, found_cons, args) => {
                if found_cons != cons_ref || args.len() != sub_patterns.len() {
                    return Ok(PatternOutcome::NoMatch);
                }
                let mut bindings = Vec::new();
                for (arg, sub) in args.iter().zip(sub_patterns) {
                    match match_pattern(arg, sub, env)? {
                        PatternOutcome::NoMatch => return Ok(PatternOutcome::NoMatch),
                        PatternOutcome::Undecidable => return Ok(PatternOutcome::Undecidable),
                        PatternOutcome::Matched(mut bs) => bindings.append(&mut bs),
                    }
                }
                Ok(PatternOutcome::Matched(bindings))
            }
            Value::Neutral(_) => Ok(PatternOutcome::Undecidable),
            _ => Ok(PatternOutcome::NoMatch),
        },

        Pattern::Record(field_patterns) => match value.as_ref() {
            Value::Record(fields) => {
                let mut bindings = Vec::new();
                for (name, sub) in field_patterns {
                    let Some((_, field_value)) = fields.iter().find(|(n, _)| n == name) else {
                        return Ok(PatternOutcome::NoMatch);
                    };
                    match match_pattern(field_value, sub, env)? {
                        PatternOutcome::NoMatch => return Ok(PatternOutcome::NoMatch),
                        PatternOutcome::Undecidable => return Ok(PatternOutcome::Undecidable),
                        PatternOutcome::Matched(mut bs) => bindings.append(&mut bs),
                    }
                }
                Ok(PatternOutcome::Matched(bindings))
            }
            Value::Neutral(_) => Ok(PatternOutcome::Undecidable),
            _ => Ok(PatternOutcome::NoMatch),
        },
    }
}

/// Compute the type each pattern binder should carry when residualizing a
/// `match` whose scrutinee is neutral (see `eval`'s `Match` case).
///
/// Walks the pattern against the scrutinee's inferred type, looking up
/// constructor parameter types for nested `Cons` patterns and field types for
/// `Record` patterns. Constructor field types are evaluated under the base
/// environment rather than threaded through prior field bindings, a
/// simplification appropriate here since this only affects how a
/// *residualized* binder is typed for later read-back/pretty-printing, never
/// whether a concrete match on a fully-known value succeeds.
pub fn bind_types_for_pattern(
    pattern: &Pattern,
    scrutinee_ty: &RcValue,
    env: &Env,
) -> Result<Vec<(Local, RcValue)>> {
    match pattern {
        Pattern::Bind(ident) => Ok(vec![(ident.clone(), scrutinee_ty.clone())]),
        Pattern::Primitive(_) => Ok(Vec::new()),

        Pattern::Cons(cons_ref, sub_patterns) => {
            let Some(def) = env.lookup_definition(&cons_ref.name) else {
                return Ok(Vec::new());
            };
            let crate::env::Definition::Constructor { params, .. } = def.as_ref() else {
                return Ok(Vec::new());
            };
            let mut out = Vec::new();
            for (sub, param) in sub_patterns.iter().zip(params) {
                let field_ty = crate::eval::eval(&param.ty, env)?;
                out.extend(bind_types_for_pattern(sub, &field_ty, env)?);
            }
            Ok(out)
        }

        Pattern::Record(field_patterns) => {
            let mut out = Vec::new();
            for (name, sub) in field_patterns {
                let field_ty = match scrutinee_ty.as_ref() {
                    Value::RecordType(fields) => fields
                        .iter()
                        .find(|(n, _)| n == name)
                        .map(|(_, t)| t.clone())
                        .unwrap_or_else(|| scrutinee_ty.clone()),
                    _ => scrutinee_ty.clone(),
                };
                out.extend(bind_types_for_pattern(sub, &field_ty, env)?);
            }
            Ok(out)
        }
    }
}

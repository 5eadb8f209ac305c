//! The finality predicate: is a term ground enough to feed to a native
//! function, or to decide that a `match` is non-exhaustive?

use std::collections::HashSet;

use crate::ident::Local;
use crate::term::{Clause, OverloadedState, Pattern, Term};

/// Identifiers bound in the enclosing lexical scope.
pub type Bound = HashSet<Local>;

/// Is `term` final: are all its free variables locally bound?
///
/// Primitives, `Universe`, and `PrimitiveType` are trivially final.
/// Composite terms are final iff every subterm is, with binders extending
/// `locally_bound` for the scope of their body.
pub fn is_final(term: &Term, locally_bound: &Bound) -> bool {
    match term {
        Term::Universe | Term::Primitive(_) | Term::PrimitiveType(_) => true,

        Term::Variable(id) => locally_bound.contains(id),

        Term::FunctionInvoke(_, args) | Term::OverloadInvoke(_, args) => {
            args.iter().all(|a| is_final(a, locally_bound))
        }

        Term::InductiveType(_, args) => args.iter().all(|a| is_final(a, locally_bound)),
        Term::InductiveVariant(ind, _, args) => {
            is_final(ind, locally_bound) && args.iter().all(|a| is_final(a, locally_bound))
        }

        Term::Match(scrutinees, clauses) => {
            scrutinees.iter().all(|s| is_final(s, locally_bound))
                && clauses.iter().all(|c| clause_is_final(c, locally_bound))
        }

        Term::Pi(param, codomain) | Term::Sigma(param, codomain) => {
            if !is_final(&param.ty, locally_bound) {
                return false;
            }
            let mut inner = locally_bound.clone();
            inner.insert(param.ident.clone());
            is_final(codomain, &inner)
        }

        Term::Lambda(param, body) => {
            if !is_final(&param.ty, locally_bound) {
                return false;
            }
            let mut inner = locally_bound.clone();
            inner.insert(param.ident.clone());
            is_final(body, &inner)
        }

        Term::OverloadedPi(states) | Term::OverloadedLambda(states) => {
            states.iter().all(|s| state_is_final(s, locally_bound))
        }

        Term::Apply(f, arg) => is_final(f, locally_bound) && is_final(arg, locally_bound),

        Term::Record(fields) | Term::RecordType(fields) => {
            fields.iter().all(|(_, t)| is_final(t, locally_bound))
        }

        Term::Projection(r, _) => is_final(r, locally_bound),
    }
}

fn clause_is_final(clause: &Clause, locally_bound: &Bound) -> bool {
    let mut inner = locally_bound.clone();
    for pattern in &clause.patterns {
        collect_pattern_binders(pattern, &mut inner);
    }
    is_final(&clause.body, &inner)
}

fn state_is_final(state: &OverloadedState, locally_bound: &Bound) -> bool {
    if !is_final(&state.param.ty, locally_bound) {
        return false;
    }
    let mut inner = locally_bound.clone();
    inner.insert(state.param.ident.clone());
    is_final(&state.body, &inner)
}

fn collect_pattern_binders(pattern: &Pattern, into: &mut Bound) {
    match pattern {
        Pattern::Primitive(_) => {}
        Pattern::Bind(id) => {
            into.insert(id.clone());
        }
        Pattern::Cons(_, subs) => {
            for sub in subs {
                collect_pattern_binders(sub, into);
            }
        }
        Pattern::Record(fields) => {
            for (_, sub) in fields {
                collect_pattern_binders(sub, into);
            }
        }
    }
}

//! The seven universal properties the core is expected to satisfy.
//!
//! `soundness_of_nbe`, `idempotence`, and `alpha_invariance` are exercised
//! as property tests over a small generator of closed, well-typed terms
//! (integer/boolean literals and records of them, nested to depth two, plus
//! an identity-lambda application — the toy signature is deliberately small
//! since the point is exercising the properties, not fuzzing the parser
//! that sits outside this crate). The remaining four properties each turn
//! on one specific construction (a particular free variable, a particular
//! self-recursive definition, a particular pair of overload candidates) so
//! they are plain `#[test]`s instead.

use proptest::prelude::*;

use dtcore::ident::{DefinitionKind, Global, Local};
use dtcore::literal::{Literal, LiteralType};
use dtcore::term::{Parameter, Term};
use dtcore::value::{Neutral, Value};
use dtcore::{env::Definition, infer, normalize, unify, Env, EvalConfig};

fn arb_leaf() -> BoxedStrategy<Term> {
    prop_oneof![
        any::<i64>().prop_map(|i| Term::Primitive(Literal::Int(i))),
        any::<bool>().prop_map(|b| Term::Primitive(Literal::Bool(b))),
    ]
    .boxed()
}

fn arb_record_field_name() -> impl Strategy<Value = String> {
    prop_oneof![Just("a".to_string()), Just("b".to_string()), Just("c".to_string())]
}

/// Closed terms over the toy signature: literals, records of literals
/// nested to depth two, and `(\x. x) leaf` applications. The identity
/// application only ever wraps a bare literal — its binder needs a concrete
/// primitive type to type-check against, and only literals have one in this
/// toy signature.
fn arb_term() -> BoxedStrategy<Term> {
    let leaf_record = prop::collection::vec((arb_record_field_name(), arb_leaf()), 1..=3)
        .prop_map(Term::Record);
    let leaf_identity = arb_leaf().prop_map(identity_applied_to);

    let base = prop_oneof![arb_leaf(), leaf_record, leaf_identity];

    base.prop_flat_map(|inner| {
        prop_oneof![
            Just(inner.clone()),
            prop::collection::vec((arb_record_field_name(), Just(inner.clone())), 1..=2)
                .prop_map(Term::Record),
        ]
    })
    .boxed()
}

fn identity_applied_to(arg: Term) -> Term {
    let x = Local::fresh("x");
    let ty = leaf_type_of(&arg);
    let id = Term::Lambda(Parameter::new(x.clone(), ty), Term::Variable(x).rc());
    Term::Apply(id.rc(), arg.rc())
}

fn leaf_type_of(term: &Term) -> Term {
    match term {
        Term::Primitive(Literal::Int(_)) => Term::PrimitiveType(LiteralType::Int),
        Term::Primitive(Literal::Bool(_)) => Term::PrimitiveType(LiteralType::Bool),
        other => unreachable!("identity_applied_to is only ever called with a literal leaf, got {other:?}"),
    }
}

/// Alpha-rename every `Lambda` binder `rename_all_binders` finds, minting a
/// fresh `Local` with the same display name and substituting it for the old
/// identity throughout the binder's body. Used to build the `t'` the spec's
/// alpha-invariance property compares against the original `t`.
fn rename_all_binders(term: &Term) -> Term {
    match term {
        Term::Apply(f, arg) => Term::Apply(rename_all_binders(f).rc(), rename_all_binders(arg).rc()),
        Term::Record(fields) => Term::Record(
            fields
                .iter()
                .map(|(name, t)| (name.clone(), rename_all_binders(t).rc()))
                .collect(),
        ),
        Term::Lambda(param, body) => {
            let fresh = Local::rename(&param.ident);
            let renamed_body = rename_all_binders(&substitute_var(body, &param.ident, &fresh));
            Term::Lambda(Parameter::new(fresh, rename_all_binders(&param.ty)), renamed_body.rc())
        }
        other => other.clone(),
    }
}

/// Replace every occurrence of `old` with `new` in `term`, stopping at any
/// inner binder that shadows `old`.
fn substitute_var(term: &Term, old: &Local, new: &Local) -> Term {
    match term {
        Term::Variable(id) if id == old => Term::Variable(new.clone()),
        Term::Apply(f, arg) => Term::Apply(
            substitute_var(f, old, new).rc(),
            substitute_var(arg, old, new).rc(),
        ),
        Term::Record(fields) => Term::Record(
            fields
                .iter()
                .map(|(name, t)| (name.clone(), substitute_var(t, old, new).rc()))
                .collect(),
        ),
        Term::Lambda(param, _) if &param.ident == old => term.clone(),
        Term::Lambda(param, body) => Term::Lambda(
            Parameter::new(param.ident.clone(), substitute_var(&param.ty, old, new).rc()),
            substitute_var(body, old, new).rc(),
        ),
        other => other.clone(),
    }
}

proptest! {
    #[test]
    fn soundness_of_nbe(term in arb_term()) {
        let env = Env::new(EvalConfig::default());
        let t = term.rc();
        let normal = normalize(&t, &env).expect("normalize");
        let ty_before = infer(&t, &env).expect("infer original");
        let ty_after = infer(&normal, &env).expect("infer normal form");
        prop_assert!(unify(&ty_before, &ty_after, &env).expect("unify types"));
    }

    #[test]
    fn idempotence(term in arb_term()) {
        let env = Env::new(EvalConfig::default());
        let t = term.rc();
        let once = normalize(&t, &env).expect("normalize once");
        let twice = normalize(&once, &env).expect("normalize twice");
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn alpha_invariance(term in arb_term()) {
        // `renamed` is `term` with every lambda binder replaced by a fresh
        // `Local` of the same name, substituted throughout its body; the two
        // terms are alpha-equivalent but share no binder identity.
        let env = Env::new(EvalConfig::default());
        let t = term.clone().rc();
        let renamed = rename_all_binders(&term).rc();
        let n1 = normalize(&t, &env).expect("normalize original");
        let n2 = normalize(&renamed, &env).expect("normalize alpha-renamed");
        prop_assert!(unify(&n1, &n2, &env).expect("unify normal forms"));
    }
}

#[test]
fn beta_reduction_matches_direct_substitution_via_environment_binding() {
    let env = Env::new(EvalConfig::default());
    let x = Local::fresh("x");
    let body = Term::Record(vec![("v".to_string(), Term::Variable(x.clone()).rc())]).rc();
    let lambda = Term::Lambda(Parameter::new(x, Term::PrimitiveType(LiteralType::Int).rc()), body).rc();
    let arg = Term::Primitive(Literal::Int(7)).rc();

    let applied = Term::Apply(lambda, arg).rc();
    let reduced = normalize(&applied, &env).unwrap();

    let expected = Term::Record(vec![("v".to_string(), Term::Primitive(Literal::Int(7)).rc())]).rc();
    assert_eq!(reduced, expected);
}

#[test]
fn eta_law_holds_for_a_free_function_variable() {
    let env = Env::new(EvalConfig::default());
    let f = Local::fresh("f");
    let int_ty = Value::PrimitiveType(LiteralType::Int).rc();
    let fn_ty = Value::Pi(
        int_ty.clone(),
        dtcore::value::Closure::new(env.clone(), Local::fresh("_"), Term::PrimitiveType(LiteralType::Int).rc()),
    )
    .rc();
    let env = env.extend_local(f.clone(), Value::neutral_var(f.clone()), fn_ty);

    let x = Local::fresh("x");
    let eta_expanded = Term::Lambda(
        Parameter::new(x.clone(), Term::PrimitiveType(LiteralType::Int).rc()),
        Term::Apply(Term::Variable(f.clone()).rc(), Term::Variable(x).rc()).rc(),
    )
    .rc();

    let lhs = normalize(&eta_expanded, &env).unwrap();
    let rhs = normalize(&Term::Variable(f).rc(), &env).unwrap();

    let lhs_v = dtcore::eval::eval(&lhs, &env).unwrap();
    let rhs_v = dtcore::eval::eval(&rhs, &env).unwrap();
    assert!(unify(&lhs_v, &rhs_v, &env).unwrap());
}

#[test]
fn recursive_self_call_freezes_to_a_neutral() {
    let env = Env::new(EvalConfig::default());
    let n = Local::fresh("n");
    let fn_ref = Global::new("loop", DefinitionKind::Function);
    let body = Term::FunctionInvoke(fn_ref.clone(), vec![Term::Variable(n.clone()).rc()]).rc();
    let def = Definition::Function {
        params: vec![Parameter::new(n, Term::PrimitiveType(LiteralType::Int).rc())],
        result_type: Term::PrimitiveType(LiteralType::Int).rc(),
        body,
        recursive: true,
    };
    let env = env.register_definition("loop", def);

    let call = Term::FunctionInvoke(fn_ref, vec![Term::Primitive(Literal::Int(0)).rc()]).rc();
    let result = dtcore::eval::eval(&call, &env).unwrap();
    assert!(matches!(result.as_ref(), Value::Neutral(Neutral::FunctionInvoke(..))));
}

#[test]
fn overload_resolution_is_independent_of_candidate_order() {
    fn build_env(order: [&str; 2]) -> Env {
        let env = Env::new(EvalConfig::default());
        let int_param = Parameter::new(Local::fresh("x"), Term::PrimitiveType(LiteralType::Int).rc());
        let bool_param = Parameter::new(Local::fresh("x"), Term::PrimitiveType(LiteralType::Bool).rc());

        let env = env.register_definition(
            "show_int",
            Definition::Native {
                params: vec![int_param],
                result_type: Term::PrimitiveType(LiteralType::String).rc(),
                implementation: std::rc::Rc::new(|_| Ok(Value::Primitive(Literal::String("int".into())).rc())),
            },
        );
        let env = env.register_definition(
            "show_bool",
            Definition::Native {
                params: vec![bool_param],
                result_type: Term::PrimitiveType(LiteralType::String).rc(),
                implementation: std::rc::Rc::new(|_| Ok(Value::Primitive(Literal::String("bool".into())).rc())),
            },
        );
        env.register_definition(
            "show",
            Definition::Overloaded {
                candidates: order.iter().map(|s| s.to_string()).collect(),
            },
        )
    }

    let args = vec![Value::Primitive(Literal::Int(42)).rc()];

    let forward = build_env(["show_int", "show_bool"]);
    let backward = build_env(["show_bool", "show_int"]);

    let resolved_forward = dtcore::overload::resolve_overload("show", &args, &forward).unwrap();
    let resolved_backward = dtcore::overload::resolve_overload("show", &args, &backward).unwrap();

    assert_eq!(resolved_forward, "show_int");
    assert_eq!(resolved_backward, "show_int");
}

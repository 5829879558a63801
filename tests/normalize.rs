use std::collections::BTreeMap;
use std::sync::Arc;

use keel::{is_equivalent, normalize, subst, Expr, Label, LetBinding, Path, X};

fn nat(value: u32) -> Expr<X> {
    Expr::natural(value)
}

fn plus(l: Expr<X>, r: Expr<X>) -> Expr<X> {
    Expr::NaturalPlus(Arc::new(l), Arc::new(r))
}

/// `λ(n : Natural) → n + +1`
fn succ() -> Expr<X> {
    Expr::lam("n", Expr::Natural, plus(Expr::var("n"), nat(1)))
}

fn let_binding(name: &str, args: Vec<(&str, Expr<X>)>, rhs: Expr<X>) -> LetBinding<X> {
    LetBinding {
        name: Label::from(name),
        args: args
            .into_iter()
            .map(|(arg, arg_type)| (Label::from(arg), Arc::new(arg_type)))
            .collect(),
        rhs: Arc::new(rhs),
    }
}

mod normalization {
    use super::*;

    #[test]
    fn beta_reduces_applications() {
        let expr = Expr::app(succ(), nat(2));
        assert_eq!(normalize(&expr), nat(3));
    }

    #[test]
    fn if_reduces_on_literal_predicates() {
        let expr = Expr::BoolIf(
            Arc::new(Expr::boolean(true)),
            Arc::new(nat(1)),
            Arc::new(nat(2)),
        );
        assert_eq!(normalize(&expr), nat(1));

        let expr = Expr::BoolIf(
            Arc::new(Expr::boolean(false)),
            Arc::new(nat(1)),
            Arc::new(nat(2)),
        );
        assert_eq!(normalize(&expr), nat(2));
    }

    #[test]
    fn stuck_if_normalizes_its_branches() {
        let expr = Expr::BoolIf(
            Arc::new(Expr::var("b")),
            Arc::new(plus(nat(1), nat(1))),
            Arc::new(nat(2)),
        );
        let expected = Expr::BoolIf(Arc::new(Expr::var("b")), Arc::new(nat(2)), Arc::new(nat(2)));
        assert_eq!(normalize(&expr), expected);
    }

    #[test]
    fn boolean_operators_fold_literals() {
        let and = Expr::BoolAnd(Arc::new(Expr::<X>::boolean(true)), Arc::new(Expr::boolean(false)));
        assert_eq!(normalize(&and), Expr::boolean(false));

        let or = Expr::BoolOr(Arc::new(Expr::<X>::boolean(true)), Arc::new(Expr::boolean(false)));
        assert_eq!(normalize(&or), Expr::boolean(true));
    }

    #[test]
    fn stuck_operators_keep_normalized_operands() {
        let expr = Expr::BoolAnd(
            Arc::new(Expr::<X>::var("b")),
            Arc::new(Expr::BoolAnd(
                Arc::new(Expr::boolean(true)),
                Arc::new(Expr::boolean(true)),
            )),
        );
        let expected = Expr::BoolAnd(Arc::new(Expr::var("b")), Arc::new(Expr::boolean(true)));
        assert_eq!(normalize(&expr), expected);
    }

    #[test]
    fn arithmetic_folds_literals() {
        assert_eq!(normalize(&plus(nat(2), nat(3))), nat(5));

        let times = Expr::NaturalTimes(Arc::new(nat(2)), Arc::new(nat(3)));
        assert_eq!(normalize(&times), nat(6));
    }

    #[test]
    fn text_append_concatenates_literals() {
        let expr = Expr::TextAppend(Arc::new(Expr::<X>::text("foo")), Arc::new(Expr::text("bar")));
        assert_eq!(normalize(&expr), Expr::text("foobar"));
    }

    #[test]
    fn annotations_are_erased() {
        let expr = Expr::Annot(Arc::new(nat(1)), Arc::new(Expr::Natural));
        assert_eq!(normalize(&expr), nat(1));
    }

    #[test]
    fn field_projection_on_record_literals() {
        let mut fields = BTreeMap::new();
        fields.insert(Label::from("foo"), Expr::<X>::boolean(true));
        fields.insert(Label::from("bar"), Expr::text("hi"));

        let expr = Expr::Field(Arc::new(Expr::RecordLit(fields)), Label::from("bar"));
        assert_eq!(normalize(&expr), Expr::text("hi"));
    }

    #[test]
    fn missing_field_stays_stuck_without_crashing() {
        let expr = Expr::Field(Arc::new(Expr::<X>::RecordLit(BTreeMap::new())), Label::from("foo"));
        assert_eq!(normalize(&expr), expr);
    }

    #[test]
    fn embedded_references_are_left_alone() {
        let reference = Expr::Embed(Path::Url("https://example.com/e".to_owned()));
        let expr = Expr::app(
            Expr::lam("x", Expr::Natural, Expr::var("x")),
            reference.clone(),
        );
        assert_eq!(normalize(&expr), reference);
    }

    #[test]
    fn natural_fold_unrolls_literals() {
        let expr = Expr::app(
            Expr::app(
                Expr::app(Expr::app(Expr::NaturalFold, nat(3)), Expr::Natural),
                succ(),
            ),
            nat(0),
        );
        assert_eq!(normalize(&expr), nat(3));
    }

    #[test]
    fn natural_fold_stays_stuck_on_variables() {
        let expr = Expr::app(
            Expr::app(
                Expr::app(Expr::app(Expr::NaturalFold, Expr::var("n")), Expr::Natural),
                succ(),
            ),
            nat(0),
        );
        assert_eq!(normalize(&expr), expr);
    }

    #[test]
    fn list_build_rebuilds_well_formed_spines() {
        // List/build Natural
        //     (λ(list : Type) → λ(cons : Natural → list → list) → λ(nil : list) →
        //         cons +1 (cons +2 nil))
        let builder = Expr::lam(
            "list",
            Expr::Const(keel::Const::Type),
            Expr::lam(
                "cons",
                Expr::arrow(
                    Expr::Natural,
                    Expr::arrow(Expr::var("list"), Expr::var("list")),
                ),
                Expr::lam(
                    "nil",
                    Expr::var("list"),
                    Expr::app(
                        Expr::app(Expr::var("cons"), nat(1)),
                        Expr::app(Expr::app(Expr::var("cons"), nat(2)), Expr::var("nil")),
                    ),
                ),
            ),
        );
        let expr = Expr::app(Expr::app(Expr::ListBuild, Expr::Natural), builder);

        let expected = Expr::ListLit(Arc::new(Expr::Natural), vec![nat(1), nat(2)]);
        assert_eq!(normalize(&expr), expected);
    }

    #[test]
    fn list_build_leaves_malformed_spines_unreduced() {
        // The builder discards `nil` and returns `cons` unapplied, so the
        // scan finds no Cons/Nil spine to rebuild.
        let builder = Expr::lam(
            "list",
            Expr::<X>::Const(keel::Const::Type),
            Expr::lam(
                "cons",
                Expr::arrow(
                    Expr::Natural,
                    Expr::arrow(Expr::var("list"), Expr::var("list")),
                ),
                Expr::lam("nil", Expr::var("list"), Expr::var("cons")),
            ),
        );
        let expr = Expr::app(Expr::app(Expr::ListBuild, Expr::Natural), builder.clone());

        assert_eq!(
            normalize(&expr),
            Expr::app(Expr::app(Expr::ListBuild, Expr::Natural), builder),
        );
    }

    #[test]
    fn list_fold_consumes_list_literals() {
        let list = Expr::ListLit(Arc::new(Expr::Natural), vec![nat(1), nat(2)]);
        let cons = Expr::lam(
            "x",
            Expr::Natural,
            Expr::lam("acc", Expr::Natural, plus(Expr::var("x"), Expr::var("acc"))),
        );
        let expr = Expr::app(
            Expr::app(
                Expr::app(
                    Expr::app(Expr::app(Expr::ListFold, Expr::Natural), list),
                    Expr::Natural,
                ),
                cons,
            ),
            nat(0),
        );
        assert_eq!(normalize(&expr), nat(3));
    }

    #[test]
    fn natural_build_rebuilds_well_formed_spines() {
        // Natural/build
        //     (λ(natural : Type) → λ(succ : natural → natural) → λ(zero : natural) →
        //         succ (succ zero))
        let builder = Expr::lam(
            "natural",
            Expr::Const(keel::Const::Type),
            Expr::lam(
                "succ",
                Expr::arrow(Expr::var("natural"), Expr::var("natural")),
                Expr::lam(
                    "zero",
                    Expr::var("natural"),
                    Expr::app(
                        Expr::var("succ"),
                        Expr::app(Expr::var("succ"), Expr::var("zero")),
                    ),
                ),
            ),
        );
        let expr = Expr::app(Expr::NaturalBuild, builder);
        assert_eq!(normalize(&expr), nat(2));
    }

    #[test]
    fn natural_build_leaves_malformed_spines_unreduced() {
        let builder = Expr::lam(
            "natural",
            Expr::<X>::Const(keel::Const::Type),
            Expr::lam(
                "succ",
                Expr::arrow(Expr::var("natural"), Expr::var("natural")),
                Expr::lam("zero", Expr::var("natural"), Expr::var("succ")),
            ),
        );
        let expr = Expr::app(Expr::NaturalBuild, builder.clone());

        assert_eq!(normalize(&expr), Expr::app(Expr::NaturalBuild, builder));
    }

    #[test]
    fn natural_predicates_reduce_on_literals() {
        let is_zero = |n| Expr::app(Expr::NaturalIsZero, nat(n));
        let even = |n| Expr::app(Expr::NaturalEven, nat(n));
        let odd = |n| Expr::app(Expr::NaturalOdd, nat(n));

        assert_eq!(normalize(&is_zero(0)), Expr::boolean(true));
        assert_eq!(normalize(&is_zero(1)), Expr::boolean(false));
        assert_eq!(normalize(&even(3)), Expr::boolean(false));
        assert_eq!(normalize(&even(4)), Expr::boolean(true));
        assert_eq!(normalize(&odd(3)), Expr::boolean(true));
        assert_eq!(normalize(&odd(4)), Expr::boolean(false));
    }

    #[test]
    fn fold_of_build_reduces_to_a_literal() {
        let builder = Expr::lam(
            "natural",
            Expr::Const(keel::Const::Type),
            Expr::lam(
                "succ",
                Expr::arrow(Expr::var("natural"), Expr::var("natural")),
                Expr::lam(
                    "zero",
                    Expr::var("natural"),
                    Expr::app(
                        Expr::var("succ"),
                        Expr::app(Expr::var("succ"), Expr::var("zero")),
                    ),
                ),
            ),
        );
        let expr = Expr::app(
            Expr::app(
                Expr::app(
                    Expr::app(Expr::NaturalFold, Expr::app(Expr::NaturalBuild, builder)),
                    Expr::Natural,
                ),
                succ(),
            ),
            nat(0),
        );
        assert_eq!(normalize(&expr), nat(2));
    }

    #[test]
    fn let_blocks_reduce_by_substitution() {
        let expr = Expr::Let(
            vec![let_binding(
                "f",
                vec![("x", Expr::Natural)],
                plus(Expr::var("x"), nat(1)),
            )],
            Arc::new(Expr::app(Expr::var("f"), nat(2))),
        );
        assert_eq!(normalize(&expr), nat(3));
    }

    #[test]
    fn later_let_bindings_shadow_earlier_ones() {
        let expr = Expr::Let(
            vec![
                let_binding("x", vec![], nat(1)),
                let_binding("x", vec![], nat(2)),
            ],
            Arc::new(Expr::var("x")),
        );
        assert_eq!(normalize(&expr), nat(2));
    }

    #[test]
    fn let_bindings_see_earlier_bindings() {
        let expr = Expr::Let(
            vec![
                let_binding("x", vec![], nat(1)),
                let_binding("y", vec![], plus(Expr::var("x"), nat(1))),
            ],
            Arc::new(Expr::var("y")),
        );
        assert_eq!(normalize(&expr), nat(2));
    }

    #[test]
    fn let_reduction_agrees_with_manual_substitution() {
        // Substituting the lambda form of the binding by hand must reach the
        // same normal form as reducing the block directly.
        let body = Expr::app(Expr::var("f"), nat(3));
        let block = Expr::Let(
            vec![let_binding(
                "f",
                vec![("x", Expr::Natural)],
                plus(Expr::var("x"), nat(2)),
            )],
            Arc::new(body.clone()),
        );

        let lambda = Expr::lam("x", Expr::Natural, plus(Expr::var("x"), nat(2)));
        let substituted = subst(&Label::from("f"), &lambda, &body);

        assert_eq!(normalize(&block), normalize(&substituted));
        assert_eq!(normalize(&block), nat(5));
    }

    #[test]
    fn normalization_is_idempotent() {
        let exprs = vec![
            Expr::app(succ(), nat(2)),
            Expr::lam("x", Expr::Natural, plus(Expr::var("x"), Expr::var("y"))),
            Expr::BoolIf(
                Arc::new(Expr::var("b")),
                Arc::new(nat(1)),
                Arc::new(plus(nat(1), nat(1))),
            ),
            Expr::Let(
                vec![let_binding("x", vec![], nat(1))],
                Arc::new(plus(Expr::var("x"), Expr::var("z"))),
            ),
        ];

        for expr in exprs {
            let once = normalize(&expr);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn beta_reduction_agrees_with_substitution() {
        let body = plus(Expr::var("x"), nat(1));
        let redex = Expr::app(Expr::lam("x", Expr::Natural, body.clone()), nat(2));

        assert_eq!(
            normalize(&redex),
            normalize(&subst(&Label::from("x"), &nat(2), &body)),
        );
    }
}

mod substitution {
    use super::*;

    #[test]
    fn replaces_the_named_variable() {
        assert_eq!(subst(&Label::from("x"), &nat(1), &Expr::var("x")), nat(1));
    }

    #[test]
    fn leaves_other_variables_alone() {
        assert_eq!(
            subst(&Label::from("x"), &nat(1), &Expr::var("y")),
            Expr::var("y"),
        );
    }

    #[test]
    fn lambda_binders_shadow_the_body_but_not_the_annotation() {
        let target = Expr::lam("x", Expr::<X>::var("x"), Expr::var("x"));
        let result = subst(&Label::from("x"), &Expr::Natural, &target);

        assert_eq!(result, Expr::lam("x", Expr::Natural, Expr::var("x")));
    }

    #[test]
    fn pi_binders_shadow_the_output_but_not_the_input() {
        let target = Expr::pi("x", Expr::<X>::var("x"), Expr::var("x"));
        let result = subst(&Label::from("x"), &Expr::Natural, &target);

        assert_eq!(result, Expr::pi("x", Expr::Natural, Expr::var("x")));
    }

    #[test]
    fn non_shadowing_binders_substitute_through() {
        let target = Expr::lam("y", Expr::Natural, Expr::var("x"));
        let result = subst(&Label::from("x"), &nat(1), &target);

        assert_eq!(result, Expr::lam("y", Expr::Natural, nat(1)));
    }

    #[test]
    fn let_bound_names_shadow_the_rest_of_the_block() {
        let target = Expr::Let(
            vec![let_binding("x", vec![], Expr::var("x"))],
            Arc::new(Expr::var("x")),
        );
        let result = subst(&Label::from("x"), &nat(1), &target);

        // The right-hand side sees the outer `x`; the body sees the binding.
        let expected = Expr::Let(
            vec![let_binding("x", vec![], nat(1))],
            Arc::new(Expr::var("x")),
        );
        assert_eq!(result, expected);
    }

    #[test]
    fn let_arguments_shadow_their_right_hand_side() {
        let target = Expr::Let(
            vec![let_binding("f", vec![("x", Expr::var("x"))], Expr::var("x"))],
            Arc::new(Expr::var("x")),
        );
        let result = subst(&Label::from("x"), &Expr::Natural, &target);

        // The argument annotation is outside the argument's scope; the
        // right-hand side is not. The body is only shadowed by `f`.
        let expected = Expr::Let(
            vec![let_binding("f", vec![("x", Expr::Natural)], Expr::var("x"))],
            Arc::new(Expr::Natural),
        );
        assert_eq!(result, expected);
    }

    #[test]
    fn embedded_references_are_opaque() {
        let reference: Expr<Path> = Expr::Embed(Path::File("config/base".into()));
        assert_eq!(
            subst(&Label::from("x"), &Expr::Natural, &reference),
            reference,
        );
    }
}

mod equivalence {
    use super::*;

    #[test]
    fn lambdas_are_equal_up_to_binder_names() {
        let left = Expr::lam("x", Expr::<X>::Natural, Expr::var("x"));
        let right = Expr::lam("y", Expr::Natural, Expr::var("y"));
        assert!(is_equivalent(&left, &right));
    }

    #[test]
    fn equivalence_is_modulo_beta_reduction() {
        let redex = Expr::app(Expr::lam("x", Expr::Natural, Expr::var("x")), nat(1));
        assert!(is_equivalent(&redex, &nat(1)));
    }

    #[test]
    fn free_variables_compare_by_name() {
        assert!(is_equivalent(&Expr::<X>::var("x"), &Expr::var("x")));
        assert!(!is_equivalent(&Expr::<X>::var("x"), &Expr::var("y")));
    }

    #[test]
    fn corresponding_binders_must_match_on_both_sides() {
        // λ(x : Natural) → λ(y : Natural) → x
        let left = Expr::lam(
            "x",
            Expr::<X>::Natural,
            Expr::lam("y", Expr::Natural, Expr::var("x")),
        );
        // λ(y : Natural) → λ(y : Natural) → y: the inner binder shadows, so
        // the body refers to the inner one.
        let right = Expr::lam(
            "y",
            Expr::Natural,
            Expr::lam("y", Expr::Natural, Expr::var("y")),
        );
        assert!(!is_equivalent(&left, &right));

        let renamed = Expr::lam(
            "a",
            Expr::Natural,
            Expr::lam("b", Expr::Natural, Expr::var("a")),
        );
        assert!(is_equivalent(&left, &renamed));
    }

    #[test]
    fn free_variables_under_binders_still_compare_by_name() {
        let left = Expr::lam("x", Expr::<X>::Natural, Expr::var("free"));
        let right = Expr::lam("z", Expr::Natural, Expr::var("free"));
        assert!(is_equivalent(&left, &right));
    }

    #[test]
    fn record_keys_compare_in_canonical_order() {
        let mut forwards = BTreeMap::new();
        forwards.insert(Label::from("foo"), Expr::<X>::Bool);
        forwards.insert(Label::from("bar"), Expr::Text);

        let mut backwards = BTreeMap::new();
        backwards.insert(Label::from("bar"), Expr::<X>::Text);
        backwards.insert(Label::from("foo"), Expr::Bool);

        assert!(is_equivalent(&Expr::Record(forwards), &Expr::Record(backwards)));
    }

    #[test]
    fn annotations_do_not_affect_equivalence() {
        let annotated = Expr::Annot(Arc::new(nat(1)), Arc::new(Expr::Natural));
        assert!(is_equivalent(&annotated, &nat(1)));
    }

    #[test]
    fn equivalence_is_an_equivalence_relation() {
        let exprs: Vec<Expr<X>> = vec![
            Expr::lam("x", Expr::Natural, Expr::var("x")),
            Expr::lam("y", Expr::Natural, Expr::var("y")),
            Expr::app(Expr::lam("x", Expr::Natural, Expr::var("x")), nat(1)),
            nat(1),
        ];

        for expr in &exprs {
            assert!(is_equivalent(expr, expr));
        }
        for left in &exprs {
            for right in &exprs {
                assert_eq!(is_equivalent(left, right), is_equivalent(right, left));
            }
        }
        // The first two and the last two are pairwise equivalent; check that
        // equivalence carries across the chain.
        assert!(is_equivalent(&exprs[2], &exprs[3]));
    }
}

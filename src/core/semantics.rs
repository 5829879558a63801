//! Operational semantics of the core language: substitution, normalization,
//! and the equivalence they induce.
//!
//! Normalization terminates on well-typed input. On ill-typed input it is
//! free to diverge, so callers are expected to type check first.

use num_bigint::BigUint;
use num_traits::Zero;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::{Expr, Label, LetBinding};

/// Substitute every free occurrence of `name` in `expr` with `replacement`.
///
/// Capture is avoided by shadowing rather than renaming: substitution stops
/// at any binder that rebinds `name`, and never renames a binder. This is
/// sound because embedded payloads stand for closed expressions.
pub fn subst<A: Clone>(name: &Label, replacement: &Expr<A>, expr: &Expr<A>) -> Expr<A> {
    fn subst_arc<A: Clone>(
        name: &Label,
        replacement: &Expr<A>,
        expr: &Arc<Expr<A>>,
    ) -> Arc<Expr<A>> {
        Arc::new(subst(name, replacement, expr))
    }

    match expr {
        Expr::Var(x) if x == name => replacement.clone(),
        Expr::Var(_) => expr.clone(),

        Expr::Lam(x, input_type, body) => {
            let input_type = subst_arc(name, replacement, input_type);
            let body = if x == name {
                body.clone()
            } else {
                subst_arc(name, replacement, body)
            };
            Expr::Lam(x.clone(), input_type, body)
        }
        Expr::Pi(x, input_type, output_type) => {
            let input_type = subst_arc(name, replacement, input_type);
            let output_type = if x == name {
                output_type.clone()
            } else {
                subst_arc(name, replacement, output_type)
            };
            Expr::Pi(x.clone(), input_type, output_type)
        }
        Expr::Let(bindings, body) => {
            // `in_scope` tracks whether `name` is still free at the point
            // being substituted; each binder that rebinds it clears the flag
            // for everything after it.
            let mut in_scope = true;
            let mut new_bindings = Vec::with_capacity(bindings.len());
            for binding in bindings {
                let mut arg_scope = in_scope;
                let mut args = Vec::with_capacity(binding.args.len());
                for (arg, arg_type) in &binding.args {
                    let arg_type = if arg_scope {
                        subst_arc(name, replacement, arg_type)
                    } else {
                        arg_type.clone()
                    };
                    if arg == name {
                        arg_scope = false;
                    }
                    args.push((arg.clone(), arg_type));
                }
                let rhs = if arg_scope {
                    subst_arc(name, replacement, &binding.rhs)
                } else {
                    binding.rhs.clone()
                };
                new_bindings.push(LetBinding {
                    name: binding.name.clone(),
                    args,
                    rhs,
                });
                if &binding.name == name {
                    in_scope = false;
                }
            }
            let body = if in_scope {
                subst_arc(name, replacement, body)
            } else {
                body.clone()
            };
            Expr::Let(new_bindings, body)
        }

        Expr::App(function, argument) => Expr::App(
            subst_arc(name, replacement, function),
            subst_arc(name, replacement, argument),
        ),
        Expr::Annot(inner, annotation) => Expr::Annot(
            subst_arc(name, replacement, inner),
            subst_arc(name, replacement, annotation),
        ),
        Expr::BoolAnd(l, r) => Expr::BoolAnd(
            subst_arc(name, replacement, l),
            subst_arc(name, replacement, r),
        ),
        Expr::BoolOr(l, r) => Expr::BoolOr(
            subst_arc(name, replacement, l),
            subst_arc(name, replacement, r),
        ),
        Expr::BoolIf(cond, if_true, if_false) => Expr::BoolIf(
            subst_arc(name, replacement, cond),
            subst_arc(name, replacement, if_true),
            subst_arc(name, replacement, if_false),
        ),
        Expr::NaturalPlus(l, r) => Expr::NaturalPlus(
            subst_arc(name, replacement, l),
            subst_arc(name, replacement, r),
        ),
        Expr::NaturalTimes(l, r) => Expr::NaturalTimes(
            subst_arc(name, replacement, l),
            subst_arc(name, replacement, r),
        ),
        Expr::TextAppend(l, r) => Expr::TextAppend(
            subst_arc(name, replacement, l),
            subst_arc(name, replacement, r),
        ),
        Expr::Maybe(elem_type) => Expr::Maybe(subst_arc(name, replacement, elem_type)),
        Expr::List(elem_type) => Expr::List(subst_arc(name, replacement, elem_type)),
        Expr::ListLit(elem_type, elems) => Expr::ListLit(
            subst_arc(name, replacement, elem_type),
            elems
                .iter()
                .map(|elem| subst(name, replacement, elem))
                .collect(),
        ),
        Expr::Record(field_types) => Expr::Record(
            field_types
                .iter()
                .map(|(label, field_type)| (label.clone(), subst(name, replacement, field_type)))
                .collect(),
        ),
        Expr::RecordLit(fields) => Expr::RecordLit(
            fields
                .iter()
                .map(|(label, field)| (label.clone(), subst(name, replacement, field)))
                .collect(),
        ),
        Expr::Field(record, label) => {
            Expr::Field(subst_arc(name, replacement, record), label.clone())
        }

        // Everything else binds nothing and contains nothing to substitute
        // into. Embedded payloads are closed.
        _ => expr.clone(),
    }
}

/// Reduce an expression to normal form.
///
/// Performs β-reduction, erases annotations, desugars `let` blocks by
/// substitution, reduces the boolean, arithmetic, and text primitives on
/// literal operands, projects fields out of record literals, and applies
/// the rewrite rules for `Natural/fold`, `Natural/build`, `List/build`, and
/// `List/fold` when they meet literals or well-formed builders.
pub fn normalize<A: Clone>(expr: &Expr<A>) -> Expr<A> {
    match expr {
        Expr::Lam(x, input_type, body) => Expr::Lam(
            x.clone(),
            Arc::new(normalize(input_type)),
            Arc::new(normalize(body)),
        ),
        Expr::Pi(x, input_type, output_type) => Expr::Pi(
            x.clone(),
            Arc::new(normalize(input_type)),
            Arc::new(normalize(output_type)),
        ),
        Expr::App(function, argument) => match normalize(function) {
            Expr::Lam(x, _, body) => {
                let argument = normalize(argument);
                normalize(&subst(&x, &argument, &body))
            }
            function => {
                let argument = normalize(argument);
                match reduce_builtin_app(&function, &argument) {
                    Some(reduced) => reduced,
                    None => Expr::App(Arc::new(function), Arc::new(argument)),
                }
            }
        },
        Expr::Let(bindings, body) => {
            // Fold the block from the innermost binding outwards,
            // substituting each bound name with the lambda form of its
            // right-hand side.
            let desugared = bindings.iter().rev().fold(body.as_ref().clone(), |acc, binding| {
                let rhs = binding.args.iter().rev().fold(
                    binding.rhs.as_ref().clone(),
                    |rhs, (arg, arg_type)| Expr::Lam(arg.clone(), arg_type.clone(), Arc::new(rhs)),
                );
                subst(&binding.name, &rhs, &acc)
            });
            normalize(&desugared)
        }
        Expr::Annot(inner, _) => normalize(inner),

        Expr::BoolAnd(l, r) => match (normalize(l), normalize(r)) {
            (Expr::BoolLit(l), Expr::BoolLit(r)) => Expr::BoolLit(l && r),
            (l, r) => Expr::BoolAnd(Arc::new(l), Arc::new(r)),
        },
        Expr::BoolOr(l, r) => match (normalize(l), normalize(r)) {
            (Expr::BoolLit(l), Expr::BoolLit(r)) => Expr::BoolLit(l || r),
            (l, r) => Expr::BoolOr(Arc::new(l), Arc::new(r)),
        },
        Expr::BoolIf(cond, if_true, if_false) => match normalize(cond) {
            Expr::BoolLit(true) => normalize(if_true),
            Expr::BoolLit(false) => normalize(if_false),
            cond => Expr::BoolIf(
                Arc::new(cond),
                Arc::new(normalize(if_true)),
                Arc::new(normalize(if_false)),
            ),
        },
        Expr::NaturalPlus(l, r) => match (normalize(l), normalize(r)) {
            (Expr::NaturalLit(l), Expr::NaturalLit(r)) => Expr::NaturalLit(l + r),
            (l, r) => Expr::NaturalPlus(Arc::new(l), Arc::new(r)),
        },
        Expr::NaturalTimes(l, r) => match (normalize(l), normalize(r)) {
            (Expr::NaturalLit(l), Expr::NaturalLit(r)) => Expr::NaturalLit(l * r),
            (l, r) => Expr::NaturalTimes(Arc::new(l), Arc::new(r)),
        },
        Expr::TextAppend(l, r) => match (normalize(l), normalize(r)) {
            (Expr::TextLit(mut l), Expr::TextLit(r)) => {
                l.push_str(&r);
                Expr::TextLit(l)
            }
            (l, r) => Expr::TextAppend(Arc::new(l), Arc::new(r)),
        },

        Expr::Field(record, label) => match normalize(record) {
            Expr::RecordLit(fields) => match fields.get(label) {
                Some(field) => normalize(field),
                // A missing field cannot occur on well-typed input, but must
                // not crash here.
                None => Expr::Field(Arc::new(Expr::RecordLit(fields)), label.clone()),
            },
            record => Expr::Field(Arc::new(record), label.clone()),
        },

        Expr::Maybe(elem_type) => Expr::Maybe(Arc::new(normalize(elem_type))),
        Expr::List(elem_type) => Expr::List(Arc::new(normalize(elem_type))),
        Expr::ListLit(elem_type, elems) => Expr::ListLit(
            Arc::new(normalize(elem_type)),
            elems.iter().map(normalize).collect(),
        ),
        Expr::Record(field_types) => Expr::Record(
            field_types
                .iter()
                .map(|(label, field_type)| (label.clone(), normalize(field_type)))
                .collect(),
        ),
        Expr::RecordLit(fields) => Expr::RecordLit(
            fields
                .iter()
                .map(|(label, field)| (label.clone(), normalize(field)))
                .collect(),
        ),

        // Variables, sorts, literals, builtins, and embedded payloads are
        // already normal.
        _ => expr.clone(),
    }
}

/// Try to reduce a fully applied builtin, given a normalized head and
/// argument. Returns `None` when the application must stay as it is.
fn reduce_builtin_app<A: Clone>(function: &Expr<A>, argument: &Expr<A>) -> Option<Expr<A>> {
    let mut head = function;
    let mut args = vec![argument];
    while let Expr::App(function, argument) = head {
        args.push(argument.as_ref());
        head = function.as_ref();
    }
    args.reverse();

    match (head, args.as_slice()) {
        (Expr::NaturalFold, [n, _motive, succ, zero]) => match n {
            Expr::NaturalLit(n) => {
                let mut expr = (*zero).clone();
                let mut i = BigUint::zero();
                while &i < n {
                    expr = Expr::App(Arc::new((*succ).clone()), Arc::new(expr));
                    i += 1u8;
                }
                Some(normalize(&expr))
            }
            _ => None,
        },
        (Expr::NaturalBuild, [builder]) => {
            let spine = normalize(&Expr::app(
                Expr::app(Expr::app((*builder).clone(), Expr::Natural), Expr::var("Succ")),
                Expr::var("Zero"),
            ));
            if natural_spine_check(&spine) {
                Some(Expr::NaturalLit(natural_spine_value(&spine)))
            } else {
                None
            }
        }
        (Expr::NaturalIsZero, [n]) => match n {
            Expr::NaturalLit(n) => Some(Expr::BoolLit(n.is_zero())),
            _ => None,
        },
        (Expr::NaturalEven, [n]) => match n {
            Expr::NaturalLit(n) => Some(Expr::BoolLit((n % BigUint::from(2u8)).is_zero())),
            _ => None,
        },
        (Expr::NaturalOdd, [n]) => match n {
            Expr::NaturalLit(n) => Some(Expr::BoolLit(!(n % BigUint::from(2u8)).is_zero())),
            _ => None,
        },
        (Expr::ListBuild, [elem_type, builder]) => {
            let spine = normalize(&Expr::app(
                Expr::app(
                    Expr::app(
                        (*builder).clone(),
                        Expr::List(Arc::new((*elem_type).clone())),
                    ),
                    Expr::var("Cons"),
                ),
                Expr::var("Nil"),
            ));
            if list_spine_check(&spine) {
                Some(Expr::ListLit(
                    Arc::new((*elem_type).clone()),
                    list_spine_elems(&spine),
                ))
            } else {
                None
            }
        }
        (Expr::ListFold, [_elem_type, list, _motive, cons, nil]) => match list {
            Expr::ListLit(_, elems) => {
                let expr = elems.iter().rev().fold((*nil).clone(), |acc, elem| {
                    Expr::app(Expr::app((*cons).clone(), elem.clone()), acc)
                });
                Some(normalize(&expr))
            }
            _ => None,
        },
        _ => None,
    }
}

/// Check that a normalized builder application came out as a well-formed
/// `Cons`/`Nil` spine before rebuilding it as a list literal.
///
/// Detection keys on the literal free variable names `Cons` and `Nil`, so a
/// builder that captures either name leaves the application unreduced.
fn list_spine_check<A>(expr: &Expr<A>) -> bool {
    let mut expr = expr;
    loop {
        match expr {
            Expr::Var(name) if name.as_str() == "Nil" => return true,
            Expr::App(cons, rest) => match cons.as_ref() {
                Expr::App(head, _) => match head.as_ref() {
                    Expr::Var(name) if name.as_str() == "Cons" => expr = rest,
                    _ => return false,
                },
                _ => return false,
            },
            _ => return false,
        }
    }
}

/// Collect the elements of a checked `Cons`/`Nil` spine, outermost first.
fn list_spine_elems<A: Clone>(expr: &Expr<A>) -> Vec<Expr<A>> {
    let mut expr = expr;
    let mut elems = Vec::new();
    while let Expr::App(cons, rest) = expr {
        match cons.as_ref() {
            Expr::App(_, elem) => {
                elems.push(elem.as_ref().clone());
                expr = rest;
            }
            _ => break,
        }
    }
    elems
}

/// Check that a normalized builder application came out as a well-formed
/// `Succ`/`Zero` spine. Shares the free-name fragility of
/// [`list_spine_check`].
fn natural_spine_check<A>(expr: &Expr<A>) -> bool {
    let mut expr = expr;
    loop {
        match expr {
            Expr::Var(name) if name.as_str() == "Zero" => return true,
            Expr::App(succ, rest) => match succ.as_ref() {
                Expr::Var(name) if name.as_str() == "Succ" => expr = rest,
                _ => return false,
            },
            _ => return false,
        }
    }
}

/// The depth of a checked `Succ`/`Zero` spine.
fn natural_spine_value<A>(expr: &Expr<A>) -> BigUint {
    let mut expr = expr;
    let mut value = BigUint::zero();
    while let Expr::App(_, rest) = expr {
        value += 1u8;
        expr = rest;
    }
    value
}

/// Decide whether two expressions are equivalent: α-equivalent after both
/// are reduced to normal form.
pub fn is_equivalent<A: Clone + PartialEq>(expr0: &Expr<A>, expr1: &Expr<A>) -> bool {
    alpha_eq(&normalize(expr0), &normalize(expr1), &mut Vec::new())
}

/// Match a pair of variable names against the stack of binder
/// correspondences.
///
/// The first entry, scanning from the most recent, in which either side
/// matches decides the answer: the names are equal only if both sides
/// match. Names untouched by any entry are free and must be identical.
fn match_vars(name0: &Label, name1: &Label, names: &[(Label, Label)]) -> bool {
    for (bound0, bound1) in names.iter().rev() {
        if bound0 == name0 || bound1 == name1 {
            return bound0 == name0 && bound1 == name1;
        }
    }
    name0 == name1
}

fn record_fields_eq<A: PartialEq>(
    fields0: &BTreeMap<Label, Expr<A>>,
    fields1: &BTreeMap<Label, Expr<A>>,
    names: &mut Vec<(Label, Label)>,
) -> bool {
    fields0.len() == fields1.len()
        && Iterator::zip(fields0.iter(), fields1.iter())
            .all(|((label0, field0), (label1, field1))| {
                label0 == label1 && alpha_eq(field0, field1, names)
            })
}

/// α-equivalence of two expressions, threading the stack of binder name
/// correspondences.
fn alpha_eq<A: PartialEq>(
    expr0: &Expr<A>,
    expr1: &Expr<A>,
    names: &mut Vec<(Label, Label)>,
) -> bool {
    match (expr0, expr1) {
        (Expr::Const(const0), Expr::Const(const1)) => const0 == const1,
        (Expr::Var(name0), Expr::Var(name1)) => match_vars(name0, name1, names),

        (Expr::Lam(name0, type0, body0), Expr::Lam(name1, type1, body1))
        | (Expr::Pi(name0, type0, body0), Expr::Pi(name1, type1, body1)) => {
            alpha_eq(type0, type1, names) && {
                names.push((name0.clone(), name1.clone()));
                let result = alpha_eq(body0, body1, names);
                names.pop();
                result
            }
        }
        (Expr::App(function0, argument0), Expr::App(function1, argument1)) => {
            alpha_eq(function0, function1, names) && alpha_eq(argument0, argument1, names)
        }
        (Expr::Let(bindings0, body0), Expr::Let(bindings1, body1)) => {
            bindings0.len() == bindings1.len()
                && Iterator::zip(bindings0.iter(), bindings1.iter()).all(|(binding0, binding1)| {
                    binding0.name == binding1.name
                        && binding0.args.len() == binding1.args.len()
                        && Iterator::zip(binding0.args.iter(), binding1.args.iter()).all(
                            |((arg0, arg_type0), (arg1, arg_type1))| {
                                arg0 == arg1 && alpha_eq(arg_type0, arg_type1, names)
                            },
                        )
                        && alpha_eq(&binding0.rhs, &binding1.rhs, names)
                })
                && alpha_eq(body0, body1, names)
        }
        (Expr::Annot(inner0, annotation0), Expr::Annot(inner1, annotation1)) => {
            alpha_eq(inner0, inner1, names) && alpha_eq(annotation0, annotation1, names)
        }

        (Expr::BoolLit(lit0), Expr::BoolLit(lit1)) => lit0 == lit1,
        (Expr::BoolAnd(l0, r0), Expr::BoolAnd(l1, r1))
        | (Expr::BoolOr(l0, r0), Expr::BoolOr(l1, r1))
        | (Expr::NaturalPlus(l0, r0), Expr::NaturalPlus(l1, r1))
        | (Expr::NaturalTimes(l0, r0), Expr::NaturalTimes(l1, r1))
        | (Expr::TextAppend(l0, r0), Expr::TextAppend(l1, r1)) => {
            alpha_eq(l0, l1, names) && alpha_eq(r0, r1, names)
        }
        (Expr::BoolIf(cond0, true0, false0), Expr::BoolIf(cond1, true1, false1)) => {
            alpha_eq(cond0, cond1, names)
                && alpha_eq(true0, true1, names)
                && alpha_eq(false0, false1, names)
        }

        (Expr::NaturalLit(lit0), Expr::NaturalLit(lit1)) => lit0 == lit1,
        (Expr::IntegerLit(lit0), Expr::IntegerLit(lit1)) => lit0 == lit1,
        (Expr::DoubleLit(lit0), Expr::DoubleLit(lit1)) => lit0 == lit1,
        (Expr::TextLit(lit0), Expr::TextLit(lit1)) => lit0 == lit1,

        (Expr::Maybe(type0), Expr::Maybe(type1)) | (Expr::List(type0), Expr::List(type1)) => {
            alpha_eq(type0, type1, names)
        }
        (Expr::ListLit(type0, elems0), Expr::ListLit(type1, elems1)) => {
            alpha_eq(type0, type1, names)
                && elems0.len() == elems1.len()
                && Iterator::zip(elems0.iter(), elems1.iter())
                    .all(|(elem0, elem1)| alpha_eq(elem0, elem1, names))
        }

        (Expr::Record(fields0), Expr::Record(fields1))
        | (Expr::RecordLit(fields0), Expr::RecordLit(fields1)) => {
            record_fields_eq(fields0, fields1, names)
        }
        (Expr::Field(record0, label0), Expr::Field(record1, label1)) => {
            label0 == label1 && alpha_eq(record0, record1, names)
        }

        (Expr::Bool, Expr::Bool)
        | (Expr::Natural, Expr::Natural)
        | (Expr::NaturalFold, Expr::NaturalFold)
        | (Expr::NaturalBuild, Expr::NaturalBuild)
        | (Expr::NaturalIsZero, Expr::NaturalIsZero)
        | (Expr::NaturalEven, Expr::NaturalEven)
        | (Expr::NaturalOdd, Expr::NaturalOdd)
        | (Expr::Integer, Expr::Integer)
        | (Expr::Double, Expr::Double)
        | (Expr::Text, Expr::Text)
        | (Expr::Nothing, Expr::Nothing)
        | (Expr::Just, Expr::Just)
        | (Expr::ListBuild, Expr::ListBuild)
        | (Expr::ListFold, Expr::ListFold) => true,

        (Expr::Embed(payload0), Expr::Embed(payload1)) => payload0 == payload1,

        (_, _) => false,
    }
}

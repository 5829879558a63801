//! Type synthesis for the core language.
//!
//! The checker is synthesis-only: every binder carries an annotation, so
//! the type of any expression can be computed without unification. The sort
//! structure is a pure type system over `Type` and `Kind` with all four
//! function rules, so types may abstract over types as well as terms.
//!
//! Intermediate types are normalized before they are inspected, and the
//! comparisons between already-synthesized types are structural. Semantic
//! equivalence is deliberately not used here; re-normalizing at every
//! comparison site would be quadratic.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::context::Context;
use crate::core::semantics::{normalize, subst};
use crate::core::{Const, Expr, X};
use crate::reporting::{TypeError, TypeMessage};

/// The type of each sort that has one: `Type : Kind`, while `Kind` is the
/// top of the hierarchy.
pub fn axiom(constant: Const) -> Option<Const> {
    match constant {
        Const::Type => Some(Const::Kind),
        Const::Kind => None,
    }
}

/// The sort of a function type, from the sorts of its input and output.
pub fn rule(input: Const, output: Const) -> Const {
    match (input, output) {
        (Const::Type, Const::Type) => Const::Type,
        (Const::Kind, Const::Type) => Const::Type,
        (Const::Type, Const::Kind) => Const::Kind,
        (Const::Kind, Const::Kind) => Const::Kind,
    }
}

/// Synthesize the type of a closed expression.
pub fn type_of(expr: &Expr<X>) -> Result<Expr<X>, TypeError> {
    type_with(&Context::new(), expr)
}

/// Synthesize the type of an expression whose free variables are typed by
/// the given context.
pub fn type_with(context: &Context<Expr<X>>, expr: &Expr<X>) -> Result<Expr<X>, TypeError> {
    match expr {
        Expr::Const(constant) => match axiom(*constant) {
            Some(sort) => Ok(Expr::Const(sort)),
            None => Err(TypeError::new(
                context,
                expr,
                TypeMessage::Untyped(*constant),
            )),
        },
        Expr::Var(name) => match context.lookup(name.as_str()) {
            Some(var_type) => Ok(var_type.clone()),
            None => Err(TypeError::new(context, expr, TypeMessage::UnboundVariable)),
        },

        Expr::Lam(name, input_type, body) => {
            let body_context = context.insert(name.clone(), input_type.as_ref().clone());
            let body_type = type_with(&body_context, body)?;
            let pi = Expr::Pi(name.clone(), input_type.clone(), Arc::new(body_type));
            // Check that the resulting function type is itself well formed.
            type_with(context, &pi)?;
            Ok(pi)
        }
        Expr::Pi(name, input_type, output_type) => {
            let input_sort = match normalize(&type_with(context, input_type)?) {
                Expr::Const(sort) => sort,
                _ => {
                    return Err(TypeError::new(
                        context,
                        expr,
                        TypeMessage::InvalidInputType(input_type.as_ref().clone()),
                    ));
                }
            };
            let output_context = context.insert(name.clone(), input_type.as_ref().clone());
            let output_sort = match normalize(&type_with(&output_context, output_type)?) {
                Expr::Const(sort) => sort,
                _ => {
                    return Err(TypeError::new(
                        &output_context,
                        expr,
                        TypeMessage::InvalidOutputType(output_type.as_ref().clone()),
                    ));
                }
            };
            Ok(Expr::Const(rule(input_sort, output_sort)))
        }
        Expr::App(function, argument) => {
            let (name, input_type, output_type) =
                match normalize(&type_with(context, function)?) {
                    Expr::Pi(name, input_type, output_type) => (name, input_type, output_type),
                    _ => {
                        return Err(TypeError::new(
                            context,
                            expr,
                            TypeMessage::NotAFunction(function.as_ref().clone()),
                        ));
                    }
                };
            let argument_type = type_with(context, argument)?;
            if input_type.as_ref() == &argument_type {
                Ok(subst(&name, argument, &output_type))
            } else {
                Err(TypeError::new(
                    context,
                    expr,
                    TypeMessage::TypeMismatch(normalize(&input_type), normalize(&argument_type)),
                ))
            }
        }
        Expr::Let(bindings, body) => {
            let mut context = context.clone();
            for binding in bindings {
                let rhs = binding.args.iter().rev().fold(
                    binding.rhs.as_ref().clone(),
                    |rhs, (arg, arg_type)| Expr::Lam(arg.clone(), arg_type.clone(), Arc::new(rhs)),
                );
                let rhs_type = type_with(&context, &rhs)?;
                context = context.insert(binding.name.clone(), rhs_type);
            }
            type_with(&context, body)
        }
        Expr::Annot(inner, annotation) => {
            let inferred = type_with(context, inner)?;
            if annotation.as_ref() == &inferred {
                Ok(annotation.as_ref().clone())
            } else {
                Err(TypeError::new(
                    context,
                    expr,
                    TypeMessage::AnnotMismatch(
                        inner.as_ref().clone(),
                        normalize(annotation),
                        normalize(&inferred),
                    ),
                ))
            }
        }

        Expr::Bool | Expr::Natural | Expr::Integer | Expr::Double | Expr::Text => {
            Ok(Expr::Const(Const::Type))
        }

        Expr::BoolLit(_) => Ok(Expr::Bool),
        Expr::BoolAnd(l, r) => {
            for &(left, operand) in &[(true, l.as_ref()), (false, r.as_ref())] {
                let operand_type = normalize(&type_with(context, operand)?);
                if operand_type != Expr::Bool {
                    return Err(TypeError::new(
                        context,
                        expr,
                        TypeMessage::CantAnd(left, operand.clone(), operand_type),
                    ));
                }
            }
            Ok(Expr::Bool)
        }
        Expr::BoolOr(l, r) => {
            for &(left, operand) in &[(true, l.as_ref()), (false, r.as_ref())] {
                let operand_type = normalize(&type_with(context, operand)?);
                if operand_type != Expr::Bool {
                    return Err(TypeError::new(
                        context,
                        expr,
                        TypeMessage::CantOr(left, operand.clone(), operand_type),
                    ));
                }
            }
            Ok(Expr::Bool)
        }
        Expr::BoolIf(predicate, if_true, if_false) => {
            let predicate_type = normalize(&type_with(context, predicate)?);
            if predicate_type != Expr::Bool {
                return Err(TypeError::new(
                    context,
                    expr,
                    TypeMessage::InvalidPredicate(predicate.as_ref().clone(), predicate_type),
                ));
            }
            let true_type = normalize(&type_with(context, if_true)?);
            let false_type = normalize(&type_with(context, if_false)?);
            if true_type == false_type {
                Ok(true_type)
            } else {
                Err(TypeError::new(
                    context,
                    expr,
                    TypeMessage::IfBranchMismatch(
                        if_true.as_ref().clone(),
                        if_false.as_ref().clone(),
                        true_type,
                        false_type,
                    ),
                ))
            }
        }

        Expr::NaturalLit(_) => Ok(Expr::Natural),
        Expr::NaturalFold => Ok(Expr::arrow(
            Expr::Natural,
            Expr::pi(
                "natural",
                Expr::Const(Const::Type),
                Expr::pi(
                    "succ",
                    Expr::arrow(Expr::var("natural"), Expr::var("natural")),
                    Expr::pi("zero", Expr::var("natural"), Expr::var("natural")),
                ),
            ),
        )),
        Expr::NaturalBuild => Ok(Expr::arrow(
            Expr::pi(
                "natural",
                Expr::Const(Const::Type),
                Expr::pi(
                    "succ",
                    Expr::arrow(Expr::var("natural"), Expr::var("natural")),
                    Expr::pi("zero", Expr::var("natural"), Expr::var("natural")),
                ),
            ),
            Expr::Natural,
        )),
        Expr::NaturalIsZero | Expr::NaturalEven | Expr::NaturalOdd => {
            Ok(Expr::arrow(Expr::Natural, Expr::Bool))
        }
        Expr::NaturalPlus(l, r) => {
            for &operand in &[l.as_ref(), r.as_ref()] {
                let operand_type = normalize(&type_with(context, operand)?);
                if operand_type != Expr::Natural {
                    return Err(TypeError::new(
                        context,
                        expr,
                        TypeMessage::CantAdd(operand.clone(), operand_type),
                    ));
                }
            }
            Ok(Expr::Natural)
        }
        Expr::NaturalTimes(l, r) => {
            for &operand in &[l.as_ref(), r.as_ref()] {
                let operand_type = normalize(&type_with(context, operand)?);
                if operand_type != Expr::Natural {
                    return Err(TypeError::new(
                        context,
                        expr,
                        TypeMessage::CantMultiply(operand.clone(), operand_type),
                    ));
                }
            }
            Ok(Expr::Natural)
        }

        Expr::IntegerLit(_) => Ok(Expr::Integer),
        Expr::DoubleLit(_) => Ok(Expr::Double),

        Expr::TextLit(_) => Ok(Expr::Text),
        Expr::TextAppend(l, r) => {
            for &operand in &[l.as_ref(), r.as_ref()] {
                let operand_type = normalize(&type_with(context, operand)?);
                if operand_type != Expr::Text {
                    return Err(TypeError::new(
                        context,
                        expr,
                        TypeMessage::CantAppend(operand.clone(), operand_type),
                    ));
                }
            }
            Ok(Expr::Text)
        }

        Expr::Maybe(elem_type) => match normalize(&type_with(context, elem_type)?) {
            Expr::Const(Const::Type) => Ok(Expr::Const(Const::Type)),
            _ => Err(TypeError::new(
                context,
                expr,
                TypeMessage::InvalidMaybeTypeParam(elem_type.as_ref().clone()),
            )),
        },
        Expr::Nothing => Ok(Expr::pi(
            "a",
            Expr::Const(Const::Type),
            Expr::Maybe(Arc::new(Expr::var("a"))),
        )),
        Expr::Just => Ok(Expr::pi(
            "a",
            Expr::Const(Const::Type),
            Expr::arrow(Expr::var("a"), Expr::Maybe(Arc::new(Expr::var("a")))),
        )),

        Expr::List(elem_type) => match normalize(&type_with(context, elem_type)?) {
            Expr::Const(Const::Type) => Ok(Expr::Const(Const::Type)),
            _ => Err(TypeError::new(
                context,
                expr,
                TypeMessage::InvalidListTypeParam(elem_type.as_ref().clone()),
            )),
        },
        Expr::ListLit(elem_type, elems) => {
            match normalize(&type_with(context, elem_type)?) {
                Expr::Const(Const::Type) => {}
                _ => {
                    return Err(TypeError::new(
                        context,
                        expr,
                        TypeMessage::InvalidListType(elem_type.as_ref().clone()),
                    ));
                }
            }
            for (index, elem) in elems.iter().enumerate() {
                let found_type = type_with(context, elem)?;
                if elem_type.as_ref() != &found_type {
                    return Err(TypeError::new(
                        context,
                        expr,
                        TypeMessage::InvalidElement(
                            index,
                            elem.clone(),
                            normalize(elem_type),
                            normalize(&found_type),
                        ),
                    ));
                }
            }
            Ok(Expr::List(elem_type.clone()))
        }
        Expr::ListBuild => Ok(Expr::pi(
            "a",
            Expr::Const(Const::Type),
            Expr::arrow(
                Expr::pi(
                    "list",
                    Expr::Const(Const::Type),
                    Expr::pi(
                        "cons",
                        Expr::arrow(
                            Expr::var("a"),
                            Expr::arrow(Expr::var("list"), Expr::var("list")),
                        ),
                        Expr::pi("nil", Expr::var("list"), Expr::var("list")),
                    ),
                ),
                Expr::List(Arc::new(Expr::var("a"))),
            ),
        )),
        Expr::ListFold => Ok(Expr::pi(
            "a",
            Expr::Const(Const::Type),
            Expr::arrow(
                Expr::List(Arc::new(Expr::var("a"))),
                Expr::pi(
                    "list",
                    Expr::Const(Const::Type),
                    Expr::pi(
                        "cons",
                        Expr::arrow(
                            Expr::var("a"),
                            Expr::arrow(Expr::var("list"), Expr::var("list")),
                        ),
                        Expr::pi("nil", Expr::var("list"), Expr::var("list")),
                    ),
                ),
            ),
        )),

        Expr::Record(field_types) => {
            for (label, field_type) in field_types {
                match normalize(&type_with(context, field_type)?) {
                    Expr::Const(Const::Type) => {}
                    _ => {
                        return Err(TypeError::new(
                            context,
                            expr,
                            TypeMessage::InvalidFieldType(label.clone(), field_type.clone()),
                        ));
                    }
                }
            }
            Ok(Expr::Const(Const::Type))
        }
        Expr::RecordLit(fields) => {
            let mut field_types = BTreeMap::new();
            for (label, field) in fields {
                field_types.insert(label.clone(), type_with(context, field)?);
            }
            Ok(Expr::Record(field_types))
        }
        Expr::Field(record, label) => match normalize(&type_with(context, record)?) {
            Expr::Record(field_types) => match field_types.get(label) {
                Some(field_type) => Ok(field_type.clone()),
                None => Err(TypeError::new(
                    context,
                    expr,
                    TypeMessage::MissingField(label.clone(), Expr::Record(field_types)),
                )),
            },
            record_type => Err(TypeError::new(
                context,
                expr,
                TypeMessage::NotARecord(label.clone(), record.as_ref().clone(), record_type),
            )),
        },

        Expr::Embed(payload) => payload.unreachable(),
    }
}

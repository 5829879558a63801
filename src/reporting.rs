//! Diagnostic messages produced by the type checker.
//!
//! Type errors are ordinary values: a [`TypeError`] carries the typing
//! context, the smallest enclosing expression at which a rule failed, and a
//! [`TypeMessage`] from a closed set of failure reasons. Errors render as
//! plain text via [`Display`][std::fmt::Display], or as [`Diagnostic`]s for
//! terminal reporting.

use codespan_reporting::diagnostic::Diagnostic;
use num_bigint::Sign;
use std::fmt;

use crate::core::context::Context;
use crate::core::pretty::pretty;
use crate::core::{Const, Expr, Label, X};

/// The closed set of reasons type synthesis can fail.
///
/// Expressions carried here have already been normalized where the rules
/// call for it, so they render the way the user should read them.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeMessage {
    /// A variable with no binding in the context.
    UnboundVariable,
    /// A function input annotation that is not a type or kind.
    InvalidInputType(Expr<X>),
    /// A function output that is not a type or kind.
    InvalidOutputType(Expr<X>),
    /// Application of an expression whose type is not a function type.
    NotAFunction(Expr<X>),
    /// A function argument whose type does not match the function's input
    /// type: expected, then found.
    TypeMismatch(Expr<X>, Expr<X>),
    /// An annotated expression whose inferred type disagrees with the
    /// annotation: the expression, the annotation, the inferred type.
    AnnotMismatch(Expr<X>, Expr<X>, Expr<X>),
    /// A sort with no type; only `Kind` has none.
    Untyped(Const),
    /// A list element whose type does not match the annotation: the element
    /// index, the element, the annotated type, the element's type.
    InvalidElement(usize, Expr<X>, Expr<X>, Expr<X>),
    /// An argument to `Maybe` that is not a type.
    InvalidMaybeTypeParam(Expr<X>),
    /// An argument to `List` that is not a type.
    InvalidListTypeParam(Expr<X>),
    /// A list annotation that is not a type.
    InvalidListType(Expr<X>),
    /// An `if` predicate that is not a `Bool`: the predicate and its type.
    InvalidPredicate(Expr<X>, Expr<X>),
    /// Diverging `if` branches: the branches, then their types.
    IfBranchMismatch(Expr<X>, Expr<X>, Expr<X>, Expr<X>),
    /// A record field whose declared type is not a type.
    InvalidFieldType(Label, Expr<X>),
    /// Field projection from a non-record: the field, the expression, its
    /// type.
    NotARecord(Label, Expr<X>, Expr<X>),
    /// Projection of a field the record type does not declare.
    MissingField(Label, Expr<X>),
    /// An `&&` operand that is not a `Bool`: whether it was the left
    /// operand, the operand, its type.
    CantAnd(bool, Expr<X>, Expr<X>),
    /// An `||` operand that is not a `Bool`: whether it was the left
    /// operand, the operand, its type.
    CantOr(bool, Expr<X>, Expr<X>),
    /// A `++` operand that is not `Text`: the operand and its type.
    CantAppend(Expr<X>, Expr<X>),
    /// A `+` operand that is not a `Natural`: the operand and its type.
    CantAdd(Expr<X>, Expr<X>),
    /// A `*` operand that is not a `Natural`: the operand and its type.
    CantMultiply(Expr<X>, Expr<X>),
}

impl TypeMessage {
    /// A one-line label for this failure.
    pub fn label(&self) -> &'static str {
        match self {
            TypeMessage::UnboundVariable => "unbound variable",
            TypeMessage::InvalidInputType(_) => "invalid function input type",
            TypeMessage::InvalidOutputType(_) => "invalid function output type",
            TypeMessage::NotAFunction(_) => "only functions can be applied to arguments",
            TypeMessage::TypeMismatch(_, _) => "function argument has the wrong type",
            TypeMessage::AnnotMismatch(_, _, _) => "expression does not match its annotation",
            TypeMessage::Untyped(_) => "no type can be assigned",
            TypeMessage::InvalidElement(_, _, _, _) => "list element has the wrong type",
            TypeMessage::InvalidMaybeTypeParam(_) => "the argument to `Maybe` must be a type",
            TypeMessage::InvalidListTypeParam(_) => "the argument to `List` must be a type",
            TypeMessage::InvalidListType(_) => "invalid list element type annotation",
            TypeMessage::InvalidPredicate(_, _) => "the predicate of `if` must have type `Bool`",
            TypeMessage::IfBranchMismatch(_, _, _, _) => {
                "the branches of `if` must have the same type"
            }
            TypeMessage::InvalidFieldType(_, _) => "record fields must be declared with types",
            TypeMessage::NotARecord(_, _, _) => "only records have fields",
            TypeMessage::MissingField(_, _) => "missing record field",
            TypeMessage::CantAnd(_, _, _) => "the operands of `&&` must have type `Bool`",
            TypeMessage::CantOr(_, _, _) => "the operands of `||` must have type `Bool`",
            TypeMessage::CantAppend(_, _) => "the operands of `++` must have type `Text`",
            TypeMessage::CantAdd(_, _) => "the operands of `+` must have type `Natural`",
            TypeMessage::CantMultiply(_, _) => "the operands of `*` must have type `Natural`",
        }
    }

    /// Explanatory notes, echoing the offending subexpressions.
    pub fn notes(&self) -> Vec<String> {
        match self {
            TypeMessage::UnboundVariable => vec![String::from(
                "the variable is not bound by a lambda, a `let`, or the surrounding context",
            )],
            TypeMessage::InvalidInputType(input_type) => vec![format!(
                "a function input must be a type or a kind, but the input was annotated\n\n    {}",
                pretty(input_type),
            )],
            TypeMessage::InvalidOutputType(output_type) => vec![format!(
                "a function output must be a type or a kind, but the output was\n\n    {}",
                pretty(output_type),
            )],
            TypeMessage::NotAFunction(function) => vec![format!(
                "this expression is not a function, so it cannot be applied\n\n    {}",
                pretty(function),
            )],
            TypeMessage::TypeMismatch(expected, found) => vec![[
                format!("expected `{}`", pretty(expected)),
                format!("   found `{}`", pretty(found)),
            ]
            .join("\n")],
            TypeMessage::AnnotMismatch(expr, annotation, found) => vec![
                format!("the annotated expression was\n\n    {}", pretty(expr)),
                [
                    format!("annotated `{}`", pretty(annotation)),
                    format!("    found `{}`", pretty(found)),
                ]
                .join("\n"),
            ],
            TypeMessage::Untyped(constant) => {
                vec![format!("`{}` is the top of the hierarchy and has no type", constant)]
            }
            TypeMessage::InvalidElement(index, elem, expected, found) => vec![
                format!(
                    "the element at index {} was\n\n    {}",
                    index,
                    pretty(elem),
                ),
                [
                    format!("expected `{}`", pretty(expected)),
                    format!("   found `{}`", pretty(found)),
                ]
                .join("\n"),
            ],
            TypeMessage::InvalidMaybeTypeParam(expr) => vec![format!(
                "`Maybe` was applied to\n\n    {}\n\nwhich is not a type",
                pretty(expr),
            )],
            TypeMessage::InvalidListTypeParam(expr) => vec![format!(
                "`List` was applied to\n\n    {}\n\nwhich is not a type",
                pretty(expr),
            )],
            TypeMessage::InvalidListType(expr) => vec![format!(
                "the list was annotated with\n\n    {}\n\nwhich is not a type",
                pretty(expr),
            )],
            TypeMessage::InvalidPredicate(predicate, found) => vec![
                format!("the predicate was\n\n    {}", pretty(predicate)),
                [
                    String::from("expected `Bool`"),
                    format!("   found `{}`", pretty(found)),
                ]
                .join("\n"),
            ],
            TypeMessage::IfBranchMismatch(if_true, if_false, true_type, false_type) => vec![
                format!(
                    "the `then` branch `{}` has type `{}`",
                    pretty(if_true),
                    pretty(true_type),
                ),
                format!(
                    "the `else` branch `{}` has type `{}`",
                    pretty(if_false),
                    pretty(false_type),
                ),
            ],
            TypeMessage::InvalidFieldType(label, field_type) => vec![format!(
                "the field `{}` was declared with\n\n    {}\n\nwhich is not a type",
                label,
                pretty(field_type),
            )],
            TypeMessage::NotARecord(label, record, found) => vec![
                format!(
                    "the field `{}` was projected from\n\n    {}",
                    label,
                    pretty(record),
                ),
                [
                    String::from("expected a record"),
                    format!("   found `{}`", pretty(found)),
                ]
                .join("\n"),
            ],
            TypeMessage::MissingField(label, record_type) => vec![format!(
                "the record type `{}` has no field `{}`",
                pretty(record_type),
                label,
            )],
            TypeMessage::CantAnd(left, operand, found) => {
                operand_notes("&&", "Bool", *left, operand, found)
            }
            TypeMessage::CantOr(left, operand, found) => {
                operand_notes("||", "Bool", *left, operand, found)
            }
            TypeMessage::CantAppend(operand, found) => vec![format!(
                "the operand `{}` has type `{}`",
                pretty(operand),
                pretty(found),
            )],
            TypeMessage::CantAdd(operand, found) | TypeMessage::CantMultiply(operand, found) => {
                let mut notes = vec![format!(
                    "the operand `{}` has type `{}`",
                    pretty(operand),
                    pretty(found),
                )];
                notes.extend(natural_literal_hint(operand));
                notes
            }
        }
    }

    /// Render this message as a diagnostic for terminal reporting.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::error()
            .with_message(self.label())
            .with_notes(self.notes())
    }
}

fn operand_notes(
    operator: &str,
    expected: &str,
    left: bool,
    operand: &Expr<X>,
    found: &Expr<X>,
) -> Vec<String> {
    let side = if left { "left" } else { "right" };
    vec![format!(
        "the {} operand of `{}` was `{}`, which has type `{}` instead of `{}`",
        side,
        operator,
        pretty(operand),
        pretty(found),
        expected,
    )]
}

/// Suggest the `+n` spelling when a signed literal shows up where a natural
/// number was wanted.
fn natural_literal_hint(operand: &Expr<X>) -> Option<String> {
    match operand {
        Expr::IntegerLit(n) if n.sign() != Sign::Minus => Some(format!(
            "hint: `{}` is an `Integer` literal; write `+{}` for a `Natural`",
            n, n,
        )),
        _ => None,
    }
}

impl fmt::Display for TypeMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: {}", self.label())?;
        for note in self.notes() {
            write!(f, "\n\n{}", note)?;
        }
        Ok(())
    }
}

/// A type synthesis failure.
///
/// Carries the typing context at the point of failure and the smallest
/// enclosing expression at which the rule failed.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeError {
    pub context: Context<Expr<X>>,
    pub expr: Expr<X>,
    pub message: TypeMessage,
}

impl TypeError {
    pub fn new(context: &Context<Expr<X>>, expr: &Expr<X>, message: TypeMessage) -> TypeError {
        TypeError {
            context: context.clone(),
            expr: expr.clone(),
            message,
        }
    }

    /// Render this error as a diagnostic for terminal reporting.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let mut notes = self.message.notes();
        notes.push(format!("in the expression `{}`", pretty(&self.expr)));

        Diagnostic::error()
            .with_message(self.message.label())
            .with_notes(notes)
    }
}

impl fmt::Display for TypeError {
    /// The context, oldest binding first, followed by the message.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<_> = self.context.iter().collect();
        for (name, entry_type) in entries.iter().rev() {
            writeln!(f, "{} : {}", name, pretty(entry_type))?;
        }
        if !entries.is_empty() {
            writeln!(f)?;
        }
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TypeError {}

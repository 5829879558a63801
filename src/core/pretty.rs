//! Pretty printing of core expressions in the surface syntax.
//!
//! The canonical rendering: record types use double braces, record literals
//! single braces, natural literals carry a leading `+`, and an empty list
//! keeps its element type as `[ : t ]`.

use pretty::{BoxAllocator, DocAllocator, DocBuilder};
use std::fmt;

use crate::core::Expr;

/// Precedence levels, loosest binding first. A construct is parenthesized
/// when it appears in a position of higher precedence than its own.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Prec {
    /// Annotations.
    Term = 0,
    /// Binders: `λ`, `∀`, `→`, `let`, `if`.
    Arrow,
    /// Binary operators.
    Op,
    /// Application.
    App,
    /// Variables, literals, lists, records.
    Atomic,
}

/// Render an expression to a string in the canonical surface syntax.
pub fn pretty<A: fmt::Display>(expr: &Expr<A>) -> String {
    let alloc = BoxAllocator;
    let doc = from_expr(&alloc, expr).1.pretty(std::usize::MAX).to_string();
    doc
}

pub fn from_expr<'a, D, A>(alloc: &'a D, expr: &'a Expr<A>) -> DocBuilder<'a, D>
where
    D: DocAllocator<'a>,
    D::Doc: Clone,
    A: fmt::Display,
{
    from_expr_prec(alloc, expr, Prec::Term)
}

pub fn from_expr_prec<'a, D, A>(alloc: &'a D, expr: &'a Expr<A>, prec: Prec) -> DocBuilder<'a, D>
where
    D: DocAllocator<'a>,
    D::Doc: Clone,
    A: fmt::Display,
{
    match expr {
        Expr::Const(constant) => alloc.as_string(constant),
        Expr::Var(name) => alloc.as_string(name),

        Expr::Lam(name, input_type, body) => paren(
            alloc,
            prec > Prec::Arrow,
            (alloc.nil())
                .append("λ(")
                .append(alloc.as_string(name))
                .append(alloc.space())
                .append(":")
                .append(alloc.space())
                .append(from_expr_prec(alloc, input_type, Prec::Term))
                .append(")")
                .append(alloc.space())
                .append("→")
                .append(alloc.space())
                .append(from_expr_prec(alloc, body, Prec::Arrow)),
        ),
        Expr::Pi(name, input_type, output_type) if name.as_str() == "_" => paren(
            alloc,
            prec > Prec::Arrow,
            (alloc.nil())
                .append(from_expr_prec(alloc, input_type, Prec::Op))
                .append(alloc.space())
                .append("→")
                .append(alloc.space())
                .append(from_expr_prec(alloc, output_type, Prec::Arrow)),
        ),
        Expr::Pi(name, input_type, output_type) => paren(
            alloc,
            prec > Prec::Arrow,
            (alloc.nil())
                .append("∀(")
                .append(alloc.as_string(name))
                .append(alloc.space())
                .append(":")
                .append(alloc.space())
                .append(from_expr_prec(alloc, input_type, Prec::Term))
                .append(")")
                .append(alloc.space())
                .append("→")
                .append(alloc.space())
                .append(from_expr_prec(alloc, output_type, Prec::Arrow)),
        ),
        Expr::App(function, argument) => paren(
            alloc,
            prec > Prec::App,
            (alloc.nil())
                .append(from_expr_prec(alloc, function, Prec::App))
                .append(alloc.space())
                .append(from_expr_prec(alloc, argument, Prec::Atomic)),
        ),
        Expr::Let(bindings, body) => paren(
            alloc,
            prec > Prec::Arrow,
            (alloc.nil())
                .append(alloc.intersperse(
                    bindings.iter().map(|binding| {
                        let args = alloc.concat(binding.args.iter().map(|(arg, arg_type)| {
                            (alloc.nil())
                                .append(alloc.space())
                                .append("(")
                                .append(alloc.as_string(arg))
                                .append(alloc.space())
                                .append(":")
                                .append(alloc.space())
                                .append(from_expr_prec(alloc, arg_type, Prec::Term))
                                .append(")")
                        }));

                        (alloc.nil())
                            .append("let")
                            .append(alloc.space())
                            .append(alloc.as_string(&binding.name))
                            .append(args)
                            .append(alloc.space())
                            .append("=")
                            .append(alloc.space())
                            .append(from_expr_prec(alloc, &binding.rhs, Prec::Term))
                    }),
                    alloc.space(),
                ))
                .append(alloc.space())
                .append("in")
                .append(alloc.space())
                .append(from_expr_prec(alloc, body, Prec::Arrow)),
        ),
        Expr::Annot(inner, annotation) => paren(
            alloc,
            prec > Prec::Term,
            (alloc.nil())
                .append(from_expr_prec(alloc, inner, Prec::Arrow))
                .append(alloc.space())
                .append(":")
                .append(alloc.space())
                .append(from_expr_prec(alloc, annotation, Prec::Term)),
        ),

        Expr::Bool => alloc.text("Bool"),
        Expr::BoolLit(true) => alloc.text("True"),
        Expr::BoolLit(false) => alloc.text("False"),
        Expr::BoolAnd(l, r) => from_operator(alloc, prec, "&&", l, r),
        Expr::BoolOr(l, r) => from_operator(alloc, prec, "||", l, r),
        Expr::BoolIf(predicate, if_true, if_false) => paren(
            alloc,
            prec > Prec::Arrow,
            (alloc.nil())
                .append("if")
                .append(alloc.space())
                .append(from_expr_prec(alloc, predicate, Prec::Op))
                .append(alloc.space())
                .append("then")
                .append(alloc.space())
                .append(from_expr_prec(alloc, if_true, Prec::Op))
                .append(alloc.space())
                .append("else")
                .append(alloc.space())
                .append(from_expr_prec(alloc, if_false, Prec::Arrow)),
        ),

        Expr::Natural => alloc.text("Natural"),
        Expr::NaturalLit(n) => alloc.text("+").append(alloc.as_string(n)),
        Expr::NaturalFold => alloc.text("Natural/fold"),
        Expr::NaturalBuild => alloc.text("Natural/build"),
        Expr::NaturalIsZero => alloc.text("Natural/isZero"),
        Expr::NaturalEven => alloc.text("Natural/even"),
        Expr::NaturalOdd => alloc.text("Natural/odd"),
        Expr::NaturalPlus(l, r) => from_operator(alloc, prec, "+", l, r),
        Expr::NaturalTimes(l, r) => from_operator(alloc, prec, "*", l, r),

        Expr::Integer => alloc.text("Integer"),
        Expr::IntegerLit(n) => alloc.as_string(n),

        Expr::Double => alloc.text("Double"),
        Expr::DoubleLit(x) => alloc.as_string(x),

        Expr::Text => alloc.text("Text"),
        Expr::TextLit(text) => alloc.text(format!("{:?}", text)),
        Expr::TextAppend(l, r) => from_operator(alloc, prec, "++", l, r),

        Expr::Maybe(elem_type) => paren(
            alloc,
            prec > Prec::App,
            (alloc.nil())
                .append("Maybe")
                .append(alloc.space())
                .append(from_expr_prec(alloc, elem_type, Prec::Atomic)),
        ),
        Expr::Nothing => alloc.text("Nothing"),
        Expr::Just => alloc.text("Just"),

        Expr::List(elem_type) => paren(
            alloc,
            prec > Prec::App,
            (alloc.nil())
                .append("List")
                .append(alloc.space())
                .append(from_expr_prec(alloc, elem_type, Prec::Atomic)),
        ),
        Expr::ListLit(elem_type, elems) => {
            let elems = match elems.as_slice() {
                [] => alloc.nil(),
                elems => (alloc.nil())
                    .append(alloc.intersperse(
                        elems
                            .iter()
                            .map(|elem| from_expr_prec(alloc, elem, Prec::Op)),
                        alloc.text(",").append(alloc.space()),
                    ))
                    .append(alloc.space()),
            };

            (alloc.nil())
                .append("[")
                .append(alloc.space())
                .append(elems)
                .append(":")
                .append(alloc.space())
                .append(from_expr_prec(alloc, elem_type, Prec::Term))
                .append(alloc.space())
                .append("]")
        }
        Expr::ListBuild => alloc.text("List/build"),
        Expr::ListFold => alloc.text("List/fold"),

        Expr::Record(field_types) if field_types.is_empty() => alloc.text("{{}}"),
        Expr::Record(field_types) => (alloc.nil())
            .append("{{")
            .append(alloc.space())
            .append(alloc.intersperse(
                field_types.iter().map(|(label, field_type)| {
                    (alloc.nil())
                        .append(alloc.as_string(label))
                        .append(alloc.space())
                        .append(":")
                        .append(alloc.space())
                        .append(from_expr_prec(alloc, field_type, Prec::Term))
                }),
                alloc.text(",").append(alloc.space()),
            ))
            .append(alloc.space())
            .append("}}"),
        Expr::RecordLit(fields) if fields.is_empty() => alloc.text("{}"),
        Expr::RecordLit(fields) => (alloc.nil())
            .append("{")
            .append(alloc.space())
            .append(alloc.intersperse(
                fields.iter().map(|(label, field)| {
                    (alloc.nil())
                        .append(alloc.as_string(label))
                        .append(alloc.space())
                        .append("=")
                        .append(alloc.space())
                        .append(from_expr_prec(alloc, field, Prec::Term))
                }),
                alloc.text(",").append(alloc.space()),
            ))
            .append(alloc.space())
            .append("}"),
        Expr::Field(record, label) => (alloc.nil())
            .append(from_expr_prec(alloc, record, Prec::Atomic))
            .append(".")
            .append(alloc.as_string(label)),

        Expr::Embed(payload) => alloc.as_string(payload),
    }
}

fn from_operator<'a, D, A>(
    alloc: &'a D,
    prec: Prec,
    operator: &'a str,
    l: &'a Expr<A>,
    r: &'a Expr<A>,
) -> DocBuilder<'a, D>
where
    D: DocAllocator<'a>,
    D::Doc: Clone,
    A: fmt::Display,
{
    paren(
        alloc,
        prec > Prec::Op,
        (alloc.nil())
            .append(from_expr_prec(alloc, l, Prec::App))
            .append(alloc.space())
            .append(operator)
            .append(alloc.space())
            .append(from_expr_prec(alloc, r, Prec::App)),
    )
}

fn paren<'a, D>(alloc: &'a D, b: bool, doc: DocBuilder<'a, D>) -> DocBuilder<'a, D>
where
    D: DocAllocator<'a>,
    D::Doc: Clone,
{
    if b {
        alloc.text("(").append(doc).append(")")
    } else {
        doc
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use super::*;
    use crate::core::{Label, LetBinding, X};

    fn record(fields: Vec<(&str, Expr<X>)>) -> BTreeMap<Label, Expr<X>> {
        fields
            .into_iter()
            .map(|(label, field)| (Label::from(label), field))
            .collect()
    }

    #[test]
    fn lambda() {
        let expr: Expr<X> = Expr::lam("x", Expr::Bool, Expr::var("x"));
        assert_eq!(pretty(&expr), "λ(x : Bool) → x");
    }

    #[test]
    fn function_types() {
        let non_dependent: Expr<X> = Expr::arrow(Expr::Bool, Expr::Bool);
        assert_eq!(pretty(&non_dependent), "Bool → Bool");

        let dependent: Expr<X> = Expr::pi(
            "a",
            Expr::Const(crate::core::Const::Type),
            Expr::arrow(Expr::var("a"), Expr::var("a")),
        );
        assert_eq!(pretty(&dependent), "∀(a : Type) → a → a");
    }

    #[test]
    fn application_parenthesizes_binders() {
        let expr: Expr<X> = Expr::app(
            Expr::lam("x", Expr::Natural, Expr::var("x")),
            Expr::natural(2u32),
        );
        assert_eq!(pretty(&expr), "(λ(x : Natural) → x) +2");
    }

    #[test]
    fn literals() {
        assert_eq!(pretty(&Expr::<X>::natural(2u32)), "+2");
        assert_eq!(pretty(&Expr::<X>::integer(-3)), "-3");
        assert_eq!(pretty(&Expr::<X>::double(1.5)), "1.5");
        assert_eq!(pretty(&Expr::<X>::text("hi")), "\"hi\"");
        assert_eq!(pretty(&Expr::<X>::boolean(true)), "True");
    }

    #[test]
    fn list_literals_keep_their_annotation() {
        let empty: Expr<X> = Expr::ListLit(Arc::new(Expr::Natural), vec![]);
        assert_eq!(pretty(&empty), "[ : Natural ]");

        let full: Expr<X> = Expr::ListLit(
            Arc::new(Expr::Natural),
            vec![Expr::natural(1u32), Expr::natural(2u32)],
        );
        assert_eq!(pretty(&full), "[ +1, +2 : Natural ]");
    }

    #[test]
    fn record_types_use_double_braces() {
        let record_type: Expr<X> = Expr::Record(record(vec![
            ("bar", Expr::Text),
            ("foo", Expr::Bool),
        ]));
        assert_eq!(pretty(&record_type), "{{ bar : Text, foo : Bool }}");

        let record_lit: Expr<X> = Expr::RecordLit(record(vec![
            ("bar", Expr::text("hi")),
            ("foo", Expr::boolean(true)),
        ]));
        assert_eq!(pretty(&record_lit), "{ bar = \"hi\", foo = True }");
    }

    #[test]
    fn field_projection() {
        let expr: Expr<X> = Expr::Field(
            Arc::new(Expr::var("config")),
            Label::from("port"),
        );
        assert_eq!(pretty(&expr), "config.port");
    }

    #[test]
    fn let_block() {
        let expr: Expr<X> = Expr::Let(
            vec![LetBinding {
                name: Label::from("f"),
                args: vec![(Label::from("x"), Arc::new(Expr::Natural))],
                rhs: Arc::new(Expr::var("x")),
            }],
            Arc::new(Expr::app(Expr::var("f"), Expr::natural(1u32))),
        );
        assert_eq!(pretty(&expr), "let f (x : Natural) = x in f +1");
    }

    #[test]
    fn operators_group_left_to_right_with_parens() {
        let expr: Expr<X> = Expr::NaturalPlus(
            Arc::new(Expr::NaturalPlus(
                Arc::new(Expr::natural(1u32)),
                Arc::new(Expr::natural(2u32)),
            )),
            Arc::new(Expr::natural(3u32)),
        );
        assert_eq!(pretty(&expr), "(+1 + +2) + +3");
    }
}

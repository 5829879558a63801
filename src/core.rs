//! The core expression algebra of the Keel configuration language.
//!
//! Expressions are parameterized over the payload type of embedded external
//! references: a parser produces `Expr<Path>`, an import resolver replaces
//! every [`Expr::Embed`] with the expression it refers to, and the type
//! checker consumes `Expr<X>`, where the uninhabited [`X`] witnesses that no
//! references remain.

use num_bigint::{BigInt, BigUint};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::ieee754;

pub mod context;
pub mod pretty;
pub mod semantics;
pub mod typing;

/// A sort: the type of types, or the type of kinds.
///
/// `Type : Kind`, and `Kind` is the top of the hierarchy.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Const {
    Type,
    Kind,
}

impl fmt::Display for Const {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Const::Type => f.write_str("Type"),
            Const::Kind => f.write_str("Kind"),
        }
    }
}

/// A variable name or record field label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label(pub String);

impl Label {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Borrow<str> for Label {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Label {
    fn from(name: &str) -> Label {
        Label(name.to_owned())
    }
}

impl From<String> for Label {
    fn from(name: String) -> Label {
        Label(name)
    }
}

/// An unresolved reference to an external expression.
///
/// The core never inspects these beyond structural equality; resolving them
/// is the import system's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Path {
    /// A reference to an expression in a local file.
    File(PathBuf),
    /// A reference to an expression behind a URL.
    Url(String),
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Path::File(path) => write!(f, "{}", path.display()),
            Path::Url(url) => f.write_str(url),
        }
    }
}

/// The payload type of expressions with no embedded references left.
///
/// There are no values of this type, so an `Expr<X>` is statically known to
/// contain no [`Expr::Embed`] nodes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum X {}

impl X {
    /// Eliminate a value that cannot exist.
    pub fn unreachable<T>(&self) -> T {
        match *self {}
    }
}

impl fmt::Display for X {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

/// A double literal.
///
/// Wrapped so that expression equality can use the logical comparison from
/// [`crate::ieee754`] rather than the IEEE 754 comparison rules.
#[derive(Debug, Copy, Clone)]
pub struct Double(pub f64);

impl PartialEq for Double {
    fn eq(&self, other: &Double) -> bool {
        ieee754::logical_eq(self.0, other.0)
    }
}

impl Eq for Double {}

impl From<f64> for Double {
    fn from(value: f64) -> Double {
        Double(value)
    }
}

impl fmt::Display for Double {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// One binding in a `let` block: `let f (a₁ : t₁) … (aₙ : tₙ) = rhs`.
///
/// Equivalent to binding `f` to `λ(a₁ : t₁) → … → λ(aₙ : tₙ) → rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct LetBinding<A> {
    /// The bound name.
    pub name: Label,
    /// Argument binders, scoped over later argument types and the body.
    pub args: Vec<(Label, Arc<Expr<A>>)>,
    /// The bound expression.
    pub rhs: Arc<Expr<A>>,
}

/// Expressions in the core language.
///
/// Terms, types, and kinds share one syntax; the type checker sorts them
/// out. Record keys are unique and iterate in ascending order, list literals
/// always carry their element type, and natural literals are non-negative.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr<A> {
    /// Sorts.
    Const(Const),
    /// Variables, by name.
    Var(Label),
    /// `λ(x : A) → b`
    Lam(Label, Arc<Expr<A>>, Arc<Expr<A>>),
    /// `∀(x : A) → B`; a binder named `_` is a non-dependent function type.
    Pi(Label, Arc<Expr<A>>, Arc<Expr<A>>),
    /// Function application.
    App(Arc<Expr<A>>, Arc<Expr<A>>),
    /// A block of bindings scoped over a final expression. Each binding may
    /// shadow earlier ones.
    Let(Vec<LetBinding<A>>, Arc<Expr<A>>),
    /// Type ascription.
    Annot(Arc<Expr<A>>, Arc<Expr<A>>),

    /// The type of booleans.
    Bool,
    /// A boolean literal.
    BoolLit(bool),
    /// `l && r`
    BoolAnd(Arc<Expr<A>>, Arc<Expr<A>>),
    /// `l || r`
    BoolOr(Arc<Expr<A>>, Arc<Expr<A>>),
    /// `if b then t else f`
    BoolIf(Arc<Expr<A>>, Arc<Expr<A>>, Arc<Expr<A>>),

    /// The type of non-negative numbers.
    Natural,
    /// A natural number literal.
    NaturalLit(BigUint),
    /// The builtin `Natural/fold` eliminator.
    NaturalFold,
    /// The builtin `Natural/build` constructor.
    NaturalBuild,
    /// The builtin `Natural/isZero` predicate.
    NaturalIsZero,
    /// The builtin `Natural/even` predicate.
    NaturalEven,
    /// The builtin `Natural/odd` predicate.
    NaturalOdd,
    /// `l + r`
    NaturalPlus(Arc<Expr<A>>, Arc<Expr<A>>),
    /// `l * r`
    NaturalTimes(Arc<Expr<A>>, Arc<Expr<A>>),

    /// The type of signed integers.
    Integer,
    /// An integer literal.
    IntegerLit(BigInt),

    /// The type of double-precision floating point numbers.
    Double,
    /// A double literal.
    DoubleLit(Double),

    /// The type of text values.
    Text,
    /// A text literal.
    TextLit(String),
    /// `l ++ r`
    TextAppend(Arc<Expr<A>>, Arc<Expr<A>>),

    /// An optional type, `Maybe t`.
    Maybe(Arc<Expr<A>>),
    /// The empty optional constructor, `∀(a : Type) → Maybe a`.
    Nothing,
    /// The full optional constructor, `∀(a : Type) → a → Maybe a`.
    Just,

    /// A list type, `List t`.
    List(Arc<Expr<A>>),
    /// A list literal with an explicit element type, kept even when the
    /// literal is empty.
    ListLit(Arc<Expr<A>>, Vec<Expr<A>>),
    /// The builtin `List/build` constructor.
    ListBuild,
    /// The builtin `List/fold` eliminator.
    ListFold,

    /// A record type, `{{ k₁ : t₁, … }}`.
    Record(BTreeMap<Label, Expr<A>>),
    /// A record literal, `{ k₁ = v₁, … }`.
    RecordLit(BTreeMap<Label, Expr<A>>),
    /// Field projection, `r.k`.
    Field(Arc<Expr<A>>, Label),

    /// An embedded external reference, opaque to the core.
    Embed(A),
}

impl<A> Expr<A> {
    pub fn var(name: impl Into<Label>) -> Expr<A> {
        Expr::Var(name.into())
    }

    pub fn lam(name: impl Into<Label>, input_type: Expr<A>, body: Expr<A>) -> Expr<A> {
        Expr::Lam(name.into(), Arc::new(input_type), Arc::new(body))
    }

    pub fn pi(name: impl Into<Label>, input_type: Expr<A>, output_type: Expr<A>) -> Expr<A> {
        Expr::Pi(name.into(), Arc::new(input_type), Arc::new(output_type))
    }

    /// A non-dependent function type.
    pub fn arrow(input_type: Expr<A>, output_type: Expr<A>) -> Expr<A> {
        Expr::pi("_", input_type, output_type)
    }

    pub fn app(function: Expr<A>, argument: Expr<A>) -> Expr<A> {
        Expr::App(Arc::new(function), Arc::new(argument))
    }

    pub fn boolean(value: bool) -> Expr<A> {
        Expr::BoolLit(value)
    }

    pub fn natural(value: impl Into<BigUint>) -> Expr<A> {
        Expr::NaturalLit(value.into())
    }

    pub fn integer(value: impl Into<BigInt>) -> Expr<A> {
        Expr::IntegerLit(value.into())
    }

    pub fn double(value: f64) -> Expr<A> {
        Expr::DoubleLit(Double(value))
    }

    pub fn text(value: impl Into<String>) -> Expr<A> {
        Expr::TextLit(value.into())
    }

    /// Replace every embedded reference with a subexpression produced from
    /// its payload.
    ///
    /// Payloads stand for closed expressions, so the replacement passes
    /// under binders without α-conversion.
    pub fn bind<B>(&self, resolve: &impl Fn(&A) -> Expr<B>) -> Expr<B> {
        fn bind_arc<A, B>(expr: &Arc<Expr<A>>, resolve: &impl Fn(&A) -> Expr<B>) -> Arc<Expr<B>> {
            Arc::new(expr.bind(resolve))
        }

        match self {
            Expr::Const(c) => Expr::Const(*c),
            Expr::Var(x) => Expr::Var(x.clone()),
            Expr::Lam(x, input_type, body) => Expr::Lam(
                x.clone(),
                bind_arc(input_type, resolve),
                bind_arc(body, resolve),
            ),
            Expr::Pi(x, input_type, output_type) => Expr::Pi(
                x.clone(),
                bind_arc(input_type, resolve),
                bind_arc(output_type, resolve),
            ),
            Expr::App(function, argument) => {
                Expr::App(bind_arc(function, resolve), bind_arc(argument, resolve))
            }
            Expr::Let(bindings, body) => Expr::Let(
                bindings
                    .iter()
                    .map(|binding| LetBinding {
                        name: binding.name.clone(),
                        args: binding
                            .args
                            .iter()
                            .map(|(arg, arg_type)| (arg.clone(), bind_arc(arg_type, resolve)))
                            .collect(),
                        rhs: bind_arc(&binding.rhs, resolve),
                    })
                    .collect(),
                bind_arc(body, resolve),
            ),
            Expr::Annot(expr, annotation) => {
                Expr::Annot(bind_arc(expr, resolve), bind_arc(annotation, resolve))
            }

            Expr::Bool => Expr::Bool,
            Expr::BoolLit(b) => Expr::BoolLit(*b),
            Expr::BoolAnd(l, r) => Expr::BoolAnd(bind_arc(l, resolve), bind_arc(r, resolve)),
            Expr::BoolOr(l, r) => Expr::BoolOr(bind_arc(l, resolve), bind_arc(r, resolve)),
            Expr::BoolIf(b, t, f) => Expr::BoolIf(
                bind_arc(b, resolve),
                bind_arc(t, resolve),
                bind_arc(f, resolve),
            ),

            Expr::Natural => Expr::Natural,
            Expr::NaturalLit(n) => Expr::NaturalLit(n.clone()),
            Expr::NaturalFold => Expr::NaturalFold,
            Expr::NaturalBuild => Expr::NaturalBuild,
            Expr::NaturalIsZero => Expr::NaturalIsZero,
            Expr::NaturalEven => Expr::NaturalEven,
            Expr::NaturalOdd => Expr::NaturalOdd,
            Expr::NaturalPlus(l, r) => {
                Expr::NaturalPlus(bind_arc(l, resolve), bind_arc(r, resolve))
            }
            Expr::NaturalTimes(l, r) => {
                Expr::NaturalTimes(bind_arc(l, resolve), bind_arc(r, resolve))
            }

            Expr::Integer => Expr::Integer,
            Expr::IntegerLit(n) => Expr::IntegerLit(n.clone()),

            Expr::Double => Expr::Double,
            Expr::DoubleLit(x) => Expr::DoubleLit(*x),

            Expr::Text => Expr::Text,
            Expr::TextLit(s) => Expr::TextLit(s.clone()),
            Expr::TextAppend(l, r) => Expr::TextAppend(bind_arc(l, resolve), bind_arc(r, resolve)),

            Expr::Maybe(elem_type) => Expr::Maybe(bind_arc(elem_type, resolve)),
            Expr::Nothing => Expr::Nothing,
            Expr::Just => Expr::Just,

            Expr::List(elem_type) => Expr::List(bind_arc(elem_type, resolve)),
            Expr::ListLit(elem_type, elems) => Expr::ListLit(
                bind_arc(elem_type, resolve),
                elems.iter().map(|elem| elem.bind(resolve)).collect(),
            ),
            Expr::ListBuild => Expr::ListBuild,
            Expr::ListFold => Expr::ListFold,

            Expr::Record(field_types) => Expr::Record(
                field_types
                    .iter()
                    .map(|(label, field_type)| (label.clone(), field_type.bind(resolve)))
                    .collect(),
            ),
            Expr::RecordLit(fields) => Expr::RecordLit(
                fields
                    .iter()
                    .map(|(label, field)| (label.clone(), field.bind(resolve)))
                    .collect(),
            ),
            Expr::Field(record, label) => Expr::Field(bind_arc(record, resolve), label.clone()),

            Expr::Embed(payload) => resolve(payload),
        }
    }

    /// Apply a function to every embedded payload, leaving the expression
    /// structure untouched.
    pub fn map_embed<B>(&self, f: &impl Fn(&A) -> B) -> Expr<B> {
        self.bind(&|payload| Expr::Embed(f(payload)))
    }
}

impl<A: fmt::Display> fmt::Display for Expr<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self::pretty::pretty(self))
    }
}

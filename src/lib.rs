//! The core type theory of the Keel configuration language.
//!
//! Keel is a total, statically typed configuration language. This crate
//! implements its kernel: the core expression algebra and the pure functions
//! that give it meaning. There is no parser and no interpreter driver here;
//! expressions arrive fully constructed and leave as values.
//!
//! The services provided are:
//!
//! - [`type_of`]/[`type_with`]: synthesize the type of an expression, either
//!   closed or in a context of typings for its free variables.
//! - [`normalize`]: reduce an expression to normal form, including
//!   β-reduction and the rewrite rules for the builtin folds and builders.
//! - [`subst`]: capture-avoiding substitution of a free variable.
//! - [`is_equivalent`]: equivalence of expressions up to α-conversion and
//!   normalization.
//! - [`pretty`]: canonical rendering in the surface syntax.
//!
//! Expressions are parameterized over the payload of embedded external
//! references ([`Expr<A>`][Expr]). A resolver eliminates those references
//! before type checking, witnessed by the uninhabited payload type [`X`].
//!
//! All operations are pure functions over immutable trees: nothing blocks,
//! nothing is retained between calls, and failures are returned as
//! [`TypeError`] values rather than signalled.

pub mod core;
pub mod ieee754;
pub mod reporting;

pub use crate::core::context::Context;
pub use crate::core::pretty::pretty;
pub use crate::core::semantics::{is_equivalent, normalize, subst};
pub use crate::core::typing::{type_of, type_with};
pub use crate::core::{Const, Double, Expr, Label, LetBinding, Path, X};
pub use crate::reporting::{TypeError, TypeMessage};

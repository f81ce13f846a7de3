//! # tuplecmp
//!
//! Binding and lowering of structural equality (`==`/`!=`) over
//! tuple-shaped operands, as one pass of a compiler front-end.
//!
//! Given two operand expressions that the host binder has already
//! resolved, the pass decides whether the comparison is well-formed,
//! builds a recursive element-wise comparison plan, and emits a
//! side-effect-correct, short-circuiting lowered expression for the code
//! generator.
//!
//! ## Pipeline
//!
//! ```text
//! operands -> classify -> cardinality -> element resolution -+
//!                                         (recursive, with   |
//!                                          nullable lifting) |
//!                                                            v
//!   code generator <- result coercion <- short-circuit tree <- temporization
//! ```
//!
//! ## Quick start
//!
//! ```rust
//! use tuplecmp::hir::{EqOp, Expr, TypeTable};
//! use tuplecmp::{EqualityBinder, TupleEqualityBinding};
//! use tuplecmp::span::Span;
//!
//! let table = TypeTable::new();
//! let mut binder = EqualityBinder::new(&table);
//!
//! let left = Expr::tuple(vec![Expr::int(1), Expr::int(2)]);
//! let right = Expr::tuple(vec![Expr::int(1), Expr::int(2)]);
//! match binder.bind(EqOp::Equal, &left, &right, Span::dummy()) {
//!     TupleEqualityBinding::Bound(bound) => {
//!         assert_eq!(bound.plan.arity(), Some(2));
//!     }
//!     TupleEqualityBinding::NotTupleComparison => unreachable!(),
//! }
//! assert!(binder.take_diagnostics().is_empty());
//! ```
//!
//! ## Module overview
//!
//! - [`hir`] - the semantic input model: types, user-type definitions,
//!   bound operand expressions
//! - [`binder`] - classification, cardinality matching, per-element
//!   strategy resolution, and the comparison plan with its query surface
//! - [`lower`] - temporization, null-lifting expansion, short-circuit
//!   tree construction, and boolean result coercion
//! - [`diagnostics`] - collected diagnostics, error codes, rendering
//! - [`span`] - source spans

pub mod binder;
pub mod diagnostics;
pub mod hir;
pub mod lower;
pub mod span;

pub use binder::{
    BoundEquality, ComparisonPlan, EqualityBinder, LiftMode, PlanNode, TupleEqualityBinding,
};
pub use diagnostics::{Diagnostic, DiagnosticBag, DiagnosticEmitter, ErrorCode};
pub use lower::{LoweredExpr, TempId, Temporary};

//! Semantic input model for tuple-comparison binding.
//!
//! The pass consumes operand expressions that the host binder has already
//! name-resolved and typed. This module defines that surface:
//!
//! - [`Type`] - resolved types, including tuple shapes, nullable wrappers,
//!   and the dynamic type
//! - [`TypeTable`] / [`TypeDef`] - user-defined types with their equality
//!   operators, implicit conversions, and truth-testing operators
//! - [`Expr`] - bound operand expressions (literals, locals, calls,
//!   tuple literals, decomposition results)

pub mod def;
pub mod expr;
pub mod ty;

pub use def::{
    ConvRef, DefId, Deprecation, DeprecationLevel, ImplicitConversionDef, LocalId, OpRef,
    OperatorDef, OperatorKind, TypeDef, TypeTable,
};
pub use expr::{EqOp, Expr, ExprKind, Literal, TupleLitElem};
pub use ty::{PrimitiveTy, TupleElem, Type, TypeKind, INLINE_WIDTH};

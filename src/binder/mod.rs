//! Binding of `==`/`!=` over tuple-shaped operands.
//!
//! The pipeline, leaves first: shape classification, cardinality
//! matching, per-element strategy resolution (recursing through nested
//! tuples and nullable wrappers), then lowering: operand temporization,
//! null-lifting expansion, short-circuit tree construction, and boolean
//! result coercion.
//!
//! One [`EqualityBinder`] binds one expression at a time; nothing
//! persists across calls, and the bound result is handed off read-only.
//! Diagnostics accumulate in the binder and are drained by the caller.

pub mod classify;
pub mod ops;
pub mod plan;
mod resolve;

pub use classify::{ElementSlot, OperandShape, TupleShape};
pub use plan::{ComparisonPlan, LiftMode, PlanNode};

use crate::diagnostics::{Diagnostic, DiagnosticBag};
use crate::hir::{EqOp, Expr, Type, TypeTable};
use crate::lower::{tree, LoweredExpr};
use crate::span::Span;

use resolve::Resolver;

/// The outcome of asking the pass to bind a comparison.
#[derive(Debug)]
pub enum TupleEqualityBinding {
    /// Neither operand is tuple-shaped; the host's standard binary
    /// operator binding owns this expression.
    NotTupleComparison,
    /// The pass bound the comparison, successfully or error-typed.
    Bound(BoundEquality),
}

/// A bound tuple comparison: the plan (and its query surface), the
/// lowered tree for the code generator, and the result type.
#[derive(Debug)]
pub struct BoundEquality {
    pub op: EqOp,
    pub plan: ComparisonPlan,
    /// The lowered expression; [`LoweredExpr::Error`] when the binding is
    /// error-typed.
    pub lowered: LoweredExpr,
    /// `bool`, or the error type when any error diagnostic was reported.
    pub ty: Type,
}

/// Binds tuple equality expressions against one type table.
pub struct EqualityBinder<'a> {
    table: &'a TypeTable,
    diags: DiagnosticBag,
}

impl<'a> EqualityBinder<'a> {
    pub fn new(table: &'a TypeTable) -> Self {
        Self {
            table,
            diags: DiagnosticBag::new(),
        }
    }

    /// Bind one `==`/`!=` expression. `span` is the whole comparison's
    /// source range; structural diagnostics anchor there.
    pub fn bind(
        &mut self,
        op: EqOp,
        left: &Expr,
        right: &Expr,
        span: Span,
    ) -> TupleEqualityBinding {
        if !classify::is_tuple_comparison(left, right) {
            return TupleEqualityBinding::NotTupleComparison;
        }

        let already_reported = self.diags.diagnostics().len();
        let root = Resolver::new(self.table, &mut self.diags, op, span).build(left, right);
        let plan = ComparisonPlan::new(root);

        let has_errors = self.diags.diagnostics()[already_reported..]
            .iter()
            .any(Diagnostic::is_error);
        if has_errors {
            return TupleEqualityBinding::Bound(BoundEquality {
                op,
                plan,
                lowered: LoweredExpr::Error,
                ty: Type::error(),
            });
        }

        let lowered = tree::lower_comparison(op, &plan, left, right);
        TupleEqualityBinding::Bound(BoundEquality {
            op,
            plan,
            lowered,
            ty: Type::bool_(),
        })
    }

    /// The diagnostics reported so far, in order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diags.diagnostics()
    }

    /// Drain the accumulated diagnostics.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diags.take()
    }
}

//! Expansion of nullable-wrapped tuple comparisons into has-value logic.
//!
//! For two nullable operands, `==` becomes
//! `(leftHasValue == rightHasValue) && (!leftHasValue || elements)` and
//! `!=` is built directly as the disjunction
//! `(leftHasValue != rightHasValue) || (leftHasValue && elements)` — not
//! as a negation of the `==` tree — so it exits on the first detected
//! mismatch. The elementwise tree sits only on the both-present path;
//! the null path never contains it.
//!
//! Each has-value predicate is evaluated exactly once: the left one is
//! cached in a boolean temporary (it is read twice), the right one is
//! read inline (once). A side known non-nullable contributes no has-value
//! check at all. Unwrapped values are cached so the unwrap accessor runs
//! once per operand.

use crate::binder::ops::{BuiltinComparison, OperatorChoice};
use crate::binder::plan::{LiftMode, PlanNode};
use crate::hir::{EqOp, Type};
use crate::span::Span;

use super::temps::OperandValue;
use super::tree::TreeBuilder;
use super::LoweredExpr;

/// Expand one lifted node. `element` is `None` exactly for the collapsed
/// modes (nullable tuple against bare `null`/`default`), which reduce to
/// the has-value predicate alone.
pub(crate) fn expand(
    builder: &mut TreeBuilder<'_>,
    mode: LiftMode,
    element: Option<&PlanNode>,
    left: &OperandValue,
    right: &OperandValue,
) -> LoweredExpr {
    let op = builder.op;
    match mode {
        LiftMode::LeftVsAbsent => collapsed(op, left),
        LiftMode::AbsentVsRight => collapsed(op, right),
        LiftMode::LeftNullable => {
            one_sided(builder, element.expect("elementwise mode"), op, left, right, true)
        }
        LiftMode::RightNullable => {
            one_sided(builder, element.expect("elementwise mode"), op, left, right, false)
        }
        LiftMode::BothNullable => {
            both_nullable(builder, element.expect("elementwise mode"), op, left, right)
        }
    }
}

/// Nullable tuple against a bare `null`/`default`: the comparison is the
/// has-value predicate and nothing else.
fn collapsed(op: EqOp, nullable_side: &OperandValue) -> LoweredExpr {
    let (value, _) = nullable_parts(nullable_side);
    match op {
        EqOp::Equal => LoweredExpr::not(LoweredExpr::has_value(value)),
        EqOp::NotEqual => LoweredExpr::has_value(value),
    }
}

/// One nullable side against an always-present one. The present side's
/// has-value check is omitted from the tree entirely.
fn one_sided(
    builder: &mut TreeBuilder<'_>,
    element: &PlanNode,
    op: EqOp,
    left: &OperandValue,
    right: &OperandValue,
    left_is_nullable: bool,
) -> LoweredExpr {
    let (nullable_side, present_side) = if left_is_nullable {
        (left, right)
    } else {
        (right, left)
    };

    let (value, inner_ty) = nullable_parts(nullable_side);
    let has = LoweredExpr::has_value(value.clone());

    let (unwrapped, temp) = unwrap_to_temp(builder, value, inner_ty);
    let elements = if left_is_nullable {
        builder.build(element, &unwrapped, present_side)
    } else {
        builder.build(element, present_side, &unwrapped)
    };
    let elements = LoweredExpr::seq(vec![temp], elements);

    match op {
        EqOp::Equal => LoweredExpr::and(has, elements),
        EqOp::NotEqual => LoweredExpr::or(LoweredExpr::not(has), elements),
    }
}

/// Both sides nullable: test both has-value predicates, then compare
/// elements only when both are present.
fn both_nullable(
    builder: &mut TreeBuilder<'_>,
    element: &PlanNode,
    op: EqOp,
    left: &OperandValue,
    right: &OperandValue,
) -> LoweredExpr {
    let (l_value, l_inner) = nullable_parts(left);
    let (r_value, r_inner) = nullable_parts(right);

    // The left predicate is read twice; cache it. The right one is read
    // once, inline, after the left in program order.
    let l_has = builder.alloc.fresh(
        Type::bool_(),
        LoweredExpr::has_value(l_value.clone()),
        Span::dummy(),
    );
    let l_has_ref = LoweredExpr::TempRef(l_has.id);
    let r_has = LoweredExpr::has_value(r_value.clone());

    let elements = {
        let (l_unwrapped, l_temp) = unwrap_to_temp(builder, l_value, l_inner);
        let (r_unwrapped, r_temp) = unwrap_to_temp(builder, r_value, r_inner);
        let tree = builder.build(element, &l_unwrapped, &r_unwrapped);
        LoweredExpr::seq(vec![l_temp, r_temp], tree)
    };

    let has_compare = LoweredExpr::Compare {
        operator: OperatorChoice::Builtin(BuiltinComparison::Bool),
        op,
        lifted: false,
        lhs: Box::new(l_has_ref.clone()),
        rhs: Box::new(r_has),
    };

    let body = match op {
        EqOp::Equal => LoweredExpr::and(
            has_compare,
            LoweredExpr::or(LoweredExpr::not(l_has_ref), elements),
        ),
        EqOp::NotEqual => LoweredExpr::or(
            has_compare,
            LoweredExpr::and(l_has_ref, elements),
        ),
    };
    LoweredExpr::seq(vec![l_has], body)
}

/// Cache the unwrapped tuple value in its own temporary so the unwrap
/// accessor runs exactly once.
fn unwrap_to_temp(
    builder: &mut TreeBuilder<'_>,
    value: LoweredExpr,
    inner_ty: Type,
) -> (OperandValue, super::Temporary) {
    let temp = builder.alloc.fresh(
        inner_ty.clone(),
        LoweredExpr::Unwrap {
            operand: Box::new(value),
            ty: inner_ty.clone(),
        },
        Span::dummy(),
    );
    let operand = OperandValue::Scalar {
        value: LoweredExpr::TempRef(temp.id),
        ty: Some(inner_ty),
    };
    (operand, temp)
}

/// A nullable side is always a single reusable value of nullable tuple
/// type; expose the value and the wrapped tuple type.
fn nullable_parts(side: &OperandValue) -> (LoweredExpr, Type) {
    let OperandValue::Scalar {
        value,
        ty: Some(ty),
    } = side
    else {
        unreachable!("nullable operands materialize as typed scalars");
    };
    let (core, _) = ty.strip_nullable();
    (value.clone(), core.clone())
}

//! Short-circuit tree construction and boolean result coercion.
//!
//! `==` collapses the plan into a left-to-right conjunction that stops
//! invoking element operators once one yields false; `!=` is built
//! directly as a left-to-right disjunction of per-element inequalities,
//! never as a negation of the `==` tree, so it exits on the first
//! detected mismatch. Temporaries materialized for the operands are
//! unaffected by short-circuiting.
//!
//! Every per-element result is coerced to boolean as the tree collapses
//! ([`coerce_to_bool`]): an implicit conversion when the result type has
//! one, else the truth-testing protocol (`!operator false(r)` inside a
//! conjunction, `operator true(r)` inside a disjunction). The same rule
//! is what the root of the collapsed tree lands on; a plan whose root is
//! itself a leaf (a fully dynamic comparison) carries its boolean-ness
//! to run time.

use crate::binder::classify::TupleShape;
use crate::binder::ops::{
    BoolCoercion, BuiltinComparison, Conversion, ConversionKind, LeafResolution, OperatorChoice,
};
use crate::binder::plan::{ComparisonPlan, PlanNode};
use crate::hir::{EqOp, Expr, Type};

use super::temps::{OperandValue, SideEffectTemporizer};
use super::{lift, LoweredExpr, TempAllocator};

/// Lower a bound plan against its two operands.
pub(crate) fn lower_comparison(
    op: EqOp,
    plan: &ComparisonPlan,
    left: &Expr,
    right: &Expr,
) -> LoweredExpr {
    let mut alloc = TempAllocator::new();
    let mut temporizer = SideEffectTemporizer::new(&mut alloc);
    let left_value = temporizer.materialize(left);
    let right_value = temporizer.materialize(right);
    let temps = temporizer.into_temps();

    let mut builder = TreeBuilder {
        alloc: &mut alloc,
        op,
    };
    let body = builder.build(plan.root(), &left_value, &right_value);
    LoweredExpr::seq(temps, body)
}

/// Collapses plan nodes into the lowered short-circuit tree.
pub(crate) struct TreeBuilder<'a> {
    pub alloc: &'a mut TempAllocator,
    pub op: EqOp,
}

impl TreeBuilder<'_> {
    pub fn build(
        &mut self,
        node: &PlanNode,
        left: &OperandValue,
        right: &OperandValue,
    ) -> LoweredExpr {
        match node {
            PlanNode::NestedTuple { elements } => {
                let mut result: Option<LoweredExpr> = None;
                for (index, child) in elements.iter().enumerate() {
                    let l_elem = project(left, index);
                    let r_elem = project(right, index);
                    let compared = self.build(child, &l_elem, &r_elem);
                    result = Some(match result {
                        None => compared,
                        Some(acc) => match self.op {
                            EqOp::Equal => LoweredExpr::and(acc, compared),
                            EqOp::NotEqual => LoweredExpr::or(acc, compared),
                        },
                    });
                }
                result.expect("tuples have at least one element")
            }
            PlanNode::NullableLifted { mode, element } => {
                lift::expand(self, *mode, element.as_deref(), left, right)
            }
            PlanNode::Primitive(res) | PlanNode::UserDefinedOperator(res) => {
                self.leaf(res, left, right)
            }
            PlanNode::DynamicDispatch { .. } => LoweredExpr::DynamicCompare {
                op: self.op,
                lhs: Box::new(dynamic_value(left)),
                rhs: Box::new(dynamic_value(right)),
            },
            PlanNode::Mismatch => LoweredExpr::Error,
        }
    }

    fn leaf(
        &mut self,
        res: &LeafResolution,
        left: &OperandValue,
        right: &OperandValue,
    ) -> LoweredExpr {
        if res.operator == OperatorChoice::Builtin(BuiltinComparison::NullNull) {
            // `null == null` folds to a constant.
            return LoweredExpr::Bool(self.op == EqOp::Equal);
        }
        let lhs = leaf_value(left, &res.lhs);
        let rhs = leaf_value(right, &res.rhs);
        let compared = LoweredExpr::Compare {
            operator: res.operator,
            op: self.op,
            lifted: res.lifted,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        };
        coerce_to_bool(self.op, &res.coercion, compared)
    }
}

/// The boolean result coercion, applied to each per-element result as the
/// tree collapses and thereby to the root of the collapsed tree.
pub(crate) fn coerce_to_bool(
    op: EqOp,
    coercion: &BoolCoercion,
    result: LoweredExpr,
) -> LoweredExpr {
    match coercion {
        BoolCoercion::Identity => result,
        BoolCoercion::Implicit(conv_ref) => LoweredExpr::Convert {
            conversion: Conversion {
                kind: ConversionKind::UserImplicit(*conv_ref),
                to: Type::bool_(),
            },
            operand: Box::new(result),
        },
        BoolCoercion::Truth(op_ref) => {
            let test = LoweredExpr::TruthTest {
                operator: *op_ref,
                operand: Box::new(result),
            };
            match op {
                // `a && b` wants each conjunct true: r is true when
                // `operator false(r)` is not.
                EqOp::Equal => LoweredExpr::not(test),
                EqOp::NotEqual => test,
            }
        }
    }
}

/// Address one flattened element of a materialized operand.
fn project(value: &OperandValue, index: usize) -> OperandValue {
    match value {
        OperandValue::Elems(elems) => elems[index].clone(),
        OperandValue::Scalar {
            value,
            ty: Some(ty),
        } => {
            let shape = TupleShape::from_type(ty)
                .expect("element projection only happens on tuple-typed values");
            let slot = shape.slot(index);
            OperandValue::Scalar {
                value: LoweredExpr::Field {
                    base: Box::new(value.clone()),
                    path: slot.access.clone(),
                    ty: slot.ty.clone(),
                },
                ty: Some(slot.ty.clone()),
            }
        }
        _ => unreachable!("null/default operands have no elements"),
    }
}

/// The converted value of one leaf side.
fn leaf_value(value: &OperandValue, conversion: &Conversion) -> LoweredExpr {
    match value {
        OperandValue::Scalar { value, .. } => {
            if conversion.is_identity() {
                value.clone()
            } else {
                LoweredExpr::Convert {
                    conversion: conversion.clone(),
                    operand: Box::new(value.clone()),
                }
            }
        }
        OperandValue::Null => LoweredExpr::NullOf {
            ty: conversion.to.clone(),
        },
        OperandValue::Default => LoweredExpr::DefaultOf {
            ty: conversion.to.clone(),
        },
        // A decomposed literal reaching a resolved leaf means the leaf
        // failed and the binding is error-typed; nothing to emit.
        OperandValue::Elems(_) => LoweredExpr::Error,
    }
}

/// The runtime value of an operand under dynamic dispatch. A decomposed
/// literal must become a real tuple value here; the construction
/// aggregates already-materialized element values, so evaluation order is
/// untouched.
fn dynamic_value(value: &OperandValue) -> LoweredExpr {
    match value {
        OperandValue::Scalar { value, .. } => value.clone(),
        OperandValue::Elems(elems) => LoweredExpr::MakeTuple {
            elems: elems.iter().map(dynamic_value).collect(),
            ty: None,
        },
        OperandValue::Null => LoweredExpr::NullOf {
            ty: Type::dynamic(),
        },
        OperandValue::Default => LoweredExpr::DefaultOf {
            ty: Type::dynamic(),
        },
    }
}

//! Operand materialization into single-assignment temporaries.
//!
//! Both operands are evaluated fully, left before right, before any
//! comparison logic runs; this holds even when an early element is
//! provably unequal and later temporaries are logically unnecessary.
//! Within a tuple literal, elements evaluate left-to-right and outer
//! before inner, each exactly once; a nested converting construction
//! occupies its own position in that sequence. Expressions that are free
//! to re-read (literals, locals) skip their temporary.
//!
//! Tuple literals are never constructed into tuple values here: their
//! elements stay individual, so the comparison can address them directly.

use crate::hir::{Expr, ExprKind, Literal, Type};

use super::{LoweredExpr, TempAllocator, Temporary};

/// The materialized form of one operand (or one literal element).
#[derive(Debug, Clone)]
pub enum OperandValue {
    /// A decomposed tuple literal: one value per element, in source
    /// order.
    Elems(Vec<OperandValue>),
    /// A single value, safe to reference any number of times (a
    /// temporary, a local, or a constant).
    Scalar {
        value: LoweredExpr,
        ty: Option<Type>,
    },
    /// The `null` literal; nothing to evaluate.
    Null,
    /// The `default` literal; nothing to evaluate.
    Default,
}

/// Materializes operands in program order, allocating temporaries for
/// anything whose evaluation may have side effects or must not repeat.
pub struct SideEffectTemporizer<'a> {
    alloc: &'a mut TempAllocator,
    temps: Vec<Temporary>,
}

impl<'a> SideEffectTemporizer<'a> {
    pub fn new(alloc: &'a mut TempAllocator) -> Self {
        Self {
            alloc,
            temps: Vec::new(),
        }
    }

    /// Materialize one operand. Call once for the left operand, then once
    /// for the right; the accumulated temporaries are the evaluation
    /// order.
    pub fn materialize(&mut self, expr: &Expr) -> OperandValue {
        match &expr.kind {
            ExprKind::TupleLit { elems } => OperandValue::Elems(
                elems
                    .iter()
                    .map(|elem| self.materialize(&elem.expr))
                    .collect(),
            ),
            ExprKind::Literal(Literal::Null) => OperandValue::Null,
            ExprKind::Literal(Literal::Default) => OperandValue::Default,
            _ if expr.is_reusable() => OperandValue::Scalar {
                value: LoweredExpr::Operand(Box::new(expr.clone())),
                ty: expr.ty.clone(),
            },
            _ => {
                let ty = expr
                    .ty
                    .clone()
                    .expect("non-literal operands arrive typed from the binder");
                let temp = self.alloc.fresh(
                    ty.clone(),
                    LoweredExpr::Operand(Box::new(expr.clone())),
                    expr.span,
                );
                let value = LoweredExpr::TempRef(temp.id);
                self.temps.push(temp);
                OperandValue::Scalar {
                    value,
                    ty: Some(ty),
                }
            }
        }
    }

    /// The temporaries in evaluation order.
    pub fn into_temps(self) -> Vec<Temporary> {
        self.temps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lower::TempId;

    fn call(name: &str) -> Expr {
        Expr::call(name, Type::i32())
    }

    #[test]
    fn test_literal_elements_evaluate_left_to_right() {
        let mut alloc = TempAllocator::new();
        let mut temporizer = SideEffectTemporizer::new(&mut alloc);
        let lit = Expr::tuple(vec![call("a"), call("b")]);
        let value = temporizer.materialize(&lit);
        let temps = temporizer.into_temps();
        assert_eq!(temps.len(), 2);
        assert_eq!(temps[0].id, TempId(0));
        assert_eq!(temps[1].id, TempId(1));
        let OperandValue::Elems(elems) = value else {
            panic!("expected decomposed literal");
        };
        assert!(matches!(
            elems[0],
            OperandValue::Scalar {
                value: LoweredExpr::TempRef(TempId(0)),
                ..
            }
        ));
    }

    #[test]
    fn test_nested_literal_evaluates_outer_before_inner() {
        let mut alloc = TempAllocator::new();
        let mut temporizer = SideEffectTemporizer::new(&mut alloc);
        // (a(), (b(), c()), d()) evaluates a, b, c, d in source order.
        let lit = Expr::tuple(vec![
            call("a"),
            Expr::tuple(vec![call("b"), call("c")]),
            call("d"),
        ]);
        temporizer.materialize(&lit);
        let temps = temporizer.into_temps();
        let names: Vec<_> = temps
            .iter()
            .map(|t| match &t.init {
                LoweredExpr::Operand(e) => match &e.kind {
                    ExprKind::Call { name, .. } => name.clone(),
                    _ => panic!("expected call"),
                },
                _ => panic!("expected operand init"),
            })
            .collect();
        assert_eq!(names, ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_reusable_operands_skip_temporaries() {
        let mut alloc = TempAllocator::new();
        let mut temporizer = SideEffectTemporizer::new(&mut alloc);
        let lit = Expr::tuple(vec![Expr::int(1), Expr::local(0, "x", Type::i32())]);
        temporizer.materialize(&lit);
        assert!(temporizer.into_temps().is_empty());
    }

    #[test]
    fn test_whole_tuple_operand_gets_one_temporary() {
        let mut alloc = TempAllocator::new();
        let mut temporizer = SideEffectTemporizer::new(&mut alloc);
        let e = Expr::call("get_tuple", Type::tuple_of(vec![Type::i32(), Type::i32()]));
        let value = temporizer.materialize(&e);
        assert_eq!(temporizer.into_temps().len(), 1);
        assert!(matches!(value, OperandValue::Scalar { .. }));
    }

    #[test]
    fn test_null_and_default_evaluate_nothing() {
        let mut alloc = TempAllocator::new();
        let mut temporizer = SideEffectTemporizer::new(&mut alloc);
        assert!(matches!(
            temporizer.materialize(&Expr::null()),
            OperandValue::Null
        ));
        assert!(matches!(
            temporizer.materialize(&Expr::default_()),
            OperandValue::Default
        ));
        assert!(temporizer.into_temps().is_empty());
    }
}

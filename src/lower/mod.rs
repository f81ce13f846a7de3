//! Lowered-expression primitives for the code generator.
//!
//! The lowering of a tuple comparison uses only constructs the downstream
//! generator already understands: single-assignment temporaries,
//! conjunction/disjunction, operator and accessor invocations, and
//! boolean literals. Operand expressions are embedded as-is; the
//! generator was going to emit them anyway.
//!
//! Everything here is created per binding call and handed off read-only.

pub mod lift;
pub mod temps;
pub mod tree;

use crate::binder::ops::{Conversion, OperatorChoice};
use crate::hir::{EqOp, Expr, OpRef, Type};
use crate::span::Span;

pub use temps::SideEffectTemporizer;

/// The identifier of a synthesized temporary, unique within one lowered
/// expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TempId(pub u32);

/// A synthetic single-assignment binding capturing a once-evaluated
/// operand or sub-value. Written exactly once, read any number of times.
#[derive(Debug, Clone)]
pub struct Temporary {
    pub id: TempId,
    pub ty: Type,
    pub init: LoweredExpr,
    /// The span of the operand this temporary captures, for debug info.
    pub span: Span,
}

/// Allocates temporaries with ids unique across one lowering.
#[derive(Debug, Default)]
pub struct TempAllocator {
    next: u32,
}

impl TempAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self, ty: Type, init: LoweredExpr, span: Span) -> Temporary {
        let id = TempId(self.next);
        self.next += 1;
        Temporary { id, ty, init, span }
    }
}

/// A lowered expression.
#[derive(Debug, Clone)]
pub enum LoweredExpr {
    /// A boolean literal.
    Bool(bool),
    /// The typed `null` constant.
    NullOf { ty: Type },
    /// The default value of a type.
    DefaultOf { ty: Type },
    /// An operand expression evaluated exactly as the host bound it.
    Operand(Box<Expr>),
    /// A read of a temporary.
    TempRef(TempId),
    /// A field access through a physical path (traversing extension
    /// slots) on a tuple value.
    Field {
        base: Box<LoweredExpr>,
        path: Vec<usize>,
        ty: Type,
    },
    /// Construction of a tuple value from element values. Only emitted
    /// when a decomposed literal must become a runtime value (dynamic
    /// dispatch).
    MakeTuple {
        elems: Vec<LoweredExpr>,
        ty: Option<Type>,
    },
    /// The has-value accessor of a nullable value.
    HasValue(Box<LoweredExpr>),
    /// The unwrap accessor of a nullable value; only reached on paths
    /// where the value is known present.
    Unwrap {
        operand: Box<LoweredExpr>,
        ty: Type,
    },
    /// An operand conversion chosen during resolution.
    Convert {
        conversion: Conversion,
        operand: Box<LoweredExpr>,
    },
    /// An equality-operator invocation, builtin or user-defined, possibly
    /// lifted over nullable operands.
    Compare {
        operator: OperatorChoice,
        op: EqOp,
        lifted: bool,
        lhs: Box<LoweredExpr>,
        rhs: Box<LoweredExpr>,
    },
    /// An equality dispatched at run time on the actual operand values.
    DynamicCompare {
        op: EqOp,
        lhs: Box<LoweredExpr>,
        rhs: Box<LoweredExpr>,
    },
    /// An invocation of a truth-testing operator (`operator true` /
    /// `operator false`).
    TruthTest {
        operator: OpRef,
        operand: Box<LoweredExpr>,
    },
    Not(Box<LoweredExpr>),
    /// Short-circuiting conjunction.
    And(Box<LoweredExpr>, Box<LoweredExpr>),
    /// Short-circuiting disjunction.
    Or(Box<LoweredExpr>, Box<LoweredExpr>),
    /// Evaluate the temporaries in order, then the value.
    Seq {
        temps: Vec<Temporary>,
        value: Box<LoweredExpr>,
    },
    /// Placeholder in an error-typed binding; never reaches the code
    /// generator.
    Error,
}

impl LoweredExpr {
    pub fn not(operand: LoweredExpr) -> Self {
        LoweredExpr::Not(Box::new(operand))
    }

    pub fn and(lhs: LoweredExpr, rhs: LoweredExpr) -> Self {
        LoweredExpr::And(Box::new(lhs), Box::new(rhs))
    }

    pub fn or(lhs: LoweredExpr, rhs: LoweredExpr) -> Self {
        LoweredExpr::Or(Box::new(lhs), Box::new(rhs))
    }

    pub fn has_value(operand: LoweredExpr) -> Self {
        LoweredExpr::HasValue(Box::new(operand))
    }

    /// Wrap in a sequence, or pass through when there is nothing to
    /// evaluate first.
    pub fn seq(temps: Vec<Temporary>, value: LoweredExpr) -> Self {
        if temps.is_empty() {
            value
        } else {
            LoweredExpr::Seq {
                temps,
                value: Box::new(value),
            }
        }
    }

    /// The temporaries evaluated before this expression's value, in
    /// evaluation order. Empty unless this is a sequence.
    pub fn temporaries(&self) -> &[Temporary] {
        match self {
            LoweredExpr::Seq { temps, .. } => temps,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_collapses_when_empty() {
        let e = LoweredExpr::seq(Vec::new(), LoweredExpr::Bool(true));
        assert!(matches!(e, LoweredExpr::Bool(true)));
    }

    #[test]
    fn test_allocator_ids_are_sequential() {
        let mut alloc = TempAllocator::new();
        let a = alloc.fresh(Type::i32(), LoweredExpr::Bool(false), Span::dummy());
        let b = alloc.fresh(Type::i32(), LoweredExpr::Bool(false), Span::dummy());
        assert_eq!(a.id, TempId(0));
        assert_eq!(b.id, TempId(1));
    }
}

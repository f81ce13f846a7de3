//! Tuple shape classification and cardinality matching.
//!
//! The classifier decides whether an operand participates in tuple
//! comparison at all, and normalizes the ways a tuple can appear: a tuple
//! literal (typed or typeless), an expression of tuple type, the same
//! through one nullable wrapper, or the bare `null`/`default` literals
//! that borrow their meaning from the counterpart.
//!
//! The cardinality matcher compares flattened arities. Arity counts
//! through extension slots: a 10-tuple has arity 10 even though it
//! physically nests after the inline width.

use crate::hir::{Expr, ExprKind, Literal, TupleLitElem, Type, INLINE_WIDTH};
use crate::span::Span;

/// One flattened element slot of a tuple shape.
///
/// Slots do not own their shape; they are always reached through the
/// [`TupleShape`] that carries them.
#[derive(Debug, Clone)]
pub struct ElementSlot {
    /// Flattened position, 0-based.
    pub index: usize,
    /// The element's static type.
    pub ty: Type,
    /// Whether the element type carries the nullable wrapper.
    pub nullable: bool,
    /// The type-level element name, if declared.
    pub name: Option<String>,
    /// Physical access path from the tuple value to this element,
    /// traversing extension slots.
    pub access: Vec<usize>,
}

/// The flattened shape of a tuple type.
#[derive(Debug, Clone)]
pub struct TupleShape {
    slots: Vec<ElementSlot>,
}

impl TupleShape {
    /// Flatten a tuple type into its logical element slots. Returns
    /// `None` when the type is not a tuple.
    pub fn from_type(ty: &Type) -> Option<Self> {
        let mut slots = Vec::new();
        Self::collect(ty, &mut Vec::new(), &mut slots)?;
        Some(Self { slots })
    }

    fn collect(ty: &Type, prefix: &mut Vec<usize>, slots: &mut Vec<ElementSlot>) -> Option<()> {
        let elems = ty.as_tuple()?;
        let (inline, extension) = if elems.len() == INLINE_WIDTH {
            (&elems[..INLINE_WIDTH - 1], Some(&elems[INLINE_WIDTH - 1]))
        } else {
            (elems, None)
        };
        for (i, elem) in inline.iter().enumerate() {
            prefix.push(i);
            slots.push(ElementSlot {
                index: slots.len(),
                ty: elem.ty.clone(),
                nullable: elem.ty.is_nullable(),
                name: elem.name.clone(),
                access: prefix.clone(),
            });
            prefix.pop();
        }
        if let Some(ext) = extension {
            prefix.push(INLINE_WIDTH - 1);
            Self::collect(&ext.ty, prefix, slots)
                .expect("extension slot is always tuple-typed");
            prefix.pop();
        }
        Some(())
    }

    /// The flattened arity.
    pub fn arity(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[ElementSlot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> &ElementSlot {
        &self.slots[index]
    }
}

/// A classified operand of a tuple comparison.
#[derive(Debug)]
pub enum OperandShape<'a> {
    /// A tuple literal; elements stay individually bound and are
    /// evaluated in place, never constructed into a tuple value.
    Literal {
        elems: &'a [TupleLitElem],
        span: Span,
    },
    /// An expression of tuple type, possibly through one nullable
    /// wrapper.
    Typed {
        expr: &'a Expr,
        shape: TupleShape,
        nullable: bool,
    },
    /// The bare `null` literal.
    Null { span: Span },
    /// The bare `default` literal.
    Default { span: Span },
}

impl OperandShape<'_> {
    /// Whether this operand has a tuple shape of its own (rather than
    /// borrowing meaning from the counterpart).
    pub fn is_tuple_like(&self) -> bool {
        matches!(self, OperandShape::Literal { .. } | OperandShape::Typed { .. })
    }

    /// The flattened arity, when the operand has a shape of its own.
    pub fn arity(&self) -> Option<usize> {
        match self {
            OperandShape::Literal { elems, .. } => Some(elems.len()),
            OperandShape::Typed { shape, .. } => Some(shape.arity()),
            _ => None,
        }
    }
}

/// Classify one operand. `None` means the operand plays no part in tuple
/// comparison (an ordinary scalar; the comparison may still defer to the
/// host's standard operator binding).
///
/// A type offering a positional decomposition protocol is *not*
/// tuple-shaped; only the tuple-typed result of an actual decomposition
/// is, and that arrives here with a tuple type already.
pub fn classify_operand(expr: &Expr) -> Option<OperandShape<'_>> {
    match &expr.kind {
        ExprKind::TupleLit { elems } => Some(OperandShape::Literal {
            elems,
            span: expr.span,
        }),
        ExprKind::Literal(Literal::Null) => Some(OperandShape::Null { span: expr.span }),
        ExprKind::Literal(Literal::Default) => Some(OperandShape::Default { span: expr.span }),
        _ => {
            let ty = expr.ty.as_ref()?;
            let (core, nullable) = ty.strip_nullable();
            let shape = TupleShape::from_type(core)?;
            Some(OperandShape::Typed {
                expr,
                shape,
                nullable,
            })
        }
    }
}

/// The classifier's gate for the whole expression: `==`/`!=` is a tuple
/// comparison when both operands are tuple-like, when one is tuple-like
/// and the other is a bare `null`/`default`, or when one is tuple-like
/// and the other is dynamically typed (the plan then defers entirely to
/// run time).
pub fn is_tuple_comparison(left: &Expr, right: &Expr) -> bool {
    let l_dynamic = matches!(&left.ty, Some(ty) if ty.is_dynamic());
    let r_dynamic = matches!(&right.ty, Some(ty) if ty.is_dynamic());
    let l_shape = classify_operand(left);
    let r_shape = classify_operand(right);
    let l_tuple = l_shape.as_ref().is_some_and(OperandShape::is_tuple_like);
    let r_tuple = r_shape.as_ref().is_some_and(OperandShape::is_tuple_like);

    if l_tuple && r_tuple {
        return true;
    }
    if (l_tuple && r_dynamic) || (r_tuple && l_dynamic) {
        return true;
    }
    // A tuple against a bare null/default; `null == null` and friends
    // stay with the host binder.
    (l_tuple && r_shape.map_or(false, |s| !s.is_tuple_like()))
        || (r_tuple && l_shape.map_or(false, |s| !s.is_tuple_like()))
}

/// Compare flattened arities at one nesting level. The mismatch carries
/// both arities so the single top-level diagnostic can name them.
pub fn match_cardinality(left: usize, right: usize) -> Result<usize, (usize, usize)> {
    if left == right {
        Ok(left)
    } else {
        Err((left, right))
    }
}

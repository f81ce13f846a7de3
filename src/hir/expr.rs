//! Bound operand expressions.
//!
//! Operands arrive from the host binder already name-resolved and typed.
//! `ty` is `None` for expressions with no natural type: the `null` and
//! `default` literals and tuple literals containing them. Everything the
//! comparison pass needs to know about an operand is in this
//! representation; it never re-binds syntax.

use std::fmt;

use crate::span::Span;

use super::def::{DefId, LocalId};
use super::ty::Type;

/// The equality operator being bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqOp {
    Equal,
    NotEqual,
}

impl EqOp {
    pub fn as_str(self) -> &'static str {
        match self {
            EqOp::Equal => "==",
            EqOp::NotEqual => "!=",
        }
    }

    /// The opposite operator.
    pub fn negated(self) -> Self {
        match self {
            EqOp::Equal => EqOp::NotEqual,
            EqOp::NotEqual => EqOp::Equal,
        }
    }
}

impl fmt::Display for EqOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A literal constant value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Char(char),
    /// The `null` literal. Typeless until a counterpart supplies a type.
    Null,
    /// The `default` literal. Typeless until a counterpart supplies a type.
    Default,
}

/// One element of a tuple literal.
#[derive(Debug, Clone)]
pub struct TupleLitElem {
    /// Explicit element name, when the source spelled one.
    pub name: Option<String>,
    pub expr: Expr,
}

impl TupleLitElem {
    pub fn unnamed(expr: Expr) -> Self {
        Self { name: None, expr }
    }

    pub fn named(name: impl Into<String>, expr: Expr) -> Self {
        Self {
            name: Some(name.into()),
            expr,
        }
    }
}

/// A bound operand expression.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    /// The resolved static type; `None` for typeless operands.
    pub ty: Option<Type>,
    pub span: Span,
}

/// The kind of a bound operand expression.
#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Literal),
    /// A resolved local variable.
    Local { id: LocalId, name: String },
    /// A tuple literal. Elements keep their own expressions; the literal
    /// as a whole may be typeless.
    TupleLit { elems: Vec<TupleLitElem> },
    /// A call into the enclosing program; assumed side-effecting.
    Call { name: String, args: Vec<Expr> },
    /// Construction of a user-defined type instance; assumed
    /// side-effecting.
    New { def: DefId, args: Vec<Expr> },
    /// The tuple-typed result of a positional decomposition. The source
    /// is evaluated, decomposed, and the decomposed values form a tuple.
    Deconstructed { source: Box<Expr> },
}

impl Expr {
    pub fn new(kind: ExprKind, ty: Option<Type>, span: Span) -> Self {
        Self { kind, ty, span }
    }

    pub fn int(value: i64) -> Self {
        Self::new(
            ExprKind::Literal(Literal::Int(value)),
            Some(Type::i32()),
            Span::dummy(),
        )
    }

    pub fn int64(value: i64) -> Self {
        Self::new(
            ExprKind::Literal(Literal::Int(value)),
            Some(Type::i64()),
            Span::dummy(),
        )
    }

    pub fn float(value: f64) -> Self {
        Self::new(
            ExprKind::Literal(Literal::Float(value)),
            Some(Type::f64()),
            Span::dummy(),
        )
    }

    pub fn bool_(value: bool) -> Self {
        Self::new(
            ExprKind::Literal(Literal::Bool(value)),
            Some(Type::bool_()),
            Span::dummy(),
        )
    }

    pub fn str_(value: impl Into<String>) -> Self {
        Self::new(
            ExprKind::Literal(Literal::Str(value.into())),
            Some(Type::str_()),
            Span::dummy(),
        )
    }

    pub fn null() -> Self {
        Self::new(ExprKind::Literal(Literal::Null), None, Span::dummy())
    }

    pub fn default_() -> Self {
        Self::new(ExprKind::Literal(Literal::Default), None, Span::dummy())
    }

    pub fn local(id: u32, name: impl Into<String>, ty: Type) -> Self {
        Self::new(
            ExprKind::Local {
                id: LocalId(id),
                name: name.into(),
            },
            Some(ty),
            Span::dummy(),
        )
    }

    pub fn call(name: impl Into<String>, ty: Type) -> Self {
        Self::new(
            ExprKind::Call {
                name: name.into(),
                args: Vec::new(),
            },
            Some(ty),
            Span::dummy(),
        )
    }

    /// A typeless tuple literal.
    pub fn tuple(elems: Vec<Expr>) -> Self {
        Self::new(
            ExprKind::TupleLit {
                elems: elems.into_iter().map(TupleLitElem::unnamed).collect(),
            },
            None,
            Span::dummy(),
        )
    }

    /// A tuple literal with named elements.
    pub fn tuple_named(elems: Vec<TupleLitElem>) -> Self {
        Self::new(ExprKind::TupleLit { elems }, None, Span::dummy())
    }

    pub fn is_null_literal(&self) -> bool {
        matches!(self.kind, ExprKind::Literal(Literal::Null))
    }

    pub fn is_default_literal(&self) -> bool {
        matches!(self.kind, ExprKind::Literal(Literal::Default))
    }

    /// Whether re-reading this expression is free of side effects, so the
    /// temporizer may skip the temporary.
    pub fn is_reusable(&self) -> bool {
        matches!(self.kind, ExprKind::Literal(_) | ExprKind::Local { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals_are_reusable() {
        assert!(Expr::int(1).is_reusable());
        assert!(Expr::null().is_reusable());
        assert!(Expr::local(0, "t", Type::i32()).is_reusable());
        assert!(!Expr::call("next", Type::i32()).is_reusable());
    }

    #[test]
    fn test_typeless_literals() {
        assert!(Expr::null().ty.is_none());
        assert!(Expr::default_().ty.is_none());
        assert!(Expr::tuple(vec![Expr::int(1), Expr::null()]).ty.is_none());
    }

    #[test]
    fn test_negated_operator() {
        assert_eq!(EqOp::Equal.negated(), EqOp::NotEqual);
        assert_eq!(EqOp::Equal.as_str(), "==");
    }
}

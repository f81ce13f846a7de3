//! Recursive element-pair resolution.
//!
//! Walks the two operands in lockstep, one plan node per aligned element
//! pair. Tuple shapes recurse (through at most one nullable wrapper per
//! level), everything else resolves as a leaf through standard operator
//! resolution. Arity mismatches abort the whole top-level expression with
//! a single diagnostic; every other failure is local to its node and
//! binding continues best-effort.
//!
//! Dynamic infection is decided up front: if either operand's declared
//! type is dynamic, or a dynamically-typed value sits anywhere in either
//! operand's tuple structure, every leaf in the plan defers applicability
//! to run time. Interior structure is kept so arity stays a compile-time
//! fact even in an infected plan.

use crate::diagnostics::{BindErrorKind, Diagnostic, DiagnosticBag, ErrorCode};
use crate::hir::{
    DeprecationLevel, EqOp, Expr, ExprKind, TupleLitElem, Type, TypeTable,
};
use crate::span::Span;

use super::classify::{self, match_cardinality, OperandShape, TupleShape};
use super::ops::{self, BoolCoercion, ConversionKind, LeafOperand, LeafResolution, OperatorChoice};
use super::plan::{LiftMode, PlanNode};

/// One side of a pairing step: either an actual expression (operands and
/// literal elements) or an element slot projected out of a tuple type.
pub(crate) enum ElemView<'e> {
    Expr(&'e Expr),
    Slot { ty: Type },
}

/// A pairing side normalized into what it offers the comparison.
enum SideView<'e> {
    Literal {
        elems: &'e [TupleLitElem],
        ty: Option<Type>,
    },
    Tuple {
        ty: Type,
        shape: TupleShape,
        nullable: bool,
    },
    Null(Span),
    Default(Span),
    Leaf(LeafOperand),
}

impl SideView<'_> {
    fn is_shape(&self) -> bool {
        matches!(self, SideView::Literal { .. } | SideView::Tuple { .. })
    }

    fn describe(&self) -> String {
        match self {
            SideView::Literal { ty: Some(ty), .. } => ty.to_string(),
            SideView::Literal { ty: None, .. } => "<tuple literal>".to_string(),
            SideView::Tuple { ty, .. } => ty.to_string(),
            SideView::Null(_) => "<null>".to_string(),
            SideView::Default(_) => "<default>".to_string(),
            SideView::Leaf(operand) => operand.describe(),
        }
    }

    fn static_ty(&self) -> Option<Type> {
        match self {
            SideView::Literal { ty, .. } => ty.clone(),
            SideView::Tuple { ty, .. } => Some(ty.clone()),
            SideView::Leaf(operand) => operand.ty.clone(),
            _ => None,
        }
    }
}

/// A shaped side prepared for element-wise pairing.
struct ShapeSide<'e> {
    kind: ShapeSideKind<'e>,
    nullable: bool,
}

enum ShapeSideKind<'e> {
    Literal(&'e [TupleLitElem]),
    Typed(TupleShape),
}

impl<'e> ShapeSide<'e> {
    fn arity(&self) -> usize {
        match &self.kind {
            ShapeSideKind::Literal(elems) => elems.len(),
            ShapeSideKind::Typed(shape) => shape.arity(),
        }
    }

    fn elem_view(&self, index: usize) -> ElemView<'e> {
        match &self.kind {
            ShapeSideKind::Literal(elems) => {
                let elems: &'e [TupleLitElem] = elems;
                ElemView::Expr(&elems[index].expr)
            }
            ShapeSideKind::Typed(shape) => ElemView::Slot {
                ty: shape.slot(index).ty.clone(),
            },
        }
    }

    /// The name the source explicitly spelled on a literal element.
    fn explicit_name(&self, index: usize) -> Option<&str> {
        match &self.kind {
            ShapeSideKind::Literal(elems) => elems[index].name.as_deref(),
            ShapeSideKind::Typed(_) => None,
        }
    }

    /// Any name the element carries, literal or type-level.
    fn name(&self, index: usize) -> Option<&str> {
        match &self.kind {
            ShapeSideKind::Literal(elems) => elems[index].name.as_deref(),
            ShapeSideKind::Typed(shape) => shape.slot(index).name.as_deref(),
        }
    }

    fn elem_span(&self, index: usize) -> Option<Span> {
        match &self.kind {
            ShapeSideKind::Literal(elems) => Some(elems[index].expr.span),
            ShapeSideKind::Typed(_) => None,
        }
    }
}

/// The recursive plan builder for one comparison expression.
pub(crate) struct Resolver<'a> {
    table: &'a TypeTable,
    diags: &'a mut DiagnosticBag,
    op: EqOp,
    /// The whole comparison's span; structural diagnostics anchor here.
    span: Span,
    infected: bool,
}

impl<'a> Resolver<'a> {
    pub fn new(
        table: &'a TypeTable,
        diags: &'a mut DiagnosticBag,
        op: EqOp,
        span: Span,
    ) -> Self {
        Self {
            table,
            diags,
            op,
            span,
            infected: false,
        }
    }

    /// Build the plan for the two top-level operands. The caller has
    /// already established that this is a tuple comparison.
    pub fn build(&mut self, left: &Expr, right: &Expr) -> PlanNode {
        let l_dynamic = left.ty.as_ref().is_some_and(Type::is_dynamic);
        let r_dynamic = right.ty.as_ref().is_some_and(Type::is_dynamic);
        if l_dynamic || r_dynamic {
            // A dynamic operand has no static shape to decompose: the
            // whole comparison is one deferred dispatch.
            return PlanNode::DynamicDispatch {
                left_ty: left.ty.clone(),
                right_ty: right.ty.clone(),
            };
        }

        self.infected = operand_contains_dynamic(left) || operand_contains_dynamic(right);

        match self.pair(ElemView::Expr(left), ElemView::Expr(right)) {
            Ok(node) => node,
            Err((l_arity, r_arity)) => {
                self.report(
                    BindErrorKind::CardinalityMismatch {
                        op: self.op.as_str(),
                        left: l_arity,
                        right: r_arity,
                    },
                    self.span,
                );
                PlanNode::Mismatch
            }
        }
    }

    fn view<'e>(&self, elem: &ElemView<'e>) -> SideView<'e> {
        match elem {
            ElemView::Expr(e) => {
                let e: &'e Expr = e;
                match classify::classify_operand(e) {
                    Some(OperandShape::Literal { elems, .. }) => SideView::Literal {
                        elems,
                        ty: e.ty.clone(),
                    },
                    Some(OperandShape::Typed {
                        shape, nullable, ..
                    }) => SideView::Tuple {
                        ty: e.ty.clone().expect("typed shapes carry a type"),
                        shape,
                        nullable,
                    },
                    Some(OperandShape::Null { span }) => SideView::Null(span),
                    Some(OperandShape::Default { span }) => SideView::Default(span),
                    None => SideView::Leaf(match e.ty.clone() {
                        Some(ty) => LeafOperand::typed(ty),
                        None => LeafOperand::tuple_literal(),
                    }),
                }
            }
            ElemView::Slot { ty } => {
                let (core, nullable) = ty.strip_nullable();
                match TupleShape::from_type(core) {
                    Some(shape) => SideView::Tuple {
                        ty: ty.clone(),
                        shape,
                        nullable,
                    },
                    None => SideView::Leaf(LeafOperand::typed(ty.clone())),
                }
            }
        }
    }

    /// Pair one aligned element (or the top-level operands). The `Err`
    /// carries the mismatching arities up to the top-level reporter.
    fn pair(
        &mut self,
        left: ElemView<'_>,
        right: ElemView<'_>,
    ) -> Result<PlanNode, (usize, usize)> {
        let l_view = self.view(&left);
        let r_view = self.view(&right);

        if l_view.is_shape() && r_view.is_shape() {
            return self.pair_shapes(l_view, r_view);
        }

        // A nullable tuple against a bare null/default collapses to the
        // has-value predicate; no elementwise plan exists at all.
        match (&l_view, &r_view) {
            (SideView::Tuple { nullable: true, .. }, SideView::Null(_) | SideView::Default(_)) => {
                return Ok(PlanNode::NullableLifted {
                    mode: LiftMode::LeftVsAbsent,
                    element: None,
                });
            }
            (SideView::Null(_) | SideView::Default(_), SideView::Tuple { nullable: true, .. }) => {
                return Ok(PlanNode::NullableLifted {
                    mode: LiftMode::AbsentVsRight,
                    element: None,
                });
            }
            // Against a non-nullable tuple shape the bare literal has no
            // meaning: `default` is ambiguous and `null` is ill-typed.
            (shape, SideView::Null(span)) | (SideView::Null(span), shape)
                if shape.is_shape() =>
            {
                let span = *span;
                let operand = shape.describe();
                self.report_ambiguous(operand, "null", span);
                return Ok(PlanNode::Mismatch);
            }
            (shape, SideView::Default(span)) | (SideView::Default(span), shape)
                if shape.is_shape() =>
            {
                let span = *span;
                let operand = shape.describe();
                self.report_ambiguous(operand, "default", span);
                return Ok(PlanNode::Mismatch);
            }
            _ => {}
        }

        Ok(self.leaf(l_view, r_view))
    }

    /// Pair two tuple shapes element-wise, lifting when either side is
    /// nullable.
    fn pair_shapes(
        &mut self,
        left: SideView<'_>,
        right: SideView<'_>,
    ) -> Result<PlanNode, (usize, usize)> {
        let l_side = shape_side(left);
        let r_side = shape_side(right);

        let arity = match_cardinality(l_side.arity(), r_side.arity())?;

        let mut elements = Vec::with_capacity(arity);
        for index in 0..arity {
            self.warn_ignored_names(&l_side, &r_side, index);
            let child = self.pair(l_side.elem_view(index), r_side.elem_view(index))?;
            elements.push(child);
        }
        let node = PlanNode::NestedTuple { elements };

        let mode = match (l_side.nullable, r_side.nullable) {
            (true, true) => LiftMode::BothNullable,
            (true, false) => LiftMode::LeftNullable,
            (false, true) => LiftMode::RightNullable,
            (false, false) => return Ok(node),
        };
        Ok(PlanNode::NullableLifted {
            mode,
            element: Some(Box::new(node)),
        })
    }

    /// Warn when an explicitly spelled literal element name is ignored by
    /// the comparison. When both sides could complain about the same
    /// slot, the right side wins the warning.
    fn warn_ignored_names(&mut self, left: &ShapeSide<'_>, right: &ShapeSide<'_>, index: usize) {
        let warn = |diags: &mut DiagnosticBag, name: &str, span: Option<Span>, fallback: Span| {
            let message = format!(
                "the tuple element name `{name}` is ignored because a different name \
                 or no name is specified on the other side of the tuple comparison"
            );
            diags.push(
                Diagnostic::warning(message, span.unwrap_or(fallback))
                    .with_code(ErrorCode::TupleElementNameIgnored),
            );
        };

        if let Some(r_name) = right.explicit_name(index) {
            if left.name(index) != Some(r_name) {
                warn(self.diags, r_name, right.elem_span(index), self.span);
                return;
            }
        }
        if let Some(l_name) = left.explicit_name(index) {
            if right.name(index) != Some(l_name) {
                warn(self.diags, l_name, left.elem_span(index), self.span);
            }
        }
    }

    /// Resolve a leaf pair, or mark every leaf dynamic in an infected
    /// plan.
    fn leaf(&mut self, left: SideView<'_>, right: SideView<'_>) -> PlanNode {
        if self.infected {
            return PlanNode::DynamicDispatch {
                left_ty: left.static_ty(),
                right_ty: right.static_ty(),
            };
        }

        let l_operand = leaf_operand(left);
        let r_operand = leaf_operand(right);
        match ops::resolve_leaf(self.table, self.op, &l_operand, &r_operand) {
            Ok(resolution) => {
                self.surface_deprecations(&resolution);
                match resolution.operator {
                    OperatorChoice::Builtin(_) => PlanNode::Primitive(resolution),
                    OperatorChoice::UserDefined(_) => PlanNode::UserDefinedOperator(resolution),
                }
            }
            Err(kind) => {
                self.report(kind, self.span);
                PlanNode::Mismatch
            }
        }
    }

    /// Surface deprecation marks on everything the resolution chose: the
    /// operator itself, operand conversions, and the boolean coercion.
    /// Deprecation never blocks plan construction.
    fn surface_deprecations(&mut self, resolution: &LeafResolution) {
        if let OperatorChoice::UserDefined(op_ref) = resolution.operator {
            let opdef = self.table.operator(op_ref);
            if let Some(mark) = opdef.deprecation.clone() {
                let owner = &self.table.def(op_ref.owner).name;
                self.report_deprecated(
                    format!("operator `{}` on `{owner}`", self.op.as_str()),
                    &mark,
                );
            }
        }
        for conv in [&resolution.lhs, &resolution.rhs] {
            if let ConversionKind::UserImplicit(conv_ref) = conv.kind {
                let convdef = self.table.conversion(conv_ref);
                if let Some(mark) = convdef.deprecation.clone() {
                    self.report_deprecated(
                        format!(
                            "implicit conversion from `{}` to `{}`",
                            convdef.from, convdef.to
                        ),
                        &mark,
                    );
                }
            }
        }
        match resolution.coercion {
            BoolCoercion::Implicit(conv_ref) => {
                let convdef = self.table.conversion(conv_ref);
                if let Some(mark) = convdef.deprecation.clone() {
                    self.report_deprecated(
                        format!("implicit conversion from `{}` to `bool`", convdef.from),
                        &mark,
                    );
                }
            }
            BoolCoercion::Truth(op_ref) => {
                let opdef = self.table.operator(op_ref);
                if let Some(mark) = opdef.deprecation.clone() {
                    let owner = &self.table.def(op_ref.owner).name;
                    self.report_deprecated(format!("truth operator on `{owner}`"), &mark);
                }
            }
            BoolCoercion::Identity => {}
        }
    }

    fn report_deprecated(&mut self, what: String, mark: &crate::hir::Deprecation) {
        let mut message = format!("{what} is deprecated");
        if let Some(detail) = &mark.message {
            message.push_str(": ");
            message.push_str(detail);
        }
        let diagnostic = match mark.level {
            DeprecationLevel::Warn => {
                Diagnostic::warning(message, self.span).with_code(ErrorCode::DeprecatedMember)
            }
            DeprecationLevel::Deny => {
                Diagnostic::error(message, self.span).with_code(ErrorCode::DeprecatedMemberDenied)
            }
        };
        self.diags.push(diagnostic);
    }

    fn report_ambiguous(&mut self, operand: String, literal: &'static str, span: Span) {
        self.report(
            BindErrorKind::AmbiguousNullOrDefaultOperand {
                op: self.op.as_str(),
                operand,
                literal,
            },
            span,
        );
    }

    fn report(&mut self, kind: BindErrorKind, span: Span) {
        self.diags.push(kind.into_diagnostic(span));
    }
}

fn shape_side(view: SideView<'_>) -> ShapeSide<'_> {
    match view {
        SideView::Literal { elems, .. } => ShapeSide {
            kind: ShapeSideKind::Literal(elems),
            nullable: false,
        },
        SideView::Tuple {
            shape, nullable, ..
        } => ShapeSide {
            kind: ShapeSideKind::Typed(shape),
            nullable,
        },
        _ => unreachable!("only tuple shapes pair element-wise"),
    }
}

fn leaf_operand(view: SideView<'_>) -> LeafOperand {
    match view {
        SideView::Leaf(operand) => operand,
        SideView::Null(_) => LeafOperand::null(),
        SideView::Default(_) => LeafOperand::default_(),
        SideView::Literal { ty: Some(ty), .. } | SideView::Tuple { ty, .. } => {
            LeafOperand::typed(ty)
        }
        SideView::Literal { ty: None, .. } => LeafOperand::tuple_literal(),
    }
}

/// Whether a dynamically-typed value appears anywhere in the operand's
/// tuple structure: the operand type itself, a tuple element type, or a
/// literal element, at any depth.
fn operand_contains_dynamic(expr: &Expr) -> bool {
    if expr.ty.as_ref().is_some_and(Type::contains_dynamic) {
        return true;
    }
    match &expr.kind {
        ExprKind::TupleLit { elems } => elems
            .iter()
            .any(|elem| operand_contains_dynamic(&elem.expr)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::TypeTable;

    fn resolve(op: EqOp, left: &Expr, right: &Expr) -> (PlanNode, DiagnosticBag) {
        let table = TypeTable::new();
        let mut diags = DiagnosticBag::new();
        let node = Resolver::new(&table, &mut diags, op, Span::dummy()).build(left, right);
        (node, diags)
    }

    fn int_pair_ty() -> Type {
        Type::tuple_of(vec![Type::i32(), Type::i32()])
    }

    #[test]
    fn test_literal_pair_builds_nested_tuple() {
        let l = Expr::tuple(vec![Expr::int(1), Expr::int(2)]);
        let r = Expr::tuple(vec![Expr::int(1), Expr::int(2)]);
        let (node, diags) = resolve(EqOp::Equal, &l, &r);
        assert!(!diags.has_errors());
        let PlanNode::NestedTuple { elements } = &node else {
            panic!("expected nested tuple, got {node}");
        };
        assert_eq!(elements.len(), 2);
        assert!(matches!(elements[0], PlanNode::Primitive(_)));
    }

    #[test]
    fn test_cardinality_mismatch_is_one_top_level_error() {
        let l = Expr::tuple(vec![Expr::int(1), Expr::int(1)]);
        let r = Expr::tuple(vec![Expr::int(2), Expr::int(2), Expr::int(2)]);
        let (node, diags) = resolve(EqOp::Equal, &l, &r);
        assert!(matches!(node, PlanNode::Mismatch));
        let errors: Vec<_> = diags.diagnostics().iter().filter(|d| d.is_error()).collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("arity 2"));
        assert!(errors[0].message.contains("arity 3"));
    }

    #[test]
    fn test_nested_cardinality_mismatch_aborts_whole_expression() {
        let l = Expr::tuple(vec![
            Expr::int(0),
            Expr::tuple(vec![Expr::int(1), Expr::int(2)]),
        ]);
        let r = Expr::tuple(vec![
            Expr::int(0),
            Expr::tuple(vec![Expr::int(1), Expr::int(2), Expr::int(3)]),
        ]);
        let (node, diags) = resolve(EqOp::Equal, &l, &r);
        assert!(matches!(node, PlanNode::Mismatch));
        assert_eq!(
            diags.diagnostics().iter().filter(|d| d.is_error()).count(),
            1
        );
    }

    #[test]
    fn test_nullable_tuple_against_null_collapses() {
        let nt = Expr::local(0, "nt", Type::nullable(int_pair_ty()));
        let (node, diags) = resolve(EqOp::Equal, &nt, &Expr::null());
        assert!(!diags.has_errors());
        let PlanNode::NullableLifted { mode, element } = &node else {
            panic!("expected lifted node, got {node}");
        };
        assert_eq!(*mode, LiftMode::LeftVsAbsent);
        assert!(element.is_none());
    }

    #[test]
    fn test_default_against_non_nullable_tuple_is_ambiguous() {
        let t = Expr::local(0, "t", int_pair_ty());
        let (node, diags) = resolve(EqOp::Equal, &t, &Expr::default_());
        assert!(matches!(node, PlanNode::Mismatch));
        assert!(diags.has_errors());
        assert!(diags.diagnostics()[0]
            .code
            .as_deref()
            .is_some_and(|c| c == "E0703"));
    }

    #[test]
    fn test_default_inside_literal_is_structural() {
        let l = Expr::tuple(vec![Expr::int(0), Expr::default_()]);
        let t = Expr::local(0, "t", int_pair_ty());
        let (node, diags) = resolve(EqOp::Equal, &l, &t);
        assert!(!diags.has_errors());
        let PlanNode::NestedTuple { elements } = &node else {
            panic!("expected nested tuple");
        };
        assert!(matches!(elements[1], PlanNode::Primitive(_)));
    }

    #[test]
    fn test_nullable_element_lifts_inside_tuple() {
        let l = Expr::local(
            0,
            "a",
            Type::tuple_of(vec![Type::i32(), Type::nullable(int_pair_ty())]),
        );
        let r = Expr::local(
            1,
            "b",
            Type::tuple_of(vec![Type::i32(), Type::nullable(int_pair_ty())]),
        );
        let (node, diags) = resolve(EqOp::Equal, &l, &r);
        assert!(!diags.has_errors());
        let PlanNode::NestedTuple { elements } = &node else {
            panic!("expected nested tuple");
        };
        assert!(matches!(
            &elements[1],
            PlanNode::NullableLifted {
                mode: LiftMode::BothNullable,
                element: Some(_)
            }
        ));
    }

    #[test]
    fn test_tuple_against_scalar_leaf_has_no_operator() {
        let l = Expr::tuple(vec![
            Expr::tuple(vec![Expr::int(1), Expr::int(2)]),
            Expr::int(3),
        ]);
        let r = Expr::tuple(vec![Expr::int(9), Expr::int(3)]);
        let (node, diags) = resolve(EqOp::Equal, &l, &r);
        let PlanNode::NestedTuple { elements } = &node else {
            panic!("expected nested tuple");
        };
        assert!(matches!(elements[0], PlanNode::Mismatch));
        assert!(diags.has_errors());
    }

    #[test]
    fn test_dynamic_element_infects_every_leaf() {
        let l = Expr::tuple(vec![Expr::int(2), Expr::local(0, "d", Type::dynamic())]);
        let r = Expr::tuple(vec![Expr::int(2), Expr::int(3)]);
        let (node, diags) = resolve(EqOp::Equal, &l, &r);
        assert!(!diags.has_errors());
        let PlanNode::NestedTuple { elements } = &node else {
            panic!("expected nested tuple");
        };
        // The statically-known i32 pair is dynamized too.
        assert!(matches!(elements[0], PlanNode::DynamicDispatch { .. }));
        assert!(matches!(elements[1], PlanNode::DynamicDispatch { .. }));
    }

    #[test]
    fn test_top_level_dynamic_operand_collapses_plan() {
        let d = Expr::local(0, "d", Type::dynamic());
        let r = Expr::tuple(vec![Expr::int(1), Expr::int(1)]);
        let (node, diags) = resolve(EqOp::Equal, &d, &r);
        assert!(!diags.has_errors());
        assert!(matches!(node, PlanNode::DynamicDispatch { .. }));
    }

    #[test]
    fn test_ignored_name_warnings_right_side_wins() {
        use crate::hir::TupleLitElem;
        let l = Expr::tuple_named(vec![
            TupleLitElem::named("a", Expr::int(1)),
            TupleLitElem::named("b", Expr::int(2)),
        ]);
        let r = Expr::tuple_named(vec![
            TupleLitElem::named("c", Expr::int(1)),
            TupleLitElem::unnamed(Expr::int(2)),
        ]);
        let (_, diags) = resolve(EqOp::Equal, &l, &r);
        let warnings: Vec<_> = diags
            .diagnostics()
            .iter()
            .filter(|d| !d.is_error())
            .collect();
        assert_eq!(warnings.len(), 2);
        // Slot 1: both sides named differently, the right one is warned.
        assert!(warnings[0].message.contains('`') && warnings[0].message.contains("c"));
        // Slot 2: only the left side names the element.
        assert!(warnings[1].message.contains("b"));
    }

    #[test]
    fn test_matching_names_do_not_warn() {
        use crate::hir::{TupleElem, TupleLitElem};
        let named_ty = Type::tuple(vec![
            TupleElem::named("x", Type::i32()),
            TupleElem::named("y", Type::i32()),
        ]);
        let t = Expr::local(0, "t", named_ty);
        let lit = Expr::tuple_named(vec![
            TupleLitElem::named("x", Expr::int(1)),
            TupleLitElem::named("y", Expr::int(2)),
        ]);
        let (_, diags) = resolve(EqOp::Equal, &t, &lit);
        assert!(diags.diagnostics().is_empty());
    }
}

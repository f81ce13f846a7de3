//! Standard equality-operator resolution for non-tuple leaves.
//!
//! This is the collaborator seam between tuple-comparison binding and the
//! host's general operator machinery: every leaf of the comparison plan is
//! resolved here as if the two element values were compared directly. The
//! rest of the pass only calls [`resolve_leaf`], so a host binder with a
//! richer overload-resolution engine can stand in for this module.
//!
//! Resolution order mirrors the host language:
//!
//! 1. user-defined `==`/`!=` candidates on either operand's type (bases
//!    included), applicability decided by implicit convertibility;
//! 2. builtin comparisons (numeric with widening, `bool`, `str`, `char`,
//!    reference identity between related reference types);
//! 3. otherwise the leaf is ill-formed.
//!
//! A non-boolean result type must coerce: an implicit conversion to bool
//! wins, else the truth-testing protocol (`operator false` for `==`
//! conjunctions, `operator true` for `!=` disjunctions, found through
//! bases), else the comparison is ill-formed.

use crate::diagnostics::BindErrorKind;
use crate::hir::{
    ConvRef, EqOp, OpRef, OperatorKind, PrimitiveTy, Type, TypeKind, TypeTable,
};

/// A builtin comparison strategy for a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinComparison {
    /// Numeric comparison at a common widened type.
    Numeric(PrimitiveTy),
    Bool,
    Str,
    Char,
    /// Reference identity between related reference types.
    Reference,
    /// Both operands are the `null` literal; the result is a constant.
    NullNull,
}

/// The operator a leaf resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorChoice {
    Builtin(BuiltinComparison),
    UserDefined(OpRef),
}

/// How an operand reaches its comparison type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub kind: ConversionKind,
    /// The type the operand has after conversion.
    pub to: Type,
}

impl Conversion {
    pub fn identity(to: Type) -> Self {
        Self {
            kind: ConversionKind::Identity,
            to,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.kind == ConversionKind::Identity
    }
}

/// The kind of an operand conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionKind {
    Identity,
    /// Numeric widening between primitive types.
    NumericWiden,
    /// Wrapping a value in the nullable wrapper.
    NullableWrap,
    /// Reference conversion from a derived type to a base.
    BaseClass,
    /// A user-defined implicit conversion.
    UserImplicit(ConvRef),
    /// Typing the `null` literal at the target type.
    NullLiteral,
    /// Producing the default value of the target type.
    DefaultLiteral,
}

/// How a non-boolean leaf result becomes usable in the short-circuit tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolCoercion {
    /// The result is already boolean.
    Identity,
    /// A user-defined implicit conversion to bool.
    Implicit(ConvRef),
    /// The truth-testing protocol: `operator false` for `==`,
    /// `operator true` for `!=`.
    Truth(OpRef),
}

/// A fully resolved leaf comparison.
#[derive(Debug, Clone)]
pub struct LeafResolution {
    pub operator: OperatorChoice,
    /// Whether the comparison is lifted over nullable operands.
    pub lifted: bool,
    pub lhs: Conversion,
    pub rhs: Conversion,
    /// The operator's declared result type.
    pub result_ty: Type,
    pub coercion: BoolCoercion,
}

/// What a leaf operand is, as far as resolution cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafConst {
    /// An ordinary typed value.
    Value,
    /// The bare `null` literal.
    Null,
    /// The bare `default` literal.
    Default,
    /// A typeless tuple literal that reached a leaf position.
    TupleLiteral,
}

/// One side of a leaf comparison.
#[derive(Debug, Clone)]
pub struct LeafOperand {
    pub ty: Option<Type>,
    pub constant: LeafConst,
}

impl LeafOperand {
    pub fn typed(ty: Type) -> Self {
        Self {
            ty: Some(ty),
            constant: LeafConst::Value,
        }
    }

    pub fn null() -> Self {
        Self {
            ty: None,
            constant: LeafConst::Null,
        }
    }

    pub fn default_() -> Self {
        Self {
            ty: None,
            constant: LeafConst::Default,
        }
    }

    pub fn tuple_literal() -> Self {
        Self {
            ty: None,
            constant: LeafConst::TupleLiteral,
        }
    }

    /// A printable description for diagnostics.
    pub fn describe(&self) -> String {
        match (&self.ty, self.constant) {
            (Some(ty), _) => ty.to_string(),
            (None, LeafConst::Null) => "<null>".to_string(),
            (None, LeafConst::Default) => "<default>".to_string(),
            (None, LeafConst::TupleLiteral) => "<tuple literal>".to_string(),
            (None, LeafConst::Value) => "{error}".to_string(),
        }
    }
}

fn numeric_rank(p: PrimitiveTy) -> Option<u8> {
    match p {
        PrimitiveTy::I32 => Some(0),
        PrimitiveTy::I64 => Some(1),
        PrimitiveTy::F64 => Some(2),
        _ => None,
    }
}

/// Find an implicit conversion from `from` to `to`, if one exists.
pub fn implicit_conversion(table: &TypeTable, from: &Type, to: &Type) -> Option<Conversion> {
    if from == to {
        return Some(Conversion::identity(to.clone()));
    }
    match (from.kind(), to.kind()) {
        // Conversions into a nullable target: convert to the inner type,
        // then wrap. A nullable source converts inner-to-inner.
        (_, TypeKind::Nullable(to_inner)) => {
            if let TypeKind::Nullable(from_inner) = from.kind() {
                let inner = implicit_conversion(table, from_inner, to_inner)?;
                Some(Conversion {
                    kind: inner.kind,
                    to: to.clone(),
                })
            } else {
                implicit_conversion(table, from, to_inner)?;
                Some(Conversion {
                    kind: ConversionKind::NullableWrap,
                    to: to.clone(),
                })
            }
        }
        (TypeKind::Named { def: from_def, .. }, TypeKind::Named { def: to_def, .. })
            if table.derives_from(*from_def, *to_def) =>
        {
            Some(Conversion {
                kind: ConversionKind::BaseClass,
                to: to.clone(),
            })
        }
        (TypeKind::Prim(f), TypeKind::Prim(t)) => {
            let (fr, tr) = (numeric_rank(*f)?, numeric_rank(*t)?);
            (fr < tr).then(|| Conversion {
                kind: ConversionKind::NumericWiden,
                to: to.clone(),
            })
        }
        _ => user_conversion(table, from, to),
    }
}

/// Scan user-defined implicit conversions declared on either endpoint's
/// type (bases included).
fn user_conversion(table: &TypeTable, from: &Type, to: &Type) -> Option<Conversion> {
    let mut owners = Vec::new();
    if let TypeKind::Named { def, .. } = from.kind() {
        owners.extend(table.self_and_bases(*def));
    }
    if let TypeKind::Named { def, .. } = to.kind() {
        owners.extend(table.self_and_bases(*def));
    }
    for owner in owners {
        for (index, conv) in table.def(owner).conversions.iter().enumerate() {
            if conv.from == *from && conv.to == *to {
                return Some(Conversion {
                    kind: ConversionKind::UserImplicit(ConvRef { owner, index }),
                    to: to.clone(),
                });
            }
        }
    }
    None
}

/// Resolve the boolean coercion for an operator result type.
fn resolve_coercion(table: &TypeTable, op: EqOp, result_ty: &Type) -> Option<BoolCoercion> {
    if result_ty.is_bool() {
        return Some(BoolCoercion::Identity);
    }
    let (core, _) = result_ty.strip_nullable();
    let TypeKind::Named { def, .. } = core.kind() else {
        return None;
    };
    // An implicit conversion to bool wins over the truth protocol.
    for owner in table.self_and_bases(*def) {
        for (index, conv) in table.def(owner).conversions.iter().enumerate() {
            if conv.from == *core && conv.to.is_bool() {
                return Some(BoolCoercion::Implicit(ConvRef { owner, index }));
            }
        }
    }
    // `==` builds a conjunction and needs `operator false`; `!=` builds a
    // disjunction and needs `operator true`.
    let wanted = match op {
        EqOp::Equal => OperatorKind::False,
        EqOp::NotEqual => OperatorKind::True,
    };
    for owner in table.self_and_bases(*def) {
        for (index, opdef) in table.def(owner).operators.iter().enumerate() {
            if opdef.kind == wanted && opdef.params.first() == Some(core) {
                return Some(BoolCoercion::Truth(OpRef { owner, index }));
            }
        }
    }
    None
}

/// Resolve one leaf comparison.
pub fn resolve_leaf(
    table: &TypeTable,
    op: EqOp,
    left: &LeafOperand,
    right: &LeafOperand,
) -> Result<LeafResolution, BindErrorKind> {
    use LeafConst::*;

    let no_operator = || BindErrorKind::NoApplicableOperator {
        op: op.as_str(),
        left: left.describe(),
        right: right.describe(),
    };

    match (left.constant, right.constant) {
        // `null == null` folds to a constant downstream.
        (Null, Null) => {
            return Ok(LeafResolution {
                operator: OperatorChoice::Builtin(BuiltinComparison::NullNull),
                lifted: false,
                lhs: Conversion {
                    kind: ConversionKind::NullLiteral,
                    to: Type::error(),
                },
                rhs: Conversion {
                    kind: ConversionKind::NullLiteral,
                    to: Type::error(),
                },
                result_ty: Type::bool_(),
                coercion: BoolCoercion::Identity,
            });
        }
        // `default` facing nothing that supplies a type is ambiguous.
        (Default, Null | Default | TupleLiteral) | (Null | TupleLiteral, Default) => {
            return Err(BindErrorKind::AmbiguousNullOrDefaultOperand {
                op: op.as_str(),
                operand: if left.constant == Default {
                    right.describe()
                } else {
                    left.describe()
                },
                literal: "default",
            });
        }
        // A tuple literal in a leaf position has no comparable type.
        (TupleLiteral, _) | (_, TupleLiteral) => return Err(no_operator()),
        (Null, Value) | (Value, Null) | (Default, Value) | (Value, Default) | (Value, Value) => {}
    }

    // Give the null/default literal its type from the counterpart.
    let typed = |operand: &LeafOperand, other: &Type| -> Result<(Type, Conversion), BindErrorKind> {
        match operand.constant {
            Value => {
                let ty = operand.ty.clone().ok_or_else(no_operator)?;
                Ok((ty.clone(), Conversion::identity(ty)))
            }
            Default => Ok((
                other.clone(),
                Conversion {
                    kind: ConversionKind::DefaultLiteral,
                    to: other.clone(),
                },
            )),
            Null => {
                // `null` needs a nullable or reference counterpart type; a
                // non-nullable value type is lifted to carry it.
                let target = null_target(table, other).ok_or_else(no_operator)?;
                Ok((
                    target.clone(),
                    Conversion {
                        kind: ConversionKind::NullLiteral,
                        to: target,
                    },
                ))
            }
            TupleLiteral => unreachable!("tuple literals never reach typed resolution"),
        }
    };

    let (lhs_ty, rhs_ty) = match (left.constant, right.constant) {
        (Value, Value) => (
            left.ty.clone().ok_or_else(no_operator)?,
            right.ty.clone().ok_or_else(no_operator)?,
        ),
        _ => {
            let other = if left.constant == Value {
                left.ty.clone().ok_or_else(no_operator)?
            } else {
                right.ty.clone().ok_or_else(no_operator)?
            };
            let (l, _) = typed(left, &other)?;
            let (r, _) = typed(right, &other)?;
            (l, r)
        }
    };

    let (l_core, l_lifted) = lhs_ty.strip_nullable();
    let (r_core, r_lifted) = rhs_ty.strip_nullable();
    let lifted = l_lifted || r_lifted;

    // User-defined operators first.
    if let Some(resolution) =
        resolve_user_operator(table, op, left, right, l_core, r_core, lifted)?
    {
        return Ok(resolution);
    }

    // Builtin comparisons: find a common comparison type by converting one
    // side to the other.
    let builtin = if let Some(conv) = implicit_conversion(table, l_core, r_core) {
        Some((conv, Conversion::identity(r_core.clone()), r_core.clone()))
    } else {
        implicit_conversion(table, r_core, l_core)
            .map(|conv| (Conversion::identity(l_core.clone()), conv, l_core.clone()))
    };

    let (mut lhs, mut rhs, common) = builtin.ok_or_else(no_operator)?;
    let comparison = match common.kind() {
        TypeKind::Prim(p) => match p {
            PrimitiveTy::Bool => BuiltinComparison::Bool,
            PrimitiveTy::Str => BuiltinComparison::Str,
            PrimitiveTy::Char => BuiltinComparison::Char,
            _ => BuiltinComparison::Numeric(*p),
        },
        TypeKind::Named { def, .. } if table.def(*def).is_reference => {
            BuiltinComparison::Reference
        }
        // Value structs without a user-defined operator, tuples reaching a
        // leaf, and everything else have no builtin comparison.
        _ => return Err(no_operator()),
    };

    // The null/default literal's conversion replaces the computed one.
    if left.constant != Value {
        lhs = typed(left, &common)?.1;
    }
    if right.constant != Value {
        rhs = typed(right, &common)?.1;
    }

    Ok(LeafResolution {
        operator: OperatorChoice::Builtin(comparison),
        lifted,
        lhs,
        rhs,
        result_ty: Type::bool_(),
        coercion: BoolCoercion::Identity,
    })
}

/// Whether `null` can type itself at `core` directly (reference types)
/// rather than through the nullable wrapper.
fn is_reference_like(table: &TypeTable, core: &Type) -> bool {
    match core.kind() {
        TypeKind::Prim(PrimitiveTy::Str) => true,
        TypeKind::Named { def, .. } => table.def(*def).is_reference,
        _ => false,
    }
}

/// The type the `null` literal takes opposite `other`.
fn null_target(table: &TypeTable, other: &Type) -> Option<Type> {
    if other.is_nullable() {
        return Some(other.clone());
    }
    if is_reference_like(table, other) {
        return Some(other.clone());
    }
    match other.kind() {
        TypeKind::Prim(_) | TypeKind::Named { .. } => Some(Type::nullable(other.clone())),
        _ => None,
    }
}

/// Collect, filter, and pick among user-defined equality operators.
fn resolve_user_operator(
    table: &TypeTable,
    op: EqOp,
    left: &LeafOperand,
    right: &LeafOperand,
    l_core: &Type,
    r_core: &Type,
    lifted: bool,
) -> Result<Option<LeafResolution>, BindErrorKind> {
    let wanted = match op {
        EqOp::Equal => OperatorKind::Equal,
        EqOp::NotEqual => OperatorKind::NotEqual,
    };

    let mut owners = Vec::new();
    for core in [l_core, r_core] {
        if let TypeKind::Named { def, .. } = core.kind() {
            for owner in table.self_and_bases(*def) {
                if !owners.contains(&owner) {
                    owners.push(owner);
                }
            }
        }
    }
    if owners.is_empty() {
        return Ok(None);
    }

    struct Candidate {
        op_ref: OpRef,
        lhs: Conversion,
        rhs: Conversion,
        exact: bool,
    }

    let mut applicable = Vec::new();
    for owner in owners {
        for (index, opdef) in table.def(owner).operators.iter().enumerate() {
            if opdef.kind != wanted {
                continue;
            }
            let [p0, p1] = &opdef.params[..] else { continue };
            let lhs = convert_argument(table, left, l_core, p0, lifted);
            let rhs = convert_argument(table, right, r_core, p1, lifted);
            if let (Some(lhs), Some(rhs)) = (lhs, rhs) {
                let exact = lhs.is_identity() && rhs.is_identity();
                applicable.push(Candidate {
                    op_ref: OpRef { owner, index },
                    lhs,
                    rhs,
                    exact,
                });
            }
        }
    }

    let chosen = match applicable.len() {
        0 => return Ok(None),
        1 => applicable.into_iter().next().unwrap(),
        _ => {
            let mut exact = applicable.into_iter().filter(|c| c.exact);
            match (exact.next(), exact.next()) {
                (Some(only), None) => only,
                _ => {
                    return Err(BindErrorKind::AmbiguousOperator {
                        op: op.as_str(),
                        left: left.describe(),
                        right: right.describe(),
                    })
                }
            }
        }
    };

    let opdef = table.operator(chosen.op_ref);
    let result_ty = opdef.result.clone();
    let coercion = resolve_coercion(table, op, &result_ty).ok_or_else(|| {
        BindErrorKind::NonBooleanResult {
            op: op.as_str(),
            result: result_ty.to_string(),
        }
    })?;

    Ok(Some(LeafResolution {
        operator: OperatorChoice::UserDefined(chosen.op_ref),
        lifted,
        lhs: chosen.lhs,
        rhs: chosen.rhs,
        result_ty,
        coercion,
    }))
}

/// Conversion of one argument to a parameter type, honoring null/default
/// literals. In a lifted comparison `null` may face a value-typed
/// parameter; the operator is then invoked in its lifted form.
fn convert_argument(
    table: &TypeTable,
    operand: &LeafOperand,
    core: &Type,
    param: &Type,
    lifted: bool,
) -> Option<Conversion> {
    match operand.constant {
        LeafConst::Null => {
            if param.is_nullable() || is_reference_like(table, param) {
                Some(Conversion {
                    kind: ConversionKind::NullLiteral,
                    to: param.clone(),
                })
            } else if lifted {
                Some(Conversion {
                    kind: ConversionKind::NullLiteral,
                    to: Type::nullable(param.clone()),
                })
            } else {
                None
            }
        }
        LeafConst::Default => Some(Conversion {
            kind: ConversionKind::DefaultLiteral,
            to: param.clone(),
        }),
        _ => implicit_conversion(table, core, param),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::{Deprecation, ImplicitConversionDef, OperatorDef, TypeDef};

    fn leaf(ty: Type) -> LeafOperand {
        LeafOperand::typed(ty)
    }

    // ============================================================
    // BUILTIN RESOLUTION
    // ============================================================

    #[test]
    fn test_same_primitive_resolves_identity() {
        let table = TypeTable::new();
        let res = resolve_leaf(&table, EqOp::Equal, &leaf(Type::i32()), &leaf(Type::i32()))
            .unwrap();
        assert_eq!(
            res.operator,
            OperatorChoice::Builtin(BuiltinComparison::Numeric(PrimitiveTy::I32))
        );
        assert!(!res.lifted);
        assert!(res.lhs.is_identity() && res.rhs.is_identity());
    }

    #[test]
    fn test_numeric_widening_picks_common_type() {
        let table = TypeTable::new();
        let res = resolve_leaf(&table, EqOp::Equal, &leaf(Type::i32()), &leaf(Type::i64()))
            .unwrap();
        assert_eq!(
            res.operator,
            OperatorChoice::Builtin(BuiltinComparison::Numeric(PrimitiveTy::I64))
        );
        assert_eq!(res.lhs.kind, ConversionKind::NumericWiden);
        assert!(res.rhs.is_identity());
    }

    #[test]
    fn test_bool_and_str_compare_as_themselves() {
        let table = TypeTable::new();
        let res = resolve_leaf(
            &table,
            EqOp::NotEqual,
            &leaf(Type::bool_()),
            &leaf(Type::bool_()),
        )
        .unwrap();
        assert_eq!(res.operator, OperatorChoice::Builtin(BuiltinComparison::Bool));
        let res = resolve_leaf(&table, EqOp::Equal, &leaf(Type::str_()), &leaf(Type::str_()))
            .unwrap();
        assert_eq!(res.operator, OperatorChoice::Builtin(BuiltinComparison::Str));
    }

    #[test]
    fn test_bool_vs_int_has_no_operator() {
        let table = TypeTable::new();
        let err = resolve_leaf(&table, EqOp::Equal, &leaf(Type::bool_()), &leaf(Type::i32()))
            .unwrap_err();
        assert!(matches!(err, BindErrorKind::NoApplicableOperator { .. }));
    }

    #[test]
    fn test_nullable_operand_lifts_builtin() {
        let table = TypeTable::new();
        let res = resolve_leaf(
            &table,
            EqOp::Equal,
            &leaf(Type::nullable(Type::i32())),
            &leaf(Type::i32()),
        )
        .unwrap();
        assert!(res.lifted);
        assert_eq!(
            res.operator,
            OperatorChoice::Builtin(BuiltinComparison::Numeric(PrimitiveTy::I32))
        );
    }

    #[test]
    fn test_null_against_value_type_lifts() {
        let table = TypeTable::new();
        let res = resolve_leaf(
            &table,
            EqOp::Equal,
            &LeafOperand::null(),
            &leaf(Type::i32()),
        )
        .unwrap();
        assert!(res.lifted);
        assert_eq!(res.lhs.kind, ConversionKind::NullLiteral);
    }

    #[test]
    fn test_null_against_reference_is_not_lifted() {
        let table = TypeTable::new();
        let res = resolve_leaf(
            &table,
            EqOp::Equal,
            &leaf(Type::str_()),
            &LeafOperand::null(),
        )
        .unwrap();
        assert!(!res.lifted);
        assert_eq!(res.operator, OperatorChoice::Builtin(BuiltinComparison::Str));
    }

    #[test]
    fn test_null_against_null_is_constant() {
        let table = TypeTable::new();
        let res = resolve_leaf(
            &table,
            EqOp::Equal,
            &LeafOperand::null(),
            &LeafOperand::null(),
        )
        .unwrap();
        assert_eq!(
            res.operator,
            OperatorChoice::Builtin(BuiltinComparison::NullNull)
        );
    }

    #[test]
    fn test_default_against_default_is_ambiguous() {
        let table = TypeTable::new();
        let err = resolve_leaf(
            &table,
            EqOp::Equal,
            &LeafOperand::default_(),
            &LeafOperand::default_(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            BindErrorKind::AmbiguousNullOrDefaultOperand { .. }
        ));
    }

    #[test]
    fn test_default_takes_counterpart_type() {
        let table = TypeTable::new();
        let res = resolve_leaf(
            &table,
            EqOp::Equal,
            &leaf(Type::i64()),
            &LeafOperand::default_(),
        )
        .unwrap();
        assert_eq!(res.rhs.kind, ConversionKind::DefaultLiteral);
        assert_eq!(res.rhs.to, Type::i64());
    }

    // ============================================================
    // REFERENCE COMPARISONS
    // ============================================================

    #[test]
    fn test_related_references_compare_by_identity() {
        let mut table = TypeTable::new();
        let base = table.define(TypeDef::new("Base").reference());
        let derived = table.define(TypeDef::new("Derived").reference().with_base(base));
        let res = resolve_leaf(
            &table,
            EqOp::Equal,
            &leaf(Type::named(derived, "Derived")),
            &leaf(Type::named(base, "Base")),
        )
        .unwrap();
        assert_eq!(
            res.operator,
            OperatorChoice::Builtin(BuiltinComparison::Reference)
        );
        assert_eq!(res.lhs.kind, ConversionKind::BaseClass);
    }

    #[test]
    fn test_unrelated_references_do_not_compare() {
        let mut table = TypeTable::new();
        let a = table.define(TypeDef::new("A").reference());
        let b = table.define(TypeDef::new("B").reference());
        let err = resolve_leaf(
            &table,
            EqOp::Equal,
            &leaf(Type::named(a, "A")),
            &leaf(Type::named(b, "B")),
        )
        .unwrap_err();
        assert!(matches!(err, BindErrorKind::NoApplicableOperator { .. }));
    }

    #[test]
    fn test_value_struct_without_operator_fails() {
        let mut table = TypeTable::new();
        let s = table.define(TypeDef::new("S"));
        let err = resolve_leaf(
            &table,
            EqOp::Equal,
            &leaf(Type::named(s, "S")),
            &leaf(Type::named(s, "S")),
        )
        .unwrap_err();
        assert!(matches!(err, BindErrorKind::NoApplicableOperator { .. }));
    }

    // ============================================================
    // USER-DEFINED OPERATORS
    // ============================================================

    #[test]
    fn test_user_operator_preferred() {
        let mut table = TypeTable::new();
        let id = table.define_with(|id| {
            let ty = Type::named(id, "Pt");
            TypeDef::new("Pt")
                .with_operator(OperatorDef::equality(
                    OperatorKind::Equal,
                    ty.clone(),
                    ty.clone(),
                    Type::bool_(),
                ))
                .with_operator(OperatorDef::equality(
                    OperatorKind::NotEqual,
                    ty.clone(),
                    ty,
                    Type::bool_(),
                ))
        });
        let ty = Type::named(id, "Pt");
        let res = resolve_leaf(&table, EqOp::Equal, &leaf(ty.clone()), &leaf(ty)).unwrap();
        assert!(matches!(res.operator, OperatorChoice::UserDefined(_)));
        assert_eq!(res.result_ty, Type::bool_());
    }

    #[test]
    fn test_argument_converts_through_user_conversion() {
        let mut table = TypeTable::new();
        let y = table.define(TypeDef::new("Y").reference());
        let x = table.define_with(|id| {
            TypeDef::new("X")
                .reference()
                .with_conversion(ImplicitConversionDef::new(
                    Type::named(id, "X"),
                    Type::named(y, "Y"),
                ))
        });
        let a = table.define_with(|id| {
            TypeDef::new("A").reference().with_operator(OperatorDef::equality(
                OperatorKind::Equal,
                Type::named(id, "A"),
                Type::named(y, "Y"),
                Type::bool_(),
            ))
        });
        let res = resolve_leaf(
            &table,
            EqOp::Equal,
            &leaf(Type::named(a, "A")),
            &leaf(Type::named(x, "X")),
        )
        .unwrap();
        assert!(matches!(res.operator, OperatorChoice::UserDefined(_)));
        assert!(matches!(res.rhs.kind, ConversionKind::UserImplicit(_)));
    }

    #[test]
    fn test_null_against_nullable_struct_uses_lifted_operator() {
        let mut table = TypeTable::new();
        let s = table.define_with(|id| {
            let ty = Type::named(id, "S");
            TypeDef::new("S").with_operator(OperatorDef::equality(
                OperatorKind::Equal,
                ty.clone(),
                ty,
                Type::bool_(),
            ))
        });
        let res = resolve_leaf(
            &table,
            EqOp::Equal,
            &leaf(Type::nullable(Type::named(s, "S"))),
            &LeafOperand::null(),
        )
        .unwrap();
        assert!(res.lifted);
        assert!(matches!(res.operator, OperatorChoice::UserDefined(_)));
        assert_eq!(res.rhs.kind, ConversionKind::NullLiteral);
    }

    // ============================================================
    // BOOLEAN COERCION
    // ============================================================

    fn table_with_notbool_result(with_truth: bool, with_conv: bool) -> (TypeTable, Type, Type) {
        let mut table = TypeTable::new();
        let notbool = table.define_with(|id| {
            let ty = Type::named(id, "NotBool");
            let mut def = TypeDef::new("NotBool");
            if with_truth {
                def = def
                    .with_operator(OperatorDef::truth(OperatorKind::True, ty.clone()))
                    .with_operator(OperatorDef::truth(OperatorKind::False, ty.clone()));
            }
            if with_conv {
                def = def.with_conversion(ImplicitConversionDef::new(ty, Type::bool_()));
            }
            def
        });
        let notbool_ty = Type::named(notbool, "NotBool");
        let result = notbool_ty.clone();
        let s = table.define_with(|id| {
            let ty = Type::named(id, "S");
            TypeDef::new("S")
                .with_operator(OperatorDef::equality(
                    OperatorKind::Equal,
                    ty.clone(),
                    ty.clone(),
                    result.clone(),
                ))
                .with_operator(OperatorDef::equality(
                    OperatorKind::NotEqual,
                    ty.clone(),
                    ty,
                    result,
                ))
        });
        (table, Type::named(s, "S"), notbool_ty)
    }

    #[test]
    fn test_truth_protocol_selected_per_operator() {
        let (table, s_ty, _) = table_with_notbool_result(true, false);
        let res = resolve_leaf(&table, EqOp::Equal, &leaf(s_ty.clone()), &leaf(s_ty.clone()))
            .unwrap();
        let BoolCoercion::Truth(op_ref) = res.coercion else {
            panic!("expected truth coercion, got {:?}", res.coercion);
        };
        assert_eq!(table.operator(op_ref).kind, OperatorKind::False);

        let res = resolve_leaf(&table, EqOp::NotEqual, &leaf(s_ty.clone()), &leaf(s_ty)).unwrap();
        let BoolCoercion::Truth(op_ref) = res.coercion else {
            panic!("expected truth coercion");
        };
        assert_eq!(table.operator(op_ref).kind, OperatorKind::True);
    }

    #[test]
    fn test_implicit_bool_conversion_beats_truth_protocol() {
        let (table, s_ty, _) = table_with_notbool_result(true, true);
        let res = resolve_leaf(&table, EqOp::Equal, &leaf(s_ty.clone()), &leaf(s_ty)).unwrap();
        assert!(matches!(res.coercion, BoolCoercion::Implicit(_)));
    }

    #[test]
    fn test_nonbool_result_without_coercion_fails() {
        let (table, s_ty, _) = table_with_notbool_result(false, false);
        let err =
            resolve_leaf(&table, EqOp::Equal, &leaf(s_ty.clone()), &leaf(s_ty)).unwrap_err();
        assert!(matches!(err, BindErrorKind::NonBooleanResult { .. }));
    }

    #[test]
    fn test_deprecation_mark_travels_with_operator() {
        let mut table = TypeTable::new();
        let old = table.define_with(|id| {
            let ty = Type::named(id, "Old");
            TypeDef::new("Old").with_operator(
                OperatorDef::equality(OperatorKind::Equal, ty.clone(), ty, Type::bool_())
                    .deprecated(Deprecation::warn().with_message("use Equals")),
            )
        });
        let ty = Type::named(old, "Old");
        let res = resolve_leaf(&table, EqOp::Equal, &leaf(ty.clone()), &leaf(ty)).unwrap();
        let OperatorChoice::UserDefined(op_ref) = res.operator else {
            panic!("expected user operator");
        };
        assert!(table.operator(op_ref).deprecation.is_some());
    }
}

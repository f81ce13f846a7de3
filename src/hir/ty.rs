//! Type representation for tuple-comparison binding.
//!
//! Types arrive fully resolved from the host binder. The comparison pass
//! cares about a handful of structural facts: whether a type is
//! tuple-shaped, whether it sits under a nullable wrapper, whether it is
//! dynamically typed, and how long tuples nest through the extension slot.
//!
//! # Extension slots
//!
//! A tuple type holds at most [`INLINE_WIDTH`] physical slots. Arities
//! beyond that are represented by nesting the remainder in a trailing
//! extension slot of tuple type: a 10-tuple is physically seven elements
//! plus an extension slot holding a 3-tuple. The extension slot is a
//! representation detail; arity counts its *contained* elements, never the
//! slot itself. [`Type::tuple`] performs the nesting, so every tuple type
//! in the system is in canonical form by construction.

use std::fmt;
use std::sync::Arc;

use super::def::DefId;

/// Maximum number of physical slots in one tuple type. When a tuple is
/// this wide, the last slot is the extension slot.
pub const INLINE_WIDTH: usize = 8;

/// A primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTy {
    Bool,
    I32,
    I64,
    F64,
    Char,
    Str,
}

impl PrimitiveTy {
    /// Whether this primitive participates in numeric widening.
    pub fn is_numeric(self) -> bool {
        matches!(self, PrimitiveTy::I32 | PrimitiveTy::I64 | PrimitiveTy::F64)
    }
}

impl fmt::Display for PrimitiveTy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimitiveTy::Bool => "bool",
            PrimitiveTy::I32 => "i32",
            PrimitiveTy::I64 => "i64",
            PrimitiveTy::F64 => "f64",
            PrimitiveTy::Char => "char",
            PrimitiveTy::Str => "str",
        };
        f.write_str(name)
    }
}

/// One physical slot of a tuple type: an element type plus an optional
/// element name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TupleElem {
    pub ty: Type,
    pub name: Option<String>,
}

impl TupleElem {
    /// An unnamed element.
    pub fn unnamed(ty: Type) -> Self {
        Self { ty, name: None }
    }

    /// A named element.
    pub fn named(name: impl Into<String>, ty: Type) -> Self {
        Self {
            ty,
            name: Some(name.into()),
        }
    }
}

/// A resolved type.
///
/// The `Arc` wrapper allows cheap cloning and sharing, matching how the
/// host binder hands types around.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Type {
    kind: Arc<TypeKind>,
}

/// The kind of a resolved type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A primitive type.
    Prim(PrimitiveTy),
    /// A tuple type in canonical form (at most `INLINE_WIDTH` physical
    /// slots; when full, the last slot is the extension slot).
    Tuple(Vec<TupleElem>),
    /// A nullable wrapper. Never nested.
    Nullable(Type),
    /// A user-defined type.
    Named { def: DefId, name: String },
    /// A dynamically-typed value; infects the whole comparison plan.
    Dynamic,
    /// The error type, for best-effort recovery.
    Error,
}

impl Type {
    fn new(kind: TypeKind) -> Self {
        Self {
            kind: Arc::new(kind),
        }
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn bool_() -> Self {
        Self::new(TypeKind::Prim(PrimitiveTy::Bool))
    }

    pub fn i32() -> Self {
        Self::new(TypeKind::Prim(PrimitiveTy::I32))
    }

    pub fn i64() -> Self {
        Self::new(TypeKind::Prim(PrimitiveTy::I64))
    }

    pub fn f64() -> Self {
        Self::new(TypeKind::Prim(PrimitiveTy::F64))
    }

    pub fn char_() -> Self {
        Self::new(TypeKind::Prim(PrimitiveTy::Char))
    }

    pub fn str_() -> Self {
        Self::new(TypeKind::Prim(PrimitiveTy::Str))
    }

    pub fn prim(p: PrimitiveTy) -> Self {
        Self::new(TypeKind::Prim(p))
    }

    pub fn named(def: DefId, name: impl Into<String>) -> Self {
        Self::new(TypeKind::Named {
            def,
            name: name.into(),
        })
    }

    pub fn dynamic() -> Self {
        Self::new(TypeKind::Dynamic)
    }

    pub fn error() -> Self {
        Self::new(TypeKind::Error)
    }

    /// Wrap a type in the nullable wrapper. Wrapping a nullable type is a
    /// host-binder bug; the wrapper never nests.
    pub fn nullable(inner: Type) -> Self {
        debug_assert!(
            !inner.is_nullable(),
            "nullable wrappers never nest: {inner}"
        );
        Self::new(TypeKind::Nullable(inner))
    }

    /// Build a tuple type in canonical form. Arities at or beyond
    /// [`INLINE_WIDTH`] keep the first `INLINE_WIDTH - 1` elements inline
    /// and nest the remainder in the extension slot, so a full-width
    /// physical tuple always carries an extension slot last.
    pub fn tuple(mut elems: Vec<TupleElem>) -> Self {
        debug_assert!(!elems.is_empty(), "tuple types have at least one element");
        if elems.len() >= INLINE_WIDTH {
            let rest = elems.split_off(INLINE_WIDTH - 1);
            elems.push(TupleElem::unnamed(Type::tuple(rest)));
        }
        Self::new(TypeKind::Tuple(elems))
    }

    /// Build an unnamed tuple type from element types.
    pub fn tuple_of(elems: Vec<Type>) -> Self {
        Self::tuple(elems.into_iter().map(TupleElem::unnamed).collect())
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind(), TypeKind::Error)
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.kind(), TypeKind::Dynamic)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.kind(), TypeKind::Prim(PrimitiveTy::Bool))
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self.kind(), TypeKind::Nullable(_))
    }

    /// The physical slots if this is a tuple type.
    pub fn as_tuple(&self) -> Option<&[TupleElem]> {
        match self.kind() {
            TypeKind::Tuple(elems) => Some(elems),
            _ => None,
        }
    }

    /// Strip at most one nullable wrapper, reporting whether one was there.
    pub fn strip_nullable(&self) -> (&Type, bool) {
        match self.kind() {
            TypeKind::Nullable(inner) => (inner, true),
            _ => (self, false),
        }
    }

    /// Whether this type is tuple-shaped through at most one nullable
    /// wrapper.
    pub fn is_tuple_shaped(&self) -> bool {
        let (stripped, _) = self.strip_nullable();
        matches!(stripped.kind(), TypeKind::Tuple(_))
    }

    /// The flattened arity of a tuple type, counting through extension
    /// slots. A 10-tuple has arity 10, not 8.
    pub fn flattened_arity(&self) -> Option<usize> {
        let elems = self.as_tuple()?;
        if elems.len() == INLINE_WIDTH {
            let ext = elems[INLINE_WIDTH - 1]
                .ty
                .flattened_arity()
                .expect("extension slot is always tuple-typed");
            Some(INLINE_WIDTH - 1 + ext)
        } else {
            Some(elems.len())
        }
    }

    /// Whether a dynamically-typed value appears anywhere in this type's
    /// tuple structure. Dynamic inside a user-defined type does not count;
    /// only operand and element positions infect the plan.
    pub fn contains_dynamic(&self) -> bool {
        match self.kind() {
            TypeKind::Dynamic => true,
            TypeKind::Nullable(inner) => inner.contains_dynamic(),
            TypeKind::Tuple(elems) => elems.iter().any(|e| e.ty.contains_dynamic()),
            _ => false,
        }
    }

    /// Collect logical elements in order, flattening extension slots.
    fn collect_flat<'a>(elems: &'a [TupleElem], out: &mut Vec<&'a TupleElem>) {
        if elems.len() == INLINE_WIDTH {
            out.extend(elems[..INLINE_WIDTH - 1].iter());
            let ext = elems[INLINE_WIDTH - 1]
                .ty
                .as_tuple()
                .expect("extension slot is always tuple-typed");
            Type::collect_flat(ext, out);
        } else {
            out.extend(elems.iter());
        }
    }

    fn fmt_tuple(elems: &[TupleElem], f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Display flattens extension slots: a 10-tuple prints 10 elements.
        let mut flat = Vec::new();
        Type::collect_flat(elems, &mut flat);
        f.write_str("(")?;
        for (i, elem) in flat.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if let Some(name) = &elem.name {
                write!(f, "{name}: ")?;
            }
            write!(f, "{}", elem.ty)?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            TypeKind::Prim(p) => write!(f, "{p}"),
            TypeKind::Tuple(elems) => Type::fmt_tuple(elems, f),
            TypeKind::Nullable(inner) => write!(f, "{inner}?"),
            TypeKind::Named { name, .. } => f.write_str(name),
            TypeKind::Dynamic => f.write_str("dynamic"),
            TypeKind::Error => f.write_str("{error}"),
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_tuple(n: usize) -> Type {
        Type::tuple_of((0..n).map(|_| Type::i32()).collect())
    }

    #[test]
    fn test_short_tuple_stays_flat() {
        let t = long_tuple(7);
        assert_eq!(t.as_tuple().unwrap().len(), 7);
        assert_eq!(t.flattened_arity(), Some(7));
    }

    #[test]
    fn test_wide_tuple_nests_through_extension_slot() {
        let t = long_tuple(10);
        let slots = t.as_tuple().unwrap();
        assert_eq!(slots.len(), INLINE_WIDTH);
        let ext = &slots[INLINE_WIDTH - 1].ty;
        assert_eq!(ext.flattened_arity(), Some(3));
        assert_eq!(t.flattened_arity(), Some(10));
    }

    #[test]
    fn test_very_wide_tuple_nests_recursively() {
        let t = long_tuple(17);
        assert_eq!(t.flattened_arity(), Some(17));
        let slots = t.as_tuple().unwrap();
        let ext = &slots[INLINE_WIDTH - 1].ty;
        // 10 remaining elements nest once more.
        assert_eq!(ext.as_tuple().unwrap().len(), INLINE_WIDTH);
        assert_eq!(ext.flattened_arity(), Some(10));
    }

    #[test]
    fn test_arity_eight_goes_through_extension() {
        let t = long_tuple(8);
        let slots = t.as_tuple().unwrap();
        assert_eq!(slots.len(), INLINE_WIDTH);
        assert_eq!(slots[INLINE_WIDTH - 1].ty.flattened_arity(), Some(1));
        assert_eq!(t.flattened_arity(), Some(8));
    }

    #[test]
    fn test_nullable_tuple_is_tuple_shaped() {
        let t = Type::nullable(long_tuple(2));
        assert!(t.is_tuple_shaped());
        assert!(t.is_nullable());
        assert!(t.as_tuple().is_none());
    }

    #[test]
    fn test_contains_dynamic_through_structure() {
        let t = Type::tuple_of(vec![Type::i32(), Type::dynamic()]);
        assert!(t.contains_dynamic());
        let n = Type::nullable(Type::tuple_of(vec![Type::i32(), Type::i32()]));
        assert!(!n.contains_dynamic());
    }
}

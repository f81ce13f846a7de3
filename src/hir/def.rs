//! User-defined type definitions and member lookup.
//!
//! The host binder owns the real symbol tables; this pass only needs the
//! slice of them that equality binding consults: user-defined equality
//! operators, implicit conversions, truth-testing operators, positional
//! decomposition arity, and deprecation marks. [`TypeTable`] holds that
//! slice, indexed by [`DefId`].

use std::fmt;

use super::ty::Type;

/// The unique identifier of a user-defined type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefId(pub u32);

impl fmt::Display for DefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "def{}", self.0)
    }
}

/// The unique identifier of a local variable in the enclosing body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalId(pub u32);

/// How strongly a deprecation mark is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeprecationLevel {
    /// Surface a warning diagnostic.
    Warn,
    /// Surface an error diagnostic. Binding still succeeds.
    Deny,
}

/// A deprecation mark on an operator or conversion.
#[derive(Debug, Clone)]
pub struct Deprecation {
    pub message: Option<String>,
    pub level: DeprecationLevel,
}

impl Deprecation {
    pub fn warn() -> Self {
        Self {
            message: None,
            level: DeprecationLevel::Warn,
        }
    }

    pub fn deny() -> Self {
        Self {
            message: None,
            level: DeprecationLevel::Deny,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// The kind of a user-defined operator relevant to equality binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    /// `operator ==`; two parameters.
    Equal,
    /// `operator !=`; two parameters.
    NotEqual,
    /// The truth-testing `operator true`; one parameter.
    True,
    /// The truth-testing `operator false`; one parameter.
    False,
}

/// A user-defined operator declaration.
#[derive(Debug, Clone)]
pub struct OperatorDef {
    pub kind: OperatorKind,
    /// Two parameters for `==`/`!=`, one for `true`/`false`.
    pub params: Vec<Type>,
    pub result: Type,
    pub deprecation: Option<Deprecation>,
}

impl OperatorDef {
    pub fn equality(kind: OperatorKind, lhs: Type, rhs: Type, result: Type) -> Self {
        debug_assert!(matches!(kind, OperatorKind::Equal | OperatorKind::NotEqual));
        Self {
            kind,
            params: vec![lhs, rhs],
            result,
            deprecation: None,
        }
    }

    pub fn truth(kind: OperatorKind, operand: Type) -> Self {
        debug_assert!(matches!(kind, OperatorKind::True | OperatorKind::False));
        Self {
            kind,
            params: vec![operand],
            result: Type::bool_(),
            deprecation: None,
        }
    }

    pub fn deprecated(mut self, mark: Deprecation) -> Self {
        self.deprecation = Some(mark);
        self
    }
}

/// A user-defined implicit conversion declaration. Explicit conversions
/// never participate in equality binding and are not modeled.
#[derive(Debug, Clone)]
pub struct ImplicitConversionDef {
    pub from: Type,
    pub to: Type,
    pub deprecation: Option<Deprecation>,
}

impl ImplicitConversionDef {
    pub fn new(from: Type, to: Type) -> Self {
        Self {
            from,
            to,
            deprecation: None,
        }
    }

    pub fn deprecated(mut self, mark: Deprecation) -> Self {
        self.deprecation = Some(mark);
        self
    }
}

/// A user-defined type as equality binding sees it.
#[derive(Debug, Clone)]
pub struct TypeDef {
    pub name: String,
    /// Base type for member lookup through inheritance.
    pub base: Option<DefId>,
    /// Reference types accept `null` and compare by reference when no
    /// user-defined operator applies.
    pub is_reference: bool,
    /// Positional decomposition arity, when the type supports it. A
    /// decomposition protocol never makes the type tuple-shaped for
    /// `==`/`!=`.
    pub deconstruct_arity: Option<usize>,
    pub operators: Vec<OperatorDef>,
    pub conversions: Vec<ImplicitConversionDef>,
}

impl TypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: None,
            is_reference: false,
            deconstruct_arity: None,
            operators: Vec::new(),
            conversions: Vec::new(),
        }
    }

    pub fn reference(mut self) -> Self {
        self.is_reference = true;
        self
    }

    pub fn with_base(mut self, base: DefId) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_deconstruct(mut self, arity: usize) -> Self {
        self.deconstruct_arity = Some(arity);
        self
    }

    pub fn with_operator(mut self, op: OperatorDef) -> Self {
        self.operators.push(op);
        self
    }

    pub fn with_conversion(mut self, conv: ImplicitConversionDef) -> Self {
        self.conversions.push(conv);
        self
    }
}

/// A reference to one operator declaration inside a [`TypeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpRef {
    pub owner: DefId,
    pub index: usize,
}

/// A reference to one conversion declaration inside a [`TypeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConvRef {
    pub owner: DefId,
    pub index: usize,
}

/// The user-defined types visible to one binding call.
#[derive(Debug, Default)]
pub struct TypeTable {
    defs: Vec<TypeDef>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type definition and return its id.
    pub fn define(&mut self, def: TypeDef) -> DefId {
        let id = DefId(self.defs.len() as u32);
        self.defs.push(def);
        id
    }

    /// Register a type definition whose members mention its own id.
    pub fn define_with(&mut self, build: impl FnOnce(DefId) -> TypeDef) -> DefId {
        let id = DefId(self.defs.len() as u32);
        let def = build(id);
        self.defs.push(def);
        id
    }

    pub fn def(&self, id: DefId) -> &TypeDef {
        &self.defs[id.0 as usize]
    }

    pub fn operator(&self, op: OpRef) -> &OperatorDef {
        &self.def(op.owner).operators[op.index]
    }

    pub fn conversion(&self, conv: ConvRef) -> &ImplicitConversionDef {
        &self.def(conv.owner).conversions[conv.index]
    }

    /// The type itself followed by its base chain, for member lookup
    /// through inheritance.
    pub fn self_and_bases(&self, id: DefId) -> Vec<DefId> {
        let mut chain = vec![id];
        let mut current = self.def(id).base;
        while let Some(base) = current {
            chain.push(base);
            current = self.def(base).base;
        }
        chain
    }

    /// Whether `id` is `ancestor` or derives from it.
    pub fn derives_from(&self, id: DefId, ancestor: DefId) -> bool {
        self.self_and_bases(id).contains(&ancestor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_chain_lookup() {
        let mut table = TypeTable::new();
        let base = table.define(TypeDef::new("Base").reference());
        let mid = table.define(TypeDef::new("Mid").reference().with_base(base));
        let leaf = table.define(TypeDef::new("Leaf").reference().with_base(mid));

        assert_eq!(table.self_and_bases(leaf), vec![leaf, mid, base]);
        assert!(table.derives_from(leaf, base));
        assert!(!table.derives_from(base, leaf));
    }

    #[test]
    fn test_operator_and_conversion_refs() {
        let mut table = TypeTable::new();
        let id = table.define(
            TypeDef::new("Point")
                .with_operator(OperatorDef::equality(
                    OperatorKind::Equal,
                    Type::i32(),
                    Type::i32(),
                    Type::bool_(),
                ))
                .with_conversion(ImplicitConversionDef::new(Type::i32(), Type::i64())),
        );
        let op = table.operator(OpRef { owner: id, index: 0 });
        assert_eq!(op.kind, OperatorKind::Equal);
        let conv = table.conversion(ConvRef { owner: id, index: 0 });
        assert_eq!(conv.to, Type::i64());
    }
}

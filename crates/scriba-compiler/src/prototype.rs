//! Function signatures.
//!
//! A prototype is a return type plus an ordered parameter list. Identity is
//! structural: the type system interns `(return_type, params...)` tuples so
//! identical signatures share one function [`Type`] id. Member functions
//! carry their implicit object as a `this`-flagged first parameter.

use crate::types::Type;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Prototype {
    return_type: Type,
    params: Vec<Type>,
}

impl Prototype {
    pub fn new(return_type: Type, params: Vec<Type>) -> Self {
        Self {
            return_type,
            params,
        }
    }

    /// Signature of a conversion operator: `this -> dest`.
    pub fn cast(object_type: Type, dest: Type) -> Self {
        Self::new(dest, vec![object_type.with_this()])
    }

    /// Signature of a member unary operator.
    pub fn unary_operator(return_type: Type, operand: Type) -> Self {
        Self::new(return_type, vec![operand])
    }

    /// Signature of a binary operator.
    pub fn binary_operator(return_type: Type, lhs: Type, rhs: Type) -> Self {
        Self::new(return_type, vec![lhs, rhs])
    }

    /// Signature of a destructor: `this -> void`.
    pub fn destructor(object_type: Type) -> Self {
        Self::new(Type::VOID, vec![object_type.with_reference().with_this()])
    }

    pub fn return_type(&self) -> Type {
        self.return_type
    }

    pub fn set_return_type(&mut self, ty: Type) {
        self.return_type = ty;
    }

    pub fn params(&self) -> &[Type] {
        &self.params
    }

    pub fn param(&self, index: usize) -> Type {
        self.params[index]
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn push_param(&mut self, ty: Type) {
        self.params.push(ty);
    }

    /// Inserts the implicit-object parameter at the front.
    pub fn with_implicit_object(mut self, object_type: Type) -> Self {
        self.params.insert(0, object_type.with_this());
        self
    }
}

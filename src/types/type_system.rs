//! Type System for Plume

use std::fmt;

/// The closed set of Plume types.
///
/// Types compare by value only: there is no subtyping and no coercion.
/// `Void` is only ever a function return type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Integer,
    Boolean,
    String,
    Void,
}

impl Type {
    /// Resolve a variable/parameter type name
    pub fn from_name(name: &str) -> Option<Type> {
        match name {
            "Integer" => Some(Type::Integer),
            "Boolean" => Some(Type::Boolean),
            "String" => Some(Type::String),
            _ => None,
        }
    }

    /// Resolve a function return type name (`void` included)
    pub fn from_return_name(name: &str) -> Option<Type> {
        match name {
            "void" => Some(Type::Void),
            other => Type::from_name(other),
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    /// Source spelling of this type
    pub fn name(&self) -> &'static str {
        match self {
            Type::Integer => "Integer",
            Type::Boolean => "Boolean",
            Type::String => "String",
            Type::Void => "void",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

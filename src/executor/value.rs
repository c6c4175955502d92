//! Runtime values

use std::fmt;

use crate::types::Type;

/// A runtime value. Equality is by content for every variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
    String(String),
}

impl Value {
    /// The type this value was constructed as; never `Void`
    pub fn ty(&self) -> Type {
        match self {
            Value::Integer(_) => Type::Integer,
            Value::Boolean(_) => Type::Boolean,
            Value::String(_) => Type::String,
        }
    }

    /// Initial value of a program-level variable.
    /// Strings start out uninitialized.
    pub fn initial(ty: Type) -> Option<Value> {
        match ty {
            Type::Integer => Some(Value::Integer(0)),
            Type::Boolean => Some(Value::Boolean(false)),
            Type::String | Type::Void => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::String(s) => f.write_str(s),
        }
    }
}

//! Variable frames
//!
//! One frame exists per active scope: the program body, plus one for every
//! function call in progress. Frames never share bindings.

use std::collections::HashMap;

use crate::executor::Value;
use crate::frontend::ast::Ident;
use crate::utils::{Error, Result};

/// Name → value bindings; `None` marks a declared but unassigned slot
#[derive(Debug, Default)]
pub struct Frame {
    slots: HashMap<String, Option<Value>>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Introduce a binding, initialized or not
    pub fn declare(&mut self, name: &str, value: Option<Value>) {
        self.slots.insert(name.to_string(), value);
    }

    /// Replace a binding
    pub fn assign(&mut self, name: &str, value: Value) {
        self.slots.insert(name.to_string(), Some(value));
    }

    /// Read a binding; unassigned (or absent) names are a runtime error
    pub fn read(&self, ident: &Ident) -> Result<Value> {
        match self.slots.get(&ident.name) {
            Some(Some(value)) => Ok(value.clone()),
            _ => Err(Error::execution(
                format!("cannot use uninitialized variable {}", ident.name),
                ident.span,
            )),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

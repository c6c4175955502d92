//! Executor module - tree-walking interpreter over a checked program

pub mod value;
pub mod frame;
pub mod interpreter;

pub use frame::Frame;
pub use interpreter::{Executor, Flow, MAX_CALL_DEPTH};
pub use value::Value;

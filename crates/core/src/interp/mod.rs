//! Content stream interpretation.
//!
//! This module contains:
//! - `interpreter`: the token loop and the text positioner
//! - `registry`: operator name lookup
//! - `operands`: operand stack values
//! - `stack`: the graphics state stack
//! - `options`: caller-supplied configuration
//! - `ops`: Operator implementations by category

pub mod interpreter;
pub mod operands;
pub mod ops;
pub mod options;
pub mod registry;
pub mod stack;

// Re-export main types for convenience
pub use interpreter::{
    Interpreter, TextObject, TextSeq, TextSeqItem, interpret, interpret_content,
};
pub use operands::Operand;
pub use options::InterpreterOptions;
pub use registry::{Operator, OperatorCategory};
pub use stack::GraphicsStateStack;

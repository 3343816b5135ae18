//! Dynamic argument values.
//!
//! Arguments and return values travel as `serde_json::Value`; the helpers
//! here let method implementations pull typed arguments out of a call.

pub use serde_json::Value;

use crate::error::MethodError;

static NULL: Value = Value::Null;

/// Argument at `index`, or `Value::Null` when the call passed fewer arguments.
pub fn arg(args: &[Value], index: usize) -> &Value {
    args.get(index).unwrap_or(&NULL)
}

pub fn arg_i64(args: &[Value], index: usize) -> Result<i64, MethodError> {
    arg(args, index)
        .as_i64()
        .ok_or_else(|| MethodError::invalid_argument(format!("argument {index} must be an integer")))
}

pub fn arg_str(args: &[Value], index: usize) -> Result<&str, MethodError> {
    arg(args, index)
        .as_str()
        .ok_or_else(|| MethodError::invalid_argument(format!("argument {index} must be a string")))
}

/// Optional string argument (`None` when missing or null).
pub fn opt_str(args: &[Value], index: usize) -> Option<&str> {
    arg(args, index).as_str()
}

//! Literal argument values for parameterized tests
//!
//! Parameter sets carry plain literals, so the value domain is small:
//! null, bools, integers, floats and strings. Rust values convert in with
//! `From`, and back out with [`FromValue`].

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A literal argument passed to a parameterized test body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// Name of the value's kind, used in conversion errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! value_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Int(i64::from(n))
                }
            }
        )*
    };
}

value_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(f64::from(x))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Errors raised when a test body reads its arguments
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArgumentError {
    #[error("missing argument at index {index} ({len} supplied)")]
    Missing { index: usize, len: usize },

    #[error("argument {index}: expected {expected}, found {found}")]
    TypeMismatch {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },
}

/// Conversion from a [`Value`] into a Rust type.
///
/// Returns the name of the expected kind on mismatch; [`arg`] turns that
/// into an [`ArgumentError`] carrying the argument position.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, &'static str>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, &'static str> {
        Ok(value.clone())
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, &'static str> {
        match value {
            Value::Bool(b) => Ok(*b),
            _ => Err("bool"),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, &'static str> {
        match value {
            Value::Int(n) => Ok(*n),
            _ => Err("int"),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self, &'static str> {
        match value {
            Value::Int(n) => i32::try_from(*n).map_err(|_| "i32"),
            _ => Err("int"),
        }
    }
}

impl FromValue for usize {
    fn from_value(value: &Value) -> Result<Self, &'static str> {
        match value {
            Value::Int(n) => usize::try_from(*n).map_err(|_| "usize"),
            _ => Err("int"),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, &'static str> {
        match value {
            Value::Float(x) => Ok(*x),
            // Integer literals widen
            Value::Int(n) => Ok(*n as f64),
            _ => Err("float"),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, &'static str> {
        match value {
            Value::Str(s) => Ok(s.clone()),
            _ => Err("string"),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, &'static str> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Read argument `index` of a parameter set as `T`.
///
/// ```
/// use verdict_core::{arg, Value};
///
/// let args = [Value::from(3), Value::from("knight")];
/// let n: i64 = arg(&args, 0).unwrap();
/// let piece: String = arg(&args, 1).unwrap();
/// assert_eq!((n, piece.as_str()), (3, "knight"));
/// ```
pub fn arg<T: FromValue>(args: &[Value], index: usize) -> Result<T, ArgumentError> {
    let value = args.get(index).ok_or(ArgumentError::Missing {
        index,
        len: args.len(),
    })?;
    T::from_value(value).map_err(|expected| ArgumentError::TypeMismatch {
        index,
        expected,
        found: value.type_name(),
    })
}

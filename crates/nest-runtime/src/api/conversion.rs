//! Conversion from Nest values to Rust types
//!
//! Lets a host read committed globals as native values.
//!
//! # Examples
//!
//! ```
//! use nest_runtime::api::FromValue;
//! use nest_runtime::Value;
//!
//! let numbers = Value::array(vec![Value::Number(1.0), Value::Number(2.0)]);
//! let rust: Vec<f64> = FromValue::from_value(&numbers).unwrap();
//! assert_eq!(rust, vec![1.0, 2.0]);
//! ```

use crate::value::Value;
use thiserror::Error;

/// Error type for value conversion failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// No global with that name has been committed
    #[error("No global named '{0}'")]
    Missing(String),
    /// Type mismatch during conversion
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },
    /// Array element type mismatch
    #[error("Array element type mismatch at index {index}: expected {expected}, found {found}")]
    ArrayElementTypeMismatch {
        index: usize,
        expected: String,
        found: String,
    },
}

/// Trait for converting a Nest `Value` to a Rust type
pub trait FromValue: Sized {
    /// Convert from Nest `Value` to Rust type
    ///
    /// # Errors
    ///
    /// Returns `ConversionError` if the value cannot be converted to the target type.
    fn from_value(value: &Value) -> Result<Self, ConversionError>;
}

fn mismatch(expected: &str, value: &Value) -> ConversionError {
    ConversionError::TypeMismatch {
        expected: expected.to_string(),
        found: value.type_name().to_string(),
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        Ok(value.clone())
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Number(n) => Ok(*n),
            _ => Err(mismatch("number", value)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bool(b) => Ok(*b),
            _ => Err(mismatch("bool", value)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::String(s) => Ok(s.as_ref().clone()),
            _ => Err(mismatch("string", value)),
        }
    }
}

/// `null` and `None` convert to `None`; `Some(v)` and any other value to `Some`
impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null | Value::Option(None) => Ok(None),
            Value::Option(Some(inner)) => T::from_value(inner).map(Some),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        let Value::Array(arr) = value else {
            return Err(mismatch("array", value));
        };

        arr.iter()
            .enumerate()
            .map(|(index, element)| {
                T::from_value(element).map_err(|err| match err {
                    ConversionError::TypeMismatch { expected, found } => {
                        ConversionError::ArrayElementTypeMismatch {
                            index,
                            expected,
                            found,
                        }
                    }
                    other => other,
                })
            })
            .collect()
    }
}

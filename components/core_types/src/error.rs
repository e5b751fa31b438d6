//! JavaScript error types and abrupt completions.
//!
//! [`JsError`] describes a native ECMAScript error (the kind plus a message).
//! [`Exception`] is the explicit abrupt completion: it carries whatever value
//! was thrown, so it can be redirected into a promise rejection instead of
//! unwinding the Rust stack.

use crate::object::JsObject;
use crate::value::Value;
use std::fmt;

/// The kind of JavaScript error.
///
/// These correspond to JavaScript's built-in error constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Plain `Error`
    Error,
    /// Syntax error in JavaScript code
    SyntaxError,
    /// Type error (e.g., calling a non-function)
    TypeError,
    /// Reference to an undefined variable
    ReferenceError,
    /// Value out of allowed range
    RangeError,
    /// Error in eval() function
    EvalError,
    /// Error in URI handling functions
    URIError,
    /// Several errors reported together (`Promise.any`)
    AggregateError,
    /// Internal engine error
    InternalError,
}

impl ErrorKind {
    /// Returns the constructor name of this error kind.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::EvalError => "EvalError",
            ErrorKind::URIError => "URIError",
            ErrorKind::AggregateError => "AggregateError",
            ErrorKind::InternalError => "InternalError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A native JavaScript error with a message.
///
/// # Examples
///
/// ```
/// use core_types::{JsError, ErrorKind};
///
/// let error = JsError::type_error("undefined is not a function");
/// assert_eq!(error.kind, ErrorKind::TypeError);
/// assert_eq!(error.to_string(), "TypeError: undefined is not a function");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct JsError {
    /// The type of error
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
}

impl JsError {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates a `TypeError`.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    /// Creates a `RangeError`.
    pub fn range_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RangeError, message)
    }

    /// Creates an `AggregateError`.
    pub fn aggregate(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AggregateError, message)
    }

    /// Creates an engine-internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }
}

/// A thrown value: the abrupt completion of an operation.
///
/// Any value can be thrown. Native errors are materialised into error
/// objects on conversion, so a caught exception is always an ordinary value
/// that can be handed to a reject function.
#[derive(Clone, thiserror::Error)]
#[error("Uncaught {0}")]
pub struct Exception(Value);

impl Exception {
    /// Wraps a thrown value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Returns the thrown value.
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Consumes the exception, returning the thrown value.
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Returns the native error data if the thrown value is an error object.
    pub fn error_data(&self) -> Option<JsError> {
        self.0.as_object().and_then(JsObject::error_data)
    }
}

impl fmt::Debug for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Exception").field(&self.0).finish()
    }
}

impl From<JsError> for Exception {
    fn from(error: JsError) -> Self {
        Self(Value::Object(JsObject::error(error, None)))
    }
}

/// Result of an operation that may complete abruptly.
pub type JsResult<T = Value> = Result<T, Exception>;

//! JavaScript value representation.
//!
//! This module provides the core `Value` enum that represents all possible
//! JavaScript values. Primitives are stored inline, objects are shared
//! handles into the object graph (see [`JsObject`]).

use crate::error::{JsError, JsResult};
use crate::object::{JsObject, PropertyKey};
use num_bigint::BigInt;
use num_traits::Zero;
use std::fmt;

/// Represents any JavaScript value.
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// let undefined = Value::Undefined;
/// let number = Value::Smi(42);
/// let float = Value::Double(3.14);
///
/// assert!(!undefined.is_truthy());
/// assert!(number.is_truthy());
/// assert_eq!(float.type_of(), "number");
/// ```
#[derive(Clone)]
pub enum Value {
    /// JavaScript undefined value
    Undefined,
    /// JavaScript null value
    Null,
    /// JavaScript boolean (true or false)
    Boolean(bool),
    /// Small integer (fits in 32 bits)
    Smi(i32),
    /// IEEE 754 double-precision floating point
    Double(f64),
    /// JavaScript string value
    String(std::string::String),
    /// JavaScript BigInt (arbitrary precision integer)
    BigInt(BigInt),
    /// Reference to an object (including functions, arrays and promises)
    Object(JsObject),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Value::Smi(n) => f.debug_tuple("Smi").field(n).finish(),
            Value::Double(n) => f.debug_tuple("Double").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::BigInt(n) => f.debug_tuple("BigInt").field(n).finish(),
            Value::Object(o) => f.debug_tuple("Object").field(o).finish(),
        }
    }
}

/// Strict-equality flavoured comparison; objects compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Smi(a), Value::Smi(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Smi(a), Value::Double(b)) | (Value::Double(b), Value::Smi(a)) => {
                f64::from(*a) == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Value {
    /// Returns whether this value is truthy in JavaScript semantics.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::Value;
    ///
    /// assert!(!Value::Undefined.is_truthy());
    /// assert!(!Value::Smi(0).is_truthy());
    /// assert!(!Value::Double(f64::NAN).is_truthy());
    /// assert!(Value::Smi(42).is_truthy());
    /// ```
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined => false,
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Smi(n) => *n != 0,
            Value::Double(n) => !n.is_nan() && *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::BigInt(n) => !n.is_zero(),
            Value::Object(_) => true,
        }
    }

    /// Returns the JavaScript typeof result for this value.
    ///
    /// Callable objects report `"function"`.
    ///
    /// ```
    /// use core_types::Value;
    ///
    /// assert_eq!(Value::Null.type_of(), "object");
    /// assert_eq!(Value::Boolean(true).type_of(), "boolean");
    /// ```
    pub fn type_of(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "object".to_string(), // JavaScript quirk
            Value::Boolean(_) => "boolean".to_string(),
            Value::Smi(_) | Value::Double(_) => "number".to_string(),
            Value::String(_) => "string".to_string(),
            Value::BigInt(_) => "bigint".to_string(),
            Value::Object(o) if o.is_callable() => "function".to_string(),
            Value::Object(_) => "object".to_string(),
        }
    }

    /// Returns true for `undefined`.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns true for `undefined` or `null`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Returns the object handle if this value is an object.
    pub fn as_object(&self) -> Option<&JsObject> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Returns the numeric value for Smi and Double.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Smi(n) => Some(f64::from(*n)),
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the string contents for string values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// IsCallable.
    pub fn is_callable(&self) -> bool {
        self.as_object().is_some_and(JsObject::is_callable)
    }

    /// IsConstructor.
    pub fn is_constructor(&self) -> bool {
        self.as_object().is_some_and(JsObject::is_constructor)
    }

    /// SameValue comparison.
    ///
    /// Unlike `==` on [`Value`], `NaN` equals itself and `+0` differs from `-0`.
    ///
    /// ```
    /// use core_types::Value;
    ///
    /// assert!(Value::Double(f64::NAN).same_value(&Value::Double(f64::NAN)));
    /// assert!(!Value::Double(0.0).same_value(&Value::Double(-0.0)));
    /// assert!(Value::Smi(1).same_value(&Value::Double(1.0)));
    /// ```
    pub fn same_value(&self, other: &Value) -> bool {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => {
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b && a.is_sign_negative() == b.is_sign_negative()
                }
            }
            _ => self == other,
        }
    }

    /// Get(V, P) for an arbitrary value.
    ///
    /// Property access on `undefined` or `null` throws a `TypeError`. Other
    /// primitives have no properties in this model and yield `undefined`.
    pub fn get(&self, key: impl Into<PropertyKey>) -> JsResult<Value> {
        let key = key.into();
        match self {
            Value::Object(o) => o.get_with_receiver(&key, self),
            Value::Undefined | Value::Null => Err(JsError::type_error(format!(
                "Cannot read properties of {} (reading '{}')",
                self, key
            ))
            .into()),
            _ => Ok(Value::Undefined),
        }
    }

    /// Call(F, thisArgument, args). Throws a `TypeError` if not callable.
    pub fn call(&self, this: &Value, args: &[Value]) -> JsResult<Value> {
        match self {
            Value::Object(o) => o.call(this, args),
            _ => Err(JsError::type_error(format!("{} is not a function", self)).into()),
        }
    }

    /// Invoke(V, P, args): looks up a method on the value and calls it with
    /// the value as receiver.
    pub fn invoke(&self, key: impl Into<PropertyKey>, args: &[Value]) -> JsResult<Value> {
        let key = key.into();
        let method = self.get(key.clone())?;
        if !method.is_callable() {
            return Err(JsError::type_error(format!("{} is not a function", key)).into());
        }
        method.call(self, args)
    }

    /// Construct(F, args) with `newTarget` equal to `F`.
    pub fn construct(&self, args: &[Value]) -> JsResult<Value> {
        match self {
            Value::Object(o) if o.is_constructor() => o.construct(args, o),
            _ => Err(JsError::type_error(format!("{} is not a constructor", self)).into()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Smi(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<std::string::String> for Value {
    fn from(s: std::string::String) -> Self {
        Value::String(s)
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::BigInt(n)
    }
}

impl From<JsObject> for Value {
    fn from(o: JsObject) -> Self {
        Value::Object(o)
    }
}

/// JavaScript `String()` style conversion.
///
/// ```
/// use core_types::Value;
///
/// assert_eq!(Value::Undefined.to_string(), "undefined");
/// assert_eq!(Value::Double(2.0).to_string(), "2");
/// assert_eq!(Value::Smi(42).to_string(), "42");
/// ```
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Smi(n) => write!(f, "{}", n),
            Value::Double(n) => {
                if n.is_nan() {
                    write!(f, "NaN")
                } else if n.is_infinite() {
                    if n.is_sign_positive() {
                        write!(f, "Infinity")
                    } else {
                        write!(f, "-Infinity")
                    }
                } else if n.fract() == 0.0 && n.abs() < 1e15 {
                    // Integer-valued doubles display without decimal point
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{}", s),
            Value::BigInt(n) => write!(f, "{}n", n),
            Value::Object(o) => {
                if let Some(error) = o.error_data() {
                    write!(f, "{}", error)
                } else if let Some(elements) = o.array_elements() {
                    let parts: Vec<std::string::String> = elements
                        .iter()
                        .map(|v| if v.is_nullish() { String::new() } else { v.to_string() })
                        .collect();
                    write!(f, "{}", parts.join(","))
                } else if o.is_callable() {
                    write!(f, "function {}() {{ [native code] }}", o.name())
                } else {
                    write!(f, "[object Object]")
                }
            }
        }
    }
}

//! Core JavaScript value types and error handling.
//!
//! This crate provides the foundational types shared by the runtime crates:
//! value representation, shared object handles and the error model.
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of JavaScript values
//! - [`JsObject`] - Reference counted object handle with native call slots
//! - [`JsError`] - Native JavaScript errors
//! - [`Exception`] - A thrown value (abrupt completion)
//! - [`JsResult`] - Result alias carrying an [`Exception`]
//!
//! # Examples
//!
//! ```
//! use core_types::{ErrorKind, Exception, JsError, JsObject, Value};
//!
//! let num = Value::Smi(42);
//! assert!(num.is_truthy());
//! assert_eq!(num.type_of(), "number");
//!
//! let thrower = JsObject::function("thrower", |_this, _args| {
//!     Err(JsError::type_error("boom").into())
//! });
//! let err: Exception = thrower.call(&Value::Undefined, &[]).unwrap_err();
//! assert_eq!(err.error_data().unwrap().kind, ErrorKind::TypeError);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod object;
mod value;

pub use error::{ErrorKind, Exception, JsError, JsResult};
pub use object::{
    prototype_from_constructor, species_constructor, JsObject, NativeConstructor, NativeFunction,
    ObjectKind, Property, PropertyKey, WellKnownSymbol,
};
pub use value::Value;

//! Shared object handles.
//!
//! Objects are reference counted and interior mutable. Every accessor in this
//! module releases its borrow before running user code (getters, native
//! functions), so callbacks are free to touch the same object again.

use crate::error::{JsError, JsResult};
use crate::value::Value;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Largest valid array index, `2^32 - 2`.
const MAX_ARRAY_INDEX: usize = u32::MAX as usize - 1;

/// Writes further than this past the end of the dense storage go to the
/// property map instead of growing the element vector.
const MAX_DENSE_GAP: usize = 1024;

/// Native `[[Call]]` behaviour: `(this, args) -> completion`.
pub type NativeFunction = Rc<dyn Fn(&Value, &[Value]) -> JsResult<Value>>;

/// Native `[[Construct]]` behaviour: `(args, newTarget) -> completion`.
pub type NativeConstructor = Rc<dyn Fn(&[Value], &JsObject) -> JsResult<Value>>;

/// Well-known symbols used by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownSymbol {
    /// `Symbol.iterator`
    Iterator,
    /// `Symbol.species`
    Species,
    /// `Symbol.toStringTag`
    ToStringTag,
}

impl fmt::Display for WellKnownSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WellKnownSymbol::Iterator => write!(f, "Symbol(Symbol.iterator)"),
            WellKnownSymbol::Species => write!(f, "Symbol(Symbol.species)"),
            WellKnownSymbol::ToStringTag => write!(f, "Symbol(Symbol.toStringTag)"),
        }
    }
}

/// A property key: a string or a well-known symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// String-named property
    String(String),
    /// Symbol-keyed property
    Symbol(WellKnownSymbol),
}

impl PropertyKey {
    fn array_index(&self) -> Option<usize> {
        match self {
            PropertyKey::String(s) if s == "0" => Some(0),
            PropertyKey::String(s)
                if !s.starts_with('0') && !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) =>
            {
                s.parse().ok().filter(|&index| index <= MAX_ARRAY_INDEX)
            }
            _ => None,
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::String(s) => write!(f, "{}", s),
            PropertyKey::Symbol(sym) => write!(f, "{}", sym),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        PropertyKey::String(s.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        PropertyKey::String(s)
    }
}

impl From<WellKnownSymbol> for PropertyKey {
    fn from(sym: WellKnownSymbol) -> Self {
        PropertyKey::Symbol(sym)
    }
}

/// A property slot.
#[derive(Debug, Clone)]
pub enum Property {
    /// Plain data property
    Data(Value),
    /// Accessor property; missing halves behave as `undefined`
    Accessor {
        /// Getter function
        get: Option<Value>,
        /// Setter function
        set: Option<Value>,
    },
}

/// Exotic behaviour of an object.
#[derive(Debug, Clone)]
pub enum ObjectKind {
    /// Ordinary object
    Ordinary,
    /// Array exotic object with dense elements
    Array(Vec<Value>),
    /// Error instance carrying native error data
    Error(JsError),
}

struct ObjectData {
    kind: ObjectKind,
    prototype: Option<JsObject>,
    properties: HashMap<PropertyKey, Property>,
    name: String,
    call: Option<NativeFunction>,
    construct: Option<NativeConstructor>,
    internal_slot: Option<Rc<dyn Any>>,
}

impl ObjectData {
    fn new(kind: ObjectKind, prototype: Option<JsObject>) -> Self {
        Self {
            kind,
            prototype,
            properties: HashMap::new(),
            name: String::new(),
            call: None,
            construct: None,
            internal_slot: None,
        }
    }
}

/// Handle to a heap object. Cloning shares the same object.
#[derive(Clone)]
pub struct JsObject(Rc<RefCell<ObjectData>>);

impl JsObject {
    fn from_data(data: ObjectData) -> Self {
        Self(Rc::new(RefCell::new(data)))
    }

    /// Creates an ordinary object with the given prototype.
    pub fn ordinary(prototype: Option<JsObject>) -> Self {
        Self::from_data(ObjectData::new(ObjectKind::Ordinary, prototype))
    }

    /// Creates an ordinary object that carries a native internal slot.
    pub fn with_internal_slot(prototype: Option<JsObject>, slot: Rc<dyn Any>) -> Self {
        let mut data = ObjectData::new(ObjectKind::Ordinary, prototype);
        data.internal_slot = Some(slot);
        Self::from_data(data)
    }

    /// Creates a callable built-in function object.
    ///
    /// ```
    /// use core_types::{JsObject, Value};
    ///
    /// let double = JsObject::function("double", |_this, args| {
    ///     let n = args.first().and_then(Value::as_number).unwrap_or(0.0);
    ///     Ok(Value::Double(n * 2.0))
    /// });
    /// let result = double.call(&Value::Undefined, &[Value::Smi(21)]).unwrap();
    /// assert_eq!(result, Value::Smi(42));
    /// ```
    pub fn function<F>(name: &str, call: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> JsResult<Value> + 'static,
    {
        let mut data = ObjectData::new(ObjectKind::Ordinary, None);
        data.name = name.to_string();
        data.call = Some(Rc::new(call));
        Self::from_data(data)
    }

    /// Creates a built-in function object that is also a constructor.
    pub fn constructor<F, C>(name: &str, call: F, construct: C) -> Self
    where
        F: Fn(&Value, &[Value]) -> JsResult<Value> + 'static,
        C: Fn(&[Value], &JsObject) -> JsResult<Value> + 'static,
    {
        let object = Self::function(name, call);
        object.0.borrow_mut().construct = Some(Rc::new(construct));
        object
    }

    /// Creates an array exotic object.
    pub fn array(elements: Vec<Value>, prototype: Option<JsObject>) -> Self {
        Self::from_data(ObjectData::new(ObjectKind::Array(elements), prototype))
    }

    /// Creates an error object.
    pub fn error(error: JsError, prototype: Option<JsObject>) -> Self {
        let message = error.message.clone();
        let object = Self::from_data(ObjectData::new(ObjectKind::Error(error), prototype));
        object.set("message", message);
        object
    }

    /// Returns true when both handles refer to the same object.
    pub fn ptr_eq(&self, other: &JsObject) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Function name, empty for non-functions.
    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    /// `[[GetPrototypeOf]]`
    pub fn prototype(&self) -> Option<JsObject> {
        self.0.borrow().prototype.clone()
    }

    /// `[[SetPrototypeOf]]`
    pub fn set_prototype(&self, prototype: Option<JsObject>) {
        self.0.borrow_mut().prototype = prototype;
    }

    /// Whether the object has a `[[Call]]` internal method.
    pub fn is_callable(&self) -> bool {
        self.0.borrow().call.is_some()
    }

    /// Whether the object has a `[[Construct]]` internal method.
    pub fn is_constructor(&self) -> bool {
        self.0.borrow().construct.is_some()
    }

    /// Returns the internal slot if it holds a `T`.
    pub fn internal_slot<T: Any>(&self) -> Option<Rc<T>> {
        let slot = self.0.borrow().internal_slot.clone()?;
        slot.downcast::<T>().ok()
    }

    /// Native error data for error objects.
    pub fn error_data(&self) -> Option<JsError> {
        match &self.0.borrow().kind {
            ObjectKind::Error(error) => Some(error.clone()),
            _ => None,
        }
    }

    /// Snapshot of the dense elements of an array object.
    pub fn array_elements(&self) -> Option<Vec<Value>> {
        match &self.0.borrow().kind {
            ObjectKind::Array(elements) => Some(elements.clone()),
            _ => None,
        }
    }

    /// Own property lookup without walking the prototype chain.
    pub fn get_own_property(&self, key: &PropertyKey) -> Option<Property> {
        let data = self.0.borrow();
        if let ObjectKind::Array(elements) = &data.kind {
            if let Some(value) = key.array_index().and_then(|index| elements.get(index)) {
                return Some(Property::Data(value.clone()));
            }
            if *key == PropertyKey::from("length") {
                let length = array_length(elements, &data.properties);
                let length = i32::try_from(length)
                    .map(Value::Smi)
                    .unwrap_or(Value::Double(length as f64));
                return Some(Property::Data(length));
            }
        }
        data.properties.get(key).cloned()
    }

    /// `[[Get]]` with this object as the receiver.
    pub fn get(&self, key: impl Into<PropertyKey>) -> JsResult<Value> {
        self.get_with_receiver(&key.into(), &Value::Object(self.clone()))
    }

    /// `[[Get]]` walking the prototype chain; getters run with `receiver`.
    pub fn get_with_receiver(&self, key: &PropertyKey, receiver: &Value) -> JsResult<Value> {
        let mut current = Some(self.clone());
        while let Some(object) = current {
            match object.get_own_property(key) {
                Some(Property::Data(value)) => return Ok(value),
                Some(Property::Accessor { get: Some(getter), .. }) => {
                    return getter.call(receiver, &[]);
                }
                Some(Property::Accessor { get: None, .. }) => return Ok(Value::Undefined),
                None => current = object.prototype(),
            }
        }
        Ok(Value::Undefined)
    }

    /// Defines or overwrites an own data property.
    ///
    /// Array indices write through to the element storage; indices far past
    /// its end are kept as sparse entries in the property map.
    pub fn set(&self, key: impl Into<PropertyKey>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        let mut guard = self.0.borrow_mut();
        let data = &mut *guard;
        if let ObjectKind::Array(elements) = &mut data.kind {
            if let Some(index) = key.array_index() {
                if index.saturating_sub(elements.len()) <= MAX_DENSE_GAP {
                    if index >= elements.len() {
                        let start = elements.len();
                        elements.resize(index + 1, Value::Undefined);
                        // Sparse entries now covered by the dense range move in.
                        for slot in start..index {
                            if let Some(Property::Data(moved)) =
                                data.properties.remove(&PropertyKey::from(slot.to_string()))
                            {
                                elements[slot] = moved;
                            }
                        }
                    }
                    data.properties.remove(&key);
                    elements[index] = value;
                    return;
                }
            }
        }
        data.properties.insert(key, Property::Data(value));
    }

    /// Defines an own accessor property.
    pub fn define_accessor(
        &self,
        key: impl Into<PropertyKey>,
        get: Option<Value>,
        set: Option<Value>,
    ) {
        self.0
            .borrow_mut()
            .properties
            .insert(key.into(), Property::Accessor { get, set });
    }

    /// `[[Call]]`
    pub fn call(&self, this: &Value, args: &[Value]) -> JsResult<Value> {
        let call = self.0.borrow().call.clone();
        match call {
            Some(call) => call(this, args),
            None => Err(JsError::type_error("object is not a function").into()),
        }
    }

    /// `[[Construct]]`
    pub fn construct(&self, args: &[Value], new_target: &JsObject) -> JsResult<Value> {
        let construct = self.0.borrow().construct.clone();
        match construct {
            Some(construct) => construct(args, new_target),
            None => Err(JsError::type_error(format!("{} is not a constructor", self.name())).into()),
        }
    }
}

/// Array `length`: one past the highest index, dense or sparse.
fn array_length(elements: &[Value], properties: &HashMap<PropertyKey, Property>) -> usize {
    properties
        .keys()
        .filter_map(PropertyKey::array_index)
        .map(|index| index + 1)
        .fold(elements.len(), usize::max)
}

impl PartialEq for JsObject {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for JsObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Properties may point back at this object, so only the header is printed.
        match self.0.try_borrow() {
            Ok(data) => match &data.kind {
                ObjectKind::Array(elements) => write!(f, "Array(len={})", elements.len()),
                ObjectKind::Error(error) => write!(f, "Error({})", error),
                ObjectKind::Ordinary if data.call.is_some() => {
                    write!(f, "Function({})", data.name)
                }
                ObjectKind::Ordinary => write!(f, "Object@{:p}", Rc::as_ptr(&self.0)),
            },
            Err(_) => write!(f, "Object(<borrowed>)"),
        }
    }
}

/// SpeciesConstructor(O, defaultConstructor).
///
/// Reads `O.constructor`, then `C[@@species]`, falling back to the default
/// when either is `undefined` (or species is `null`).
pub fn species_constructor(object: &JsObject, default_constructor: &JsObject) -> JsResult<JsObject> {
    let constructor = object.get("constructor")?;
    let constructor = match constructor {
        Value::Undefined => return Ok(default_constructor.clone()),
        Value::Object(c) => c,
        _ => return Err(JsError::type_error("object.constructor is not an object").into()),
    };
    match constructor.get(WellKnownSymbol::Species)? {
        Value::Undefined | Value::Null => Ok(default_constructor.clone()),
        Value::Object(species) if species.is_constructor() => Ok(species),
        _ => Err(JsError::type_error("object.constructor[Symbol.species] is not a constructor").into()),
    }
}

/// Resolves the prototype for an object created on behalf of `constructor`.
///
/// Uses `constructor.prototype` when it is an object, otherwise `fallback`.
pub fn prototype_from_constructor(constructor: &JsObject, fallback: &JsObject) -> JsResult<JsObject> {
    match constructor.get("prototype")? {
        Value::Object(proto) => Ok(proto),
        _ => Ok(fallback.clone()),
    }
}

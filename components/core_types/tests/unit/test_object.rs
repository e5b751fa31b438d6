//! Unit tests for JsObject handles

use core_types::{
    prototype_from_constructor, species_constructor, JsError, JsObject, Property, PropertyKey,
    Value, WellKnownSymbol,
};
use std::cell::Cell;
use std::rc::Rc;

fn noop_constructor(name: &str) -> JsObject {
    JsObject::constructor(name, |_, _| Ok(Value::Undefined), |_, _| Ok(Value::Undefined))
}

#[cfg(test)]
mod property_tests {
    use super::*;

    #[test]
    fn test_set_and_get_own_property() {
        let object = JsObject::ordinary(None);
        object.set("a", "hello");
        assert_eq!(object.get("a").unwrap(), Value::from("hello"));
        assert!(matches!(
            object.get_own_property(&PropertyKey::from("a")),
            Some(Property::Data(_))
        ));
    }

    #[test]
    fn test_symbol_keys_are_distinct_from_strings() {
        let object = JsObject::ordinary(None);
        object.set(WellKnownSymbol::Iterator, 1);
        assert_eq!(object.get("Symbol(Symbol.iterator)").unwrap(), Value::Undefined);
        assert_eq!(object.get(WellKnownSymbol::Iterator).unwrap(), Value::Smi(1));
    }

    #[test]
    fn test_throwing_getter_propagates() {
        let object = JsObject::ordinary(None);
        let getter = JsObject::function("get then", |_, _| Err(JsError::type_error("nope").into()));
        object.define_accessor("then", Some(Value::Object(getter)), None);
        assert!(object.get("then").is_err());
    }

    #[test]
    fn test_getter_is_called_on_every_access() {
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        let getter = JsObject::function("get", move |_, _| {
            counter.set(counter.get() + 1);
            Ok(Value::Undefined)
        });
        let object = JsObject::ordinary(None);
        object.define_accessor("x", Some(Value::Object(getter)), None);
        object.get("x").unwrap();
        object.get("x").unwrap();
        assert_eq!(count.get(), 2);
    }
}

#[cfg(test)]
mod function_tests {
    use super::*;

    #[test]
    fn test_function_receives_this_and_args() {
        let f = JsObject::function("f", |this, args| {
            assert_eq!(this, &Value::Smi(1));
            Ok(args.get(1).cloned().unwrap_or(Value::Undefined))
        });
        let result = f.call(&Value::Smi(1), &[Value::Null, Value::Smi(2)]).unwrap();
        assert_eq!(result, Value::Smi(2));
    }

    #[test]
    fn test_plain_function_is_not_constructor() {
        let f = JsObject::function("f", |_, _| Ok(Value::Undefined));
        assert!(f.is_callable());
        assert!(!f.is_constructor());
        assert!(Value::Object(f).construct(&[]).is_err());
    }

    #[test]
    fn test_constructor_sees_new_target() {
        let ctor = JsObject::constructor(
            "C",
            |_, _| Ok(Value::Undefined),
            |_, new_target| Ok(Value::from(new_target.name())),
        );
        let result = Value::Object(ctor).construct(&[]).unwrap();
        assert_eq!(result, Value::from("C"));
    }

    #[test]
    fn test_function_may_reenter_its_own_object() {
        let f = JsObject::function("f", |this, _| {
            let object = this.as_object().unwrap();
            object.set("touched", true);
            Ok(Value::Undefined)
        });
        let target = JsObject::ordinary(None);
        f.call(&Value::Object(target.clone()), &[]).unwrap();
        assert_eq!(target.get("touched").unwrap(), Value::Boolean(true));
    }
}

#[cfg(test)]
mod constructor_helper_tests {
    use super::*;

    #[test]
    fn test_species_constructor_uses_species() {
        let default = noop_constructor("Default");
        let derived = noop_constructor("Derived");
        let ctor = JsObject::ordinary(None);
        ctor.set(WellKnownSymbol::Species, derived.clone());
        let object = JsObject::ordinary(None);
        object.set("constructor", ctor);
        assert!(species_constructor(&object, &default).unwrap().ptr_eq(&derived));
    }

    #[test]
    fn test_species_must_be_constructor() {
        let default = noop_constructor("Default");
        let ctor = JsObject::ordinary(None);
        ctor.set(WellKnownSymbol::Species, 5);
        let object = JsObject::ordinary(None);
        object.set("constructor", ctor);
        assert!(species_constructor(&object, &default).is_err());
    }

    #[test]
    fn test_prototype_from_constructor_fallback() {
        let fallback = JsObject::ordinary(None);
        let ctor = noop_constructor("C");
        assert!(prototype_from_constructor(&ctor, &fallback).unwrap().ptr_eq(&fallback));

        let proto = JsObject::ordinary(None);
        ctor.set("prototype", proto.clone());
        assert!(prototype_from_constructor(&ctor, &fallback).unwrap().ptr_eq(&proto));
    }
}

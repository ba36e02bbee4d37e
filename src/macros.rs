/// Builds a [`Value`](crate::Value) from JSON-like syntax.
///
/// `null`, `true`, `false`, arrays and objects with literal keys are handled
/// directly; any other expression goes through [`to_value`](crate::to_value)
/// and becomes `Null` if it cannot be converted.
///
/// ```rust
/// use internet_object::{io, Value};
///
/// let value = io!({ "name": "Ann", "tags": ["a", "b"], "note": null });
/// assert_eq!(value.get("name"), Some(&Value::from("Ann")));
/// assert_eq!(value.get("note"), Some(&Value::Null));
/// ```
#[macro_export]
macro_rules! io {
    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::Array(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Array(vec![$($crate::io!($elem)),*])
    };

    ({}) => {
        $crate::Value::Object($crate::ObjectMap::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut object = $crate::ObjectMap::new();
        $(
            object.insert($key.to_string(), $crate::io!($value));
        )*
        $crate::Value::Object(object)
    }};

    ($s:expr) => {
        $crate::to_value(&$s).unwrap_or($crate::Value::Null)
    };
}

#[cfg(test)]
mod tests {
    use crate::{Number, ObjectMap, Value};

    #[test]
    fn test_io_macro_primitives() {
        assert_eq!(io!(null), Value::Null);
        assert_eq!(io!(true), Value::Bool(true));
        assert_eq!(io!(42), Value::Number(Number::Integer(42)));
        assert_eq!(io!(3.5), Value::Number(Number::Float(3.5)));
        assert_eq!(io!("hello"), Value::String("hello".to_string()));
    }

    #[test]
    fn test_io_macro_nested() {
        assert_eq!(io!({}), Value::Object(ObjectMap::new()));
        let value = io!({ "point": [1, 2], "ok": false });
        assert_eq!(
            value.get("point"),
            Some(&Value::Array(vec![Value::from(1), Value::from(2)]))
        );
        assert_eq!(value.get("ok"), Some(&Value::Bool(false)));
    }
}

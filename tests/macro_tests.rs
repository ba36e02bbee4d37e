use internet_object::{io, stringify_value, Number, ObjectMap, Value};

#[test]
fn test_io_macro_null() {
    assert_eq!(io!(null), Value::Null);
}

#[test]
fn test_io_macro_booleans() {
    assert_eq!(io!(true), Value::Bool(true));
    assert_eq!(io!(false), Value::Bool(false));
}

#[test]
fn test_io_macro_numbers() {
    assert_eq!(io!(42), Value::Number(Number::Integer(42)));
    assert_eq!(io!(3.5), Value::Number(Number::Float(3.5)));
    assert_eq!(io!(-123), Value::Number(Number::Integer(-123)));
}

#[test]
fn test_io_macro_strings() {
    assert_eq!(io!("hello"), Value::String("hello".to_string()));
    let name = String::from("Ann");
    assert_eq!(io!(name), Value::from("Ann"));
}

#[test]
fn test_io_macro_arrays() {
    assert_eq!(io!([]), Value::Array(vec![]));
    assert_eq!(
        io!([1, "two", null]),
        Value::Array(vec![Value::from(1), Value::from("two"), Value::Null])
    );
}

#[test]
fn test_io_macro_objects() {
    assert_eq!(io!({}), Value::Object(ObjectMap::new()));

    let value = io!({
        "name": "Ann",
        "address": { "city": "Oslo" },
        "tags": ["a", "b"],
    });
    assert_eq!(
        value.get("address").and_then(|a| a.get("city")),
        Some(&Value::from("Oslo"))
    );
    let keys: Vec<&str> = value
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, ["name", "address", "tags"]);
}

#[test]
fn test_io_macro_stringifies() {
    let value = io!({ "a": 1, "b": [true, null], "c": "x, y" });
    assert_eq!(
        stringify_value(&value, None).unwrap(),
        r#"a: 1, b: [T, N], c: "x, y""#
    );
}

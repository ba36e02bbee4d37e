//! Schema validation through the public API, one type family at a time.

use internet_object::{parse, Document, ErrorCode, Number, Value};

/// Validates `input` against a single-member schema and returns the member's
/// value, or the first error code.
fn check(member: &str, input: &str) -> Result<Value, ErrorCode> {
    let text = format!("~ $schema: {{v: {}}}\n---\n{}", member, input);
    let doc = parse(&text).map_err(|e| e.code())?;
    first_result(&doc)
}

fn first_result(doc: &Document) -> Result<Value, ErrorCode> {
    if let Some(err) = doc.errors().first() {
        return Err(err.code());
    }
    Ok(doc.to_value().get("v").cloned().unwrap_or(Value::Null))
}

fn decimal(text: &str) -> Value {
    Value::Decimal(text.parse().unwrap())
}

#[test]
fn test_decimal_min_max() {
    assert_eq!(check("{decimal, min:10, max:100}", "50.00"), Ok(decimal("50.00")));
    assert_eq!(
        check("{decimal, min:10, max:100}", "5.5"),
        Err(ErrorCode::OutOfRange)
    );
    assert_eq!(
        check("{decimal, min:10, max:100}", "100.01"),
        Err(ErrorCode::OutOfRange)
    );
}

#[test]
fn test_decimal_scale_only() {
    assert_eq!(
        check("{decimal, scale:2}", "50.0"),
        Err(ErrorCode::InvalidScale)
    );
    assert_eq!(check("{decimal, scale:2}", "50.00"), Ok(decimal("50.00")));
    assert_eq!(check("{decimal, scale:2}", "50.00m"), Ok(decimal("50.00")));
}

#[test]
fn test_decimal_precision_only() {
    assert_eq!(
        check("{decimal, precision:5}", "123.456"),
        Err(ErrorCode::InvalidPrecision)
    );
    assert_eq!(check("{decimal, precision:5}", "123.45"), Ok(decimal("123.45")));
    assert_eq!(check("{decimal, precision:5}", "0.12345"), Ok(decimal("0.12345")));
}

#[test]
fn test_decimal_precision_and_scale() {
    let member = "{decimal, precision:10, scale:2}";
    assert_eq!(check(member, "1234.5"), Err(ErrorCode::InvalidScale));
    assert_eq!(
        check(member, "999999999.99"),
        Err(ErrorCode::InvalidPrecision)
    );
    assert_eq!(check(member, "99999999.99"), Ok(decimal("99999999.99")));
}

#[test]
fn test_decimal_rejects_non_numbers() {
    assert_eq!(check("decimal", "abc"), Err(ErrorCode::TypeMismatch));
    assert_eq!(check("decimal", "T"), Err(ErrorCode::TypeMismatch));
}

#[test]
fn test_choices_with_variables() {
    let header = "~ @r: red\n~ @g: green\n~ @b: blue\n~ $schema: {color: {string, choices: [@r, @g, @b]}}\n---\n";
    let doc = parse(&format!("{}green", header)).unwrap();
    assert!(doc.is_valid());
    assert_eq!(doc.to_value().get("color"), Some(&Value::from("green")));

    let doc = parse(&format!("{}yellow", header)).unwrap();
    assert_eq!(doc.errors()[0].code(), ErrorCode::InvalidChoice);

    // A variable as the value is resolved before the choice check.
    let doc = parse(&format!("{}@b", header)).unwrap();
    assert_eq!(doc.to_value().get("color"), Some(&Value::from("blue")));
}

#[test]
fn test_numeric_choices_compare_by_value() {
    assert!(check("{number, choices: [1, 2.5]}", "2.50").is_ok());
    assert_eq!(
        check("{number, choices: [1, 2.5]}", "3"),
        Err(ErrorCode::InvalidChoice)
    );
}

#[test]
fn test_integer_family_ranges() {
    assert_eq!(check("uint8", "255"), Ok(Value::from(255)));
    assert_eq!(check("uint8", "256"), Err(ErrorCode::OutOfRange));
    assert_eq!(check("int8", "-129"), Err(ErrorCode::OutOfRange));
    assert_eq!(check("uint", "-1"), Err(ErrorCode::OutOfRange));
    assert_eq!(check("int16", "1.5"), Err(ErrorCode::TypeMismatch));
    assert_eq!(check("int32", "2.0"), Ok(Value::from(2)));
}

#[test]
fn test_custom_bounds_only_narrow() {
    // max above the native range does not widen it
    assert_eq!(check("{uint8, max: 1000}", "300"), Err(ErrorCode::OutOfRange));
    assert_eq!(check("{int, min: 5}", "4"), Err(ErrorCode::OutOfRange));
    assert_eq!(check("{int, multipleOf: 5}", "12"), Err(ErrorCode::NotMultipleOf));
    assert_eq!(check("{int, multipleOf: 5}", "15"), Ok(Value::from(15)));
    assert_eq!(
        check("{int, multipleOf: -1}", "-9223372036854775808"),
        Ok(Value::from(i64::MIN))
    );
    assert!(check("{decimal, multipleOf: 0.5}", "2.5").is_ok());
}

#[test]
fn test_number_special_values() {
    assert_eq!(
        check("number", "Inf"),
        Ok(Value::Number(Number::Infinity))
    );
    assert_eq!(check("{number, max: 10}", "10.5"), Err(ErrorCode::OutOfRange));
    assert_eq!(check("number", "ten"), Err(ErrorCode::TypeMismatch));
}

#[test]
fn test_bigint() {
    assert!(check("bigint", "123456789012345678901234567890n").is_ok());
    assert!(check("bigint", "42").is_ok());
    assert_eq!(check("{bigint, min: 0}", "-1n"), Err(ErrorCode::OutOfRange));
}

#[test]
fn test_strings() {
    assert_eq!(check("{string, minLen: 3}", "ab"), Err(ErrorCode::InvalidLength));
    assert_eq!(check("{string, maxLen: 3}", "abcd"), Err(ErrorCode::InvalidLength));
    assert_eq!(check("{string, len: 2}", "ab"), Ok(Value::from("ab")));
    assert_eq!(
        check("{string, pattern: '^[a-z]+$'}", "abc1"),
        Err(ErrorCode::PatternMismatch)
    );
    assert_eq!(check("string", "42"), Err(ErrorCode::TypeMismatch));
    assert_eq!(check("string", "\"42\""), Ok(Value::from("42")));
}

#[test]
fn test_email_and_url() {
    assert!(check("email", "ann@example.com").is_ok());
    assert_eq!(check("email", "ann.example.com"), Err(ErrorCode::PatternMismatch));
    assert!(check("url", "\"https://example.com/x\"").is_ok());
    assert_eq!(check("url", "example"), Err(ErrorCode::PatternMismatch));
}

#[test]
fn test_bool() {
    assert_eq!(check("bool", "T"), Ok(Value::Bool(true)));
    assert_eq!(check("boolean", "false"), Ok(Value::Bool(false)));
    assert_eq!(check("bool", "yes"), Err(ErrorCode::TypeMismatch));
}

#[test]
fn test_dates_and_times() {
    assert!(matches!(check("date", "d'2024-03-01'"), Ok(Value::Date(_))));
    assert!(matches!(check("date", "\"2024-03-01\""), Ok(Value::Date(_))));
    assert!(matches!(check("time", "t'10:30'"), Ok(Value::Time(_))));
    assert!(matches!(
        check("datetime", "dt'2024-03-01T10:30:00Z'"),
        Ok(Value::DateTime(_))
    ));
    assert_eq!(
        check("{date, min: d'2024-01-01'}", "d'2023-12-31'"),
        Err(ErrorCode::OutOfRange)
    );
    assert_eq!(check("date", "\"not a date\""), Err(ErrorCode::TypeMismatch));
}

#[test]
fn test_base64() {
    assert_eq!(check("base64", "b64'aGk='"), Ok(Value::Binary(b"hi".to_vec())));
    assert_eq!(check("{base64, maxLen: 1}", "b64'aGk='"), Err(ErrorCode::InvalidLength));
}

#[test]
fn test_arrays() {
    assert_eq!(
        check("[int]", "[1, 2, 3]"),
        Ok(Value::Array(vec![Value::from(1), Value::from(2), Value::from(3)]))
    );
    assert_eq!(check("[int]", "[1, x]"), Err(ErrorCode::TypeMismatch));
    assert_eq!(check("{array, of: int, maxLen: 2}", "[1, 2, 3]"), Err(ErrorCode::InvalidLength));
    assert_eq!(check("array", "5"), Err(ErrorCode::TypeMismatch));
}

#[test]
fn test_nested_objects() {
    let doc = parse("~ $schema: {name, address: {street, city}}\n---\nAnn, {Main St, Oslo}").unwrap();
    assert!(doc.is_valid());
    let value = doc.to_value();
    assert_eq!(
        value.get("address").and_then(|a| a.get("city")),
        Some(&Value::from("Oslo"))
    );

    let doc = parse("~ $schema: {name, address: {street, city}}\n---\nAnn, {Main St}").unwrap();
    let err = &doc.errors()[0];
    assert_eq!(err.code(), ErrorCode::ValueRequired);
    assert!(err.message().contains("address.city"));
}

#[test]
fn test_schema_references() {
    let text = "~ $address: {street, city}\n~ $schema: {name, address: $address}\n---\nAnn, {Main St, Oslo}";
    let doc = parse(text).unwrap();
    assert!(doc.is_valid());

    let text = "~ $schema: {name, address: $missing}\n---\nAnn, {Main St, Oslo}";
    let doc = parse(text).unwrap();
    assert_eq!(doc.errors()[0].code(), ErrorCode::SchemaNotDefined);
}

#[test]
fn test_recursive_schema() {
    let text = "~ $node: {name, child?: $node}\n~ $schema: $node\n---\na, {b, {c}}";
    let doc = parse(text).unwrap();
    assert!(doc.is_valid(), "{:?}", doc.errors());
    let value = doc.to_value();
    let c = value
        .get("child")
        .and_then(|b| b.get("child"))
        .and_then(|c| c.get("name"));
    assert_eq!(c, Some(&Value::from("c")));
}

#[test]
fn test_null_handling() {
    assert_eq!(check("string", "N"), Err(ErrorCode::NullNotAllowed));
    let doc = parse("~ $schema: {v*: string}\n---\nN").unwrap();
    assert_eq!(first_result(&doc), Ok(Value::Null));
}

#[test]
fn test_optional_and_default() {
    let doc = parse("~ $schema: {a, b?: int}\n---\nx").unwrap();
    assert!(doc.is_valid());
    assert_eq!(doc.to_value().get("b"), None);

    let doc = parse("~ $schema: {a, b?: {int, default: 3}}\n---\nx").unwrap();
    assert_eq!(doc.to_value().get("b"), Some(&Value::from(3)));

    let doc = parse("~ $schema: {a, b: int}\n---\nx").unwrap();
    assert_eq!(doc.errors()[0].code(), ErrorCode::ValueRequired);
}

#[test]
fn test_undefined_variable() {
    let doc = parse("~ $schema: {a}\n---\n@nope").unwrap();
    assert_eq!(doc.errors()[0].code(), ErrorCode::VariableNotDefined);
}

#[test]
fn test_variable_cycle() {
    let doc = parse("~ @a: @b\n~ @b: @a\n~ $schema: {v}\n---\n@a").unwrap();
    assert_eq!(doc.errors()[0].code(), ErrorCode::CircularReference);
}

#[test]
fn test_unsupported_types() {
    let doc = parse("~ $schema: {v: int64}\n---\n1").unwrap();
    assert_eq!(doc.errors()[0].code(), ErrorCode::NotSupported);
}

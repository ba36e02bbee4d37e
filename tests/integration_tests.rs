use internet_object::{
    compile_schema, from_str, from_value, load, load_collection, parse, parse_definitions,
    parse_with_definitions, parse_with_options, stringify, to_value, CollectionItem, ErrorCategory,
    ErrorCode, ParseOptions, SectionData, StringifyOptions, Value,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Address {
    street: String,
    city: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Person {
    name: String,
    age: u32,
    address: Address,
    tags: Vec<String>,
}

const PEOPLE: &str = "\
~ $address: {street, city}
~ $schema: {name, age: {int, min: 0}, address: $address, tags: [string]}
---
~ Ann, 30, {Main St, Oslo}, [admin, dev]
~ Bob, 41, {Elm St, Bergen}, []";

#[test]
fn test_document_to_structs() {
    let people: Vec<Person> = from_str(PEOPLE).unwrap();
    assert_eq!(people.len(), 2);
    assert_eq!(
        people[0],
        Person {
            name: "Ann".into(),
            age: 30,
            address: Address {
                street: "Main St".into(),
                city: "Oslo".into()
            },
            tags: vec!["admin".into(), "dev".into()],
        }
    );
    assert!(people[1].tags.is_empty());
}

#[test]
fn test_collection_errors_are_isolated() {
    let text = "\
~ $schema: {name, age: {int, min: 0}}
---
~ Ann, 30
~ Bob, -1
~ {Cy, 2
~ Dee, 25";
    let doc = parse(text).unwrap();
    let col = doc.sections()[0].collection().unwrap();
    let valid: Vec<bool> = col.items().iter().map(CollectionItem::is_valid).collect();
    assert_eq!(valid, [true, false, false, true]);

    let codes: Vec<ErrorCode> = doc.errors().iter().map(|e| e.code()).collect();
    assert!(codes.contains(&ErrorCode::OutOfRange));
    assert!(codes.contains(&ErrorCode::ExpectingBracket));

    let json = doc.to_json().unwrap();
    assert_eq!(json[1]["__error"]["code"], "outOfRange");
    assert_eq!(json[3]["name"], "Dee");
}

#[test]
fn test_syntax_error_outside_collection_is_fatal() {
    let err = parse("a, {b, 2").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ExpectingBracket);
    assert_eq!(err.category(), ErrorCategory::Syntax);
}

#[test]
fn test_section_error_does_not_discard_later_sections() {
    let text = "\
--- first
{x, y
--- second
hello, world
--- third
~ 1
~ 2";
    let doc = parse(text).unwrap();
    assert_eq!(doc.sections().len(), 3);
    assert_eq!(doc.errors().len(), 1);
    assert_eq!(doc.errors()[0].code(), ErrorCode::ExpectingBracket);
    assert!(matches!(doc.sections()[0].data, SectionData::Error(_)));

    let value = doc.to_value();
    assert_eq!(
        value.get("second").and_then(|s| s.get("1")),
        Some(&Value::from("world"))
    );
    assert_eq!(value.get("third").and_then(Value::as_array).map(Vec::len), Some(2));

    let options = ParseOptions::new().with_strict(true);
    assert!(parse_with_options(text, &options).is_err());
}

#[test]
fn test_non_ascii_open_strings() {
    let doc = parse("~ $schema: {item, price: string, note?}\n---\n~ Kaffe, €12, d'Artagnan\n~ 日本茶, € 5").unwrap();
    assert!(doc.is_valid(), "{:?}", doc.errors());
    let value = doc.to_value();
    let rows = value.as_array().unwrap();
    assert_eq!(rows[0].get("price"), Some(&Value::from("€12")));
    assert_eq!(rows[0].get("note"), Some(&Value::from("d'Artagnan")));
    assert_eq!(rows[1].get("item"), Some(&Value::from("日本茶")));
    assert_eq!(rows[1].get("price"), Some(&Value::from("€ 5")));
}

#[test]
fn test_positional_after_keyed() {
    let err = parse("a: 1, 2").unwrap_err();
    assert_eq!(err.code(), ErrorCode::PositionalMemberAfterKeywordMember);
}

#[test]
fn test_strict_mode() {
    let options = ParseOptions::new().with_strict(true);
    let err = parse_with_options("~ $schema: {a: int}\n---\n~ 1\n~ x\n~ 3", &options).unwrap_err();
    assert_eq!(err.code(), ErrorCode::TypeMismatch);
}

#[test]
fn test_error_ranges_point_at_values() {
    let doc = parse("~ $schema: {name, age: int}\n---\n~ Ann, old").unwrap();
    let range = doc.errors()[0].range().unwrap();
    assert_eq!(range.start.row, 3);
    assert_eq!(range.start.col, 8);
}

#[test]
fn test_named_sections() {
    let text = "\
~ $user: {name, role}
~ $order: {id: int, total: decimal}
--- users: $user
~ Ann, admin
~ Bob, guest
--- orders: $order
~ 1, 9.99
--- $user
Cy, owner";
    let doc = parse(text).unwrap();
    assert!(doc.is_valid(), "{:?}", doc.errors());
    assert_eq!(doc.sections().len(), 3);
    assert_eq!(doc.section("orders").unwrap().schema_name.as_deref(), Some("$order"));
    assert_eq!(doc.section("user").unwrap().name.as_deref(), Some("user"));

    let value = doc.to_value();
    assert_eq!(value.get("users").and_then(Value::as_array).map(Vec::len), Some(2));
    assert!(matches!(
        value.get("orders").and_then(|o| o.as_array()).and_then(|o| o[0].get("total")),
        Some(Value::Decimal(_))
    ));
}

#[test]
fn test_empty_sections() {
    let doc = parse("~ @a: 1\n---\n--- second\n").unwrap();
    assert_eq!(doc.sections().len(), 2);
    assert!(matches!(doc.sections()[0].data, SectionData::Empty));
}

#[test]
fn test_external_definitions() {
    let defs = parse_definitions("~ @admin: administrator\n~ $schema: {name, role}").unwrap();
    let doc = parse_with_definitions("~ Ann, @admin\n~ Bob, guest", &defs, &ParseOptions::default()).unwrap();
    assert!(doc.is_valid());
    let value = doc.to_value();
    assert_eq!(value.as_array().unwrap()[0].get("role"), Some(&Value::from("administrator")));
}

#[test]
fn test_header_definitions_shadow_external_ones() {
    let defs = parse_definitions("~ @x: outer").unwrap();
    let doc = parse_with_definitions("~ @x: inner\n---\nv: @x", &defs, &ParseOptions::default()).unwrap();
    assert_eq!(doc.to_value().get("v"), Some(&Value::from("inner")));
}

#[test]
fn test_load_json() {
    let schema = compile_schema("name, age: {int, min: 0}, email?: email").unwrap();
    let value = load(&json!({"name": "Ann", "age": 30}), &schema).unwrap();
    assert_eq!(value.get("age"), Some(&Value::from(30)));

    let err = load(&json!({"name": "Ann", "age": 30, "extra": 1}), &schema).unwrap_err();
    assert_eq!(err.code(), ErrorCode::UnknownMember);

    let err = load(&json!({"name": "Ann"}), &schema).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValueRequired);

    let err = load(&json!([1, 2]), &schema).unwrap_err();
    assert_eq!(err.code(), ErrorCode::TypeMismatch);
}

#[test]
fn test_load_collection() {
    let schema = compile_schema("name, age: int").unwrap();
    let col = load_collection(
        &json!([{"name": "Ann", "age": 30}, {"name": "Bob", "age": "x"}]),
        &schema,
    )
    .unwrap();
    assert_eq!(col.len(), 2);
    assert_eq!(col.values().count(), 1);
    assert_eq!(col.errors().next().map(|e| e.code()), Some(ErrorCode::TypeMismatch));
}

#[test]
fn test_struct_round_trip_through_text() {
    let person = Person {
        name: "Ann Lee".into(),
        age: 30,
        address: Address {
            street: "1, Main St".into(),
            city: "Oslo".into(),
        },
        tags: vec!["a".into()],
    };
    let value = to_value(&person).unwrap();
    let text = format!(
        "~ $schema: {{name, age: int, address: {{street, city}}, tags: [string]}}\n---\n{}",
        internet_object::stringify_value(
            &value,
            Some(&compile_schema("name, age: int, address: {street, city}, tags: [string]").unwrap())
        )
        .unwrap()
    );
    let back: Person = from_value(parse(&text).unwrap().to_value()).unwrap();
    assert_eq!(back, person);
}

#[test]
fn test_stringify_round_trip() {
    let doc = parse(PEOPLE).unwrap();
    let text = stringify(&doc, &StringifyOptions::default()).unwrap();
    let again = parse(&text).unwrap();
    assert!(again.is_valid(), "{}\n{:?}", text, again.errors());
    assert_eq!(again.to_value(), doc.to_value());
}

#[test]
fn test_stringify_without_header() {
    let doc = parse("a: 1, b: [T, N]").unwrap();
    let text = stringify(&doc, &StringifyOptions::new().with_header(false)).unwrap();
    assert_eq!(text, "a: 1, b: [T, N]");
}

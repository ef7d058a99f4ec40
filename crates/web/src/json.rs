//! Conversion between `serde_json` values and model data.

use knockup_core::{Error, Object, Result, Value};
use serde_json::{Map, Number, Value as Json};

/// Converts a JSON value into model data.
///
/// Integers that fit in `i64` stay integers; every other number becomes a
/// float.
pub fn from_json(json: Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Boolean(b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Int64(i),
            None => Value::Float64(n.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(s) => Value::String(s),
        Json::Array(items) => Value::List(items.into_iter().map(from_json).collect()),
        Json::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, from_json(v))).collect::<Object>()),
    }
}

/// Converts model data into a JSON value. Non-finite floats become null.
pub fn to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Boolean(b) => Json::Bool(*b),
        Value::Int64(i) => Json::Number((*i).into()),
        Value::Float64(f) => Number::from_f64(*f).map_or(Json::Null, Json::Number),
        Value::String(s) => Json::String(s.clone()),
        Value::List(items) => Json::Array(items.iter().map(to_json).collect()),
        Value::Object(object) => Json::Object(
            object
                .iter()
                .map(|(k, v)| (k.to_string(), to_json(v)))
                .collect::<Map<String, Json>>(),
        ),
    }
}

/// Parses a JSON document into model data.
pub fn parse(body: &str) -> Result<Value> {
    serde_json::from_str::<Json>(body)
        .map(from_json)
        .map_err(|e| Error::parse(body, e.to_string()))
}

/// Renders model data as a JSON document.
pub fn stringify(value: &Value) -> String {
    to_json(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use knockup_core::object;

    #[test]
    fn test_parse_nested() {
        let value = parse(r#"{"name":"Ann","age":3,"score":1.5,"tags":["a",null],"ok":true}"#).unwrap();

        assert_eq!(
            value,
            Value::from(object! {
                "name" => "Ann",
                "age" => 3,
                "score" => 1.5,
                "tags" => vec![Value::from("a"), Value::Null],
                "ok" => true,
            })
        );
    }

    #[test]
    fn test_parse_error() {
        let err = parse("{nope").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_stringify() {
        let value = Value::from(object! { "b" => vec![1, 2], "a" => Value::Null });
        assert_eq!(stringify(&value), r#"{"a":null,"b":[1,2]}"#);
        assert_eq!(stringify(&Value::Float64(f64::INFINITY)), "null");
    }

    #[test]
    fn test_large_unsigned_becomes_float() {
        let value = parse("18446744073709551615").unwrap();
        assert!(matches!(value, Value::Float64(_)));
    }
}

//! Shared helpers for codec integration tests
#![allow(dead_code)]

use csv_codec::{Csv, CsvError, Dialect};
use schema_core::{Field, Schema, Value, Variant};

/// Initialize logging for tests
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Encode `value`, compare with `expected`, then decode `expected` back
/// through both the in-memory and the streaming source.
pub fn assert_encode_and_decode(dialect: Dialect, expected: &str, value: &Value, schema: &Schema) {
    init_logging();
    let csv = Csv::new(dialect).expect("dialect should be valid");

    let encoded = csv.encode_to_string(schema, value).expect("encode failed");
    assert_eq!(encoded, expected, "encoded text differs");

    let decoded = csv.decode_from_str(schema, expected).expect("decode failed");
    assert_eq!(&decoded, value, "decoded value differs");

    let streamed = csv
        .decode_from_reader(schema, expected.as_bytes())
        .expect("streaming decode failed");
    assert_eq!(&streamed, value, "streamed value differs");
}

pub fn assert_decode(dialect: Dialect, input: &str, expected: &Value, schema: &Schema) {
    init_logging();
    let csv = Csv::new(dialect).expect("dialect should be valid");
    let decoded = csv.decode_from_str(schema, input).expect("decode failed");
    assert_eq!(&decoded, expected);
}

pub fn decode_error(dialect: Dialect, input: &str, schema: &Schema) -> CsvError {
    init_logging();
    let csv = Csv::new(dialect).expect("dialect should be valid");
    match csv.decode_from_str(schema, input) {
        Ok(value) => panic!("expected decode of {input:?} to fail, got {value:?}"),
        Err(e) => e,
    }
}

// ===== Schemas =====

pub fn int_string() -> Schema {
    Schema::record(
        "IntStringRecord",
        vec![
            Field::new("a", Schema::int()),
            Field::new("b", Schema::string()),
        ],
    )
}

pub fn int_string_value(a: i32, b: &str) -> Value {
    Value::record(vec![Value::Int(a), Value::string(b)])
}

pub fn int_record() -> Schema {
    Schema::record("IntRecord", vec![Field::new("a", Schema::int())])
}

pub fn location() -> Schema {
    Schema::record(
        "Location",
        vec![
            Field::new("lat", Schema::double()),
            Field::new("lon", Schema::double()),
        ],
    )
}

pub fn data() -> Schema {
    Schema::record(
        "Data",
        vec![
            Field::new("location", location()),
            Field::new("speed", Schema::int()),
            Field::new("info", Schema::string()),
        ],
    )
}

pub fn data_with_nullable_fields() -> Schema {
    Schema::record(
        "DataWithNullableField",
        vec![
            Field::new("location", location().nullable()),
            Field::new("speed", Schema::int()),
            Field::new("info", Schema::string().nullable()),
        ],
    )
}

pub fn nested_record() -> Schema {
    Schema::record(
        "NestedRecord",
        vec![
            Field::new("time", Schema::int()),
            Field::new("name", Schema::string()),
            Field::new("data", data()),
        ],
    )
}

pub fn nested_record_with_nullable_field() -> Schema {
    Schema::record(
        "NestedRecordWithNullableField",
        vec![
            Field::new("time", Schema::int()),
            Field::new("name", Schema::string()),
            Field::new("data", data_with_nullable_fields().nullable()),
            Field::new("data2", data()),
            Field::new("alternative", Schema::string()),
        ],
    )
}

pub fn location_value(lat: f64, lon: f64) -> Value {
    Value::record(vec![Value::Double(lat), Value::Double(lon)])
}

pub fn data_value(location: Value, speed: i32, info: Value) -> Value {
    Value::record(vec![location, Value::Int(speed), info])
}

pub fn sealed_record() -> Schema {
    let payload = |value_name: &str, name: &str| {
        Schema::record(
            name,
            vec![
                Field::new(value_name, Schema::int()),
                Field::new("name", Schema::string()),
            ],
        )
    };
    Schema::sealed(
        "SealedRecord",
        vec![
            Variant::singleton("Object"),
            Variant::singleton("OtherObject"),
            Variant::new("Class", payload("value", "Class")),
            Variant::new("OtherClass", payload("value", "OtherClass")),
        ],
    )
}

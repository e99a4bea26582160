//! Integration tests for schema-driven layout of records, unions and collections

mod common;

use common::*;
use csv_codec::{CsvError, Dialect, JsonSubCodec};
use schema_core::{Field, Schema, Value, Variant};
use std::sync::Arc;

fn headers() -> Dialect {
    Dialect {
        has_header_record: true,
        ..Dialect::default()
    }
}

fn deferred() -> Dialect {
    Dialect::default().with_deferred(Arc::new(JsonSubCodec))
}

// ===== Records =====

#[test]
fn test_simple_record() {
    assert_encode_and_decode(Dialect::default(), "42,testing", &int_string_value(42, "testing"), &int_string());
}

#[test]
fn test_record_list() {
    let value = Value::list(vec![
        int_string_value(1, "a"),
        int_string_value(2, "b"),
        int_string_value(3, "c,d"),
    ]);
    assert_encode_and_decode(
        Dialect::default(),
        "1,a\n2,b\n3,\"c,d\"",
        &value,
        &Schema::list(int_string()),
    );
}

#[test]
fn test_primitive_record_list() {
    assert_encode_and_decode(
        Dialect::default(),
        "1\n2\n3",
        &Value::from(vec![1, 2, 3]),
        &Schema::list(Schema::int()),
    );
}

#[test]
fn test_all_primitives() {
    let schema = Schema::record(
        "Primitives",
        vec![
            Field::new("bool", Schema::bool()),
            Field::new("byte", Schema::byte()),
            Field::new("short", Schema::short()),
            Field::new("int", Schema::int()),
            Field::new("long", Schema::long()),
            Field::new("float", Schema::float()),
            Field::new("double", Schema::double()),
            Field::new("char", Schema::char()),
            Field::new("string", Schema::string()),
            Field::new("color", Schema::enumeration("Color", ["RED", "GREEN"])),
        ],
    );
    let value = Value::record(vec![
        Value::Bool(true),
        Value::Byte(-8),
        Value::Short(300),
        Value::Int(-70000),
        Value::Long(1 << 40),
        Value::Float(0.5),
        Value::Double(-1.25e-3),
        Value::Char('x'),
        Value::string("hello world"),
        Value::enumeration("GREEN"),
    ]);
    assert_encode_and_decode(
        Dialect::default(),
        "true,-8,300,-70000,1099511627776,0.5,-0.00125,x,hello world,GREEN",
        &value,
        &schema,
    );
}

#[test]
fn test_nested_record() {
    let value = Value::record(vec![
        Value::Int(0),
        Value::string("Alice"),
        data_value(location_value(0.0, 1.0), 100, Value::string("info")),
    ]);
    assert_encode_and_decode(Dialect::default(), "0,Alice,0.0,1.0,100,info", &value, &nested_record());
}

#[test]
fn test_nested_record_list_with_header() {
    let value = Value::list(vec![
        Value::record(vec![
            Value::Int(0),
            Value::string("Alice"),
            data_value(location_value(0.0, 1.0), 100, Value::string("info")),
        ]),
        Value::record(vec![
            Value::Int(1),
            Value::string("Bob"),
            data_value(location_value(10.0, 20.0), 50, Value::string("info2")),
        ]),
    ]);
    assert_encode_and_decode(
        headers(),
        "time,name,data.location.lat,data.location.lon,data.speed,data.info\n\
         0,Alice,0.0,1.0,100,info\n\
         1,Bob,10.0,20.0,50,info2",
        &value,
        &Schema::list(nested_record()),
    );
}

fn nullable_nested_rows() -> Value {
    let data2 = |lat, lon, speed, info: &str| data_value(location_value(lat, lon), speed, Value::string(info));
    Value::list(vec![
        Value::record(vec![
            Value::Int(0),
            Value::string("Alice"),
            data_value(location_value(0.0, 1.0), 100, Value::string("info")),
            data2(0.0, 1.0, 100, "info"),
            Value::string("Albert"),
        ]),
        Value::record(vec![
            Value::Int(1),
            Value::string("Bob"),
            Value::Null,
            data2(10.0, 20.0, 50, "info2"),
            Value::string("Bill"),
        ]),
        Value::record(vec![
            Value::Int(3),
            Value::string("Charlie"),
            data_value(Value::Null, 120, Value::Null),
            data2(2.0, 3.0, 101, "info3"),
            Value::string("Celina"),
        ]),
    ])
}

#[test]
fn test_nullable_nested_records_with_header() {
    assert_encode_and_decode(
        headers(),
        "time,name,data,data.location,data.location.lat,data.location.lon,data.speed,data.info,\
         data2.location.lat,data2.location.lon,data2.speed,data2.info,alternative\n\
         0,Alice,true,true,0.0,1.0,100,info,0.0,1.0,100,info,Albert\n\
         1,Bob,false,,,,,,10.0,20.0,50,info2,Bill\n\
         3,Charlie,true,false,,,120,,2.0,3.0,101,info3,Celina",
        &nullable_nested_rows(),
        &Schema::list(nested_record_with_nullable_field()),
    );
}

#[test]
fn test_nullable_nested_records_without_header() {
    assert_encode_and_decode(
        Dialect::default(),
        "0,Alice,true,true,0.0,1.0,100,info,0.0,1.0,100,info,Albert\n\
         1,Bob,false,,,,,,10.0,20.0,50,info2,Bill\n\
         3,Charlie,true,false,,,120,,2.0,3.0,101,info3,Celina",
        &nullable_nested_rows(),
        &Schema::list(nested_record_with_nullable_field()),
    );
}

#[test]
fn test_reordered_nested_headers() {
    let value = Value::record(vec![
        Value::Int(7),
        Value::string("Eve"),
        data_value(location_value(1.5, 2.5), 9, Value::string("x")),
    ]);
    assert_decode(
        headers(),
        "name,data.speed,data.location.lon,data.location.lat,data.info,time\n\
         Eve,9,2.5,1.5,x,7",
        &value,
        &nested_record(),
    );
}

#[test]
fn test_absent_nested_record_with_reordered_headers() {
    let schema = nested_record_with_nullable_field();
    let value = Value::record(vec![
        Value::Int(1),
        Value::string("Bob"),
        Value::Null,
        data_value(location_value(10.0, 20.0), 50, Value::string("info2")),
        Value::string("Bill"),
    ]);
    assert_decode(
        headers(),
        "alternative,data,data.info,data.location,data.location.lon,data.location.lat,data.speed,\
         time,name,data2.speed,data2.info,data2.location.lat,data2.location.lon\n\
         Bill,false,,,,,,1,Bob,50,info2,10.0,20.0",
        &value,
        &schema,
    );
}

#[test]
fn test_header_missing_nullable_field_defaults_to_null() {
    let schema = Schema::record(
        "Partial",
        vec![
            Field::new("a", Schema::int()),
            Field::new("b", Schema::string().nullable()),
            Field::new("unit", Schema::singleton("Unit")),
        ],
    );
    assert_decode(
        headers(),
        "a\n5",
        &Value::record(vec![Value::Int(5), Value::Null, Value::Singleton]),
        &schema,
    );
}

#[test]
fn test_unknown_header_column() {
    let err = decode_error(headers(), "a,c\n1,x", &int_string());
    match err {
        CsvError::UnknownHeaderColumn { name, offset } => {
            assert_eq!(name, "c");
            assert_eq!(offset, 2);
        }
        other => panic!("expected unknown header column, got {other:?}"),
    }
}

#[test]
fn test_unknown_header_column_ignored() {
    let dialect = Dialect {
        ignore_unknown_columns: true,
        ..headers()
    };
    assert_decode(
        dialect,
        "c,b,a\nskip,testing,1\nskip,more,2",
        &Value::list(vec![int_string_value(1, "testing"), int_string_value(2, "more")]),
        &Schema::list(int_string()),
    );
}

// ===== Sealed and open unions =====

fn sealed_class(value: i32, name: &str) -> Value {
    Value::variant("Class", Value::record(vec![Value::Int(value), Value::string(name)]))
}

#[test]
fn test_sealed_object() {
    assert_encode_and_decode(
        Dialect::default(),
        "Object,,,,",
        &Value::variant("Object", Value::Singleton),
        &sealed_record(),
    );
}

#[test]
fn test_sealed_class() {
    assert_encode_and_decode(Dialect::default(), "Class,42,testing,,", &sealed_class(42, "testing"), &sealed_record());
}

#[test]
fn test_sealed_other_class() {
    let value = Value::variant(
        "OtherClass",
        Value::record(vec![Value::Int(41), Value::string("test-ing")]),
    );
    assert_encode_and_decode(Dialect::default(), "OtherClass,,,41,test-ing", &value, &sealed_record());
}

#[test]
fn test_sealed_list() {
    let value = Value::list(vec![
        Value::variant("Object", Value::Singleton),
        Value::variant("OtherObject", Value::Singleton),
        sealed_class(42, "testing"),
    ]);
    assert_encode_and_decode(
        Dialect::default(),
        "Object,,,,\nOtherObject,,,,\nClass,42,testing,,",
        &value,
        &Schema::list(sealed_record()),
    );
}

#[test]
fn test_nullable_sealed() {
    let dialect = Dialect {
        null_string: "null".to_string(),
        ..Dialect::default()
    };
    assert_encode_and_decode(
        dialect,
        "null,null,null,null,null",
        &Value::Null,
        &sealed_record().nullable(),
    );
}

#[test]
fn test_sealed_with_header() {
    let schema = Schema::list(sealed_record());
    assert_encode_and_decode(
        headers(),
        "type,Class.value,Class.name,OtherClass.value,OtherClass.name\nClass,42,testing,,",
        &Value::list(vec![sealed_class(42, "testing")]),
        &schema,
    );
}

#[test]
fn test_sealed_field_with_header() {
    let schema = Schema::record(
        "Holder",
        vec![
            Field::new("id", Schema::int()),
            Field::new("shape", sealed_record()),
        ],
    );
    let value = Value::record(vec![Value::Int(1), sealed_class(42, "testing")]);
    assert_encode_and_decode(
        headers(),
        "id,shape,shape.Class.value,shape.Class.name,shape.OtherClass.value,shape.OtherClass.name\n\
         1,Class,42,testing,,",
        &value,
        &schema,
    );
}

#[test]
fn test_unknown_sealed_tag() {
    let err = decode_error(Dialect::default(), "Square,,,,", &sealed_record());
    assert!(matches!(err, CsvError::UnknownVariant { ref value, .. } if value == "Square"));
}

#[test]
fn test_open_union_writes_active_variant_only() {
    let schema = Schema::list(Schema::open(
        "Event",
        vec![
            Variant::new("Click", Schema::record("Click", vec![Field::new("x", Schema::int()), Field::new("y", Schema::int())])),
            Variant::new("Key", Schema::char()),
        ],
    ));
    let value = Value::list(vec![
        Value::variant("Click", Value::record(vec![Value::Int(3), Value::Int(4)])),
        Value::variant("Key", Value::Char('q')),
    ]);
    assert_encode_and_decode(Dialect::default(), "Click,3,4\nKey,q", &value, &schema);
}

// ===== Collections =====

#[test]
fn test_list_of_int_lists() {
    let value = Value::list(vec![
        Value::from(vec![1, 2]),
        Value::from(vec![3, 4]),
        Value::from(vec![5, 6, 7]),
    ]);
    assert_encode_and_decode(
        Dialect::default(),
        "1,2\n3,4\n5,6,7",
        &value,
        &Schema::list(Schema::list(Schema::int())),
    );
}

#[test]
fn test_nullable_list_of_nullable_ints() {
    let dialect = Dialect {
        ignore_empty_lines: false,
        ..Dialect::default()
    };
    let value = Value::list(vec![
        Value::from(vec![1, 2]),
        Value::Null,
        Value::from(vec![Some(5), None, Some(7)]),
    ]);
    assert_encode_and_decode(
        dialect,
        "1,2\n\n5,,7",
        &value,
        &Schema::list(Schema::list(Schema::int().nullable()).nullable()),
    );
}

fn int_list_map(entries: &[(&[i32], &[i32])]) -> Value {
    Value::Map(
        entries
            .iter()
            .map(|(k, v)| (Value::from(k.to_vec()), Value::from(v.to_vec())))
            .collect(),
    )
}

fn int_list_map_schema() -> Schema {
    Schema::map(Schema::list(Schema::int()), Schema::list(Schema::int()))
}

#[test]
fn test_map_of_int_lists() {
    let value = int_list_map(&[(&[1, 2], &[3, 4]), (&[5, 6], &[7, 8]), (&[9], &[10, 11, 12, 13])]);
    assert_encode_and_decode(
        Dialect::default(),
        "3,2,1,2,2,3,4,2,5,6,2,7,8,1,9,4,10,11,12,13",
        &value,
        &int_list_map_schema(),
    );
}

#[test]
fn test_multiple_maps_of_int_lists() {
    let value = Value::list(vec![
        int_list_map(&[(&[1, 2], &[3, 4]), (&[5, 6], &[7, 8]), (&[9], &[10, 11, 12, 13])]),
        int_list_map(&[(&[1], &[2, 3]), (&[4, 5, 6], &[7, 8, 9, 10])]),
    ]);
    assert_encode_and_decode(
        Dialect::default(),
        "2,1,2,2,3,4,2,5,6,2,7,8,1,9,4,10,11,12,13\n1,1,2,2,3,3,4,5,6,4,7,8,9,10",
        &value,
        &Schema::list(int_list_map_schema()),
    );
}

#[test]
fn test_records_with_map_of_int_lists() {
    let schema = Schema::list(Schema::record("Record", vec![Field::new("map", int_list_map_schema())]));
    let value = Value::list(vec![
        Value::record(vec![int_list_map(&[
            (&[1, 2], &[3, 4]),
            (&[5, 6], &[7, 8]),
            (&[9], &[10, 11, 12, 13]),
        ])]),
        Value::record(vec![int_list_map(&[(&[1], &[2, 3]), (&[4, 5, 6], &[7, 8, 9, 10])])]),
    ]);
    assert_encode_and_decode(
        Dialect::default(),
        "3,2,1,2,2,3,4,2,5,6,2,7,8,1,9,4,10,11,12,13\n2,1,1,2,2,3,3,4,5,6,4,7,8,9,10",
        &value,
        &schema,
    );
}

#[test]
fn test_empty_row_list_needs_empty_lines() {
    let dialect = Dialect {
        ignore_empty_lines: false,
        ..Dialect::default()
    };
    let value = Value::list(vec![Value::from(vec![1]), Value::list(vec![]), Value::from(vec![2])]);
    assert_encode_and_decode(dialect, "1\n\n2", &value, &Schema::list(Schema::list(Schema::int())));
}

#[test]
fn test_bad_collection_length() {
    let schema = Schema::record("R", vec![Field::new("list", Schema::list(Schema::int()))]);
    let err = decode_error(Dialect::default(), "x,1", &schema);
    match err {
        CsvError::MalformedPrimitive { value, path, .. } => {
            assert_eq!(value, "x");
            assert_eq!(path, "list");
        }
        other => panic!("expected malformed length, got {other:?}"),
    }
}

// ===== Deferred sub-codec =====

fn simple_with_list() -> Schema {
    Schema::record(
        "Record2",
        vec![
            Field::new("simple", Schema::int()),
            Field::new("list", Schema::list(Schema::int())),
        ],
    )
}

fn deferred_rows() -> Value {
    Value::list(
        (0..5)
            .map(|n| Value::record(vec![Value::Int(n), Value::from((1..=n).collect::<Vec<_>>())]))
            .collect(),
    )
}

#[test]
fn test_deferred_lists() {
    assert_encode_and_decode(
        deferred(),
        "0,[]\n1,[1]\n2,\"[1,2]\"\n3,\"[1,2,3]\"\n4,\"[1,2,3,4]\"",
        &deferred_rows(),
        &Schema::list(simple_with_list()),
    );
}

#[test]
fn test_deferred_lists_with_header() {
    let dialect = Dialect {
        has_header_record: true,
        ..deferred()
    };
    assert_encode_and_decode(
        dialect,
        "simple,list\n0,[]\n1,[1]\n2,\"[1,2]\"\n3,\"[1,2,3]\"\n4,\"[1,2,3,4]\"",
        &deferred_rows(),
        &Schema::list(simple_with_list()),
    );
}

#[test]
fn test_deferred_nullable_map_and_record_list_element() {
    let schema = Schema::list(Schema::map(Schema::string(), Schema::int()).nullable());
    let value = Value::list(vec![
        Value::Map(vec![(Value::string("a"), Value::Int(1))]),
        Value::Null,
    ]);
    let dialect = Dialect {
        ignore_empty_lines: false,
        null_string: "null".to_string(),
        ..deferred()
    };
    assert_encode_and_decode(dialect, "\"{\"\"a\"\":1}\"\nnull", &value, &schema);
}

#[test]
fn test_deferred_decode_failure() {
    let err = decode_error(deferred(), "1,[1", &simple_with_list());
    match err {
        CsvError::Deferred { path, .. } => assert_eq!(path, "list"),
        other => panic!("expected deferred error, got {other:?}"),
    }
}

#[test]
fn test_variable_width_header_unsupported() {
    let csv = csv_codec::Csv::new(headers()).unwrap();
    let schema = Schema::list(simple_with_list());
    let value = Value::list(vec![Value::record(vec![Value::Int(1), Value::from(vec![1])])]);
    assert!(matches!(
        csv.encode_to_string(&schema, &value),
        Err(CsvError::UnsupportedSchemaKind { .. })
    ));
    assert!(matches!(
        csv.decode_from_str(&schema, "simple,list\n1,1,1"),
        Err(CsvError::UnsupportedSchemaKind { .. })
    ));
}

// ===== Nullable roots and elements =====

#[test]
fn test_nullable_record_root() {
    for null_string in ["", "null", "N/A"] {
        let dialect = Dialect {
            null_string: null_string.to_string(),
            ..Dialect::default()
        };
        assert_encode_and_decode(dialect, null_string, &Value::Null, &int_record().nullable());
    }
}

#[test]
fn test_nullable_records_with_empty_lines_kept() {
    let dialect = Dialect {
        ignore_empty_lines: false,
        ..Dialect::default()
    };
    let record = |n| Value::record(vec![Value::Int(n)]);
    assert_decode(
        dialect,
        "-150\n\n150\n\n",
        &Value::list(vec![record(-150), Value::Null, record(150), Value::Null]),
        &Schema::list(int_record().nullable()),
    );
}

fn leading_nullable() -> Schema {
    Schema::record(
        "LeadingNullable",
        vec![
            Field::new("a", Schema::int().nullable()),
            Field::new("b", Schema::int()),
        ],
    )
}

#[test]
fn test_leading_null_field_keeps_element_present() {
    let present = Value::record(vec![Value::Null, Value::Int(5)]);
    let records = Schema::list(leading_nullable().nullable());

    assert_encode_and_decode(
        Dialect::default(),
        ",5",
        &Value::list(vec![present.clone()]),
        &records,
    );
    assert_encode_and_decode(Dialect::default(), ",5", &present, &leading_nullable().nullable());

    let dialect = Dialect {
        null_string: "null".to_string(),
        ..Dialect::default()
    };
    assert_encode_and_decode(
        dialect.clone(),
        "null,5
null",
        &Value::list(vec![present.clone(), Value::Null]),
        &records,
    );

    let trailing = Dialect {
        has_trailing_delimiter: true,
        ..dialect.clone()
    };
    assert_encode_and_decode(
        trailing,
        "null,5,
null,",
        &Value::list(vec![present, Value::Null]),
        &records,
    );

    let lists = Schema::list(Schema::list(Schema::int().nullable()).nullable());
    let leading_null = Value::from(vec![None, Some(1)]);
    assert_encode_and_decode(
        Dialect::default(),
        ",1",
        &Value::list(vec![leading_null.clone()]),
        &lists,
    );
    assert_encode_and_decode(
        dialect,
        "null,1
null",
        &Value::list(vec![leading_null, Value::Null]),
        &lists,
    );
}

#[test]
fn test_value_mismatch_on_encode() {
    let csv = csv_codec::Csv::default();
    let err = csv
        .encode_to_string(&Schema::list(int_string()), &Value::list(vec![Value::Int(1)]))
        .unwrap_err();
    match err {
        CsvError::ValueMismatch { path, expected, found } => {
            assert_eq!(path, "[0]");
            assert_eq!(expected, "record IntStringRecord");
            assert_eq!(found, "int");
        }
        other => panic!("expected value mismatch, got {other:?}"),
    }
}

use ssdf::{parse, parse_json, FunctionRegistry, Value, ValueType, WriteOptions};

#[test]
fn scenario_object_with_array() {
    let doc = parse("{a: 1, b: [true, false, null]}").unwrap();
    let a = doc.get_object("a").unwrap();
    assert_eq!(doc.value_type(a), Some(ValueType::Integer));
    assert_eq!(doc.get_i64("a").unwrap(), 1);
    let b = doc.get_collection("b").unwrap();
    assert!(doc.is_array(b));
    assert_eq!(doc.len(b), 3);
    assert_eq!(doc.get_bool("b.0").unwrap(), true);
    assert_eq!(doc.get_bool("b.1").unwrap(), false);
    assert_eq!(
        doc.value_type(doc.get_node("b.2").unwrap()),
        Some(ValueType::Null)
    );
    assert_eq!(doc.to_json(true), r#"{"a":1,"b":[true,false,null]}"#);
}

#[test]
fn scenario_annotation_on_member() {
    let doc = parse(r#"@Meta(x=1) name: "value""#).unwrap();
    let name = doc.get_node("name").unwrap();
    let anns = doc.annotations(name);
    assert_eq!(anns.len(), 1);
    assert_eq!(doc.name(anns[0]), Some("Meta"));
    assert_eq!(doc.get_i64("name:Meta.x").unwrap(), 1);
    assert_eq!(doc.get_str("name").unwrap(), "value");
}

#[test]
fn scenario_function_call_invoke() {
    let mut reg = FunctionRegistry::new();
    reg.register("foo", |args| {
        let a = args[0].as_i64().unwrap_or_default();
        let b = args[1].as_i64().unwrap_or_default();
        Ok(vec![Value::Integer(a + b)])
    });
    let doc = parse("x: foo(1,2)").unwrap();
    let x = doc.get_node("x").unwrap();
    assert!(doc.is_call(x));
    assert_eq!(doc.function_name(x), Some("foo"));
    assert_eq!(doc.call_args(x).len(), 2);

    let opts = WriteOptions::compact().invoke();
    let rendered = doc.node_text(x, &opts, Some(&reg)).unwrap();
    assert_eq!(rendered, "3");
}

#[test]
fn string_escaping_round_trip() {
    let doc = parse(r#"{a: "he said \"hi\""}"#).unwrap();
    assert_eq!(doc.get_str("a").unwrap(), r#"he said "hi""#);
    assert_eq!(doc.to_compact(), r#"{a:"he said \"hi\""}"#);
}

#[test]
fn single_quoted_strings() {
    let doc = parse("{a: 'plain', b: 'it\\'s'}").unwrap();
    assert_eq!(doc.get_str("a").unwrap(), "plain");
    assert_eq!(doc.get_str("b").unwrap(), "it's");
}

#[test]
fn json_output_matches_serde_json_reading() {
    let doc = parse(
        r#"{
            name: "demo",
            version: 3,
            ratio: 0.5,
            flags: [true, false],
            nested: {empty: null}
        }"#,
    )
    .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&doc.to_json(true)).unwrap();
    let expected = serde_json::json!({
        "name": "demo",
        "version": 3,
        "ratio": 0.5,
        "flags": [true, false],
        "nested": {"empty": null}
    });
    assert_eq!(parsed, expected);
}

#[test]
fn json_one_way_fidelity() {
    let doc = parse(r#"{a: 1, b: [true, "x"], c: {d: 2.5}}"#).unwrap();
    let back = parse_json(&doc.to_json(false)).unwrap();
    assert_eq!(back, doc);
    let back = parse_json(&doc.to_json(true)).unwrap();
    assert_eq!(back, doc);
}

#[test]
fn json_round_trip_is_lossy_for_extensions() {
    let doc = parse("{@Meta a: 1, // note\nb: 2, c: foo(1)}").unwrap();
    let back = parse_json(&doc.to_json(true)).unwrap();
    // Annotations, comments and calls cannot survive the projection.
    let a = back.get_node("a").unwrap();
    assert!(back.annotations(a).is_empty());
    let b = back.get_node("b").unwrap();
    assert!(back.comments(b).is_empty());
    assert!(!back.has("c"));
}

#[test]
fn deeply_nested_structures() {
    let mut text = String::new();
    for _ in 0..64 {
        text.push_str("{inner:");
    }
    text.push('1');
    for _ in 0..64 {
        text.push('}');
    }
    let doc = parse(&text).unwrap();
    let path = vec!["inner"; 64].join(".");
    assert_eq!(doc.get_i64(&path).unwrap(), 1);
}

#[test]
fn full_name_is_dot_qualified() {
    let doc = parse("{a: {b: {c: 1}}}").unwrap();
    let c = doc.get_node("a.b.c").unwrap();
    assert_eq!(doc.full_name(c), "a.b.c");
    assert_eq!(doc.full_name(doc.root()), "");
}

#[test]
fn value_conversion_for_binding_layers() {
    let doc = parse(r#"{n: null, t: true, i: -4, d: 1.5, s: "txt", xs: [1, 2]}"#).unwrap();
    let value = doc.to_value(doc.root());
    let object = value.as_object().unwrap();
    assert_eq!(object["n"], Value::Null);
    assert_eq!(object["t"], Value::Bool(true));
    assert_eq!(object["i"], Value::Integer(-4));
    assert_eq!(object["d"], Value::Float(1.5));
    assert_eq!(object["s"], Value::String("txt".into()));
    assert_eq!(
        object["xs"],
        Value::Array(vec![Value::Integer(1), Value::Integer(2)])
    );
}

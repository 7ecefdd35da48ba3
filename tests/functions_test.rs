use std::cell::Cell;

use ssdf::{
    parse, parse_with, FunctionError, FunctionRegistry, FunctionResolver, Value, WriteOptions,
};

fn math_registry() -> FunctionRegistry {
    let mut reg = FunctionRegistry::new();
    reg.register("add", |args| {
        Ok(vec![Value::Integer(
            args.iter().filter_map(|a| a.as_i64()).sum(),
        )])
    });
    reg.register("math.mul", |args| {
        Ok(vec![Value::Integer(
            args.iter().filter_map(|a| a.as_i64()).product(),
        )])
    });
    reg
}

#[test]
fn invoke_replaces_call_with_result() {
    let reg = math_registry();
    let doc = parse("{x: add(1, 2), y: 4}").unwrap();
    let out = doc
        .serialize_with(&WriteOptions::compact().invoke(), &reg)
        .unwrap();
    assert_eq!(out, "{x:3,y:4}");
}

#[test]
fn without_invoke_call_syntax_is_kept() {
    let doc = parse("{x: add(1, 2)}").unwrap();
    assert_eq!(doc.to_compact(), "{x:add(1,2)}");
}

#[test]
fn nested_calls_resolve_inner_first() {
    let reg = math_registry();
    let doc = parse("{x: add(add(1, 2), 3)}").unwrap();
    let out = doc
        .serialize_with(&WriteOptions::compact().invoke(), &reg)
        .unwrap();
    assert_eq!(out, "{x:6}");
}

#[test]
fn namespace_annotation_qualifies_the_name() {
    let reg = math_registry();
    let doc = parse(r#"{@Namespace("math") x: mul(2, 3)}"#).unwrap();
    let x = doc.get_node("x").unwrap();
    assert_eq!(doc.qualified_function_name(x).as_deref(), Some("math.mul"));
    assert_eq!(doc.invoke_call(x, &reg).unwrap(), vec![Value::Integer(6)]);
}

#[test]
fn dotted_call_name_wins_over_namespace() {
    let reg = math_registry();
    let doc = parse("{x: math.mul(2, 5)}").unwrap();
    let x = doc.get_node("x").unwrap();
    assert_eq!(doc.invoke_call(x, &reg).unwrap(), vec![Value::Integer(10)]);
}

#[test]
fn unresolved_function_surfaces_an_error() {
    let reg = math_registry();
    let doc = parse("{x: nope(1)}").unwrap();
    let err = doc
        .serialize_with(&WriteOptions::compact().invoke(), &reg)
        .unwrap_err();
    assert!(matches!(err, FunctionError::Unresolved { .. }));
    // The document itself is untouched by the failed render.
    assert_eq!(doc.to_compact(), "{x:nope(1)}");
}

#[test]
fn invoke_without_resolver_fails() {
    let doc = parse("{x: add(1, 2)}").unwrap();
    let err = doc.serialize(&WriteOptions::compact().invoke()).unwrap_err();
    assert!(matches!(err, FunctionError::NoResolver { .. }));
}

struct Counting {
    calls: Cell<i64>,
}

impl FunctionResolver for Counting {
    fn resolve(&self, _name: &str, _args: &[Value]) -> Result<Vec<Value>, FunctionError> {
        self.calls.set(self.calls.get() + 1);
        Ok(vec![Value::Integer(self.calls.get())])
    }
}

#[test]
fn calls_are_never_memoized() {
    let resolver = Counting { calls: Cell::new(0) };
    let doc = parse("{x: tick()}").unwrap();
    let opts = WriteOptions::compact().invoke();
    assert_eq!(doc.serialize_with(&opts, &resolver).unwrap(), "{x:1}");
    assert_eq!(doc.serialize_with(&opts, &resolver).unwrap(), "{x:2}");
}

#[test]
fn multiple_results_render_in_order() {
    let mut reg = FunctionRegistry::new();
    reg.register("pair", |_| {
        Ok(vec![Value::Integer(1), Value::Integer(2)])
    });
    let doc = parse("{x: pair()}").unwrap();
    let out = doc
        .serialize_with(&WriteOptions::compact().invoke(), &reg)
        .unwrap();
    assert_eq!(out, "{x:12}");
}

#[test]
fn collection_results_serialize_recursively() {
    let mut reg = FunctionRegistry::new();
    reg.register("range", |args| {
        let n = args[0].as_i64().unwrap_or_default();
        Ok(vec![Value::Array((0..n).map(Value::Integer).collect())])
    });
    let doc = parse("{x: range(3)}").unwrap();
    let out = doc
        .serialize_with(&WriteOptions::compact().invoke(), &reg)
        .unwrap();
    assert_eq!(out, "{x:[0,1,2]}");
}

#[test]
fn string_and_collection_arguments_convert() {
    let mut reg = FunctionRegistry::new();
    reg.register("describe", |args| {
        let text = match &args[0] {
            Value::String(s) => s.clone(),
            other => other.to_literal(),
        };
        let count = args[1].as_array().map(Vec::len).unwrap_or_default();
        Ok(vec![Value::String(format!("{}:{}", text, count))])
    });
    let doc = parse(r#"{x: describe("items", [1, 2, 3])}"#).unwrap();
    let out = doc
        .serialize_with(&WriteOptions::compact().invoke(), &reg)
        .unwrap();
    assert_eq!(out, r#"{x:"items:3"}"#);
}

#[test]
fn content_simple_capture_and_resolution() {
    let mut reg = FunctionRegistry::new();
    reg.register_content_simple("upper", |args| {
        Ok(vec![Value::String(
            args[0].as_str().unwrap_or_default().to_uppercase(),
        )])
    });
    let doc = parse_with("{x: upper(a(b)c)}", Some(&reg)).unwrap();
    let x = doc.get_node("x").unwrap();
    assert_eq!(doc.call_args(x).len(), 1);
    assert_eq!(doc.raw_value(doc.call_args(x)[0]), Some("a(b)c"));
    let out = doc
        .serialize_with(&WriteOptions::compact().invoke(), &reg)
        .unwrap();
    assert_eq!(out, r#"{x:"A(B)C"}"#);
}

#[test]
fn variables_and_functions_compose() {
    let reg = math_registry();
    let doc = parse(r#"{total: add(2, 3), msg: "sum is "+$this.total}"#).unwrap();
    let out = doc
        .serialize_with(&WriteOptions::compact().invoke(), &reg)
        .unwrap();
    assert_eq!(out, r#"{total:5,msg:"sum is 5"}"#);
}

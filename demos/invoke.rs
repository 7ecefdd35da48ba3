//! Resolve function calls and variables while rendering.
//!
//! ```sh
//! cargo run --example invoke
//! ```

use ssdf::{FunctionRegistry, Value, WriteOptions};

fn main() {
    let mut registry = FunctionRegistry::new();
    registry.register("add", |args| {
        Ok(vec![Value::Integer(
            args.iter().filter_map(|a| a.as_i64()).sum(),
        )])
    });
    registry.register_content_simple("shout", |args| {
        Ok(vec![Value::String(
            args[0].as_str().unwrap_or_default().to_uppercase(),
        )])
    });

    let doc = ssdf::parse_with(
        r#"
        {
            user: "sun",
            total: add(40, 2),
            banner: shout(hey!),
            msg: "answer for " + $this.user + ": " + $this.total,
        }
        "#,
        Some(&registry),
    )
    .unwrap();

    println!("--- as written ---");
    println!("{}", doc.to_compact());
    println!("--- invoked ---");
    let out = doc
        .serialize_with(&WriteOptions::compact().invoke(), &registry)
        .unwrap();
    println!("{}", out);
}

//! Parse a document and query it through paths.
//!
//! ```sh
//! cargo run --example query
//! ```

fn main() {
    let doc = ssdf::parse(
        r#"
        @Version(3)
        {
            // deployment target
            server: {host: "localhost", port: 8080},
            features: ["alpha", "beta"],
            @Limits(max = 10) workers: 4,
        }
        "#,
    )
    .unwrap();

    println!("host     = {}", doc.get_str("server.host").unwrap());
    println!("port     = {}", doc.get_i64("server.port").unwrap());
    println!("feature  = {}", doc.get_str("features.1").unwrap());
    println!("timeout  = {}", doc.get_i64("server.timeout|*30").unwrap());
    println!("limit    = {}", doc.get_i64("workers:Limits.max").unwrap());
    println!("has tls? = {}", doc.has("server.tls"));

    println!("--- compact ---");
    println!("{}", doc.to_compact());
    println!("--- json ---");
    println!("{}", doc.to_json(false));
}

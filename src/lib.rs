//! SSDF: a self-describing superset of JSON.
//!
//! Documents hold objects, arrays and typed scalars like JSON, plus
//! `@annotations` attached to nodes, comments, `$`-variable strings and
//! deferred function calls resolved by the host:
//!
//! ```
//! let doc = ssdf::parse(r#"
//! @Version(2)
//! {
//!     // connection settings
//!     server: {host: "localhost", port: 8080},
//!     greeting: "hello " + $this.server.host,
//! }
//! "#).unwrap();
//!
//! assert_eq!(doc.get_i64("server.port").unwrap(), 8080);
//! assert_eq!(doc.get_str("server.host|*\"fallback\"").unwrap(), "localhost");
//!
//! let json = doc.serialize(&ssdf::WriteOptions::json(true).invoke()).unwrap();
//! assert_eq!(json, r#"{"server":{"host":"localhost","port":8080},"greeting":"hello localhost"}"#);
//! ```
//!
//! Parsing and serialization are exact inverses for the pretty and compact
//! dialects; JSON output is a lossy one-way projection. Function calls are
//! resolved through a [`FunctionResolver`] the host injects, never by the
//! core itself.

pub mod dom;
pub mod error;
pub mod formatter;
pub mod function;
pub mod parser;
mod util;
pub mod value;

#[doc(inline)]
pub use crate::dom::{Comment, Document, NodeData, NodeId, PathTarget, WriteOptions};
#[doc(inline)]
pub use crate::error::{Error, FunctionError, ParseError, PathError};
#[doc(inline)]
pub use crate::function::{FunctionRegistry, FunctionResolver};
#[doc(inline)]
pub use crate::parser::{parse, parse_json, parse_with};
#[doc(inline)]
pub use crate::value::{Value, ValueType};

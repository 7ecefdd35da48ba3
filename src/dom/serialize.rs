//! Rendering the document model back to text.
//!
//! The serializer is the parser's inverse: pretty output re-parses to an
//! equal document, and so does compact output. JSON output is a one-way
//! projection that drops everything JSON cannot express.

use crate::error::FunctionError;
use crate::function::FunctionResolver;
use crate::value::Value;
use crate::value::ValueType;

use super::interp;
use super::node::{Comment, Document, NodeData, NodeId};

/// Independent switches controlling one rendering pass.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Omit all insignificant whitespace instead of pretty indentation.
    pub compress: bool,
    /// Emit the JSON subset: quoted member names, escaped quotes, no
    /// annotations/comments, unknown and function-typed members omitted
    /// unless `invoke` is set.
    pub json: bool,
    /// Eagerly resolve function calls and `$`-variables into their values.
    pub invoke: bool,
    /// Include annotations (ignored in JSON mode).
    pub annotations: bool,
    /// Include comments (ignored in JSON mode).
    pub comments: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            compress: false,
            json: false,
            invoke: false,
            annotations: true,
            comments: true,
        }
    }
}

impl WriteOptions {
    pub fn pretty() -> Self {
        Self::default()
    }

    pub fn compact() -> Self {
        WriteOptions {
            compress: true,
            ..Self::default()
        }
    }

    pub fn json(compress: bool) -> Self {
        WriteOptions {
            compress,
            json: true,
            annotations: false,
            comments: false,
            ..Self::default()
        }
    }

    pub fn invoke(mut self) -> Self {
        self.invoke = true;
        self
    }
}

impl Document {
    /// Pretty text with annotations and comments.
    pub fn to_text(&self) -> String {
        self.render_infallible(&WriteOptions::pretty())
    }

    /// Compact text with annotations and comments.
    pub fn to_compact(&self) -> String {
        self.render_infallible(&WriteOptions::compact())
    }

    /// JSON projection of the document.
    pub fn to_json(&self, compress: bool) -> String {
        self.render_infallible(&WriteOptions::json(compress))
    }

    fn render_infallible(&self, opts: &WriteOptions) -> String {
        match self.serialize(opts) {
            Ok(text) => text,
            // Without `invoke` no resolver is ever consulted.
            Err(_) => unreachable!("serialization without invoke cannot fail"),
        }
    }

    /// Render with explicit options; `invoke` fails without a resolver as
    /// soon as a function call or variable must produce a value.
    pub fn serialize(&self, opts: &WriteOptions) -> Result<String, FunctionError> {
        Serializer::new(self, opts, None).document()
    }

    pub fn serialize_with(
        &self,
        opts: &WriteOptions,
        resolver: &dyn FunctionResolver,
    ) -> Result<String, FunctionError> {
        Serializer::new(self, opts, Some(resolver)).document()
    }

    /// Render a single node's value (no name, no attached annotations).
    pub fn node_text(
        &self,
        id: NodeId,
        opts: &WriteOptions,
        resolver: Option<&dyn FunctionResolver>,
    ) -> Result<String, FunctionError> {
        let mut s = Serializer::new(self, opts, resolver);
        s.write_node(id, 1)?;
        Ok(s.out)
    }

    /// JSON projection of a single node's value.
    pub fn node_json(&self, id: NodeId, compress: bool) -> String {
        match self.node_text(id, &WriteOptions::json(compress), None) {
            Ok(text) => text,
            Err(_) => unreachable!("serialization without invoke cannot fail"),
        }
    }

    /// Resolve a function-call node through `resolver` right now.
    pub fn invoke_call(
        &self,
        id: NodeId,
        resolver: &dyn FunctionResolver,
    ) -> Result<Vec<Value>, FunctionError> {
        let opts = WriteOptions::compact().invoke();
        let s = Serializer::new(self, &opts, Some(resolver));
        s.call_results(id)
    }
}

pub(crate) struct Serializer<'a> {
    doc: &'a Document,
    opts: &'a WriteOptions,
    resolver: Option<&'a dyn FunctionResolver>,
    out: String,
}

impl<'a> Serializer<'a> {
    pub(crate) fn new(
        doc: &'a Document,
        opts: &'a WriteOptions,
        resolver: Option<&'a dyn FunctionResolver>,
    ) -> Self {
        Serializer {
            doc,
            opts,
            resolver,
            out: String::new(),
        }
    }

    fn document(mut self) -> Result<String, FunctionError> {
        let root = self.doc.root();
        if !self.opts.json {
            if self.opts.comments {
                for comment in self.doc.comments(root) {
                    self.write_comment(comment);
                    if !self.opts.compress {
                        self.out.push('\n');
                    }
                }
            }
            if self.opts.annotations {
                for ann in self.doc.annotations(root).to_vec() {
                    self.write_annotation(ann, 0)?;
                    if !self.opts.compress {
                        self.out.push('\n');
                    }
                }
            }
        }
        self.write_node(root, 1)?;
        Ok(self.out)
    }

    fn tabs(&mut self, level: usize) {
        if !self.opts.compress {
            for _ in 0..level {
                self.out.push('\t');
            }
        }
    }

    fn write_node(&mut self, id: NodeId, depth: usize) -> Result<(), FunctionError> {
        match self.doc.data(id) {
            NodeData::Collection { .. } | NodeData::Annotation { .. } => {
                self.write_collection(id, depth)
            }
            NodeData::Object { .. } => self.write_scalar(id),
            NodeData::Call { .. } => self.write_call(id, depth),
        }
    }

    /// Whether JSON output has no rendering for this member at all.
    fn json_omits(&self, id: NodeId) -> bool {
        if !self.opts.json || self.opts.invoke {
            return false;
        }
        self.doc.is_call(id) || self.doc.value_type(id) == Some(ValueType::Unknown)
    }

    fn write_collection(&mut self, id: NodeId, depth: usize) -> Result<(), FunctionError> {
        let is_array = self.doc.is_array(id);
        self.out.push(if is_array { '[' } else { '{' });
        let members: Vec<(String, NodeId)> = self
            .doc
            .members(id)
            .filter(|(_, v)| !self.json_omits(*v))
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        if members.is_empty() {
            self.out.push(if is_array { ']' } else { '}' });
            return Ok(());
        }
        if !self.opts.compress {
            self.out.push('\n');
        }
        let mut first = true;
        for (name, member) in members {
            if first {
                first = false;
            } else {
                self.out.push(',');
                if !self.opts.compress {
                    self.out.push('\n');
                }
            }
            if !self.opts.json {
                if self.opts.comments {
                    for comment in self.doc.comments(member).to_vec() {
                        self.tabs(depth);
                        self.write_comment(&comment);
                        if !self.opts.compress {
                            self.out.push('\n');
                        }
                    }
                }
                if self.opts.annotations {
                    let anns = self.doc.annotations(member).to_vec();
                    if !anns.is_empty() {
                        self.tabs(depth);
                        for (i, ann) in anns.into_iter().enumerate() {
                            if i > 0 && !self.opts.compress {
                                self.out.push(' ');
                            }
                            self.write_annotation(ann, depth)?;
                        }
                        if !self.opts.compress {
                            self.out.push('\n');
                        }
                    }
                }
            }
            self.tabs(depth);
            if !is_array {
                if self.opts.json {
                    self.out.push('"');
                    self.out.push_str(&name);
                    self.out.push('"');
                } else {
                    self.out.push_str(&name);
                }
                self.out.push(':');
                if !self.opts.compress {
                    self.out.push(' ');
                }
            }
            self.write_node(member, depth + 1)?;
        }
        if !self.opts.compress {
            self.out.push('\n');
            self.tabs(depth - 1);
        }
        self.out.push(if is_array { ']' } else { '}' });
        Ok(())
    }

    fn write_scalar(&mut self, id: NodeId) -> Result<(), FunctionError> {
        let kind = match self.doc.value_type(id) {
            Some(kind) => kind,
            None => return Ok(()),
        };
        let raw = self.doc.raw_value(id).unwrap_or_default().to_string();
        if self.opts.invoke && kind == ValueType::StringVar {
            let resolved = interp::interpolate(self.doc, id, self.resolver)?;
            self.out.push_str(&crate::value::quote(&resolved));
            return Ok(());
        }
        if self.opts.json && kind == ValueType::String {
            // Re-quote so single-quoted source still emits valid JSON.
            let formatted = self.doc.formatted_value(id).unwrap_or_default();
            self.out.push_str(&crate::value::quote(formatted));
            return Ok(());
        }
        let mut text = if kind == ValueType::StringVar && !self.opts.compress {
            spaced_concat(&raw)
        } else {
            raw
        };
        if self.opts.json && matches!(kind, ValueType::StringVar | ValueType::Unknown) {
            text = format!("\"{}\"", text.replace('"', "\\\""));
        }
        self.out.push_str(&text);
        Ok(())
    }

    fn write_call(&mut self, id: NodeId, depth: usize) -> Result<(), FunctionError> {
        if self.opts.invoke {
            let results = self.call_results(id)?;
            for value in results {
                self.write_value(&value, depth);
            }
            return Ok(());
        }
        // A call in JSON non-invoke mode was already omitted upstream.
        let function = self.doc.function_name(id).unwrap_or_default().to_string();
        self.out.push_str(&function);
        self.out.push('(');
        let args = self.doc.call_args(id).to_vec();
        let mut first = true;
        for arg in args {
            if first {
                first = false;
            } else {
                self.out.push(',');
                if !self.opts.compress {
                    self.out.push(' ');
                }
            }
            if !self.opts.json && self.opts.annotations {
                for ann in self.doc.annotations(arg).to_vec() {
                    self.write_annotation(ann, depth)?;
                    if !self.opts.compress {
                        self.out.push(' ');
                    }
                }
            }
            if !self.opts.json && self.opts.comments {
                for comment in self.doc.comments(arg).to_vec() {
                    self.write_comment(&comment);
                    if !self.opts.compress {
                        self.out.push(' ');
                    }
                }
            }
            self.write_node(arg, depth)?;
        }
        self.out.push(')');
        Ok(())
    }

    fn write_annotation(&mut self, id: NodeId, depth: usize) -> Result<(), FunctionError> {
        self.out.push('@');
        let name = self.doc.name(id).unwrap_or_default().to_string();
        self.out.push_str(&name);
        let members: Vec<(String, NodeId)> = self
            .doc
            .members(id)
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        if members.is_empty() {
            if self.opts.compress {
                // The single space is the terminator of a bare annotation.
                self.out.push(' ');
            }
            return Ok(());
        }
        self.out.push('(');
        let sole_value = members.len() == 1 && members[0].0 == "value";
        let mut first = true;
        for (name, member) in members {
            if first {
                first = false;
            } else {
                self.out.push(',');
                if !self.opts.compress {
                    self.out.push(' ');
                }
            }
            if !sole_value {
                self.out.push_str(&name);
                if !self.opts.compress {
                    self.out.push(' ');
                }
                self.out.push('=');
                if !self.opts.compress {
                    self.out.push(' ');
                }
            }
            self.write_node(member, depth + 1)?;
        }
        self.out.push(')');
        Ok(())
    }

    fn write_comment(&mut self, comment: &Comment) {
        // Compact output has no line structure, so one-line comments
        // downgrade to block form there.
        if comment.is_one_line() && !self.opts.compress {
            self.out.push_str("//");
            self.out.push_str(comment.content());
        } else {
            self.out.push_str("/*");
            self.out.push_str(comment.content());
            self.out.push_str("*/");
        }
    }

    // ---- invoke support ----

    pub(crate) fn call_results(&self, id: NodeId) -> Result<Vec<Value>, FunctionError> {
        let name = self
            .doc
            .qualified_function_name(id)
            .unwrap_or_default();
        let resolver = self
            .resolver
            .ok_or_else(|| FunctionError::NoResolver { name: name.clone() })?;
        let args = self
            .doc
            .call_args(id)
            .iter()
            .map(|arg| self.invoked_value(*arg))
            .collect::<Result<Vec<_>, _>>()?;
        resolver.resolve(&name, &args)
    }

    /// The value an argument node contributes to a call: scalars by their
    /// typed reading, variables interpolated, nested calls resolved fresh,
    /// collections converted member-wise.
    fn invoked_value(&self, id: NodeId) -> Result<Value, FunctionError> {
        match self.doc.data(id) {
            NodeData::Object { kind, raw, .. } => Ok(match kind {
                ValueType::Null => Value::Null,
                ValueType::Boolean => Value::Bool(raw == "true"),
                ValueType::Integer => Value::Integer(raw.parse().unwrap_or_default()),
                ValueType::Decimal => Value::Float(raw.parse().unwrap_or_default()),
                ValueType::String => Value::String(
                    self.doc.formatted_value(id).unwrap_or_default().to_string(),
                ),
                ValueType::StringVar => {
                    Value::String(interp::interpolate(self.doc, id, self.resolver)?)
                }
                ValueType::Unknown => Value::String(raw.clone()),
            }),
            NodeData::Call { .. } => {
                let mut results = self.call_results(id)?;
                Ok(if results.len() == 1 {
                    results.remove(0)
                } else {
                    Value::Array(results)
                })
            }
            NodeData::Collection {
                members,
                is_array: true,
            } => Ok(Value::Array(
                members
                    .values()
                    .map(|v| self.invoked_value(*v))
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            NodeData::Collection { members, .. } | NodeData::Annotation { members } => {
                Ok(Value::Object(
                    members
                        .iter()
                        .map(|(k, v)| Ok((k.clone(), self.invoked_value(*v)?)))
                        .collect::<Result<_, FunctionError>>()?,
                ))
            }
        }
    }

    /// Render a resolver-produced value in the current dialect.
    fn write_value(&mut self, value: &Value, depth: usize) {
        match value {
            Value::Array(items) => {
                self.out.push('[');
                if items.is_empty() {
                    self.out.push(']');
                    return;
                }
                if !self.opts.compress {
                    self.out.push('\n');
                }
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.out.push(',');
                        if !self.opts.compress {
                            self.out.push('\n');
                        }
                    }
                    self.tabs(depth);
                    self.write_value(item, depth + 1);
                }
                if !self.opts.compress {
                    self.out.push('\n');
                    self.tabs(depth - 1);
                }
                self.out.push(']');
            }
            Value::Object(entries) => {
                self.out.push('{');
                if entries.is_empty() {
                    self.out.push('}');
                    return;
                }
                if !self.opts.compress {
                    self.out.push('\n');
                }
                for (i, (name, item)) in entries.iter().enumerate() {
                    if i > 0 {
                        self.out.push(',');
                        if !self.opts.compress {
                            self.out.push('\n');
                        }
                    }
                    self.tabs(depth);
                    if self.opts.json {
                        self.out.push('"');
                        self.out.push_str(name);
                        self.out.push('"');
                    } else {
                        self.out.push_str(name);
                    }
                    self.out.push(':');
                    if !self.opts.compress {
                        self.out.push(' ');
                    }
                    self.write_value(item, depth + 1);
                }
                if !self.opts.compress {
                    self.out.push('\n');
                    self.tabs(depth - 1);
                }
                self.out.push('}');
            }
            scalar => self.out.push_str(&scalar.to_literal()),
        }
    }
}

impl std::fmt::Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl std::str::FromStr for Document {
    type Err = crate::error::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parser::parse(s)
    }
}

/// Put breathing room around `+` concatenation markers outside quotes;
/// everything else in the raw literal is already compressed.
fn spaced_concat(raw: &str) -> String {
    use crate::util::scan::{QuoteTracker, Step};
    let mut out = String::with_capacity(raw.len());
    let mut tracker = QuoteTracker::new();
    for c in raw.chars() {
        let step = tracker.step(c);
        if step == Step::Other && !tracker.in_quotes() && c == '+' {
            if !out.ends_with(' ') {
                out.push(' ');
            }
            out.push('+');
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use crate::parser::parse;

    #[test]
    fn compact_output_matches_input_shape() {
        let doc = parse("{a: 1, b: [true, false, null]}").unwrap();
        assert_eq!(doc.to_compact(), "{a:1,b:[true,false,null]}");
    }

    #[test]
    fn json_output_quotes_names() {
        let doc = parse("{a: 1, b: [true, false, null]}").unwrap();
        assert_eq!(doc.to_json(true), r#"{"a":1,"b":[true,false,null]}"#);
    }

    #[test]
    fn pretty_output_uses_tabs() {
        let doc = parse("{a: 1, b: {c: 2}}").unwrap();
        let expected = "{\n\ta: 1,\n\tb: {\n\t\tc: 2\n\t}\n}";
        assert_eq!(doc.to_text(), expected);
    }

    #[test]
    fn annotations_precede_their_member() {
        let doc = parse("{@Meta(x=1) name: \"value\"}").unwrap();
        assert_eq!(doc.to_compact(), "{@Meta(x=1)name:\"value\"}");
        assert_eq!(doc.to_text(), "{\n\t@Meta(x = 1)\n\tname: \"value\"\n}");
    }

    #[test]
    fn sole_value_member_renders_bare() {
        let doc = parse("{@Since(\"1.2\") a: 1}").unwrap();
        assert_eq!(doc.to_compact(), "{@Since(\"1.2\")a:1}");
    }

    #[test]
    fn bare_annotation_keeps_space_terminator_in_compact() {
        let doc = parse("{@Deprecated a: 1}").unwrap();
        assert_eq!(doc.to_compact(), "{@Deprecated a:1}");
    }

    #[test]
    fn json_drops_annotations_comments_and_calls() {
        let doc = parse("{@Meta(x=1) a: 1, // note\nb: foo(1,2), c: 3}").unwrap();
        assert_eq!(doc.to_json(true), r#"{"a":1,"c":3}"#);
    }

    #[test]
    fn comments_round_trip_in_pretty_output() {
        let doc = parse("{// note\na: 1}").unwrap();
        assert_eq!(doc.to_text(), "{\n\t// note\n\ta: 1\n}");
    }

    #[test]
    fn compact_comment_downgrades_to_block_form() {
        let doc = parse("{// note\na: 1}").unwrap();
        assert_eq!(doc.to_compact(), "{/* note*/a:1}");
    }

    #[test]
    fn call_renders_as_call_syntax_without_invoke() {
        let doc = parse("{x: foo(1, \"two\")}").unwrap();
        assert_eq!(doc.to_compact(), "{x:foo(1,\"two\")}");
        assert_eq!(doc.to_text(), "{\n\tx: foo(1, \"two\")\n}");
    }

    #[test]
    fn string_var_gets_concat_spacing_when_pretty() {
        let doc = parse(r#"{name: "sun", msg: "hi "+$this.name}"#).unwrap();
        assert!(doc.to_text().contains(r#""hi " + $this.name"#));
        assert!(doc.to_compact().contains(r#""hi "+$this.name"#));
    }
}

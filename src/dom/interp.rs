//! `$`-variable interpolation.
//!
//! Applies to string-with-variables scalars when rendering with `invoke`.
//! A reference reads `$root.path` or `$root.depth.path`, where `root` is
//! `this` (relative to the scalar itself) or `main` (the document root),
//! `depth` counts extra parent hops, and `path` descends member names from
//! wherever the hops landed. `+` concatenates pieces; quotes around literal
//! pieces are dropped; anything unresolved becomes the word `null`.

use crate::error::FunctionError;
use crate::function::FunctionResolver;
use crate::util::scan::{QuoteTracker, Step};
use crate::value::Value;

use super::node::{Document, NodeId};
use super::serialize::WriteOptions;

/// Resolve every `$`-reference of the scalar at `id`, returning the
/// concatenated (unquoted) result.
pub(crate) fn interpolate(
    doc: &Document,
    id: NodeId,
    resolver: Option<&dyn FunctionResolver>,
) -> Result<String, FunctionError> {
    let raw = doc.raw_value(id).unwrap_or_default().to_string();
    let mut out = String::new();
    let mut name = String::new();
    let mut resolved = String::new();
    let mut in_var = false;
    let mut tracker = QuoteTracker::new();
    for c in raw.chars() {
        let step = tracker.step(c);
        if step == Step::QuoteToggle || step == Step::StartEscape {
            // Quotes delimit literal pieces and escapes protect one
            // character; neither survives into the assembled text, which
            // is re-escaped as a whole when rendered.
            continue;
        }
        if tracker.in_quotes() {
            out.push(c);
            continue;
        }
        if in_var {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                name.push(c);
                continue;
            }
            resolved.push_str(&resolve_var(doc, id, &name, resolver)?);
            name.clear();
            in_var = false;
        }
        if c == '$' {
            in_var = true;
        } else if c == '+' {
            out.push_str(&resolved);
            resolved.clear();
        } else {
            out.push(c);
        }
    }
    if !name.is_empty() {
        resolved.push_str(&resolve_var(doc, id, &name, resolver)?);
    }
    if !resolved.is_empty() {
        out.push_str(&resolved);
    }
    Ok(out)
}

fn resolve_var(
    doc: &Document,
    origin: NodeId,
    reference: &str,
    resolver: Option<&dyn FunctionResolver>,
) -> Result<String, FunctionError> {
    let parts: Vec<&str> = reference.split('.').collect();
    let (root_word, depth, path) = match parts.as_slice() {
        [] => return Ok("null".into()),
        [single] => ("this", 0i64, (*single).to_string()),
        [root, path] => (*root, 0, (*path).to_string()),
        [root, depth, rest @ ..] if depth.chars().all(|c| c.is_ascii_digit()) => {
            (*root, depth.parse().unwrap_or(0), rest.join("."))
        }
        [root, rest @ ..] => (*root, 0, rest.join(".")),
    };
    let start = match root_word {
        "this" => origin,
        "main" => doc.root(),
        _ => return Ok("null".into()),
    };
    let landed = hop_up(doc, start, depth);
    if doc.is_collection(landed) || doc.is_annotation(landed) {
        let found = match descend(doc, landed, &path) {
            Some(found) => found,
            None => return Ok("null".into()),
        };
        // Referenced collections always render compact: the result is
        // spliced into a single-line string value.
        let opts = WriteOptions::compact().invoke();
        let text = doc.node_text(found, &opts, resolver)?;
        Ok(strip_quotes(&text).to_string())
    } else if path.eq_ignore_ascii_case("value") {
        if let Some(text) = doc.formatted_value(landed) {
            return Ok(text.to_string());
        }
        // A call referenced by `value` resolves on the spot; any failure
        // reads as null, like every other unresolved reference.
        if doc.is_call(landed) {
            if let Some(resolver) = resolver {
                if let Ok(values) = doc.invoke_call(landed, resolver) {
                    return Ok(match values.into_iter().next() {
                        Some(Value::String(s)) => s,
                        Some(value) => value.to_literal(),
                        None => "null".into(),
                    });
                }
            }
        }
        Ok("null".into())
    } else {
        Ok("null".into())
    }
}

/// Land `depth + 1` ancestors above `node`, clamped at the root.
fn hop_up(doc: &Document, node: NodeId, depth: i64) -> NodeId {
    let mut remaining = depth;
    let mut current = node;
    loop {
        match doc.parent(current) {
            Some(parent) if remaining >= 0 => {
                remaining -= 1;
                current = parent;
            }
            _ => return current,
        }
    }
}

fn descend(doc: &Document, base: NodeId, path: &str) -> Option<NodeId> {
    let mut current = base;
    for seg in path.split('.') {
        current = doc.member(current, seg)?;
    }
    Some(current)
}

fn strip_quotes(text: &str) -> &str {
    let mut s = text;
    if s.starts_with('"') || s.starts_with('\'') {
        s = &s[1..];
    }
    if s.ends_with('"') || s.ends_with('\'') {
        s = &s[..s.len() - 1];
    }
    s
}

#[cfg(test)]
mod tests {
    use crate::dom::WriteOptions;
    use crate::parser::parse;

    fn invoked(input: &str) -> String {
        let doc = parse(input).unwrap();
        doc.serialize(&WriteOptions::compact().invoke()).unwrap()
    }

    #[test]
    fn sibling_reference_through_this() {
        let out = invoked(r#"{user: "sun", msg: "Hello, "+$this.user+"!"}"#);
        assert!(out.contains(r#"msg:"Hello, sun!""#), "got: {}", out);
    }

    #[test]
    fn main_resolves_from_document_root() {
        let out = invoked(r#"{app: "ssdf", info: {line: $main.app+" here"}}"#);
        assert!(out.contains(r#"line:"ssdf here""#), "got: {}", out);
    }

    #[test]
    fn depth_hops_extra_parents() {
        // From `deep.msg`, depth 0 lands on `deep`; depth 1 lands on the
        // root, where `top` lives.
        let out = invoked(r#"{top: "t", deep: {local: "l", msg: $this.local+$this.1.top}}"#);
        assert!(out.contains(r#"msg:"lt""#), "got: {}", out);
    }

    #[test]
    fn escaped_quotes_in_literal_pieces_unescape_once() {
        let out = invoked(r#"{x: "now", msg: "say \"hi\" "+$this.x}"#);
        assert!(out.contains(r#"msg:"say \"hi\" now""#), "got: {}", out);
    }

    #[test]
    fn unresolved_reference_renders_null() {
        let out = invoked(r#"{msg: "x"+$this.nope}"#);
        assert!(out.contains(r#"msg:"xnull""#), "got: {}", out);
    }

    #[test]
    fn collection_reference_is_rendered_by_value() {
        let out = invoked(r#"{xs: [1, 2], msg: "got "+$this.xs}"#);
        assert!(out.contains(r#"msg:"got [1,2]""#), "got: {}", out);
    }

    #[test]
    fn enclosing_annotation_value_reference() {
        // Inside an annotation argument, `$this.value` lands on the
        // annotation itself and reads its implicit `value` member.
        let out = invoked(r#"{@Note("v", copy=$this.value) a: 1}"#);
        assert!(out.contains(r#"copy="v""#), "got: {}", out);
    }
}

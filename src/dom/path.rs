//! Path addressing over the document tree.
//!
//! Grammar: `path := alt ('|' alt)*`, `alt := conj ('&' conj)*`,
//! `conj := segment ('.' segment)*`, `segment := name | name ':' anno`.
//! The final `|` alternative may be `*literal`, a raw fallback value.
//!
//! Precedence is the same for every operation: `|` binds loosest, then
//! `&`, then `.`/`:`. `a&b` requires both sides and yields `b`; `a|b`
//! yields the first side that resolves.

use tracing::trace;

use crate::error::PathError;
use crate::value::{unquote, Value, ValueType};

use super::node::{Document, NodeId};

/// What a path resolved to: a live node, or the raw text of a `*literal`
/// fallback alternative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathTarget {
    Node(NodeId),
    Literal(String),
}

impl PathTarget {
    pub fn node(&self) -> Option<NodeId> {
        match self {
            PathTarget::Node(id) => Some(*id),
            PathTarget::Literal(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    name: String,
    annotation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Alternative {
    Paths(Vec<Vec<Segment>>),
    Literal(String),
}

fn parse_path(path: &str) -> Result<Vec<Alternative>, PathError> {
    if path.is_empty() {
        return Err(PathError::InvalidPath {
            path: path.into(),
            reason: "path is empty",
        });
    }
    path.split('|')
        .map(|alt| {
            if let Some(literal) = alt.strip_prefix('*') {
                return Ok(Alternative::Literal(literal.to_string()));
            }
            alt.split('&')
                .map(|conj| parse_conj(path, conj))
                .collect::<Result<Vec<_>, _>>()
                .map(Alternative::Paths)
        })
        .collect()
}

fn parse_conj(path: &str, conj: &str) -> Result<Vec<Segment>, PathError> {
    conj.split('.')
        .map(|seg| {
            let (name, annotation) = match seg.split_once(':') {
                Some((name, ann)) => {
                    if ann.is_empty() || ann.contains(':') {
                        return Err(PathError::InvalidPath {
                            path: path.into(),
                            reason: "malformed annotation selector",
                        });
                    }
                    (name, Some(ann.to_string()))
                }
                None => (seg, None),
            };
            if name.is_empty() {
                return Err(PathError::InvalidPath {
                    path: path.into(),
                    reason: "empty segment",
                });
            }
            Ok(Segment {
                name: name.to_string(),
                annotation,
            })
        })
        .collect()
}

impl Document {
    fn resolve_dotted(&self, segments: &[Segment], path: &str) -> Result<NodeId, PathError> {
        let mut current = self.root();
        for seg in segments {
            if !(self.is_collection(current) || self.is_annotation(current)) {
                return Err(PathError::mismatch(
                    path,
                    "a collection",
                    self.data(current).describe(),
                ));
            }
            let member = self
                .member(current, &seg.name)
                .ok_or_else(|| PathError::not_found(path))?;
            current = match &seg.annotation {
                Some(ann) => self
                    .annotation(member, ann)
                    .ok_or_else(|| PathError::not_found(path))?,
                None => member,
            };
        }
        Ok(current)
    }

    /// Resolve `path` to a node or a fallback literal.
    ///
    /// Alternatives are tried left to right; within one alternative every
    /// `&`-conjunct must resolve and the last one is the result.
    pub fn get(&self, path: &str) -> Result<PathTarget, PathError> {
        let alternatives = parse_path(path)?;
        trace!(path, alternatives = alternatives.len(), "resolving path");
        let single = alternatives.len() == 1;
        let mut first_err = None;
        for alt in &alternatives {
            match alt {
                Alternative::Literal(lit) => return Ok(PathTarget::Literal(lit.clone())),
                Alternative::Paths(conjs) => {
                    let mut resolved = None;
                    for conj in conjs {
                        match self.resolve_dotted(conj, path) {
                            Ok(id) => resolved = Some(id),
                            Err(err) => {
                                first_err.get_or_insert(err);
                                resolved = None;
                                break;
                            }
                        }
                    }
                    if let Some(id) = resolved {
                        return Ok(PathTarget::Node(id));
                    }
                }
            }
        }
        match (single, first_err) {
            (true, Some(err)) => Err(err),
            _ => Err(PathError::not_found(path)),
        }
    }

    /// Resolve `path` to a node; a literal fallback does not count.
    pub fn get_node(&self, path: &str) -> Result<NodeId, PathError> {
        match self.get(path)? {
            PathTarget::Node(id) => Ok(id),
            PathTarget::Literal(_) => Err(PathError::not_found(path)),
        }
    }

    /// Resolve `path` to a scalar or function-call node.
    pub fn get_object(&self, path: &str) -> Result<NodeId, PathError> {
        let id = self.get_node(path)?;
        if self.is_scalar(id) || self.is_call(id) {
            Ok(id)
        } else {
            Err(PathError::mismatch(
                path,
                "a scalar",
                self.data(id).describe(),
            ))
        }
    }

    /// Resolve `path` to a collection (or annotation) node.
    pub fn get_collection(&self, path: &str) -> Result<NodeId, PathError> {
        let id = self.get_node(path)?;
        if self.is_collection(id) || self.is_annotation(id) {
            Ok(id)
        } else {
            Err(PathError::mismatch(
                path,
                "a collection",
                self.data(id).describe(),
            ))
        }
    }

    // ---- typed getters ----

    pub fn get_bool(&self, path: &str) -> Result<bool, PathError> {
        match self.get(path)? {
            PathTarget::Node(id) => match (self.value_type(id), self.raw_value(id)) {
                (Some(ValueType::Boolean), Some(raw)) => Ok(raw == "true"),
                _ => Err(self.kind_error(path, "a boolean", id)),
            },
            PathTarget::Literal(lit) => match lit.as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(PathError::mismatch(path, "a boolean", "a literal")),
            },
        }
    }

    pub fn get_i64(&self, path: &str) -> Result<i64, PathError> {
        match self.get(path)? {
            PathTarget::Node(id) => match (self.value_type(id), self.raw_value(id)) {
                (Some(ValueType::Integer), Some(raw)) => raw
                    .parse()
                    .map_err(|_| self.kind_error(path, "an integer", id)),
                _ => Err(self.kind_error(path, "an integer", id)),
            },
            PathTarget::Literal(lit) => lit
                .parse()
                .map_err(|_| PathError::mismatch(path, "an integer", "a literal")),
        }
    }

    pub fn get_f64(&self, path: &str) -> Result<f64, PathError> {
        match self.get(path)? {
            PathTarget::Node(id) => match (self.value_type(id), self.raw_value(id)) {
                (Some(ValueType::Decimal), Some(raw)) | (Some(ValueType::Integer), Some(raw)) => {
                    raw.parse()
                        .map_err(|_| self.kind_error(path, "a decimal", id))
                }
                _ => Err(self.kind_error(path, "a decimal", id)),
            },
            PathTarget::Literal(lit) => lit
                .parse()
                .map_err(|_| PathError::mismatch(path, "a decimal", "a literal")),
        }
    }

    /// The formatted string reading of any scalar at `path`.
    pub fn get_str(&self, path: &str) -> Result<String, PathError> {
        match self.get(path)? {
            PathTarget::Node(id) => self
                .formatted_value(id)
                .map(str::to_string)
                .ok_or_else(|| self.kind_error(path, "a scalar", id)),
            PathTarget::Literal(lit) => {
                if ValueType::classify(&lit) == ValueType::String {
                    Ok(unquote(&lit))
                } else {
                    Ok(lit)
                }
            }
        }
    }

    pub fn get_bool_or(&self, path: &str, default: bool) -> bool {
        self.get_bool(path).unwrap_or(default)
    }

    pub fn get_i64_or(&self, path: &str, default: i64) -> i64 {
        self.get_i64(path).unwrap_or(default)
    }

    pub fn get_f64_or(&self, path: &str, default: f64) -> f64 {
        self.get_f64(path).unwrap_or(default)
    }

    pub fn get_str_or(&self, path: &str, default: &str) -> String {
        self.get_str(path).unwrap_or_else(|_| default.to_string())
    }

    fn kind_error(&self, path: &str, expected: &'static str, id: NodeId) -> PathError {
        PathError::mismatch(path, expected, self.data(id).describe())
    }

    // ---- existence ----

    /// Whether any alternative of `path` resolves. Never errors: malformed
    /// paths and traversal mismatches read as absent.
    pub fn has(&self, path: &str) -> bool {
        self.get(path).is_ok()
    }

    /// `has`, but a present node that is not scalar-like is an error.
    pub fn has_object(&self, path: &str) -> Result<bool, PathError> {
        match self.get(path) {
            Ok(PathTarget::Node(id)) => {
                if self.is_scalar(id) || self.is_call(id) {
                    Ok(true)
                } else {
                    Err(self.kind_error(path, "a scalar", id))
                }
            }
            Ok(PathTarget::Literal(_)) => Ok(true),
            Err(_) => Ok(false),
        }
    }

    /// `has`, but a present node that is not a collection is an error.
    pub fn has_collection(&self, path: &str) -> Result<bool, PathError> {
        match self.get(path) {
            Ok(PathTarget::Node(id)) => {
                if self.is_collection(id) || self.is_annotation(id) {
                    Ok(true)
                } else {
                    Err(self.kind_error(path, "a collection", id))
                }
            }
            Ok(PathTarget::Literal(_)) => {
                Err(PathError::mismatch(path, "a collection", "a literal"))
            }
            Err(_) => Ok(false),
        }
    }

    // ---- removal ----

    /// Remove what `path` addresses. Alternatives are tried in order and the
    /// first one that removes anything wins; absent sides of a combinator
    /// are no-ops. Returns whether anything was removed.
    pub fn remove(&mut self, path: &str) -> bool {
        let alternatives = match parse_path(path) {
            Ok(alts) => alts,
            Err(_) => return false,
        };
        for alt in alternatives {
            let conjs = match alt {
                Alternative::Paths(conjs) => conjs,
                Alternative::Literal(_) => continue,
            };
            let mut removed = false;
            for conj in conjs {
                if let Ok(id) = self.resolve_dotted(&conj, path) {
                    removed |= self.remove_resolved(id);
                }
            }
            if removed {
                return true;
            }
        }
        false
    }

    fn remove_resolved(&mut self, id: NodeId) -> bool {
        let parent = match self.parent(id) {
            Some(parent) => parent,
            None => return false,
        };
        if self.is_annotation(id) {
            let name = match self.name(id) {
                Some(name) => name.to_string(),
                None => return false,
            };
            self.remove_annotations(parent, &name) > 0
        } else {
            let name = match self.name(id) {
                Some(name) => name.to_string(),
                None => return false,
            };
            self.remove_child(parent, &name)
        }
    }

    /// Remove, requiring the target to be scalar-like.
    pub fn remove_object(&mut self, path: &str) -> Result<bool, PathError> {
        match self.get(path) {
            Ok(PathTarget::Node(id)) => {
                if self.is_scalar(id) || self.is_call(id) {
                    Ok(self.remove_resolved(id))
                } else {
                    Err(self.kind_error(path, "a scalar", id))
                }
            }
            _ => Ok(false),
        }
    }

    /// Remove, requiring the target to be a collection.
    pub fn remove_collection(&mut self, path: &str) -> Result<bool, PathError> {
        match self.get(path) {
            Ok(PathTarget::Node(id)) => {
                if self.is_collection(id) || self.is_annotation(id) {
                    Ok(self.remove_resolved(id))
                } else {
                    Err(self.kind_error(path, "a collection", id))
                }
            }
            _ => Ok(false),
        }
    }

    // ---- upserts ----

    /// Walk `path` down to its final segment, creating missing intermediate
    /// collections; array-vs-object for a created segment follows whether
    /// the next segment looks like a non-negative integer. Returns the
    /// container to write into and the final member name.
    fn ensure_path(&mut self, path: &str) -> Result<(NodeId, String), PathError> {
        let alternatives = parse_path(path)?;
        let segments = match alternatives.as_slice() {
            [Alternative::Paths(conjs)] if conjs.len() == 1 => conjs[0].clone(),
            _ => {
                return Err(PathError::InvalidPath {
                    path: path.into(),
                    reason: "combinators are read-only",
                })
            }
        };
        let mut current = self.root();
        for (i, seg) in segments.iter().enumerate() {
            let last = i + 1 == segments.len();
            if last && seg.annotation.is_none() {
                return Ok((current, seg.name.clone()));
            }
            if !(self.is_collection(current) || self.is_annotation(current)) {
                return Err(PathError::mismatch(
                    path,
                    "a collection",
                    self.data(current).describe(),
                ));
            }
            let member = match self.member(current, &seg.name) {
                Some(id) => id,
                None => {
                    let created = if seg.annotation.is_some() {
                        // A member that exists only to carry an annotation.
                        self.alloc_typed_scalar(ValueType::Null, "null")
                    } else {
                        let next_is_index = segments
                            .get(i + 1)
                            .map_or(false, |next| next.name.parse::<usize>().is_ok());
                        self.alloc_collection(next_is_index)
                    };
                    self.insert_child(current, Some(&seg.name), created)
                }
            };
            current = match &seg.annotation {
                Some(ann) => match self.annotation(member, ann) {
                    Some(id) => id,
                    None => self.attach_annotation(member, ann).ok_or_else(|| {
                        PathError::mismatch(path, "an annotatable node", "an annotation")
                    })?,
                },
                None => member,
            };
            if last {
                // A trailing `:Anno` addresses the annotation's own value.
                return Ok((current, "value".to_string()));
            }
        }
        Err(PathError::InvalidPath {
            path: path.into(),
            reason: "empty segment",
        })
    }

    fn set_scalar(
        &mut self,
        path: &str,
        kind: ValueType,
        text: &str,
    ) -> Result<NodeId, PathError> {
        let (container, name) = self.ensure_path(path)?;
        if let Some(existing) = self.member(container, &name) {
            if self.is_scalar(existing) {
                self.write_scalar(existing, kind, text);
                return Ok(existing);
            }
        }
        let scalar = self.alloc_typed_scalar(kind, text);
        Ok(self.insert_child(container, Some(&name), scalar))
    }

    pub fn set_null(&mut self, path: &str) -> Result<NodeId, PathError> {
        self.set_scalar(path, ValueType::Null, "null")
    }

    pub fn set_bool(&mut self, path: &str, value: bool) -> Result<NodeId, PathError> {
        self.set_scalar(path, ValueType::Boolean, if value { "true" } else { "false" })
    }

    pub fn set_i64(&mut self, path: &str, value: i64) -> Result<NodeId, PathError> {
        self.set_scalar(path, ValueType::Integer, &value.to_string())
    }

    pub fn set_f64(&mut self, path: &str, value: f64) -> Result<NodeId, PathError> {
        self.set_scalar(path, ValueType::Decimal, &decimal_text(value))
    }

    pub fn set_str(&mut self, path: &str, value: &str) -> Result<NodeId, PathError> {
        self.set_scalar(path, ValueType::String, &crate::value::quote(value))
    }

    /// Store raw literal text, classifying its type the way the parser
    /// would. Malformed input lands as `Unknown` rather than failing.
    pub fn set_literal(&mut self, path: &str, raw: &str) -> Result<NodeId, PathError> {
        let (container, name) = self.ensure_path(path)?;
        let kind = ValueType::classify(raw);
        if let Some(existing) = self.member(container, &name) {
            if self.is_scalar(existing) {
                self.write_scalar(existing, kind, raw);
                return Ok(existing);
            }
        }
        let scalar = self.alloc_scalar(raw);
        Ok(self.insert_child(container, Some(&name), scalar))
    }

    /// Store plain data, building nested collections for arrays/objects.
    pub fn set_value(&mut self, path: &str, value: &Value) -> Result<NodeId, PathError> {
        match value {
            Value::Array(_) | Value::Object(_) => {
                let (container, name) = self.ensure_path(path)?;
                let built = self.build_value(value);
                Ok(self.insert_child(container, Some(&name), built))
            }
            Value::Null => self.set_null(path),
            Value::Bool(b) => self.set_bool(path, *b),
            Value::Integer(i) => self.set_i64(path, *i),
            Value::Float(f) => self.set_f64(path, *f),
            Value::String(s) => self.set_str(path, s),
        }
    }

    pub(crate) fn build_value(&mut self, value: &Value) -> NodeId {
        match value {
            Value::Array(items) => {
                let arr = self.alloc_collection(true);
                for item in items {
                    let child = self.build_value(item);
                    self.insert_child(arr, None, child);
                }
                arr
            }
            Value::Object(entries) => {
                let obj = self.alloc_collection(false);
                for (name, item) in entries {
                    let child = self.build_value(item);
                    self.insert_child(obj, Some(name), child);
                }
                obj
            }
            scalar => {
                let text = scalar.to_literal();
                self.alloc_scalar(&text)
            }
        }
    }

    /// Re-home an existing node of this document at `path`, reusing its
    /// identity. Refused when the node would become its own descendant.
    pub fn set_node(&mut self, path: &str, node: NodeId) -> Result<NodeId, PathError> {
        let (container, name) = self.ensure_path(path)?;
        if self.is_ancestor(node, container) {
            return Err(PathError::WouldCycle { path: path.into() });
        }
        if let (Some(old_parent), Some(old_name)) = (
            self.parent(node),
            self.name(node).map(str::to_string),
        ) {
            self.detach_child(old_parent, &old_name);
        }
        Ok(self.insert_child(container, Some(&name), node))
    }

    // ---- array appends ----

    /// The array at `path`, created (with object/array intermediates) when
    /// absent.
    fn ensure_array(&mut self, path: &str) -> Result<NodeId, PathError> {
        let (container, name) = self.ensure_path(path)?;
        match self.member(container, &name) {
            Some(id) if self.is_array(id) => Ok(id),
            Some(id) => Err(self.kind_error(path, "an array", id)),
            None => {
                let arr = self.alloc_collection(true);
                Ok(self.insert_child(container, Some(&name), arr))
            }
        }
    }

    pub fn push_null(&mut self, path: &str) -> Result<NodeId, PathError> {
        let arr = self.ensure_array(path)?;
        let scalar = self.alloc_typed_scalar(ValueType::Null, "null");
        Ok(self.insert_child(arr, None, scalar))
    }

    pub fn push_bool(&mut self, path: &str, value: bool) -> Result<NodeId, PathError> {
        let arr = self.ensure_array(path)?;
        let scalar = self
            .alloc_typed_scalar(ValueType::Boolean, if value { "true" } else { "false" });
        Ok(self.insert_child(arr, None, scalar))
    }

    pub fn push_i64(&mut self, path: &str, value: i64) -> Result<NodeId, PathError> {
        let arr = self.ensure_array(path)?;
        let scalar = self.alloc_typed_scalar(ValueType::Integer, &value.to_string());
        Ok(self.insert_child(arr, None, scalar))
    }

    pub fn push_f64(&mut self, path: &str, value: f64) -> Result<NodeId, PathError> {
        let arr = self.ensure_array(path)?;
        let scalar = self.alloc_typed_scalar(ValueType::Decimal, &decimal_text(value));
        Ok(self.insert_child(arr, None, scalar))
    }

    pub fn push_str(&mut self, path: &str, value: &str) -> Result<NodeId, PathError> {
        let arr = self.ensure_array(path)?;
        let scalar = self.alloc_typed_scalar(ValueType::String, &crate::value::quote(value));
        Ok(self.insert_child(arr, None, scalar))
    }

    pub fn push_value(&mut self, path: &str, value: &Value) -> Result<NodeId, PathError> {
        let arr = self.ensure_array(path)?;
        let built = self.build_value(value);
        Ok(self.insert_child(arr, None, built))
    }
}

fn decimal_text(value: f64) -> String {
    let mut text = value.to_string();
    if !text.contains('.') {
        text.push_str(".0");
    }
    text
}

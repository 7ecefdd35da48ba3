//! The document tree.
//!
//! Nodes live in a slab arena owned by [`Document`] and are addressed by
//! [`NodeId`]. A node's parent is an optional index into the same arena, so
//! moving a node between containers is an in-place update of its slot and
//! can never leave a dangling reference behind. Removing a node frees its
//! whole subtree; ids of freed nodes must not be used again.

use indexmap::IndexMap;
use once_cell::unsync::OnceCell;

use crate::value::{Value, ValueType};

/// Index of a node inside its [`Document`]'s arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A comment attached to the node that follows it in the source text.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Comment {
    content: String,
    one_line: bool,
}

/// The one-line/block distinction is a rendering form, not content;
/// compact output turns one-line comments into block comments, and the
/// round trip must still compare equal.
impl PartialEq for Comment {
    fn eq(&self, other: &Self) -> bool {
        self.content == other.content
    }
}

impl Eq for Comment {}

impl Comment {
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        let one_line = !content.contains('\n');
        Comment { content, one_line }
    }

    pub(crate) fn with_form(content: impl Into<String>, one_line: bool) -> Self {
        Comment {
            content: content.into(),
            one_line,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_one_line(&self) -> bool {
        self.one_line
    }
}

/// The payload of a node.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Ordered name-to-child mapping; an array names its members `0..n-1`.
    Collection {
        members: IndexMap<String, NodeId>,
        is_array: bool,
    },
    /// Scalar leaf: recognized type, raw (compressed) literal text and the
    /// lazily derived formatted (typed, unescaped) reading.
    Object {
        kind: ValueType,
        raw: String,
        formatted: OnceCell<String>,
    },
    /// Metadata attached to another node; a restricted collection that
    /// cannot itself carry annotations.
    Annotation { members: IndexMap<String, NodeId> },
    /// A deferred call resolved externally at render time.
    Call { function: String, args: Vec<NodeId> },
}

impl NodeData {
    pub(crate) fn describe(&self) -> &'static str {
        match self {
            NodeData::Collection { is_array: true, .. } => "an array",
            NodeData::Collection { .. } => "an object collection",
            NodeData::Object { .. } => "a scalar",
            NodeData::Annotation { .. } => "an annotation",
            NodeData::Call { .. } => "a function call",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NodeEntry {
    pub(crate) name: Option<String>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) annotations: Vec<NodeId>,
    pub(crate) comments: Vec<Comment>,
    pub(crate) data: NodeData,
}

impl NodeEntry {
    fn detached(data: NodeData) -> Self {
        NodeEntry {
            name: None,
            parent: None,
            annotations: Vec::new(),
            comments: Vec::new(),
            data,
        }
    }
}

/// An in-memory SSDF document: a tree of collections, scalars, annotations
/// and function calls rooted at an unnamed collection.
///
/// The document is single-threaded and not internally synchronized; callers
/// that share one across threads must serialize access themselves.
#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Option<NodeEntry>>,
    free: Vec<NodeId>,
    root: NodeId,
}

impl Document {
    /// An empty document whose root is an object collection.
    pub fn new() -> Self {
        Self::with_root(false)
    }

    /// An empty document whose root is an array.
    pub fn new_array() -> Self {
        Self::with_root(true)
    }

    fn with_root(is_array: bool) -> Self {
        let mut doc = Document {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId(0),
        };
        let root = doc.alloc(NodeEntry::detached(NodeData::Collection {
            members: IndexMap::new(),
            is_array,
        }));
        doc.root = root;
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    // ---- arena plumbing ----

    pub(crate) fn alloc(&mut self, entry: NodeEntry) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.slots[id.index()] = Some(entry);
                id
            }
            None => {
                let id = NodeId(self.slots.len() as u32);
                self.slots.push(Some(entry));
                id
            }
        }
    }

    pub(crate) fn entry(&self, id: NodeId) -> &NodeEntry {
        self.slots[id.index()].as_ref().expect("stale node id")
    }

    pub(crate) fn entry_mut(&mut self, id: NodeId) -> &mut NodeEntry {
        self.slots[id.index()].as_mut().expect("stale node id")
    }

    /// True while `id` addresses a live node of this document.
    pub fn contains(&self, id: NodeId) -> bool {
        self.slots.get(id.index()).map_or(false, |s| s.is_some())
    }

    pub(crate) fn alloc_collection(&mut self, is_array: bool) -> NodeId {
        self.alloc(NodeEntry::detached(NodeData::Collection {
            members: IndexMap::new(),
            is_array,
        }))
    }

    pub(crate) fn alloc_annotation(&mut self, name: &str) -> NodeId {
        let mut entry = NodeEntry::detached(NodeData::Annotation {
            members: IndexMap::new(),
        });
        entry.name = Some(name.to_string());
        self.alloc(entry)
    }

    pub(crate) fn alloc_call(&mut self, function: &str) -> NodeId {
        self.alloc(NodeEntry::detached(NodeData::Call {
            function: function.to_string(),
            args: Vec::new(),
        }))
    }

    /// Allocate a detached scalar from raw literal text, classifying it.
    pub(crate) fn alloc_scalar(&mut self, raw: &str) -> NodeId {
        let kind = ValueType::classify(raw);
        self.alloc(NodeEntry::detached(NodeData::Object {
            kind,
            raw: raw.to_string(),
            formatted: OnceCell::new(),
        }))
    }

    /// Allocate a detached scalar with a known type, canonicalizing the
    /// text per the coercion-fallback policy.
    pub(crate) fn alloc_typed_scalar(&mut self, kind: ValueType, text: &str) -> NodeId {
        let raw = kind.canonicalize(text);
        self.alloc(NodeEntry::detached(NodeData::Object {
            kind,
            raw,
            formatted: OnceCell::new(),
        }))
    }

    // ---- node accessors ----

    /// The node's own name; `None` only for the document root.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.entry(id).name.as_deref()
    }

    /// Dot-joined names from the root down to this node.
    pub fn full_name(&self, id: NodeId) -> String {
        let mut names = Vec::new();
        let mut cursor = Some(id);
        while let Some(id) = cursor {
            let entry = self.entry(id);
            if let Some(name) = &entry.name {
                names.push(name.as_str());
            }
            cursor = entry.parent;
        }
        names.reverse();
        names.join(".")
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entry(id).parent
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.entry(id).data
    }

    pub fn is_collection(&self, id: NodeId) -> bool {
        matches!(self.entry(id).data, NodeData::Collection { .. })
    }

    pub fn is_array(&self, id: NodeId) -> bool {
        matches!(
            self.entry(id).data,
            NodeData::Collection { is_array: true, .. }
        )
    }

    pub fn is_scalar(&self, id: NodeId) -> bool {
        matches!(self.entry(id).data, NodeData::Object { .. })
    }

    pub fn is_annotation(&self, id: NodeId) -> bool {
        matches!(self.entry(id).data, NodeData::Annotation { .. })
    }

    pub fn is_call(&self, id: NodeId) -> bool {
        matches!(self.entry(id).data, NodeData::Call { .. })
    }

    /// The scalar type of an object node.
    pub fn value_type(&self, id: NodeId) -> Option<ValueType> {
        match &self.entry(id).data {
            NodeData::Object { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// The raw (compressed) literal text of an object node.
    pub fn raw_value(&self, id: NodeId) -> Option<&str> {
        match &self.entry(id).data {
            NodeData::Object { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// The formatted (typed, unescaped) reading of an object node, derived
    /// on first access and cached.
    pub fn formatted_value(&self, id: NodeId) -> Option<&str> {
        match &self.entry(id).data {
            NodeData::Object {
                kind,
                raw,
                formatted,
            } => Some(formatted.get_or_init(|| kind.format(raw))),
            _ => None,
        }
    }

    /// Number of members of a collection or annotation, or arguments of a
    /// call; `0` for scalars.
    pub fn len(&self, id: NodeId) -> usize {
        match &self.entry(id).data {
            NodeData::Collection { members, .. } | NodeData::Annotation { members } => {
                members.len()
            }
            NodeData::Call { args, .. } => args.len(),
            NodeData::Object { .. } => 0,
        }
    }

    pub fn is_empty(&self, id: NodeId) -> bool {
        self.len(id) == 0
    }

    /// Iterate the named members of a collection or annotation in order.
    pub fn members(&self, id: NodeId) -> impl Iterator<Item = (&str, NodeId)> + '_ {
        let members = match &self.entry(id).data {
            NodeData::Collection { members, .. } | NodeData::Annotation { members } => {
                Some(members)
            }
            _ => None,
        };
        members
            .into_iter()
            .flat_map(|m| m.iter().map(|(k, v)| (k.as_str(), *v)))
    }

    /// Child of a collection or annotation by simple member name.
    pub fn member(&self, id: NodeId, name: &str) -> Option<NodeId> {
        match &self.entry(id).data {
            NodeData::Collection { members, .. } | NodeData::Annotation { members } => {
                members.get(name).copied()
            }
            _ => None,
        }
    }

    /// Member of an array by index.
    pub fn at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.member(id, &index.to_string())
    }

    /// The function name of a call node.
    pub fn function_name(&self, id: NodeId) -> Option<&str> {
        match &self.entry(id).data {
            NodeData::Call { function, .. } => Some(function),
            _ => None,
        }
    }

    /// Arguments of a call node, in order.
    pub fn call_args(&self, id: NodeId) -> &[NodeId] {
        match &self.entry(id).data {
            NodeData::Call { args, .. } => args,
            _ => &[],
        }
    }

    /// The fully qualified function name of a call node: an embedded dot
    /// wins, otherwise a `@Namespace` annotation on the call prefixes it.
    pub fn qualified_function_name(&self, id: NodeId) -> Option<String> {
        let function = self.function_name(id)?;
        if function.contains('.') {
            return Some(function.to_string());
        }
        match self.namespace_of(id) {
            Some(ns) => Some(format!("{}.{}", ns, function)),
            None => Some(function.to_string()),
        }
    }

    pub(crate) fn namespace_of(&self, id: NodeId) -> Option<String> {
        let ann = self.annotation(id, "Namespace")?;
        let value = self.member(ann, "value")?;
        self.formatted_value(value).map(str::to_string)
    }

    // ---- annotations and comments ----

    /// Annotation nodes attached to `id`, in attachment order.
    pub fn annotations(&self, id: NodeId) -> &[NodeId] {
        &self.entry(id).annotations
    }

    /// First attached annotation with the given name.
    pub fn annotation(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.entry(id)
            .annotations
            .iter()
            .copied()
            .find(|a| self.name(*a) == Some(name))
    }

    /// All attached annotations with the given name.
    pub fn annotations_named(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        self.entry(id)
            .annotations
            .iter()
            .copied()
            .filter(|a| self.name(*a) == Some(name))
            .collect()
    }

    /// Attach a new, empty annotation to `target` and return it. Attaching
    /// to an annotation is refused: annotations carry no annotations.
    pub fn attach_annotation(&mut self, target: NodeId, name: &str) -> Option<NodeId> {
        if self.is_annotation(target) {
            return None;
        }
        let ann = self.alloc_annotation(name);
        self.entry_mut(ann).parent = Some(target);
        self.entry_mut(target).annotations.push(ann);
        Some(ann)
    }

    pub(crate) fn attach_existing_annotation(&mut self, target: NodeId, ann: NodeId) {
        self.entry_mut(ann).parent = Some(target);
        self.entry_mut(target).annotations.push(ann);
    }

    /// Detach and free every annotation on `id` with the given name.
    pub fn remove_annotations(&mut self, id: NodeId, name: &str) -> usize {
        let doomed: Vec<NodeId> = self.annotations_named(id, name);
        self.entry_mut(id)
            .annotations
            .retain(|a| !doomed.contains(a));
        let count = doomed.len();
        for ann in doomed {
            self.free_subtree(ann);
        }
        count
    }

    pub fn comments(&self, id: NodeId) -> &[Comment] {
        &self.entry(id).comments
    }

    pub fn add_comment(&mut self, id: NodeId, comment: Comment) {
        self.entry_mut(id).comments.push(comment);
    }

    pub fn clear_comments(&mut self, id: NodeId) {
        self.entry_mut(id).comments.clear();
    }

    // ---- structural mutation ----

    /// Attach a detached node under a collection or annotation member name,
    /// or as the next element of an array. Replaces (and frees) any member
    /// already holding the name. The member map and the child's own
    /// name/parent are updated together.
    pub(crate) fn insert_child(
        &mut self,
        parent: NodeId,
        name: Option<&str>,
        child: NodeId,
    ) -> NodeId {
        let effective = match &self.entry(parent).data {
            NodeData::Collection { members, is_array } => {
                if *is_array {
                    members.len().to_string()
                } else {
                    name.expect("named member required for object collection")
                        .to_string()
                }
            }
            NodeData::Annotation { .. } => name
                .expect("named member required for annotation")
                .to_string(),
            NodeData::Call { .. } => {
                return self.push_call_arg(parent, child);
            }
            NodeData::Object { .. } => panic!("scalar nodes have no members"),
        };
        let replaced = match &mut self.entry_mut(parent).data {
            NodeData::Collection { members, .. } | NodeData::Annotation { members } => {
                members.insert(effective.clone(), child)
            }
            _ => unreachable!(),
        };
        if let Some(old) = replaced {
            self.free_subtree(old);
        }
        let entry = self.entry_mut(child);
        entry.name = Some(effective);
        entry.parent = Some(parent);
        child
    }

    pub(crate) fn push_call_arg(&mut self, call: NodeId, arg: NodeId) -> NodeId {
        let index = match &mut self.entry_mut(call).data {
            NodeData::Call { args, .. } => {
                args.push(arg);
                args.len() - 1
            }
            _ => panic!("not a call node"),
        };
        let entry = self.entry_mut(arg);
        entry.name = Some(index.to_string());
        entry.parent = Some(call);
        arg
    }

    /// Remove the member `name` from `parent`, freeing its subtree. Array
    /// member names are re-numbered to stay contiguous from `0`.
    pub(crate) fn remove_child(&mut self, parent: NodeId, name: &str) -> bool {
        let (removed, is_array) = match &mut self.entry_mut(parent).data {
            NodeData::Collection { members, is_array } => {
                (members.shift_remove(name), *is_array)
            }
            NodeData::Annotation { members } => (members.shift_remove(name), false),
            _ => (None, false),
        };
        match removed {
            Some(child) => {
                self.free_subtree(child);
                if is_array {
                    self.reindex_array(parent);
                }
                true
            }
            None => false,
        }
    }

    /// Detach the member `name` from `parent` without freeing it, returning
    /// the now-parentless node.
    pub(crate) fn detach_child(&mut self, parent: NodeId, name: &str) -> Option<NodeId> {
        let (removed, is_array) = match &mut self.entry_mut(parent).data {
            NodeData::Collection { members, is_array } => {
                (members.shift_remove(name), *is_array)
            }
            NodeData::Annotation { members } => (members.shift_remove(name), false),
            _ => (None, false),
        };
        let child = removed?;
        let entry = self.entry_mut(child);
        entry.parent = None;
        if is_array {
            self.reindex_array(parent);
        }
        Some(child)
    }

    fn reindex_array(&mut self, id: NodeId) {
        let renamed: Vec<(String, NodeId)> = match &self.entry(id).data {
            NodeData::Collection { members, .. } => members
                .values()
                .enumerate()
                .map(|(i, v)| (i.to_string(), *v))
                .collect(),
            _ => return,
        };
        if let NodeData::Collection { members, .. } = &mut self.entry_mut(id).data {
            *members = renamed.iter().cloned().collect();
        }
        for (name, child) in renamed {
            self.entry_mut(child).name = Some(name);
        }
    }

    /// True when `ancestor` lies on the parent chain of `id` (or is `id`).
    pub(crate) fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.entry(current).parent;
        }
        false
    }

    fn free_subtree(&mut self, id: NodeId) {
        let entry = match self.slots[id.index()].take() {
            Some(entry) => entry,
            None => return,
        };
        match entry.data {
            NodeData::Collection { members, .. } | NodeData::Annotation { members } => {
                for child in members.values() {
                    self.free_subtree(*child);
                }
            }
            NodeData::Call { args, .. } => {
                for arg in args {
                    self.free_subtree(arg);
                }
            }
            NodeData::Object { .. } => {}
        }
        for ann in entry.annotations {
            self.free_subtree(ann);
        }
        self.free.push(id);
    }

    /// Overwrite the scalar payload of an object node, re-deriving both the
    /// raw and the cached formatted value from canonical text.
    pub(crate) fn write_scalar(&mut self, id: NodeId, kind: ValueType, text: &str) {
        let canonical = kind.canonicalize(text);
        if let NodeData::Object {
            kind: k,
            raw,
            formatted,
        } = &mut self.entry_mut(id).data
        {
            *k = kind;
            *raw = canonical;
            *formatted = OnceCell::new();
        } else {
            panic!("not a scalar node");
        }
    }

    /// Replace the document root, freeing the old root's subtree.
    pub(crate) fn set_root(&mut self, id: NodeId) {
        let old = self.root;
        self.root = id;
        self.entry_mut(id).parent = None;
        if old != id {
            self.free_subtree(old);
        }
    }

    /// Turn the root collection into an array; member names must already be
    /// contiguous indices.
    pub(crate) fn make_root_array(&mut self) {
        if let NodeData::Collection { is_array, .. } = &mut self.entry_mut(self.root).data {
            *is_array = true;
        }
    }

    /// Strip surrounding double quotes from member names, recursively.
    /// This is how JSON input maps onto the model.
    pub(crate) fn unquote_member_names(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.child_ids(id);
        let renamed: Option<Vec<(String, NodeId)>> = match &self.entry(id).data {
            NodeData::Collection { members, .. } | NodeData::Annotation { members } => Some(
                members
                    .iter()
                    .map(|(k, v)| {
                        let name = k
                            .strip_prefix('"')
                            .and_then(|n| n.strip_suffix('"'))
                            .unwrap_or(k);
                        (name.to_string(), *v)
                    })
                    .collect(),
            ),
            _ => None,
        };
        if let Some(renamed) = renamed {
            match &mut self.entry_mut(id).data {
                NodeData::Collection { members, .. } | NodeData::Annotation { members } => {
                    *members = renamed.iter().cloned().collect();
                }
                _ => {}
            }
            for (name, child) in renamed {
                self.entry_mut(child).name = Some(name);
            }
        }
        for child in children {
            self.unquote_member_names(child);
        }
    }

    // ---- copying ----

    /// Deep-copy the subtree at `id` (annotations and comments included)
    /// into a detached node of this document.
    pub fn deep_copy(&mut self, id: NodeId) -> NodeId {
        let entry = self.entry(id).clone();
        let data = match entry.data {
            NodeData::Collection { members, is_array } => {
                let copied: Vec<(String, NodeId)> = members
                    .iter()
                    .map(|(k, v)| (k.clone(), *v))
                    .collect::<Vec<_>>()
                    .into_iter()
                    .map(|(k, v)| (k, self.deep_copy(v)))
                    .collect();
                NodeData::Collection {
                    members: copied.into_iter().collect(),
                    is_array,
                }
            }
            NodeData::Annotation { members } => {
                let copied: Vec<(String, NodeId)> = members
                    .iter()
                    .map(|(k, v)| (k.clone(), *v))
                    .collect::<Vec<_>>()
                    .into_iter()
                    .map(|(k, v)| (k, self.deep_copy(v)))
                    .collect();
                NodeData::Annotation {
                    members: copied.into_iter().collect(),
                }
            }
            NodeData::Call { function, args } => {
                let args = args.into_iter().map(|a| self.deep_copy(a)).collect();
                NodeData::Call { function, args }
            }
            data @ NodeData::Object { .. } => data,
        };
        let annotations = entry
            .annotations
            .into_iter()
            .map(|a| self.deep_copy(a))
            .collect::<Vec<_>>();
        let copy = self.alloc(NodeEntry {
            name: entry.name,
            parent: None,
            annotations: Vec::new(),
            comments: entry.comments,
            data,
        });
        for child in self.child_ids(copy) {
            self.entry_mut(child).parent = Some(copy);
        }
        for ann in &annotations {
            self.entry_mut(*ann).parent = Some(copy);
        }
        self.entry_mut(copy).annotations = annotations;
        copy
    }

    fn child_ids(&self, id: NodeId) -> Vec<NodeId> {
        match &self.entry(id).data {
            NodeData::Collection { members, .. } | NodeData::Annotation { members } => {
                members.values().copied().collect()
            }
            NodeData::Call { args, .. } => args.clone(),
            NodeData::Object { .. } => Vec::new(),
        }
    }

    // ---- plain data conversion ----

    /// Convert the subtree at `id` to plain data for binding layers.
    /// Function calls appear as their call text; nothing is invoked.
    pub fn to_value(&self, id: NodeId) -> Value {
        match &self.entry(id).data {
            NodeData::Collection {
                members,
                is_array: true,
            } => Value::Array(members.values().map(|v| self.to_value(*v)).collect()),
            NodeData::Collection { members, .. } | NodeData::Annotation { members } => {
                Value::Object(
                    members
                        .iter()
                        .map(|(k, v)| (k.clone(), self.to_value(*v)))
                        .collect(),
                )
            }
            NodeData::Object { kind, raw, .. } => match kind {
                ValueType::Null => Value::Null,
                ValueType::Boolean => Value::Bool(raw == "true"),
                ValueType::Integer => Value::Integer(raw.parse().unwrap_or_default()),
                ValueType::Decimal => Value::Float(raw.parse().unwrap_or_default()),
                ValueType::String => Value::String(
                    self.formatted_value(id).unwrap_or_default().to_string(),
                ),
                ValueType::StringVar | ValueType::Unknown => Value::String(raw.clone()),
            },
            NodeData::Call { function, args } => {
                let args: Vec<String> = args
                    .iter()
                    .map(|a| match self.raw_value(*a) {
                        Some(raw) => raw.to_string(),
                        None => self.to_value(*a).to_literal(),
                    })
                    .collect();
                Value::String(format!("{}({})", function, args.join(",")))
            }
        }
    }

    // ---- structural equality ----

    pub(crate) fn node_eq(&self, a: NodeId, other: &Document, b: NodeId) -> bool {
        let ea = self.entry(a);
        let eb = other.entry(b);
        if ea.name != eb.name || ea.comments != eb.comments {
            return false;
        }
        if ea.annotations.len() != eb.annotations.len() {
            return false;
        }
        let annotations_eq = ea
            .annotations
            .iter()
            .zip(eb.annotations.iter())
            .all(|(x, y)| self.node_eq(*x, other, *y));
        if !annotations_eq {
            return false;
        }
        match (&ea.data, &eb.data) {
            (
                NodeData::Collection {
                    members: ma,
                    is_array: aa,
                },
                NodeData::Collection {
                    members: mb,
                    is_array: ab,
                },
            ) => {
                aa == ab
                    && ma.len() == mb.len()
                    && ma
                        .iter()
                        .zip(mb.iter())
                        .all(|((ka, va), (kb, vb))| {
                            ka == kb && self.node_eq(*va, other, *vb)
                        })
            }
            (NodeData::Annotation { members: ma }, NodeData::Annotation { members: mb }) => {
                ma.len() == mb.len()
                    && ma
                        .iter()
                        .zip(mb.iter())
                        .all(|((ka, va), (kb, vb))| {
                            ka == kb && self.node_eq(*va, other, *vb)
                        })
            }
            (
                NodeData::Object {
                    kind: ka, raw: ra, ..
                },
                NodeData::Object {
                    kind: kb, raw: rb, ..
                },
            ) => ka == kb && ra == rb,
            (
                NodeData::Call {
                    function: fa,
                    args: aa,
                },
                NodeData::Call {
                    function: fb,
                    args: ab,
                },
            ) => {
                fa == fb
                    && aa.len() == ab.len()
                    && aa
                        .iter()
                        .zip(ab.iter())
                        .all(|(x, y)| self.node_eq(*x, other, *y))
            }
            _ => false,
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.node_eq(self.root, other, other.root)
    }
}

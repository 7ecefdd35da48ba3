//! Single-pass parser.
//!
//! Input is first run through the [formatter](crate::formatter), after which
//! every remaining character is significant. The parser walks the text once,
//! keeping an explicit stack of open composite contexts (collections,
//! annotations, function calls) plus queues of annotations and comments
//! waiting for the node they decorate. Malformed input fails the whole
//! parse; no partial document is ever returned.

use tracing::debug;

use crate::dom::{Comment, Document, NodeId};
use crate::error::ParseError;
use crate::formatter::format;
use crate::function::FunctionResolver;
use crate::util::scan::{QuoteTracker, Step};
use crate::value::ValueType;

/// Parse SSDF text into a document.
pub fn parse(text: &str) -> Result<Document, ParseError> {
    parse_with(text, None)
}

/// Parse with a function resolver available, so that content-simple
/// functions can have their argument text captured verbatim.
pub fn parse_with(
    text: &str,
    resolver: Option<&dyn FunctionResolver>,
) -> Result<Document, ParseError> {
    let formatted = format(text);
    debug!(bytes = text.len(), formatted = formatted.len(), "parsing");
    Parser::new(resolver).run(&formatted)
}

/// Parse JSON-compatible text: double quotes around member names are
/// stripped while reading.
pub fn parse_json(text: &str) -> Result<Document, ParseError> {
    let mut doc = parse(text)?;
    let root = doc.root();
    doc.unquote_member_names(root);
    Ok(doc)
}

struct Parser<'a> {
    doc: Document,
    resolver: Option<&'a dyn FunctionResolver>,
    tracker: QuoteTracker,
    parents: Vec<NodeId>,
    temp: String,
    temp_name: Option<String>,
    saved_names: Vec<Option<String>>,
    is_val: bool,
    bare_ann: bool,
    pending_annotations: Vec<NodeId>,
    pending_comments: Vec<Comment>,
    simple_capture: bool,
    simple_depth: usize,
    root_candidate: Option<NodeId>,
    root_counter: usize,
    root_saw_named: bool,
    root_saw_unnamed: bool,
}

impl<'a> Parser<'a> {
    fn new(resolver: Option<&'a dyn FunctionResolver>) -> Self {
        let doc = Document::new();
        let root = doc.root();
        Parser {
            doc,
            resolver,
            tracker: QuoteTracker::new(),
            parents: vec![root],
            temp: String::new(),
            temp_name: None,
            saved_names: Vec::new(),
            is_val: false,
            bare_ann: false,
            pending_annotations: Vec::new(),
            pending_comments: Vec::new(),
            simple_capture: false,
            simple_depth: 0,
            root_candidate: None,
            root_counter: 0,
            root_saw_named: false,
            root_saw_unnamed: false,
        }
    }

    fn top(&self) -> NodeId {
        *self.parents.last().expect("context stack never empties")
    }

    fn at_root(&self) -> bool {
        self.parents.len() == 1
    }

    fn in_array(&self) -> bool {
        self.doc.is_array(self.top())
    }

    fn in_annotation(&self) -> bool {
        self.doc.is_annotation(self.top())
    }

    fn in_call(&self) -> bool {
        self.doc.is_call(self.top())
    }

    fn run(mut self, text: &str) -> Result<Document, ParseError> {
        let chars: Vec<char> = text.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];

            // Comments exist only outside quotes and outside verbatim
            // function arguments; the formatter already guarantees their
            // delimiters survive only there.
            if !self.tracker.in_quotes() && !self.simple_capture && c == '/' {
                match chars.get(i + 1) {
                    Some('/') => {
                        let mut j = i + 2;
                        let mut content = String::new();
                        while j < chars.len() && chars[j] != '\n' {
                            content.push(chars[j]);
                            j += 1;
                        }
                        self.pending_comments.push(Comment::with_form(content, true));
                        i = j + 1;
                        continue;
                    }
                    Some('*') => {
                        let mut j = i + 2;
                        let mut content = String::new();
                        loop {
                            match (chars.get(j), chars.get(j + 1)) {
                                (Some('*'), Some('/')) => break,
                                (Some(ch), _) => {
                                    content.push(*ch);
                                    j += 1;
                                }
                                (None, _) => return Err(ParseError::UnterminatedComment),
                            }
                        }
                        self.pending_comments
                            .push(Comment::with_form(content, false));
                        i = j + 2;
                        continue;
                    }
                    _ => {}
                }
            }

            let step = self.tracker.step(c);
            if step != Step::Other || self.tracker.in_quotes() {
                self.temp.push(c);
                i += 1;
                continue;
            }

            if self.simple_capture {
                if c == '(' {
                    self.simple_depth += 1;
                } else if c == ')' {
                    self.simple_depth -= 1;
                }
                if self.simple_depth > 0 {
                    self.temp.push(c);
                    i += 1;
                    continue;
                }
                // The matching `)`: fall through to the closing logic.
            }

            match c {
                '{' | '[' => self.open_collection(c == '[', i)?,
                '(' if self.bare_ann => self.open_annotation(i)?,
                '(' if self.is_val => self.open_call(i)?,
                '(' => {
                    return Err(ParseError::UnexpectedCharacter { found: c, at: i });
                }
                '@' => {
                    if !self.temp.is_empty() {
                        return Err(ParseError::UnexpectedCharacter { found: c, at: i });
                    }
                    self.bare_ann = true;
                }
                ' ' if self.bare_ann => {
                    let ann = self.make_annotation(i)?;
                    self.pending_annotations.push(ann);
                }
                ' ' => {}
                ':' => self.take_name(i)?,
                '=' if self.in_annotation() => self.take_name(i)?,
                ',' => {
                    self.flush_member(i)?;
                    self.is_val = self.in_array() || self.in_call();
                }
                '}' | ']' | ')' => self.close_context(c, i)?,
                _ => self.temp.push(c),
            }
            i += 1;
        }
        self.finish()
    }

    fn take_name(&mut self, at: usize) -> Result<(), ParseError> {
        if self.temp.is_empty() {
            return Err(ParseError::EmptyMemberName { at });
        }
        self.temp_name = Some(std::mem::take(&mut self.temp));
        self.is_val = true;
        Ok(())
    }

    /// Build an annotation named by the pending literal. Queued comments
    /// stay queued: they belong to the node the annotation decorates.
    fn make_annotation(&mut self, at: usize) -> Result<NodeId, ParseError> {
        if self.temp.is_empty() {
            return Err(ParseError::EmptyAnnotationName { at });
        }
        let name = std::mem::take(&mut self.temp);
        let ann = self.doc.alloc_annotation(&name);
        self.bare_ann = false;
        Ok(ann)
    }

    fn open_annotation(&mut self, at: usize) -> Result<(), ParseError> {
        let ann = self.make_annotation(at)?;
        self.pending_annotations.push(ann);
        self.parents.push(ann);
        // A name pending from `name: @Meta(...)` must not be consumed by
        // the annotation's own `x=...` members; it comes back on close.
        self.saved_names.push(self.temp_name.take());
        self.is_val = false;
        Ok(())
    }

    fn decorate(&mut self, id: NodeId) {
        // Members produced inside an annotation's argument list never take
        // the queue: the open annotation itself is still in it, waiting for
        // the node it decorates.
        if !self.doc.is_annotation(id) && !self.in_annotation() {
            let pending = std::mem::take(&mut self.pending_annotations);
            for ann in pending {
                self.doc.attach_existing_annotation(id, ann);
            }
        }
        // Annotation arguments carry no comments; anything queued keeps
        // waiting for the node the annotation decorates.
        if !self.in_annotation() {
            for comment in self.pending_comments.drain(..) {
                self.doc.add_comment(id, comment);
            }
        }
    }

    /// Note top-level content other than the single braced root: a previous
    /// root candidate turns into element `0` of an implicit array root.
    fn root_content(&mut self) {
        if let Some(candidate) = self.root_candidate.take() {
            let root = self.doc.root();
            let name = self.root_counter.to_string();
            self.root_counter += 1;
            self.doc.insert_child(root, Some(&name), candidate);
            self.root_saw_unnamed = true;
        }
    }

    /// The member name for a node produced in the current context, or the
    /// index name for unnamed members of arrays, calls and the implicit
    /// root.
    fn member_name(&mut self, at: usize) -> Result<Option<String>, ParseError> {
        if let Some(name) = self.temp_name.take() {
            if self.at_root() {
                self.root_saw_named = true;
            }
            return Ok(Some(name));
        }
        if self.in_array() || self.in_call() {
            return Ok(None);
        }
        if self.in_annotation() {
            return Ok(Some("value".to_string()));
        }
        if self.at_root() {
            let name = self.root_counter.to_string();
            self.root_counter += 1;
            self.root_saw_unnamed = true;
            return Ok(Some(name));
        }
        Err(ParseError::EmptyMemberName { at })
    }

    fn open_collection(&mut self, is_array: bool, at: usize) -> Result<(), ParseError> {
        if self.at_root() {
            if self.root_candidate.is_none()
                && self.temp_name.is_none()
                && self.temp.is_empty()
                && self.doc.is_empty(self.doc.root())
                && !self.root_saw_named
                && !self.root_saw_unnamed
            {
                // The whole document is (so far) this one braced
                // collection; it becomes the root itself.
                let candidate = self.doc.alloc_collection(is_array);
                self.decorate(candidate);
                self.root_candidate = Some(candidate);
                self.parents.push(candidate);
                self.is_val = is_array;
                return Ok(());
            }
            self.root_content();
        }
        let name = self.member_name(at)?;
        let coll = self.doc.alloc_collection(is_array);
        self.decorate(coll);
        let parent = self.top();
        self.doc.insert_child(parent, name.as_deref(), coll);
        self.parents.push(coll);
        self.is_val = is_array;
        Ok(())
    }

    fn open_call(&mut self, at: usize) -> Result<(), ParseError> {
        if self.temp.is_empty() {
            return Err(ParseError::UnexpectedCharacter { found: '(', at });
        }
        if self.at_root() {
            self.root_content();
        }
        let function = std::mem::take(&mut self.temp);
        let name = self.member_name(at)?;
        let call = self.doc.alloc_call(&function);
        self.decorate(call);
        let parent = self.top();
        self.doc.insert_child(parent, name.as_deref(), call);
        self.parents.push(call);
        self.is_val = true;
        if let Some(resolver) = self.resolver {
            let qualified = self
                .doc
                .qualified_function_name(call)
                .unwrap_or(function);
            if resolver.is_content_simple(&qualified) {
                self.simple_capture = true;
                self.simple_depth = 1;
            }
        }
        Ok(())
    }

    /// Emit the pending literal, if any, as a member of the current
    /// context. An empty trailing segment emits nothing.
    fn flush_member(&mut self, at: usize) -> Result<(), ParseError> {
        if self.temp.is_empty() {
            return Ok(());
        }
        if self.at_root() {
            self.root_content();
        }
        let raw = std::mem::take(&mut self.temp);
        let name = self.member_name(at)?;
        let scalar = if self.simple_capture {
            // Verbatim argument text of a content-simple call.
            self.doc.alloc_typed_scalar(ValueType::Unknown, &raw)
        } else {
            self.doc.alloc_scalar(&raw)
        };
        self.decorate(scalar);
        let parent = self.top();
        self.doc.insert_child(parent, name.as_deref(), scalar);
        Ok(())
    }

    fn close_context(&mut self, c: char, at: usize) -> Result<(), ParseError> {
        self.flush_member(at)?;
        if self.at_root() {
            return Err(ParseError::UnexpectedCharacter { found: c, at });
        }
        let top = self.top();
        let expected = if self.doc.is_call(top) || self.doc.is_annotation(top) {
            ')'
        } else if self.doc.is_array(top) {
            ']'
        } else {
            '}'
        };
        if c != expected {
            return Err(ParseError::MismatchedBracket {
                expected,
                found: c,
                at,
            });
        }
        if self.doc.is_call(top) {
            self.simple_capture = false;
        }
        self.parents.pop();
        if self.doc.is_annotation(top) {
            self.temp_name = self.saved_names.pop().unwrap_or(None);
        }
        self.is_val = self.in_array() || self.in_call() || self.temp_name.is_some();
        Ok(())
    }

    fn finish(mut self) -> Result<Document, ParseError> {
        if self.tracker.in_quotes() {
            return Err(ParseError::UnterminatedString);
        }
        if self.tracker.pending_escape() {
            return Err(ParseError::UnterminatedEscape);
        }
        if self.bare_ann {
            let at = self.temp.len();
            let ann = self.make_annotation(at)?;
            self.pending_annotations.push(ann);
        }
        if !self.at_root() {
            let top = self.top();
            let open = if self.doc.is_call(top) || self.doc.is_annotation(top) {
                '('
            } else if self.doc.is_array(top) {
                '['
            } else {
                '{'
            };
            return Err(ParseError::UnbalancedBracket { open });
        }
        let at = self.temp.len();
        self.flush_member(at)?;

        if let Some(candidate) = self.root_candidate.take() {
            // Nothing followed the braced collection: it is the document.
            self.doc.set_root(candidate);
        } else if self.root_saw_unnamed && !self.root_saw_named {
            self.doc.make_root_array();
        }
        // Whatever is still queued decorates the document itself.
        let root = self.doc.root();
        self.decorate(root);
        Ok(self.doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn braced_object_becomes_root() {
        let doc = parse("{a: 1, b: 2}").unwrap();
        assert_eq!(doc.get_i64("a").unwrap(), 1);
        assert_eq!(doc.get_i64("b").unwrap(), 2);
        assert_eq!(doc.name(doc.root()), None);
    }

    #[test]
    fn bare_members_form_implicit_object_root() {
        let doc = parse("a: 1, b: \"two\"").unwrap();
        assert_eq!(doc.get_i64("a").unwrap(), 1);
        assert_eq!(doc.get_str("b").unwrap(), "two");
        assert!(!doc.is_array(doc.root()));
    }

    #[test]
    fn bare_elements_form_implicit_array_root() {
        let doc = parse("1, 2, 3").unwrap();
        assert!(doc.is_array(doc.root()));
        assert_eq!(doc.get_i64("2").unwrap(), 3);
    }

    #[test]
    fn two_braced_collections_demote_into_array_root() {
        let doc = parse("{a: 1}, {b: 2}").unwrap();
        assert!(doc.is_array(doc.root()));
        assert_eq!(doc.get_i64("0.a").unwrap(), 1);
        assert_eq!(doc.get_i64("1.b").unwrap(), 2);
    }

    #[test]
    fn nested_collections_and_types() {
        let doc = parse("{a: 1, b: [true, false, null]}").unwrap();
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
    }

    #[test]
    fn annotation_attaches_to_following_member() {
        let doc = parse("@Meta(x=1) name: \"value\"").unwrap();
        let name = doc.get_node("name").unwrap();
        let ann = doc.annotation(name, "Meta").unwrap();
        assert_eq!(doc.name(ann), Some("Meta"));
        assert_eq!(doc.get_i64("name:Meta.x").unwrap(), 1);
        assert_eq!(doc.get_str("name").unwrap(), "value");
    }

    #[test]
    fn bare_annotation_has_no_members() {
        let doc = parse("@Deprecated a: 1").unwrap();
        let a = doc.get_node("a").unwrap();
        let ann = doc.annotation(a, "Deprecated").unwrap();
        assert_eq!(doc.len(ann), 0);
    }

    #[test]
    fn unnamed_annotation_member_is_called_value() {
        let doc = parse("@Since(\"1.2\") a: 1").unwrap();
        assert_eq!(doc.get_str("a:Since.value").unwrap(), "1.2");
    }

    #[test]
    fn multiple_annotations_queue_up() {
        let doc = parse("@A @B(x=2) a: 1").unwrap();
        let a = doc.get_node("a").unwrap();
        assert_eq!(doc.annotations(a).len(), 2);
        assert!(doc.annotation(a, "A").is_some());
        assert_eq!(doc.get_i64("a:B.x").unwrap(), 2);
    }

    #[test]
    fn pending_name_survives_annotation_with_arguments() {
        // The annotation sits between the member name and its value; its
        // own `x=1` member must not steal the pending name.
        let doc = parse("{name: @Meta(x=1) {a: 1}}").unwrap();
        assert_eq!(doc.get_i64("name.a").unwrap(), 1);
        assert_eq!(doc.get_i64("name:Meta.x").unwrap(), 1);
        let doc = parse("{a: @Tag(id=2) 5}").unwrap();
        assert_eq!(doc.get_i64("a").unwrap(), 5);
        assert_eq!(doc.get_i64("a:Tag.id").unwrap(), 2);
    }

    #[test]
    fn function_call_in_value_position() {
        let doc = parse("x: foo(1, 2)").unwrap();
        let x = doc.get_node("x").unwrap();
        assert!(doc.is_call(x));
        assert_eq!(doc.function_name(x), Some("foo"));
        let args = doc.call_args(x).to_vec();
        assert_eq!(args.len(), 2);
        assert_eq!(doc.raw_value(args[0]), Some("1"));
        assert_eq!(doc.raw_value(args[1]), Some("2"));
    }

    #[test]
    fn nested_call_argument() {
        let doc = parse("x: outer(inner(1), 2)").unwrap();
        let x = doc.get_node("x").unwrap();
        let args = doc.call_args(x).to_vec();
        assert_eq!(args.len(), 2);
        assert!(doc.is_call(args[0]));
        assert_eq!(doc.function_name(args[0]), Some("inner"));
    }

    #[test]
    fn comments_attach_to_next_node() {
        let doc = parse("{// heading\na: 1, /* block */ b: 2}").unwrap();
        let a = doc.get_node("a").unwrap();
        let b = doc.get_node("b").unwrap();
        assert_eq!(doc.comments(a).len(), 1);
        assert_eq!(doc.comments(a)[0].content(), " heading");
        assert!(doc.comments(a)[0].is_one_line());
        assert_eq!(doc.comments(b)[0].content(), " block ");
        assert!(!doc.comments(b)[0].is_one_line());
    }

    #[test]
    fn comment_before_annotation_lands_on_decorated_node() {
        let doc = parse("{// note\n@Meta(x=1) a: 1}").unwrap();
        let a = doc.get_node("a").unwrap();
        assert_eq!(doc.comments(a).len(), 1);
        assert_eq!(doc.comments(a)[0].content(), " note");
        let ann = doc.annotation(a, "Meta").unwrap();
        assert!(doc.comments(ann).is_empty());
    }

    #[test]
    fn quoted_text_is_opaque() {
        let doc = parse(r#"{a: "b: {1,2} // not a comment"}"#).unwrap();
        assert_eq!(doc.get_str("a").unwrap(), "b: {1,2} // not a comment");
    }

    #[test]
    fn escaped_quotes_stay_raw() {
        let doc = parse(r#"{a: "he said \"hi\""}"#).unwrap();
        let a = doc.get_node("a").unwrap();
        assert_eq!(doc.raw_value(a), Some(r#""he said \"hi\"""#));
        assert_eq!(doc.get_str("a").unwrap(), r#"he said "hi""#);
    }

    #[test]
    fn string_with_variables_keeps_kind() {
        let doc = parse(r#"{name: "sun", msg: "hello "+$this.name}"#).unwrap();
        assert_eq!(
            doc.value_type(doc.get_node("msg").unwrap()),
            Some(ValueType::StringVar)
        );
    }

    #[test]
    fn malformed_inputs_fail() {
        assert!(matches!(
            parse("{a: 1"),
            Err(ParseError::UnbalancedBracket { open: '{' })
        ));
        assert!(matches!(
            parse("{a: [1, 2}"),
            Err(ParseError::MismatchedBracket { expected: ']', .. })
        ));
        assert!(matches!(
            parse("{a: \"unterminated}"),
            Err(ParseError::UnterminatedString)
        ));
        assert!(matches!(
            parse("{a: 1}}"),
            Err(ParseError::UnexpectedCharacter { found: '}', .. })
        ));
        assert!(matches!(
            parse("{: 1}"),
            Err(ParseError::EmptyMemberName { .. })
        ));
        assert!(matches!(
            parse("{a: 1, /* open"),
            Err(ParseError::UnterminatedComment)
        ));
    }

    #[test]
    fn doc_level_annotation_lands_on_root() {
        let doc = parse("@Version(1) {a: 1}").unwrap();
        let root = doc.root();
        assert!(doc.annotation(root, "Version").is_some());
        assert_eq!(doc.get_i64("a").unwrap(), 1);
    }

    #[test]
    fn json_member_names_are_unquoted() {
        let doc = parse_json(r#"{"a": 1, "nested": {"b": [1, 2]}}"#).unwrap();
        assert_eq!(doc.get_i64("a").unwrap(), 1);
        assert_eq!(doc.get_i64("nested.b.1").unwrap(), 2);
    }

    #[test]
    fn content_simple_argument_is_captured_verbatim() {
        use crate::function::FunctionRegistry;
        use crate::value::Value;
        let mut reg = FunctionRegistry::new();
        reg.register_content_simple("calc", |args| {
            Ok(vec![Value::String(
                args[0].as_str().unwrap_or_default().to_string(),
            )])
        });
        let doc = parse_with("x: calc((1+2)*3,{4})", Some(&reg)).unwrap();
        let x = doc.get_node("x").unwrap();
        assert!(doc.is_call(x));
        let args = doc.call_args(x).to_vec();
        assert_eq!(args.len(), 1);
        assert_eq!(doc.raw_value(args[0]), Some("(1+2)*3,{4}"));
        assert_eq!(
            doc.value_type(args[0]),
            Some(ValueType::Unknown)
        );
    }
}

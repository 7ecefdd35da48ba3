//! The formatting pre-pass that runs before parsing.
//!
//! It removes insignificant whitespace so the parser can treat every
//! remaining character as meaningful. Quoted text and comment content pass
//! through untouched, and the whitespace run after a parenthesis-less
//! `@Name` collapses to a single space that terminates the annotation.

use crate::util::scan::{QuoteTracker, Step};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    /// `@` seen; `open` set once its argument parenthesis appears.
    Annotation { open: bool },
    /// A plain parenthesis (function call or nested group) inside an
    /// annotation argument list.
    Paren,
}

/// Strip insignificant whitespace from `input`.
pub fn format(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut tracker = QuoteTracker::new();
    let mut markers: Vec<Marker> = Vec::new();
    let mut pending_slash = false;
    let mut in_comment = false;
    let mut one_line = false;
    let mut star = false;

    for c in input.chars() {
        if in_comment {
            out.push(c);
            if one_line {
                if c == '\n' {
                    in_comment = false;
                }
            } else {
                if star && c == '/' {
                    in_comment = false;
                }
                star = c == '*';
            }
            continue;
        }

        let step = tracker.step(c);
        if pending_slash {
            pending_slash = false;
            if step == Step::Other && !tracker.in_quotes() && (c == '/' || c == '*') {
                out.push('/');
                out.push(c);
                in_comment = true;
                one_line = c == '/';
                star = false;
                continue;
            }
            out.push('/');
        }

        if step != Step::Other || tracker.in_quotes() {
            out.push(c);
            continue;
        }

        match c {
            '/' => {
                pending_slash = true;
            }
            '@' => {
                markers.push(Marker::Annotation { open: false });
                out.push(c);
            }
            '(' => {
                match markers.last_mut() {
                    Some(Marker::Annotation { open }) if !*open => *open = true,
                    _ => markers.push(Marker::Paren),
                }
                out.push(c);
            }
            ')' => {
                markers.pop();
                out.push(c);
            }
            c if c.is_whitespace() => {
                // A bare `@Name` has no closing parenthesis; one space marks
                // where its name ends.
                if matches!(markers.last(), Some(Marker::Annotation { open: false })) {
                    markers.pop();
                    out.push(' ');
                }
            }
            _ => out.push(c),
        }
    }
    if pending_slash {
        out.push('/');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::format;

    #[test]
    fn strips_structural_whitespace() {
        assert_eq!(format("{ a : 1 , b : 2 }"), "{a:1,b:2}");
        assert_eq!(format("[\n\t1,\n\t2\n]"), "[1,2]");
    }

    #[test]
    fn preserves_quoted_text() {
        assert_eq!(format(r#"{a: "x  y"}"#), r#"{a:"x  y"}"#);
        assert_eq!(format(r#"{a: 'it is'}"#), r#"{a:'it is'}"#);
        assert_eq!(format(r#"{a: "say \" x"}"#), r#"{a:"say \" x"}"#);
    }

    #[test]
    fn bare_annotation_keeps_one_space() {
        assert_eq!(format("@Meta   \n a: 1"), "@Meta a:1");
        assert_eq!(format("@Meta(x = 1) a: 1"), "@Meta(x=1)a:1");
    }

    #[test]
    fn nested_annotation_arguments() {
        assert_eq!(format("@A(@B  x = 1) a: 1"), "@A(@B x=1)a:1");
        assert_eq!(format("@A( foo( 1, 2 ) ) a: 1"), "@A(foo(1,2))a:1");
    }

    #[test]
    fn preserves_comments() {
        assert_eq!(format("{a: 1, // one  two\nb: 2}"), "{a:1,// one  two\nb:2}");
        assert_eq!(format("{a: 1, /* x  y */ b: 2}"), "{a:1,/* x  y */b:2}");
        assert_eq!(format(r#"{a: "no // comment"}"#), r#"{a:"no // comment"}"#);
    }

    #[test]
    fn lone_slash_survives() {
        assert_eq!(format("{a: a/b}"), "{a:a/b}");
    }
}

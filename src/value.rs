use indexmap::IndexMap;

use crate::util::scan::{QuoteTracker, Step};

/// The recognized type of a scalar literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueType {
    Null,
    Boolean,
    Integer,
    Decimal,
    String,
    /// A string assembled from `$`-variable references and `+`-joined
    /// literal pieces; resolved at render time.
    StringVar,
    Unknown,
}

impl ValueType {
    /// Classify raw literal text.
    ///
    /// Fixed words and number shapes win first; then a quote-aware scan
    /// looks for `$`-references and `+` concatenation. A concat marker left
    /// dangling at the end of input makes the whole literal `Unknown`.
    pub fn classify(text: &str) -> ValueType {
        match text {
            "null" => return ValueType::Null,
            "true" | "false" => return ValueType::Boolean,
            _ => {}
        }
        if is_integer(text) {
            return ValueType::Integer;
        }
        if is_decimal(text) {
            return ValueType::Decimal;
        }
        let quoted = is_quoted(text);

        let mut tracker = QuoteTracker::new();
        let mut in_var = false;
        let mut saw_marker = false;
        let mut dangling_concat = false;
        for c in text.chars() {
            if tracker.step(c) == Step::Other && !tracker.in_quotes() {
                if in_var {
                    if c.is_alphanumeric() || c == '_' || c == '.' {
                        // still inside the variable name
                    } else if c == '+' {
                        dangling_concat = true;
                        in_var = false;
                    } else {
                        in_var = false;
                    }
                } else {
                    if c == '+' {
                        dangling_concat = true;
                        saw_marker = true;
                    }
                    if c == '$' {
                        in_var = true;
                        saw_marker = true;
                        dangling_concat = false;
                    }
                }
            }
            if tracker.in_quotes() || c.is_ascii_digit() {
                dangling_concat = false;
            }
        }
        if saw_marker {
            if dangling_concat {
                ValueType::Unknown
            } else {
                ValueType::StringVar
            }
        } else if quoted {
            ValueType::String
        } else {
            ValueType::Unknown
        }
    }

    /// Whether `text` already is a well-formed literal of this type.
    fn matches(self, text: &str) -> bool {
        match self {
            ValueType::Null => text == "null",
            ValueType::Boolean => text == "true" || text == "false",
            ValueType::Integer => is_integer(text),
            ValueType::Decimal => is_decimal(text),
            ValueType::String => is_quoted(text),
            ValueType::StringVar | ValueType::Unknown => true,
        }
    }

    /// Repair caller-supplied text into canonical literal form for this
    /// type. This is the coercion-fallback policy of the programmatic
    /// setters; the parser never calls it.
    pub fn fix_value(self, text: &str) -> String {
        match self {
            ValueType::Null => "null".into(),
            ValueType::Boolean => "false".into(),
            ValueType::Integer => {
                let mut out = String::new();
                if text.contains('-') {
                    out.push('-');
                }
                out.extend(text.chars().filter(|c| c.is_ascii_digit()));
                if out.is_empty() || out == "-" {
                    out.push('0');
                }
                out
            }
            ValueType::Decimal => {
                let mut out = String::new();
                let mut seen_dot = false;
                if text.contains('-') {
                    out.push('-');
                }
                for c in text.chars() {
                    if c == '.' && !seen_dot {
                        out.push('.');
                        seen_dot = true;
                    } else if c.is_ascii_digit() {
                        out.push(c);
                    }
                }
                if !out.chars().any(|c| c.is_ascii_digit()) {
                    out.insert(out.len() - seen_dot as usize, '0');
                }
                out
            }
            ValueType::String => quote(text.trim()),
            ValueType::StringVar | ValueType::Unknown => text.into(),
        }
    }

    /// Canonical literal for `text`: unchanged when well formed, repaired
    /// otherwise.
    pub(crate) fn canonicalize(self, text: &str) -> String {
        if self.matches(text) {
            text.into()
        } else {
            self.fix_value(text)
        }
    }

    /// The formatted (typed, unescaped) reading of a raw literal.
    pub(crate) fn format(self, raw: &str) -> String {
        match self {
            ValueType::String if raw.len() >= 2 => unquote(raw),
            _ => raw.into(),
        }
    }

    pub(crate) fn describe(self) -> &'static str {
        match self {
            ValueType::Null => "null",
            ValueType::Boolean => "a boolean",
            ValueType::Integer => "an integer",
            ValueType::Decimal => "a decimal",
            ValueType::String => "a string",
            ValueType::StringVar => "a string with variables",
            ValueType::Unknown => "an unknown value",
        }
    }
}

fn is_integer(text: &str) -> bool {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn is_decimal(text: &str) -> bool {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    let mut parts = digits.splitn(2, '.');
    match (parts.next(), parts.next()) {
        (Some(int), Some(frac)) => {
            (!int.is_empty() || !frac.is_empty())
                && int.chars().all(|c| c.is_ascii_digit())
                && frac.chars().all(|c| c.is_ascii_digit())
        }
        _ => false,
    }
}

fn is_quoted(text: &str) -> bool {
    let mut chars = text.chars();
    match (chars.next(), text.chars().last()) {
        (Some(first), Some(last)) if text.chars().count() >= 2 => {
            (first == '"' || first == '\'') && (last == '"' || last == '\'')
        }
        _ => false,
    }
}

/// Strip one layer of quotes and undo the innermost escapes (`\"`, `\\`).
pub(crate) fn unquote(raw: &str) -> String {
    let mut chars: Vec<char> = raw.chars().collect();
    if chars.len() >= 2 {
        chars.remove(0);
        chars.pop();
    }
    let mut out = String::with_capacity(chars.len());
    let mut escaped = false;
    for c in chars {
        if !escaped && c == '\\' {
            escaped = true;
            continue;
        }
        escaped = false;
        out.push(c);
    }
    out
}

/// Wrap plain text in double quotes, escaping interior backslashes and
/// double quotes.
pub(crate) fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if c == '\\' || c == '"' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Plain data produced by (and fed to) the external function resolver, and
/// the shape of `Document::to_value` used by binding layers.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
}

macro_rules! define_as (
    ($name:ident, $t:ident, $yt:ident) => (
pub fn $name(&self) -> Option<$t> {
    match *self {
        Value::$yt(v) => Some(v),
        _ => None
    }
}
    );
);

macro_rules! define_as_ref (
    ($name:ident, $t:ty, $yt:ident) => (
pub fn $name(&self) -> Option<$t> {
    match *self {
        Value::$yt(ref v) => Some(v),
        _ => None
    }
}
    );
);

impl Value {
    define_as!(as_bool, bool, Bool);
    define_as!(as_i64, i64, Integer);
    define_as!(as_f64, f64, Float);

    define_as_ref!(as_str, &str, String);
    define_as_ref!(as_array, &Vec<Value>, Array);
    define_as_ref!(as_object, &IndexMap<String, Value>, Object);

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Array(_) | Value::Object(_))
    }

    /// The literal text this value would occupy in a document.
    pub fn to_literal(&self) -> String {
        match self {
            Value::Null => "null".into(),
            Value::Bool(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => {
                let mut s = f.to_string();
                if !s.contains('.') {
                    s.push_str(".0");
                }
                s
            }
            Value::String(s) => quote(s),
            Value::Array(_) | Value::Object(_) => String::new(),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.into())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_words_and_numbers() {
        assert_eq!(ValueType::classify("null"), ValueType::Null);
        assert_eq!(ValueType::classify("true"), ValueType::Boolean);
        assert_eq!(ValueType::classify("false"), ValueType::Boolean);
        assert_eq!(ValueType::classify("0"), ValueType::Integer);
        assert_eq!(ValueType::classify("-42"), ValueType::Integer);
        assert_eq!(ValueType::classify("+7"), ValueType::Integer);
        assert_eq!(ValueType::classify("3.25"), ValueType::Decimal);
        assert_eq!(ValueType::classify("-.5"), ValueType::Decimal);
        assert_eq!(ValueType::classify("1."), ValueType::Decimal);
        assert_eq!(ValueType::classify("1.2.3"), ValueType::Unknown);
    }

    #[test]
    fn classify_strings() {
        assert_eq!(ValueType::classify(r#""hello""#), ValueType::String);
        assert_eq!(ValueType::classify("'hello'"), ValueType::String);
        // A `$` inside quotes is literal text, not a variable.
        assert_eq!(ValueType::classify(r#""cost: $5""#), ValueType::String);
        assert_eq!(ValueType::classify("bare"), ValueType::Unknown);
    }

    #[test]
    fn classify_variables() {
        assert_eq!(ValueType::classify("$this.name"), ValueType::StringVar);
        assert_eq!(
            ValueType::classify(r#""Hello, "+$this.name"#),
            ValueType::StringVar
        );
        assert_eq!(
            ValueType::classify(r#"$main.greeting+" world""#),
            ValueType::StringVar
        );
        // Dangling concat marker at end of input.
        assert_eq!(ValueType::classify(r#""a"+"#), ValueType::Unknown);
    }

    #[test]
    fn fix_values() {
        assert_eq!(ValueType::Null.fix_value("whatever"), "null");
        assert_eq!(ValueType::Boolean.fix_value("yes"), "false");
        assert_eq!(ValueType::Integer.fix_value("12abc4"), "124");
        assert_eq!(ValueType::Integer.fix_value("x-9"), "-9");
        assert_eq!(ValueType::Integer.fix_value("junk"), "0");
        assert_eq!(ValueType::Decimal.fix_value("1.2.3"), "1.23");
        assert_eq!(ValueType::Decimal.fix_value("a-b.c"), "-0.");
        assert_eq!(ValueType::String.fix_value("plain"), r#""plain""#);
        assert_eq!(
            ValueType::String.fix_value(r#"say "hi""#),
            r#""say \"hi\"""#
        );
    }

    #[test]
    fn quote_unquote_round_trip() {
        let raw = quote(r#"he said "hi""#);
        assert_eq!(raw, r#""he said \"hi\"""#);
        assert_eq!(unquote(&raw), r#"he said "hi""#);
        assert_eq!(unquote(&quote(r"back\slash")), r"back\slash");
    }
}

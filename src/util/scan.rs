//! Quote and escape bookkeeping shared by every character-level pass.
//!
//! A backslash protects exactly the one character that follows it. The
//! protection is modeled as a two-tick countdown so that `\\"` reads as an
//! escaped backslash followed by a real, quote-toggling `"`.

/// What a character did to the scanning state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// The character was a backslash starting an escape sequence.
    StartEscape,
    /// The character toggled a quote state.
    QuoteToggle,
    /// Anything else; structural meaning is up to the caller.
    Other,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct QuoteTracker {
    in_double: bool,
    in_single: bool,
    escaped: bool,
    countdown: u8,
}

impl QuoteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&mut self, c: char) -> Step {
        if self.escaped {
            self.countdown -= 1;
            if self.countdown == 0 {
                self.escaped = false;
            }
        }
        if c == '\\' && !self.escaped {
            self.escaped = true;
            self.countdown = 2;
            return Step::StartEscape;
        }
        if c == '"' && !self.in_single && !self.escaped {
            self.in_double = !self.in_double;
            return Step::QuoteToggle;
        }
        if c == '\'' && !self.in_double && !self.escaped {
            self.in_single = !self.in_single;
            return Step::QuoteToggle;
        }
        Step::Other
    }

    pub fn in_quotes(&self) -> bool {
        self.in_double || self.in_single
    }

    /// True when the input ended right after a backslash, leaving the escape
    /// without the character it was supposed to protect.
    pub fn pending_escape(&self) -> bool {
        self.escaped && self.countdown == 2
    }
}

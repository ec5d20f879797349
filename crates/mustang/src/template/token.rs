//! Tokens and delimiters.

use crate::buffer::{Buffer, Mark};

/// The kind of a token, decided by the character after the opening delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Literal text between tags.
    Text,
    /// `{{name}}`
    Interpolation,
    /// `{{&name}}`, `{{~name}}` or `{{{name}}}`
    UnescapedInterpolation,
    /// `{{#name}}`
    SectionBegin,
    /// `{{^name}}`
    InvertedSectionBegin,
    /// `{{/name}}`
    SectionEnd,
    /// `{{! ... }}`
    Comment,
    /// `{{=<% %>=}}`
    DelimiterSwitch,
    /// `{{>name}}` or `{{@name}}`
    Partial,
    /// `{{.}}`
    Implicit,
}

impl TokenKind {
    /// Classifies a tag by its modifier character.
    ///
    /// Returns the kind and whether the modifier is consumed. The implicit
    /// marker stays part of the tag body; a plain interpolation has no
    /// modifier at all.
    pub fn from_modifier(modifier: Option<char>) -> (TokenKind, bool) {
        match modifier {
            Some('!') => (TokenKind::Comment, true),
            Some('=') => (TokenKind::DelimiterSwitch, true),
            Some('&' | '~' | '{') => (TokenKind::UnescapedInterpolation, true),
            Some('#') => (TokenKind::SectionBegin, true),
            Some('^') => (TokenKind::InvertedSectionBegin, true),
            Some('/') => (TokenKind::SectionEnd, true),
            Some('>' | '@') => (TokenKind::Partial, true),
            Some('.') => (TokenKind::Implicit, false),
            _ => (TokenKind::Interpolation, false),
        }
    }

    /// Returns true for kinds that open a section.
    pub fn opens_section(self) -> bool {
        matches!(self, TokenKind::SectionBegin | TokenKind::InvertedSectionBegin)
    }

    /// Returns true for kinds that read a name from the context.
    pub fn reads_context(self) -> bool {
        matches!(
            self,
            TokenKind::Interpolation
                | TokenKind::UnescapedInterpolation
                | TokenKind::Implicit
                | TokenKind::Partial
                | TokenKind::SectionBegin
                | TokenKind::InvertedSectionBegin
        )
    }
}

/// An open/close delimiter pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    pub open: String,
    pub close: String,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            open: "{{".to_string(),
            close: "}}".to_string(),
        }
    }
}

impl Delimiters {
    /// Creates a delimiter pair.
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    /// Parses the body of a set-delimiter tag, e.g. `"<% %>"`.
    ///
    /// The body must hold exactly two whitespace-separated delimiters, neither
    /// containing `=`.
    ///
    /// ```rust
    /// use mustang::Delimiters;
    ///
    /// assert_eq!(Delimiters::parse(" <% %> "), Some(Delimiters::new("<%", "%>")));
    /// assert_eq!(Delimiters::parse("<% = %>"), None);
    /// assert_eq!(Delimiters::parse("<%"), None);
    /// ```
    pub fn parse(body: &str) -> Option<Self> {
        let mut parts = body.split_whitespace();
        let open = parts.next()?;
        let close = parts.next()?;
        if parts.next().is_some() || open.contains('=') || close.contains('=') {
            return None;
        }
        Some(Self::new(open, close))
    }

    /// Returns true for the default `{{`/`}}` pair.
    pub fn is_default(&self) -> bool {
        self.open == "{{" && self.close == "}}"
    }
}

impl std::fmt::Display for Delimiters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.open, self.close)
    }
}

/// One structural unit of a template.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    /// The trimmed tag body (the tag's name), or the literal text.
    pub name: String,
    /// The full source text of the token, delimiters included.
    pub text: String,
    pub start: Mark,
    pub end: Mark,
    /// 1-based line the token starts on.
    pub line: usize,
    /// The new pair, on delimiter switches.
    pub delimiters: Option<Delimiters>,
    /// The matching close tag, on section openers.
    pub end_token: Option<Box<Token>>,
}

impl Token {
    /// The matching close tag, once the section has been paired.
    pub fn end_token(&self) -> Option<&Token> {
        self.end_token.as_deref()
    }

    /// Stops rebasing this token's marks, and its close tag's.
    pub fn release(&self, buffer: &mut Buffer) {
        buffer.release(self.start);
        buffer.release(self.end);
        if let Some(end) = &self.end_token {
            end.release(buffer);
        }
    }
}

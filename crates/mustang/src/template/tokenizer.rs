//! Character-level tokenizer.
//!
//! The tokenizer reads straight from the [`Buffer`] being expanded and hands
//! out one token at a time. Its cursor is a [`Mark`], so when the interpreter
//! replaces a token the cursor lands right after the replacement and the
//! output is never scanned again.
//!
//! Delimiters are passed on every call rather than stored: a set-delimiter tag
//! changes how the *following* tokens are read.

use super::token::{Delimiters, Token, TokenKind};
use crate::buffer::{Buffer, Mark, Position};
use crate::error::{RenderError, Result};
use crate::util::trim;

/// Streams tokens out of a buffer.
#[derive(Debug)]
pub struct Tokenizer {
    cursor: Mark,
    line: usize,
}

impl Tokenizer {
    /// Creates a tokenizer positioned at the start of `buffer`.
    pub fn new(buffer: &mut Buffer) -> Self {
        Self {
            cursor: buffer.mark(0),
            line: 1,
        }
    }

    /// The current read position.
    pub fn position(&self, buffer: &Buffer) -> usize {
        self.cursor.offset(buffer)
    }

    /// The line the cursor is on.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Accounts for line breaks removed from the buffer ahead of the cursor.
    pub fn add_lines(&mut self, count: usize) {
        self.line += count;
    }

    /// Reads the next token, or `None` at end of input.
    ///
    /// Malformed implicit tags are skipped and left in the buffer as they
    /// are.
    pub fn next_token(
        &mut self,
        buffer: &mut Buffer,
        delimiters: &Delimiters,
    ) -> Result<Option<Token>> {
        loop {
            let start = self.position(buffer);
            if start >= buffer.len() {
                return Ok(None);
            }

            let tag_possible = !delimiters.open.is_empty() && !delimiters.close.is_empty();
            if !tag_possible || !buffer.starts_with_at(start, &delimiters.open) {
                return Ok(Some(self.read_text(buffer, delimiters, start)));
            }

            if let Some(token) = self.read_tag(buffer, delimiters, start)? {
                return Ok(Some(token));
            }
        }
    }

    /// Collects every token from the start of the buffer.
    ///
    /// Set-delimiter tags met along the way apply to the tokens after them.
    /// The stream position is left where it was.
    pub fn tokens(&mut self, buffer: &mut Buffer, delimiters: &Delimiters) -> Result<Vec<Token>> {
        let saved = (self.position(buffer), self.line);
        buffer.set_position(self.cursor, 0);
        self.line = 1;

        let mut delimiters = delimiters.clone();
        let mut tokens = Vec::new();
        let result = loop {
            match self.next_token(buffer, &delimiters) {
                Ok(Some(token)) => {
                    if let Some(switched) = &token.delimiters {
                        delimiters = switched.clone();
                    }
                    tokens.push(token);
                }
                Ok(None) => break Ok(tokens),
                Err(err) => break Err(err),
            }
        };

        buffer.set_position(self.cursor, saved.0);
        self.line = saved.1;
        result
    }

    fn read_text(&mut self, buffer: &mut Buffer, delimiters: &Delimiters, start: usize) -> Token {
        let open = delimiters.open.as_str();
        let mut end = start;
        while let Some(c) = buffer.char_at(end) {
            if end > start && !open.is_empty() && buffer.starts_with_at(end, open) {
                break;
            }
            end += c.len_utf8();
        }

        let line = self.consume(buffer, start, end);
        let text = buffer.substring(start, end).to_string();
        Token {
            kind: TokenKind::Text,
            name: text.clone(),
            text,
            start: buffer.mark(start),
            end: buffer.mark(end),
            line,
            delimiters: None,
            end_token: None,
        }
    }

    fn read_tag(
        &mut self,
        buffer: &mut Buffer,
        delimiters: &Delimiters,
        start: usize,
    ) -> Result<Option<Token>> {
        let close = delimiters.close.as_str();
        let mut pos = start + delimiters.open.len();
        let modifier = buffer.char_at(pos);
        let (kind, consumed) = TokenKind::from_modifier(modifier);
        if consumed {
            pos += modifier.map_or(0, char::len_utf8);
        }
        // `{{{name}}}` closes on the last two of three braces
        let triple = modifier == Some('{') && close == "}}";

        let mut body = String::new();
        let end = loop {
            let Some(c) = buffer.char_at(pos) else {
                return Err(RenderError::UnclosedTag {
                    tag: buffer.substring(start, buffer.len()).to_string(),
                    line: self.line,
                });
            };
            if triple && buffer.starts_with_at(pos, "}}}") {
                pos += 1;
                continue;
            }
            if buffer.starts_with_at(pos, close) {
                break pos + close.len();
            }
            body.push(c);
            pos += c.len_utf8();
        };

        let line = self.consume(buffer, start, end);
        let text = buffer.substring(start, end).to_string();

        let (name, switched) = match kind {
            TokenKind::Implicit if body != "." => {
                trace!(tag = %text, line, "skipping malformed implicit tag");
                return Ok(None);
            }
            TokenKind::DelimiterSwitch => {
                let parsed = body
                    .strip_suffix('=')
                    .and_then(Delimiters::parse)
                    .ok_or_else(|| RenderError::InvalidDelimiters {
                        tag: text.clone(),
                        line,
                    })?;
                (parsed.to_string(), Some(parsed))
            }
            _ => (trim(&body).to_string(), None),
        };

        Ok(Some(Token {
            kind,
            name,
            text,
            start: buffer.mark(start),
            end: buffer.mark(end),
            line,
            delimiters: switched,
            end_token: None,
        }))
    }

    /// Moves the cursor to `end`, counting the line breaks passed over.
    /// Returns the line the consumed range started on.
    fn consume(&mut self, buffer: &mut Buffer, start: usize, end: usize) -> usize {
        let line = self.line;
        let mut previous = buffer.char_before(start);
        for c in buffer.substring(start, end).chars() {
            match c {
                '\r' => self.line += 1,
                '\n' if previous != Some('\r') => self.line += 1,
                _ => {}
            }
            previous = Some(c);
        }
        buffer.set_position(self.cursor, end);
        line
    }
}

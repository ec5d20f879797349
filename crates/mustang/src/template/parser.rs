//! Section pairing on top of the tokenizer.
//!
//! The parser yields the same stream as the tokenizer with two differences:
//! every section opener comes back already paired with its close tag (the
//! tokens in between are consumed), and set-delimiter tags are applied to the
//! caller's delimiters as they pass. A close tag never reaches the caller.

use super::token::{Delimiters, Token, TokenKind};
use super::tokenizer::Tokenizer;
use crate::buffer::Buffer;
use crate::error::{RenderError, Result};

/// Streams top-level tokens with sections paired.
#[derive(Debug)]
pub struct Parser {
    tokenizer: Tokenizer,
}

impl Parser {
    /// Creates a parser positioned at the start of `buffer`.
    pub fn new(buffer: &mut Buffer) -> Self {
        Self {
            tokenizer: Tokenizer::new(buffer),
        }
    }

    /// The underlying tokenizer.
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// The underlying tokenizer, for line accounting after edits.
    pub fn tokenizer_mut(&mut self) -> &mut Tokenizer {
        &mut self.tokenizer
    }

    /// Reads the next top-level token.
    ///
    /// # Errors
    ///
    /// [`RenderError::UnclosedSection`] when a section opener has no close
    /// tag, [`RenderError::UnbalancedSection`] for a close tag that matches
    /// no open section, plus any tokenizer error.
    pub fn next(
        &mut self,
        buffer: &mut Buffer,
        delimiters: &mut Delimiters,
    ) -> Result<Option<Token>> {
        let Some(mut token) = self.tokenizer.next_token(buffer, delimiters)? else {
            return Ok(None);
        };

        match token.kind {
            TokenKind::DelimiterSwitch => {
                if let Some(switched) = &token.delimiters {
                    *delimiters = switched.clone();
                }
            }
            TokenKind::SectionBegin | TokenKind::InvertedSectionBegin => {
                let end = self.find_section_end(buffer, &token, delimiters)?;
                token.end_token = Some(Box::new(end));
            }
            TokenKind::SectionEnd => {
                return Err(RenderError::UnbalancedSection {
                    tag: token.text,
                    line: token.line,
                });
            }
            _ => {}
        }

        Ok(Some(token))
    }

    /// Consumes tokens up to the close tag matching `begin`.
    ///
    /// Delimiter switches inside the section are tracked so the close tag is
    /// found however it is written. On success the caller's delimiters are
    /// the ones in effect at the close tag.
    fn find_section_end(
        &mut self,
        buffer: &mut Buffer,
        begin: &Token,
        delimiters: &mut Delimiters,
    ) -> Result<Token> {
        let mut local = delimiters.clone();
        let mut open: Vec<Token> = Vec::new();

        loop {
            let Some(token) = self.tokenizer.next_token(buffer, &local)? else {
                return Err(RenderError::UnclosedSection {
                    tag: begin.text.clone(),
                    line: begin.line,
                });
            };

            match token.kind {
                TokenKind::SectionBegin | TokenKind::InvertedSectionBegin => {
                    open.push(token);
                    continue;
                }
                TokenKind::SectionEnd => match open.pop() {
                    Some(inner) if inner.name == token.name => {
                        inner.release(buffer);
                    }
                    None if token.name == begin.name => {
                        *delimiters = local;
                        return Ok(token);
                    }
                    _ => {
                        return Err(RenderError::UnbalancedSection {
                            tag: token.text,
                            line: token.line,
                        });
                    }
                },
                TokenKind::DelimiterSwitch => {
                    if let Some(switched) = &token.delimiters {
                        local = switched.clone();
                    }
                }
                _ => {}
            }
            token.release(buffer);
        }
    }
}

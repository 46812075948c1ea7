mod nodes;
mod preamble;

use crate::ast::*;
use crate::error::{Concept, Expected, Got, ParseError, Position};
use crate::lexer::is_name_char;
use tracing::debug;

pub type ParseResult<T> = Result<T, ParseError>;

/// Strict recursive-descent parser over source characters.
///
/// Holds one character of lookahead in `cur` (`None` at end of input) and can
/// peek one further with [`lookahead`](Parser::lookahead). Fails on the first
/// malformed input; see [`parse()`].
pub struct Parser<'src> {
    source: &'src str,
    pub(super) cur: Option<char>,
    line: usize,
    col: usize,
    offset: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            cur: source.chars().next(),
            line: 1,
            col: 1,
            offset: 0,
        }
    }

    #[inline]
    pub(super) fn position(&self) -> Position {
        Position::new(self.line, self.col, self.offset)
    }

    pub(super) fn advance(&mut self) {
        if let Some(c) = self.cur {
            self.offset += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
            self.cur = self.source[self.offset..].chars().next();
        }
    }

    #[inline]
    pub(super) fn lookahead(&self) -> Option<char> {
        let mut chars = self.source[self.offset..].chars();
        chars.next();
        chars.next()
    }

    /// An error at the current position, reporting the current character.
    pub(super) fn error<I>(&self, expected: I) -> ParseError
    where
        I: IntoIterator,
        I::Item: Into<Expected>,
    {
        ParseError {
            position: self.position(),
            got: Got::from(self.cur),
            expected: expected.into_iter().map(Into::into).collect(),
            parsing: None,
            start: None,
        }
    }

    /// Skips whitespace, `;` line comments and nestable `/* */` comments.
    pub(super) fn skip(&mut self) {
        loop {
            match self.cur {
                Some(';') => self.skip_line_comment(),
                Some('/') if self.lookahead() == Some('*') => self.skip_block_comment(),
                Some('\t' | '\r' | '\n' | ' ') => self.advance(),
                _ => break,
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.cur {
            self.advance();
            if c == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) {
        let mut count = 1;

        self.advance();
        self.advance();

        while let Some(c) = self.cur {
            match (c, self.lookahead()) {
                ('/', Some('*')) => {
                    count += 1;
                    self.advance();
                    self.advance();
                }
                ('*', Some('/')) => {
                    count -= 1;
                    self.advance();
                    self.advance();
                    if count == 0 {
                        return;
                    }
                }
                _ => self.advance(),
            }
        }
    }

    /// Reads characters while `allowed` holds. The first character is
    /// taken unconditionally, so callers check it first.
    pub(super) fn parse_word(&mut self, allowed: fn(Option<char>) -> bool) -> Word {
        let start = self.position();
        let mut content = String::new();

        if let Some(c) = self.cur {
            content.push(c);
            self.advance();
        }

        while allowed(self.cur) {
            if let Some(c) = self.cur {
                content.push(c);
            }
            self.advance();
        }

        Word { content, start }
    }

    pub(super) fn parse_name(&mut self) -> ParseResult<Name> {
        if !is_name_char(self.cur) {
            return Err(self.error([Concept::Name]));
        }
        Ok(self.parse_word(is_name_char))
    }

    fn parse_file(&mut self) -> ParseResult<PreContent> {
        self.skip();

        let content = self.parse_pre_content()?;

        match self.cur {
            None => Ok(content),
            Some(_) => Err(ParseError {
                parsing: Some(Concept::File),
                ..self.error([Expected::EndOfFile])
            }),
        }
    }
}

/// Parses a whole source text into pre-content.
///
/// Returns the first syntax error encountered; partial results are never
/// returned.
pub fn parse(source: &str) -> ParseResult<PreContent> {
    debug!(bytes = source.len(), "parsing source");

    let mut parser = Parser::new(source);
    parser.parse_file()
}

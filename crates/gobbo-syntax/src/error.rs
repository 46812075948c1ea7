use std::fmt;

/// A location in source text.
///
/// `line` and `col` are 1-based and count characters; `offset` is the byte
/// offset into the source, so `&source[position.offset..]` is always valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub col: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, col: usize, offset: usize) -> Self {
        Self { line, col, offset }
    }

    /// The position of the first character of any source.
    pub fn start() -> Self {
        Self { line: 1, col: 1, offset: 0 }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Grammar concepts named in parse diagnostics, either as something the
/// parser expected or as the construct it was inside of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Concept {
    File,
    Name,
    Node,
    NodeType,
    Classes,
    Class,
    Properties,
    PropertySetting,
    PropertyValue,
    PropertyName,
    Preamble,
    PreambleElement,
    ClassDeclaration,
    DefaultDeclaration,
    EscapedText,
    EscapedTextLinePadding,
    ContentBinding,
    BoundValue,
}

impl Concept {
    pub fn display_name(&self) -> &'static str {
        match self {
            Concept::File => "file",
            Concept::Name => "name",
            Concept::Node => "node",
            Concept::NodeType => "node type",
            Concept::Classes => "classes",
            Concept::Class => "class",
            Concept::Properties => "properties",
            Concept::PropertySetting => "property setting",
            Concept::PropertyValue => "property value",
            Concept::PropertyName => "property name",
            Concept::Preamble => "preamble",
            Concept::PreambleElement => "preamble element",
            Concept::ClassDeclaration => "class declaration",
            Concept::DefaultDeclaration => "default declaration",
            Concept::EscapedText => "escaped text",
            Concept::EscapedTextLinePadding => "escaped text line padding",
            Concept::ContentBinding => "bound content",
            Concept::BoundValue => "bound value",
        }
    }
}

impl fmt::Display for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One terminal or concept the parser would have accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    Char(char),
    Keyword(&'static str),
    Concept(Concept),
    EndOfFile,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Char(c) => write!(f, "'{}'", c.escape_debug()),
            Expected::Keyword(k) => write!(f, "'{}'", k),
            Expected::Concept(c) => write!(f, "{}", c),
            Expected::EndOfFile => write!(f, "end of file"),
        }
    }
}

impl From<char> for Expected {
    fn from(c: char) -> Self {
        Expected::Char(c)
    }
}

impl From<&'static str> for Expected {
    fn from(k: &'static str) -> Self {
        Expected::Keyword(k)
    }
}

impl From<Concept> for Expected {
    fn from(c: Concept) -> Self {
        Expected::Concept(c)
    }
}

/// What the parser found instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Got {
    Char(char),
    Word(String),
    EndOfFile,
}

impl From<Option<char>> for Got {
    fn from(c: Option<char>) -> Self {
        match c {
            Some(c) => Got::Char(c),
            None => Got::EndOfFile,
        }
    }
}

impl fmt::Display for Got {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Got::Char(c) => write!(f, "'{}'", c.escape_debug()),
            Got::Word(w) => write!(f, "'{}'", w),
            Got::EndOfFile => write!(f, "end of file"),
        }
    }
}

/// The single diagnostic a failed [`parse`](crate::parse) call produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Where the offending input starts.
    pub position: Position,
    pub got: Got,
    pub expected: Vec<Expected>,
    /// The construct being parsed, if the failure happened inside one.
    pub parsing: Option<Concept>,
    /// Where that construct started.
    pub start: Option<Position>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected ")?;
        for (i, expected) in self.expected.iter().enumerate() {
            if i > 0 {
                let sep = if i + 1 == self.expected.len() { " or " } else { ", " };
                f.write_str(sep)?;
            }
            write!(f, "{}", expected)?;
        }
        write!(f, ", got {} at {}", self.got, self.position)?;

        if let Some(parsing) = self.parsing {
            write!(f, " while parsing {}", parsing)?;
            if let Some(start) = self.start {
                write!(f, " starting at {}", start)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lists_expected_terminals() {
        let err = ParseError {
            position: Position::new(1, 4, 3),
            got: Got::Char(']'),
            expected: vec![Expected::EndOfFile],
            parsing: Some(Concept::File),
            start: None,
        };

        assert_eq!(
            err.to_string(),
            "expected end of file, got ']' at 1:4 while parsing file"
        );
    }

    #[test]
    fn display_joins_alternatives() {
        let err = ParseError {
            position: Position::new(2, 1, 10),
            got: Got::Word("foo".to_string()),
            expected: vec!["cla".into(), "con".into(), "def".into()],
            parsing: Some(Concept::PreambleElement),
            start: Some(Position::new(1, 8, 7)),
        };

        assert_eq!(
            err.to_string(),
            "expected 'cla', 'con' or 'def', got 'foo' at 2:1 while parsing preamble element starting at 1:8"
        );
    }

    #[test]
    fn got_from_option() {
        assert_eq!(Got::from(None), Got::EndOfFile);
        assert_eq!(Got::from(Some('x')), Got::Char('x'));
    }
}

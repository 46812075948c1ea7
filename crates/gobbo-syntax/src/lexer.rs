use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use std::fmt;

static KEYWORDS: Lazy<FxHashMap<&'static str, Keyword>> = Lazy::new(|| {
    let mut m = FxHashMap::default();
    m.insert("cla", Keyword::Cla);
    m.insert("con", Keyword::Con);
    m.insert("def", Keyword::Def);
    m.insert("val", Keyword::Val);
    m.insert("text", Keyword::Text);
    m.insert("read", Keyword::Read);
    m.insert("include", Keyword::Include);
    m
});

/// Words with a fixed meaning either at the start of a preamble element
/// (`cla`, `con`, `def`, `val`) or at the start of a node (`con`, `val`,
/// `text`, `read`, `include`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Cla,
    Con,
    Def,
    Val,
    Text,
    Read,
    Include,
}

impl Keyword {
    pub fn lookup(word: &str) -> Option<Keyword> {
        KEYWORDS.get(word).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Cla => "cla",
            Keyword::Con => "con",
            Keyword::Def => "def",
            Keyword::Val => "val",
            Keyword::Text => "text",
            Keyword::Read => "read",
            Keyword::Include => "include",
        }
    }

    pub fn starts_preamble_element(&self) -> bool {
        matches!(self, Keyword::Cla | Keyword::Con | Keyword::Def | Keyword::Val)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `c` may appear in a name. End of input never may.
pub fn is_name_char(c: Option<char>) -> bool {
    match c {
        None => false,
        Some(c) => !(c.is_whitespace()
            || matches!(
                c,
                '`' | '\\' | '{' | '}' | '[' | ']' | '<' | '>' | '=' | '?' | '!' | '.'
            )),
    }
}

/// Whether `c` may appear in an unquoted property value.
pub fn is_property_value_char(c: Option<char>) -> bool {
    match c {
        None => false,
        Some(c) => !(c.is_whitespace() || matches!(c, '`' | '{' | '}' | '[' | ']' | '<' | '>')),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    PreambleOpen,
    PreambleClose,
    PreambleFallback,
    Keyword,
    ClassStart,
    NodeTypeName,
    BindingName,
    PropertyName,
    ChildTypeStart,
    PropertiesOpen,
    PropertiesClose,
    PropertyAssign,
    PropertyFalsify,
    PropertyValueLiteral,
    Text,
    EscapedText,
    NodeOpen,
    NodeClose,
    Comment,
    Space,
    /// A commented-out `_[...]` node.
    Ignore,
    /// Everything after the point where tokenizing gave up.
    NoParse,
}

/// A classified span of source. `end` is exclusive and both offsets are
/// byte offsets, so `text == &source[start..end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    pub text: &'src str,
    /// Nesting level of `[`/`]` pairs, starting at 1 for the outermost node.
    pub depth: Option<usize>,
}

impl Token<'_> {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

struct Unparsable;

type LexResult = Result<(), Unparsable>;

struct Lexer<'src> {
    source: &'src str,
    offset: usize,
    cur: Option<char>,
    depth: usize,
    tokens: Vec<Token<'src>>,
}

impl<'src> Lexer<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            source,
            offset: 0,
            cur: source.chars().next(),
            depth: 0,
            tokens: Vec::with_capacity(source.len() / 4),
        }
    }

    fn advance(&mut self) {
        if let Some(c) = self.cur {
            self.offset += c.len_utf8();
            self.cur = self.source[self.offset..].chars().next();
        }
    }

    fn lookahead(&self) -> Option<char> {
        let mut chars = self.source[self.offset..].chars();
        chars.next();
        chars.next()
    }

    fn push(&mut self, kind: TokenKind, start: usize, depth: Option<usize>) {
        self.tokens.push(Token {
            kind,
            start,
            end: self.offset,
            text: &self.source[start..self.offset],
            depth,
        });
    }

    /// Pushes the current character as a token of `kind` and moves past it.
    fn single(&mut self, kind: TokenKind) {
        let start = self.offset;
        self.advance();
        self.push(kind, start, None);
    }

    fn expect(&mut self, c: char, kind: TokenKind) -> LexResult {
        if self.cur == Some(c) {
            self.single(kind);
            Ok(())
        } else {
            Err(Unparsable)
        }
    }

    fn skip(&mut self) {
        loop {
            match self.cur {
                Some(';') => self.line_comment(),
                Some('/') if self.lookahead() == Some('*') => self.block_comment(),
                Some('\t' | '\r' | '\n' | ' ') => self.space(),
                _ => break,
            }
        }
    }

    fn space(&mut self) {
        let start = self.offset;
        while matches!(self.cur, Some('\t' | '\r' | '\n' | ' ')) {
            self.advance();
        }
        self.push(TokenKind::Space, start, None);
    }

    fn line_comment(&mut self) {
        let start = self.offset;
        while !matches!(self.cur, None | Some('\n')) {
            self.advance();
        }
        self.push(TokenKind::Comment, start, None);
    }

    fn block_comment(&mut self) {
        let start = self.offset;
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
                        break;
                    }
                }
                _ => self.advance(),
            }
        }

        self.push(TokenKind::Comment, start, None);
    }

    fn word(&mut self, allowed: fn(Option<char>) -> bool) -> &'src str {
        let start = self.offset;
        while allowed(self.cur) {
            self.advance();
        }
        &self.source[start..self.offset]
    }

    fn name(&mut self, kind: TokenKind) -> LexResult {
        if !is_name_char(self.cur) {
            return Err(Unparsable);
        }
        let start = self.offset;
        self.word(is_name_char);
        self.push(kind, start, None);
        Ok(())
    }

    fn escaped_text(&mut self) -> LexResult {
        let start = self.offset;
        self.advance();

        loop {
            match self.cur {
                None => return Err(Unparsable),
                Some('`') => {
                    self.advance();
                    self.push(TokenKind::EscapedText, start, None);
                    return Ok(());
                }
                Some('\\') => match self.lookahead() {
                    None => return Err(Unparsable),
                    Some('`' | '\\') => {
                        self.advance();
                        self.advance();
                    }
                    Some(_) => self.advance(),
                },
                Some(_) => self.advance(),
            }
        }
    }

    fn property_value(&mut self) -> LexResult {
        match self.cur {
            Some('<') => {
                self.single(TokenKind::PreambleOpen);
                self.skip();

                let start = self.offset;
                if self.word(is_name_char) != Keyword::Val.as_str() {
                    return Err(Unparsable);
                }
                self.push(TokenKind::Keyword, start, None);

                self.skip();
                self.name(TokenKind::BindingName)?;
                self.skip();
                self.expect('>', TokenKind::PreambleClose)
            }
            Some('`') => self.escaped_text(),
            c if is_property_value_char(c) => {
                let start = self.offset;
                self.word(is_property_value_char);
                self.push(TokenKind::PropertyValueLiteral, start, None);
                Ok(())
            }
            _ => Err(Unparsable),
        }
    }

    fn class(&mut self) -> LexResult {
        self.single(TokenKind::ClassStart);
        self.name(TokenKind::BindingName)
    }

    fn classes(&mut self) -> LexResult {
        while self.cur == Some('.') {
            self.class()?;
            self.skip();
        }
        Ok(())
    }

    fn properties(&mut self) -> LexResult {
        self.single(TokenKind::PropertiesOpen);
        self.skip();

        if self.cur == Some('=') {
            self.single(TokenKind::PropertyAssign);
            self.skip();
            self.property_value()?;
        }

        loop {
            self.skip();

            match self.cur {
                Some('}') => {
                    self.single(TokenKind::PropertiesClose);
                    return Ok(());
                }
                Some('!') => {
                    self.single(TokenKind::PropertyFalsify);
                    self.name(TokenKind::PropertyName)?;
                }
                c if is_name_char(c) => {
                    self.name(TokenKind::PropertyName)?;
                    self.skip();

                    if self.cur == Some('=') {
                        self.single(TokenKind::PropertyAssign);
                        self.skip();
                        self.property_value()?;
                    }
                }
                _ => return Err(Unparsable),
            }
        }
    }

    fn child_types(&mut self) -> LexResult {
        while self.cur == Some('\\') {
            self.single(TokenKind::ChildTypeStart);
            self.name(TokenKind::NodeTypeName)?;
        }
        Ok(())
    }

    fn type_paths(&mut self) -> LexResult {
        loop {
            self.skip();

            if self.cur == Some('\\') || is_name_char(self.cur) {
                if self.cur != Some('\\') {
                    self.name(TokenKind::NodeTypeName)?;
                }
                self.child_types()?;
            } else {
                return Ok(());
            }
        }
    }

    fn preamble_element(&mut self) -> LexResult {
        self.single(TokenKind::PreambleOpen);
        self.skip();

        if self.cur == Some('?') {
            self.single(TokenKind::PreambleFallback);
            self.skip();
        }

        let start = self.offset;
        let keyword = Keyword::lookup(self.word(is_name_char))
            .filter(Keyword::starts_preamble_element)
            .ok_or(Unparsable)?;
        self.push(TokenKind::Keyword, start, None);
        self.skip();

        match keyword {
            Keyword::Cla | Keyword::Def => {
                if keyword == Keyword::Cla {
                    if self.cur != Some('.') {
                        return Err(Unparsable);
                    }
                    self.class()?;
                }

                self.type_paths()?;
                self.classes()?;

                if self.cur == Some('{') {
                    self.properties()?;
                }
            }
            Keyword::Con => {
                self.name(TokenKind::BindingName)?;
                self.skip();

                if self.cur != Some('[') {
                    return Err(Unparsable);
                }
                self.node_open();
                self.skip();
                self.content()?;
                self.node_close()?;
            }
            _ => {
                self.name(TokenKind::BindingName)?;
                self.skip();
                self.property_value()?;
            }
        }

        self.skip();
        self.expect('>', TokenKind::PreambleClose)
    }

    fn preamble(&mut self) -> LexResult {
        while self.cur == Some('<') {
            self.preamble_element()?;
            self.skip();
        }
        Ok(())
    }

    fn node_open(&mut self) {
        self.depth += 1;
        let start = self.offset;
        self.advance();
        self.push(TokenKind::NodeOpen, start, Some(self.depth));
    }

    fn node_close(&mut self) -> LexResult {
        if self.cur != Some(']') {
            return Err(Unparsable);
        }
        let start = self.offset;
        self.advance();
        self.push(TokenKind::NodeClose, start, Some(self.depth));
        self.depth = self.depth.saturating_sub(1);
        Ok(())
    }

    fn node(&mut self) -> LexResult {
        self.node_open();
        self.skip();

        match self.cur {
            Some('<') => self.content()?,
            Some('.' | '{') => {
                self.classes_and_properties()?;
                self.text_content()?;
            }
            Some('\\') => {
                self.child_types()?;
                self.skip();
                self.classes_and_properties()?;
                self.content()?;
            }
            c if is_name_char(c) => {
                let start = self.offset;
                let keyword = Keyword::lookup(self.word(is_name_char));

                let kind = match keyword {
                    Some(Keyword::Text | Keyword::Read | Keyword::Include | Keyword::Con | Keyword::Val) => {
                        TokenKind::Keyword
                    }
                    _ => TokenKind::NodeTypeName,
                };
                self.push(kind, start, None);

                match keyword {
                    Some(Keyword::Text) => {
                        self.skip();
                        self.classes_and_properties()?;
                        self.text_content()?;
                    }
                    Some(Keyword::Read) => {
                        self.skip();
                        self.classes_and_properties()?;
                    }
                    Some(Keyword::Include) => {
                        self.skip();
                        self.classes_and_properties()?;
                        self.preamble()?;
                    }
                    Some(Keyword::Con) => {
                        self.skip();
                        self.name(TokenKind::BindingName)?;
                        self.skip();
                        self.preamble()?;
                    }
                    Some(Keyword::Val) => {
                        self.skip();
                        self.name(TokenKind::BindingName)?;
                        self.skip();
                    }
                    _ => {
                        self.child_types()?;
                        self.skip();
                        self.classes_and_properties()?;
                        self.content()?;
                    }
                }
            }
            _ => return Err(Unparsable),
        }

        self.node_close()
    }

    fn classes_and_properties(&mut self) -> LexResult {
        self.classes()?;

        if self.cur == Some('{') {
            self.properties()?;
            self.skip();
        }
        Ok(())
    }

    /// The one line of a text node. `<` and `[` are plain text here.
    fn text_content(&mut self) -> LexResult {
        loop {
            match self.cur {
                None | Some('\r' | '\n' | ']') => return Ok(()),
                Some('`') => self.escaped_text()?,
                Some('_') if self.lookahead() == Some('[') => self.ignored_node()?,
                Some(_) => self.text(),
            }
        }
    }

    /// `_[...]` collapses into a single [`TokenKind::Ignore`] token.
    fn ignored_node(&mut self) -> LexResult {
        let mark = self.tokens.len();
        let start = self.offset;
        self.advance();

        if self.node().is_err() {
            self.tokens.truncate(mark);
            return Err(Unparsable);
        }

        self.tokens.truncate(mark);
        self.push(TokenKind::Ignore, start, None);
        Ok(())
    }

    fn text(&mut self) {
        let start = self.offset;
        self.advance();

        while !matches!(
            self.cur,
            None | Some('\r' | '\n' | '`' | '[' | ']' | '_')
        ) {
            self.advance();
        }

        self.push(TokenKind::Text, start, None);
    }

    fn line(&mut self) -> LexResult {
        loop {
            match self.cur {
                None | Some('\r' | '\n' | ']') => return Ok(()),
                Some('[') => self.node()?,
                Some('`') => self.escaped_text()?,
                Some('_') if self.lookahead() == Some('[') => self.ignored_node()?,
                Some(_) => self.text(),
            }
        }
    }

    fn content(&mut self) -> LexResult {
        self.preamble()?;

        loop {
            self.skip();

            match self.cur {
                None | Some(']') => return Ok(()),
                Some(_) => self.line()?,
            }
        }
    }

    fn file(&mut self) -> LexResult {
        self.skip();
        self.content()?;

        match self.cur {
            None => Ok(()),
            Some(_) => Err(Unparsable),
        }
    }
}

/// Splits `source` into classified tokens for display.
///
/// Never fails: the returned tokens always partition `source` exactly, in
/// order. If the source cannot be tokenized, the last token is a
/// [`TokenKind::NoParse`] covering everything from the end of the previous
/// token to the end of input.
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut lexer = Lexer::new(source);

    if lexer.file().is_err() {
        let start = lexer.tokens.last().map(|t| t.end).unwrap_or(0);
        lexer.tokens.push(Token {
            kind: TokenKind::NoParse,
            start,
            end: source.len(),
            text: &source[start..],
            depth: None,
        });
    }

    lexer.tokens
}

/// Groups tokens by source line.
///
/// Tokens spanning a newline are split into per-line fragments that keep
/// their original offsets; the newline characters themselves belong to no
/// fragment, and empty fragments are dropped.
pub fn to_lines<'src>(tokens: &[Token<'src>]) -> Vec<Vec<Token<'src>>> {
    let mut lines = Vec::new();
    let mut current = Vec::new();

    for token in tokens {
        let mut start = token.start;

        for (i, fragment) in token.text.split('\n').enumerate() {
            if i > 0 {
                lines.push(std::mem::take(&mut current));
            }

            if !fragment.is_empty() {
                current.push(Token {
                    kind: token.kind,
                    start,
                    end: start + fragment.len(),
                    text: fragment,
                    depth: token.depth,
                });
            }

            start += fragment.len() + 1;
        }
    }

    lines.push(current);
    lines
}

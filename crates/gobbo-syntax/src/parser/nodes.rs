use super::{ParseResult, Parser};
use crate::ast::*;
use crate::error::{Concept, Expected, ParseError, Position};
use crate::lexer::{Keyword, is_name_char};

impl Parser<'_> {
    pub(super) fn parse_pre_content(&mut self) -> ParseResult<PreContent> {
        let preamble = self.parse_preamble_and_skip()?;
        let lines = self.parse_lines_and_skip()?;

        Ok(PreContent { preamble, lines })
    }

    fn parse_lines_and_skip(&mut self) -> ParseResult<Vec<Line>> {
        let mut lines = Vec::new();

        loop {
            self.skip();

            match self.cur {
                None | Some(']') => return Ok(lines),
                Some(_) => lines.push(self.parse_line()?),
            }
        }
    }

    fn parse_line(&mut self) -> ParseResult<Line> {
        let mut elements = Vec::new();

        loop {
            match self.cur {
                None | Some('\r' | '\n' | ']') => return Ok(elements),
                Some('[') => elements.push(LineElement::Node(self.parse_node()?)),
                Some('`') => elements.push(LineElement::Escaped(self.parse_escaped_text()?)),
                Some('_') if self.lookahead() == Some('[') => self.parse_ignored_node()?,
                Some(_) => elements.push(LineElement::Text(self.parse_text()?)),
            }
        }
    }

    /// `_[...]` must be a well-formed node but contributes nothing.
    fn parse_ignored_node(&mut self) -> ParseResult<()> {
        self.advance();
        self.parse_node().map(drop)
    }

    /// A run of text up to the end of the line, a backtick or a bracket.
    fn parse_text(&mut self) -> ParseResult<Text> {
        let start = self.position();
        let mut content = String::new();

        if let Some(c) = self.cur {
            content.push(c);
            self.advance();
        }

        loop {
            match self.cur {
                None | Some('\r' | '\n' | '`' | '[' | ']') => return Ok(Text { content, start }),
                Some('_') if self.lookahead() == Some('[') => self.parse_ignored_node()?,
                Some(c) => {
                    content.push(c);
                    self.advance();
                }
            }
        }
    }

    pub(super) fn parse_escaped_text(&mut self) -> ParseResult<EscapedText> {
        let start = self.position();
        self.advance();

        let text_start = self.position();
        let mut content = String::new();

        let unterminated = |parser: &Self| ParseError {
            parsing: Some(Concept::EscapedText),
            start: Some(start),
            ..parser.error(['`'])
        };

        loop {
            match self.cur {
                None => return Err(unterminated(&*self)),
                Some('`') => {
                    self.advance();
                    return Ok(EscapedText {
                        start,
                        text: Text {
                            content,
                            start: text_start,
                        },
                    });
                }
                Some('\\') => match self.lookahead() {
                    None => return Err(unterminated(&*self)),
                    Some(escaped @ ('`' | '\\')) => {
                        self.advance();
                        self.advance();
                        content.push(escaped);
                    }
                    Some(_) => {
                        content.push('\\');
                        self.advance();
                    }
                },
                Some('\n') => {
                    content.push('\n');
                    self.advance();

                    // Continuation lines are padded to one past the opening backtick.
                    for _ in 0..start.col {
                        if self.cur != Some(' ') {
                            return Err(self.error([Concept::EscapedTextLinePadding]));
                        }
                        self.advance();
                    }
                }
                Some(c) => {
                    content.push(c);
                    self.advance();
                }
            }
        }
    }

    pub(super) fn parse_node(&mut self) -> ParseResult<Node> {
        let start = self.position();
        self.advance();
        self.skip();

        let node = match self.cur {
            Some('<') => Node::Preamble {
                start,
                content: self.parse_pre_content()?,
            },
            Some('.' | '{') => self.parse_text_node(start, None)?,
            Some('\\') => {
                let children = self.parse_child_types()?;
                self.skip();
                self.parse_typed_node(start, TypePath::Relative { children })?
            }
            c if !is_name_char(c) => {
                return Err(ParseError {
                    parsing: Some(Concept::Node),
                    start: Some(start),
                    ..self.error([
                        Expected::Keyword("text"),
                        Expected::Keyword("read"),
                        Expected::Keyword("include"),
                        Expected::Keyword("con"),
                        Expected::Keyword("val"),
                        Expected::Concept(Concept::NodeType),
                        Expected::Concept(Concept::Classes),
                        Expected::Concept(Concept::Properties),
                        Expected::Concept(Concept::Preamble),
                    ])
                });
            }
            _ => {
                let name = self.parse_name()?;

                match Keyword::lookup(&name.content) {
                    Some(Keyword::Text) => {
                        self.skip();
                        self.parse_text_node(start, Some(name))?
                    }
                    Some(Keyword::Read) => {
                        self.skip();
                        let classes = self.parse_classes_and_skip()?;
                        let properties = self.parse_properties_and_skip()?;
                        Node::Read {
                            start,
                            classes,
                            properties,
                        }
                    }
                    Some(Keyword::Include) => {
                        self.skip();
                        let classes = self.parse_classes_and_skip()?;
                        let properties = self.parse_properties_and_skip()?;
                        let preamble = self.parse_preamble_and_skip()?;
                        Node::Include {
                            start,
                            classes,
                            properties,
                            preamble,
                        }
                    }
                    Some(Keyword::Con) => {
                        self.skip();
                        let name = self.parse_name()?;
                        self.skip();
                        let preamble = self.parse_preamble_and_skip()?;
                        Node::Content {
                            start,
                            name,
                            preamble,
                        }
                    }
                    Some(Keyword::Val) => {
                        self.skip();
                        let name = self.parse_name()?;
                        self.skip();
                        Node::Value { start, name }
                    }
                    _ => {
                        let children = self.parse_child_types()?;
                        self.skip();
                        let type_path = TypePath::Absolute {
                            global: name,
                            children,
                        };
                        self.parse_typed_node(start, type_path)?
                    }
                }
            }
        };

        if self.cur != Some(']') {
            return Err(ParseError {
                parsing: Some(Concept::Node),
                start: Some(start),
                ..self.error([']'])
            });
        }
        self.advance();

        Ok(node)
    }

    fn parse_properties_and_skip(&mut self) -> ParseResult<Option<Properties>> {
        if self.cur != Some('{') {
            return Ok(None);
        }

        let properties = self.parse_properties()?;
        self.skip();
        Ok(Some(properties))
    }

    fn parse_text_node(
        &mut self,
        start: Position,
        node_type: Option<Name>,
    ) -> ParseResult<Node> {
        let classes = self.parse_classes_and_skip()?;
        let properties = self.parse_properties_and_skip()?;

        let mut content = Vec::new();

        loop {
            match self.cur {
                None | Some('\r' | '\n' | ']') => break,
                Some('`') => content.push(TextElement::Escaped(self.parse_escaped_text()?)),
                Some('_') if self.lookahead() == Some('[') => self.parse_ignored_node()?,
                Some(_) => content.push(TextElement::Text(self.parse_text()?)),
            }
        }

        Ok(Node::Text {
            start,
            node_type,
            classes,
            properties,
            content,
        })
    }

    fn parse_typed_node(
        &mut self,
        start: Position,
        type_path: TypePath,
    ) -> ParseResult<Node> {
        let classes = self.parse_classes_and_skip()?;
        let properties = self.parse_properties_and_skip()?;
        let content = self.parse_pre_content()?;

        Ok(Node::Typed {
            start,
            type_path,
            classes,
            properties,
            content,
        })
    }
}

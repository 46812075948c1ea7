use super::{ParseResult, Parser};
use crate::ast::*;
use crate::error::{Concept, Expected, Got, ParseError};
use crate::lexer::{Keyword, is_name_char, is_property_value_char};
use smallvec::SmallVec;

const PREAMBLE_KEYWORDS: [&str; 4] = ["cla", "con", "def", "val"];

impl Parser<'_> {
    pub(super) fn parse_preamble_and_skip(&mut self) -> ParseResult<Preamble> {
        let mut preamble = Vec::new();

        while self.cur == Some('<') {
            preamble.push(self.parse_preamble_element()?);
            self.skip();
        }

        Ok(preamble)
    }

    fn parse_preamble_element(&mut self) -> ParseResult<PreambleElement> {
        let start = self.position();
        self.advance();
        self.skip();

        let mut fallback = None;

        if self.cur == Some('?') {
            fallback = Some(self.position());
            self.advance();
            self.skip();
        }

        if !is_name_char(self.cur) {
            return Err(self.error(PREAMBLE_KEYWORDS));
        }

        let word = self.parse_name()?;
        let keyword = Keyword::lookup(&word.content).filter(Keyword::starts_preamble_element);

        self.skip();

        let kind = match keyword {
            Some(Keyword::Cla) => self.parse_class_declaration()?,
            Some(Keyword::Con) => self.parse_content_binding()?,
            Some(Keyword::Def) => self.parse_default_declaration()?,
            Some(Keyword::Val) => self.parse_value_binding()?,
            _ => {
                return Err(ParseError {
                    position: word.start,
                    got: Got::Word(word.content),
                    ..self.error(PREAMBLE_KEYWORDS)
                });
            }
        };

        self.skip();

        if self.cur != Some('>') {
            return Err(ParseError {
                parsing: Some(Concept::PreambleElement),
                start: Some(start),
                ..self.error(['>'])
            });
        }
        self.advance();

        Ok(PreambleElement {
            start,
            fallback,
            kind,
        })
    }

    fn parse_class_declaration(&mut self) -> ParseResult<PreambleElementKind> {
        if self.cur != Some('.') {
            return Err(self.error([Concept::Class]));
        }

        let class = self.parse_class()?;
        self.skip();

        let type_paths = self.parse_type_paths_and_skip()?;
        let classes = self.parse_classes_and_skip()?;
        let properties = self.parse_declared_properties(&classes, Concept::ClassDeclaration)?;

        Ok(PreambleElementKind::Class {
            class,
            type_paths,
            classes,
            properties,
        })
    }

    fn parse_default_declaration(&mut self) -> ParseResult<PreambleElementKind> {
        let type_paths = self.parse_type_paths_and_skip()?;
        let classes = self.parse_classes_and_skip()?;
        let properties = self.parse_declared_properties(&classes, Concept::DefaultDeclaration)?;

        Ok(PreambleElementKind::Default {
            type_paths,
            classes,
            properties,
        })
    }

    /// A declaration needs a property block unless it names classes.
    fn parse_declared_properties(
        &mut self,
        classes: &[Class],
        parsing: Concept,
    ) -> ParseResult<Option<Properties>> {
        if self.cur == Some('{') {
            Ok(Some(self.parse_properties()?))
        } else if classes.is_empty() {
            Err(ParseError {
                parsing: Some(parsing),
                ..self.error([Concept::Classes, Concept::Properties])
            })
        } else {
            Ok(None)
        }
    }

    fn parse_content_binding(&mut self) -> ParseResult<PreambleElementKind> {
        let name = self.parse_name()?;
        self.skip();

        if self.cur != Some('[') {
            return Err(self.error(['[']));
        }
        self.advance();

        let start = self.position();
        self.skip();

        let content = self.parse_pre_content()?;

        if self.cur != Some(']') {
            return Err(ParseError {
                parsing: Some(Concept::ContentBinding),
                start: Some(start),
                ..self.error([']'])
            });
        }
        self.advance();

        Ok(PreambleElementKind::Content { name, content })
    }

    fn parse_value_binding(&mut self) -> ParseResult<PreambleElementKind> {
        let name = self.parse_name()?;
        self.skip();

        let value = self.parse_property_value()?;

        Ok(PreambleElementKind::Value { name, value })
    }

    pub(super) fn parse_class(&mut self) -> ParseResult<Class> {
        let start = self.position();
        self.advance();

        let name = self.parse_name()?;

        Ok(Class { start, name })
    }

    pub(super) fn parse_classes_and_skip(&mut self) -> ParseResult<Vec<Class>> {
        let mut classes = Vec::new();

        while self.cur == Some('.') {
            classes.push(self.parse_class()?);
            self.skip();
        }

        Ok(classes)
    }

    pub(super) fn parse_child_types(&mut self) -> ParseResult<SmallVec<[ChildType; 2]>> {
        let mut children = SmallVec::new();

        while self.cur == Some('\\') {
            let start = self.position();
            self.advance();
            let name = self.parse_name()?;
            children.push(ChildType { start, name });
        }

        Ok(children)
    }

    fn parse_type_paths_and_skip(&mut self) -> ParseResult<Vec<TypePath>> {
        let mut paths = Vec::new();

        loop {
            self.skip();

            if self.cur == Some('\\') {
                let children = self.parse_child_types()?;
                paths.push(TypePath::Relative { children });
            } else if is_name_char(self.cur) {
                let global = self.parse_name()?;
                let children = self.parse_child_types()?;
                paths.push(TypePath::Absolute { global, children });
            } else {
                return Ok(paths);
            }
        }
    }

    pub(super) fn parse_properties(&mut self) -> ParseResult<Properties> {
        let start = self.position();
        self.advance();
        self.skip();

        let mut main = None;

        if self.cur == Some('=') {
            self.advance();
            self.skip();
            main = Some(self.parse_property_value()?);
        }

        let mut other = Vec::new();

        loop {
            self.skip();

            match self.cur {
                None => {
                    return Err(ParseError {
                        parsing: Some(Concept::Properties),
                        start: Some(start),
                        ..self.error(['}'])
                    });
                }
                Some('}') => {
                    self.advance();
                    return Ok(Properties { start, main, other });
                }
                Some('!') => {
                    let flag_start = self.position();
                    self.advance();

                    if !is_name_char(self.cur) {
                        return Err(self.error([Concept::PropertyName]));
                    }

                    let name = self.parse_name()?;
                    other.push(PropertySetting::False {
                        start: flag_start,
                        name,
                    });
                }
                c if !is_name_char(c) => {
                    return Err(self.error([
                        Expected::Concept(Concept::PropertyName),
                        Expected::Char('!'),
                        Expected::Char('}'),
                    ]));
                }
                Some(_) => {
                    let name = self.parse_name()?;
                    self.skip();

                    match self.cur {
                        Some('=') => {
                            self.advance();
                            self.skip();
                            let value = self.parse_property_value()?;
                            other.push(PropertySetting::Pair { name, value });
                        }
                        Some('}' | '!') => other.push(PropertySetting::True { name }),
                        c if !is_name_char(c) => {
                            return Err(self.error([
                                Expected::Char('='),
                                Expected::Concept(Concept::PropertySetting),
                                Expected::Char('}'),
                            ]));
                        }
                        _ => other.push(PropertySetting::True { name }),
                    }
                }
            }
        }
    }

    pub(super) fn parse_property_value(&mut self) -> ParseResult<PropertyValue> {
        match self.cur {
            Some('<') => self.parse_bound_value(),
            Some('`') => Ok(PropertyValue::Escaped(self.parse_escaped_text()?)),
            c if is_property_value_char(c) => {
                Ok(PropertyValue::Literal(self.parse_word(is_property_value_char)))
            }
            _ => Err(self.error([Concept::PropertyValue])),
        }
    }

    /// `<val name>`
    fn parse_bound_value(&mut self) -> ParseResult<PropertyValue> {
        let start = self.position();
        self.advance();
        self.skip();

        if !is_name_char(self.cur) {
            return Err(ParseError {
                parsing: Some(Concept::BoundValue),
                ..self.error(["val"])
            });
        }

        let word = self.parse_name()?;

        if word.content != "val" {
            return Err(ParseError {
                position: word.start,
                got: Got::Word(word.content),
                parsing: Some(Concept::BoundValue),
                ..self.error(["val"])
            });
        }

        self.skip();
        let name = self.parse_name()?;
        self.skip();

        if self.cur != Some('>') {
            return Err(ParseError {
                parsing: Some(Concept::BoundValue),
                start: Some(start),
                ..self.error(['>'])
            });
        }
        self.advance();

        Ok(PropertyValue::Bound { start, name })
    }
}

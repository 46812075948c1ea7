//! Concrete syntax tree produced by the parser ("pre-content").
//!
//! Nothing here is resolved: type paths are still names, property values may
//! still reference bindings, and content bindings hold raw pre-content.

use crate::error::Position;
use smallvec::SmallVec;

/// A run of name characters together with where it started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub content: String,
    pub start: Position,
}

pub type Name = Word;

/// Plain text, either a run inside a line or the body of escaped text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub content: String,
    pub start: Position,
}

/// Backtick-delimited text. `start` is the opening backtick, `text.start` the
/// first character after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapedText {
    pub start: Position,
    pub text: Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Literal(Word),
    /// `<val name>`, looked up when the value is resolved.
    Bound { start: Position, name: Name },
    Escaped(EscapedText),
}

impl PropertyValue {
    pub fn start(&self) -> Position {
        match self {
            PropertyValue::Literal(word) => word.start,
            PropertyValue::Bound { start, .. } => *start,
            PropertyValue::Escaped(escaped) => escaped.start,
        }
    }
}

/// `.name`; `start` is the dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Class {
    pub start: Position,
    pub name: Name,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertySetting {
    /// `name=value`
    Pair { name: Name, value: PropertyValue },
    /// `name`
    True { name: Name },
    /// `!name`; `start` is the bang.
    False { start: Position, name: Name },
}

impl PropertySetting {
    pub fn name(&self) -> &Name {
        match self {
            PropertySetting::Pair { name, .. }
            | PropertySetting::True { name }
            | PropertySetting::False { name, .. } => name,
        }
    }
}

/// A `{...}` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Properties {
    pub start: Position,
    /// The leading `=value`, if any.
    pub main: Option<PropertyValue>,
    pub other: Vec<PropertySetting>,
}

/// `\name`; `start` is the backslash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildType {
    pub start: Position,
    pub name: Name,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypePath {
    /// `global\child\...`
    Absolute {
        global: Name,
        children: SmallVec<[ChildType; 2]>,
    },
    /// `\child\...`, never empty.
    Relative { children: SmallVec<[ChildType; 2]> },
}

impl TypePath {
    pub fn start(&self) -> Position {
        match self {
            TypePath::Absolute { global, .. } => global.start,
            TypePath::Relative { children } => children
                .first()
                .map(|child| child.start)
                .unwrap_or_default(),
        }
    }

    pub fn children(&self) -> &[ChildType] {
        match self {
            TypePath::Absolute { children, .. } | TypePath::Relative { children } => children,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreambleElement {
    /// The opening `<`.
    pub start: Position,
    /// The `?` marking a fallback element.
    pub fallback: Option<Position>,
    pub kind: PreambleElementKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreambleElementKind {
    /// `<val name value>`
    Value { name: Name, value: PropertyValue },
    /// `<con name [content]>`
    Content { name: Name, content: PreContent },
    /// `<cla .class paths... .prerequisites... {properties}>`
    Class {
        class: Class,
        type_paths: Vec<TypePath>,
        classes: Vec<Class>,
        properties: Option<Properties>,
    },
    /// `<def paths... .classes... {properties}>`
    Default {
        type_paths: Vec<TypePath>,
        classes: Vec<Class>,
        properties: Option<Properties>,
    },
}

pub type Preamble = Vec<PreambleElement>;

/// Content allowed inside a text node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextElement {
    Text(Text),
    Escaped(EscapedText),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// `[con name <preamble>...]`
    Content {
        start: Position,
        name: Name,
        preamble: Preamble,
    },
    /// `[<preamble>... content]`
    Preamble { start: Position, content: PreContent },
    /// `[val name]`
    Value { start: Position, name: Name },
    /// `[text ...]`, or implicit as `[.class ...]` / `[{...} ...]`.
    Text {
        start: Position,
        node_type: Option<Name>,
        classes: Vec<Class>,
        properties: Option<Properties>,
        content: Vec<TextElement>,
    },
    /// `[read {path}]`
    Read {
        start: Position,
        classes: Vec<Class>,
        properties: Option<Properties>,
    },
    /// `[include {path} <preamble>...]`
    Include {
        start: Position,
        classes: Vec<Class>,
        properties: Option<Properties>,
        preamble: Preamble,
    },
    Typed {
        start: Position,
        type_path: TypePath,
        classes: Vec<Class>,
        properties: Option<Properties>,
        content: PreContent,
    },
}

impl Node {
    /// Position of the opening `[`.
    pub fn start(&self) -> Position {
        match self {
            Node::Content { start, .. }
            | Node::Preamble { start, .. }
            | Node::Value { start, .. }
            | Node::Text { start, .. }
            | Node::Read { start, .. }
            | Node::Include { start, .. }
            | Node::Typed { start, .. } => *start,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineElement {
    Text(Text),
    Escaped(EscapedText),
    Node(Node),
}

impl LineElement {
    pub fn start(&self) -> Position {
        match self {
            LineElement::Text(text) => text.start,
            LineElement::Escaped(escaped) => escaped.start,
            LineElement::Node(node) => node.start(),
        }
    }
}

pub type Line = Vec<LineElement>;

/// A block: its preamble followed by its lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreContent {
    pub preamble: Preamble,
    pub lines: Vec<Line>,
}

impl PreContent {
    pub fn is_empty(&self) -> bool {
        self.preamble.is_empty() && self.lines.is_empty()
    }

    /// Content made of one line holding a single text run, as macros
    /// commonly produce.
    pub fn from_text(content: impl Into<String>, start: Position) -> Self {
        Self {
            preamble: Vec::new(),
            lines: vec![vec![LineElement::Text(Text {
                content: content.into(),
                start,
            })]],
        }
    }
}

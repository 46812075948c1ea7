//! The reified tree handed to renderers.

use crate::types::TypeId;
use gobbo_syntax::{Position, PreContent};
use rustc_hash::FxHashMap;

/// Fully resolved properties: no bindings, no classes.
pub type Properties = FxHashMap<String, String>;

/// One output line. Implicit paragraphs and main-slot nodes are built per
/// line.
pub type Line = Vec<Node>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(TextNode),
    List(ListNode),
    Map(MapNode),
}

impl Node {
    pub fn node_type(&self) -> TypeId {
        match self {
            Node::Text(node) => node.node_type,
            Node::List(node) => node.node_type,
            Node::Map(node) => node.node_type,
        }
    }

    pub fn properties(&self) -> &Properties {
        match self {
            Node::Text(node) => &node.properties,
            Node::List(node) => &node.properties,
            Node::Map(node) => &node.properties,
        }
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties().get(name).map(String::as_str)
    }

    pub fn as_text(&self) -> Option<&TextNode> {
        match self {
            Node::Text(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListNode> {
        match self {
            Node::List(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapNode> {
        match self {
            Node::Map(node) => Some(node),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    pub node_type: TypeId,
    pub properties: Properties,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListNode {
    pub node_type: TypeId,
    pub properties: Properties,
    pub content: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapNode {
    pub node_type: TypeId,
    pub properties: Properties,
    /// One entry per mapped child type, in slot order, even when empty.
    pub slots: Vec<Slot>,
}

impl MapNode {
    pub fn slot(&self, name: &str) -> Option<&[Node]> {
        self.slots
            .iter()
            .find(|slot| slot.name == name)
            .map(|slot| slot.nodes.as_slice())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub name: String,
    pub nodes: Vec<Node>,
}

/// What a macro callback receives: its resolved properties and its raw body.
#[derive(Debug, Clone)]
pub struct MacroNode {
    pub node_type: TypeId,
    pub properties: Properties,
    pub content: PreContent,
    /// The opening `[` of the macro node.
    pub start: Position,
}

impl MacroNode {
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }
}

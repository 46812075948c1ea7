//! Turns pre-content into reified lines.
//!
//! A block's preamble is folded into one environment which is then shared,
//! unchanged, by every line and nested construct in the block. Nested blocks
//! extend their own copy; nothing flows back out.

mod map;
mod paragraph;

pub(crate) use paragraph::make_paragraphs;

use crate::bail_at;
use crate::context::Environment;
use crate::error::{Error, ReifyErrorKind, from_macro_error};
use crate::node::{Line, ListNode, MacroNode, Node, TextNode};
use crate::properties::{apply_preamble, node_properties, resolve_type_path};
use crate::types::{TypeId, TypeKind};
use gobbo_syntax::{self as syntax, Class, LineElement, Position, PreContent, TextElement};
use tracing::debug;

/// Reifies `content` in `env`.
///
/// With `imply_paragraphs`, runs of paragraph-eligible nodes on each line are
/// wrapped in implicit `paragraph` nodes and every output line holds one
/// node. Without it, every source line yields an output line, even an empty
/// one.
pub fn reify(env: &Environment, content: &PreContent, imply_paragraphs: bool) -> Result<Vec<Line>, Error> {
    let env = apply_preamble(env, &content.preamble)?;
    let mut lines = Vec::with_capacity(content.lines.len());

    for pre_line in &content.lines {
        reify_line(&env, pre_line, |line| {
            lines.push(line);
            Ok(())
        })?;
    }

    if imply_paragraphs {
        lines = make_paragraphs(&env, lines);
    }

    Ok(lines)
}

/// Reifies one source line, handing finished output lines to `flush`.
///
/// An element that expands to several lines splits the current line: the
/// first expanded line ends it, inner lines pass through, and the last one
/// becomes the start of the next.
pub(crate) fn reify_line<F>(env: &Environment, pre_line: &[LineElement], mut flush: F) -> Result<(), Error>
where
    F: FnMut(Line) -> Result<(), Error>,
{
    let mut line = Line::new();

    for element in pre_line {
        let mut expanded = reify_element(env, element)?;

        match expanded.len() {
            0 => {}
            1 => line.extend(expanded.into_iter().flatten()),
            _ => {
                let last = expanded.pop().unwrap_or_default();
                let mut expanded = expanded.into_iter();

                if let Some(first) = expanded.next() {
                    line.extend(first);
                }
                flush(std::mem::take(&mut line))?;

                for inner in expanded {
                    flush(inner)?;
                }

                line = last;
            }
        }
    }

    flush(line)
}

pub(crate) fn reify_element(env: &Environment, element: &LineElement) -> Result<Vec<Line>, Error> {
    match element {
        LineElement::Text(text) => Ok(vec![vec![env.text_node(text.content.clone())]]),
        LineElement::Escaped(escaped) => Ok(vec![vec![env.text_node(escaped.text.content.clone())]]),
        LineElement::Node(node) => reify_node(env, node),
    }
}

fn reify_node(env: &Environment, node: &syntax::Node) -> Result<Vec<Line>, Error> {
    match node {
        syntax::Node::Text {
            classes,
            properties,
            content,
            ..
        } => {
            let node_type = env.registry().text();
            let content = content
                .iter()
                .map(|element| match element {
                    TextElement::Text(text) => text.content.as_str(),
                    TextElement::Escaped(escaped) => escaped.text.content.as_str(),
                })
                .collect::<String>();

            let properties = node_properties(env, node_type, classes, properties.as_ref())?;

            Ok(vec![vec![Node::Text(TextNode {
                node_type,
                properties,
                content,
            })]])
        }
        syntax::Node::Include {
            start,
            classes,
            properties,
            preamble,
        } => {
            let props = node_properties(env, env.registry().include(), classes, properties.as_ref())?;

            let path = match props.get("path").filter(|path| !path.is_empty()) {
                Some(path) => path,
                None => bail_at!(env, ReifyErrorKind::MissingPath, *start),
            };

            let info = env
                .reader()
                .read(env.current_file_path(), path)
                .map_err(|error| Error::Read {
                    position: *start,
                    error,
                })?;

            debug!(from = %env.current_file_path(), path = %info.absolute_path, "including file");

            let content = gobbo_syntax::parse(&info.content).map_err(|error| Error::Parse {
                path: info.absolute_path.clone(),
                position: *start,
                error,
            })?;

            let included = env.enter_include(&info.absolute_path, *start)?;
            let included = apply_preamble(&included, preamble)?;

            reify(&included, &content, false)
        }
        syntax::Node::Read {
            start,
            classes,
            properties,
        } => {
            let props = node_properties(env, env.registry().read(), classes, properties.as_ref())?;
            let path = props.get("path").map(String::as_str).unwrap_or_default();

            let info = env
                .reader()
                .read(env.current_file_path(), path)
                .map_err(|error| Error::Read {
                    position: *start,
                    error,
                })?;

            debug!(from = %env.current_file_path(), path = %info.absolute_path, bytes = info.content.len(), "read file");

            Ok(vec![vec![env.text_node(info.content)]])
        }
        syntax::Node::Preamble { content, .. } => reify(env, content, false),
        syntax::Node::Content { name, preamble, .. } => {
            let Some(content) = env.content(&name.content) else {
                bail_at!(
                    env,
                    ReifyErrorKind::UnboundContent {
                        name: name.content.clone()
                    },
                    name.start
                );
            };

            let inner = apply_preamble(env, preamble)?;
            reify(&inner, content, false)
        }
        syntax::Node::Value { name, .. } => match env.value(&name.content) {
            Some(value) => Ok(vec![vec![env.text_node(value)]]),
            None => bail_at!(
                env,
                ReifyErrorKind::UnboundValue {
                    name: name.content.clone()
                },
                name.start
            ),
        },
        syntax::Node::Typed {
            start,
            type_path,
            classes,
            properties,
            content,
        } => {
            let node_type = resolve_type_path(env, type_path)?;
            reify_typed(env, node_type, *start, classes, properties.as_ref(), content)
        }
    }
}

fn reify_typed(
    env: &Environment,
    node_type: TypeId,
    start: Position,
    classes: &[Class],
    properties: Option<&syntax::Properties>,
    content: &PreContent,
) -> Result<Vec<Line>, Error> {
    let registry = env.registry();

    match &registry[node_type].kind {
        TypeKind::PreMacro(expand) => {
            let node = macro_node(env, node_type, start, classes, properties, content)?;
            debug!(macro_type = %registry.qualified_name(node_type), "expanding pre macro");

            let expansion = expand(env, &node).map_err(|err| from_macro_error(err, start, env))?;
            reify(env, &expansion, false)
        }
        TypeKind::PostMacro(expand) => {
            let node = macro_node(env, node_type, start, classes, properties, content)?;
            debug!(macro_type = %registry.qualified_name(node_type), "expanding post macro");

            expand(env, &node).map_err(|err| from_macro_error(err, start, env))
        }
        TypeKind::List(list) => {
            let inner = env.with_current_node_type(node_type);
            let children: Vec<Node> = reify(&inner, content, list.contains_paragraphs)?
                .into_iter()
                .flatten()
                .collect();

            if node_type == registry.paragraph() {
                if let Some(child) = children
                    .iter()
                    .find(|child| !registry[child.node_type()].in_paragraph())
                {
                    bail_at!(
                        env,
                        ReifyErrorKind::NotInParagraph {
                            node_type: registry.qualified_name(child.node_type())
                        },
                        start
                    );
                }
            }

            let properties = node_properties(&inner, node_type, classes, properties)?;

            Ok(vec![vec![Node::List(ListNode {
                node_type,
                properties,
                content: children,
            })]])
        }
        TypeKind::Map(map) => {
            let inner = env.with_current_node_type(node_type);
            let node = map::reify_map(&inner, node_type, map, classes, properties, content)?;
            Ok(vec![vec![node]])
        }
        TypeKind::Text | TypeKind::Misc => bail_at!(
            env,
            ReifyErrorKind::UnexpectedNodeType {
                node_type: registry.qualified_name(node_type)
            },
            start
        ),
    }
}

fn macro_node(
    env: &Environment,
    node_type: TypeId,
    start: Position,
    classes: &[Class],
    properties: Option<&syntax::Properties>,
    content: &PreContent,
) -> Result<MacroNode, Error> {
    Ok(MacroNode {
        node_type,
        properties: node_properties(env, node_type, classes, properties)?,
        content: content.clone(),
        start,
    })
}

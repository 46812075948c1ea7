use super::{make_paragraphs, reify_element, reify_line};
use crate::bail_at;
use crate::context::Environment;
use crate::error::{Error, ReifyErrorKind};
use crate::node::{Line, ListNode, MapNode, Node, Slot};
use crate::properties::{apply_preamble, node_properties};
use crate::types::{MainSlot, MapType, SlotMode, TypeId};
use gobbo_syntax::{self as syntax, Class, PreContent};

/// Reifies a map node. `env` already has the map as its current node type.
pub(super) fn reify_map(
    env: &Environment,
    node_type: TypeId,
    map: &MapType,
    classes: &[Class],
    properties: Option<&syntax::Properties>,
    content: &PreContent,
) -> Result<Node, Error> {
    let registry = env.registry();
    let inner = apply_preamble(env, &content.preamble)?;

    let mut slots: Vec<Slot> = map
        .mapped
        .iter()
        .map(|child| Slot {
            name: registry[*child].name.clone(),
            nodes: Vec::new(),
        })
        .collect();

    match map.main_slot {
        Some(MainSlot {
            child,
            mode: SlotMode::WholeBlock,
        }) => {
            let mut leftover: Vec<Line> = Vec::new();

            for pre_line in &content.lines {
                reify_line(&inner, pre_line, |line| {
                    let rest = route(map, &mut slots, line);
                    if !rest.is_empty() {
                        leftover.push(rest);
                    }
                    Ok(())
                })?;
            }

            if !leftover.is_empty() {
                let node = implicit_node(&inner, child, leftover);
                push(map, &mut slots, child, node);
            }
        }
        Some(MainSlot {
            child,
            mode: SlotMode::PerLine,
        }) => {
            for pre_line in &content.lines {
                reify_line(&inner, pre_line, |line| {
                    let rest = route(map, &mut slots, line);
                    if !rest.is_empty() {
                        let node = implicit_node(&inner, child, vec![rest]);
                        push(map, &mut slots, child, node);
                    }
                    Ok(())
                })?;
            }
        }
        None => {
            for element in content.lines.iter().flatten() {
                for node in reify_element(&inner, element)?.into_iter().flatten() {
                    if map.is_mapped(node.node_type()) {
                        push(map, &mut slots, node.node_type(), node);
                    } else {
                        bail_at!(
                            env,
                            ReifyErrorKind::NoMainSlot {
                                node_type: registry.qualified_name(node_type)
                            },
                            element.start()
                        );
                    }
                }
            }
        }
    }

    let properties = node_properties(env, node_type, classes, properties)?;

    Ok(Node::Map(MapNode {
        node_type,
        properties,
        slots,
    }))
}

/// Moves nodes of mapped types into their slots and returns the rest.
fn route(map: &MapType, slots: &mut [Slot], line: Line) -> Line {
    let mut rest = Line::new();

    for node in line {
        if map.is_mapped(node.node_type()) {
            push(map, slots, node.node_type(), node);
        } else {
            rest.push(node);
        }
    }

    rest
}

fn push(map: &MapType, slots: &mut [Slot], child: TypeId, node: Node) {
    if let Some(idx) = map.mapped.iter().position(|mapped| *mapped == child) {
        slots[idx].nodes.push(node);
    }
}

/// The main-slot node holding implicit content.
fn implicit_node(env: &Environment, child: TypeId, lines: Vec<Line>) -> Node {
    let contains_paragraphs = env.registry()[child]
        .as_list()
        .is_some_and(|list| list.contains_paragraphs);

    let lines = if contains_paragraphs {
        make_paragraphs(env, lines)
    } else {
        lines
    };

    Node::List(ListNode {
        node_type: child,
        properties: env.apply_defaults(child),
        content: lines.into_iter().flatten().collect(),
    })
}

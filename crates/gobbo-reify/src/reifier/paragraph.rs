use crate::context::Environment;
use crate::node::{Line, ListNode, Node};

/// Wraps each run of paragraph-eligible nodes in a line into an implicit
/// `paragraph` node. Every paragraph and every other node ends up on a line
/// of its own.
pub(crate) fn make_paragraphs(env: &Environment, lines: Vec<Line>) -> Vec<Line> {
    let registry = env.registry();
    let paragraph = registry.paragraph();
    let mut out = Vec::with_capacity(lines.len());

    let flush = |run: &mut Vec<Node>, out: &mut Vec<Line>| {
        if !run.is_empty() {
            out.push(vec![Node::List(ListNode {
                node_type: paragraph,
                properties: env.apply_defaults(paragraph),
                content: std::mem::take(run),
            })]);
        }
    };

    for line in lines {
        let mut run = Vec::new();

        for node in line {
            if registry[node.node_type()].in_paragraph() {
                run.push(node);
            } else {
                flush(&mut run, &mut out);
                out.push(vec![node]);
            }
        }

        flush(&mut run, &mut out);
    }

    out
}

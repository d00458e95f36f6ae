//! DOT source generation.
//!
//! Builds a left-to-right Graphviz graph from a [`DiagramSpec`]: one node per
//! listed service in order, grouped into a cluster per category, with an edge
//! between each pair of consecutive services.

use std::fmt::Write;

use crate::catalog::{self, Category, Component};
use crate::diagram::DiagramSpec;
use crate::error::RenderError;

struct Node {
    id: String,
    component: Component,
}

/// Compile a spec into Graphviz DOT source.
///
/// Fails with [`RenderError::EmptyDiagram`] when no services are listed and
/// with [`RenderError::UnknownComponent`] for the first name that is not in
/// the catalog.
pub fn compile_dot(spec: &DiagramSpec) -> Result<String, RenderError> {
    if spec.services.is_empty() {
        return Err(RenderError::EmptyDiagram);
    }

    let nodes = spec
        .services
        .iter()
        .enumerate()
        .map(|(index, name)| {
            catalog::lookup(name)
                .map(|component| Node {
                    id: format!("n{index}"),
                    component,
                })
                .ok_or_else(|| RenderError::UnknownComponent(name.trim().to_owned()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Clusters in order of first appearance.
    let mut clusters: Vec<(Category, Vec<&Node>)> = Vec::new();
    for node in &nodes {
        let category = node.component.category;
        match clusters.iter_mut().find(|(c, _)| *c == category) {
            Some((_, members)) => members.push(node),
            None => clusters.push((category, vec![node])),
        }
    }

    let mut dot = String::with_capacity(256 + nodes.len() * 96);
    dot.push_str("digraph architecture {\n");
    dot.push_str("  graph [rankdir=LR, fontname=\"Helvetica\", fontsize=20, pad=0.5, nodesep=0.6, ranksep=0.9");
    let title = spec.description.trim();
    if !title.is_empty() {
        let _ = write!(dot, ", label=\"{}\", labelloc=t", escape(title));
    }
    dot.push_str("];\n");
    dot.push_str("  node [fontname=\"Helvetica\", fontsize=12, fontcolor=\"#FFFFFF\", style=\"filled,rounded\", margin=\"0.3,0.15\"];\n");
    dot.push_str("  edge [color=\"#7B8894\", arrowsize=0.8];\n");

    for (category, members) in &clusters {
        let _ = writeln!(dot, "\n  subgraph cluster_{} {{", category.id());
        let _ = writeln!(
            dot,
            "    label=\"{}\"; style=\"rounded,dashed\"; color=\"#AAB7B8\"; fontsize=14;",
            category.label()
        );
        for node in members {
            let _ = writeln!(
                dot,
                "    {} [label=\"{}\", shape={}, fillcolor=\"{}\"];",
                node.id,
                escape(node.component.name),
                category.shape(),
                category.fill_color()
            );
        }
        dot.push_str("  }\n");
    }

    if nodes.len() > 1 {
        dot.push('\n');
        for pair in nodes.windows(2) {
            let _ = writeln!(dot, "  {} -> {};", pair[0].id, pair[1].id);
        }
    }

    dot.push_str("}\n");
    Ok(dot)
}

/// Escape a value for a double-quoted DOT string.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

//! Node-per-block, edge-per-link view of a chain snapshot.

use std::fmt::Write as _;

use serde::Serialize;

use crate::{
    block::Block,
    constants::{GRAPH_DATA_PREVIEW, GRAPH_HASH_PREVIEW},
};

const GENESIS_FILL: &str = "#fff9c4";
const BLOCK_FILL: &str = "#e1f5fe";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub index: u64,
    pub nonce: u64,
    pub data_preview: String,
    pub genesis: bool,
}

impl GraphNode {
    pub fn label(&self) -> String {
        format!(
            "Block #{}\nNonce: {}\nData: {}",
            self.index, self.nonce, self.data_preview
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub from: u64,
    pub to: u64,
    pub hash_preview: String,
}

impl GraphEdge {
    pub fn label(&self) -> String {
        format!("Prev hash:\n{}...", self.hash_preview)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LinkGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl LinkGraph {
    pub fn from_blocks(blocks: &[Block]) -> Self {
        let nodes = blocks
            .iter()
            .enumerate()
            .map(|(i, b)| GraphNode {
                index: b.index,
                nonce: b.nonce,
                data_preview: preview(&b.data, GRAPH_DATA_PREVIEW),
                genesis: i == 0,
            })
            .collect();
        let edges = blocks
            .windows(2)
            .map(|pair| GraphEdge {
                from: pair[0].index,
                to: pair[1].index,
                hash_preview: pair[1].previous_hash.chars().take(GRAPH_HASH_PREVIEW).collect(),
            })
            .collect();
        Self { nodes, edges }
    }

    /// Graphviz rendering, left to right.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph chain {\n    rankdir=LR;\n");
        for node in &self.nodes {
            let fill = if node.genesis { GENESIS_FILL } else { BLOCK_FILL };
            let _ = writeln!(
                out,
                "    \"{}\" [label=\"{}\", shape=box, style=filled, fillcolor=\"{}\"];",
                node.index,
                escape_dot(&node.label()),
                fill
            );
        }
        for edge in &self.edges {
            let _ = writeln!(
                out,
                "    \"{}\" -> \"{}\" [label=\"{}\"];",
                edge.from,
                edge.to,
                escape_dot(&edge.label())
            );
        }
        out.push_str("}\n");
        out
    }

    /// One-line terminal rendering: `[#0 n=0 Genesis Block] --(3fa2c1)--> [#1 ...]`.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                match self.edges.get(i - 1) {
                    Some(edge) => {
                        let _ = write!(out, " --({})--> ", edge.hash_preview);
                    }
                    None => out.push_str(" --> "),
                }
            }
            let _ = write!(
                out,
                "[#{} n={} {}]",
                node.index, node.nonce, node.data_preview
            );
        }
        out
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn escape_dot(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimestampMode;

    fn blocks() -> Vec<Block> {
        let genesis = Block::new(0, 0, "Genesis Block", "0", TimestampMode::Excluded);
        let one = Block::new(
            1,
            0,
            "Alice pays Bob 10 tokens for the \"bond\"",
            genesis.hash.clone(),
            TimestampMode::Excluded,
        );
        vec![genesis, one]
    }

    #[test]
    fn graph_shape_example() {
        let blocks = blocks();
        let graph = LinkGraph::from_blocks(&blocks);
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert!(graph.nodes[0].genesis);
        assert!(!graph.nodes[1].genesis);
        assert_eq!(graph.nodes[0].data_preview, "Genesis Block");
        assert_eq!(graph.nodes[1].data_preview, "Alice pays Bob ...");
        assert_eq!(graph.edges[0].from, 0);
        assert_eq!(graph.edges[0].to, 1);
        assert_eq!(graph.edges[0].hash_preview, &blocks[0].hash[..6]);
    }

    #[test]
    fn empty_graph() {
        let graph = LinkGraph::from_blocks(&[]);
        assert!(graph.nodes.is_empty());
        assert!(graph.edges.is_empty());
        assert_eq!(graph.to_text(), "");
    }

    #[test]
    fn dot_rendering_example() {
        let blocks = blocks();
        let dot = LinkGraph::from_blocks(&blocks).to_dot();
        assert!(dot.starts_with("digraph chain {\n    rankdir=LR;\n"));
        assert!(dot.contains(
            "\"0\" [label=\"Block #0\\nNonce: 0\\nData: Genesis Block\", shape=box, style=filled, fillcolor=\"#fff9c4\"];"
        ));
        assert!(dot.contains("fillcolor=\"#e1f5fe\""));
        assert!(dot.contains(&format!(
            "\"0\" -> \"1\" [label=\"Prev hash:\\n{}...\"];",
            &blocks[0].hash[..6]
        )));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn dot_escapes_quotes() {
        let mut blocks = blocks();
        blocks[1].data = "say \"hi\"".into();
        let dot = LinkGraph::from_blocks(&blocks).to_dot();
        assert!(dot.contains("Data: say \\\"hi\\\""));
    }

    #[test]
    fn text_rendering_example() {
        let blocks = blocks();
        let text = LinkGraph::from_blocks(&blocks).to_text();
        assert_eq!(
            text,
            format!(
                "[#0 n=0 Genesis Block] --({})--> [#1 n=0 Alice pays Bob ...]",
                &blocks[0].hash[..6]
            )
        );
    }

    #[test]
    fn preview_counts_chars_not_bytes() {
        assert_eq!(preview("Transação Inicial de teste", 10), "Transação ...");
        assert_eq!(preview("curto", 10), "curto");
    }
}

//! Character relationship graph, rendered as a Mermaid flowchart.

use std::collections::HashMap;
use std::fmt::Write;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::types::{Character, Relationship};

/// Characters shown in a rendered diagram.
pub const MAX_DIAGRAM_NODES: usize = 10;

/// Diagram emitted when there are no characters to draw.
pub const EMPTY_DIAGRAM: &str = "graph TD\n  A[No relationship data]";

/// A character node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterNode {
    pub name: String,
    pub count: i64,
}

/// Undirected graph of the most frequent characters and the labelled
/// relationships between them.
pub struct RelationshipGraph {
    graph: UnGraph<CharacterNode, String>,
    node_index: HashMap<String, NodeIndex>,
}

impl RelationshipGraph {
    /// Build from characters (most frequent first) and stored relationships.
    /// Only the first [`MAX_DIAGRAM_NODES`] characters become nodes; relationships
    /// touching any other character are dropped.
    pub fn build(characters: &[Character], relationships: &[Relationship]) -> Self {
        let mut graph = UnGraph::new_undirected();
        let mut node_index = HashMap::new();

        for c in characters.iter().take(MAX_DIAGRAM_NODES) {
            let idx = graph.add_node(CharacterNode {
                name: c.name.clone(),
                count: c.count,
            });
            node_index.insert(c.name.clone(), idx);
        }

        for rel in relationships {
            let (Some(&a), Some(&b)) = (
                node_index.get(&rel.character1),
                node_index.get(&rel.character2),
            ) else {
                continue;
            };
            let label = rel.relationship_type.clone().unwrap_or_default();
            graph.update_edge(a, b, label);
        }

        Self { graph, node_index }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.node_index.contains_key(name)
    }

    /// Render as `graph TD`. Nodes are `C<i>["name (count)"]`, edges carry the label.
    /// Characters without any relationship are still drawn as lone nodes.
    pub fn to_mermaid(&self) -> String {
        if self.graph.node_count() == 0 {
            return EMPTY_DIAGRAM.to_string();
        }

        let mut out = String::from("graph TD\n");
        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            let _ = writeln!(
                out,
                "  C{}[\"{} ({})\"]",
                idx.index(),
                escape_label(&node.name),
                node.count
            );
        }
        for edge in self.graph.edge_references() {
            let label = escape_label(edge.weight());
            if label.is_empty() {
                let _ = writeln!(
                    out,
                    "  C{} --- C{}",
                    edge.source().index(),
                    edge.target().index()
                );
            } else {
                let _ = writeln!(
                    out,
                    "  C{} -->|{}| C{}",
                    edge.source().index(),
                    label,
                    edge.target().index()
                );
            }
        }
        out
    }
}

fn escape_label(s: &str) -> String {
    s.trim().replace('"', "'").replace('|', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character(id: i64, name: &str, count: i64) -> Character {
        Character {
            id,
            movie_id: 1,
            name: name.to_string(),
            count,
            description: None,
        }
    }

    fn rel(a: &str, b: &str, label: &str) -> Relationship {
        Relationship {
            id: 0,
            character1: a.to_string(),
            character2: b.to_string(),
            relationship_type: Some(label.to_string()),
        }
    }

    #[test]
    fn test_empty_graph_placeholder() {
        let g = RelationshipGraph::build(&[], &[]);
        assert_eq!(g.to_mermaid(), EMPTY_DIAGRAM);

    }

    #[test]
    fn test_characters_without_relationships_are_drawn() {
        let chars = vec![character(1, "고 반장", 120), character(2, "MINA", 3)];
        let m = RelationshipGraph::build(&chars, &[]).to_mermaid();
        assert_ne!(m, EMPTY_DIAGRAM);
        assert_eq!(m, "graph TD\n  C0[\"고 반장 (120)\"]\n  C1[\"MINA (3)\"]\n");
    }

    #[test]
    fn test_renders_nodes_and_edges() {
        let chars = vec![character(1, "MINA", 40), character(2, "JOON", 30)];
        let g = RelationshipGraph::build(&chars, &[rel("MINA", "JOON", "partners")]);
        let m = g.to_mermaid();
        assert!(m.starts_with("graph TD\n"));
        assert!(m.contains("C0[\"MINA (40)\"]"));
        assert!(m.contains("C0 -->|partners| C1"));
    }

    #[test]
    fn test_caps_nodes_and_drops_dangling_edges() {
        let chars: Vec<_> = (0..15)
            .map(|i| character(i, &format!("P{}", i), 100 - i))
            .collect();
        let rels = vec![rel("P0", "P1", "siblings"), rel("P0", "P14", "rivals")];
        let g = RelationshipGraph::build(&chars, &rels);
        assert_eq!(g.node_count(), MAX_DIAGRAM_NODES);
        assert_eq!(g.edge_count(), 1);
        assert!(!g.contains("P14"));
    }
}

// SPDX-License-Identifier: MIT

//! Graph loader - YAML file loading and parsing
//!
//! Reads `{ nodes, edges }` documents. JSON input works too since JSON is
//! valid YAML.

use std::fs;
use std::path::Path;

use crate::error::BpmError;
use crate::graph::WorkflowGraph;

/// Loads workflow graphs from YAML files
pub struct GraphLoader;

impl GraphLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a workflow graph from a YAML file
    pub fn load_graph<P: AsRef<Path>>(&self, path: P) -> Result<WorkflowGraph, BpmError> {
        let path = path.as_ref();
        log::debug!("Loading graph from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::parse_yaml(&content)
    }

    /// Parse a workflow graph from a YAML string
    pub fn parse_yaml(content: &str) -> Result<WorkflowGraph, BpmError> {
        let graph: WorkflowGraph = serde_yaml::from_str(content)?;
        log::debug!(
            "Parsed graph with {} nodes and {} edges",
            graph.nodes.len(),
            graph.edges.len()
        );
        Ok(graph)
    }
}

impl Default for GraphLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeCategory;
    use crate::validation::RuleKind;
    use std::io::Write;

    #[test]
    fn test_parse_graph() {
        let yaml = r#"
nodes:
  - id: start
    nodeType: startEvent
    category: start
  - id: review
    nodeType: userTask
    category: task
    propertyDefinitions:
      - id: assignee
        required: true
        validation:
          - id: short
            type: max
            value: 20
  - id: end
    nodeType: endEvent
    category: end
edges:
  - id: e1
    source: start
    target: review
  - id: e2
    source: review
    target: end
    properties:
      isDefault: true
"#;
        let graph = GraphLoader::parse_yaml(yaml).unwrap();
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.first_of(NodeCategory::Start).unwrap().id, "start");

        let review = graph.node("review").unwrap();
        let rule = &review.property_definitions[0].validation[0];
        assert!(matches!(rule.kind, RuleKind::Max(n) if n == 20.0));
        assert!(graph.edges[1].is_default());
    }

    #[test]
    fn test_parse_json_document() {
        let json = r#"{"nodes": [{"id": "a", "nodeType": "task"}], "edges": []}"#;
        let graph = GraphLoader::parse_yaml(json).unwrap();
        assert_eq!(graph.nodes[0].category, NodeCategory::Other);
    }

    #[test]
    fn test_empty_document_sections_default() {
        let graph = GraphLoader::parse_yaml("nodes: []").unwrap();
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            GraphLoader::parse_yaml("nodes: [unclosed"),
            Err(BpmError::Yaml(_))
        ));
    }

    #[test]
    fn test_load_graph_from_file() {
        let path = std::env::temp_dir().join(format!("bpm-loader-{}.yaml", std::process::id()));
        {
            let mut file = fs::File::create(&path).unwrap();
            writeln!(file, "nodes:\n  - id: only\n    category: end").unwrap();
        }
        let graph = GraphLoader::new().load_graph(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(graph.nodes[0].id, "only");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = GraphLoader::new().load_graph("/definitely/not/here.yaml");
        assert!(matches!(result, Err(BpmError::Io(_))));
    }
}

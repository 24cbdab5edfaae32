//! Built-in node types and their type strings.
//!
//! The type string is what the graph source puts in `Node::node_type`; it is
//! the key the factory registry resolves.

use serde::{Deserialize, Serialize};

/// Types of nodes that ship with the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    // Sources
    /// Literal text typed into the node.
    #[serde(rename = "codeNode")]
    Code,
    /// Contents of a file on disk, re-read when it changes.
    #[serde(rename = "platformFile")]
    PlatformFile,

    // Transforms
    /// Parses a JSON string.
    #[serde(rename = "jsonParse")]
    JsonParse,
    /// Renders a JSON-e template against a context.
    #[serde(rename = "jsonERendererNode")]
    JsonE,
    /// Combines several inputs into one object.
    #[serde(rename = "mergeNode")]
    Merge,

    // Sinks
    /// Logs whatever arrives.
    #[serde(rename = "consoleNode")]
    Console,
}

impl NodeType {
    /// The type string used in graph snapshots.
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeType::Code => "codeNode",
            NodeType::PlatformFile => "platformFile",
            NodeType::JsonParse => "jsonParse",
            NodeType::JsonE => "jsonERendererNode",
            NodeType::Merge => "mergeNode",
            NodeType::Console => "consoleNode",
        }
    }

    pub fn from_type_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|t| t.type_name() == name)
    }

    /// Get the display name for this node type.
    pub fn display_name(&self) -> &'static str {
        match self {
            NodeType::Code => "Code",
            NodeType::PlatformFile => "Platform File",
            NodeType::JsonParse => "JSON Parse",
            NodeType::JsonE => "JSON-e Renderer",
            NodeType::Merge => "Merge",
            NodeType::Console => "Console",
        }
    }

    /// Get all available node types.
    pub fn all() -> &'static [NodeType] {
        &[
            NodeType::Code,
            NodeType::PlatformFile,
            NodeType::JsonParse,
            NodeType::JsonE,
            NodeType::Merge,
            NodeType::Console,
        ]
    }

    /// Check if this node type has no inputs.
    pub fn is_source(&self) -> bool {
        matches!(self, NodeType::Code | NodeType::PlatformFile)
    }

    /// Check if this node type has no output.
    pub fn is_sink(&self) -> bool {
        matches!(self, NodeType::Console)
    }

    /// Get a detailed description of what this node does.
    pub fn description(&self) -> &'static str {
        match self {
            NodeType::Code =>
                "Emits the literal text in `data.code`.\n\
                 The text is available for replay as soon as the node exists.",

            NodeType::PlatformFile =>
                "Emits the text of the file at `data.filePath`.\n\
                 Polls the file and re-emits when it changes.",

            NodeType::JsonParse =>
                "Parses an incoming string as JSON.\n\
                 Malformed input is reported as an error.",

            NodeType::JsonE =>
                "Renders the `template` input against the `context` input.\n\
                 Supports ${..} interpolation, $eval and $if.",

            NodeType::Merge =>
                "Collects inputs into one object.\n\
                 `data.keys` maps input handles to object keys.",

            NodeType::Console =>
                "Logs every input it receives.",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names_round_trip() {
        for ty in NodeType::all() {
            assert_eq!(NodeType::from_type_name(ty.type_name()), Some(*ty));
            let json = serde_json::to_string(ty).unwrap();
            assert_eq!(json, format!("\"{}\"", ty.type_name()));
        }
        assert_eq!(NodeType::from_type_name("unknown"), None);
    }

    #[test]
    fn test_roles() {
        assert!(NodeType::Code.is_source());
        assert!(NodeType::Console.is_sink());
        assert!(!NodeType::JsonE.is_source());
    }
}

//! Port types for node inputs and outputs

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Declared ports keyed by port name, in declaration order
pub type PortMap = IndexMap<String, PortSpec>;

/// Type and optionality of a single input or output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    /// Canonical type string
    #[serde(rename = "type")]
    pub type_name: String,
    /// Whether the port may be left unconnected
    pub optional: bool,
}

impl PortSpec {
    /// Create a port that must be connected
    pub fn required(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            optional: false,
        }
    }

    /// Create a port that may be left unconnected
    pub fn optional(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            optional: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_port_serializes_type_key() {
        let port = PortSpec::required("int");
        assert_eq!(
            serde_json::to_value(&port).unwrap(),
            json!({"type": "int", "optional": false})
        );
    }

    #[test]
    fn test_port_map_keeps_declaration_order() {
        let mut ports = PortMap::new();
        ports.insert("z".to_string(), PortSpec::required("int"));
        ports.insert("a".to_string(), PortSpec::optional("str"));
        assert_eq!(
            serde_json::to_string(&ports).unwrap(),
            r#"{"z":{"type":"int","optional":false},"a":{"type":"str","optional":true}}"#
        );
    }
}

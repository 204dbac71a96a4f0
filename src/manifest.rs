//! JSON node manifests
//!
//! A manifest declares node schemas and extra nominal classes without any
//! Rust code, so a registry can be populated from a file:
//!
//! ```json
//! {
//!   "types": { "Dog": ["Animal"] },
//!   "nodes": [
//!     { "name": "walk",
//!       "parameters": [ {"name": "dog", "type": "Dog"},
//!                       {"name": "steps", "type": "int", "default": 10} ],
//!       "returns": "Dog",
//!       "source": "def walk(dog: Dog, steps: int = 10) -> Dog: ..." }
//!   ]
//! }
//! ```
//!
//! Manifest nodes only describe metadata; invoking one fails.

use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use crate::nodes::{
    Arguments, CallResult, NodeFunction, NodeRegistry, Parameter, ParameterKind, RegistryError,
    Signature,
};
use crate::types::{TypeNormalizer, TypeSystem};

/// Manifest loading errors
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read manifest: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to register node `{name}`: {source}")]
    Registry {
        name: String,
        #[source]
        source: RegistryError,
    },
}

/// Parsed manifest document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    /// Extra nominal classes mapped to their direct bases
    #[serde(default)]
    pub types: IndexMap<String, Vec<String>>,

    /// Node declarations in registration order
    #[serde(default)]
    pub nodes: Vec<NodeDeclaration>,
}

/// One node in a manifest
#[derive(Debug, Clone, Deserialize)]
pub struct NodeDeclaration {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ParameterDeclaration>,
    /// Return annotation; absent when the function declares none
    #[serde(default)]
    pub returns: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// One parameter of a manifest node
#[derive(Debug, Clone, Deserialize)]
pub struct ParameterDeclaration {
    pub name: String,
    #[serde(default, rename = "type")]
    pub type_name: Option<String>,
    #[serde(default)]
    pub kind: ParameterKind,
    /// Present whenever the key is present, `null` included
    #[serde(default, deserialize_with = "present")]
    pub default: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl From<&ParameterDeclaration> for Parameter {
    fn from(decl: &ParameterDeclaration) -> Self {
        Parameter {
            name: decl.name.clone(),
            annotation: decl.type_name.clone(),
            kind: decl.kind,
            default: decl.default.clone(),
        }
    }
}

impl FromStr for Manifest {
    type Err = ManifestError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(content)?)
    }
}

impl Manifest {
    /// Load a manifest from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        debug!("Loading manifest from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    /// Declare the manifest's classes on a type system
    pub fn declare_types(&self, system: &mut TypeSystem) {
        for (name, parents) in &self.types {
            system.declare(name, parents);
        }
    }

    /// Node functions described by this manifest
    pub fn functions(&self) -> impl Iterator<Item = ManifestFunction> + '_ {
        self.nodes.iter().map(ManifestFunction::from)
    }

    /// Register every declared node, stopping at the first failure
    pub fn register_all<N: TypeNormalizer>(
        &self,
        registry: &mut NodeRegistry<N>,
    ) -> Result<usize, ManifestError> {
        let mut count = 0;
        for function in self.functions() {
            let name = function.name.clone();
            registry
                .register(function)
                .map_err(|source| ManifestError::Registry { name, source })?;
            count += 1;
        }
        info!("Registered {} node(s) from manifest", count);
        Ok(count)
    }

    /// Build a registry from this manifest on top of `system`
    pub fn build_registry(&self, mut system: TypeSystem) -> Result<NodeRegistry, ManifestError> {
        self.declare_types(&mut system);
        let mut registry = NodeRegistry::with_normalizer(system);
        self.register_all(&mut registry)?;
        Ok(registry)
    }
}

/// Metadata-only node function backed by a manifest declaration
#[derive(Debug, Clone)]
pub struct ManifestFunction {
    name: String,
    signature: Signature,
    source: Option<String>,
}

impl From<&NodeDeclaration> for ManifestFunction {
    fn from(decl: &NodeDeclaration) -> Self {
        Self {
            name: decl.name.clone(),
            signature: Signature {
                parameters: decl.parameters.iter().map(Parameter::from).collect(),
                return_annotation: decl.returns.clone(),
            },
            source: decl.source.clone(),
        }
    }
}

impl NodeFunction for ManifestFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> Option<&Signature> {
        Some(&self.signature)
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn call(&self, _args: &Arguments) -> CallResult {
        Err(format!("node `{}` is declared in a manifest and cannot be executed", self.name).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MANIFEST: &str = r#"{
        "nodes": [
            { "name": "f",
              "parameters": [
                  {"name": "a", "type": "int"},
                  {"name": "b", "type": "str", "default": "x"},
                  {"name": "c", "type": "int", "default": null},
                  {"name": "rest", "kind": "var_positional"}
              ],
              "returns": "bool",
              "source": "def f(a: int, b: str = 'x', c: int = None, *rest) -> bool: ..." }
        ]
    }"#;

    #[test]
    fn test_parse_parameters() {
        let manifest: Manifest = MANIFEST.parse().unwrap();
        let params = &manifest.nodes[0].parameters;
        assert_eq!(params[0].default, None);
        assert_eq!(params[1].default, Some(json!("x")));
        assert_eq!(params[2].default, Some(Value::Null));
        assert_eq!(params[3].kind, ParameterKind::VarPositional);
        assert_eq!(params[3].type_name, None);
    }

    #[test]
    fn test_register_all() {
        let manifest: Manifest = MANIFEST.parse().unwrap();
        let registry = manifest.build_registry(TypeSystem::new()).unwrap();

        let f = registry.get_node("f").unwrap();
        assert_eq!(
            serde_json::to_value(f.inputs()).unwrap(),
            json!({
                "a": {"type": "int", "optional": false},
                "b": {"type": "str", "optional": true},
                "c": {"type": "int", "optional": true},
                "rest": {"type": "Any", "optional": true}
            })
        );
    }

    #[test]
    fn test_manifest_function_is_not_callable() {
        let manifest: Manifest = MANIFEST.parse().unwrap();
        let function = manifest.functions().next().unwrap();
        assert!(function.call(&Arguments::new()).is_err());
    }

    #[test]
    fn test_missing_source_names_node() {
        let manifest: Manifest = r#"{"nodes": [{"name": "nosrc"}]}"#.parse().unwrap();
        let err = manifest.build_registry(TypeSystem::new()).unwrap_err();
        assert!(matches!(err, ManifestError::Registry { ref name, .. } if name == "nosrc"));
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!("{".parse::<Manifest>(), Err(ManifestError::Parse(_))));
    }
}

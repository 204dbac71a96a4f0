//! Nodegraph - node registry for visual dataflow editors
//!
//! Host code declares functions as graph nodes; the registry infers each
//! node's input and output types from the declared signature and derives a
//! parent-type forest the editor uses to decide which outputs may connect to
//! which inputs.
//!
//! ```
//! use nodegraph::nodes::{FunctionNode, NodeRegistry, Parameter};
//! use serde_json::Value;
//!
//! let mut registry = NodeRegistry::new();
//! registry
//!     .register(
//!         FunctionNode::new("is_even", |_| Ok(Value::Bool(true)))
//!             .with_parameter(Parameter::new("n", "int"))
//!             .returns("bool")
//!             .with_source("def is_even(n: int) -> bool: return n % 2 == 0"),
//!     )
//!     .unwrap();
//!
//! assert_eq!(registry.get_parent_types_as_json().unwrap(), r#"{"bool":"int"}"#);
//! ```

pub mod config;
pub mod constants;
pub mod manifest;
pub mod nodes;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use manifest::{Manifest, ManifestError};
pub use nodes::{
    FunctionNode, IntrospectionError, Node, NodeFunction, NodeRegistry, Parameter, ParentTypes,
    RegistryError,
};
pub use types::{NormalizedType, TypeNormalizer, TypeSystem};

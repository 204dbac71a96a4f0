//! Node system - node declarations, the registry and parent-type inference

pub mod error;
pub mod factory;
pub mod node;
pub mod parent_types;
pub mod port;
pub mod registry;

// Re-export core types
pub use error::{IntrospectionError, RegistryError};
pub use factory::{
    Arguments, CallError, CallResult, FunctionNode, NodeFunction, Parameter, ParameterKind,
    Signature,
};
pub use node::{Node, TypeMap};
pub use parent_types::ParentTypes;
pub use port::{PortMap, PortSpec};
pub use registry::NodeRegistry;

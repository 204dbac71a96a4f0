//! Registered node record

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use super::error::IntrospectionError;
use super::factory::{Arguments, CallResult, NodeFunction};
use super::port::{PortMap, PortSpec};
use crate::types::NormalizedType;

/// Canonical type string to normalized type, in first-seen order
pub type TypeMap = IndexMap<String, NormalizedType>;

/// One node template: a function plus its inferred port schema and source
///
/// Serializes to exactly the keys `inputs`, `outputs`, `name` and `source`.
/// The wrapped function and the type map stay private.
#[derive(Clone, Serialize)]
pub struct Node {
    inputs: PortMap,
    outputs: PortMap,
    name: String,
    source: String,
    #[serde(skip)]
    function: Arc<dyn NodeFunction>,
    #[serde(skip)]
    type_map: TypeMap,
}

impl Node {
    /// Build a node, capturing the function's source text now
    pub fn new(
        inputs: PortMap,
        outputs: PortMap,
        function: Arc<dyn NodeFunction>,
        type_map: TypeMap,
    ) -> Result<Self, IntrospectionError> {
        let name = function.name().to_string();
        let source = match function.source() {
            Some(source) => source.to_string(),
            None => return Err(IntrospectionError::SourceUnavailable { name }),
        };

        Ok(Self {
            inputs,
            outputs,
            name,
            source,
            function,
            type_map,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &PortMap {
        &self.inputs
    }

    pub fn outputs(&self) -> &PortMap {
        &self.outputs
    }

    /// The single output port, if the function declares a return annotation
    pub fn output(&self) -> Option<&PortSpec> {
        self.outputs.values().next()
    }

    /// Source text as captured at registration
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Types used by this node's ports, keyed by their canonical string
    pub fn type_map(&self) -> &TypeMap {
        &self.type_map
    }

    pub fn function(&self) -> &Arc<dyn NodeFunction> {
        &self.function
    }

    /// Invoke the wrapped function; its result or error passes through untouched
    pub fn call(&self, args: &Arguments) -> CallResult {
        self.function.call(args)
    }

    /// Structured representation for interactive inspection
    pub fn to_json_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("type_map", &self.type_map)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.to_json_value().map_err(|_| fmt::Error)?;
        write!(f, "<Node: {}>", value)
    }
}

//! Node registry and parent-type inference

use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, info, trace};

use super::error::{IntrospectionError, RegistryError};
use super::factory::NodeFunction;
use super::node::{Node, TypeMap};
use super::parent_types::ParentTypes;
use super::port::{PortMap, PortSpec};
use crate::constants::node::OUTPUT_KEY;
use crate::types::{NormalizedType, TypeNormalizer, TypeSystem};

/// Registry of node templates keyed by function name
///
/// Constructed once by the host and handed to whatever serves the editor.
/// Mutation needs `&mut`, so shared use across threads must be wrapped by
/// the caller.
#[derive(Debug)]
pub struct NodeRegistry<N: TypeNormalizer = TypeSystem> {
    nodes: IndexMap<String, Node>,
    normalizer: N,
}

impl NodeRegistry<TypeSystem> {
    /// Create an empty registry using the default type system
    pub fn new() -> Self {
        Self::with_normalizer(TypeSystem::new())
    }
}

impl Default for NodeRegistry<TypeSystem> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: TypeNormalizer> NodeRegistry<N> {
    /// Create an empty registry using a custom normalizer
    pub fn with_normalizer(normalizer: N) -> Self {
        Self {
            nodes: IndexMap::new(),
            normalizer,
        }
    }

    pub fn normalizer(&self) -> &N {
        &self.normalizer
    }

    /// Mutable access to the normalizer, e.g. to declare further classes
    pub fn normalizer_mut(&mut self) -> &mut N {
        &mut self.normalizer
    }

    /// Register a node function
    ///
    /// Reads the declared signature, builds the node and stores it under the
    /// function's name, replacing any node of the same name. The function is
    /// handed back so call sites keep using it directly. On error the
    /// registry is left unchanged.
    pub fn register<F>(&mut self, function: F) -> Result<Arc<F>, RegistryError>
    where
        F: NodeFunction + 'static,
    {
        let function = Arc::new(function);
        self.register_shared(function.clone())?;
        Ok(function)
    }

    /// Register an already shared node function
    pub fn register_shared(&mut self, function: Arc<dyn NodeFunction>) -> Result<&Node, RegistryError> {
        let node = self.build_node(function)?;
        let name = node.name().to_string();

        if self.nodes.contains_key(&name) {
            info!("Replacing previously registered node: {}", name);
        } else {
            debug!("Registered node: {}", name);
        }

        let (index, _) = self.nodes.insert_full(name, node);
        Ok(&self.nodes[index])
    }

    fn build_node(&self, function: Arc<dyn NodeFunction>) -> Result<Node, IntrospectionError> {
        let name = function.name().to_string();
        let signature = function
            .signature()
            .ok_or_else(|| IntrospectionError::SignatureUnavailable { name: name.clone() })?;

        let mut inputs = PortMap::new();
        let mut type_map = TypeMap::new();

        for parameter in &signature.parameters {
            let tp = self.normalize(&name, &parameter.name, parameter.annotation.as_deref())?;
            let type_name = tp.to_string();
            inputs.insert(
                parameter.name.clone(),
                PortSpec {
                    type_name: type_name.clone(),
                    optional: parameter.is_optional(),
                },
            );
            type_map.insert(type_name, tp);
        }

        let mut outputs = PortMap::new();
        if let Some(annotation) = signature.return_annotation.as_deref() {
            let tp = self.normalize(&name, OUTPUT_KEY, Some(annotation))?;
            let type_name = tp.to_string();
            outputs.insert(OUTPUT_KEY.to_string(), PortSpec::required(type_name.clone()));
            type_map.insert(type_name, tp);
        }

        Node::new(inputs, outputs, function, type_map)
    }

    fn normalize(
        &self,
        node: &str,
        parameter: &str,
        annotation: Option<&str>,
    ) -> Result<NormalizedType, IntrospectionError> {
        match annotation {
            // Unannotated ports accept anything
            None => Ok(NormalizedType::Any),
            Some(annotation) => self
                .normalizer
                .normalize(annotation)
                .map_err(|source| IntrospectionError::InvalidAnnotation {
                    node: node.to_string(),
                    parameter: parameter.to_string(),
                    source,
                }),
        }
    }

    /// Live view of all registered nodes, in registration order
    pub fn get_nodes(&self) -> &IndexMap<String, Node> {
        &self.nodes
    }

    pub fn get_node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node-list payload for the editor
    pub fn get_nodes_as_json(&self) -> Result<String, RegistryError> {
        Ok(serde_json::to_string(&self.nodes)?)
    }

    /// Indented node-list payload
    pub fn get_nodes_as_json_pretty(&self) -> Result<String, RegistryError> {
        Ok(serde_json::to_string_pretty(&self.nodes)?)
    }

    /// Every type used by any node, keyed by canonical string in first-seen order
    pub fn get_types(&self) -> TypeMap {
        let mut types = TypeMap::new();
        for node in self.nodes.values() {
            for (type_name, tp) in node.type_map() {
                types.insert(type_name.clone(), tp.clone());
            }
        }
        types
    }

    /// Compute the parent-type forest over all registered types
    ///
    /// Every pair of distinct non-top types is visited once in first-seen
    /// order. The first direction found to be a subtype relation wins, and
    /// the child is attached to the current root of the supertype's chain.
    /// Recomputed from scratch on every call.
    pub fn get_parent_types(&self) -> ParentTypes {
        let types = self.get_types();
        let candidates: Vec<&String> = types
            .iter()
            .filter(|(_, tp)| !tp.is_any())
            .map(|(type_name, _)| type_name)
            .collect();

        let mut parents = ParentTypes::new();
        for (i, t1) in candidates.iter().enumerate() {
            for t2 in &candidates[i + 1..] {
                if !self.resolve_parent(t1, t2, &types, &mut parents) {
                    self.resolve_parent(t2, t1, &types, &mut parents);
                }
            }
        }
        parents
    }

    /// Attach `child` under the root of `parent`'s chain if `child` is a subtype of `parent`
    fn resolve_parent(&self, child: &str, parent: &str, types: &TypeMap, parents: &mut ParentTypes) -> bool {
        let (Some(child_tp), Some(parent_tp)) = (types.get(child), types.get(parent)) else {
            return false;
        };
        if !self.normalizer.is_subtype(child_tp, parent_tp) {
            return false;
        }

        let root = parents.root_of(parent).to_string();
        // Mutual subtypes under different spellings would otherwise point at themselves
        if root == child {
            trace!("Skipping self edge for {}", child);
            return true;
        }

        trace!("Parent type {} -> {}", child, root);
        parents.insert(child.to_string(), root);
        true
    }

    /// Parent-type payload for the editor
    pub fn get_parent_types_as_json(&self) -> Result<String, RegistryError> {
        Ok(serde_json::to_string(&self.get_parent_types())?)
    }

    /// Indented parent-type payload
    pub fn get_parent_types_as_json_pretty(&self) -> Result<String, RegistryError> {
        Ok(serde_json::to_string_pretty(&self.get_parent_types())?)
    }

    /// Whether an output of type `output` may feed an input of type `input`
    ///
    /// Both annotations are normalized and compared with the normalizer's
    /// subtype relation. The parent-type forest is not consulted: it links
    /// each type to the root of its chain, so intermediate supertypes are
    /// not recorded there.
    pub fn can_connect(&self, output: &str, input: &str) -> Result<bool, RegistryError> {
        let output = self.normalizer.normalize(output)?;
        let input = self.normalizer.normalize(input)?;
        Ok(self.normalizer.is_subtype(&output, &input))
    }
}

//! Node function declarations
//!
//! A node is an ordinary function plus an explicit description of its
//! signature. Node authors either implement [`NodeFunction`] themselves or
//! build a [`FunctionNode`] from a closure:
//!
//! ```
//! use nodegraph::nodes::{Arguments, FunctionNode, Parameter};
//! use serde_json::json;
//!
//! let greet = FunctionNode::new("greet", |args: &Arguments| {
//!     let name = args.get(0).and_then(|v| v.as_str()).unwrap_or("world");
//!     Ok(json!(format!("hello {}", name)))
//! })
//! .with_parameter(Parameter::new("name", "str").with_default("world"))
//! .returns("str")
//! .with_source("def greet(name: str = 'world') -> str: ...");
//! # let _ = greet;
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error produced by a node function body
pub type CallError = Box<dyn std::error::Error + Send + Sync>;

/// Result of invoking a node function
pub type CallResult = Result<Value, CallError>;

/// How a parameter binds to call arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// Bound by position only
    PositionalOnly,
    /// Bound by position or by name
    #[default]
    PositionalOrKeyword,
    /// Collects remaining positional arguments
    VarPositional,
    /// Bound by name only
    KeywordOnly,
    /// Collects remaining keyword arguments
    VarKeyword,
}

/// One declared parameter of a node function
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    /// Type annotation text; `None` when the parameter is unannotated
    pub annotation: Option<String>,
    pub kind: ParameterKind,
    /// Default value, if the parameter declares one
    pub default: Option<Value>,
}

impl Parameter {
    /// Create an annotated positional-or-keyword parameter
    pub fn new(name: impl Into<String>, annotation: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: Some(annotation.into()),
            kind: ParameterKind::PositionalOrKeyword,
            default: None,
        }
    }

    /// Create an unannotated positional-or-keyword parameter
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: None,
            kind: ParameterKind::PositionalOrKeyword,
            default: None,
        }
    }

    /// Create an annotated positional-only parameter
    pub fn positional_only(name: impl Into<String>, annotation: impl Into<String>) -> Self {
        Self::new(name, annotation).with_kind(ParameterKind::PositionalOnly)
    }

    /// Create an annotated keyword-only parameter
    pub fn keyword_only(name: impl Into<String>, annotation: impl Into<String>) -> Self {
        Self::new(name, annotation).with_kind(ParameterKind::KeywordOnly)
    }

    /// Create an unannotated `*args` parameter
    pub fn var_positional(name: impl Into<String>) -> Self {
        Self::untyped(name).with_kind(ParameterKind::VarPositional)
    }

    /// Create an unannotated `**kwargs` parameter
    pub fn var_keyword(name: impl Into<String>) -> Self {
        Self::untyped(name).with_kind(ParameterKind::VarKeyword)
    }

    pub fn with_kind(mut self, kind: ParameterKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Whether the matching input port may be left unconnected
    ///
    /// Only a positional-or-keyword parameter without a default is mandatory.
    pub fn is_optional(&self) -> bool {
        !(self.kind == ParameterKind::PositionalOrKeyword && self.default.is_none())
    }
}

/// Declared signature of a node function
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    /// Parameters in declaration order
    pub parameters: Vec<Parameter>,
    /// Return annotation text; `None` when the function declares none
    pub return_annotation: Option<String>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_parameters(mut self, parameters: impl IntoIterator<Item = Parameter>) -> Self {
        self.parameters.extend(parameters);
        self
    }

    pub fn returns(mut self, annotation: impl Into<String>) -> Self {
        self.return_annotation = Some(annotation.into());
        self
    }
}

/// Arguments for invoking a node function
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    pub positional: Vec<Value>,
    pub keyword: IndexMap<String, Value>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Set a keyword argument
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }

    /// Positional argument by index
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    /// Keyword argument by name
    pub fn get_keyword(&self, name: &str) -> Option<&Value> {
        self.keyword.get(name)
    }
}

/// A function that can be registered as a graph node
pub trait NodeFunction: Send + Sync {
    /// Declared function name, used as the node's registry key
    fn name(&self) -> &str;

    /// Declared signature, or `None` when the function carries no signature metadata
    fn signature(&self) -> Option<&Signature>;

    /// Source text shown in the editor's code panel, if retrievable
    fn source(&self) -> Option<&str>;

    /// Invoke the function
    fn call(&self, args: &Arguments) -> CallResult;
}

type NodeBody = Arc<dyn Fn(&Arguments) -> CallResult + Send + Sync>;

/// [`NodeFunction`] built from a closure and an explicit schema
#[derive(Clone)]
pub struct FunctionNode {
    name: String,
    signature: Option<Signature>,
    source: Option<String>,
    body: NodeBody,
}

impl FunctionNode {
    /// Create a node function with an empty signature and no source
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Arguments) -> CallResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            signature: Some(Signature::default()),
            source: None,
            body: Arc::new(body),
        }
    }

    /// Create a node function without signature metadata
    ///
    /// Registering such a function fails until a signature is attached.
    pub fn opaque<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Arguments) -> CallResult + Send + Sync + 'static,
    {
        Self {
            signature: None,
            ..Self::new(name, body)
        }
    }

    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.signature
            .get_or_insert_with(Signature::default)
            .parameters
            .push(parameter);
        self
    }

    pub fn with_parameters(mut self, parameters: impl IntoIterator<Item = Parameter>) -> Self {
        self.signature
            .get_or_insert_with(Signature::default)
            .parameters
            .extend(parameters);
        self
    }

    /// Declare the return annotation
    pub fn returns(mut self, annotation: impl Into<String>) -> Self {
        self.signature
            .get_or_insert_with(Signature::default)
            .return_annotation = Some(annotation.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Debug for FunctionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionNode")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl NodeFunction for FunctionNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn call(&self, args: &Arguments) -> CallResult {
        (self.body)(args)
    }
}

use thiserror::Error;

use crate::types::TypeParseError;

/// A node function's schema or source could not be read at registration time
#[derive(Debug, Error)]
pub enum IntrospectionError {
    #[error("No signature metadata available for `{name}`")]
    SignatureUnavailable { name: String },

    #[error("Source text unavailable for `{name}`")]
    SourceUnavailable { name: String },

    #[error("Invalid annotation on `{node}.{parameter}`: {source}")]
    InvalidAnnotation {
        node: String,
        parameter: String,
        #[source]
        source: TypeParseError,
    },
}

/// Errors surfaced by the node registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Introspection(#[from] IntrospectionError),

    #[error("Invalid type in query: {0}")]
    InvalidType(#[from] TypeParseError),

    #[error("Failed to serialize registry: {0}")]
    Serialization(#[from] serde_json::Error),
}

//! Crate-wide constants and default values
//!
//! Centralized location for hard-coded names shared by the registry, the
//! type system and the command-line front end

/// Type naming constants
pub mod types {
    /// Rendered name of the universal top type
    pub const TOP_TYPE: &str = "Any";

    /// Rendered name of the unit/none type
    pub const NONE_TYPE: &str = "None";

    /// Nominal root every named class implicitly derives from
    pub const OBJECT_TYPE: &str = "object";

    /// Module prefixes stripped from annotations before alias lookup
    pub const STRIPPED_PREFIXES: &[&str] = &[
        "typing.",
        "typing_extensions.",
        "collections.abc.",
        "builtins.",
    ];
}

/// Node schema constants
pub mod node {
    /// Key of the single output port on a node with a return annotation
    pub const OUTPUT_KEY: &str = "output";
}

/// Configuration file discovery
pub mod config {
    /// Project-local configuration file
    pub const LOCAL_FILE: &str = "nodegraph.toml";

    /// Directory under the user config dir
    pub const USER_DIR: &str = "nodegraph";

    /// File name inside the user config dir
    pub const USER_FILE: &str = "config.toml";

    /// Environment override for pretty JSON output
    pub const ENV_PRETTY: &str = "NODEGRAPH_PRETTY";

    /// Environment override for loading the built-in type hierarchy
    pub const ENV_BUILTIN_TYPES: &str = "NODEGRAPH_BUILTIN_TYPES";
}

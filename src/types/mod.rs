//! Type normalization and subtyping
//!
//! Node ports carry textual annotations. Before the registry can compare
//! them they are parsed and canonicalized into [`NormalizedType`] values by a
//! [`TypeNormalizer`]. The crate ships [`TypeSystem`] as the default
//! normalizer; hosts with their own notion of types can plug in another one.

pub mod hierarchy;
pub mod parse;

use std::fmt;

use crate::constants::types::{NONE_TYPE, TOP_TYPE};

pub use hierarchy::TypeSystem;
pub use parse::{LiteralValue, TypeParseError};

/// Canonical form of a type annotation
///
/// The `Display` rendering is injective: two values render to the same
/// string only when they are equal, so the rendered form can be used as a
/// map key without collisions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NormalizedType {
    /// The universal top type
    Any,
    /// The none/unit type
    None,
    /// A nominal type, optionally parameterized
    Named {
        name: String,
        args: Vec<NormalizedType>,
    },
    /// Flattened, sorted and deduplicated union of at least two members
    Union(Vec<NormalizedType>),
    /// `...` as a type argument
    Ellipsis,
    /// Bracketed argument list, e.g. the parameter list of a `Callable`
    ArgList(Vec<NormalizedType>),
    /// A `Literal[...]` value
    Literal(LiteralValue),
}

impl NormalizedType {
    /// Create an unparameterized nominal type
    pub fn named(name: impl Into<String>) -> Self {
        NormalizedType::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Create a parameterized nominal type
    pub fn generic(name: impl Into<String>, args: Vec<NormalizedType>) -> Self {
        NormalizedType::Named {
            name: name.into(),
            args,
        }
    }

    /// Build a canonical union
    ///
    /// Nested unions are flattened, duplicates removed and members sorted.
    /// A union containing `Any` collapses to `Any`, a single member collapses
    /// to that member and an empty member list yields `None`.
    pub fn union(members: impl IntoIterator<Item = NormalizedType>) -> Self {
        let mut flat = Vec::new();
        for member in members {
            match member {
                NormalizedType::Any => return NormalizedType::Any,
                NormalizedType::Union(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        flat.sort();
        flat.dedup();

        match flat.len() {
            0 => NormalizedType::None,
            1 => flat.remove(0),
            _ => NormalizedType::Union(flat),
        }
    }

    /// Whether this is the universal top type
    pub fn is_any(&self) -> bool {
        matches!(self, NormalizedType::Any)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[NormalizedType]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for NormalizedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedType::Any => f.write_str(TOP_TYPE),
            NormalizedType::None => f.write_str(NONE_TYPE),
            NormalizedType::Named { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("[")?;
                    write_list(f, args)?;
                    f.write_str("]")?;
                }
                Ok(())
            }
            NormalizedType::Ellipsis => f.write_str("..."),
            NormalizedType::ArgList(items) => {
                f.write_str("[")?;
                write_list(f, items)?;
                f.write_str("]")
            }
            NormalizedType::Literal(value) => write!(f, "{}", value),
            NormalizedType::Union(members) => match members.as_slice() {
                // `None` sorts before every other member
                [NormalizedType::None, inner] => write!(f, "Optional[{}]", inner),
                _ => {
                    f.write_str("Union[")?;
                    write_list(f, members)?;
                    f.write_str("]")
                }
            },
        }
    }
}

/// Canonicalizes annotations and decides subtyping between the results
pub trait TypeNormalizer {
    /// Parse and canonicalize a textual annotation
    fn normalize(&self, annotation: &str) -> Result<NormalizedType, TypeParseError>;

    /// Whether `sub` may be used where `sup` is expected
    fn is_subtype(&self, sub: &NormalizedType, sup: &NormalizedType) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_named_and_generic() {
        assert_eq!(NormalizedType::named("int").to_string(), "int");
        let dict = NormalizedType::generic(
            "dict",
            vec![
                NormalizedType::named("str"),
                NormalizedType::generic("list", vec![NormalizedType::named("int")]),
            ],
        );
        assert_eq!(dict.to_string(), "dict[str, list[int]]");
    }

    #[test]
    fn test_union_is_canonical() {
        let a = NormalizedType::union(vec![
            NormalizedType::named("str"),
            NormalizedType::named("int"),
            NormalizedType::named("str"),
        ]);
        let b = NormalizedType::union(vec![
            NormalizedType::named("int"),
            NormalizedType::union(vec![NormalizedType::named("str"), NormalizedType::named("int")]),
        ]);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "Union[int, str]");
    }

    #[test]
    fn test_union_collapses() {
        assert_eq!(
            NormalizedType::union(vec![NormalizedType::named("int"), NormalizedType::Any]),
            NormalizedType::Any
        );
        assert_eq!(
            NormalizedType::union(vec![NormalizedType::named("int")]),
            NormalizedType::named("int")
        );
        assert_eq!(NormalizedType::union(Vec::new()), NormalizedType::None);
    }

    #[test]
    fn test_display_argument_forms() {
        let callable = NormalizedType::generic(
            "Callable",
            vec![
                NormalizedType::ArgList(vec![NormalizedType::named("int")]),
                NormalizedType::named("str"),
            ],
        );
        assert_eq!(callable.to_string(), "Callable[[int], str]");

        let tuple = NormalizedType::generic(
            "tuple",
            vec![NormalizedType::named("int"), NormalizedType::Ellipsis],
        );
        assert_eq!(tuple.to_string(), "tuple[int, ...]");

        let literal = NormalizedType::generic(
            "Literal",
            vec![
                NormalizedType::Literal(LiteralValue::Str("int".to_string())),
                NormalizedType::Literal(LiteralValue::Number("1".to_string())),
            ],
        );
        // A quoted literal never renders like the class of the same name
        assert_eq!(literal.to_string(), "Literal['int', 1]");
    }

    #[test]
    fn test_optional_rendering() {
        let optional = NormalizedType::union(vec![NormalizedType::named("int"), NormalizedType::None]);
        assert_eq!(optional.to_string(), "Optional[int]");

        let wide = NormalizedType::union(vec![
            NormalizedType::named("int"),
            NormalizedType::named("str"),
            NormalizedType::None,
        ]);
        assert_eq!(wide.to_string(), "Union[None, int, str]");
    }
}

//! Default type normalizer with a nominal class hierarchy

use std::collections::{HashMap, HashSet, VecDeque};

use log::debug;
use once_cell::sync::Lazy;

use super::parse::{self, LiteralValue, TypeExpr, TypeParseError};
use super::{NormalizedType, TypeNormalizer};
use crate::config::TypesConfig;
use crate::constants::types::{NONE_TYPE, OBJECT_TYPE, STRIPPED_PREFIXES, TOP_TYPE};

/// Spellings that collapse onto a canonical name after prefix stripping
static BUILTIN_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("List", "list"),
        ("Dict", "dict"),
        ("Set", "set"),
        ("FrozenSet", "frozenset"),
        ("Tuple", "tuple"),
        ("Type", "type"),
        ("Text", "str"),
        ("NoneType", NONE_TYPE),
        ("DefaultDict", "defaultdict"),
        ("Deque", "deque"),
    ]
    .into_iter()
    .collect()
});

/// Built-in nominal classes and their direct bases
static BUILTIN_HIERARCHY: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let table: &[(&'static str, &'static [&'static str])] = &[
        ("bool", &["int"]),
        ("int", &[OBJECT_TYPE]),
        ("float", &[OBJECT_TYPE]),
        ("complex", &[OBJECT_TYPE]),
        ("str", &["Sequence"]),
        ("bytes", &["Sequence"]),
        ("list", &["MutableSequence"]),
        ("deque", &["MutableSequence"]),
        ("tuple", &["Sequence"]),
        ("MutableSequence", &["Sequence"]),
        ("Sequence", &["Reversible", "Collection"]),
        ("dict", &["MutableMapping"]),
        ("defaultdict", &["dict"]),
        ("MutableMapping", &["Mapping"]),
        ("Mapping", &["Collection"]),
        ("set", &["MutableSet"]),
        ("frozenset", &["AbstractSet"]),
        ("MutableSet", &["AbstractSet"]),
        ("AbstractSet", &["Collection"]),
        ("Collection", &["Iterable"]),
        ("Reversible", &["Iterable"]),
        ("Generator", &["Iterator"]),
        ("Iterator", &["Iterable"]),
    ];
    table.iter().copied().collect()
});

/// Default [`TypeNormalizer`]
///
/// Understands `Any`, `None`, `Optional[T]`, `Union[...]`, `a | b`,
/// parameterized names and dotted module paths. Subtyping is nominal on
/// class names (every class derives from `object`) and covariant in type
/// arguments.
#[derive(Debug, Clone)]
pub struct TypeSystem {
    builtins: bool,
    parents: HashMap<String, Vec<String>>,
    aliases: HashMap<String, String>,
}

impl Default for TypeSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeSystem {
    /// Create a type system with the built-in class hierarchy
    pub fn new() -> Self {
        Self {
            builtins: true,
            parents: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// Create a type system that only knows declared classes
    pub fn without_builtins() -> Self {
        Self {
            builtins: false,
            ..Self::new()
        }
    }

    /// Create a type system from the `[types]` configuration section
    pub fn from_config(config: &TypesConfig) -> Self {
        let mut system = if config.builtins {
            Self::new()
        } else {
            Self::without_builtins()
        };
        // Aliases first so hierarchy entries may use them
        for (alias, target) in &config.aliases {
            system.alias(alias.as_str(), target.as_str());
        }
        for (name, parents) in &config.hierarchy {
            system.declare(name.as_str(), parents.iter().map(String::as_str));
        }
        system
    }

    /// Declare a nominal class and its direct bases
    ///
    /// Declaring the same class again adds to its bases.
    pub fn declare<I, S>(&mut self, name: &str, parents: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = self.canonical_name(name);
        let parents: Vec<String> = parents
            .into_iter()
            .map(|p| self.canonical_name(p.as_ref()))
            .collect();
        debug!("Declaring type {} with bases {:?}", name, parents);

        let entry = self.parents.entry(name).or_default();
        for parent in parents {
            if !entry.contains(&parent) {
                entry.push(parent);
            }
        }
        self
    }

    /// Make `alias` normalize to `target`
    pub fn alias(&mut self, alias: &str, target: &str) -> &mut Self {
        let target = self.canonical_name(target);
        self.aliases.insert(alias.to_string(), target);
        self
    }

    /// Whether the class `sub` derives from `sup`, reflexively and transitively
    pub fn is_subclass<'a>(&'a self, sub: &'a str, sup: &str) -> bool {
        if sub == sup || sup == OBJECT_TYPE {
            return true;
        }

        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([sub]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            for parent in self.parents_of(current) {
                if parent == sup {
                    return true;
                }
                queue.push_back(parent);
            }
        }
        false
    }

    fn parents_of<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        let builtin: &'a [&'a str] = if self.builtins {
            BUILTIN_HIERARCHY.get(name).copied().unwrap_or(&[])
        } else {
            &[]
        };
        let declared = self.parents.get(name).map(Vec::as_slice).unwrap_or(&[]);
        builtin
            .iter()
            .copied()
            .chain(declared.iter().map(String::as_str))
    }

    fn canonical_name(&self, raw: &str) -> String {
        let mut name = raw.trim();
        for prefix in STRIPPED_PREFIXES {
            if let Some(rest) = name.strip_prefix(prefix) {
                name = rest;
                break;
            }
        }

        if let Some(target) = self.aliases.get(name) {
            return target.clone();
        }
        BUILTIN_ALIASES
            .get(name)
            .map(|target| target.to_string())
            .unwrap_or_else(|| name.to_string())
    }

    fn resolve(&self, expr: &TypeExpr, annotation: &str) -> Result<NormalizedType, TypeParseError> {
        match expr {
            TypeExpr::Union(members) => Ok(NormalizedType::union(self.resolve_all(members, annotation)?)),
            TypeExpr::Name { name, args, offset } => {
                let canonical = self.canonical_name(name);
                match canonical.as_str() {
                    TOP_TYPE | NONE_TYPE if !args.is_empty() => Err(TypeParseError::new(
                        annotation,
                        *offset,
                        format!("`{}` takes no type arguments", canonical),
                    )),
                    TOP_TYPE => Ok(NormalizedType::Any),
                    NONE_TYPE => Ok(NormalizedType::None),
                    "Optional" => match args.as_slice() {
                        [inner] => Ok(NormalizedType::union([
                            self.resolve(inner, annotation)?,
                            NormalizedType::None,
                        ])),
                        _ => Err(TypeParseError::new(
                            annotation,
                            *offset,
                            format!("`Optional` takes exactly one argument, got {}", args.len()),
                        )),
                    },
                    "Union" if args.is_empty() => Err(TypeParseError::new(
                        annotation,
                        *offset,
                        "`Union` needs at least one argument",
                    )),
                    "Union" => Ok(NormalizedType::union(self.resolve_all(args, annotation)?)),
                    "Literal" => Ok(NormalizedType::Named {
                        args: args
                            .iter()
                            .map(|arg| self.resolve_literal(arg, annotation))
                            .collect::<Result<_, _>>()?,
                        name: canonical,
                    }),
                    _ => Ok(NormalizedType::Named {
                        args: args
                            .iter()
                            .map(|arg| self.resolve_arg(arg, annotation))
                            .collect::<Result<_, _>>()?,
                        name: canonical,
                    }),
                }
            }
            // A quoted annotation is a forward reference
            TypeExpr::Literal {
                value: LiteralValue::Str(text),
                ..
            } => self.normalize(text),
            TypeExpr::Literal { offset, .. } | TypeExpr::Ellipsis { offset } | TypeExpr::List { offset, .. } => {
                Err(TypeParseError::new(
                    annotation,
                    *offset,
                    "expected a type; `...`, lists and literals are only valid as type arguments",
                ))
            }
        }
    }

    /// Generic argument position: also admits `...` and bracketed lists
    fn resolve_arg(&self, expr: &TypeExpr, annotation: &str) -> Result<NormalizedType, TypeParseError> {
        match expr {
            TypeExpr::Ellipsis { .. } => Ok(NormalizedType::Ellipsis),
            TypeExpr::List { items, .. } => Ok(NormalizedType::ArgList(
                items
                    .iter()
                    .map(|item| self.resolve_arg(item, annotation))
                    .collect::<Result<_, _>>()?,
            )),
            _ => self.resolve(expr, annotation),
        }
    }

    /// `Literal[...]` argument position: quoted strings are values, not references
    fn resolve_literal(&self, expr: &TypeExpr, annotation: &str) -> Result<NormalizedType, TypeParseError> {
        match expr {
            TypeExpr::Literal { value, .. } => Ok(NormalizedType::Literal(value.clone())),
            _ => self.resolve(expr, annotation),
        }
    }

    fn resolve_all(&self, exprs: &[TypeExpr], annotation: &str) -> Result<Vec<NormalizedType>, TypeParseError> {
        exprs.iter().map(|e| self.resolve(e, annotation)).collect()
    }
}

impl TypeNormalizer for TypeSystem {
    fn normalize(&self, annotation: &str) -> Result<NormalizedType, TypeParseError> {
        let expr = parse::parse(annotation)?;
        self.resolve(&expr, annotation)
    }

    fn is_subtype(&self, sub: &NormalizedType, sup: &NormalizedType) -> bool {
        use NormalizedType::*;

        match (sub, sup) {
            (_, Any) => true,
            (Any, _) => false,
            (Union(members), _) => members.iter().all(|m| self.is_subtype(m, sup)),
            (_, Union(members)) => members.iter().any(|m| self.is_subtype(sub, m)),
            (None, None) => true,
            (None, Named { name, args }) => name == OBJECT_TYPE && args.is_empty(),
            (Named { name: a, args: a_args }, Named { name: b, args: b_args }) => {
                if !self.is_subclass(a, b) {
                    return false;
                }
                // A bare target accepts any parameterization
                if b_args.is_empty() {
                    return true;
                }
                a_args.len() == b_args.len()
                    && a_args.iter().zip(b_args).all(|(x, y)| self.is_subtype(x, y))
            }
            // Argument lists, `...` and literal values match exactly
            _ => sub == sup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(system: &TypeSystem, annotation: &str) -> NormalizedType {
        system.normalize(annotation).unwrap()
    }

    fn sub(system: &TypeSystem, a: &str, b: &str) -> bool {
        system.is_subtype(&norm(system, a), &norm(system, b))
    }

    #[test]
    fn test_normalize_strips_prefixes_and_aliases() {
        let system = TypeSystem::new();
        assert_eq!(norm(&system, "typing.List[builtins.int]").to_string(), "list[int]");
        assert_eq!(norm(&system, "Dict[str, Text]").to_string(), "dict[str, str]");
        assert_eq!(norm(&system, "collections.abc.Sequence").to_string(), "Sequence");
        assert_eq!(norm(&system, "typing.Any"), NormalizedType::Any);
        assert_eq!(norm(&system, "NoneType"), NormalizedType::None);
    }

    #[test]
    fn test_normalize_unions() {
        let system = TypeSystem::new();
        assert_eq!(norm(&system, "Optional[int]").to_string(), "Optional[int]");
        assert_eq!(norm(&system, "int | None"), norm(&system, "typing.Optional[int]"));
        assert_eq!(norm(&system, "Union[str, int]"), norm(&system, "int | str"));
        assert_eq!(norm(&system, "Union[int]").to_string(), "int");
        assert_eq!(norm(&system, "Union[int, Any]"), NormalizedType::Any);
    }

    #[test]
    fn test_normalize_rejects_bad_arity() {
        let system = TypeSystem::new();
        assert!(system.normalize("Optional[int, str]").is_err());
        assert!(system.normalize("Any[int]").is_err());
        assert!(system.normalize("None[int]").is_err());
        let err = system.normalize("Optional[int, str]").unwrap_err();
        assert_eq!(err.offset, 0);
    }

    #[test]
    fn test_normalize_argument_forms() {
        let system = TypeSystem::new();
        assert_eq!(norm(&system, "typing.Tuple[int, ...]").to_string(), "tuple[int, ...]");
        assert_eq!(
            norm(&system, "Callable[[List[int], str], None]").to_string(),
            "Callable[[list[int], str], None]"
        );
        assert_eq!(norm(&system, "Callable[..., int]").to_string(), "Callable[..., int]");
        assert_eq!(
            norm(&system, r#"typing.Literal["a", 'b', 3]"#).to_string(),
            "Literal['a', 'b', 3]"
        );
        assert_eq!(norm(&system, "Literal[True, None]").to_string(), "Literal[True, None]");
    }

    #[test]
    fn test_literal_strings_stay_distinct_from_classes() {
        let system = TypeSystem::new();
        assert_ne!(norm(&system, "Literal['int']"), norm(&system, "Literal[int]"));
        assert_ne!(
            norm(&system, "Literal['int']").to_string(),
            norm(&system, "Literal[int]").to_string()
        );
    }

    #[test]
    fn test_quoted_annotation_is_forward_reference() {
        let mut system = TypeSystem::new();
        system.declare("Dog", ["Animal"]);
        assert_eq!(norm(&system, "'Dog'").to_string(), "Dog");
        assert_eq!(norm(&system, "List['Dog']").to_string(), "list[Dog]");
        assert_eq!(norm(&system, "Optional['Dog']").to_string(), "Optional[Dog]");
    }

    #[test]
    fn test_argument_forms_rejected_as_types() {
        let system = TypeSystem::new();
        assert_eq!(system.normalize("...").unwrap_err().offset, 0);
        assert!(system.normalize("[int]").is_err());
        assert!(system.normalize("Optional[...]").is_err());
        assert_eq!(system.normalize("Union[int, 3]").unwrap_err().offset, 11);
    }

    #[test]
    fn test_argument_form_subtyping() {
        let system = TypeSystem::new();
        assert!(sub(&system, "Tuple[bool, ...]", "Tuple[int, ...]"));
        assert!(!sub(&system, "Tuple[int, ...]", "Tuple[int, int]"));
        assert!(sub(&system, "Callable[[int], bool]", "Callable[[int], int]"));
        assert!(!sub(&system, "Callable[[int], bool]", "Callable[[str], bool]"));
        assert!(sub(&system, "Literal['a']", "Literal"));
        assert!(!sub(&system, "Literal['a']", "Literal['b']"));
    }

    #[test]
    fn test_builtin_subclassing() {
        let system = TypeSystem::new();
        assert!(sub(&system, "bool", "int"));
        assert!(!sub(&system, "int", "bool"));
        assert!(sub(&system, "int", "object"));
        assert!(sub(&system, "list", "Iterable"));
        assert!(sub(&system, "str", "Sequence"));
        assert!(!sub(&system, "int", "float"));
    }

    #[test]
    fn test_generic_subtyping_is_covariant() {
        let system = TypeSystem::new();
        assert!(sub(&system, "List[bool]", "Sequence[int]"));
        assert!(sub(&system, "List[int]", "list"));
        assert!(!sub(&system, "list", "List[int]"));
        assert!(!sub(&system, "List[int]", "List[str]"));
        assert!(sub(&system, "Dict[str, bool]", "Mapping[str, int]"));
    }

    #[test]
    fn test_union_subtyping() {
        let system = TypeSystem::new();
        assert!(sub(&system, "int", "Optional[int]"));
        assert!(sub(&system, "None", "Optional[int]"));
        assert!(sub(&system, "Union[bool, int]", "int"));
        assert!(!sub(&system, "Optional[int]", "int"));
        assert!(sub(&system, "int", "Any"));
        assert!(!sub(&system, "Any", "int"));
        assert!(sub(&system, "None", "object"));
    }

    #[test]
    fn test_declared_hierarchy() {
        let mut system = TypeSystem::without_builtins();
        system.declare("Dog", ["Animal"]).declare("Puppy", ["Dog"]);
        assert!(sub(&system, "Puppy", "Animal"));
        assert!(!sub(&system, "Animal", "Dog"));
        assert!(!sub(&system, "bool", "int"));
    }

    #[test]
    fn test_cyclic_declarations_terminate() {
        let mut system = TypeSystem::without_builtins();
        system.declare("A", ["B"]).declare("B", ["A"]);
        assert!(system.is_subclass("A", "B"));
        assert!(!system.is_subclass("A", "C"));
    }

    #[test]
    fn test_user_alias() {
        let mut system = TypeSystem::new();
        system.alias("Number", "float");
        assert_eq!(norm(&system, "List[Number]").to_string(), "list[float]");
    }
}

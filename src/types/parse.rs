//! Annotation parser
//!
//! Turns annotation text such as `typing.Dict[str, List[int]] | None` into a
//! raw [`TypeExpr`] tree. Names are kept exactly as written; alias handling
//! and the meaning of `Any`, `None`, `Optional` and `Union` belong to the
//! normalizer.
//!
//! Besides names, a term may be `...`, a bracketed list (`Callable[[int], str]`),
//! a quoted string or a number (`Literal['a', 1]`). Which of these are
//! acceptable where is also decided by the normalizer.

use std::fmt;

use thiserror::Error;

/// Error raised when an annotation cannot be parsed or resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse type `{annotation}` at offset {offset}: {message}")]
pub struct TypeParseError {
    /// The annotation text as supplied
    pub annotation: String,
    /// Byte offset of the offending token
    pub offset: usize,
    /// What went wrong
    pub message: String,
}

impl TypeParseError {
    pub(crate) fn new(annotation: &str, offset: usize, message: impl Into<String>) -> Self {
        Self {
            annotation: annotation.to_string(),
            offset,
            message: message.into(),
        }
    }
}

/// Value of a `Literal[...]` argument
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LiteralValue {
    /// Quoted string, unescaped
    Str(String),
    /// Numeric literal as written
    Number(String),
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Str(value) => {
                f.write_str("'")?;
                for c in value.chars() {
                    if c == '\\' || c == '\'' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{}", c)?;
                }
                f.write_str("'")
            }
            LiteralValue::Number(text) => f.write_str(text),
        }
    }
}

/// Raw syntax tree of an annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// A (possibly dotted, possibly parameterized) name
    Name {
        name: String,
        args: Vec<TypeExpr>,
        offset: usize,
    },
    /// `a | b | ...`
    Union(Vec<TypeExpr>),
    /// `...`, as in `Tuple[int, ...]`
    Ellipsis { offset: usize },
    /// Bracketed list, as in the parameters of `Callable[[int], str]`
    List { items: Vec<TypeExpr>, offset: usize },
    /// Quoted string or number
    Literal { value: LiteralValue, offset: usize },
}

/// Parse a complete annotation
pub fn parse(annotation: &str) -> Result<TypeExpr, TypeParseError> {
    let mut parser = Parser {
        src: annotation,
        pos: 0,
    };

    parser.skip_whitespace();
    if parser.at_end() {
        return Err(parser.error("empty annotation"));
    }

    let expr = parser.expr()?;
    parser.skip_whitespace();
    match parser.peek() {
        None => Ok(expr),
        Some(c) => Err(parser.error(format!("unexpected `{}`", c))),
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn error(&self, message: impl Into<String>) -> TypeParseError {
        TypeParseError::new(self.src, self.pos, message)
    }

    /// `term ('|' term)*`
    fn expr(&mut self) -> Result<TypeExpr, TypeParseError> {
        let mut members = vec![self.term()?];
        loop {
            self.skip_whitespace();
            if self.peek() != Some('|') {
                break;
            }
            self.bump();
            self.skip_whitespace();
            members.push(self.term()?);
        }

        if members.len() == 1 {
            Ok(members.remove(0))
        } else {
            Ok(TypeExpr::Union(members))
        }
    }

    /// `NAME args? | '...' | '[' items? ']' | STRING | NUMBER`
    fn term(&mut self) -> Result<TypeExpr, TypeParseError> {
        let offset = self.pos;
        match self.peek() {
            Some('.') => {
                if !self.src[self.pos..].starts_with("...") {
                    return Err(self.error("expected `...`"));
                }
                self.pos += 3;
                Ok(TypeExpr::Ellipsis { offset })
            }
            Some('[') => {
                self.bump();
                self.skip_whitespace();
                let items = if self.peek() == Some(']') {
                    self.bump();
                    Vec::new()
                } else {
                    self.items("list")?
                };
                Ok(TypeExpr::List { items, offset })
            }
            Some(quote @ ('\'' | '"')) => {
                let value = self.string(quote)?;
                Ok(TypeExpr::Literal {
                    value: LiteralValue::Str(value),
                    offset,
                })
            }
            Some(c) if c.is_ascii_digit() || c == '-' => {
                let value = self.number()?;
                Ok(TypeExpr::Literal {
                    value: LiteralValue::Number(value),
                    offset,
                })
            }
            _ => {
                let name = self.name()?;
                let mut args = Vec::new();

                self.skip_whitespace();
                if self.peek() == Some('[') {
                    self.bump();
                    self.skip_whitespace();
                    if self.peek() == Some(']') {
                        return Err(self.error(format!("empty argument list for `{}`", name)));
                    }
                    args = self.items(&name)?;
                }

                Ok(TypeExpr::Name { name, args, offset })
            }
        }
    }

    /// `expr (',' expr)* ','? ']'`, after the opening bracket
    fn items(&mut self, owner: &str) -> Result<Vec<TypeExpr>, TypeParseError> {
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            items.push(self.expr()?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.bump();
                    self.skip_whitespace();
                    // Trailing comma
                    if self.peek() == Some(']') {
                        self.bump();
                        return Ok(items);
                    }
                }
                Some(']') => {
                    self.bump();
                    return Ok(items);
                }
                Some(c) => return Err(self.error(format!("unexpected `{}`", c))),
                None => return Err(self.error(format!("unclosed `[` after `{}`", owner))),
            }
        }
    }

    /// Quoted string; a backslash takes the next character literally
    fn string(&mut self, quote: char) -> Result<String, TypeParseError> {
        let start = self.pos;
        self.bump();
        let mut value = String::new();
        loop {
            match self.peek() {
                Some(c) if c == quote => {
                    self.bump();
                    return Ok(value);
                }
                Some('\\') => {
                    self.bump();
                    match self.peek() {
                        Some(c) => {
                            value.push(c);
                            self.bump();
                        }
                        None => break,
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.bump();
                }
                None => break,
            }
        }
        Err(TypeParseError::new(self.src, start, "unterminated string"))
    }

    /// `'-'? digits ('.' digits)?`
    fn number(&mut self) -> Result<String, TypeParseError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.bump();
        }
        if !matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            return Err(self.error("expected a digit"));
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek() == Some('.') && self.src[self.pos + 1..].starts_with(|c: char| c.is_ascii_digit()) {
            self.bump();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.bump();
            }
        }
        Ok(self.src[start..self.pos].to_string())
    }

    /// `ident ('.' ident)*`
    fn name(&mut self) -> Result<String, TypeParseError> {
        let start = self.pos;
        loop {
            match self.peek() {
                Some(c) if c.is_alphabetic() || c == '_' => self.bump(),
                Some(c) => return Err(self.error(format!("expected a type name, found `{}`", c))),
                None => return Err(self.error("expected a type name")),
            }
            while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
                self.bump();
            }
            if self.peek() == Some('.') {
                self.bump();
            } else {
                break;
            }
        }
        Ok(self.src[start..self.pos].to_string())
    }
}

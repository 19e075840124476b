//! Type references as they appear in pre-parsed class metadata.
//!
//! Types are written in source-like signature syntax in index files:
//!
//! ```text
//! void | int | com.example.Foo | io.smallrye.mutiny.Uni<com.example.Foo>
//! java.util.Map<java.lang.String, ? extends com.example.Bar> | byte[] | T
//! ```
//!
//! A bare identifier (no package) parses as a class reference. The index
//! rewrites it to [`TypeRef::TypeVar`] when it names a type parameter in scope
//! (see `MemorySymbolIndex::insert` and [`TypeRef::link_type_vars`]).

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, multispace0, multispace1, satisfy},
    combinator::{all_consuming, cut, map, map_opt, opt, recognize, verify},
    error::{context, convert_error, ContextError, ParseError as NomParseError, VerboseError},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded},
    IResult,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// PRIMITIVES
// ============================================================================

/// Primitive value types. Never valid as a generic argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Char,
    Float,
    Double,
}

impl PrimitiveKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "boolean" => Self::Boolean,
            "byte" => Self::Byte,
            "short" => Self::Short,
            "int" => Self::Int,
            "long" => Self::Long,
            "char" => Self::Char,
            "float" => Self::Float,
            "double" => Self::Double,
            _ => return None,
        })
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Char => "char",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    /// Fully-qualified name of the reference type this primitive boxes to.
    pub fn boxed(self) -> &'static str {
        match self {
            Self::Boolean => "java.lang.Boolean",
            Self::Byte => "java.lang.Byte",
            Self::Short => "java.lang.Short",
            Self::Int => "java.lang.Integer",
            Self::Long => "java.lang.Long",
            Self::Char => "java.lang.Character",
            Self::Float => "java.lang.Float",
            Self::Double => "java.lang.Double",
        }
    }
}

// ============================================================================
// TYPE REFERENCES
// ============================================================================

/// Bound on a wildcard argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WildcardBound {
    Extends(Box<TypeRef>),
    Super(Box<TypeRef>),
}

/// A (possibly generic) type reference.
///
/// Serializes as its signature string. Type variables print as their bare
/// name, so a deserialized `TypeRef` holds classes in their place until it is
/// re-linked against the type parameters in scope with
/// [`link_type_vars`](Self::link_type_vars).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeRef {
    Void,
    Primitive(PrimitiveKind),
    /// A class or interface. `args` is empty for non-generic and raw uses.
    Class { name: String, args: Vec<TypeRef> },
    Array(Box<TypeRef>),
    TypeVar(String),
    Wildcard(Option<WildcardBound>),
}

impl TypeRef {
    /// Non-generic (or raw) class reference.
    pub fn class(name: impl Into<String>) -> Self {
        TypeRef::Class {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Parameterized class reference.
    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        TypeRef::Class {
            name: name.into(),
            args,
        }
    }

    /// Parse signature syntax, e.g. `io.smallrye.mutiny.Uni<com.example.Foo>`.
    pub fn parse(input: &str) -> Result<Self, TypeParseError> {
        input.parse()
    }

    /// Class name without generic arguments. `None` for non-class types.
    pub fn erasure(&self) -> Option<&str> {
        match self {
            TypeRef::Class { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn args(&self) -> &[TypeRef] {
        match self {
            TypeRef::Class { args, .. } => args,
            _ => &[],
        }
    }

    /// Name without package qualifier; nested classes keep only the innermost segment.
    pub fn simple_name(&self) -> String {
        match self {
            TypeRef::Class { name, .. } => simple_name_of(name).to_string(),
            TypeRef::Array(component) => format!("{}Array", component.simple_name()),
            other => other.to_string(),
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Void)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeRef::Primitive(_))
    }

    /// True for classes and arrays: the only types usable as generic arguments.
    pub fn is_reference(&self) -> bool {
        matches!(self, TypeRef::Class { .. } | TypeRef::Array(_))
    }

    /// True when the type is a class used without arguments.
    pub fn is_raw(&self) -> bool {
        matches!(self, TypeRef::Class { args, .. } if args.is_empty())
    }

    /// First wildcard or type variable found anywhere in this type, depth first.
    pub fn first_unresolved(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::TypeVar(_) | TypeRef::Wildcard(_) => Some(self),
            TypeRef::Class { args, .. } => args.iter().find_map(TypeRef::first_unresolved),
            TypeRef::Array(component) => component.first_unresolved(),
            TypeRef::Void | TypeRef::Primitive(_) => None,
        }
    }

    /// True when no wildcard or type variable occurs anywhere in this type.
    pub fn is_concrete(&self) -> bool {
        self.first_unresolved().is_none()
    }

    /// Rewrite raw, bare class names that match a type parameter in `scope`
    /// into [`TypeRef::TypeVar`].
    pub fn link_type_vars(&self, scope: &[String]) -> TypeRef {
        if scope.is_empty() {
            return self.clone();
        }
        match self {
            TypeRef::Class { name, args }
                if args.is_empty() && scope.iter().any(|p| p == name) =>
            {
                TypeRef::TypeVar(name.clone())
            }
            TypeRef::Class { name, args } => TypeRef::Class {
                name: name.clone(),
                args: args.iter().map(|a| a.link_type_vars(scope)).collect(),
            },
            TypeRef::Array(component) => {
                TypeRef::Array(Box::new(component.link_type_vars(scope)))
            }
            TypeRef::Wildcard(Some(WildcardBound::Extends(bound))) => TypeRef::Wildcard(Some(
                WildcardBound::Extends(Box::new(bound.link_type_vars(scope))),
            )),
            TypeRef::Wildcard(Some(WildcardBound::Super(bound))) => TypeRef::Wildcard(Some(
                WildcardBound::Super(Box::new(bound.link_type_vars(scope))),
            )),
            TypeRef::Void
            | TypeRef::Primitive(_)
            | TypeRef::TypeVar(_)
            | TypeRef::Wildcard(None) => self.clone(),
        }
    }
}

/// Last segment of a dotted or `$`-nested class name.
pub fn simple_name_of(name: &str) -> &str {
    let after_dot = name.rsplit('.').next().unwrap_or(name);
    after_dot.rsplit('$').next().unwrap_or(after_dot)
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Void => f.write_str("void"),
            TypeRef::Primitive(p) => f.write_str(p.keyword()),
            TypeRef::Class { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeRef::Array(component) => write!(f, "{}[]", component),
            TypeRef::TypeVar(name) => f.write_str(name),
            TypeRef::Wildcard(None) => f.write_str("?"),
            TypeRef::Wildcard(Some(WildcardBound::Extends(bound))) => {
                write!(f, "? extends {}", bound)
            }
            TypeRef::Wildcard(Some(WildcardBound::Super(bound))) => write!(f, "? super {}", bound),
        }
    }
}

impl From<TypeRef> for String {
    fn from(ty: TypeRef) -> Self {
        ty.to_string()
    }
}

impl TryFrom<String> for TypeRef {
    type Error = TypeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ============================================================================
// PARSER
// ============================================================================

/// Signature syntax error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeParseError {
    #[error("empty type signature")]
    Empty,

    #[error("invalid type signature '{input}':\n{details}")]
    Syntax { input: String, details: String },

    #[error("'void' is only valid as a whole return type, not inside '{0}'")]
    NestedVoid(String),

    #[error("primitive '{primitive}' used as a generic argument in '{input}'")]
    PrimitiveArgument { input: String, primitive: String },
}

impl FromStr for TypeRef {
    type Err = TypeParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.trim().is_empty() {
            return Err(TypeParseError::Empty);
        }
        let ty = match all_consuming(delimited(
            multispace0,
            type_ref::<VerboseError<&str>>,
            multispace0,
        ))(input)
        {
            Ok((_, ty)) => ty,
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                return Err(TypeParseError::Syntax {
                    input: input.to_string(),
                    details: convert_error(input, e),
                })
            }
            Err(nom::Err::Incomplete(_)) => {
                return Err(TypeParseError::Syntax {
                    input: input.to_string(),
                    details: "incomplete input".to_string(),
                })
            }
        };
        check_placement(&ty, input, true)?;
        Ok(ty)
    }
}

fn is_reserved(word: &str) -> bool {
    word == "void" || PrimitiveKind::from_keyword(word).is_some()
}

fn identifier<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    recognize(pair(
        satisfy(|c: char| c.is_alphabetic() || c == '_' || c == '$'),
        take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '$'),
    ))(input)
}

/// Dotted name. Keywords may stand alone but never as a segment.
fn qualified_name<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    context(
        "qualified name",
        verify(
            recognize(separated_list1(char('.'), identifier)),
            |name: &str| !name.contains('.') || !name.split('.').any(is_reserved),
        ),
    )(input)
}

fn type_ref<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, TypeRef, E> {
    let (input, base) = context(
        "type",
        map_opt(
            pair(qualified_name, opt(preceded(multispace0, type_arguments))),
            |(name, args)| named_type(name, args),
        ),
    )(input)?;
    let (input, dimensions) = many0(preceded(
        multispace0,
        pair(char('['), pair(multispace0, cut(char(']')))),
    ))(input)?;
    let ty = dimensions
        .into_iter()
        .fold(base, |component, _| TypeRef::Array(Box::new(component)));
    Ok((input, ty))
}

fn type_arguments<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Vec<TypeRef>, E> {
    delimited(
        pair(char('<'), multispace0),
        separated_list1(
            delimited(multispace0, char(','), multispace0),
            alt((wildcard, type_ref)),
        ),
        cut(context("closing '>'", pair(multispace0, char('>')))),
    )(input)
}

fn wildcard<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, TypeRef, E> {
    let (input, _) = char('?')(input)?;
    let (input, bound) = opt(preceded(
        multispace1,
        alt((
            map(
                preceded(pair(tag("extends"), multispace1), type_ref),
                |bound| WildcardBound::Extends(Box::new(bound)),
            ),
            map(
                preceded(pair(tag("super"), multispace1), type_ref),
                |bound| WildcardBound::Super(Box::new(bound)),
            ),
        )),
    ))(input)?;
    Ok((input, TypeRef::Wildcard(bound)))
}

fn named_type(name: &str, args: Option<Vec<TypeRef>>) -> Option<TypeRef> {
    let keyword = if name == "void" {
        Some(TypeRef::Void)
    } else {
        PrimitiveKind::from_keyword(name).map(TypeRef::Primitive)
    };
    match (keyword, args) {
        (Some(_), Some(_)) => None,
        (Some(keyword), None) => Some(keyword),
        (None, args) => Some(TypeRef::Class {
            name: name.to_string(),
            args: args.unwrap_or_default(),
        }),
    }
}

/// `void` only as the whole signature; primitives never as a generic argument.
fn check_placement(ty: &TypeRef, input: &str, top_level: bool) -> Result<(), TypeParseError> {
    match ty {
        TypeRef::Void if top_level => Ok(()),
        TypeRef::Void => Err(TypeParseError::NestedVoid(input.to_string())),
        TypeRef::Primitive(_) if top_level => Ok(()),
        TypeRef::Primitive(p) => Err(TypeParseError::PrimitiveArgument {
            input: input.to_string(),
            primitive: p.keyword().to_string(),
        }),
        TypeRef::Array(component) if component.is_primitive() => Ok(()),
        TypeRef::Array(component) => check_placement(component, input, false),
        TypeRef::Class { args, .. } => args
            .iter()
            .try_for_each(|arg| check_placement(arg, input, false)),
        TypeRef::Wildcard(Some(WildcardBound::Extends(bound)))
        | TypeRef::Wildcard(Some(WildcardBound::Super(bound))) => {
            check_placement(bound, input, false)
        }
        TypeRef::TypeVar(_) | TypeRef::Wildcard(None) => Ok(()),
    }
}

// ============================================================================
// MODIFIERS
// ============================================================================

/// Access and shape flags recorded for classes and methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Static,
    Abstract,
    Final,
    Default,
    Synthetic,
    Bridge,
}

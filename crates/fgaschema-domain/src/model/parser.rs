//! DSL parser for authorization models.
//!
//! Parses the modeling language into [`AuthorizationModel`] structures. Both the
//! legacy `as` form and the current form are accepted:
//!
//! ```text
//! model
//!   schema 1.1
//!
//! type user
//!
//! type folder
//!   relations
//!     define viewer: [user] as self
//!
//! type document
//!   relations
//!     define parent: [folder]
//!     define owner: [user]
//!     define viewer: [user, user:*] or owner or viewer from parent
//! ```
//!
//! The parser checks syntax only. Names such as `self` are accepted in
//! declaration positions and left for the validator to reject.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace1, satisfy, space0, space1},
    combinator::{all_consuming, map, not, opt, value},
    error::{context, ContextError, ErrorKind, ParseError},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use super::{AuthorizationModel, RelationDefinition, TypeConstraint, TypeDefinition, Userset};
use super::types::SCHEMA_VERSION_1_1;

/// Parser error type with context for better error messages.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserError {
    pub message: String,
    pub position: Option<usize>,
}

impl ParserError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
        }
    }

    pub fn with_position(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position: Some(position),
        }
    }
}

impl std::fmt::Display for ParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(pos) = self.position {
            write!(f, "{} at position {}", self.message, pos)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ParserError {}

/// Result type for parser operations.
pub type ParserResult<T> = Result<T, ParserError>;

// ============ Helper Parsers ============

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

/// Parse a comment (# to end of line)
fn comment<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, (), E> {
    value((), pair(char('#'), take_while(|c| c != '\n' && c != '\r')))(input)
}

/// Parse whitespace including comments
fn ws<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, (), E> {
    value((), many0(alt((value((), multispace1), comment))))(input)
}

/// Words with meaning inside a rewrite expression. They cannot name a relation
/// referenced from an expression.
const EXPRESSION_KEYWORDS: &[&str] = &["or", "and", "but", "not", "from", "as", "self", "this"];

/// Match a whole keyword, so `self` does not match the prefix of `selfish`.
fn keyword<'a, E: ParseError<&'a str>>(
    word: &'static str,
) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str, E> {
    terminated(tag(word), not(satisfy(is_ident_char)))
}

/// Parse a declared name (type name, relation name, restricted type).
fn name<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    context("name", take_while1(is_ident_char))(input)
}

/// Parse a relation reference inside an expression (rejects expression keywords)
fn identifier<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    let (rest, id) = take_while1(is_ident_char)(input)?;

    if EXPRESSION_KEYWORDS.contains(&id) {
        return Err(nom::Err::Error(E::from_error_kind(input, ErrorKind::Tag)));
    }

    Ok((rest, id))
}

// ============ Header Parser ============

/// Parse the optional `model schema X.Y` header
fn model_header<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    context(
        "model header",
        preceded(
            tuple((keyword("model"), ws, keyword("schema"), space1)),
            take_while1(|c: char| c.is_ascii_digit() || c == '.'),
        ),
    )(input)
}

// ============ Type Constraint Parsers ============

/// Parse one restriction: `user`, `user:*` or `group#member`
fn type_constraint_entry<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, TypeConstraint, E> {
    alt((
        map(
            tuple((name, char('#'), name)),
            |(type_name, _, relation): (&str, _, &str)| TypeConstraint::Userset {
                type_name: type_name.to_string(),
                relation: relation.to_string(),
            },
        ),
        map(terminated(name, tag(":*")), |type_name: &str| {
            TypeConstraint::Wildcard {
                type_name: type_name.to_string(),
            }
        }),
        map(name, |type_name: &str| TypeConstraint::Direct {
            type_name: type_name.to_string(),
        }),
    ))(input)
}

/// Parse a type constraint list like [user] or [user, group#member]
fn type_constraint<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Vec<TypeConstraint>, E> {
    context(
        "type constraint",
        delimited(
            pair(char('['), space0),
            separated_list1(tuple((space0, char(','), space0)), type_constraint_entry),
            pair(space0, char(']')),
        ),
    )(input)
}

// ============ Userset Parsers ============

/// Parse `self` or `this` to Userset::This
fn parse_this<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Userset, E> {
    value(Userset::This, alt((keyword("self"), keyword("this"))))(input)
}

/// Parse a direct relation reference (just a relation name)
fn parse_computed_userset<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Userset, E> {
    map(identifier, |relation: &str| Userset::computed(relation))(input)
}

/// Parse "relation from tupleset" (tuple to userset)
fn parse_tuple_to_userset<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Userset, E> {
    context(
        "tuple to userset",
        map(
            tuple((identifier, space1, keyword("from"), space1, identifier)),
            |(computed, _, _, _, tupleset): (&str, _, _, _, &str)| {
                Userset::tuple_to_userset(tupleset, computed)
            },
        ),
    )(input)
}

/// Parse a parenthesized sub-expression
fn parse_group<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Userset, E> {
    delimited(
        pair(char('('), space0),
        parse_userset,
        pair(space0, char(')')),
    )(input)
}

/// Parse a base userset (this, group, tuple_to_userset or computed)
fn parse_base_userset<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Userset, E> {
    alt((
        parse_this,
        parse_group,
        parse_tuple_to_userset,
        parse_computed_userset,
    ))(input)
}

/// Apply an optional "but not" suffix to an already parsed base
fn exclusion_tail<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
    base: Userset,
) -> IResult<&'a str, Userset, E> {
    let (rest, subtract) = opt(preceded(
        tuple((space1, keyword("but"), space1, keyword("not"), space1)),
        parse_base_userset,
    ))(input)?;

    match subtract {
        Some(subtract) => Ok((rest, Userset::exclusion(base, subtract))),
        None => Ok((rest, base)),
    }
}

/// Apply any "and" operands to an already parsed first operand
fn intersection_tail<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
    first: Userset,
) -> IResult<&'a str, Userset, E> {
    let (rest, and_operands) = many0(preceded(
        tuple((space1, keyword("and"), space1)),
        parse_exclusion_level,
    ))(input)?;

    if and_operands.is_empty() {
        Ok((rest, first))
    } else {
        let mut children = vec![first];
        children.extend(and_operands);
        Ok((rest, Userset::Intersection { children }))
    }
}

/// Apply any "or" operands to an already parsed first operand
fn union_tail<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
    first: Userset,
) -> IResult<&'a str, Userset, E> {
    let (rest, or_operands) = many0(preceded(
        tuple((space1, keyword("or"), space1)),
        parse_intersection_level,
    ))(input)?;

    if or_operands.is_empty() {
        Ok((rest, first))
    } else {
        let mut children = vec![first];
        children.extend(or_operands);
        Ok((rest, Userset::Union { children }))
    }
}

/// Parse a userset with "but not" exclusion (highest precedence after base)
fn parse_exclusion_level<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Userset, E> {
    let (rest, base) = parse_base_userset(input)?;
    exclusion_tail(rest, base)
}

/// Parse intersection level (and binds tighter than or)
fn parse_intersection_level<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Userset, E> {
    let (rest, first) = parse_exclusion_level(input)?;
    intersection_tail(rest, first)
}

/// Parse a complete userset expression with proper operator precedence
/// Precedence (highest to lowest): exclusion (but not), intersection (and), union (or)
fn parse_userset<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Userset, E> {
    let (rest, first) = parse_intersection_level(input)?;
    union_tail(rest, first)
}

/// Parse the operators following a bare type constraint, e.g. `[user] or owner`.
/// The constraint itself stands for direct assignment and takes the place of
/// the first operand.
fn parse_constraint_continuation<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Userset, E> {
    let (rest, first) = exclusion_tail(input, Userset::This)?;
    let (rest, first) = intersection_tail(rest, first)?;
    union_tail(rest, first)
}

// ============ Relation Definition Parser ============

/// Parse a relation definition in either form:
/// `define viewer: [user] as self or editor` or `define viewer: [user] or editor`
fn parse_relation_definition<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, RelationDefinition, E> {
    context("relation definition", relation_definition_body)(input)
}

fn relation_definition_body<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, RelationDefinition, E> {
    let (rest, (_, _, _, relation_name, _)) =
        tuple((space0, keyword("define"), space1, name, space0))(input)?;
    let (rest, colon) = opt(terminated(char(':'), space0))(rest)?;
    let (rest, type_constraints) = if colon.is_some() {
        opt(type_constraint)(rest)?
    } else {
        (rest, None)
    };

    // Legacy form: everything after "as" is the rewrite
    let (rest, legacy) = opt(preceded(
        tuple((space0, keyword("as"), space1)),
        parse_userset,
    ))(rest)?;

    let (rest, rewrite) = match (legacy, &type_constraints) {
        (Some(userset), _) => (rest, userset),
        (None, Some(_)) => parse_constraint_continuation(rest)?,
        (None, None) if colon.is_some() => parse_userset(rest)?,
        (None, None) => {
            return Err(nom::Err::Error(E::from_error_kind(rest, ErrorKind::Tag)));
        }
    };

    Ok((
        rest,
        RelationDefinition {
            name: relation_name.to_string(),
            type_constraints: type_constraints.unwrap_or_default(),
            rewrite,
        },
    ))
}

// ============ Type Definition Parser ============

/// Parse a type definition with optional relations
fn parse_type_definition<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, TypeDefinition, E> {
    context(
        "type definition",
        map(
            tuple((
                keyword("type"),
                space1,
                name,
                ws,
                opt(preceded(
                    tuple((keyword("relations"), ws)),
                    many0(terminated(parse_relation_definition, ws)),
                )),
            )),
            |(_, _, type_name, _, relations): (_, _, &str, _, _)| TypeDefinition {
                type_name: type_name.to_string(),
                relations: relations.unwrap_or_default(),
            },
        ),
    )(input)
}

// ============ Model Parser ============

/// Parse a complete authorization model
fn parse_model<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, AuthorizationModel, E> {
    context(
        "authorization model",
        map(
            tuple((
                ws,
                opt(terminated(model_header, ws)),
                many0(terminated(parse_type_definition, ws)),
            )),
            |(_, schema_version, type_definitions)| AuthorizationModel {
                id: None,
                schema_version: schema_version.unwrap_or(SCHEMA_VERSION_1_1).to_string(),
                type_definitions,
            },
        ),
    )(input)
}

// ============ Public API ============

/// Parse a DSL string into an AuthorizationModel.
///
/// # Example
///
/// ```ignore
/// let dsl = r#"
/// type user
///
/// type document
///   relations
///     define owner: [user] as self
///     define viewer: [user] or owner
/// "#;
///
/// let model = parse(dsl)?;
/// ```
pub fn parse(input: &str) -> ParserResult<AuthorizationModel> {
    match all_consuming(parse_model::<nom::error::VerboseError<&str>>)(input) {
        Ok((_, model)) => Ok(model),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let position = e
                .errors
                .first()
                .map(|(remaining, _)| input.len() - remaining.len());
            let message = format!("Parse error: {}", nom::error::convert_error(input, e));
            match position {
                Some(pos) => Err(ParserError::with_position(message, pos)),
                None => Err(ParserError::new(message)),
            }
        }
        Err(nom::Err::Incomplete(_)) => Err(ParserError::new("Incomplete input")),
    }
}

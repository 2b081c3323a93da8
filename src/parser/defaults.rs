/// Parsing of `information_schema.columns.column_default` expressions.
///
/// PostgreSQL reports defaults as SQL text: `'chemist'::character varying`,
/// `42`, `(-1)`, `true`, `nextval('users_id_seq'::regclass)`, `now()`.
/// Literals become values, anything else is kept as an opaque expression.

use crate::types::Value;
use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case},
    character::complete::{char, digit1, none_of},
    combinator::{all_consuming, map, opt, recognize, rest, value},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use super::common::ws;

#[derive(Debug, Clone, PartialEq)]
pub enum DefaultExpr {
    Literal(Value),
    Expression(String),
}

impl DefaultExpr {
    #[must_use]
    pub fn parse(input: &str) -> Self {
        match all_consuming(ws(literal))(input) {
            Ok((_, value)) => Self::Literal(value),
            Err(_) => Self::Expression(input.trim().to_string()),
        }
    }

    #[must_use]
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Literal(value) => Some(value),
            Self::Expression(_) => None,
        }
    }
}

fn literal(input: &str) -> IResult<&str, Value> {
    terminated(
        alt((
            quoted_text,
            number,
            delimited(char('('), ws(number), char(')')),
            value(Value::Boolean(true), tag_no_case("true")),
            value(Value::Boolean(false), tag_no_case("false")),
            value(Value::Null, tag_no_case("NULL")),
        )),
        opt(cast),
    )(input)
}

/// `::character varying`, `::numeric(10,2)` and friends.
fn cast(input: &str) -> IResult<&str, &str> {
    preceded(tag("::"), rest)(input)
}

fn quoted_text(input: &str) -> IResult<&str, Value> {
    map(
        delimited(
            char('\''),
            many0(alt((value('\'', tag("''")), none_of("'")))),
            char('\''),
        ),
        |chars: Vec<char>| Value::Text(chars.into_iter().collect()),
    )(input)
}

fn number(input: &str) -> IResult<&str, Value> {
    map(
        recognize(tuple((
            opt(char('-')),
            digit1,
            opt(pair(char('.'), digit1)),
        ))),
        |s: &str| Value::from_numeric_text(s.to_string()),
    )(input)
}

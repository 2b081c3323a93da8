use nom::{
    bytes::complete::{tag, take_while},
    character::complete::{multispace0, satisfy},
    combinator::{all_consuming, map, opt, recognize},
    sequence::{delimited, pair, terminated},
    IResult,
};

pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// `[A-Za-z_][A-Za-z0-9_]*`, ASCII only.
pub fn identifier(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            satisfy(|c: char| c.is_ascii_alphabetic() || c == '_'),
            take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
        )),
        |s: &str| s.to_string(),
    )(input)
}

/// `column` or `table.column`.
pub fn qualified_identifier(input: &str) -> IResult<&str, (Option<String>, String)> {
    pair(opt(terminated(identifier, tag("."))), identifier)(input)
}

#[must_use]
pub fn is_identifier(input: &str) -> bool {
    all_consuming(identifier)(input).is_ok()
}

#[must_use]
pub fn is_qualified_identifier(input: &str) -> bool {
    all_consuming(qualified_identifier)(input).is_ok()
}

/// Splits `table.column` into its parts. Plain names come back without a
/// table qualifier.
#[must_use]
pub fn split_qualified(input: &str) -> (Option<&str>, &str) {
    match input.split_once('.') {
        Some((table, column)) => (Some(table), column),
        None => (None, input),
    }
}

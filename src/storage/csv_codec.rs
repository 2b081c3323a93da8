/// Delimited-text codec
///
/// One record per line, fields separated by a configurable delimiter.
/// Fields containing the delimiter, a double quote or a line break are
/// wrapped in double quotes with inner quotes doubled. An empty unquoted
/// field is NULL; an empty string is written as `""` so it survives the
/// round trip.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, line_ending, none_of},
    combinator::{map, value},
    multi::{fold_many0, separated_list1},
    sequence::delimited,
    IResult,
};

use crate::types::Value;

fn quoted_field(input: &str) -> IResult<&str, Value> {
    map(
        delimited(
            char('"'),
            fold_many0(
                alt((none_of("\""), value('"', tag("\"\"")))),
                String::new,
                |mut acc, c| {
                    acc.push(c);
                    acc
                },
            ),
            char('"'),
        ),
        Value::Text,
    )(input)
}

fn field(delimiter: char) -> impl FnMut(&str) -> IResult<&str, Value> {
    move |input| {
        alt((
            quoted_field,
            map(
                take_while(move |c: char| c != delimiter && c != '"' && c != '\n' && c != '\r'),
                |s: &str| {
                    if s.is_empty() {
                        Value::Null
                    } else {
                        Value::Text(s.to_string())
                    }
                },
            ),
        ))(input)
    }
}

fn record(delimiter: char) -> impl FnMut(&str) -> IResult<&str, Vec<Value>> {
    move |input| separated_list1(char(delimiter), field(delimiter))(input)
}

/// Splits `input` into records. Blank lines are skipped.
pub fn decode(input: &str, delimiter: char) -> Result<Vec<Vec<Value>>, String> {
    let mut records = Vec::new();
    let mut rest = input;
    let mut index = 1;

    while !rest.is_empty() {
        let (after, fields) =
            record(delimiter)(rest).map_err(|e| format!("record {index}: {e}"))?;
        rest = if after.is_empty() {
            after
        } else {
            line_ending::<&str, nom::error::Error<&str>>(after)
                .map(|(after, _)| after)
                .map_err(|_| format!("record {index}: unexpected character near {:?}", preview(after)))?
        };
        if !(fields.len() == 1 && fields[0].is_null()) {
            records.push(fields);
        }
        index += 1;
    }

    Ok(records)
}

fn preview(s: &str) -> String {
    s.chars().take(16).collect()
}

#[must_use]
pub fn encode_field(value: &Value, delimiter: char) -> String {
    if value.is_null() {
        return String::new();
    }
    let text = value.to_string();
    if text.is_empty() || text.contains([delimiter, '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text
    }
}

/// One line, including the trailing newline.
#[must_use]
pub fn encode_record<'a, I>(fields: I, delimiter: char) -> String
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut line = fields
        .into_iter()
        .map(|v| encode_field(v, delimiter))
        .collect::<Vec<_>>()
        .join(&delimiter.to_string());
    line.push('\n');
    line
}

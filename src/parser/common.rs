//! Cell-level sub-grammars shared by the value grammar and the line
//! classifier: entity ids, language and site markers, quoted cells, and
//! decimal literals.

use nom::{
    IResult,
    branch::alt,
    character::complete::{char, digit1, one_of},
    combinator::{all_consuming, map, map_res, opt, recognize, verify},
    sequence::{preceded, tuple},
};

use crate::error::BatchError;
use crate::model::{EntityId, ItemId, PropertyId};

/// Digits of an entity id. Leading zeros are not allowed.
fn id_digits(input: &str) -> IResult<&str, u64> {
    map_res(verify(digit1, |s: &str| !s.starts_with('0')), |s: &str| {
        s.parse::<u64>()
    })(input)
}

pub fn item_id(input: &str) -> IResult<&str, ItemId> {
    map(preceded(char('Q'), id_digits), ItemId)(input)
}

pub fn property_id(input: &str) -> IResult<&str, PropertyId> {
    map(preceded(char('P'), id_digits), PropertyId)(input)
}

pub fn entity_id(input: &str) -> IResult<&str, EntityId> {
    alt((
        map(item_id, EntityId::Item),
        map(property_id, EntityId::Property),
    ))(input)
}

/// Whether a whole cell matches the item-id or property-id pattern. This is
/// what the line classifier uses on leading cells.
pub fn is_entity_id(cell: &str) -> bool {
    all_consuming(entity_id)(cell).is_ok()
}

pub fn parse_entity_id_cell(cell: &str) -> Result<EntityId, BatchError> {
    match all_consuming(entity_id)(cell) {
        Ok((_, id)) => Ok(id),
        Err(_) => Err(BatchError::syntax(format!("{cell} is not a valid entity id"))),
    }
}

pub fn parse_property_id_cell(cell: &str) -> Result<PropertyId, BatchError> {
    match all_consuming(property_id)(cell) {
        Ok((_, id)) => Ok(id),
        Err(_) => Err(BatchError::syntax(format!(
            "{cell} is not a valid property id"
        ))),
    }
}

/// A language code as used by the fingerprint markers: 2-3 lowercase
/// ASCII letters.
pub fn is_language_code(code: &str) -> bool {
    (2..=3).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_lowercase())
}

/// Strips the marker prefix from a fingerprint cell, e.g. `Len` -> `en`.
pub fn language_tag(cell: &str, marker: char) -> Result<&str, BatchError> {
    cell.strip_prefix(marker)
        .filter(|code| is_language_code(code))
        .ok_or_else(|| BatchError::syntax(format!("{cell} is not a valid language marker")))
}

/// Strips the `S` marker from a site-link cell, e.g. `Senwiki` -> `enwiki`.
/// Site ids are lowercase letters ending in `wiki`, with at least one
/// letter before the suffix.
pub fn site_tag(cell: &str) -> Result<&str, BatchError> {
    cell.strip_prefix('S')
        .filter(|site| {
            site.len() > "wiki".len()
                && site.ends_with("wiki")
                && site.bytes().all(|b| b.is_ascii_lowercase())
        })
        .ok_or_else(|| BatchError::syntax(format!("{cell} is not a valid site marker")))
}

/// The quoted-string-only grammar: the whole cell is `"<text>"`, no
/// escaping. The text may itself contain quotes.
pub fn quoted_cell(cell: &str) -> Option<&str> {
    cell.strip_prefix('"')?.strip_suffix('"')
}

/// Parses a label/description/alias/site-link cell.
pub fn parse_string_cell(cell: &str) -> Result<String, BatchError> {
    quoted_cell(cell)
        .map(str::to_string)
        .ok_or_else(|| BatchError::syntax(format!("expected a quoted string, got {cell}")))
}

/// The decimal shape used by quantities and coordinates:
/// `[+-]?digits[.digits]`.
pub fn decimal_literal(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        opt(one_of("+-")),
        digit1,
        opt(tuple((char('.'), digit1))),
    )))(input)
}

pub fn is_decimal_literal(cell: &str) -> bool {
    all_consuming(decimal_literal)(cell).is_ok()
}

/// Canonical decimal text: explicit sign, no redundant leading zeros,
/// negative zero folded to `+0`. Two spellings of the same number compare
/// equal after canonicalization, which main-snak matching relies on.
pub fn canonical_decimal(text: &str) -> String {
    let (sign, rest) = if let Some(rest) = text.strip_prefix('-') {
        ("-", rest)
    } else if let Some(rest) = text.strip_prefix('+') {
        ("+", rest)
    } else {
        ("+", text)
    };
    let (int_part, frac_part) = match rest.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (rest, None),
    };
    let int_part = int_part.trim_start_matches('0');
    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let is_zero = int_part == "0" && frac_part.map_or(true, |f| f.bytes().all(|b| b == b'0'));
    let sign = if is_zero { "+" } else { sign };
    match frac_part {
        Some(frac_part) => format!("{sign}{int_part}.{frac_part}"),
        None => format!("{sign}{int_part}"),
    }
}

//! The typed value grammar over one cell string.
//!
//! An explicit ordered list of (matcher, builder) rules, evaluated
//! top-to-bottom; the first rule whose matcher accepts the cell builds the
//! value. The order is part of the grammar: an entity id is never a
//! quantity, and a plain quoted string is never monolingual text.

use nom::{
    IResult,
    character::complete::{char, one_of, u8 as parse_u8},
    bytes::complete::take_while_m_n,
    combinator::{all_consuming, recognize},
    sequence::{preceded, tuple},
};

use super::common::{
    canonical_decimal, entity_id, is_decimal_literal, is_language_code, quoted_cell,
};
use crate::error::BatchError;
use crate::model::{Calendar, DataValue};

/// A grammar rule: `None` means the matcher rejected the cell and the next
/// rule is tried; `Some(Err(..))` means the matcher accepted but the
/// builder failed, which aborts the parse.
type ValueRule = fn(&str) -> Option<Result<DataValue, BatchError>>;

const RULES: &[ValueRule] = &[
    entity_rule,
    string_rule,
    monolingual_rule,
    time_rule,
    globe_rule,
    quantity_rule,
];

/// Parses one value cell into a typed value.
pub fn parse_value_cell(cell: &str) -> Result<DataValue, BatchError> {
    for rule in RULES {
        if let Some(result) = rule(cell) {
            return result;
        }
    }
    Err(BatchError::syntax(format!(
        "unrecognized value literal: {cell}"
    )))
}

fn entity_rule(cell: &str) -> Option<Result<DataValue, BatchError>> {
    let (_, id) = all_consuming(entity_id)(cell).ok()?;
    Some(Ok(DataValue::EntityId(id)))
}

fn string_rule(cell: &str) -> Option<Result<DataValue, BatchError>> {
    let text = quoted_cell(cell)?;
    Some(Ok(DataValue::String(text.to_string())))
}

fn monolingual_rule(cell: &str) -> Option<Result<DataValue, BatchError>> {
    let (text_part, language) = cell.rsplit_once('@')?;
    if !is_language_code(language) {
        return None;
    }
    let text = quoted_cell(text_part)?;
    Some(Ok(DataValue::MonolingualText {
        text: text.to_string(),
        language: language.to_string(),
    }))
}

fn two_digits(input: &str) -> IResult<&str, &str> {
    take_while_m_n(2, 2, |c: char| c.is_ascii_digit())(input)
}

/// `<sign><1-16 digit year>-MM-DDThh:mm:ssZ/<precision>`. The timestamp
/// keeps its literal text; sub-second and timezone fields are fixed to
/// zero by the format itself.
fn time_literal(input: &str) -> IResult<&str, DataValue> {
    let (input, timestamp) = recognize(tuple((
        one_of("+-"),
        take_while_m_n(1, 16, |c: char| c.is_ascii_digit()),
        char('-'),
        two_digits,
        char('-'),
        two_digits,
        char('T'),
        two_digits,
        char(':'),
        two_digits,
        char(':'),
        two_digits,
        char('Z'),
    )))(input)?;
    let (input, precision) = preceded(char('/'), parse_u8)(input)?;
    Ok((
        input,
        DataValue::Time {
            timestamp: timestamp.to_string(),
            precision,
            calendar: Calendar::Gregorian,
        },
    ))
}

fn time_rule(cell: &str) -> Option<Result<DataValue, BatchError>> {
    let (_, value) = all_consuming(time_literal)(cell).ok()?;
    Some(Ok(value))
}

/// Decimal-degree sub-parser. Its error propagates as a `SyntaxError`
/// carrying this message once the globe rule has matched the cell shape.
fn decimal_degree(text: &str) -> Result<f64, BatchError> {
    text.parse::<f64>()
        .map_err(|_| BatchError::syntax(format!("{text} is not a valid decimal degree")))
}

fn globe_rule(cell: &str) -> Option<Result<DataValue, BatchError>> {
    let body = cell.strip_prefix('@')?;
    let (lat, lon) = body.split_once('/')?;
    if !is_decimal_literal(lat) || !is_decimal_literal(lon) {
        return None;
    }
    Some(build_globe(lat, lon))
}

fn build_globe(lat: &str, lon: &str) -> Result<DataValue, BatchError> {
    Ok(DataValue::GlobeCoordinate {
        latitude: decimal_degree(lat)?,
        longitude: decimal_degree(lon)?,
    })
}

fn quantity_rule(cell: &str) -> Option<Result<DataValue, BatchError>> {
    if !is_decimal_literal(cell) {
        return None;
    }
    Some(Ok(DataValue::exact_quantity(canonical_decimal(cell))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityId, ItemId, PropertyId};

    #[test]
    fn test_entity_id_values() {
        assert_eq!(
            parse_value_cell("Q5").unwrap(),
            DataValue::EntityId(EntityId::Item(ItemId(5)))
        );
        assert_eq!(
            parse_value_cell("P31").unwrap(),
            DataValue::EntityId(EntityId::Property(PropertyId(31)))
        );
    }

    #[test]
    fn test_string_value() {
        assert_eq!(
            parse_value_cell(r#""hello""#).unwrap(),
            DataValue::String("hello".to_string())
        );
        // A quoted entity id is a string, not an entity reference.
        assert_eq!(
            parse_value_cell(r#""Q5""#).unwrap(),
            DataValue::String("Q5".to_string())
        );
        // A cell containing `@` inside the quotes is still a plain string.
        assert_eq!(
            parse_value_cell(r#""a@en""#).unwrap(),
            DataValue::String("a@en".to_string())
        );
    }

    #[test]
    fn test_monolingual_text() {
        assert_eq!(
            parse_value_cell(r#""hello"@en"#).unwrap(),
            DataValue::MonolingualText {
                text: "hello".to_string(),
                language: "en".to_string(),
            }
        );
        assert!(parse_value_cell(r#""hello"@english"#).is_err());
        assert!(parse_value_cell(r#"hello@en"#).is_err());
    }

    #[test]
    fn test_time_value() {
        assert_eq!(
            parse_value_cell("+2021-01-01T00:00:00Z/11").unwrap(),
            DataValue::Time {
                timestamp: "+2021-01-01T00:00:00Z".to_string(),
                precision: 11,
                calendar: Calendar::Gregorian,
            }
        );
        // Up to 16 year digits, sign required.
        assert!(parse_value_cell("-0000000000002021-01-01T00:00:00Z/9").is_ok());
        assert!(parse_value_cell("2021-01-01T00:00:00Z/11").is_err());
        assert!(parse_value_cell("+2021-01-01T00:00:00Z").is_err());
        assert!(parse_value_cell("+2021-1-01T00:00:00Z/11").is_err());
    }

    #[test]
    fn test_globe_coordinate() {
        assert_eq!(
            parse_value_cell("@51.5/-0.12").unwrap(),
            DataValue::GlobeCoordinate {
                latitude: 51.5,
                longitude: -0.12,
            }
        );
        assert!(parse_value_cell("@51.5").is_err());
        assert!(parse_value_cell("@abc/12").is_err());
        assert!(parse_value_cell("@51,5/0").is_err());
    }

    #[test]
    fn test_quantity() {
        assert_eq!(
            parse_value_cell("42").unwrap(),
            DataValue::Quantity {
                amount: "+42".to_string(),
                unit: "1".to_string(),
                lower_bound: "+42".to_string(),
                upper_bound: "+42".to_string(),
            }
        );
        // Spellings of the same number canonicalize to equal values.
        assert_eq!(parse_value_cell("42").unwrap(), parse_value_cell("+42").unwrap());
        assert_eq!(parse_value_cell("42").unwrap(), parse_value_cell("042").unwrap());
        assert_eq!(
            parse_value_cell("-1.5").unwrap(),
            DataValue::exact_quantity("-1.5".to_string())
        );
    }

    #[test]
    fn test_unrecognized_literal() {
        for cell in ["hello", "", r#""open"#, "Q5x", "1e3", "CREATE"] {
            match parse_value_cell(cell) {
                Err(BatchError::Syntax(message)) => {
                    assert!(message.contains("unrecognized value literal"), "{message}")
                }
                other => panic!("expected syntax error for {cell:?}, got {other:?}"),
            }
        }
    }
}

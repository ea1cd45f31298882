//! Line tokenizer and classifier.
//!
//! A document is split on newline, each line on the configured delimiter.
//! The leading cell decides what the line is; everything past
//! classification is the applicator's job.

use super::common::{is_entity_id, parse_entity_id_cell};
use crate::error::BatchError;
use crate::model::EntityId;

/// A classified input line.
#[derive(Debug, PartialEq)]
pub enum Line<'a> {
    /// Blank line, a no-op.
    Empty,
    /// `CREATE`: allocate a fresh item.
    Create,
    /// An entity-targeting line. `target: None` is the `LAST`
    /// back-reference. `cells` is the whole line, leading id cell included.
    Edit {
        target: Option<EntityId>,
        cells: Vec<&'a str>,
    },
}

/// Splits one line into cells. Literal cell splitting only; there is no
/// delimiter escaping.
pub fn split_cells(line: &str, delimiter: char) -> Vec<&str> {
    line.split(delimiter).collect()
}

/// Classifies a line by its first cell.
pub fn classify(cells: Vec<&str>) -> Result<Line<'_>, BatchError> {
    let first = cells.first().copied().unwrap_or("");

    if cells.len() == 1 && first.is_empty() {
        return Ok(Line::Empty);
    }

    if first == "CREATE" {
        if cells.len() != 1 {
            return Err(BatchError::syntax(
                "CREATE line must contain only the keyword",
            ));
        }
        return Ok(Line::Create);
    }

    if first == "LAST" || is_entity_id(first) {
        if cells.len() % 2 != 1 {
            return Err(BatchError::syntax(
                "statement line must have an odd cell count",
            ));
        }
        if cells.len() < 3 {
            return Err(BatchError::syntax(
                "statement line must contain at least one property/value pair",
            ));
        }
        let target = if first == "LAST" {
            None
        } else {
            Some(parse_entity_id_cell(first)?)
        };
        return Ok(Line::Edit { target, cells });
    }

    Err(BatchError::syntax(format!(
        "unrecognized leading cell: {first}"
    )))
}

//! The batch language parsers: cell-level sub-grammars, the typed value
//! grammar, and the line tokenizer/classifier.

mod common;
mod line;
mod value;

pub use common::{
    language_tag, parse_entity_id_cell, parse_property_id_cell, parse_string_cell, site_tag,
};
pub use line::{Line, classify, split_cells};
pub use value::parse_value_cell;

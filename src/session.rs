//! The batch driver.
//!
//! A single-pass state machine: lines are folded in order, each fully
//! applied (including any external lookup it triggers) before the next is
//! read, so later lines observe earlier lines' effects for `LAST`
//! resolution and for dedup/conflict checks. Each `parse` call owns its
//! working set exclusively; one parser may serve independent documents
//! concurrently.

use crate::applicator::apply_edit;
use crate::error::BatchError;
use crate::model::EntityDocument;
use crate::parser::{Line, classify, split_cells};
use crate::resolver::{EntityLookup, WorkingSet};

/// Parsing configuration.
#[derive(Debug, Clone)]
pub struct ParseConfig {
    /// Cell delimiter within a line.
    pub delimiter: char,
}

impl Default for ParseConfig {
    fn default() -> Self {
        ParseConfig { delimiter: '\t' }
    }
}

/// Compiles batch documents into edited entity sets.
pub struct BatchParser<L> {
    lookup: L,
    config: ParseConfig,
}

impl<L: EntityLookup> BatchParser<L> {
    pub fn new(lookup: L) -> Self {
        BatchParser {
            lookup,
            config: ParseConfig::default(),
        }
    }

    pub fn with_config(lookup: L, config: ParseConfig) -> Self {
        BatchParser { lookup, config }
    }

    /// Parses a whole document and returns the touched entities in
    /// first-touched order for the caller to persist.
    ///
    /// All-or-nothing: the first error aborts the batch and the working
    /// set is dropped, so no partially edited entity set ever reaches the
    /// caller.
    pub async fn parse(&self, document: &str) -> Result<Vec<EntityDocument>, BatchError> {
        let mut working = WorkingSet::new();
        for line in document.split('\n') {
            match classify(split_cells(line, self.config.delimiter))? {
                Line::Empty => {}
                Line::Create => {
                    working.create();
                }
                Line::Edit { target, cells } => {
                    let slot = working.resolve(target, &self.lookup).await?;
                    apply_edit(working.get_mut(slot), &cells)?;
                }
            }
        }
        Ok(working.into_entities())
    }
}

/// Parses `document` against `lookup` with the default tab delimiter.
pub async fn parse_batch(
    lookup: &impl EntityLookup,
    document: &str,
) -> Result<Vec<EntityDocument>, BatchError> {
    BatchParser::new(lookup).parse(document).await
}

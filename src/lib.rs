//! # kbatch
//!
//! Compiles a compact, line-oriented statement language into a batch of
//! structured edits against knowledge-base entities: create items, set
//! labels/aliases/descriptions, set site links, and add statements with
//! qualifiers and references.
//!
//! The engine is pure parsing and in-memory application. Referenced
//! entities are fetched lazily through the [`EntityLookup`] capability;
//! persisting the resulting entity set is the caller's job.
//!
//! ```rust,no_run
//! use kbatch::{InMemoryEntityLookup, parse_batch};
//!
//! # async fn example() -> Result<(), kbatch::BatchError> {
//! let store = InMemoryEntityLookup::new();
//! let entities = parse_batch(&store, "CREATE\nLAST\tLen\t\"Example\"\nLAST\tP31\tQ5").await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod model;
pub mod parser;
pub mod resolver;
pub mod session;

mod applicator;

pub use error::*;
pub use model::*;
pub use parser::*;
pub use resolver::*;
pub use session::*;

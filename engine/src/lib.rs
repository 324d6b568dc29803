//! Positional inverted index with TF-IDF ranking.
//!
//! Documents are tokenized into (term, position) pairs, accumulated through
//! [`IndexBuilder`] and sealed into an immutable [`PositionalIndex`]. All
//! statistics derive from the sealed index, and queries run against the
//! index plus its [`IndexStats`].

pub mod error;
pub mod index;
pub mod persist;
pub mod profile;
pub mod query;
pub mod report;
pub mod stats;
pub mod tokenizer;

pub use error::EngineError;
pub use index::{doc_ordinal, IndexBuilder, Position, PositionalIndex};
pub use persist::{IndexPaths, MetaFile, FORMAT_VERSION};
pub use profile::{query_profile, QueryProfile, TermProfile};
pub use query::{BooleanOp, Query};
pub use stats::IndexStats;

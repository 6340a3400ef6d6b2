pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod persist;
pub mod query;
pub mod ranker;
pub mod tokenizer;

use serde::{Deserialize, Serialize};

pub use builder::IndexBuilder;
pub use config::EngineConfig;
pub use engine::{SearchEngine, SearchHit, SearchResults};
pub use error::{Error, Result};
pub use index::{IndexStats, InvertedIndex, Posting, PostingList};
pub use query::{DocSet, Query, QueryMode, QueryParser};
pub use ranker::{IdfMode, Ranker, RankerConfig, ScoredResult};
pub use tokenizer::{Normalizer, Token, Tokenizer, TokenizerConfig};

pub type TermId = u32;
pub type DocId = u64;

/// Display metadata attached to a document. The engine never inspects it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMeta {
    pub title: Option<String>,
    pub source: Option<String>,
    /// Identifier the document had before ingestion, when it was not numeric.
    pub external_id: Option<String>,
}

/// A raw document handed to the index builder.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocId,
    pub text: String,
    pub meta: DocMeta,
}

impl Document {
    pub fn new(id: DocId, text: impl Into<String>) -> Self {
        Self { id, text: text.into(), meta: DocMeta::default() }
    }

    pub fn with_meta(mut self, meta: DocMeta) -> Self {
        self.meta = meta;
        self
    }
}

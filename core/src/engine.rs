use crate::builder::IndexBuilder;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::index::InvertedIndex;
use crate::query::{evaluate, Query, QueryParser};
use crate::ranker::Ranker;
use crate::tokenizer::Tokenizer;
use crate::{DocId, DocMeta, Document};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: f64,
    pub meta: DocMeta,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    /// Matches before `limit` was applied.
    pub total_hits: usize,
    pub hits: Vec<SearchHit>,
}

/// Build-time and query-time entry point.
///
/// The active index is an immutable snapshot behind an `Arc`. Queries clone
/// the `Arc` and run without holding the lock; [`publish`](Self::publish)
/// swaps in a new snapshot, leaving in-flight queries on the old one.
pub struct SearchEngine {
    config: EngineConfig,
    tokenizer: Tokenizer,
    ranker: Ranker,
    active: RwLock<Arc<InvertedIndex>>,
}

impl SearchEngine {
    /// An engine with an empty index.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_index(config, InvertedIndex::default())
    }

    pub fn with_index(config: EngineConfig, index: InvertedIndex) -> Self {
        let tokenizer = Tokenizer::new(config.tokenizer.clone());
        let ranker = Ranker::new(config.ranker);
        Self { config, tokenizer, ranker, active: RwLock::new(Arc::new(index)) }
    }

    pub fn build<I>(config: EngineConfig, docs: I) -> Result<Self>
    where
        I: IntoIterator<Item = Document>,
    {
        let engine = Self::new(config);
        engine.rebuild(docs)?;
        Ok(engine)
    }

    /// Swap in a tokenizer carrying a custom normalizer. Affects later
    /// builds and queries only, so call it before indexing. The engine
    /// config takes on the tokenizer's settings.
    pub fn with_tokenizer(mut self, tokenizer: Tokenizer) -> Self {
        self.config.tokenizer = tokenizer.config().clone();
        self.tokenizer = tokenizer;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Build a fresh snapshot and publish it. On failure the current
    /// snapshot stays active.
    pub fn rebuild<I>(&self, docs: I) -> Result<()>
    where
        I: IntoIterator<Item = Document>,
    {
        let index = IndexBuilder::new(self.tokenizer.clone()).build(docs)?;
        self.publish(index);
        Ok(())
    }

    /// Atomically make `index` the snapshot future queries see.
    pub fn publish(&self, index: InvertedIndex) -> Arc<InvertedIndex> {
        let next = Arc::new(index);
        let previous = std::mem::replace(&mut *self.active.write(), Arc::clone(&next));
        tracing::info!(
            num_docs = next.document_count(),
            previous_docs = previous.document_count(),
            "published index snapshot"
        );
        previous
    }

    pub fn snapshot(&self) -> Arc<InvertedIndex> {
        Arc::clone(&self.active.read())
    }

    /// Parse a query without running it.
    pub fn explain(&self, query: &str) -> Result<Query> {
        QueryParser::new(&self.tokenizer).with_mode(self.config.mode).parse(query)
    }

    pub fn search(&self, query: &str, limit: usize) -> Result<SearchResults> {
        let start = Instant::now();
        let parsed = self.explain(query)?;
        let index = self.snapshot();

        let candidates = evaluate(&parsed, &index);
        let scored = self.ranker.score(&index, &candidates, &parsed);
        let total_hits = scored.len();
        let hits: Vec<SearchHit> = scored
            .into_iter()
            .take(limit)
            .map(|r| SearchHit {
                doc_id: r.doc_id,
                score: r.score,
                meta: index.document_meta(r.doc_id).cloned().unwrap_or_default(),
            })
            .collect();

        tracing::debug!(query, total_hits, elapsed_us = start.elapsed().as_micros() as u64, "search");
        Ok(SearchResults { total_hits, hits })
    }
}

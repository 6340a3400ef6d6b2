use crate::index::InvertedIndex;
use crate::query::{DocSet, Query};
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdfMode {
    /// `ln(N / df)`
    #[default]
    Standard,
    /// `ln(1 + N / df)`, keeps terms present in every document above zero.
    Smoothed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankerConfig {
    pub idf: IdfMode,
    /// Divide each score by `sqrt(document length)`.
    pub length_normalization: bool,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self { idf: IdfMode::Standard, length_normalization: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub doc_id: DocId,
    pub score: f64,
}

/// TF-IDF scoring over an index snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ranker {
    config: RankerConfig,
}

impl Ranker {
    pub fn new(config: RankerConfig) -> Self {
        Self { config }
    }

    pub fn idf(&self, index: &InvertedIndex, term: &str) -> f64 {
        let df = index.document_frequency(term);
        if df == 0 {
            return 0.0;
        }
        let ratio = index.document_count() as f64 / df as f64;
        match self.config.idf {
            IdfMode::Standard => ratio.ln(),
            IdfMode::Smoothed => (1.0 + ratio).ln(),
        }
    }

    /// Score every candidate and order by descending score, then ascending id.
    ///
    /// Each candidate appears exactly once. Terms are weighed in the order
    /// the query lists them, so repeated calls are bit-identical.
    pub fn score(&self, index: &InvertedIndex, candidates: &DocSet, query: &Query) -> Vec<ScoredResult> {
        let weights: Vec<(&str, f64)> = query
            .positive_terms()
            .into_iter()
            .map(|t| (t, self.idf(index, t)))
            .collect();

        let mut results: Vec<ScoredResult> = candidates
            .iter()
            .map(|doc_id| {
                let raw: f64 = weights
                    .iter()
                    .filter_map(|&(term, idf)| index.posting(term, doc_id).map(|p| p.tf as f64 * idf))
                    .fold(0.0, |acc, w| acc + w);
                ScoredResult { doc_id, score: raw / self.length_norm(index, doc_id) }
            })
            .collect();
        results.sort_by(compare);
        results
    }

    fn length_norm(&self, index: &InvertedIndex, doc_id: DocId) -> f64 {
        if !self.config.length_normalization {
            return 1.0;
        }
        match index.document_length(doc_id) {
            Some(len) if len > 0 => (len as f64).sqrt(),
            _ => 1.0,
        }
    }
}

fn compare(a: &ScoredResult, b: &ScoredResult) -> Ordering {
    b.score.total_cmp(&a.score).then(a.doc_id.cmp(&b.doc_id))
}

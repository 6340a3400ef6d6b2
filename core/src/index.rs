use crate::error::{Error, Result};
use crate::{DocId, DocMeta, TermId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One document's occurrences of one term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub tf: u32,
    /// Ascending offsets in the document's word stream.
    pub positions: Vec<u32>,
}

impl Posting {
    pub(crate) fn new(doc_id: DocId, position: u32) -> Self {
        Self { doc_id, tf: 1, positions: vec![position] }
    }

    pub(crate) fn push(&mut self, position: u32) {
        self.tf += 1;
        self.positions.push(position);
    }
}

/// Postings for a single term, sorted by strictly increasing doc id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostingList {
    postings: Vec<Posting>,
}

impl PostingList {
    pub(crate) fn from_sorted(postings: Vec<Posting>) -> Self {
        Self { postings }
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Posting> {
        self.postings.iter()
    }

    pub fn as_slice(&self) -> &[Posting] {
        &self.postings
    }

    pub fn doc_ids(&self) -> impl Iterator<Item = DocId> + '_ {
        self.postings.iter().map(|p| p.doc_id)
    }

    /// Binary search by doc id.
    pub fn get(&self, doc_id: DocId) -> Option<&Posting> {
        self.postings
            .binary_search_by_key(&doc_id, |p| p.doc_id)
            .ok()
            .map(|i| &self.postings[i])
    }

    fn check(&self, term: &str, documents: &BTreeMap<DocId, DocEntry>) -> Result<()> {
        if self.postings.is_empty() {
            return Err(Error::Invariant(format!("term {term:?} has an empty posting list")));
        }
        for pair in self.postings.windows(2) {
            if pair[0].doc_id >= pair[1].doc_id {
                return Err(Error::Invariant(format!(
                    "posting list for {term:?} is not strictly sorted ({} then {})",
                    pair[0].doc_id, pair[1].doc_id
                )));
            }
        }
        for p in &self.postings {
            if !documents.contains_key(&p.doc_id) {
                return Err(Error::Invariant(format!("term {term:?} references unknown document {}", p.doc_id)));
            }
            if p.tf as usize != p.positions.len() || p.tf == 0 {
                return Err(Error::Invariant(format!(
                    "term {term:?} in document {} has tf {} but {} positions",
                    p.doc_id,
                    p.tf,
                    p.positions.len()
                )));
            }
            if p.positions.windows(2).any(|w| w[0] >= w[1]) {
                return Err(Error::Invariant(format!("positions for {term:?} in document {} are not ascending", p.doc_id)));
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a PostingList {
    type Item = &'a Posting;
    type IntoIter = std::slice::Iter<'a, Posting>;

    fn into_iter(self) -> Self::IntoIter {
        self.postings.iter()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocEntry {
    /// Number of terms the tokenizer emitted for this document.
    pub length: u32,
    pub meta: DocMeta,
}

/// Term -> id mapping, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    ids: HashMap<String, TermId>,
    terms: Vec<String>,
}

impl Lexicon {
    pub(crate) fn from_terms(terms: Vec<String>) -> Result<Self> {
        let mut ids = HashMap::with_capacity(terms.len());
        for (id, term) in terms.iter().enumerate() {
            if ids.insert(term.clone(), id as TermId).is_some() {
                return Err(Error::Invariant(format!("term {term:?} appears twice in the lexicon")));
            }
        }
        Ok(Self { ids, terms })
    }

    pub(crate) fn intern(&mut self, term: &str) -> TermId {
        if let Some(&id) = self.ids.get(term) {
            return id;
        }
        let id = self.terms.len() as TermId;
        self.ids.insert(term.to_string(), id);
        self.terms.push(term.to_string());
        id
    }

    pub fn id(&self, term: &str) -> Option<TermId> {
        self.ids.get(term).copied()
    }

    pub fn term(&self, id: TermId) -> Option<&str> {
        self.terms.get(id as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub(crate) fn terms(&self) -> &[String] {
        &self.terms
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub documents: usize,
    pub terms: usize,
    pub postings: usize,
    pub total_terms: u64,
    pub avg_document_length: f64,
}

/// Read-only snapshot produced by [`IndexBuilder`](crate::IndexBuilder).
///
/// Nothing here mutates after construction, so a snapshot can be shared
/// across threads behind an `Arc` and queried without locking.
#[derive(Debug, Clone, Default)]
pub struct InvertedIndex {
    lexicon: Lexicon,
    postings: Vec<PostingList>, // indexed by TermId
    documents: BTreeMap<DocId, DocEntry>,
}

static EMPTY: PostingList = PostingList { postings: Vec::new() };

impl InvertedIndex {
    /// Assemble an index from its parts and check every invariant.
    pub(crate) fn from_parts(
        lexicon: Lexicon,
        postings: Vec<PostingList>,
        documents: BTreeMap<DocId, DocEntry>,
    ) -> Result<Self> {
        let index = Self { lexicon, postings, documents };
        index.validate()?;
        Ok(index)
    }

    pub fn lookup(&self, term: &str) -> &PostingList {
        self.lexicon
            .id(term)
            .and_then(|id| self.postings.get(id as usize))
            .unwrap_or(&EMPTY)
    }

    pub fn document_frequency(&self, term: &str) -> usize {
        self.lookup(term).len()
    }

    pub fn document_length(&self, id: DocId) -> Option<u32> {
        self.documents.get(&id).map(|d| d.length)
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn document_meta(&self, id: DocId) -> Option<&DocMeta> {
        self.documents.get(&id).map(|d| &d.meta)
    }

    pub fn contains_document(&self, id: DocId) -> bool {
        self.documents.contains_key(&id)
    }

    /// Every document id, ascending.
    pub fn doc_ids(&self) -> impl Iterator<Item = DocId> + '_ {
        self.documents.keys().copied()
    }

    pub fn posting(&self, term: &str, id: DocId) -> Option<&Posting> {
        self.lookup(term).get(id)
    }

    pub fn term_id(&self, term: &str) -> Option<TermId> {
        self.lexicon.id(term)
    }

    pub fn term(&self, id: TermId) -> Option<&str> {
        self.lexicon.term(id)
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// All indexed terms, sorted.
    pub fn vocabulary(&self) -> Vec<&str> {
        let mut terms: Vec<&str> = self.lexicon.terms().iter().map(String::as_str).collect();
        terms.sort_unstable();
        terms
    }

    /// Forward view of one document: `(term id, position)` in position order.
    ///
    /// Walks every posting list, so this is meant for inspection tools rather
    /// than the query path.
    pub fn document_terms(&self, id: DocId) -> Vec<(TermId, u32)> {
        let mut out: Vec<(TermId, u32)> = Vec::new();
        for (tid, list) in self.postings.iter().enumerate() {
            if let Some(p) = list.get(id) {
                out.extend(p.positions.iter().map(|&pos| (tid as TermId, pos)));
            }
        }
        out.sort_unstable_by_key(|&(_, pos)| pos);
        out
    }

    pub fn stats(&self) -> IndexStats {
        let total_terms: u64 = self.documents.values().map(|d| d.length as u64).sum();
        let documents = self.documents.len();
        IndexStats {
            documents,
            terms: self.lexicon.len(),
            postings: self.postings.iter().map(PostingList::len).sum(),
            total_terms,
            avg_document_length: if documents == 0 { 0.0 } else { total_terms as f64 / documents as f64 },
        }
    }

    /// Check the structural invariants every query relies on.
    pub fn validate(&self) -> Result<()> {
        if self.lexicon.len() != self.postings.len() {
            return Err(Error::Invariant(format!(
                "lexicon has {} terms but there are {} posting lists",
                self.lexicon.len(),
                self.postings.len()
            )));
        }
        let mut lengths: HashMap<DocId, u64> = HashMap::new();
        for (term, list) in self.lexicon.terms().iter().zip(&self.postings) {
            list.check(term, &self.documents)?;
            for p in list {
                *lengths.entry(p.doc_id).or_insert(0) += p.tf as u64;
            }
        }
        for (id, entry) in &self.documents {
            let counted = lengths.get(id).copied().unwrap_or(0);
            if counted != entry.length as u64 {
                return Err(Error::Invariant(format!(
                    "document {id} has length {} but its postings hold {counted} terms",
                    entry.length
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn posting_lists(&self) -> &[PostingList] {
        &self.postings
    }

    pub(crate) fn documents(&self) -> &BTreeMap<DocId, DocEntry> {
        &self.documents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> InvertedIndex {
        let mut lexicon = Lexicon::default();
        lexicon.intern("cat");
        lexicon.intern("sat");
        let postings = vec![
            PostingList::from_sorted(vec![Posting::new(1, 1)]),
            PostingList::from_sorted(vec![Posting::new(1, 2), Posting::new(2, 2)]),
        ];
        let mut documents = BTreeMap::new();
        documents.insert(1, DocEntry { length: 2, meta: DocMeta::default() });
        documents.insert(2, DocEntry { length: 1, meta: DocMeta::default() });
        InvertedIndex::from_parts(lexicon, postings, documents).unwrap()
    }

    #[test]
    fn reads() {
        let idx = tiny();
        assert_eq!(idx.document_count(), 2);
        assert_eq!(idx.document_frequency("sat"), 2);
        assert_eq!(idx.document_frequency("dog"), 0);
        assert!(idx.lookup("dog").is_empty());
        assert_eq!(idx.document_length(1), Some(2));
        assert_eq!(idx.document_length(9), None);
        assert_eq!(idx.posting("sat", 2).map(|p| p.tf), Some(1));
        assert_eq!(idx.vocabulary(), vec!["cat", "sat"]);
        assert_eq!(idx.document_terms(1), vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn stats() {
        let s = tiny().stats();
        assert_eq!(s.documents, 2);
        assert_eq!(s.terms, 2);
        assert_eq!(s.postings, 3);
        assert_eq!(s.total_terms, 3);
        assert!((s.avg_document_length - 1.5).abs() < 1e-12);
    }

    #[test]
    fn unsorted_postings_are_rejected() {
        let mut lexicon = Lexicon::default();
        lexicon.intern("x");
        let postings = vec![PostingList::from_sorted(vec![Posting::new(2, 0), Posting::new(1, 0)])];
        let mut documents = BTreeMap::new();
        documents.insert(1, DocEntry { length: 1, meta: DocMeta::default() });
        documents.insert(2, DocEntry { length: 1, meta: DocMeta::default() });
        let err = InvertedIndex::from_parts(lexicon, postings, documents).unwrap_err();
        assert!(matches!(err, Error::Invariant(_)));
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let mut lexicon = Lexicon::default();
        lexicon.intern("x");
        let postings = vec![PostingList::from_sorted(vec![Posting::new(1, 0)])];
        let mut documents = BTreeMap::new();
        documents.insert(1, DocEntry { length: 4, meta: DocMeta::default() });
        assert!(InvertedIndex::from_parts(lexicon, postings, documents).is_err());
    }

    #[test]
    fn duplicate_lexicon_terms_are_rejected() {
        assert!(Lexicon::from_terms(vec!["a".into(), "a".into()]).is_err());
    }
}

use crate::error::{Error, Result};
use crate::index::{DocEntry, InvertedIndex, Lexicon, Posting, PostingList};
use crate::tokenizer::Tokenizer;
use crate::{DocId, Document, TermId};
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

/// Single-use, single-writer builder for an [`InvertedIndex`].
///
/// Postings are appended in arrival order and only sorted once in
/// [`finish`](IndexBuilder::finish), so documents may arrive in any id order.
pub struct IndexBuilder {
    tokenizer: Tokenizer,
    lexicon: Lexicon,
    postings: Vec<Vec<Posting>>, // indexed by TermId
    documents: BTreeMap<DocId, DocEntry>,
    started: Instant,
}

impl IndexBuilder {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self {
            tokenizer,
            lexicon: Lexicon::default(),
            postings: Vec::new(),
            documents: BTreeMap::new(),
            started: Instant::now(),
        }
    }

    /// Build an index from a whole batch of documents.
    pub fn build<I>(mut self, docs: I) -> Result<InvertedIndex>
    where
        I: IntoIterator<Item = Document>,
    {
        for doc in docs {
            self.add(doc)?;
        }
        self.finish()
    }

    pub fn add(&mut self, doc: Document) -> Result<()> {
        if self.documents.contains_key(&doc.id) {
            return Err(Error::DuplicateDocumentId(doc.id));
        }

        // Per-document slot of each term's posting, so repeats are O(1).
        let mut slots: HashMap<TermId, usize> = HashMap::new();
        let mut length: u32 = 0;
        for token in self.tokenizer.tokens(&doc.text) {
            length += 1;
            let tid = self.lexicon.intern(&token.term);
            if tid as usize == self.postings.len() {
                self.postings.push(Vec::new());
            }
            let list = &mut self.postings[tid as usize];
            match slots.get(&tid) {
                Some(&slot) => list[slot].push(token.position),
                None => {
                    slots.insert(tid, list.len());
                    list.push(Posting::new(doc.id, token.position));
                }
            }
        }

        self.documents.insert(doc.id, DocEntry { length, meta: doc.meta });
        Ok(())
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Sort every posting list and publish the result as an immutable index.
    pub fn finish(self) -> Result<InvertedIndex> {
        let postings: Vec<PostingList> = self
            .postings
            .into_iter()
            .map(|mut list| {
                list.sort_unstable_by_key(|p| p.doc_id);
                PostingList::from_sorted(list)
            })
            .collect();
        let index = InvertedIndex::from_parts(self.lexicon, postings, self.documents)?;
        tracing::info!(
            num_docs = index.document_count(),
            num_terms = index.lexicon().len(),
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "index build complete"
        );
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::{StopWords, TokenizerConfig};

    fn corpus() -> Vec<Document> {
        vec![
            Document::new(3, "cats and dogs"),
            Document::new(1, "the cat sat"),
            Document::new(2, "the dog sat"),
        ]
    }

    #[test]
    fn builds_sorted_postings() {
        let idx = IndexBuilder::new(Tokenizer::default()).build(corpus()).unwrap();
        assert_eq!(idx.document_count(), 3);
        let sat: Vec<DocId> = idx.lookup("sat").doc_ids().collect();
        assert_eq!(sat, vec![1, 2]);
        assert_eq!(idx.lookup("cat").doc_ids().collect::<Vec<_>>(), vec![1]);
        assert_eq!(idx.lookup("cats").doc_ids().collect::<Vec<_>>(), vec![3]);
        assert_eq!(idx.document_length(3), Some(2));
    }

    #[test]
    fn frequencies_and_positions() {
        let idx = IndexBuilder::new(Tokenizer::default())
            .build(vec![Document::new(7, "rust is fast and rust is safe, rust!")])
            .unwrap();
        let p = idx.posting("rust", 7).unwrap();
        assert_eq!(p.tf, 3);
        assert_eq!(p.positions, vec![0, 4, 7]);
        assert_eq!(idx.document_length(7), Some(5));
    }

    #[test]
    fn duplicate_id_fails() {
        let err = IndexBuilder::new(Tokenizer::default())
            .build(vec![Document::new(1, "a"), Document::new(1, "b")])
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateDocumentId(1)));
    }

    #[test]
    fn empty_documents_are_counted() {
        let idx = IndexBuilder::new(Tokenizer::default())
            .build(vec![Document::new(1, ""), Document::new(2, "the of and")])
            .unwrap();
        assert_eq!(idx.document_count(), 2);
        assert_eq!(idx.document_length(1), Some(0));
        assert_eq!(idx.document_length(2), Some(0));
        assert!(idx.lexicon().is_empty());
    }

    #[test]
    fn every_emitted_term_is_indexed() {
        let tokenizer = Tokenizer::new(TokenizerConfig { stop_words: StopWords::Disabled, ..Default::default() });
        let docs = corpus();
        let idx = IndexBuilder::new(tokenizer.clone()).build(docs.clone()).unwrap();
        for doc in &docs {
            for term in tokenizer.terms(&doc.text) {
                assert!(idx.posting(&term, doc.id).is_some(), "{term} missing from {}", doc.id);
            }
        }
        for term in idx.vocabulary() {
            for id in idx.lookup(term).doc_ids() {
                let text = &docs.iter().find(|d| d.id == id).unwrap().text;
                assert!(tokenizer.terms(text).any(|t| t == term));
            }
        }
    }
}

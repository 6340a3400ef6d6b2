use super::{DocSet, PhraseTerm, Query};
use crate::index::InvertedIndex;

/// Resolve a query to the set of matching documents.
pub fn evaluate(query: &Query, index: &InvertedIndex) -> DocSet {
    match query {
        Query::Term(term) => postings(index, term),
        Query::Phrase(terms) => phrase(index, terms),
        Query::And(children) => conjunction(index, children),
        Query::Or(children) => children
            .iter()
            .fold(DocSet::new(), |acc, child| acc.union(&evaluate(child, index))),
        Query::Not(inner) => universe(index).difference(&evaluate(inner, index)),
        Query::FreeText(terms) => terms
            .iter()
            .fold(DocSet::new(), |acc, term| acc.union(&postings(index, term))),
    }
}

fn postings(index: &InvertedIndex, term: &str) -> DocSet {
    DocSet::from_sorted(index.lookup(term).doc_ids().collect())
}

fn universe(index: &InvertedIndex) -> DocSet {
    DocSet::from_sorted(index.doc_ids().collect())
}

/// Intersect the positive children smallest-first, then subtract negated
/// children directly rather than materializing their complements.
fn conjunction(index: &InvertedIndex, children: &[Query]) -> DocSet {
    let mut positive: Vec<DocSet> = Vec::new();
    let mut negative: Vec<DocSet> = Vec::new();
    for child in children {
        match child {
            Query::Not(inner) => negative.push(evaluate(inner, index)),
            other => positive.push(evaluate(other, index)),
        }
    }
    positive.sort_by_key(DocSet::len);

    let mut acc = match positive.split_first() {
        Some((first, rest)) => rest.iter().fold(first.clone(), |acc, set| acc.intersect(set)),
        None => universe(index),
    };
    for set in &negative {
        if acc.is_empty() {
            break;
        }
        acc = acc.difference(set);
    }
    acc
}

/// Documents containing every phrase term at the expected relative offsets.
fn phrase(index: &InvertedIndex, terms: &[PhraseTerm]) -> DocSet {
    let Some((first, rest)) = terms.split_first() else {
        return DocSet::new();
    };
    let candidates = rest
        .iter()
        .fold(postings(index, &first.term), |acc, t| acc.intersect(&postings(index, &t.term)));

    let matches = candidates.iter().filter(|&doc| {
        let Some(anchor) = index.posting(&first.term, doc) else {
            return false;
        };
        anchor.positions.iter().any(|&start| {
            let base = start.checked_sub(first.offset);
            rest.iter().all(|t| {
                let Some(expected) = base.map(|b| b + t.offset) else {
                    return false;
                };
                index
                    .posting(&t.term, doc)
                    .is_some_and(|p| p.positions.binary_search(&expected).is_ok())
            })
        })
    });
    DocSet::from_sorted(matches.collect())
}

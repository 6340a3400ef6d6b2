//! Query expressions: parsing from text and evaluation against an index.

mod docset;
mod eval;
mod parser;

pub use docset::DocSet;
pub use eval::evaluate;
pub use parser::QueryParser;

use serde::{Deserialize, Serialize};
use std::fmt;

/// How bare words without explicit operators are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// Every word must match (implicit AND).
    #[default]
    All,
    /// Plain word lists become a free-text bag; any word may match.
    Any,
}

/// A phrase member and its offset from the first phrase term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhraseTerm {
    pub term: String,
    pub offset: u32,
}

/// Parsed query tree. Leaves hold terms already normalized by the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
pub enum Query {
    Term(String),
    Phrase(Vec<PhraseTerm>),
    And(Vec<Query>),
    Or(Vec<Query>),
    Not(Box<Query>),
    FreeText(Vec<String>),
}

impl Query {
    /// Distinct terms outside any `NOT`, in first-seen order.
    ///
    /// These are the terms the ranker weighs.
    pub fn positive_terms(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        self.collect_positive(&mut out);
        out
    }

    fn collect_positive<'q>(&'q self, out: &mut Vec<&'q str>) {
        fn push<'q>(out: &mut Vec<&'q str>, t: &'q str) {
            if !out.contains(&t) {
                out.push(t);
            }
        }
        match self {
            Query::Term(t) => push(out, t),
            Query::Phrase(terms) => terms.iter().for_each(|p| push(out, &p.term)),
            Query::FreeText(terms) => terms.iter().for_each(|t| push(out, t)),
            Query::And(children) | Query::Or(children) => {
                for child in children {
                    child.collect_positive(out);
                }
            }
            Query::Not(_) => {}
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, children: &[Query], sep: &str) -> fmt::Result {
            write!(f, "(")?;
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    write!(f, " {sep} ")?;
                }
                write!(f, "{child}")?;
            }
            write!(f, ")")
        }
        match self {
            Query::Term(t) => write!(f, "{t}"),
            Query::Phrase(terms) => {
                let words: Vec<&str> = terms.iter().map(|p| p.term.as_str()).collect();
                write!(f, "\"{}\"", words.join(" "))
            }
            Query::And(children) => join(f, children, "AND"),
            Query::Or(children) => join(f, children, "OR"),
            Query::Not(inner) => write!(f, "NOT {inner}"),
            Query::FreeText(terms) => write!(f, "ANY({})", terms.join(" ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_terms_skip_negations() {
        let q = Query::And(vec![
            Query::Term("cat".into()),
            Query::Not(Box::new(Query::Term("dog".into()))),
            Query::Or(vec![Query::Term("sat".into()), Query::Term("cat".into())]),
        ]);
        assert_eq!(q.positive_terms(), vec!["cat", "sat"]);
    }

    #[test]
    fn display() {
        let q = Query::Or(vec![
            Query::Term("a".into()),
            Query::Not(Box::new(Query::Phrase(vec![
                PhraseTerm { term: "b".into(), offset: 0 },
                PhraseTerm { term: "c".into(), offset: 1 },
            ]))),
        ]);
        assert_eq!(q.to_string(), "(a OR NOT \"b c\")");
    }
}

//! Error types shared by the build, query and persistence paths.

use crate::DocId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The same document id was fed to one build twice.
    #[error("duplicate document id: {0}")]
    DuplicateDocumentId(DocId),

    /// Malformed query; `position` is a byte offset into the query string.
    #[error("query syntax error at position {position}: {message}")]
    QuerySyntax { position: usize, message: String },

    /// The query was empty or every operand was a stop word.
    #[error("query contains no searchable terms")]
    QueryEmpty,

    /// An index structure broke one of its own invariants. This is a defect.
    #[error("index invariant violated: {0}")]
    Invariant(String),

    #[error("unsupported index version: {0}")]
    UnsupportedVersion(u32),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding error: {0}")]
    Encode(#[from] bincode::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        Error::QuerySyntax { position, message: message.into() }
    }

    /// Errors the caller can fix by changing the query text.
    pub fn is_query_error(&self) -> bool {
        matches!(self, Error::QuerySyntax { .. } | Error::QueryEmpty)
    }
}

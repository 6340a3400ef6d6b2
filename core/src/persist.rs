//! On-disk export and import of an [`InvertedIndex`].
//!
//! Layout under the index root:
//! - `lexicon.bin`  terms in `TermId` order (bincode)
//! - `postings.bin` one posting list per term, same order (bincode)
//! - `docs.bin`     document table (bincode)
//! - `meta.json`    counts, build time, format version and tokenizer settings

use crate::error::{Error, Result};
use crate::index::{DocEntry, InvertedIndex, Lexicon, PostingList};
use crate::tokenizer::TokenizerConfig;
use crate::DocId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u64,
    pub num_terms: u64,
    pub created_at: String,
    pub version: u32,
    /// Settings the index was built with; queries must tokenize the same way.
    pub tokenizer: TokenizerConfig,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn lexicon(&self) -> PathBuf { self.root.join("lexicon.bin") }
    fn postings(&self) -> PathBuf { self.root.join("postings.bin") }
    fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }

    /// True when all index files are present.
    pub fn exists(&self) -> bool {
        [self.lexicon(), self.postings(), self.docs(), self.meta()].iter().all(|p| p.is_file())
    }
}

fn save_bin<T: Serialize + ?Sized>(path: PathBuf, value: &T) -> Result<()> {
    let mut f = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut f, value)?;
    f.flush()?;
    Ok(())
}

fn load_bin<T: DeserializeOwned>(path: PathBuf) -> Result<T> {
    let f = BufReader::new(File::open(path)?);
    Ok(bincode::deserialize_from(f)?)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    if meta.version != FORMAT_VERSION {
        return Err(Error::UnsupportedVersion(meta.version));
    }
    Ok(meta)
}

/// Write `index` under `paths.root`, recording the tokenizer it was built with.
pub fn save_index(paths: &IndexPaths, index: &InvertedIndex, tokenizer: &TokenizerConfig) -> Result<()> {
    create_dir_all(&paths.root)?;
    save_bin(paths.lexicon(), index.lexicon().terms())?;
    save_bin(paths.postings(), index.posting_lists())?;
    save_bin(paths.docs(), index.documents())?;
    let meta = MetaFile {
        num_docs: index.document_count() as u64,
        num_terms: index.lexicon().len() as u64,
        created_at: OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
        version: FORMAT_VERSION,
        tokenizer: tokenizer.clone(),
    };
    save_meta(paths, &meta)?;
    tracing::info!(root = %paths.root.display(), num_docs = meta.num_docs, num_terms = meta.num_terms, "index saved");
    Ok(())
}

/// Read an index back and check it before handing it out.
pub fn load_index(paths: &IndexPaths) -> Result<(InvertedIndex, MetaFile)> {
    let meta = load_meta(paths)?;
    let terms: Vec<String> = load_bin(paths.lexicon())?;
    let postings: Vec<PostingList> = load_bin(paths.postings())?;
    let documents: BTreeMap<DocId, DocEntry> = load_bin(paths.docs())?;
    if documents.len() as u64 != meta.num_docs || terms.len() as u64 != meta.num_terms {
        return Err(Error::Invariant(format!(
            "meta.json expects {} documents and {} terms, found {} and {}",
            meta.num_docs,
            meta.num_terms,
            documents.len(),
            terms.len()
        )));
    }
    let index = InvertedIndex::from_parts(Lexicon::from_terms(terms)?, postings, documents)?;
    tracing::info!(root = %paths.root.display(), num_docs = meta.num_docs, "index loaded");
    Ok((index, meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Tokenizer;
    use crate::{DocMeta, Document, IndexBuilder};

    #[test]
    fn round_trip_preserves_reads() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let cfg = TokenizerConfig { stemming: true, ..Default::default() };
        let idx = IndexBuilder::new(Tokenizer::new(cfg.clone()))
            .build(vec![
                Document::new(5, "running dogs").with_meta(DocMeta { title: Some("Dogs".into()), ..Default::default() }),
                Document::new(2, "a dog runs home"),
            ])
            .unwrap();
        save_index(&paths, &idx, &cfg).unwrap();
        assert!(paths.exists());

        let (loaded, meta) = load_index(&paths).unwrap();
        assert_eq!(meta.tokenizer, cfg);
        assert_eq!(meta.num_docs, 2);
        for term in idx.vocabulary() {
            assert_eq!(loaded.lookup(term), idx.lookup(term));
            assert_eq!(loaded.document_frequency(term), idx.document_frequency(term));
        }
        for id in [2, 5, 7] {
            assert_eq!(loaded.document_length(id), idx.document_length(id));
        }
        assert_eq!(loaded.document_meta(5).and_then(|m| m.title.as_deref()), Some("Dogs"));
    }

    #[test]
    fn rejects_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let idx = IndexBuilder::new(Tokenizer::default()).build(vec![Document::new(1, "x")]).unwrap();
        save_index(&paths, &idx, &TokenizerConfig::default()).unwrap();
        let mut meta = load_meta(&paths).unwrap();
        meta.version = 99;
        save_meta(&paths, &meta).unwrap();
        assert!(matches!(load_index(&paths), Err(Error::UnsupportedVersion(99))));
    }

    #[test]
    fn missing_files_are_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path().join("nothing"));
        assert!(!paths.exists());
        assert!(matches!(load_index(&paths), Err(Error::Io(_))));
    }
}

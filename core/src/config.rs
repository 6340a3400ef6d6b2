use crate::error::Result;
use crate::query::QueryMode;
use crate::ranker::RankerConfig;
use crate::tokenizer::TokenizerConfig;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Everything needed to reproduce an engine's behaviour. Missing fields
/// fall back to their defaults, so a config file may be partial.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tokenizer: TokenizerConfig,
    pub ranker: RankerConfig,
    pub mode: QueryMode,
}

impl EngineConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranker::IdfMode;
    use crate::tokenizer::StopWords;

    #[test]
    fn partial_json_uses_defaults() {
        let cfg: EngineConfig = serde_json::from_str(
            r#"{ "tokenizer": { "stemming": true, "stop_words": { "custom": ["foo"] } }, "mode": "any" }"#,
        )
        .unwrap();
        assert!(cfg.tokenizer.stemming);
        assert_eq!(cfg.tokenizer.stop_words, StopWords::Custom(vec!["foo".into()]));
        assert_eq!(cfg.tokenizer.max_token_len, 45);
        assert_eq!(cfg.mode, QueryMode::Any);
        assert_eq!(cfg.ranker.idf, IdfMode::Standard);
        assert!(cfg.ranker.length_normalization);
    }

    #[test]
    fn reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quarry.json");
        std::fs::write(&path, r#"{ "ranker": { "idf": "smoothed" } }"#).unwrap();
        let cfg = EngineConfig::from_json_file(&path).unwrap();
        assert_eq!(cfg.ranker.idf, IdfMode::Smoothed);
        assert_eq!(cfg.tokenizer, TokenizerConfig::default());
    }
}

use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer as SnowballStemmer};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{M}\p{N}_']*|\p{N}[\p{L}\p{M}\p{N}_]*").expect("valid regex");
    static ref ENGLISH_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","her","here","hers","herself","him","himself","his","how",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","its","itself",
            "let","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","should","shouldn't","so","some","such",
            "than","that","the","their","theirs","them","themselves","then","there","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","when","where","which","while","who","whom","why","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

/// Final normalization step applied to every surviving token.
///
/// Implementations must be pure: the same input always maps to the same
/// output. Returning an empty string drops the token.
pub trait Normalizer: Send + Sync {
    fn normalize<'a>(&self, token: &'a str) -> Cow<'a, str>;
}

/// Leaves tokens untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Normalizer for Identity {
    fn normalize<'a>(&self, token: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(token)
    }
}

/// English Snowball stemming.
pub struct Stemmer {
    inner: SnowballStemmer,
}

impl Stemmer {
    pub fn english() -> Self {
        Self { inner: SnowballStemmer::create(Algorithm::English) }
    }
}

impl Normalizer for Stemmer {
    fn normalize<'a>(&self, token: &'a str) -> Cow<'a, str> {
        self.inner.stem(token)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopWords {
    #[default]
    English,
    Disabled,
    Custom(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Shortest token kept, in characters.
    pub min_token_len: usize,
    /// Longest token kept, in characters.
    pub max_token_len: usize,
    pub stop_words: StopWords,
    /// Use the English stemmer instead of the identity normalizer.
    pub stemming: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self { min_token_len: 1, max_token_len: 45, stop_words: StopWords::English, stemming: false }
    }
}

/// A normalized term and its offset in the document's word stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub term: String,
    pub position: u32,
}

/// Splits text into normalized terms.
///
/// Holds only immutable configuration, so it can be cloned freely and
/// shared between the index builder and query parser. Both sides must use
/// the same tokenizer or terms will not line up.
#[derive(Clone)]
pub struct Tokenizer {
    config: TokenizerConfig,
    stop_words: Arc<HashSet<String>>,
    normalizer: Arc<dyn Normalizer>,
}

impl fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokenizer")
            .field("config", &self.config)
            .field("stop_words", &self.stop_words.len())
            .finish_non_exhaustive()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(TokenizerConfig::default())
    }
}

impl Tokenizer {
    pub fn new(config: TokenizerConfig) -> Self {
        let stop_words: HashSet<String> = match &config.stop_words {
            StopWords::English => ENGLISH_STOPWORDS.iter().map(|w| w.to_string()).collect(),
            StopWords::Disabled => HashSet::new(),
            StopWords::Custom(words) => words.iter().map(|w| w.to_lowercase()).collect(),
        };
        let normalizer: Arc<dyn Normalizer> = if config.stemming {
            Arc::new(Stemmer::english())
        } else {
            Arc::new(Identity)
        };
        Self { config, stop_words: Arc::new(stop_words), normalizer }
    }

    /// Replace the final normalization step, e.g. with a lemmatizer.
    pub fn with_normalizer(mut self, normalizer: Arc<dyn Normalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    /// Lazily tokenize `text`. Never fails; empty input yields nothing.
    pub fn tokens<'t>(&'t self, text: &str) -> Tokens<'t> {
        let buffer = text.nfkc().collect::<String>().to_lowercase();
        Tokens { tokenizer: self, buffer, cursor: 0, position: 0 }
    }

    /// Terms only, without positions.
    pub fn terms<'t>(&'t self, text: &str) -> impl Iterator<Item = String> + 't {
        self.tokens(text).map(|t| t.term)
    }

    fn filter(&self, raw: &str) -> Option<String> {
        let stripped = raw.strip_suffix("'s").unwrap_or(raw).trim_matches('\'');
        let len = stripped.chars().count();
        if len == 0 || len < self.config.min_token_len || len > self.config.max_token_len {
            return None;
        }
        if self.is_stopword(stripped) {
            return None;
        }
        let term = self.normalizer.normalize(stripped);
        if term.is_empty() {
            return None;
        }
        Some(term.into_owned())
    }
}

/// Iterator returned by [`Tokenizer::tokens`].
pub struct Tokens<'t> {
    tokenizer: &'t Tokenizer,
    buffer: String,
    cursor: usize,
    position: u32,
}

impl Iterator for Tokens<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        while let Some(mat) = RE.find_at(&self.buffer, self.cursor) {
            self.cursor = mat.end();
            let position = self.position;
            self.position += 1;
            if let Some(term) = self.tokenizer.filter(mat.as_str()) {
                return Some(Token { term, position });
            }
        }
        self.cursor = self.buffer.len();
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(tokenizer: &Tokenizer, text: &str) -> Vec<String> {
        tokenizer.terms(text).collect()
    }

    #[test]
    fn basic_tokenize() {
        let t = Tokenizer::default();
        assert_eq!(terms(&t, "The cat, the HAT!"), vec!["cat", "hat"]);
    }

    #[test]
    fn positions_count_dropped_words() {
        let t = Tokenizer::default();
        let toks: Vec<Token> = t.tokens("the cat sat").collect();
        assert_eq!(toks, vec![
            Token { term: "cat".into(), position: 1 },
            Token { term: "sat".into(), position: 2 },
        ]);
    }

    #[test]
    fn empty_and_whitespace_input() {
        let t = Tokenizer::default();
        assert!(terms(&t, "").is_empty());
        assert!(terms(&t, "  \t\n ").is_empty());
        assert!(terms(&t, "?!,.;").is_empty());
    }

    #[test]
    fn restartable() {
        let t = Tokenizer::new(TokenizerConfig { stemming: true, ..Default::default() });
        let text = "Running runners run across the running track";
        assert_eq!(terms(&t, text), terms(&t, text));
    }

    #[test]
    fn min_and_max_length() {
        let t = Tokenizer::new(TokenizerConfig {
            min_token_len: 3,
            max_token_len: 5,
            stop_words: StopWords::Disabled,
            stemming: false,
        });
        assert_eq!(terms(&t, "a to cat horse giraffe"), vec!["cat", "horse"]);
    }

    #[test]
    fn custom_stop_words_are_case_insensitive() {
        let t = Tokenizer::new(TokenizerConfig {
            stop_words: StopWords::Custom(vec!["Foo".into()]),
            ..Default::default()
        });
        assert_eq!(terms(&t, "foo the bar"), vec!["the", "bar"]);
    }

    #[test]
    fn possessives_are_stripped() {
        let t = Tokenizer::default();
        assert_eq!(terms(&t, "Alice's book"), vec!["alice", "book"]);
    }

    #[test]
    fn nfkc_and_numbers() {
        let t = Tokenizer::default();
        assert_eq!(terms(&t, "ﬁle 2024 v2"), vec!["file", "2024", "v2"]);
    }

    #[test]
    fn combining_marks_stay_inside_words() {
        let t = Tokenizer::default();
        let terms: Vec<String> = t.terms("İstanbul").collect();
        assert_eq!(terms, vec!["i\u{307}stanbul"]);
        let terms: Vec<String> = t.terms("नमस्ते दुनिया").collect();
        assert_eq!(terms, vec!["नमस्ते", "दुनिया"]);
    }

    #[test]
    fn stemming_normalizer() {
        let t = Tokenizer::new(TokenizerConfig { stemming: true, ..Default::default() });
        assert_eq!(terms(&t, "cats running"), vec!["cat", "run"]);
    }

    struct Dropper;

    impl Normalizer for Dropper {
        fn normalize<'a>(&self, token: &'a str) -> Cow<'a, str> {
            if token.starts_with('x') { Cow::Borrowed("") } else { Cow::Owned(token.to_uppercase()) }
        }
    }

    #[test]
    fn injected_normalizer_never_yields_empty_terms() {
        let t = Tokenizer::default().with_normalizer(Arc::new(Dropper));
        assert_eq!(terms(&t, "xylophone zebra"), vec!["ZEBRA"]);
    }
}

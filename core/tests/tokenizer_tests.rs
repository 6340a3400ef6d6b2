use quarry_core::tokenizer::{StopWords, TokenizerConfig};
use quarry_core::Tokenizer;

#[test]
fn it_normalizes_and_stems() {
    let t = Tokenizer::new(TokenizerConfig { stemming: true, ..Default::default() });
    let words: Vec<String> = t.terms("Running Runners RUN! The café's menu.").collect();
    // Stemming to "run" should appear
    assert!(words.contains(&"run".to_string()));
    assert!(words.contains(&"menu".to_string()));
    assert!(!words.iter().any(|w| w.is_empty()));
}

#[test]
fn it_filters_stopwords() {
    let t = Tokenizer::default();
    let words: Vec<String> = t.terms("The quick brown fox and the lazy dog").collect();
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
    assert_eq!(words, vec!["quick", "brown", "fox", "lazy", "dog"]);
}

#[test]
fn it_keeps_stopwords_when_disabled() {
    let t = Tokenizer::new(TokenizerConfig { stop_words: StopWords::Disabled, ..Default::default() });
    let words: Vec<String> = t.terms("The fox").collect();
    assert_eq!(words, vec!["the", "fox"]);
}

#[test]
fn it_is_repeatable() {
    let t = Tokenizer::default();
    let text = "Ünïcode, punctuation... and   whitespace\t\tcollapse; don't panic!";
    let a: Vec<_> = t.tokens(text).collect();
    let b: Vec<_> = t.tokens(text).collect();
    assert_eq!(a, b);
    assert!(a.windows(2).all(|w| w[0].position < w[1].position));
}

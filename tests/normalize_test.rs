//! Property tests for the shared text normalizer

use proptest::prelude::*;
use sentiscope::text::{is_stopword, normalize, STRIP_SYMBOLS};

#[test]
fn test_reference_sentence() {
    assert_eq!(normalize("I absolutely Love this!! :)").as_str(), "absolutely love");
}

#[test]
fn test_stopwords_and_punctuation_only() {
    for text in ["the and is", "!!! ??? ...", "The, AND; it's? no!", ":) ;) :-("] {
        assert!(normalize(text).is_empty(), "expected empty output for {text:?}");
    }
}

proptest! {
    #[test]
    fn normalize_is_idempotent(text in "[A-Za-z0-9 !?.,:;'()@#-]{0,80}") {
        let once = normalize(&text);
        let twice = normalize(once.as_str());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn normalize_output_is_clean(text in "[A-Za-z0-9 !?.,:;'()@#-]{0,80}") {
        let normalized = normalize(&text);
        for token in normalized.tokens() {
            prop_assert!(!is_stopword(token));
            prop_assert!(token.chars().all(|c| !c.is_uppercase()));
            let first = token.chars().next().unwrap();
            let last = token.chars().last().unwrap();
            prop_assert!(!STRIP_SYMBOLS.contains(first));
            prop_assert!(!STRIP_SYMBOLS.contains(last));
        }
        prop_assert!(!normalized.as_str().contains("  "));
    }

    #[test]
    fn punctuation_only_normalizes_to_empty(text in "[!?.,:;'()#-]{0,40}") {
        prop_assert!(normalize(&text).is_empty());
    }
}

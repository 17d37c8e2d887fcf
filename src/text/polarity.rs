//! Lexicon-based polarity scoring
//!
//! Scores normalized text in `[-1.0, 1.0]` without any trained model. Used by
//! the live stream listener, which never touches the classifiers.

use std::collections::HashMap;

use super::normalize::{normalize_keeping, NormalizedText};

/// Polarity of common opinion words
const WORD_POLARITY: &[(&str, f64)] = &[
    // Positive
    ("amazing", 0.6),
    ("awesome", 1.0),
    ("beautiful", 0.85),
    ("best", 1.0),
    ("better", 0.5),
    ("brilliant", 0.9),
    ("congrats", 0.6),
    ("cool", 0.35),
    ("delicious", 1.0),
    ("enjoy", 0.4),
    ("excellent", 1.0),
    ("excited", 0.4),
    ("fantastic", 0.4),
    ("fun", 0.3),
    ("glad", 0.5),
    ("good", 0.7),
    ("great", 0.8),
    ("happy", 0.8),
    ("helpful", 0.5),
    ("hope", 0.2),
    ("incredible", 0.9),
    ("kind", 0.6),
    ("like", 0.2),
    ("love", 0.5),
    ("lovely", 0.5),
    ("lucky", 0.6),
    ("nice", 0.6),
    ("perfect", 1.0),
    ("pleasant", 0.7),
    ("proud", 0.8),
    ("safe", 0.5),
    ("smooth", 0.4),
    ("success", 0.5),
    ("thank", 0.4),
    ("thanks", 0.4),
    ("win", 0.8),
    ("wonderful", 1.0),
    ("yay", 0.8),
    // Negative
    ("angry", -0.5),
    ("annoying", -0.8),
    ("awful", -1.0),
    ("bad", -0.7),
    ("boring", -1.0),
    ("broken", -0.4),
    ("cancelled", -0.4),
    ("crash", -0.6),
    ("delay", -0.3),
    ("delayed", -0.3),
    ("disappointed", -0.75),
    ("disappointing", -0.6),
    ("disaster", -0.8),
    ("dirty", -0.6),
    ("fail", -0.5),
    ("fear", -0.4),
    ("hate", -0.8),
    ("horrible", -1.0),
    ("hurt", -0.5),
    ("lost", -0.3),
    ("poor", -0.4),
    ("rude", -0.3),
    ("sad", -0.5),
    ("scary", -0.5),
    ("sick", -0.7),
    ("slow", -0.3),
    ("sorry", -0.5),
    ("stupid", -0.8),
    ("terrible", -1.0),
    ("ugly", -0.7),
    ("upset", -0.6),
    ("useless", -0.5),
    ("worse", -0.4),
    ("worst", -1.0),
    ("wrong", -0.5),
];

/// Words that scale the polarity of the following opinion word
const INTENSIFIERS: &[(&str, f64)] = &[
    ("absolutely", 1.5),
    ("extremely", 1.8),
    ("incredibly", 1.7),
    ("really", 1.4),
    ("so", 1.3),
    ("super", 1.5),
    ("totally", 1.4),
    ("very", 1.3),
    ("slightly", 0.7),
    ("somewhat", 0.8),
];

/// Words that flip the polarity of the following opinion word
const NEGATIONS: &[&str] = &[
    "no", "not", "never", "nothing", "nobody", "none", "neither", "nor",
];

/// Multiplier applied to a negated word
const NEGATION_FACTOR: f64 = -0.5;

/// Opinion lexicon with intensifier and negation handling
#[derive(Debug, Clone)]
pub struct PolarityLexicon {
    words: HashMap<String, f64>,
    intensifiers: HashMap<String, f64>,
}

impl PolarityLexicon {
    /// Lexicon with the built-in word list
    pub fn new() -> Self {
        Self {
            words: WORD_POLARITY.iter().map(|(w, s)| (w.to_string(), *s)).collect(),
            intensifiers: INTENSIFIERS.iter().map(|(w, s)| (w.to_string(), *s)).collect(),
        }
    }

    /// Add or override a word's polarity, clamped to `[-1, 1]`
    pub fn insert(&mut self, word: &str, polarity: f64) {
        self.words.insert(word.to_lowercase(), polarity.clamp(-1.0, 1.0));
    }

    /// Score raw post text, keeping negation words the normalizer would drop
    pub fn score(&self, text: &str) -> f64 {
        self.polarity(&normalize_keeping(text, is_negation))
    }

    /// Average polarity of the opinion words in `text`, 0.0 when none match
    pub fn polarity(&self, text: &NormalizedText) -> f64 {
        let mut scores = Vec::new();
        let mut modifier = 1.0;

        for token in text.tokens() {
            if is_negation(token) {
                modifier *= NEGATION_FACTOR;
                continue;
            }

            if let Some(intensity) = self.intensifiers.get(token) {
                modifier *= intensity;
                continue;
            }

            if let Some(score) = self.words.get(token) {
                scores.push((score * modifier).clamp(-1.0, 1.0));
            }
            modifier = 1.0;
        }

        if scores.is_empty() {
            return 0.0;
        }

        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

impl Default for PolarityLexicon {
    fn default() -> Self {
        Self::new()
    }
}

fn is_negation(token: &str) -> bool {
    NEGATIONS.contains(&token) || token.ends_with("n't")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sentiment;
    use crate::text::normalize;

    #[test]
    fn test_positive_text() {
        let lexicon = PolarityLexicon::new();
        let score = lexicon.polarity(&normalize("What a wonderful day, great crew!"));
        assert!(score > 0.0);
        assert_eq!(Sentiment::from_polarity(score), Sentiment::Positive);
    }

    #[test]
    fn test_negative_text() {
        let lexicon = PolarityLexicon::new();
        let score = lexicon.polarity(&normalize("Worst flight ever, totally awful service"));
        assert!(score < 0.0);
    }

    #[test]
    fn test_neutral_when_no_opinion_words() {
        let lexicon = PolarityLexicon::new();
        assert_eq!(lexicon.polarity(&normalize("Boarding at gate 12")), 0.0);
        assert_eq!(lexicon.polarity(&normalize("")), 0.0);
    }

    #[test]
    fn test_negation_flips_sign() {
        let lexicon = PolarityLexicon::new();
        assert!(lexicon.polarity(&normalize("good")) > 0.0);
        assert!(lexicon.polarity(&normalize("not good")) < 0.0);
        assert!(lexicon.polarity(&normalize("wasn't good")) < 0.0);
    }

    #[test]
    fn test_stopword_negation_flips_sign() {
        let lexicon = PolarityLexicon::new();
        assert!(lexicon.score("no good") < 0.0);
        assert!(lexicon.score("No good options left tonight") < 0.0);
        assert!(lexicon.score("good") > 0.0);
        assert_eq!(lexicon.score("no"), 0.0);
    }

    #[test]
    fn test_intensifier_scales() {
        let lexicon = PolarityLexicon::new();
        let plain = lexicon.polarity(&normalize("good"));
        let strong = lexicon.polarity(&normalize("very good"));
        assert!(strong > plain);
        assert!(strong <= 1.0);
    }

    #[test]
    fn test_custom_word() {
        let mut lexicon = PolarityLexicon::new();
        lexicon.insert("Meh", -3.0);
        assert_eq!(lexicon.polarity(&normalize("meh")), -1.0);
    }
}

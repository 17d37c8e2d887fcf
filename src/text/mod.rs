//! Text cleaning shared by training, serving and the stream listener
//!
//! Every path that turns raw post text into model input goes through
//! [`normalize`], so the feature space seen at training time is the one seen
//! at serving time. The normalizer is versioned by [`NORMALIZER_VERSION`];
//! persisted artifacts record the version they were built with.

pub mod lemmatize;
pub mod normalize;
pub mod polarity;
pub mod stopwords;

pub use lemmatize::Lemmatizer;
pub use normalize::{
    normalize, normalize_keeping, NormalizedText, NORMALIZER_VERSION, STRIP_SYMBOLS,
};
pub use polarity::PolarityLexicon;
pub use stopwords::is_stopword;

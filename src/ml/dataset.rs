//! Labeled training data
//!
//! Loads a CSV with `Text` and `Sentiment` columns and produces the seeded
//! train/validation split used by [`super::train`].

use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

use crate::models::Sentiment;
use crate::utils::error::TrainingError;

/// One labeled example
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledText {
    pub text: String,
    pub label: Sentiment,
}

impl LabeledText {
    pub fn new(text: impl Into<String>, label: Sentiment) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Text")]
    text: String,
    #[serde(rename = "Sentiment")]
    sentiment: String,
}

/// An in-memory labeled corpus
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<LabeledText>,
}

impl Dataset {
    pub fn new(records: Vec<LabeledText>) -> Self {
        Self { records }
    }

    /// Load a CSV file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TrainingError> {
        let reader = csv::Reader::from_path(path.as_ref())?;
        Self::from_csv(reader)
    }

    /// Load CSV data from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TrainingError> {
        Self::from_csv(csv::Reader::from_reader(reader))
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, TrainingError> {
        let mut records = Vec::new();

        for (i, row) in reader.deserialize::<CsvRow>().enumerate() {
            let row = row?;
            // Line 1 is the header
            let line = i + 2;
            let label = row
                .sentiment
                .parse::<Sentiment>()
                .map_err(|label| TrainingError::UnknownLabel { row: line, label })?;
            records.push(LabeledText::new(row.text, label));
        }

        tracing::debug!(rows = records.len(), "Dataset loaded");
        Ok(Self { records })
    }

    pub fn records(&self) -> &[LabeledText] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Examples per label, in [`Sentiment::ALL`] order
    pub fn label_counts(&self) -> [usize; 3] {
        let mut counts = [0; 3];
        for record in &self.records {
            counts[record.label.index()] += 1;
        }
        counts
    }

    /// Shuffle with a seeded RNG and split off `validation_fraction` of the rows
    ///
    /// Both halves always receive at least one row.
    pub fn split(
        &self,
        validation_fraction: f64,
        seed: u64,
    ) -> Result<(Dataset, Dataset), TrainingError> {
        if !(validation_fraction > 0.0 && validation_fraction < 1.0) {
            return Err(TrainingError::InvalidParameter {
                name: "validation_fraction".to_string(),
                reason: format!("must be in (0, 1), got {validation_fraction}"),
            });
        }
        if self.records.len() < 2 {
            return Err(TrainingError::DatasetTooSmall {
                rows: self.records.len(),
                required: 2,
            });
        }

        let mut order: Vec<usize> = (0..self.records.len()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        order.shuffle(&mut rng);

        let n = self.records.len();
        let n_validation = ((n as f64 * validation_fraction).round() as usize).clamp(1, n - 1);
        let (validation_idx, train_idx) = order.split_at(n_validation);

        let pick = |idx: &[usize]| {
            Dataset::new(idx.iter().map(|&i| self.records[i].clone()).collect())
        };
        Ok((pick(train_idx), pick(validation_idx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "Id,Text,Sentiment\n\
        1,I love this airline,positive\n\
        2,Terrible delay,negative\n\
        3,Flight at noon,neutral\n\
        4,Great crew,Positive\n";

    #[test]
    fn test_load_with_extra_columns() {
        let dataset = Dataset::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 4);
        assert_eq!(dataset.records()[0].text, "I love this airline");
        assert_eq!(dataset.records()[3].label, Sentiment::Positive);
        assert_eq!(dataset.label_counts(), [2, 1, 1]);
    }

    #[test]
    fn test_unknown_label_reports_line() {
        let csv = "Text,Sentiment\nfine,positive\nhmm,mixed\n";
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        match err {
            TrainingError::UnknownLabel { row, label } => {
                assert_eq!(row, 3);
                assert_eq!(label, "mixed");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_column() {
        let csv = "Body,Sentiment\nfine,positive\n";
        assert!(matches!(
            Dataset::from_reader(csv.as_bytes()),
            Err(TrainingError::Csv(_))
        ));
    }

    #[test]
    fn test_split_sizes_and_determinism() {
        let records = (0..10)
            .map(|i| LabeledText::new(format!("text {i}"), Sentiment::Neutral))
            .collect();
        let dataset = Dataset::new(records);

        let (train, validation) = dataset.split(0.2, 42).unwrap();
        assert_eq!(train.len(), 8);
        assert_eq!(validation.len(), 2);

        let (train_again, _) = dataset.split(0.2, 42).unwrap();
        assert_eq!(train.records(), train_again.records());

        let (other_seed, _) = dataset.split(0.2, 7).unwrap();
        assert_ne!(train.records(), other_seed.records());
    }

    #[test]
    fn test_split_too_small() {
        let dataset = Dataset::new(vec![LabeledText::new("one", Sentiment::Positive)]);
        assert!(matches!(
            dataset.split(0.2, 42),
            Err(TrainingError::DatasetTooSmall { rows: 1, required: 2 })
        ));
    }
}

//! Sentiment distribution of one classifier's predictions

use serde::Serialize;

use crate::models::Sentiment;

/// Counts and percentages of one label stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub positive_pct: f64,
    pub negative_pct: f64,
    pub neutral_pct: f64,
}

impl Aggregate {
    /// Tally a label stream; `None` when it is empty
    pub fn from_predictions(labels: &[Sentiment]) -> Option<Self> {
        if labels.is_empty() {
            return None;
        }

        let mut counts = [0usize; 3];
        for label in labels {
            counts[label.index()] += 1;
        }

        let total = labels.len();
        let pct = |count: usize| count as f64 * 100.0 / total as f64;

        Some(Self {
            total,
            positive: counts[Sentiment::Positive.index()],
            negative: counts[Sentiment::Negative.index()],
            neutral: counts[Sentiment::Neutral.index()],
            positive_pct: pct(counts[Sentiment::Positive.index()]),
            negative_pct: pct(counts[Sentiment::Negative.index()]),
            neutral_pct: pct(counts[Sentiment::Neutral.index()]),
        })
    }

    pub fn count(&self, sentiment: Sentiment) -> usize {
        match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Negative => self.negative,
            Sentiment::Neutral => self.neutral,
        }
    }

    pub fn percentage(&self, sentiment: Sentiment) -> f64 {
        match sentiment {
            Sentiment::Positive => self.positive_pct,
            Sentiment::Negative => self.negative_pct,
            Sentiment::Neutral => self.neutral_pct,
        }
    }

    /// The most frequent label, earlier labels winning ties
    pub fn dominant(&self) -> Sentiment {
        Sentiment::ALL
            .into_iter()
            .fold(Sentiment::Positive, |best, s| {
                if self.count(s) > self.count(best) {
                    s
                } else {
                    best
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use Sentiment::*;

    #[test]
    fn test_empty_is_none() {
        assert_eq!(Aggregate::from_predictions(&[]), None);
    }

    #[test]
    fn test_seven_two_one() {
        let mut labels = vec![Positive; 7];
        labels.extend([Negative, Negative, Neutral]);

        let aggregate = Aggregate::from_predictions(&labels).unwrap();
        assert_eq!(aggregate.total, 10);
        assert_eq!(
            (aggregate.positive_pct, aggregate.negative_pct, aggregate.neutral_pct),
            (70.0, 20.0, 10.0)
        );
        assert_eq!(aggregate.dominant(), Positive);
    }

    #[test]
    fn test_single_label() {
        let aggregate = Aggregate::from_predictions(&[Neutral]).unwrap();
        assert_eq!(aggregate.percentage(Neutral), 100.0);
        assert_eq!(aggregate.count(Positive), 0);
        assert_eq!(aggregate.dominant(), Neutral);
    }

    fn label() -> impl Strategy<Value = Sentiment> {
        prop_oneof![Just(Positive), Just(Negative), Just(Neutral)]
    }

    proptest! {
        #[test]
        fn prop_percentages_sum_to_hundred(labels in prop::collection::vec(label(), 1..300)) {
            let aggregate = Aggregate::from_predictions(&labels).unwrap();
            let sum = aggregate.positive_pct + aggregate.negative_pct + aggregate.neutral_pct;
            prop_assert!((sum - 100.0).abs() < 1e-9);
            prop_assert_eq!(
                aggregate.positive + aggregate.negative + aggregate.neutral,
                labels.len()
            );
        }
    }
}

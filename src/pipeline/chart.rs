//! Pie chart data for the results page

use serde::Serialize;

use super::aggregate::Aggregate;
use crate::models::Sentiment;

/// Slice colour per label
pub fn color(sentiment: Sentiment) -> &'static str {
    match sentiment {
        Sentiment::Positive => "#158467",
        Sentiment::Negative => "#e84a5f",
        Sentiment::Neutral => "#fddb3a",
    }
}

/// One pie slice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSlice {
    pub category: Sentiment,
    pub value: f64,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieMarker {
    pub colors: Vec<&'static str>,
}

/// A Plotly pie trace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieTrace {
    pub values: Vec<f64>,
    pub labels: Vec<Sentiment>,
    pub hole: f64,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub marker: PieMarker,
    pub textinfo: &'static str,
    pub hoverinfo: &'static str,
}

/// Chart-ready view of an [`Aggregate`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub slices: Vec<ChartSlice>,
    pub trace: PieTrace,
}

impl ChartData {
    pub fn from_aggregate(aggregate: &Aggregate) -> Self {
        let slices: Vec<ChartSlice> = Sentiment::ALL
            .into_iter()
            .map(|category| ChartSlice {
                category,
                value: aggregate.percentage(category),
                color: color(category),
            })
            .collect();

        let trace = PieTrace {
            values: slices.iter().map(|s| s.value).collect(),
            labels: slices.iter().map(|s| s.category).collect(),
            hole: 0.4,
            kind: "pie",
            marker: PieMarker {
                colors: slices.iter().map(|s| s.color).collect(),
            },
            textinfo: "label+percent",
            hoverinfo: "label+percent",
        };

        Self { slices, trace }
    }

    /// Plotly `data` array as JSON
    pub fn plotly_json(&self) -> String {
        serde_json::to_string(&[&self.trace]).unwrap_or_else(|_| "[]".to_string())
    }
}

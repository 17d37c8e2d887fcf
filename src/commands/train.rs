use anyhow::{Context, Result};
use std::path::PathBuf;

use sentiscope::config::Config;
use sentiscope::ml::{self, Dataset};
use sentiscope::models::Sentiment;

/// Train both classifiers and write the three artifacts
pub fn train(config: Config, dataset: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let dataset_path = dataset.unwrap_or_else(|| config.training.dataset.clone());
    let output_dir = output.unwrap_or_else(|| config.models.dir.clone());

    println!("Training Sentiment Classifiers");
    println!("==============================");
    println!("  Dataset: {}", dataset_path.display());
    println!("  Output: {}", output_dir.display());

    let dataset = Dataset::from_path(&dataset_path)
        .with_context(|| format!("Failed to load dataset {}", dataset_path.display()))?;

    let counts = dataset.label_counts();
    println!("  Rows: {}", dataset.len());
    for sentiment in Sentiment::ALL {
        println!("    {sentiment}: {}", counts[sentiment.index()]);
    }

    let options = config.training.options();
    let report = ml::train(&dataset, &options).context("Training failed")?;

    println!();
    println!("Results");
    println!("-------");
    println!("  Vocabulary: {} n-grams", report.vectorizer.len());
    println!(
        "  Split: {} train / {} validation",
        report.train_rows, report.validation_rows
    );
    println!("  Linear SVM accuracy: {:.1}%", report.accuracy_svm * 100.0);
    println!(
        "  Logistic Regression accuracy: {:.1}%",
        report.accuracy_logistic * 100.0
    );
    println!("  Elapsed: {}ms", report.elapsed_ms);

    let written = report
        .into_bundle()
        .save(&output_dir)
        .with_context(|| format!("Failed to write artifacts to {}", output_dir.display()))?;

    println!();
    for path in written {
        println!("  Wrote {}", path.display());
    }

    Ok(())
}

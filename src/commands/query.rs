use anyhow::{Context, Result};
use std::sync::Arc;

use sentiscope::config::Config;
use sentiscope::metrics;
use sentiscope::pipeline::{Aggregate, QueryOutcome, QueryPipeline};
use sentiscope::social::TwitterClient;
use sentiscope::utils::{collapse_whitespace, truncate_text};

const SAMPLE_POSTS: usize = 10;

/// Run a single query from the command line
pub async fn query(
    config: Config,
    term: String,
    since: Option<String>,
    location: String,
    json: bool,
) -> Result<()> {
    let credentials = config.api.credentials()?;
    let client = TwitterClient::with_options(credentials, config.api.client_options())
        .context("Failed to create API client")?;

    metrics::init_metrics();

    let pipeline = QueryPipeline::with_model_dir(
        Arc::new(client),
        config.models.dir.clone(),
        config.search.clone(),
        config.models.primary,
    );

    let outcome = pipeline
        .run_query(&term, since.as_deref().unwrap_or(""), &location)
        .await?;

    let report = match outcome {
        QueryOutcome::NoResults => {
            println!("Could not retrieve any tweets for '{term}'");
            return Ok(());
        }
        QueryOutcome::Results(report) => report,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Sentiment for '{}' ({})", report.search_term, report.location);
    println!("{:=<48}", "");
    println!(
        "  Posts: {} (skipped: {}) in {}ms",
        report.posts.len(),
        report.skipped,
        report.elapsed_ms
    );
    print_aggregate("Linear SVM", &report.svm);
    print_aggregate("Logistic Regression", &report.logistic);
    println!(
        "  Chart: {} ({})",
        report.primary.display_name(),
        report.primary_aggregate().dominant()
    );

    println!();
    for analyzed in report.posts.iter().take(SAMPLE_POSTS) {
        println!(
            "  [{:<8}|{:<8}] @{}: {}",
            analyzed.svm.as_str(),
            analyzed.logistic.as_str(),
            analyzed.post.author_handle,
            truncate_text(&collapse_whitespace(&analyzed.post.text), 80)
        );
    }
    if report.posts.len() > SAMPLE_POSTS {
        println!("  ... and {} more", report.posts.len() - SAMPLE_POSTS);
    }

    Ok(())
}

fn print_aggregate(name: &str, aggregate: &Aggregate) {
    println!(
        "  {name:<20} positive {:>5.1}%  negative {:>5.1}%  neutral {:>5.1}%",
        aggregate.positive_pct, aggregate.negative_pct, aggregate.neutral_pct
    );
}

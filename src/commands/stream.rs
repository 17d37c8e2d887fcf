use anyhow::{Context, Result};
use std::sync::Arc;

use sentiscope::config::Config;
use sentiscope::geo::{find_region, BoundingBox};
use sentiscope::metrics;
use sentiscope::social::{StreamListener, TwitterClient};

/// Print a lexicon verdict for every post in a geographic area
pub async fn stream(config: Config, region: String, bbox: Option<String>) -> Result<()> {
    let (label, bbox) = match bbox {
        Some(value) => (
            value.clone(),
            BoundingBox::parse(&value).with_context(|| {
                format!("Invalid bounding box '{value}', expected lon_min,lat_min,lon_max,lat_max")
            })?,
        ),
        None => {
            let region = find_region(&region)
                .with_context(|| format!("Unknown region '{region}'"))?;
            (region.name.to_string(), region.bbox)
        }
    };

    let credentials = config.api.credentials()?;
    let client = TwitterClient::with_options(credentials, config.api.client_options())
        .context("Failed to create API client")?;

    metrics::init_metrics();

    println!("Listening for posts in {label} (Ctrl-C to stop)");
    println!("{:=<48}", "");

    let listener = StreamListener::new(Arc::new(client), bbox, config.search.language.clone());
    let listen = listener.run(|verdict| {
        metrics::record_stream_verdict(verdict.sentiment.as_str());
        println!("{verdict}");
    });

    tokio::select! {
        result = listen => result.context("Stream listener stopped")?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

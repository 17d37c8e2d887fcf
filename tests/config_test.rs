//! Tests for configuration loading

use serial_test::serial;
use std::io::Write;

use sentiscope::config::{Config, CREDENTIAL_ENV_VARS};
use sentiscope::models::ClassifierKind;

fn clear_env() {
    for var in CREDENTIAL_ENV_VARS {
        std::env::remove_var(var);
    }
    for var in [
        "SENTISCOPE_MAX_POSTS",
        "SENTISCOPE_PORT",
        "SENTISCOPE_PRIMARY_CLASSIFIER",
        "SENTISCOPE_MODEL_DIR",
    ] {
        std::env::remove_var(var);
    }
}

#[test]
fn test_config_file_exists() {
    let config_path = std::path::Path::new("config.toml");
    assert!(
        config_path.exists(),
        "config.toml should exist in project root"
    );
}

#[test]
#[serial]
fn test_sample_config_loads() {
    clear_env();
    let config = Config::load(Some(std::path::Path::new("config.toml"))).unwrap();

    assert_eq!(config.search.max_posts, 500);
    assert_eq!(config.search.radius_km, 3000);
    assert_eq!(config.server.port, 5000);
    assert_eq!(config.models.primary, ClassifierKind::LogisticRegression);
    assert_eq!(config.training.svm_c, 0.05);
    assert_eq!(config.training.logistic_max_iter, 250);

    // The sample ships without credentials
    assert!(config.api.credentials().is_err());
}

#[test]
#[serial]
fn test_credentials_from_environment() {
    clear_env();
    let values = ["ck", "cs", "at", "ats"];
    for (var, value) in CREDENTIAL_ENV_VARS.iter().zip(values) {
        std::env::set_var(var, value);
    }

    let config = Config::from_env().unwrap();
    let credentials = config.api.credentials().unwrap();
    assert!(credentials.missing_fields().is_empty());
    assert_eq!(config.api.consumer_key, "ck");
    assert_eq!(config.api.access_token_secret, "ats");

    clear_env();
}

#[test]
#[serial]
fn test_file_credentials_take_precedence() {
    clear_env();
    std::env::set_var("TWITTER_CONSUMER_KEY", "from-env");

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[api]\nconsumer_key = \"from-file\"").unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.api.consumer_key, "from-file");

    clear_env();
}

#[test]
#[serial]
fn test_env_overrides() {
    clear_env();
    std::env::set_var("SENTISCOPE_MAX_POSTS", "25");
    std::env::set_var("SENTISCOPE_PORT", "8088");
    std::env::set_var("SENTISCOPE_PRIMARY_CLASSIFIER", "svm");
    std::env::set_var("SENTISCOPE_MODEL_DIR", "/tmp/sentiscope-models");

    let config = Config::load(None).unwrap();
    assert_eq!(config.search.max_posts, 25);
    assert_eq!(config.server.port, 8088);
    assert_eq!(config.models.primary, ClassifierKind::Svm);
    assert_eq!(config.models.dir, std::path::PathBuf::from("/tmp/sentiscope-models"));

    clear_env();
}

#[test]
#[serial]
fn test_invalid_primary_classifier() {
    clear_env();
    std::env::set_var("SENTISCOPE_PRIMARY_CLASSIFIER", "random_forest");

    assert!(Config::from_env().is_err());

    clear_env();
}

#[test]
#[serial]
fn test_invalid_file_rejected() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[search]\nmax_posts = 0").unwrap();

    assert!(Config::load(Some(file.path())).is_err());
}

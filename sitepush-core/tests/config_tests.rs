//! Site config loading: error messages, hosting-mode resolution, validation.

use assert_fs::prelude::*;
use predicates::prelude::predicate;
use rstest::rstest;
use sitepush_core::{
    config::{self, DEFAULT_CONFIG_FILE},
    BucketName, ConfigError, HostingMode,
};

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_missing_config_names_the_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = dir.child(DEFAULT_CONFIG_FILE);
    path.assert(predicate::path::missing());

    let err = config::load_at(path.path()).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("sitepush.yaml"));
}

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = dir.child(DEFAULT_CONFIG_FILE);
    path.write_str("buckets: [ { name: unclosed\n").expect("write");

    let err = config::load_at(path.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("sitepush.yaml"));
}

#[test]
fn load_rejects_wrong_shape() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = dir.child(DEFAULT_CONFIG_FILE);
    path.write_str("buckets:\n  - website: { index: index.html }\n").expect("write");

    let err = config::load_at(path.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "missing name must fail: {err}");
}

#[test]
fn load_runs_validation() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = dir.child(DEFAULT_CONFIG_FILE);
    path.write_str("buckets:\n  - name: a\n  - name: b\n  - name: a\n")
        .expect("write");

    let err = config::load_at(path.path()).unwrap_err();
    match err {
        ConfigError::DuplicateBucket { name } => assert_eq!(name, BucketName::from("a")),
        other => panic!("unexpected error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// 2. Hosting mode
// ---------------------------------------------------------------------------

#[rstest]
#[case("name: s\nwebsite: {}\n", "website")]
#[case("name: s\nredirect: { host: example.com }\n", "redirect")]
#[case("name: s\n", "storage-only")]
#[case(
    "name: s\nwebsite: { index: home.html }\nredirect: { host: example.com }\n",
    "website"
)]
fn hosting_mode_resolution(#[case] yaml: &str, #[case] expected: &str) {
    let bucket: sitepush_core::BucketDescriptor = serde_yaml::from_str(yaml).expect("parse");
    assert_eq!(bucket.hosting_mode().label(), expected);
}

#[test]
fn website_documents_are_passed_through() {
    let config = config::parse(
        "buckets:\n  - name: www.example.com\n    website:\n      index: main.html\n      error: oops.html\n",
    )
    .expect("parse");
    let HostingMode::Website(website) = config.buckets[0].hosting_mode() else {
        panic!("expected website mode");
    };
    assert_eq!(website.index, "main.html");
    assert_eq!(website.error.as_deref(), Some("oops.html"));
}

#[test]
fn empty_document_has_no_site_bucket() {
    let config = config::parse("{}").expect("parse");
    assert!(config.buckets.is_empty());
    assert!(matches!(config::site_bucket(&config), Err(ConfigError::NoBuckets)));
}

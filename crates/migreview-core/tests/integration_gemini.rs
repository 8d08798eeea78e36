//! Integration tests against the real Gemini API.
//!
//! These tests need a valid key and network access. Set
//! `TEST_GEMINI_API_KEY` to enable them:
//!
//! ```bash
//! TEST_GEMINI_API_KEY=... cargo test --test integration_gemini
//! ```

use migreview_core::config::ModelConfig;
use migreview_core::llm::client::{ApiKey, GeminiClient};
use migreview_core::review::run_review;
use migreview_core::{ModelErrorKind, OutputMode, ReviewOutcome, Session};

fn get_api_key() -> Option<ApiKey> {
    std::env::var("TEST_GEMINI_API_KEY")
        .ok()
        .and_then(|k| ApiKey::new(k).ok())
}

#[tokio::test]
async fn structured_review_round_trip() {
    let Some(key) = get_api_key() else {
        eprintln!("Skipping: TEST_GEMINI_API_KEY not set");
        return;
    };

    let client = GeminiClient::new(key, &ModelConfig::default()).unwrap();
    let session = Session::new();
    let request = session.review_request(
        "CREATE TABLE users (id BIGINT PRIMARY KEY, nickname TEXT);",
        "ALTER TABLE users ALTER COLUMN nickname SET NOT NULL;",
        OutputMode::Structured,
    );

    match run_review(&client, &request).await {
        Ok(ReviewOutcome::Structured(result)) => {
            assert!(!result.summary.is_empty());
        }
        Ok(other) => panic!("Expected structured outcome, got {:?}", other),
        // The model is free to wander off format; that must still surface
        // as an interpretation error with the raw text attached.
        Err(e) => assert!(e.raw_response().is_some(), "unexpected error: {}", e),
    }
}

#[tokio::test]
async fn invalid_key_is_auth_error() {
    if get_api_key().is_none() {
        eprintln!("Skipping: TEST_GEMINI_API_KEY not set");
        return;
    }

    let client = GeminiClient::new(
        ApiKey::new("definitely-not-a-valid-key").unwrap(),
        &ModelConfig::default(),
    )
    .unwrap();
    let request = Session::new().review_request("CREATE TABLE t (id int);", "DROP TABLE t;", OutputMode::Plain);

    let err = run_review(&client, &request).await.unwrap_err();
    assert_eq!(err.model_kind(), Some(ModelErrorKind::Auth));
}

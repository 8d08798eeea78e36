//! # Review Orchestration
//!
//! One review is one round trip: build the prompt, send it, interpret the
//! answer. `run_review` does exactly that and nothing else; there is no retry
//! and no state is touched. `run_cancellable` lets the caller abort a review
//! that is waiting on the model.

pub mod request;
pub mod result;

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{MigReviewError, Result};
use crate::llm::client::{ModelClient, MODEL_ID};
use crate::llm::parse::interpret;
use crate::llm::prompt::build_prompt;

use self::request::ReviewRequest;
use self::result::ReviewOutcome;

/// Send one review request and interpret the answer.
pub async fn run_review<C: ModelClient>(client: &C, request: &ReviewRequest) -> Result<ReviewOutcome> {
    if request.current_schema.trim().is_empty() {
        return Err(MigReviewError::MissingInput { field: "schema" });
    }
    if request.planned_ddl.trim().is_empty() {
        return Err(MigReviewError::MissingInput { field: "DDL" });
    }

    let prompt = build_prompt(request);
    tracing::debug!(
        "Review prompt built: mode={}, rulebook={}, incidents={}, {} bytes",
        request.output_mode,
        request.rulebook.is_some(),
        request.incidents.is_some(),
        prompt.len(),
    );

    let raw = client.generate(&prompt).await?;

    interpret(&raw, request.output_mode).inspect_err(|e| {
        tracing::warn!("Could not interpret model response: {}", e);
    })
}

/// Race a review against a cancellation signal.
///
/// If `cancel` completes first the review future is dropped, which aborts
/// the in-flight HTTP request, and `MigReviewError::Cancelled` is returned.
pub async fn run_cancellable<T, F, S>(review: F, cancel: S) -> Result<T>
where
    F: Future<Output = Result<T>>,
    S: Future<Output = ()>,
{
    tokio::select! {
        biased;
        _ = cancel => {
            tracing::info!("Review cancelled by user");
            Err(MigReviewError::Cancelled)
        }
        outcome = review => outcome,
    }
}

/// Machine-readable record of a finished review.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewReport {
    pub model: &'static str,
    pub reviewed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: ReviewOutcome,
}

impl ReviewReport {
    pub fn new(outcome: ReviewOutcome) -> Self {
        Self {
            model: MODEL_ID,
            reviewed_at: Utc::now(),
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::request::OutputMode;
    use std::sync::Mutex;

    struct EchoClient {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl EchoClient {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl ModelClient for EchoClient {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    #[tokio::test]
    async fn test_run_review_plain() {
        let client = EchoClient::new("問題ありません");
        let req = ReviewRequest::new("CREATE TABLE t (id int);", "ALTER TABLE t ADD c int;", OutputMode::Plain);

        let outcome = run_review(&client, &req).await.unwrap();
        assert_eq!(outcome, ReviewOutcome::Plain("問題ありません".to_string()));

        let prompts = client.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("ALTER TABLE t ADD c int;"));
    }

    #[tokio::test]
    async fn test_run_review_rejects_empty_inputs_without_calling_model() {
        let client = EchoClient::new("unused");
        let req = ReviewRequest::new("   ", "DROP TABLE t;", OutputMode::Plain);

        let err = run_review(&client, &req).await.unwrap_err();
        assert!(matches!(err, MigReviewError::MissingInput { field: "schema" }));

        let req = ReviewRequest::new("CREATE TABLE t (id int);", "\n", OutputMode::Plain);
        let err = run_review(&client, &req).await.unwrap_err();
        assert!(matches!(err, MigReviewError::MissingInput { field: "DDL" }));
        assert!(err.to_string().starts_with("No DDL provided"));

        assert!(client.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_review_structured_parse_error_keeps_raw() {
        let client = EchoClient::new("```json\n{\"a\":}\n```");
        let req = ReviewRequest::new("s", "d", OutputMode::Structured);

        let err = run_review(&client, &req).await.unwrap_err();
        assert_eq!(err.raw_response(), Some("```json\n{\"a\":}\n```"));
    }

    #[tokio::test]
    async fn test_run_cancellable_cancels() {
        let review = std::future::pending::<Result<u32>>();
        let result = run_cancellable(review, async {}).await;
        assert!(matches!(result, Err(MigReviewError::Cancelled)));
    }

    #[tokio::test]
    async fn test_run_cancellable_passes_result_through() {
        let review = async { Ok(7u32) };
        let result = run_cancellable(review, std::future::pending::<()>()).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn test_report_serialization() {
        let report = ReviewReport::new(ReviewOutcome::Plain("ok".to_string()));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["model"], "gemini-2.0-flash");
        assert_eq!(json["mode"], "plain");
        assert_eq!(json["result"], "ok");
        assert!(json["reviewed_at"].is_string());
    }
}

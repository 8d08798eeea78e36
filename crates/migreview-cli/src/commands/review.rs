use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use migreview_core::config::MigReviewConfig;
use migreview_core::llm::client::{ApiKey, GeminiClient, MODEL_ID};
use migreview_core::review::{run_cancellable, run_review, ReviewReport};
use migreview_core::{MigReviewError, OutputMode, Session};

use crate::args::{ReportFormat, ReviewArgs};
use crate::render;

/// Review one migration read from files and print the result.
/// Any failure, including an answer that could not be interpreted, exits 1.
pub async fn run(args: &ReviewArgs, config: &MigReviewConfig) -> Result<()> {
    let schema = read_input(&args.schema)?;
    let ddl = read_input(&args.ddl)?;

    let mut session = Session::from_config(config)?;
    if let Some(path) = &args.rules {
        session.save_rulebook(read_input(path)?);
    }
    if let Some(path) = &args.incidents {
        session.save_incidents(read_input(path)?);
    }
    if args.no_context {
        session.save_rulebook("");
        session.save_incidents("");
    }

    let key = args
        .api_key
        .as_deref()
        .ok_or(MigReviewError::MissingCredential)
        .and_then(ApiKey::new)?;
    let client = GeminiClient::new(key, &config.model)?;

    let mode = args
        .output
        .map(OutputMode::from)
        .or(config.review.output)
        .unwrap_or_default();
    let request = session.review_request(schema, ddl, mode);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(format!("Reviewing with {}...", MODEL_ID));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let cancel = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    let outcome = run_cancellable(run_review(&client, &request), cancel).await;
    pb.finish_and_clear();

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(err) => {
            if let Some(raw) = err.raw_response() {
                let mut stderr = std::io::stderr().lock();
                render::render_raw(&mut stderr, raw)?;
            }
            return Err(err).context("Review failed");
        }
    };

    match args.format {
        ReportFormat::Json => {
            let report = ReviewReport::new(outcome);
            let json =
                serde_json::to_string_pretty(&report).context("Failed to serialize review")?;
            println!("{}", json);
        }
        ReportFormat::Text => {
            let mut stdout = std::io::stdout().lock();
            render::render_outcome(&mut stdout, &outcome)?;
        }
    }

    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        MigReviewError::Input {
            message: format!("Failed to read {}", path.display()),
            source: e,
        }
        .into()
    })
}

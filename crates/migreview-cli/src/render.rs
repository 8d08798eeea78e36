//! Terminal rendering of review outcomes and errors.

use std::io::{self, Write};

use comfy_table::{Cell, Color, Table as ComfyTable};

use migreview_core::review::result::{ReviewOutcome, Score, SeverityTier, StructuredReviewResult};
use migreview_core::MigReviewError;

pub fn render_outcome(out: &mut impl Write, outcome: &ReviewOutcome) -> io::Result<()> {
    match outcome {
        ReviewOutcome::Plain(text) => {
            writeln!(out, "━━━ Review ━━━")?;
            writeln!(out, "{}", text.trim_end())
        }
        ReviewOutcome::Structured(result) => render_structured(out, result),
    }
}

pub fn render_structured(out: &mut impl Write, result: &StructuredReviewResult) -> io::Result<()> {
    writeln!(
        out,
        "Overall score: {}/100 ({})   Recommendation: {}",
        result.overall_score,
        result.overall_score.tier().label(),
        result.execution_recommendation,
    )?;
    writeln!(out, "{}", result.summary)?;
    writeln!(out)?;

    writeln!(out, "━━━ General analysis ━━━")?;
    let general = &result.general_analysis;
    let mut t = ComfyTable::new();
    t.set_header(vec!["Aspect", "Score", "Details"]);
    for (aspect, finding) in [
        ("Data loss risk", &general.data_loss_risk),
        ("Performance impact", &general.performance_impact),
        ("Downtime required", &general.downtime_required),
    ] {
        t.add_row(vec![
            Cell::new(aspect),
            score_cell(finding.score),
            Cell::new(&finding.description),
        ]);
    }
    writeln!(out, "{}", t)?;
    writeln!(out)?;

    writeln!(out, "━━━ Rulebook ━━━")?;
    let rulebook = &result.rulebook_analysis;
    if !rulebook.violations.is_empty() {
        let mut t = ComfyTable::new();
        t.set_header(vec!["Rule", "Severity", "Problem", "Recommendation"]);
        for v in &rulebook.violations {
            t.add_row(vec![
                Cell::new(&v.rule),
                score_cell(v.severity),
                Cell::new(&v.description),
                Cell::new(&v.recommendation),
            ]);
        }
        writeln!(out, "{}", t)?;
    }
    match &rulebook.no_violations {
        Some(note) => writeln!(out, "{}", note)?,
        None if rulebook.violations.is_empty() => writeln!(out, "No rulebook findings.")?,
        None => {}
    }
    writeln!(out)?;

    writeln!(out, "━━━ Past incidents ━━━")?;
    let incidents = &result.incident_analysis;
    if !incidents.similar_incidents.is_empty() {
        let mut t = ComfyTable::new();
        t.set_header(vec!["Incident", "Risk", "Precautions"]);
        for i in &incidents.similar_incidents {
            t.add_row(vec![
                Cell::new(&i.incident),
                score_cell(i.risk_level),
                Cell::new(&i.precautions),
            ]);
        }
        writeln!(out, "{}", t)?;
    }
    match &incidents.no_similar_incidents {
        Some(note) => writeln!(out, "{}", note)?,
        None if incidents.similar_incidents.is_empty() => {
            writeln!(out, "No similar incidents reported.")?
        }
        None => {}
    }

    Ok(())
}

/// Error line plus, for interpretation failures, a pointer to (or the body
/// of) the raw model response.
pub fn render_error(out: &mut impl Write, err: &anyhow::Error, show_raw: bool) -> io::Result<()> {
    writeln!(out, "Error: {:#}", err)?;

    let Some(review_err) = err.downcast_ref::<MigReviewError>() else {
        return Ok(());
    };

    if let Some(raw) = review_err.raw_response() {
        if show_raw {
            render_raw(out, raw)?;
        } else {
            writeln!(out, "Type `raw` to see the model's full response.")?;
        }
    }
    if matches!(review_err, MigReviewError::MissingCredential) {
        writeln!(out, "Set a key with the `key` command.")?;
    }
    Ok(())
}

pub fn render_raw(out: &mut impl Write, raw: &str) -> io::Result<()> {
    writeln!(out, "━━━ Raw model response ━━━")?;
    writeln!(out, "{}", raw)?;
    writeln!(out, "━━━━━━━━━━━━━━━━━━━━━━━━━━")
}

fn score_cell(score: Score) -> Cell {
    let tier = score.tier();
    let color = match tier {
        SeverityTier::Low => Color::Green,
        SeverityTier::Medium => Color::Yellow,
        SeverityTier::High => Color::Red,
    };
    Cell::new(format!("{} ({})", score, tier.label())).fg(color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use migreview_core::llm::parse::parse_structured;

    fn sample() -> StructuredReviewResult {
        parse_structured(&migreview_testutil::fenced_structured_response()).unwrap()
    }

    fn rendered(outcome: &ReviewOutcome) -> String {
        let mut buf = Vec::new();
        render_outcome(&mut buf, outcome).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_render_structured_shows_tiers() {
        let text = rendered(&ReviewOutcome::Structured(sample()));
        assert!(text.contains("Overall score: 68/100"));
        assert!(text.contains("要注意"));
        assert!(text.contains("80 (high)"));
        assert!(text.contains("30 (medium)"));
        assert!(text.contains("15 (low)"));
        assert!(text.contains("65 (medium)"));
        assert!(text.contains("lock_timeout"));
    }

    #[test]
    fn test_render_no_violation_note() {
        let mut result = sample();
        result.rulebook_analysis.violations.clear();
        result.rulebook_analysis.no_violations = Some("ルール違反はありません".to_string());

        let text = rendered(&ReviewOutcome::Structured(result));
        assert!(text.contains("ルール違反はありません"));
        assert!(!text.contains("Recommendation |"));
    }

    #[test]
    fn test_render_plain() {
        let text = rendered(&ReviewOutcome::Plain("問題ありません\n\n".to_string()));
        assert!(text.ends_with("問題ありません\n"));
    }

    #[test]
    fn test_render_parse_error_hides_raw_until_asked() {
        let err = anyhow::Error::new(MigReviewError::Parse {
            message: "expected value at line 1 column 6".to_string(),
            raw: "{\"a\":}".to_string(),
        });

        let mut buf = Vec::new();
        render_error(&mut buf, &err, false).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("expected value"));
        assert!(text.contains("Type `raw`"));
        assert!(!text.contains("{\"a\":}"));

        let mut buf = Vec::new();
        render_error(&mut buf, &err, true).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("{\"a\":}"));
    }
}

//! # Prompt Templates
//!
//! Builds the review prompt from a `ReviewRequest`. The schema, DDL, rulebook
//! and incident text are inserted verbatim; nothing is escaped or truncated.
//! The rulebook and incident sections (and their parts of the JSON format)
//! only appear when that context was supplied.

use crate::review::request::{OutputMode, ReviewRequest};
use crate::review::result::ExecutionRecommendation;

/// Heading of the rulebook section.
pub const RULEBOOK_HEADING: &str = "## ルールブック";

/// Heading of the incident-history section.
pub const INCIDENT_HEADING: &str = "## 過去のインシデント";

const PREAMBLE: &str = "あなたはデータベースのスキーママイグレーションをレビューする専門家です。\n以下のSQLスキーマ変更を実行してよいか、安全性の観点から分析してください。";

/// Build the full prompt for a review request.
pub fn build_prompt(request: &ReviewRequest) -> String {
    let mut prompt = String::new();

    prompt.push_str(PREAMBLE);
    prompt.push_str("\n\n## 現在のスキーマ\n");
    prompt.push_str(&request.current_schema);
    prompt.push_str("\n\n## 実行予定のDDL\n");
    prompt.push_str(&request.planned_ddl);
    prompt.push('\n');

    if let Some(rulebook) = &request.rulebook {
        prompt.push_str(&format!(
            "\n{}\n次のルールブックの各ルールに照らして違反がないか確認してください。\n{}\n",
            RULEBOOK_HEADING, rulebook
        ));
    }

    if let Some(incidents) = &request.incidents {
        prompt.push_str(&format!(
            "\n{}\n次の過去のインシデントと今回の変更を比較し、類似するものがないか確認してください。\n{}\n",
            INCIDENT_HEADING, incidents
        ));
    }

    prompt.push('\n');
    match request.output_mode {
        OutputMode::Plain => prompt.push_str(&plain_instructions(request)),
        OutputMode::Structured => prompt.push_str(&structured_instructions(request)),
    }

    prompt
}

fn plain_instructions(request: &ReviewRequest) -> String {
    let mut out = String::from(
        "## 回答形式\n一般的な観点から、次の4点について分析してください：\n\
         1. データ損失のリスク\n\
         2. パフォーマンスへの影響\n\
         3. ダウンタイムの必要性\n\
         4. 推奨される実行方法\n",
    );

    if request.rulebook.is_some() {
        out.push_str(
            "\nルールブックに基づく分析として、各ルールに対する違反の有無、\
             違反がある場合の具体的な問題点、改善のための推奨事項を示してください。\n",
        );
    }
    if request.incidents.is_some() {
        out.push_str(
            "\n過去のインシデントとの比較として、類似するインシデント、\
             想定されるリスク、取るべき予防策を示してください。\n",
        );
    }

    out
}

fn structured_instructions(request: &ReviewRequest) -> String {
    let mut fields = vec![r#"  "general_analysis": {
    "data_loss_risk": {"score": 0-100の数値スコア, "description": "データ損失リスクの説明"},
    "performance_impact": {"score": 0-100の数値スコア, "description": "パフォーマンスへの影響の説明"},
    "downtime_required": {"score": 0-100の数値スコア, "description": "必要なダウンタイムの説明"}
  }"#
    .to_string()];

    if request.rulebook.is_some() {
        fields.push(
            r#"  "rulebook_analysis": {
    "violations": [
      {"rule": "違反したルール", "severity": 0-100の数値スコア, "description": "問題点", "recommendation": "改善のための推奨事項"}
    ],
    "no_violations": "違反がない場合のみ、その旨の説明"
  }"#
            .to_string(),
        );
    }

    if request.incidents.is_some() {
        fields.push(
            r#"  "incident_analysis": {
    "similar_incidents": [
      {"incident": "類似する過去のインシデント", "risk_level": 0-100の数値スコア, "precautions": "取るべき予防策"}
    ],
    "no_similar_incidents": "類似するインシデントがない場合のみ、その旨の説明"
  }"#
            .to_string(),
        );
    }

    let choices: Vec<String> = ExecutionRecommendation::ALL
        .iter()
        .map(|r| format!("\"{}\"", r.as_str()))
        .collect();

    fields.push("  \"overall_score\": 0-100の数値スコア".to_string());
    fields.push(format!(
        "  \"execution_recommendation\": {} のいずれか",
        choices.join(" | ")
    ));
    fields.push("  \"summary\": \"レビュー全体の要約\"".to_string());

    format!(
        "## 回答形式\n次の形式のJSONオブジェクトのみを返してください。JSONの前後に説明文を付けないでください。\n\
         スコアはすべて0から100の整数で、値が大きいほどリスクが高いことを表します。\n\
         {{\n{}\n}}\n",
        fields.join(",\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = "CREATE TABLE users (\n  id BIGINT PRIMARY KEY,\n  email TEXT\n);";
    const DDL: &str = "ALTER TABLE users ALTER COLUMN email SET NOT NULL;";

    fn request(mode: OutputMode) -> ReviewRequest {
        ReviewRequest::new(SCHEMA, DDL, mode)
    }

    #[test]
    fn test_prompt_embeds_inputs_verbatim() {
        for mode in [OutputMode::Plain, OutputMode::Structured] {
            let prompt = build_prompt(&request(mode));
            assert!(prompt.contains(SCHEMA));
            assert!(prompt.contains(DDL));
        }
    }

    #[test]
    fn test_prompt_does_not_escape_user_text() {
        let req = ReviewRequest::new("{\"weird\": `x`}\n```", "DROP TABLE \"a\";", OutputMode::Structured);
        let prompt = build_prompt(&req);
        assert!(prompt.contains("{\"weird\": `x`}\n```"));
        assert!(prompt.contains("DROP TABLE \"a\";"));
    }

    #[test]
    fn test_rulebook_section_only_when_present() {
        let without = build_prompt(&request(OutputMode::Plain));
        assert!(!without.contains(RULEBOOK_HEADING));

        let with = build_prompt(&request(OutputMode::Plain).with_rulebook("1. 本番でDROPしない"));
        assert!(with.contains(RULEBOOK_HEADING));
        assert!(with.contains("1. 本番でDROPしない"));
        assert!(with.contains("違反の有無"));
    }

    #[test]
    fn test_incident_section_only_when_present() {
        let without = build_prompt(&request(OutputMode::Structured));
        assert!(!without.contains(INCIDENT_HEADING));
        assert!(!without.contains("incident_analysis"));

        let with = build_prompt(
            &request(OutputMode::Structured).with_incidents("2023-04: ロック待ちで障害"),
        );
        assert!(with.contains(INCIDENT_HEADING));
        assert!(with.contains("2023-04: ロック待ちで障害"));
        assert!(with.contains("\"similar_incidents\""));
        assert!(with.contains("\"no_similar_incidents\""));
    }

    #[test]
    fn test_plain_mode_asks_four_questions() {
        let prompt = build_prompt(&request(OutputMode::Plain));
        assert!(prompt.contains("1. データ損失のリスク"));
        assert!(prompt.contains("4. 推奨される実行方法"));
        assert!(!prompt.contains("general_analysis"));
    }

    #[test]
    fn test_structured_mode_lists_field_names() {
        let prompt = build_prompt(
            &request(OutputMode::Structured)
                .with_rulebook("rules")
                .with_incidents("incidents"),
        );
        for field in [
            "general_analysis",
            "data_loss_risk",
            "performance_impact",
            "downtime_required",
            "rulebook_analysis",
            "violations",
            "severity",
            "no_violations",
            "incident_analysis",
            "risk_level",
            "overall_score",
            "execution_recommendation",
            "summary",
        ] {
            assert!(prompt.contains(&format!("\"{}\"", field)), "missing {}", field);
        }
        assert!(prompt.contains("0-100の数値スコア"));
        assert!(prompt.contains("\"実行推奨\" | \"要注意\" | \"実行非推奨\""));
    }

    #[test]
    fn test_structured_without_rulebook_omits_rulebook_fields() {
        let prompt = build_prompt(&request(OutputMode::Structured));
        assert!(!prompt.contains("rulebook_analysis"));
        assert!(prompt.contains("\"overall_score\""));
    }
}

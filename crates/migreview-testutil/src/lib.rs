use std::collections::VecDeque;
use std::sync::Mutex;

use migreview_core::error::{MigReviewError, Result};
use migreview_core::llm::client::ModelClient;

/// Schema for a small ecommerce database.
pub const ECOMMERCE_SCHEMA: &str = "\
CREATE TABLE users (
  id BIGSERIAL PRIMARY KEY,
  email VARCHAR(255) NOT NULL UNIQUE,
  display_name VARCHAR(100),
  created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE orders (
  id BIGSERIAL PRIMARY KEY,
  user_id BIGINT NOT NULL REFERENCES users(id),
  total NUMERIC(10,2) NOT NULL,
  status VARCHAR(20) NOT NULL
);

CREATE INDEX orders_user_id_idx ON orders (user_id);";

/// A migration that tightens a nullable column.
pub const ADD_NOT_NULL_DDL: &str = "ALTER TABLE users ALTER COLUMN display_name SET NOT NULL;";

/// A migration that drops an index still used by queries.
pub const DROP_INDEX_DDL: &str = "DROP INDEX orders_user_id_idx;";

/// A valid structured answer wrapped in a `json` code fence with prose
/// around it, the way Gemini usually replies.
pub fn fenced_structured_response() -> String {
    format!(
        "レビュー結果は以下のとおりです。\n```json\n{}\n```\nご確認ください。",
        serde_json::to_string_pretty(&structured_response_value()).unwrap_or_default()
    )
}

/// The structured answer as a JSON value.
pub fn structured_response_value() -> serde_json::Value {
    serde_json::json!({
        "general_analysis": {
            "data_loss_risk": {"score": 15, "description": "データは削除されないが、NULL行があるとDDLが失敗する"},
            "performance_impact": {"score": 45, "description": "全行スキャンで制約を検証する"},
            "downtime_required": {"score": 72, "description": "検証中はACCESS EXCLUSIVEロックが保持される"}
        },
        "rulebook_analysis": {
            "violations": [
                {
                    "rule": "1. NOT NULL制約を追加する場合は、既存のデータがNULLでないことを確認すること",
                    "severity": 80,
                    "description": "display_nameにNULLが残っているか確認されていない",
                    "recommendation": "UPDATEでNULLを埋めてから制約を追加する"
                },
                {
                    "rule": "3. カラムの型を変更する場合は、データの切り捨てが発生しないことを確認すること",
                    "severity": 30,
                    "description": "型変更は含まれないが、display_nameの既存値の長さが確認されていない",
                    "recommendation": "最大長を確認してから制約を追加する"
                }
            ]
        },
        "incident_analysis": {
            "similar_incidents": [
                {
                    "incident": "注文テーブルへのNOT NULLカラム追加で長時間ロック",
                    "risk_level": 65,
                    "precautions": "低負荷の時間帯に実行し、lock_timeoutを設定する"
                }
            ]
        },
        "overall_score": 68,
        "execution_recommendation": "要注意",
        "summary": "NULLデータの解消とロック時間の見積もりを行ってから実行してください"
    })
}

/// A `ModelClient` that replays canned answers in order and records every
/// prompt it was given.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful answer.
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()));
        self
    }

    /// Queue a failure.
    pub fn fail(self, error: MigReviewError) -> Self {
        self.push(Err(error));
        self
    }

    fn push(&self, reply: Result<String>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
    }

    /// Every prompt received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts().len()
    }
}

impl ModelClient for ScriptedClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front())
            .unwrap_or_else(|| Err(MigReviewError::Other("ScriptedClient has no reply queued".to_string())))
    }
}

//! # Session State
//!
//! A `Session` holds what survives between actions of one interactive run:
//! the rulebook, the incident log and the API key. It is created with the
//! built-in defaults (or the files named in `migreview.toml`), changed only
//! by explicit saves, and dropped when the run ends. Nothing is written to
//! disk.

use crate::config::MigReviewConfig;
use crate::error::Result;
use crate::llm::client::ApiKey;
use crate::review::request::{OutputMode, ReviewRequest};

/// Rulebook used until the user saves their own.
pub const DEFAULT_RULEBOOK: &str = "\
1. NOT NULL制約を追加する場合は、既存のデータがNULLでないことを確認すること
2. 外部キー制約を追加する場合は、参照整合性が保たれていることを確認すること
3. カラムの型を変更する場合は、データの切り捨てが発生しないことを確認すること
4. インデックスを削除する場合は、パフォーマンスへの影響を確認すること
";

/// Incident log used until the user saves their own.
pub const DEFAULT_INCIDENTS: &str = "\
- 注文テーブルにNOT NULL制約付きカラムをデフォルト値なしで追加し、既存行の更新でテーブルロックが長時間続いた
- 使われていないと判断したインデックスを削除した結果、月次バッチのクエリがフルスキャンになりタイムアウトした
- VARCHAR(255)からVARCHAR(100)への変更で、既存データの一部が切り捨てられた
";

/// The session's migration rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulebookConfig {
    pub text: String,
}

impl Default for RulebookConfig {
    fn default() -> Self {
        Self {
            text: DEFAULT_RULEBOOK.to_string(),
        }
    }
}

/// The session's history of past migration incidents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidentLog {
    pub text: String,
}

impl Default for IncidentLog {
    fn default() -> Self {
        Self {
            text: DEFAULT_INCIDENTS.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    rulebook: RulebookConfig,
    incidents: IncidentLog,
    api_key: Option<ApiKey>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session, taking the starting rulebook and incident log from
    /// the `[session]` files when they are configured.
    pub fn from_config(config: &MigReviewConfig) -> Result<Self> {
        let mut session = Self::new();
        if let Some(text) = config.initial_rulebook()? {
            session.rulebook.text = text;
        }
        if let Some(text) = config.initial_incidents()? {
            session.incidents.text = text;
        }
        Ok(session)
    }

    pub fn rulebook(&self) -> &str {
        &self.rulebook.text
    }

    pub fn incidents(&self) -> &str {
        &self.incidents.text
    }

    pub fn save_rulebook(&mut self, text: impl Into<String>) {
        self.rulebook.text = text.into();
        tracing::debug!("Rulebook saved ({} bytes)", self.rulebook.text.len());
    }

    pub fn save_incidents(&mut self, text: impl Into<String>) {
        self.incidents.text = text.into();
        tracing::debug!("Incident log saved ({} bytes)", self.incidents.text.len());
    }

    pub fn reset_rulebook(&mut self) {
        self.rulebook = RulebookConfig::default();
    }

    pub fn reset_incidents(&mut self) {
        self.incidents = IncidentLog::default();
    }

    pub fn api_key(&self) -> Option<&ApiKey> {
        self.api_key.as_ref()
    }

    pub fn set_api_key(&mut self, key: ApiKey) {
        self.api_key = Some(key);
    }

    /// Build a request carrying the session's current rulebook and
    /// incident log.
    pub fn review_request(
        &self,
        current_schema: impl Into<String>,
        planned_ddl: impl Into<String>,
        output_mode: OutputMode,
    ) -> ReviewRequest {
        ReviewRequest::new(current_schema, planned_ddl, output_mode)
            .with_rulebook(self.rulebook.text.as_str())
            .with_incidents(self.incidents.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::prompt::build_prompt;

    #[test]
    fn test_new_session_uses_defaults() {
        let session = Session::new();
        assert_eq!(session.rulebook(), DEFAULT_RULEBOOK);
        assert_eq!(session.incidents(), DEFAULT_INCIDENTS);
        assert!(session.api_key().is_none());
    }

    #[test]
    fn test_default_rulebook_rules() {
        let rules: Vec<&str> = DEFAULT_RULEBOOK.lines().collect();
        assert_eq!(rules.len(), 4);
        assert!(rules[0].starts_with("1. NOT NULL制約"));
        assert!(rules[1].starts_with("2. 外部キー制約"));
        assert!(rules[2].starts_with("3. カラムの型を変更"));
        assert!(rules[3].starts_with("4. インデックスを削除"));
    }

    #[test]
    fn test_saved_rulebook_reaches_prompt() {
        let mut session = Session::new();
        session.save_rulebook("1. 金曜日にはマイグレーションしない");

        let req = session.review_request("CREATE TABLE t (id int);", "DROP TABLE t;", OutputMode::Plain);
        let prompt = build_prompt(&req);
        assert!(prompt.contains("1. 金曜日にはマイグレーションしない"));
        assert!(!prompt.contains(DEFAULT_RULEBOOK.trim()));
    }

    #[test]
    fn test_cleared_incidents_drop_section() {
        let mut session = Session::new();
        session.save_incidents("");
        let req = session.review_request("s", "d", OutputMode::Structured);
        assert!(req.incidents.is_none());
        assert!(req.rulebook.is_some());
    }

    #[test]
    fn test_reset_restores_default() {
        let mut session = Session::new();
        session.save_rulebook("custom");
        session.save_incidents("custom");
        session.reset_rulebook();
        session.reset_incidents();
        assert_eq!(session.rulebook(), DEFAULT_RULEBOOK);
        assert_eq!(session.incidents(), DEFAULT_INCIDENTS);
    }

    #[test]
    fn test_from_config_reads_session_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rules.md"), "team rules").unwrap();
        let mut config = MigReviewConfig {
            config_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        config.session.rulebook_file = Some("rules.md".into());

        let session = Session::from_config(&config).unwrap();
        assert_eq!(session.rulebook(), "team rules");
        assert_eq!(session.incidents(), DEFAULT_INCIDENTS);
    }
}

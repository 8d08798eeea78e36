use serde::{Deserialize, Serialize};

/// What kind of answer the model is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Free-form prose answer.
    Plain,
    /// JSON document in the review format.
    #[default]
    Structured,
}

impl std::fmt::Display for OutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputMode::Plain => f.write_str("plain"),
            OutputMode::Structured => f.write_str("structured"),
        }
    }
}

impl std::str::FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "text" => Ok(OutputMode::Plain),
            "structured" | "json" => Ok(OutputMode::Structured),
            other => Err(format!(
                "unknown output mode '{}'. Expected 'plain' or 'structured'",
                other
            )),
        }
    }
}

/// One review submission: the inputs of a single user action.
///
/// Built once, never mutated. Blank rulebook or incident text is stored as
/// `None` so the prompt builder only has to check for presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRequest {
    pub current_schema: String,
    pub planned_ddl: String,
    pub rulebook: Option<String>,
    pub incidents: Option<String>,
    pub output_mode: OutputMode,
}

impl ReviewRequest {
    pub fn new(
        current_schema: impl Into<String>,
        planned_ddl: impl Into<String>,
        output_mode: OutputMode,
    ) -> Self {
        Self {
            current_schema: current_schema.into(),
            planned_ddl: planned_ddl.into(),
            rulebook: None,
            incidents: None,
            output_mode,
        }
    }

    pub fn with_rulebook(mut self, rulebook: impl Into<String>) -> Self {
        self.rulebook = non_blank(rulebook.into());
        self
    }

    pub fn with_incidents(mut self, incidents: impl Into<String>) -> Self {
        self.incidents = non_blank(incidents.into());
        self
    }
}

fn non_blank(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_context_is_absent() {
        let req = ReviewRequest::new("CREATE TABLE t (id int);", "DROP TABLE t;", OutputMode::Plain)
            .with_rulebook("  \n\t")
            .with_incidents("");
        assert!(req.rulebook.is_none());
        assert!(req.incidents.is_none());
    }

    #[test]
    fn test_context_kept_verbatim() {
        let req = ReviewRequest::new("s", "d", OutputMode::Structured)
            .with_rulebook("\n1. no DROP\n");
        assert_eq!(req.rulebook.as_deref(), Some("\n1. no DROP\n"));
    }

    #[test]
    fn test_output_mode_from_str() {
        assert_eq!("plain".parse::<OutputMode>().unwrap(), OutputMode::Plain);
        assert_eq!("JSON".parse::<OutputMode>().unwrap(), OutputMode::Structured);
        assert!("yaml".parse::<OutputMode>().is_err());
    }
}

//! # Structured Review Result
//!
//! Typed form of the JSON document the model returns in structured mode.
//! Scores are validated at deserialization time: anything that is not an
//! integral number in 0–100 is rejected instead of being passed through.

use serde::{Deserialize, Serialize};

/// A 0–100 score assigned by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MAX: u8 = 100;

    /// Build a score, returning `None` above 100.
    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(Score(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn tier(self) -> SeverityTier {
        SeverityTier::from_score(self)
    }
}

impl TryFrom<f64> for Score {
    type Error = String;

    // Models occasionally emit `85.0`; accept it as long as it is integral.
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(format!("score must be an integer, got {}", value));
        }
        if !(0.0..=f64::from(Self::MAX)).contains(&value) {
            return Err(format!("score must be between 0 and 100, got {}", value));
        }
        Ok(Score(value as u8))
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> u8 {
        score.0
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display bucket for violation severity and incident risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityTier {
    Low,
    Medium,
    High,
}

impl SeverityTier {
    /// `<30` low, `30..70` medium, `>=70` high.
    pub fn from_score(score: Score) -> Self {
        match score.value() {
            0..=29 => SeverityTier::Low,
            30..=69 => SeverityTier::Medium,
            _ => SeverityTier::High,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SeverityTier::Low => "low",
            SeverityTier::Medium => "medium",
            SeverityTier::High => "high",
        }
    }
}

/// Final go/no-go verdict. The wire values are the exact Japanese strings
/// the prompt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionRecommendation {
    #[serde(rename = "実行推奨")]
    Recommended,
    #[serde(rename = "要注意")]
    Caution,
    #[serde(rename = "実行非推奨")]
    NotRecommended,
}

impl ExecutionRecommendation {
    pub const ALL: [ExecutionRecommendation; 3] = [
        ExecutionRecommendation::Recommended,
        ExecutionRecommendation::Caution,
        ExecutionRecommendation::NotRecommended,
    ];

    /// The exact string used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionRecommendation::Recommended => "実行推奨",
            ExecutionRecommendation::Caution => "要注意",
            ExecutionRecommendation::NotRecommended => "実行非推奨",
        }
    }
}

impl std::fmt::Display for ExecutionRecommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredFinding {
    pub score: Score,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralAnalysis {
    pub data_loss_risk: ScoredFinding,
    pub performance_impact: ScoredFinding,
    pub downtime_required: ScoredFinding,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub rule: String,
    pub severity: Score,
    pub description: String,
    pub recommendation: String,
}

/// Rulebook findings. Either `violations` is non-empty or `no_violations`
/// explains why; the model decides which, nothing here enforces it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulebookAnalysis {
    #[serde(default)]
    pub violations: Vec<Violation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_violations: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarIncident {
    pub incident: String,
    pub risk_level: Score,
    pub precautions: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentAnalysis {
    #[serde(default)]
    pub similar_incidents: Vec<SimilarIncident>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_similar_incidents: Option<String>,
}

/// The full structured answer. The two context sections default to empty
/// because the prompt leaves them out when no rulebook or incident log was
/// supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredReviewResult {
    pub general_analysis: GeneralAnalysis,
    #[serde(default)]
    pub rulebook_analysis: RulebookAnalysis,
    #[serde(default)]
    pub incident_analysis: IncidentAnalysis,
    pub overall_score: Score,
    pub execution_recommendation: ExecutionRecommendation,
    pub summary: String,
}

/// What a review produced, by output mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "result", rename_all = "lowercase")]
pub enum ReviewOutcome {
    Plain(String),
    Structured(StructuredReviewResult),
}

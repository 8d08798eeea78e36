pub mod config;
pub mod error;
pub mod llm;
pub mod review;
pub mod session;

// Re-export key types for convenience
pub use error::{MigReviewError, ModelErrorKind, Result};
pub use review::request::{OutputMode, ReviewRequest};
pub use review::result::{ReviewOutcome, StructuredReviewResult};
pub use session::Session;

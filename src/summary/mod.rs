//! Scene summaries: the rule-based health verdict and the optional
//! language-model report.

mod ai;
mod health;

pub use ai::{AiSummary, HealthReport, build_prompt, extract_json_object, parse_response, request_summary};
pub use health::{HealthCategory, IndexSummary};

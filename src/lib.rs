pub mod clients;
pub mod config;
pub mod error;
pub mod extract;
pub mod http;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod prompts;

pub use error::{AuditError, ErrorBody, ErrorKind, Result};
pub use models::{AnalysisResult, Assessment, Category, Finding, Grade, Severity, Submission};
pub use pipeline::AssessmentPipeline;

use std::sync::Arc;

/// Build a pipeline backed by the configured Anthropic client
pub fn pipeline_from_config(config: &config::Config) -> Result<AssessmentPipeline> {
    let client = clients::AnthropicClient::new(
        config.capability.clone(),
        config.runtime.anthropic_api_key.clone(),
    )?;
    if !client.has_credential() {
        tracing::warn!(
            "ANTHROPIC_API_KEY is not set; assessments will fail with capability_unavailable"
        );
    }
    Ok(AssessmentPipeline::new(Arc::new(client)))
}

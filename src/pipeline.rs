//! Assessment pipeline: build -> invoke -> extract -> normalize
//!
//! Each run is independent and all-or-nothing. The first failing stage ends the
//! run; nothing is retried here.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info};

use crate::clients::VisionCapability;
use crate::error::{AuditError, Result};
use crate::extract::{extract_payload, snippet};
use crate::models::{AnalysisResult, Submission};
use crate::normalize::normalize;
use crate::prompts::build_prompt;

const LOG_SNIPPET_CHARS: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Building,
    Invoking,
    Extracting,
    Normalizing,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Building => "building",
            PipelineStage::Invoking => "invoking",
            PipelineStage::Extracting => "extracting",
            PipelineStage::Normalizing => "normalizing",
            PipelineStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Stateless orchestrator; share it behind `Arc` across concurrent submissions
pub struct AssessmentPipeline {
    capability: Arc<dyn VisionCapability>,
}

impl AssessmentPipeline {
    pub fn new(capability: Arc<dyn VisionCapability>) -> Self {
        Self { capability }
    }

    pub fn capability_name(&self) -> &str {
        self.capability.name()
    }

    pub async fn run(&self, submission: &Submission) -> Result<AnalysisResult> {
        let started = Instant::now();
        let workspace = submission.workspace_name.as_str();

        let mut stage = PipelineStage::Building;
        debug!(%stage, workspace, images = submission.images.len(), "assessment stage");
        let prompt = build_prompt(workspace, &submission.images)
            .map_err(|e| fail(stage, workspace, e, None))?;

        stage = PipelineStage::Invoking;
        debug!(%stage, workspace, capability = self.capability.name(), "assessment stage");
        let reply = self
            .capability
            .complete(&prompt)
            .await
            .map_err(|e| fail(stage, workspace, e, None))?;

        stage = PipelineStage::Extracting;
        debug!(%stage, workspace, reply_chars = reply.len(), "assessment stage");
        let payload =
            extract_payload(&reply).map_err(|e| fail(stage, workspace, e, Some(reply.as_str())))?;

        stage = PipelineStage::Normalizing;
        debug!(%stage, workspace, "assessment stage");
        let result =
            normalize(payload).map_err(|e| fail(stage, workspace, e, Some(reply.as_str())))?;

        stage = PipelineStage::Done;
        info!(
            %stage,
            workspace,
            overall_score = result.overall_score,
            grade = %result.grade(),
            findings = result.findings.total(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "assessment complete"
        );
        Ok(result)
    }
}

/// Log a failed run with enough context to diagnose prompt or schema drift
fn fail(stage: PipelineStage, workspace: &str, err: AuditError, reply: Option<&str>) -> AuditError {
    let kind = err.kind();
    match (&err, reply) {
        (AuditError::TransportFailure { status, body, .. }, _) => error!(
            %stage,
            %kind,
            workspace,
            status = ?status,
            body = %snippet(body, LOG_SNIPPET_CHARS),
            "assessment failed: {}",
            err
        ),
        (_, Some(raw)) => error!(
            %stage,
            %kind,
            workspace,
            raw = %snippet(raw, LOG_SNIPPET_CHARS),
            "assessment failed: {}",
            err
        ),
        _ => error!(%stage, %kind, workspace, "assessment failed: {}", err),
    }
    err
}

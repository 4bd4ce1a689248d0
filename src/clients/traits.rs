use async_trait::async_trait;

use crate::error::Result;
use crate::prompts::VisionPrompt;

/// Opaque "images + prompt in, free-form text out" capability
#[async_trait]
pub trait VisionCapability: Send + Sync {
    /// Send one prompt and return the raw text reply. No retries.
    async fn complete(&self, prompt: &VisionPrompt) -> Result<String>;

    /// Short name for logs
    fn name(&self) -> &str;
}

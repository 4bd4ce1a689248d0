#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use five_s_audit::clients::VisionCapability;
use five_s_audit::prompts::VisionPrompt;
use five_s_audit::{AuditError, Result};

/// Scripted stand-in for the inference capability
pub struct FakeCapability {
    reply: Box<dyn Fn() -> Result<String> + Send + Sync>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<VisionPrompt>>,
}

impl FakeCapability {
    pub fn replying(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::with(move || Ok(text.clone()))
    }

    pub fn unavailable() -> Self {
        Self::with(|| {
            Err(AuditError::CapabilityUnavailable {
                message: "ANTHROPIC_API_KEY not configured".to_string(),
            })
        })
    }

    pub fn failing_with_status(status: u16, body: &str) -> Self {
        let body = body.to_string();
        Self::with(move || {
            Err(AuditError::TransportFailure {
                status: Some(status),
                message: "upstream error".to_string(),
                body: body.clone(),
            })
        })
    }

    fn with(reply: impl Fn() -> Result<String> + Send + Sync + 'static) -> Self {
        Self {
            reply: Box::new(reply),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<VisionPrompt> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisionCapability for FakeCapability {
    async fn complete(&self, prompt: &VisionPrompt) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.clone());
        (self.reply)()
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// A base64 payload whose bytes start with a JPEG header
pub fn jpeg_b64() -> String {
    BASE64.encode([0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'])
}

pub const FULL_REPLY: &str = r#"Here is the audit you asked for.

```json
{
  "scores": {"sort": 72, "set_in_order": 64, "shine": 58, "standardize": 61, "sustain": 55},
  "findings": {
    "sort": [{"observation": "6 obsolete equipment manuals", "location": "top shelf of documentation cabinet", "severity": "moderate"}],
    "set_in_order": [{"observation": "Mixed bolt sizes in unlabeled bins", "location": "workstation 3", "severity": "major"}],
    "shine": [{"observation": "Metal shavings and cutting fluid", "location": "under CNC machine 2", "severity": "major"}],
    "standardize": [],
    "sustain": [{"observation": "No audit schedule posted", "location": "team board", "severity": "minor"}]
  },
  "recommendations": [
    "Immediate: clear shavings under CNC machine 2",
    "Short-term: label all bins at workstation 3",
    "Long-term: introduce a weekly 5S audit rota"
  ],
  "overall_score": 62,
  "summary": "Functional cell with visible clutter and cleanliness gaps."
}
```

Let me know if you need anything else {or a follow-up}."#;

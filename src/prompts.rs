//! Prompt construction for 5S vision audits
//!
//! Builds the system instruction and the interleaved text/image message sent to
//! the inference capability. The content parts serialize directly into the
//! Messages API `content` array.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::error::{AuditError, Result};

/// Largest image set a single audit accepts
pub const MAX_IMAGES: usize = 4;

const WORKSPACE_PLACEHOLDER: &str = "workspace";
const FALLBACK_MEDIA_TYPE: &str = "image/jpeg";

pub const SYSTEM_PROMPT: &str = r#"You are a 5S workplace organization auditor and expert. Your task is to analyze images for 5S compliance and generate a detailed, structured audit report. For each category, provide at least 3-5 SPECIFIC, ACTIONABLE observations.

When analyzing images, you must:
1. Identify exact items, locations, and conditions that need attention
2. Use precise language and specific examples
3. Focus on concrete, observable details
4. Quantify issues when possible (e.g., "3 unmarked containers" rather than "several containers")
5. For each weakness, provide the exact location and specific impact

5S Categories:
1. SORT (Seiri) - Remove unnecessary items from the workspace
   - Look for: obsolete equipment, unused tools, expired materials, redundant items
2. SET IN ORDER (Seiton) - Organize remaining items for easy access
   - Look for: labeling, shadow boards, color coding, designated storage, visual controls
3. SHINE (Seiso) - Clean and inspect the workspace regularly
   - Look for: dust, debris, spills, worn equipment, cleanliness standards
4. STANDARDIZE (Seiketsu) - Create standards for organization and cleanliness
   - Look for: checklists, standard procedures, visual standards, documented processes
5. SUSTAIN (Shitsuke) - Maintain and continuously improve standards
   - Look for: audit schedules, improvement tracking, training evidence, engagement

For each weakness, follow this format:
"[Specific observation] located at/in [exact location]"

Example findings:
- "6 obsolete equipment manuals stored on top shelf of documentation cabinet"
- "Mixing of different bolt sizes in unlabeled bins at workstation 3"
- "Accumulated metal shavings and cutting fluid under CNC machine 2"
- "Missing shadow board outline for torque wrench on tool panel A"

IMPORTANT:
- Generate at least 3-5 specific findings for EACH category
- If Shine score is below 60, focus primarily on Sort, Set in Order, and Shine
- Be extremely specific about what you observe - mention exact items, quantities, and locations
- Scores should reflect actual workplace conditions (most workplaces score 50-80)
- Penalize the overall score heavily for major findings

Respond with valid JSON only - no markdown, no extra text:"#;

pub const RESPONSE_FORMAT: &str = r#"{
  "scores": {
    "sort": <0-100 based on unnecessary items present>,
    "set_in_order": <0-100 based on organization quality>,
    "shine": <0-100 based on cleanliness>,
    "standardize": <0-100 based on visible standards>,
    "sustain": <0-100 based on maintenance evidence>
  },
  "findings": {
    "sort": [{"observation": "specific finding", "location": "exact location", "severity": "minor|moderate|major"}],
    "set_in_order": [{"observation": "...", "location": "...", "severity": "..."}],
    "shine": [{"observation": "...", "location": "...", "severity": "..."}],
    "standardize": [{"observation": "...", "location": "...", "severity": "..."}],
    "sustain": [{"observation": "...", "location": "...", "severity": "..."}]
  },
  "recommendations": [
    "Immediate: <action needed this week>",
    "Short-term: <action for next 30 days>",
    "Long-term: <systemic improvement>"
  ],
  "overall_score": <weighted average, penalize heavily for major findings>,
  "summary": "2-3 sentence executive summary of workspace condition"
}"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSource {
    #[serde(rename = "type")]
    pub kind: String,
    pub media_type: String,
    pub data: String,
}

/// One part of the user message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    Image { source: ImageSource },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }
}

/// Everything the capability needs for one audit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisionPrompt {
    pub system: String,
    pub parts: Vec<ContentPart>,
}

impl VisionPrompt {
    pub fn image_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| matches!(p, ContentPart::Image { .. }))
            .count()
    }
}

/// Build the audit prompt for a workspace and its images
pub fn build_prompt<S: AsRef<str>>(workspace_name: &str, images: &[S]) -> Result<VisionPrompt> {
    if images.is_empty() {
        return Err(AuditError::EmptyInput);
    }
    if images.len() > MAX_IMAGES {
        return Err(AuditError::TooManyImages {
            count: images.len(),
            max: MAX_IMAGES,
        });
    }

    let name = match workspace_name.trim() {
        "" => WORKSPACE_PLACEHOLDER,
        trimmed => trimmed,
    };
    let total = images.len();

    let mut parts = Vec::with_capacity(total * 2 + 2);
    parts.push(ContentPart::text(format!(
        "Analyze these {total} image(s) of \"{name}\" for 5S compliance.\n\n\
         Examine every visible area carefully:\n\
         - Count specific items that need attention\n\
         - Note exact locations (left side, center table, under machine, etc.)\n\
         - Identify both strengths and weaknesses\n\
         - Be realistic with scoring - perfection is rare\n\n\
         After analysis, provide your complete assessment."
    )));

    for (index, raw) in images.iter().enumerate() {
        let source = image_source(index, raw.as_ref())?;
        parts.push(ContentPart::text(format!("Image {} of {total}:", index + 1)));
        parts.push(ContentPart::Image { source });
    }

    parts.push(ContentPart::text(format!(
        "Now provide your complete 5S assessment as JSON in this exact format:\n{RESPONSE_FORMAT}"
    )));

    Ok(VisionPrompt {
        system: SYSTEM_PROMPT.to_string(),
        parts,
    })
}

/// Validate one base64 payload and work out its media type
fn image_source(index: usize, raw: &str) -> Result<ImageSource> {
    let (declared, data) = split_data_url(raw.trim());
    if data.is_empty() {
        return Err(AuditError::InvalidImage {
            index,
            message: "payload is empty".to_string(),
        });
    }

    let bytes = BASE64
        .decode(data)
        .map_err(|e| AuditError::InvalidImage {
            index,
            message: e.to_string(),
        })?;

    let media_type = sniff_media_type(&bytes)
        .or(declared)
        .unwrap_or(FALLBACK_MEDIA_TYPE);

    Ok(ImageSource {
        kind: "base64".to_string(),
        media_type: media_type.to_string(),
        data: data.to_string(),
    })
}

/// Strip a `data:<mime>;base64,` prefix if present
fn split_data_url(raw: &str) -> (Option<&'static str>, &str) {
    let Some(rest) = raw.strip_prefix("data:") else {
        return (None, raw);
    };
    match rest.split_once(";base64,") {
        Some((mime, data)) => (known_media_type(mime), data),
        None => (None, raw),
    }
}

fn known_media_type(mime: &str) -> Option<&'static str> {
    match mime.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("image/jpeg"),
        "image/png" => Some("image/png"),
        "image/gif" => Some("image/gif"),
        "image/webp" => Some("image/webp"),
        _ => None,
    }
}

fn sniff_media_type(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, b'P', b'N', b'G', ..] => Some("image/png"),
        [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        _ => None,
    }
}

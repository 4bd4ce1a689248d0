//! Data model for 5S audits: categories, findings, scores and the result contract

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The five 5S categories, in audit order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Sort,
    SetInOrder,
    Shine,
    Standardize,
    Sustain,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Sort,
        Category::SetInOrder,
        Category::Shine,
        Category::Standardize,
        Category::Sustain,
    ];

    /// JSON key used in `scores` and `findings`
    pub fn key(&self) -> &'static str {
        match self {
            Category::Sort => "sort",
            Category::SetInOrder => "set_in_order",
            Category::Shine => "shine",
            Category::Standardize => "standardize",
            Category::Sustain => "sustain",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Sort => "Sort",
            Category::SetInOrder => "Set in Order",
            Category::Shine => "Shine",
            Category::Standardize => "Standardize",
            Category::Sustain => "Sustain",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Moderate,
    Major,
}

impl Severity {
    /// Case-insensitive match on the three known names
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "minor" => Some(Severity::Minor),
            "moderate" => Some(Severity::Moderate),
            "major" => Some(Severity::Major),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub observation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub severity: Severity,
}

/// Score per category, each in `0..=100`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub sort: u8,
    pub set_in_order: u8,
    pub shine: u8,
    pub standardize: u8,
    pub sustain: u8,
}

impl ScoreBreakdown {
    /// Every category at the same score
    pub fn uniform(score: u8) -> Self {
        Self {
            sort: score,
            set_in_order: score,
            shine: score,
            standardize: score,
            sustain: score,
        }
    }

    pub fn get(&self, category: Category) -> u8 {
        match category {
            Category::Sort => self.sort,
            Category::SetInOrder => self.set_in_order,
            Category::Shine => self.shine,
            Category::Standardize => self.standardize,
            Category::Sustain => self.sustain,
        }
    }

    pub fn set(&mut self, category: Category, score: u8) {
        let slot = match category {
            Category::Sort => &mut self.sort,
            Category::SetInOrder => &mut self.set_in_order,
            Category::Shine => &mut self.shine,
            Category::Standardize => &mut self.standardize,
            Category::Sustain => &mut self.sustain,
        };
        *slot = score;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Findings {
    pub sort: Vec<Finding>,
    pub set_in_order: Vec<Finding>,
    pub shine: Vec<Finding>,
    pub standardize: Vec<Finding>,
    pub sustain: Vec<Finding>,
}

impl Findings {
    pub fn get(&self, category: Category) -> &[Finding] {
        match category {
            Category::Sort => &self.sort,
            Category::SetInOrder => &self.set_in_order,
            Category::Shine => &self.shine,
            Category::Standardize => &self.standardize,
            Category::Sustain => &self.sustain,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut Vec<Finding> {
        match category {
            Category::Sort => &mut self.sort,
            Category::SetInOrder => &mut self.set_in_order,
            Category::Shine => &mut self.shine,
            Category::Standardize => &mut self.standardize,
            Category::Sustain => &mut self.sustain,
        }
    }

    pub fn total(&self) -> usize {
        Category::ALL.iter().map(|c| self.get(*c).len()).sum()
    }
}

/// Letter grade used by the dashboards
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => Grade::A,
            80..=89 => Grade::B,
            70..=79 => Grade::C,
            60..=69 => Grade::D,
            _ => Grade::F,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(letter)
    }
}

/// Normalized output of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub scores: ScoreBreakdown,
    pub findings: Findings,
    pub recommendations: Vec<String>,
    pub overall_score: u8,
    pub summary: String,
}

impl AnalysisResult {
    pub fn grade(&self) -> Grade {
        Grade::from_score(self.overall_score)
    }
}

/// Inbound submission: base64 images plus the workspace they show
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub workspace_name: String,
}

/// Persist-ready record: an [`AnalysisResult`] with identity and provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub id: Uuid,
    pub workspace_name: String,
    pub images: Vec<String>,
    pub scores: ScoreBreakdown,
    pub findings: Findings,
    pub recommendations: Vec<String>,
    pub overall_score: u8,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

impl Assessment {
    pub fn from_result(
        result: AnalysisResult,
        workspace_name: impl Into<String>,
        images: Vec<String>,
    ) -> Self {
        let AnalysisResult {
            scores,
            findings,
            recommendations,
            overall_score,
            summary,
        } = result;
        Self {
            id: Uuid::new_v4(),
            workspace_name: workspace_name.into(),
            images,
            scores,
            findings,
            recommendations,
            overall_score,
            summary,
            created_at: Utc::now(),
        }
    }

    pub fn grade(&self) -> Grade {
        Grade::from_score(self.overall_score)
    }
}

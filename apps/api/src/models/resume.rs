use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Record: the single root entity edited by a session
// ────────────────────────────────────────────────────────────────────────────

/// All user-entered resume content.
///
/// Field names serialize in camelCase so a stored document round-trips with the
/// shape the form client sends. Every string defaults to `""` and every list to
/// empty, so a partially populated document deserializes without loss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Record {
    pub personal_info: PersonalInfo,
    pub professional_summary: String,
    pub education: Vec<EducationEntry>,
    pub projects: Vec<ProjectEntry>,
    pub skills: SkillBuckets,
    pub achievements: Vec<String>,
}

impl Record {
    /// The built-in empty template: one blank entry in every list section.
    pub fn template() -> Self {
        Record {
            personal_info: PersonalInfo::default(),
            professional_summary: String::new(),
            education: vec![EducationEntry::default()],
            projects: vec![ProjectEntry::default()],
            skills: SkillBuckets::default(),
            achievements: vec![String::new()],
        }
    }
}

impl Default for Record {
    fn default() -> Self {
        Record::template()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub linkedin: String,
    pub github: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationEntry {
    pub degree: String,
    pub field_of_study: String,
    pub institution: String,
    pub location: String,
    pub from_year: String,
    pub to_year: String,
    pub cgpa: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectEntry {
    pub title: String,
    /// Free text; split into bullet points at composition time.
    pub description: String,
    pub technologies: String,
    pub github_link: String,
    pub live_link: String,
}

/// Categorized skills. The only skills shape carried on a `Record`; flat lists
/// from older documents are migrated on import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillBuckets {
    pub programming_languages: String,
    pub frontend_backend: String,
    pub tools: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Persistence row
// ────────────────────────────────────────────────────────────────────────────

/// A stored resume document. `data` is kept as raw JSON so that documents saved
/// by older clients still reach the normalizer intact.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub user_id: Uuid,
    pub data: Value,
    pub updated_at: DateTime<Utc>,
}

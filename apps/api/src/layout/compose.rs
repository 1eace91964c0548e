//! Section composition: turns a Record into the ordered sections shown on the page.
//!
//! # Composition rules
//! - Header iff `fullName` is non-blank; contact items in phone, email, linkedin,
//!   github order, each only when non-blank.
//! - Summary iff `professionalSummary` is non-blank.
//! - Education iff any entry has a degree or an institution; only those entries listed.
//! - Skills iff any bucket is non-blank.
//! - Projects iff any entry has a title; descriptions split into at most 8 bullets.
//! - Achievements iff any entry is non-blank after trimming.
//! - Nothing present → empty-document placeholder.
//!
//! "Blank" means empty after trimming whitespace. Composition is pure and never fails;
//! missing fields are omitted.

use serde::Serialize;

use crate::models::{EducationEntry, PersonalInfo, ProjectEntry, Record, SkillBuckets};

/// Display cap on bullets per project. The Record keeps every fragment.
pub const MAX_PROJECT_BULLETS: usize = 8;

// ────────────────────────────────────────────────────────────────────────────
// Composed document types
// ────────────────────────────────────────────────────────────────────────────

/// The composed, unmeasured page content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedDocument {
    pub header: Option<Header>,
    pub sections: Vec<Section>,
}

impl ComposedDocument {
    /// True when nothing is present and the placeholder is shown instead.
    pub fn is_placeholder(&self) -> bool {
        self.header.is_none() && self.sections.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub name: String,
    pub contacts: Vec<ContactItem>,
}

#[cfg(test)]
impl Header {
    /// Contact items joined by `separator`. Separators sit only between present items.
    pub fn contact_line(&self, separator: &str) -> String {
        self.contacts
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(separator)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactKind {
    Phone,
    Email,
    Linkedin,
    Github,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactItem {
    pub kind: ContactKind,
    pub text: String,
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Section {
    Summary { text: String },
    Education { entries: Vec<EducationItem> },
    Skills { lines: Vec<SkillLine> },
    Projects { entries: Vec<ProjectItem> },
    Achievements { items: Vec<String> },
}

impl Section {
    pub fn title(&self) -> &'static str {
        match self {
            Section::Summary { .. } => "Objective",
            Section::Education { .. } => "Education",
            Section::Skills { .. } => "Skills",
            Section::Projects { .. } => "Projects",
            Section::Achievements { .. } => "Achievements / Certifications",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationItem {
    /// `degree, institution`, with either part omitted when blank.
    pub heading: String,
    pub dates: Option<String>,
    pub gpa: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillLine {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectItem {
    pub title: String,
    pub bullets: Vec<String>,
    pub tech_stack: Option<String>,
    pub links: Vec<ProjectLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectLink {
    pub label: &'static str,
    pub href: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Presence predicates
// ────────────────────────────────────────────────────────────────────────────

pub(crate) fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn education_present(entry: &EducationEntry) -> bool {
    !is_blank(&entry.degree) || !is_blank(&entry.institution)
}

fn project_present(entry: &ProjectEntry) -> bool {
    !is_blank(&entry.title)
}

fn skills_present(skills: &SkillBuckets) -> bool {
    !is_blank(&skills.programming_languages)
        || !is_blank(&skills.frontend_backend)
        || !is_blank(&skills.tools)
}

/// OR of every section's presence predicate. False → placeholder.
pub fn has_content(record: &Record) -> bool {
    !is_blank(&record.personal_info.full_name)
        || !is_blank(&record.professional_summary)
        || record.education.iter().any(education_present)
        || record.projects.iter().any(project_present)
        || skills_present(&record.skills)
        || record.achievements.iter().any(|a| !is_blank(a))
}

// ────────────────────────────────────────────────────────────────────────────
// Composition
// ────────────────────────────────────────────────────────────────────────────

/// Composes `record` into header + sections in page order.
pub fn compose(record: &Record) -> ComposedDocument {
    if !has_content(record) {
        return ComposedDocument {
            header: None,
            sections: Vec::new(),
        };
    }

    let mut sections = Vec::new();

    if !is_blank(&record.professional_summary) {
        sections.push(Section::Summary {
            text: record.professional_summary.trim().to_string(),
        });
    }

    let education: Vec<EducationItem> = record
        .education
        .iter()
        .filter(|e| education_present(e))
        .map(compose_education)
        .collect();
    if !education.is_empty() {
        sections.push(Section::Education { entries: education });
    }

    if skills_present(&record.skills) {
        sections.push(Section::Skills {
            lines: compose_skills(&record.skills),
        });
    }

    let projects: Vec<ProjectItem> = record
        .projects
        .iter()
        .filter(|p| project_present(p))
        .map(compose_project)
        .collect();
    if !projects.is_empty() {
        sections.push(Section::Projects { entries: projects });
    }

    let achievements: Vec<String> = record
        .achievements
        .iter()
        .filter(|a| !is_blank(a))
        .map(|a| a.trim().to_string())
        .collect();
    if !achievements.is_empty() {
        sections.push(Section::Achievements {
            items: achievements,
        });
    }

    ComposedDocument {
        header: compose_header(&record.personal_info),
        sections,
    }
}

fn compose_header(info: &PersonalInfo) -> Option<Header> {
    if is_blank(&info.full_name) {
        return None;
    }

    let candidates = [
        (ContactKind::Phone, &info.phone),
        (ContactKind::Email, &info.email),
        (ContactKind::Linkedin, &info.linkedin),
        (ContactKind::Github, &info.github),
    ];
    let contacts = candidates
        .into_iter()
        .filter(|(_, value)| !is_blank(value))
        .map(|(kind, value)| contact_item(kind, value.trim()))
        .collect();

    Some(Header {
        name: info.full_name.trim().to_string(),
        contacts,
    })
}

fn contact_item(kind: ContactKind, value: &str) -> ContactItem {
    match kind {
        ContactKind::Phone => ContactItem {
            kind,
            text: value.to_string(),
            href: None,
        },
        ContactKind::Email => ContactItem {
            kind,
            text: value.to_string(),
            href: Some(format!("mailto:{value}")),
        },
        ContactKind::Linkedin | ContactKind::Github => ContactItem {
            kind,
            text: display_url(value),
            href: Some(absolute_url(value)),
        },
    }
}

/// Prefixes `https://` unless the link already starts with `http`.
pub(crate) fn absolute_url(link: &str) -> String {
    if link.starts_with("http") {
        link.to_string()
    } else {
        format!("https://{link}")
    }
}

/// Link text without scheme, `www.` or trailing slash.
fn display_url(link: &str) -> String {
    let stripped = link
        .strip_prefix("https://")
        .or_else(|| link.strip_prefix("http://"))
        .unwrap_or(link);
    let stripped = stripped.strip_prefix("www.").unwrap_or(stripped);
    stripped.trim_end_matches('/').to_string()
}

/// `"{from} – {to}"` if both present, else whichever is present, else `None`.
pub fn date_range(from: &str, to: &str) -> Option<String> {
    match (from.trim(), to.trim()) {
        ("", "") => None,
        (from, "") => Some(from.to_string()),
        ("", to) => Some(to.to_string()),
        (from, to) => Some(format!("{from} – {to}")),
    }
}

fn compose_education(entry: &EducationEntry) -> EducationItem {
    let heading = [entry.degree.trim(), entry.institution.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    EducationItem {
        heading,
        dates: date_range(&entry.from_year, &entry.to_year),
        gpa: (!is_blank(&entry.cgpa)).then(|| format!("Cumulative GPA: {}", entry.cgpa.trim())),
    }
}

fn compose_skills(skills: &SkillBuckets) -> Vec<SkillLine> {
    [
        ("Technical Skills", &skills.programming_languages),
        ("Frontend & Backend", &skills.frontend_backend),
        ("Build and Tools", &skills.tools),
    ]
    .into_iter()
    .filter(|(_, value)| !is_blank(value))
    .map(|(label, value)| SkillLine {
        label,
        value: value.trim().to_string(),
    })
    .collect()
}

fn compose_project(entry: &ProjectEntry) -> ProjectItem {
    let links = [
        ("GitHub", &entry.github_link),
        ("Live", &entry.live_link),
    ]
    .into_iter()
    .filter(|(_, href)| !is_blank(href))
    .map(|(label, href)| ProjectLink {
        label,
        href: absolute_url(href.trim()),
    })
    .collect();

    ProjectItem {
        title: entry.title.trim().to_string(),
        bullets: split_bullets(&entry.description),
        tech_stack: (!is_blank(&entry.technologies))
            .then(|| format!("Tech Stack: {}", entry.technologies.trim())),
        links,
    }
}

/// Splits a free-text description into display bullets.
///
/// Splits on `.` and newlines, drops blank fragments, trims each survivor and
/// appends a period. At most [`MAX_PROJECT_BULLETS`] are returned. Abbreviations such
/// as "U.S." split mid-word.
pub fn split_bullets(description: &str) -> Vec<String> {
    description
        .split(['.', '\n'])
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .take(MAX_PROJECT_BULLETS)
        .map(|fragment| format!("{fragment}."))
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Record {
        let mut record = Record::template();
        record.personal_info.full_name = name.to_string();
        record
    }

    // ── placeholder / header ────────────────────────────────────────────────

    #[test]
    fn test_template_composes_to_placeholder() {
        let record = Record::template();
        assert!(!has_content(&record));
        assert!(compose(&record).is_placeholder());
    }

    #[test]
    fn test_whitespace_only_fields_are_blank() {
        let mut record = named("   ");
        record.achievements = vec!["  ".to_string(), "\n".to_string()];
        assert!(!has_content(&record));
    }

    #[test]
    fn test_name_only_renders_header_alone() {
        let doc = compose(&named("Jane Doe"));
        let header = doc.header.as_ref().expect("header should render");
        assert_eq!(header.name, "Jane Doe");
        assert!(header.contacts.is_empty());
        assert_eq!(header.contact_line(" ◊ "), "");
        assert!(doc.sections.is_empty());
        assert!(!doc.is_placeholder());
        assert!(has_content(&named("Jane Doe")));
    }

    #[test]
    fn test_contact_line_separator_only_between_present_items() {
        let mut record = named("Jane Doe");
        record.personal_info.phone = "555-1234".to_string();
        record.personal_info.email = "j@x.com".to_string();
        let header = compose(&record).header.unwrap();
        let line = header.contact_line(" ◊ ");
        assert_eq!(line, "555-1234 ◊ j@x.com");
        assert_eq!(line.matches('◊').count(), 1);
    }

    #[test]
    fn test_contact_priority_order_and_links() {
        let mut record = named("Jane Doe");
        record.personal_info.github = "github.com/jane".to_string();
        record.personal_info.email = "j@x.com".to_string();
        record.personal_info.linkedin = "https://www.linkedin.com/in/jane/".to_string();
        let header = compose(&record).header.unwrap();

        let kinds: Vec<ContactKind> = header.contacts.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![ContactKind::Email, ContactKind::Linkedin, ContactKind::Github]
        );
        assert_eq!(header.contacts[0].href.as_deref(), Some("mailto:j@x.com"));
        assert_eq!(header.contacts[1].text, "linkedin.com/in/jane");
        assert_eq!(
            header.contacts[1].href.as_deref(),
            Some("https://www.linkedin.com/in/jane/")
        );
        assert_eq!(
            header.contacts[2].href.as_deref(),
            Some("https://github.com/jane")
        );
        assert_eq!(header.contact_line(" | ").matches('|').count(), 2);
    }

    #[test]
    fn test_header_absent_without_name() {
        let mut record = Record::template();
        record.personal_info.email = "j@x.com".to_string();
        record.professional_summary = "Engineer".to_string();
        let doc = compose(&record);
        assert!(doc.header.is_none());
        assert_eq!(doc.sections.len(), 1);
    }

    // ── sections ────────────────────────────────────────────────────────────

    #[test]
    fn test_section_order_is_fixed() {
        let mut record = named("Jane Doe");
        record.achievements = vec!["Winner".to_string()];
        record.projects[0].title = "Folio".to_string();
        record.skills.tools = "Docker".to_string();
        record.education[0].institution = "MIT".to_string();
        record.professional_summary = "Engineer".to_string();

        let titles: Vec<&str> = compose(&record).sections.iter().map(Section::title).collect();
        assert_eq!(
            titles,
            vec![
                "Objective",
                "Education",
                "Skills",
                "Projects",
                "Achievements / Certifications"
            ]
        );
    }

    #[test]
    fn test_education_filters_blank_entries() {
        let mut record = named("Jane Doe");
        record.education = vec![
            EducationEntry {
                location: "Boston".to_string(),
                ..EducationEntry::default()
            },
            EducationEntry {
                degree: "BSc".to_string(),
                institution: "MIT".to_string(),
                from_year: "2018".to_string(),
                to_year: "2022".to_string(),
                cgpa: "3.9".to_string(),
                ..EducationEntry::default()
            },
            EducationEntry {
                institution: "Harvard".to_string(),
                to_year: "2024".to_string(),
                ..EducationEntry::default()
            },
        ];

        let doc = compose(&record);
        let Section::Education { entries } = &doc.sections[0] else {
            panic!("expected education section, got {:?}", doc.sections[0]);
        };
        assert_eq!(entries.len(), 2, "location-only entry is filtered");
        assert_eq!(entries[0].heading, "BSc, MIT");
        assert_eq!(entries[0].dates.as_deref(), Some("2018 – 2022"));
        assert_eq!(entries[0].gpa.as_deref(), Some("Cumulative GPA: 3.9"));
        assert_eq!(entries[1].heading, "Harvard");
        assert_eq!(entries[1].dates.as_deref(), Some("2024"));
        assert_eq!(entries[1].gpa, None);
    }

    #[test]
    fn test_date_range_variants() {
        assert_eq!(date_range("2018", "2022").as_deref(), Some("2018 – 2022"));
        assert_eq!(date_range("2018", "").as_deref(), Some("2018"));
        assert_eq!(date_range("", "2022").as_deref(), Some("2022"));
        assert_eq!(date_range(" ", ""), None);
    }

    #[test]
    fn test_empty_lists_mean_absent_sections() {
        let mut record = named("Jane Doe");
        record.education.clear();
        record.projects.clear();
        record.achievements.clear();
        let doc = compose(&record);
        assert!(doc.sections.is_empty());
    }

    #[test]
    fn test_projects_require_title() {
        let mut record = named("Jane Doe");
        record.projects = vec![
            ProjectEntry {
                description: "Untitled work.".to_string(),
                ..ProjectEntry::default()
            },
            ProjectEntry {
                title: "Folio".to_string(),
                technologies: "Rust, Axum".to_string(),
                github_link: "github.com/jane/folio".to_string(),
                ..ProjectEntry::default()
            },
        ];
        let doc = compose(&record);
        let Section::Projects { entries } = &doc.sections[0] else {
            panic!("expected projects section");
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Folio");
        assert!(entries[0].bullets.is_empty());
        assert_eq!(entries[0].tech_stack.as_deref(), Some("Tech Stack: Rust, Axum"));
        assert_eq!(entries[0].links[0].href, "https://github.com/jane/folio");
    }

    #[test]
    fn test_skills_lines_only_for_filled_buckets() {
        let mut record = named("Jane Doe");
        record.skills.programming_languages = "Rust, Go".to_string();
        record.skills.tools = "Docker".to_string();
        let doc = compose(&record);
        let Section::Skills { lines } = &doc.sections[0] else {
            panic!("expected skills section");
        };
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].label, "Technical Skills");
        assert_eq!(lines[1].label, "Build and Tools");
    }

    #[test]
    fn test_achievements_drop_blank_entries_from_display_only() {
        let mut record = named("Jane Doe");
        record.achievements = vec!["".to_string(), " Winner ".to_string(), "  ".to_string()];
        let doc = compose(&record);
        assert_eq!(
            doc.sections[0],
            Section::Achievements {
                items: vec!["Winner".to_string()]
            }
        );
        assert_eq!(record.achievements.len(), 3, "record is untouched");
    }

    // ── bullets ─────────────────────────────────────────────────────────────

    #[test]
    fn test_split_bullets_sentences_and_newlines() {
        assert_eq!(
            split_bullets("Built API. Added auth.\nWrote tests."),
            vec!["Built API.", "Added auth.", "Wrote tests."]
        );
    }

    #[test]
    fn test_split_bullets_drops_blank_fragments() {
        assert_eq!(
            split_bullets("  First..\n\n  second line \n."),
            vec!["First.", "second line."]
        );
        assert!(split_bullets(" \n . ").is_empty());
    }

    #[test]
    fn test_split_bullets_caps_at_eight() {
        let description = (1..=12).map(|i| format!("Item {i}")).collect::<Vec<_>>().join(". ");
        let bullets = split_bullets(&description);
        assert_eq!(bullets.len(), MAX_PROJECT_BULLETS);
        assert_eq!(bullets[7], "Item 8.");
    }

    #[test]
    fn test_split_bullets_splits_abbreviations() {
        assert_eq!(
            split_bullets("Shipped to U.S. users"),
            vec!["Shipped to U.", "S.", "users."]
        );
    }
}

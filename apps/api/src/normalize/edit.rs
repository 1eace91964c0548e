//! Field-level and list-level edits on a Record.
//!
//! Each operation returns a new Record; the input is never touched, so readers of an
//! older snapshot keep a consistent view. List identity is positional: removing entry
//! `i` shifts every later entry down by one.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{EducationEntry, PersonalInfo, ProjectEntry, Record, SkillBuckets};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("invalid field path '{0}'")]
    InvalidFieldPath(String),

    #[error("{section} index {index} is out of range (length {len})")]
    IndexOutOfRange {
        section: ListSection,
        index: usize,
        len: usize,
    },
}

// ────────────────────────────────────────────────────────────────────────────
// List sections
// ────────────────────────────────────────────────────────────────────────────

/// The Record sections that hold an ordered list of entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListSection {
    Education,
    Projects,
    Achievements,
}

impl ListSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListSection::Education => "education",
            ListSection::Projects => "projects",
            ListSection::Achievements => "achievements",
        }
    }

    pub fn len(&self, record: &Record) -> usize {
        match self {
            ListSection::Education => record.education.len(),
            ListSection::Projects => record.projects.len(),
            ListSection::Achievements => record.achievements.len(),
        }
    }
}

impl fmt::Display for ListSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListSection {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "education" => Ok(ListSection::Education),
            "projects" => Ok(ListSection::Projects),
            "achievements" => Ok(ListSection::Achievements),
            _ => Err(EditError::InvalidFieldPath(s.to_string())),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Field names
// ────────────────────────────────────────────────────────────────────────────

/// Declares a field-name enum over the string fields of one entry type, with its wire
/// key and a mutable accessor into the entry.
macro_rules! entry_fields {
    ($name:ident for $target:ty { $($variant:ident => $field:ident, $key:literal;)+ }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub fn key(self) -> &'static str {
                match self {
                    $($name::$variant => $key,)+
                }
            }

            fn slot(self, target: &mut $target) -> &mut String {
                match self {
                    $($name::$variant => &mut target.$field,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($key => Ok($name::$variant),)+
                    _ => Err(()),
                }
            }
        }
    };
}

entry_fields!(PersonalField for PersonalInfo {
    FullName => full_name, "fullName";
    Email => email, "email";
    Phone => phone, "phone";
    Linkedin => linkedin, "linkedin";
    Github => github, "github";
});

entry_fields!(EducationField for EducationEntry {
    Degree => degree, "degree";
    FieldOfStudy => field_of_study, "fieldOfStudy";
    Institution => institution, "institution";
    Location => location, "location";
    FromYear => from_year, "fromYear";
    ToYear => to_year, "toYear";
    Cgpa => cgpa, "cgpa";
});

entry_fields!(ProjectField for ProjectEntry {
    Title => title, "title";
    Description => description, "description";
    Technologies => technologies, "technologies";
    GithubLink => github_link, "githubLink";
    LiveLink => live_link, "liveLink";
});

entry_fields!(SkillBucket for SkillBuckets {
    ProgrammingLanguages => programming_languages, "programmingLanguages";
    FrontendBackend => frontend_backend, "frontendBackend";
    Tools => tools, "tools";
});

// ────────────────────────────────────────────────────────────────────────────
// Field paths
// ────────────────────────────────────────────────────────────────────────────

/// Addresses exactly one string field of a Record.
///
/// Text form: `personalInfo.fullName`, `professionalSummary`, `education[0].degree`,
/// `projects[1].title`, `skills.tools`, `achievements[2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldPath {
    Personal(PersonalField),
    Summary,
    Education { index: usize, field: EducationField },
    Project { index: usize, field: ProjectField },
    Skill(SkillBucket),
    Achievement { index: usize },
}

impl FromStr for FieldPath {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EditError::InvalidFieldPath(s.to_string());

        let (head, field) = match s.split_once('.') {
            Some((head, field)) => (head, Some(field)),
            None => (s, None),
        };
        let (name, index) = match head.split_once('[') {
            Some((name, rest)) => {
                let index = rest
                    .strip_suffix(']')
                    .and_then(|i| i.parse::<usize>().ok())
                    .ok_or_else(invalid)?;
                (name, Some(index))
            }
            None => (head, None),
        };

        match (name, index, field) {
            ("personalInfo", None, Some(f)) => {
                Ok(FieldPath::Personal(f.parse().map_err(|_| invalid())?))
            }
            ("professionalSummary", None, None) => Ok(FieldPath::Summary),
            ("education", Some(index), Some(f)) => Ok(FieldPath::Education {
                index,
                field: f.parse().map_err(|_| invalid())?,
            }),
            ("projects", Some(index), Some(f)) => Ok(FieldPath::Project {
                index,
                field: f.parse().map_err(|_| invalid())?,
            }),
            ("skills", None, Some(f)) => Ok(FieldPath::Skill(f.parse().map_err(|_| invalid())?)),
            ("achievements", Some(index), None) => Ok(FieldPath::Achievement { index }),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::Personal(field) => write!(f, "personalInfo.{}", field.key()),
            FieldPath::Summary => f.write_str("professionalSummary"),
            FieldPath::Education { index, field } => {
                write!(f, "education[{index}].{}", field.key())
            }
            FieldPath::Project { index, field } => write!(f, "projects[{index}].{}", field.key()),
            FieldPath::Skill(bucket) => write!(f, "skills.{}", bucket.key()),
            FieldPath::Achievement { index } => write!(f, "achievements[{index}]"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Operations
// ────────────────────────────────────────────────────────────────────────────

/// Returns a new Record with only the field at `path` replaced by `value`.
pub fn update_field(
    record: &Record,
    path: &FieldPath,
    value: impl Into<String>,
) -> Result<Record, EditError> {
    let mut next = record.clone();
    *field_slot(&mut next, path)? = value.into();
    Ok(next)
}

/// Returns a new Record with one blank entry appended to `section`.
pub fn add_list_entry(record: &Record, section: ListSection) -> Record {
    let mut next = record.clone();
    match section {
        ListSection::Education => next.education.push(EducationEntry::default()),
        ListSection::Projects => next.projects.push(ProjectEntry::default()),
        ListSection::Achievements => next.achievements.push(String::new()),
    }
    next
}

/// Returns a new Record without the entry at `index` in `section`.
///
/// Fails with `IndexOutOfRange` when `index >= len`.
pub fn remove_list_entry(
    record: &Record,
    section: ListSection,
    index: usize,
) -> Result<Record, EditError> {
    let len = section.len(record);
    if index >= len {
        return Err(EditError::IndexOutOfRange {
            section,
            index,
            len,
        });
    }

    let mut next = record.clone();
    match section {
        ListSection::Education => {
            next.education.remove(index);
        }
        ListSection::Projects => {
            next.projects.remove(index);
        }
        ListSection::Achievements => {
            next.achievements.remove(index);
        }
    }
    Ok(next)
}

fn field_slot<'a>(record: &'a mut Record, path: &FieldPath) -> Result<&'a mut String, EditError> {
    let slot = match *path {
        FieldPath::Personal(field) => field.slot(&mut record.personal_info),
        FieldPath::Summary => &mut record.professional_summary,
        FieldPath::Education { index, field } => {
            let len = record.education.len();
            let entry = record
                .education
                .get_mut(index)
                .ok_or(EditError::IndexOutOfRange {
                    section: ListSection::Education,
                    index,
                    len,
                })?;
            field.slot(entry)
        }
        FieldPath::Project { index, field } => {
            let len = record.projects.len();
            let entry = record
                .projects
                .get_mut(index)
                .ok_or(EditError::IndexOutOfRange {
                    section: ListSection::Projects,
                    index,
                    len,
                })?;
            field.slot(entry)
        }
        FieldPath::Skill(bucket) => bucket.slot(&mut record.skills),
        FieldPath::Achievement { index } => {
            let len = record.achievements.len();
            record
                .achievements
                .get_mut(index)
                .ok_or(EditError::IndexOutOfRange {
                    section: ListSection::Achievements,
                    index,
                    len,
                })?
        }
    };
    Ok(slot)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> Record {
        let mut record = Record::template();
        record.personal_info.full_name = "Jane Doe".to_string();
        record.education[0].degree = "BSc".to_string();
        record.education.push(EducationEntry {
            degree: "MSc".to_string(),
            ..EducationEntry::default()
        });
        record.projects[0].title = "Folio".to_string();
        record.achievements = vec!["First".to_string(), "Second".to_string()];
        record
    }

    // ── path parsing ────────────────────────────────────────────────────────

    #[test]
    fn test_parse_every_path_form() {
        assert_eq!(
            "personalInfo.fullName".parse::<FieldPath>().unwrap(),
            FieldPath::Personal(PersonalField::FullName)
        );
        assert_eq!(
            "professionalSummary".parse::<FieldPath>().unwrap(),
            FieldPath::Summary
        );
        assert_eq!(
            "education[3].fieldOfStudy".parse::<FieldPath>().unwrap(),
            FieldPath::Education {
                index: 3,
                field: EducationField::FieldOfStudy
            }
        );
        assert_eq!(
            "projects[0].liveLink".parse::<FieldPath>().unwrap(),
            FieldPath::Project {
                index: 0,
                field: ProjectField::LiveLink
            }
        );
        assert_eq!(
            "skills.frontendBackend".parse::<FieldPath>().unwrap(),
            FieldPath::Skill(SkillBucket::FrontendBackend)
        );
        assert_eq!(
            "achievements[2]".parse::<FieldPath>().unwrap(),
            FieldPath::Achievement { index: 2 }
        );
    }

    #[test]
    fn test_parse_rejects_malformed_paths() {
        for bad in [
            "",
            "personalInfo",
            "personalInfo.age",
            "education.degree",
            "education[x].degree",
            "education[1",
            "achievements",
            "achievements[0].text",
            "skills[0]",
            "professionalSummary.text",
            "hobbies[0]",
        ] {
            assert!(
                matches!(bad.parse::<FieldPath>(), Err(EditError::InvalidFieldPath(_))),
                "'{bad}' should be rejected"
            );
        }
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let path = FieldPath::Education {
            index: 4,
            field: EducationField::ToYear,
        };
        assert_eq!(path.to_string(), "education[4].toYear");
        assert_eq!(path.to_string().parse::<FieldPath>().unwrap(), path);
    }

    // ── update_field ────────────────────────────────────────────────────────

    #[test]
    fn test_update_field_changes_only_target() {
        let before = sample_record();
        let path: FieldPath = "education[1].institution".parse().unwrap();
        let after = update_field(&before, &path, "MIT").unwrap();

        let mut expected = before.clone();
        expected.education[1].institution = "MIT".to_string();
        assert_eq!(after, expected);
        assert_eq!(before.education[1].institution, "", "input must be untouched");
    }

    #[test]
    fn test_update_field_every_section() {
        let record = sample_record();
        let cases = [
            "personalInfo.github",
            "professionalSummary",
            "education[0].cgpa",
            "projects[0].technologies",
            "skills.tools",
            "achievements[1]",
        ];
        for raw in cases {
            let path: FieldPath = raw.parse().unwrap();
            let updated = update_field(&record, &path, "new value").unwrap();
            assert_ne!(updated, record, "{raw} should change the record");
            let restored = update_field(&updated, &path, field_value(&record, &path)).unwrap();
            assert_eq!(restored, record, "{raw} should be the only change");
        }
    }

    #[test]
    fn test_update_field_out_of_range() {
        let record = sample_record();
        let path: FieldPath = "projects[5].title".parse().unwrap();
        assert_eq!(
            update_field(&record, &path, "x"),
            Err(EditError::IndexOutOfRange {
                section: ListSection::Projects,
                index: 5,
                len: 1
            })
        );
    }

    // ── list entries ────────────────────────────────────────────────────────

    #[test]
    fn test_add_list_entry_appends_blank_last() {
        let record = sample_record();
        let next = add_list_entry(&record, ListSection::Education);
        assert_eq!(next.education.len(), 3);
        assert_eq!(next.education[..2], record.education[..]);
        assert_eq!(next.education[2], EducationEntry::default());

        let next = add_list_entry(&record, ListSection::Achievements);
        assert_eq!(next.achievements.last().map(String::as_str), Some(""));
    }

    #[test]
    fn test_remove_list_entry_shifts_later_entries() {
        let record = sample_record();
        let next = remove_list_entry(&record, ListSection::Achievements, 0).unwrap();
        assert_eq!(next.achievements, vec!["Second".to_string()]);
    }

    #[test]
    fn test_remove_list_entry_out_of_range_fails() {
        let record = sample_record();
        assert_eq!(
            remove_list_entry(&record, ListSection::Education, 2),
            Err(EditError::IndexOutOfRange {
                section: ListSection::Education,
                index: 2,
                len: 2
            })
        );
    }

    #[test]
    fn test_remove_then_add_does_not_resurrect() {
        let record = sample_record();
        let removed = remove_list_entry(&record, ListSection::Education, 1).unwrap();
        let readded = add_list_entry(&removed, ListSection::Education);
        assert_eq!(readded.education.len(), record.education.len());
        assert_ne!(readded.education[1], record.education[1]);
        assert_eq!(readded.education[1], EducationEntry::default());
    }

    #[test]
    fn test_lists_may_become_empty() {
        let record = Record::template();
        let next = remove_list_entry(&record, ListSection::Projects, 0).unwrap();
        assert!(next.projects.is_empty());
        assert!(matches!(
            remove_list_entry(&next, ListSection::Projects, 0),
            Err(EditError::IndexOutOfRange { len: 0, .. })
        ));
    }

    #[test]
    fn test_list_section_parse() {
        assert_eq!("projects".parse::<ListSection>().unwrap(), ListSection::Projects);
        assert!("skills".parse::<ListSection>().is_err());
    }

    fn field_value(record: &Record, path: &FieldPath) -> String {
        let mut copy = record.clone();
        field_slot(&mut copy, path).unwrap().clone()
    }
}

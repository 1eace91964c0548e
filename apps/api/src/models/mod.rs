pub mod resume;

pub use resume::{EducationEntry, PersonalInfo, ProjectEntry, Record, ResumeRow, SkillBuckets};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// `application_link` value for applications sent through the in-site dialog.
pub const EASY_APPLIED: &str = "Easy Applied";
/// `date_applied` value for external applications the user still has to finish.
pub const PENDING: &str = "Pending";
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkStyle {
    OnSite,
    Remote,
    Hybrid,
    Unknown,
}

impl WorkStyle {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "on-site" | "onsite" | "on site" | "presencial" => WorkStyle::OnSite,
            "remote" | "remoto" | "en remoto" => WorkStyle::Remote,
            "hybrid" | "híbrido" | "hibrido" => WorkStyle::Hybrid,
            _ => WorkStyle::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkStyle::OnSite => "On-site",
            WorkStyle::Remote => "Remote",
            WorkStyle::Hybrid => "Hybrid",
            WorkStyle::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for WorkStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobListing {
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub work_location: String,
    pub work_style: WorkStyle,
    pub job_link: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Experience {
    Years(u32),
    Unknown,
    /// Extraction itself blew up; the job is still considered.
    Error,
}

impl fmt::Display for Experience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Experience::Years(n) => write!(f, "{}", n),
            Experience::Unknown => f.write_str(UNKNOWN),
            Experience::Error => f.write_str("Error in extraction"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescription {
    pub text: String,
    pub experience_required: Experience,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Select,
    Radio,
    Text,
    Textarea,
    Checkbox,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Select => "select",
            FieldKind::Radio => "radio",
            FieldKind::Text => "text",
            FieldKind::Textarea => "textarea",
            FieldKind::Checkbox => "checkbox",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A form field as answered. `label` includes the enumerated options for
/// select and radio fields so two questions with the same text but different
/// choices stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Question {
    pub label: String,
    pub answer: String,
    pub kind: FieldKind,
    pub previous: Option<String>,
}

pub type QuestionSet = BTreeSet<Question>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub work_location: String,
    pub work_style: String,
    pub about_job: String,
    pub experience_required: String,
    pub skills: String,
    pub hr_name: String,
    pub hr_link: String,
    pub resume: String,
    pub reposted: bool,
    pub date_listed: String,
    /// Timestamp, or [`PENDING`] for external applications.
    pub date_applied: String,
    pub job_link: String,
    /// External URL, or [`EASY_APPLIED`].
    pub application_link: String,
    pub questions: QuestionSet,
    pub connect_request: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureRecord {
    pub job_id: String,
    pub job_link: String,
    pub resume: String,
    pub date_listed: String,
    pub date_tried: String,
    pub reason: String,
    pub detail: String,
    pub application_link: String,
    pub screenshot: String,
}

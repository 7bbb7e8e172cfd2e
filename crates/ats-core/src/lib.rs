//! Core domain model for the ATS dashboard: job records as the backend API
//! serves them, the write payload it accepts, and the list-field codec.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub const CRATE_NAME: &str = "ats-core";

/// Separator used by the backend for list-shaped text fields.
pub const LIST_FIELD_SEPARATOR: char = '\n';

/// Calendar format used by the editable deadline.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Closed,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Draft,
        JobStatus::Active,
        JobStatus::Paused,
        JobStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Draft => "draft",
            JobStatus::Active => "active",
            JobStatus::Paused => "paused",
            JobStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(JobStatus::Draft),
            "active" => Ok(JobStatus::Active),
            "paused" => Ok(JobStatus::Paused),
            "closed" => Ok(JobStatus::Closed),
            _ => Err(ParseEnumError {
                kind: "job status",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Junior,
    #[default]
    Middle,
    Senior,
}

impl ExperienceLevel {
    pub const ALL: [ExperienceLevel; 3] = [
        ExperienceLevel::Junior,
        ExperienceLevel::Middle,
        ExperienceLevel::Senior,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Junior => "junior",
            ExperienceLevel::Middle => "middle",
            ExperienceLevel::Senior => "senior",
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExperienceLevel {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "junior" => Ok(ExperienceLevel::Junior),
            "middle" | "mid" => Ok(ExperienceLevel::Middle),
            "senior" => Ok(ExperienceLevel::Senior),
            _ => Err(ParseEnumError {
                kind: "experience level",
                value: s.to_string(),
            }),
        }
    }
}

/// Company reference as embedded in a job record. Older endpoints return the
/// bare primary key, newer ones a nested summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompanyRef {
    Id(i64),
    Summary(CompanySummary),
}

impl CompanyRef {
    pub fn display_name(&self) -> String {
        match self {
            CompanyRef::Id(id) => format!("Company #{id}"),
            CompanyRef::Summary(summary) => summary.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySummary {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub city: Option<String>,
}

/// Job posting as returned by the backend.
///
/// `id`, `company`, `created_at`, `updated_at`, `applications_count` and
/// `ai_generated` are server-owned and never part of a write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: i64,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub requirements: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub benefits: String,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub experience_level: ExperienceLevel,
    #[serde(default)]
    pub salary_min: Option<f64>,
    #[serde(default)]
    pub salary_max: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(default)]
    pub remote_allowed: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub contract_type: String,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub company: Option<CompanyRef>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub applications_count: u32,
    #[serde(default)]
    pub ai_generated: bool,
}

impl JobRecord {
    pub fn requirement_items(&self) -> Vec<String> {
        split_list_field(&self.requirements)
    }

    pub fn benefit_items(&self) -> Vec<String> {
        split_list_field(&self.benefits)
    }

    pub fn salary_range_label(&self) -> Option<String> {
        match (self.salary_min, self.salary_max) {
            (Some(min), Some(max)) => Some(format!("{} - {} MAD", format_amount(min), format_amount(max))),
            (Some(min), None) => Some(format!("from {} MAD", format_amount(min))),
            (None, Some(max)) => Some(format!("up to {} MAD", format_amount(max))),
            (None, None) => None,
        }
    }
}

/// Body of `POST /jobs/` and `PATCH /jobs/{id}/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobWritePayload {
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub benefits: String,
    pub status: JobStatus,
    pub experience_level: ExperienceLevel,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub location: String,
    pub remote_allowed: bool,
    pub contract_type: String,
    pub deadline: Option<String>,
}

/// Paginated list envelope used by every collection endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: usize,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Filters accepted by the job list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobListQuery {
    pub page: usize,
    pub page_size: usize,
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub search: Option<String>,
}

impl JobListQuery {
    pub fn matches(&self, job: &JobRecord) -> bool {
        if let Some(status) = self.status {
            if job.status != status {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                job.title.to_lowercase().contains(&term)
                    || job.location.to_lowercase().contains(&term)
            }
            _ => true,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Split a newline-delimited list field into trimmed, non-blank items.
pub fn split_list_field(value: &str) -> Vec<String> {
    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn join_list_field(items: &[String]) -> String {
    let mut out = String::new();
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            out.push(LIST_FIELD_SEPARATOR);
        }
        out.push_str(item);
    }
    out
}

/// Reduce a stored deadline (RFC 3339 instant or plain date) to `YYYY-MM-DD`.
/// Unparseable input yields an empty string.
pub fn deadline_to_date_input(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return String::new();
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return instant.with_timezone(&Utc).date_naive().format(DATE_FORMAT).to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, DATE_FORMAT) {
        return date.format(DATE_FORMAT).to_string();
    }
    value
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, DATE_FORMAT).ok())
        .map(|date| date.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// Deadlines are stored as the last second of the chosen day, in UTC.
pub fn end_of_day_deadline(date: NaiveDate) -> String {
    format!("{}T23:59:59Z", date.format(DATE_FORMAT))
}

pub fn parse_date_input(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

/// Render an amount without a trailing `.0` so it round-trips through a text input.
pub fn format_amount(value: f64) -> String {
    format!("{value}")
}

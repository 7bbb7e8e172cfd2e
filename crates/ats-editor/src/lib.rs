//! Job posting editor: the form-shaped draft, its validation rules and the
//! load/save orchestration against a [`JobGateway`], plus the paginated list
//! state shared by the dashboard list screens.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use ats_client::{ApiError, ApiErrorKind, JobGateway};
use ats_core::{
    deadline_to_date_input, end_of_day_deadline, format_amount, join_list_field,
    parse_date_input, split_list_field, ExperienceLevel, JobListQuery, JobRecord, JobStatus,
    JobWritePayload, Page, ParseEnumError,
};
use chrono::{Local, NaiveDate};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const CRATE_NAME: &str = "ats-editor";

pub const JOBS_LIST_PATH: &str = "/dashboard/jobs";
pub const MAX_DESCRIPTION_CHARS: usize = 5000;

const VALIDATION_FAILED_MESSAGE: &str = "Please correct the highlighted fields before saving.";

pub fn job_detail_path(id: i64) -> String {
    format!("{JOBS_LIST_PATH}/{id}")
}

pub fn job_edit_path(id: i64) -> String {
    format!("{JOBS_LIST_PATH}/{id}/edit")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, kind: NotificationKind);
}

#[derive(Debug, Default)]
pub struct NotificationLog {
    entries: Mutex<Vec<Notification>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.lock().last().cloned()
    }

    pub fn count(&self, kind: NotificationKind) -> usize {
        self.lock().iter().filter(|n| n.kind == kind).count()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, message: &str, kind: NotificationKind) {
        self.lock().push(Notification {
            message: message.to_string(),
            kind,
        });
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, kind: NotificationKind) {
        match kind {
            NotificationKind::Success => info!(target: "ats::notify", "{message}"),
            NotificationKind::Error => warn!(target: "ats::notify", "{message}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigateOptions {
    pub replace: bool,
}

pub trait Navigator: Send + Sync {
    fn go_to(&self, path: &str, options: NavigateOptions);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub path: String,
    pub options: NavigateOptions,
}

#[derive(Debug, Default)]
pub struct NavigationLog {
    entries: Mutex<Vec<Navigation>>,
}

impl NavigationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Navigation> {
        self.lock().clone()
    }

    pub fn last(&self) -> Option<Navigation> {
        self.lock().last().cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Navigation>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Navigator for NavigationLog {
    fn go_to(&self, path: &str, options: NavigateOptions) {
        self.lock().push(Navigation {
            path: path.to_string(),
            options,
        });
    }
}

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadErrorRedirect {
    #[default]
    NotFoundOnly,
    Always,
}

impl LoadErrorRedirect {
    pub fn should_redirect(&self, error: &ApiError) -> bool {
        match self {
            LoadErrorRedirect::Always => true,
            LoadErrorRedirect::NotFoundOnly => error.kind() == ApiErrorKind::NotFound,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorPolicy {
    pub load_error_redirect: LoadErrorRedirect,
    pub default_experience_level: ExperienceLevel,
}

impl Default for EditorPolicy {
    fn default() -> Self {
        Self {
            load_error_redirect: LoadErrorRedirect::NotFoundOnly,
            default_experience_level: ExperienceLevel::Middle,
        }
    }
}

impl EditorPolicy {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let load_error_redirect = match std::env::var("ATS_LOAD_ERROR_REDIRECT").ok().as_deref() {
            Some("always") => LoadErrorRedirect::Always,
            Some("not_found") | None => LoadErrorRedirect::NotFoundOnly,
            Some(other) => {
                warn!(value = other, "unknown ATS_LOAD_ERROR_REDIRECT, using not_found");
                defaults.load_error_redirect
            }
        };
        let default_experience_level = match std::env::var("ATS_DEFAULT_EXPERIENCE") {
            Ok(value) => value.parse::<ExperienceLevel>().unwrap_or_else(|err: ParseEnumError| {
                warn!(error = %err, "ignoring ATS_DEFAULT_EXPERIENCE");
                defaults.default_experience_level
            }),
            Err(_) => defaults.default_experience_level,
        };
        Self {
            load_error_redirect,
            default_experience_level,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DraftField {
    Title,
    Description,
    Requirements,
    Benefits,
    Status,
    ExperienceLevel,
    SalaryMin,
    SalaryMax,
    Location,
    RemoteAllowed,
    ContractType,
    Deadline,
}

impl DraftField {
    pub const ALL: [DraftField; 12] = [
        DraftField::Title,
        DraftField::Description,
        DraftField::Requirements,
        DraftField::Benefits,
        DraftField::Status,
        DraftField::ExperienceLevel,
        DraftField::SalaryMin,
        DraftField::SalaryMax,
        DraftField::Location,
        DraftField::RemoteAllowed,
        DraftField::ContractType,
        DraftField::Deadline,
    ];

    /// Wire name, shared with the backend's field error keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftField::Title => "title",
            DraftField::Description => "description",
            DraftField::Requirements => "requirements",
            DraftField::Benefits => "benefits",
            DraftField::Status => "status",
            DraftField::ExperienceLevel => "experience_level",
            DraftField::SalaryMin => "salary_min",
            DraftField::SalaryMax => "salary_max",
            DraftField::Location => "location",
            DraftField::RemoteAllowed => "remote_allowed",
            DraftField::ContractType => "contract_type",
            DraftField::Deadline => "deadline",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == name)
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListField {
    Requirements,
    Benefits,
}

impl From<ListField> for DraftField {
    fn from(field: ListField) -> Self {
        match field {
            ListField::Requirements => DraftField::Requirements,
            ListField::Benefits => DraftField::Benefits,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobDraft {
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub benefits: Vec<String>,
    pub status: JobStatus,
    pub experience_level: ExperienceLevel,
    pub salary_min: String,
    pub salary_max: String,
    pub location: String,
    pub remote_allowed: bool,
    pub contract_type: String,
    pub deadline: String,
}

impl JobDraft {
    pub fn new(experience_level: ExperienceLevel) -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            requirements: Vec::new(),
            benefits: Vec::new(),
            status: JobStatus::Draft,
            experience_level,
            salary_min: String::new(),
            salary_max: String::new(),
            location: String::new(),
            remote_allowed: false,
            contract_type: String::new(),
            deadline: String::new(),
        }
    }

    pub fn from_record(record: &JobRecord) -> Self {
        Self {
            title: record.title.clone(),
            description: record.description.clone(),
            requirements: split_list_field(&record.requirements),
            benefits: split_list_field(&record.benefits),
            status: record.status,
            experience_level: record.experience_level,
            salary_min: record.salary_min.map(format_amount).unwrap_or_default(),
            salary_max: record.salary_max.map(format_amount).unwrap_or_default(),
            location: record.location.clone(),
            remote_allowed: record.remote_allowed,
            contract_type: record.contract_type.clone(),
            deadline: deadline_to_date_input(record.deadline.as_deref().unwrap_or_default()),
        }
    }

    pub fn to_payload(&self) -> JobWritePayload {
        JobWritePayload {
            title: self.title.clone(),
            description: self.description.clone(),
            requirements: join_list_field(&self.requirements),
            benefits: join_list_field(&self.benefits),
            status: self.status,
            experience_level: self.experience_level,
            salary_min: parse_amount(&self.salary_min),
            salary_max: parse_amount(&self.salary_max),
            location: self.location.clone(),
            remote_allowed: self.remote_allowed,
            contract_type: self.contract_type.clone(),
            deadline: parse_date_input(&self.deadline).map(end_of_day_deadline),
        }
    }

    pub fn items(&self, field: ListField) -> &[String] {
        match field {
            ListField::Requirements => &self.requirements,
            ListField::Benefits => &self.benefits,
        }
    }

    pub fn apply(&self, patch: &DraftPatch) -> JobDraft {
        let mut next = self.clone();
        if let Some(value) = &patch.title {
            next.title = value.clone();
        }
        if let Some(value) = &patch.description {
            next.description = value.clone();
        }
        if let Some(value) = &patch.requirements {
            next.requirements = value.clone();
        }
        if let Some(value) = &patch.benefits {
            next.benefits = value.clone();
        }
        if let Some(value) = patch.status {
            next.status = value;
        }
        if let Some(value) = patch.experience_level {
            next.experience_level = value;
        }
        if let Some(value) = &patch.salary_min {
            next.salary_min = value.clone();
        }
        if let Some(value) = &patch.salary_max {
            next.salary_max = value.clone();
        }
        if let Some(value) = &patch.location {
            next.location = value.clone();
        }
        if let Some(value) = patch.remote_allowed {
            next.remote_allowed = value;
        }
        if let Some(value) = &patch.contract_type {
            next.contract_type = value.clone();
        }
        if let Some(value) = &patch.deadline {
            next.deadline = value.clone();
        }
        next
    }
}

pub fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

#[derive(Debug, Error)]
pub enum FieldValueError {
    #[error(transparent)]
    Choice(#[from] ParseEnumError),
    #[error("{field}: {value:?} is not a yes/no value")]
    Flag { field: DraftField, value: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub benefits: Option<Vec<String>>,
    pub status: Option<JobStatus>,
    pub experience_level: Option<ExperienceLevel>,
    pub salary_min: Option<String>,
    pub salary_max: Option<String>,
    pub location: Option<String>,
    pub remote_allowed: Option<bool>,
    pub contract_type: Option<String>,
    pub deadline: Option<String>,
}

impl DraftPatch {
    pub fn list(field: ListField, items: Vec<String>) -> Self {
        match field {
            ListField::Requirements => Self {
                requirements: Some(items),
                ..Self::default()
            },
            ListField::Benefits => Self {
                benefits: Some(items),
                ..Self::default()
            },
        }
    }

    pub fn for_field(field: DraftField, value: &str) -> Result<Self, FieldValueError> {
        let text = Some(value.to_string());
        let patch = match field {
            DraftField::Title => Self { title: text, ..Self::default() },
            DraftField::Description => Self { description: text, ..Self::default() },
            DraftField::Requirements => Self::list(ListField::Requirements, split_list_field(value)),
            DraftField::Benefits => Self::list(ListField::Benefits, split_list_field(value)),
            DraftField::Status => Self {
                status: Some(value.parse()?),
                ..Self::default()
            },
            DraftField::ExperienceLevel => Self {
                experience_level: Some(value.parse()?),
                ..Self::default()
            },
            DraftField::SalaryMin => Self { salary_min: text, ..Self::default() },
            DraftField::SalaryMax => Self { salary_max: text, ..Self::default() },
            DraftField::Location => Self { location: text, ..Self::default() },
            DraftField::RemoteAllowed => Self {
                remote_allowed: Some(parse_flag(field, value)?),
                ..Self::default()
            },
            DraftField::ContractType => Self { contract_type: text, ..Self::default() },
            DraftField::Deadline => Self { deadline: text, ..Self::default() },
        };
        Ok(patch)
    }

    pub fn touched_fields(&self) -> Vec<DraftField> {
        let present = [
            (DraftField::Title, self.title.is_some()),
            (DraftField::Description, self.description.is_some()),
            (DraftField::Requirements, self.requirements.is_some()),
            (DraftField::Benefits, self.benefits.is_some()),
            (DraftField::Status, self.status.is_some()),
            (DraftField::ExperienceLevel, self.experience_level.is_some()),
            (DraftField::SalaryMin, self.salary_min.is_some()),
            (DraftField::SalaryMax, self.salary_max.is_some()),
            (DraftField::Location, self.location.is_some()),
            (DraftField::RemoteAllowed, self.remote_allowed.is_some()),
            (DraftField::ContractType, self.contract_type.is_some()),
            (DraftField::Deadline, self.deadline.is_some()),
        ];
        present
            .into_iter()
            .filter_map(|(field, touched)| touched.then_some(field))
            .collect()
    }
}

fn parse_flag(field: DraftField, value: &str) -> Result<bool, FieldValueError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Ok(true),
        "false" | "off" | "0" | "no" | "" => Ok(false),
        _ => Err(FieldValueError::Flag {
            field,
            value: value.to_string(),
        }),
    }
}

pub type FieldErrors = BTreeMap<DraftField, String>;

/// `(old draft, old errors, patch) -> (new draft, new errors)`: edited fields lose
/// their error.
pub fn apply_patch(draft: &JobDraft, errors: &FieldErrors, patch: &DraftPatch) -> (JobDraft, FieldErrors) {
    let mut next_errors = errors.clone();
    for field in patch.touched_fields() {
        next_errors.remove(&field);
    }
    (draft.apply(patch), next_errors)
}

pub fn validate_draft(draft: &JobDraft, target: JobStatus, today: NaiveDate) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let publishing = target == JobStatus::Active;

    if draft.title.trim().is_empty() {
        errors.insert(DraftField::Title, "Title is required".into());
    }
    if draft.description.trim().is_empty() {
        errors.insert(DraftField::Description, "Description is required".into());
    } else if draft.description.chars().count() > MAX_DESCRIPTION_CHARS {
        errors.insert(
            DraftField::Description,
            format!("Description must be at most {MAX_DESCRIPTION_CHARS} characters"),
        );
    }
    if draft.location.trim().is_empty() {
        errors.insert(DraftField::Location, "Location is required".into());
    }

    for field in [ListField::Requirements, ListField::Benefits] {
        if let Some(message) = list_problem(field, draft.items(field)) {
            errors.insert(field.into(), message);
        }
    }

    let salary_min = check_amount(&mut errors, DraftField::SalaryMin, &draft.salary_min, "Minimum salary", publishing);
    let salary_max = check_amount(&mut errors, DraftField::SalaryMax, &draft.salary_max, "Maximum salary", publishing);
    if publishing {
        if matches!(salary_min, Some(min) if min < 0.0) {
            errors.insert(DraftField::SalaryMin, "Minimum salary cannot be negative".into());
        }
        if let (Some(min), Some(max)) = (salary_min, salary_max) {
            if min >= max {
                errors.insert(
                    DraftField::SalaryMax,
                    "Maximum salary must exceed minimum salary".into(),
                );
            }
        }
    }

    let deadline = draft.deadline.trim();
    if deadline.is_empty() {
        if publishing {
            errors.insert(DraftField::Deadline, "Deadline is required".into());
        }
    } else {
        match parse_date_input(deadline) {
            None => {
                errors.insert(
                    DraftField::Deadline,
                    "Deadline must be a valid date (YYYY-MM-DD)".into(),
                );
            }
            Some(date) if publishing && date < today => {
                errors.insert(DraftField::Deadline, "Deadline cannot be in the past".into());
            }
            Some(_) => {}
        }
    }

    errors
}

fn check_amount(
    errors: &mut FieldErrors,
    field: DraftField,
    raw: &str,
    label: &str,
    required: bool,
) -> Option<f64> {
    if raw.trim().is_empty() {
        if required {
            errors.insert(field, format!("{label} is required"));
        }
        return None;
    }
    let parsed = parse_amount(raw);
    if parsed.is_none() {
        errors.insert(field, format!("{label} must be a number"));
    }
    parsed
}

fn list_problem(field: ListField, items: &[String]) -> Option<String> {
    let label = match field {
        ListField::Requirements => "Requirements",
        ListField::Benefits => "Benefits",
    };
    if items.iter().any(|item| item.trim().is_empty()) {
        return Some(format!("{label} cannot contain empty entries"));
    }
    let duplicated = items
        .iter()
        .enumerate()
        .any(|(idx, item)| items[..idx].iter().any(|earlier| earlier.trim() == item.trim()));
    duplicated.then(|| format!("{label} cannot contain duplicates"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTarget {
    Draft,
    Active,
}

impl SubmitTarget {
    pub fn status(&self) -> JobStatus {
        match self {
            SubmitTarget::Draft => JobStatus::Draft,
            SubmitTarget::Active => JobStatus::Active,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded,
    Failed { error: ApiError, redirected: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Saved(JobRecord),
    Invalid,
    Failed(ApiError),
}

#[derive(Clone)]
pub struct EditorContext {
    pub gateway: Arc<dyn JobGateway>,
    pub notifier: Arc<dyn Notifier>,
    pub navigator: Arc<dyn Navigator>,
    pub clock: Arc<dyn Clock>,
    pub policy: EditorPolicy,
}

impl EditorContext {
    pub fn new(
        gateway: Arc<dyn JobGateway>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            gateway,
            notifier,
            navigator,
            clock: Arc::new(SystemClock),
            policy: EditorPolicy::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_policy(mut self, policy: EditorPolicy) -> Self {
        self.policy = policy;
        self
    }
}

pub fn failure_message(action: &str, error: &ApiError) -> String {
    match error {
        ApiError::Validation { message, .. } | ApiError::NotFound { message } => message.clone(),
        ApiError::Unauthorized { .. } => "Your session has expired, please sign in again.".to_string(),
        ApiError::Network { message } | ApiError::Unknown { message, .. } => {
            format!("{action} failed: {message}")
        }
    }
}

/// State of one job create/edit screen. Owned by that screen; methods take
/// `&mut self`, so edits never interleave with a pending load or save.
pub struct JobFormController {
    ctx: EditorContext,
    job_id: Option<i64>,
    draft: JobDraft,
    baseline: Option<JobRecord>,
    errors: FieldErrors,
    dirty: bool,
    loading: bool,
    saving: bool,
}

impl JobFormController {
    pub fn new(ctx: EditorContext) -> Self {
        let draft = JobDraft::new(ctx.policy.default_experience_level);
        Self {
            ctx,
            job_id: None,
            draft,
            baseline: None,
            errors: FieldErrors::new(),
            dirty: false,
            loading: false,
            saving: false,
        }
    }

    pub fn job_id(&self) -> Option<i64> {
        self.job_id
    }

    pub fn is_edit_mode(&self) -> bool {
        self.job_id.is_some()
    }

    pub fn draft(&self) -> &JobDraft {
        &self.draft
    }

    pub fn baseline(&self) -> Option<&JobRecord> {
        self.baseline.as_ref()
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, field: DraftField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub async fn load(&mut self, id: i64) -> LoadOutcome {
        self.loading = true;
        let result = self.ctx.gateway.get_job(id).await;
        self.loading = false;

        match result {
            Ok(record) => {
                debug!(job_id = id, "job loaded into editor");
                self.job_id = Some(id);
                self.draft = JobDraft::from_record(&record);
                self.baseline = Some(record);
                self.errors.clear();
                self.dirty = false;
                self.ctx.notifier.notify("Job loaded", NotificationKind::Success);
                LoadOutcome::Loaded
            }
            Err(error) => {
                let redirected = self.ctx.policy.load_error_redirect.should_redirect(&error);
                warn!(job_id = id, kind = ?error.kind(), redirected, "failed to load job");
                self.ctx
                    .notifier
                    .notify(&failure_message("Loading the job", &error), NotificationKind::Error);
                if redirected {
                    self.ctx
                        .navigator
                        .go_to(JOBS_LIST_PATH, NavigateOptions { replace: true });
                }
                LoadOutcome::Failed { error, redirected }
            }
        }
    }

    pub fn update(&mut self, patch: DraftPatch) {
        if patch.touched_fields().is_empty() {
            return;
        }
        let (draft, errors) = apply_patch(&self.draft, &self.errors, &patch);
        self.draft = draft;
        self.errors = errors;
        self.dirty = true;
    }

    pub fn update_field(&mut self, field: DraftField, value: &str) -> Result<(), FieldValueError> {
        let patch = DraftPatch::for_field(field, value)?;
        self.update(patch);
        Ok(())
    }

    pub fn add_list_item(&mut self, field: ListField, text: &str) -> bool {
        let item = text.trim();
        let current = self.draft.items(field);
        if item.is_empty() || current.iter().any(|existing| existing == item) {
            return false;
        }
        let mut items = current.to_vec();
        items.push(item.to_string());
        self.update(DraftPatch::list(field, items));
        true
    }

    pub fn remove_list_item(&mut self, field: ListField, index: usize) -> bool {
        let current = self.draft.items(field);
        if index >= current.len() {
            return false;
        }
        let mut items = current.to_vec();
        items.remove(index);
        self.update(DraftPatch::list(field, items));
        true
    }

    pub fn validate(&mut self, target: Option<JobStatus>) -> bool {
        let target = target.unwrap_or(self.draft.status);
        self.errors = validate_draft(&self.draft, target, self.ctx.clock.today());
        self.errors.is_empty()
    }

    pub async fn submit(&mut self, target: SubmitTarget) -> SubmitOutcome {
        let prior_status = self.draft.status;
        let target_status = target.status();
        self.draft.status = target_status;

        if !self.validate(Some(target_status)) {
            self.draft.status = prior_status;
            debug!(errors = self.errors.len(), "job form failed validation");
            self.ctx
                .notifier
                .notify(VALIDATION_FAILED_MESSAGE, NotificationKind::Error);
            return SubmitOutcome::Invalid;
        }

        let payload = self.draft.to_payload();
        let editing = self.job_id.is_some();
        self.saving = true;
        let result = match self.job_id {
            Some(id) => self.ctx.gateway.update_job(id, &payload).await,
            None => self.ctx.gateway.create_job(&payload).await,
        };
        self.saving = false;

        match result {
            Ok(record) => {
                info!(job_id = record.id, status = %record.status, editing, "job saved");
                let message = match (editing, target) {
                    (true, _) => "Job updated successfully",
                    (false, SubmitTarget::Draft) => "Job saved as draft",
                    (false, SubmitTarget::Active) => "Job published successfully",
                };
                self.job_id = Some(record.id);
                self.draft = JobDraft::from_record(&record);
                self.baseline = Some(record.clone());
                self.errors.clear();
                self.dirty = false;
                self.ctx.notifier.notify(message, NotificationKind::Success);
                self.ctx
                    .navigator
                    .go_to(&job_detail_path(record.id), NavigateOptions::default());
                SubmitOutcome::Saved(record)
            }
            Err(error) => {
                warn!(kind = ?error.kind(), editing, "failed to save job");
                self.draft.status = prior_status;
                self.absorb_field_errors(&error);
                self.ctx
                    .notifier
                    .notify(&failure_message("Saving the job", &error), NotificationKind::Error);
                SubmitOutcome::Failed(error)
            }
        }
    }

    /// Create mode always reports changes; edit mode compares wire projections.
    pub fn has_changes(&self) -> bool {
        match (&self.job_id, &self.baseline) {
            (Some(_), Some(baseline)) => {
                JobDraft::from_record(baseline).to_payload() != self.draft.to_payload()
            }
            _ => true,
        }
    }

    pub fn can_submit_active(&self) -> bool {
        !self.draft.title.trim().is_empty()
            && !self.draft.description.trim().is_empty()
            && !self.draft.location.trim().is_empty()
    }

    pub async fn reset_form(&mut self) -> Option<LoadOutcome> {
        match self.job_id {
            Some(id) => Some(self.load(id).await),
            None => {
                self.draft = JobDraft::new(self.ctx.policy.default_experience_level);
                self.errors.clear();
                self.dirty = false;
                None
            }
        }
    }

    fn absorb_field_errors(&mut self, error: &ApiError) {
        if let ApiError::Validation { fields, .. } = error {
            for (name, messages) in fields {
                if let (Some(field), Some(message)) = (DraftField::from_name(name), messages.first()) {
                    self.errors.insert(field, message.clone());
                }
            }
        }
    }
}

#[async_trait]
pub trait PageSource<T>: Send + Sync {
    async fn fetch_page(&self, page: usize, page_size: usize) -> Result<Page<T>, ApiError>;
}

pub struct JobListSource {
    gateway: Arc<dyn JobGateway>,
    filters: JobListQuery,
}

impl JobListSource {
    pub fn new(gateway: Arc<dyn JobGateway>, filters: JobListQuery) -> Self {
        Self { gateway, filters }
    }
}

#[async_trait]
impl PageSource<JobRecord> for JobListSource {
    async fn fetch_page(&self, page: usize, page_size: usize) -> Result<Page<JobRecord>, ApiError> {
        let query = JobListQuery {
            page,
            page_size,
            ..self.filters.clone()
        };
        self.gateway.list_jobs(&query).await
    }
}

/// Loading/error/pagination state for a list screen. A failed fetch keeps the
/// rows already on screen and only records the error.
pub struct PagedList<T> {
    source: Arc<dyn PageSource<T>>,
    items: Vec<T>,
    page: usize,
    page_size: usize,
    total_count: usize,
    loading: bool,
    loaded: bool,
    error: Option<String>,
    failure: Option<ApiError>,
}

impl<T: Send + 'static> PagedList<T> {
    pub fn new(source: Arc<dyn PageSource<T>>, page_size: usize) -> Self {
        Self {
            source,
            items: Vec::new(),
            page: 1,
            page_size: page_size.max(1),
            total_count: 0,
            loading: false,
            loaded: false,
            error: None,
            failure: None,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn failure(&self) -> Option<&ApiError> {
        self.failure.as_ref()
    }

    pub fn total_pages(&self) -> usize {
        if self.total_count == 0 {
            1
        } else {
            self.total_count.div_ceil(self.page_size)
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub async fn refresh(&mut self) -> bool {
        self.fetch(self.page).await
    }

    pub async fn next_page(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.fetch(self.page + 1).await
    }

    pub async fn previous_page(&mut self) -> bool {
        if !self.has_previous() {
            return false;
        }
        self.fetch(self.page - 1).await
    }

    /// Ignored for page 0 and, once a page has loaded, for pages past the end.
    pub async fn go_to_page(&mut self, page: usize) -> bool {
        if page == 0 || (self.loaded && page > self.total_pages()) {
            return false;
        }
        self.fetch(page).await
    }

    async fn fetch(&mut self, page: usize) -> bool {
        self.loading = true;
        let result = self.source.fetch_page(page, self.page_size).await;
        self.loading = false;
        match result {
            Ok(fetched) => {
                self.items = fetched.results;
                self.total_count = fetched.count;
                self.page = page;
                self.loaded = true;
                self.error = None;
                self.failure = None;
                true
            }
            Err(error) => {
                warn!(page, kind = ?error.kind(), "list fetch failed");
                self.error = Some(failure_message("Loading the list", &error));
                self.failure = Some(error);
                false
            }
        }
    }
}

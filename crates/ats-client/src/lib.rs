//! Backend API gateway + session handling for the ATS dashboard.

use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use ats_core::{JobListQuery, JobRecord, JobWritePayload, Page};
use chrono::Utc;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info_span, warn, Instrument};

pub const CRATE_NAME: &str = "ats-client";

const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: Option<String>,
    pub api_token: Option<String>,
    pub session_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout: Duration::from_secs(20),
            user_agent: Some("ats-dashboard/0.1".to_string()),
            api_token: None,
            session_file: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("ATS_API_URL").unwrap_or(defaults.base_url),
            timeout: std::env::var("ATS_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            user_agent: std::env::var("ATS_USER_AGENT").ok().or(defaults.user_agent),
            api_token: std::env::var("ATS_API_TOKEN")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            session_file: std::env::var("ATS_SESSION_FILE").ok().map(PathBuf::from),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn,
    SignedOut,
    Invalidated,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("token store {path}: {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Holds the API token shared by every gateway, optionally mirrored to a file so a
/// restarted process picks the session back up.
#[derive(Debug)]
pub struct SessionService {
    token: watch::Sender<Option<String>>,
    events: broadcast::Sender<SessionEvent>,
    store_path: Option<PathBuf>,
}

impl Default for SessionService {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionService {
    pub fn new() -> Self {
        let (token, _) = watch::channel(None);
        let (events, _) = broadcast::channel(16);
        Self {
            token,
            events,
            store_path: None,
        }
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let session = Self::new();
        session.token.send_replace(Some(token.into()));
        session
    }

    pub fn with_store(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        let mut session = Self::new();
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                let token = contents.trim();
                if !token.is_empty() {
                    debug!(path = %path.display(), "rehydrated session token");
                    session.token.send_replace(Some(token.to_string()));
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => return Err(SessionError::Store { path, source }),
        }
        session.store_path = Some(path);
        Ok(session)
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, SessionError> {
        let session = match &config.session_file {
            Some(path) => Self::with_store(path)?,
            None => Self::new(),
        };
        if let Some(token) = &config.api_token {
            if session.token().is_none() {
                session.set_token(token.clone())?;
            }
        }
        Ok(session)
    }

    pub fn token(&self) -> Option<String> {
        self.token.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.borrow().is_some()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn set_token(&self, token: impl Into<String>) -> Result<(), SessionError> {
        let token = token.into();
        if let Some(path) = &self.store_path {
            std::fs::write(path, &token).map_err(|source| SessionError::Store {
                path: path.clone(),
                source,
            })?;
        }
        self.token.send_replace(Some(token));
        let _ = self.events.send(SessionEvent::SignedIn);
        Ok(())
    }

    pub fn clear(&self) -> Result<(), SessionError> {
        self.token.send_replace(None);
        let removed = self.remove_store();
        let _ = self.events.send(SessionEvent::SignedOut);
        removed
    }

    /// Drop the token after the backend refused it and tell subscribers.
    pub fn invalidate(&self) {
        self.token.send_replace(None);
        if let Err(err) = self.remove_store() {
            warn!(error = %err, "failed to remove invalidated session token");
        }
        let _ = self.events.send(SessionEvent::Invalidated);
    }

    fn remove_store(&self) -> Result<(), SessionError> {
        let Some(path) = &self.store_path else {
            return Ok(());
        };
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionError::Store {
                path: path.clone(),
                source,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    Validation,
    NotFound,
    Unauthorized,
    Network,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        fields: BTreeMap<String, Vec<String>>,
    },
    #[error("{message}")]
    NotFound { message: String },
    #[error("{message}")]
    Unauthorized { message: String },
    #[error("{message}")]
    Network { message: String },
    #[error("{message}")]
    Unknown { status: Option<u16>, message: String },
}

impl ApiError {
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            ApiError::Validation { .. } => ApiErrorKind::Validation,
            ApiError::NotFound { .. } => ApiErrorKind::NotFound,
            ApiError::Unauthorized { .. } => ApiErrorKind::Unauthorized,
            ApiError::Network { .. } => ApiErrorKind::Network,
            ApiError::Unknown { .. } => ApiErrorKind::Unknown,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Validation { message, .. }
            | ApiError::NotFound { message }
            | ApiError::Unauthorized { message }
            | ApiError::Network { message }
            | ApiError::Unknown { message, .. } => message,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound {
            message: message.into(),
        }
    }

    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<JsonValue>(body).ok();
        let message = parsed
            .as_ref()
            .and_then(extract_error_message)
            .unwrap_or_else(|| status_fallback_message(status));

        match status {
            400 | 422 => ApiError::Validation {
                message,
                fields: parsed.as_ref().map(field_errors).unwrap_or_default(),
            },
            401 => ApiError::Unauthorized { message },
            404 => ApiError::NotFound { message },
            _ => ApiError::Unknown {
                status: Some(status),
                message,
            },
        }
    }

    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network {
                message: "The server took too long to respond.".to_string(),
            }
        } else if err.is_connect() || err.is_request() {
            ApiError::Network {
                message: format!("Could not reach the server: {err}"),
            }
        } else {
            ApiError::Unknown {
                status: err.status().map(|s| s.as_u16()),
                message: err.to_string(),
            }
        }
    }
}

/// Pull the most specific human-readable message out of an error body:
/// `detail`, then `error`, then `message`, then the first field error.
pub fn extract_error_message(body: &JsonValue) -> Option<String> {
    let object = match body {
        JsonValue::String(_) | JsonValue::Array(_) => return first_text(body),
        JsonValue::Object(object) => object,
        _ => return None,
    };

    for key in ["detail", "error", "message"] {
        let text = match object.get(key) {
            Some(nested @ JsonValue::Object(_)) => extract_error_message(nested),
            Some(value) => first_text(value),
            None => None,
        };
        if text.is_some() {
            return text;
        }
    }

    if let Some(text) = object.get("non_field_errors").and_then(first_text) {
        return Some(text);
    }

    object
        .iter()
        .find_map(|(field, value)| first_text(value).map(|text| format!("{field}: {text}")))
}

fn field_errors(body: &JsonValue) -> BTreeMap<String, Vec<String>> {
    let Some(object) = body.as_object() else {
        return BTreeMap::new();
    };
    object
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "detail" | "error" | "message"))
        .filter_map(|(key, value)| {
            let messages: Vec<String> = match value {
                JsonValue::String(text) => vec![text.clone()],
                JsonValue::Array(items) => items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect(),
                _ => Vec::new(),
            };
            (!messages.is_empty()).then(|| (key.clone(), messages))
        })
        .collect()
}

fn first_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(text) => non_blank(text),
        JsonValue::Array(items) => items.iter().find_map(|item| item.as_str().and_then(non_blank)),
        _ => None,
    }
}

fn non_blank(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn status_fallback_message(status: u16) -> String {
    match StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
    {
        Some(reason) => format!("Request failed with status {status} ({reason})"),
        None => format!("Request failed with status {status}"),
    }
}

#[async_trait]
pub trait JobGateway: Send + Sync {
    async fn get_job(&self, id: i64) -> Result<JobRecord, ApiError>;

    async fn create_job(&self, payload: &JobWritePayload) -> Result<JobRecord, ApiError>;

    async fn update_job(&self, id: i64, payload: &JobWritePayload) -> Result<JobRecord, ApiError>;

    async fn list_jobs(&self, query: &JobListQuery) -> Result<Page<JobRecord>, ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpJobGateway {
    client: reqwest::Client,
    base_url: String,
    session: Arc<SessionService>,
}

impl HttpJobGateway {
    pub fn new(config: &ClientConfig, session: Arc<SessionService>) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(config.timeout);

        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        let client = builder.build().context("building reqwest client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionService> {
        &self.session
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<R: DeserializeOwned + Send>(
        &self,
        method: Method,
        path: &str,
        request: RequestBuilder,
    ) -> Result<R, ApiError> {
        let span = info_span!("api_request", method = %method, path);
        async move {
            let response = request
                .send()
                .await
                .map_err(|err| ApiError::from_transport(&err))?;
            let status = response.status();
            debug!(status = status.as_u16(), "api response");

            if status.is_success() {
                return response.json::<R>().await.map_err(|err| ApiError::Unknown {
                    status: Some(status.as_u16()),
                    message: format!("Unexpected response from the server: {err}"),
                });
            }

            let body = response.text().await.unwrap_or_default();
            let error = ApiError::from_response(status.as_u16(), &body);
            if error.kind() == ApiErrorKind::Unauthorized {
                warn!("api rejected session token");
                self.session.invalidate();
            }
            Err(error)
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl JobGateway for HttpJobGateway {
    async fn get_job(&self, id: i64) -> Result<JobRecord, ApiError> {
        let path = format!("/jobs/{id}/");
        let request = self.request(Method::GET, &path);
        self.send(Method::GET, &path, request).await
    }

    async fn create_job(&self, payload: &JobWritePayload) -> Result<JobRecord, ApiError> {
        let path = "/jobs/";
        let request = self.request(Method::POST, path).json(payload);
        self.send(Method::POST, path, request).await
    }

    async fn update_job(&self, id: i64, payload: &JobWritePayload) -> Result<JobRecord, ApiError> {
        let path = format!("/jobs/{id}/");
        let request = self.request(Method::PATCH, &path).json(payload);
        self.send(Method::PATCH, &path, request).await
    }

    async fn list_jobs(&self, query: &JobListQuery) -> Result<Page<JobRecord>, ApiError> {
        let path = "/jobs/";
        let mut params: Vec<(&str, String)> = vec![
            ("page", query.page.max(1).to_string()),
            ("page_size", effective_page_size(query).to_string()),
        ];
        if let Some(status) = query.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            params.push(("search", search.to_string()));
        }
        let request = self.request(Method::GET, path).query(&params);
        self.send(Method::GET, path, request).await
    }
}

fn effective_page_size(query: &JobListQuery) -> usize {
    if query.page_size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        query.page_size
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    Get(i64),
    Create(JobWritePayload),
    Update(i64, JobWritePayload),
    List(JobListQuery),
}

#[derive(Debug, Default)]
pub struct MemoryJobGateway {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    jobs: BTreeMap<i64, JobRecord>,
    next_id: i64,
    calls: Vec<GatewayCall>,
    failures: VecDeque<ApiError>,
}

impl MemoryJobGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_jobs(jobs: impl IntoIterator<Item = JobRecord>) -> Self {
        let gateway = Self::new();
        for job in jobs {
            gateway.insert(job);
        }
        gateway
    }

    pub fn insert(&self, job: JobRecord) {
        let mut state = self.state();
        state.next_id = state.next_id.max(job.id);
        state.jobs.insert(job.id, job);
    }

    pub fn job(&self, id: i64) -> Option<JobRecord> {
        self.state().jobs.get(&id).cloned()
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state().calls.clone()
    }

    /// Queue an error returned by the next gateway call, whatever it is.
    pub fn fail_next(&self, error: ApiError) {
        self.state().failures.push_back(error);
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: GatewayCall) -> Result<MutexGuard<'_, MemoryState>, ApiError> {
        let mut state = self.state();
        state.calls.push(call);
        match state.failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }
}

fn apply_payload(job: &mut JobRecord, payload: &JobWritePayload) {
    job.title = payload.title.clone();
    job.description = payload.description.clone();
    job.requirements = payload.requirements.clone();
    job.benefits = payload.benefits.clone();
    job.status = payload.status;
    job.experience_level = payload.experience_level;
    job.salary_min = payload.salary_min;
    job.salary_max = payload.salary_max;
    job.location = payload.location.clone();
    job.remote_allowed = payload.remote_allowed;
    job.contract_type = payload.contract_type.clone();
    job.deadline = payload.deadline.clone();
}

#[async_trait]
impl JobGateway for MemoryJobGateway {
    async fn get_job(&self, id: i64) -> Result<JobRecord, ApiError> {
        let state = self.record(GatewayCall::Get(id))?;
        state
            .jobs
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("Job not found."))
    }

    async fn create_job(&self, payload: &JobWritePayload) -> Result<JobRecord, ApiError> {
        let mut state = self.record(GatewayCall::Create(payload.clone()))?;
        state.next_id += 1;
        let now = Utc::now();
        let mut job = JobRecord {
            id: state.next_id,
            title: String::new(),
            description: String::new(),
            requirements: String::new(),
            benefits: String::new(),
            status: payload.status,
            experience_level: payload.experience_level,
            salary_min: None,
            salary_max: None,
            location: String::new(),
            remote_allowed: false,
            contract_type: String::new(),
            deadline: None,
            company: None,
            created_at: Some(now),
            updated_at: Some(now),
            applications_count: 0,
            ai_generated: false,
        };
        apply_payload(&mut job, payload);
        state.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn update_job(&self, id: i64, payload: &JobWritePayload) -> Result<JobRecord, ApiError> {
        let mut state = self.record(GatewayCall::Update(id, payload.clone()))?;
        let job = state
            .jobs
            .get_mut(&id)
            .ok_or_else(|| ApiError::not_found("Job not found."))?;
        apply_payload(job, payload);
        job.updated_at = Some(Utc::now());
        Ok(job.clone())
    }

    async fn list_jobs(&self, query: &JobListQuery) -> Result<Page<JobRecord>, ApiError> {
        let state = self.record(GatewayCall::List(query.clone()))?;
        let page_size = effective_page_size(query);
        let page = query.page.max(1);
        let matching: Vec<&JobRecord> = state
            .jobs
            .values()
            .rev()
            .filter(|job| query.matches(job))
            .collect();
        let count = matching.len();
        let results = matching
            .into_iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .cloned()
            .collect();
        Ok(Page {
            count,
            next: (page.saturating_mul(page_size) < count)
                .then(|| format!("?page={}", page.saturating_add(1))),
            previous: (page > 1).then(|| format!("?page={}", page - 1)),
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ats_core::{ExperienceLevel, JobStatus};
    use serde_json::json;
    use tempfile::tempdir;

    fn payload(title: &str) -> JobWritePayload {
        JobWritePayload {
            title: title.to_string(),
            description: "Build APIs".into(),
            requirements: "Rust\nSQL".into(),
            benefits: String::new(),
            status: JobStatus::Draft,
            experience_level: ExperienceLevel::Middle,
            salary_min: None,
            salary_max: None,
            location: "Casablanca".into(),
            remote_allowed: false,
            contract_type: "CDI".into(),
            deadline: None,
        }
    }

    #[test]
    fn detail_wins_over_field_errors() {
        let body = json!({"detail": "Not found.", "title": ["required"]});
        assert_eq!(extract_error_message(&body).as_deref(), Some("Not found."));
    }

    #[test]
    fn error_key_and_nested_error_objects() {
        assert_eq!(
            extract_error_message(&json!({"error": "Quota exceeded"})).as_deref(),
            Some("Quota exceeded")
        );
        assert_eq!(
            extract_error_message(&json!({"error": {"message": "Company suspended"}})).as_deref(),
            Some("Company suspended")
        );
    }

    #[test]
    fn list_shaped_bodies_keep_their_message() {
        let err = ApiError::from_response(400, r#"["This job can no longer be published."]"#);
        assert_eq!(err.kind(), ApiErrorKind::Validation);
        assert_eq!(err.message(), "This job can no longer be published.");

        assert_eq!(
            extract_error_message(&json!({"detail": ["Plan limit reached."], "title": ["x"]}))
                .as_deref(),
            Some("Plan limit reached.")
        );
        assert_eq!(
            extract_error_message(&json!({"detail": [], "title": ["required"]})).as_deref(),
            Some("title: required")
        );
    }

    #[test]
    fn field_errors_fall_back_to_first_field() {
        let body = json!({"salary_max": ["Ensure this value is greater than salary_min."]});
        assert_eq!(
            extract_error_message(&body).as_deref(),
            Some("salary_max: Ensure this value is greater than salary_min.")
        );
    }

    #[test]
    fn responses_are_classified_by_status() {
        let err = ApiError::from_response(400, r#"{"title": ["This field may not be blank."]}"#);
        assert_eq!(err.kind(), ApiErrorKind::Validation);
        match &err {
            ApiError::Validation { fields, .. } => {
                assert_eq!(fields["title"], vec!["This field may not be blank."]);
            }
            other => panic!("unexpected {other:?}"),
        }

        assert_eq!(ApiError::from_response(404, "").kind(), ApiErrorKind::NotFound);
        assert_eq!(ApiError::from_response(401, "{}").kind(), ApiErrorKind::Unauthorized);

        let err = ApiError::from_response(502, "<html>bad gateway</html>");
        assert_eq!(err.kind(), ApiErrorKind::Unknown);
        assert_eq!(err.message(), "Request failed with status 502 (Bad Gateway)");
    }

    #[test]
    fn session_store_rehydrates_and_clears() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("session.token");

        let session = SessionService::with_store(&path).expect("empty store");
        assert!(!session.is_authenticated());
        session.set_token("abc123").expect("persist token");

        let restored = SessionService::with_store(&path).expect("rehydrate");
        assert_eq!(restored.token().as_deref(), Some("abc123"));

        restored.clear().expect("clear");
        assert!(!path.exists());
        assert!(restored.token().is_none());
    }

    #[test]
    fn configured_token_does_not_override_stored_session() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("session.token");
        std::fs::write(&path, "stored\n").expect("seed");

        let config = ClientConfig {
            api_token: Some("from-env".into()),
            session_file: Some(path),
            ..ClientConfig::default()
        };
        let session = SessionService::from_config(&config).expect("session");
        assert_eq!(session.token().as_deref(), Some("stored"));
    }

    #[tokio::test]
    async fn invalidate_broadcasts_event() {
        let session = SessionService::with_token("t");
        let mut events = session.subscribe();
        session.invalidate();
        assert_eq!(events.recv().await.expect("event"), SessionEvent::Invalidated);
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn memory_gateway_creates_updates_and_pages() {
        let gateway = MemoryJobGateway::new();
        for idx in 0..12 {
            gateway.create_job(&payload(&format!("Job {idx}"))).await.expect("create");
        }
        let mut edit = payload("Renamed");
        edit.status = JobStatus::Active;
        let updated = gateway.update_job(3, &edit).await.expect("update");
        assert_eq!(updated.title, "Renamed");
        assert!(updated.created_at.is_some());

        let query = JobListQuery {
            page: 2,
            page_size: 5,
            ..JobListQuery::default()
        };
        let page = gateway.list_jobs(&query).await.expect("list");
        assert_eq!(page.count, 12);
        assert_eq!(page.results.len(), 5);
        assert_eq!(page.results[0].id, 7);
        assert!(page.next.is_some());
        assert!(page.previous.is_some());

        let far = JobListQuery {
            page: usize::MAX,
            page_size: 5,
            ..JobListQuery::default()
        };
        let beyond = gateway.list_jobs(&far).await.expect("list far page");
        assert!(beyond.results.is_empty());
        assert!(beyond.next.is_none());
        assert_eq!(beyond.count, 12);

        let missing = gateway.get_job(99).await.unwrap_err();
        assert_eq!(missing.kind(), ApiErrorKind::NotFound);
    }

    #[tokio::test]
    async fn memory_gateway_replays_queued_failures_once() {
        let gateway = MemoryJobGateway::new();
        gateway.fail_next(ApiError::Network {
            message: "offline".into(),
        });
        assert!(gateway.create_job(&payload("A")).await.is_err());
        assert!(gateway.create_job(&payload("A")).await.is_ok());
        assert_eq!(gateway.calls().len(), 2);
    }
}

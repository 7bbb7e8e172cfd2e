//! Axum + Askama screens for the job postings dashboard.
//!
//! Every request builds its own [`JobFormController`] with a fresh
//! [`NotificationLog`] / [`NavigationLog`] pair; recorded navigations become
//! `303 See Other` redirects and error notifications become the form banner.

use std::sync::Arc;

use anyhow::Context;
use askama::Template;
use ats_client::{
    ApiError, ApiErrorKind, ClientConfig, HttpJobGateway, JobGateway, SessionEvent, SessionService,
};
use ats_core::{join_list_field, ExperienceLevel, JobListQuery, JobRecord, JobStatus};
use ats_editor::{
    job_detail_path, job_edit_path, Clock, DraftField, DraftPatch, EditorContext, EditorPolicy,
    FieldErrors, JobDraft, JobFormController, JobListSource, ListField, LoadOutcome,
    NavigationLog, NotificationKind, NotificationLog, PageSource, PagedList, SubmitOutcome,
    SubmitTarget, SystemClock, JOBS_LIST_PATH,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Json, Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

pub const CRATE_NAME: &str = "ats-web";

pub const SESSION_EXPIRED_PATH: &str = "/session-expired";
const NEW_JOB_PATH: &str = "/dashboard/jobs/new";
const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn JobGateway>,
    pub session: Arc<SessionService>,
    pub policy: EditorPolicy,
    pub clock: Arc<dyn Clock>,
    pub page_size: usize,
}

impl AppState {
    pub fn new(gateway: Arc<dyn JobGateway>, session: Arc<SessionService>) -> Self {
        Self {
            gateway,
            session,
            policy: EditorPolicy::default(),
            clock: Arc::new(SystemClock),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// HTTP gateway + session store from `config`, editor policy from the environment.
    pub fn from_config(config: &ClientConfig) -> anyhow::Result<Self> {
        let session = Arc::new(
            SessionService::from_config(config).context("failed to open the session store")?,
        );
        let gateway = HttpJobGateway::new(config, session.clone())?;
        Ok(Self::new(Arc::new(gateway), session).with_policy(EditorPolicy::from_env()))
    }

    pub fn with_policy(mut self, policy: EditorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn editor(&self) -> (JobFormController, Arc<NotificationLog>, Arc<NavigationLog>) {
        let notes = Arc::new(NotificationLog::new());
        let nav = Arc::new(NavigationLog::new());
        let ctx = EditorContext::new(self.gateway.clone(), notes.clone(), nav.clone())
            .with_clock(self.clock.clone())
            .with_policy(self.policy);
        (JobFormController::new(ctx), notes, nav)
    }
}

#[derive(Debug, Clone)]
struct SelectOption {
    value: String,
    label: String,
    selected: bool,
}

#[derive(Debug, Clone)]
struct JobRow {
    id: i64,
    title: String,
    status: String,
    company: String,
    location: String,
    experience: String,
    salary: String,
    deadline: String,
    applications: u32,
}

impl From<&JobRecord> for JobRow {
    fn from(job: &JobRecord) -> Self {
        Self {
            id: job.id,
            title: job.title.clone(),
            status: job.status.to_string(),
            company: job
                .company
                .as_ref()
                .map(|c| c.display_name())
                .unwrap_or_default(),
            location: job.location.clone(),
            experience: job.experience_level.to_string(),
            salary: job.salary_range_label().unwrap_or_else(|| "n/a".into()),
            deadline: ats_core::deadline_to_date_input(job.deadline.as_deref().unwrap_or_default()),
            applications: job.applications_count,
        }
    }
}

#[derive(Template)]
#[template(path = "jobs.html")]
struct JobsTemplate {
    jobs: Vec<JobRow>,
    statuses: Vec<SelectOption>,
    status_filter: String,
    search: String,
    page: usize,
    total_pages: usize,
    total_count: usize,
    has_previous: bool,
    has_next: bool,
    error: String,
    notice: String,
}

#[derive(Template)]
#[template(path = "job_detail.html")]
struct JobDetailTemplate {
    job: JobRow,
    description: String,
    requirements: Vec<String>,
    benefits: Vec<String>,
    contract_type: String,
    remote_allowed: bool,
    ai_generated: bool,
    edit_href: String,
    notice: String,
}

#[derive(Debug, Default)]
struct FormErrors {
    title: String,
    description: String,
    requirements: String,
    benefits: String,
    experience_level: String,
    salary_min: String,
    salary_max: String,
    location: String,
    contract_type: String,
    deadline: String,
}

impl From<&FieldErrors> for FormErrors {
    fn from(errors: &FieldErrors) -> Self {
        let get = |field: DraftField| errors.get(&field).cloned().unwrap_or_default();
        Self {
            title: get(DraftField::Title),
            description: get(DraftField::Description),
            requirements: get(DraftField::Requirements),
            benefits: get(DraftField::Benefits),
            experience_level: get(DraftField::ExperienceLevel),
            salary_min: get(DraftField::SalaryMin),
            salary_max: get(DraftField::SalaryMax),
            location: get(DraftField::Location),
            contract_type: get(DraftField::ContractType),
            deadline: get(DraftField::Deadline),
        }
    }
}

#[derive(Template)]
#[template(path = "job_form.html")]
struct JobFormTemplate {
    heading: String,
    action: String,
    cancel_href: String,
    draft: JobDraft,
    requirements_text: String,
    benefits_text: String,
    experience_options: Vec<SelectOption>,
    errors: FormErrors,
    banner: String,
    can_publish: bool,
    dirty: bool,
}

impl JobFormTemplate {
    fn new(controller: &JobFormController, notes: &NotificationLog) -> Self {
        let (heading, action, cancel_href) = match controller.job_id() {
            Some(id) => ("Edit job".to_string(), job_edit_path(id), job_detail_path(id)),
            None => ("New job".to_string(), NEW_JOB_PATH.to_string(), JOBS_LIST_PATH.to_string()),
        };
        let draft = controller.draft().clone();
        let experience_options = ExperienceLevel::ALL
            .into_iter()
            .map(|level| SelectOption {
                value: level.as_str().to_string(),
                label: level.to_string(),
                selected: level == draft.experience_level,
            })
            .collect();
        let banner = notes
            .last()
            .filter(|note| note.kind == NotificationKind::Error)
            .map(|note| note.message)
            .unwrap_or_default();
        Self {
            heading,
            action,
            cancel_href,
            requirements_text: join_list_field(&draft.requirements),
            benefits_text: join_list_field(&draft.benefits),
            experience_options,
            errors: FormErrors::from(controller.errors()),
            banner,
            can_publish: controller.can_submit_active(),
            dirty: controller.is_dirty(),
            draft,
        }
    }
}

#[derive(Template)]
#[template(path = "session_expired.html")]
struct SessionExpiredTemplate {
    authenticated: bool,
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    heading: String,
    message: String,
}

#[derive(Debug, Deserialize, Default)]
struct JobsQuery {
    page: Option<usize>,
    status: Option<String>,
    search: Option<String>,
    notice: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct NoticeQuery {
    notice: Option<String>,
}

/// Fields posted by the job form; list textareas carry one item per line.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct JobForm {
    title: String,
    description: String,
    requirements: String,
    benefits: String,
    experience_level: String,
    salary_min: String,
    salary_max: String,
    location: String,
    remote_allowed: Option<String>,
    contract_type: String,
    deadline: String,
    intent: String,
}

impl JobForm {
    fn target(&self) -> SubmitTarget {
        if self.intent == "publish" {
            SubmitTarget::Active
        } else {
            SubmitTarget::Draft
        }
    }

    fn apply(&self, controller: &mut JobFormController) {
        controller.update(DraftPatch {
            title: Some(self.title.clone()),
            description: Some(self.description.clone()),
            requirements: Some(Vec::new()),
            benefits: Some(Vec::new()),
            experience_level: self.experience_level.parse().ok(),
            salary_min: Some(self.salary_min.clone()),
            salary_max: Some(self.salary_max.clone()),
            location: Some(self.location.clone()),
            remote_allowed: Some(self.remote_allowed.is_some()),
            contract_type: Some(self.contract_type.clone()),
            deadline: Some(self.deadline.clone()),
            ..DraftPatch::default()
        });
        for line in self.requirements.lines() {
            controller.add_list_item(ListField::Requirements, line);
        }
        for line in self.benefits.lines() {
            controller.add_list_item(ListField::Benefits, line);
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to(JOBS_LIST_PATH) }))
        .route("/healthz", get(healthz_handler))
        .route(JOBS_LIST_PATH, get(jobs_handler))
        .route(NEW_JOB_PATH, get(new_job_handler).post(create_job_handler))
        .route("/dashboard/jobs/{id}", get(job_detail_handler))
        .route("/dashboard/jobs/{id}/edit", get(edit_job_handler).post(update_job_handler))
        .route(SESSION_EXPIRED_PATH, get(session_expired_handler))
        .with_state(Arc::new(state))
}

pub async fn serve(config: &ClientConfig) -> anyhow::Result<()> {
    let port: u16 = std::env::var("ATS_WEB_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080);
    let state = AppState::from_config(config)?;
    watch_session(&state.session);
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind dashboard port {port}"))?;
    info!(port, api = %config.base_url, "dashboard listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}

fn watch_session(session: &SessionService) {
    let mut events = session.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SessionEvent::Invalidated) => {
                    warn!("backend rejected the API token; screens redirect to {SESSION_EXPIRED_PATH}")
                }
                Ok(event) => debug!(?event, "session event"),
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "session watcher lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });
}

async fn healthz_handler(State(state): State<Arc<AppState>>) -> Response {
    Json(serde_json::json!({
        "status": "ok",
        "service": CRATE_NAME,
        "authenticated": state.session.is_authenticated(),
    }))
    .into_response()
}

async fn jobs_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<JobsQuery>,
) -> Response {
    let status: Option<JobStatus> = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok());
    let search = query.search.clone().unwrap_or_default().trim().to_string();
    let filters = JobListQuery {
        status,
        search: Some(search.clone()).filter(|s| !s.is_empty()),
        ..JobListQuery::default()
    };
    let source: Arc<dyn PageSource<JobRecord>> =
        Arc::new(JobListSource::new(state.gateway.clone(), filters));
    let mut list = PagedList::new(source, state.page_size);
    list.go_to_page(query.page.unwrap_or(1).max(1)).await;

    if matches!(list.failure(), Some(err) if err.kind() == ApiErrorKind::Unauthorized) {
        return Redirect::to(SESSION_EXPIRED_PATH).into_response();
    }

    let statuses = JobStatus::ALL
        .into_iter()
        .map(|s| SelectOption {
            value: s.as_str().to_string(),
            label: s.to_string(),
            selected: Some(s) == status,
        })
        .collect();
    render_html(JobsTemplate {
        jobs: list.items().iter().map(JobRow::from).collect(),
        statuses,
        status_filter: status.map(|s| s.as_str().to_string()).unwrap_or_default(),
        search,
        page: list.page(),
        total_pages: list.total_pages(),
        total_count: list.total_count(),
        has_previous: list.has_previous(),
        has_next: list.has_next(),
        error: list.error().unwrap_or_default().to_string(),
        notice: notice_text(query.notice.as_deref()),
    })
}

async fn job_detail_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<NoticeQuery>,
) -> Response {
    match state.gateway.get_job(id).await {
        Ok(job) => render_html(JobDetailTemplate {
            job: JobRow::from(&job),
            description: job.description.clone(),
            requirements: job.requirement_items(),
            benefits: job.benefit_items(),
            contract_type: job.contract_type.clone(),
            remote_allowed: job.remote_allowed,
            ai_generated: job.ai_generated,
            edit_href: job_edit_path(job.id),
            notice: notice_text(query.notice.as_deref()),
        }),
        Err(err) => api_failure(err),
    }
}

async fn new_job_handler(State(state): State<Arc<AppState>>) -> Response {
    let (controller, notes, _nav) = state.editor();
    render_html(JobFormTemplate::new(&controller, &notes))
}

async fn create_job_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<JobForm>,
) -> Response {
    let (mut controller, notes, nav) = state.editor();
    form.apply(&mut controller);
    submit_form(&mut controller, form.target(), &notes, &nav).await
}

async fn edit_job_handler(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Response {
    let (mut controller, notes, nav) = state.editor();
    if let Some(resp) = load_for_edit(&mut controller, id, &notes, &nav).await {
        return resp;
    }
    render_html(JobFormTemplate::new(&controller, &notes))
}

async fn update_job_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Form(form): Form<JobForm>,
) -> Response {
    let (mut controller, notes, nav) = state.editor();
    if let Some(resp) = load_for_edit(&mut controller, id, &notes, &nav).await {
        return resp;
    }
    form.apply(&mut controller);
    submit_form(&mut controller, form.target(), &notes, &nav).await
}

async fn session_expired_handler(State(state): State<Arc<AppState>>) -> Response {
    render_html(SessionExpiredTemplate {
        authenticated: state.session.is_authenticated(),
    })
}

async fn load_for_edit(
    controller: &mut JobFormController,
    id: i64,
    notes: &NotificationLog,
    nav: &NavigationLog,
) -> Option<Response> {
    match controller.load(id).await {
        LoadOutcome::Loaded => None,
        LoadOutcome::Failed { error, .. } if error.kind() == ApiErrorKind::Unauthorized => {
            Some(Redirect::to(SESSION_EXPIRED_PATH).into_response())
        }
        LoadOutcome::Failed { error, redirected: true } => {
            let notice = if error.kind() == ApiErrorKind::NotFound {
                "missing"
            } else {
                "unavailable"
            };
            Some(follow_navigation(nav, notice))
        }
        LoadOutcome::Failed { error, redirected: false } => {
            let message = notes
                .last()
                .map(|note| note.message)
                .unwrap_or_else(|| error.message().to_string());
            Some(render_with_status(
                StatusCode::BAD_GATEWAY,
                ErrorTemplate {
                    heading: "Could not load the job".into(),
                    message,
                },
            ))
        }
    }
}

async fn submit_form(
    controller: &mut JobFormController,
    target: SubmitTarget,
    notes: &NotificationLog,
    nav: &NavigationLog,
) -> Response {
    let editing = controller.is_edit_mode();
    match controller.submit(target).await {
        SubmitOutcome::Saved(job) => {
            debug!(job_id = job.id, editing, "job form submitted");
            let notice = match (editing, target) {
                (true, _) => "updated",
                (false, SubmitTarget::Draft) => "draft",
                (false, SubmitTarget::Active) => "published",
            };
            follow_navigation(nav, notice)
        }
        SubmitOutcome::Failed(err) if err.kind() == ApiErrorKind::Unauthorized => {
            Redirect::to(SESSION_EXPIRED_PATH).into_response()
        }
        SubmitOutcome::Failed(err) => {
            let status = match err.kind() {
                ApiErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
                ApiErrorKind::NotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_GATEWAY,
            };
            render_with_status(status, JobFormTemplate::new(controller, notes))
        }
        SubmitOutcome::Invalid => render_with_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            JobFormTemplate::new(controller, notes),
        ),
    }
}

fn follow_navigation(nav: &NavigationLog, notice: &str) -> Response {
    let path = nav
        .last()
        .map(|n| n.path)
        .unwrap_or_else(|| JOBS_LIST_PATH.to_string());
    Redirect::to(&format!("{path}?notice={notice}")).into_response()
}

fn notice_text(code: Option<&str>) -> String {
    match code.unwrap_or_default() {
        "draft" => "Job saved as draft",
        "published" => "Job published successfully",
        "updated" => "Job updated successfully",
        "missing" => "That job could not be found.",
        "unavailable" => "The job could not be loaded right now.",
        _ => "",
    }
    .to_string()
}

fn api_failure(err: ApiError) -> Response {
    let status = match err.kind() {
        ApiErrorKind::Unauthorized => return Redirect::to(SESSION_EXPIRED_PATH).into_response(),
        ApiErrorKind::NotFound => StatusCode::NOT_FOUND,
        ApiErrorKind::Validation => StatusCode::BAD_REQUEST,
        ApiErrorKind::Network | ApiErrorKind::Unknown => StatusCode::BAD_GATEWAY,
    };
    warn!(kind = ?err.kind(), error = %err, "backend request failed");
    render_with_status(
        status,
        ErrorTemplate {
            heading: "Something went wrong".into(),
            message: err.message().to_string(),
        },
    )
}

fn render_html<T: Template>(tpl: T) -> Response {
    match tpl.render() {
        Ok(html) => Html(html).into_response(),
        Err(err) => server_error(anyhow::anyhow!(err.to_string())),
    }
}

fn render_with_status<T: Template>(status: StatusCode, tpl: T) -> Response {
    let mut resp = render_html(tpl);
    if resp.status() == StatusCode::OK {
        *resp.status_mut() = status;
    }
    resp
}

fn server_error(err: anyhow::Error) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(format!("Server error: {}", err)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ats_client::{GatewayCall, MemoryJobGateway};
    use ats_editor::FixedClock;
    use axum::body::Body;
    use axum::http::{header, Request};
    use chrono::NaiveDate;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn job(id: i64, title: &str, location: &str, status: JobStatus) -> JobRecord {
        JobRecord {
            id,
            title: title.into(),
            description: "Day to day work".into(),
            requirements: "Rust\nSQL".into(),
            benefits: "Transport".into(),
            status,
            experience_level: ExperienceLevel::Senior,
            salary_min: Some(15000.0),
            salary_max: Some(22000.0),
            location: location.into(),
            remote_allowed: false,
            contract_type: "CDI".into(),
            deadline: Some("2026-12-31T23:59:59Z".into()),
            company: None,
            created_at: None,
            updated_at: None,
            applications_count: 2,
            ai_generated: false,
        }
    }

    fn fixture() -> (AppState, Arc<MemoryJobGateway>) {
        let gateway = Arc::new(MemoryJobGateway::with_jobs([
            job(1, "Backend Engineer", "Casablanca", JobStatus::Active),
            job(2, "Accountant", "Rabat", JobStatus::Draft),
        ]));
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let state = AppState::new(gateway.clone(), Arc::new(SessionService::new()))
            .with_clock(Arc::new(FixedClock(today)));
        (state, gateway)
    }

    async fn get(state: &AppState, uri: &str) -> Response {
        app(state.clone())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn post_form(state: &AppState, uri: &str, body: &str) -> Response {
        app(state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_text(resp: Response) -> String {
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(body.to_vec()).unwrap()
    }

    fn location(resp: &Response) -> &str {
        resp.headers()[header::LOCATION].to_str().unwrap()
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        let (state, _) = fixture();
        let resp = get(&state, "/healthz").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("\"status\":\"ok\""));
    }

    #[tokio::test]
    async fn job_list_applies_status_filter() {
        let (state, gateway) = fixture();
        let resp = get(&state, "/dashboard/jobs?status=active").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let text = body_text(resp).await;
        assert!(text.contains("Backend Engineer"));
        assert!(!text.contains("Accountant"));
        assert!(matches!(
            gateway.calls().as_slice(),
            [GatewayCall::List(query)] if query.status == Some(JobStatus::Active) && query.page == 1
        ));
    }

    #[tokio::test]
    async fn detail_shows_requirements_and_notice() {
        let (state, _) = fixture();
        let resp = get(&state, "/dashboard/jobs/1?notice=published").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let text = body_text(resp).await;
        assert!(text.contains("Job published successfully"));
        assert!(text.contains("<li>SQL</li>"));
        assert!(text.contains("15000 - 22000 MAD"));

        let missing = get(&state, "/dashboard/jobs/99").await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn creating_a_draft_redirects_to_its_detail_page() {
        let (state, gateway) = fixture();
        let resp = post_form(
            &state,
            "/dashboard/jobs/new",
            "title=Data+Analyst&description=Dashboards&location=Rabat\
             &requirements=SQL%0D%0A%0D%0APython%0D%0ASQL&experience_level=junior&intent=draft",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/dashboard/jobs/3?notice=draft");

        let saved = gateway.job(3).unwrap();
        assert_eq!(saved.status, JobStatus::Draft);
        assert_eq!(saved.requirements, "SQL\nPython");
        assert_eq!(saved.experience_level, ExperienceLevel::Junior);
        assert!(!saved.remote_allowed);
    }

    #[tokio::test]
    async fn failed_save_rerenders_the_form_with_the_backend_message() {
        let (state, gateway) = fixture();
        let form = "title=Data+Analyst&description=Dashboards&location=Rabat&intent=draft";

        let mut fields = std::collections::BTreeMap::new();
        fields.insert("title".to_string(), vec!["A job with this title exists.".to_string()]);
        gateway.fail_next(ApiError::Validation {
            message: "Job limit reached for this plan.".into(),
            fields,
        });
        let resp = post_form(&state, "/dashboard/jobs/new", form).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let text = body_text(resp).await;
        assert!(text.contains("Job limit reached for this plan."));
        assert!(text.contains("A job with this title exists."));
        assert!(text.contains("value=\"Data Analyst\""));

        gateway.fail_next(ApiError::Unknown {
            status: Some(500),
            message: "boom".into(),
        });
        let resp = post_form(&state, "/dashboard/jobs/new", form).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert!(body_text(resp).await.contains("Saving the job failed: boom"));

        gateway.fail_next(ApiError::Unauthorized {
            message: "Token expired.".into(),
        });
        let resp = post_form(&state, "/dashboard/jobs/new", form).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), SESSION_EXPIRED_PATH);
        assert!(gateway.job(3).is_none());
    }

    #[tokio::test]
    async fn invalid_publish_rerenders_with_inline_errors() {
        let (state, gateway) = fixture();
        let resp = post_form(
            &state,
            "/dashboard/jobs/2/edit",
            "title=Accountant&description=Books&location=Rabat&salary_min=9000&deadline=2026-11-30&intent=publish",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let text = body_text(resp).await;
        assert!(text.contains("Maximum salary is required"));
        assert!(text.contains("Please correct the highlighted fields"));
        assert_eq!(gateway.calls(), vec![GatewayCall::Get(2)]);
        assert_eq!(gateway.job(2).unwrap().status, JobStatus::Draft);
    }

    #[tokio::test]
    async fn publishing_an_edit_redirects_with_notice() {
        let (state, gateway) = fixture();
        let resp = post_form(
            &state,
            "/dashboard/jobs/2/edit",
            "title=Senior+Accountant&description=Books&location=Rabat&salary_min=9000\
             &salary_max=12000&deadline=2026-11-30&remote_allowed=on&intent=publish",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/dashboard/jobs/2?notice=updated");
        let saved = gateway.job(2).unwrap();
        assert_eq!(saved.status, JobStatus::Active);
        assert_eq!(saved.deadline.as_deref(), Some("2026-11-30T23:59:59Z"));
        assert!(saved.remote_allowed);
    }

    #[tokio::test]
    async fn missing_job_edit_redirects_to_list() {
        let (state, _) = fixture();
        let resp = get(&state, "/dashboard/jobs/99/edit").await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/dashboard/jobs?notice=missing");

        let list = get(&state, "/dashboard/jobs?notice=missing").await;
        assert!(body_text(list).await.contains("That job could not be found."));
    }

    #[tokio::test]
    async fn rejected_session_redirects_to_session_expired() {
        let (state, gateway) = fixture();
        gateway.fail_next(ApiError::Unauthorized {
            message: "Token expired.".into(),
        });
        let resp = get(&state, "/dashboard/jobs/1/edit").await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), SESSION_EXPIRED_PATH);

        let page = get(&state, SESSION_EXPIRED_PATH).await;
        assert_eq!(page.status(), StatusCode::OK);
        assert!(body_text(page).await.contains("session has expired"));
    }

    #[tokio::test]
    async fn edit_form_is_prefilled() {
        let (state, _) = fixture();
        let resp = get(&state, "/dashboard/jobs/1/edit").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let text = body_text(resp).await;
        assert!(text.contains("value=\"Backend Engineer\""));
        assert!(text.contains("value=\"2026-12-31\""));
        assert!(text.contains("action=\"/dashboard/jobs/1/edit\""));
    }
}

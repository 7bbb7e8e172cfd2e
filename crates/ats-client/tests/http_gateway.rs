use std::collections::HashMap;
use std::sync::Arc;

use ats_client::{
    ApiErrorKind, ClientConfig, HttpJobGateway, JobGateway, SessionEvent, SessionService,
};
use ats_core::{ExperienceLevel, JobListQuery, JobStatus, JobWritePayload};
use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

fn job_json(id: i64, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": "Own the hiring pipeline services",
        "requirements": "Rust\nPostgreSQL",
        "benefits": "Health insurance",
        "status": "active",
        "experience_level": "senior",
        "salary_min": 18000,
        "salary_max": 26000,
        "location": "Casablanca",
        "remote_allowed": true,
        "contract_type": "CDI",
        "deadline": "2026-12-31T23:59:59Z",
        "company": {"id": 1, "name": "Atlas Tech"},
        "applications_count": 4,
        "ai_generated": false
    })
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

async fn get_job(Path(id): Path<i64>, headers: HeaderMap) -> axum::response::Response {
    match bearer(&headers).as_deref() {
        Some("expired") => {
            return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Token expired."})))
                .into_response()
        }
        Some("valid") => {}
        _ => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"detail": "Authentication credentials were not provided."})),
            )
                .into_response()
        }
    }
    if id == 1 {
        Json(job_json(1, "Backend Engineer")).into_response()
    } else {
        (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response()
    }
}

async fn update_job(Path(id): Path<i64>, Json(body): Json<Value>) -> axum::response::Response {
    let mut job = job_json(id, body["title"].as_str().unwrap_or_default());
    job["status"] = body["status"].clone();
    Json(job).into_response()
}

async fn create_job(Json(body): Json<Value>) -> axum::response::Response {
    if body["title"].as_str().unwrap_or_default().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"title": ["This field may not be blank."]})),
        )
            .into_response();
    }
    let mut job = job_json(42, body["title"].as_str().unwrap_or_default());
    job["requirements"] = body["requirements"].clone();
    job["deadline"] = body["deadline"].clone();
    (StatusCode::CREATED, Json(job)).into_response()
}

async fn list_jobs(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    Json(json!({
        "count": 1,
        "next": null,
        "previous": null,
        "results": [job_json(1, &format!(
            "page={} size={} status={} search={}",
            params.get("page").cloned().unwrap_or_default(),
            params.get("page_size").cloned().unwrap_or_default(),
            params.get("status").cloned().unwrap_or_default(),
            params.get("search").cloned().unwrap_or_default(),
        ))]
    }))
}

async fn spawn_mock_api() -> String {
    let app = Router::new()
        .route("/api/jobs/", get(list_jobs).post(create_job))
        .route("/api/jobs/{id}/", get(get_job).patch(update_job));
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}/api/")
}

fn gateway(base_url: &str, token: Option<&str>) -> (HttpJobGateway, Arc<SessionService>) {
    let session = Arc::new(match token {
        Some(token) => SessionService::with_token(token),
        None => SessionService::new(),
    });
    let config = ClientConfig::default().with_base_url(base_url);
    let gateway = HttpJobGateway::new(&config, session.clone()).expect("gateway");
    (gateway, session)
}

fn payload(title: &str) -> JobWritePayload {
    JobWritePayload {
        title: title.to_string(),
        description: "Own the hiring pipeline services".into(),
        requirements: "Rust\nPostgreSQL".into(),
        benefits: String::new(),
        status: JobStatus::Draft,
        experience_level: ExperienceLevel::Senior,
        salary_min: Some(18000.0),
        salary_max: None,
        location: "Casablanca".into(),
        remote_allowed: true,
        contract_type: "CDI".into(),
        deadline: Some("2026-12-31T23:59:59Z".into()),
    }
}

#[tokio::test]
async fn get_job_sends_bearer_token_and_parses_record() {
    let base = spawn_mock_api().await;
    let (gateway, _session) = gateway(&base, Some("valid"));

    let job = gateway.get_job(1).await.expect("job");
    assert_eq!(job.title, "Backend Engineer");
    assert_eq!(job.requirement_items(), vec!["Rust", "PostgreSQL"]);
    assert_eq!(job.applications_count, 4);
}

#[tokio::test]
async fn missing_job_is_not_found_with_detail_message() {
    let base = spawn_mock_api().await;
    let (gateway, _session) = gateway(&base, Some("valid"));

    let err = gateway.get_job(9).await.unwrap_err();
    assert_eq!(err.kind(), ApiErrorKind::NotFound);
    assert_eq!(err.message(), "Not found.");
}

#[tokio::test]
async fn rejected_token_invalidates_session() {
    let base = spawn_mock_api().await;
    let (gateway, session) = gateway(&base, Some("expired"));
    let mut events = session.subscribe();

    let err = gateway.get_job(1).await.unwrap_err();
    assert_eq!(err.kind(), ApiErrorKind::Unauthorized);
    assert_eq!(err.message(), "Token expired.");
    assert!(!session.is_authenticated());
    assert_eq!(events.recv().await.expect("event"), SessionEvent::Invalidated);
}

#[tokio::test]
async fn create_and_update_round_trip_payloads() {
    let base = spawn_mock_api().await;
    let (gateway, _session) = gateway(&base, Some("valid"));

    let created = gateway.create_job(&payload("Data Engineer")).await.expect("create");
    assert_eq!(created.id, 42);
    assert_eq!(created.requirements, "Rust\nPostgreSQL");
    assert_eq!(created.deadline.as_deref(), Some("2026-12-31T23:59:59Z"));

    let mut edit = payload("Lead Data Engineer");
    edit.status = JobStatus::Paused;
    let updated = gateway.update_job(5, &edit).await.expect("update");
    assert_eq!(updated.id, 5);
    assert_eq!(updated.title, "Lead Data Engineer");
    assert_eq!(updated.status, JobStatus::Paused);
}

#[tokio::test]
async fn validation_failure_carries_field_messages() {
    let base = spawn_mock_api().await;
    let (gateway, _session) = gateway(&base, Some("valid"));

    let err = gateway.create_job(&payload("")).await.unwrap_err();
    assert_eq!(err.kind(), ApiErrorKind::Validation);
    assert_eq!(err.message(), "title: This field may not be blank.");
}

#[tokio::test]
async fn list_jobs_forwards_filters() {
    let base = spawn_mock_api().await;
    let (gateway, _session) = gateway(&base, None);

    let query = JobListQuery {
        page: 2,
        page_size: 25,
        status: Some(JobStatus::Active),
        search: Some("  rabat ".into()),
    };
    let page = gateway.list_jobs(&query).await.expect("list");
    assert_eq!(page.count, 1);
    assert_eq!(page.results[0].title, "page=2 size=25 status=active search=rabat");
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let (gateway, _session) = gateway(&format!("http://{addr}/api"), None);
    let err = gateway.get_job(1).await.unwrap_err();
    assert_eq!(err.kind(), ApiErrorKind::Network);
}

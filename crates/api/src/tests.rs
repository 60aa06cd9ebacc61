use std::sync::Arc;

use axum::body::Body;
use axum::body::to_bytes;
use axum::http::header::{CONTENT_TYPE, LOCATION};
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use arbor_domain::in_memory::InMemoryCategoryRepository;
use arbor_domain::ports::BoxFuture;
use arbor_domain::ports::graph::{GraphQuery, GraphStore, Row, StoreError};
use arbor_infra::config::AppConfig;
use arbor_infra::repositories::GraphCategoryRepository;

use crate::routes;
use crate::state::AppState;

fn test_config() -> AppConfig {
    AppConfig {
        app_env: "test".to_string(),
        port: 0,
        log_level: "info".to_string(),
        data_backend: "memory".to_string(),
        surreal_endpoint: "ws://127.0.0.1:8000".to_string(),
        surreal_ns: "arbor".to_string(),
        surreal_db: "categories".to_string(),
        surreal_user: "root".to_string(),
        surreal_pass: "root".to_string(),
        cors_allowed_origins: "*".to_string(),
        request_timeout_ms: 30_000,
        enforce_category_ownership: false,
    }
}

fn test_app() -> axum::Router {
    test_app_with_config(test_config())
}

fn test_app_with_config(config: AppConfig) -> axum::Router {
    let state = AppState::with_repository(config, Arc::new(InMemoryCategoryRepository::new()));
    routes::router(state)
}

struct UnreachableStore;

impl GraphStore for UnreachableStore {
    fn name(&self) -> &'static str {
        "unreachable"
    }

    fn health_check(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async { Err(StoreError::Unavailable("connection refused".to_string())) })
    }

    fn execute(&self, _query: GraphQuery) -> BoxFuture<'_, Result<Vec<Row>, StoreError>> {
        Box::pin(async { Err(StoreError::Unavailable("connection refused".to_string())) })
    }
}

fn unreachable_store_app() -> axum::Router {
    let store: Arc<dyn GraphStore> = Arc::new(UnreachableStore);
    let mut state = AppState::with_repository(
        test_config(),
        Arc::new(GraphCategoryRepository::new(store.clone())),
    );
    state.graph_store = Some(store);
    routes::router(state)
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&body).expect("json body")
}

async fn create(app: &axum::Router, name: &str, user: &str, parent: Option<&str>) -> String {
    let mut payload = json!({ "name": name, "user_uuid": user });
    if let Some(parent) = parent {
        payload["parent_uuid"] = json!(parent);
    }
    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/categories", payload))
        .await
        .expect("create response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .expect("location header")
        .to_string();
    location
        .strip_prefix("/api/categories/")
        .expect("location prefix")
        .to_string()
}

async fn list(app: &axum::Router, user: &str) -> axum::response::Response {
    app.clone()
        .oneshot(get_request(&format!("/api/categories?user_uuid={user}")))
        .await
        .expect("list response")
}

#[tokio::test]
async fn category_lifecycle_over_http() {
    let app = test_app();

    let work = create(&app, "Work", "u1", None).await;
    let urgent = create(&app, "Urgent", "u1", Some(&work)).await;

    let response = list(&app, "u1").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!([{
            "uuid": work,
            "name": "Work",
            "children": [{ "uuid": urgent, "name": "Urgent", "parent_uuid": work }]
        }])
    );

    let response = app
        .clone()
        .oneshot(json_request(
            Method::PATCH,
            &format!("/api/categories/{urgent}"),
            json!({ "name": "Important", "user_uuid": "u1" }),
        ))
        .await
        .expect("patch response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let forest = body_json(list(&app, "u1").await).await;
    assert_eq!(forest[0]["children"][0]["name"], "Important");
    assert_eq!(forest[0]["children"][0]["uuid"], urgent.as_str());

    let response = app
        .clone()
        .oneshot(json_request(
            Method::DELETE,
            &format!("/api/categories/{work}"),
            json!({ "user_uuid": "u1" }),
        ))
        .await
        .expect("delete response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // the user node stays but owns nothing, so the user is reported missing
    let response = list(&app, "u1").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "CS-00009");
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let response = list(&test_app(), "nobody").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "CS-00009");
    assert_eq!(body["error"]["message"], "user not found");
}

#[tokio::test]
async fn missing_user_query_is_validation_error() {
    let response = test_app()
        .oneshot(get_request("/api/categories"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "CS-00010");
    assert!(body["error"]["developer_message"].is_string());
}

#[tokio::test]
async fn unknown_parent_is_category_not_found() {
    let app = test_app();
    create(&app, "Work", "u1", None).await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/categories",
            json!({ "name": "Orphan", "user_uuid": "u1", "parent_uuid": "missing" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "CS-00008");

    let forest = body_json(list(&app, "u1").await).await;
    assert_eq!(forest.as_array().map(Vec::len), Some(1));
    assert!(forest[0].get("children").is_none());
}

#[tokio::test]
async fn empty_name_lists_the_offending_field() {
    let response = test_app()
        .oneshot(json_request(
            Method::POST,
            "/api/categories",
            json!({ "name": "", "user_uuid": "u1" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "CS-00010");
    assert_eq!(body["error"]["fields"][0]["field"], "name");
}

#[tokio::test]
async fn blank_name_is_rejected_by_the_service() {
    let response = test_app()
        .oneshot(json_request(
            Method::POST,
            "/api/categories",
            json!({ "name": "   ", "user_uuid": "u1" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["developer_message"], "name is required");
    assert_eq!(
        body["error"]["fields"],
        json!([{ "field": "name", "message": "name is required" }])
    );
}

#[tokio::test]
async fn blank_path_id_is_reported_against_its_field() {
    let response = test_app()
        .oneshot(json_request(
            Method::PATCH,
            "/api/categories/%20%20",
            json!({ "name": "Office", "user_uuid": "u1" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "CS-00010");
    assert_eq!(body["error"]["fields"][0]["field"], "uuid");
}

#[tokio::test]
async fn malformed_json_is_validation_error() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/categories")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .expect("request");
    let response = test_app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "CS-00010");
}

#[tokio::test]
async fn rename_and_delete_of_absent_category_are_not_found() {
    let app = test_app();
    let response = app
        .clone()
        .oneshot(json_request(
            Method::PATCH,
            "/api/categories/missing",
            json!({ "name": "Office", "user_uuid": "u1" }),
        ))
        .await
        .expect("patch response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "CS-00008");

    let response = app
        .oneshot(json_request(
            Method::DELETE,
            "/api/categories/missing",
            json!({ "user_uuid": "u1" }),
        ))
        .await
        .expect("delete response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "CS-00008");
}

#[tokio::test]
async fn enforced_ownership_hides_other_users_categories() {
    let mut config = test_config();
    config.enforce_category_ownership = true;
    let app = test_app_with_config(config);
    let work = create(&app, "Work", "u1", None).await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::DELETE,
            &format!("/api/categories/{work}"),
            json!({ "user_uuid": "u2" }),
        ))
        .await
        .expect("delete response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let forest = body_json(list(&app, "u1").await).await;
    assert_eq!(forest[0]["uuid"], work.as_str());
}

#[tokio::test]
async fn store_failure_is_opaque_system_error() {
    let response = list(&unreachable_store_app(), "u1").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "CS-00001");
    assert_eq!(body["error"]["message"], "system error");
    assert!(body["error"]["developer_message"].is_null());
}

#[tokio::test]
async fn health_reports_graph_store_state() {
    let response = test_app()
        .oneshot(get_request("/health"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["graph_store"]["backend"], "memory");

    let body = body_json(
        unreachable_store_app()
            .oneshot(get_request("/health"))
            .await
            .expect("response"),
    )
    .await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["graph_store"]["status"], "degraded");
    assert!(body["graph_store"].get("detail").is_none());
    assert!(!body.to_string().contains("connection refused"));
}

#[tokio::test]
async fn correlation_and_request_ids_are_echoed() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .header("x-correlation-id", "corr-123")
        .body(Body::empty())
        .expect("request");
    let response = test_app().oneshot(request).await.expect("response");
    assert_eq!(
        response
            .headers()
            .get("x-correlation-id")
            .and_then(|value| value.to_str().ok()),
        Some("corr-123")
    );
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn cors_exposes_location_header() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .header("origin", "http://localhost:3000")
        .body(Body::empty())
        .expect("request");
    let response = test_app().oneshot(request).await.expect("response");
    let exposed = response
        .headers()
        .get("access-control-expose-headers")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();
    assert!(exposed.contains("location"));
}

use std::{sync::Arc, time::Duration};

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use employee_server::{app, config::Config, state::AppState};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

struct TestServer {
    _dir: TempDir,
    state: Arc<AppState>,
    router: Router,
}

impl TestServer {
    fn new() -> Self {
        Self::with_config(|_| {})
    }

    fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config {
            db_path: dir.path().join("employees.db"),
            static_dir: dir.path().join("dist"),
            ..Config::default()
        };
        adjust(&mut config);
        let state = AppState::new(config).unwrap();
        let router = app(Arc::clone(&state));
        Self {
            _dir: dir,
            state,
            router,
        }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(text) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(text.to_owned())
            }
            None => Body::empty(),
        };
        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, value)
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

#[tokio::test]
async fn create_without_id_then_last_id_returns_assigned_id() {
    let server = TestServer::new();

    let (status, headers, body) = server
        .send(
            Method::POST,
            "/api/employees",
            Some(r#"{"emp_name":"Bob","department":"QA","language":"Python"}"#),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(is_json(&headers));
    assert_eq!(body["message"], "Employee created successfully");
    let emp_id = body["emp_id"].as_i64().unwrap();
    assert!(emp_id >= 1);

    let (status, _, body) = server.send(Method::GET, "/api/employees/last-id", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "last_emp_id": emp_id }));
}

#[tokio::test]
async fn last_id_is_zero_on_empty_store_and_list_is_empty_array() {
    let server = TestServer::new();

    let (status, _, body) = server.send(Method::GET, "/api/employees/last-id", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "last_emp_id": 0 }));

    let (status, headers, body) = server.send(Method::GET, "/api/employees", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(is_json(&headers));
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn create_alias_and_listing_flatten_all_collections() {
    let server = TestServer::new();

    let (status, _, body) = server
        .send(
            Method::POST,
            "/api/employees/create",
            Some(r#"{"emp_id":5,"emp_name":"A","department":"Eng","language":"Go"}"#),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["emp_id"], 5);

    let (_, _, body) = server.send(Method::GET, "/api/employees", None).await;
    assert_eq!(
        body,
        json!([{ "emp_id": 5, "emp_name": "A", "department": "Eng", "language": "Go" }])
    );
}

#[tokio::test]
async fn update_upserts_department_and_tolerates_missing_employee() {
    let server = TestServer::new();
    server
        .send(
            Method::POST,
            "/api/employees",
            Some(r#"{"emp_id":5,"emp_name":"A","department":"Eng","language":"Go"}"#),
        )
        .await;

    let (status, headers, body) = server
        .send(Method::PUT, "/api/employees/5", Some(r#"{"department":"Sales"}"#))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(is_json(&headers));
    assert_eq!(body, json!({ "message": "Employee updated successfully" }));

    let (status, _, _) = server
        .send(Method::PUT, "/api/employees/999", Some(r#"{"emp_name":"Ghost"}"#))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, _, body) = server.send(Method::GET, "/api/employees", None).await;
    assert_eq!(
        body,
        json!([{ "emp_id": 5, "emp_name": "A", "department": "Sales", "language": "Go" }])
    );
}

#[tokio::test]
async fn delete_twice_reports_one_then_zero() {
    let server = TestServer::new();
    server
        .send(
            Method::POST,
            "/api/employees",
            Some(r#"{"emp_id":5,"emp_name":"A","department":"Eng","language":"Go"}"#),
        )
        .await;

    let (status, _, body) = server.send(Method::DELETE, "/api/employees/5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "message": "Employee deleted successfully", "deleted_count": 1 })
    );

    let (status, _, body) = server.send(Method::DELETE, "/api/employees/5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted_count"], 0);
}

#[tokio::test]
async fn non_integer_id_is_rejected_before_the_store() {
    let server = TestServer::new();

    let (status, headers, body) = server
        .send(Method::PUT, "/api/employees/abc", Some(r#"{"emp_name":"X"}"#))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(is_json(&headers));
    assert!(body["error"].as_str().unwrap().starts_with("invalid id"));

    let (status, _, _) = server.send(Method::DELETE, "/api/employees/1.5", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_is_rejected_and_nothing_is_written() {
    let server = TestServer::new();

    let (status, _, body) = server
        .send(Method::POST, "/api/employees", Some("{not json"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("invalid input"));

    let (status, _, _) = server
        .send(Method::POST, "/api/employees", Some(r#"{"emp_id":"seven"}"#))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = server.send(Method::PUT, "/api/employees/1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, _, body) = server.send(Method::GET, "/api/employees", None).await;
    assert_eq!(body, json!([]));
    assert_eq!(server.state.ids.peek(), 1);
}

#[tokio::test]
async fn allocator_is_seeded_from_existing_store() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("employees.db");
    {
        let conn = employee_core::db::open_db(&db_path).unwrap();
        conn.execute(
            "INSERT INTO Employee (emp_id, emp_name) VALUES (41, 'existing');",
            [],
        )
        .unwrap();
    }

    let server = TestServer::with_config(|config| config.db_path = db_path.clone());
    let (status, _, body) = server
        .send(
            Method::POST,
            "/api/employees",
            Some(r#"{"emp_name":"next","department":"d","language":"l"}"#),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["emp_id"], 42);
}

#[tokio::test]
async fn cors_headers_are_present_and_preflight_is_answered() {
    let server = TestServer::new();

    let response = server
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/api/employees")
                .header(header::ORIGIN, "http://localhost:5173")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );

    let preflight = server
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/employees/3")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(preflight.status(), StatusCode::OK);
    let allowed = preflight.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
        .to_str()
        .unwrap()
        .to_string();
    assert!(allowed.contains("DELETE"));
}

#[tokio::test]
async fn unsupported_method_on_api_route_is_json_405() {
    let server = TestServer::new();

    for (method, uri) in [
        (Method::PATCH, "/api/employees"),
        (Method::POST, "/api/employees/last-id"),
        (Method::GET, "/api/employees/5"),
    ] {
        let (status, headers, body) = server.send(method, uri, None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{uri}");
        assert!(is_json(&headers), "{uri}");
        assert_eq!(body["error"], "method not allowed");
    }
}

#[tokio::test]
async fn writes_against_last_id_segment_are_invalid_ids() {
    let server = TestServer::new();

    let (status, headers, body) = server
        .send(
            Method::PUT,
            "/api/employees/last-id",
            Some(r#"{"emp_name":"X"}"#),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(is_json(&headers));
    assert!(body["error"].as_str().unwrap().starts_with("invalid id"));

    let (status, headers, body) = server
        .send(Method::DELETE, "/api/employees/last-id", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(is_json(&headers));
    assert!(body["error"].as_str().unwrap().starts_with("invalid id"));
}

#[tokio::test]
async fn oversized_body_is_json_413_and_nothing_is_written() {
    let server = TestServer::new();
    let padding = "a".repeat(3 * 1024 * 1024);
    let payload = format!(r#"{{"emp_name":"{padding}","department":"QA","language":"Go"}}"#);

    let (status, headers, body) = server
        .send(Method::POST, "/api/employees", Some(&payload))
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(is_json(&headers));
    assert!(body["error"].as_str().unwrap().starts_with("invalid input"));

    let (status, headers, body) = server
        .send(Method::PUT, "/api/employees/1", Some(&payload))
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(is_json(&headers));
    assert!(body["error"].is_string());

    let (_, _, listed) = server.send(Method::GET, "/api/employees", None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn unknown_paths_fall_back_to_spa_index() {
    let server = TestServer::new();
    let dist = server.state.config.static_dir.clone();
    std::fs::create_dir_all(dist.join("assets")).unwrap();
    std::fs::write(dist.join("index.html"), "<html>employees</html>").unwrap();
    std::fs::write(dist.join("assets/app.js"), "console.log(1);").unwrap();

    for uri in ["/", "/employees/7/edit"] {
        let response = server
            .router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<html>employees</html>");
    }

    let response = server
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/assets/app.js")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"console.log(1);");
}

#[tokio::test]
async fn locked_store_surfaces_as_server_error() {
    let server = TestServer::with_config(|config| config.store_timeout = Duration::from_secs(1));

    let blocker = lock_store(&server.state.config.db_path);
    let (status, headers, body) = server.send(Method::GET, "/api/employees", None).await;
    drop(blocker);

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(is_json(&headers));
    assert!(!body["error"].as_str().unwrap().is_empty());
}

fn lock_store(path: &std::path::Path) -> rusqlite::Connection {
    let conn = employee_core::db::open_db(path).unwrap();
    conn.execute_batch("BEGIN EXCLUSIVE;").unwrap();
    conn
}

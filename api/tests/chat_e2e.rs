use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use api::{AppState, ServerConfig, build_app};
use axum::{
    Json, Router,
    body::Body,
    extract::DefaultBodyLimit,
    http::{HeaderMap, Method, Request, StatusCode, header},
    routing::post,
};
use http_body_util::BodyExt;
use llm_service::{
    ChatCompletionService, LlmModelConfig,
    config::default_config::{SYSTEM_PROMPT, default_chat_config},
};
use serde_json::{Value, json};
use tower::ServiceExt;

const UPSTREAM_PATH: &str = "/v1/chat/completions";

/// What the mock upstream saw.
#[derive(Clone, Default)]
struct Seen {
    calls: Arc<AtomicUsize>,
    payload: Arc<Mutex<Option<Value>>>,
    authorization: Arc<Mutex<Option<String>>>,
}

impl Seen {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

async fn spawn_mock_upstream(status: StatusCode, body: &'static str) -> (String, Seen) {
    let seen = Seen::default();
    let recorder = seen.clone();

    let handler = move |headers: HeaderMap, Json(payload): Json<Value>| {
        let recorder = recorder.clone();
        async move {
            recorder.calls.fetch_add(1, Ordering::SeqCst);
            *recorder.payload.lock().unwrap() = Some(payload);
            *recorder.authorization.lock().unwrap() = headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            (status, [(header::CONTENT_TYPE, "application/json")], body)
        }
    };

    let app = Router::new()
        .route(UPSTREAM_PATH, post(handler))
        .layer(DefaultBodyLimit::disable());
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}{UPSTREAM_PATH}"), seen)
}

/// A URL nobody listens on: bind an ephemeral port, then release it.
async fn closed_upstream_url() -> String {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}{UPSTREAM_PATH}")
}

fn relay_config(endpoint: &str) -> LlmModelConfig {
    LlmModelConfig {
        endpoint: endpoint.to_string(),
        api_key: Some("nvapi-test".to_string()),
        timeout_secs: Some(5),
        ..default_chat_config()
    }
}

fn build_test_app(endpoint: &str) -> Router {
    let relay = ChatCompletionService::new(relay_config(endpoint)).unwrap();
    let server = ServerConfig::from_vars(|_| None).unwrap();
    build_app(Arc::new(AppState::new(relay)), &server)
}

fn chat_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/chat/")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

const OK_BODY: &str = r#"{"id":"cmpl-1","object":"chat.completion","choices":[{"index":0,"message":{"role":"assistant","content":"42"},"finish_reason":"stop"}]}"#;

#[tokio::test]
async fn answer_is_relayed_from_first_choice() {
    let (url, seen) = spawn_mock_upstream(StatusCode::OK, OK_BODY).await;
    let app = build_test_app(&url);

    let (status, body) = send(app, chat_request(r#"{"question":"What is 6 * 7?"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "answer": "42" }));
    assert_eq!(seen.calls(), 1);
}

#[tokio::test]
async fn upstream_receives_fixed_conversation_and_credential() {
    let (url, seen) = spawn_mock_upstream(StatusCode::OK, OK_BODY).await;
    let app = build_test_app(&url);
    let question = "  Why does the borrow checker complain?\n";

    let (status, _) = send(app, chat_request(json!({ "question": question }).to_string())).await;
    assert_eq!(status, StatusCode::OK);

    let payload = seen.payload.lock().unwrap().clone().unwrap();
    assert_eq!(payload["model"], "meta/llama3-70b-instruct");
    assert_eq!(payload["temperature"], 0.5);
    assert_eq!(payload["top_p"], 1.0);
    assert_eq!(payload["max_tokens"], 1024);
    assert_eq!(
        payload["messages"],
        json!([
            { "role": "system", "content": SYSTEM_PROMPT },
            { "role": "user", "content": question },
        ])
    );
    assert_eq!(
        seen.authorization.lock().unwrap().as_deref(),
        Some("Bearer nvapi-test")
    );
}

#[tokio::test]
async fn route_without_trailing_slash_is_served() {
    let (url, seen) = spawn_mock_upstream(StatusCode::OK, OK_BODY).await;
    let app = build_test_app(&url);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/chat")
        .body(Body::from(r#"{"question":"hi"}"#))
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "42");
    assert_eq!(seen.calls(), 1);
}

#[tokio::test]
async fn empty_question_is_rejected_without_upstream_call() {
    let (url, seen) = spawn_mock_upstream(StatusCode::OK, OK_BODY).await;
    let app = build_test_app(&url);

    let (status, body) = send(app, chat_request(r#"{"question":""}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "error": "Invalid question format or empty question" })
    );
    assert_eq!(seen.calls(), 0);
}

#[tokio::test]
async fn unusable_questions_never_reach_upstream() {
    let (url, seen) = spawn_mock_upstream(StatusCode::OK, OK_BODY).await;

    for raw in [r#"{}"#, r#"{"question":"   "}"#, r#"{"question":7}"#, r#"{"question":null}"#] {
        let (status, body) = send(build_test_app(&url), chat_request(raw)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {raw}");
        assert_eq!(body["error"], "Invalid question format or empty question");
        assert!(body.get("answer").is_none());
    }
    assert_eq!(seen.calls(), 0);
}

#[tokio::test]
async fn malformed_body_is_rejected_without_upstream_call() {
    let (url, seen) = spawn_mock_upstream(StatusCode::OK, OK_BODY).await;

    for raw in ["not json", r#"["question"]"#, r#"{"question":"#] {
        let (status, body) = send(build_test_app(&url), chat_request(raw)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {raw}");
        assert_eq!(body, json!({ "error": "Invalid request body" }));
    }
    assert_eq!(seen.calls(), 0);
}

#[tokio::test]
async fn upstream_status_is_passed_through_without_retry() {
    let upstream_body = r#"{"status":401,"title":"Unauthorized"}"#;
    let (url, seen) = spawn_mock_upstream(StatusCode::UNAUTHORIZED, upstream_body).await;
    let app = build_test_app(&url);

    let (status, body) = send(app, chat_request(r#"{"question":"hi"}"#)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({
            "error": format!("API returned non-200 status: 401 Unauthorized\nBody: {upstream_body}")
        })
    );
    assert_eq!(seen.calls(), 1);
}

#[tokio::test]
async fn upstream_server_error_is_not_retried() {
    let (url, seen) = spawn_mock_upstream(StatusCode::SERVICE_UNAVAILABLE, "overloaded").await;
    let app = build_test_app(&url);

    let (status, body) = send(app, chat_request(r#"{"question":"hi"}"#)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("503 Service Unavailable"));
    assert_eq!(seen.calls(), 1);
}

#[tokio::test]
async fn unexpected_shapes_are_server_errors() {
    for upstream_body in [
        r#"{"choices":[]}"#,
        r#"{"object":"chat.completion"}"#,
        r#"{"choices":[{"message":{"content":null}}]}"#,
        r#"{"choices":[{"text":"42"}]}"#,
    ] {
        let (url, seen) = spawn_mock_upstream(StatusCode::OK, upstream_body).await;
        let (status, body) = send(build_test_app(&url), chat_request(r#"{"question":"hi"}"#)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "upstream {upstream_body}");
        assert_eq!(body, json!({ "error": "Unexpected response structure from API" }));
        assert_eq!(seen.calls(), 1);
    }
}

#[tokio::test]
async fn non_json_upstream_body_is_server_error() {
    let (url, _) = spawn_mock_upstream(StatusCode::OK, "<html>proxy error</html>").await;
    let app = build_test_app(&url);

    let (status, body) = send(app, chat_request(r#"{"question":"hi"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("Error parsing JSON response: ")
    );
}

#[tokio::test]
async fn unreachable_upstream_is_server_error() {
    let url = closed_upstream_url().await;
    let app = build_test_app(&url);

    let (status, body) = send(app, chat_request(r#"{"question":"hi"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("Error sending request: ")
    );
    assert!(body.get("answer").is_none());
}

#[tokio::test]
async fn identical_questions_are_not_cached() {
    let (url, seen) = spawn_mock_upstream(StatusCode::OK, OK_BODY).await;
    let app = build_test_app(&url);

    for _ in 0..2 {
        let (status, body) = send(app.clone(), chat_request(r#"{"question":"same"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "42");
    }
    assert_eq!(seen.calls(), 2);
}

#[tokio::test]
async fn unknown_route_returns_json_404() {
    let (url, _) = spawn_mock_upstream(StatusCode::OK, OK_BODY).await;
    let app = build_test_app(&url);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not found" }));
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() {
    let (url, seen) = spawn_mock_upstream(StatusCode::OK, OK_BODY).await;
    let app = build_test_app(&url);

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/chat/")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:5173"
    );
    let methods = headers
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .unwrap()
        .to_str()
        .unwrap();
    for method in ["GET", "POST", "HEAD", "PUT", "DELETE", "PATCH"] {
        assert!(methods.contains(method), "missing {method} in {methods}");
    }
    assert_eq!(seen.calls(), 0);
}

#[tokio::test]
async fn cors_ignores_other_origins() {
    let (url, _) = spawn_mock_upstream(StatusCode::OK, OK_BODY).await;
    let app = build_test_app(&url);

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/chat/")
                .header(header::ORIGIN, "http://evil.example")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"question":"hi"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}

#[tokio::test]
async fn large_question_is_relayed_without_a_size_cap() {
    let (url, seen) = spawn_mock_upstream(StatusCode::OK, OK_BODY).await;
    let app = build_test_app(&url);
    let question = "a".repeat(3 * 1024 * 1024);

    let (status, body) = send(app, chat_request(json!({ "question": question }).to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "answer": "42" }));
    assert_eq!(seen.calls(), 1);
    let payload = seen.payload.lock().unwrap().clone().unwrap();
    assert_eq!(payload["messages"][1]["content"].as_str().map(str::len), Some(question.len()));
}

#[tokio::test]
async fn wrong_method_returns_json_405() {
    let (url, seen) = spawn_mock_upstream(StatusCode::OK, OK_BODY).await;

    for uri in ["/chat/", "/chat"] {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(build_test_app(&url), request).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "uri {uri}");
        assert_eq!(body, json!({ "error": "Method not allowed" }));
    }
    assert_eq!(seen.calls(), 0);
}

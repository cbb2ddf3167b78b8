//! End-to-end client tests against an in-process mock backend.
//!
//! The mock serves the same REST/stream surface as the real DocChat
//! backend: form-encoded auth, a JSON assistant list, a newline-delimited
//! JSON creation stream, and the chat exchange.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Form, Json, Router};

use docchat::chat::{ChatStore, FAILURE_MESSAGE};
use docchat::client::{ApiClient, ApiError};
use docchat::config::Config;
use docchat::create::CreateAssistantParams;
use docchat::models::{CreateProgress, Role};
use docchat::progress::{CreateProgressReporter, NoProgress};
use docchat::registry::AssistantRegistry;

const TOKEN: &str = "test-token";

fn authed(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TOKEN))
        .unwrap_or(false)
}

fn unauthorized() -> impl IntoResponse {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({"detail": "Could not validate credentials"})),
    )
}

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn config_for(base_url: &str) -> Config {
    let mut cfg = Config::default();
    cfg.api.base_url = base_url.to_string();
    cfg
}

fn client_for(base_url: &str) -> ApiClient {
    ApiClient::new(&config_for(base_url), Some(TOKEN.to_string())).unwrap()
}

/// Streamed NDJSON response, split into the given byte chunks.
fn ndjson_response(chunks: Vec<&'static str>) -> impl IntoResponse {
    let stream = futures::stream::iter(
        chunks
            .into_iter()
            .map(|c| Ok::<_, Infallible>(Bytes::from(c))),
    );
    Body::from_stream(stream)
}

/// Reporter that records forwarded progress records in arrival order.
#[derive(Default)]
struct Recorder {
    seen: Arc<Mutex<Vec<CreateProgress>>>,
}

impl CreateProgressReporter for Recorder {
    fn report(&self, record: &CreateProgress) {
        self.seen.lock().unwrap().push(record.clone());
    }
}

fn pdf_fixture() -> (tempfile::TempDir, std::path::PathBuf) {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("doc.pdf");
    std::fs::write(&path, b"%PDF-1.4 fake").unwrap();
    (tmp, path)
}

// ---- auth ----

async fn login_handler(Form(form): Form<HashMap<String, String>>) -> impl IntoResponse {
    if form.get("username").map(String::as_str) == Some("alice")
        && form.get("password").map(String::as_str) == Some("pw")
    {
        Json(serde_json::json!({"access_token": TOKEN, "token_type": "bearer"})).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"detail": "Invalid Password"})),
        )
            .into_response()
    }
}

#[tokio::test]
async fn login_exchanges_credentials_for_token() {
    let base = spawn(Router::new().route("/login", post(login_handler))).await;
    let client = ApiClient::new(&config_for(&base), None).unwrap();

    let resp = client.login("alice", "pw").await.unwrap();
    assert_eq!(resp.access_token, TOKEN);
    assert_eq!(resp.token_type, "bearer");
}

#[tokio::test]
async fn bad_credentials_surface_backend_detail() {
    let base = spawn(Router::new().route("/login", post(login_handler))).await;
    let client = ApiClient::new(&config_for(&base), None).unwrap();

    match client.login("alice", "wrong").await {
        Err(ApiError::Api { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Invalid Password");
        }
        other => panic!("expected Api error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn missing_token_maps_to_unauthorized() {
    let router = Router::new().route(
        "/assistants/",
        get(|headers: HeaderMap| async move {
            if authed(&headers) {
                Json(serde_json::json!([])).into_response()
            } else {
                unauthorized().into_response()
            }
        }),
    );
    let base = spawn(router).await;
    let client = ApiClient::new(&config_for(&base), None).unwrap();

    assert!(matches!(
        client.assistants().await,
        Err(ApiError::Unauthorized)
    ));
}

// ---- assistants ----

fn assistants_json() -> serde_json::Value {
    serde_json::json!([
        {"id": 1, "name": "paper", "file_name": "paper.pdf", "temperature": 0.5, "top_k": 5},
        {"id": 2, "name": "manual", "file_name": "manual.pdf", "temperature": 0.2, "top_k": 3}
    ])
}

#[tokio::test]
async fn assistants_list_round_trips() {
    let router = Router::new().route(
        "/assistants/",
        get(|headers: HeaderMap| async move {
            if authed(&headers) {
                Json(assistants_json()).into_response()
            } else {
                unauthorized().into_response()
            }
        }),
    );
    let base = spawn(router).await;

    let list = client_for(&base).assistants().await.unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].name, "paper");
    assert_eq!(list[1].top_k, 3);
}

#[tokio::test]
async fn delete_clears_selection_only_for_selected() {
    let deleted: Arc<Mutex<Vec<i64>>> = Arc::default();
    let router = Router::new()
        .route(
            "/assistants/",
            get(|| async { Json(assistants_json()) }),
        )
        .route(
            "/assistants/{id}",
            delete(
                |State(deleted): State<Arc<Mutex<Vec<i64>>>>, Path(id): Path<i64>| async move {
                    deleted.lock().unwrap().push(id);
                    StatusCode::OK
                },
            ),
        )
        .with_state(deleted.clone());
    let base = spawn(router).await;
    let client = client_for(&base);

    let mut registry = AssistantRegistry::new();
    registry.refresh(&client).await.unwrap();
    registry.select(Some(1)).unwrap();

    registry.delete(&client, 2).await.unwrap();
    assert_eq!(registry.selected_id(), Some(1));

    registry.delete(&client, 1).await.unwrap();
    assert_eq!(registry.selected_id(), None);

    assert_eq!(*deleted.lock().unwrap(), vec![2, 1]);
}

// ---- creation stream ----

#[tokio::test]
async fn create_streams_progress_and_resolves_id() {
    let router = Router::new()
        .route(
            "/assistants/",
            post(|| async {
                // One record split across chunks, one malformed line, then
                // the terminal record.
                ndjson_response(vec![
                    "{\"status\":\"processing\",\"message\":\"Parsing ",
                    "PDF...\",\"progress\":10}\n",
                    "not json at all\n",
                    "{\"status\":\"uploading\",\"message\":\"Uploading to storage...\"}\n",
                    "{\"status\":\"complete\",\"message\":\"Assistant Ready!\",\"assistant_id\":\"42\"}\n",
                ])
            })
            .get(|| async { Json(assistants_json()) }),
        );
    let base = spawn(router).await;
    let client = client_for(&base);

    let (_tmp, pdf) = pdf_fixture();
    let params = CreateAssistantParams {
        name: "paper".to_string(),
        temperature: 0.5,
        top_k: 5,
        chunk_size: 500,
        chunk_overlap: 50,
    };

    let recorder = Recorder::default();
    let mut registry = AssistantRegistry::new();
    let id = registry
        .create(&client, &params, &pdf, &recorder)
        .await
        .unwrap();

    assert_eq!(id, "42");
    // Creation triggered a full re-fetch.
    assert_eq!(registry.assistants().len(), 2);

    let seen = recorder.seen.lock().unwrap();
    let messages: Vec<&str> = seen.iter().map(|r| r.message.as_str()).collect();
    assert_eq!(
        messages,
        vec!["Parsing PDF...", "Uploading to storage...", "Assistant Ready!"]
    );
}

#[tokio::test]
async fn create_error_record_rejects() {
    let router = Router::new().route(
        "/assistants/",
        post(|| async {
            ndjson_response(vec![
                "{\"status\":\"processing\",\"message\":\"Parsing PDF...\"}\n",
                "{\"status\":\"error\",\"message\":\"Ingestion failed to produce output.\"}\n",
            ])
        }),
    );
    let base = spawn(router).await;

    let (_tmp, pdf) = pdf_fixture();
    let params = CreateAssistantParams {
        name: "x".to_string(),
        temperature: 0.5,
        top_k: 5,
        chunk_size: 500,
        chunk_overlap: 50,
    };

    let result = client_for(&base)
        .create_assistant(&params, &pdf, &NoProgress)
        .await;
    match result {
        Err(ApiError::Stream(msg)) => assert_eq!(msg, "Ingestion failed to produce output."),
        other => panic!("expected stream error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn create_stream_without_complete_rejects() {
    let router = Router::new().route(
        "/assistants/",
        post(|| async {
            ndjson_response(vec![
                "{\"status\":\"processing\",\"message\":\"Parsing PDF...\"}\n",
            ])
        }),
    );
    let base = spawn(router).await;

    let (_tmp, pdf) = pdf_fixture();
    let params = CreateAssistantParams {
        name: "x".to_string(),
        temperature: 0.5,
        top_k: 5,
        chunk_size: 500,
        chunk_overlap: 50,
    };

    let result = client_for(&base)
        .create_assistant(&params, &pdf, &NoProgress)
        .await;
    assert!(matches!(result, Err(ApiError::Stream(_))));
}

#[tokio::test]
async fn create_403_maps_to_plan_limit() {
    let router = Router::new().route(
        "/assistants/",
        post(|| async {
            (
                StatusCode::FORBIDDEN,
                Json(serde_json::json!({"detail": "Limit reached: You can only create 3 assistants."})),
            )
        }),
    );
    let base = spawn(router).await;

    let (_tmp, pdf) = pdf_fixture();
    let params = CreateAssistantParams {
        name: "x".to_string(),
        temperature: 0.5,
        top_k: 5,
        chunk_size: 500,
        chunk_overlap: 50,
    };

    let result = client_for(&base)
        .create_assistant(&params, &pdf, &NoProgress)
        .await;
    match result {
        Err(ApiError::PlanLimit) => {
            assert!(ApiError::PlanLimit.to_string().contains("maximum limit of 3"));
        }
        other => panic!("expected plan limit, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn create_rejects_non_pdf_before_upload() {
    // No server needed: the extension check runs before any request.
    let client = client_for("http://127.0.0.1:1");
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("notes.txt");
    std::fs::write(&path, b"plain text").unwrap();

    let params = CreateAssistantParams {
        name: "x".to_string(),
        temperature: 0.5,
        top_k: 5,
        chunk_size: 500,
        chunk_overlap: 50,
    };
    let result = client.create_assistant(&params, &path, &NoProgress).await;
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));
}

// ---- chat ----

type CapturedChats = Arc<Mutex<Vec<serde_json::Value>>>;

fn chat_router(captured: CapturedChats) -> Router {
    Router::new()
        .route(
            "/chat/",
            post(
                |State(captured): State<CapturedChats>, Json(body): Json<serde_json::Value>| async move {
                    captured.lock().unwrap().push(body.clone());
                    let query = body["query"].as_str().unwrap_or_default().to_string();
                    Json(serde_json::json!({
                        "response": format!("echo: {}", query),
                        "sources": [3, 7]
                    }))
                },
            ),
        )
        .with_state(captured)
}

#[tokio::test]
async fn chat_appends_alternating_messages_in_order() {
    let captured: CapturedChats = Arc::default();
    let base = spawn(chat_router(captured.clone())).await;
    let client = client_for(&base);

    let mut store = ChatStore::new(6);
    for i in 0..3 {
        let reply = store.send(&client, 1, &format!("q{}", i)).await;
        assert_eq!(reply.content, format!("echo: q{}", i));
        assert_eq!(reply.sources.as_deref(), Some(&[3, 7][..]));
    }

    let log = store.messages(1);
    assert_eq!(log.len(), 6);
    for (i, msg) in log.iter().enumerate() {
        let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
        assert_eq!(msg.role, expected);
    }
}

#[tokio::test]
async fn chat_forwards_trailing_history_window() {
    let captured: CapturedChats = Arc::default();
    let base = spawn(chat_router(captured.clone())).await;
    let client = client_for(&base);

    let mut store = ChatStore::new(6);
    for i in 0..5 {
        store.send(&client, 1, &format!("q{}", i)).await;
    }

    let captured = captured.lock().unwrap();
    assert_eq!(captured.len(), 5);
    // First request: empty history.
    assert_eq!(captured[0]["chat_history"].as_array().unwrap().len(), 0);
    // Fifth request: history capped at 6 (three prior pairs), query excluded.
    let history = captured[4]["chat_history"].as_array().unwrap();
    assert_eq!(history.len(), 6);
    assert_eq!(history[0]["role"], "user");
    assert_eq!(history[0]["content"], "q1");
    assert_eq!(history[5]["content"], "echo: q3");
    assert_eq!(captured[4]["assistant_id"], 1);
}

#[tokio::test]
async fn chat_failure_appends_single_placeholder() {
    let router = Router::new().route(
        "/chat/",
        post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let base = spawn(router).await;
    let client = client_for(&base);

    let mut store = ChatStore::new(6);
    store.append(5, docchat::models::Message::user("earlier"));
    store.append(5, docchat::models::Message::assistant("fine", None));

    let reply = store.send(&client, 5, "does this work?").await;
    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(reply.content, FAILURE_MESSAGE);
    assert!(reply.sources.is_none());

    // Prior log untouched; exactly two new entries.
    let log = store.messages(5);
    assert_eq!(log.len(), 4);
    assert_eq!(log[0].content, "earlier");
    assert_eq!(log[2].content, "does this work?");
    assert_eq!(log[3].content, FAILURE_MESSAGE);
}

// ---- admin ----

#[tokio::test]
async fn admin_surface_round_trips() {
    let router = Router::new()
        .route(
            "/admin/users",
            get(|| async {
                Json(serde_json::json!([{
                    "id": 1, "username": "alice", "role": "admin",
                    "assistants": [{
                        "id": 9, "name": "paper", "file_name": "paper.pdf",
                        "temperature": 0.5, "top_k": 5,
                        "chunk_size": 500, "chunk_overlap": 50
                    }]
                }]))
            }),
        )
        .route("/admin/user/{id}", delete(|| async { StatusCode::OK }))
        .route("/admin/assistant/{id}", delete(|| async { StatusCode::OK }))
        .route(
            "/admin/grant-admin/{id}",
            post(|Path(id): Path<i64>| async move {
                Json(serde_json::json!({"message": format!("User {} is now an admin", id)}))
            }),
        );
    let base = spawn(router).await;
    let client = client_for(&base);

    let users = client.admin_users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].assistants[0].chunk_size, 500);
    assert!(users[0].assistants[0].image_base64.is_none());

    client.admin_delete_user(1).await.unwrap();
    client.admin_delete_assistant(9).await.unwrap();
    let msg = client.admin_grant_admin(2).await.unwrap();
    assert_eq!(msg, "User 2 is now an admin");
}

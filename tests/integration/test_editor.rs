//! End-to-end tests for the drip editor.
//!
//! Each test starts a fake course backend and the editor API as real axum
//! servers on ephemeral ports, then drives the editor over HTTP the way a
//! drag-and-drop front end would.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use drip_core::{create_router, AppState, Config, CourseBackend, DripChainStore, DripPersistence, Inventory};
use drip_http::HttpBackend;
use drip_report::{Diagnostic, DripPlan, MarkdownRenderer};
use serde_json::{json, Value};

// ============================================================================
// Fake course backend
// ============================================================================

#[derive(Default)]
struct FakeCourse {
    drips: Mutex<Value>,
    fail_updates: AtomicBool,
    update_count: Mutex<usize>,
}

type Course = Arc<FakeCourse>;

async fn sections(Path(course_id): Path<String>) -> Response {
    if course_id != "42" {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(json!([
        {"id": 1, "title": "Getting Started"},
        {"id": 2, "title": "Core Concepts"}
    ]))
    .into_response()
}

async fn lessons(Path(section_id): Path<String>) -> Json<Value> {
    match section_id.as_str() {
        "1" => Json(json!([
            {"id": 101, "title": "Welcome", "type": "TEXT"},
            {"id": 102, "title": "Installing Rust", "type": "VIDEO"},
            {"id": 103, "title": "Quiz: Setup", "type": "TEST"}
        ])),
        "2" => Json(json!([
            {"id": 201, "title": "Ownership", "type": "TEXT"},
            {"id": 202, "title": "Borrowing", "type": "AUDIO"}
        ])),
        _ => Json(json!([])),
    }
}

async fn get_drips(State(course): State<Course>) -> Json<Value> {
    let drips = course.drips.lock().expect("drips lock").clone();
    Json(if drips.is_null() { json!([]) } else { drips })
}

async fn put_drips(State(course): State<Course>, Json(body): Json<Value>) -> StatusCode {
    *course.update_count.lock().expect("count lock") += 1;
    if course.fail_updates.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    *course.drips.lock().expect("drips lock") = body;
    StatusCode::OK
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });
    format!("http://{addr}")
}

async fn spawn_fake_backend() -> (String, Course) {
    let course = Course::default();
    let router = Router::new()
        .route("/api/courses/:course_id/sections", get(sections))
        .route("/api/sections/:section_id/lessons", get(lessons))
        .route("/api/courses/:course_id/drips", get(get_drips).put(put_drips))
        .with_state(course.clone());
    let base = serve(router).await;
    (format!("{base}/api"), course)
}

fn backend_for(base_url: &str) -> Arc<dyn CourseBackend> {
    let config = Config {
        backend_url: base_url.to_string(),
        request_timeout_secs: 5,
        ..Config::default()
    };
    Arc::new(HttpBackend::from_config(&config).expect("Failed to build backend"))
}

/// Starts the editor API for course 42 and returns its base URL.
async fn spawn_editor(backend_url: &str) -> String {
    let backend = backend_for(backend_url);
    let inventory = Inventory::fetch(backend.as_ref(), "42")
        .await
        .expect("Failed to load inventory");
    let state = AppState::new(Config::default(), "42", inventory, backend);
    state.reload().await.expect("Failed to load chains");
    serve(create_router(state)).await
}

fn drag(source: (&str, usize), destination: (&str, usize)) -> Value {
    json!({
        "draggableId": "lesson-x",
        "source": {"droppableId": source.0, "index": source.1},
        "destination": {"droppableId": destination.0, "index": destination.1},
        "reason": "DROP"
    })
}

async fn post(client: &reqwest::Client, url: String, body: Option<Value>) -> reqwest::Response {
    let request = client.post(url);
    let request = match body {
        Some(body) => request.json(&body),
        None => request,
    };
    request.send().await.expect("Request failed")
}

fn lesson_ids(chain: &Value) -> Vec<String> {
    chain["lessons"]
        .as_array()
        .expect("lessons array")
        .iter()
        .map(|l| l["id"].as_str().expect("lesson id").to_string())
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_inventory_is_served_from_backend() {
    let (backend_url, _) = spawn_fake_backend().await;
    let editor = spawn_editor(&backend_url).await;

    let inventory: Value = reqwest::get(format!("{editor}/api/inventory"))
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid JSON");

    let sections = inventory["sections"].as_array().expect("sections");
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0]["id"], "1");
    assert_eq!(sections[0]["lessons"][1]["title"], "Installing Rust");
    assert_eq!(sections[1]["lessons"][1]["type"], "AUDIO");
}

#[tokio::test]
async fn test_build_chain_by_dragging_then_save() {
    let (backend_url, course) = spawn_fake_backend().await;
    let editor = spawn_editor(&backend_url).await;
    let client = reqwest::Client::new();

    let response = post(&client, format!("{editor}/api/chains"), None).await;
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let chain: Value = response.json().await.expect("Invalid JSON");
    let chain_id = chain["id"].as_str().expect("chain id").to_string();

    post(&client, format!("{editor}/api/drag"), Some(drag(("section-1", 0), (&chain_id, 0)))).await;
    let response = post(
        &client,
        format!("{editor}/api/drag"),
        Some(drag(("section-1", 1), (&chain_id, 1))),
    )
    .await;
    let body: Value = response.json().await.expect("Invalid JSON");
    assert_eq!(body["outcome"]["status"], "applied");
    assert_eq!(lesson_ids(&body["chains"][0]), vec!["101", "102"]);

    let response = post(&client, format!("{editor}/api/save"), None).await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.expect("Invalid JSON");
    assert_eq!(body["edges"], 1);

    let saved = course.drips.lock().expect("drips lock").clone();
    assert_eq!(
        saved,
        json!([{
            "prevId": 101,
            "prevType": "LESSON",
            "requiredCompletion": true,
            "nextDrips": [{"nextId": 102, "nextType": "LESSON", "requiredCompletion": true}]
        }])
    );
}

#[tokio::test]
async fn test_duplicate_drop_is_ignored() {
    let (backend_url, _) = spawn_fake_backend().await;
    let editor = spawn_editor(&backend_url).await;
    let client = reqwest::Client::new();

    post(&client, format!("{editor}/api/chains"), None).await;
    post(&client, format!("{editor}/api/drag"), Some(drag(("section-2", 0), ("drip-1", 0)))).await;
    let response = post(
        &client,
        format!("{editor}/api/drag"),
        Some(drag(("section-2", 0), ("drip-1", 1))),
    )
    .await;

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.expect("Invalid JSON");
    assert_eq!(body["outcome"], json!({"status": "ignored", "reason": "duplicate"}));
    assert_eq!(lesson_ids(&body["chains"][0]), vec!["201"]);
}

#[tokio::test]
async fn test_saved_chains_survive_a_restart() {
    let (backend_url, _) = spawn_fake_backend().await;
    let first = spawn_editor(&backend_url).await;
    let client = reqwest::Client::new();

    post(&client, format!("{first}/api/chains"), None).await;
    post(&client, format!("{first}/api/chains"), None).await;
    for (source, destination) in [
        (("section-1", 2), ("drip-1", 0)),
        (("section-2", 1), ("drip-1", 1)),
        (("section-2", 0), ("drip-2", 0)),
        (("section-1", 0), ("drip-2", 0)),
    ] {
        post(&client, format!("{first}/api/drag"), Some(drag(source, destination))).await;
    }
    let response = post(&client, format!("{first}/api/save"), None).await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let second = spawn_editor(&backend_url).await;
    let body: Value = reqwest::get(format!("{second}/api/chains"))
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid JSON");

    let chains = body["chains"].as_array().expect("chains");
    assert_eq!(chains.len(), 2);
    assert_eq!(lesson_ids(&chains[0]), vec!["103", "202"]);
    assert_eq!(lesson_ids(&chains[1]), vec!["101", "201"]);
    assert_eq!(chains[0]["lessons"][0]["title"], "Quiz: Setup");
    assert_eq!(chains[1]["lessons"][1]["type"], "TEXT");
}

#[tokio::test]
async fn test_failed_save_keeps_local_edits() {
    let (backend_url, course) = spawn_fake_backend().await;
    let editor = spawn_editor(&backend_url).await;
    let client = reqwest::Client::new();
    course.fail_updates.store(true, Ordering::SeqCst);

    post(&client, format!("{editor}/api/chains"), None).await;
    post(&client, format!("{editor}/api/drag"), Some(drag(("section-1", 0), ("drip-1", 0)))).await;

    let response = post(&client, format!("{editor}/api/save"), None).await;
    assert_eq!(response.status(), reqwest::StatusCode::BAD_GATEWAY);
    let error: Value = response.json().await.expect("Invalid JSON");
    assert!(error["error"].as_str().expect("message").contains("status 500"));

    course.fail_updates.store(false, Ordering::SeqCst);
    let response = post(&client, format!("{editor}/api/save"), None).await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(*course.update_count.lock().expect("count lock"), 2);
}

#[tokio::test]
async fn test_reload_discards_unsaved_edits() {
    let (backend_url, course) = spawn_fake_backend().await;
    *course.drips.lock().expect("drips lock") = json!([{"prevId": 201, "nextDrips": [{"nextId": 202}]}]);
    let editor = spawn_editor(&backend_url).await;
    let client = reqwest::Client::new();

    post(&client, format!("{editor}/api/chains"), None).await;
    let response = post(&client, format!("{editor}/api/reload"), None).await;

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.expect("Invalid JSON");
    let chains = body["chains"].as_array().expect("chains");
    assert_eq!(chains.len(), 1);
    assert_eq!(lesson_ids(&chains[0]), vec!["201", "202"]);
}

#[tokio::test]
async fn test_plan_from_backend_drips() {
    let (backend_url, course) = spawn_fake_backend().await;
    *course.drips.lock().expect("drips lock") = json!([
        {"prevId": 101, "nextDrips": [{"nextId": 102}, {"nextId": 103}]},
        {"prevId": 102, "nextDrips": [{"nextId": 900}]}
    ]);
    let backend = backend_for(&backend_url);

    let inventory = Inventory::fetch(backend.as_ref(), "42").await.expect("inventory");
    let persistence = DripPersistence::new(backend, "Lesson");
    let lists = persistence.load("42", &inventory).await.expect("drips");
    let mut store = DripChainStore::default();
    store.replace_chains(lists);
    let plan = DripPlan::build("42", &inventory, store.chains());

    assert_eq!(plan.chains[0].steps[2].prerequisite.as_ref().expect("prereq").id, "102");
    assert!(plan.diagnostics.contains(&Diagnostic::UnknownLesson {
        chain_id: "drip-2".to_string(),
        lesson_id: "900".to_string(),
    }));
    assert_eq!(plan.summary.ungated_lessons, 3);

    let markdown = MarkdownRenderer::new(&plan).render();
    assert!(markdown.contains("| 2 | Lesson 900 | TEXT | Installing Rust |"));
}

#[tokio::test]
async fn test_unreachable_backend_starts_empty() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let backend = backend_for(&format!("http://{addr}/api"));

    let inventory = tokio::time::timeout(
        Duration::from_secs(10),
        Inventory::load_or_empty(backend.as_ref(), "42"),
    )
    .await
    .expect("load timed out");

    assert!(inventory.is_empty());
}

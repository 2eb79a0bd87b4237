//! Endpoint tests against real worker processes (POSIX `sh` scripts)

#![cfg(unix)]

use std::sync::Arc;

use amplifier_config::AmplifierConfig;
use amplifier_execution::ProcessLauncher;
use amplifier_rest_api::{create_rest_app, AppConfig, PlaygroundContext};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

/// Write `scripts` into a scripts directory and build an app that runs them with `sh`
fn app_with_workers(scripts: &[(&str, &str)]) -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    for (name, body) in scripts {
        std::fs::write(dir.path().join(name), body).unwrap();
    }

    let mut config = AmplifierConfig::default();
    config.worker.interpreter = "sh".to_string();
    config.worker.scripts_dir = dir.path().to_path_buf();

    let launcher = Arc::new(ProcessLauncher::from_config(&config.worker));
    let context = PlaygroundContext::from_config(launcher, &config);
    (create_rest_app(context, AppConfig::default()), dir)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Split an SSE body into `(event, data)` pairs
fn frames(text: &str) -> Vec<(String, Value)> {
    text.split("\n\n")
        .filter(|frame| !frame.trim().is_empty())
        .filter_map(|frame| {
            let mut name = None;
            let mut data = None;
            for line in frame.lines() {
                if let Some(rest) = line.strip_prefix("event: ") {
                    name = Some(rest.to_string());
                } else if let Some(rest) = line.strip_prefix("data: ") {
                    data = Some(serde_json::from_str(rest).unwrap());
                }
            }
            Some((name?, data?))
        })
        .collect()
}

#[tokio::test]
async fn test_execute_stream_demo() {
    let (app, _dir) = app_with_workers(&[(
        "run-example.py",
        r#"payload=$(cat)
case "$payload" in
  *'"mode":"developers"'*) ;;
  *) exit 7 ;;
esac
echo 'STREAM:{"type":"chunk","content":"Hi"}'
"#,
    )]);

    let response = app
        .oneshot(post_json(
            "/api/playground/execute-stream",
            json!({"exampleId": "demo", "inputs": {}, "mode": "developers"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/event-stream");
    assert_eq!(response.headers()["cache-control"], "no-cache");

    let frames = frames(&body_text(response).await);
    let names: Vec<&str> = frames.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["status", "chunk", "complete"]);
    assert_eq!(frames[0].1["phase"], "starting");
    assert_eq!(frames[1].1, json!({"content": "Hi"}));
    assert!(frames[2].1["executionTimeMs"].is_u64());
}

#[tokio::test]
async fn test_recipe_stream_steps() {
    let (app, _dir) = app_with_workers(&[(
        "run-recipe-stream.py",
        r#"cat > /dev/null
echo 'STREAM:{"type":"step_start","step":1,"stepId":"research","totalSteps":1}'
echo 'STREAM:{"type":"step_complete","step":1,"stepId":"research","timing":0.5}'
"#,
    )]);

    let response = app
        .oneshot(post_json(
            "/api/playground/execute-recipe-stream",
            json!({"recipeId": "research", "recipePath": "recipes/research.yaml", "inputs": {"topic": "rust"}}),
        ))
        .await
        .unwrap();

    let frames = frames(&body_text(response).await);
    let names: Vec<&str> = frames.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["status", "step_start", "step_complete", "complete"]);
    assert_eq!(frames[0].1["message"], "Initializing recipe execution...");
    assert_eq!(frames[1].1["stepName"], "research");
    assert_eq!(frames[3].1["message"], "Recipe execution completed successfully");
}

#[tokio::test]
async fn test_buffered_execute_plain_text() {
    let (app, _dir) = app_with_workers(&[("run-example.py", "cat > /dev/null\necho 'hello world'\n")]);

    let response = app
        .oneshot(post_json("/api/playground/execute", json!({"exampleId": "demo"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["output"], "hello world");
    assert!(body["executionTimeMs"].is_u64());
    assert!(body.get("metadata").is_none());
}

#[tokio::test]
async fn test_buffered_execute_application_error() {
    let (app, _dir) = app_with_workers(&[(
        "run-bundle.py",
        r#"cat > /dev/null
echo '{"error": "Bundle not found", "traceback": "Traceback (most recent call last)"}'
"#,
    )]);

    let response = app
        .oneshot(post_json(
            "/api/playground/execute-bundle",
            json!({"bundleId": "b", "bundlePath": "bundles/b.md", "prompt": "hi"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Bundle not found");
    assert_eq!(body["details"], "Traceback (most recent call last)");
    assert!(body["executionTimeMs"].is_u64());
}

#[tokio::test]
async fn test_buffered_execute_nonzero_exit() {
    let (app, _dir) = app_with_workers(&[("run-example.py", "cat > /dev/null\necho 'boom' >&2\nexit 4\n")]);

    let response = app
        .oneshot(post_json("/api/playground/execute", json!({"exampleId": "demo"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["error"], "Process exited with code 4");
    assert_eq!(body["details"], "boom");
}

#[tokio::test]
async fn test_chat_passthrough() {
    let (app, _dir) = app_with_workers(&[(
        "amplifier-chat.py",
        r#"payload=$(cat)
case "$payload" in
  *'"sessionId":"s-1"'*) ;;
  *) exit 3 ;;
esac
echo '{"response": "Hello!", "session_id": "s-1", "timestamp": "2026-01-01T00:00:00Z"}'
"#,
    )]);

    let response = app
        .oneshot(post_json("/api/chat", json!({"message": "hi", "sessionId": "s-1"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(
        body,
        json!({"response": "Hello!", "session_id": "s-1", "timestamp": "2026-01-01T00:00:00Z"})
    );
}

#[tokio::test]
async fn test_warmup_failure_message() {
    let (app, _dir) = app_with_workers(&[("amplifier-warmup.py", "cat > /dev/null\necho 'no module' >&2\nexit 1\n")]);

    let request = Request::builder()
        .method("POST")
        .uri("/api/chat/warmup")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["error"], "Failed to warm up session");
    assert!(body["details"].as_str().unwrap().contains("no module"));
}

#[tokio::test]
async fn test_save_config_registers_with_worker() {
    let (app, _dir) = app_with_workers(&[(
        "create-config.py",
        r#"payload=$(cat)
case "$payload" in
  *'"userId":"user-9"'*) echo '{"config_id": "cfg-123"}' ;;
  *) exit 2 ;;
esac
"#,
    )]);

    let request = Request::builder()
        .method("POST")
        .uri("/api/config")
        .header("content-type", "application/json")
        .header("x-user-id", "user-9")
        .body(Body::from(
            json!({"config": {"model": "claude-opus"}, "bundle": {"name": "mine"}}).to_string(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(
        body,
        json!({"success": true, "message": "Configuration saved successfully", "config_id": "cfg-123"})
    );
}

fn process_alive(pid: &str) -> bool {
    std::process::Command::new("sh")
        .arg("-c")
        .arg(format!("kill -0 {} 2>/dev/null", pid))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[tokio::test]
async fn test_dropped_stream_response_stops_worker() {
    let (app, dir) = app_with_workers(&[(
        "run-example.py",
        r#"cat > /dev/null
echo $$ > "$(dirname "$0")/worker.pid.tmp"
mv "$(dirname "$0")/worker.pid.tmp" "$(dirname "$0")/worker.pid"
exec sleep 30
"#,
    )]);
    let pid_file = dir.path().join("worker.pid");

    let response = app
        .oneshot(post_json(
            "/api/playground/execute-stream",
            json!({"exampleId": "demo", "inputs": {}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut pid = None;
    for _ in 0..100 {
        if let Ok(text) = std::fs::read_to_string(&pid_file) {
            pid = Some(text.trim().to_string());
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    let pid = pid.expect("worker never started");
    assert!(process_alive(&pid));

    // The body is never polled
    drop(response);

    let mut alive = true;
    for _ in 0..100 {
        alive = process_alive(&pid);
        if !alive {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    assert!(!alive, "worker {} still running after the response was dropped", pid);
}

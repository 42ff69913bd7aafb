use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use server::{router, AppState};
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use tower::ServiceExt;
use vecrank_core::EngineConfig;

fn write_corpus(dir: &Path) {
    fs::write(dir.join("d1"), "the cat sat").unwrap();
    fs::write(dir.join("d2"), "the dog sat").unwrap();
    fs::write(dir.join("d3"), "cats and dogs").unwrap();
}

fn app(dir: &Path) -> Router {
    let state = AppState::load(dir.to_path_buf(), EngineConfig::default(), Some("secret".into())).unwrap();
    router(state)
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let (status, json) = call(app(dir.path()), get("/search?q=cat&k=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_docs"], 3);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["doc_id"], "d1");
    assert_eq!(arr[0]["rank"], 1);
    assert_eq!(arr[1]["doc_id"], "d3");
    assert_eq!(arr[0]["score"], arr[1]["score"]);
}

#[tokio::test]
async fn empty_query_has_no_results() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let (status, json) = call(app(dir.path()), get("/search?q=the")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn doc_vector_lookup() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let app = app(dir.path());

    let (status, json) = call(app.clone(), get("/doc/d1")).await;
    assert_eq!(status, StatusCode::OK);
    let terms: Vec<&str> = json["terms"].as_array().unwrap().iter().map(|t| t["term"].as_str().unwrap()).collect();
    assert_eq!(terms, vec!["cat", "sat"]);

    let (status, _) = call(app, get("/doc/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rebuild_requires_token_and_swaps_snapshot() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let app = app(dir.path());

    let unauthorized = Request::post("/index/rebuild").body(Body::empty()).unwrap();
    let (status, _) = call(app.clone(), unauthorized).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    fs::write(dir.path().join("d4"), "a cat napped").unwrap();
    let authorized = Request::post("/index/rebuild")
        .header("X-ADMIN-TOKEN", "secret")
        .body(Body::empty())
        .unwrap();
    let (status, json) = call(app.clone(), authorized).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["num_docs"], 4);

    let (_, json) = call(app, get("/search?q=nap")).await;
    assert_eq!(json["total_docs"], 4);
    assert_eq!(json["results"][0]["doc_id"], "d4");
}

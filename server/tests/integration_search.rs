use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use search_core::IndexConfig;
use search_server::{build_app, ServerConfig};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use tower::ServiceExt;

fn write_corpus(dir: &Path) {
    fs::write(dir.join("a.txt"), "the cat sat").unwrap();
    fs::write(dir.join("b.txt"), "the dog sat").unwrap();
    fs::write(dir.join("c.txt"), "cat dog bird").unwrap();
}

fn config(dir: &Path, depth: usize) -> ServerConfig {
    ServerConfig {
        corpus_dir: dir.to_path_buf(),
        index: IndexConfig { posting_depth: depth },
        admin_token: Some("secret".into()),
        cors_allow_origin: None,
    }
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

#[tokio::test]
async fn query_returns_best_match() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let app = build_app(config(dir.path(), 10)).unwrap();

    let (status, json) = get(app, "/query?q=cat").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["outcome"], "match");
    assert_eq!(json["document"], "a.txt");
    assert!(json["score"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn query_without_indexed_terms_is_no_match() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let app = build_app(config(dir.path(), 10)).unwrap();

    let (status, json) = get(app, "/query?q=the").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["outcome"], "no_match");
    assert_eq!(json["score"], 0.0);
    assert!(json.get("document").is_none());
}

#[tokio::test]
async fn shallow_index_reports_deeper_scan_and_falls_back() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("p.txt"), "apple wheat").unwrap();
    fs::write(dir.path().join("q.txt"), "pepper wheat").unwrap();
    fs::write(dir.path().join("r.txt"), "apple pepper").unwrap();
    fs::write(dir.path().join("s.txt"), "violin").unwrap();
    let app = build_app(config(dir.path(), 1)).unwrap();

    let (_, json) = get(app.clone(), "/query?q=apple%20pepper").await;
    assert_eq!(json["outcome"], "needs_deeper_scan");
    assert!(json["max_upper_bound"].as_f64().unwrap() > json["max_actual"].as_f64().unwrap());

    let (_, json) = get(app, "/query?q=apple%20pepper&exhaustive=true").await;
    assert_eq!(json["outcome"], "match");
    assert_eq!(json["document"], "r.txt");
}

#[tokio::test]
async fn weight_and_idf_use_sentinels() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let app = build_app(config(dir.path(), 10)).unwrap();

    let (_, json) = get(app.clone(), "/idf?term=cat").await;
    assert!((json["idf"].as_f64().unwrap() - 1.5f64.log10()).abs() < 1e-12);
    let (_, json) = get(app.clone(), "/idf?term=vector").await;
    assert_eq!(json["idf"], -1.0);
    let (_, json) = get(app.clone(), "/weight?doc=a.txt&term=dog").await;
    assert_eq!(json["weight"], 0.0);
    let (_, json) = get(app, "/weight?doc=a.txt&term=cat").await;
    assert!(json["weight"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn reload_requires_token_and_swaps_index() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let app = build_app(config(dir.path(), 10)).unwrap();

    let unauthorized = Request::post("/index/reload").body(Body::empty()).unwrap();
    let (status, _) = send(app.clone(), unauthorized).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    fs::write(dir.path().join("d.txt"), "zebra stripes").unwrap();
    let authorized = Request::post("/index/reload")
        .header("X-ADMIN-TOKEN", "secret")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(app.clone(), authorized).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_docs"], 4);

    let (_, json) = get(app.clone(), "/query?q=zebra").await;
    assert_eq!(json["document"], "d.txt");
    let (_, json) = get(app, "/stats").await;
    assert_eq!(json["posting_depth"], 10);
}

#[tokio::test]
async fn failed_reload_keeps_current_index() {
    let dir = tempdir().unwrap();
    let corpus = dir.path().join("corpus");
    fs::create_dir_all(&corpus).unwrap();
    write_corpus(&corpus);
    let app = build_app(config(&corpus, 10)).unwrap();

    fs::remove_dir_all(&corpus).unwrap();
    let req = Request::post("/index/reload")
        .header("X-ADMIN-TOKEN", "secret")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app.clone(), req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (_, json) = get(app, "/query?q=cat").await;
    assert_eq!(json["document"], "a.txt");
}

#[test]
fn empty_corpus_refuses_to_start() {
    let dir = tempdir().unwrap();
    assert!(build_app(config(dir.path(), 10)).is_err());
}

//! Dashboard API over ingested data.

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::{Value, json};

use crate::test_helpers::{ScriptedProvider, app, ingestor, job_log, new_store};

#[actix_web::test]
async fn test_matrix_and_last_updated_after_ingest() {
    let store = new_store();
    let app = test::init_service(app(store.clone())).await;

    // Nothing ingested yet
    let req = test::TestRequest::get().uri("/api/v1/matrix").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let req = test::TestRequest::get().uri("/api/v1/last-updated").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let provider = ScriptedProvider::new()
        .build(2, "222222222222", "second", &[20])
        .log(20, job_log("ray/tests/test_z.py::test_b FAILED"))
        .build(1, "111111111111", "first", &[10])
        .log(10, job_log("ray/tests/test_z.py::test_b PASSED"));
    ingestor(provider, &store).ingest(25).await.unwrap();

    let req = test::TestRequest::get()
        .uri("/api/v1/matrix?window=2")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["columns"], json!([[2, 0], [1, 0]]));
    assert_eq!(body["index"], json!(["ray/tests/test_z.py::test_b"]));
    assert_eq!(body["data"], json!([[1, 0]]));
    assert_eq!(body["metadata"]["1"]["sha"], "111111");
    assert_eq!(body["metadata"]["2"]["job_ids"], json!([20]));
    assert_eq!(
        body["encoding"],
        json!({"PASSED": 0, "FAILED": 1, "SKIPPED": 2, "UNKNOWN": 3})
    );

    let req = test::TestRequest::get().uri("/api/v1/last-updated").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["last_updated_unix"].is_i64());
    assert!(body["last_updated"].is_string());
}

#[actix_web::test]
async fn test_window_defaults_to_config() {
    let store = new_store();
    let mut provider = ScriptedProvider::new();
    for id in (1..=12).rev() {
        provider = provider.build(id, "abcdefabcdef", "commit", &[id * 10]);
    }
    ingestor(provider, &store).ingest(25).await.unwrap();

    let app = test::init_service(app(store.clone())).await;
    let req = test::TestRequest::get().uri("/api/v1/matrix").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["columns"].as_array().unwrap().len(), 10);
    assert_eq!(body["columns"][0], json!([12, 0]));

    let req = test::TestRequest::get()
        .uri("/api/v1/matrix?window=abc")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_ready_reports_memory_store() {
    let store = new_store();
    let app = test::init_service(app(store.clone())).await;

    let req = test::TestRequest::get().uri("/api/v1/ready").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/api/v1/info").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["store_backend"], "memory");
}

use super::models::{Pagination, PaginationParams, UIConfiguration};
use crate::common::auth::USER_ID_HEADER;
use crate::config::Config;
use crate::config::test_helpers::setup_inventory_app;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

#[test]
fn test_pagination_defaults() {
    let params = PaginationParams {
        page: None,
        limit: None,
    };
    assert_eq!(params.page(), 1);
    assert_eq!(params.limit(), 10);
    assert_eq!(params.offset(), 0);
}

#[test]
fn test_pagination_clamps_limit_and_page() {
    let params = PaginationParams {
        page: Some(0),
        limit: Some(1000),
    };
    assert_eq!(params.page(), 1);
    assert_eq!(params.limit(), 100);

    let params = PaginationParams {
        page: Some(3),
        limit: Some(20),
    };
    assert_eq!(params.offset(), 40);
}

#[test]
fn test_pagination_offset_stays_bounded_for_huge_pages() {
    let params = PaginationParams {
        page: Some(u64::MAX),
        limit: Some(100),
    };
    assert_eq!(params.page(), u64::MAX);
    assert_eq!(params.offset(), i64::MAX.unsigned_abs());
}

#[tokio::test]
async fn test_huge_page_returns_an_empty_page() {
    let (app, _db, _blobs) = setup_inventory_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/workorders?page=18446744073709551615&limit=100")
                .header(USER_ID_HEADER, "tech-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["pagination"]["total"], 0);
}

#[test]
fn test_pagination_total_pages() {
    let params = PaginationParams {
        page: Some(2),
        limit: Some(5),
    };
    assert_eq!(
        Pagination::new(&params, 11),
        Pagination {
            page: 2,
            limit: 5,
            total: 11,
            total_pages: 3,
        }
    );
    assert_eq!(Pagination::new(&params, 0).total_pages, 0);
}

#[test]
fn test_ui_configuration_serialization() {
    let config = UIConfiguration::new(&Config::for_tests());
    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json["clientId"], "test-ui");
    assert_eq!(json["realm"], "test-realm");
    assert_eq!(json["deployment"], "test");
}

#[tokio::test]
async fn test_healthz_reports_ok() {
    let (app, _db, _blobs) = setup_inventory_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
}

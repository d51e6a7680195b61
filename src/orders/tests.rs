use crate::common::auth::{USER_ID_HEADER, USER_ROLE_HEADER};
use crate::config::test_helpers::{inventory_state, setup_inventory_app, setup_inventory_db};
use crate::counters::models::{ActiveModel as CounterActiveModel, Entity as Counter, ORDER_SEQUENCE};
use crate::external::s3::{BlobStore, MemoryBlobStore};
use crate::routes::build_inventory_router;
use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, EntityTrait};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const BOUNDARY: &str = "order_test_boundary";

async fn extract_response_body(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    let body: Value = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        json!({"error": String::from_utf8_lossy(&bytes)})
    });
    (status, body)
}

fn order_data(building: &str) -> Value {
    json!({
        "dateOfSurvey": "2026-03-14",
        "confinedSpaceNameOrId": "Vault 7",
        "building": building,
        "numberOfEntryPoints": 2,
        "confinedSpace": true,
        "atmosphericHazard": true,
        "atmosphericHazardDescription": "Low oxygen",
        "notes": "Checked with a four-gas meter"
    })
}

fn multipart_body(data: &Value, images: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"data\"\r\n\r\n{data}\r\n"
        )
        .as_bytes(),
    );
    for (file_name, content_type) in images {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a]);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn with_user(builder: axum::http::request::Builder, user: &str, admin: bool) -> axum::http::request::Builder {
    let builder = builder.header(USER_ID_HEADER, user);
    if admin {
        builder.header(USER_ROLE_HEADER, "admin")
    } else {
        builder
    }
}

async fn create_order(
    app: &Router,
    user: &str,
    data: &Value,
    images: &[(&str, &str)],
) -> (StatusCode, Value) {
    let request = with_user(Request::builder(), user, false)
        .method("POST")
        .uri("/api/workorders")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(data, images)))
        .unwrap();
    extract_response_body(app.clone().oneshot(request).await.unwrap()).await
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user: &str,
    admin: bool,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = with_user(Request::builder(), user, admin)
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = builder
        .body(body.map_or_else(Body::empty, |body| Body::from(body.to_string())))
        .unwrap();
    extract_response_body(app.clone().oneshot(request).await.unwrap()).await
}

async fn counter_value(db: &sea_orm::DatabaseConnection) -> Option<i64> {
    Counter::find_by_id(ORDER_SEQUENCE.to_string())
        .one(db)
        .await
        .unwrap()
        .map(|counter| counter.seq)
}

#[tokio::test]
async fn test_create_order_assigns_first_id_and_stores_photos() {
    let (app, _db, blobs) = setup_inventory_app().await;

    let (status, body) = create_order(
        &app,
        "tech-1",
        &order_data("Science Hall"),
        &[("north.png", "image/png"), ("south.png", "image/png")],
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "{body:?}");
    let order = &body["data"];
    assert_eq!(order["uniqueId"], "0001");
    assert_eq!(order["userId"], "tech-1");
    assert_eq!(order["building"], "Science Hall");
    assert_eq!(order["atmosphericHazard"], true);
    assert_eq!(order["dateOfSurvey"], "2026-03-14T00:00:00Z");

    let pictures = order["pictures"].as_array().unwrap();
    assert_eq!(pictures.len(), 2);
    for picture in pictures {
        assert!(blobs.contains(picture.as_str().unwrap()));
    }
}

#[tokio::test]
async fn test_too_many_images_is_rejected_before_allocation() {
    let (app, db, blobs) = setup_inventory_app().await;
    let images = [("a.png", "image/png"); 6];

    let (status, body) = create_order(&app, "tech-1", &order_data("Annex"), &images).await;

    assert_eq!(status, StatusCode::BAD_REQUEST, "{body:?}");
    assert_eq!(body["success"], false);
    assert_eq!(counter_value(&db).await, None);
    assert!(blobs.is_empty());
}

#[tokio::test]
async fn test_invalid_order_is_rejected_before_allocation() {
    let (app, db, _blobs) = setup_inventory_app().await;

    let (status, _) = create_order(&app, "tech-1", &order_data("   "), &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = create_order(&app, "tech-1", &order_data("Annex"), &[("notes.txt", "text/plain")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(counter_value(&db).await, None);
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let (app, _db, _blobs) = setup_inventory_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/workorders")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_concurrent_creates_get_distinct_ids() {
    let (app, _db, _blobs) = setup_inventory_app().await;
    let data = order_data("Library");

    let results = futures::future::join_all(
        (0..10).map(|i| {
            let app = app.clone();
            let data = data.clone();
            async move { create_order(&app, &format!("tech-{i}"), &data, &[]).await }
        }),
    )
    .await;

    let ids: HashSet<String> = results
        .into_iter()
        .map(|(status, body)| {
            assert_eq!(status, StatusCode::CREATED, "{body:?}");
            body["data"]["uniqueId"].as_str().unwrap().to_string()
        })
        .collect();
    let expected: HashSet<String> = (1..=10).map(|n| format!("{n:04}")).collect();
    assert_eq!(ids, expected);
}

struct FailingBlobStore;

#[async_trait]
impl BlobStore for FailingBlobStore {
    async fn put(&self, _key: &str, _bytes: Vec<u8>, _content_type: &str) -> Result<String, String> {
        Err("bucket unavailable".to_string())
    }

    async fn delete(&self, _url: &str) -> Result<(), String> {
        Ok(())
    }
}

#[tokio::test]
async fn test_failed_upload_leaves_a_gap() {
    let db = setup_inventory_db().await;
    let failing = build_inventory_router(&inventory_state(&db, Arc::new(FailingBlobStore)));

    let (status, body) = create_order(
        &failing,
        "tech-1",
        &order_data("Gym"),
        &[("a.png", "image/png")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY, "{body:?}");
    assert_eq!(counter_value(&db).await, Some(1));

    let working = build_inventory_router(&inventory_state(
        &db,
        Arc::new(MemoryBlobStore::default()),
    ));
    let (status, body) = create_order(&working, "tech-1", &order_data("Gym"), &[]).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["uniqueId"], "0002");
}

#[tokio::test]
async fn test_failed_insert_leaves_a_gap_and_removes_photos() {
    let (app, db, blobs) = setup_inventory_app().await;
    let (status, _) = create_order(&app, "tech-1", &order_data("Gym"), &[]).await;
    assert_eq!(status, StatusCode::CREATED);

    // Rewind the sequence so the next allocation collides with 0001 on insert
    CounterActiveModel {
        id: Set(ORDER_SEQUENCE.to_string()),
        seq: Set(0),
    }
    .update(&db)
    .await
    .unwrap();

    let (status, body) = create_order(
        &app,
        "tech-1",
        &order_data("Gym"),
        &[("a.png", "image/png"), ("b.png", "image/png")],
    )
    .await;
    assert_ne!(status, StatusCode::CREATED, "{body:?}");
    assert_eq!(body["success"], false);
    assert_eq!(counter_value(&db).await, Some(1));
    assert!(blobs.is_empty());

    let (status, body) = create_order(&app, "tech-1", &order_data("Gym"), &[]).await;
    assert_eq!(status, StatusCode::CREATED, "{body:?}");
    assert_eq!(body["data"]["uniqueId"], "0002");

    let (_, body) = send(&app, "GET", "/api/workorders", "tech-1", false, None).await;
    assert_eq!(body["pagination"]["total"], 2);
}

#[tokio::test]
async fn test_technicians_only_see_their_own_orders() {
    let (app, _db, _blobs) = setup_inventory_app().await;
    create_order(&app, "tech-1", &order_data("A"), &[]).await;
    create_order(&app, "tech-1", &order_data("B"), &[]).await;
    create_order(&app, "tech-2", &order_data("C"), &[]).await;

    let (status, body) = send(&app, "GET", "/api/workorders", "tech-1", false, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 2);
    assert!(
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .all(|order| order["userId"] == "tech-1")
    );

    let (_, body) = send(&app, "GET", "/api/workorders?limit=2", "boss", true, None).await;
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["totalPages"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_technician_cannot_file_for_someone_else() {
    let (app, db, _blobs) = setup_inventory_app().await;
    let mut data = order_data("A");
    data["userId"] = json!("tech-2");

    let (status, _) = create_order(&app, "tech-1", &data, &[]).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(counter_value(&db).await, None);
}

#[tokio::test]
async fn test_malformed_requests_use_the_error_body() {
    let (app, _db, _blobs) = setup_inventory_app().await;
    let (_, created) = create_order(&app, "tech-1", &order_data("Gym"), &[]).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let mut update = order_data("Gym");
    update["numberOfEntryPoints"] = json!("two");
    let (status, body) = send(&app, "PUT", &format!("/api/workorders/{id}"), "tech-1", false, Some(update)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = send(&app, "GET", "/api/workorders/search?dateOfSurvey=yesterday", "tech-1", false, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = send(&app, "GET", "/api/workorders/not-a-uuid", "tech-1", false, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_update_keeps_identity_fields() {
    let (app, _db, _blobs) = setup_inventory_app().await;
    let (_, created) = create_order(&app, "tech-1", &order_data("Old Hall"), &[("a.png", "image/png")]).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/workorders/{id}");

    let mut update = order_data("New Hall");
    update["uniqueId"] = json!("9999");
    update["userId"] = json!("someone-else");

    let (status, _) = send(&app, "PUT", &uri, "tech-2", false, Some(update.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "PUT", &uri, "tech-1", false, Some(update)).await;
    assert_eq!(status, StatusCode::OK, "{body:?}");
    assert_eq!(body["data"]["building"], "New Hall");
    assert_eq!(body["data"]["uniqueId"], "0001");
    assert_eq!(body["data"]["userId"], "tech-1");
    assert_eq!(body["data"]["pictures"], created["data"]["pictures"]);
}

#[tokio::test]
async fn test_delete_removes_photos_and_ids_are_not_reused() {
    let (app, _db, blobs) = setup_inventory_app().await;
    let (_, created) = create_order(&app, "tech-1", &order_data("A"), &[("a.png", "image/png")]).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(blobs.len(), 1);

    let (status, _) = send(&app, "DELETE", &format!("/api/workorders/{id}"), "tech-1", false, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(blobs.is_empty());

    let (status, _) = send(&app, "GET", &format!("/api/workorders/{id}"), "tech-1", false, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, next) = create_order(&app, "tech-1", &order_data("B"), &[]).await;
    assert_eq!(next["data"]["uniqueId"], "0002");
}

#[tokio::test]
async fn test_get_unknown_order_is_not_found() {
    let (app, _db, _blobs) = setup_inventory_app().await;
    let uri = format!("/api/workorders/{}", Uuid::new_v4());

    let (status, body) = send(&app, "GET", &uri, "boss", true, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "RESOURCE_NOT_FOUND");
}

#[tokio::test]
async fn test_search_orders() {
    let (app, _db, _blobs) = setup_inventory_app().await;
    create_order(&app, "tech-1", &order_data("Science Hall"), &[]).await;
    let mut other = order_data("Gymnasium");
    other["dateOfSurvey"] = json!("2026-03-15T16:30:00Z");
    create_order(&app, "tech-1", &other, &[]).await;
    create_order(&app, "tech-2", &order_data("Science Annex"), &[]).await;

    let (status, body) = send(&app, "GET", "/api/workorders/search?building=SCIENCE", "boss", true, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = send(&app, "GET", "/api/workorders/search?building=science", "tech-1", false, None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = send(&app, "GET", "/api/workorders/search?uniqueId=0002", "boss", true, None).await;
    assert_eq!(body["data"][0]["building"], "Gymnasium");

    let (_, body) = send(&app, "GET", "/api/workorders/search?dateOfSurvey=2026-03-15", "boss", true, None).await;
    let found = body["data"].as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["uniqueId"], "0002");

    let (_, body) = send(&app, "GET", "/api/workorders/search?building=%25", "boss", true, None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_orders_for_location_counts_per_user() {
    let (app, _db, _blobs) = setup_inventory_app().await;
    let location_id = Uuid::new_v4();
    let mut data = order_data("A");
    data["locationId"] = json!(location_id);
    create_order(&app, "tech-1", &data, &[]).await;
    create_order(&app, "tech-1", &data, &[]).await;
    create_order(&app, "tech-2", &data, &[]).await;
    create_order(&app, "tech-1", &order_data("Elsewhere"), &[]).await;

    let uri = format!("/api/workorders/location/{location_id}");
    let (status, body) = send(&app, "GET", &uri, "boss", true, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 3);

    let (_, body) = send(&app, "GET", &format!("{uri}?userId=tech-1"), "boss", true, None).await;
    assert_eq!(body["count"], 2);

    // Technicians are narrowed to their own orders whatever they ask for
    let (_, body) = send(&app, "GET", &format!("{uri}?userId=tech-1"), "tech-2", false, None).await;
    assert_eq!(body["count"], 0);
}

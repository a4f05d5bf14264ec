use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use relation_sync::api::routes::create_router;
use relation_sync::{ExtraRegistry, MemoryStore, NewContentItem, RelationshipReconciler};

const EXTRA_ID: &str = "ramp-posts-to-posts-data-sync";

fn app(store: Arc<MemoryStore>) -> Router {
    let mut registry = ExtraRegistry::new();
    registry
        .register(Arc::new(RelationshipReconciler::new(store)))
        .unwrap();
    create_router().with_state(Arc::new(registry))
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1_000_000)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn seeded() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let a = store.insert_content(NewContentItem::new("post", "A").with_stable_key("guid-a"));
    let b = store.insert_content(NewContentItem::new("page", "B").with_stable_key("guid-b"));
    store.connect("related", a.id, b.id, &[("color", "red")]);
    store
}

#[tokio::test]
async fn test_list_extras() {
    let app = app(seeded());
    let request = Request::builder().uri("/extras").body(Body::empty()).unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), 1_000_000)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["id"], EXTRA_ID);
}

#[tokio::test]
async fn test_unknown_extra_is_not_found() {
    let app = app(seeded());
    let (status, body) = post(&app, "/extras/nope/transfer/send", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("nope"));
}

#[tokio::test]
async fn test_comparison_send_returns_snapshot() {
    let app = app(seeded());
    let (status, body) = post(&app, &format!("/extras/{EXTRA_ID}/comparison/send"), json!({})).await;

    assert_eq!(status, StatusCode::OK);
    let records = body.as_object().unwrap();
    assert_eq!(records.len(), 1);
    let record = records.values().next().unwrap();
    assert_eq!(record["type"], "related");
    assert_eq!(record["meta"]["color"], json!(["red"]));
}

#[tokio::test]
async fn test_transfer_send_without_entry_is_null() {
    let app = app(seeded());
    let (status, body) = post(&app, &format!("/extras/{EXTRA_ID}/transfer/send"), json!({"extras": {}})).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());
}

#[tokio::test]
async fn test_transfer_round_trip_over_http() {
    let staging = app(seeded());

    let production_store = Arc::new(MemoryStore::new());
    production_store.insert_content(NewContentItem::new("post", "A").with_stable_key("guid-a"));
    production_store.insert_content(NewContentItem::new("page", "B").with_stable_key("guid-b"));
    let production = app(production_store.clone());

    let (_, snapshot) = post(&staging, &format!("/extras/{EXTRA_ID}/comparison/send"), json!({})).await;
    let key = snapshot.as_object().unwrap().keys().next().unwrap().clone();
    let mut extras = serde_json::Map::new();
    extras.insert(EXTRA_ID.to_string(), json!([{"kind": "bare_key", "value": key}]));
    let batch = json!({ "extras": extras });

    let (status, row) = post(
        &staging,
        &format!("/extras/{EXTRA_ID}/comparison/row"),
        json!({"status": snapshot[&key], "in_batch": true}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(row["action"], "create");
    assert_eq!(row["selected"], true);

    let (_, selection) = post(&staging, &format!("/extras/{EXTRA_ID}/preflight/send"), batch.clone()).await;
    let (status, report) = post(
        &production,
        &format!("/extras/{EXTRA_ID}/preflight/check"),
        json!({"data": selection, "batch": batch}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["errors"], json!([]));

    let (_, selection) = post(&staging, &format!("/extras/{EXTRA_ID}/transfer/send"), batch).await;
    let (status, outcome) = post(&production, &format!("/extras/{EXTRA_ID}/transfer/receive"), selection).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["success"], true);
    assert_eq!(outcome["any_applied"], true);
    assert_eq!(production_store.all_connections().len(), 1);
}

#[tokio::test]
async fn test_preflight_display_is_identity() {
    let app = app(seeded());
    let messages = json!({"post_types": {}, "extras": {"x": {"__error__": ["boom"]}}});
    let (status, body) = post(&app, &format!("/extras/{EXTRA_ID}/preflight/display"), messages.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, messages);
}

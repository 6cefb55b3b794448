//! Router tests over the in-process store and index

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use khan_api::create_app;
use khan_api::server::build_state;
use khan_cache::MemoryClanIndex;
use khan_common::AppConfig;
use khan_db::MemoryStore;

async fn app() -> Router {
    let state = build_state(
        AppConfig::default(),
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryClanIndex::new()),
    )
    .await
    .unwrap();
    create_app(state)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn game() -> Value {
    json!({
        "publicID": "g1",
        "name": "Game One",
        "membershipLevels": {"Member": 1, "Elder": 2, "CoLeader": 3},
        "minLevelToAcceptApplication": 2,
        "minLevelToCreateInvitation": 2,
        "minLevelToRemoveMember": 2,
        "minLevelOffsetToRemoveMember": 1,
        "minLevelOffsetToPromoteMember": 1,
        "minLevelOffsetToDemoteMember": 1,
        "maxMembers": 10,
        "maxClansPerPlayer": 3,
        "cooldownAfterDeny": 30,
        "cooldownAfterDelete": 0,
        "cooldownBeforeApply": 0,
        "cooldownBeforeInvite": 0,
    })
}

async fn seeded() -> Router {
    let app = app().await;
    let (status, _) = send(&app, Method::POST, "/games", Some(game())).await;
    assert_eq!(status, StatusCode::OK);
    for player in ["owner", "p2"] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/games/g1/players",
            Some(json!({"publicID": player, "name": player})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = send(
        &app,
        Method::POST,
        "/games/g1/clans",
        Some(json!({
            "publicID": "c1",
            "name": "Clan One",
            "ownerPublicID": "owner",
            "allowApplication": true,
            "autoJoin": false,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    app
}

#[tokio::test]
async fn test_healthcheck_returns_working_text() {
    let app = app().await;
    let request = Request::get("/healthcheck").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"WORKING");
}

#[tokio::test]
async fn test_created_player_is_readable() {
    let app = seeded().await;
    let (status, body) = send(&app, Method::GET, "/games/g1/players/owner", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["publicID"], "owner");
    assert_eq!(body["ownershipCount"], 1);
    assert_eq!(body["clans"]["owned"], json!(["c1"]));
}

#[tokio::test]
async fn test_missing_fields_are_rejected() {
    let app = seeded().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/games/g1/players",
        Some(json!({"publicID": "p3"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["reason"], "name is required");
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let app = seeded().await;
    let request = Request::post("/games/g1/players")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_path_subject_is_404() {
    let app = seeded().await;
    let (status, body) = send(&app, Method::GET, "/games/g1/clans/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["reason"], "Clan was not found with id: nope");

    let (status, _) = send(&app, Method::GET, "/games/g9/clans", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reapply_after_deny_is_a_cooldown_conflict() {
    let app = seeded().await;
    let apply = json!({"level": "Member", "playerPublicID": "p2"});
    let base = "/games/g1/clans/c1/memberships";

    let (status, body) = send(&app, Method::POST, &format!("{base}/application"), Some(apply.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["approved"], false);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("{base}/application/deny"),
        Some(json!({"playerPublicID": "p2", "requestorPublicID": "owner"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::POST, &format!("{base}/application"), Some(apply)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["reason"], "Cooldown");
    assert!(body["secondsLeft"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_clan_search_requires_term() {
    let app = seeded().await;
    let (status, body) = send(&app, Method::GET, "/games/g1/clan-search", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "term is required");
}

#[tokio::test]
async fn test_clan_summaries_by_id_list() {
    let app = seeded().await;
    let (status, body) = send(
        &app,
        Method::GET,
        "/games/g1/clans-summary?clanPublicIds=c1,missing",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let clans = body["clans"].as_array().unwrap();
    assert_eq!(clans.len(), 1);
    assert_eq!(clans[0]["publicID"], "c1");
    assert_eq!(clans[0]["membershipCount"], 1);
}

#[tokio::test]
async fn test_status_reports_worker_counters() {
    let app = seeded().await;
    let (status, body) = send(&app, Method::GET, "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["webhooks"]["enqueued"].is_u64());
    assert!(body["indexQueue"]["enqueued"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let app = app().await;
    let request = Request::get("/status")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-42");
}

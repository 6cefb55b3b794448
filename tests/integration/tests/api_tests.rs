//! End-to-end scenarios over HTTP
//!
//! Each test starts its own server on an ephemeral port with the in-process
//! store and search index; webhook subscribers are a local receiver.
//!
//! Run with: cargo test -p integration-tests --test api_tests

use std::sync::Arc;

use integration_tests::{
    assert_json, assert_status, game_payload, with_fields, HookReceiver, TestServer,
};
use khan_core::{now_ms, EventType, ManualClock};
use khan_service::{PruneService, ServiceContextBuilder};
use reqwest::StatusCode;
use serde_json::{json, Value};

const GAME: &str = "g1";

async fn server_with_game(game: Value) -> TestServer {
    let server = TestServer::start().await.expect("Failed to start server");
    server.create_game(&game).await.expect("create game");
    server
}

fn memberships(clan: &str) -> String {
    format!("/games/{GAME}/clans/{clan}/memberships")
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_healthcheck() {
    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/healthcheck").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "WORKING");
}

// ============================================================================
// Membership flows
// ============================================================================

#[tokio::test]
async fn test_create_and_auto_join() {
    let server = server_with_game(game_payload(GAME)).await;
    server.create_clan(GAME, "c1", "p1", true).await.unwrap();
    server.create_player(GAME, "p2").await.unwrap();

    let response = server
        .post(
            &format!("{}/application", memberships("c1")),
            &json!({"level": "Member", "playerPublicID": "p2"}),
        )
        .await
        .unwrap();
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body, json!({"success": true, "approved": true}));

    let summary = server.clan_summary(GAME, "c1").await.unwrap();
    assert_eq!(summary["membershipCount"], 2);
}

#[tokio::test]
async fn test_invite_and_approve() {
    let server = server_with_game(game_payload(GAME)).await;
    server.create_clan(GAME, "c1", "p1", true).await.unwrap();
    server.add_member(GAME, "c1", "p1", "p2", "Member").await.unwrap();
    server.create_player(GAME, "p3").await.unwrap();

    let response = server
        .post(
            &format!("{}/invitation", memberships("c1")),
            &json!({"level": "Member", "playerPublicID": "p3", "requestorPublicID": "p1"}),
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let response = server
        .post(
            &format!("{}/invitation/approve", memberships("c1")),
            &json!({"playerPublicID": "p3"}),
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let summary = server.clan_summary(GAME, "c1").await.unwrap();
    assert_eq!(summary["membershipCount"], 3);

    let response = server.get(&format!("/games/{GAME}/players/p3")).await.unwrap();
    let player: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(player["membershipCount"], 1);
    assert_eq!(player["clans"]["approved"], json!(["c1"]));
}

#[tokio::test]
async fn test_cooldown_after_deny() {
    let server = server_with_game(game_payload(GAME)).await;
    server.create_clan(GAME, "c1", "p1", false).await.unwrap();
    server.create_player(GAME, "p4").await.unwrap();
    let application = json!({"level": "Member", "playerPublicID": "p4"});

    let response = server
        .post(&format!("{}/application", memberships("c1")), &application)
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let response = server
        .post(
            &format!("{}/application/deny", memberships("c1")),
            &json!({"playerPublicID": "p4", "requestorPublicID": "p1"}),
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let response = server
        .post(&format!("{}/application", memberships("c1")), &application)
        .await
        .unwrap();
    let body: Value = assert_json(response, StatusCode::CONFLICT).await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["reason"], "Cooldown");
    let seconds_left = body["secondsLeft"].as_i64().unwrap();
    assert!(seconds_left > 0 && seconds_left <= 30);
}

// ============================================================================
// Ownership
// ============================================================================

#[tokio::test]
async fn test_owner_leaves_with_succession() {
    let server = server_with_game(game_payload(GAME)).await;
    let receiver = HookReceiver::start().await.unwrap();
    server
        .create_hook(
            GAME,
            EventType::ClanOwnershipTransferred.code(),
            &receiver.url(),
        )
        .await
        .unwrap();
    server.create_clan(GAME, "c1", "p1", false).await.unwrap();
    server.add_member(GAME, "c1", "p1", "p2", "Elder").await.unwrap();

    let response = server
        .post_empty(&format!("/games/{GAME}/clans/c1/leave"))
        .await
        .unwrap();
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["isDeleted"], false);
    assert_eq!(body["newOwner"]["publicID"], "p2");

    let response = server.get(&format!("/games/{GAME}/clans/c1")).await.unwrap();
    let clan: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(clan["owner"]["publicID"], "p2");
    assert_eq!(clan["membershipCount"], 1);

    server.settle().await;
    let events = receiver.of_type(i64::from(EventType::ClanOwnershipTransferred.code()));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["newOwner"]["publicID"], "p2");
    assert_eq!(events[0]["previousOwner"]["publicID"], "p1");
    assert_eq!(events[0]["gameID"], GAME);
}

#[tokio::test]
async fn test_sole_owner_leaving_deletes_the_clan() {
    let server = server_with_game(game_payload(GAME)).await;
    let receiver = HookReceiver::start().await.unwrap();
    server
        .create_hook(GAME, EventType::ClanLeft.code(), &receiver.url())
        .await
        .unwrap();
    server.create_clan(GAME, "c1", "p1", false).await.unwrap();

    let response = server
        .post_empty(&format!("/games/{GAME}/clans/c1/leave"))
        .await
        .unwrap();
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["isDeleted"], true);

    let response = server.get(&format!("/games/{GAME}/clans/c1")).await.unwrap();
    let body: Value = assert_json(response, StatusCode::NOT_FOUND).await.unwrap();
    assert_eq!(body["reason"], "Clan was not found with id: c1");

    server.settle().await;
    let events = receiver.of_type(i64::from(EventType::ClanLeft.code()));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["isDeleted"], true);
    assert_eq!(events[0]["newOwner"], Value::Null);
    assert_eq!(server.index.len(GAME), 0);
}

// ============================================================================
// Webhooks
// ============================================================================

#[tokio::test]
async fn test_whitelist_gated_clan_update() {
    let game = with_fields(game_payload(GAME), json!({"clanHookFieldsWhitelist": "tier"}));
    let server = server_with_game(game).await;
    let receiver = HookReceiver::start().await.unwrap();
    server
        .create_hook(GAME, EventType::ClanUpdated.code(), &receiver.url())
        .await
        .unwrap();
    server.create_clan(GAME, "c1", "p1", false).await.unwrap();

    let update = |metadata: Value| {
        json!({
            "name": "Clan c1",
            "ownerPublicID": "p1",
            "metadata": metadata,
            "allowApplication": true,
            "autoJoin": false,
        })
    };

    let response = server
        .put(&format!("/games/{GAME}/clans/c1"), &update(json!({"other": "x"})))
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
    server.settle().await;
    assert_eq!(receiver.count(), 0);

    let response = server
        .put(&format!("/games/{GAME}/clans/c1"), &update(json!({"tier": "gold"})))
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
    server.settle().await;

    let events = receiver.of_type(i64::from(EventType::ClanUpdated.code()));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["clan"]["metadata"]["tier"], "gold");
}

#[tokio::test]
async fn test_hook_registration_is_idempotent() {
    let server = server_with_game(game_payload(GAME)).await;
    let code = EventType::ClanCreated.code();

    let first = server
        .create_hook(GAME, code, "http://localhost:1/hook")
        .await
        .unwrap();
    let second = server
        .create_hook(GAME, code, "http://localhost:1/hook")
        .await
        .unwrap();
    assert_eq!(first, second);

    let response = server
        .delete(&format!("/games/{GAME}/hooks/{first}"))
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let response = server
        .delete(&format!("/games/{GAME}/hooks/{first}"))
        .await
        .unwrap();
    assert_status(response, StatusCode::NOT_FOUND).await.unwrap();
}

// ============================================================================
// Pruning
// ============================================================================

#[tokio::test]
async fn test_prune_stale_applications() {
    let game = with_fields(
        game_payload(GAME),
        json!({"metadata": {
            "pendingApplicationsExpiration": 3600,
            "pendingInvitesExpiration": 3600,
            "deniedMembershipsExpiration": 3600,
            "deletedMembershipsExpiration": 3600,
        }}),
    );
    let server = server_with_game(game).await;
    server.create_clan(GAME, "c1", "p1", false).await.unwrap();
    for player in ["a1", "a2", "a3"] {
        server.create_player(GAME, player).await.unwrap();
        let response = server
            .post(
                &format!("{}/application", memberships("c1")),
                &json!({"level": "Member", "playerPublicID": player}),
            )
            .await
            .unwrap();
        assert_status(response, StatusCode::OK).await.unwrap();
    }

    let dispatcher = server.state.dispatcher().expect("dispatcher").clone();
    let later = ServiceContextBuilder::new()
        .store(server.store.clone())
        .index_queue(server.state.service_context().index_queue().clone())
        .events(dispatcher)
        .clock(Arc::new(ManualClock::new(now_ms() + 2 * 3600 * 1000)))
        .build()
        .unwrap();
    let pruner = PruneService::new(&later);

    let results = pruner.run_all().await.unwrap();
    assert_eq!(results.len(), 1);
    let body = serde_json::to_value(&results[0]).unwrap();
    assert_eq!(body["gameID"], GAME);
    assert_eq!(body["pendingApplicationsPruned"], 3);
    assert_eq!(body["deniedMembershipsPruned"], 0);

    let again = pruner.run_all().await.unwrap();
    assert_eq!(again[0].counts.total(), 0);

    let response = server.get(&format!("/games/{GAME}/clans/c1")).await.unwrap();
    let clan: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(clan["roster"]["pendingApplications"], json!([]));
}

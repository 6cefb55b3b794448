//! Service-level tests over the in-memory store
//!
//! Run with: cargo test -p khan-service --test service_tests

mod common;

use serde_json::json;

use common::{action, apply, game_json, invite, Harness, GAME};
use khan_core::traits::{HookRepository, Isolation, Store};
use khan_core::{CooldownKind, EventType, MembershipState, PolicyError};
use khan_service::dto::{
    CreateHookRequest, InvitationReplyRequest, TransferOwnershipRequest, UpdateClanRequest,
    UpdatePlayerRequest,
};
use khan_service::{
    ClanService, HookService, MembershipService, PlayerService, PruneService, ServiceError,
};

fn policy(err: &ServiceError) -> Option<PolicyError> {
    err.policy().cloned()
}

// ============================================================================
// Applications and invitations
// ============================================================================

#[tokio::test]
async fn test_auto_join_application_is_approved() {
    let h = Harness::new().await;
    h.clan("c1", "p1", true).await;
    h.player("p2").await;
    h.events.clear();

    let response = MembershipService::new(&h.ctx)
        .apply_for_membership(GAME, "c1", apply("p2", "Member"))
        .await
        .unwrap();

    assert!(response.approved);
    assert_eq!(h.stored_clan("c1").await.unwrap().membership_count, 2);
    assert_eq!(
        h.events.types(),
        vec![
            EventType::MembershipApplicationCreated,
            EventType::MembershipApproved
        ]
    );
    h.assert_counters(&["p1", "p2"]).await;
}

#[tokio::test]
async fn test_application_waits_for_approval() {
    let h = Harness::new().await;
    h.clan("c1", "p1", false).await;
    h.player("p2").await;
    let memberships = MembershipService::new(&h.ctx);

    let response = memberships
        .apply_for_membership(GAME, "c1", apply("p2", "Member"))
        .await
        .unwrap();
    assert!(!response.approved);
    assert_eq!(h.stored_clan("c1").await.unwrap().membership_count, 1);

    memberships
        .approve_application(GAME, "c1", action("p2", "p1"))
        .await
        .unwrap();
    let membership = h.stored_membership("c1", "p2").await.unwrap();
    assert_eq!(membership.state(), MembershipState::Approved);
    assert_eq!(h.stored_clan("c1").await.unwrap().membership_count, 2);
    h.assert_counters(&["p1", "p2"]).await;
}

#[tokio::test]
async fn test_invite_then_accept() {
    let h = Harness::new().await;
    h.clan("c1", "p1", false).await;
    h.player("p3").await;
    let memberships = MembershipService::new(&h.ctx);

    memberships
        .invite_for_membership(GAME, "c1", invite("p3", "p1"))
        .await
        .unwrap();
    assert_eq!(
        h.stored_membership("c1", "p3").await.unwrap().state(),
        MembershipState::PendingInvite
    );

    memberships
        .approve_invitation(
            GAME,
            "c1",
            InvitationReplyRequest {
                player_public_id: Some("p3".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(h.stored_clan("c1").await.unwrap().membership_count, 2);
    let approved = h.events.of(EventType::MembershipApproved);
    assert_eq!(approved.len(), 1);
    assert_eq!(approved[0].player_field("requestor"), Some("p1"));
    assert_eq!(approved[0].player_field("approver"), Some("p3"));
    h.assert_counters(&["p1", "p3"]).await;
}

#[tokio::test]
async fn test_invitee_alone_answers_invitation() {
    let h = Harness::new().await;
    h.clan("c1", "p1", false).await;
    h.player("p3").await;
    let memberships = MembershipService::new(&h.ctx);
    memberships
        .invite_for_membership(GAME, "c1", invite("p3", "p1"))
        .await
        .unwrap();

    let err = memberships
        .approve_application(GAME, "c1", action("p3", "p1"))
        .await
        .unwrap_err();
    assert_eq!(policy(&err), Some(PolicyError::NotAuthorized));
    assert_eq!(err.status_code(), 409);
}

#[tokio::test]
async fn test_low_level_member_cannot_invite() {
    let h = Harness::new().await;
    h.clan("c1", "p1", false).await;
    h.member("c1", "p1", "p2", "Member").await;
    h.player("p3").await;

    let err = MembershipService::new(&h.ctx)
        .invite_for_membership(GAME, "c1", invite("p3", "p2"))
        .await
        .unwrap_err();
    assert_eq!(policy(&err), Some(PolicyError::LevelTooLow));
}

#[tokio::test]
async fn test_pending_invite_cap() {
    let mut game = game_json();
    game["maxPendingInvites"] = json!(1);
    let h = Harness::with_game(game).await;
    h.clan("c1", "p1", false).await;
    h.player("p2").await;
    h.player("p3").await;
    let memberships = MembershipService::new(&h.ctx);

    memberships
        .invite_for_membership(GAME, "c1", invite("p2", "p1"))
        .await
        .unwrap();
    // refreshing the same invite does not count against the cap
    memberships
        .invite_for_membership(GAME, "c1", invite("p2", "p1"))
        .await
        .unwrap();
    let err = memberships
        .invite_for_membership(GAME, "c1", invite("p3", "p1"))
        .await
        .unwrap_err();
    assert_eq!(policy(&err), Some(PolicyError::MaxPendingInvites));
}

#[tokio::test]
async fn test_cooldown_after_deny() {
    let h = Harness::new().await;
    h.clan("c1", "p1", false).await;
    h.player("p4").await;
    let memberships = MembershipService::new(&h.ctx);

    memberships
        .apply_for_membership(GAME, "c1", apply("p4", "Member"))
        .await
        .unwrap();
    memberships
        .deny_application(GAME, "c1", action("p4", "p1"))
        .await
        .unwrap();

    let err = memberships
        .apply_for_membership(GAME, "c1", apply("p4", "Member"))
        .await
        .unwrap_err();
    assert_eq!(
        policy(&err),
        Some(PolicyError::Cooldown {
            kind: CooldownKind::AfterDeny,
            seconds_left: 30
        })
    );
    assert_eq!(err.status_code(), 409);

    h.clock.advance_secs(31);
    memberships
        .apply_for_membership(GAME, "c1", apply("p4", "Member"))
        .await
        .unwrap();

    // the denied row was recycled rather than duplicated
    let membership = h.stored_membership("c1", "p4").await.unwrap();
    assert_eq!(membership.state(), MembershipState::PendingApplication);
    assert_eq!(membership.denied_at, 0);
}

#[tokio::test]
async fn test_apply_rejects_unknown_level() {
    let h = Harness::new().await;
    h.clan("c1", "p1", false).await;
    h.player("p2").await;

    let err = MembershipService::new(&h.ctx)
        .apply_for_membership(GAME, "c1", apply("p2", "King"))
        .await
        .unwrap_err();
    assert_eq!(policy(&err).map(|e| e.name()), Some("InvalidLevel"));
}

#[tokio::test]
async fn test_max_clans_per_player() {
    let mut game = game_json();
    game["maxClansPerPlayer"] = json!(1);
    let h = Harness::with_game(game).await;
    h.clan("c1", "p1", true).await;
    h.clan("c2", "p9", true).await;
    h.player("p2").await;
    let memberships = MembershipService::new(&h.ctx);

    memberships
        .apply_for_membership(GAME, "c1", apply("p2", "Member"))
        .await
        .unwrap();
    let err = memberships
        .apply_for_membership(GAME, "c2", apply("p2", "Member"))
        .await
        .unwrap_err();
    assert_eq!(policy(&err), Some(PolicyError::MaxClans));
}

// ============================================================================
// Level changes and removal
// ============================================================================

#[tokio::test]
async fn test_promote_and_demote_return_new_level() {
    let h = Harness::new().await;
    h.clan("c1", "p1", false).await;
    h.member("c1", "p1", "p2", "Member").await;
    let memberships = MembershipService::new(&h.ctx);

    let promoted = memberships
        .promote_member(GAME, "c1", action("p2", "p1"))
        .await
        .unwrap();
    assert_eq!(promoted.level, "Elder");

    let demoted = memberships
        .demote_member(GAME, "c1", action("p2", "p1"))
        .await
        .unwrap();
    assert_eq!(demoted.level, "Member");
    assert_eq!(h.stored_membership("c1", "p2").await.unwrap().level, "Member");

    let err = memberships
        .demote_member(GAME, "c1", action("p2", "p1"))
        .await
        .unwrap_err();
    assert_eq!(policy(&err).map(|e| e.name()), Some("InvalidLevel"));
}

#[tokio::test]
async fn test_member_leaves_and_kick_rules() {
    let h = Harness::new().await;
    h.clan("c1", "p1", false).await;
    h.member("c1", "p1", "p2", "Member").await;
    h.member("c1", "p1", "p3", "Member").await;
    let memberships = MembershipService::new(&h.ctx);

    let err = memberships
        .delete_membership(GAME, "c1", action("p3", "p2"))
        .await
        .unwrap_err();
    assert_eq!(policy(&err), Some(PolicyError::LevelTooLow));

    memberships
        .delete_membership(GAME, "c1", action("p2", "p2"))
        .await
        .unwrap();
    assert_eq!(
        h.stored_membership("c1", "p2").await.unwrap().state(),
        MembershipState::Deleted
    );
    assert_eq!(h.stored_clan("c1").await.unwrap().membership_count, 2);
    assert_eq!(h.events.of(EventType::MembershipLeft).len(), 1);
    h.assert_counters(&["p1", "p2", "p3"]).await;
}

// ============================================================================
// Clan ownership
// ============================================================================

#[tokio::test]
async fn test_owner_leave_passes_ownership() {
    let h = Harness::new().await;
    h.clan("c1", "p1", false).await;
    h.member("c1", "p1", "p2", "Member").await;
    h.member("c1", "p1", "p3", "Member").await;
    MembershipService::new(&h.ctx)
        .promote_member(GAME, "c1", action("p3", "p1"))
        .await
        .unwrap();
    h.events.clear();

    let response = ClanService::new(&h.ctx).leave_clan(GAME, "c1").await.unwrap();

    assert!(!response.is_deleted);
    assert_eq!(response.new_owner.unwrap().public_id, "p3");
    let clan = h.stored_clan("c1").await.unwrap();
    assert_eq!(clan.owner_id, h.stored_player("p3").await.id);
    assert_eq!(clan.membership_count, 2);
    assert_eq!(
        h.events.types(),
        vec![EventType::ClanLeft, EventType::ClanOwnershipTransferred]
    );
    let transferred = &h.events.of(EventType::ClanOwnershipTransferred)[0];
    assert_eq!(transferred.player_field("newOwner"), Some("p3"));
    h.assert_counters(&["p1", "p2", "p3"]).await;
}

#[tokio::test]
async fn test_sole_owner_leave_deletes_clan() {
    let h = Harness::new().await;
    h.clan("c1", "p1", false).await;
    h.player("p2").await;
    MembershipService::new(&h.ctx)
        .apply_for_membership(GAME, "c1", apply("p2", "Member"))
        .await
        .unwrap();
    h.queue.wait().await;
    assert_eq!(h.index.len(GAME), 1);

    let response = ClanService::new(&h.ctx).leave_clan(GAME, "c1").await.unwrap();
    assert!(response.is_deleted);
    assert!(response.new_owner.is_none());

    let err = ClanService::new(&h.ctx).get_clan(GAME, "c1").await.unwrap_err();
    assert_eq!(err.status_code(), 404);

    let left = h.events.of(EventType::ClanLeft);
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].payload["isDeleted"], json!(true));
    assert!(left[0].payload["newOwner"].is_null());

    h.queue.wait().await;
    assert_eq!(h.index.len(GAME), 0);
    h.assert_counters(&["p1", "p2"]).await;
}

#[tokio::test]
async fn test_transfer_ownership() {
    let h = Harness::new().await;
    h.clan("c1", "p1", false).await;
    h.member("c1", "p1", "p2", "Member").await;

    let response = ClanService::new(&h.ctx)
        .transfer_ownership(
            GAME,
            "c1",
            TransferOwnershipRequest {
                player_public_id: Some("p2".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(response.new_owner.public_id, "p2");

    let previous = h.stored_membership("c1", "p1").await.unwrap();
    assert!(previous.is_approved());
    assert_eq!(previous.level, "CoLeader");
    assert_eq!(
        h.stored_membership("c1", "p2").await.unwrap().state(),
        MembershipState::Deleted
    );
    assert_eq!(h.stored_clan("c1").await.unwrap().membership_count, 2);
    h.assert_counters(&["p1", "p2"]).await;
}

#[tokio::test]
async fn test_transfer_requires_approved_member() {
    let h = Harness::new().await;
    h.clan("c1", "p1", false).await;
    h.player("p2").await;
    MembershipService::new(&h.ctx)
        .apply_for_membership(GAME, "c1", apply("p2", "Member"))
        .await
        .unwrap();

    let err = ClanService::new(&h.ctx)
        .transfer_ownership(
            GAME,
            "c1",
            TransferOwnershipRequest {
                player_public_id: Some("p2".to_string()),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(policy(&err), Some(PolicyError::NotAuthorized));
}

// ============================================================================
// Updates and whitelists
// ============================================================================

fn update(owner: &str, metadata: serde_json::Value) -> UpdateClanRequest {
    UpdateClanRequest {
        name: Some("Clan c1".to_string()),
        owner_public_id: Some(owner.to_string()),
        metadata: metadata.as_object().cloned().unwrap_or_default(),
        allow_application: Some(true),
        auto_join: Some(false),
    }
}

#[tokio::test]
async fn test_clan_update_whitelist() {
    let mut game = game_json();
    game["clanHookFieldsWhitelist"] = json!("tier");
    let h = Harness::with_game(game).await;
    h.clan("c1", "p1", false).await;
    let clans = ClanService::new(&h.ctx);

    clans
        .update_clan(GAME, "c1", update("p1", json!({"other": "x"})))
        .await
        .unwrap();
    assert!(h.events.of(EventType::ClanUpdated).is_empty());

    clans
        .update_clan(GAME, "c1", update("p1", json!({"other": "x", "tier": "gold"})))
        .await
        .unwrap();
    assert_eq!(h.events.of(EventType::ClanUpdated).len(), 1);
}

#[tokio::test]
async fn test_clan_update_requires_owner() {
    let h = Harness::new().await;
    h.clan("c1", "p1", false).await;
    h.player("p2").await;

    let err = ClanService::new(&h.ctx)
        .update_clan(GAME, "c1", update("p2", json!({})))
        .await
        .unwrap_err();
    assert_eq!(policy(&err), Some(PolicyError::NotAuthorized));
}

#[tokio::test]
async fn test_player_upsert_creates_then_updates() {
    let h = Harness::new().await;
    let players = PlayerService::new(&h.ctx);
    let request = |name: &str| UpdatePlayerRequest {
        name: Some(name.to_string()),
        metadata: Default::default(),
    };

    players.upsert_player(GAME, "p1", request("A")).await.unwrap();
    players.upsert_player(GAME, "p1", request("B")).await.unwrap();

    assert_eq!(
        h.events.types(),
        vec![EventType::PlayerCreated, EventType::PlayerUpdated]
    );
    assert_eq!(h.stored_player("p1").await.name, "B");
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn test_player_view_digest() {
    let h = Harness::new().await;
    h.clan("c1", "p1", false).await;
    h.clan("c2", "p9", false).await;
    h.member("c1", "p1", "p2", "Member").await;
    MembershipService::new(&h.ctx)
        .invite_for_membership(GAME, "c2", invite("p2", "p9"))
        .await
        .unwrap();

    let view = PlayerService::new(&h.ctx).get_player(GAME, "p2").await.unwrap();
    assert_eq!(view.clans.approved, vec!["c1".to_string()]);
    assert_eq!(view.clans.pending_invites, vec!["c2".to_string()]);
    assert!(view.clans.owned.is_empty());
    assert_eq!(view.memberships.len(), 2);
    assert_eq!(view.player.membership_count, 1);
}

#[tokio::test]
async fn test_summaries_are_cached() {
    let h = Harness::new().await;
    h.clan("c1", "p1", false).await;
    h.clan("c2", "p2", false).await;
    let clans = ClanService::new(&h.ctx);
    let ids = vec!["c2".to_string(), "c1".to_string(), "missing".to_string()];

    let first = clans.get_clan_summaries(GAME, &ids).await.unwrap();
    assert_eq!(first.clans.len(), 2);

    clans
        .update_clan(GAME, "c1", update("p1", json!({"renamed": true})))
        .await
        .unwrap();
    let reordered = vec!["c1".to_string(), "missing".to_string(), "c2".to_string()];
    let second = clans.get_clan_summaries(GAME, &reordered).await.unwrap();
    let c1 = second.clans.iter().find(|c| c.public_id == "c1").unwrap();
    assert!(c1.metadata.is_empty());
}

#[tokio::test]
async fn test_search_after_index_catches_up() {
    let h = Harness::new().await;
    h.clan("c1", "p1", false).await;
    h.queue.wait().await;

    let found = ClanService::new(&h.ctx).search_clans(GAME, "cla").await.unwrap();
    assert_eq!(found.clans.len(), 1);
    assert_eq!(found.clans[0].public_id, "c1");
}

// ============================================================================
// Error mapping
// ============================================================================

#[tokio::test]
async fn test_not_found_status_depends_on_subject() {
    let h = Harness::new().await;
    h.clan("c1", "p1", false).await;

    let err = ClanService::new(&h.ctx)
        .get_clan_summary(GAME, "nope")
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 404);

    let err = MembershipService::new(&h.ctx)
        .apply_for_membership(GAME, "c1", apply("ghost", "Member"))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 500);
    assert_eq!(err.to_string(), "Player was not found with id: ghost");

    let err = PlayerService::new(&h.ctx)
        .get_player("missing-game", "p1")
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn test_failed_transition_emits_nothing() {
    let h = Harness::new().await;
    h.clan("c1", "p1", false).await;
    h.events.clear();

    let _ = ClanService::new(&h.ctx)
        .update_clan(GAME, "c1", update("someone-else", json!({})))
        .await
        .unwrap_err();
    assert!(h.events.all().is_empty());
}

// ============================================================================
// Hooks and pruning
// ============================================================================

#[tokio::test]
async fn test_duplicate_hook_returns_existing() {
    let h = Harness::new().await;
    let hooks = HookService::new(&h.ctx);
    let request = || CreateHookRequest {
        event_type: Some(EventType::ClanCreated.code()),
        hook_url: Some("http://localhost:9999/clan".to_string()),
    };

    let first = hooks.create_hook(GAME, request()).await.unwrap();
    let second = hooks.create_hook(GAME, request()).await.unwrap();
    assert_eq!(first.public_id, second.public_id);

    hooks.delete_hook(GAME, &first.public_id).await.unwrap();
    let err = hooks.delete_hook(GAME, &first.public_id).await.unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn test_concurrent_hook_registrations_share_one_hook() {
    let h = Harness::new().await;
    let hooks = HookService::new(&h.ctx);
    let request = || CreateHookRequest {
        event_type: Some(EventType::ClanUpdated.code()),
        hook_url: Some("https://hooks.example.com/clan".to_string()),
    };

    let (first, second) = tokio::join!(
        hooks.create_hook(GAME, request()),
        hooks.create_hook(GAME, request())
    );
    assert_eq!(first.unwrap().public_id, second.unwrap().public_id);

    let mut tx = h.store.begin(Isolation::ReadCommitted).await.unwrap();
    assert_eq!(tx.game_hooks(GAME).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_hook_rejects_unknown_type() {
    let h = Harness::new().await;
    let err = HookService::new(&h.ctx)
        .create_hook(
            GAME,
            CreateHookRequest {
                event_type: Some(99),
                hook_url: Some("http://localhost/x".to_string()),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_prune_is_idempotent() {
    let mut game = game_json();
    game["metadata"] = json!({
        "pendingApplicationsExpiration": 3600,
        "pendingInvitesExpiration": 3600,
        "deniedMembershipsExpiration": 3600,
        "deletedMembershipsExpiration": 3600,
    });
    let h = Harness::with_game(game).await;
    h.clan("c1", "p1", false).await;
    for player in ["p2", "p3", "p4"] {
        h.player(player).await;
        MembershipService::new(&h.ctx)
            .apply_for_membership(GAME, "c1", apply(player, "Member"))
            .await
            .unwrap();
    }
    h.clock.advance_secs(2 * 3600);

    let pruner = PruneService::new(&h.ctx);
    let first = pruner.run_all().await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].counts.pending_applications_pruned, 3);

    let second = pruner.run_all().await.unwrap();
    assert_eq!(second[0].counts.total(), 0);
    h.assert_counters(&["p1", "p2", "p3", "p4"]).await;
}

//! Shared harness for service tests: in-memory store and index, a
//! recording event sink, and a manual clock.

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};

use khan_cache::MemoryClanIndex;
use khan_core::traits::{
    ClanRepository, EventSink, Isolation, MembershipRepository, PlayerRepository, Store,
};
use khan_core::{Clan, DomainEvent, EventType, ManualClock, Membership, Player};
use khan_db::MemoryStore;
use khan_service::dto::{
    ApplyForMembershipRequest, CreateClanRequest, CreatePlayerRequest, GameRequest,
    InviteForMembershipRequest, MembershipActionRequest,
};
use khan_service::{
    ClanService, GameService, IndexQueue, IndexQueueConfig, MembershipService, PlayerService,
    ServiceContext, ServiceContextBuilder,
};

pub const GAME: &str = "g1";
pub const START_MS: i64 = 1_700_000_000_000;

/// Event sink that keeps everything it receives
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingSink {
    pub fn all(&self) -> Vec<DomainEvent> {
        self.events.lock().clone()
    }

    pub fn types(&self) -> Vec<EventType> {
        self.events.lock().iter().map(|e| e.event_type).collect()
    }

    pub fn of(&self, event_type: EventType) -> Vec<DomainEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: DomainEvent) {
        self.events.lock().push(event);
    }
}

pub struct Harness {
    pub ctx: ServiceContext,
    pub store: Arc<MemoryStore>,
    pub index: Arc<MemoryClanIndex>,
    pub queue: Arc<IndexQueue>,
    pub events: Arc<RecordingSink>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    /// Harness with game `g1` already created
    pub async fn new() -> Self {
        Self::with_game(game_json()).await
    }

    pub async fn with_game(game: Value) -> Self {
        let store = Arc::new(MemoryStore::new());
        let index = Arc::new(MemoryClanIndex::new());
        let queue = IndexQueue::start(
            IndexQueueConfig {
                workers: 2,
                queue_size: 64,
                max_attempts: 3,
                backoff: std::time::Duration::from_millis(1),
            },
            index.clone(),
        );
        let events = Arc::new(RecordingSink::default());
        let clock = Arc::new(ManualClock::new(START_MS));

        let ctx = ServiceContextBuilder::new()
            .store(store.clone())
            .index_queue(queue.clone())
            .events(events.clone())
            .clock(clock.clone())
            .build()
            .expect("context");

        let harness = Self {
            ctx,
            store,
            index,
            queue,
            events,
            clock,
        };
        let request: GameRequest = serde_json::from_value(game).expect("game request");
        GameService::new(&harness.ctx)
            .create_game(request)
            .await
            .expect("create game");
        harness
    }

    pub async fn player(&self, public_id: &str) {
        PlayerService::new(&self.ctx)
            .create_player(
                GAME,
                CreatePlayerRequest {
                    public_id: Some(public_id.to_string()),
                    name: Some(format!("Player {public_id}")),
                    ..Default::default()
                },
            )
            .await
            .expect("create player");
    }

    pub async fn clan(&self, public_id: &str, owner: &str, auto_join: bool) {
        self.player(owner).await;
        ClanService::new(&self.ctx)
            .create_clan(
                GAME,
                CreateClanRequest {
                    public_id: Some(public_id.to_string()),
                    name: Some(format!("Clan {public_id}")),
                    owner_public_id: Some(owner.to_string()),
                    allow_application: Some(true),
                    auto_join: Some(auto_join),
                    ..Default::default()
                },
            )
            .await
            .expect("create clan");
    }

    /// Application by a new player, approved by the clan owner
    pub async fn member(&self, clan: &str, owner: &str, player: &str, level: &str) {
        self.player(player).await;
        let memberships = MembershipService::new(&self.ctx);
        let applied = memberships
            .apply_for_membership(GAME, clan, apply(player, level))
            .await
            .expect("apply");
        if !applied.approved {
            memberships
                .approve_application(GAME, clan, action(player, owner))
                .await
                .expect("approve");
        }
    }

    // === Store reads ===

    pub async fn stored_clan(&self, public_id: &str) -> Option<Clan> {
        let mut tx = self.store.begin(Isolation::ReadCommitted).await.unwrap();
        tx.find_clan(GAME, public_id).await.unwrap()
    }

    pub async fn stored_player(&self, public_id: &str) -> Player {
        let mut tx = self.store.begin(Isolation::ReadCommitted).await.unwrap();
        tx.find_player(GAME, public_id).await.unwrap().expect("player")
    }

    pub async fn stored_membership(&self, clan: &str, player: &str) -> Option<Membership> {
        let clan = self.stored_clan(clan).await?;
        let player = self.stored_player(player).await;
        let mut tx = self.store.begin(Isolation::ReadCommitted).await.unwrap();
        tx.find_membership(clan.id, player.id).await.unwrap()
    }

    /// Counters of every clan and of the given players match the rows
    pub async fn assert_counters(&self, players: &[&str]) {
        let mut tx = self.store.begin(Isolation::ReadCommitted).await.unwrap();
        let clans = tx.list_clans(GAME).await.unwrap();
        for clan in &clans {
            let approved = tx
                .clan_memberships(clan.id)
                .await
                .unwrap()
                .iter()
                .filter(|m| m.is_approved())
                .count();
            assert_eq!(
                clan.membership_count as usize,
                1 + approved,
                "membership count of clan {}",
                clan.public_id
            );
        }
        for public_id in players {
            let player = tx.find_player(GAME, public_id).await.unwrap().unwrap();
            let approved = tx
                .player_memberships(player.id)
                .await
                .unwrap()
                .iter()
                .filter(|m| m.is_approved())
                .count();
            let owned = clans.iter().filter(|c| c.owner_id == player.id).count();
            assert_eq!(player.membership_count as usize, approved, "{public_id}");
            assert_eq!(player.ownership_count as usize, owned, "{public_id}");
        }
    }
}

pub fn game_json() -> Value {
    json!({
        "publicID": GAME,
        "name": "Game One",
        "membershipLevels": {"Member": 1, "Elder": 2, "CoLeader": 3},
        "metadata": {},
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

pub fn apply(player: &str, level: &str) -> ApplyForMembershipRequest {
    ApplyForMembershipRequest {
        level: Some(level.to_string()),
        player_public_id: Some(player.to_string()),
        message: String::new(),
    }
}

pub fn invite(player: &str, requestor: &str) -> InviteForMembershipRequest {
    InviteForMembershipRequest {
        level: Some("Member".to_string()),
        player_public_id: Some(player.to_string()),
        requestor_public_id: Some(requestor.to_string()),
        message: String::new(),
    }
}

pub fn action(player: &str, requestor: &str) -> MembershipActionRequest {
    MembershipActionRequest {
        player_public_id: Some(player.to_string()),
        requestor_public_id: Some(requestor.to_string()),
    }
}

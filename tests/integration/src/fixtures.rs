//! Test fixtures and data generators
//!
//! Payload builders for games, players and clans, plus seeding shortcuts
//! over a running [`TestServer`].

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::helpers::{assert_json, TestServer};

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Unique public id with a readable prefix
pub fn unique_id(prefix: &str) -> String {
    format!("{prefix}-{}", unique_suffix())
}

/// Game with levels Member/Elder/CoLeader and a 30 s cooldown after deny
pub fn game_payload(public_id: &str) -> Value {
    json!({
        "publicID": public_id,
        "name": format!("Game {public_id}"),
        "membershipLevels": {"Member": 1, "Elder": 2, "CoLeader": 3},
        "metadata": {},
        "minLevelToAcceptApplication": 2,
        "minLevelToCreateInvitation": 2,
        "minLevelToRemoveMember": 2,
        "minLevelOffsetToRemoveMember": 1,
        "minLevelOffsetToPromoteMember": 1,
        "minLevelOffsetToDemoteMember": 1,
        "maxMembers": 50,
        "maxClansPerPlayer": 5,
        "cooldownAfterDeny": 30,
        "cooldownAfterDelete": 0,
        "cooldownBeforeApply": 0,
        "cooldownBeforeInvite": 0,
    })
}

/// Copy of `base` with the top-level `fields` replaced
pub fn with_fields(mut base: Value, fields: Value) -> Value {
    if let (Some(target), Value::Object(fields)) = (base.as_object_mut(), fields) {
        target.extend(fields);
    }
    base
}

pub fn player_payload(public_id: &str) -> Value {
    json!({
        "publicID": public_id,
        "name": format!("Player {public_id}"),
        "metadata": {},
    })
}

pub fn clan_payload(public_id: &str, owner: &str, auto_join: bool) -> Value {
    json!({
        "publicID": public_id,
        "name": format!("Clan {public_id}"),
        "ownerPublicID": owner,
        "metadata": {},
        "allowApplication": true,
        "autoJoin": auto_join,
    })
}

impl TestServer {
    pub async fn create_game(&self, payload: &Value) -> Result<()> {
        let response = self.post("/games", payload).await?;
        assert_json::<Value>(response, StatusCode::OK).await?;
        Ok(())
    }

    pub async fn create_player(&self, game: &str, public_id: &str) -> Result<()> {
        let response = self
            .post(&format!("/games/{game}/players"), &player_payload(public_id))
            .await?;
        assert_json::<Value>(response, StatusCode::OK).await?;
        Ok(())
    }

    /// Create the owner, then the clan
    pub async fn create_clan(
        &self,
        game: &str,
        public_id: &str,
        owner: &str,
        auto_join: bool,
    ) -> Result<()> {
        self.create_player(game, owner).await?;
        let response = self
            .post(
                &format!("/games/{game}/clans"),
                &clan_payload(public_id, owner, auto_join),
            )
            .await?;
        assert_json::<Value>(response, StatusCode::OK).await?;
        Ok(())
    }

    /// New player applies at `level`; the owner approves when needed
    pub async fn add_member(
        &self,
        game: &str,
        clan: &str,
        owner: &str,
        player: &str,
        level: &str,
    ) -> Result<()> {
        self.create_player(game, player).await?;
        let base = format!("/games/{game}/clans/{clan}/memberships");
        let response = self
            .post(
                &format!("{base}/application"),
                &json!({"level": level, "playerPublicID": player}),
            )
            .await?;
        let body: Value = assert_json(response, StatusCode::OK).await?;
        if body["approved"] != true {
            let response = self
                .post(
                    &format!("{base}/application/approve"),
                    &json!({"playerPublicID": player, "requestorPublicID": owner}),
                )
                .await?;
            assert_json::<Value>(response, StatusCode::OK).await?;
        }
        Ok(())
    }

    /// Subscribe `url` to an event type code
    pub async fn create_hook(&self, game: &str, event_type: i32, url: &str) -> Result<String> {
        let response = self
            .post(
                &format!("/games/{game}/hooks"),
                &json!({"type": event_type, "hookURL": url}),
            )
            .await?;
        let body: Value = assert_json(response, StatusCode::OK).await?;
        Ok(body["publicID"].as_str().unwrap_or_default().to_string())
    }

    pub async fn clan_summary(&self, game: &str, clan: &str) -> Result<Value> {
        let response = self
            .get(&format!("/games/{game}/clans/{clan}/summary"))
            .await?;
        assert_json(response, StatusCode::OK).await
    }
}

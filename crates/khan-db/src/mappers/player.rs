//! Player entity <-> model mapper
//!
//! Player names pass through the configured [`NameCipher`] in both directions.

use khan_common::NameCipher;
use khan_core::entities::Player;
use khan_core::DomainError;

use crate::models::PlayerModel;

impl PlayerModel {
    /// Convert to a Player entity, decoding the stored name
    pub fn into_player(self, cipher: &NameCipher) -> Result<Player, DomainError> {
        let name = cipher
            .decode(&self.name)
            .map_err(|e| DomainError::InternalError(format!("player {}: {e}", self.public_id)))?;
        Ok(Player {
            id: self.id,
            game_id: self.game_id,
            public_id: self.public_id,
            name,
            metadata: self.metadata.0,
            membership_count: self.membership_count,
            ownership_count: self.ownership_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Values written for a player insert or update
pub struct PlayerWrite<'a> {
    pub player: &'a Player,
    pub stored_name: String,
}

impl<'a> PlayerWrite<'a> {
    pub fn new(player: &'a Player, cipher: &NameCipher) -> Result<Self, DomainError> {
        let stored_name = cipher
            .encode(&player.name)
            .map_err(|e| DomainError::InternalError(e.to_string()))?;
        Ok(Self {
            player,
            stored_name,
        })
    }
}

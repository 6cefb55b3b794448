//! Update notification gating
//!
//! An empty whitelist means every update is notified. Otherwise an update is
//! notified only when a structural field changed or a changed metadata key is
//! whitelisted.

use crate::entities::{Clan, Player};
use crate::value_objects::changed_keys;

/// Whether a clan update should emit `clan_updated`
pub fn should_notify_clan_update(whitelist: &[&str], old: &Clan, new: &Clan) -> bool {
    if whitelist.is_empty() {
        return true;
    }
    if old.name != new.name
        || old.allow_application != new.allow_application
        || old.auto_join != new.auto_join
    {
        return true;
    }
    changed_keys(&old.metadata, &new.metadata)
        .iter()
        .any(|key| whitelist.contains(&key.as_str()))
}

/// Whether a player update should emit `player_updated`
pub fn should_notify_player_update(whitelist: &[&str], old: &Player, new: &Player) -> bool {
    if whitelist.is_empty() {
        return true;
    }
    if old.name != new.name {
        return true;
    }
    changed_keys(&old.metadata, &new.metadata)
        .iter()
        .any(|key| whitelist.contains(&key.as_str()))
}

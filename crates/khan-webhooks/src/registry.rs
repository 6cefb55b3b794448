//! Hook registry

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::info;

use khan_core::entities::Hook;
use khan_core::events::EventType;
use khan_core::traits::{Isolation, RepoResult, Store};

type GameHooks = HashMap<EventType, Vec<Hook>>;

/// In-memory view of the hooks table
#[derive(Debug, Default)]
pub struct HookRegistry {
    games: RwLock<HashMap<String, GameHooks>>,
}

fn group(hooks: Vec<Hook>) -> HashMap<String, GameHooks> {
    let mut games: HashMap<String, GameHooks> = HashMap::new();
    for hook in hooks {
        games
            .entry(hook.game_id.clone())
            .or_default()
            .entry(hook.event_type)
            .or_default()
            .push(hook);
    }
    games
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every game's hooks
    pub fn replace_all(&self, hooks: Vec<Hook>) {
        *self.games.write() = group(hooks);
    }

    /// Replace one game's hooks
    pub fn replace_game(&self, game_id: &str, hooks: Vec<Hook>) {
        let grouped = group(hooks).remove(game_id).unwrap_or_default();
        let mut games = self.games.write();
        if grouped.is_empty() {
            games.remove(game_id);
        } else {
            games.insert(game_id.to_string(), grouped);
        }
    }

    /// Hooks subscribed to `event_type` in `game_id`
    pub fn matching(&self, game_id: &str, event_type: EventType) -> Vec<Hook> {
        self.games
            .read()
            .get(game_id)
            .and_then(|types| types.get(&event_type))
            .cloned()
            .unwrap_or_default()
    }

    /// Total number of registered hooks
    pub fn len(&self) -> usize {
        self.games
            .read()
            .values()
            .flat_map(HashMap::values)
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load every hook from the store
    pub async fn load(&self, store: &dyn Store) -> RepoResult<usize> {
        let mut tx = store.begin(Isolation::ReadCommitted).await?;
        let hooks = tx.list_hooks().await?;
        tx.commit().await?;

        let count = hooks.len();
        self.replace_all(hooks);
        info!(hooks = count, "Hook registry loaded");
        Ok(count)
    }

    /// Reload one game's hooks from the store
    pub async fn reload_game(&self, store: &dyn Store, game_id: &str) -> RepoResult<usize> {
        let mut tx = store.begin(Isolation::ReadCommitted).await?;
        let hooks = tx.game_hooks(game_id).await?;
        tx.commit().await?;

        let count = hooks.len();
        self.replace_game(game_id, hooks);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hook(game_id: &str, public_id: &str, event_type: EventType) -> Hook {
        Hook {
            id: 0,
            game_id: game_id.to_string(),
            public_id: public_id.to_string(),
            event_type,
            url: format!("http://localhost/{public_id}"),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_matching_by_game_and_type() {
        let registry = HookRegistry::new();
        registry.replace_all(vec![
            hook("g1", "h1", EventType::ClanCreated),
            hook("g1", "h2", EventType::ClanCreated),
            hook("g1", "h3", EventType::ClanUpdated),
            hook("g2", "h4", EventType::ClanCreated),
        ]);

        assert_eq!(registry.matching("g1", EventType::ClanCreated).len(), 2);
        assert_eq!(registry.matching("g1", EventType::ClanUpdated).len(), 1);
        assert!(registry.matching("g1", EventType::ClanLeft).is_empty());
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_replace_game_leaves_other_games() {
        let registry = HookRegistry::new();
        registry.replace_all(vec![
            hook("g1", "h1", EventType::ClanCreated),
            hook("g2", "h2", EventType::ClanCreated),
        ]);

        registry.replace_game("g1", Vec::new());
        assert!(registry.matching("g1", EventType::ClanCreated).is_empty());
        assert_eq!(registry.matching("g2", EventType::ClanCreated).len(), 1);
    }
}

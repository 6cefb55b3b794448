//! Free-form metadata carried by games, players and clans

use std::collections::BTreeSet;

/// JSON object stored alongside an entity
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Keys whose value differs between two metadata objects.
///
/// A key present on only one side counts as changed.
pub fn changed_keys(old: &Metadata, new: &Metadata) -> BTreeSet<String> {
    let mut changed = BTreeSet::new();
    for (key, value) in old {
        if new.get(key) != Some(value) {
            changed.insert(key.clone());
        }
    }
    for key in new.keys() {
        if !old.contains_key(key) {
            changed.insert(key.clone());
        }
    }
    changed
}

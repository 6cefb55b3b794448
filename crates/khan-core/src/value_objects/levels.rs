//! Membership levels - the ordered level hierarchy configured per game

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Mapping of level name to integer rank.
///
/// Higher rank means more privileges. A game always has at least one level;
/// `min_level`/`max_level` are derived from the ranks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MembershipLevels(BTreeMap<String, i32>);

impl MembershipLevels {
    pub fn new(levels: BTreeMap<String, i32>) -> Self {
        Self(levels)
    }

    /// Rank of a level name, if configured
    pub fn rank(&self, level: &str) -> Option<i32> {
        self.0.get(level).copied()
    }

    pub fn contains(&self, level: &str) -> bool {
        self.0.contains_key(level)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Lowest configured rank (0 when empty)
    pub fn min_level(&self) -> i32 {
        self.0.values().copied().min().unwrap_or_default()
    }

    /// Highest configured rank (0 when empty)
    pub fn max_level(&self) -> i32 {
        self.0.values().copied().max().unwrap_or_default()
    }

    /// Name of the level holding the highest rank
    pub fn top(&self) -> Option<&str> {
        self.0
            .iter()
            .max_by_key(|(_, rank)| **rank)
            .map(|(name, _)| name.as_str())
    }

    /// Next level strictly above `level`
    pub fn next_above(&self, level: &str) -> Option<&str> {
        let current = self.rank(level)?;
        self.0
            .iter()
            .filter(|(_, rank)| **rank > current)
            .min_by_key(|(_, rank)| **rank)
            .map(|(name, _)| name.as_str())
    }

    /// Next level strictly below `level`
    pub fn next_below(&self, level: &str) -> Option<&str> {
        let current = self.rank(level)?;
        self.0
            .iter()
            .filter(|(_, rank)| **rank < current)
            .max_by_key(|(_, rank)| **rank)
            .map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.0.iter().map(|(name, rank)| (name.as_str(), *rank))
    }
}

impl FromIterator<(String, i32)> for MembershipLevels {
    fn from_iter<T: IntoIterator<Item = (String, i32)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

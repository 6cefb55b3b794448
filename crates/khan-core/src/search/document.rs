//! Search document stored in the secondary index, one per clan

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::entities::Clan;
use crate::value_objects::Metadata;

const MIN_PREFIX_LEN: usize = 2;

/// Clan document as stored in the search index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClanDocument {
    pub clan_id: i64,
    #[serde(rename = "publicID")]
    pub public_id: String,
    pub name: String,
    pub name_prefixes: Vec<String>,
    pub metadata: Metadata,
    pub membership_count: i32,
    pub allow_application: bool,
    pub auto_join: bool,
}

impl ClanDocument {
    /// Every token this document can be found by: whole words and prefixes
    pub fn tokens(&self) -> BTreeSet<String> {
        let mut tokens: BTreeSet<String> = words(&self.name).collect();
        tokens.extend(self.name_prefixes.iter().cloned());
        tokens
    }

    /// All query tokens must match a word or a word prefix
    pub fn matches(&self, term: &str) -> bool {
        let query = query_tokens(term);
        if query.is_empty() {
            return false;
        }
        let tokens = self.tokens();
        query.iter().all(|token| tokens.contains(token))
    }
}

impl From<&Clan> for ClanDocument {
    fn from(clan: &Clan) -> Self {
        Self {
            clan_id: clan.id,
            public_id: clan.public_id.clone(),
            name: clan.name.clone(),
            name_prefixes: name_prefixes(&clan.name),
            metadata: clan.metadata.clone(),
            membership_count: clan.membership_count,
            allow_application: clan.allow_application,
            auto_join: clan.auto_join,
        }
    }
}

/// Lowercase, NFKD-decompose and drop combining marks
pub fn fold(text: &str) -> String {
    text.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Word prefixes of length >= 2, folded, deduplicated and sorted
pub fn name_prefixes(name: &str) -> Vec<String> {
    let mut prefixes = BTreeSet::new();
    for word in words(name) {
        let chars: Vec<char> = word.chars().collect();
        for len in MIN_PREFIX_LEN..=chars.len() {
            prefixes.insert(chars[..len].iter().collect::<String>());
        }
    }
    prefixes.into_iter().collect()
}

/// Folded words of a search term
pub fn query_tokens(term: &str) -> Vec<String> {
    let mut tokens: Vec<String> = words(term).collect();
    tokens.sort();
    tokens.dedup();
    tokens
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace().map(fold).filter(|word| !word.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(name: &str) -> ClanDocument {
        ClanDocument {
            clan_id: 1,
            public_id: "c1".to_string(),
            name: name.to_string(),
            name_prefixes: name_prefixes(name),
            metadata: Metadata::new(),
            membership_count: 1,
            allow_application: true,
            auto_join: false,
        }
    }

    #[test]
    fn test_fold_strips_accents_and_case() {
        assert_eq!(fold("Ëlite Çlan"), "elite clan");
        assert_eq!(fold("ＡＢＣ"), "abc");
        assert_eq!(fold("\u{0958}"), "\u{0915}");
        assert_eq!(fold("\u{FB35}"), "\u{05D5}");
        assert!(!fold("क़िला").chars().any(is_combining_mark));
    }

    #[test]
    fn test_non_latin_marks_do_not_split_tokens() {
        let doc = document("\u{0958}ila");
        assert!(doc.matches("\u{0915}ila"));
    }

    #[test]
    fn test_name_prefixes() {
        assert_eq!(
            name_prefixes("Dark Ox"),
            vec!["da", "dar", "dark", "ox"]
        );
        assert!(name_prefixes("a").is_empty());
    }

    #[test]
    fn test_matches_prefix_and_word() {
        let doc = document("Les Misérables");
        assert!(doc.matches("mis"));
        assert!(doc.matches("MISERABLES"));
        assert!(doc.matches("les mise"));
        assert!(!doc.matches("rables"));
        assert!(!doc.matches("   "));
    }

    #[test]
    fn test_single_char_word_matches_whole_word() {
        let doc = document("A Team");
        assert!(doc.matches("a"));
        assert!(doc.matches("te"));
    }
}

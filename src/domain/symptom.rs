//! Symptom: a named kind of thing the user tracks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symptom {
    pub id: String,
    pub name: String,
    /// Alternate names, used for alternate-name search.
    pub other_names: Vec<String>,
    pub last_modified: DateTime<Utc>,
}

impl Symptom {
    pub fn new(id: String, name: String, other_names: Vec<String>, now: DateTime<Utc>) -> Self {
        Self { id, name, other_names, last_modified: now }
    }

    /// Tokens this symptom contributes to the autocomplete trie: the union
    /// of `name` and `other_names`, split on whitespace, lowercased,
    /// non-empty tokens only.
    pub fn tokens(&self) -> Vec<String> {
        std::iter::once(self.name.as_str())
            .chain(self.other_names.iter().map(String::as_str))
            .flat_map(|s| s.split_whitespace())
            .map(|s| s.to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str, other_names: &[&str]) -> Symptom {
        Symptom::new(
            "sym_test".to_string(),
            name.to_string(),
            other_names.iter().map(|s| s.to_string()).collect(),
            Utc::now(),
        )
    }

    #[test]
    fn tokens_combine_name_and_other_names_lowercased() {
        let s = sym("Lower Back Pain", &["Sciatica", "Nerve Pain"]);
        let mut tokens = s.tokens();
        tokens.sort();
        assert_eq!(
            tokens,
            vec!["back", "lower", "nerve", "pain", "pain", "sciatica"]
        );
    }

    #[test]
    fn empty_other_names_yield_just_the_name_tokens() {
        let s = sym("Headache", &[]);
        assert_eq!(s.tokens(), vec!["headache"]);
    }
}

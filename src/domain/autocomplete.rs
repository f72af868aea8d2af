//! Trie-based prefix word index.
//!
//! Generic over any indexed item `T`; the crate only instantiates this for
//! `Symptom`, but nothing here is symptom-specific.

use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
struct TrieNode {
    children: HashMap<char, TrieNode>,
    is_word_end: bool,
}

impl TrieNode {
    fn is_dead(&self) -> bool {
        !self.is_word_end && self.children.is_empty()
    }
}

/// A prefix trie over lowercase words, each mapped to the set of item ids
/// that contributed it.
#[derive(Debug, Default)]
pub struct Autocompleter {
    root: TrieNode,
    /// word -> item ids that currently contribute this word
    word_to_items: HashMap<String, HashSet<String>>,
    /// item id -> words it currently contributes (so `removeItem` knows what
    /// to retract)
    item_to_words: HashMap<String, HashSet<String>>,
}

impl Autocompleter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes `item_id` under `words` (already tokenized, lowercased).
    pub fn add_item(&mut self, item_id: &str, words: &[String]) {
        let mut word_set = HashSet::new();
        for word in words {
            word_set.insert(word.clone());
            self.word_to_items
                .entry(word.clone())
                .or_default()
                .insert(item_id.to_string());
            insert_word(&mut self.root, word);
        }
        self.item_to_words.insert(item_id.to_string(), word_set);
    }

    /// Removes `item_id` from the index, pruning any words (and trie
    /// branches) that no longer have contributors.
    pub fn remove_item(&mut self, item_id: &str) {
        let Some(words) = self.item_to_words.remove(item_id) else {
            return;
        };
        for word in &words {
            if let Some(items) = self.word_to_items.get_mut(word) {
                items.remove(item_id);
                if items.is_empty() {
                    self.word_to_items.remove(word);
                    remove_word(&mut self.root, word);
                }
            }
        }
    }

    /// All words currently starting with `prefix` (case-insensitive).
    fn words_with_prefix(&self, prefix: &str) -> Vec<String> {
        let prefix = prefix.to_lowercase();
        let Some(subtrie) = descend(&self.root, &prefix) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut buf = prefix.clone();
        collect_words(subtrie, &mut buf, &mut out);
        out
    }

    /// Tokenizes `query` on whitespace and returns the intersection, across
    /// tokens, of items matching any word with that token as a prefix
    /// An empty query returns an empty result.
    pub fn search(&self, query: &str) -> HashSet<String> {
        let tokens: Vec<&str> = query.split_whitespace().collect();
        if tokens.is_empty() {
            return HashSet::new();
        }

        let mut result: Option<HashSet<String>> = None;
        for token in tokens {
            let mut matches: HashSet<String> = HashSet::new();
            for word in self.words_with_prefix(token) {
                if let Some(items) = self.word_to_items.get(&word) {
                    matches.extend(items.iter().cloned());
                }
            }
            result = Some(match result {
                Some(acc) => acc.intersection(&matches).cloned().collect(),
                None => matches,
            });
        }
        result.unwrap_or_default()
    }
}

fn insert_word(root: &mut TrieNode, word: &str) {
    let mut node = root;
    for c in word.chars() {
        node = node.children.entry(c).or_default();
    }
    node.is_word_end = true;
}

/// Removes a word from the trie, pruning dead branches (nodes with no
/// `is_word_end` and no children) along the path back to the root.
fn remove_word(root: &mut TrieNode, word: &str) {
    remove_rec(root, word.chars().collect::<Vec<_>>().as_slice());

    fn remove_rec(node: &mut TrieNode, chars: &[char]) -> bool {
        let Some((&c, rest)) = chars.split_first() else {
            node.is_word_end = false;
            return node.is_dead();
        };
        let mut prune_child = false;
        if let Some(child) = node.children.get_mut(&c) {
            prune_child = remove_rec(child, rest);
        }
        if prune_child {
            node.children.remove(&c);
        }
        node.is_dead()
    }
}

fn descend<'a>(root: &'a TrieNode, prefix: &str) -> Option<&'a TrieNode> {
    let mut node = root;
    for c in prefix.chars() {
        node = node.children.get(&c)?;
    }
    Some(node)
}

/// Depth-first collection of every word reachable from `node`, with `buf`
/// holding the prefix accumulated so far (including the path into `node`).
fn collect_words(node: &TrieNode, buf: &mut String, out: &mut Vec<String>) {
    if node.is_word_end {
        out.push(buf.clone());
    }
    for (&c, child) in &node.children {
        buf.push(c);
        collect_words(child, buf, out);
        buf.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_words(ac: &mut Autocompleter, item_id: &str, words: &[&str]) {
        let words: Vec<String> = words.iter().map(|s| s.to_string()).collect();
        ac.add_item(item_id, &words);
    }

    #[test]
    fn search_is_case_insensitive_prefix_match() {
        let mut ac = Autocompleter::new();
        index_words(&mut ac, "sym_1", &["headache", "migraine"]);
        assert_eq!(ac.search("HEAD"), HashSet::from(["sym_1".to_string()]));
        assert_eq!(ac.search("mig"), HashSet::from(["sym_1".to_string()]));
    }

    #[test]
    fn search_with_no_match_is_empty() {
        let mut ac = Autocompleter::new();
        index_words(&mut ac, "sym_1", &["headache"]);
        assert!(ac.search("zzz").is_empty());
    }

    #[test]
    fn empty_query_is_empty_result() {
        let mut ac = Autocompleter::new();
        index_words(&mut ac, "sym_1", &["headache"]);
        assert!(ac.search("").is_empty());
        assert!(ac.search("   ").is_empty());
    }

    #[test]
    fn and_semantics_across_tokens() {
        let mut ac = Autocompleter::new();
        index_words(&mut ac, "sym_1", &["lower", "back", "pain"]);
        index_words(&mut ac, "sym_2", &["upper", "back", "pain"]);
        index_words(&mut ac, "sym_3", &["headache"]);

        assert_eq!(ac.search("back pain"), HashSet::from(["sym_1".to_string(), "sym_2".to_string()]));
        assert_eq!(ac.search("lower back"), HashSet::from(["sym_1".to_string()]));
        assert_eq!(ac.search("back headache"), HashSet::new());
    }

    #[test]
    fn add_then_remove_is_equivalent_to_never_added() {
        let mut baseline = Autocompleter::new();
        index_words(&mut baseline, "sym_2", &["upper", "back", "pain"]);

        let mut ac = Autocompleter::new();
        index_words(&mut ac, "sym_1", &["lower", "back", "pain"]);
        index_words(&mut ac, "sym_2", &["upper", "back", "pain"]);
        ac.remove_item("sym_1");

        assert_eq!(ac.search("back"), baseline.search("back"));
        assert_eq!(ac.search("lower"), baseline.search("lower"));
        assert!(ac.search("lower").is_empty());
    }

    #[test]
    fn removal_prunes_dead_branches() {
        let mut ac = Autocompleter::new();
        index_words(&mut ac, "sym_1", &["pain"]);
        ac.remove_item("sym_1");
        assert!(ac.root.children.is_empty());
        assert!(ac.word_to_items.is_empty());
    }

    #[test]
    fn removal_keeps_shared_prefix_branches_alive() {
        let mut ac = Autocompleter::new();
        index_words(&mut ac, "sym_1", &["pain"]);
        index_words(&mut ac, "sym_2", &["painful"]);
        ac.remove_item("sym_1");
        assert_eq!(ac.search("pain"), HashSet::from(["sym_2".to_string()]));
    }
}

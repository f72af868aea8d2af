//! Id generation for symptoms and metrics.
//!
//! Ids are opaque strings: a fixed prefix plus a random suffix.
//! Generation retries on collision - collisions are astronomically
//! unlikely at this id-space size, but the retry loop is what makes the
//! uniqueness invariant true rather than merely probable.

use rand::Rng;

const SUFFIX_LEN: usize = 12;
const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

pub const SYMPTOM_ID_PREFIX: &str = "sym_";
pub const METRIC_ID_PREFIX: &str = "met_";

fn random_suffix() -> String {
    let mut rng = rand::rng();
    (0..SUFFIX_LEN)
        .map(|_| {
            let idx = rng.random_range(0..SUFFIX_ALPHABET.len());
            SUFFIX_ALPHABET[idx] as char
        })
        .collect()
}

/// Generates an id with the given prefix, retrying while `exists` reports a
/// collision.
pub fn generate_id(prefix: &str, exists: impl Fn(&str) -> bool) -> String {
    loop {
        let candidate = format!("{prefix}{}", random_suffix());
        if !exists(&candidate) {
            return candidate;
        }
    }
}

pub fn generate_symptom_id(exists: impl Fn(&str) -> bool) -> String {
    generate_id(SYMPTOM_ID_PREFIX, exists)
}

pub fn generate_metric_id(exists: impl Fn(&str) -> bool) -> String {
    generate_id(METRIC_ID_PREFIX, exists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_ids_carry_the_right_prefix() {
        let id = generate_symptom_id(|_| false);
        assert!(id.starts_with(SYMPTOM_ID_PREFIX));
        let id = generate_metric_id(|_| false);
        assert!(id.starts_with(METRIC_ID_PREFIX));
    }

    #[test]
    fn generation_retries_on_collision() {
        let mut seen = HashSet::new();
        seen.insert(format!("{SYMPTOM_ID_PREFIX}aaaaaaaaaaaa"));
        let mut attempts = 0;
        let id = generate_id(SYMPTOM_ID_PREFIX, |candidate| {
            attempts += 1;
            // Force one collision, then accept.
            attempts == 1
        });
        assert!(!id.is_empty());
        assert_eq!(attempts, 2);
    }

    #[test]
    fn many_ids_are_unique() {
        let mut ids = HashSet::new();
        for _ in 0..1000 {
            let id = generate_symptom_id(|c| ids.contains(c));
            assert!(ids.insert(id));
        }
    }
}

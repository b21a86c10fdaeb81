//! Object hashing for change detection.
//!
//! Objects are hashed over their serialized JSON form. All maps in the
//! object model are ordered, so the encoding is deterministic.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Hasher for computing object spec hashes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpecHasher;

impl SpecHasher {
    /// Creates a new hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes the hash of an object.
    ///
    /// Returns `None` if the object cannot be serialized.
    #[must_use]
    pub fn hash_object<T: Serialize>(&self, object: &T) -> Option<String> {
        let bytes = serde_json::to_vec(object).ok()?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Some(hex::encode(hasher.finalize()))
    }

    /// Computes a short hash (first 8 characters) for display purposes.
    #[must_use]
    pub fn short_hash(&self, hash: &str) -> String {
        hash.chars().take(8).collect()
    }

    /// Compares two hashes without short-circuiting.
    #[must_use]
    pub fn hashes_match(hash1: &str, hash2: &str) -> bool {
        if hash1.len() != hash2.len() {
            return false;
        }

        hash1
            .bytes()
            .zip(hash2.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Job;

    #[test]
    fn test_hash_deterministic() {
        let hasher = SpecHasher::new();
        let job = Job::new("web").with_meta("b", "2").with_meta("a", "1");

        let hash1 = hasher.hash_object(&job).expect("hash");
        let hash2 = hasher.hash_object(&job.clone()).expect("hash");
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_metadata_change_changes_hash() {
        let hasher = SpecHasher::new();
        let a = hasher.hash_object(&Job::new("web").with_meta("team", "a"));
        let b = hasher.hash_object(&Job::new("web").with_meta("team", "b"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_short_hash() {
        let hasher = SpecHasher::new();
        assert_eq!(hasher.short_hash("abcdef1234567890"), "abcdef12");
    }

    #[test]
    fn test_hashes_match() {
        assert!(SpecHasher::hashes_match("abc123", "abc123"));
        assert!(!SpecHasher::hashes_match("abc123", "abc124"));
        assert!(!SpecHasher::hashes_match("abc123", "abc12"));
    }
}

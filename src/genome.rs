//! Genome records
//!
//! A genome is an input sequence file identified by its content fingerprint
//! and its location on disk. The same content may be recorded at several
//! paths, but a (hash, path) pair is recorded at most once.

use serde::{Deserialize, Serialize};

/// A genome row as stored in the `genomes` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genome {
    /// Surrogate key assigned on insert
    pub genome_id: i64,
    /// Content fingerprint of the file when it was recorded
    pub hash: String,
    /// Location of the source sequence data
    pub path: String,
    /// Free-text label
    pub description: String,
}

impl Genome {
    /// Check whether this row was recorded for the given content and location
    pub fn matches(&self, hash: &str, path: &str) -> bool {
        self.hash == hash && self.path == path
    }

    /// Shortened hash for display
    pub fn short_hash(&self) -> &str {
        let end = self
            .hash
            .char_indices()
            .nth(12)
            .map(|(i, _)| i)
            .unwrap_or(self.hash.len());
        &self.hash[..end]
    }
}

impl std::fmt::Display for Genome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {} ({})", self.genome_id, self.description, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genome(hash: &str) -> Genome {
        Genome {
            genome_id: 1,
            hash: hash.to_string(),
            path: "/data/g1.fasta".to_string(),
            description: "genome one".to_string(),
        }
    }

    #[test]
    fn test_matches_requires_hash_and_path() {
        let g = genome("abc123");
        assert!(g.matches("abc123", "/data/g1.fasta"));
        assert!(!g.matches("abc123", "/data/g2.fasta"));
        assert!(!g.matches("def456", "/data/g1.fasta"));
    }

    #[test]
    fn test_short_hash() {
        assert_eq!(genome("0123456789abcdef").short_hash(), "0123456789ab");
        assert_eq!(genome("abc").short_hash(), "abc");
    }
}

//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - genomes(genome_id, hash, path, description)
//! - runs(run_id, method, cmdline, date, status)
//! - runs_genomes(run_id, genome_id)
//! - comparisons(query_id, subject_id, identity, coverage, mismatches,
//!   aligned_length, program, version, fragsize, maxmatch)

pub mod schema;
pub mod sqlite;

pub use sqlite::{create_db, DbStats, SqliteStore};

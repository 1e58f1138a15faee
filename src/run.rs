//! Run records
//!
//! A run is one invocation of the comparison pipeline. Runs are linked to the
//! genomes they used through `runs_genomes`; comparisons are tied to a run
//! only through those genomes.

use serde::{Deserialize, Serialize};

/// Status written when a run is first recorded
pub const STATUS_STARTED: &str = "started";

/// A run row as stored in the `runs` table.
///
/// `status` is free text; the store enforces no lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub run_id: i64,
    /// Name of the comparison method (e.g. ANIm)
    pub method: String,
    /// Exact invocation, for reproducibility
    pub cmdline: String,
    /// Timestamp of execution
    pub date: String,
    pub status: String,
}

/// A row of the `runs_genomes` association table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunGenome {
    pub run_id: i64,
    pub genome_id: i64,
}

/// A run joined with one of its genomes, used by the reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunGenomeRow {
    pub run_id: i64,
    pub method: String,
    pub date: String,
    pub genome_id: i64,
    pub description: String,
    pub path: String,
    pub hash: String,
}

impl RunGenomeRow {
    pub fn link(&self) -> RunGenome {
        RunGenome {
            run_id: self.run_id,
            genome_id: self.genome_id,
        }
    }
}

/// Current local time formatted for the `date` column
pub fn timestamp_now() -> String {
    chrono::Local::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_is_rfc3339() {
        let ts = timestamp_now();
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}

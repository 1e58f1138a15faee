//! Database schema definitions
//!
//! Tables and column names are the on-disk contract; other tools read these
//! databases directly.
//!
//! - `genomes`: one row per recorded genome file
//! - `runs`: one row per pipeline invocation
//! - `runs_genomes`: many:many link between runs and genomes
//! - `comparisons`: one row per directed pairwise result
//!
//! Comparisons are tied to genomes, and only transitively to runs, so a
//! result computed for one run can be reused by any later run over the same
//! genomes with the same program, version and settings.

/// Table names in drop order (dependents first)
pub const TABLES: &[&str] = &["comparisons", "runs_genomes", "runs", "genomes"];

/// SQL to create the genomes table
pub const CREATE_GENOMES_TABLE: &str = r#"
CREATE TABLE genomes (
    genome_id INTEGER PRIMARY KEY AUTOINCREMENT,
    hash TEXT,
    path TEXT,
    description TEXT
);
"#;

/// SQL to create the runs table
pub const CREATE_RUNS_TABLE: &str = r#"
CREATE TABLE runs (
    run_id INTEGER PRIMARY KEY AUTOINCREMENT,
    method TEXT,
    cmdline TEXT,
    date TEXT,
    status TEXT
);
"#;

/// SQL to create the run/genome link table
pub const CREATE_RUNS_GENOMES_TABLE: &str = r#"
CREATE TABLE runs_genomes (
    run_id INTEGER NOT NULL,
    genome_id INTEGER NOT NULL,
    PRIMARY KEY (run_id, genome_id),
    FOREIGN KEY(run_id) REFERENCES runs(run_id),
    FOREIGN KEY(genome_id) REFERENCES genomes(genome_id)
);
"#;

/// SQL to create the comparisons table
pub const CREATE_COMPARISONS_TABLE: &str = r#"
CREATE TABLE comparisons (
    query_id INTEGER NOT NULL,
    subject_id INTEGER NOT NULL,
    identity REAL,
    coverage REAL,
    mismatches REAL,
    aligned_length REAL,
    program TEXT,
    version TEXT,
    fragsize TEXT,
    maxmatch TEXT,
    FOREIGN KEY(query_id) REFERENCES genomes(genome_id),
    FOREIGN KEY(subject_id) REFERENCES genomes(genome_id)
);
"#;

/// SQL to create indexes
///
/// `genomehashpath_index` enforces (hash, path) uniqueness. The comparison key
/// index maps NULL settings to an empty blob so that two unset settings
/// collide, while no TEXT setting can equal the blob.
pub const CREATE_INDEXES: &[&str] = &[
    "DROP INDEX IF EXISTS genomehash_index",
    "CREATE INDEX genomehash_index ON genomes (hash)",
    "DROP INDEX IF EXISTS genomehashpath_index",
    "CREATE UNIQUE INDEX genomehashpath_index ON genomes (hash, path)",
    "DROP INDEX IF EXISTS comparisonkey_index",
    "CREATE UNIQUE INDEX comparisonkey_index ON comparisons (
        query_id, subject_id, program, version,
        IFNULL(fragsize, x''), IFNULL(maxmatch, x'')
    )",
];

/// Drop every table, dependents first, so recreation starts clean even with
/// foreign keys enforced
pub fn drop_statements() -> Vec<String> {
    TABLES
        .iter()
        .map(|t| format!("DROP TABLE IF EXISTS {}", t))
        .collect()
}

/// All schema creation statements, as one script
pub fn create_script() -> String {
    let mut script = String::new();
    for stmt in drop_statements() {
        script.push_str(&stmt);
        script.push_str(";\n");
    }
    for table in [
        CREATE_GENOMES_TABLE,
        CREATE_RUNS_TABLE,
        CREATE_RUNS_GENOMES_TABLE,
        CREATE_COMPARISONS_TABLE,
    ] {
        script.push_str(table);
    }
    for stmt in CREATE_INDEXES {
        script.push_str(stmt);
        script.push_str(";\n");
    }
    script
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_creates_every_table() {
        let script = create_script();
        for table in TABLES {
            assert!(script.contains(&format!("CREATE TABLE {} (", table)));
        }
    }

    #[test]
    fn test_script_runs_twice() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(&create_script()).unwrap();
        conn.execute_batch(&create_script()).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name LIKE '%_index'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 3);
    }
}

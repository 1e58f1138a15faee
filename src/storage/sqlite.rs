//! SQLite storage implementation

use std::path::{Path, PathBuf};
use std::time::Duration;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use crate::{Error, Result};
use crate::comparison::{Comparison, ComparisonKey, ComparisonStats, Setting};
use crate::genome::Genome;
use crate::run::{Run, RunGenomeRow};
use super::schema;

const GENOME_COLUMNS: &str = "genome_id, hash, path, description";
const RUN_COLUMNS: &str = "run_id, method, cmdline, date, status";
const COMPARISON_COLUMNS: &str = "c.rowid, c.query_id, c.subject_id, c.identity, c.coverage, \
     c.mismatches, c.aligned_length, c.program, c.version, c.fragsize, c.maxmatch";

/// Create an empty store at `path`.
///
/// Drops and recreates every table and index. Any data already stored under
/// those names is lost.
pub fn create_db(path: &Path) -> Result<()> {
    let conn = Connection::open(path)?;
    configure(&conn)?;
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(&schema::create_script())?;
    tx.commit()?;
    tracing::info!("Created empty comparison store at {}", path.display());
    Ok(())
}

/// Per-connection settings. rusqlite installs a 5s busy handler on open;
/// it is cleared so lock contention surfaces at once as a storage error.
fn configure(conn: &Connection) -> Result<()> {
    conn.busy_timeout(Duration::ZERO)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(())
}

/// SQLite-backed comparison store.
///
/// Owns one connection for its lifetime. Every public operation runs in its
/// own transaction, committed on success and rolled back when an error
/// drops it.
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Create a fresh store at `path` (destructive) and open it
    pub fn create(path: &Path) -> Result<Self> {
        create_db(path)?;
        Self::open(path)
    }

    /// Open an existing database file. Never creates one.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::MissingDatabase(path.to_path_buf()));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        configure(&conn)?;
        tracing::debug!("Opened comparison store {}", path.display());
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory database with a fresh schema (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        configure(&conn)?;
        conn.execute_batch(&schema::create_script())?;
        Ok(Self { conn, path: None })
    }

    /// Location of the database file, if file-backed
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `op` inside a transaction scoped to this call
    fn with_transaction<T>(&self, op: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let tx = self.conn.unchecked_transaction()?;
        let value = op(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    // ========== Run Operations ==========

    /// Record a run and return its ID. Identical runs get distinct IDs.
    pub fn add_run(&self, method: &str, cmdline: &str, date: &str, status: &str) -> Result<i64> {
        let run_id = self.with_transaction(|conn| {
            conn.execute(
                "INSERT INTO runs (method, cmdline, date, status) VALUES (?1, ?2, ?3, ?4)",
                params![method, cmdline, date, status],
            )?;
            Ok(conn.last_insert_rowid())
        })?;
        tracing::debug!(run_id, method, "Added run");
        Ok(run_id)
    }

    /// Associate a genome with a run.
    ///
    /// Fails with a constraint violation if the pair is already linked or
    /// either row does not exist.
    pub fn add_genome_to_run(&self, run_id: i64, genome_id: i64) -> Result<i64> {
        let link_id = self.with_transaction(|conn| {
            conn.execute(
                "INSERT INTO runs_genomes (run_id, genome_id) VALUES (?1, ?2)",
                params![run_id, genome_id],
            )?;
            Ok(conn.last_insert_rowid())
        })?;
        tracing::debug!(run_id, genome_id, "Linked genome to run");
        Ok(link_id)
    }

    /// Genome IDs associated with a run. Empty if the run has none or does
    /// not exist.
    pub fn get_genome_ids_by_run(&self, run_id: i64) -> Result<Vec<i64>> {
        self.with_transaction(|conn| {
            let mut stmt = conn.prepare("SELECT genome_id FROM runs_genomes WHERE run_id = ?1")?;
            let ids = stmt
                .query_map([run_id], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<i64>>>()?;
            Ok(ids)
        })
    }

    /// Get a run by ID
    pub fn get_run(&self, run_id: i64) -> Result<Option<Run>> {
        self.with_transaction(|conn| {
            conn.query_row(
                &format!("SELECT {} FROM runs WHERE run_id = ?1", RUN_COLUMNS),
                [run_id],
                row_to_run,
            )
            .optional()
            .map_err(Into::into)
        })
    }

    /// All runs, oldest first
    pub fn get_all_runs(&self) -> Result<Vec<Run>> {
        self.with_transaction(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {} FROM runs ORDER BY run_id", RUN_COLUMNS))?;
            let runs = stmt
                .query_map([], row_to_run)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(runs)
        })
    }

    // ========== Genome Operations ==========

    /// Record a genome and return its ID.
    ///
    /// A second insert of the same (hash, path) fails with
    /// [`Error::ConstraintViolation`]: the genome is already recorded.
    pub fn add_genome(&self, hash: &str, path: &str, description: &str) -> Result<i64> {
        let genome_id = self.with_transaction(|conn| {
            conn.execute(
                "INSERT INTO genomes (hash, path, description) VALUES (?1, ?2, ?3)",
                params![hash, path, description],
            )?;
            Ok(conn.last_insert_rowid())
        })?;
        tracing::debug!(genome_id, hash, path, "Added genome");
        Ok(genome_id)
    }

    /// Genomes with the given hash, optionally restricted to one path.
    ///
    /// Without a path every copy of the content is returned; with a path at
    /// most one row matches.
    pub fn get_genome(&self, hash: &str, path: Option<&str>) -> Result<Vec<Genome>> {
        self.with_transaction(|conn| {
            let genomes = match path {
                Some(path) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {} FROM genomes WHERE hash = ?1 AND path = ?2 ORDER BY genome_id",
                        GENOME_COLUMNS
                    ))?;
                    let rows = stmt.query_map(params![hash, path], row_to_genome)?;
                    rows.collect::<rusqlite::Result<Vec<_>>>()?
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {} FROM genomes WHERE hash = ?1 ORDER BY genome_id",
                        GENOME_COLUMNS
                    ))?;
                    let rows = stmt.query_map([hash], row_to_genome)?;
                    rows.collect::<rusqlite::Result<Vec<_>>>()?
                }
            };
            Ok(genomes)
        })
    }

    /// Path of a genome. The ID must exist.
    pub fn get_genome_path(&self, genome_id: i64) -> Result<String> {
        self.with_transaction(|conn| {
            conn.query_row(
                "SELECT path FROM genomes WHERE genome_id = ?1",
                [genome_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("genome {}", genome_id)))
        })
    }

    /// All genomes, in insertion order
    pub fn get_all_genomes(&self) -> Result<Vec<Genome>> {
        self.with_transaction(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM genomes ORDER BY genome_id",
                GENOME_COLUMNS
            ))?;
            let genomes = stmt
                .query_map([], row_to_genome)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(genomes)
        })
    }

    /// Full genome rows for a run
    pub fn get_genomes_by_run(&self, run_id: i64) -> Result<Vec<Genome>> {
        self.with_transaction(|conn| {
            let mut stmt = conn.prepare(
                "SELECT g.genome_id, g.hash, g.path, g.description
                 FROM genomes g JOIN runs_genomes rg ON rg.genome_id = g.genome_id
                 WHERE rg.run_id = ?1
                 ORDER BY g.genome_id",
            )?;
            let genomes = stmt
                .query_map([run_id], row_to_genome)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(genomes)
        })
    }

    // ========== Comparison Operations ==========

    /// Look up a stored comparison by its full key.
    ///
    /// Unset settings match only unset columns (`IS`, not `=`).
    pub fn get_comparison(&self, key: &ComparisonKey) -> Result<Option<Comparison>> {
        self.with_transaction(|conn| lookup_comparison(conn, key))
    }

    /// Store a comparison result. A duplicate key is a constraint violation;
    /// existing results are never overwritten.
    pub fn add_comparison(&self, key: &ComparisonKey, stats: &ComparisonStats) -> Result<i64> {
        let comparison_id = self.with_transaction(|conn| {
            conn.execute(
                r#"
                INSERT INTO comparisons (query_id, subject_id, identity, coverage, mismatches,
                                         aligned_length, program, version, fragsize, maxmatch)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
                params![
                    key.query_id,
                    key.subject_id,
                    stats.identity,
                    stats.coverage,
                    stats.mismatches,
                    stats.aligned_length,
                    key.program,
                    key.version,
                    key.fragsize,
                    key.maxmatch,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })?;
        tracing::debug!(
            comparison_id,
            query_id = key.query_id,
            subject_id = key.subject_id,
            program = %key.program,
            "Added comparison"
        );
        Ok(comparison_id)
    }

    /// Comparisons between genomes that both belong to the run
    pub fn get_comparisons_by_run(&self, run_id: i64) -> Result<Vec<Comparison>> {
        self.with_transaction(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {}
                 FROM comparisons c
                 JOIN runs_genomes q ON q.genome_id = c.query_id AND q.run_id = ?1
                 JOIN runs_genomes s ON s.genome_id = c.subject_id AND s.run_id = ?1
                 ORDER BY c.query_id, c.subject_id, c.rowid",
                COMPARISON_COLUMNS
            ))?;
            let comparisons = stmt
                .query_map([run_id], row_to_comparison)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(comparisons)
        })
    }

    /// Ordered genome pairs of a run with no stored result for the given
    /// program, version and settings. Both directions are checked.
    pub fn get_uncompared_pairs(
        &self,
        run_id: i64,
        program: &str,
        version: &str,
        fragsize: &Setting,
        maxmatch: &Setting,
    ) -> Result<Vec<(i64, i64)>> {
        let genome_ids = self.get_genome_ids_by_run(run_id)?;
        self.with_transaction(|conn| {
            let mut pending = Vec::new();
            for &query_id in &genome_ids {
                for &subject_id in &genome_ids {
                    if query_id == subject_id {
                        continue;
                    }
                    let key = ComparisonKey {
                        query_id,
                        subject_id,
                        program: program.to_string(),
                        version: version.to_string(),
                        fragsize: fragsize.clone(),
                        maxmatch: maxmatch.clone(),
                    };
                    if lookup_comparison(conn, &key)?.is_none() {
                        pending.push((query_id, subject_id));
                    }
                }
            }
            Ok(pending)
        })
    }

    // ========== Reports ==========

    /// Every run with each of its genomes, grouped by run
    pub fn get_genomes_by_runs(&self) -> Result<Vec<RunGenomeRow>> {
        self.run_genome_rows("r.run_id, g.genome_id")
    }

    /// Every genome with each run it took part in, grouped by genome
    pub fn get_runs_by_genomes(&self) -> Result<Vec<RunGenomeRow>> {
        self.run_genome_rows("g.genome_id, r.run_id")
    }

    fn run_genome_rows(&self, order_by: &str) -> Result<Vec<RunGenomeRow>> {
        self.with_transaction(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT r.run_id, r.method, r.date, g.genome_id, g.description, g.path, g.hash
                 FROM runs r
                 JOIN runs_genomes rg ON rg.run_id = r.run_id
                 JOIN genomes g ON g.genome_id = rg.genome_id
                 ORDER BY {}",
                order_by
            ))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(RunGenomeRow {
                        run_id: row.get(0)?,
                        method: row.get(1)?,
                        date: row.get(2)?,
                        genome_id: row.get(3)?,
                        description: row.get(4)?,
                        path: row.get(5)?,
                        hash: row.get(6)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        self.with_transaction(|conn| {
            let count = |table: &str| -> Result<usize> {
                let n: i64 =
                    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
                Ok(n as usize)
            };
            Ok(DbStats {
                genomes: count("genomes")?,
                runs: count("runs")?,
                run_genomes: count("runs_genomes")?,
                comparisons: count("comparisons")?,
            })
        })
    }
}

fn lookup_comparison(conn: &Connection, key: &ComparisonKey) -> Result<Option<Comparison>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM comparisons c
             WHERE c.query_id = ?1 AND c.subject_id = ?2
               AND c.program = ?3 AND c.version = ?4
               AND c.fragsize IS ?5 AND c.maxmatch IS ?6",
            COMPARISON_COLUMNS
        ),
        params![
            key.query_id,
            key.subject_id,
            key.program,
            key.version,
            key.fragsize,
            key.maxmatch,
        ],
        row_to_comparison,
    )
    .optional()
    .map_err(Into::into)
}

/// Helper to convert a row to a Genome
fn row_to_genome(row: &rusqlite::Row) -> rusqlite::Result<Genome> {
    Ok(Genome {
        genome_id: row.get(0)?,
        hash: row.get(1)?,
        path: row.get(2)?,
        description: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
    })
}

/// Helper to convert a row to a Run
fn row_to_run(row: &rusqlite::Row) -> rusqlite::Result<Run> {
    Ok(Run {
        run_id: row.get(0)?,
        method: row.get(1)?,
        cmdline: row.get(2)?,
        date: row.get(3)?,
        status: row.get(4)?,
    })
}

/// Helper to convert a row to a Comparison
fn row_to_comparison(row: &rusqlite::Row) -> rusqlite::Result<Comparison> {
    Ok(Comparison {
        comparison_id: row.get(0)?,
        key: ComparisonKey {
            query_id: row.get(1)?,
            subject_id: row.get(2)?,
            program: row.get(7)?,
            version: row.get(8)?,
            fragsize: row.get(9)?,
            maxmatch: row.get(10)?,
        },
        stats: ComparisonStats {
            identity: row.get(3)?,
            coverage: row.get(4)?,
            mismatches: row.get(5)?,
            aligned_length: row.get(6)?,
        },
    })
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub genomes: usize,
    pub runs: usize,
    pub run_genomes: usize,
    pub comparisons: usize,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Genomes: {}", self.genomes)?;
        writeln!(f, "  Runs: {}", self.runs)?;
        writeln!(f, "  Run/genome links: {}", self.run_genomes)?;
        writeln!(f, "  Comparisons: {}", self.comparisons)
    }
}

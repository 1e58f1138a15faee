use anidb::{create_db, ComparisonKey, ComparisonStats, Error, Setting, SqliteStore};
use std::collections::HashSet;
use std::path::PathBuf;

fn temp_db() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("x.db");
    (dir, path)
}

fn stats(identity: f64) -> ComparisonStats {
    ComparisonStats {
        identity,
        coverage: 0.85,
        mismatches: 150.0,
        aligned_length: 4_000_000.0,
    }
}

#[test]
fn scenario_duplicate_genome_rejected() {
    let (_dir, path) = temp_db();
    create_db(&path).unwrap();
    let store = SqliteStore::open(&path).unwrap();

    assert_eq!(store.add_genome("abc123", "/data/g1.fasta", "genome one").unwrap(), 1);
    let err = store.add_genome("abc123", "/data/g1.fasta", "dup").unwrap_err();
    assert!(matches!(err, Error::ConstraintViolation(_)));
    assert_eq!(store.add_genome("abc123", "/data/g2.fasta", "genome two").unwrap(), 2);

    let ids: Vec<i64> = store
        .get_genome("abc123", None)
        .unwrap()
        .iter()
        .map(|g| g.genome_id)
        .collect();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn create_db_resets_existing_data() {
    let (_dir, path) = temp_db();
    let store = SqliteStore::create(&path).unwrap();
    let genome_id = store.add_genome("abc123", "/data/g1.fasta", "genome one").unwrap();
    let run_id = store.add_run("ANIm", "cmd", "now", "started").unwrap();
    store.add_genome_to_run(run_id, genome_id).unwrap();
    drop(store);

    create_db(&path).unwrap();
    let store = SqliteStore::open(&path).unwrap();
    let stats = store.stats().unwrap();
    assert_eq!(
        (stats.genomes, stats.runs, stats.run_genomes, stats.comparisons),
        (0, 0, 0, 0)
    );
    // Keys restart after a reset
    assert_eq!(store.add_genome("abc123", "/data/g1.fasta", "again").unwrap(), 1);
}

#[test]
fn open_never_creates_a_database() {
    let (_dir, path) = temp_db();
    assert!(matches!(SqliteStore::open(&path), Err(Error::MissingDatabase(_))));
    assert!(!path.exists());
}

#[test]
fn create_db_fails_on_unwritable_path() {
    let (dir, _) = temp_db();
    let path = dir.path().join("no_such_dir").join("x.db");
    assert!(matches!(create_db(&path), Err(Error::Storage(_))));
}

#[test]
fn genome_round_trip() {
    let (_dir, path) = temp_db();
    let store = SqliteStore::create(&path).unwrap();
    let id = store.add_genome("d41d8cd9", "/data/g1.fasta", "genome one").unwrap();

    let rows = store.get_genome("d41d8cd9", Some("/data/g1.fasta")).unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.genome_id, id);
    assert_eq!(row.hash, "d41d8cd9");
    assert_eq!(row.path, "/data/g1.fasta");
    assert_eq!(row.description, "genome one");

    assert!(store.get_genome("d41d8cd9", Some("/data/other.fasta")).unwrap().is_empty());
    assert!(matches!(store.get_genome_path(id + 1), Err(Error::NotFound(_))));
}

#[test]
fn run_association_is_complete() {
    let (_dir, path) = temp_db();
    let store = SqliteStore::create(&path).unwrap();
    let run_id = store.add_run("ANIb", "anidb index genomes", "2017-03-01", "started").unwrap();
    let genomes: HashSet<i64> = (1..=3)
        .map(|i| {
            let id = store
                .add_genome(&format!("h{}", i), &format!("/data/g{}.fna", i), "g")
                .unwrap();
            store.add_genome_to_run(run_id, id).unwrap();
            id
        })
        .collect();

    let linked: HashSet<i64> = store.get_genome_ids_by_run(run_id).unwrap().into_iter().collect();
    assert_eq!(linked, genomes);
    assert!(store.get_genome_ids_by_run(999).unwrap().is_empty());
}

#[test]
fn comparison_key_discriminates_fragsize() {
    let (_dir, path) = temp_db();
    let store = SqliteStore::create(&path).unwrap();
    let q = store.add_genome("hq", "/data/q.fna", "query").unwrap();
    let s = store.add_genome("hs", "/data/s.fna", "subject").unwrap();

    let base = ComparisonKey::new(q, s, "blastn", "2.6.0");
    let small = base.clone().with_fragsize(1020u32);
    let large = base.clone().with_fragsize(2000u32);

    store.add_comparison(&small, &stats(0.91)).unwrap();
    store.add_comparison(&large, &stats(0.93)).unwrap();

    assert_eq!(store.get_comparison(&small).unwrap().unwrap().stats.identity, 0.91);
    assert_eq!(store.get_comparison(&large).unwrap().unwrap().stats.identity, 0.93);
    // Unset is its own value, not a wildcard
    assert!(store.get_comparison(&base).unwrap().is_none());
    assert!(store.get_comparison(&small.reversed()).unwrap().is_none());
}

#[test]
fn unset_settings_are_unique_too() {
    let (_dir, path) = temp_db();
    let store = SqliteStore::create(&path).unwrap();
    let q = store.add_genome("hq", "/data/q.fna", "query").unwrap();
    let s = store.add_genome("hs", "/data/s.fna", "subject").unwrap();
    let key = ComparisonKey::new(q, s, "nucmer", "3.1");

    store.add_comparison(&key, &stats(0.99)).unwrap();
    assert!(store.add_comparison(&key, &stats(0.5)).unwrap_err().is_constraint_violation());

    let found = store.get_comparison(&key).unwrap().unwrap();
    assert_eq!(found.key.fragsize, Setting::Unset);
    assert_eq!(found.key.maxmatch, Setting::Unset);
    assert_eq!(found.stats, stats(0.99));
}

#[test]
fn missing_comparison_is_absent_not_error() {
    let (_dir, path) = temp_db();
    let store = SqliteStore::create(&path).unwrap();
    let key = ComparisonKey::new(1, 2, "nucmer", "3.1").with_maxmatch(true);
    assert!(store.get_comparison(&key).unwrap().is_none());
}

#[test]
fn results_persist_across_handles() {
    let (_dir, path) = temp_db();
    let key = {
        let store = SqliteStore::create(&path).unwrap();
        let q = store.add_genome("hq", "/data/q.fna", "query").unwrap();
        let s = store.add_genome("hs", "/data/s.fna", "subject").unwrap();
        let key = ComparisonKey::new(q, s, "nucmer", "3.1").with_maxmatch(false);
        store.add_comparison(&key, &stats(0.97)).unwrap();
        key
    };

    let store = SqliteStore::open(&path).unwrap();
    assert_eq!(store.path(), Some(path.as_path()));
    let found = store.get_comparison(&key).unwrap().unwrap();
    assert_eq!(found.key, key);
}

#[test]
fn lock_contention_fails_without_retrying() {
    let (_dir, path) = temp_db();
    let store = SqliteStore::create(&path).unwrap();

    let other = rusqlite::Connection::open(&path).unwrap();
    other.execute_batch("BEGIN EXCLUSIVE;").unwrap();

    let started = std::time::Instant::now();
    let err = store.add_genome("h", "/p", "d").unwrap_err();
    assert!(matches!(err, Error::Storage(_)));
    assert!(started.elapsed() < std::time::Duration::from_millis(1000));

    other.execute_batch("ROLLBACK;").unwrap();
    assert_eq!(store.add_genome("h", "/p", "d").unwrap(), 1);
}

//! Genome file fingerprinting
//!
//! The store treats hashes as opaque tokens. The CLI uses blake3 digests of
//! the raw file content; any other hasher works as long as it is used
//! consistently for one database.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use crate::{Error, Result};

/// Default FASTA suffixes recognised when scanning a directory
pub const DEFAULT_FASTA_EXTENSIONS: &[&str] = &["fasta", "fas", "fna", "fa"];

/// blake3 hex digest of a file's content
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Description from the first FASTA header line (text after `>`).
///
/// Returns an empty string if the file has no header.
pub fn read_fasta_description(path: &Path) -> Result<String> {
    let reader = BufReader::new(std::fs::File::open(path)?);
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        return Ok(line.strip_prefix('>').map(|d| d.trim().to_string()).unwrap_or_default());
    }
    Ok(String::new())
}

/// Sorted, canonical list of FASTA files directly inside `dir`.
///
/// Entries resolving to the same file (symlinks, overlapping extensions)
/// appear once.
pub fn find_genome_files(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::NotFound(format!("directory {}", dir.display())));
    }

    let mut files = Vec::new();
    for ext in extensions {
        let pattern = dir.join(format!("*.{}", ext));
        let pattern = pattern.to_string_lossy();
        let paths = glob::glob(&pattern)
            .map_err(|e| Error::Config(format!("bad extension {:?}: {}", ext, e)))?;
        for entry in paths {
            let path = entry.map_err(|e| Error::Io(e.into_error()))?;
            if path.is_file() {
                files.push(std::fs::canonicalize(&path)?);
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_hash_depends_only_on_content() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.fna", ">seq1\nACGT\n");
        let b = write(dir.path(), "b.fna", ">seq1\nACGT\n");
        let c = write(dir.path(), "c.fna", ">seq1\nACGA\n");

        assert_eq!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
        assert_ne!(hash_file(&a).unwrap(), hash_file(&c).unwrap());
        assert_eq!(hash_file(&a).unwrap().len(), 64);
    }

    #[test]
    fn test_fasta_description() {
        let dir = tempfile::tempdir().unwrap();
        let with = write(dir.path(), "a.fna", "\n>NC_002696 Caulobacter crescentus\nACGT\n");
        let without = write(dir.path(), "b.fna", "ACGT\n");

        assert_eq!(read_fasta_description(&with).unwrap(), "NC_002696 Caulobacter crescentus");
        assert_eq!(read_fasta_description(&without).unwrap(), "");
    }

    #[test]
    fn test_find_genome_files_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.fna", ">b\n");
        write(dir.path(), "a.fasta", ">a\n");
        write(dir.path(), "notes.txt", "x");

        let exts: Vec<String> = DEFAULT_FASTA_EXTENSIONS.iter().map(|s| s.to_string()).collect();
        let files = find_genome_files(dir.path(), &exts).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.fasta", "b.fna"]);

        assert!(find_genome_files(&dir.path().join("missing"), &exts).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_find_genome_files_collapses_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let real = write(dir.path(), "a.fna", ">a\nACGT\n");
        std::os::unix::fs::symlink(&real, dir.path().join("b.fasta")).unwrap();

        let exts: Vec<String> = DEFAULT_FASTA_EXTENSIONS.iter().map(|s| s.to_string()).collect();
        let files = find_genome_files(dir.path(), &exts).unwrap();
        assert_eq!(files, vec![std::fs::canonicalize(&real).unwrap()]);
    }
}

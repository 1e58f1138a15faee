use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::fingerprint::DEFAULT_FASTA_EXTENSIONS;
use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AnidbConfig {
    pub database: Option<String>,
    pub fasta_extensions: Option<Vec<String>>,
}

impl AnidbConfig {
    /// Database path: explicit flag, then config, then the default
    pub fn database_path(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.database.as_ref().map(PathBuf::from))
            .unwrap_or_else(default_database_path)
    }

    pub fn extensions(&self) -> Vec<String> {
        self.fasta_extensions.clone().unwrap_or_else(|| {
            DEFAULT_FASTA_EXTENSIONS.iter().map(|s| s.to_string()).collect()
        })
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("anidb.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from("anidb.db")
}

pub fn load_config(path: Option<&Path>) -> Result<Option<AnidbConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: AnidbConfig = toml::from_str(&contents)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &AnidbConfig, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::Config(format!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }

    let contents = toml::to_string_pretty(config).map_err(|e| Error::Config(e.to_string()))?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            tracing::info!("Creating database directory {}", parent.display());
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_path_precedence() {
        let config = AnidbConfig {
            database: Some("from_config.db".to_string()),
            fasta_extensions: None,
        };
        assert_eq!(config.database_path(Some(PathBuf::from("flag.db"))), PathBuf::from("flag.db"));
        assert_eq!(config.database_path(None), PathBuf::from("from_config.db"));
        assert_eq!(AnidbConfig::default().database_path(None), default_database_path());
    }

    #[test]
    fn test_config_round_trip_and_no_clobber() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anidb.toml");
        let config = AnidbConfig {
            database: Some("runs/ani.db".to_string()),
            fasta_extensions: Some(vec!["fna".to_string()]),
        };

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.database.as_deref(), Some("runs/ani.db"));
        assert_eq!(loaded.extensions(), vec!["fna".to_string()]);
        assert!(load_config(Some(&dir.path().join("none.toml"))).unwrap().is_none());
    }

    #[test]
    fn test_malformed_config_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anidb.toml");
        std::fs::write(&path, "database = [unterminated").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(matches!(write_config(&path, &AnidbConfig::default(), false), Err(Error::Config(_))));
    }

    #[test]
    fn test_ensure_db_dir_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("ani.db");
        ensure_db_dir(&db).unwrap();
        assert!(dir.path().join("nested").is_dir());
    }
}

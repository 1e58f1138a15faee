//! Pairwise comparison results and their memoization key
//!
//! A comparison is directed: `query` against `subject`. The reverse direction
//! is a separate row because not every method is symmetric.
//!
//! The key of a comparison is the full tuple
//! `(query_id, subject_id, program, version, fragsize, maxmatch)`. Two results
//! for the same genome pair under different settings are different rows, which
//! is what lets results be reused across runs without recomputation.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// A method-specific setting that is part of a comparison's identity.
///
/// `Unset` is a value of its own: a lookup with `Unset` matches only rows
/// stored with the setting unset. It is never a wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Setting {
    #[default]
    Unset,
    Value(String),
}

impl Setting {
    pub fn value(v: impl Into<String>) -> Self {
        Setting::Value(v.into())
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Setting::Unset)
    }

    pub fn as_deref(&self) -> Option<&str> {
        match self {
            Setting::Unset => None,
            Setting::Value(v) => Some(v),
        }
    }
}

/// Fragment size (ANIb/ANIblastall)
impl From<u32> for Setting {
    fn from(fragsize: u32) -> Self {
        Setting::Value(fragsize.to_string())
    }
}

/// Max-match flag (NUCmer), stored the way SQLite stores booleans
impl From<bool> for Setting {
    fn from(maxmatch: bool) -> Self {
        Setting::Value(if maxmatch { "1" } else { "0" }.to_string())
    }
}

impl From<&str> for Setting {
    fn from(v: &str) -> Self {
        Setting::Value(v.to_string())
    }
}

impl<T: Into<Setting>> From<Option<T>> for Setting {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Setting::Unset)
    }
}

impl std::fmt::Display for Setting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Setting::Unset => write!(f, "-"),
            Setting::Value(v) => write!(f, "{}", v),
        }
    }
}

impl ToSql for Setting {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Setting::Unset => ToSqlOutput::Borrowed(ValueRef::Null),
            Setting::Value(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
        })
    }
}

impl FromSql for Setting {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Null => Ok(Setting::Unset),
            ValueRef::Text(_) => value.as_str().map(Setting::value),
            ValueRef::Integer(i) => Ok(Setting::Value(i.to_string())),
            ValueRef::Real(r) => Ok(Setting::Value(r.to_string())),
            ValueRef::Blob(_) => Err(FromSqlError::InvalidType),
        }
    }
}

/// Full memoization key of a comparison
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComparisonKey {
    pub query_id: i64,
    pub subject_id: i64,
    /// Tool that produced the result
    pub program: String,
    /// Version of that tool
    pub version: String,
    pub fragsize: Setting,
    pub maxmatch: Setting,
}

impl ComparisonKey {
    /// Key with both settings unset
    pub fn new(
        query_id: i64,
        subject_id: i64,
        program: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            query_id,
            subject_id,
            program: program.into(),
            version: version.into(),
            fragsize: Setting::Unset,
            maxmatch: Setting::Unset,
        }
    }

    pub fn with_fragsize(mut self, fragsize: impl Into<Setting>) -> Self {
        self.fragsize = fragsize.into();
        self
    }

    pub fn with_maxmatch(mut self, maxmatch: impl Into<Setting>) -> Self {
        self.maxmatch = maxmatch.into();
        self
    }

    /// The same comparison with query and subject swapped
    pub fn reversed(&self) -> Self {
        Self {
            query_id: self.subject_id,
            subject_id: self.query_id,
            ..self.clone()
        }
    }
}

/// Numeric result statistics produced by a comparison program
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonStats {
    pub identity: f64,
    pub coverage: f64,
    pub mismatches: f64,
    pub aligned_length: f64,
}

/// A stored comparison row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// SQLite rowid of the comparison
    pub comparison_id: i64,
    #[serde(flatten)]
    pub key: ComparisonKey,
    #[serde(flatten)]
    pub stats: ComparisonStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setting_conversions() {
        assert_eq!(Setting::from(1020u32), Setting::value("1020"));
        assert_eq!(Setting::from(true), Setting::value("1"));
        assert_eq!(Setting::from(None::<u32>), Setting::Unset);
        assert_eq!(Setting::from(Some(false)), Setting::value("0"));
        assert!(Setting::default().is_unset());
        assert_eq!(Setting::value("x").as_deref(), Some("x"));
    }

    #[test]
    fn test_setting_serializes_unset_as_null() {
        let json = serde_json::to_string(&Setting::Unset).unwrap();
        assert_eq!(json, "null");
        let back: Setting = serde_json::from_str("null").unwrap();
        assert_eq!(back, Setting::Unset);
        let back: Setting = serde_json::from_str("\"1020\"").unwrap();
        assert_eq!(back, Setting::value("1020"));
    }

    #[test]
    fn test_key_reversed_keeps_settings() {
        let key = ComparisonKey::new(1, 2, "nucmer", "3.1").with_maxmatch(true);
        let rev = key.reversed();
        assert_eq!(rev.query_id, 2);
        assert_eq!(rev.subject_id, 1);
        assert_eq!(rev.maxmatch, Setting::value("1"));
        assert_ne!(key, rev);
    }
}

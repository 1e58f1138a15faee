//! CLI output modes: human-readable or JSON

use serde::Serialize;
use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// Suppress human-readable progress output (`ANIDB_QUIET=1`)
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("ANIDB_QUIET")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn from_json_flag(json: bool) -> Self {
        if json { OutputMode::Json } else { OutputMode::Human }
    }

    pub fn is_human(&self) -> bool {
        *self == OutputMode::Human
    }

    /// Print `value` as a JSON object under `key`, or run the human renderer
    pub fn emit<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        human: impl FnOnce(),
    ) -> serde_json::Result<()> {
        match self {
            OutputMode::Json => println!("{}", render_json(key, value)?),
            OutputMode::Human => human(),
        }
        Ok(())
    }
}

/// Pretty JSON object with a single `key`
pub fn render_json<T: Serialize + ?Sized>(key: &str, value: &T) -> serde_json::Result<String> {
    let mut object = serde_json::Map::new();
    object.insert(key.to_string(), serde_json::to_value(value)?);
    serde_json::to_string_pretty(&serde_json::Value::Object(object))
}

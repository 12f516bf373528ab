//! Session persistence: the last edited source pair, saved as a small JSON
//! state file and restored at startup.
//!
//! Storage problems are never fatal. A missing or unreadable file falls back
//! to the built-in defaults, and a failed save degrades to an in-memory-only
//! session; both are logged and the inspector keeps running.

use crate::model::SourcePair;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

/// Default document shown on first launch.
pub const DEFAULT_MARKUP: &str = r#"<div class="a">
  <div class="b">
  My Text
  </div>
</div>"#;

/// Default stylesheet shown on first launch.
pub const DEFAULT_STYLESHEET: &str = r#"* { display: block; padding: 12px; }
.a { background: #ff0000; }
.b { background: #ffa500; }
.c { background: #ffff00; }
.d { background: #008000; }
.e { background: #0000ff; }
.f { background: #4b0082; }
.g { background: #800080; }"#;

/// Errors from the persistence medium.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(#[from] std::io::Error),

    #[error("state file corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Durable mirror of the source pair: two string entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub markup: String,
    pub stylesheet: String,
}

/// Reads the state file once at startup and rewrites it after each
/// successful render.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SessionStore { path: path.into() }
    }

    /// The restored source pair, or the built-in defaults when no usable
    /// state exists.
    pub fn load(&self) -> SourcePair {
        match self.read_state() {
            Ok(Some(state)) => SourcePair::new(state.markup, state.stylesheet),
            Ok(None) => {
                info!(path = %self.path.display(), "no saved state; using defaults");
                defaults()
            }
            Err(err) => {
                warn!(error = %err, "saved state unusable; using defaults");
                defaults()
            }
        }
    }

    fn read_state(&self) -> Result<Option<PersistedState>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    /// Persist `source`. Callers log and continue on failure.
    pub fn save(&self, source: &SourcePair) -> Result<(), StoreError> {
        let state = PersistedState {
            markup: source.markup.clone(),
            stylesheet: source.stylesheet.clone(),
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(&state)?)?;
        Ok(())
    }
}

fn defaults() -> SourcePair {
    SourcePair::new(DEFAULT_MARKUP, DEFAULT_STYLESHEET)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> SessionStore {
        let path = std::env::temp_dir().join(format!(
            "renderlens-store-{}-{}.json",
            name,
            std::process::id()
        ));
        let _ = fs::remove_file(&path);
        SessionStore::new(path)
    }

    #[test]
    fn load_without_prior_state_yields_defaults() {
        let store = temp_store("defaults");
        let source = store.load();
        assert_eq!(source.markup, DEFAULT_MARKUP);
        assert_eq!(source.stylesheet, DEFAULT_STYLESHEET);
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = temp_store("roundtrip");
        let source = SourcePair::new("<p>hello</p>", "p { color: #001122; }");
        store.save(&source).expect("save failed");
        assert_eq!(store.load(), source);
    }

    #[test]
    fn corrupt_state_falls_back_to_defaults() {
        let store = temp_store("corrupt");
        fs::write(&store.path, "{ not json").expect("write failed");
        let source = store.load();
        assert_eq!(source.markup, DEFAULT_MARKUP);
    }

    #[test]
    fn save_into_an_unwritable_path_reports_unavailable() {
        // Parent "directory" is actually a file, so the save must fail.
        let blocker = std::env::temp_dir().join(format!("renderlens-blocker-{}", std::process::id()));
        fs::write(&blocker, "x").expect("write failed");
        let store = SessionStore::new(blocker.join("state.json"));
        let err = store
            .save(&SourcePair::new("", ""))
            .expect_err("expected the save to fail");
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}

//! Key-value persistence for client state (token, cart).
//!
//! Each key maps to one JSON file inside the store directory, the same way a
//! browser keeps `localStorage` entries under fixed names.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

/// Storage key holding the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Storage key holding the serialized cart.
pub const CART_KEY: &str = "cart";

/// Directory-backed JSON key-value store.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Create a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the stored values.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read and decode the value stored under `key`, if any.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let value = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(Some(value))
    }

    /// Encode and store `value` under `key`, replacing any previous value.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create {}", self.root.display()))?;
        let path = self.path_for(key);
        let serialized = serde_json::to_vec_pretty(value)
            .with_context(|| format!("failed to serialize value for {key}"))?;
        // Write then rename so a crash never leaves a half-written collection.
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, serialized)
            .with_context(|| format!("failed to write {}", staging.display()))?;
        fs::rename(&staging, &path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        debug!(key, "stored value");
        Ok(())
    }

    /// Delete the value stored under `key`. Missing keys are not an error.
    pub fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
        }
        Ok(())
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize_key(key)))
    }
}

fn sanitize_key(input: &str) -> String {
    let result: String = input
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_'))
        .collect();
    if result.is_empty() {
        "value".to_string()
    } else {
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn set_get_remove() -> Result<()> {
        let dir = tempdir()?;
        let store = LocalStore::new(dir.path().join("state"));

        assert_eq!(store.get::<String>(TOKEN_KEY)?, None);
        store.set(TOKEN_KEY, "abc")?;
        assert_eq!(store.get::<String>(TOKEN_KEY)?.as_deref(), Some("abc"));

        store.remove(TOKEN_KEY)?;
        store.remove(TOKEN_KEY)?;
        assert_eq!(store.get::<String>(TOKEN_KEY)?, None);
        Ok(())
    }

    #[test]
    fn corrupt_values_are_reported() -> Result<()> {
        let dir = tempdir()?;
        let store = LocalStore::new(dir.path());
        fs::write(dir.path().join("cart.json"), "not json")?;
        assert!(store.get::<Vec<u32>>(CART_KEY).is_err());
        Ok(())
    }

    #[test]
    fn keys_are_sanitized() {
        assert_eq!(sanitize_key("../cart"), "cart");
        assert_eq!(sanitize_key("///"), "value");
    }
}

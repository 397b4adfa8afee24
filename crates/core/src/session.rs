//! Explicit authentication context shared with the HTTP adapter.

use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::storage::{LocalStore, TOKEN_KEY};

/// Cloneable handle to the current bearer token.
///
/// Every clone observes the same token, so the adapter built with one handle
/// sees logins and logouts performed through another.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Arc<RwLock<Option<String>>>,
    store: Option<LocalStore>,
}

impl Session {
    /// A session that lives only in memory.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A session persisted in `store`, restoring any token saved earlier.
    pub fn restore(store: LocalStore) -> Self {
        let token = match store.get::<String>(TOKEN_KEY) {
            Ok(token) => token.filter(|value| !value.trim().is_empty()),
            Err(err) => {
                warn!("Ignoring unreadable stored token: {err:#}");
                None
            }
        };
        if token.is_some() {
            info!("restored saved session token");
        }
        Self {
            token: Arc::new(RwLock::new(token)),
            store: Some(store),
        }
    }

    /// Current token, if logged in.
    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// True when a token is present.
    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }

    /// Store a freshly issued token.
    pub fn login(&self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        if let Some(store) = &self.store {
            store.set(TOKEN_KEY, &token)?;
        }
        *self.token.write() = Some(token);
        info!("session started");
        Ok(())
    }

    /// Forget the token.
    pub fn logout(&self) -> Result<()> {
        *self.token.write() = None;
        if let Some(store) = &self.store {
            store.remove(TOKEN_KEY)?;
        }
        info!("session ended");
        Ok(())
    }
}

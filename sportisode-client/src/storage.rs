use anyhow::Result;
use std::sync::{Mutex, PoisonError};

use crate::session::TokenStore;

/// Where the auth token lives between requests.
///
/// The gateway reads through this on every call, so implementations must be
/// cheap and shareable across tasks.
pub trait StorageAdapter: Send + Sync {
    /// Store the auth token
    fn store_credentials(&self, credentials: &str) -> Result<()>;

    /// Load the auth token, `None` when logged out
    fn load_credentials(&self) -> Result<Option<String>>;

    /// Forget the auth token
    fn clear_credentials(&self) -> Result<()>;
}

/// File-backed adapter used by the CLI
#[derive(Debug, Clone)]
pub struct FileStorageAdapter {
    token_store: TokenStore,
}

impl FileStorageAdapter {
    /// Adapter over the default `~/.sportisode/auth_token` file
    pub fn new() -> Result<Self> {
        Ok(Self {
            token_store: TokenStore::new()?,
        })
    }

    pub fn with_store(token_store: TokenStore) -> Self {
        Self { token_store }
    }
}

impl StorageAdapter for FileStorageAdapter {
    fn store_credentials(&self, credentials: &str) -> Result<()> {
        self.token_store.save(credentials)
    }

    fn load_credentials(&self) -> Result<Option<String>> {
        self.token_store.load()
    }

    fn clear_credentials(&self) -> Result<()> {
        self.token_store.delete()
    }
}

/// Process-local adapter; nothing survives a restart
#[derive(Debug, Default)]
pub struct MemoryStorageAdapter {
    token: Mutex<Option<String>>,
}

impl MemoryStorageAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl StorageAdapter for MemoryStorageAdapter {
    fn store_credentials(&self, credentials: &str) -> Result<()> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(credentials.to_string());
        Ok(())
    }

    fn load_credentials(&self) -> Result<Option<String>> {
        Ok(self.token.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn clear_credentials(&self) -> Result<()> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_storage_adapter() {
        let temp_dir = TempDir::new().unwrap();
        let adapter = FileStorageAdapter::with_store(TokenStore::at(temp_dir.path().join("auth_token")));

        adapter.store_credentials("test-auth-token").unwrap();
        assert_eq!(adapter.load_credentials().unwrap(), Some("test-auth-token".to_string()));

        adapter.clear_credentials().unwrap();
        assert_eq!(adapter.load_credentials().unwrap(), None);
    }

    #[test]
    fn test_memory_storage_adapter() {
        let adapter = MemoryStorageAdapter::with_token("abc");
        assert_eq!(adapter.load_credentials().unwrap(), Some("abc".to_string()));

        adapter.store_credentials("def").unwrap();
        assert_eq!(adapter.load_credentials().unwrap(), Some("def".to_string()));

        adapter.clear_credentials().unwrap();
        assert_eq!(adapter.load_credentials().unwrap(), None);
    }

    use proptest::prelude::*;

    // Whatever was stored is what the gateway reads back, for either backend
    proptest! {
        #[test]
        fn prop_stored_token_round_trips(
            credentials in "[a-zA-Z0-9_-]{8,256}",
            use_file in any::<bool>()
        ) {
            let temp_dir = TempDir::new().unwrap();
            let adapter: Box<dyn StorageAdapter> = if use_file {
                Box::new(FileStorageAdapter::with_store(TokenStore::at(temp_dir.path().join("auth_token"))))
            } else {
                Box::new(MemoryStorageAdapter::new())
            };

            adapter.store_credentials(&credentials).unwrap();
            prop_assert_eq!(adapter.load_credentials().unwrap(), Some(credentials.clone()));

            adapter.clear_credentials().unwrap();
            prop_assert_eq!(adapter.load_credentials().unwrap(), None);
        }
    }
}

//! Session token storage using the system keyring

use std::sync::Mutex;

use keyring::Entry;
use serde::{Deserialize, Serialize};

use super::error::BackendError;
use crate::model::Identity;

/// Service name for keyring storage
const SERVICE_NAME: &str = "targetup";
/// Entry name for the session tokens
const SESSION_ENTRY: &str = "auth-session";

/// Tokens kept between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub identity: Identity,
}

/// Somewhere to keep session tokens between runs
pub trait TokenVault: Send + Sync {
    fn load(&self) -> Result<Option<StoredSession>, BackendError>;

    fn store(&self, session: &StoredSession) -> Result<(), BackendError>;

    /// Remove any stored tokens; succeeds when nothing is stored
    fn purge(&self) -> Result<(), BackendError>;
}

/// Keeps tokens in the OS keyring
pub struct KeyringVault;

impl KeyringVault {
    fn entry() -> Result<Entry, BackendError> {
        Entry::new(SERVICE_NAME, SESSION_ENTRY).map_err(|e| BackendError::KeyringError(e.to_string()))
    }
}

impl TokenVault for KeyringVault {
    fn load(&self) -> Result<Option<StoredSession>, BackendError> {
        match Self::entry()?.get_password() {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(BackendError::KeyringError(e.to_string())),
        }
    }

    fn store(&self, session: &StoredSession) -> Result<(), BackendError> {
        let json = serde_json::to_string(session)?;
        Self::entry()?.set_password(&json).map_err(|e| BackendError::KeyringError(e.to_string()))
    }

    fn purge(&self) -> Result<(), BackendError> {
        match Self::entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(BackendError::KeyringError(e.to_string())),
        }
    }
}

/// Process-local vault for offline mode and tests
#[derive(Default)]
pub struct MemoryVault {
    session: Mutex<Option<StoredSession>>,
}

impl TokenVault for MemoryVault {
    fn load(&self) -> Result<Option<StoredSession>, BackendError> {
        Ok(self.session.lock().map(|s| s.clone()).unwrap_or(None))
    }

    fn store(&self, session: &StoredSession) -> Result<(), BackendError> {
        if let Ok(mut slot) = self.session.lock() {
            *slot = Some(session.clone());
        }
        Ok(())
    }

    fn purge(&self) -> Result<(), BackendError> {
        if let Ok(mut slot) = self.session.lock() {
            *slot = None;
        }
        Ok(())
    }
}

/// Mask a token for display (show first 6 and last 4 chars)
pub fn mask_token(token: &str) -> String {
    if token.len() <= 12 {
        return "*".repeat(token.len());
    }
    format!("{}...{}", &token[..6], &token[token.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;

    fn session() -> StoredSession {
        StoredSession {
            access_token: "eyJhbGciOiJIUzI1NiJ9.payload.sig".into(),
            refresh_token: Some("refresh".into()),
            identity: Identity { user_id: "u1".into(), email: "a@b.in".into(), role: Role::Student },
        }
    }

    #[test]
    fn memory_vault_round_trip_and_purge() {
        let vault = MemoryVault::default();
        assert_eq!(vault.load().unwrap(), None);
        vault.store(&session()).unwrap();
        assert_eq!(vault.load().unwrap(), Some(session()));
        vault.purge().unwrap();
        assert_eq!(vault.load().unwrap(), None);
        // purging twice is fine
        vault.purge().unwrap();
    }

    #[test]
    fn mask_token_hides_middle() {
        let masked = mask_token("eyJhbGciOiJIUzI1NiJ9.payload.sig");
        assert!(masked.starts_with("eyJhbG"));
        assert!(masked.ends_with(".sig"));
        assert!(masked.contains("..."));
        assert_eq!(mask_token("short"), "*****");
    }
}

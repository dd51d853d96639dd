//! Persistent storage for the access/refresh credential pair
//!
//! The store is a flat key/value map with two well-known keys. It tracks no
//! expiry and does no scoping; anything sharing the same backing file sees
//! the same tokens. Reads of a half-populated store must be treated as
//! signed out, which [`CredentialPair::load`] enforces.

use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use tracing::debug;

/// Keys understood by a [`TokenStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKey {
    Access,
    Refresh,
}

impl TokenKey {
    pub const ALL: [Self; 2] = [Self::Access, Self::Refresh];

    /// Storage key name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Access => "accessToken",
            Self::Refresh => "refreshToken",
        }
    }
}

impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key/value storage for session credentials
pub trait TokenStore: Send + Sync {
    fn get(&self, key: TokenKey) -> CoreResult<Option<String>>;
    fn set(&self, key: TokenKey, value: &str) -> CoreResult<()>;
    fn clear(&self) -> CoreResult<()>;

    /// Store both halves of a credential pair
    fn set_pair(&self, pair: &CredentialPair) -> CoreResult<()> {
        self.set(TokenKey::Access, &pair.access_token)?;
        self.set(TokenKey::Refresh, &pair.refresh_token)
    }
}

/// Access and refresh token, always held together
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl CredentialPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Read the pair from a store.
    ///
    /// Returns `None` unless both tokens are present and non-empty.
    pub fn load(store: &dyn TokenStore) -> CoreResult<Option<Self>> {
        let access = store.get(TokenKey::Access)?.filter(|t| !t.is_empty());
        let refresh = store.get(TokenKey::Refresh)?.filter(|t| !t.is_empty());

        match (access, refresh) {
            (Some(access_token), Some(refresh_token)) => Ok(Some(Self {
                access_token,
                refresh_token,
            })),
            (None, None) => Ok(None),
            _ => {
                debug!("Ignoring partial credential pair in token store");
                Ok(None)
            }
        }
    }
}

// Tokens are secrets; keep them out of debug output and logs.
impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

fn poisoned<T>(_: T) -> CoreError {
    CoreError::Poisoned
}

/// In-process token store
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<HashMap<TokenKey, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a credential pair
    pub fn with_pair(pair: &CredentialPair) -> Self {
        let store = Self::new();
        if let Ok(mut tokens) = store.tokens.write() {
            tokens.insert(TokenKey::Access, pair.access_token.clone());
            tokens.insert(TokenKey::Refresh, pair.refresh_token.clone());
        }
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: TokenKey) -> CoreResult<Option<String>> {
        Ok(self.tokens.read().map_err(poisoned)?.get(&key).cloned())
    }

    fn set(&self, key: TokenKey, value: &str) -> CoreResult<()> {
        self.tokens
            .write()
            .map_err(poisoned)?
            .insert(key, value.to_string());
        Ok(())
    }

    fn clear(&self) -> CoreResult<()> {
        self.tokens.write().map_err(poisoned)?.clear();
        Ok(())
    }
}

/// Token store backed by a JSON file.
///
/// The file holds a single object keyed by [`TokenKey::as_str`]. A missing
/// file reads as an empty store and `clear` removes it.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    pub const DEFAULT_FILE_NAME: &'static str = "credentials.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store located at `<dir>/credentials.json`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(Self::DEFAULT_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> CoreResult<HashMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(HashMap::new()),
            Ok(content) => {
                serde_json::from_str(&content).map_err(|e| CoreError::corrupt(&self.path, &e))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_map(&self, map: &HashMap<String, String>) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(map)?;
        let tmp_path = self.path.with_extension("json.tmp");
        write_private(&tmp_path, content.as_bytes())?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

#[cfg(unix)]
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(content)
}

#[cfg(not(unix))]
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    fs::write(path, content)
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: TokenKey) -> CoreResult<Option<String>> {
        Ok(self.read_map()?.remove(key.as_str()))
    }

    fn set(&self, key: TokenKey, value: &str) -> CoreResult<()> {
        let _guard = self.write_lock.lock().map_err(poisoned)?;
        let mut map = self.read_map()?;
        map.insert(key.as_str().to_string(), value.to_string());
        self.write_map(&map)
    }

    fn clear(&self) -> CoreResult<()> {
        let _guard = self.write_lock.lock().map_err(poisoned)?;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn set_pair(&self, pair: &CredentialPair) -> CoreResult<()> {
        let _guard = self.write_lock.lock().map_err(poisoned)?;
        let mut map = self.read_map()?;
        map.insert(
            TokenKey::Access.as_str().to_string(),
            pair.access_token.clone(),
        );
        map.insert(
            TokenKey::Refresh.as_str().to_string(),
            pair.refresh_token.clone(),
        );
        self.write_map(&map)
    }
}

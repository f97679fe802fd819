//! Persistent token cache
//!
//! One JSON file lists every cached account. Tokens themselves sit in a
//! `SecretStore` under the entry's (tenant, client, scope) key; the file never
//! holds them. Only the provider reads or writes the cache; callers treat the
//! content as opaque. A missing file is an empty cache.

use super::secrets::SecretStore;
use crate::error::Result;
use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const CACHE_FILE_NAME: &str = "token_cache.json";

const CACHE_VERSION: u32 = 2;

/// Tokens are treated as expired this long before the server-side expiry
pub const EXPIRY_SKEW: Duration = Duration::minutes(5);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedAccount {
    /// `<oid>.<tid>` for user tokens, the client id for app tokens
    pub home_account_id: String,
    pub username: String,
    pub tenant_id: String,
    pub client_id: String,
    pub scope: String,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_on: DateTime<Utc>,
}

impl CachedAccount {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_on - EXPIRY_SKEW <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn matches(&self, tenant_id: &str, client_id: &str, scope: &str) -> bool {
        self.tenant_id == tenant_id && self.client_id == client_id && self.scope == scope
    }

    /// Secret store key for this entry
    pub fn secret_key(&self) -> String {
        secret_key(&self.tenant_id, &self.client_id, &self.scope)
    }

    fn split(self) -> (AccountRecord, StoredTokens) {
        let tokens = StoredTokens {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
        };
        let record = AccountRecord {
            home_account_id: self.home_account_id,
            username: self.username,
            tenant_id: self.tenant_id,
            client_id: self.client_id,
            scope: self.scope,
            expires_on: self.expires_on,
        };
        (record, tokens)
    }
}

fn secret_key(tenant_id: &str, client_id: &str, scope: &str) -> String {
    format!("{}:{}:{}", tenant_id, client_id, scope)
}

/// What the cache file keeps per entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AccountRecord {
    home_account_id: String,
    username: String,
    tenant_id: String,
    client_id: String,
    scope: String,
    expires_on: DateTime<Utc>,
}

impl AccountRecord {
    fn matches(&self, tenant_id: &str, client_id: &str, scope: &str) -> bool {
        self.tenant_id == tenant_id && self.client_id == client_id && self.scope == scope
    }

    fn secret_key(&self) -> String {
        secret_key(&self.tenant_id, &self.client_id, &self.scope)
    }

    fn join(self, tokens: StoredTokens) -> CachedAccount {
        CachedAccount {
            home_account_id: self.home_account_id,
            username: self.username,
            tenant_id: self.tenant_id,
            client_id: self.client_id,
            scope: self.scope,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_on: self.expires_on,
        }
    }
}

/// What the secret store keeps per entry
#[derive(Serialize, Deserialize)]
struct StoredTokens {
    access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheContents {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    accounts: Vec<AccountRecord>,
}

#[derive(Clone)]
pub struct TokenCache {
    path: PathBuf,
    secrets: Arc<dyn SecretStore>,
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache").field("path", &self.path).finish()
    }
}

impl TokenCache {
    pub fn new(dir: impl AsRef<Path>, secrets: Arc<dyn SecretStore>) -> Self {
        Self {
            path: dir.as_ref().join(CACHE_FILE_NAME),
            secrets,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Entries whose tokens are still in the secret store
    pub fn accounts(&self) -> Result<Vec<CachedAccount>> {
        let mut accounts = Vec::new();
        for record in self.read()?.accounts {
            if let Some(account) = self.hydrate(record)? {
                accounts.push(account);
            }
        }
        Ok(accounts)
    }

    /// The single entry for (tenant, client, scope), if any
    pub fn find(
        &self,
        tenant_id: &str,
        client_id: &str,
        scope: &str,
    ) -> Result<Option<CachedAccount>> {
        match self
            .read()?
            .accounts
            .into_iter()
            .find(|r| r.matches(tenant_id, client_id, scope))
        {
            Some(record) => self.hydrate(record),
            None => Ok(None),
        }
    }

    /// Insert or replace the entry for the account's (tenant, client, scope)
    pub fn store(&self, account: CachedAccount) -> Result<()> {
        let (record, tokens) = account.split();
        let secret = serde_json::to_string(&tokens)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        self.secrets.store(&record.secret_key(), &secret)?;

        let mut contents = self.read()?;
        contents
            .accounts
            .retain(|r| !r.matches(&record.tenant_id, &record.client_id, &record.scope));
        contents.accounts.push(record);
        self.write(&contents)
    }

    /// Remove the entry for the account's (tenant, client, scope) together with
    /// its tokens; returns whether anything changed
    pub fn remove(&self, account: &CachedAccount) -> Result<bool> {
        let secret_removed = self.secrets.delete(&account.secret_key())?;

        let mut contents = self.read()?;
        let before = contents.accounts.len();
        contents
            .accounts
            .retain(|r| !r.matches(&account.tenant_id, &account.client_id, &account.scope));

        if contents.accounts.len() == before {
            return Ok(secret_removed);
        }
        self.write(&contents)?;
        Ok(true)
    }

    /// Delete the backing file; returns whether a file was removed
    pub fn delete_file(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn hydrate(&self, record: AccountRecord) -> Result<Option<CachedAccount>> {
        let key = record.secret_key();
        let Some(secret) = self.secrets.retrieve(&key)? else {
            debug!("No stored tokens for {}", key);
            return Ok(None);
        };

        match serde_json::from_str::<StoredTokens>(&secret) {
            Ok(tokens) => Ok(Some(record.join(tokens))),
            Err(err) => {
                warn!("Ignoring unreadable stored tokens for {}: {}", key, err);
                Ok(None)
            }
        }
    }

    fn read(&self) -> Result<CacheContents> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("No token cache at {:?}", self.path);
                return Ok(CacheContents::default());
            }
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_str(&content) {
            Ok(contents) => Ok(contents),
            Err(err) => {
                // Unreadable cache is discarded; the next write replaces it
                warn!("Ignoring unreadable token cache {:?}: {}", self.path, err);
                Ok(CacheContents::default())
            }
        }
    }

    fn write(&self, contents: &CacheContents) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }

        let versioned = CacheContents {
            version: CACHE_VERSION,
            accounts: contents.accounts.clone(),
        };
        let body = serde_json::to_vec_pretty(&versioned)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut file = open_private(&tmp_path)?;
            file.write_all(&body)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        debug!("Token cache written to {:?}", self.path);
        Ok(())
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
}

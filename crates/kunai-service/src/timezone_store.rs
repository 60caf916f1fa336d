//! Per-user timezone preferences.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono_tz::Tz;
use kunai_core::config::TimezoneConfig;
use kunai_core::types::UserId;
use kunai_time::resolve_timezone;

use crate::error::{ServiceError, ServiceResult};

pub trait TimezoneStore: Send + Sync {
    /// ## Errors
    /// Returns an error if the store cannot be read.
    fn get(&self, user: &UserId) -> ServiceResult<Option<String>>;

    /// ## Errors
    /// Returns an error if the store cannot be written.
    fn set(&self, user: &UserId, timezone: &str) -> ServiceResult<()>;
}

#[derive(Debug, Default)]
pub struct InMemoryTimezoneStore {
    entries: RwLock<HashMap<UserId, String>>,
}

impl InMemoryTimezoneStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimezoneStore for InMemoryTimezoneStore {
    fn get(&self, user: &UserId) -> ServiceResult<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_err| ServiceError::InvariantViolation("timezone store lock poisoned"))?;
        Ok(entries.get(user).cloned())
    }

    fn set(&self, user: &UserId, timezone: &str) -> ServiceResult<()> {
        self.entries
            .write()
            .map_err(|_err| ServiceError::InvariantViolation("timezone store lock poisoned"))?
            .insert(user.clone(), timezone.to_string());
        Ok(())
    }
}

/// A JSON object of user id to timezone name, rewritten on every change.
#[derive(Debug)]
pub struct JsonFileTimezoneStore {
    path: PathBuf,
    entries: RwLock<HashMap<UserId, String>>,
}

impl JsonFileTimezoneStore {
    /// ## Summary
    /// Opens the store at `path`. A missing or empty file is an empty store.
    ///
    /// ## Errors
    /// Returns an error if the file exists but cannot be read or is not a JSON object.
    pub fn open(path: impl AsRef<Path>) -> ServiceResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => HashMap::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), users = entries.len(), "Timezone store loaded");
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TimezoneStore for JsonFileTimezoneStore {
    fn get(&self, user: &UserId) -> ServiceResult<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_err| ServiceError::InvariantViolation("timezone store lock poisoned"))?;
        Ok(entries.get(user).cloned())
    }

    fn set(&self, user: &UserId, timezone: &str) -> ServiceResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_err| ServiceError::InvariantViolation("timezone store lock poisoned"))?;
        let previous = entries.insert(user.clone(), timezone.to_string());
        let written = serde_json::to_string_pretty(&*entries)
            .map_err(ServiceError::from)
            .and_then(|json| std::fs::write(&self.path, json).map_err(ServiceError::from));
        if let Err(e) = written {
            // Keep memory and disk in agreement
            match previous {
                Some(previous) => entries.insert(user.clone(), previous),
                None => entries.remove(user),
            };
            return Err(e);
        }
        Ok(())
    }
}

/// Timezone lookup with a fallback for users who never set one.
#[derive(Clone)]
pub struct UserTimezones {
    store: Arc<dyn TimezoneStore>,
    default: Tz,
}

impl UserTimezones {
    #[must_use]
    pub fn new(store: Arc<dyn TimezoneStore>, default: Tz) -> Self {
        Self { store, default }
    }

    /// ## Summary
    /// Builds the lookup from configuration: a JSON file store when a path is
    /// set, in-memory otherwise.
    ///
    /// ## Errors
    /// Returns an error if the default timezone is unknown or the store file is unreadable.
    pub fn from_config(config: &TimezoneConfig) -> ServiceResult<Self> {
        let default = resolve_timezone(&config.default)?;
        let store: Arc<dyn TimezoneStore> = match config.store_path.as_deref() {
            Some(path) if !path.is_empty() => Arc::new(JsonFileTimezoneStore::open(path)?),
            _ => Arc::new(InMemoryTimezoneStore::new()),
        };
        Ok(Self::new(store, default))
    }

    #[must_use]
    pub const fn default_timezone(&self) -> Tz {
        self.default
    }

    /// ## Summary
    /// The user's timezone, or the default when none is stored or the stored
    /// name no longer resolves.
    ///
    /// ## Errors
    /// Returns an error if the store cannot be read.
    pub fn resolve(&self, user: &UserId) -> ServiceResult<Tz> {
        let Some(name) = self.store.get(user)? else {
            return Ok(self.default);
        };
        Ok(resolve_timezone(&name).unwrap_or_else(|e| {
            tracing::warn!(%user, error = %e, "Stored timezone unusable, using default");
            self.default
        }))
    }

    /// ## Summary
    /// Normalizes `name` and stores it for `user`.
    ///
    /// ## Errors
    /// Returns a `TimeError` if the name is not a known timezone, or an error
    /// if the store cannot be written.
    #[tracing::instrument(skip(self))]
    pub fn set(&self, user: &UserId, name: &str) -> ServiceResult<Tz> {
        let timezone = resolve_timezone(name)?;
        self.store.set(user, timezone.name())?;
        tracing::info!(timezone = timezone.name(), "User timezone set");
        Ok(timezone)
    }
}

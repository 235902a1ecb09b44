//! The classes-root registry store.
//!
//! COM class registration lives under `Software\Classes` of either the
//! machine hive or the current-user hive. The store trait is the seam to
//! that external state: the in-memory implementation backs tests and demos,
//! the Windows implementation talks to the real registry.

use crate::error::Result;
use std::collections::HashMap;
use std::sync::RwLock;

/// Registration scope: which classes root receives the keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegScope {
    /// Machine-wide: `HKEY_LOCAL_MACHINE\Software\Classes`
    Machine,
    /// Per-user: `HKEY_CURRENT_USER\Software\Classes`
    User,
}

impl RegScope {
    /// The classes root this scope writes under
    pub fn classes_root(&self) -> &'static str {
        match self {
            Self::Machine => "HKEY_LOCAL_MACHINE\\Software\\Classes",
            Self::User => "HKEY_CURRENT_USER\\Software\\Classes",
        }
    }
}

/// The registry store holding class registration data.
///
/// Key paths are relative to the scope's classes root, use `\` separators
/// and compare case-insensitively like real registry keys. Setting a value
/// creates the key if needed.
pub trait ClassesStore: Send + Sync {
    /// Create the key if needed and set its default value
    fn set_default_value(&self, scope: RegScope, key: &str, value: &str) -> Result<()>;

    /// Create the key if needed and set a named string value
    fn set_string_value(&self, scope: RegScope, key: &str, name: &str, value: &str) -> Result<()>;

    /// Read the key's default value; `None` if the key is absent
    fn default_value(&self, scope: RegScope, key: &str) -> Result<Option<String>>;

    /// Delete the key; `Ok(false)` if it was already absent
    fn delete_key(&self, scope: RegScope, key: &str) -> Result<bool>;
}

/// A single key's stored values
#[derive(Clone, Debug, Default)]
struct KeyEntry {
    /// Key path as first written, for listings
    path: String,
    default: Option<String>,
    values: HashMap<String, String>,
}

/// In-memory classes store
#[derive(Default)]
pub struct MemoryClassesStore {
    keys: RwLock<HashMap<(RegScope, String), KeyEntry>>,
}

impl MemoryClassesStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn canonical(key: &str) -> String {
        key.to_ascii_lowercase()
    }

    /// Number of keys present in the given scope
    pub fn key_count(&self, scope: RegScope) -> usize {
        let keys = self.keys.read().unwrap();
        keys.keys().filter(|(s, _)| *s == scope).count()
    }

    /// Whether the store holds no keys in any scope
    pub fn is_empty(&self) -> bool {
        self.keys.read().unwrap().is_empty()
    }

    /// All key paths in the given scope, as first written, unordered
    pub fn keys(&self, scope: RegScope) -> Vec<String> {
        let keys = self.keys.read().unwrap();
        keys.iter()
            .filter(|((s, _), _)| *s == scope)
            .map(|(_, entry)| entry.path.clone())
            .collect()
    }

    /// Whether a key exists in the given scope
    pub fn key_exists(&self, scope: RegScope, key: &str) -> bool {
        let keys = self.keys.read().unwrap();
        keys.contains_key(&(scope, Self::canonical(key)))
    }

    /// Read a named string value
    pub fn string_value(&self, scope: RegScope, key: &str, name: &str) -> Option<String> {
        let keys = self.keys.read().unwrap();
        keys.get(&(scope, Self::canonical(key)))
            .and_then(|entry| entry.values.get(name).cloned())
    }
}

impl ClassesStore for MemoryClassesStore {
    fn set_default_value(&self, scope: RegScope, key: &str, value: &str) -> Result<()> {
        let mut keys = self.keys.write().unwrap();
        let entry = keys
            .entry((scope, Self::canonical(key)))
            .or_insert_with(|| KeyEntry {
                path: key.to_string(),
                ..KeyEntry::default()
            });
        entry.default = Some(value.to_string());
        Ok(())
    }

    fn set_string_value(&self, scope: RegScope, key: &str, name: &str, value: &str) -> Result<()> {
        let mut keys = self.keys.write().unwrap();
        let entry = keys
            .entry((scope, Self::canonical(key)))
            .or_insert_with(|| KeyEntry {
                path: key.to_string(),
                ..KeyEntry::default()
            });
        entry.values.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn default_value(&self, scope: RegScope, key: &str) -> Result<Option<String>> {
        let keys = self.keys.read().unwrap();
        Ok(keys
            .get(&(scope, Self::canonical(key)))
            .and_then(|entry| entry.default.clone()))
    }

    fn delete_key(&self, scope: RegScope, key: &str) -> Result<bool> {
        let mut keys = self.keys.write().unwrap();
        Ok(keys.remove(&(scope, Self::canonical(key))).is_some())
    }
}

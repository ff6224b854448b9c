use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Result, bail};

use crate::error::DrillError;

/// Durable storage for the mistake ledger.
pub trait LedgerStore {
    fn load_mistakes(&self) -> Result<Vec<String>>;
    fn save_mistakes(&self, keys: &[String]) -> Result<()>;
}

/// Phrase keys the learner has missed, oldest first, without duplicates.
///
/// Persistence is best effort: failed reads start an empty ledger and failed
/// writes are logged, leaving the in-memory list authoritative.
pub struct MistakeLedger {
    keys: Vec<String>,
    backend: Box<dyn LedgerStore>,
}

impl MistakeLedger {
    pub fn load(backend: Box<dyn LedgerStore>) -> Self {
        let keys = read_keys(backend.as_ref());
        Self { keys, backend }
    }

    /// Replace the in-memory keys with what the backend holds now.
    pub fn reload(&mut self) {
        self.keys = read_keys(self.backend.as_ref());
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    /// Returns true if the key was newly added.
    pub fn add(&mut self, key: &str) -> bool {
        if self.contains(key) {
            return false;
        }
        self.keys.push(key.to_string());
        true
    }

    /// Returns true if the key was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.keys.len();
        self.keys.retain(|k| k != key);
        self.keys.len() != before
    }

    /// Remove several keys and persist once. Returns how many were removed.
    pub fn remove_many<S: AsRef<str>>(&mut self, keys: &[S]) -> usize {
        let mut removed = 0;
        for key in keys {
            if self.remove(key.as_ref()) {
                removed += 1;
            }
        }
        if removed > 0 {
            self.save();
        }
        removed
    }

    /// Persist the current keys. Failure is logged and reported as `false`.
    pub fn save(&self) -> bool {
        match self.backend.save_mistakes(&self.keys) {
            Ok(()) => true,
            Err(err) => {
                let err = DrillError::Persistence(err);
                tracing::warn!(error = %err, "keeping mistake ledger in memory");
                false
            }
        }
    }
}

fn read_keys(backend: &dyn LedgerStore) -> Vec<String> {
    let raw = backend.load_mistakes().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "mistake ledger unreadable, starting empty");
        Vec::new()
    });
    let mut keys: Vec<String> = Vec::with_capacity(raw.len());
    for key in raw {
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    tracing::debug!(count = keys.len(), "loaded mistake ledger");
    keys
}

/// In-memory ledger storage. Clones share the same contents.
#[derive(Clone, Default)]
pub struct MemoryStore {
    keys: Rc<RefCell<Vec<String>>>,
    fail_writes: Rc<RefCell<bool>>,
}

impl MemoryStore {
    pub fn with_keys(keys: &[&str]) -> Self {
        let store = Self::default();
        *store.keys.borrow_mut() = keys.iter().map(|k| k.to_string()).collect();
        store
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.keys.borrow().clone()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.borrow_mut() = fail;
    }
}

impl LedgerStore for MemoryStore {
    fn load_mistakes(&self) -> Result<Vec<String>> {
        Ok(self.snapshot())
    }

    fn save_mistakes(&self, keys: &[String]) -> Result<()> {
        if *self.fail_writes.borrow() {
            bail!("storage is read-only");
        }
        *self.keys.borrow_mut() = keys.to_vec();
        Ok(())
    }
}

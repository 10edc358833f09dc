// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PhishGuard

//! Opaque secure key-value store implementations.
//!
//! ## Table Layout
//!
//! - `credentials`: key → value (bearer token, role tag)

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

// =============================================================================
// Table Definitions
// =============================================================================

/// Single credential table: key → value.
const CREDENTIALS: TableDefinition<&str, &str> = TableDefinition::new("credentials");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("store transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("store table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("store read/write error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("store commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("store backend unavailable: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// SecureStore Trait
// =============================================================================

/// Opaque secure key-value store with guaranteed-completion operations.
///
/// The platform keychain is an external collaborator; implementations of
/// this trait are the only thing the rest of the crate sees.
pub trait SecureStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove the entry under `key`. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> StoreResult<()>;
}

// =============================================================================
// MemorySecureStore
// =============================================================================

/// Process-lifetime store; a fresh process start observes nothing.
#[derive(Default)]
pub struct MemorySecureStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySecureStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }
}

impl SecureStore for MemorySecureStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

// =============================================================================
// RedbSecureStore
// =============================================================================

/// Durable store backed by an embedded ACID database.
pub struct RedbSecureStore {
    db: Database,
}

impl RedbSecureStore {
    /// Open (or create) the store at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create the table so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(CREDENTIALS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }
}

impl SecureStore for RedbSecureStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CREDENTIALS)?;
        let value = table.get(key)?.map(|guard| guard.value().to_string());
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CREDENTIALS)?;
            table.insert(key, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CREDENTIALS)?;
            table.remove(key)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PhishGuard

//! # Secure Credential Storage
//!
//! The on-device secure store is modeled as an opaque key-value interface
//! ([`SecureStore`]): `get`, `set`, `delete`. The platform keychain is an
//! external collaborator; this module supplies the seam plus two
//! implementations:
//!
//! - [`MemorySecureStore`] - process-lifetime only; a fresh start observes
//!   nothing. Used when sessions must not survive a restart.
//! - [`RedbSecureStore`] - durable, backed by an embedded ACID database
//!   under the configured data directory.
//!
//! ## Storage Layout
//!
//! ```text
//! {data_dir}/
//!   credentials.redb    # key-value entries (token, role tag)
//! ```

pub mod paths;
pub mod secure_store;

pub use paths::StoragePaths;
pub use secure_store::{MemorySecureStore, RedbSecureStore, SecureStore, StoreError, StoreResult};

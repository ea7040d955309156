//! Authentication module for managing the signed-in session.
//!
//! This module provides:
//! - `SessionStore`: the single owner of "who is logged in", reconciled
//!   with durable storage
//! - `SessionStorage`: the string key/value port the store persists through
//! - `MemoryStorage`, `FileStorage`, `KeyringStorage`: storage backends
//!
//! The identity and the token are persisted as two independent entries
//! (`user` and `token`) and restored together on startup.

pub mod credentials;
pub mod session;
pub mod storage;

pub use credentials::KeyringStorage;
pub use session::{Identity, SessionState, SessionStatus, SessionStore, TOKEN_KEY, USER_KEY};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};

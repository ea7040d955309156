//! REST API client module for the GameShelf backend.
//!
//! This module provides the `ApiClient` for the account, dashboard and
//! catalog endpoints. Protected endpoints expect the session's bearer
//! token, which the caller hands to the client after login.

pub mod client;
pub mod error;

pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use error::{is_unauthorized, user_message, ApiError};

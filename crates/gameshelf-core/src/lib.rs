//! Gameshelf core library.
//!
//! Everything the gameshelf front-ends share: the session store and its
//! storage backends, the REST API client, the data models, form validation
//! and the catalog filtering helpers.

pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod forms;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{Identity, SessionState, SessionStatus, SessionStore};
pub use config::Config;

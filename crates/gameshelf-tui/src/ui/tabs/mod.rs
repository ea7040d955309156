//! Tab-specific content rendering.

pub mod dashboard;
pub mod games;
pub mod manage_games;
pub mod users;

//! Data models for gameshelf entities.
//!
//! This module contains the data structures exchanged with the API server:
//!
//! - `Game`, `Review`: catalog entries and their reviews
//! - `User`, `LoginResponse`: accounts and the login payload
//! - `UserDashboard`, `UserStats`: per-user play and review statistics
//! - Request bodies: `LoginRequest`, `RegisterRequest`, `ProfileUpdate`,
//!   `UserUpdate`, `GameFormData`, `GameUpdate`, `ReviewRequest`, `PlayRequest`

pub mod dashboard;
pub mod game;
pub mod user;

pub use dashboard::{GameSummary, MostPlayedGame, PlayedGame, UserComment, UserDashboard, UserStats};
pub use game::{
    CreatedGame, DetailedGames, Game, GameComment, GameComments, GameFormData, GameUpdate,
    MessageResponse, PlayRequest, PlayResponse, Review, ReviewAuthor, ReviewRequest,
};
pub use user::{LoginRequest, LoginResponse, ProfileUpdate, RegisterRequest, User, UserUpdate};

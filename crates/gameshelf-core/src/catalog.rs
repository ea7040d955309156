//! Catalog filtering and review rules shared by the list and admin views.

use crate::auth::Identity;
use crate::models::{Game, Review, User};
use crate::utils::format::{cmp_ignore_case, contains_ignore_case, format_play_time};

/// Minutes a user must have logged on a game before reviewing it
pub const MIN_REVIEW_PLAY_MINUTES: u32 = 60;

/// Games whose name or brand contains `search`, restricted to `category` when one is selected
pub fn filter_games<'a>(games: &'a [Game], search: &str, category: Option<&str>) -> Vec<&'a Game> {
    let search = search.trim();
    games
        .iter()
        .filter(|game| {
            contains_ignore_case(&game.name, search) || contains_ignore_case(&game.brand, search)
        })
        .filter(|game| match category {
            Some(category) => game.category.iter().any(|c| c == category),
            None => true,
        })
        .collect()
}

/// Every category used across the catalog, sorted and de-duplicated
pub fn all_categories(games: &[Game]) -> Vec<String> {
    let mut categories: Vec<String> = games
        .iter()
        .flat_map(|game| game.category.iter())
        .filter(|c| !c.trim().is_empty())
        .cloned()
        .collect();
    categories.sort_by(|a, b| cmp_ignore_case(a, b).then_with(|| a.cmp(b)));
    categories.dedup();
    categories
}

/// Admin search: name, brand or any category
pub fn admin_filter_games<'a>(games: &'a [Game], search: &str) -> Vec<&'a Game> {
    let search = search.trim();
    games
        .iter()
        .filter(|game| {
            contains_ignore_case(&game.name, search)
                || contains_ignore_case(&game.brand, search)
                || game.category.iter().any(|c| contains_ignore_case(c, search))
        })
        .collect()
}

pub fn filter_users<'a>(users: &'a [User], search: &str) -> Vec<&'a User> {
    let search = search.trim();
    users
        .iter()
        .filter(|user| {
            contains_ignore_case(&user.name, search) || contains_ignore_case(&user.email, search)
        })
        .collect()
}

pub fn find_user_review<'a>(game: &'a Game, user_id: &str) -> Option<&'a Review> {
    game.reviews.iter().find(|review| review.user.id == user_id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewEligibility {
    SignInRequired,
    NeedsPlayTime { current: u32 },
    Disabled,
    Eligible,
}

impl ReviewEligibility {
    /// Why reviewing is unavailable, if it is
    pub fn message(&self) -> Option<String> {
        match self {
            ReviewEligibility::SignInRequired => Some("Sign in to leave a review".to_string()),
            ReviewEligibility::NeedsPlayTime { current } => Some(format!(
                "You need to play this game for at least 1 hour to leave a review. Current playtime: {}.",
                format_play_time(*current)
            )),
            ReviewEligibility::Disabled => {
                Some("Reviews are currently disabled for this game.".to_string())
            }
            ReviewEligibility::Eligible => None,
        }
    }
}

/// Whether `identity` may review `game` having played it for `play_minutes`
pub fn review_eligibility(
    game: &Game,
    identity: Option<&Identity>,
    play_minutes: u32,
) -> ReviewEligibility {
    if identity.is_none() {
        return ReviewEligibility::SignInRequired;
    }
    if play_minutes < MIN_REVIEW_PLAY_MINUTES {
        return ReviewEligibility::NeedsPlayTime {
            current: play_minutes,
        };
    }
    if game.disable_rating || game.disable_commenting {
        return ReviewEligibility::Disabled;
    }
    ReviewEligibility::Eligible
}

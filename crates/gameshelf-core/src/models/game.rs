use serde::{Deserialize, Serialize};

use crate::utils::format::format_play_time;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewAuthor {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    pub user: ReviewAuthor,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
    #[serde(rename = "userPlayTime", default)]
    pub user_play_time: Option<u32>,
}

impl Review {
    /// Comment text, treating blank comments as absent
    pub fn comment_text(&self) -> Option<&str> {
        self.comment.as_deref().filter(|c| !c.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(rename = "numReviews", default)]
    pub num_reviews: u32,
    #[serde(rename = "playTime", default)]
    pub play_time: Option<u32>,
    #[serde(rename = "currentUserPlayTime", default)]
    pub current_user_play_time: Option<u32>,
    #[serde(rename = "disableRating", default)]
    pub disable_rating: bool,
    #[serde(rename = "disableCommenting", default)]
    pub disable_commenting: bool,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(rename = "releaseDate", default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub developer: Option<String>,
    #[serde(default)]
    pub platform: Vec<String>,
    #[serde(rename = "voiceActing", default)]
    pub voice_acting: Option<bool>,
    #[serde(rename = "soundtrackIncluded", default)]
    pub soundtrack_included: Option<bool>,
}

impl Game {
    /// Total play time across all players, for display
    pub fn display_play_time(&self) -> String {
        match self.play_time {
            Some(minutes) => format_play_time(minutes),
            None => "-".to_string(),
        }
    }

    /// First categories joined for list rows, with a "+N" suffix for the rest
    pub fn category_summary(&self, max: usize) -> String {
        let shown: Vec<&str> = self.category.iter().take(max).map(|c| c.as_str()).collect();
        let mut summary = shown.join(", ");
        if self.category.len() > max {
            summary.push_str(&format!(" +{}", self.category.len() - max));
        }
        summary
    }
}

/// Response of `GET /products/detailed`
#[derive(Debug, Clone, Deserialize)]
pub struct DetailedGames {
    pub games: Vec<Game>,
}

/// Body for creating a game, and the full form for editing one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameFormData {
    pub name: String,
    pub image: String,
    pub brand: String,
    pub category: Vec<String>,
    pub description: String,
    #[serde(rename = "disableRating")]
    pub disable_rating: bool,
    #[serde(rename = "disableCommenting")]
    pub disable_commenting: bool,
    #[serde(rename = "releaseDate", skip_serializing_if = "Option::is_none", default)]
    pub release_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub developer: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub platform: Vec<String>,
    #[serde(rename = "voiceActing", skip_serializing_if = "Option::is_none", default)]
    pub voice_acting: Option<bool>,
    #[serde(rename = "soundtrackIncluded", skip_serializing_if = "Option::is_none", default)]
    pub soundtrack_included: Option<bool>,
}

/// Partial game update; only the fields that are set are sent
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GameUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "disableRating", skip_serializing_if = "Option::is_none")]
    pub disable_rating: Option<bool>,
    #[serde(rename = "disableCommenting", skip_serializing_if = "Option::is_none")]
    pub disable_commenting: Option<bool>,
    #[serde(rename = "releaseDate", skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Vec<String>>,
    #[serde(rename = "voiceActing", skip_serializing_if = "Option::is_none")]
    pub voice_acting: Option<bool>,
    #[serde(rename = "soundtrackIncluded", skip_serializing_if = "Option::is_none")]
    pub soundtrack_included: Option<bool>,
}

impl GameUpdate {
    pub fn toggle_rating(game: &Game) -> Self {
        Self {
            disable_rating: Some(!game.disable_rating),
            ..Default::default()
        }
    }

    pub fn toggle_commenting(game: &Game) -> Self {
        Self {
            disable_commenting: Some(!game.disable_commenting),
            ..Default::default()
        }
    }
}

impl From<GameFormData> for GameUpdate {
    fn from(form: GameFormData) -> Self {
        Self {
            name: Some(form.name),
            image: Some(form.image),
            brand: Some(form.brand),
            category: Some(form.category),
            description: Some(form.description),
            disable_rating: Some(form.disable_rating),
            disable_commenting: Some(form.disable_commenting),
            release_date: form.release_date,
            developer: form.developer,
            platform: if form.platform.is_empty() {
                None
            } else {
                Some(form.platform)
            },
            voice_acting: form.voice_acting,
            soundtrack_included: form.soundtrack_included,
        }
    }
}

/// Response of `POST /products`
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedGame {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReviewRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlayRequest {
    pub time: u32,
}

/// Response of `POST /products/:id/play`
#[derive(Debug, Clone, Deserialize)]
pub struct PlayResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "playTime", default)]
    pub play_time: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameComment {
    pub user: ReviewAuthor,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(rename = "userPlayTime", default)]
    pub user_play_time: u32,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
}

/// Response of `GET /products/:id/comments`
#[derive(Debug, Clone, Deserialize)]
pub struct GameComments {
    #[serde(rename = "gameId")]
    pub game_id: String,
    #[serde(rename = "gameName", default)]
    pub game_name: String,
    #[serde(default)]
    pub comments: Vec<GameComment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "_id": "g1",
            "name": "Hollow Knight",
            "image": "https://img/hk.png",
            "brand": "Team Cherry",
            "category": ["Metroidvania", "Indie", "Action"],
            "description": "Bugs.",
            "rating": 4.5,
            "numReviews": 2,
            "playTime": 130,
            "disableRating": false,
            "disableCommenting": true,
            "reviews": [
                {"user": {"_id": "u1", "name": "Ann"}, "rating": 5, "comment": "Great", "createdAt": "2024-03-01T10:00:00Z", "userPlayTime": 90}
            ]
        }"#
    }

    #[test]
    fn test_game_deserialize() {
        let game: Game = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(game.id, "g1");
        assert_eq!(game.num_reviews, 2);
        assert!(game.disable_commenting);
        assert_eq!(game.reviews[0].user.name, "Ann");
        assert_eq!(game.reviews[0].rating, Some(5));
        assert_eq!(game.current_user_play_time, None);
        assert!(game.platform.is_empty());
    }

    #[test]
    fn test_game_minimal_fields() {
        let game: Game = serde_json::from_str(r#"{"_id": "g2", "name": "Tetris"}"#).unwrap();
        assert_eq!(game.rating, 0.0);
        assert!(game.category.is_empty());
        assert_eq!(game.display_play_time(), "-");
    }

    #[test]
    fn test_category_summary() {
        let game: Game = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(game.category_summary(2), "Metroidvania, Indie +1");
        assert_eq!(game.category_summary(5), "Metroidvania, Indie, Action");
    }

    #[test]
    fn test_game_update_only_sends_set_fields() {
        let game: Game = serde_json::from_str(sample_json()).unwrap();
        let update = GameUpdate::toggle_commenting(&game);
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"disableCommenting": false}));
    }

    #[test]
    fn test_review_request_skips_empty() {
        let body = ReviewRequest {
            rating: Some(4),
            comment: None,
        };
        assert_eq!(serde_json::to_value(&body).unwrap(), serde_json::json!({"rating": 4}));
    }

    #[test]
    fn test_review_blank_comment_is_absent() {
        let review: Review =
            serde_json::from_str(r#"{"user": {"_id": "u"}, "comment": "   "}"#).unwrap();
        assert_eq!(review.comment_text(), None);
    }
}

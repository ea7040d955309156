use serde::{Deserialize, Serialize};

use super::user::User;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    #[serde(rename = "totalPlayTime", default)]
    pub total_play_time: u32,
    #[serde(rename = "averageRating", default)]
    pub average_rating: f64,
    #[serde(rename = "ratingCount", default)]
    pub rating_count: u32,
    #[serde(rename = "gamesPlayedCount", default)]
    pub games_played_count: u32,
    #[serde(rename = "commentsCount", default)]
    pub comments_count: u32,
}

impl UserStats {
    pub fn display_average_rating(&self) -> String {
        if self.average_rating > 0.0 {
            format!("{:.1}", self.average_rating)
        } else {
            "No ratings yet".to_string()
        }
    }
}

/// The game fields embedded in dashboard entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayedGame {
    pub game: GameSummary,
    #[serde(rename = "playTime", default)]
    pub play_time: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MostPlayedGame {
    pub game: GameSummary,
    #[serde(rename = "playTime", default)]
    pub play_time: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserComment {
    #[serde(rename = "gameId")]
    pub game_id: String,
    #[serde(rename = "gameName", default)]
    pub game_name: String,
    #[serde(rename = "gameImage", default)]
    pub game_image: String,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub comment: String,
    #[serde(rename = "playTime", default)]
    pub play_time: u32,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
}

/// Response of `GET /users/dashboard`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDashboard {
    pub user: User,
    #[serde(default)]
    pub stats: UserStats,
    #[serde(rename = "mostPlayedGame", default)]
    pub most_played_game: Option<MostPlayedGame>,
    #[serde(default)]
    pub comments: Vec<UserComment>,
    #[serde(rename = "playedGames", default)]
    pub played_games: Vec<PlayedGame>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_deserialize() {
        let json = r#"{
            "user": {"_id": "1", "name": "Ann", "email": "a@x.com", "isAdmin": false},
            "stats": {"totalPlayTime": 95, "averageRating": 4.26, "ratingCount": 4, "gamesPlayedCount": 3, "commentsCount": 1},
            "mostPlayedGame": {"game": {"_id": "g1", "name": "Celeste", "image": "", "category": ["Platformer"], "brand": "EXOK"}, "playTime": 60},
            "comments": [{"gameId": "g1", "gameName": "Celeste", "gameImage": "", "category": [], "comment": "Hard", "playTime": 60, "rating": 5, "createdAt": "2024-01-02T00:00:00Z"}],
            "playedGames": [{"game": {"_id": "g1", "name": "Celeste", "image": "", "category": [], "brand": "EXOK", "rating": 4.8}, "playTime": 60}]
        }"#;
        let dashboard: UserDashboard = serde_json::from_str(json).unwrap();
        assert_eq!(dashboard.stats.total_play_time, 95);
        assert_eq!(dashboard.stats.display_average_rating(), "4.3");
        assert_eq!(dashboard.most_played_game.unwrap().game.name, "Celeste");
        assert_eq!(dashboard.played_games[0].game.rating, Some(4.8));
    }

    #[test]
    fn test_dashboard_without_activity() {
        let json = r#"{"user": {"_id": "1", "name": "Ann", "email": "a@x.com"}, "mostPlayedGame": null}"#;
        let dashboard: UserDashboard = serde_json::from_str(json).unwrap();
        assert!(dashboard.most_played_game.is_none());
        assert_eq!(dashboard.stats.display_average_rating(), "No ratings yet");
        assert!(dashboard.played_games.is_empty());
    }
}

//! API client for the GameShelf REST backend.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! requests against the catalog, review and account endpoints.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::models::{
    CreatedGame, DetailedGames, Game, GameComments, GameFormData, GameUpdate, LoginRequest,
    LoginResponse, MessageResponse, MostPlayedGame, PlayRequest, PlayResponse, ProfileUpdate,
    RegisterRequest, ReviewRequest, User, UserComment, UserDashboard, UserStats, UserUpdate,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL used when none is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// The backend wraps some payloads as `{data, message}` and returns others bare
fn unwrap_envelope(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(serde_json::Value::Null)
        }
        other => other,
    }
}

/// API client for the GameShelf backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Arc<str>,
    token: Option<Arc<str>>,
    backoff_ms: u64,
}

impl ApiClient {
    /// Create a new API client against `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            token: None,
            backoff_ms: INITIAL_BACKOFF_MS,
        })
    }

    /// Override the initial rate-limit backoff (tests use a few milliseconds)
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff_ms = backoff.as_millis() as u64;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: &str) {
        self.token = Some(Arc::from(token));
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: &str) -> Self {
        Self {
            client: self.client.clone(),
            base_url: Arc::clone(&self.base_url),
            token: Some(Arc::from(token)),
            backoff_ms: self.backoff_ms,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    fn parse_body<T: DeserializeOwned>(path: &str, text: &str) -> Result<T> {
        // Empty bodies (204s, bare deletes) decode as JSON null
        let text = if text.trim().is_empty() { "null" } else { text };
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", path, e)))?;
        let parsed = serde_json::from_value(unwrap_envelope(value))
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", path, e)))?;
        Ok(parsed)
    }

    async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        let mut retries = 0;
        let mut backoff_ms = self.backoff_ms;

        loop {
            let mut builder = self
                .client
                .request(method.clone(), &url)
                .headers(self.auth_headers()?);
            if let Some(body) = body {
                builder = builder.json(body);
            }

            let response = builder
                .send()
                .await
                .with_context(|| format!("Failed to send {} request to {}", method, url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    let text = response
                        .text()
                        .await
                        .with_context(|| format!("Failed to read response from {}", url))?;
                    debug!(method = %method, path = path, bytes = text.len(), "Response received");
                    return Self::parse_body(path, &text);
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T> {
        self.request(Method::POST, path, Some(body)).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T> {
        self.request(Method::PUT, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<String> {
        let response: Option<MessageResponse> =
            self.request::<_, ()>(Method::DELETE, path, None).await?;
        Ok(response.map(|r| r.message).unwrap_or_default())
    }

    // ===== Account =====

    /// Exchange credentials for an identity and a bearer token
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        debug!(email = %request.email, "Logging in");
        self.post("/users/login", request).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<User> {
        self.post("/users", request).await
    }

    pub async fn get_profile(&self) -> Result<User> {
        self.get("/users/profile").await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
        self.put("/users/profile", update).await
    }

    pub async fn fetch_dashboard(&self) -> Result<UserDashboard> {
        self.get("/users/dashboard").await
    }

    pub async fn fetch_user_stats(&self) -> Result<UserStats> {
        self.get("/users/stats").await
    }

    /// `None` when the user has not played anything yet
    pub async fn fetch_most_played(&self) -> Result<Option<MostPlayedGame>> {
        self.get("/users/most-played").await
    }

    pub async fn fetch_user_comments(&self) -> Result<Vec<UserComment>> {
        self.get("/users/comments").await
    }

    // ===== User administration =====

    pub async fn fetch_users(&self) -> Result<Vec<User>> {
        self.get("/users").await
    }

    pub async fn update_user(&self, id: &str, update: &UserUpdate) -> Result<User> {
        self.put(&format!("/users/{}", id), update).await
    }

    pub async fn delete_user(&self, id: &str) -> Result<String> {
        self.delete(&format!("/users/{}", id)).await
    }

    // ===== Catalog =====

    pub async fn fetch_games(&self) -> Result<Vec<Game>> {
        self.get("/products").await
    }

    /// Games with play time and per-user fields filled in
    pub async fn fetch_detailed_games(&self) -> Result<Vec<Game>> {
        let detailed: DetailedGames = self.get("/products/detailed").await?;
        debug!(count = detailed.games.len(), "Fetched detailed games");
        Ok(detailed.games)
    }

    pub async fn fetch_game(&self, id: &str) -> Result<Game> {
        self.get(&format!("/products/{}", id)).await
    }

    pub async fn create_game(&self, game: &GameFormData) -> Result<CreatedGame> {
        self.post("/products", game).await
    }

    pub async fn update_game(&self, id: &str, update: &GameUpdate) -> Result<Game> {
        self.put(&format!("/products/{}", id), update).await
    }

    pub async fn delete_game(&self, id: &str) -> Result<String> {
        self.delete(&format!("/products/{}", id)).await
    }

    pub async fn review_game(&self, id: &str, review: &ReviewRequest) -> Result<String> {
        let response: Option<MessageResponse> =
            self.post(&format!("/products/{}/reviews", id), review).await?;
        Ok(response.map(|r| r.message).unwrap_or_default())
    }

    pub async fn play_game(&self, id: &str, play: &PlayRequest) -> Result<PlayResponse> {
        self.post(&format!("/products/{}/play", id), play).await
    }

    pub async fn fetch_game_comments(&self, id: &str) -> Result<GameComments> {
        self.get(&format!("/products/{}/comments", id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_body_accepts_bare_and_wrapped() {
        let bare: User = ApiClient::parse_body(
            "/users/profile",
            r#"{"_id": "1", "name": "Ann", "email": "a@x.com"}"#,
        )
        .unwrap();
        let wrapped: User = ApiClient::parse_body(
            "/users/profile",
            r#"{"data": {"_id": "1", "name": "Ann", "email": "a@x.com"}, "message": "ok"}"#,
        )
        .unwrap();
        assert_eq!(bare, wrapped);
    }

    #[test]
    fn test_parse_body_message_only() {
        let parsed: Option<MessageResponse> =
            ApiClient::parse_body("/products/1", r#"{"message": "Game removed"}"#).unwrap();
        assert_eq!(parsed.unwrap().message, "Game removed");

        let missing: Option<MostPlayedGame> =
            ApiClient::parse_body("/users/most-played", r#"{"data": null}"#).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_parse_body_empty_as_none() {
        let parsed: Option<MessageResponse> = ApiClient::parse_body("/products/1", "").unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn test_parse_body_invalid_is_invalid_response() {
        let err = ApiClient::parse_body::<DetailedGames>("/products/detailed", r#"{"items": []}"#)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = ApiClient::new("http://localhost:5000/api/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000/api");
        assert_eq!(client.url("/users"), "http://localhost:5000/api/users");
    }

    #[test]
    fn test_token_handling() {
        let mut client = ApiClient::new(DEFAULT_BASE_URL).unwrap();
        assert!(client.auth_headers().unwrap().is_empty());

        client.set_token("abc");
        let headers = client.auth_headers().unwrap();
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Bearer abc");

        let other = client.with_token("xyz");
        assert_eq!(
            other.auth_headers().unwrap().get(header::AUTHORIZATION).unwrap(),
            "Bearer xyz"
        );

        client.clear_token();
        assert!(!client.has_token());
    }
}

use std::time::Duration;

use gameshelf_core::api::{is_unauthorized, user_message};
use gameshelf_core::models::{GameUpdate, LoginRequest, PlayRequest, ReviewRequest};
use gameshelf_core::{ApiClient, ApiError, SessionStore};
use gameshelf_core::auth::MemoryStorage;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper: a client pointed at the mock server's `/api` prefix.
async fn mock_client() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::new(&format!("{}/api", server.uri()))
        .unwrap()
        .with_backoff(Duration::from_millis(5));
    (server, client)
}

#[tokio::test]
async fn test_login_then_authenticated_request() {
    let (server, mut client) = mock_client().await;

    Mock::given(method("POST"))
        .and(path("/api/users/login"))
        .and(body_json(json!({"email": "ann@example.com", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "u1",
            "name": "Ann",
            "email": "ann@example.com",
            "isAdmin": false,
            "token": "tok-1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/users/profile"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"_id": "u1", "name": "Ann", "email": "ann@example.com"},
            "message": "ok"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut store = SessionStore::open(MemoryStorage::new());
    store.begin_login();
    let response = client
        .login(&LoginRequest {
            email: "ann@example.com".to_string(),
            password: "pw".to_string(),
        })
        .await
        .unwrap();
    let (identity, token) = response.into_parts().unwrap();
    client.set_token(&token);
    store.login(identity, token);

    let profile = client.get_profile().await.unwrap();
    assert_eq!(profile.id, store.identity().unwrap().id);
}

#[tokio::test]
async fn test_bad_credentials_surface_server_message() {
    let (server, client) = mock_client().await;

    Mock::given(method("POST"))
        .and(path("/api/users/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid email or password"})),
        )
        .mount(&server)
        .await;

    let mut store = SessionStore::open(MemoryStorage::new());
    store.begin_login();
    let err = client
        .login(&LoginRequest {
            email: "ann@example.com".to_string(),
            password: "wrong".to_string(),
        })
        .await
        .unwrap_err();
    assert!(is_unauthorized(&err));
    store.fail_login(user_message(&err));

    assert_eq!(store.error(), Some("Invalid email or password"));
    assert!(!store.is_authenticated());
}

#[tokio::test]
async fn test_detailed_games_requires_games_key() {
    let (server, client) = mock_client().await;

    Mock::given(method("GET"))
        .and(path("/api/products/detailed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .mount(&server)
        .await;

    let err = client.fetch_detailed_games().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn test_detailed_games() {
    let (server, client) = mock_client().await;

    Mock::given(method("GET"))
        .and(path("/api/products/detailed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "games": [
                {"_id": "g1", "name": "Celeste", "brand": "EXOK", "category": ["Platformer"], "playTime": 90},
                {"_id": "g2", "name": "Tetris"}
            ]
        })))
        .mount(&server)
        .await;

    let games = client.fetch_detailed_games().await.unwrap();
    assert_eq!(games.len(), 2);
    assert_eq!(games[0].display_play_time(), "1h 30m");
}

#[tokio::test]
async fn test_rate_limit_is_retried() {
    let (server, client) = mock_client().await;

    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"_id": "g1", "name": "Celeste"}
        ])))
        .mount(&server)
        .await;

    let games = client.fetch_games().await.unwrap();
    assert_eq!(games[0].name, "Celeste");
}

#[tokio::test]
async fn test_rate_limit_gives_up() {
    let (server, client) = mock_client().await;

    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(429))
        .expect(4)
        .mount(&server)
        .await;

    let err = client.fetch_users().await.unwrap_err();
    assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::RateLimited)));
}

#[tokio::test]
async fn test_play_and_review() {
    let (server, client) = mock_client().await;
    let client = client.with_token("tok-1");

    Mock::given(method("POST"))
        .and(path("/api/products/g1/play"))
        .and(body_json(json!({"time": 60})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"message": "Play time recorded", "playTime": 75})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/products/g1/reviews"))
        .and(body_json(json!({"rating": 5})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"message": "Review added"})))
        .mount(&server)
        .await;

    let played = client.play_game("g1", &PlayRequest { time: 60 }).await.unwrap();
    assert_eq!(played.play_time, Some(75));

    let message = client
        .review_game(
            "g1",
            &ReviewRequest {
                rating: Some(5),
                comment: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(message, "Review added");
}

#[tokio::test]
async fn test_admin_toggle_and_delete() {
    let (server, client) = mock_client().await;
    let client = client.with_token("admin-tok");

    Mock::given(method("PUT"))
        .and(path("/api/products/g1"))
        .and(body_json(json!({"disableRating": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "g1", "name": "Celeste", "disableRating": true
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/users/u9"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/products/g1"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "Not authorized as an admin"})))
        .mount(&server)
        .await;

    let update = GameUpdate {
        disable_rating: Some(true),
        ..Default::default()
    };
    let game = client.update_game("g1", &update).await.unwrap();
    assert!(game.disable_rating);

    assert_eq!(client.delete_user("u9").await.unwrap(), "");

    let err = client.delete_game("g1").await.unwrap_err();
    assert_eq!(user_message(&err), "Not authorized as an admin");
}

#[tokio::test]
async fn test_network_error_message() {
    // Nothing listens on port 9 on a test machine
    let client = ApiClient::new("http://127.0.0.1:9/api").unwrap();
    let err = client.fetch_games().await.unwrap_err();
    assert!(user_message(&err).starts_with("Unable to connect to server"));
}

#[tokio::test]
async fn test_dashboard_side_endpoints() {
    let (server, client) = mock_client().await;
    let client = client.with_token("tok-1");

    Mock::given(method("GET"))
        .and(path("/api/users/stats"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"totalPlayTime": 135, "averageRating": 4.5, "ratingCount": 2}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/most-played"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": null})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"gameId": "g1", "gameName": "Celeste", "comment": "Tough", "rating": 5}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/products/g1/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "gameId": "g1",
            "gameName": "Celeste",
            "comments": [
                {"user": {"_id": "u1", "name": "Ann"}, "comment": "Tough", "userPlayTime": 75}
            ]
        })))
        .mount(&server)
        .await;

    let stats = client.fetch_user_stats().await.unwrap();
    assert_eq!(stats.total_play_time, 135);
    assert_eq!(stats.games_played_count, 0);

    assert!(client.fetch_most_played().await.unwrap().is_none());

    let comments = client.fetch_user_comments().await.unwrap();
    assert_eq!(comments[0].game_name, "Celeste");
    assert_eq!(comments[0].rating, Some(5));

    let game_comments = client.fetch_game_comments("g1").await.unwrap();
    assert_eq!(game_comments.game_id, "g1");
    assert_eq!(game_comments.comments[0].user.name, "Ann");
    assert_eq!(game_comments.comments[0].user_play_time, 75);
}

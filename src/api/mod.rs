use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::LeagueError;
use crate::models::{
    ApiResponse, BalanceAudit, CareerStats, Game, GameInput, League, LeagueTable, NewLeague, NewPlayer, Player,
};
use crate::services::LeagueService;

type ApiResult<T> = Result<Json<ApiResponse<T>>, LeagueError>;

pub async fn serve(service: LeagueService, port: u16) -> anyhow::Result<()> {
    let app = create_router().with_state(service);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!("Prize League API server listening on port {}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

fn create_router() -> Router<LeagueService> {
    Router::new()
        .route("/health", get(health_check))
        .route("/players", get(list_players_handler).post(create_player_handler))
        .route("/players/{id}/career", get(career_handler))
        .route("/leagues", post(create_league_handler).get(list_leagues_handler))
        .route("/leagues/{id}", get(league_table_handler))
        .route("/leagues/{id}/games", post(record_game_handler))
        .route("/games/{id}", put(update_game_handler).delete(delete_game_handler))
        .route("/balances/audit", get(audit_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

// Health check endpoint
async fn health_check() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("Prize League API is running"))
}

// GET /players
async fn list_players_handler(State(service): State<LeagueService>) -> ApiResult<Vec<Player>> {
    Ok(Json(ApiResponse::success(service.list_players().await?)))
}

// POST /players
async fn create_player_handler(
    State(service): State<LeagueService>,
    Json(request): Json<NewPlayer>,
) -> ApiResult<Player> {
    let player = service.create_player(&request.name).await?;
    Ok(Json(ApiResponse::success(player)))
}

// GET /players/{id}/career
async fn career_handler(
    State(service): State<LeagueService>,
    Path(player_id): Path<String>,
) -> ApiResult<CareerStats> {
    Ok(Json(ApiResponse::success(service.career_stats(&player_id).await?)))
}

// GET /leagues
async fn list_leagues_handler(State(service): State<LeagueService>) -> ApiResult<Vec<League>> {
    Ok(Json(ApiResponse::success(service.list_leagues().await?)))
}

// POST /leagues
async fn create_league_handler(
    State(service): State<LeagueService>,
    Json(request): Json<NewLeague>,
) -> ApiResult<League> {
    Ok(Json(ApiResponse::success(service.create_league(request).await?)))
}

// GET /leagues/{id} - standings, recent games and form
async fn league_table_handler(
    State(service): State<LeagueService>,
    Path(league_id): Path<String>,
) -> ApiResult<LeagueTable> {
    Ok(Json(ApiResponse::success(service.league_table(&league_id).await?)))
}

// POST /leagues/{id}/games
async fn record_game_handler(
    State(service): State<LeagueService>,
    Path(league_id): Path<String>,
    Json(input): Json<GameInput>,
) -> ApiResult<Game> {
    Ok(Json(ApiResponse::success(service.record_game(&league_id, input).await?)))
}

// PUT /games/{id} - keeps the stored date when played_at is omitted
async fn update_game_handler(
    State(service): State<LeagueService>,
    Path(game_id): Path<String>,
    Json(input): Json<GameInput>,
) -> ApiResult<Game> {
    Ok(Json(ApiResponse::success(service.update_game(&game_id, input).await?)))
}

// DELETE /games/{id} - returns the league after the game is removed
async fn delete_game_handler(
    State(service): State<LeagueService>,
    Path(game_id): Path<String>,
) -> ApiResult<League> {
    Ok(Json(ApiResponse::success(service.delete_game(&game_id).await?)))
}

// GET /balances/audit
async fn audit_handler(State(service): State<LeagueService>) -> ApiResult<Vec<BalanceAudit>> {
    Ok(Json(ApiResponse::success(service.audit_balances().await?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::db;
    use crate::services::PrizeMoneyCalculator;

    async fn test_app() -> (Router, LeagueService) {
        let service = LeagueService::new(db::test_pool().await, PrizeMoneyCalculator::new());
        (create_router().with_state(service.clone()), service)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn setup_league(app: &Router) -> (String, String, String) {
        let (_, alice) = send(app, "POST", "/players", Some(json!({ "name": "alice" }))).await;
        let (_, bob) = send(app, "POST", "/players", Some(json!({ "name": "bob" }))).await;
        let alice_id = alice["data"]["id"].as_str().unwrap().to_string();
        let bob_id = bob["data"]["id"].as_str().unwrap().to_string();

        let (status, league) = send(
            app,
            "POST",
            "/leagues",
            Some(json!({
                "player_a_id": alice_id,
                "player_b_id": bob_id,
                "football_league": "Premier League",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(league["data"]["name"], "1 - Premier League");
        (league["data"]["id"].as_str().unwrap().to_string(), alice_id, bob_id)
    }

    fn game_body(home: &str, away: &str, home_score: i32, away_score: i32) -> Value {
        json!({
            "home_player_id": home,
            "away_player_id": away,
            "home_team": "Arsenal",
            "away_team": "Chelsea",
            "home_score": home_score,
            "away_score": away_score,
            "home_xg": 1.2,
            "away_xg": 0.8,
            "home_stats": { "goals": home_score },
            "away_stats": { "goals": away_score },
        })
    }

    #[tokio::test]
    async fn test_edit_over_http_keeps_played_at() {
        let (app, service) = test_app().await;
        let (league_id, alice, bob) = setup_league(&app).await;

        let mut body = game_body(&alice, &bob, 1, 0);
        body["played_at"] = json!("2024-01-01T12:00:00Z");
        let (status, created) = send(&app, "POST", &format!("/leagues/{}/games", league_id), Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["data"]["home_prize"], 3);
        let game_id = created["data"]["id"].as_str().unwrap().to_string();

        let (status, edited) =
            send(&app, "PUT", &format!("/games/{}", game_id), Some(game_body(&alice, &bob, 0, 2))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(edited["data"]["away_prize"], 4);

        let stored = service.league_games(&league_id).await.unwrap();
        assert_eq!(stored[0].result.played_at.to_rfc3339(), "2024-01-01T12:00:00+00:00");
        assert_eq!(stored[0].result.away_score, 2);
    }

    #[tokio::test]
    async fn test_errors_use_the_envelope() {
        let (app, _) = test_app().await;
        let (league_id, alice, bob) = setup_league(&app).await;

        let (status, body) =
            send(&app, "POST", "/leagues/missing/games", Some(game_body(&alice, &bob, 1, 0))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);

        let (status, body) = send(
            &app,
            "POST",
            &format!("/leagues/{}/games", league_id),
            Some(game_body(&alice, &bob, 100, 0)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Scores"));

        let (status, _) = send(&app, "POST", "/players", Some(json!({ "name": "alice" }))).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_league_table_and_audit() {
        let (app, _) = test_app().await;
        let (league_id, alice, bob) = setup_league(&app).await;
        send(&app, "POST", &format!("/leagues/{}/games", league_id), Some(game_body(&bob, &alice, 2, 0))).await;

        let (status, table) = send(&app, "GET", &format!("/leagues/{}", league_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(table["data"]["standings"][0]["player_id"], bob.as_str());
        assert_eq!(table["data"]["standings"][0]["points"], 3);
        assert_eq!(table["data"]["prize_leader"], "£4 bob");

        let (_, audit) = send(&app, "GET", "/balances/audit", None).await;
        let rows = audit["data"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r["consistent"] == true));
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ApiResponse;

#[derive(Debug, Error)]
pub enum LeagueError {
    #[error("League not found: {0}")]
    LeagueNotFound(String),

    #[error("Game not found: {0}")]
    GameNotFound(String),

    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    #[error("League {0} is finished and no longer accepts new games")]
    LeagueFinished(String),

    #[error("Player name already taken: {0}")]
    DuplicatePlayer(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl LeagueError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            LeagueError::LeagueNotFound(_)
            | LeagueError::GameNotFound(_)
            | LeagueError::PlayerNotFound(_) => StatusCode::NOT_FOUND,
            LeagueError::LeagueFinished(_) | LeagueError::DuplicatePlayer(_) => StatusCode::CONFLICT,
            LeagueError::Validation(_) => StatusCode::BAD_REQUEST,
            LeagueError::Database(_) | LeagueError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for LeagueError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

//! Domain errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::chess::ChessError;
use crate::ludo::LudoError;
use crate::puzzle::PuzzleError;
use crate::session::SessionError;
use crate::wallet::WalletError;
use crate::words::WordsError;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Puzzle(#[from] PuzzleError),
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error("invalid or foreign seat token")]
    Unauthorized,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

fn wallet_status(e: &WalletError) -> StatusCode {
    match e {
        WalletError::InvalidAmount
        | WalletError::NotAStakeholder(_)
        | WalletError::PoolOverflow => StatusCode::BAD_REQUEST,
        WalletError::BalanceOverflow => StatusCode::UNPROCESSABLE_ENTITY,
        WalletError::InsufficientBalance { .. } => StatusCode::PAYMENT_REQUIRED,
    }
}

fn session_status(e: &SessionError) -> StatusCode {
    use SessionError::*;
    match e {
        NotFound => StatusCode::NOT_FOUND,
        NotSeated | NotCreator => StatusCode::FORBIDDEN,
        Full | AlreadyJoined | InvalidStatus(_) | StaleVersion { .. } | NotEnoughPlayers => {
            StatusCode::CONFLICT
        }
        InvalidCapacity(_) | WrongKind(_) => StatusCode::BAD_REQUEST,
        Wallet(e) => wallet_status(e),
        Chess(ChessError::NotInGame)
        | Ludo(LudoError::NotSeated)
        | Words(WordsError::NotInGame) => StatusCode::FORBIDDEN,
        Chess(ChessError::NotYourTurn | ChessError::GameOver | ChessError::NoDrawToClaim(_))
        | Ludo(
            LudoError::NotYourTurn
            | LudoError::AlreadyRolled
            | LudoError::NoPendingRoll
            | LudoError::GameOver,
        )
        | Words(WordsError::AlreadyFound(_) | WordsError::GameOver) => StatusCode::CONFLICT,
        Chess(_) | Ludo(_) | Words(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn puzzle_status(e: &PuzzleError) -> StatusCode {
    use PuzzleError::*;
    match e {
        NotFound => StatusCode::NOT_FOUND,
        NotOwner => StatusCode::FORBIDDEN,
        WrongKind | UnknownLevel(_) => StatusCode::BAD_REQUEST,
        NotAsking | NotGuessing | AlreadySolved | HintUsed(_) | NothingToReveal => {
            StatusCode::CONFLICT
        }
        Wallet(e) => wallet_status(e),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Session(e) => session_status(e),
            ApiError::Puzzle(e) => puzzle_status(e),
            ApiError::Wallet(e) => wallet_status(e),
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

//! HTTP surface.

pub mod error;
pub mod routes;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::ws;
use routes::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(routes::healthz))
        .route("/wallets/:player", get(routes::wallet))
        .route("/wallets/:player/deposit", post(routes::deposit))
        .route("/wallets/:player/withdraw", post(routes::withdraw))
        .route("/sessions", post(routes::create_session))
        .route("/sessions/:id", get(routes::get_session))
        .route("/sessions/:id/join", post(routes::join_session))
        .route("/sessions/:id/start", post(routes::start_session))
        .route("/sessions/:id/cancel", post(routes::cancel_session))
        .route("/sessions/:id/heartbeat", post(routes::heartbeat))
        .route("/sessions/:id/chess/move", post(routes::chess_move))
        .route("/sessions/:id/chess/resign", post(routes::chess_resign))
        .route("/sessions/:id/chess/draw", post(routes::chess_claim_draw))
        .route("/sessions/:id/chess/legal", get(routes::chess_legal))
        .route("/sessions/:id/ludo/roll", post(routes::ludo_roll))
        .route("/sessions/:id/ludo/move", post(routes::ludo_move))
        .route("/sessions/:id/ludo/board", get(routes::ludo_board))
        .route("/sessions/:id/words/claim", post(routes::words_claim))
        .route("/sessions/:id/ws", get(ws::connection::ws_handler))
        .route("/puzzles/akinator", post(routes::start_akinator))
        .route("/puzzles/akinator/:id/answer", post(routes::akinator_answer))
        .route("/puzzles/akinator/:id/confirm", post(routes::akinator_confirm))
        .route("/puzzles/fourpics", post(routes::start_fourpics))
        .route("/puzzles/fourpics/:id/hint", post(routes::fourpics_hint))
        .route("/puzzles/fourpics/:id/guess", post(routes::fourpics_guess))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

//! HTTP handlers: wallets, sessions and their games, puzzles, health.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::chess::{LegalMove, MoveRecord};
use crate::config::Settings;
use crate::ludo::{Color, LudoEvent};
use crate::puzzle::{AkinatorView, Answer, FourPicsView, Hint, PuzzleStore};
use crate::session::{GameKind, GameSession, PresenceState, SessionStore};
use crate::util::id::PlayerId;
use crate::util::token::TokenSigner;
use crate::wallet::{Currency, Ledger, Profile, Transaction};
use crate::words::{Cell, HiddenWord};

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub puzzles: PuzzleStore,
    pub ledger: Ledger,
    pub tokens: TokenSigner,
    pub settings: Settings,
}

type ApiResult<T> = Result<Json<T>, ApiError>;

impl AppState {
    /// Resolves a seat token to its player, checking it was issued for `session_id`.
    pub fn seat(&self, session_id: &str, token: &str) -> Result<PlayerId, ApiError> {
        match self.tokens.verify(token) {
            Ok((id, player)) if id == session_id => Ok(player),
            Ok(_) => Err(ApiError::Unauthorized),
            Err(e) => {
                tracing::debug!(error = %e, "seat token rejected");
                Err(ApiError::Unauthorized)
            }
        }
    }

    fn seated(&self, session: GameSession, player: PlayerId) -> Result<Seated, ApiError> {
        let token = self.tokens.issue(&session.id, player)?;
        Ok(Seated { session, token })
    }
}

pub async fn healthz() -> &'static str {
    "ok"
}

// ---- wallets ----

#[derive(Serialize)]
pub struct WalletView {
    pub player: PlayerId,
    pub cash: u64,
    pub coins: u64,
    pub profile: Profile,
    pub transactions: Vec<Transaction>,
}

pub async fn wallet(
    State(state): State<AppState>,
    Path(player): Path<PlayerId>,
) -> Json<WalletView> {
    Json(WalletView {
        player,
        cash: state.ledger.balance(player, Currency::Cash),
        coins: state.ledger.balance(player, Currency::Coins),
        profile: state.ledger.profile(player),
        transactions: state.ledger.transactions(player, None),
    })
}

#[derive(Deserialize)]
pub struct AmountBody {
    pub currency: Currency,
    pub amount: u64,
}

pub async fn deposit(
    State(state): State<AppState>,
    Path(player): Path<PlayerId>,
    Json(AmountBody { currency, amount }): Json<AmountBody>,
) -> ApiResult<Transaction> {
    Ok(Json(state.ledger.deposit(player, currency, amount)?))
}

pub async fn withdraw(
    State(state): State<AppState>,
    Path(player): Path<PlayerId>,
    Json(AmountBody { currency, amount }): Json<AmountBody>,
) -> ApiResult<Transaction> {
    Ok(Json(state.ledger.withdraw(player, currency, amount)?))
}

// ---- sessions ----

/// A session plus the caller's seat token.
#[derive(Serialize)]
pub struct Seated {
    pub session: GameSession,
    pub token: String,
}

#[derive(Deserialize)]
pub struct CreateBody {
    pub player: PlayerId,
    pub kind: GameKind,
    pub capacity: Option<usize>,
    #[serde(default)]
    pub entry_fee: u64,
}

pub async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateBody>,
) -> ApiResult<Seated> {
    let session = state.sessions.create(body.player, body.kind, body.capacity, body.entry_fee)?;
    Ok(Json(state.seated(session, body.player)?))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<GameSession> {
    Ok(Json(state.sessions.get(&id)?))
}

#[derive(Deserialize)]
pub struct JoinBody {
    pub player: PlayerId,
}

pub async fn join_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(JoinBody { player }): Json<JoinBody>,
) -> ApiResult<Seated> {
    let session = state.sessions.join(&id, player)?;
    Ok(Json(state.seated(session, player)?))
}

/// Body of every seat action: the seat token and, optionally, the version the
/// client last saw.
#[derive(Deserialize)]
pub struct SeatBody {
    pub token: String,
    pub expected_version: Option<u64>,
}

pub async fn start_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SeatBody>,
) -> ApiResult<GameSession> {
    let player = state.seat(&id, &body.token)?;
    Ok(Json(state.sessions.start(&id, player)?))
}

pub async fn cancel_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SeatBody>,
) -> ApiResult<GameSession> {
    let player = state.seat(&id, &body.token)?;
    Ok(Json(state.sessions.cancel(&id, player)?))
}

#[derive(Serialize)]
pub struct PresenceEntry {
    pub player: PlayerId,
    pub state: PresenceState,
}

pub async fn heartbeat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SeatBody>,
) -> ApiResult<Vec<PresenceEntry>> {
    let player = state.seat(&id, &body.token)?;
    let states = state.sessions.heartbeat(&id, player)?;
    Ok(Json(states.into_iter().map(|(player, state)| PresenceEntry { player, state }).collect()))
}

// ---- chess ----

#[derive(Deserialize)]
pub struct ChessMoveBody {
    pub token: String,
    pub uci: String,
    pub expected_version: Option<u64>,
}

#[derive(Serialize)]
pub struct MoveResult<E> {
    pub event: E,
    pub session: GameSession,
}

pub async fn chess_move(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ChessMoveBody>,
) -> ApiResult<MoveResult<MoveRecord>> {
    let player = state.seat(&id, &body.token)?;
    let (event, session) =
        state.sessions.chess_move(&id, player, &body.uci, body.expected_version)?;
    Ok(Json(MoveResult { event, session }))
}

pub async fn chess_resign(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SeatBody>,
) -> ApiResult<GameSession> {
    let player = state.seat(&id, &body.token)?;
    Ok(Json(state.sessions.chess_resign(&id, player, body.expected_version)?))
}

/// Claims a fifty-move draw.
pub async fn chess_claim_draw(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SeatBody>,
) -> ApiResult<GameSession> {
    let player = state.seat(&id, &body.token)?;
    Ok(Json(state.sessions.chess_claim_draw(&id, player, body.expected_version)?))
}

pub async fn chess_legal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<LegalMove>> {
    Ok(Json(state.sessions.chess_legal_moves(&id)?))
}

// ---- ludo ----

#[derive(Debug, Serialize)]
pub struct PieceCell {
    pub color: Color,
    pub piece: usize,
    pub row: u8,
    pub col: u8,
}

/// Where every piece in play sits on the 15x15 board.
pub async fn ludo_board(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<PieceCell>> {
    let cells = state.sessions.ludo_cells(&id)?;
    Ok(Json(
        cells
            .into_iter()
            .map(|(color, piece, (row, col))| PieceCell { color, piece, row, col })
            .collect(),
    ))
}

pub async fn ludo_roll(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SeatBody>,
) -> ApiResult<MoveResult<LudoEvent>> {
    let player = state.seat(&id, &body.token)?;
    let (event, session) = state.sessions.ludo_roll(&id, player, body.expected_version)?;
    Ok(Json(MoveResult { event, session }))
}

#[derive(Deserialize)]
pub struct LudoMoveBody {
    pub token: String,
    pub piece: usize,
    pub expected_version: Option<u64>,
}

pub async fn ludo_move(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<LudoMoveBody>,
) -> ApiResult<MoveResult<LudoEvent>> {
    let player = state.seat(&id, &body.token)?;
    let (event, session) =
        state.sessions.ludo_move(&id, player, body.piece, body.expected_version)?;
    Ok(Json(MoveResult { event, session }))
}

// ---- word search ----

#[derive(Deserialize)]
pub struct ClaimBody {
    pub token: String,
    pub start: Cell,
    pub end: Cell,
    pub expected_version: Option<u64>,
}

pub async fn words_claim(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ClaimBody>,
) -> ApiResult<MoveResult<HiddenWord>> {
    let player = state.seat(&id, &body.token)?;
    let (event, session) =
        state
            .sessions
            .words_claim(&id, player, body.start, body.end, body.expected_version)?;
    Ok(Json(MoveResult { event, session }))
}

// ---- puzzles ----

#[derive(Serialize)]
pub struct PuzzleRun<V> {
    pub id: String,
    #[serde(flatten)]
    pub view: V,
}

#[derive(Deserialize)]
pub struct PlayerBody {
    pub player: PlayerId,
}

pub async fn start_akinator(
    State(state): State<AppState>,
    Json(PlayerBody { player }): Json<PlayerBody>,
) -> Json<PuzzleRun<AkinatorView>> {
    let (id, view) = state.puzzles.start_akinator(player);
    Json(PuzzleRun { id, view })
}

#[derive(Deserialize)]
pub struct AnswerBody {
    pub player: PlayerId,
    pub answer: Answer,
}

pub async fn akinator_answer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(AnswerBody { player, answer }): Json<AnswerBody>,
) -> ApiResult<PuzzleRun<AkinatorView>> {
    let view = state.puzzles.answer_akinator(&id, player, answer)?;
    Ok(Json(PuzzleRun { id, view }))
}

#[derive(Deserialize)]
pub struct ConfirmBody {
    pub player: PlayerId,
    pub correct: bool,
}

pub async fn akinator_confirm(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(ConfirmBody { player, correct }): Json<ConfirmBody>,
) -> ApiResult<PuzzleRun<AkinatorView>> {
    let view = state.puzzles.confirm_akinator(&id, player, correct)?;
    Ok(Json(PuzzleRun { id, view }))
}

#[derive(Deserialize)]
pub struct FourPicsBody {
    pub player: PlayerId,
    pub level: Option<usize>,
}

pub async fn start_fourpics(
    State(state): State<AppState>,
    Json(FourPicsBody { player, level }): Json<FourPicsBody>,
) -> ApiResult<PuzzleRun<FourPicsView>> {
    let (id, view) = state.puzzles.start_fourpics(player, level)?;
    Ok(Json(PuzzleRun { id, view }))
}

#[derive(Deserialize)]
pub struct HintBody {
    pub player: PlayerId,
    pub hint: Hint,
}

pub async fn fourpics_hint(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(HintBody { player, hint }): Json<HintBody>,
) -> ApiResult<PuzzleRun<FourPicsView>> {
    let view = state.puzzles.buy_hint(&id, player, hint)?;
    Ok(Json(PuzzleRun { id, view }))
}

#[derive(Deserialize)]
pub struct GuessBody {
    pub player: PlayerId,
    pub word: String,
}

#[derive(Serialize)]
pub struct GuessResult {
    pub correct: bool,
    #[serde(flatten)]
    pub run: PuzzleRun<FourPicsView>,
}

pub async fn fourpics_guess(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(GuessBody { player, word }): Json<GuessBody>,
) -> ApiResult<GuessResult> {
    let (correct, view) = state.puzzles.guess(&id, player, &word)?;
    Ok(Json(GuessResult { correct, run: PuzzleRun { id, view } }))
}

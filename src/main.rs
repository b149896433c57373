use tokio_util::sync::CancellationToken;

use playzone::config::Settings;
use playzone::http::{self, routes::AppState};
use playzone::puzzle::PuzzleStore;
use playzone::session::{sweeper, PresencePolicy, PresenceTracker, SessionStore};
use playzone::telemetry;
use playzone::util::token::TokenSigner;
use playzone::wallet::Ledger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init()?;
    let settings = Settings::from_env();

    let ledger = Ledger::new();
    let presence = PresenceTracker::new(PresencePolicy::from_settings(&settings));
    let state = AppState {
        sessions: SessionStore::new(ledger.clone(), presence, settings.rake_percent),
        puzzles: PuzzleStore::new(ledger.clone()),
        ledger,
        tokens: TokenSigner::new(settings.token_key),
        settings: settings.clone(),
    };

    let cancel = CancellationToken::new();
    let sweeper = sweeper::spawn(
        state.sessions.clone(),
        state.puzzles.clone(),
        settings.poll_interval,
        settings.puzzle_ttl,
        cancel.clone(),
    );

    let app = http::router(state);
    let addr = settings.server_addr();
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cancel.cancel();
    sweeper.await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
    tracing::info!("shutting down");
}

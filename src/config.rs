//! Configuration utilities (ports, timings, env vars)

use std::{env, net::{Ipv4Addr, SocketAddr}};
use std::str::FromStr;
use std::time::Duration;

use rand::RngCore;

/// Runtime settings, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    /// How often the presence sweeper runs.
    pub poll_interval: Duration,
    /// Absence after which a player is considered away.
    pub presence_timeout: Duration,
    /// First extra delay before an away player is warned.
    pub presence_grace: Duration,
    /// Second extra delay before a warned player forfeits.
    pub presence_final_grace: Duration,
    /// Share of the pooled entry fees kept by the house, 0..=100.
    pub rake_percent: u8,
    pub token_key: [u8; 32],
    /// Idle puzzle runs older than this are pruned.
    pub puzzle_ttl: Duration,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            port: env_or("PORT", 8080),
            poll_interval: Duration::from_secs(env_or("POLL_INTERVAL_SECS", 5)),
            presence_timeout: Duration::from_secs(env_or("PRESENCE_TIMEOUT_SECS", 60)),
            presence_grace: Duration::from_secs(env_or("PRESENCE_GRACE_SECS", 20)),
            presence_final_grace: Duration::from_secs(env_or("PRESENCE_FINAL_GRACE_SECS", 15)),
            rake_percent: env_or::<u8>("RAKE_PERCENT", 0).min(100),
            token_key: token_key(),
            puzzle_ttl: Duration::from_secs(env_or("PUZZLE_TTL_SECS", 1800)),
        }
    }

    /// Socket address to bind the server to, always on 0.0.0.0.
    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: 8080,
            poll_interval: Duration::from_secs(5),
            presence_timeout: Duration::from_secs(60),
            presence_grace: Duration::from_secs(20),
            presence_final_grace: Duration::from_secs(15),
            rake_percent: 0,
            token_key: [7u8; 32],
            puzzle_ttl: Duration::from_secs(1800),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Reads `PLAYZONE_HMAC_KEY` (64 hex chars) or generates a random key.
///
/// A random key invalidates every issued seat token on restart.
fn token_key() -> [u8; 32] {
    env::var("PLAYZONE_HMAC_KEY")
        .ok()
        .and_then(|hex| hex::decode(hex).ok())
        .and_then(|v| v.try_into().ok())
        .unwrap_or_else(|| {
            tracing::warn!("PLAYZONE_HMAC_KEY not set, using a random token key");
            let mut kb = [0u8; 32];
            rand::thread_rng().fill_bytes(&mut kb);
            kb
        })
}

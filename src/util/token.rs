//! Lightweight signed seat tokens.
//!
//! Format: `base64url(json).base64url(hmac_sha256(json))`. A token binds a
//! player to one session; it is what the WebSocket upgrade checks.

use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use time::OffsetDateTime;

use crate::util::id::PlayerId;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    session: String,
    player: PlayerId,
    iat: i64,
}

#[derive(Clone)]
pub struct TokenSigner {
    key: [u8; 32],
}

impl TokenSigner {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    pub fn issue(&self, session_id: &str, player: PlayerId) -> anyhow::Result<String> {
        let claims = Claims {
            session: session_id.to_string(),
            player,
            iat: OffsetDateTime::now_utc().unix_timestamp(),
        };
        let payload = serde_json::to_vec(&claims)?;
        let sig = self.sign(&payload)?;
        Ok(format!("{}.{}", URL_SAFE_NO_PAD.encode(&payload), URL_SAFE_NO_PAD.encode(sig)))
    }

    /// Returns the (session, player) pair the token was issued for.
    pub fn verify(&self, token: &str) -> anyhow::Result<(String, PlayerId)> {
        let mut parts = token.split('.');
        let p1 = parts.next().context("missing payload")?;
        let p2 = parts.next().context("missing sig")?;
        if parts.next().is_some() { anyhow::bail!("too many parts") }
        let payload = URL_SAFE_NO_PAD.decode(p1)?;
        let sig = URL_SAFE_NO_PAD.decode(p2)?;

        let mut mac = self.mac()?;
        mac.update(&payload);
        mac.verify_slice(&sig).map_err(|_| anyhow::anyhow!("bad signature"))?;

        let c: Claims = serde_json::from_slice(&payload)?;
        Ok((c.session, c.player))
    }

    fn sign(&self, data: &[u8]) -> anyhow::Result<[u8; 32]> {
        let mut mac = self.mac()?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().into())
    }

    fn mac(&self) -> anyhow::Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.key).context("invalid hmac key")
    }
}

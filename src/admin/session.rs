//! Encrypted admin session cookie.
//!
//! The cookie value is `base64url(nonce || AES-256-GCM(json(SessionData)))`,
//! keyed by SHA-256 of the configured session secret. Tampered, expired or
//! foreign cookies all open to `None`.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use axum::{extract::FromRequestParts, http::HeaderMap, http::request::Parts};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::SessionData;
use crate::{AppState, error::ApiError};

pub const SESSION_COOKIE: &str = "photo_portfolio_admin";
pub const SESSION_TTL_SECS: i64 = 86_400;

const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to serialize session: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to seal session")]
    Seal,
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[derive(Clone)]
pub struct SessionCodec {
    cipher: Aes256Gcm,
    secure: bool,
}

impl SessionCodec {
    pub fn new(secret: &str, secure: bool) -> Self {
        let key = Sha256::digest(secret.as_bytes());
        Self {
            cipher: Aes256Gcm::new(&key),
            secure,
        }
    }

    pub fn seal(&self, data: &SessionData) -> Result<String, SessionError> {
        let payload = serde_json::to_vec(data)?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, payload.as_ref())
            .map_err(|_| SessionError::Seal)?;

        let mut token = nonce.to_vec();
        token.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(token))
    }

    pub fn open(&self, token: &str) -> Option<SessionData> {
        let bytes = URL_SAFE_NO_PAD.decode(token).ok()?;
        if bytes.len() <= NONCE_LEN {
            return None;
        }

        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .ok()?;
        let data: SessionData = serde_json::from_slice(&plaintext).ok()?;

        data.is_valid_at(Utc::now().timestamp()).then_some(data)
    }

    /// Session carried by the request's cookie header, if any is valid.
    pub fn authenticate(&self, headers: &HeaderMap) -> Option<SessionData> {
        get_cookie_value(headers, SESSION_COOKIE).and_then(|token| self.open(&token))
    }

    pub fn session_cookie(&self, token: &str) -> String {
        format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax{}",
            SESSION_COOKIE,
            token,
            SESSION_TTL_SECS,
            self.secure_attribute()
        )
    }

    pub fn clear_cookie(&self) -> String {
        format!(
            "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax{}",
            SESSION_COOKIE,
            self.secure_attribute()
        )
    }

    fn secure_attribute(&self) -> &'static str {
        if self.secure { "; Secure" } else { "" }
    }
}

pub fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get("cookie")?
        .to_str()
        .ok()?
        .split(';')
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;
            (key.trim() == name).then(|| value.trim().to_string())
        })
}

/// Extractor for handlers that require a logged-in admin. Rejects with 401
/// before the handler body runs.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub user_id: i64,
    pub username: String,
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        state
            .sessions
            .authenticate(&parts.headers)
            .map(|session| AdminSession {
                user_id: session.user_id,
                username: session.username,
            })
            .ok_or(ApiError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn codec() -> SessionCodec {
        SessionCodec::new("test-secret-that-is-long-enough-for-use", false)
    }

    fn headers_with_cookie(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_seal_and_open() {
        let codec = codec();
        let data = SessionData::new(7, "admin", SESSION_TTL_SECS);

        let token = codec.seal(&data).unwrap();
        assert_eq!(codec.open(&token), Some(data));
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let codec = codec();
        let token = codec
            .seal(&SessionData::new(1, "admin", SESSION_TTL_SECS))
            .unwrap();

        let mut bytes = URL_SAFE_NO_PAD.decode(&token).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        assert!(codec.open(&URL_SAFE_NO_PAD.encode(bytes)).is_none());
        assert!(codec.open("not base64 at all!").is_none());
        assert!(codec.open("").is_none());
    }

    #[test]
    fn test_other_secret_cannot_open() {
        let token = codec()
            .seal(&SessionData::new(1, "admin", SESSION_TTL_SECS))
            .unwrap();
        let other = SessionCodec::new("a-different-secret-entirely-for-tests", false);
        assert!(other.open(&token).is_none());
    }

    #[test]
    fn test_expired_session_is_rejected() {
        let codec = codec();
        let token = codec.seal(&SessionData::new(1, "admin", -1)).unwrap();
        assert!(codec.open(&token).is_none());
    }

    #[test]
    fn test_logged_out_flag_is_rejected() {
        let codec = codec();
        let mut data = SessionData::new(1, "admin", SESSION_TTL_SECS);
        data.is_logged_in = false;
        let token = codec.seal(&data).unwrap();
        assert!(codec.open(&token).is_none());
    }

    #[test]
    fn test_authenticate_reads_named_cookie() {
        let codec = codec();
        let token = codec
            .seal(&SessionData::new(3, "editor", SESSION_TTL_SECS))
            .unwrap();
        let headers = headers_with_cookie(&format!("theme=dark; {}={}", SESSION_COOKIE, token));

        let session = codec.authenticate(&headers).unwrap();
        assert_eq!(session.username, "editor");
        assert!(codec.authenticate(&headers_with_cookie("theme=dark")).is_none());
    }

    #[test]
    fn test_cookie_attributes() {
        let dev = codec().session_cookie("abc");
        assert!(dev.starts_with("photo_portfolio_admin=abc;"));
        assert!(dev.contains("HttpOnly"));
        assert!(dev.contains("SameSite=Lax"));
        assert!(dev.contains("Max-Age=86400"));
        assert!(!dev.contains("Secure"));

        let prod = SessionCodec::new("secret", true);
        assert!(prod.session_cookie("abc").ends_with("; Secure"));
        assert!(prod.clear_cookie().contains("Max-Age=0"));
    }
}

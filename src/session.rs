use axum::http::{ header, HeaderMap, HeaderValue };
use base64::{ engine::general_purpose::URL_SAFE_NO_PAD, Engine as _ };
use hmac::{ Hmac, Mac };
use log::{ debug, warn };
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid session secret: {0}")]
    InvalidSecret(String),
    #[error("invalid cookie value: {0}")]
    InvalidCookie(String),
}

/// A session resolved from an incoming request.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    /// `Set-Cookie` value to send back when the session was just created.
    pub set_cookie: Option<HeaderValue>,
}

/// Issues and verifies `<session-id>.<signature>` cookie tokens.
#[derive(Clone)]
pub struct SessionManager {
    mac: HmacSha256,
    cookie_name: String,
    secure: bool,
}

impl SessionManager {
    pub fn new(secret: &str, cookie_name: &str, secure: bool) -> Result<Self, SessionError> {
        let secret = if secret.is_empty() {
            warn!("SESSION_SECRET not set; generated a random secret. Sessions will not survive a restart.");
            format!("{}{}", Uuid::new_v4(), Uuid::new_v4())
        } else {
            secret.to_string()
        };
        let mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e|
            SessionError::InvalidSecret(e.to_string())
        )?;

        Ok(Self {
            mac,
            cookie_name: cookie_name.to_string(),
            secure,
        })
    }

    pub fn sign(&self, session_id: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(session_id.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{}.{}", session_id, signature)
    }

    /// Returns the session id carried by `token` if its signature checks out.
    pub fn verify(&self, token: &str) -> Option<String> {
        let (session_id, signature) = token.rsplit_once('.')?;
        if session_id.is_empty() {
            return None;
        }
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

        let mut mac = self.mac.clone();
        mac.update(session_id.as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(session_id.to_string())
    }

    /// Picks the session out of the request cookies, or starts a new one.
    pub fn resolve(&self, headers: &HeaderMap) -> Result<Session, SessionError> {
        if let Some(token) = self.find_cookie(headers) {
            if let Some(id) = self.verify(token) {
                return Ok(Session { id, set_cookie: None });
            }
            debug!("Discarding session cookie with a bad signature");
        }

        let id = Uuid::new_v4().to_string();
        let set_cookie = self.cookie_header(&id)?;
        Ok(Session {
            id,
            set_cookie: Some(set_cookie),
        })
    }

    fn find_cookie<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie_name)
            .map(|(_, value)| value)
    }

    fn cookie_header(&self, session_id: &str) -> Result<HeaderValue, SessionError> {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            self.cookie_name,
            self.sign(session_id)
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).map_err(|e| SessionError::InvalidCookie(e.to_string()))
    }
}

//! Session-cookie authentication and password hashing.
//!
//! Handlers call `require_user` first; anonymous callers get a 302 to
//! the login page with `next` pointing back at the requested URL.

use actix_web::{HttpRequest, HttpResponse, http::header, web};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::AppState;
use crate::models::User;

pub const SESSION_COOKIE: &str = "session";
pub const LOGIN_PATH: &str = "/auth/login";

/// Build the anonymous-caller redirect: 302 to login with `next` set
/// to the originally requested path.
pub fn login_redirect(req: &HttpRequest) -> HttpResponse {
    let next = urlencoding::encode(req.path());
    HttpResponse::Found()
        .append_header((header::LOCATION, format!("{}?next={}", LOGIN_PATH, next)))
        .finish()
}

/// Resolve the calling user from the session cookie, or produce the
/// response that ends the request (login redirect or 500).
pub fn require_user(state: &web::Data<AppState>, req: &HttpRequest) -> Result<User, HttpResponse> {
    let token = match req.cookie(SESSION_COOKIE) {
        Some(cookie) => cookie.value().to_string(),
        None => return Err(login_redirect(req)),
    };

    let session = match state.db.validate_session(&token) {
        Ok(Some(session)) => session,
        Ok(None) => return Err(login_redirect(req)),
        Err(e) => {
            log::error!("Session validation error: {}", e);
            return Err(HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal server error"
            })));
        }
    };

    match state.db.get_user(session.user_id) {
        Ok(Some(user)) => Ok(user),
        // Session pointing at a deleted account is treated as anonymous
        Ok(None) => Err(login_redirect(req)),
        Err(e) => {
            log::error!("Failed to load session user: {}", e);
            Err(HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal server error"
            })))
        }
    }
}

/// Hash a password with a fresh random salt, as `hex(salt)$hex(digest)`.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();

    format!("{}${}", hex::encode(salt), hex::encode(digest))
}

/// Check a password against a stored `salt$digest` hash.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };

    let mut hasher = Sha256::new();
    hasher.update(&salt);
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();

    hex::encode(digest) == digest_hex
}

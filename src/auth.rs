//! Single-password admin gating.
//!
//! A successful login hands out an HttpOnly cookie holding a token derived
//! from the password. Changing the password invalidates every issued cookie.

use crate::util::cookie_value;

pub const COOKIE_NAME: &str = "folio_admin";

const TOKEN_CONTEXT: &str = "folio admin session token v1";

#[derive(Debug, Clone)]
pub struct Auth {
    password: blake3::Hash,
    token: blake3::Hash,
}

impl Auth {
    pub fn new(password: &str) -> Self {
        Self {
            password: blake3::hash(password.as_bytes()),
            token: blake3::Hash::from(blake3::derive_key(TOKEN_CONTEXT, password.as_bytes())),
        }
    }

    /// Compare a login attempt. `blake3::Hash` equality is constant-time.
    pub fn verify_password(&self, candidate: &str) -> bool {
        blake3::hash(candidate.as_bytes()) == self.password
    }

    /// Whether a `Cookie:` header carries a valid admin token.
    pub fn is_admin(&self, cookie_header: Option<&str>) -> bool {
        cookie_header
            .and_then(|header| cookie_value(header, COOKIE_NAME))
            .and_then(|value| blake3::Hash::from_hex(value).ok())
            .is_some_and(|token| token == self.token)
    }

    /// `Set-Cookie` value issued after a successful login.
    pub fn session_cookie(&self) -> String {
        format!(
            "{}={}; HttpOnly; Path=/; SameSite=Lax",
            COOKIE_NAME,
            self.token.to_hex()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie_pair(cookie: &str) -> &str {
        cookie.split(';').next().unwrap()
    }

    #[test]
    fn verifies_password() {
        let auth = Auth::new("secret");
        assert!(auth.verify_password("secret"));
        assert!(!auth.verify_password("Secret"));
        assert!(!auth.verify_password(""));
    }

    #[test]
    fn issued_cookie_is_accepted() {
        let auth = Auth::new("secret");
        let cookie = auth.session_cookie();
        assert!(cookie.contains("HttpOnly"));

        let header = format!("lang=en; {}", cookie_pair(&cookie));
        assert!(auth.is_admin(Some(&header)));
    }

    #[test]
    fn forged_or_missing_cookie_is_rejected() {
        let auth = Auth::new("secret");
        assert!(!auth.is_admin(None));
        assert!(!auth.is_admin(Some("is_admin=true")));
        assert!(!auth.is_admin(Some("folio_admin=true")));
        assert!(!auth.is_admin(Some(&format!("folio_admin={}", "0".repeat(64)))));
    }

    #[test]
    fn password_change_invalidates_cookie() {
        let old = Auth::new("one");
        let new = Auth::new("two");
        let cookie = old.session_cookie();
        assert!(!new.is_admin(Some(cookie_pair(&cookie))));
    }
}

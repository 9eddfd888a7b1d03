use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::OffsetDateTime;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE_NAME: &str = "token";

/// Reads and writes the session cookie with fixed security attributes:
/// HTTP-only, SameSite=Strict, and Secure in production. No Max-Age is set;
/// the token's own expiry is enforced server-side on decode.
#[derive(Clone)]
pub struct SessionCookies {
    secure: bool,
}

impl SessionCookies {
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    fn cookie(&self, value: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE_NAME, value))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .path("/")
            .build()
    }

    pub fn set(&self, jar: CookieJar, token: String) -> CookieJar {
        jar.add(self.cookie(token))
    }

    /// Emits the same cookie with an empty value and an expiry in the past,
    /// instructing the client to drop it immediately.
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        let mut cookie = self.cookie(String::new());
        cookie.set_expires(OffsetDateTime::UNIX_EPOCH);
        jar.add(cookie)
    }

    pub fn read(&self, jar: &CookieJar) -> Option<String> {
        jar.get(SESSION_COOKIE_NAME).map(|c| c.value().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Expiration;

    #[test]
    fn set_then_read_roundtrips() {
        let cookies = SessionCookies::new(false);
        let jar = cookies.set(CookieJar::new(), "signed.token.value".into());
        assert_eq!(cookies.read(&jar).as_deref(), Some("signed.token.value"));
    }

    #[test]
    fn read_without_cookie_is_none() {
        let cookies = SessionCookies::new(false);
        assert!(cookies.read(&CookieJar::new()).is_none());
    }

    #[test]
    fn set_applies_security_attributes() {
        let cookies = SessionCookies::new(true);
        let jar = cookies.set(CookieJar::new(), "t".into());
        let cookie = jar.get(SESSION_COOKIE_NAME).expect("cookie present");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.path(), Some("/"));
        assert!(cookie.expires().is_none());
    }

    #[test]
    fn clear_emits_empty_cookie_expired_in_the_past() {
        let cookies = SessionCookies::new(false);
        let jar = cookies.clear(CookieJar::new());
        let cookie = jar.get(SESSION_COOKIE_NAME).expect("cookie present");
        assert_eq!(cookie.value(), "");
        match cookie.expires() {
            Some(Expiration::DateTime(at)) => assert!(at < OffsetDateTime::now_utc()),
            other => panic!("expected an expiry timestamp, got {other:?}"),
        }
    }
}

//! Per-request session context resolved from the session cookie.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue},
    response::Redirect,
};
use cookie::{time, Cookie, SameSite};

use folio_core::config::AuthConfig;
use folio_core::domain::user::{SessionToken, User};
use folio_core::view::{gate, AccessRule, Gate, LOGIN_PATH};

use crate::state::AppState;

#[derive(Clone, Debug)]
pub struct CookieSettings {
    pub name: String,
    pub secure: bool,
    pub max_age_secs: i64,
}

impl CookieSettings {
    pub fn from_config(auth: &AuthConfig) -> Self {
        let hours = auth.session_ttl_hours.min(24 * 365) as i64;
        Self { name: auth.cookie_name.clone(), secure: auth.secure_cookies, max_age_secs: hours * 3600 }
    }

    pub fn issue(&self, token: &SessionToken) -> Option<HeaderValue> {
        self.render(token.0.clone(), time::Duration::seconds(self.max_age_secs))
    }

    pub fn clear(&self) -> Option<HeaderValue> {
        self.render(String::new(), time::Duration::ZERO)
    }

    fn render(&self, value: String, max_age: time::Duration) -> Option<HeaderValue> {
        let cookie = Cookie::build((self.name.clone(), value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(max_age)
            .build();
        HeaderValue::from_str(&cookie.to_string()).ok()
    }

    pub fn token_from(&self, headers: &HeaderMap) -> Option<SessionToken> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == self.name && !cookie.value().is_empty())
            .map(|cookie| SessionToken(cookie.value().to_string()))
    }
}

/// The caller's identity for this request only.
#[derive(Clone, Debug, Default)]
pub struct SessionContext {
    pub token: Option<SessionToken>,
    pub user: Option<User>,
}

impl SessionContext {
    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn gate(&self, rule: AccessRule) -> Gate {
        gate(rule, self.is_signed_in())
    }

    pub fn require_user(&self) -> Result<&User, Redirect> {
        match (self.gate(AccessRule::RequiresSession), &self.user) {
            (Gate::Render, Some(user)) => Ok(user),
            (Gate::Redirect(path), _) => Err(Redirect::to(path)),
            (Gate::Render, None) => Err(Redirect::to(LOGIN_PATH)),
        }
    }

    pub fn forbid_user(&self) -> Result<(), Redirect> {
        match self.gate(AccessRule::ForbidsSession) {
            Gate::Render => Ok(()),
            Gate::Redirect(path) => Err(Redirect::to(path)),
        }
    }
}

impl FromRequestParts<AppState> for SessionContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = state.cookies.token_from(&parts.headers) else {
            return Ok(Self::default());
        };
        let user = state.auth.current_user(&token).await;
        Ok(Self { token: Some(token), user })
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{header, HeaderMap, HeaderValue};
    use chrono::Utc;

    use folio_core::domain::user::{SessionToken, User, UserId};

    use super::{CookieSettings, SessionContext};

    fn settings() -> CookieSettings {
        CookieSettings { name: "folio_session".to_string(), secure: false, max_age_secs: 3600 }
    }

    #[test]
    fn token_is_read_from_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; folio_session=abc123"));

        assert_eq!(settings().token_from(&headers), Some(SessionToken("abc123".to_string())));
    }

    #[test]
    fn cleared_or_missing_cookie_yields_no_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(settings().token_from(&headers), None);

        headers.insert(header::COOKIE, HeaderValue::from_static("folio_session="));
        assert_eq!(settings().token_from(&headers), None);
    }

    #[test]
    fn issued_cookie_is_http_only_and_scoped_to_root() {
        let value = settings().issue(&SessionToken("tok".to_string())).expect("header");
        let rendered = value.to_str().expect("ascii");

        assert!(rendered.starts_with("folio_session=tok"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Max-Age=3600"));
        assert!(!rendered.contains("Secure"));

        let cleared = settings().clear().expect("header");
        assert!(cleared.to_str().expect("ascii").contains("Max-Age=0"));
    }

    #[test]
    fn anonymous_context_is_sent_to_login() {
        let anonymous = SessionContext::default();
        assert!(anonymous.require_user().is_err());
        assert!(anonymous.forbid_user().is_ok());

        let signed_in = SessionContext {
            token: Some(SessionToken("t".to_string())),
            user: Some(User {
                id: UserId("U-1".to_string()),
                email: "ada@example.com".to_string(),
                display_name: "Ada".to_string(),
                created_at: Utc::now(),
            }),
        };
        assert_eq!(signed_in.require_user().map(|user| user.id.0.as_str()).ok(), Some("U-1"));
        assert!(signed_in.forbid_user().is_err());
    }
}

//! Password sign-in backed by the user and session repositories.
//!
//! Passwords are stored as argon2 PHC strings. A successful login mints an
//! opaque session token that lives until `session_ttl` elapses or the user
//! signs out.

use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, SubsecRound, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use folio_core::domain::user::{normalize_email, Session, SessionToken, User, UserId};
use folio_core::errors::AuthenticationError;
use folio_db::repositories::{
    RepositoryError, SessionRepository, SqlSessionRepository, SqlUserRepository, UserRepository,
};
use folio_db::DbPool;

const MAX_SESSION_TTL_HOURS: u64 = 24 * 365;

#[derive(Clone)]
pub struct AuthGateway {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
    session_ttl: Duration,
}

impl AuthGateway {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        session_ttl_hours: u64,
    ) -> Self {
        let hours = session_ttl_hours.min(MAX_SESSION_TTL_HOURS) as i64;
        Self { users, sessions, session_ttl: Duration::hours(hours) }
    }

    pub fn sqlite(pool: DbPool, session_ttl_hours: u64) -> Self {
        Self::new(
            Arc::new(SqlUserRepository::new(pool.clone())),
            Arc::new(SqlSessionRepository::new(pool)),
            session_ttl_hours,
        )
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthenticationError> {
        let email = normalize_email(email);
        let credentials = self
            .users
            .find_credentials_by_email(&email)
            .await
            .map_err(provider_unavailable)?
            .ok_or(AuthenticationError::InvalidCredentials)?;

        if !verify_password(password, &credentials.password_hash) {
            info!(event_name = "auth.login.rejected", user_id = %credentials.user.id.0, "password mismatch");
            return Err(AuthenticationError::InvalidCredentials);
        }

        let session = Session {
            token: SessionToken(Uuid::new_v4().simple().to_string()),
            user: credentials.user,
            expires_at: (Utc::now() + self.session_ttl).trunc_subsecs(6),
        };
        self.sessions.insert(session.clone()).await.map_err(provider_unavailable)?;
        self.sweep_expired_sessions().await;

        info!(event_name = "auth.login.succeeded", user_id = %session.user.id.0, "session created");
        Ok(session)
    }

    /// Drops expired sessions on each sign-in. Failures never block the login.
    async fn sweep_expired_sessions(&self) {
        match self.sessions.purge_expired(Utc::now()).await {
            Ok(0) => {}
            Ok(purged) => {
                info!(event_name = "auth.session.purged", purged, "expired sessions purged")
            }
            Err(error) => {
                warn!(event_name = "auth.session.purge_failed", error = %error, "session purge failed")
            }
        }
    }

    /// Revokes the session. Failures are logged and never reach the caller.
    pub async fn logout(&self, token: &SessionToken) {
        if let Err(error) = self.sessions.delete(token).await {
            warn!(event_name = "auth.logout.failed", error = %error, "session revoke failed");
        }
    }

    pub async fn current_user(&self, token: &SessionToken) -> Option<User> {
        match self.sessions.find_live(token, Utc::now()).await {
            Ok(session) => session.map(|session| session.user),
            Err(error) => {
                warn!(
                    event_name = "auth.session.lookup_failed",
                    error = %error,
                    "session lookup failed; treating request as signed out"
                );
                None
            }
        }
    }

    pub async fn register(
        &self,
        email: &str,
        display_name: &str,
        password: &str,
    ) -> Result<User, AuthenticationError> {
        let password_hash = hash_password(password)?;
        let user = User {
            id: UserId(Uuid::new_v4().to_string()),
            email: normalize_email(email),
            display_name: display_name.trim().to_string(),
            created_at: Utc::now().trunc_subsecs(6),
        };

        match self.users.insert(user.clone(), password_hash).await {
            Ok(()) => {
                info!(event_name = "auth.user.registered", user_id = %user.id.0, "user registered");
                Ok(user)
            }
            Err(RepositoryError::Duplicate(_)) => Err(AuthenticationError::EmailTaken),
            Err(error) => Err(provider_unavailable(error)),
        }
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64, AuthenticationError> {
        self.sessions.purge_expired(Utc::now()).await.map_err(provider_unavailable)
    }
}

fn provider_unavailable(error: RepositoryError) -> AuthenticationError {
    warn!(event_name = "auth.provider.unavailable", error = %error, "identity lookup failed");
    AuthenticationError::ProviderUnavailable(error.to_string())
}

fn hash_password(password: &str) -> Result<String, AuthenticationError> {
    let salt_bytes: [u8; 16] = rand::random();
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AuthenticationError::ProviderUnavailable(format!("salt encoding failed: {e}")))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthenticationError::ProviderUnavailable(format!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(error) => {
            warn!(event_name = "auth.hash.unparseable", error = %error, "stored password hash is invalid");
            false
        }
    }
}

use std::sync::Arc;

use axum_extra::extract::cookie::CookieJar;
use time::Duration;
use tracing::{info, warn};

use crate::auth::cookie::SessionCookies;
use crate::auth::password::CredentialHasher;
use crate::auth::token::TokenCodec;
use crate::config::AuthConfig;
use crate::users::model::User;
use crate::users::store::UserStore;

/// Core authentication orchestrator. Stateless: constructed once at startup
/// with an injected store handle and configuration, then shared across
/// request handlers.
///
/// Expected failures (unknown user, wrong password, invalid token) are
/// `Ok(None)` so the route layer maps them uniformly to 401 without learning
/// the root cause. `Err` is reserved for store or hashing infrastructure
/// failures.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    hasher: CredentialHasher,
    codec: TokenCodec,
    cookies: SessionCookies,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        config: &AuthConfig,
        production: bool,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            users,
            hasher: CredentialHasher::new(config.hash_cost)?,
            codec: TokenCodec::new(
                &config.jwt_secret,
                Duration::minutes(config.token_ttl_minutes),
            ),
            cookies: SessionCookies::new(production),
        })
    }

    // Argon2 is expensive by design; keep it off the async executor.
    async fn hash_password(&self, plain: String) -> anyhow::Result<String> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plain)).await?
    }

    async fn verify_password(&self, plain: String, hash: String) -> anyhow::Result<bool> {
        let hasher = self.hasher.clone();
        Ok(tokio::task::spawn_blocking(move || hasher.verify(&plain, &hash)).await?)
    }

    /// Unknown username and wrong password are deliberately indistinguishable
    /// to the caller.
    pub async fn login(&self, username: &str, password: &str) -> anyhow::Result<Option<User>> {
        let user = match self.users.find_by_username(username).await? {
            Some(user) => user,
            None => {
                warn!(username, "login for unknown username");
                return Ok(None);
            }
        };

        if !self
            .verify_password(password.to_string(), user.password_hash.clone())
            .await?
        {
            warn!(user_id = user.id, "login with wrong password");
            return Ok(None);
        }

        info!(user_id = user.id, "user logged in");
        Ok(Some(user))
    }

    /// `Ok(None)` means the email or username is already taken.
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> anyhow::Result<Option<User>> {
        let existing = self.users.find_by_email_or_username(email, username).await?;
        if !existing.is_empty() {
            warn!(username, "registration conflict");
            return Ok(None);
        }

        let hash = self.hash_password(password.to_string()).await?;
        let user = self.users.create(email, username, &hash).await?;
        info!(user_id = user.id, username = %user.username, "user registered");
        Ok(Some(user))
    }

    /// Verifies the current password before storing a hash of the new one.
    /// Tokens issued before the change remain valid until they expire.
    pub async fn change_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = match self.users.find_by_username(username).await? {
            Some(user) => user,
            None => return Ok(None),
        };

        if !self
            .verify_password(current_password.to_string(), user.password_hash.clone())
            .await?
        {
            warn!(user_id = user.id, "password change with wrong current password");
            return Ok(None);
        }

        let hash = self.hash_password(new_password.to_string()).await?;
        let updated = self.users.update_password(user.id, &hash).await?;
        info!(user_id = updated.id, "password changed");
        Ok(Some(updated))
    }

    /// Signs a token for the user's public representation and attaches it to
    /// the outbound cookie jar.
    pub fn issue_token(&self, jar: CookieJar, user: &User) -> anyhow::Result<CookieJar> {
        let token = self.codec.encode(&user.public())?;
        Ok(self.cookies.set(jar, token))
    }

    /// Reads and verifies the session cookie, then re-fetches the user by the
    /// embedded id. Only the id is trusted as current truth; a user deleted
    /// after issuance fails here even though the token still decodes.
    pub async fn authenticate(&self, jar: &CookieJar) -> anyhow::Result<Option<User>> {
        let token = match self.cookies.read(jar) {
            Some(token) => token,
            None => return Ok(None),
        };
        let claims = match self.codec.decode(&token) {
            Some(claims) => claims,
            None => return Ok(None),
        };
        self.users.find_by_id(claims.sub).await
    }

    /// Idempotent: clearing an absent session is still a success.
    pub fn logout(&self, jar: CookieJar) -> CookieJar {
        self.cookies.clear(jar)
    }
}

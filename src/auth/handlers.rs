use axum::{
    extract::State,
    http::StatusCode,
    routing::{patch, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, instrument, warn};

use crate::{
    auth::{
        dto::{ChangePasswordRequest, LoginRequest, RegisterRequest},
        extractors::CurrentUser,
    },
    state::AppState,
    users::model::PublicUser,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register/password", post(register))
        .route("/auth/login/password", post(login))
        .route("/auth/login/token", post(login_token))
        .route("/auth/logout", post(logout))
        .route("/auth/password", patch(change_password))
}

#[instrument(skip(state, jar, payload))]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<PublicUser>), (StatusCode, String)> {
    if let Err(reason) = payload.validate(&state.config.rules) {
        warn!(reason, "register rejected");
        return Err((StatusCode::BAD_REQUEST, reason.into()));
    }

    let user = match state
        .auth
        .register(&payload.email, &payload.username, &payload.password)
        .await
    {
        Ok(Some(user)) => user,
        Ok(None) => {
            return Err((
                StatusCode::CONFLICT,
                "Email or username already taken".into(),
            ))
        }
        Err(e) => {
            error!(error = %e, "register failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    let jar = state.auth.issue_token(jar, &user).map_err(|e| {
        error!(error = %e, "token issuance failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok((jar, Json(user.public())))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<PublicUser>), (StatusCode, String)> {
    if let Err(reason) = payload.validate(&state.config.rules) {
        warn!(reason, "login rejected");
        return Err((StatusCode::BAD_REQUEST, reason.into()));
    }

    let user = match state.auth.login(&payload.username, &payload.password).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return Err((
                StatusCode::UNAUTHORIZED,
                "Username and password do not match".into(),
            ))
        }
        Err(e) => {
            error!(error = %e, "login failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    let jar = state.auth.issue_token(jar, &user).map_err(|e| {
        error!(error = %e, "token issuance failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok((jar, Json(user.public())))
}

/// Re-authentication from an existing session cookie; no new token is issued.
#[instrument(skip_all)]
pub async fn login_token(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(user.public())
}

#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> (CookieJar, Json<&'static str>) {
    tracing::info!(user_id = user.id, "user logged out");
    (state.auth.logout(jar), Json("Logged out"))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    if let Err(reason) = payload.validate(&state.config.rules) {
        warn!(reason, "change password rejected");
        return Err((StatusCode::BAD_REQUEST, reason.into()));
    }

    match state
        .auth
        .change_password(&payload.username, &payload.password, &payload.new_password)
        .await
    {
        Ok(Some(user)) => Ok(Json(user.public())),
        Ok(None) => Err((
            StatusCode::UNAUTHORIZED,
            "Unable to change password at this time, check your username and password and try again"
                .into(),
        )),
        Err(e) => {
            error!(error = %e, "change password failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_body(email: &str, username: &str, password: &str) -> Json<RegisterRequest> {
        Json(RegisterRequest {
            email: email.into(),
            username: username.into(),
            password: password.into(),
        })
    }

    #[tokio::test]
    async fn register_sets_session_cookie_and_hides_hash() {
        let state = AppState::fake();
        let (jar, Json(user)) = register(
            State(state),
            CookieJar::new(),
            register_body("alice@example.com", "alice", "Secret123"),
        )
        .await
        .expect("registration succeeds");

        assert_eq!(user.username, "alice");
        let cookie = jar.get("token").expect("session cookie set");
        assert!(!cookie.value().is_empty());
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password"));
    }

    #[tokio::test]
    async fn duplicate_registration_is_a_conflict() {
        let state = AppState::fake();
        register(
            State(state.clone()),
            CookieJar::new(),
            register_body("a@x.com", "alice", "Secret123"),
        )
        .await
        .expect("first registration succeeds");

        let (status, _) = register(
            State(state),
            CookieJar::new(),
            register_body("a@x.com", "bob", "Secret456"),
        )
        .await
        .expect_err("second registration conflicts");
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn malformed_username_is_a_bad_request() {
        let state = AppState::fake();
        let (status, _) = register(
            State(state),
            CookieJar::new(),
            register_body("a@x.com", "bad name!", "Secret123"),
        )
        .await
        .expect_err("validation fails");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn bad_credentials_are_unauthorized_with_one_message() {
        let state = AppState::fake();
        register(
            State(state.clone()),
            CookieJar::new(),
            register_body("a@x.com", "alice", "Secret123"),
        )
        .await
        .expect("registration succeeds");

        let wrong_password = login(
            State(state.clone()),
            CookieJar::new(),
            Json(LoginRequest {
                username: "alice".into(),
                password: "WrongSecret".into(),
            }),
        )
        .await
        .expect_err("wrong password rejected");

        let unknown_user = login(
            State(state),
            CookieJar::new(),
            Json(LoginRequest {
                username: "nosuchuser".into(),
                password: "WrongSecret".into(),
            }),
        )
        .await
        .expect_err("unknown user rejected");

        assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_user, wrong_password);
    }

    #[tokio::test]
    async fn change_password_returns_updated_user() {
        let state = AppState::fake();
        let (_, Json(user)) = register(
            State(state.clone()),
            CookieJar::new(),
            register_body("a@x.com", "alice", "Secret123"),
        )
        .await
        .expect("registration succeeds");

        let Json(updated) = change_password(
            State(state),
            Json(ChangePasswordRequest {
                username: "alice".into(),
                password: "Secret123".into(),
                new_password: "NewSecret456".into(),
            }),
        )
        .await
        .expect("change succeeds");

        assert_eq!(updated.id, user.id);
        assert!(updated.updated_at > user.updated_at);
    }
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, instrument, warn};

use crate::{
    auth::{dto::DeleteUserRequest, extractors::CurrentUser},
    state::AppState,
    users::model::PublicUser,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/:id", get(get_user))
        .route("/user/:id/delete", post(delete_user))
}

/// Users may only look up their own record.
#[instrument(skip(state, current))]
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    if current.id != id {
        warn!(user_id = current.id, requested = id, "cross-user lookup denied");
        return Err((
            StatusCode::FORBIDDEN,
            "You are not authorized to view this user".into(),
        ));
    }

    match state.users.find_by_id(id).await {
        Ok(Some(user)) => Ok(Json(user.public())),
        Ok(None) => Err((StatusCode::NOT_FOUND, "User not found".into())),
        Err(e) => {
            error!(error = %e, user_id = id, "find_by_id failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// Self-deletion with password confirmation. The session cookie is cleared
/// before the record is removed.
#[instrument(skip(state, current, jar, payload))]
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    jar: CookieJar,
    Path(id): Path<i64>,
    Json(payload): Json<DeleteUserRequest>,
) -> Result<(CookieJar, Json<PublicUser>), (StatusCode, String)> {
    if let Err(reason) = payload.validate(&state.config.rules) {
        return Err((StatusCode::BAD_REQUEST, reason.into()));
    }

    if current.id != id {
        warn!(user_id = current.id, requested = id, "cross-user delete denied");
        return Err((
            StatusCode::FORBIDDEN,
            "You are not authorized to delete this user".into(),
        ));
    }

    let confirmed = state
        .auth
        .login(&current.username, &payload.password)
        .await
        .map_err(|e| {
            error!(error = %e, "password confirmation failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;
    if confirmed.is_none() {
        return Err((StatusCode::UNAUTHORIZED, "Password is incorrect".into()));
    }

    let jar = state.auth.logout(jar);

    match state.users.delete(id).await {
        Ok(Some(user)) => {
            tracing::info!(user_id = id, "user deleted");
            Ok((jar, Json(user.public())))
        }
        Ok(None) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Could not delete user".into(),
        )),
        Err(e) => {
            error!(error = %e, user_id = id, "delete failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::error;

use crate::state::AppState;
use crate::users::model::User;

/// Authenticates the request from its session cookie and hands the freshly
/// loaded user record to the handler. Rejections never say whether the cookie
/// was absent, invalid, expired, or pointed at a deleted account.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        match state.auth.authenticate(&jar).await {
            Ok(Some(user)) => Ok(CurrentUser(user)),
            Ok(None) => Err((
                StatusCode::UNAUTHORIZED,
                "You must be logged in to access this route".to_string(),
            )),
            Err(e) => {
                error!(error = %e, "authenticate failed");
                Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                ))
            }
        }
    }
}

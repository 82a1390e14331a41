use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::domain::{ProfileUpdate, RegistrationForm};
use super::repository::UserRepository;
use super::service::{AccountError, AccountService, IdentityProvider};
use crate::workflows::identity::{Actor, UserId};
use crate::workflows::lifecycle::router::identity_error_response;

pub fn account_router<R, P>(service: Arc<AccountService<R, P>>) -> Router
where
    R: UserRepository + 'static,
    P: IdentityProvider + 'static,
{
    Router::new()
        .route("/api/v1/accounts", post(register_handler::<R, P>))
        .route(
            "/api/v1/accounts/me",
            get(profile_handler::<R, P>).patch(update_handler::<R, P>),
        )
        .with_state(service)
}

fn account_error_response(error: AccountError) -> Response {
    let status = match &error {
        AccountError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AccountError::NotFound(_) => StatusCode::NOT_FOUND,
        AccountError::Conflict(_) => StatusCode::CONFLICT,
        AccountError::Enrollment(_) => {
            tracing::error!(error = %error, "identity provider rejected enrollment");
            StatusCode::BAD_GATEWAY
        }
        AccountError::Repository(_) => {
            tracing::error!(error = %error, "user store failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}

fn signed_in(headers: &HeaderMap) -> Result<UserId, Response> {
    match Actor::from_headers(headers) {
        Ok(Actor {
            user_id: Some(user_id),
            ..
        }) => Ok(user_id),
        Ok(_) => {
            let payload = json!({ "error": "sign in to view your profile" });
            Err((StatusCode::UNAUTHORIZED, Json(payload)).into_response())
        }
        Err(error) => Err(identity_error_response(error)),
    }
}

pub(crate) async fn register_handler<R, P>(
    State(service): State<Arc<AccountService<R, P>>>,
    Json(form): Json<RegistrationForm>,
) -> Response
where
    R: UserRepository + 'static,
    P: IdentityProvider + 'static,
{
    match service.register(form) {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(error) => account_error_response(error),
    }
}

pub(crate) async fn profile_handler<R, P>(
    State(service): State<Arc<AccountService<R, P>>>,
    headers: HeaderMap,
) -> Response
where
    R: UserRepository + 'static,
    P: IdentityProvider + 'static,
{
    let user_id = match signed_in(&headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };
    match service.profile(user_id) {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(error) => account_error_response(error),
    }
}

pub(crate) async fn update_handler<R, P>(
    State(service): State<Arc<AccountService<R, P>>>,
    headers: HeaderMap,
    Json(changes): Json<ProfileUpdate>,
) -> Response
where
    R: UserRepository + 'static,
    P: IdentityProvider + 'static,
{
    let user_id = match signed_in(&headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };
    match service.update_profile(user_id, changes) {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(error) => account_error_response(error),
    }
}

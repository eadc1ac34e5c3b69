/// Authentication Routes
///
/// Login, refresh-token rotation (form field or cookie) and logout.
/// Successful login and refresh both answer with the token pair in the JSON
/// body and the refresh token mirrored into the refresh cookie.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::auth::{
    expired_refresh_cookie, refresh_cookie, verify_password, RefreshCoordinator, TokenIssuer,
    TokenPair,
};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, DatabaseError, ErrorContext};
use crate::users::UserRepository;

/// Login request
#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Form body for `POST /refresh-token`
#[derive(Deserialize)]
pub struct RefreshForm {
    pub refresh_token: String,
}

fn token_response(pair: TokenPair, config: &JwtSettings) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(refresh_cookie(config, &pair.refresh_token))
        .json(pair)
}

/// POST /auth
///
/// Authenticate with `{"email": ..., "password": ...}`.
///
/// # Errors
/// - 401: unreadable body, unknown email or wrong password (same response
///   for all three so accounts cannot be enumerated)
/// - 500: token signing failed
pub async fn authenticate(
    body: web::Bytes,
    users: web::Data<dyn UserRepository>,
    issuer: web::Data<TokenIssuer>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("authenticate");

    let creds: Credentials = serde_json::from_slice(&body)
        .map_err(|_| AppError::Unauthenticated(AuthError::InvalidCredentials))?;

    let user = users
        .get_user_by_email(&creds.email)
        .await
        .map_err(|e| match e {
            AppError::Database(DatabaseError::NotFound(_)) => {
                AppError::Unauthenticated(AuthError::InvalidCredentials)
            }
            other => other,
        })?;

    if !verify_password(&user, &creds.password) {
        return Err(AuthError::InvalidCredentials.into());
    }

    let pair = issuer.issue(&user)?;

    let context = context.with_user_id(user.id.to_string());
    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        user_id = ?context.user_id,
        "User authenticated"
    );

    Ok(token_response(pair, jwt_config.get_ref()))
}

/// Where a refresh token was presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshSource {
    Form,
    Cookie,
}

async fn rotate(
    refresh_token: &str,
    source: RefreshSource,
    users: &dyn UserRepository,
    coordinator: &RefreshCoordinator,
    jwt_config: &JwtSettings,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");

    let pair = coordinator.refresh(refresh_token, users).await?;

    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        source = ?source,
        "Token pair rotated"
    );

    Ok(token_response(pair, jwt_config))
}

/// POST /refresh-token
///
/// Rotate the refresh token posted as form field `refresh_token`.
///
/// # Errors
/// - 400: unreadable form, invalid or expired token, unknown user
/// - 425: more than the throttle window left on the token
pub async fn refresh_from_form(
    form: web::Form<RefreshForm>,
    users: web::Data<dyn UserRepository>,
    coordinator: web::Data<RefreshCoordinator>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    rotate(
        &form.refresh_token,
        RefreshSource::Form,
        users.get_ref(),
        coordinator.get_ref(),
        jwt_config.get_ref(),
    )
    .await
}

/// POST /refresh-cookie
///
/// Rotate the refresh token held in the refresh cookie.
///
/// # Errors
/// - 401: no refresh cookie
/// - 400 / 425: as for `POST /refresh-token`
pub async fn refresh_from_cookie(
    req: HttpRequest,
    users: web::Data<dyn UserRepository>,
    coordinator: web::Data<RefreshCoordinator>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let cookie = req
        .cookie(&jwt_config.cookie_name)
        .ok_or(AuthError::MissingRefreshCookie)?;

    rotate(
        cookie.value(),
        RefreshSource::Cookie,
        users.get_ref(),
        coordinator.get_ref(),
        jwt_config.get_ref(),
    )
    .await
}

/// GET /logout
///
/// Overwrite the refresh cookie with an expired one.
pub async fn logout(jwt_config: web::Data<JwtSettings>) -> HttpResponse {
    tracing::debug!("Clearing refresh cookie");
    HttpResponse::Accepted()
        .cookie(expired_refresh_cookie(jwt_config.get_ref()))
        .finish()
}

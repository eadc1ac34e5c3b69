/// Refresh cookie construction
///
/// The refresh token is mirrored into an HTTP-only cookie for browser
/// clients. Logout overwrites it with an already-expired cookie of the same
/// name.
///
/// A `__Host-` cookie is locked to the host that set it, and user agents
/// drop it if it names a `Domain`. The configured cookie domain only applies
/// to names without that prefix.

use actix_web::cookie::time::Duration;
use actix_web::cookie::{Cookie, SameSite};

use crate::configuration::JwtSettings;

const HOST_PREFIX: &str = "__Host-";

pub fn refresh_cookie(config: &JwtSettings, refresh_token: &str) -> Cookie<'static> {
    let mut builder = Cookie::build(config.cookie_name.clone(), refresh_token.to_string())
        .path("/")
        .max_age(Duration::seconds(config.refresh_token_expiry))
        .same_site(SameSite::Strict)
        .http_only(true)
        .secure(true);

    if !config.cookie_name.starts_with(HOST_PREFIX) {
        builder = builder.domain(config.cookie_domain.clone());
    }

    builder.finish()
}

pub fn expired_refresh_cookie(config: &JwtSettings) -> Cookie<'static> {
    let mut cookie = refresh_cookie(config, "");
    // Sets Max-Age=0 and an Expires date in the past
    cookie.make_removal();
    cookie
}

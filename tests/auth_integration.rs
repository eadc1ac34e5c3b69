use std::net::TcpListener;
use std::sync::Arc;

use actix_web::cookie::{time::OffsetDateTime, Cookie};
use authgate::auth::{hash_password, TokenIssuer, TokenPair, TokenVerifier};
use authgate::configuration::JwtSettings;
use authgate::startup::run;
use authgate::users::{Identity, InMemoryUserRepository};
use serde_json::{json, Value};

const COOKIE_NAME: &str = "__Host-refresh_token";

pub struct TestApp {
    pub address: String,
    pub jwt_config: JwtSettings,
}

impl TestApp {
    /// Issuer sharing the server's secret and domain, with custom lifetimes
    fn issuer_with_lifetimes(&self, access: i64, refresh: i64) -> TokenIssuer {
        let mut config = self.jwt_config.clone();
        config.access_token_expiry = access;
        config.refresh_token_expiry = refresh;
        TokenIssuer::new(&config)
    }

    async fn get_user(&self, id: &str, authorization: Option<&str>) -> reqwest::Response {
        let mut request = reqwest::Client::new().get(&format!("{}/users/{}", &self.address, id));
        if let Some(value) = authorization {
            request = request.header("Authorization", value);
        }
        request.send().await.expect("Failed to execute request.")
    }

    async fn post_refresh_form(&self, token: &str) -> reqwest::Response {
        reqwest::Client::new()
            .post(&format!("{}/refresh-token", &self.address))
            .form(&[("refresh_token", token)])
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn post_refresh_cookie(&self, token: Option<&str>) -> reqwest::Response {
        let mut request = reqwest::Client::new().post(&format!("{}/refresh-cookie", &self.address));
        if let Some(token) = token {
            request = request.header("Cookie", format!("{}={}", COOKIE_NAME, token));
        }
        request.send().await.expect("Failed to execute request.")
    }
}

fn test_config() -> JwtSettings {
    JwtSettings {
        secret: "2dce505d96a53c5768052ee90fsdf2055657518ad489160df9913f66042e160".to_string(),
        domain: "example.com".to_string(),
        access_token_expiry: 900,
        refresh_token_expiry: 86400,
        refresh_window: 30,
        cookie_name: COOKIE_NAME.to_string(),
        cookie_domain: "localhost".to_string(),
    }
}

fn admin_user() -> Identity {
    Identity {
        id: 1,
        first_name: "Admin".to_string(),
        last_name: "User".to_string(),
        email: "admin@example.com".to_string(),
        password_hash: hash_password("secret").expect("Failed to hash password"),
        is_admin: 1,
    }
}

fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let jwt_config = test_config();
    let users = Arc::new(InMemoryUserRepository::new(vec![admin_user()]));

    let server = run(listener, jwt_config.clone(), users)
        .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        jwt_config,
    }
}

fn refresh_cookie(response: &reqwest::Response) -> Option<Cookie<'static>> {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| Cookie::parse(v.to_string()).ok())
        .find(|c| c.name() == COOKIE_NAME)
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

fn has_vary_authorization(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get_all(reqwest::header::VARY)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.contains("Authorization"))
}

// --- Authentication Tests ---

#[tokio::test]
async fn authenticate_returns_200_with_token_pair_and_cookie() {
    let app = spawn_app();

    let response = reqwest::Client::new()
        .post(&format!("{}/auth", &app.address))
        .json(&json!({"email": "admin@example.com", "password": "secret"}))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());

    let cookie = refresh_cookie(&response).expect("Refresh cookie should be set");
    let pair: TokenPair = response.json().await.expect("Failed to parse response");

    assert_eq!(cookie.value(), pair.refresh_token);
    assert_eq!(cookie.path(), Some("/"));
    // Host-locked cookies must not name a Domain
    assert_eq!(cookie.domain(), None);
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.secure(), Some(true));
    assert_eq!(cookie.same_site(), Some(actix_web::cookie::SameSite::Strict));
    assert_eq!(
        cookie.max_age(),
        Some(actix_web::cookie::time::Duration::seconds(86400))
    );

    let claims = TokenVerifier::new(&app.jwt_config)
        .verify_access(&pair.access_token)
        .expect("Issued access token should verify");
    assert_eq!(claims.sub, "1");
    assert_eq!(claims.name, "Admin User");
    assert!(claims.admin);
}

#[tokio::test]
async fn authenticate_returns_401_for_bad_credentials() {
    let app = spawn_app();
    let client = reqwest::Client::new();

    let test_cases = vec![
        ("I am not json", "not json"),
        ("{}", "empty json"),
        (r#"{"email":"","password":"secret"}"#, "empty email"),
        (r#"{"email":"admin@example.com","password":""}"#, "empty password"),
        (r#"{"email":"admin@example.com","password":"wrong"}"#, "wrong password"),
        (r#"{"email":"invalid@email.com","password":"test"}"#, "unknown user"),
        (r#"{"email":"ADMIN@example.com","password":"secret"}"#, "email case differs"),
    ];

    for (body, reason) in test_cases {
        let response = client
            .post(&format!("{}/auth", &app.address))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(401, response.status().as_u16(),
            "Should reject login: {}", reason);
        assert!(refresh_cookie(&response).is_none(),
            "No cookie expected for: {}", reason);
    }
}

// --- Auth Gate Tests ---

#[tokio::test]
async fn protected_route_accepts_valid_bearer_token() {
    let app = spawn_app();
    let pair = app.issuer_with_lifetimes(900, 86400).issue(&admin_user()).unwrap();

    let response = app
        .get_user("1", Some(bearer(&pair.access_token).as_str()))
        .await;

    assert_eq!(200, response.status().as_u16());
    assert!(has_vary_authorization(&response));

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["email"], "admin@example.com");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn protected_route_rejects_missing_or_malformed_headers() {
    let app = spawn_app();
    let pair = app.issuer_with_lifetimes(900, 86400).issue(&admin_user()).unwrap();

    let test_cases = vec![
        (None, "no header"),
        (Some(format!("Bear {}", pair.access_token)), "invalid bearer"),
        (Some(pair.access_token.clone()), "no bearer"),
        (Some(format!("Bearer {} 1", pair.access_token)), "three header parts"),
        (Some(format!("Bearer {}11", pair.access_token)), "invalid token"),
        (Some(format!("Bearer {}", pair.refresh_token)), "refresh token as bearer"),
    ];

    for (header, reason) in test_cases {
        // Unknown id: a 404 would mean the handler ran
        let response = app.get_user("999", header.as_deref()).await;

        assert_eq!(401, response.status().as_u16(),
            "Should reject: {}", reason);
        assert!(has_vary_authorization(&response),
            "Vary header missing for: {}", reason);
    }
}

#[tokio::test]
async fn protected_route_rejects_expired_token() {
    let app = spawn_app();
    let pair = app.issuer_with_lifetimes(-60, 86400).issue(&admin_user()).unwrap();

    let response = app
        .get_user("1", Some(bearer(&pair.access_token).as_str()))
        .await;

    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "TOKEN_EXPIRED");
}

#[tokio::test]
async fn protected_route_rejects_token_from_another_issuer() {
    let app = spawn_app();
    let mut other = app.jwt_config.clone();
    other.domain = "wrong issuer".to_string();
    let pair = TokenIssuer::new(&other).issue(&admin_user()).unwrap();

    let response = app
        .get_user("1", Some(bearer(&pair.access_token).as_str()))
        .await;

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn protected_route_rejects_token_signed_with_another_secret() {
    let app = spawn_app();
    let mut other = app.jwt_config.clone();
    other.secret = "some-other-secret-that-we-never-configured".to_string();
    let pair = TokenIssuer::new(&other).issue(&admin_user()).unwrap();

    let response = app
        .get_user("1", Some(bearer(&pair.access_token).as_str()))
        .await;

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn protected_route_reports_unknown_and_bad_ids() {
    let app = spawn_app();
    let pair = app.issuer_with_lifetimes(900, 86400).issue(&admin_user()).unwrap();
    let bearer = bearer(&pair.access_token);

    assert_eq!(404, app.get_user("2", Some(bearer.as_str())).await.status().as_u16());
    assert_eq!(400, app.get_user("YYY", Some(bearer.as_str())).await.status().as_u16());
}

#[tokio::test]
async fn error_id_matches_the_request_id_header() {
    let app = spawn_app();
    let pair = app.issuer_with_lifetimes(900, 86400).issue(&admin_user()).unwrap();

    let not_found = app.get_user("2", Some(bearer(&pair.access_token).as_str())).await;
    let too_early = app.post_refresh_form(&pair.refresh_token).await;

    for (response, expected_status) in [(not_found, 404), (too_early, 425)] {
        assert_eq!(expected_status, response.status().as_u16());
        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .expect("Response should carry a request id");
        let body: Value = response.json().await.expect("Failed to parse error body");

        assert_eq!(body["error_id"], request_id.as_str());
    }
}

#[tokio::test]
async fn successful_responses_carry_a_request_id() {
    let app = spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/health_check", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    assert!(response.headers().contains_key("x-request-id"));
}

// --- Refresh Tests ---

#[tokio::test]
async fn refresh_returns_425_when_not_yet_due() {
    let app = spawn_app();
    let pair = app.issuer_with_lifetimes(900, 86400).issue(&admin_user()).unwrap();

    let response = app.post_refresh_form(&pair.refresh_token).await;

    assert_eq!(425, response.status().as_u16());
    assert!(refresh_cookie(&response).is_none());
}

#[tokio::test]
async fn refresh_rotates_token_inside_window() {
    let app = spawn_app();
    let old = app.issuer_with_lifetimes(1, 10).issue(&admin_user()).unwrap();

    let response = app.post_refresh_form(&old.refresh_token).await;

    assert_eq!(200, response.status().as_u16());
    let cookie = refresh_cookie(&response).expect("Refresh cookie should be set");
    let pair: TokenPair = response.json().await.expect("Failed to parse response");

    assert_ne!(pair.refresh_token, old.refresh_token);
    assert_ne!(pair.access_token, old.access_token);
    assert_eq!(cookie.value(), pair.refresh_token);

    let claims = TokenVerifier::new(&app.jwt_config)
        .verify_refresh(&pair.refresh_token)
        .expect("Rotated refresh token should verify");
    assert_eq!(claims.sub, "1");
    assert!(claims.remaining_secs() > 30);
}

#[tokio::test]
async fn refresh_returns_400_for_invalid_tokens() {
    let app = spawn_app();
    let expired = app.issuer_with_lifetimes(-120, -60).issue(&admin_user()).unwrap();
    let mut ghost = admin_user();
    ghost.id = 42;
    let unknown = app.issuer_with_lifetimes(1, 10).issue(&ghost).unwrap();

    let test_cases = vec![
        (expired.refresh_token, "expired token"),
        ("not-a-token".to_string(), "garbage"),
        (String::new(), "empty token"),
        (unknown.refresh_token, "unknown user"),
    ];

    for (token, reason) in test_cases {
        let response = app.post_refresh_form(&token).await;

        assert_eq!(400, response.status().as_u16(),
            "Should reject refresh: {}", reason);
    }
}

#[tokio::test]
async fn refresh_returns_400_when_field_is_missing() {
    let app = spawn_app();

    let response = reqwest::Client::new()
        .post(&format!("{}/refresh-token", &app.address))
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body("token=abc")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn cookie_refresh_returns_401_without_cookie() {
    let app = spawn_app();

    let response = app.post_refresh_cookie(None).await;

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn cookie_refresh_applies_the_same_throttle() {
    let app = spawn_app();
    let pair = app.issuer_with_lifetimes(900, 86400).issue(&admin_user()).unwrap();

    let response = app.post_refresh_cookie(Some(pair.refresh_token.as_str())).await;

    assert_eq!(425, response.status().as_u16());
}

#[tokio::test]
async fn cookie_refresh_rotates_token_inside_window() {
    let app = spawn_app();
    let old = app.issuer_with_lifetimes(1, 10).issue(&admin_user()).unwrap();

    let response = app.post_refresh_cookie(Some(old.refresh_token.as_str())).await;

    assert_eq!(200, response.status().as_u16());
    let cookie = refresh_cookie(&response).expect("Refresh cookie should be set");
    let pair: TokenPair = response.json().await.expect("Failed to parse response");
    assert_ne!(pair.refresh_token, old.refresh_token);
    assert_eq!(cookie.value(), pair.refresh_token);
}

// --- Logout ---

#[tokio::test]
async fn logout_clears_refresh_cookie() {
    let app = spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/logout", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(202, response.status().as_u16());

    let cookie = refresh_cookie(&response).expect("Expired cookie should be set");
    assert_eq!(cookie.value(), "");
    let expires = cookie.expires_datetime().expect("Expires should be set");
    assert!(expires < OffsetDateTime::now_utc());
}

// --- End to end ---

#[tokio::test]
async fn login_verify_and_rotate_end_to_end() {
    let app = spawn_app();
    let client = reqwest::Client::new();

    // Log in
    let response = client
        .post(&format!("{}/auth", &app.address))
        .json(&json!({"email": "admin@example.com", "password": "secret"}))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());
    let pair: TokenPair = response.json().await.expect("Failed to parse response");

    let claims = TokenVerifier::new(&app.jwt_config)
        .verify_access(&pair.access_token)
        .unwrap();
    assert_eq!(claims.sub, "1");
    assert_eq!(claims.iss, "example.com");

    // Use the access token
    let response = app
        .get_user("1", Some(bearer(&pair.access_token).as_str()))
        .await;
    assert_eq!(200, response.status().as_u16());

    // Too early to rotate
    let response = app.post_refresh_form(&pair.refresh_token).await;
    assert_eq!(425, response.status().as_u16());

    // A refresh token about to expire is inside the window
    let short = app.issuer_with_lifetimes(1, 2).issue(&admin_user()).unwrap();
    let response = app.post_refresh_form(&short.refresh_token).await;
    assert_eq!(200, response.status().as_u16());
    let rotated: TokenPair = response.json().await.expect("Failed to parse response");
    assert_ne!(rotated.refresh_token, pair.refresh_token);
    assert_ne!(rotated.refresh_token, short.refresh_token);
}

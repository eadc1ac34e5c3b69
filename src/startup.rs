use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{RefreshCoordinator, TokenIssuer, TokenVerifier};
use crate::configuration::JwtSettings;
use crate::error::AppError;
use crate::logger::LoggerMiddleware;
use crate::middleware::AuthGate;
use crate::routes::{
    authenticate, get_user, health_check, logout, refresh_from_cookie, refresh_from_form,
};
use crate::users::UserRepository;

pub fn run(
    listener: TcpListener,
    jwt_config: JwtSettings,
    users: Arc<dyn UserRepository>,
) -> Result<Server, std::io::Error> {
    // Built once; read-only for the lifetime of the server
    let issuer = TokenIssuer::new(&jwt_config);
    let verifier = TokenVerifier::new(&jwt_config);
    let coordinator = RefreshCoordinator::with_parts(
        issuer.clone(),
        verifier.clone(),
        jwt_config.refresh_window,
    );

    let users = web::Data::from(users);
    let issuer = web::Data::new(issuer);
    let coordinator = web::Data::new(coordinator);
    let jwt_config_data = web::Data::new(jwt_config);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(LoggerMiddleware)
            .app_data(users.clone())
            .app_data(issuer.clone())
            .app_data(coordinator.clone())
            .app_data(jwt_config_data.clone())
            .app_data(web::FormConfig::default().error_handler(|err, _req| {
                AppError::MalformedInput(err.to_string()).into()
            }))
            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/auth", web::post().to(authenticate))
            .route("/refresh-token", web::post().to(refresh_from_form))
            .route("/refresh-cookie", web::post().to(refresh_from_cookie))
            .route("/logout", web::get().to(logout))
            // Protected routes
            .service(
                web::scope("/users")
                    .wrap(AuthGate::new(verifier.clone()))
                    .route("/{user_id}", web::get().to(get_user)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}

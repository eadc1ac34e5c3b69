use actix_web::HttpResponse;

/// GET /health_check
///
/// Liveness probe. Public, and never touches the user store.
pub async fn health_check() -> HttpResponse {
    tracing::trace!("Liveness probe");
    HttpResponse::Ok().finish()
}

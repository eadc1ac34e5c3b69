/// Bearer Token Gate
///
/// Wraps protected routes. A request reaches the wrapped service only if it
/// carries `Authorization: Bearer <access token>` and the token verifies.
/// Every response from the gate, allowed or rejected, carries
/// `Vary: Authorization`.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderMap, HeaderValue, AUTHORIZATION, VARY},
    Error, ResponseError,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::TokenVerifier;
use crate::error::{AppError, AuthError};

/// Pull the token out of `Authorization: Bearer <token>`
///
/// # Errors
/// - `MissingHeader` when there is no Authorization header
/// - `MalformedHeader` unless the value is exactly two whitespace-separated
///   parts starting with `Bearer`
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers.get(AUTHORIZATION).ok_or(AuthError::MissingHeader)?;
    let value = value.to_str().map_err(|_| AuthError::MalformedHeader)?;
    if value.is_empty() {
        return Err(AuthError::MissingHeader);
    }

    let parts: Vec<&str> = value.split_whitespace().collect();
    match parts.as_slice() {
        ["Bearer", token] => Ok(*token),
        _ => Err(AuthError::MalformedHeader),
    }
}

pub struct AuthGate {
    verifier: Rc<TokenVerifier>,
}

impl AuthGate {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self {
            verifier: Rc::new(verifier),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthGateService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AuthGateService {
            service: Rc::new(service),
            verifier: self.verifier.clone(),
        }))
    }
}

pub struct AuthGateService<S> {
    service: Rc<S>,
    verifier: Rc<TokenVerifier>,
}

impl<S> AuthGateService<S> {
    fn authorize(&self, req: &ServiceRequest) -> Result<(), AuthError> {
        let token = extract_bearer_token(req.headers())?;
        self.verifier.verify_access(token).map_err(AuthError::Token)?;
        Ok(())
    }
}

impl<S, B> Service<ServiceRequest> for AuthGateService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match self.authorize(&req) {
            Ok(()) => {
                tracing::debug!(path = %req.path(), "Bearer token accepted");
                let fut = self.service.call(req);
                Box::pin(async move {
                    let mut res = fut.await?;
                    res.headers_mut()
                        .append(VARY, HeaderValue::from_static("Authorization"));
                    Ok(res)
                })
            }
            Err(e) => {
                let err = AppError::Unauthenticated(e);
                let mut response = err.error_response();
                response
                    .headers_mut()
                    .append(VARY, HeaderValue::from_static("Authorization"));
                Box::pin(async move {
                    Err(actix_web::error::InternalError::from_response(err, response).into())
                })
            }
        }
    }
}

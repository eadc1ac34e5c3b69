use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::time::Instant;
use tracing::Instrument;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

tokio::task_local! {
    static REQUEST_ID: String;
}

/// 현재 처리 중인 요청의 request_id를 반환합니다.
/// 로그 span, 핸들러 로그, 에러 응답의 error_id가 모두 이 값을 사용합니다.
/// 요청 밖에서 호출되면 새 id를 만듭니다.
pub fn current_request_id() -> String {
    REQUEST_ID
        .try_with(|id| id.clone())
        .unwrap_or_else(|_| uuid::Uuid::new_v4().to_string())
}

/// 요청 로깅 미들웨어
/// 요청마다 request_id를 붙인 span을 열고, 완료 시 상태 코드와 처리 시간을 기록합니다.
/// Authorization 헤더와 쿠키 값은 기록하지 않습니다.
pub struct LoggerMiddleware;

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = LoggerMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(LoggerMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct LoggerMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
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
        let start_time = Instant::now();
        let request_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!(
            "http_request",
            request_id = %request_id,
            method = %req.method(),
            path = %req.path(),
        );

        // 안쪽 미들웨어는 call 안에서 바로 거절 응답을 만들 수 있으므로 여기서도 id를 설정합니다.
        let fut = {
            let _entered = span.enter();
            tracing::debug!("Request started");
            REQUEST_ID.sync_scope(request_id.clone(), || self.service.call(req))
        };

        let header_value = HeaderValue::from_str(&request_id).ok();

        let handled = async move {
            let mut result = fut.await;
            let elapsed_ms = start_time.elapsed().as_millis() as u64;

            match &mut result {
                Ok(res) => {
                    if let Some(value) = header_value {
                        res.headers_mut()
                            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
                    }
                    tracing::info!(
                        status = res.status().as_u16(),
                        elapsed_ms,
                        "Request completed"
                    );
                }
                // 미들웨어가 거절한 요청 (예: 인증 실패)
                Err(e) => {
                    tracing::info!(
                        status = e.as_response_error().status_code().as_u16(),
                        elapsed_ms,
                        "Request rejected"
                    );
                }
            }

            result
        };

        Box::pin(REQUEST_ID.scope(request_id, handled).instrument(span))
    }
}

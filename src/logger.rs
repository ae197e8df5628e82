use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error,
};
use futures::future::LocalBoxFuture;
use log::{info, warn};
use std::rc::Rc;
use std::time::Instant;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// 커스텀 Logger 미들웨어
/// 요청마다 request id를 붙이고 처리 시간과 상태 코드를 로깅합니다.
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
        let request_id = Uuid::new_v4().to_string();
        let method = req.method().to_string();
        // Path only; query strings may carry emails
        let path = req.path().to_string();

        info!("[{}] Request started: {} {}", request_id, method, path);

        let service = self.service.clone();

        Box::pin(async move {
            let mut res = service.call(req).await?;

            let elapsed = start_time.elapsed();
            let status = res.status();

            // 응답 정보 로깅
            if status.is_server_error() {
                warn!(
                    "[{}] Request failed: {} {} - Status: {} ({}ms)",
                    request_id,
                    method,
                    path,
                    status.as_u16(),
                    elapsed.as_millis()
                );
            } else {
                info!(
                    "[{}] Request completed: {} {} - Status: {} ({}ms)",
                    request_id,
                    method,
                    path,
                    status.as_u16(),
                    elapsed.as_millis()
                );
            }

            if let Ok(value) = HeaderValue::from_str(&request_id) {
                res.headers_mut()
                    .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }

            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};

    fn request_id<B>(res: &ServiceResponse<B>) -> Option<String> {
        res.headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    #[actix_web::test]
    async fn test_request_id_header_is_set() {
        let app = test::init_service(
            App::new()
                .wrap(LoggerMiddleware)
                .route("/", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        let first = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        let second = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

        let first_id = request_id(&first).unwrap();
        assert!(Uuid::parse_str(&first_id).is_ok());
        assert_ne!(Some(first_id), request_id(&second));
    }
}

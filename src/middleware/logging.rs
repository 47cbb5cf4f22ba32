// 请求日志中间件
// 记录每个请求的来源、耗时和状态码；回跳参数中含封印，只记录路径

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures_util::future::{ok, Ready};
use log::Level;

/// 健康检查请求只在 debug 级别记录
const HEALTH_PATH: &str = "/health";

/// 请求日志中间件
pub struct RequestLogging;

impl<S, B> Transform<S, ServiceRequest> for RequestLogging
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestLoggingMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequestLoggingMiddleware { service })
    }
}

pub struct RequestLoggingMiddleware<S> {
    service: S,
}

/// 根据路径和状态码选择日志级别
fn level_for(path: &str, status: u16) -> Level {
    if status >= 500 {
        Level::Error
    } else if status >= 400 {
        Level::Warn
    } else if path == HEALTH_PATH {
        Level::Debug
    } else {
        Level::Info
    }
}

impl<S, B> Service<ServiceRequest> for RequestLoggingMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start_time = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let remote_addr = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();

        let fut = self.service.call(req);

        Box::pin(async move {
            let result = fut.await;
            let elapsed = start_time.elapsed().as_millis();

            match &result {
                Ok(response) => {
                    let status = response.status().as_u16();
                    log::log!(
                        level_for(&path, status),
                        "{} {} {} {}ms - {}",
                        remote_addr,
                        method,
                        path,
                        elapsed,
                        status
                    );
                }
                Err(e) => {
                    log::error!(
                        "{} {} {} {}ms - ERROR: {}",
                        remote_addr,
                        method,
                        path,
                        elapsed,
                        e
                    );
                }
            }

            result
        })
    }
}

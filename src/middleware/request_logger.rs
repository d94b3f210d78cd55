use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use log::{error, info, warn};
use std::{rc::Rc, time::Instant};

// Request logger middleware
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestLoggerMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequestLoggerMiddleware {
            service: Rc::new(service),
        })
    }
}

pub struct RequestLoggerMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
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
        let method = req.method().clone();
        let path = req.path().to_owned();
        let client_ip = req
            .connection_info()
            .peer_addr()
            .unwrap_or("unknown")
            .to_owned();

        info!("[BOOKSTORE-REQUEST] {} {} {}", client_ip, method, path);

        let service = self.service.clone();
        Box::pin(async move {
            let res = service.call(req).await;
            let elapsed = start_time.elapsed();

            match &res {
                Ok(response) => {
                    let status = response.status();
                    // 4xx is routine client noise, 5xx deserves attention.
                    if status.is_server_error() {
                        warn!(
                            "[BOOKSTORE-RESPONSE] {} {} {} - Status: {} - Time: {:.2?}",
                            client_ip,
                            method,
                            path,
                            status.as_u16(),
                            elapsed
                        );
                    } else {
                        info!(
                            "[BOOKSTORE-RESPONSE] {} {} {} - Status: {} - Time: {:.2?}",
                            client_ip,
                            method,
                            path,
                            status.as_u16(),
                            elapsed
                        );
                    }
                }
                Err(err) => {
                    error!(
                        "[BOOKSTORE-ERROR] {} {} {} - Error: {} - Time: {:.2?}",
                        client_ip, method, path, err, elapsed
                    );
                }
            }

            res
        })
    }
}

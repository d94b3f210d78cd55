use crate::error::AppError;
use crate::handlers::auth::Payload;
use crate::handlers::token::{TokenCodec, TokenError};
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpMessage, ResponseError,
};
use chrono::{DateTime, Utc};
use futures_util::future::{ok, LocalBoxFuture, Ready};
use log::{info, warn};
use std::rc::Rc;
use std::sync::Arc;
use thiserror::Error;

/// Accepted authorization scheme, compared case-insensitively.
pub const AUTHORIZATION_TYPE_BEARER: &str = "bearer";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("authorization header is not provided")]
    MissingCredential,
    #[error("unsupported authorization type {0}")]
    UnsupportedScheme(String),
    #[error("invalid authorization header format")]
    MalformedCredential,
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl AuthError {
    /// Tag used in logs. Never sent to the client.
    pub fn log_tag(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::UnsupportedScheme(_) => "unsupported_scheme",
            AuthError::MalformedCredential => "malformed_credential",
            AuthError::Token(TokenError::Expired) => "token_expired",
            AuthError::Token(_) => "token_rejected",
        }
    }
}

/// Validates a raw `<scheme> <token>` credential and returns the verified
/// payload. Transport-agnostic: HTTP passes the `Authorization` header, an
/// RPC adapter would pass its `authorization` metadata entry.
pub fn authenticate(codec: &TokenCodec, credential: Option<&str>) -> Result<Payload, AuthError> {
    authenticate_at(codec, credential, Utc::now())
}

/// [`authenticate`] with expiry checked against `now`. Fields past the
/// token are ignored.
pub fn authenticate_at(
    codec: &TokenCodec,
    credential: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Payload, AuthError> {
    let credential = credential.ok_or(AuthError::MissingCredential)?;

    let fields: Vec<&str> = credential.split_whitespace().collect();
    if fields.len() < 2 {
        return Err(AuthError::MalformedCredential);
    }

    let scheme = fields[0].to_lowercase();
    if scheme != AUTHORIZATION_TYPE_BEARER {
        return Err(AuthError::UnsupportedScheme(scheme));
    }

    Ok(codec.decrypt_at(fields[1], now)?)
}

fn log_rejection(method: &str, path: &str, err: &AuthError) {
    match err {
        AuthError::Token(TokenError::Malformed | TokenError::Tampered) => warn!(
            "[BOOKSTORE-AUTH] {} {} rejected ({}): {}",
            method,
            path,
            err.log_tag(),
            err
        ),
        _ => info!(
            "[BOOKSTORE-AUTH] {} {} rejected ({}): {}",
            method,
            path,
            err.log_tag(),
            err
        ),
    }
}

/// Gate for protected routes. On success the verified [`Payload`] is put in
/// the request extensions, where handlers read it with `web::ReqData<Payload>`.
/// On failure the wrapped service is never called.
#[derive(Clone)]
pub struct AuthMiddleware {
    codec: Arc<TokenCodec>,
}

impl AuthMiddleware {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        AuthMiddleware { codec }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService {
            service: Rc::new(service),
            codec: self.codec.clone(),
        })
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    codec: Arc<TokenCodec>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let codec = self.codec.clone();

        Box::pin(async move {
            let verified = match req.headers().get(AUTHORIZATION) {
                None => authenticate(&codec, None),
                Some(value) => match value.to_str() {
                    Ok(credential) => authenticate(&codec, Some(credential)),
                    Err(_) => Err(AuthError::MalformedCredential),
                },
            };

            match verified {
                Ok(payload) => {
                    req.extensions_mut().insert(payload);
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(err) => {
                    log_rejection(req.method().as_str(), req.path(), &err);
                    let response = AppError::from(err).error_response();
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

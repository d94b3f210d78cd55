use crate::config::Config;
use crate::error::AppError;
use crate::handlers::auth::{Payload, SessionIssuer};
use crate::handlers::db::{with_deadline, Store, StoreError};
use crate::handlers::password::{hash_password, verify_password};
use crate::handlers::token::TokenCodec;
use crate::handlers::validation::{check_field, validate_email, validate_name, validate_password};
use crate::middleware::auth_middleware::AuthMiddleware;
use crate::models::all_models::{CreateUserParams, UpdateUserParams, User, UserRole};
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

//Create User Request
#[derive(Deserialize, Serialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<UserRole>,
}

//User Response (never carries the password hash)
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

//Create User
//Create User Input: CreateUserRequest
//Create User Output: UserResponse
pub async fn create_user(
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    payload: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let req = payload.into_inner();

    let mut violations = Vec::new();
    check_field(&mut violations, "name", validate_name(&req.name));
    check_field(&mut violations, "email", validate_email(&req.email));
    check_field(&mut violations, "password", validate_password(&req.password));
    if !violations.is_empty() {
        return Err(AppError::InvalidArgument(violations));
    }

    let params = CreateUserParams {
        name: req.name,
        email: req.email,
        hashed_password: hash_password(&req.password)?,
        role: req.role.unwrap_or_default(),
    };

    let user = with_deadline(config.store_timeout, store.create_user(params)).await?;
    info!("Created user {} ({})", user.id, user.role);
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

//Login Request
#[derive(Deserialize, Serialize)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

//Login Response
#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub session_id: Uuid,
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

//Login
//Login Input: LoginRequest
//Login Output: LoginResponse
pub async fn login(
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    issuer: web::Data<SessionIssuer>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let user = with_deadline(config.store_timeout, store.get_user_by_name(&payload.name))
        .await
        .map_err(|e| match e {
            StoreError::NotFound => AppError::NotFound("user not found".to_string()),
            other => other.into(),
        })?;

    if !verify_password(&payload.password, &user.hashed_password)? {
        info!("Login refused for user {}: wrong password", user.id);
        return Err(AppError::Unauthorized);
    }

    let (access_token, session) =
        issuer.issue(user.id, &user.name, user.role, config.access_token_duration)?;
    info!(
        "Issued session {} for user {} until {}",
        session.token_id, user.id, session.expires_at
    );

    Ok(HttpResponse::Ok().json(LoginResponse {
        session_id: session.token_id,
        access_token,
        access_token_expires_at: session.expires_at,
        user: user.into(),
    }))
}

//Update User Request
#[derive(Deserialize, Serialize, Default)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

//Update Me
//Update Me Input: Bearer token, UpdateUserRequest
//Update Me Output: UserResponse
pub async fn update_me(
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    auth: web::ReqData<Payload>,
    payload: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let req = payload.into_inner();

    let mut violations = Vec::new();
    if let Some(name) = &req.name {
        check_field(&mut violations, "name", validate_name(name));
    }
    if let Some(email) = &req.email {
        check_field(&mut violations, "email", validate_email(email));
    }
    if let Some(password) = &req.password {
        check_field(&mut violations, "password", validate_password(password));
    }
    if !violations.is_empty() {
        return Err(AppError::InvalidArgument(violations));
    }

    let hashed_password = match &req.password {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let params = UpdateUserParams {
        id: auth.user_id,
        name: req.name,
        email: req.email,
        hashed_password,
    };

    let user = with_deadline(config.store_timeout, store.update_user(params)).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

//Config User Auth Routes
// POST /users
// POST /users/login
// PATCH /users/me (protected)
pub fn config_user_auth_routes(cfg: &mut web::ServiceConfig, codec: Arc<TokenCodec>) {
    cfg.service(web::resource("/users").route(web::post().to(create_user)))
        .service(web::resource("/users/login").route(web::post().to(login)))
        .service(
            web::resource("/users/me")
                .wrap(AuthMiddleware::new(codec))
                .route(web::patch().to(update_me)),
        );
}

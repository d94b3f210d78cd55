use crate::config::Config;
use crate::error::{AppError, FieldViolation};
use crate::handlers::auth::Payload;
use crate::handlers::db::{with_deadline, Store};
use crate::handlers::token::TokenCodec;
use crate::handlers::validation::{
    check_field, validate_author, validate_not_blank, validate_page, validate_price,
};
use crate::middleware::auth_middleware::AuthMiddleware;
use crate::models::all_models::{CreateBookParams, ListBooksParams, UpdateBookParams};
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Book mutations are reserved for sellers.
fn require_book_manager(auth: &Payload) -> Result<(), AppError> {
    if auth.role.can_manage_books() {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "role {} cannot manage books",
            auth.role
        )))
    }
}

//Create Book Request
//No owner field: books belong to the token subject.
#[derive(Debug, Deserialize, Serialize)]
pub struct CreateBookRequest {
    pub title: String,
    pub author: String,
    pub price: i64,
    pub description: String,
    pub cover_image_url: String,
    pub published_date: DateTime<Utc>,
}

//Create Book
//Create Book Input: Bearer token, CreateBookRequest
//Create Book Output: Book
pub async fn create_book(
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    auth: web::ReqData<Payload>,
    payload: web::Json<CreateBookRequest>,
) -> Result<HttpResponse, AppError> {
    require_book_manager(&auth)?;
    let req = payload.into_inner();

    let mut violations = Vec::new();
    check_field(&mut violations, "title", validate_not_blank(&req.title));
    check_field(&mut violations, "author", validate_author(&req.author));
    check_field(&mut violations, "price", validate_price(req.price));
    check_field(&mut violations, "description", validate_not_blank(&req.description));
    check_field(
        &mut violations,
        "cover_image_url",
        validate_not_blank(&req.cover_image_url),
    );
    if !violations.is_empty() {
        return Err(AppError::InvalidArgument(violations));
    }

    let params = CreateBookParams {
        title: req.title,
        author: req.author,
        price: req.price,
        description: req.description,
        cover_image_url: req.cover_image_url,
        published_date: req.published_date,
        user_id: auth.user_id,
    };

    let book = with_deadline(config.store_timeout, store.create_book(params))
        .await
        .map_err(AppError::from_book_store)?;
    info!("User {} created book {}", auth.user_id, book.id);
    Ok(HttpResponse::Ok().json(book))
}

//List Books Query
#[derive(Debug, Deserialize, Serialize)]
pub struct ListBooksQuery {
    pub page_no: i64,
    pub page_size: i64,
}

//List Books
//List Books Input: Bearer token, Query (?page_no=&page_size=)
//List Books Output: Vec<Book> owned by the caller
pub async fn list_books(
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    auth: web::ReqData<Payload>,
    query: web::Query<ListBooksQuery>,
) -> Result<HttpResponse, AppError> {
    let (limit, offset) = validate_page(query.page_no, query.page_size, config.page_size)
        .map_err(AppError::InvalidArgument)?;

    let params = ListBooksParams {
        user_id: auth.user_id,
        limit,
        offset,
    };

    let books = with_deadline(config.store_timeout, store.list_books(params)).await?;
    Ok(HttpResponse::Ok().json(books))
}

//Update Book Request
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub price: Option<i64>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    pub published_date: Option<DateTime<Utc>>,
}

impl UpdateBookRequest {
    fn violations(&self) -> Vec<FieldViolation> {
        let mut violations = Vec::new();
        if let Some(title) = &self.title {
            check_field(&mut violations, "title", validate_not_blank(title));
        }
        if let Some(author) = &self.author {
            check_field(&mut violations, "author", validate_author(author));
        }
        if let Some(price) = self.price {
            check_field(&mut violations, "price", validate_price(price));
        }
        if let Some(description) = &self.description {
            check_field(&mut violations, "description", validate_not_blank(description));
        }
        if let Some(url) = &self.cover_image_url {
            check_field(&mut violations, "cover_image_url", validate_not_blank(url));
        }
        violations
    }
}

//Update Book
//Update Book Input: Bearer token, Path (/books/{id}), UpdateBookRequest
//Update Book Output: Book
pub async fn update_book(
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    auth: web::ReqData<Payload>,
    path: web::Path<i64>,
    payload: web::Json<UpdateBookRequest>,
) -> Result<HttpResponse, AppError> {
    require_book_manager(&auth)?;
    let req = payload.into_inner();

    let violations = req.violations();
    if !violations.is_empty() {
        return Err(AppError::InvalidArgument(violations));
    }

    let params = UpdateBookParams {
        id: path.into_inner(),
        user_id: auth.user_id,
        title: req.title,
        author: req.author,
        price: req.price,
        description: req.description,
        cover_image_url: req.cover_image_url,
        published_date: req.published_date,
    };

    let book = with_deadline(config.store_timeout, store.update_book(params))
        .await
        .map_err(AppError::from_book_store)?;
    Ok(HttpResponse::Ok().json(book))
}

//Config Book Routes (all protected)
// POST /books
// GET /books
// PATCH /books/{id}
pub fn config_book_routes(cfg: &mut web::ServiceConfig, codec: Arc<TokenCodec>) {
    cfg.service(
        web::resource("/books")
            .wrap(AuthMiddleware::new(codec.clone()))
            .route(web::post().to(create_book))
            .route(web::get().to(list_books)),
    )
    .service(
        web::resource("/books/{id}")
            .wrap(AuthMiddleware::new(codec))
            .route(web::patch().to(update_book)),
    );
}

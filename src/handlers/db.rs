use crate::models::all_models::{
    Book, CreateBookParams, CreateUserParams, ListBooksParams, UpdateBookParams,
    UpdateUserParams, User,
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),
    #[error("row not found")]
    NotFound,
    #[error("store call canceled after {0:?}")]
    Canceled(Duration),
    #[error("store error: {0}")]
    Other(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::UniqueViolation(db.message().to_string())
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                StoreError::ForeignKeyViolation(db.message().to_string())
            }
            _ => StoreError::Other(e.to_string()),
        }
    }
}

/// Persistence capability used by the handlers. Every tenant-owned call
/// carries the owning user id in its params.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(&self, params: CreateUserParams) -> Result<User, StoreError>;
    async fn get_user_by_name(&self, name: &str) -> Result<User, StoreError>;
    async fn update_user(&self, params: UpdateUserParams) -> Result<User, StoreError>;
    async fn create_book(&self, params: CreateBookParams) -> Result<Book, StoreError>;
    async fn list_books(&self, params: ListBooksParams) -> Result<Vec<Book>, StoreError>;
    async fn update_book(&self, params: UpdateBookParams) -> Result<Book, StoreError>;
}

/// Runs a store call under a deadline. On timeout the call's future is
/// dropped, which cancels the in-flight query.
pub async fn with_deadline<T, F>(limit: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Canceled(limit)),
    }
}

pub async fn check_db_connection(pool: &PgPool) -> bool {
    match pool.acquire().await {
        Ok(_) => true,
        Err(e) => {
            log::error!("Database connection check failed: {}", e);
            false
        }
    }
}

const USER_COLUMNS: &str = "id, name, email, hashed_password, role, created_at, updated_at";
const BOOK_COLUMNS: &str = "id, title, author, price, description, cover_image_url, \
                            published_date, user_id, created_at";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, params: CreateUserParams) -> Result<User, StoreError> {
        let query = format!(
            "INSERT INTO users (name, email, hashed_password, role) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(&params.name)
            .bind(&params.email)
            .bind(&params.hashed_password)
            .bind(params.role)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user_by_name(&self, name: &str) -> Result<User, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE name = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_user(&self, params: UpdateUserParams) -> Result<User, StoreError> {
        let query = format!(
            "UPDATE users SET \
                name = COALESCE($2, name), \
                email = COALESCE($3, email), \
                hashed_password = COALESCE($4, hashed_password), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(params.id)
            .bind(params.name)
            .bind(params.email)
            .bind(params.hashed_password)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_book(&self, params: CreateBookParams) -> Result<Book, StoreError> {
        let query = format!(
            "INSERT INTO books (title, author, price, description, cover_image_url, published_date, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {BOOK_COLUMNS}"
        );
        let book = sqlx::query_as::<_, Book>(&query)
            .bind(&params.title)
            .bind(&params.author)
            .bind(params.price)
            .bind(&params.description)
            .bind(&params.cover_image_url)
            .bind(params.published_date)
            .bind(params.user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(book)
    }

    async fn list_books(&self, params: ListBooksParams) -> Result<Vec<Book>, StoreError> {
        let query = format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE user_id = $1 \
             ORDER BY id LIMIT $2 OFFSET $3"
        );
        let books = sqlx::query_as::<_, Book>(&query)
            .bind(params.user_id)
            .bind(params.limit)
            .bind(params.offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn update_book(&self, params: UpdateBookParams) -> Result<Book, StoreError> {
        // Owner filter in the WHERE clause: someone else's book reads as missing.
        let query = format!(
            "UPDATE books SET \
                title = COALESCE($3, title), \
                author = COALESCE($4, author), \
                price = COALESCE($5, price), \
                description = COALESCE($6, description), \
                cover_image_url = COALESCE($7, cover_image_url), \
                published_date = COALESCE($8, published_date) \
             WHERE id = $1 AND user_id = $2 RETURNING {BOOK_COLUMNS}"
        );
        let book = sqlx::query_as::<_, Book>(&query)
            .bind(params.id)
            .bind(params.user_id)
            .bind(params.title)
            .bind(params.author)
            .bind(params.price)
            .bind(params.description)
            .bind(params.cover_image_url)
            .bind(params.published_date)
            .fetch_one(&self.pool)
            .await?;
        Ok(book)
    }
}

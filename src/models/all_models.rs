use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::{Display, EnumString};

//  USER & AUTHENTICATION STRUCTS

#[derive(
    Debug, Default, Serialize, Deserialize, sqlx::Type, Display, EnumString, PartialEq, Eq, Clone,
    Copy,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserRole {
    Seller,
    #[default]
    Buyer,
}

impl UserRole {
    /// Whether this role may create or edit book listings.
    pub fn can_manage_books(self) -> bool {
        match self {
            UserRole::Seller => true,
            UserRole::Buyer => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub hashed_password: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateUserParams {
    pub name: String,
    pub email: String,
    pub hashed_password: String,
    pub role: UserRole,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateUserParams {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub hashed_password: Option<String>,
}

//  BOOKS

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub price: i64,
    pub description: String,
    pub cover_image_url: String,
    pub published_date: DateTime<Utc>,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateBookParams {
    pub title: String,
    pub author: String,
    pub price: i64,
    pub description: String,
    pub cover_image_url: String,
    pub published_date: DateTime<Utc>,
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListBooksParams {
    pub user_id: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Partial update of a book owned by `user_id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateBookParams {
    pub id: i64,
    pub user_id: i64,
    pub title: Option<String>,
    pub author: Option<String>,
    pub price: Option<i64>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    pub published_date: Option<DateTime<Utc>>,
}

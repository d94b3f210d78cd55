//! In-memory store double and fixture helpers for handler tests.

use crate::config::{Config, PageSizeLimits};
use crate::handlers::auth::Payload;
use crate::handlers::db::{Store, StoreError};
use crate::handlers::password::hash_password;
use crate::handlers::token::TokenCodec;
use crate::models::all_models::{
    Book, CreateBookParams, CreateUserParams, ListBooksParams, UpdateBookParams,
    UpdateUserParams, User, UserRole,
};
use crate::routes::books::CreateBookRequest;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::Rng;
use std::sync::Mutex;

pub fn random_int(min: i64, max: i64) -> i64 {
    rand::rng().random_range(min..=max)
}

pub fn random_string(n: usize) -> String {
    let mut rng = rand::rng();
    (0..n)
        .map(|_| rng.random_range(b'a'..=b'z') as char)
        .collect()
}

pub fn random_name() -> String {
    random_string(8)
}

pub fn random_email() -> String {
    format!("{}@email.com", random_string(6))
}

pub fn random_time() -> DateTime<Utc> {
    let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    start + Duration::seconds(random_int(0, 5 * 365 * 24 * 3600))
}

pub fn random_book_request() -> CreateBookRequest {
    CreateBookRequest {
        title: random_string(6),
        author: random_string(6),
        price: random_int(1, 1000),
        description: random_string(10),
        cover_image_url: random_string(10),
        published_date: random_time(),
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        http_server_address: "127.0.0.1:0".to_string(),
        token_symmetric_key: random_string(32).into_bytes(),
        access_token_duration: Duration::minutes(15),
        page_size: PageSizeLimits { min: 5, max: 10 },
        store_timeout: std::time::Duration::from_secs(1),
    }
}

/// `Authorization` header value for `user`, valid for `duration` from now.
pub fn bearer(codec: &TokenCodec, user: &User, duration: Duration) -> String {
    bearer_issued_at(codec, user, Utc::now(), duration)
}

pub fn bearer_issued_at(
    codec: &TokenCodec,
    user: &User,
    issued_at: DateTime<Utc>,
    duration: Duration,
) -> String {
    let payload = Payload::new(user.id, user.name.clone(), user.role, issued_at, duration).unwrap();
    format!("Bearer {}", codec.encrypt(&payload).unwrap())
}

/// Every argument the store was called with, in call order.
#[derive(Debug, Clone, Default)]
pub struct Calls {
    pub create_user: Vec<CreateUserParams>,
    pub get_user_by_name: Vec<String>,
    pub update_user: Vec<UpdateUserParams>,
    pub create_book: Vec<CreateBookParams>,
    pub list_books: Vec<ListBooksParams>,
    pub update_book: Vec<UpdateBookParams>,
}

impl Calls {
    fn total(&self) -> usize {
        self.create_user.len()
            + self.get_user_by_name.len()
            + self.update_user.len()
            + self.create_book.len()
            + self.list_books.len()
            + self.update_book.len()
    }
}

#[derive(Default)]
struct State {
    users: Vec<User>,
    books: Vec<Book>,
    calls: Calls,
    fail_with: Option<StoreError>,
}

#[derive(Default)]
pub struct FakeStore {
    state: Mutex<State>,
}

impl FakeStore {
    /// Makes every later call fail with `err`.
    pub fn fail_with(&self, err: StoreError) {
        self.state.lock().unwrap().fail_with = Some(err);
    }

    pub fn calls(&self) -> Calls {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().unwrap().calls.total()
    }

    /// Inserts a user directly, bypassing call recording.
    pub fn seed_user(&self, name: &str, password: &str, role: UserRole) -> User {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();
        let user = User {
            id: state.users.len() as i64 + 1,
            name: name.to_string(),
            email: format!("{name}@email.com"),
            hashed_password: hash_password(password).unwrap(),
            role,
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());
        user
    }

    /// Inserts a book owned by `user_id`, bypassing call recording.
    pub fn seed_book(&self, user_id: i64) -> Book {
        let mut state = self.state.lock().unwrap();
        let req = random_book_request();
        let book = Book {
            id: state.books.len() as i64 + 1,
            title: req.title,
            author: req.author,
            price: req.price,
            description: req.description,
            cover_image_url: req.cover_image_url,
            published_date: req.published_date,
            user_id,
            created_at: Utc::now(),
        };
        state.books.push(book.clone());
        book
    }
}

fn check_failure(state: &State) -> Result<(), StoreError> {
    match &state.fail_with {
        Some(err) => Err(err.clone()),
        None => Ok(()),
    }
}

#[async_trait]
impl Store for FakeStore {
    async fn create_user(&self, params: CreateUserParams) -> Result<User, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.create_user.push(params.clone());
        check_failure(&state)?;

        if state
            .users
            .iter()
            .any(|u| u.name == params.name || u.email == params.email)
        {
            return Err(StoreError::UniqueViolation("users_name_key".to_string()));
        }
        let now = Utc::now();
        let user = User {
            id: state.users.len() as i64 + 1,
            name: params.name,
            email: params.email,
            hashed_password: params.hashed_password,
            role: params.role,
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn get_user_by_name(&self, name: &str) -> Result<User, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.get_user_by_name.push(name.to_string());
        check_failure(&state)?;

        state
            .users
            .iter()
            .find(|u| u.name == name)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update_user(&self, params: UpdateUserParams) -> Result<User, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.update_user.push(params.clone());
        check_failure(&state)?;

        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == params.id)
            .ok_or(StoreError::NotFound)?;
        if let Some(name) = params.name {
            user.name = name;
        }
        if let Some(email) = params.email {
            user.email = email;
        }
        if let Some(hashed_password) = params.hashed_password {
            user.hashed_password = hashed_password;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn create_book(&self, params: CreateBookParams) -> Result<Book, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.create_book.push(params.clone());
        check_failure(&state)?;

        let book = Book {
            id: state.books.len() as i64 + 1,
            title: params.title,
            author: params.author,
            price: params.price,
            description: params.description,
            cover_image_url: params.cover_image_url,
            published_date: params.published_date,
            user_id: params.user_id,
            created_at: Utc::now(),
        };
        state.books.push(book.clone());
        Ok(book)
    }

    async fn list_books(&self, params: ListBooksParams) -> Result<Vec<Book>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.list_books.push(params.clone());
        check_failure(&state)?;

        Ok(state
            .books
            .iter()
            .filter(|b| b.user_id == params.user_id)
            .skip(params.offset as usize)
            .take(params.limit as usize)
            .cloned()
            .collect())
    }

    async fn update_book(&self, params: UpdateBookParams) -> Result<Book, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.update_book.push(params.clone());
        check_failure(&state)?;

        let book = state
            .books
            .iter_mut()
            .find(|b| b.id == params.id && b.user_id == params.user_id)
            .ok_or(StoreError::NotFound)?;
        if let Some(title) = params.title {
            book.title = title;
        }
        if let Some(author) = params.author {
            book.author = author;
        }
        if let Some(price) = params.price {
            book.price = price;
        }
        if let Some(description) = params.description {
            book.description = description;
        }
        if let Some(url) = params.cover_image_url {
            book.cover_image_url = url;
        }
        if let Some(date) = params.published_date {
            book.published_date = date;
        }
        Ok(book.clone())
    }
}

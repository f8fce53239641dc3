//! Data access for every module.
//!
//! Handlers depend on the [`Store`] trait only; [`SqliteStore`] is the
//! production implementation. Lookups of a single record report absence as
//! [`StoreError::NotFound`] so callers never branch on `Option`.

mod sqlite;

pub use sqlite::SqliteStore;

use async_trait::async_trait;
use shelf_http::AppError;
use thiserror::Error;

use crate::modules::{
    authors::models::{Author, AuthorWithBooks},
    books::models::{Book, BookWithAuthor},
    profile::models::{NewUser, User, UserPatch},
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(entity) => AppError::not_found(format!("{entity} not found")),
            StoreError::Conflict(message) => AppError::conflict(vec![], message),
            StoreError::Database(db) => {
                AppError::Internal(anyhow::Error::new(db).context("database operation failed"))
            }
        }
    }
}

/// Result of linking a book to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub book: Book,
    /// `false` when the user already had the book.
    pub created: bool,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn list_authors(&self) -> Result<Vec<Author>, StoreError>;

    async fn author_with_books(&self, author_id: i64) -> Result<AuthorWithBooks, StoreError>;

    async fn list_books(&self) -> Result<Vec<Book>, StoreError>;

    async fn book_with_author(&self, book_id: i64) -> Result<BookWithAuthor, StoreError>;

    async fn user(&self, user_id: i64) -> Result<User, StoreError>;

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Fails with [`StoreError::Conflict`] when the username is taken.
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError>;

    /// Books the user has added, ordered by id.
    async fn user_books(&self, user_id: i64) -> Result<Vec<Book>, StoreError>;

    /// Link a book to a user atomically. Attaching an already linked book is
    /// a no-op reported through [`Attachment::created`].
    async fn attach_book(&self, user_id: i64, book_id: i64) -> Result<Attachment, StoreError>;

    /// Apply a partial update. An empty patch only checks that the user exists.
    async fn update_user(&self, user_id: i64, patch: UserPatch) -> Result<(), StoreError>;
}

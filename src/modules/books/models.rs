use serde::{Deserialize, Serialize};

use crate::modules::authors::models::Author;

/// Domain model for the Books module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// Unique identifier for the book
    pub id: i64,
    /// Title of the book
    pub title: String,
    /// Page count, when known
    pub pages: Option<i32>,
    /// Author who wrote the book
    pub author_id: i64,
}

/// Book with its author embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookWithAuthor {
    #[serde(flatten)]
    pub book: Book,
    pub author: Author,
}

use serde::{Deserialize, Serialize};

use crate::modules::books::models::Book;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Author {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub birth_year: Option<i32>,
}

/// Author with the books they wrote, loaded in a second query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorWithBooks {
    #[serde(flatten)]
    pub author: Author,
    pub books: Vec<Book>,
}

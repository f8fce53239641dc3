use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{Attachment, Store, StoreError};
use crate::modules::{
    authors::models::{Author, AuthorWithBooks},
    books::models::{Book, BookWithAuthor},
    profile::models::{NewUser, User, UserPatch},
};

const AUTHOR_COLUMNS: &str = "id, first_name, last_name, birth_year";
const BOOK_COLUMNS: &str = "id, title, pages, author_id";
const USER_COLUMNS: &str = "id, username, first_name, last_name, password";

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn author(&self, author_id: i64) -> Result<Author, StoreError> {
        sqlx::query_as::<_, Author>(&format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors WHERE id = ?"
        ))
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("Author"))
    }
}

fn username_conflict(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict("username is already taken".to_string())
        }
        _ => StoreError::Database(e),
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn list_authors(&self) -> Result<Vec<Author>, StoreError> {
        let authors =
            sqlx::query_as::<_, Author>(&format!("SELECT {AUTHOR_COLUMNS} FROM authors ORDER BY id"))
                .fetch_all(&self.pool)
                .await?;
        Ok(authors)
    }

    async fn author_with_books(&self, author_id: i64) -> Result<AuthorWithBooks, StoreError> {
        let author = self.author(author_id).await?;
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE author_id = ? ORDER BY id"
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(AuthorWithBooks { author, books })
    }

    async fn list_books(&self) -> Result<Vec<Book>, StoreError> {
        let books = sqlx::query_as::<_, Book>(&format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn book_with_author(&self, book_id: i64) -> Result<BookWithAuthor, StoreError> {
        let book = sqlx::query_as::<_, Book>(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?"))
            .bind(book_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound("Book"))?;
        let author = self.author(book.author_id).await?;

        Ok(BookWithAuthor { book, author })
    }

    async fn user(&self, user_id: i64) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound("User"))
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"))
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, first_name, last_name, password)
             VALUES (?, ?, ?, ?)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&new_user.username)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(username_conflict)
    }

    async fn user_books(&self, user_id: i64) -> Result<Vec<Book>, StoreError> {
        self.user(user_id).await?;

        let books = sqlx::query_as::<_, Book>(
            "SELECT b.id, b.title, b.pages, b.author_id
             FROM books b
             JOIN books_users bu ON bu.book_id = b.id
             WHERE bu.user_id = ?
             ORDER BY b.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    async fn attach_book(&self, user_id: i64, book_id: i64) -> Result<Attachment, StoreError> {
        // Take the write lock up front: a deferred transaction that reads and
        // then writes gets SQLITE_BUSY without waiting on the busy timeout.
        // Dropping `tx` on any early return rolls back.
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let user: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if user.is_none() {
            return Err(StoreError::NotFound("User"));
        }

        let book = sqlx::query_as::<_, Book>(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?"))
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound("Book"))?;

        let inserted = sqlx::query(
            "INSERT INTO books_users (user_id, book_id) VALUES (?, ?)
             ON CONFLICT (user_id, book_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Attachment {
            book,
            created: inserted.rows_affected() == 1,
        })
    }

    async fn update_user(&self, user_id: i64, patch: UserPatch) -> Result<(), StoreError> {
        if patch.is_empty() {
            self.user(user_id).await?;
            return Ok(());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE users SET ");
        {
            let mut set = query.separated(", ");
            if let Some(username) = patch.username {
                set.push("username = ").push_bind_unseparated(username);
            }
            if let Some(first_name) = patch.first_name {
                set.push("first_name = ").push_bind_unseparated(first_name);
            }
            if let Some(last_name) = patch.last_name {
                set.push("last_name = ").push_bind_unseparated(last_name);
            }
            if let Some(password_hash) = patch.password_hash {
                set.push("password = ").push_bind_unseparated(password_hash);
            }
        }
        query.push(" WHERE id = ").push_bind(user_id);

        let result = query
            .build()
            .execute(&self.pool)
            .await
            .map_err(username_conflict)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("User"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_kernel::settings::DatabaseSettings;

    async fn store() -> SqliteStore {
        let pool = shelf_db::connect_in_memory().await.unwrap();
        let migrations = crate::modules::all_migrations();
        shelf_db::run_migrations(&pool, &migrations).await.unwrap();

        sqlx::raw_sql(
            "INSERT INTO authors (id, first_name, last_name, birth_year) VALUES
                (1, 'Ursula', 'Le Guin', 1929),
                (2, 'Octavia', 'Butler', NULL);
             INSERT INTO books (id, title, pages, author_id) VALUES
                (10, 'The Dispossessed', 387, 1),
                (11, 'A Wizard of Earthsea', 183, 1),
                (12, 'Kindred', NULL, 2);",
        )
        .execute(&pool)
        .await
        .unwrap();

        SqliteStore::new(pool)
    }

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            password_hash: "$2b$04$placeholder".to_string(),
        }
    }

    #[tokio::test]
    async fn author_with_books_assembles_relation() {
        let store = store().await;
        let found = store.author_with_books(1).await.unwrap();
        assert_eq!(found.author.last_name, "Le Guin");
        assert_eq!(
            found.books.iter().map(|b| b.id).collect::<Vec<_>>(),
            vec![10, 11]
        );

        assert!(matches!(
            store.author_with_books(99).await,
            Err(StoreError::NotFound("Author"))
        ));
    }

    #[tokio::test]
    async fn book_with_author_and_missing_book() {
        let store = store().await;
        let found = store.book_with_author(12).await.unwrap();
        assert_eq!(found.author.first_name, "Octavia");
        assert_eq!(found.book.pages, None);

        assert!(matches!(
            store.book_with_author(404).await,
            Err(StoreError::NotFound("Book"))
        ));
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let store = store().await;
        store.create_user(new_user("ada")).await.unwrap();
        assert!(matches!(
            store.create_user(new_user("ada")).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn attach_is_idempotent() {
        let store = store().await;
        let user = store.create_user(new_user("ada")).await.unwrap();

        let first = store.attach_book(user.id, 10).await.unwrap();
        let second = store.attach_book(user.id, 10).await.unwrap();
        assert!(first.created);
        assert!(!second.created);
        assert_eq!(second.book.title, "The Dispossessed");

        let books = store.user_books(user.id).await.unwrap();
        assert_eq!(books.len(), 1);
    }

    #[tokio::test]
    async fn attach_unknown_book_leaves_no_row() {
        let store = store().await;
        let user = store.create_user(new_user("ada")).await.unwrap();

        assert!(matches!(
            store.attach_book(user.id, 999).await,
            Err(StoreError::NotFound("Book"))
        ));
        assert!(matches!(
            store.attach_book(user.id + 1, 10).await,
            Err(StoreError::NotFound("User"))
        ));

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books_users")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn partial_update_touches_only_given_columns() {
        let store = store().await;
        let user = store.create_user(new_user("ada")).await.unwrap();

        store
            .update_user(
                user.id,
                UserPatch {
                    first_name: Some("Augusta".to_string()),
                    ..UserPatch::default()
                },
            )
            .await
            .unwrap();

        let updated = store.user(user.id).await.unwrap();
        assert_eq!(updated.first_name, "Augusta");
        assert_eq!(updated.last_name, "Lovelace");
        assert_eq!(updated.password, user.password);
    }

    #[tokio::test]
    async fn update_missing_user_and_taken_username() {
        let store = store().await;
        let ada = store.create_user(new_user("ada")).await.unwrap();
        store.create_user(new_user("grace")).await.unwrap();

        assert!(matches!(
            store.update_user(999, UserPatch::default()).await,
            Err(StoreError::NotFound("User"))
        ));

        let rename = UserPatch {
            username: Some("grace".to_string()),
            ..UserPatch::default()
        };
        assert!(matches!(
            store.update_user(ada.id, rename).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_attaches_on_a_file_database_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let settings = DatabaseSettings {
            url: format!("sqlite://{}", dir.path().join("shelf.db").display()),
            max_connections: 5,
        };
        let pool = shelf_db::connect(&settings).await.unwrap();
        shelf_db::run_migrations(&pool, &crate::modules::all_migrations())
            .await
            .unwrap();
        sqlx::raw_sql(
            "INSERT INTO authors (id, first_name, last_name) VALUES (1, 'Ursula', 'Le Guin');
             INSERT INTO books (id, title, author_id) VALUES (1, 'The Dispossessed', 1);",
        )
        .execute(&pool)
        .await
        .unwrap();

        let store = SqliteStore::new(pool);
        let mut user_ids = Vec::new();
        for n in 0..40 {
            let user = store.create_user(new_user(&format!("reader{n}"))).await.unwrap();
            user_ids.push(user.id);
        }

        let tasks: Vec<_> = user_ids
            .into_iter()
            .map(|user_id| {
                let store = store.clone();
                tokio::spawn(async move { store.attach_book(user_id, 1).await })
            })
            .collect();

        for task in tasks {
            let attachment = task.await.unwrap().unwrap();
            assert!(attachment.created);
        }

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books_users")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(rows, 40);
    }

    #[tokio::test]
    async fn user_books_for_missing_user() {
        let store = store().await;
        assert!(matches!(
            store.user_books(5).await,
            Err(StoreError::NotFound("User"))
        ));
    }
}

pub mod models;

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use shelf_http::{AppError, Success};
use shelf_kernel::{InitCtx, Migration, Module};

use crate::{app::AppState, utils::parse_id};

pub const MIGRATIONS: &[Migration] = &[Migration::new(
    "001_init",
    r#"
        CREATE TABLE books (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            title     TEXT NOT NULL,
            pages     INTEGER,
            author_id INTEGER NOT NULL REFERENCES authors (id)
        );
        CREATE INDEX books_author_id_idx ON books (author_id);
    "#,
)];

/// Books module: read-only listing and lookup.
pub struct BooksModule {
    state: AppState,
}

impl BooksModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(list_books))
            .route("/{book_id}", get(get_book))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<Value> {
        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "All books",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Book" }
                                        }
                                    }
                                }
                            },
                            "500": { "description": "Internal server error" }
                        }
                    }
                },
                "/{book_id}": {
                    "get": {
                        "summary": "Get a book with its author",
                        "tags": ["Books"],
                        "parameters": [{
                            "name": "book_id",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "integer" }
                        }],
                        "responses": {
                            "200": { "description": "Book with author" },
                            "404": { "description": "Book not found" }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": {
                                "type": "integer",
                                "description": "Unique identifier for the book"
                            },
                            "title": {
                                "type": "string",
                                "description": "Title of the book"
                            },
                            "pages": {
                                "type": "integer",
                                "nullable": true,
                                "description": "Page count, when known"
                            },
                            "author_id": {
                                "type": "integer",
                                "description": "Author who wrote the book"
                            }
                        },
                        "required": ["id", "title", "author_id"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        MIGRATIONS.to_vec()
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// List books endpoint
async fn list_books(State(state): State<AppState>) -> Result<Success<Value>, AppError> {
    let books = state.store.list_books().await?;
    Ok(Success::ok(json!({ "books": books })))
}

/// Single book with its author eagerly loaded
async fn get_book(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
) -> Result<Success<Value>, AppError> {
    let book_id = parse_id(&book_id, "Book")?;
    let book = state.store.book_with_author(book_id).await?;
    Ok(Success::ok(json!({ "book": book })))
}

/// Create a new instance of the books module
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new(state))
}

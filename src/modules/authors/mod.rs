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
        CREATE TABLE authors (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name  TEXT NOT NULL,
            birth_year INTEGER
        );
    "#,
)];

/// Read-only catalogue of authors.
pub struct AuthorsModule {
    state: AppState,
}

impl AuthorsModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for AuthorsModule {
    fn name(&self) -> &'static str {
        "authors"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "authors module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(list_authors))
            .route("/{author_id}", get(get_author))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<Value> {
        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List authors",
                        "tags": ["Authors"],
                        "responses": {
                            "200": { "description": "All authors" },
                            "500": { "description": "Internal server error" }
                        }
                    }
                },
                "/{author_id}": {
                    "get": {
                        "summary": "Get an author with their books",
                        "tags": ["Authors"],
                        "parameters": [{
                            "name": "author_id",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "integer" }
                        }],
                        "responses": {
                            "200": { "description": "Author with books" },
                            "404": { "description": "Author not found" }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Author": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer" },
                            "first_name": { "type": "string" },
                            "last_name": { "type": "string" },
                            "birth_year": { "type": "integer", "nullable": true }
                        },
                        "required": ["id", "first_name", "last_name"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        MIGRATIONS.to_vec()
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "authors module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "authors module stopped");
        Ok(())
    }
}

async fn list_authors(State(state): State<AppState>) -> Result<Success<Value>, AppError> {
    let authors = state.store.list_authors().await?;
    Ok(Success::ok(json!({ "authors": authors })))
}

async fn get_author(
    State(state): State<AppState>,
    Path(author_id): Path<String>,
) -> Result<Success<Value>, AppError> {
    let author_id = parse_id(&author_id, "Author")?;
    let author = state.store.author_with_books(author_id).await?;
    Ok(Success::ok(json!({ "author": author })))
}

pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(AuthorsModule::new(state))
}

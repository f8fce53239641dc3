pub mod handlers;
pub mod models;

use async_trait::async_trait;
use axum::{
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use shelf_auth::require_bearer;
use shelf_kernel::{InitCtx, Migration, Module};

use crate::app::AppState;

pub const MIGRATIONS: &[Migration] = &[Migration::new(
    "001_books_users",
    r#"
        CREATE TABLE books_users (
            user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
            book_id INTEGER NOT NULL REFERENCES books (id) ON DELETE CASCADE,
            PRIMARY KEY (user_id, book_id)
        );
        CREATE INDEX books_users_book_id_idx ON books_users (book_id);
    "#,
)];

/// The caller's own account and reading list. Every route requires a bearer
/// token; the user id comes from its claims.
pub struct ProfileModule {
    state: AppState,
}

impl ProfileModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for ProfileModule {
    fn name(&self) -> &'static str {
        "profile"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "profile module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(handlers::get_profile).put(handlers::update_profile))
            .route(
                "/books",
                get(handlers::get_books).post(handlers::add_book),
            )
            .route_layer(from_fn_with_state(
                self.state.tokens.clone(),
                require_bearer,
            ))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<Value> {
        let unauthorized = json!({ "description": "Missing or invalid bearer token" });
        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "Current user's profile",
                        "tags": ["Profile"],
                        "security": [{ "bearer": [] }],
                        "responses": {
                            "200": { "description": "username, first_name, last_name" },
                            "401": unauthorized,
                            "404": { "description": "User not found" }
                        }
                    },
                    "put": {
                        "summary": "Update profile fields",
                        "tags": ["Profile"],
                        "security": [{ "bearer": [] }],
                        "responses": {
                            "204": { "description": "Updated" },
                            "401": unauthorized,
                            "404": { "description": "User not found" },
                            "409": { "description": "Username already taken" },
                            "422": { "description": "Validation error" }
                        }
                    }
                },
                "/books": {
                    "get": {
                        "summary": "Books on the user's list",
                        "tags": ["Profile"],
                        "security": [{ "bearer": [] }],
                        "responses": {
                            "200": { "description": "Books" },
                            "401": unauthorized,
                            "404": { "description": "User not found" }
                        }
                    },
                    "post": {
                        "summary": "Add a book to the user's list",
                        "tags": ["Profile"],
                        "security": [{ "bearer": [] }],
                        "responses": {
                            "200": { "description": "Book was already on the list" },
                            "201": { "description": "Book added" },
                            "401": unauthorized,
                            "404": { "description": "User or book not found" },
                            "422": { "description": "Validation error" }
                        }
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        MIGRATIONS.to_vec()
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "profile module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "profile module stopped");
        Ok(())
    }
}

pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(ProfileModule::new(state))
}

//! Account registration and token issuance.
//!
//! `POST /auth/register` stores a bcrypt hash, never the plaintext.
//! `POST /auth/login` exchanges valid credentials for a bearer token whose
//! claims carry the user id consumed by the profile routes.

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use shelf_http::{validate::BodyRules, AppError, Success};
use shelf_kernel::{InitCtx, Migration, Module};

use crate::{
    app::AppState,
    modules::profile::models::{NewUser, RegisteredUser, NAME_LEN, PASSWORD_LEN, USERNAME_LEN},
};

pub const MIGRATIONS: &[Migration] = &[Migration::new(
    "001_users",
    r#"
        CREATE TABLE users (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            username   TEXT NOT NULL UNIQUE,
            first_name TEXT NOT NULL,
            last_name  TEXT NOT NULL,
            password   TEXT NOT NULL
        );
    "#,
)];

const INVALID_CREDENTIALS: &str = "invalid credentials";

pub struct AuthModule {
    state: AppState,
}

impl AuthModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for AuthModule {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            bcrypt_cost = self.state.passwords.cost(),
            token_ttl_hours = ctx.settings.auth.token_ttl_hours,
            "auth module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/register", post(register))
            .route("/login", post(login))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<Value> {
        Some(json!({
            "paths": {
                "/register": {
                    "post": {
                        "summary": "Create an account",
                        "tags": ["Auth"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Registration" }
                                }
                            }
                        },
                        "responses": {
                            "201": { "description": "Account created" },
                            "409": { "description": "Username already taken" },
                            "422": { "description": "Validation error" }
                        }
                    }
                },
                "/login": {
                    "post": {
                        "summary": "Exchange credentials for a bearer token",
                        "tags": ["Auth"],
                        "responses": {
                            "200": { "description": "Token issued" },
                            "401": { "description": "Invalid credentials" },
                            "422": { "description": "Validation error" }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Registration": {
                        "type": "object",
                        "properties": {
                            "username": { "type": "string", "minLength": 3, "maxLength": 64 },
                            "password": { "type": "string", "minLength": 6, "maxLength": 72 },
                            "first_name": { "type": "string" },
                            "last_name": { "type": "string" }
                        },
                        "required": ["username", "password", "first_name", "last_name"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        MIGRATIONS.to_vec()
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "auth module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "auth module stopped");
        Ok(())
    }
}

async fn register(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Success<Value>, AppError> {
    let Json(body) = body?;

    let mut rules = BodyRules::new(&body);
    let username = rules.required_text("username", USERNAME_LEN);
    let password = rules.required_secret("password", PASSWORD_LEN);
    let first_name = rules.required_text("first_name", NAME_LEN);
    let last_name = rules.required_text("last_name", NAME_LEN);
    rules.finish()?;

    let (Some(username), Some(password), Some(first_name), Some(last_name)) =
        (username, password, first_name, last_name)
    else {
        return Err(AppError::bad_request("request body is incomplete"));
    };

    let password_hash = state.passwords.hash(password).await?;
    let user = state
        .store
        .create_user(NewUser {
            username,
            first_name,
            last_name,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = user.id, username = %user.username, "user registered");
    Ok(Success::created(
        json!({ "user": RegisteredUser::from(user) }),
    ))
}

async fn login(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Success<Value>, AppError> {
    let Json(body) = body?;

    let mut rules = BodyRules::new(&body);
    let username = rules.required_text("username", 1..=*USERNAME_LEN.end());
    let password = rules.required_secret("password", 1..=*PASSWORD_LEN.end());
    rules.finish()?;

    let (Some(username), Some(password)) = (username, password) else {
        return Err(AppError::bad_request("request body is incomplete"));
    };

    let Some(user) = state.store.user_by_username(&username).await? else {
        // Same bcrypt work as a wrong password, so timing does not reveal
        // which usernames exist.
        state.passwords.verify_missing(password).await?;
        tracing::warn!(username = %username, "login for unknown user");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    };

    if !state.passwords.verify(password, user.password.clone()).await? {
        tracing::warn!(user_id = user.id, "login with wrong password");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    }

    let token = state.tokens.issue(user.id, &user.username)?;
    Ok(Success::ok(json!({ "token": token })))
}

pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(AuthModule::new(state))
}

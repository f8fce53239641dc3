use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use shelf_auth::AuthUser;
use shelf_http::{validate::BodyRules, AppError, Success};

use super::models::{ProfileView, UserPatch, NAME_LEN, PASSWORD_LEN, USERNAME_LEN};
use crate::app::AppState;

pub async fn get_profile(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Success<Value>, AppError> {
    let user = state.store.user(caller.id).await?;
    Ok(Success::ok(json!({ "user": ProfileView::from(user) })))
}

pub async fn get_books(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Success<Value>, AppError> {
    let books = state.store.user_books(caller.id).await?;
    Ok(Success::ok(json!({ "books": books })))
}

/// 201 when the book is newly attached, 200 when it already was.
pub async fn add_book(
    State(state): State<AppState>,
    caller: AuthUser,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Success<Value>, AppError> {
    let Json(body) = body?;

    let mut rules = BodyRules::new(&body);
    let book_id = rules.required_id("book_id");
    rules.finish()?;
    let Some(book_id) = book_id else {
        return Err(AppError::bad_request("book_id is required"));
    };

    let attachment = state.store.attach_book(caller.id, book_id).await?;
    let status = if attachment.created {
        tracing::info!(user_id = caller.id, book_id, "book added to profile");
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok(Success::with_status(
        status,
        json!({ "book": attachment.book }),
    ))
}

pub async fn update_profile(
    State(state): State<AppState>,
    caller: AuthUser,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(body) = body?;

    // 404 takes precedence over validation failures.
    state.store.user(caller.id).await?;

    let mut rules = BodyRules::new(&body);
    let username = rules.optional_text("username", USERNAME_LEN);
    let first_name = rules.optional_text("first_name", NAME_LEN);
    let last_name = rules.optional_text("last_name", NAME_LEN);
    let password = rules.optional_secret("password", PASSWORD_LEN);
    rules.finish()?;

    let password_hash = match password {
        Some(plain) => Some(state.passwords.hash(plain).await?),
        None => None,
    };

    let patch = UserPatch {
        username,
        first_name,
        last_name,
        password_hash,
    };
    let changed = !patch.is_empty();
    state.store.update_user(caller.id, patch).await?;

    if changed {
        tracing::info!(user_id = caller.id, "profile updated");
    }
    Ok(StatusCode::NO_CONTENT)
}

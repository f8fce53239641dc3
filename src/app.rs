//! Application wiring: shared handler state and the server lifecycle.

use std::sync::Arc;

use anyhow::Context;
use shelf_auth::{PasswordHasher, TokenService};
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};
use sqlx::SqlitePool;

use crate::store::{SqliteStore, Store};

/// Immutable dependencies handed to every module.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub passwords: PasswordHasher,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(settings: &Settings, pool: SqlitePool) -> Self {
        Self {
            store: Arc::new(SqliteStore::new(pool)),
            passwords: PasswordHasher::new(settings.auth.bcrypt_cost),
            tokens: Arc::new(TokenService::from_settings(&settings.auth)),
        }
    }
}

/// Build the registry, apply pending migrations, and initialize modules.
pub async fn prepare(settings: &Settings, pool: SqlitePool) -> anyhow::Result<ModuleRegistry> {
    let state = AppState::new(settings, pool.clone());
    let registry = crate::modules::registry(state)?;

    let applied = shelf_db::run_migrations(&pool, &registry.collect_migrations())
        .await
        .context("failed to apply migrations")?;
    tracing::info!(applied, modules = registry.len(), "schema up to date");

    let ctx = InitCtx { settings };
    registry.init_all(&ctx).await?;
    Ok(registry)
}

/// Serve the API until a shutdown signal arrives.
pub async fn run(settings: &Settings) -> anyhow::Result<()> {
    let pool = shelf_db::connect(&settings.database).await?;
    let registry = prepare(settings, pool.clone()).await?;

    let ctx = InitCtx { settings };
    registry.start_all(&ctx).await?;

    let served = shelf_http::start_server(&registry, settings).await;

    registry.stop_all().await?;
    pool.close().await;
    served
}

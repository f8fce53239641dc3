//! The contract every SHELF feature module fulfils.
//!
//! A module owns a slice of the HTTP surface, the tables behind it, and an
//! OpenAPI fragment describing those routes. The registry drives the
//! lifecycle: migrations, `init`, `start`, then `stop` on shutdown.

use async_trait::async_trait;
use axum::Router;

use crate::settings::Settings;

/// Read-only view handed to lifecycle hooks.
pub struct InitCtx<'a> {
    pub settings: &'a Settings,
}

/// One schema step. `id` orders steps within a module and is
/// recorded once applied, so it must never change after release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

impl Migration {
    pub const fn new(id: &'static str, up: &'static str) -> Self {
        Self { id, up }
    }
}

#[async_trait]
pub trait Module: Sync + Send {
    /// Registry key and mount segment: routes live under `{base_path}/{name}`.
    fn name(&self) -> &'static str;

    /// Runs once the schema is current.
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Router with its state applied; paths are relative to the mount point.
    fn routes(&self) -> Router {
        Router::new()
    }

    /// `paths` and `components.schemas` are merged into the served document.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![]
    }

    /// Runs right before the listener starts accepting connections.
    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

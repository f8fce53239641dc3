pub mod auth;
pub mod authors;
pub mod books;
pub mod profile;

use shelf_kernel::{Migration, ModuleRegistry};

use crate::app::AppState;

/// Register all project-specific modules with a fresh registry
pub fn registry(state: AppState) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    registry.register(auth::create_module(state.clone()))?;
    registry.register(authors::create_module(state.clone()))?;
    registry.register(books::create_module(state.clone()))?;
    registry.register(profile::create_module(state))?;
    Ok(registry)
}

/// Every module's migrations in application order, without building modules.
///
/// Module names sort so that referenced tables exist first:
/// `auth` (users), `authors`, `books`, `profile` (books_users).
pub fn all_migrations() -> Vec<(String, Migration)> {
    let owned: [(&str, &[Migration]); 4] = [
        ("auth", auth::MIGRATIONS),
        ("authors", authors::MIGRATIONS),
        ("books", books::MIGRATIONS),
        ("profile", profile::MIGRATIONS),
    ];

    let mut migrations: Vec<(String, Migration)> = owned
        .iter()
        .flat_map(|(module, list)| list.iter().map(|m| (module.to_string(), m.clone())))
        .collect();
    migrations.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.id.cmp(b.1.id)));
    migrations
}

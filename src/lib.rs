//! SHELF application library
//!
//! Authors, books, and reader profiles served over HTTP. The modules under
//! [`modules`] plug into the kernel registry; [`store`] is their only path
//! to the database.

pub mod app;
pub mod modules;
pub mod store;
pub mod utils;

pub use app::AppState;

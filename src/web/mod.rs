//! Web front end: routes, handlers and templates.

mod accounts;
mod comments;
mod extract;
pub mod render;
mod server;
mod tasks;
pub mod templates;

pub use server::{ServerHandle, TrackerServer, build_router, start_server};

pub mod config;
pub mod handlers;
pub mod server;

pub use config::Config;
pub use server::{build_router, start, AppState, ServerHandle};

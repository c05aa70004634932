pub mod models;
mod handlers;
pub mod server;

pub use handlers::AppState;
pub use models::*;

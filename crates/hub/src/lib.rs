pub mod app;
pub mod config;
pub mod error;
pub mod routes;
pub mod serve;
pub mod stream;

pub use app::create_router;
pub use config::{HubConfig, ServerConfig};
pub use error::ApiError;
pub use routes::AppState;
pub use serve::{ServeOutcome, serve_with_grace};

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod server;
pub mod session;
pub mod templates;

pub use config::{AppConfig, LoggingConfig, ServerConfig, SessionConfig};
pub use error::AppError;
pub use observability::init_tracing;
pub use server::{AppState, CleverServer, ServerBuilder, build_app, build_router};
pub use session::SessionHandle;

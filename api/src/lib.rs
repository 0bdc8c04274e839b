pub mod api_error;
pub mod config;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use routes::create_router;
pub use state::AppState;

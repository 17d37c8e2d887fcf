//! Web dashboard
//!
//! - [`server`] - axum server, shared state and configuration
//! - [`routes`] - page and operational handlers
//! - [`session`] - cookie-keyed login sessions
//! - [`render`] - handlebars page rendering

pub mod render;
pub mod routes;
pub mod server;
pub mod session;

pub use render::Renderer;
pub use routes::create_router;
pub use server::{AppState, ServerConfig, ServerConfigBuilder, ServerError, WebServer};
pub use session::SessionStore;

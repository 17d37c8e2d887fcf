pub mod query;
pub mod serve;
pub mod stream;
pub mod train;

// Re-export command functions for convenience
pub use query::query;
pub use serve::{serve, ServeParams};
pub use stream::stream;
pub use train::train;

pub mod config;
pub mod error;
pub mod platform;
pub mod templates;
pub mod types;

pub use config::*;
pub use error::*;
pub use platform::*;
pub use types::*;

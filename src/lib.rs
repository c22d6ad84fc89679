pub mod config;
pub mod error;
pub mod gate;
pub mod import;
pub mod search;

pub use error::{LogError, Result};

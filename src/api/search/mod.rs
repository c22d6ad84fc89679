mod query;
mod types;

pub use query::search;
pub use types::*;

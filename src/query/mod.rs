//! Request parameters to store query translation.

mod builder;
pub mod params;
pub use builder::*;
pub use params::{QueryParams, SortOrder};

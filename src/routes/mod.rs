mod adapter;
mod common;

pub use adapter::{adapter_routes, adapter_routes_with_limit, DEFAULT_BODY_LIMIT};
pub use common::common_routes_with_state;

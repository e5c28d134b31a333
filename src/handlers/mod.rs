pub mod docs;
pub mod resource;

pub use resource::{parse_body, ResourceHandler};

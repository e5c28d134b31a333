//! CRUD and retrieval services over the record store.

mod crud;
mod retrieval;
mod validation;
pub use crud::{group_sections, CrudService, ParentAssociation};
pub use retrieval::{ExposedRecord, RetrievalService};
pub use validation::RequestValidator;

//! Durable stores over the shared SQLite pool

pub mod catalog;
pub mod flags;

pub use catalog::CatalogStore;
pub use flags::AnnotationStore;

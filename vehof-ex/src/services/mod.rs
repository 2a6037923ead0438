//! Explorer services

pub mod archive_loader;
pub mod archive_source;
pub mod flag_cache;

pub use archive_loader::{ArchiveLoader, LoadReport, ParsedTable};
pub use archive_source::ArchiveSource;
pub use flag_cache::{FlagCache, FlagMap, ListCounts};

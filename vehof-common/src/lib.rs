//! # VEHOF Common Library
//!
//! Shared code for the Video Essay Hall of Fame explorer including:
//! - Catalog and flag data model
//! - Row normalization (identity, duration, topics, loose numbers)
//! - Database initialization
//! - Configuration loading and root folder resolution
//! - Thumbnail addressing and display formatting

pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod normalize;
pub mod thumbnails;
pub mod time;

pub use db::models::{Entity, Flag, FlagKind, RawRecord};
pub use error::{Error, Result};
pub use normalize::normalize;

//! # TXDB Common Library
//!
//! Shared code for the TXDB crates:
//! - Error type (`Error`, `Result`)
//! - Configuration loading (table anchors, sentinel values)
//! - Source table naming
//! - Freshness timestamps
//! - Fetcher and artifact-cache collaborator interfaces

pub mod collaborators;
pub mod config;
pub mod error;
pub mod table;
pub mod time;

pub use error::{Error, Result};
pub use table::TableName;

//! txdb-catalog library interface
//!
//! Builds a chart catalog out of the upstream literal script tables and
//! answers noisy lookups against it.

pub mod assemble;
pub mod bitfield;
pub mod catalog;
pub mod export;
pub mod extract;
pub mod materialize;
pub mod normalize;
pub mod pipeline;
pub mod records;
pub mod rules;
pub mod sorting;
pub mod types;

pub use crate::assemble::{CatalogScope, SkippedKey};
pub use crate::catalog::{Catalog, Query, Resolution, UnresolvedReason};
pub use crate::pipeline::{build_catalog, refresh_catalog, RawTables, Refreshed};
pub use crate::types::{Alphanumeric, BpmRange, ChartMetadata, Difficulty, UnifiedItem};

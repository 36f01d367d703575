//! # ichor-curate Common Library
//!
//! Shared code for the curation tooling:
//! - Solution naming conventions and on-disk metadata lookup
//! - Sample enumeration and candidate listing
//! - Curation state store and its summary-file persistence
//! - Artifact export
//! - Project registry
//! - Configuration loading and the authentication predicate

pub mod auth;
pub mod config;
pub mod curation;
pub mod error;
pub mod export;
pub mod fs_util;
pub mod naming;
pub mod registry;
pub mod resolver;
pub mod samples;
pub mod summary;
pub mod time;

pub use curation::{CurationKey, CurationRecord, CurationStore};
pub use error::{Error, Result};
pub use naming::SolutionToken;
pub use registry::{DeleteMode, ProjectEntry, ProjectRegistry, ProjectUpdate};
pub use summary::{SummaryFormat, SummaryLine};

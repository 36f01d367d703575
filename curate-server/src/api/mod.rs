//! HTTP API handlers for curate-server

pub mod auth;
pub mod curation;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod health;
pub mod projects;

pub use auth::{auth_middleware, login, logout};
pub use curation::{clear_curation, get_candidates, get_sample_file, set_curation};
pub use dashboard::{export_summary, get_dashboard};
pub use error::ApiError;
pub use export::{export_project, export_sample};
pub use health::health_routes;
pub use projects::{create_project, delete_project, list_projects, update_project};

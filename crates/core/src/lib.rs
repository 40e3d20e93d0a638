//! Shared domain model and configuration for the ribbon export pipeline.

pub mod config;
pub mod domain;
pub mod error;

pub use config::OrgConfig;
pub use domain::*;
pub use error::{CoreError, Result};

//! Dataverse Web API client for solution export and ribbon retrieval.

pub mod auth;
pub mod client;
pub mod error;
pub mod traits;
pub mod types;

pub use auth::{Authenticator, ClientCredentials, ClientCredentialsAuthenticator, StaticTokenAuthenticator};
pub use client::DataverseClient;
pub use error::{DataverseError, Result};
pub use traits::SolutionApi;

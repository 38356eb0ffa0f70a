//! A thin, typed request/response channel to a store's GraphQL Admin API.

mod client;
pub mod config;
pub mod error;

pub use client::{AdminApi, AdminClient, GraphqlRequest, request};
pub use config::AdminApiConfig;
pub use error::ClientError;
pub use secrecy::SecretString;

//! Estate Portal API client
//!
//! Typed access to the portal's leads, support requests and landing-page
//! stats, with de-duplicated, observable queries.

pub mod api;
pub mod models;
pub mod query;

pub use api::{Api, ApiClient, ApiError, ClientConfig, CredentialStore, RetryPolicy};
pub use query::{QueryHandle, QueryState, QueryStatus, Subscription};

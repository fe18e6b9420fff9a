//! JIRA REST API client and types.
//!
//! Layers, from the wire up:
//! - [`HttpTransport`]: sends one HTTP request ([`ReqwestTransport`] by default)
//! - [`RawClient`]: builds URLs, decodes JSON and maps JIRA errors
//! - [`Client`]: shared handle exposing one section per resource type

mod auth;
pub(crate) mod client;
pub mod error;
pub mod raw;
pub mod sections;
pub mod transport;
pub mod types;

pub use auth::{delete_token, get_token, store_token, Auth};
pub use client::Client;
pub use error::{ApiError, Result};
pub use raw::{RawClient, DEFAULT_API_PREFIX, DEFAULT_JIRA_URL};
pub use transport::{
    FilePart, HttpTransport, Payload, ReqwestTransport, RequestMethod, TransportRequest,
    TransportResponse, DEFAULT_TIMEOUT_SECS,
};

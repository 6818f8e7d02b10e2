//! cf-files: Cloud Files backend for the viewer
//!
//! [`Authenticator`] owns the identity session and the service catalog,
//! [`FilesClient`] lists and downloads through it, and [`ReqwestTransport`]
//! is the production [`cf_core::HttpTransport`].

pub mod auth;
pub mod checksum;
pub mod client;
pub mod transport;

pub use auth::{Authenticator, TOKENS_PATH};
pub use checksum::{ChecksumDigests, Checksums};
pub use client::{FilesClient, STORAGE_CONTENT_TYPE};
pub use transport::ReqwestTransport;

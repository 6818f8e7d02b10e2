//! cf-core: Core library for the Cloud Files viewer
//!
//! This crate provides the SDK-independent pieces of the viewer:
//! - Error taxonomy
//! - Request descriptors
//! - Identity session and service catalog model
//! - Marker-based listing model and object records
//! - Transport, clock and progress seams
//! - Retry policy and configuration loading
//!
//! Nothing here performs network I/O; the concrete HTTP client lives in
//! `cf-files`.

pub mod config;
pub mod error;
pub mod identity;
pub mod listing;
pub mod object;
pub mod progress;
pub mod request;
pub mod retry;
pub mod traits;

pub use config::{ConfigManager, IdentitySettings, Settings, StorageSettings, UserProfile};
pub use error::{Error, Result};
pub use identity::{
    AuthSession, Credentials, EndpointSelection, IdentityResponse, NetworkKind,
    STORAGE_SERVICE_NAME, ServiceCatalogEntry, format_expiration, parse_expiration,
};
pub use listing::{ListOptions, ListingPage, Named};
pub use object::{ContainerRecord, DownloadResult, ObjectRecord};
pub use progress::SegmentPlan;
pub use request::{AUTH_TOKEN_HEADER, Method, RequestDescriptor, Scheme};
pub use retry::{RetryBuilder, RetryConfig, is_retryable_error, retry_with_backoff};
pub use traits::{
    BodyStream, Clock, HttpResponse, HttpTransport, ManualClock, NoProgress, ProgressObserver,
    SystemClock, TlsMode,
};

//! Seams between the client layer and the outside world
//!
//! [`HttpTransport`] sends a [`RequestDescriptor`], [`Clock`] supplies the
//! current UTC time for token expiry checks, and [`ProgressObserver`] is
//! told how a download advances. Production implementations live in the
//! backend and CLI crates; tests substitute their own.

use std::fmt;
use std::pin::Pin;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt, stream};
use jiff::{SignedDuration, Timestamp};

use crate::error::Result;
use crate::progress::SegmentPlan;
use crate::request::RequestDescriptor;

/// Streamed response body
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Certificate handling for a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsMode {
    /// Validate server certificates (the default)
    #[default]
    Verify,
    /// Accept any certificate; only used for an explicitly enabled fallback
    AcceptInvalidCerts,
}

/// Status, length and streamed body of an HTTP response
pub struct HttpResponse {
    pub status: u16,
    pub content_length: Option<u64>,
    body: BodyStream,
}

impl HttpResponse {
    pub fn new(status: u16, content_length: Option<u64>, body: BodyStream) -> Self {
        Self {
            status,
            content_length,
            body,
        }
    }

    /// A response whose whole body is already in memory
    pub fn from_bytes(status: u16, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let len = data.len() as u64;
        Self::from_chunks(status, Some(len), vec![Ok(data)])
    }

    /// A response delivering `chunks` in order, errors included
    pub fn from_chunks(
        status: u16,
        content_length: Option<u64>,
        chunks: Vec<Result<Bytes>>,
    ) -> Self {
        Self::new(status, content_length, Box::pin(stream::iter(chunks)))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn into_body(self) -> BodyStream {
        self.body
    }

    /// Collect the whole body
    pub async fn bytes(self) -> Result<Bytes> {
        let mut body = self.body;
        let mut buf = BytesMut::new();
        while let Some(chunk) = body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }

    /// Collect the body as text, replacing invalid UTF-8
    pub async fn text(self) -> Result<String> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Executes HTTP requests
///
/// Implementations map certificate failures to
/// [`Error::TransportSecurity`](crate::Error::TransportSecurity) and every
/// other transport failure to [`Error::Network`](crate::Error::Network).
/// Non-2xx statuses are returned as responses, not errors.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: &RequestDescriptor, tls: TlsMode) -> Result<HttpResponse>;
}

/// Source of the current UTC time
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: Timestamp) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: SignedDuration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        if let Ok(next) = now.checked_add(by) {
            *now = next;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Receives download progress
pub trait ProgressObserver: Send + Sync {
    /// Called once before the first byte
    fn start(&self, plan: &SegmentPlan);

    /// Called after each processed block with the block's size
    fn advance(&self, bytes: u64);

    /// Called once after the last byte was written
    fn finish(&self);
}

/// Ignores all progress
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn start(&self, _plan: &SegmentPlan) {}
    fn advance(&self, _bytes: u64) {}
    fn finish(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[tokio::test]
    async fn test_response_collects_chunks() {
        let response = HttpResponse::from_chunks(
            200,
            Some(6),
            vec![Ok(Bytes::from_static(b"abc")), Ok(Bytes::from_static(b"def"))],
        );
        assert!(response.is_success());
        assert_eq!(response.text().await.unwrap(), "abcdef");
    }

    #[tokio::test]
    async fn test_response_surfaces_stream_error() {
        let response = HttpResponse::from_chunks(
            200,
            None,
            vec![
                Ok(Bytes::from_static(b"abc")),
                Err(Error::Network("reset".into())),
            ],
        );
        assert!(matches!(response.bytes().await, Err(Error::Network(_))));
    }

    #[test]
    fn test_manual_clock() {
        let start: Timestamp = "2030-01-01T00:00:00Z".parse().unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(SignedDuration::from_hours(1));
        assert_eq!(clock.now().as_second(), start.as_second() + 3600);
    }
}

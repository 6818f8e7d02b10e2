//! reqwest-backed transport
//!
//! Holds a certificate-validating client and, only when the insecure
//! fallback is enabled, a second client that accepts any certificate.

use async_trait::async_trait;
use futures::StreamExt;

use cf_core::{Error, HttpResponse, HttpTransport, Method, RequestDescriptor, Result, TlsMode};

const USER_AGENT: &str = concat!("cloudfiles-viewer/", env!("CARGO_PKG_VERSION"));

pub struct ReqwestTransport {
    secure: reqwest::Client,
    insecure: Option<reqwest::Client>,
}

impl ReqwestTransport {
    /// Build the transport; `allow_insecure` prepares the fallback client
    pub fn new(allow_insecure: bool) -> Result<Self> {
        let secure = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Network(format!("Failed to build HTTP client: {e}")))?;

        let insecure = if allow_insecure {
            Some(
                reqwest::Client::builder()
                    .user_agent(USER_AGENT)
                    .danger_accept_invalid_certs(true)
                    .build()
                    .map_err(|e| Error::Network(format!("Failed to build HTTP client: {e}")))?,
            )
        } else {
            None
        };

        Ok(Self { secure, insecure })
    }

    fn client(&self, tls: TlsMode) -> Result<&reqwest::Client> {
        match tls {
            TlsMode::Verify => Ok(&self.secure),
            TlsMode::AcceptInvalidCerts => self.insecure.as_ref().ok_or_else(|| {
                Error::Config("Certificate validation cannot be disabled: fallback not enabled".into())
            }),
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &RequestDescriptor, tls: TlsMode) -> Result<HttpResponse> {
        let method = match request.method() {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = self.client(tls)?.request(method, request.uri());
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body() {
            builder = builder.body(body.to_string());
        }

        let response = builder.send().await.map_err(map_send_error)?;
        let status = response.status().as_u16();
        let content_length = response.content_length();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| Error::Network(e.to_string())));

        Ok(HttpResponse::new(status, content_length, Box::pin(body)))
    }
}

fn map_send_error(error: reqwest::Error) -> Error {
    if is_certificate_error(&error) {
        Error::TransportSecurity(error.to_string())
    } else {
        Error::Network(error.to_string())
    }
}

/// Walk the causes of `error` looking for a certificate or handshake failure
///
/// The top-level message carries the request URL, so only the underlying
/// causes are inspected.
fn is_certificate_error(error: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(error);
    while let Some(err) = source {
        if mentions_certificate(&err.to_string()) {
            return true;
        }
        source = err.source();
    }
    false
}

fn mentions_certificate(message: &str) -> bool {
    let message = message.to_lowercase();
    ["certificate", "handshake", "fatal alert"]
        .iter()
        .any(|needle| message.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mentions_certificate() {
        assert!(mentions_certificate("invalid peer certificate: UnknownIssuer"));
        assert!(mentions_certificate("received fatal alert: HandshakeFailure"));
        assert!(!mentions_certificate("connection refused"));
        assert!(!mentions_certificate(
            "error sending request for url (http://127.0.0.1:9/v1/acct/ssl-backups/tls.tar)"
        ));
    }

    #[tokio::test]
    async fn test_refused_connection_is_not_a_certificate_error() {
        let error = reqwest::Client::new()
            .get("http://127.0.0.1:9/v1/acct/ssl-backups/tls.tar")
            .send()
            .await
            .unwrap_err();

        assert!(!is_certificate_error(&error));
        assert!(matches!(map_send_error(error), Error::Network(_)));
    }

    #[test]
    fn test_insecure_client_only_when_enabled() {
        let strict = ReqwestTransport::new(false).unwrap();
        assert!(strict.client(TlsMode::Verify).is_ok());
        assert!(matches!(
            strict.client(TlsMode::AcceptInvalidCerts),
            Err(Error::Config(_))
        ));

        let lenient = ReqwestTransport::new(true).unwrap();
        assert!(lenient.client(TlsMode::AcceptInvalidCerts).is_ok());
    }
}

//! Identity service authentication
//!
//! [`Authenticator`] owns the only copy of the [`AuthSession`]. Every
//! storage request asks it for the current token, so an expired session is
//! renewed transparently. The session lock is held for the whole renewal:
//! concurrent callers that find the token expired wait for a single
//! re-authentication instead of issuing their own.

use std::sync::Arc;

use tokio::sync::Mutex;

use cf_core::identity::{service_endpoints, service_regions};
use cf_core::{
    AuthSession, Clock, Credentials, EndpointSelection, Error, HttpTransport, IdentityResponse,
    IdentitySettings, Method, RequestDescriptor, Result, STORAGE_SERVICE_NAME, SystemClock,
    TlsMode, format_expiration, is_retryable_error, parse_expiration, retry_with_backoff,
};

/// Token endpoint on the identity host
pub const TOKENS_PATH: &str = "/v2.0/tokens";

/// How a single token request ended, short of an error
enum TokenOutcome {
    Issued(AuthSession),
    /// Neither success nor a client/server error; no session
    Declined { status: u16 },
}

pub struct Authenticator {
    credentials: Credentials,
    settings: IdentitySettings,
    service_name: String,
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    session: Mutex<Option<AuthSession>>,
}

impl Authenticator {
    pub fn new(
        credentials: Credentials,
        settings: IdentitySettings,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            credentials,
            settings,
            service_name: STORAGE_SERVICE_NAME.to_string(),
            transport,
            clock: Arc::new(SystemClock),
            session: Mutex::new(None),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Catalog name of the storage service used for region lookups
    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = service_name.into();
        self
    }

    pub fn username(&self) -> &str {
        self.credentials.username()
    }

    /// Authenticate against the identity service and cache the session
    ///
    /// Always performs network I/O. "Unavailable" answers (404, 503) are
    /// retried up to `retry_budget` times before failing with
    /// [`Error::AuthServiceUnavailable`]; any other status >= 400 fails with
    /// [`Error::AuthenticationFailed`]. Any remaining non-200 status clears
    /// the session and yields an empty token.
    pub async fn get_token(&self, retry_budget: u32) -> Result<String> {
        let mut session = self.session.lock().await;
        self.authenticate(&mut session, retry_budget).await
    }

    /// Current token, re-authenticating first when expired or absent
    ///
    /// May perform network I/O.
    pub async fn token(&self) -> Result<String> {
        let mut session = self.session.lock().await;

        let expiration = self.expiration_of(&session);
        if self.expired_at(&expiration)? {
            let token = self
                .authenticate(&mut session, self.settings.retry_budget)
                .await?;
            if token.is_empty() {
                return Err(Error::AuthDataUnavailable(
                    "identity service did not issue a token".to_string(),
                ));
            }
            return Ok(token);
        }

        session
            .as_ref()
            .map(|s| s.token().to_string())
            .ok_or_else(|| Error::AuthDataUnavailable("no authenticated session".to_string()))
    }

    /// Whether the cached token has expired (or was never obtained)
    pub async fn is_expired(&self) -> Result<bool> {
        let expiration = self.expiration_time().await;
        self.expired_at(&expiration)
    }

    /// Cached expiration timestamp, or "now" to the second if never authenticated
    pub async fn expiration_time(&self) -> String {
        let session = self.session.lock().await;
        self.expiration_of(&session)
    }

    /// Tenant (account) id of the session, `None` if unavailable
    pub async fn tenant_id(&self) -> Option<String> {
        let session = self.session.lock().await;
        let tenant = session
            .as_ref()
            .and_then(|s| s.tenant_id())
            .map(str::to_string);
        if tenant.is_none() {
            tracing::error!("Unable to retrieve tenant id. Did you authenticate?");
        }
        tenant
    }

    /// Regions of the storage service, in catalog order
    ///
    /// Authenticates first if needed. Returns an empty list when the
    /// catalog has no storage service or no session can be established.
    pub async fn list_regions(&self) -> Vec<String> {
        if let Err(e) = self.token().await {
            tracing::error!(error = %e, "Unable to retrieve regions: not authenticated");
            return Vec::new();
        }

        let session = self.session.lock().await;
        match session.as_ref().and_then(|s| s.service(&self.service_name)) {
            Some(service) => service_regions(service),
            None => {
                tracing::error!(
                    service = %self.service_name,
                    "Unable to retrieve regions: service missing from catalog"
                );
                Vec::new()
            }
        }
    }

    /// Public and internal endpoints of the storage service in `region`
    ///
    /// Same degradation rules as [`Authenticator::list_regions`].
    pub async fn list_endpoints(&self, region: &str) -> Vec<EndpointSelection> {
        if let Err(e) = self.token().await {
            tracing::error!(error = %e, region, "Unable to retrieve endpoints: not authenticated");
            return Vec::new();
        }

        let session = self.session.lock().await;
        match session.as_ref().and_then(|s| s.service(&self.service_name)) {
            Some(service) => service_endpoints(service, region),
            None => {
                tracing::error!(
                    service = %self.service_name,
                    region,
                    "Unable to retrieve endpoints: service missing from catalog"
                );
                Vec::new()
            }
        }
    }

    fn expiration_of(&self, session: &Option<AuthSession>) -> String {
        match session {
            Some(s) => s.expires().to_string(),
            None => format_expiration(self.clock.now()),
        }
    }

    fn expired_at(&self, expiration: &str) -> Result<bool> {
        let expires = parse_expiration(expiration).inspect_err(|_| {
            tracing::error!(expiration, "Unknown token expiration format");
        })?;

        let expired = expires <= self.clock.now();
        if expired {
            tracing::debug!("Auth token is expired");
        } else {
            tracing::debug!("Auth token is still valid");
        }
        Ok(expired)
    }

    async fn authenticate(
        &self,
        session: &mut Option<AuthSession>,
        retry_budget: u32,
    ) -> Result<String> {
        let request = RequestDescriptor::new(self.settings.ssl, &self.settings.host, TOKENS_PATH)
            .with_method(Method::Post)
            .with_body(self.credentials.to_request_body()?);
        let retry = self.settings.retry_config(retry_budget);

        let request = &request;
        let outcome =
            retry_with_backoff(&retry, move || self.request_token(request), is_retryable_error)
                .await;

        match outcome {
            Ok(TokenOutcome::Issued(issued)) => {
                let token = issued.token().to_string();
                tracing::info!(user = self.credentials.username(), "Authenticated");
                *session = Some(issued);
                Ok(token)
            }
            Ok(TokenOutcome::Declined { status }) => {
                tracing::error!(status, "Failed to authenticate");
                *session = None;
                Ok(String::new())
            }
            Err(Error::ServiceUnavailable(status)) => {
                tracing::error!(
                    status,
                    attempts = retry.max_attempts,
                    "Identity service unavailable, giving up"
                );
                Err(Error::AuthServiceUnavailable {
                    attempts: retry.max_attempts,
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn request_token(&self, request: &RequestDescriptor) -> Result<TokenOutcome> {
        tracing::debug!(
            uri = %request.uri(),
            headers = ?request.redacted_headers(),
            "Requesting auth token"
        );

        let response = self.transport.execute(request, TlsMode::Verify).await?;
        match response.status {
            200 => {
                let body = response.bytes().await?;
                let parsed: IdentityResponse = serde_json::from_slice(&body).map_err(|e| {
                    Error::AuthDataUnavailable(format!("malformed identity response: {e}"))
                })?;
                Ok(TokenOutcome::Issued(AuthSession::from_response(parsed)?))
            }
            404 | 503 => {
                tracing::warn!(
                    status = response.status,
                    "Identity service unavailable, trying again"
                );
                Err(Error::ServiceUnavailable(response.status))
            }
            status if status >= 400 => {
                let body = response.text().await.unwrap_or_default();
                tracing::error!(status, body = %body, "Failed to authenticate");
                Err(Error::AuthenticationFailed { status, body })
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                tracing::debug!(status, body = %body, "Unexpected identity response");
                Ok(TokenOutcome::Declined { status })
            }
        }
    }
}

//! Identity service data model
//!
//! Credentials, the authentication session returned by the identity service
//! and the service catalog derived from it.

use std::fmt;

use jiff::tz::TimeZone;
use jiff::{Timestamp, civil};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Catalog name of the object storage service
pub const STORAGE_SERVICE_NAME: &str = "cloudFiles";

/// Username and API key, supplied once at startup
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    api_key: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            api_key: api_key.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// JSON body for `POST /v2.0/tokens`
    pub fn to_request_body(&self) -> Result<String> {
        let body = TokenRequest {
            auth: TokenRequestAuth {
                api_key_credentials: ApiKeyCredentials {
                    username: &self.username,
                    api_key: &self.api_key,
                },
            },
        };
        Ok(serde_json::to_string(&body)?)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    auth: TokenRequestAuth<'a>,
}

#[derive(Serialize)]
struct TokenRequestAuth<'a> {
    #[serde(rename = "RAX-KSKEY:apiKeyCredentials")]
    api_key_credentials: ApiKeyCredentials<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiKeyCredentials<'a> {
    username: &'a str,
    api_key: &'a str,
}

/// Body of a successful token response
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityResponse {
    pub access: Access,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Access {
    pub token: TokenInfo,
    #[serde(rename = "serviceCatalog", default)]
    pub service_catalog: Vec<ServiceCatalogEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenInfo {
    pub id: String,
    pub expires: String,
    #[serde(default)]
    pub tenant: Option<Tenant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tenant {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// One service in the catalog with its per-region endpoints
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceCatalogEntry {
    pub name: String,
    #[serde(rename = "type", default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Endpoint {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(rename = "publicURL", default)]
    pub public_url: Option<String>,
    #[serde(rename = "internalURL", default)]
    pub internal_url: Option<String>,
}

/// A successful authentication
///
/// Replaced wholesale on re-authentication, never patched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    token: String,
    expires: String,
    tenant_id: Option<String>,
    service_catalog: Vec<ServiceCatalogEntry>,
}

impl AuthSession {
    /// Build a session from the identity response; the token must be non-empty
    pub fn from_response(response: IdentityResponse) -> Result<Self> {
        let Access {
            token,
            service_catalog,
        } = response.access;

        if token.id.is_empty() {
            return Err(Error::AuthDataUnavailable(
                "identity response carried an empty token".to_string(),
            ));
        }

        Ok(Self {
            token: token.id,
            expires: token.expires,
            tenant_id: token.tenant.map(|t| t.id),
            service_catalog,
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Raw expiration timestamp as sent by the identity service
    pub fn expires(&self) -> &str {
        &self.expires
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    pub fn service_catalog(&self) -> &[ServiceCatalogEntry] {
        &self.service_catalog
    }

    pub fn service(&self, name: &str) -> Option<&ServiceCatalogEntry> {
        self.service_catalog.iter().find(|s| s.name == name)
    }
}

/// Network through which an endpoint is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkKind {
    Public,
    /// Provider-internal service network ("snet")
    Internal,
}

impl fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkKind::Public => write!(f, "public"),
            NetworkKind::Internal => write!(f, "snet"),
        }
    }
}

/// A region-scoped endpoint picked by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointSelection {
    pub region: String,
    pub network_kind: NetworkKind,
    pub uri: String,
}

/// Region names of every endpoint of `service`, in catalog order
///
/// Duplicates are kept as found.
pub fn service_regions(service: &ServiceCatalogEntry) -> Vec<String> {
    service
        .endpoints
        .iter()
        .filter_map(|e| e.region.clone())
        .collect()
}

/// Public and internal URIs of every endpoint of `service` in `region`
pub fn service_endpoints(service: &ServiceCatalogEntry, region: &str) -> Vec<EndpointSelection> {
    let mut selections = Vec::new();

    for endpoint in &service.endpoints {
        if endpoint.region.as_deref() != Some(region) {
            continue;
        }

        let variants = [
            (NetworkKind::Public, &endpoint.public_url),
            (NetworkKind::Internal, &endpoint.internal_url),
        ];
        for (network_kind, uri) in variants {
            match uri {
                Some(uri) => selections.push(EndpointSelection {
                    region: region.to_string(),
                    network_kind,
                    uri: uri.clone(),
                }),
                None => tracing::warn!(region, %network_kind, "Endpoint has no URI for network"),
            }
        }
    }

    selections
}

/// Parse an identity-service expiration timestamp as UTC
///
/// Accepts `YYYY-MM-DDTHH:MM:SS.ffffffZ` and the fallback form without
/// fractional seconds or zone designator.
pub fn parse_expiration(raw: &str) -> Result<Timestamp> {
    if let Ok(ts) = raw.parse::<Timestamp>() {
        return Ok(ts);
    }

    let datetime: civil::DateTime = raw
        .parse()
        .map_err(|_| Error::ExpirationFormat(raw.to_string()))?;
    datetime
        .to_zoned(TimeZone::UTC)
        .map(|zoned| zoned.timestamp())
        .map_err(|_| Error::ExpirationFormat(raw.to_string()))
}

/// Format a timestamp in the fallback expiration form, truncated to seconds
pub fn format_expiration(ts: Timestamp) -> String {
    ts.to_zoned(TimeZone::UTC)
        .datetime()
        .strftime("%Y-%m-%dT%H:%M:%S")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_response() -> IdentityResponse {
        serde_json::from_str(
            r#"{
                "access": {
                    "token": {
                        "id": "tok-123",
                        "expires": "2030-01-01T00:00:00.000Z",
                        "tenant": {"id": "123456", "name": "123456"}
                    },
                    "serviceCatalog": [
                        {"name": "cloudServers", "type": "compute", "endpoints": [
                            {"region": "DFW", "publicURL": "https://dfw.servers.example.com/v2"}
                        ]},
                        {"name": "cloudFiles", "type": "object-store", "endpoints": [
                            {"region": "DFW", "publicURL": "https://storage101.dfw1.example.com/v1/Mosso_1",
                             "internalURL": "https://snet-storage101.dfw1.example.com/v1/Mosso_1"},
                            {"region": "ORD", "publicURL": "https://storage101.ord1.example.com/v1/Mosso_1",
                             "internalURL": "https://snet-storage101.ord1.example.com/v1/Mosso_1"}
                        ]}
                    ]
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_request_body_shape() {
        let creds = Credentials::new("alice", "k3y");
        let body: serde_json::Value =
            serde_json::from_str(&creds.to_request_body().unwrap()).unwrap();
        assert_eq!(
            body["auth"]["RAX-KSKEY:apiKeyCredentials"]["username"],
            "alice"
        );
        assert_eq!(body["auth"]["RAX-KSKEY:apiKeyCredentials"]["apiKey"], "k3y");
    }

    #[test]
    fn test_credentials_debug_hides_key() {
        let creds = Credentials::new("alice", "k3y");
        let debug = format!("{creds:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("k3y"));
    }

    #[test]
    fn test_session_from_response() {
        let session = AuthSession::from_response(sample_response()).unwrap();
        assert_eq!(session.token(), "tok-123");
        assert_eq!(session.expires(), "2030-01-01T00:00:00.000Z");
        assert_eq!(session.tenant_id(), Some("123456"));
        assert_eq!(session.service_catalog().len(), 2);
    }

    #[test]
    fn test_session_rejects_empty_token() {
        let mut response = sample_response();
        response.access.token.id.clear();
        assert!(matches!(
            AuthSession::from_response(response),
            Err(Error::AuthDataUnavailable(_))
        ));
    }

    #[test]
    fn test_regions_and_endpoints() {
        let session = AuthSession::from_response(sample_response()).unwrap();
        let files = session.service(STORAGE_SERVICE_NAME).unwrap();

        assert_eq!(service_regions(files), vec!["DFW", "ORD"]);

        let endpoints = service_endpoints(files, "ORD");
        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[0].network_kind, NetworkKind::Public);
        assert_eq!(
            endpoints[0].uri,
            "https://storage101.ord1.example.com/v1/Mosso_1"
        );
        assert_eq!(endpoints[1].network_kind, NetworkKind::Internal);
        assert!(endpoints[1].uri.contains("snet-"));

        assert!(service_endpoints(files, "SYD").is_empty());
    }

    #[test]
    fn test_regions_keep_duplicates() {
        let service = ServiceCatalogEntry {
            name: STORAGE_SERVICE_NAME.to_string(),
            service_type: None,
            endpoints: vec![
                Endpoint {
                    region: Some("DFW".into()),
                    public_url: Some("https://a".into()),
                    internal_url: None,
                },
                Endpoint {
                    region: Some("DFW".into()),
                    public_url: Some("https://b".into()),
                    internal_url: Some("https://snet-b".into()),
                },
            ],
        };
        assert_eq!(service_regions(&service), vec!["DFW", "DFW"]);
        // one endpoint lacks an internal URI
        assert_eq!(service_endpoints(&service, "DFW").len(), 3);
    }

    #[test]
    fn test_parse_expiration_formats() {
        let with_fraction = parse_expiration("2013-12-24T14:02:26.550Z").unwrap();
        let six_digits = parse_expiration("2013-12-24T14:02:26.550000Z").unwrap();
        let without = parse_expiration("2013-12-24T14:02:26").unwrap();

        assert_eq!(with_fraction, six_digits);
        assert_eq!(without.as_second(), with_fraction.as_second());
        assert_eq!(without.as_second(), 1_387_893_746);
    }

    #[test]
    fn test_parse_expiration_rejects_garbage() {
        assert!(matches!(
            parse_expiration("next tuesday"),
            Err(Error::ExpirationFormat(_))
        ));
    }

    #[test]
    fn test_format_expiration_roundtrips_to_the_second() {
        let ts: Timestamp = "2030-06-01T12:34:56.789Z".parse().unwrap();
        let formatted = format_expiration(ts);
        assert_eq!(formatted, "2030-06-01T12:34:56");
        assert_eq!(parse_expiration(&formatted).unwrap().as_second(), ts.as_second());
    }
}

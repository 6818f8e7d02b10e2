//! HTTP request descriptor
//!
//! A [`RequestDescriptor`] is a plain value describing one API call: scheme,
//! host, path, headers and body. It performs no I/O. Successive calls against
//! other paths are built with [`RequestDescriptor::reinitialize`], which
//! returns a fresh descriptor instead of mutating the old one.

use std::fmt;

/// Content type attached to every freshly initialized request
pub const DEFAULT_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Header carrying the bearer token
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// URI scheme, derived from an ssl-enabled flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn from_ssl(ssl_enabled: bool) -> Self {
        if ssl_enabled {
            Scheme::Https
        } else {
            Scheme::Http
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP method used by the client layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// Description of a single HTTP call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    method: Method,
    scheme: Scheme,
    host: String,
    path: String,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl RequestDescriptor {
    /// Create a GET request for `host` + `path` with default headers and no body
    ///
    /// `host` may carry a base path (e.g. `storage.example.com/v1/AUTH_x`);
    /// `path` is appended verbatim and usually starts with `/` or `?`.
    pub fn new(ssl_enabled: bool, host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            scheme: Scheme::from_ssl(ssl_enabled),
            host: host.into(),
            path: path.into(),
            headers: default_headers(),
            body: None,
        }
    }

    /// Create a request against a catalog endpoint URI
    ///
    /// Any scheme on `endpoint_uri` is dropped; the scheme always follows
    /// `ssl_enabled`. A trailing `/` on the endpoint is trimmed.
    pub fn for_endpoint(ssl_enabled: bool, endpoint_uri: &str, path: impl Into<String>) -> Self {
        Self::new(ssl_enabled, endpoint_host(endpoint_uri), path)
    }

    /// Build the descriptor for the next call on the same host
    ///
    /// Headers are reset to `Content-Type: application/json`, the body is
    /// emptied, the method goes back to GET and the URI is rebuilt from the
    /// new scheme and path.
    pub fn reinitialize(&self, ssl_enabled: bool, path: impl Into<String>) -> Self {
        Self::new(ssl_enabled, self.host.clone(), path)
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set a header, replacing any existing value with the same name
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.headers.push((name, value)),
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Look up a header value, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Full request URI: `scheme://host` followed by the path
    pub fn uri(&self) -> String {
        format!("{}://{}{}", self.scheme, self.host, self.path)
    }

    /// Headers safe to log: the auth token is masked
    pub fn redacted_headers(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .map(|(name, value)| {
                if name.eq_ignore_ascii_case(AUTH_TOKEN_HEADER) {
                    (name.clone(), "<redacted>".to_string())
                } else {
                    (name.clone(), value.clone())
                }
            })
            .collect()
    }
}

fn default_headers() -> Vec<(String, String)> {
    vec![("Content-Type".to_string(), DEFAULT_CONTENT_TYPE.to_string())]
}

/// Strip the scheme and trailing slash from an endpoint URI
pub fn endpoint_host(endpoint_uri: &str) -> &str {
    let rest = endpoint_uri
        .strip_prefix("https://")
        .or_else(|| endpoint_uri.strip_prefix("http://"))
        .unwrap_or(endpoint_uri);
    rest.trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_follows_ssl_flag() {
        let secure = RequestDescriptor::new(true, "identity.example.com", "/v2.0/tokens");
        assert_eq!(secure.uri(), "https://identity.example.com/v2.0/tokens");

        let plain = RequestDescriptor::new(false, "identity.example.com", "/v2.0/tokens");
        assert_eq!(plain.uri(), "http://identity.example.com/v2.0/tokens");
    }

    #[test]
    fn test_new_request_has_default_headers() {
        let req = RequestDescriptor::new(true, "host", "/");
        assert_eq!(req.headers().len(), 1);
        assert_eq!(req.header("content-type"), Some(DEFAULT_CONTENT_TYPE));
        assert_eq!(req.body(), None);
        assert_eq!(req.method(), Method::Get);
    }

    #[test]
    fn test_reinitialize_resets_headers_and_body() {
        let first = RequestDescriptor::new(true, "storage.example.com/v1/acct", "/a")
            .with_method(Method::Post)
            .with_header(AUTH_TOKEN_HEADER, "secret")
            .with_header("Content-Type", "text/plain; charset=UTF-8")
            .with_body("{}");

        let second = first.reinitialize(false, "/b?format=json");

        assert_eq!(second.uri(), "http://storage.example.com/v1/acct/b?format=json");
        assert_eq!(second.header(AUTH_TOKEN_HEADER), None);
        assert_eq!(second.header("Content-Type"), Some(DEFAULT_CONTENT_TYPE));
        assert_eq!(second.body(), None);
        assert_eq!(second.method(), Method::Get);

        // the original value is untouched
        assert_eq!(first.header(AUTH_TOKEN_HEADER), Some("secret"));
        assert_eq!(first.uri(), "https://storage.example.com/v1/acct/a");
    }

    #[test]
    fn test_with_header_replaces_case_insensitively() {
        let req = RequestDescriptor::new(true, "h", "/").with_header("content-type", "text/plain");
        assert_eq!(req.headers().len(), 1);
        assert_eq!(req.header("Content-Type"), Some("text/plain"));
    }

    #[test]
    fn test_for_endpoint_strips_scheme() {
        let req = RequestDescriptor::for_endpoint(
            true,
            "http://snet-storage.example.com/v1/MossoCloudFS_1/",
            "?format=json",
        );
        assert_eq!(req.host(), "snet-storage.example.com/v1/MossoCloudFS_1");
        assert_eq!(
            req.uri(),
            "https://snet-storage.example.com/v1/MossoCloudFS_1?format=json"
        );
    }

    #[test]
    fn test_redacted_headers_mask_token() {
        let req = RequestDescriptor::new(true, "h", "/").with_header(AUTH_TOKEN_HEADER, "tok");
        let redacted = req.redacted_headers();
        assert!(redacted.iter().any(|(n, v)| n == AUTH_TOKEN_HEADER && v == "<redacted>"));
        assert!(!redacted.iter().any(|(_, v)| v == "tok"));
    }
}

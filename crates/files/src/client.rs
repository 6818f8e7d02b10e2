//! Cloud Files storage client
//!
//! Lists containers and objects one page at a time and downloads objects
//! while computing their MD5 and SHA-1 digests.
//!
//! Listings never fail: errors are logged and an empty page is returned.
//! Downloads fail hard, and never leave a partial file behind.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;

use cf_core::{
    AUTH_TOKEN_HEADER, ContainerRecord, DownloadResult, Error, HttpResponse, HttpTransport,
    ListOptions, ListingPage, ObjectRecord, ProgressObserver, RequestDescriptor, Result,
    SegmentPlan, StorageSettings, TlsMode,
};

use crate::auth::Authenticator;
use crate::checksum::{ChecksumDigests, Checksums};

/// Content type sent with storage requests
pub const STORAGE_CONTENT_TYPE: &str = "text/plain; charset=UTF-8";

pub struct FilesClient {
    ssl_enabled: bool,
    auth: Arc<Authenticator>,
    transport: Arc<dyn HttpTransport>,
    allow_insecure_fallback: bool,
    progress_segments: u64,
    block_size: usize,
}

impl FilesClient {
    pub fn new(
        ssl_enabled: bool,
        auth: Arc<Authenticator>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let defaults = StorageSettings::default();
        Self {
            ssl_enabled,
            auth,
            transport,
            allow_insecure_fallback: false,
            progress_segments: defaults.progress_segments,
            block_size: defaults.block_size,
        }
    }

    pub fn from_settings(
        settings: &StorageSettings,
        auth: Arc<Authenticator>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self::new(settings.ssl, auth, transport)
            .with_insecure_fallback(settings.allow_insecure_fallback)
            .with_progress_layout(settings.progress_segments, settings.block_size)
    }

    /// Retry a download once without certificate validation after a TLS error
    pub fn with_insecure_fallback(mut self, allow: bool) -> Self {
        self.allow_insecure_fallback = allow;
        self
    }

    pub fn with_progress_layout(mut self, segments: u64, block_size: usize) -> Self {
        self.progress_segments = segments;
        self.block_size = block_size;
        self
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.auth
    }

    /// One page of the account's containers
    pub async fn list_containers(
        &self,
        endpoint_uri: &str,
        options: &ListOptions,
    ) -> ListingPage<ContainerRecord> {
        let path = options.query_string();
        self.list_page(endpoint_uri, path, options.limit, "containers")
            .await
    }

    /// One page of the objects in `container`
    pub async fn list_objects(
        &self,
        endpoint_uri: &str,
        container: &str,
        options: &ListOptions,
    ) -> ListingPage<ObjectRecord> {
        let path = format!(
            "/{}{}",
            urlencoding::encode(container),
            options.query_string()
        );
        self.list_page(endpoint_uri, path, options.limit, "objects")
            .await
    }

    /// Download `object` from `container` into `local_path`
    ///
    /// On success the object's `md5_hex` and `sha1_hex` are filled in. On
    /// any failure after the file was created, the file is removed.
    pub async fn download_object(
        &self,
        endpoint_uri: &str,
        container: &str,
        object: &mut ObjectRecord,
        local_path: &Path,
        progress: &dyn ProgressObserver,
    ) -> Result<DownloadResult> {
        let name = object
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::InvalidObjectMetadata("object record has no name".to_string()))?;

        let path = format!(
            "/{}/{}",
            urlencoding::encode(container),
            encode_object_name(&name)
        );
        let request = self.authorized_request(endpoint_uri, path).await?;
        let response = self.open_download(&request).await?;

        match response.status {
            404 => return Err(Error::ObjectNotFound(format!("{container}/{name}"))),
            status if status >= 300 => return Err(Error::DownloadInitiation { status }),
            _ => {}
        }

        let plan = SegmentPlan::new(
            response.content_length,
            self.progress_segments,
            self.block_size,
        );
        let (digests, bytes_written) =
            write_checksummed(response, local_path, &plan, progress).await?;

        tracing::info!(
            object = %name,
            bytes = bytes_written,
            md5 = %digests.md5_hex,
            sha1 = %digests.sha1_hex,
            path = %local_path.display(),
            "Download complete"
        );

        object.md5_hex = Some(digests.md5_hex.clone());
        object.sha1_hex = Some(digests.sha1_hex.clone());

        Ok(DownloadResult {
            object_name: name,
            md5_hex: digests.md5_hex,
            sha1_hex: digests.sha1_hex,
            local_path: local_path.to_path_buf(),
            bytes_written,
            success: true,
        })
    }

    async fn authorized_request(
        &self,
        endpoint_uri: &str,
        path: String,
    ) -> Result<RequestDescriptor> {
        let token = self.auth.token().await?;
        Ok(
            RequestDescriptor::for_endpoint(self.ssl_enabled, endpoint_uri, path)
                .with_header(AUTH_TOKEN_HEADER, token)
                .with_header("Content-Type", STORAGE_CONTENT_TYPE),
        )
    }

    async fn list_page<T: DeserializeOwned>(
        &self,
        endpoint_uri: &str,
        path: String,
        limit: Option<u32>,
        kind: &str,
    ) -> ListingPage<T> {
        match self.fetch_listing(endpoint_uri, path).await {
            Ok(items) => ListingPage::new(items, limit),
            Err(e) => {
                tracing::error!(kind, error = %e, "Error retrieving list");
                ListingPage::empty(limit)
            }
        }
    }

    async fn fetch_listing<T: DeserializeOwned>(
        &self,
        endpoint_uri: &str,
        path: String,
    ) -> Result<Vec<T>> {
        let request = self.authorized_request(endpoint_uri, path).await?;
        tracing::debug!(
            uri = %request.uri(),
            headers = ?request.redacted_headers(),
            "Listing"
        );

        let response = self.transport.execute(&request, TlsMode::Verify).await?;
        match response.status {
            200 => {
                let body = response.bytes().await?;
                Ok(serde_json::from_slice(&body)?)
            }
            204 => {
                tracing::debug!(uri = %request.uri(), "Nothing left to retrieve");
                Ok(Vec::new())
            }
            status => {
                let text = response.text().await.unwrap_or_default();
                Err(Error::Network(format!("code={status}, text=\"{text}\"")))
            }
        }
    }

    async fn open_download(&self, request: &RequestDescriptor) -> Result<HttpResponse> {
        tracing::debug!(
            uri = %request.uri(),
            headers = ?request.redacted_headers(),
            "Downloading"
        );

        match self.transport.execute(request, TlsMode::Verify).await {
            Err(Error::TransportSecurity(reason)) if self.allow_insecure_fallback => {
                tracing::warn!(
                    uri = %request.uri(),
                    reason = %reason,
                    "Certificate validation failed, retrying without certificate validation"
                );
                self.transport
                    .execute(request, TlsMode::AcceptInvalidCerts)
                    .await
            }
            other => other,
        }
    }
}

/// Percent-encode each `/`-separated segment of an object name
fn encode_object_name(name: &str) -> String {
    name.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Removes the destination file on drop unless committed
struct PartialFile {
    path: PathBuf,
    committed: bool,
}

impl PartialFile {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            committed: false,
        }
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed partial download"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove partial download"
            ),
        }
    }
}

async fn write_checksummed(
    response: HttpResponse,
    local_path: &Path,
    plan: &SegmentPlan,
    progress: &dyn ProgressObserver,
) -> Result<(ChecksumDigests, u64)> {
    if let Some(parent) = local_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    // declared before the file so the handle is closed before removal
    let guard = PartialFile::new(local_path);
    let mut file = tokio::fs::File::create(local_path).await?;

    let mut checksums = Checksums::new();
    let mut written = 0u64;
    let mut body = response.into_body();

    progress.start(plan);
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        for block in plan.blocks(&chunk) {
            checksums.update(block);
            file.write_all(block).await?;
            written += block.len() as u64;
            progress.advance(block.len() as u64);
        }
    }
    file.flush().await?;
    drop(file);

    if let Some(expected) = plan.total_bytes
        && expected != written
    {
        return Err(Error::IncompleteDownload {
            expected,
            actual: written,
        });
    }

    progress.finish();
    guard.commit();
    Ok((checksums.finalize(), written))
}

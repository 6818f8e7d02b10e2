//! Interactive browser
//!
//! Walks the user from data center to network, container and object, one
//! numbered menu at a time. Every menu ends with an entry that returns to
//! the previous one; the data center menu's entry quits.

mod menu;

use std::io::{self, BufRead, Write};
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use cf_core::{
    ContainerRecord, DownloadResult, EndpointSelection, ListOptions, ListingPage, ObjectRecord,
    ProgressObserver, Result,
};
use cf_files::FilesClient;

use crate::output::{DownloadProgress, Formatter};

use menu::{Choice, Menu};
pub use menu::Prompt;

/// What the browser needs from the storage service
#[async_trait]
pub trait Storage: Send + Sync {
    async fn regions(&self) -> Vec<String>;

    async fn endpoints(&self, region: &str) -> Vec<EndpointSelection>;

    async fn containers(&self, uri: &str, options: &ListOptions) -> ListingPage<ContainerRecord>;

    async fn objects(
        &self,
        uri: &str,
        container: &str,
        options: &ListOptions,
    ) -> ListingPage<ObjectRecord>;

    async fn download(
        &self,
        uri: &str,
        container: &str,
        object: &mut ObjectRecord,
        local_path: &Path,
        progress: &dyn ProgressObserver,
    ) -> Result<DownloadResult>;
}

#[async_trait]
impl Storage for FilesClient {
    async fn regions(&self) -> Vec<String> {
        self.authenticator().list_regions().await
    }

    async fn endpoints(&self, region: &str) -> Vec<EndpointSelection> {
        self.authenticator().list_endpoints(region).await
    }

    async fn containers(&self, uri: &str, options: &ListOptions) -> ListingPage<ContainerRecord> {
        self.list_containers(uri, options).await
    }

    async fn objects(
        &self,
        uri: &str,
        container: &str,
        options: &ListOptions,
    ) -> ListingPage<ObjectRecord> {
        self.list_objects(uri, container, options).await
    }

    async fn download(
        &self,
        uri: &str,
        container: &str,
        object: &mut ObjectRecord,
        local_path: &Path,
        progress: &dyn ProgressObserver,
    ) -> Result<DownloadResult> {
        self.download_object(uri, container, object, local_path, progress)
            .await
    }
}

/// Local path for `name` under `dir`
///
/// `None` when the name is empty, absolute, or climbs out of `dir`.
pub fn local_target(dir: &Path, name: &str) -> Option<PathBuf> {
    let mut target = dir.to_path_buf();
    let mut pushed = false;

    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => {
                target.push(part);
                pushed = true;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    pushed.then_some(target)
}

pub struct Browser<'a, S, R, W> {
    storage: &'a S,
    prompt: Prompt<R, W>,
    formatter: Formatter,
    page_limit: Option<u32>,
    download_dir: PathBuf,
}

impl<'a, S, R, W> Browser<'a, S, R, W>
where
    S: Storage,
    R: BufRead,
    W: Write,
{
    pub fn new(storage: &'a S, prompt: Prompt<R, W>, formatter: Formatter) -> Self {
        Self {
            storage,
            prompt,
            formatter,
            page_limit: None,
            download_dir: PathBuf::from("."),
        }
    }

    /// Page size for container and object listings; `None` lists everything
    pub fn with_page_limit(mut self, limit: Option<u32>) -> Self {
        self.page_limit = limit;
        self
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    #[cfg(test)]
    pub fn into_prompt(self) -> Prompt<R, W> {
        self.prompt
    }

    /// Run until the user quits from the data center menu
    pub async fn run(&mut self) -> io::Result<()> {
        while let Some(region) = self.select_region().await? {
            let line = format!("Selected DC: {}", self.formatter.style_name(&region));
            self.prompt.line(&line)?;

            while let Some(endpoint) = self.select_endpoint(&region).await? {
                let line = format!(
                    "Selected Network URI: {}",
                    self.formatter.style_url(&endpoint.uri)
                );
                self.prompt.line(&line)?;

                while let Some(container) = self.select_container(&endpoint.uri).await? {
                    let line = format!(
                        "Selected Container: {}",
                        self.formatter.style_container(&container)
                    );
                    self.prompt.line(&line)?;
                    self.browse_objects(&endpoint.uri, &container).await?;
                }
            }
        }
        Ok(())
    }

    async fn select_region(&mut self) -> io::Result<Option<String>> {
        let mut regions = self.storage.regions().await;
        let menu = Menu::new(regions.clone(), "quit", "Please select data center: ")
            .with_heading(self.formatter.style_heading("Found Cloud Files Data Centers:"));

        match self.choose(&menu)? {
            Choice::Item(i) => Ok(Some(regions.swap_remove(i))),
            Choice::More | Choice::Back => Ok(None),
        }
    }

    async fn select_endpoint(&mut self, region: &str) -> io::Result<Option<EndpointSelection>> {
        let mut endpoints = self.storage.endpoints(region).await;
        let entries = endpoints
            .iter()
            .map(|e| format!("{} - {}", e.network_kind, self.formatter.style_url(&e.uri)))
            .collect();
        let heading = format!("Available CloudFile Networks for {region}:");
        let menu = Menu::new(entries, "return to previous menu", "Please select network: ")
            .with_heading(self.formatter.style_heading(&heading));

        match self.choose(&menu)? {
            Choice::Item(i) => Ok(Some(endpoints.swap_remove(i))),
            Choice::More | Choice::Back => Ok(None),
        }
    }

    async fn select_container(&mut self, uri: &str) -> io::Result<Option<String>> {
        let mut options = ListOptions::new(self.page_limit);

        loop {
            let page = self.storage.containers(uri, &options).await;
            let next_marker = page.next_marker();
            let entries = page
                .items
                .iter()
                .map(|c| {
                    format!(
                        "{} (Size: {})",
                        self.formatter.style_container(&c.name),
                        self.formatter.style_size(c.bytes)
                    )
                })
                .collect();
            let menu = Menu::new(entries, "return to previous menu", "Please select container: ")
                .with_more(next_marker.as_ref().map(|_| "Check for more containers"));

            match self.choose(&menu)? {
                Choice::Item(i) => {
                    self.prompt.line(&format!("Selected container #{i}"))?;
                    return Ok(page.into_iter().nth(i).map(|c| c.name));
                }
                Choice::More => {
                    if let Some(marker) = next_marker {
                        options = options.with_marker(marker);
                    }
                }
                Choice::Back => return Ok(None),
            }
        }
    }

    async fn browse_objects(&mut self, uri: &str, container: &str) -> io::Result<()> {
        let mut options = ListOptions::new(self.page_limit);

        loop {
            let mut page = self.storage.objects(uri, container, &options).await;
            let next_marker = page.next_marker();

            // the same page is shown again after each object
            loop {
                let entries = page
                    .items
                    .iter()
                    .map(|o| {
                        let name = o.name.as_deref().unwrap_or("<unnamed>");
                        match o.bytes {
                            Some(bytes) => format!(
                                "{} (Size: {})",
                                self.formatter.style_object(name),
                                self.formatter.style_size(bytes)
                            ),
                            None => self.formatter.style_object(name),
                        }
                    })
                    .collect();
                let menu = Menu::new(entries, "return to previous menu", "Please select object: ")
                    .with_more(next_marker.as_ref().map(|_| "Check for more objects"));

                match self.choose(&menu)? {
                    Choice::Item(i) => {
                        self.show_object(uri, container, &mut page.items[i]).await?;
                    }
                    Choice::More => {
                        if let Some(marker) = &next_marker {
                            options = options.with_marker(marker.clone());
                        }
                        break;
                    }
                    Choice::Back => return Ok(()),
                }
            }
        }
    }

    async fn show_object(
        &mut self,
        uri: &str,
        container: &str,
        object: &mut ObjectRecord,
    ) -> io::Result<()> {
        let details = self.formatter.object_details(object);
        self.prompt.line(&details)?;

        if self.prompt.confirm("Download? [y/n] ")? {
            self.download(uri, container, object).await?;
        }
        self.prompt.pause("\tPress ENTER to continue")
    }

    async fn download(
        &mut self,
        uri: &str,
        container: &str,
        object: &mut ObjectRecord,
    ) -> io::Result<()> {
        let name = object.name.clone().unwrap_or_default();
        let Some(target) = local_target(&self.download_dir, &name) else {
            let line = format!("Refusing to download '{name}': not a safe local path");
            return self.prompt.line(&line);
        };

        let progress = if self.formatter.progress_enabled() {
            DownloadProgress::new()
        } else {
            DownloadProgress::hidden()
        };

        match self
            .storage
            .download(uri, container, object, &target, &progress)
            .await
        {
            Ok(result) => {
                let done = format!(
                    "Downloaded {} to {}",
                    result.object_name,
                    result.local_path.display()
                );
                self.prompt.line(&self.formatter.success(&done))?;
                let md5 = format!("\tMD5: {}", self.formatter.style_digest(&result.md5_hex));
                self.prompt.line(&md5)?;
                let sha1 = format!("\tSHA-1: {}", self.formatter.style_digest(&result.sha1_hex));
                self.prompt.line(&sha1)?;

                if object.md5_matches_etag() == Some(false) {
                    self.formatter
                        .warning("MD5 does not match the hash reported by the service");
                }
                Ok(())
            }
            Err(e) => {
                tracing::error!(object = %name, container, error = %e, "Download failed");
                self.prompt.line(&format!("Download failed: {e}"))
            }
        }
    }

    fn choose(&mut self, menu: &Menu<'_>) -> io::Result<Choice> {
        let formatter = &self.formatter;
        self.prompt.choose(menu, |i| formatter.style_index(i))
    }
}

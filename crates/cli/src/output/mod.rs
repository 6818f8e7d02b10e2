//! Terminal output: styling, object details and download progress

mod formatter;
mod progress;

pub use formatter::Formatter;
pub use progress::DownloadProgress;

/// Output settings shared by the browser and its menus
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Disable colors
    pub no_color: bool,
    /// Hide the download progress bar
    pub no_progress: bool,
}

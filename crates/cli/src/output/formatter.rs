//! Styled text for menus and messages
//!
//! Menus are written by the browser to its own writer; this module only
//! produces the strings. Errors and warnings go straight to stderr.

use comfy_table::{Cell, Table, presets::NOTHING};
use console::Style;

use cf_core::ObjectRecord;

use super::OutputConfig;

/// Color theme for styled output
#[derive(Debug, Clone)]
pub struct Theme {
    /// Menu headings - bold
    pub heading: Style,
    /// Menu entry numbers - dim
    pub index: Style,
    /// Container names - blue + bold
    pub container: Style,
    /// Object names - default
    pub object: Style,
    /// Sizes - green
    pub size: Style,
    /// Timestamps - dim
    pub date: Style,
    /// Detail keys - cyan
    pub key: Style,
    /// Endpoint URIs - cyan + underline
    pub url: Style,
    /// Region and user names - bold
    pub name: Style,
    /// Digests - yellow
    pub digest: Style,
    pub success: Style,
    pub error: Style,
    pub warning: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            heading: Style::new().bold(),
            index: Style::new().dim(),
            container: Style::new().blue().bold(),
            object: Style::new(),
            size: Style::new().green(),
            date: Style::new().dim(),
            key: Style::new().cyan(),
            url: Style::new().cyan().underlined(),
            name: Style::new().bold(),
            digest: Style::new().yellow(),
            success: Style::new().green(),
            error: Style::new().red(),
            warning: Style::new().yellow(),
        }
    }
}

impl Theme {
    /// Returns a theme with no styling (for no-color mode)
    pub fn plain() -> Self {
        Self {
            heading: Style::new(),
            index: Style::new(),
            container: Style::new(),
            object: Style::new(),
            size: Style::new(),
            date: Style::new(),
            key: Style::new(),
            url: Style::new(),
            name: Style::new(),
            digest: Style::new(),
            success: Style::new(),
            error: Style::new(),
            warning: Style::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
    theme: Theme,
}

impl Formatter {
    pub fn new(config: OutputConfig) -> Self {
        let theme = if config.no_color {
            Theme::plain()
        } else {
            Theme::default()
        };
        Self { config, theme }
    }

    pub fn colors_enabled(&self) -> bool {
        !self.config.no_color
    }

    pub fn progress_enabled(&self) -> bool {
        !self.config.no_progress
    }

    // ========== Style helper methods ==========

    pub fn style_heading(&self, text: &str) -> String {
        self.theme.heading.apply_to(text).to_string()
    }

    pub fn style_index(&self, index: usize) -> String {
        self.theme.index.apply_to(format!("{index})")).to_string()
    }

    pub fn style_container(&self, text: &str) -> String {
        self.theme.container.apply_to(text).to_string()
    }

    pub fn style_object(&self, text: &str) -> String {
        self.theme.object.apply_to(text).to_string()
    }

    pub fn style_url(&self, text: &str) -> String {
        self.theme.url.apply_to(text).to_string()
    }

    pub fn style_name(&self, text: &str) -> String {
        self.theme.name.apply_to(text).to_string()
    }

    pub fn style_digest(&self, text: &str) -> String {
        self.theme.digest.apply_to(text).to_string()
    }

    /// Human-readable size in binary units, styled
    pub fn style_size(&self, bytes: u64) -> String {
        self.theme
            .size
            .apply_to(humansize::format_size(bytes, humansize::BINARY))
            .to_string()
    }

    /// Two-column table of an object's listing metadata
    pub fn object_details(&self, object: &ObjectRecord) -> String {
        let missing = || "-".to_string();
        let size = object
            .bytes
            .map(|b| format!("{} ({b} bytes)", self.style_size(b)))
            .unwrap_or_else(missing);
        let modified = object
            .last_modified
            .as_deref()
            .map(|d| self.theme.date.apply_to(d).to_string())
            .unwrap_or_else(missing);

        let rows = [
            ("Name", object.name.clone().unwrap_or_else(missing)),
            ("Size", size),
            (
                "Content-Type",
                object.content_type.clone().unwrap_or_else(missing),
            ),
            ("Last Modified", modified),
            ("Hash", object.hash.clone().unwrap_or_else(missing)),
        ];

        let mut table = Table::new();
        table.load_preset(NOTHING);
        for (key, value) in rows {
            table.add_row(vec![
                Cell::new(self.theme.key.apply_to(key).to_string()),
                Cell::new(value),
            ]);
        }
        table.to_string()
    }

    // ========== Output methods ==========

    /// A success message line
    pub fn success(&self, message: &str) -> String {
        let checkmark = self.theme.success.apply_to("✓");
        format!("{checkmark} {message}")
    }

    /// Output an error message to stderr
    pub fn error(&self, message: &str) {
        let cross = self.theme.error.apply_to("✗");
        eprintln!("{cross} {message}");
    }

    /// Output a warning message to stderr
    pub fn warning(&self, message: &str) {
        let warn_icon = self.theme.warning.apply_to("⚠");
        eprintln!("{warn_icon} {message}");
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(OutputConfig::default())
    }
}

//! Report configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes:
//!
//! ```toml
//! truncate_limit = 2000
//! include_raw_content = false
//!
//! [page]
//! margin = 36.0
//!
//! [rules]
//! lesson_containers = [".topic", ".lesson"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::extract::ExtractionRules;
use crate::report::PageMetrics;

/// Settings for one report run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Raw text dumps longer than this many characters are truncated.
    pub truncate_limit: usize,
    /// Append the raw content of every text file.
    pub include_raw_content: bool,
    /// List every package file with its size in the technical summary.
    pub include_file_listing: bool,
    pub page: PageMetrics,
    pub rules: ExtractionRules,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            truncate_limit: 5000,
            include_raw_content: true,
            include_file_listing: true,
            page: PageMetrics::default(),
            rules: ExtractionRules::default(),
        }
    }
}

impl ReportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn with_truncate_limit(mut self, limit: usize) -> Self {
        self.truncate_limit = limit;
        self
    }

    pub fn with_raw_content(mut self, include: bool) -> Self {
        self.include_raw_content = include;
        self
    }

    pub fn with_file_listing(mut self, include: bool) -> Self {
        self.include_file_listing = include;
        self
    }

    pub fn with_page(mut self, page: PageMetrics) -> Self {
        self.page = page;
        self
    }

    pub fn with_rules(mut self, rules: ExtractionRules) -> Self {
        self.rules = rules;
        self
    }

    /// Reject geometry that leaves no room to draw anything.
    pub fn validate(&self) -> Result<()> {
        let page = &self.page;
        if page.page_width <= 2.0 * page.margin || page.page_height <= 2.0 * page.margin {
            return Err(Error::Config(format!(
                "margins of {} leave no room on a {}x{} page",
                page.margin, page.page_width, page.page_height
            )));
        }
        if page.font_size <= 0.0 || page.line_height <= 0.0 || page.mono_font_size <= 0.0 {
            return Err(Error::Config("font sizes and line height must be positive".into()));
        }
        Ok(())
    }
}

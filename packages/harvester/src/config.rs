//! Configuration constants and run settings for the harvester.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{HarvesterError, Result};
use crate::links::TitleMatch;

/// Theme pages on the parliament portal, processed in this order.
pub const THEME_URLS: [&str; 3] = [
    "https://www.parlamento.pt/Cidadania/Paginas/DAIniciativas.aspx",
    "https://www.parlamento.pt/Cidadania/Paginas/DAatividades.aspx",
    "https://www.parlamento.pt/Cidadania/Paginas/DAInformacaoBase.aspx",
];

/// Timeout for HTML page requests, in seconds.
pub const HTML_TIMEOUT_SECS: u64 = 30;

/// Timeout for JSON dataset requests, in seconds.
///
/// Some datasets run into tens of megabytes.
pub const JSON_TIMEOUT_SECS: u64 = 60;

/// Output directory used when nothing else is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "data";

/// Environment variable overriding the output directory.
pub const OUTPUT_DIR_ENV: &str = "DADOS_ABERTOS_OUTPUT_DIR";

/// Settings for a single harvest run.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub theme_urls: Vec<String>,
    pub output_dir: PathBuf,
    pub html_timeout: Duration,
    pub json_timeout: Duration,
    pub title_match: TitleMatch,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            theme_urls: THEME_URLS.iter().map(|u| u.to_string()).collect(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            html_timeout: Duration::from_secs(HTML_TIMEOUT_SECS),
            json_timeout: Duration::from_secs(JSON_TIMEOUT_SECS),
            title_match: TitleMatch::default(),
        }
    }
}

impl HarvestConfig {
    /// Defaults, with the output directory taken from the environment when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var(OUTPUT_DIR_ENV) {
            if !dir.trim().is_empty() {
                config.output_dir = PathBuf::from(dir);
            }
        }
        config
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Replace the theme list. An empty list keeps the current one.
    pub fn with_theme_urls(mut self, theme_urls: Vec<String>) -> Self {
        if !theme_urls.is_empty() {
            self.theme_urls = theme_urls;
        }
        self
    }

    pub fn with_title_match(mut self, title_match: TitleMatch) -> Self {
        self.title_match = title_match;
        self
    }
}

/// Parse an absolute URL.
pub fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|source| HarvesterError::InvalidUrl {
        url: url.to_string(),
        source,
    })
}

/// Scheme and host (plus explicit port) of a theme URL.
///
/// Links found on theme and legislature pages are resolved against this.
///
/// # Examples
/// ```
/// use dados_abertos_harvester::config::base_url;
///
/// let base = base_url("https://www.parlamento.pt/Cidadania/Paginas/DAIniciativas.aspx").unwrap();
/// assert_eq!(base.as_str(), "https://www.parlamento.pt/");
/// ```
pub fn base_url(theme_url: &str) -> Result<Url> {
    let url = parse_url(theme_url)?;
    let origin = url.origin().ascii_serialization();
    parse_url(&origin)
}

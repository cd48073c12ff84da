//! Main harvester service that ties all components together.

use url::Url;

use crate::config::base_url;
use crate::convert::convert;
use crate::error::Result;
use crate::http::Fetcher;
use crate::links::{extract_json_link, extract_legislature_links, DatasetLink, TitleMatch};
use crate::writer::{DatasetReport, DatasetWriter};

/// Progress notifications emitted during a run.
#[derive(Debug, Clone, Copy)]
pub enum HarvestEvent<'a> {
    /// A theme page is about to be fetched.
    ThemeStarted { theme_url: &'a str },
    /// A legislature page advertises no JSON dataset.
    PageSkipped { page_url: &'a Url },
    /// A dataset was downloaded, converted and compared against disk.
    DatasetProcessed {
        link: &'a DatasetLink,
        report: &'a DatasetReport,
    },
    /// All legislatures of a theme are done.
    ThemeFinished { theme_url: &'a str, changed: usize },
}

/// Changed-file counts of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// `(theme URL, files changed)` in processing order.
    pub themes: Vec<(String, usize)>,
    pub total_changed: usize,
}

/// Walks theme pages down to their JSON datasets and mirrors them as CSV.
pub struct Harvester<F> {
    fetcher: F,
    writer: DatasetWriter,
    title_match: TitleMatch,
}

impl<F: Fetcher> Harvester<F> {
    pub fn new(fetcher: F, writer: DatasetWriter, title_match: TitleMatch) -> Self {
        Self {
            fetcher,
            writer,
            title_match,
        }
    }

    pub fn writer(&self) -> &DatasetWriter {
        &self.writer
    }

    /// Process every theme and return how many files changed.
    pub fn run<S: AsRef<str>>(&self, theme_urls: &[S]) -> Result<RunSummary> {
        self.run_with(theme_urls, |_| {})
    }

    /// Like [`Harvester::run`], reporting progress to `on_event`.
    ///
    /// The first error aborts the whole run.
    pub fn run_with<S, E>(&self, theme_urls: &[S], mut on_event: E) -> Result<RunSummary>
    where
        S: AsRef<str>,
        E: FnMut(HarvestEvent<'_>),
    {
        let mut summary = RunSummary::default();

        for theme_url in theme_urls {
            let theme_url = theme_url.as_ref();
            on_event(HarvestEvent::ThemeStarted { theme_url });

            let changed = self.run_theme(theme_url, &mut on_event)?;

            on_event(HarvestEvent::ThemeFinished { theme_url, changed });
            summary.themes.push((theme_url.to_string(), changed));
            summary.total_changed += changed;
        }

        tracing::info!(total_changed = summary.total_changed, "Harvest finished");
        Ok(summary)
    }

    fn run_theme<E>(&self, theme_url: &str, on_event: &mut E) -> Result<usize>
    where
        E: FnMut(HarvestEvent<'_>),
    {
        let base = base_url(theme_url)?;
        let theme_html = self.fetcher.fetch_text(theme_url)?;
        let pages = extract_legislature_links(&theme_html, &base)?;
        tracing::debug!(theme_url, pages = pages.len(), "Legislature pages found");

        let mut changed = 0;
        for page_url in &pages {
            let page_html = self.fetcher.fetch_text(page_url.as_str())?;
            let Some(link) = extract_json_link(&page_html, &base, self.title_match)? else {
                tracing::debug!(page = %page_url, "No JSON dataset on page");
                on_event(HarvestEvent::PageSkipped { page_url });
                continue;
            };

            let report = self.harvest_dataset(&link)?;
            if report.outcome.is_changed() {
                changed += 1;
            }
            on_event(HarvestEvent::DatasetProcessed {
                link: &link,
                report: &report,
            });
        }

        Ok(changed)
    }

    /// Download one dataset, convert it and write it if it changed.
    pub fn harvest_dataset(&self, link: &DatasetLink) -> Result<DatasetReport> {
        let value = self.fetcher.fetch_json(link.url.as_str())?;
        let csv = convert(&value)?;
        self.writer.write_if_changed(&link.title, &csv)
    }

    /// List the datasets a run would process, without downloading them.
    pub fn discover<S: AsRef<str>>(&self, theme_urls: &[S]) -> Result<Vec<DatasetLink>> {
        let mut links = Vec::new();

        for theme_url in theme_urls {
            let theme_url = theme_url.as_ref();
            let base = base_url(theme_url)?;
            let theme_html = self.fetcher.fetch_text(theme_url)?;

            for page_url in extract_legislature_links(&theme_html, &base)? {
                let page_html = self.fetcher.fetch_text(page_url.as_str())?;
                if let Some(link) = extract_json_link(&page_html, &base, self.title_match)? {
                    links.push(link);
                }
            }
        }

        Ok(links)
    }
}

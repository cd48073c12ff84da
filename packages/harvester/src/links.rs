//! Link discovery on portal pages.
//!
//! The portal marks every downloadable link with a `div.archive-item`
//! container. Theme pages list one container per legislature; legislature
//! pages list the files of a dataset, one of which is the JSON export.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

use crate::error::{HarvesterError, Result};

/// Marker searched for in the anchor's `title` attribute.
const JSON_MARKER: &str = "json";

#[allow(clippy::expect_used)] // Static selector that is guaranteed to be valid
static ARCHIVE_ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.archive-item").expect("valid selector"));

#[allow(clippy::expect_used)] // Static selector that is guaranteed to be valid
static LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));

#[allow(clippy::expect_used)] // Static selector that is guaranteed to be valid
static TITLED_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.archive-item a[href][title]").expect("valid selector")
});

/// How the `json` marker is matched against an anchor title.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TitleMatch {
    /// Substring match on the title as written, like `[title*="json"]` in CSS.
    #[default]
    CaseSensitive,
    /// Substring match ignoring case, so `JSON` and `Json` also qualify.
    CaseInsensitive,
}

impl TitleMatch {
    /// Whether `title` advertises a JSON download.
    pub fn matches(self, title: &str) -> bool {
        match self {
            Self::CaseSensitive => title.contains(JSON_MARKER),
            Self::CaseInsensitive => title.to_lowercase().contains(JSON_MARKER),
        }
    }
}

/// A JSON dataset advertised on a legislature page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLink {
    /// Absolute download URL.
    pub url: Url,
    /// Raw `title` attribute of the anchor.
    pub title: String,
}

fn resolve(base: &Url, href: &str) -> Result<Url> {
    base.join(href).map_err(|source| HarvesterError::InvalidUrl {
        url: href.to_string(),
        source,
    })
}

/// Legislature page links on a theme page, in document order.
///
/// Each archive item contributes its first link. Duplicates are kept.
pub fn extract_legislature_links(html: &str, base: &Url) -> Result<Vec<Url>> {
    let document = Html::parse_document(html);

    document
        .select(&ARCHIVE_ITEM)
        .filter_map(|item| item.select(&LINK).next())
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(|href| resolve(base, href))
        .collect()
}

/// The first JSON download link on a legislature page.
///
/// Returns `Ok(None)` when the page advertises no JSON file.
pub fn extract_json_link(
    html: &str,
    base: &Url,
    title_match: TitleMatch,
) -> Result<Option<DatasetLink>> {
    let document = Html::parse_document(html);

    let found = document.select(&TITLED_LINK).find_map(|anchor| {
        let title = anchor.value().attr("title")?;
        let href = anchor.value().attr("href")?;
        title_match.matches(title).then_some((href, title))
    });

    let Some((href, title)) = found else {
        return Ok(None);
    };

    Ok(Some(DatasetLink {
        url: resolve(base, href)?,
        title: title.to_string(),
    }))
}

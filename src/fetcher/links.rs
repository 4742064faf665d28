//! Docket-sheet link extraction.
//!
//! A defendant page links to the docket sheets of its cases through a fixed
//! endpoint; any anchor whose target contains that path segment is a sheet
//! link. Extraction returns a set, so a link referenced from several places
//! on one page is fetched once.

use super::{FetcherError, FetcherResult};
use scraper::{Html, Selector};
use std::collections::HashSet;

/// Path segment identifying a docket-sheet URL on a defendant page.
pub const SHEET_LINK_MARKER: &str = "666666.php";

const ANCHOR_SELECTOR: &str = "a";

/// Collect every anchor target on the page that points at a docket sheet.
///
/// No ordering is implied; the caller fans out over the set in arbitrary
/// order.
pub fn extract_sheet_links(html: &str) -> FetcherResult<HashSet<String>> {
    let document = Html::parse_document(html);
    let anchors = Selector::parse(ANCHOR_SELECTOR)
        .map_err(|_| FetcherError::Selector(ANCHOR_SELECTOR.into()))?;

    Ok(document
        .select(&anchors)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter(|href| href.contains(SHEET_LINK_MARKER))
        .map(str::to_owned)
        .collect())
}

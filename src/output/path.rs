//! Deterministic on-disk naming for fetched items.
//!
//! The filename doubles as the durable resumption marker: a correctly named
//! file in the output directory means the item was attempted.

use std::path::{Path, PathBuf};

/// Filename prefix for defendant pages.
pub const DEFENDANT_PREFIX: &str = "defendant";

/// Filename prefix for docket sheets.
pub const DOCKET_PREFIX: &str = "docket";

const PAGE_EXT: &str = ".html";

/// `defendant{id}.html` under the defendant directory.
pub fn defendant_page_path(dir: &Path, id: u32) -> PathBuf {
    dir.join(format!("{DEFENDANT_PREFIX}{id}{PAGE_EXT}"))
}

/// `docket{key}.html` under the docket directory, keyed by the link's last
/// six characters.
pub fn docket_sheet_path(dir: &Path, link: &str) -> PathBuf {
    dir.join(format!("{DOCKET_PREFIX}{}{PAGE_EXT}", sheet_key(link)))
}

/// The last six characters of a sheet link, used as its on-disk key.
///
/// Links shorter than six characters are used whole. Slicing is
/// char-boundary safe for the (unexpected) non-ASCII case.
pub fn sheet_key(link: &str) -> &str {
    match link.char_indices().rev().nth(5) {
        Some((idx, _)) => &link[idx..],
        None => link,
    }
}

/// Parse the numeric ID out of a `{prefix}{digits}.html` filename.
///
/// Anything that does not match the pattern exactly yields `None`; directory
/// scans skip such files rather than fail.
pub(crate) fn page_id(filename: &str, prefix: &str) -> Option<u32> {
    let digits = filename.strip_prefix(prefix)?.strip_suffix(PAGE_EXT)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

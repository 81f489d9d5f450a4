//! Directory listing parser.
//!
//! Public file hosts publish their inventory as plain HTML index pages:
//! one anchor per file, directories marked with a trailing slash. This
//! module turns such a page into the set of file names to mirror.

use datamirror_types::FileName;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Matches anchor tags and captures the href value, single- or
/// double-quoted. Tag and attribute names are matched case-insensitively;
/// IIS-style indexes shout `<A HREF=...>`.
static ANCHOR_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a\b[^>]*\bhref\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

/// Extracts the file names from a directory listing page.
///
/// An anchor counts as a file when its href is non-empty, does not end in a
/// slash (directories and the parent-directory link), and does not start
/// with `#` or `?` (page fragments and sort links). Href values are taken
/// verbatim - a leading slash or path is part of the name.
///
/// A page with no anchors is a valid, empty listing.
#[must_use]
pub fn file_names(html: &str) -> BTreeSet<FileName> {
    ANCHOR_HREF
        .captures_iter(html)
        .filter_map(|captures| captures.get(1).or_else(|| captures.get(2)))
        .map(|matched| matched.as_str())
        .filter(|href| {
            !href.is_empty()
                && !href.ends_with('/')
                && !href.starts_with('#')
                && !href.starts_with('?')
        })
        .map(FileName::new)
        .collect()
}

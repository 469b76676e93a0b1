use std::path::{Path, PathBuf};

use itertools::Itertools;
use walkdir::WalkDir;

use crate::error::Error;

// -------------------------------------------------------------------------------------------------

/// Title prefix which marks wiki pages as owned by the publisher.
pub(crate) const PAGE_TITLE_PREFIX: &str = "[Docs]";

/// Slug of the site root page.
pub(crate) const HOME_SLUG: &str = "docs-home";

/// Title of the site root page.
pub(crate) const HOME_TITLE: &str = "[Docs] Home";

// -------------------------------------------------------------------------------------------------

/// A single page of the rendered site.
#[derive(Debug, Clone)]
pub(crate) struct PageEntry {
    /// Absolute path of the page's `index.html`.
    pub file: PathBuf,
    /// Wiki slug derived from the page location.
    pub slug: String,
    /// Wiki title derived from the page location.
    pub title: String,
}

// -------------------------------------------------------------------------------------------------

/// Collects all pages of a rendered site.
///
/// A page is a directory containing an `index.html`, including the site root itself.
/// Other HTML files (error pages, redirect stubs) are not part of the page tree and
/// are skipped. The walk order is stable, so repeated runs publish pages in the same
/// order.
pub(crate) fn scan_site(site_root: &Path) -> Result<Vec<PageEntry>, Error> {
    let mut pages = Vec::new();
    for entry in WalkDir::new(site_root).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() || !entry.file_name().eq_ignore_ascii_case("index.html") {
            continue;
        }
        let file = entry.path().to_path_buf();
        let rel_dir = file
            .parent()
            .and_then(|parent| parent.strip_prefix(site_root).ok())
            .unwrap_or(Path::new(""))
            .to_path_buf();
        let (slug, title) = page_address(&rel_dir);
        pages.push(PageEntry { file, slug, title });
    }
    Ok(pages)
}

/// Derives the wiki slug and title of a page from its directory relative to the site
/// root.
///
/// The root page gets fixed names. Nested pages join their path segments with slashes
/// for the slug and with arrows for the title, so `guide/install` becomes the page
/// `[Docs] Guide → Install` at slug `guide/install`.
pub(crate) fn page_address(rel_dir: &Path) -> (String, String) {
    let segments: Vec<String> = rel_dir
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();
    if segments.is_empty() {
        return (HOME_SLUG.to_string(), HOME_TITLE.to_string());
    }
    let slug = segments.join("/");
    let title = format!(
        "{PAGE_TITLE_PREFIX} {}",
        segments.iter().map(|segment| capitalize(segment)).join(" → ")
    );
    (slug, title)
}

/// Resolves a local reference of a page against the page's directory.
///
/// Returns the canonical path of the referenced file if it exists and lies below the
/// site root. References escaping the site root resolve to `None` just like missing
/// files, so a stray `../../etc/passwd` never reaches the uploader.
pub(crate) fn resolve_local(site_root: &Path, page_dir: &Path, reference: &str) -> Option<PathBuf> {
    let Ok(resolved) = page_dir.join(reference).canonicalize() else {
        return None;
    };
    if resolved.starts_with(site_root) && resolved.is_file() {
        Some(resolved)
    } else {
        None
    }
}

/// Capitalizes a single path segment: first character uppercased, the rest lowercased.
fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|ch| ch.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

// -------------------------------------------------------------------------------------------------

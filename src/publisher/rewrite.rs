use std::cell::RefCell;

use lol_html::{element, html_content::Element, rewrite_str, HandlerResult, RewriteStrSettings};

use crate::error::Error;

// -------------------------------------------------------------------------------------------------

/// Reference prefixes which mark a reference as not pointing at a local file.
/// `http` also covers `https`.
const NON_LOCAL_PREFIXES: [&str; 4] = ["http", "#", "data:", "mailto:"];

/// Checks whether a reference attribute points at a local file instead of an absolute
/// URL, a fragment, a data URI or a mail link.
pub(crate) fn is_local_reference(reference: &str) -> bool {
    !NON_LOCAL_PREFIXES
        .iter()
        .any(|prefix| reference.starts_with(prefix))
}

/// Rewrites all local reference attributes of an HTML document.
///
/// `resolve` maps a local reference to its replacement URL; references it answers
/// with `None` are left untouched. Covers head links, scripts, images and media
/// sources. Anchors are deliberately left alone, page-to-page links keep their
/// relative form.
pub(crate) fn rewrite_references<F>(html: &str, resolve: F) -> Result<String, Error>
where
    F: FnMut(&str) -> Option<String>,
{
    // the resolver is shared by all element handlers, which run one at a time
    let resolve = RefCell::new(resolve);
    // bound separately: the struct update's temporary base must drop while the resolver is alive
    let settings = RewriteStrSettings {
        element_content_handlers: vec![
            element!("link[href]", |el| rewrite_attribute(el, "href", &resolve)),
            element!("script[src]", |el| rewrite_attribute(el, "src", &resolve)),
            element!("img[src]", |el| rewrite_attribute(el, "src", &resolve)),
            element!("source[src]", |el| rewrite_attribute(el, "src", &resolve)),
        ],
        ..RewriteStrSettings::default()
    };
    rewrite_str(html, settings).map_err(|error| Error::Rewrite(error.to_string()))
}

/// Replaces one attribute of an element if its value is a local reference the
/// resolver knows a URL for.
fn rewrite_attribute<F>(
    element: &mut Element<'_, '_>,
    attribute: &str,
    resolve: &RefCell<F>,
) -> HandlerResult
where
    F: FnMut(&str) -> Option<String>,
{
    if let Some(value) = element.get_attribute(attribute) {
        if is_local_reference(&value) {
            if let Some(url) = (*resolve.borrow_mut())(&value) {
                element.set_attribute(attribute, &url)?;
            }
        }
    }
    Ok(())
}

// -------------------------------------------------------------------------------------------------

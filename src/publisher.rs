pub(crate) mod assets;
pub(crate) mod options;
pub(crate) mod rewrite;
pub(crate) mod site;

// -------------------------------------------------------------------------------------------------

use std::{fs, path::Path};

use walkdir::WalkDir;

use crate::{
    client::{
        pages::{CreateOutcome, NewPage, PageUpdate},
        Course,
    },
    error::Error,
    publisher::{
        assets::AssetStore,
        options::Options,
        site::{PageEntry, HOME_SLUG, PAGE_TITLE_PREFIX},
    },
};

// -------------------------------------------------------------------------------------------------

/// How a single page ended up on the server.
enum PublishResult {
    Created,
    Updated,
}

/// Publish a rendered documentation site with the given [`Options`](options::Options).
///
/// This purges all previously published wiki pages, uploads the site's static assets
/// into the course file storage, and then creates one wiki page per site page with
/// all local references rewritten to the uploaded asset URLs.
///
/// Pages whose slug is already taken are updated in place, so the publisher can run
/// on top of leftovers from an interrupted run.
pub fn publish_site(options: &Options) -> Result<(), Error> {
    let course = Course::connect(&options.lms_url, &options.lms_token, options.course_id)?;
    let site_root = options.site.canonicalize()?;

    println!("1. Purging previously published pages...");
    purge_marked_pages(&course)?;

    let pages = site::scan_site(&site_root)?;
    let mut store = AssetStore::new(&course, &site_root);

    println!("\n2. Uploading site assets...");
    upload_assets(&mut store, &site_root)?;

    println!("\n3. Publishing pages...\n");
    let mut created = 0;
    let mut updated = 0;
    let mut failed = 0;
    for page in &pages {
        match publish_page(&course, &mut store, &site_root, page) {
            Ok(PublishResult::Created) => created += 1,
            Ok(PublishResult::Updated) => updated += 1,
            Err(error) => {
                failed += 1;
                println!("  ✗ {}: {error}", page.title);
            }
        }
    }

    println!("\nDone: {created} pages created, {updated} updated, {failed} failed.");
    println!("Docs home: {}", course.page_web_url(HOME_SLUG));
    Ok(())
}

// -------------------------------------------------------------------------------------------------

/// Deletes every wiki page whose title carries the publisher's marker prefix.
///
/// Pages are recognized by the title prefix alone, so any page a course author titles
/// that way is purged along with the published ones. A marked page which is currently
/// the course front page is unmarked first, as a front page cannot be deleted.
fn purge_marked_pages(course: &Course) -> Result<(), Error> {
    for page in course.list_pages()? {
        if !page.title.starts_with(PAGE_TITLE_PREFIX) {
            continue;
        }
        if page.front_page {
            println!("  unmarking front page: {}", page.title);
            course.update_page(
                &page.url,
                &PageUpdate {
                    front_page: Some(false),
                    ..Default::default()
                },
            )?;
        }
        println!("  deleting: {}", page.title);
        course.delete_page(&page.url)?;
    }
    Ok(())
}

/// Uploads every non-HTML file of the site up front.
///
/// Pages only reference a subset of these directly, but fonts and other indirectly
/// loaded files must be available too, so the whole tree goes up. Failed uploads are
/// reported by the store and do not stop the pass.
fn upload_assets(store: &mut AssetStore, site_root: &Path) -> Result<(), Error> {
    for entry in WalkDir::new(site_root).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        let is_html = entry
            .path()
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case("html"));
        if !entry.file_type().is_file() || is_html {
            continue;
        }
        store.ensure_uploaded(entry.path());
    }
    Ok(())
}

/// Publishes a single page: rewrites its local references to uploaded asset URLs,
/// then creates the wiki page, falling back to an in-place update when the slug is
/// already taken.
fn publish_page(
    course: &Course,
    store: &mut AssetStore,
    site_root: &Path,
    page: &PageEntry,
) -> Result<PublishResult, Error> {
    let html = fs::read_to_string(&page.file)?;
    let page_dir = page.file.parent().unwrap_or(site_root);
    let body = rewrite::rewrite_references(&html, |reference| {
        let path = site::resolve_local(site_root, page_dir, reference)?;
        store.ensure_uploaded(&path)
    })?;

    let outcome = course.create_page(&NewPage {
        title: &page.title,
        url: &page.slug,
        body: &body,
        published: true,
        front_page: page.slug == HOME_SLUG,
    })?;
    match outcome {
        CreateOutcome::Created(created) => {
            // the server may canonicalize the requested slug, its record is authoritative
            println!("  ✓ {}  →  /{}", page.title, created.url);
            Ok(PublishResult::Created)
        }
        CreateOutcome::Conflict => {
            // exactly one fetch + update follows a conflict, create is not retried
            let existing = course.get_page(&page.slug)?;
            course.update_page(
                &existing.url,
                &PageUpdate {
                    body: Some(&body),
                    published: Some(true),
                    ..Default::default()
                },
            )?;
            println!("  ↻ {} updated", page.title);
            Ok(PublishResult::Updated)
        }
    }
}

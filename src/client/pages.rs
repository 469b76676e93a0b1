use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::{client::Course, error::Error};

// -------------------------------------------------------------------------------------------------

/// Characters which must be escaped when a page slug is embedded as a single URL path segment.
const SLUG_ESCAPES: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`');

// -------------------------------------------------------------------------------------------------

/// A wiki page as returned by the LMS.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Page {
    /// Slug which identifies the page within its course.
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub front_page: bool,
}

/// Attributes sent when creating a wiki page.
#[derive(Debug, Serialize)]
pub(crate) struct NewPage<'a> {
    pub title: &'a str,
    /// Slug the new page should live at.
    pub url: &'a str,
    pub body: &'a str,
    pub published: bool,
    pub front_page: bool,
}

/// Attributes sent when editing a wiki page. Unset fields keep their server-side value.
#[derive(Debug, Default, Serialize)]
pub(crate) struct PageUpdate<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub front_page: Option<bool>,
}

/// JSON envelope the page endpoints expect around page attributes.
#[derive(Debug, Serialize)]
struct WikiPage<'a, T> {
    wiki_page: &'a T,
}

/// Result of a page create request.
#[derive(Debug)]
pub(crate) enum CreateOutcome {
    Created(Page),
    /// A page with the same slug already exists on the server.
    Conflict,
}

// -------------------------------------------------------------------------------------------------

impl Course {
    /// Fetches all wiki pages of the course.
    pub(crate) fn list_pages(&self) -> Result<Vec<Page>, Error> {
        self.get_paginated(&self.course_url("pages"))
    }

    /// Fetches a single wiki page by its slug.
    pub(crate) fn get_page(&self, slug: &str) -> Result<Page, Error> {
        self.get_json(&self.course_url(&format!("pages/{}", encode_slug(slug))))
    }

    /// Creates a new wiki page.
    ///
    /// A conflicting slug is a regular outcome here, not an error: the server reports it
    /// either with a conflict status or with a structured validation error on the slug
    /// attribute, and both are mapped to [`CreateOutcome::Conflict`].
    pub(crate) fn create_page(&self, page: &NewPage) -> Result<CreateOutcome, Error> {
        let response = self
            .http
            .post(self.course_url("pages"))
            .json(&WikiPage { wiki_page: page })
            .send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(CreateOutcome::Created(response.json()?));
        }
        let message = response.text().unwrap_or_default();
        if status == StatusCode::CONFLICT
            || (status == StatusCode::BAD_REQUEST && is_slug_taken(&message))
        {
            return Ok(CreateOutcome::Conflict);
        }
        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Edits an existing wiki page.
    pub(crate) fn update_page(&self, slug: &str, update: &PageUpdate) -> Result<Page, Error> {
        self.put_json(
            &self.course_url(&format!("pages/{}", encode_slug(slug))),
            &WikiPage { wiki_page: update },
        )
    }

    /// Deletes a wiki page by its slug.
    pub(crate) fn delete_page(&self, slug: &str) -> Result<(), Error> {
        self.delete(&self.course_url(&format!("pages/{}", encode_slug(slug))))
    }

    /// Human-facing URL of a wiki page, outside the API root.
    pub(crate) fn page_web_url(&self, slug: &str) -> String {
        format!(
            "{}/courses/{}/pages/{}",
            self.base,
            self.course_id,
            encode_slug(slug)
        )
    }
}

// -------------------------------------------------------------------------------------------------

/// Escapes a page slug for use as a single URL path segment.
fn encode_slug(slug: &str) -> String {
    utf8_percent_encode(slug, SLUG_ESCAPES).to_string()
}

/// Checks whether an error body reports the page slug as already taken.
fn is_slug_taken(body: &str) -> bool {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return false;
    };
    value["errors"]["url"]
        .as_array()
        .is_some_and(|errors| errors.iter().any(|error| error["type"] == "taken"))
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{json_response, MockServer};

    fn connect(server: &MockServer) -> Course {
        Course::connect(&server.url, "token", 7).unwrap()
    }

    #[test]
    fn create_page_posts_envelope() {
        let server = MockServer::start(vec![json_response(
            200,
            r#"{"url":"docs-home","title":"[Docs] Home","front_page":true}"#,
        )]);
        let course = connect(&server);

        let outcome = course
            .create_page(&NewPage {
                title: "[Docs] Home",
                url: "docs-home",
                body: "<p>hello</p>",
                published: true,
                front_page: true,
            })
            .unwrap();
        match outcome {
            CreateOutcome::Created(page) => assert_eq!(page.url, "docs-home"),
            CreateOutcome::Conflict => panic!("unexpected conflict"),
        }

        let requests = server.requests();
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/api/v1/courses/7/pages");
        let body = requests[0].body_str();
        assert!(body.contains(r#""wiki_page""#));
        assert!(body.contains(r#""url":"docs-home""#));
        assert!(body.contains(r#""front_page":true"#));
    }

    #[test]
    fn created_pages_report_the_server_slug() {
        // the requested slug is only a suggestion, the record reports where the page landed
        let server = MockServer::start(vec![json_response(
            201,
            r#"{"url":"docs-home-2","title":"[Docs] Home"}"#,
        )]);
        let outcome = connect(&server)
            .create_page(&NewPage {
                title: "[Docs] Home",
                url: "docs-home",
                body: "<p>hello</p>",
                published: true,
                front_page: false,
            })
            .unwrap();
        match outcome {
            CreateOutcome::Created(page) => assert_eq!(page.url, "docs-home-2"),
            CreateOutcome::Conflict => panic!("unexpected conflict"),
        }
    }

    #[test]
    fn create_page_maps_conflict_status() {
        let server = MockServer::start(vec![json_response(409, r#"{"message":"conflict"}"#)]);
        let outcome = connect(&server)
            .create_page(&NewPage {
                title: "t",
                url: "t",
                body: "b",
                published: true,
                front_page: false,
            })
            .unwrap();
        assert!(matches!(outcome, CreateOutcome::Conflict));
    }

    #[test]
    fn create_page_maps_taken_slug_validation() {
        let body = r#"{"errors":{"url":[{"attribute":"url","type":"taken","message":"has already been taken"}]}}"#;
        let server = MockServer::start(vec![json_response(400, body)]);
        let outcome = connect(&server)
            .create_page(&NewPage {
                title: "t",
                url: "t",
                body: "b",
                published: true,
                front_page: false,
            })
            .unwrap();
        assert!(matches!(outcome, CreateOutcome::Conflict));
    }

    #[test]
    fn create_page_passes_other_errors_through() {
        let body = r#"{"errors":{"title":[{"attribute":"title","type":"blank"}]}}"#;
        let server = MockServer::start(vec![json_response(400, body)]);
        let result = connect(&server).create_page(&NewPage {
            title: "",
            url: "t",
            body: "b",
            published: true,
            front_page: false,
        });
        assert!(matches!(result, Err(Error::Api { status: 400, .. })));
    }

    #[test]
    fn update_page_serializes_only_set_fields() {
        let server = MockServer::start(vec![json_response(
            200,
            r#"{"url":"guide","title":"[Docs] Guide"}"#,
        )]);
        let course = connect(&server);

        course
            .update_page(
                "guide",
                &PageUpdate {
                    body: Some("<p>new</p>"),
                    published: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();

        let requests = server.requests();
        assert_eq!(requests[0].method, "PUT");
        assert_eq!(requests[0].path, "/api/v1/courses/7/pages/guide");
        let body = requests[0].body_str();
        assert!(body.contains(r#""body""#));
        assert!(body.contains(r#""published":true"#));
        assert!(!body.contains(r#""title""#));
        assert!(!body.contains(r#""front_page""#));
    }

    #[test]
    fn slugs_are_escaped_as_path_segments() {
        assert_eq!(encode_slug("docs-home"), "docs-home");
        assert_eq!(encode_slug("a b/c?d"), "a%20b%2Fc%3Fd");
    }

    #[test]
    fn page_web_url_is_outside_api_root() {
        let course = Course::connect("https://lms.example.edu", "token", 42).unwrap();
        assert_eq!(
            course.page_web_url("docs-home"),
            "https://lms.example.edu/courses/42/pages/docs-home"
        );
    }

    #[test]
    fn taken_slug_detection_is_structural() {
        assert!(is_slug_taken(
            r#"{"errors":{"url":[{"type":"taken","message":"taken"}]}}"#
        ));
        // message strings alone must not count as a conflict
        assert!(!is_slug_taken(
            r#"{"errors":{"title":[{"type":"taken"}]},"message":"url has already been taken"}"#
        ));
        assert!(!is_slug_taken("not json"));
    }
}

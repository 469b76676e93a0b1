pub(crate) mod files;
pub(crate) mod pages;

// -------------------------------------------------------------------------------------------------

use reqwest::{
    blocking::Client,
    header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT},
    redirect,
};
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::error::Error;

// -------------------------------------------------------------------------------------------------

/// Number of records per batch when fetching paginated API collections.
pub(crate) const PER_PAGE: usize = 100;

/// User agent sent with every API request.
const AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

// -------------------------------------------------------------------------------------------------

/// Authenticated handle to a single course on an LMS server.
///
/// All wiki page and file operations go through this handle. Requests are blocking and
/// run strictly one after another.
pub(crate) struct Course {
    /// Carries the bearer token and is used for all regular API calls.
    http: Client,
    /// Bare client for the upload leg: it must not send the token and must not
    /// follow redirects on its own.
    upload_http: Client,
    /// Server base URL without a trailing slash, e.g. `https://lms.example.edu`.
    base: String,
    course_id: u64,
}

impl Course {
    /// Connects to the given LMS server.
    ///
    /// Validates the server URL and prepares an HTTP client which sends the access token
    /// with every request. No network traffic happens until the first API call.
    pub(crate) fn connect(lms_url: &str, token: &str, course_id: u64) -> Result<Self, Error> {
        let base = lms_url.trim_end_matches('/').to_string();
        Url::parse(&base)?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| Error::Options("access token contains invalid characters".to_string()))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(USER_AGENT, HeaderValue::from_static(AGENT));

        let http = Client::builder().default_headers(headers).build()?;
        let upload_http = Client::builder()
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            http,
            upload_http,
            base,
            course_id,
        })
    }

    /// Absolute URL of an API endpoint below the server's API root.
    pub(crate) fn api_url(&self, path: &str) -> String {
        format!("{}/api/v1/{path}", self.base)
    }

    /// Absolute URL of an API endpoint scoped to this course.
    pub(crate) fn course_url(&self, path: &str) -> String {
        self.api_url(&format!("courses/{}/{path}", self.course_id))
    }

    /// Performs a GET request and deserializes the JSON response.
    pub(crate) fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, Error> {
        let response = check(self.http.get(url).send()?)?;
        Ok(response.json()?)
    }

    /// Performs a POST request with a JSON body and deserializes the JSON response.
    pub(crate) fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, Error> {
        let response = check(self.http.post(url).json(body).send()?)?;
        Ok(response.json()?)
    }

    /// Performs a PUT request with a JSON body and deserializes the JSON response.
    pub(crate) fn put_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, Error> {
        let response = check(self.http.put(url).json(body).send()?)?;
        Ok(response.json()?)
    }

    /// Performs a DELETE request, ignoring the response body.
    pub(crate) fn delete(&self, url: &str) -> Result<(), Error> {
        check(self.http.delete(url).send()?)?;
        Ok(())
    }

    /// Fetches all records of a paginated collection endpoint.
    ///
    /// Batches are requested until the server returns one shorter than [`PER_PAGE`],
    /// which marks the end of the collection.
    pub(crate) fn get_paginated<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>, Error> {
        let mut records = Vec::new();
        for page in 1.. {
            let response = check(
                self.http
                    .get(url)
                    .query(&[("per_page", PER_PAGE.to_string()), ("page", page.to_string())])
                    .send()?,
            )?;
            let batch: Vec<T> = response.json()?;
            let batch_len = batch.len();
            records.extend(batch);
            if batch_len < PER_PAGE {
                break;
            }
        }
        Ok(records)
    }
}

// -------------------------------------------------------------------------------------------------

/// Turns a non-success response into an [`Error::Api`] with the response body as message.
fn check(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, Error> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let message = response.text().unwrap_or_default();
        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }
}

// -------------------------------------------------------------------------------------------------


// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::testing::{json_response, MockServer};
    use super::*;

    #[test]
    fn connect_rejects_invalid_url() {
        assert!(Course::connect("not a url", "token", 1).is_err());
        assert!(Course::connect("https://lms.example.edu", "token", 1).is_ok());
    }

    #[test]
    fn urls_are_rooted_and_course_scoped() {
        // a trailing slash on the configured URL must not produce double slashes
        let course = Course::connect("https://lms.example.edu/", "token", 42).unwrap();
        assert_eq!(
            course.api_url("folders/7/files"),
            "https://lms.example.edu/api/v1/folders/7/files"
        );
        assert_eq!(
            course.course_url("pages"),
            "https://lms.example.edu/api/v1/courses/42/pages"
        );
    }

    #[test]
    fn requests_carry_token_and_agent() {
        let server = MockServer::start(vec![json_response(200, "{}")]);
        let course = Course::connect(&server.url, "sekrit", 1).unwrap();

        let _: serde_json::Value = course.get_json(&course.course_url("pages/home")).unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].header("authorization"), Some("Bearer sekrit"));
        assert!(requests[0]
            .header("user-agent")
            .is_some_and(|agent| agent.starts_with("lms-docs-publish/")));
    }

    #[test]
    fn pagination_stops_on_short_batch() {
        let full_batch: Vec<u64> = (0..PER_PAGE as u64).collect();
        let server = MockServer::start(vec![
            json_response(200, &serde_json::to_string(&full_batch).unwrap()),
            json_response(200, "[1000,1001]"),
        ]);
        let course = Course::connect(&server.url, "token", 1).unwrap();

        let records: Vec<u64> = course.get_paginated(&course.course_url("pages")).unwrap();
        assert_eq!(records.len(), PER_PAGE + 2);

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].path.contains("page=1"));
        assert!(requests[0].path.contains(&format!("per_page={PER_PAGE}")));
        assert!(requests[1].path.contains("page=2"));
    }

    #[test]
    fn api_error_carries_status_and_body() {
        let body = r#"{"errors":[{"message":"The specified resource does not exist."}]}"#;
        let server = MockServer::start(vec![json_response(404, body)]);
        let course = Course::connect(&server.url, "token", 1).unwrap();

        let result: Result<serde_json::Value, Error> =
            course.get_json(&course.course_url("pages/missing"));
        match result {
            Err(Error::Api { status, message }) => {
                assert_eq!(status, 404);
                assert!(message.contains("does not exist"));
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }
}

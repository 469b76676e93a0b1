use reqwest::{blocking::multipart, header::LOCATION};
use serde::Deserialize;
use url::Url;

use crate::{client::Course, error::Error};

// -------------------------------------------------------------------------------------------------

/// A file folder as returned by the LMS.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Folder {
    pub id: i64,
    /// Path-like name rooted at the course file root, e.g. `course files/docs-assets`.
    pub full_name: String,
}

/// Pre-authorized target for a file upload, handed out by the upload request endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct UploadTarget {
    upload_url: String,
    /// Opaque form fields the storage endpoint expects alongside the file.
    #[serde(default)]
    upload_params: serde_json::Map<String, serde_json::Value>,
}

/// A stored file as returned by the LMS.
#[derive(Debug, Deserialize)]
pub(crate) struct FileRecord {
    /// Public download URL of the stored file.
    pub url: String,
}

// -------------------------------------------------------------------------------------------------

impl Course {
    /// Fetches all file folders of the course.
    pub(crate) fn list_folders(&self) -> Result<Vec<Folder>, Error> {
        self.get_paginated(&self.course_url("folders"))
    }

    /// Creates a folder below an existing parent folder.
    pub(crate) fn create_folder(&self, name: &str, parent_id: i64) -> Result<Folder, Error> {
        self.post_json(
            &self.course_url("folders"),
            &serde_json::json!({ "name": name, "parent_folder_id": parent_id }),
        )
    }

    /// Uploads a file into the given folder and returns the stored file record.
    ///
    /// Uploading is a two step handshake: the API hands out a pre-authorized upload
    /// target, then the file travels to the storage endpoint named by that target.
    /// Files with the same name are overwritten in place, so republishing a site
    /// replaces its assets instead of stacking up duplicates.
    pub(crate) fn upload_file(
        &self,
        folder_id: i64,
        name: &str,
        bytes: Vec<u8>,
    ) -> Result<FileRecord, Error> {
        let target: UploadTarget = self.post_json(
            &self.api_url(&format!("folders/{folder_id}/files")),
            &serde_json::json!({
                "name": name,
                "size": bytes.len(),
                "on_duplicate": "overwrite",
            }),
        )?;
        self.perform_upload(&target, name, bytes)
    }

    /// Pushes the file bytes to the storage endpoint named by an upload target.
    ///
    /// The storage endpoint is not part of the API: the request must not carry the
    /// bearer token, and the opaque fields of the target travel with the file as
    /// multipart form fields, file part last.
    fn perform_upload(
        &self,
        target: &UploadTarget,
        name: &str,
        bytes: Vec<u8>,
    ) -> Result<FileRecord, Error> {
        let mut form = multipart::Form::new();
        for (key, value) in &target.upload_params {
            let text = match value {
                serde_json::Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            form = form.text(key.clone(), text);
        }
        let part = multipart::Part::bytes(bytes)
            .file_name(name.to_string())
            .mime_str(content_type_for(name))?;
        form = form.part("file", part);

        let response = self
            .upload_http
            .post(&target.upload_url)
            .multipart(form)
            .send()?;
        let status = response.status();
        if status.is_redirection() {
            // the storage endpoint confirms with a redirect which must be followed
            // with the bearer token to finalize the upload
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .ok_or_else(|| Error::Upload(format!("missing redirect target for `{name}`")))?;
            let finalize = Url::parse(&target.upload_url)?.join(location)?;
            return self.get_json(finalize.as_str());
        }
        if status.is_success() {
            return Ok(response.json()?);
        }
        let message = response.text().unwrap_or_default();
        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }
}

// -------------------------------------------------------------------------------------------------

/// Media type for an asset file, derived from its file name extension.
fn content_type_for(name: &str) -> &'static str {
    let extension = name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or_default();
    match extension.to_ascii_lowercase().as_str() {
        "css" => "text/css",
        "js" => "text/javascript",
        "html" | "htm" => "text/html",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "json" => "application/json",
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

// -------------------------------------------------------------------------------------------------

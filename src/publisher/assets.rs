use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::{
    client::{files::Folder, Course},
    error::Error,
};

// -------------------------------------------------------------------------------------------------

/// Name of the folder below the course file root which receives all site assets.
pub(crate) const ASSET_FOLDER: &str = "docs-assets";

/// Path-like name of the course file root folder.
const FILE_ROOT: &str = "course files";

// -------------------------------------------------------------------------------------------------

/// Cached result of an asset upload attempt.
enum UploadOutcome {
    /// The asset is stored remotely at this public URL.
    Uploaded(String),
    Failed,
}

/// Uploads site assets and remembers where they ended up.
///
/// Every asset is uploaded at most once per run. Failed uploads are remembered too, so
/// a broken asset is reported once instead of once per referencing page, and pages
/// keep their original reference to it.
pub(crate) struct AssetStore<'a> {
    course: &'a Course,
    site_root: PathBuf,
    uploaded: HashMap<PathBuf, UploadOutcome>,
    /// Folder ids by path relative to the file root, `""` for the root itself.
    folders: HashMap<String, i64>,
    folders_seeded: bool,
}

impl<'a> AssetStore<'a> {
    pub(crate) fn new(course: &'a Course, site_root: &Path) -> Self {
        Self {
            course,
            site_root: site_root.to_path_buf(),
            uploaded: HashMap::new(),
            folders: HashMap::new(),
            folders_seeded: false,
        }
    }

    /// Uploads the file at `path` unless a previous attempt already settled it.
    ///
    /// Returns the public URL of the stored file, or `None` when the upload failed.
    /// Failures are reported and cached; they never abort the run.
    pub(crate) fn ensure_uploaded(&mut self, path: &Path) -> Option<String> {
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if let Some(outcome) = self.uploaded.get(&key) {
            return match outcome {
                UploadOutcome::Uploaded(url) => Some(url.clone()),
                UploadOutcome::Failed => None,
            };
        }

        let label = self.relative_label(&key);
        match self.upload(&key) {
            Ok(url) => {
                println!("   ↑ {label}");
                self.uploaded
                    .insert(key, UploadOutcome::Uploaded(url.clone()));
                Some(url)
            }
            Err(error) => {
                println!("   ✗ {label}: {error}");
                self.uploaded.insert(key, UploadOutcome::Failed);
                None
            }
        }
    }

    /// Uploads one file into the remote folder mirroring its directory.
    fn upload(&mut self, path: &Path) -> Result<String, Error> {
        let relative = path.strip_prefix(&self.site_root).unwrap_or(path);
        let folder_id = self.ensure_folder_chain(relative.parent())?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| Error::Upload(format!("asset has no file name: `{}`", path.display())))?;
        let bytes = fs::read(path)?;
        let record = self.course.upload_file(folder_id, &name, bytes)?;
        Ok(record.url)
    }

    /// Returns the folder id for an asset directory, creating missing folders.
    ///
    /// The chain starts at the course file root, descends into the fixed asset folder
    /// and from there mirrors the asset's directory inside the site. The remote folder
    /// listing is fetched once and kept current as folders are created.
    fn ensure_folder_chain(&mut self, rel_dir: Option<&Path>) -> Result<i64, Error> {
        if !self.folders_seeded {
            self.folders = index_folders(&self.course.list_folders()?);
            self.folders_seeded = true;
        }
        let root_id = *self
            .folders
            .get("")
            .ok_or_else(|| Error::Upload("course has no file root folder".to_string()))?;

        let mut segments = vec![ASSET_FOLDER.to_string()];
        if let Some(rel_dir) = rel_dir {
            segments.extend(
                rel_dir
                    .components()
                    .map(|component| component.as_os_str().to_string_lossy().into_owned()),
            );
        }

        let mut parent_id = root_id;
        let mut key = String::new();
        for segment in segments {
            if !key.is_empty() {
                key.push('/');
            }
            key.push_str(&segment);
            parent_id = match self.folders.get(&key) {
                Some(id) => *id,
                None => {
                    let folder = self.course.create_folder(&segment, parent_id)?;
                    self.folders.insert(key.clone(), folder.id);
                    folder.id
                }
            };
        }
        Ok(parent_id)
    }

    /// Site-relative display name of an asset, for progress output.
    fn relative_label(&self, path: &Path) -> String {
        path.strip_prefix(&self.site_root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

// -------------------------------------------------------------------------------------------------

/// Indexes folders by their path relative to the file root, `""` for the root itself.
fn index_folders(folders: &[Folder]) -> HashMap<String, i64> {
    folders
        .iter()
        .filter_map(|folder| {
            let relative = folder
                .full_name
                .strip_prefix(FILE_ROOT)
                .map(|rest| rest.trim_start_matches('/'))?;
            Some((relative.to_string(), folder.id))
        })
        .collect()
}

// -------------------------------------------------------------------------------------------------

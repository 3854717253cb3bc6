use std::path::{Component, Path, PathBuf};
use url::Url;

use crate::downloader::DownloadError;

/// Builds the absolute source URL for a document path.
///
/// The path is appended to the base as-is so a base with its own path
/// prefix keeps it, which `Url::join` would not.
pub fn source_url(base: &Url, doc: &str) -> String {
    format!("{}{}", base.as_str().trim_end_matches('/'), doc)
}

/// Maps a document path onto the output directory, mirroring the URL layout.
pub fn destination_path(base_path: &Path, doc: &str) -> Result<PathBuf, DownloadError> {
    let relative = Path::new(doc.trim_start_matches('/'));

    let mut normal = 0;
    for component in relative.components() {
        match component {
            Component::Normal(_) => normal += 1,
            Component::CurDir => {}
            _ => {
                return Err(DownloadError::InvalidPath {
                    path: doc.to_string(),
                })
            }
        }
    }
    if normal == 0 {
        return Err(DownloadError::InvalidPath {
            path: doc.to_string(),
        });
    }

    Ok(base_path.join(relative))
}

//! File input resolution
//!
//! A file input is a local path, a URL served by the local workspace server
//! (`http://localhost:<port>/workspace/<relative>`), or a remote URL.

use crate::error::PathError;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

const LOCAL_PREFIXES: [&str; 2] = ["http://localhost", "http://127.0.0.1"];
const WORKSPACE_SEGMENT: &str = "/workspace/";

/// Where a file input points
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "location", rename_all = "snake_case")]
pub enum FileLocation {
    /// File on the local filesystem
    Local(PathBuf),
    /// File reachable only over http(s); must be downloaded first
    Remote(String),
}

impl FileLocation {
    /// Local path, or [`PathError::Remote`]
    ///
    /// # Errors
    /// Returns error for remote locations
    pub fn into_local(self) -> Result<PathBuf, PathError> {
        match self {
            Self::Local(path) => Ok(path),
            Self::Remote(url) => Err(PathError::Remote(url)),
        }
    }
}

/// Classify a file input
///
/// Local workspace URLs map into `workspace`; the query string is dropped and
/// `.`/`..` segments are folded.
///
/// # Errors
/// Returns [`PathError::Empty`] for a blank input
pub fn resolve_file_input(input: &str, workspace: &Path) -> Result<FileLocation, PathError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(PathError::Empty);
    }

    if LOCAL_PREFIXES.iter().any(|p| input.starts_with(p)) {
        let without_query = input.split('?').next().unwrap_or(input);
        if let Some((_, relative)) = without_query.split_once(WORKSPACE_SEGMENT) {
            let resolved = fold_dots(&workspace.join(relative));
            tracing::info!("resolved workspace url to {}", resolved.display());
            return Ok(FileLocation::Local(resolved));
        }
    }

    if input.starts_with("http://") || input.starts_with("https://") {
        return Ok(FileLocation::Remote(input.to_string()));
    }

    Ok(FileLocation::Local(PathBuf::from(input)))
}

/// Lexically remove `.` and `..` components
fn fold_dots(path: &Path) -> PathBuf {
    let mut folded = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                folded.pop();
            }
            other => folded.push(other.as_os_str()),
        }
    }
    folded
}

/// Name and size of an existing file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    /// Full path
    pub path: PathBuf,
    /// Final path component
    pub file_name: String,
    /// Size in bytes
    pub size: u64,
}

impl FileInfo {
    /// Stat a file
    ///
    /// # Errors
    /// Returns [`PathError::NotFound`] if nothing exists at `path`
    pub fn inspect(path: &Path) -> Result<Self, PathError> {
        if !path.exists() {
            return Err(PathError::NotFound(path.to_path_buf()));
        }
        let metadata = std::fs::metadata(path).map_err(|source| PathError::Inspect {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            size: metadata.len(),
        })
    }
}

/// MIME type guessed from the file extension
#[must_use]
pub fn guess_content_type(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "exr" => "image/x-exr",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "pdf" => "application/pdf",
        "json" => "application/json",
        "txt" => "text/plain",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

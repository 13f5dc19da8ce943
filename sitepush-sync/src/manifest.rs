//! Local manifest: the authoritative file set for a sync.
//!
//! A [`Manifest`] is an ordered list of [`LocalFile`]s whose keys form a set.
//! [`scan_dir`] builds one from a directory tree; callers with their own
//! enumeration can build one with [`Manifest::new`].

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Component, Path};

use bytes::Bytes;
use walkdir::WalkDir;

use crate::error::{io_err, SyncError};
use crate::fingerprint::Fingerprint;

/// A single local artifact to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Remote key, `/`-separated, relative to the site root.
    pub path: String,
    /// Lowercase hex MD5 of `content`.
    pub hash16: String,
    /// Base64 MD5 of `content`, sent as `Content-MD5`.
    pub hash64: String,
    pub content_type: String,
    pub content: Bytes,
}

impl LocalFile {
    /// Build a file, computing both fingerprints from `content`.
    pub fn new(
        path: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        let content = content.into();
        let Fingerprint { hash16, hash64 } = Fingerprint::of(&content);
        Self {
            path: path.into(),
            hash16,
            hash64,
            content_type: content_type.into(),
            content,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    files: Vec<LocalFile>,
}

impl Manifest {
    /// Returns `SyncError::DuplicateKey` if two files share a path.
    pub fn new(files: Vec<LocalFile>) -> Result<Self, SyncError> {
        let mut seen = HashSet::with_capacity(files.len());
        for file in &files {
            if !seen.insert(file.path.as_str()) {
                return Err(SyncError::DuplicateKey {
                    key: file.path.clone(),
                });
            }
        }
        Ok(Self { files })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LocalFile> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a LocalFile;
    type IntoIter = std::slice::Iter<'a, LocalFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

/// Walk `root` and fingerprint every regular file under it.
///
/// Keys are relative to `root` with `/` separators; the manifest is ordered
/// by key. Symlinks are followed.
pub fn scan_dir(root: &Path) -> Result<Manifest, SyncError> {
    if !root.is_dir() {
        return Err(io_err(
            root,
            std::io::Error::new(ErrorKind::NotFound, "site directory does not exist"),
        ));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|source| SyncError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let key = object_key(root, path)?;
        let content = std::fs::read(path).map_err(|e| io_err(path, e))?;
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();
        tracing::debug!("scanned: {key} ({content_type}, {} bytes)", content.len());
        files.push(LocalFile::new(key, content_type, content));
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Manifest::new(files)
}

fn object_key(root: &Path, path: &Path) -> Result<String, SyncError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| SyncError::OutsideRoot {
            root: root.to_path_buf(),
            path: path.to_path_buf(),
        })?;
    let non_utf8 = || SyncError::NonUtf8Path {
        path: path.to_path_buf(),
    };
    let mut parts = Vec::new();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            parts.push(part.to_str().ok_or_else(non_utf8)?);
        }
    }
    Ok(parts.join("/"))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

use std::path::{Path, PathBuf};

use sanitize_filename::sanitize;

use crate::error::Error;
use crate::storage::Root;

/// A directory identifier validated against the root, ready to be archived.
#[derive(Clone, Debug)]
pub struct ArchiveRequest {
    identifier: String,
    path: PathBuf,
    filename: String,
}

impl ArchiveRequest {
    pub async fn resolve(root: &Root, identifier: &str, extension: &str) -> Result<Self, Error> {
        let path = root.resolve(identifier).await?;
        Ok(Self {
            identifier: identifier.to_owned(),
            path,
            filename: filename(identifier, extension),
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }
}

fn filename(identifier: &str, extension: &str) -> String {
    let mut stem = sanitize(identifier);
    if stem.is_empty() {
        stem = "archive".to_owned();
    }
    if extension.is_empty() {
        stem
    } else {
        format!("{}.{}", stem, extension)
    }
}

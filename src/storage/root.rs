use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use crate::error::resolve as ResolveError;
use crate::error::Error;

/// Directory under which every archive identifier is resolved.
///
/// The path is canonical, so the prefix check done in [`Root::resolve`] cannot
/// be fooled by `..` components or symbolic links.
#[derive(Clone, Debug)]
pub struct Root(PathBuf);

impl Root {
    pub async fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = tokio::fs::canonicalize(path).await?;
        if !tokio::fs::metadata(&path).await?.is_dir() {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                format!("{} is not a directory", path.display()),
            ));
        }
        Ok(Self(path))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub async fn resolve(&self, identifier: &str) -> Result<PathBuf, Error> {
        if !valid_identifier(identifier) {
            return Err(ResolveError::InvalidIdentifier);
        }

        // Anything preventing canonicalization (missing entry, dangling link,
        // permission) is reported the same way.
        let path = tokio::fs::canonicalize(self.0.join(identifier))
            .await
            .map_err(|_| ResolveError::NotFound)?;
        if path == self.0 || !path.starts_with(&self.0) {
            return Err(ResolveError::InvalidIdentifier);
        }

        match tokio::fs::metadata(&path).await {
            Ok(md) if md.is_dir() => Ok(path),
            _ => Err(ResolveError::NotFound),
        }
    }
}

// Single path component, not hidden.
fn valid_identifier(identifier: &str) -> bool {
    !identifier.is_empty()
        && !identifier.starts_with('.')
        && !identifier.contains(['/', '\\', '\0'])
}

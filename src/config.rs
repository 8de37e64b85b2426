use std::time::Duration;

use hyper::http::HeaderValue;

use crate::archive::process::Archiver;
use crate::storage::Root;

/// Everything the archive endpoint needs, built once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub root: Root,
    pub archiver: Archiver,
    pub chunk_size: usize,
    pub timeout: Duration,
    pub extension: String,
    pub content_type: HeaderValue,
}

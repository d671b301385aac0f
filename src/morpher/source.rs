//! Transport seam for parameter assets.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;

use crate::{Error, Result};

/// Delivers the raw bytes of a named asset (the manifest or a parameter blob).
///
/// Fetching bytes over a network, from disk, or from an embedded bundle is the
/// implementor's concern; the decoder only sees the bytes. Fetches for
/// different names may run concurrently and complete in any order.
pub trait ParameterSource: Send + Sync + 'static {
    /// Fetch the complete contents of `name`.
    fn fetch(&self, name: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Reads assets from a directory with `tokio::fs`
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    /// Serve assets from `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory assets are read from
    #[must_use]
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl ParameterSource for FileSource {
    async fn fetch(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.root.join(name);
        tokio::fs::read(&path).await.map_err(|e| Error::io(path, e))
    }
}

/// Serves assets held in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    assets: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    /// An empty source
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an asset.
    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.assets.insert(name.into(), bytes);
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(name, bytes);
        self
    }
}

impl ParameterSource for MemorySource {
    async fn fetch(&self, name: &str) -> Result<Vec<u8>> {
        self.assets.get(name).cloned().ok_or_else(|| Error::load(name, "asset not found"))
    }
}

//! Static file deployment into a bucket

use crate::graph::{BucketRef, DistributionRef};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// Where a deployed object's bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceContent {
    /// Literal file body
    Inline(String),
    /// File on disk identified by its SHA-256 digest
    Asset { path: PathBuf, sha256: String },
}

/// One object to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Object key, always starting with `/`
    pub destination: String,
    pub content: SourceContent,
}

impl Source {
    /// Upload `content` as the object at `destination`
    pub fn data(destination: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            content: SourceContent::Inline(content.into()),
        }
    }

    /// Upload the file at `path`, pinned to the given content hash
    pub fn asset(
        destination: impl Into<String>,
        path: impl Into<PathBuf>,
        sha256: impl Into<String>,
    ) -> Self {
        Self {
            destination: destination.into(),
            content: SourceContent::Asset {
                path: path.into(),
                sha256: sha256.into(),
            },
        }
    }

    /// Hex SHA-256 of the object body
    pub fn content_hash(&self) -> String {
        match &self.content {
            SourceContent::Inline(body) => sha256_hex(body.as_bytes()),
            SourceContent::Asset { sha256, .. } => sha256.to_ascii_lowercase(),
        }
    }

    /// Object key without the leading slash
    pub fn object_key(&self) -> &str {
        self.destination.trim_start_matches('/')
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// `/` followed by plain segments: no empty, `.` or `..` segment and no backslash
pub(crate) fn is_object_path(destination: &str) -> bool {
    let Some(key) = destination.strip_prefix('/') else {
        return false;
    };
    !key.is_empty()
        && !key.contains('\\')
        && key.split('/').all(|s| !s.is_empty() && s != "." && s != "..")
}

pub(crate) fn is_sha256_hex(value: &str) -> bool {
    value.len() == 64 && value.chars().all(|c| c.is_ascii_hexdigit())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentProps {
    pub sources: Vec<Source>,
    pub destination_bucket: BucketRef,

    /// Distribution to invalidate after upload
    pub distribution: Option<DistributionRef>,

    /// Path globs to invalidate
    pub distribution_paths: Vec<String>,
}

impl DeploymentProps {
    pub fn new(destination_bucket: &BucketRef) -> Self {
        Self {
            sources: Vec::new(),
            destination_bucket: destination_bucket.clone(),
            distribution: None,
            distribution_paths: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.sources.push(source);
        self
    }

    /// Invalidate `paths` on `distribution` once the upload finishes
    pub fn with_invalidation(
        mut self,
        distribution: &DistributionRef,
        paths: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.distribution = Some(distribution.clone());
        self.distribution_paths = paths.into_iter().map(Into::into).collect();
        self
    }
}

/// A declared deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentAction {
    pub logical_id: String,
    pub props: DeploymentProps,
}

impl DeploymentAction {
    pub fn destinations(&self) -> impl Iterator<Item = &str> {
        self.props.sources.iter().map(|s| s.destination.as_str())
    }
}

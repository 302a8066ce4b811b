//! Synthesized assembly: template plus the assets it refers to

use crate::graph::ResourceGraph;
use crate::model::{SourceContent, sha256_hex};
use crate::template;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const MANIFEST_VERSION: u32 = 1;
pub const MANIFEST_FILE: &str = "manifest.json";

/// Bytes behind an asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    Inline(String),
    File(PathBuf),
}

/// One file staged for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Deployment the asset belongs to
    pub deployment: String,

    /// Hex SHA-256 of the content
    pub hash: String,

    /// Destination object path (e.g. "/index.html")
    pub destination: String,

    pub source: AssetSource,
}

impl Asset {
    /// Path of the staged file, relative to the output directory
    pub fn staged_path(&self) -> PathBuf {
        PathBuf::from(format!("asset.{}", self.hash))
            .join(self.destination.trim_start_matches('/'))
    }
}

/// Template and assets of one stack
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    pub stack_name: String,
    pub environment: String,
    pub template: serde_json::Value,
    pub assets: Vec<Asset>,
}

impl Assembly {
    pub fn from_graph(graph: &ResourceGraph) -> Self {
        let assets = graph
            .deployments()
            .flat_map(|deployment| {
                deployment.props.sources.iter().map(move |source| Asset {
                    deployment: deployment.logical_id.clone(),
                    hash: source.content_hash(),
                    destination: source.destination.clone(),
                    source: match &source.content {
                        SourceContent::Inline(body) => AssetSource::Inline(body.clone()),
                        SourceContent::Asset { path, .. } => AssetSource::File(path.clone()),
                    },
                })
            })
            .collect();

        Self {
            stack_name: graph.stack_name().to_string(),
            environment: graph.environment().to_string(),
            template: template::synthesize(graph),
            assets,
        }
    }

    pub fn template_file_name(&self) -> String {
        format!("{}.template.json", self.stack_name)
    }

    pub fn template_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.template)
    }

    pub fn manifest(&self) -> serde_json::Result<Manifest> {
        Ok(Manifest {
            version: MANIFEST_VERSION,
            stack_name: self.stack_name.clone(),
            environment: self.environment.clone(),
            template_file: self.template_file_name(),
            template_hash: sha256_hex(self.template_json()?.as_bytes()),
            assets: self
                .assets
                .iter()
                .map(|a| ManifestAsset {
                    deployment: a.deployment.clone(),
                    hash: a.hash.clone(),
                    destination: a.destination.clone(),
                    path: a.staged_path().to_string_lossy().into_owned(),
                })
                .collect(),
        })
    }
}

/// `manifest.json` written next to the template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub version: u32,
    pub stack_name: String,
    pub environment: String,
    pub template_file: String,
    pub template_hash: String,
    pub assets: Vec<ManifestAsset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestAsset {
    pub deployment: String,
    pub hash: String,
    pub destination: String,
    pub path: String,
}

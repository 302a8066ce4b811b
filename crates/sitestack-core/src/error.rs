//! Declaration and engine error types

use crate::graph::ResourceKind;
use thiserror::Error;

/// Errors raised while declaring a stack.
///
/// Every variant names the offending resource (its logical id) and the field
/// that failed, so a rejected declaration can be fixed without reading the
/// synthesized template.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeclarationError {
    #[error("{resource}.{field}: reference to undeclared {kind} '{target}'")]
    UnresolvedReference {
        resource: String,
        field: &'static str,
        kind: ResourceKind,
        target: String,
    },

    #[error("{resource}.{field}: must not be empty")]
    EmptyField {
        resource: String,
        field: &'static str,
    },

    #[error("{resource}: logical id is already declared in this stack")]
    DuplicateLogicalId { resource: String },

    #[error("{resource}.{field}: invalid value '{value}' ({reason})")]
    InvalidValue {
        resource: String,
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{resource}.sources: duplicate destination path '{path}'")]
    DuplicateDestination { resource: String, path: String },

    #[error("{resource}.resources: '{pattern}' grants bucket-level access, use '{pattern}/*'")]
    BucketLevelGrant { resource: String, pattern: String },

    #[error("{resource}.defaultBehavior.viewerProtocolPolicy: allow-all serves plain HTTP")]
    InsecureViewerProtocol { resource: String },

    #[error(
        "{resource}.defaultBehavior.origin: bucket '{bucket}' has no policy granting s3:GetObject to '{identity}'"
    )]
    OriginNotGranted {
        resource: String,
        bucket: String,
        identity: String,
    },
}

impl DeclarationError {
    /// Logical id of the resource the error is about
    pub fn resource(&self) -> &str {
        match self {
            DeclarationError::UnresolvedReference { resource, .. }
            | DeclarationError::EmptyField { resource, .. }
            | DeclarationError::DuplicateLogicalId { resource }
            | DeclarationError::InvalidValue { resource, .. }
            | DeclarationError::DuplicateDestination { resource, .. }
            | DeclarationError::BucketLevelGrant { resource, .. }
            | DeclarationError::InsecureViewerProtocol { resource }
            | DeclarationError::OriginNotGranted { resource, .. } => resource,
        }
    }
}

/// Provisioning engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid declaration: {0}")]
    Declaration(#[from] DeclarationError),

    #[error("Stack not found: {0}")]
    StackNotFound(String),

    #[error("Asset error: {0}")]
    Asset(String),

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

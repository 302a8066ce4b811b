//! CDN origin access identity

/// Principal the distribution uses to read a private bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessIdentity {
    pub logical_id: String,

    /// Human readable comment shown in the provider console
    pub comment: String,
}

impl AccessIdentity {
    /// Symbolic canonical user id, resolved by the provisioning engine
    pub fn canonical_user_id(&self) -> String {
        format!("${{{}.S3CanonicalUserId}}", self.logical_id)
    }
}

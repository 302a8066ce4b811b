//! Bucket access policy statements

use super::bucket::bucket_arn;
use crate::graph::{BucketRef, IdentityRef};

/// Object read permission required by a CDN origin
pub const S3_GET_OBJECT: &str = "s3:GetObject";

/// Policy document language version
pub const POLICY_VERSION: &str = "2012-10-17";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Allow => "Allow",
            Effect::Deny => "Deny",
        }
    }
}

/// Who a statement applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// Canonical user of an origin access identity
    CanonicalUser(IdentityRef),
}

impl Principal {
    pub fn canonical_user(identity: &IdentityRef) -> Self {
        Principal::CanonicalUser(identity.clone())
    }
}

/// What a statement applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyResource {
    /// The bucket itself (`<bucket-arn>`)
    Bucket(BucketRef),
    /// Every object in the bucket (`<bucket-arn>/*`)
    Objects(BucketRef),
}

impl PolicyResource {
    pub fn objects_of(bucket: &BucketRef) -> Self {
        PolicyResource::Objects(bucket.clone())
    }

    pub fn bucket(bucket: &BucketRef) -> Self {
        PolicyResource::Bucket(bucket.clone())
    }

    pub fn bucket_ref(&self) -> &BucketRef {
        match self {
            PolicyResource::Bucket(bucket) | PolicyResource::Objects(bucket) => bucket,
        }
    }

    /// ARN pattern with the bucket ARN left symbolic
    pub fn pattern(&self) -> String {
        match self {
            PolicyResource::Bucket(bucket) => bucket_arn(bucket.logical_id()),
            PolicyResource::Objects(bucket) => format!("{}/*", bucket_arn(bucket.logical_id())),
        }
    }
}

/// A single statement of a bucket policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyStatement {
    pub actions: Vec<String>,
    pub effect: Effect,
    pub principals: Vec<Principal>,
    pub resources: Vec<PolicyResource>,
}

impl PolicyStatement {
    pub fn new(effect: Effect) -> Self {
        Self {
            actions: Vec::new(),
            effect,
            principals: Vec::new(),
            resources: Vec::new(),
        }
    }

    pub fn allow() -> Self {
        Self::new(Effect::Allow)
    }

    pub fn deny() -> Self {
        Self::new(Effect::Deny)
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.actions.push(action.into());
        self
    }

    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principals.push(principal);
        self
    }

    pub fn with_resource(mut self, resource: PolicyResource) -> Self {
        self.resources.push(resource);
        self
    }

    /// Whether the statement covers object reads
    pub fn includes_object_read(&self) -> bool {
        self.actions
            .iter()
            .any(|a| a == S3_GET_OBJECT || a == "s3:*" || a == "*")
    }

    /// Whether the statement lets `identity` read every object of `bucket`
    pub fn grants_object_read(&self, bucket: &BucketRef, identity: &IdentityRef) -> bool {
        self.effect == Effect::Allow
            && self.includes_object_read()
            && self
                .principals
                .iter()
                .any(|p| matches!(p, Principal::CanonicalUser(id) if id == identity))
            && self
                .resources
                .iter()
                .any(|r| matches!(r, PolicyResource::Objects(b) if b == bucket))
    }
}

/// Resource policy attached to a bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketPolicy {
    pub logical_id: String,
    pub bucket: BucketRef,
    pub statements: Vec<PolicyStatement>,
}

impl BucketPolicy {
    pub fn grants_object_read(&self, identity: &IdentityRef) -> bool {
        self.statements
            .iter()
            .any(|s| s.grants_object_read(&self.bucket, identity))
    }
}

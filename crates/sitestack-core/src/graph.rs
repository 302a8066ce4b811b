//! Immutable resource graph produced by a stack declaration

use crate::environment::Environment;
use crate::model::{AccessIdentity, Bucket, BucketPolicy, DeploymentAction, Distribution};

macro_rules! resource_ref {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(String);

        impl $name {
            /// Reference a resource by logical id.
            ///
            /// The reference is only checked when it is used in a declaration.
            pub fn named(logical_id: impl Into<String>) -> Self {
                Self(logical_id.into())
            }

            pub fn logical_id(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

resource_ref!(
    /// Handle to a declared bucket
    BucketRef
);
resource_ref!(
    /// Handle to a declared origin access identity
    IdentityRef
);
resource_ref!(
    /// Handle to a declared distribution
    DistributionRef
);

/// Kind of a declared resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Bucket,
    OriginAccessIdentity,
    BucketPolicy,
    Distribution,
    BucketDeployment,
}

impl ResourceKind {
    /// Resource type name in the synthesized template
    pub fn template_type(&self) -> &'static str {
        match self {
            ResourceKind::Bucket => "AWS::S3::Bucket",
            ResourceKind::OriginAccessIdentity => "AWS::CloudFront::CloudFrontOriginAccessIdentity",
            ResourceKind::BucketPolicy => "AWS::S3::BucketPolicy",
            ResourceKind::Distribution => "AWS::CloudFront::Distribution",
            ResourceKind::BucketDeployment => "Custom::CDKBucketDeployment",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Bucket => write!(f, "bucket"),
            ResourceKind::OriginAccessIdentity => write!(f, "origin-access-identity"),
            ResourceKind::BucketPolicy => write!(f, "bucket-policy"),
            ResourceKind::Distribution => write!(f, "distribution"),
            ResourceKind::BucketDeployment => write!(f, "bucket-deployment"),
        }
    }
}

/// A declared resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Bucket(Bucket),
    OriginAccessIdentity(AccessIdentity),
    BucketPolicy(BucketPolicy),
    Distribution(Distribution),
    BucketDeployment(DeploymentAction),
}

impl Resource {
    pub fn logical_id(&self) -> &str {
        match self {
            Resource::Bucket(r) => &r.logical_id,
            Resource::OriginAccessIdentity(r) => &r.logical_id,
            Resource::BucketPolicy(r) => &r.logical_id,
            Resource::Distribution(r) => &r.logical_id,
            Resource::BucketDeployment(r) => &r.logical_id,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Bucket(_) => ResourceKind::Bucket,
            Resource::OriginAccessIdentity(_) => ResourceKind::OriginAccessIdentity,
            Resource::BucketPolicy(_) => ResourceKind::BucketPolicy,
            Resource::Distribution(_) => ResourceKind::Distribution,
            Resource::BucketDeployment(_) => ResourceKind::BucketDeployment,
        }
    }
}

/// Fully wired, validated description of a stack.
///
/// Resources are kept in declaration order; a resource only ever references
/// resources that precede it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceGraph {
    pub(crate) scope: String,
    pub(crate) stack_name: String,
    pub(crate) environment: Environment,
    pub(crate) resources: Vec<Resource>,
}

impl ResourceGraph {
    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Resource kinds in creation order
    pub fn kinds(&self) -> Vec<ResourceKind> {
        self.resources.iter().map(Resource::kind).collect()
    }

    pub fn get(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.logical_id() == logical_id)
    }

    pub fn buckets(&self) -> impl Iterator<Item = &Bucket> {
        self.resources.iter().filter_map(|r| match r {
            Resource::Bucket(b) => Some(b),
            _ => None,
        })
    }

    pub fn identities(&self) -> impl Iterator<Item = &AccessIdentity> {
        self.resources.iter().filter_map(|r| match r {
            Resource::OriginAccessIdentity(i) => Some(i),
            _ => None,
        })
    }

    pub fn bucket_policies(&self) -> impl Iterator<Item = &BucketPolicy> {
        self.resources.iter().filter_map(|r| match r {
            Resource::BucketPolicy(p) => Some(p),
            _ => None,
        })
    }

    pub fn distributions(&self) -> impl Iterator<Item = &Distribution> {
        self.resources.iter().filter_map(|r| match r {
            Resource::Distribution(d) => Some(d),
            _ => None,
        })
    }

    pub fn deployments(&self) -> impl Iterator<Item = &DeploymentAction> {
        self.resources.iter().filter_map(|r| match r {
            Resource::BucketDeployment(d) => Some(d),
            _ => None,
        })
    }

    /// Policy attached to `bucket`, if any
    pub fn policy_of(&self, bucket: &BucketRef) -> Option<&BucketPolicy> {
        self.bucket_policies().find(|p| &p.bucket == bucket)
    }

    /// Logical ids `resource` must be created after
    pub fn dependencies_of(&self, resource: &Resource) -> Vec<String> {
        let mut deps: Vec<String> = match resource {
            Resource::Bucket(_) | Resource::OriginAccessIdentity(_) => Vec::new(),
            Resource::BucketPolicy(policy) => {
                let mut deps = vec![policy.bucket.logical_id().to_string()];
                for statement in &policy.statements {
                    for principal in &statement.principals {
                        let crate::model::Principal::CanonicalUser(identity) = principal;
                        deps.push(identity.logical_id().to_string());
                    }
                }
                deps
            }
            Resource::Distribution(distribution) => {
                let origin = &distribution.props.default_behavior.origin;
                let mut deps = vec![
                    origin.bucket.logical_id().to_string(),
                    origin.identity.logical_id().to_string(),
                ];
                if let Some(policy) = self.policy_of(&origin.bucket) {
                    deps.push(policy.logical_id.clone());
                }
                deps
            }
            Resource::BucketDeployment(deployment) => {
                let mut deps = vec![deployment.props.destination_bucket.logical_id().to_string()];
                if let Some(distribution) = &deployment.props.distribution {
                    deps.push(distribution.logical_id().to_string());
                }
                deps
            }
        };
        deps.sort();
        deps.dedup();
        deps
    }
}

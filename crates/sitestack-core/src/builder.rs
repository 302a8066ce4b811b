//! Stack builder
//!
//! Resources are declared one at a time. Each declaration is validated
//! against the resources declared before it, so a reference can only point
//! backwards and the finished graph never contains a dangling reference.

use crate::environment::Environment;
use crate::error::DeclarationError;
use crate::graph::{BucketRef, DistributionRef, IdentityRef, Resource, ResourceGraph, ResourceKind};
use crate::model::{
    AccessIdentity, AllowedMethods, Bucket, BucketPolicy, BucketProps, CachePolicy, CachedMethods,
    DeploymentAction, DeploymentProps, Distribution, DistributionProps, PolicyResource,
    PolicyStatement, Principal, RemovalPolicy, SourceContent, ViewerProtocolPolicy,
};
use std::collections::HashSet;

type Result<T> = std::result::Result<T, DeclarationError>;

/// Invalidation glob used when a distribution is given without paths
pub const INVALIDATE_ALL: &str = "/*";

const MAX_LOGICAL_ID_LEN: usize = 255;
const MAX_STACK_NAME_LEN: usize = 128;
const MAX_COMMENT_LEN: usize = 128;

/// Collects resource declarations for one stack
#[derive(Debug)]
pub struct StackBuilder {
    scope: String,
    stack_name: String,
    environment: Environment,
    resources: Vec<Resource>,
}

impl StackBuilder {
    pub fn new(
        scope: impl Into<String>,
        stack_name: impl Into<String>,
        environment: Environment,
    ) -> Result<Self> {
        let scope = scope.into();
        let stack_name = stack_name.into();

        if stack_name.is_empty() {
            return Err(DeclarationError::EmptyField {
                resource: scope,
                field: "stackName",
            });
        }
        if !is_valid_stack_name(&stack_name) {
            return Err(DeclarationError::InvalidValue {
                resource: stack_name.clone(),
                field: "stackName",
                value: stack_name,
                reason: "must start with a letter and contain only letters, digits and '-'"
                    .to_string(),
            });
        }
        for (field, value) in [
            ("account", &environment.account),
            ("region", &environment.region),
        ] {
            if value.as_deref().is_some_and(str::is_empty) {
                return Err(DeclarationError::EmptyField {
                    resource: stack_name,
                    field,
                });
            }
        }

        Ok(Self {
            scope,
            stack_name,
            environment,
            resources: Vec::new(),
        })
    }

    /// Declare an object storage bucket
    pub fn bucket(&mut self, logical_id: impl Into<String>, props: BucketProps) -> Result<BucketRef> {
        let logical_id = self.claim_logical_id(logical_id.into())?;

        if props.auto_delete_objects && props.removal_policy != RemovalPolicy::Destroy {
            return Err(DeclarationError::InvalidValue {
                resource: logical_id,
                field: "autoDeleteObjects",
                value: "true".to_string(),
                reason: format!(
                    "requires removal policy destroy, got {}",
                    props.removal_policy
                ),
            });
        }

        tracing::debug!(
            "Declared bucket {} (removal policy: {})",
            logical_id,
            props.removal_policy
        );
        self.resources.push(Resource::Bucket(Bucket {
            logical_id: logical_id.clone(),
            props,
        }));
        Ok(BucketRef::named(logical_id))
    }

    /// Declare an origin access identity
    pub fn origin_access_identity(
        &mut self,
        logical_id: impl Into<String>,
        comment: impl Into<String>,
    ) -> Result<IdentityRef> {
        let logical_id = self.claim_logical_id(logical_id.into())?;
        let comment = comment.into();
        check_comment(&logical_id, "comment", &comment)?;

        tracing::debug!("Declared origin access identity {}", logical_id);
        self.resources
            .push(Resource::OriginAccessIdentity(AccessIdentity {
                logical_id: logical_id.clone(),
                comment,
            }));
        Ok(IdentityRef::named(logical_id))
    }

    /// Attach `statement` to the resource policy of `bucket`.
    ///
    /// The first statement for a bucket declares its policy resource
    /// (`<bucket>Policy`); later statements are appended to it.
    pub fn add_to_resource_policy(
        &mut self,
        bucket: &BucketRef,
        statement: PolicyStatement,
    ) -> Result<()> {
        let policy_id = format!("{}Policy", bucket.logical_id());

        self.resolve(&policy_id, "bucket", ResourceKind::Bucket, bucket.logical_id())?;

        if statement.actions.is_empty() {
            return Err(DeclarationError::EmptyField {
                resource: policy_id,
                field: "actions",
            });
        }
        if let Some(action) = statement
            .actions
            .iter()
            .find(|a| a.as_str() != "*" && !a.contains(':'))
        {
            return Err(DeclarationError::InvalidValue {
                resource: policy_id,
                field: "actions",
                value: action.clone(),
                reason: "expected '<service>:<action>'".to_string(),
            });
        }
        if !statement.includes_object_read() {
            return Err(DeclarationError::InvalidValue {
                resource: policy_id,
                field: "actions",
                value: statement.actions.join(","),
                reason: format!("must include {}", crate::model::S3_GET_OBJECT),
            });
        }

        if statement.principals.is_empty() {
            return Err(DeclarationError::EmptyField {
                resource: policy_id,
                field: "principals",
            });
        }
        for principal in &statement.principals {
            let Principal::CanonicalUser(identity) = principal;
            self.resolve(
                &policy_id,
                "principals",
                ResourceKind::OriginAccessIdentity,
                identity.logical_id(),
            )?;
        }

        if statement.resources.is_empty() {
            return Err(DeclarationError::EmptyField {
                resource: policy_id,
                field: "resources",
            });
        }
        for resource in &statement.resources {
            match resource {
                PolicyResource::Bucket(_) => {
                    return Err(DeclarationError::BucketLevelGrant {
                        resource: policy_id,
                        pattern: resource.pattern(),
                    });
                }
                PolicyResource::Objects(target) if target != bucket => {
                    return Err(DeclarationError::InvalidValue {
                        resource: policy_id,
                        field: "resources",
                        value: resource.pattern(),
                        reason: format!("must target objects of '{}'", bucket),
                    });
                }
                PolicyResource::Objects(_) => {}
            }
        }

        let existing = self.resources.iter_mut().find_map(|r| match r {
            Resource::BucketPolicy(p) if &p.bucket == bucket => Some(p),
            _ => None,
        });
        match existing {
            Some(policy) => {
                policy.statements.push(statement);
                tracing::debug!(
                    "Appended statement to {} ({} statements)",
                    policy.logical_id,
                    policy.statements.len()
                );
            }
            None => {
                let policy_id = self.claim_logical_id(policy_id)?;
                tracing::debug!("Declared bucket policy {}", policy_id);
                self.resources.push(Resource::BucketPolicy(BucketPolicy {
                    logical_id: policy_id,
                    bucket: bucket.clone(),
                    statements: vec![statement],
                }));
            }
        }
        Ok(())
    }

    /// Declare a distribution in front of a private bucket
    pub fn distribution(
        &mut self,
        logical_id: impl Into<String>,
        props: DistributionProps,
    ) -> Result<DistributionRef> {
        let logical_id = self.claim_logical_id(logical_id.into())?;
        let behavior = &props.default_behavior;
        let origin = &behavior.origin;

        self.resolve(
            &logical_id,
            "defaultBehavior.origin.bucket",
            ResourceKind::Bucket,
            origin.bucket.logical_id(),
        )?;
        self.resolve(
            &logical_id,
            "defaultBehavior.origin.originAccessIdentity",
            ResourceKind::OriginAccessIdentity,
            origin.identity.logical_id(),
        )?;
        let granted = self
            .resources
            .iter()
            .any(|r| matches!(r, Resource::BucketPolicy(p) if p.bucket == origin.bucket && p.grants_object_read(&origin.identity)));
        if !granted {
            return Err(DeclarationError::OriginNotGranted {
                resource: logical_id,
                bucket: origin.bucket.to_string(),
                identity: origin.identity.to_string(),
            });
        }

        if behavior.viewer_protocol_policy == ViewerProtocolPolicy::AllowAll {
            return Err(DeclarationError::InsecureViewerProtocol {
                resource: logical_id,
            });
        }
        if behavior.cached_methods == CachedMethods::GetHeadOptions
            && behavior.allowed_methods == AllowedMethods::GetHead
        {
            return Err(DeclarationError::InvalidValue {
                resource: logical_id,
                field: "defaultBehavior.cachedMethods",
                value: behavior.cached_methods.methods().join(","),
                reason: "cached methods must be a subset of allowed methods".to_string(),
            });
        }
        if let CachePolicy::Custom(id) = &behavior.cache_policy {
            if id.is_empty() {
                return Err(DeclarationError::EmptyField {
                    resource: logical_id,
                    field: "defaultBehavior.cachePolicy",
                });
            }
        }

        if let Some(comment) = &props.comment {
            check_comment(&logical_id, "comment", comment)?;
        }
        if let Some(root) = &props.default_root_object {
            if root.is_empty() {
                return Err(DeclarationError::EmptyField {
                    resource: logical_id,
                    field: "defaultRootObject",
                });
            }
            if root.starts_with('/') {
                return Err(DeclarationError::InvalidValue {
                    resource: logical_id,
                    field: "defaultRootObject",
                    value: root.clone(),
                    reason: "must be an object key without a leading '/'".to_string(),
                });
            }
        }

        let mut statuses = HashSet::new();
        for response in &props.error_responses {
            if !(400..=599).contains(&response.http_status) {
                return Err(DeclarationError::InvalidValue {
                    resource: logical_id,
                    field: "errorResponses.httpStatus",
                    value: response.http_status.to_string(),
                    reason: "must be a 4xx or 5xx status".to_string(),
                });
            }
            if !statuses.insert(response.http_status) {
                return Err(DeclarationError::InvalidValue {
                    resource: logical_id,
                    field: "errorResponses.httpStatus",
                    value: response.http_status.to_string(),
                    reason: "declared more than once".to_string(),
                });
            }
            if let Some(status) = response.response_http_status {
                if !(200..=599).contains(&status) {
                    return Err(DeclarationError::InvalidValue {
                        resource: logical_id,
                        field: "errorResponses.responseHttpStatus",
                        value: status.to_string(),
                        reason: "must be between 200 and 599".to_string(),
                    });
                }
            }
            if let Some(path) = &response.response_page_path {
                if !path.starts_with('/') {
                    return Err(DeclarationError::InvalidValue {
                        resource: logical_id,
                        field: "errorResponses.responsePagePath",
                        value: path.clone(),
                        reason: "must start with '/'".to_string(),
                    });
                }
                if response.response_http_status.is_none() {
                    return Err(DeclarationError::EmptyField {
                        resource: logical_id,
                        field: "errorResponses.responseHttpStatus",
                    });
                }
            }
        }

        tracing::debug!(
            "Declared distribution {} (origin: {})",
            logical_id,
            origin.bucket
        );
        self.resources.push(Resource::Distribution(Distribution {
            logical_id: logical_id.clone(),
            props,
        }));
        Ok(DistributionRef::named(logical_id))
    }

    /// Declare a one-shot upload into a bucket, optionally followed by a
    /// cache invalidation
    pub fn bucket_deployment(
        &mut self,
        logical_id: impl Into<String>,
        mut props: DeploymentProps,
    ) -> Result<()> {
        let logical_id = self.claim_logical_id(logical_id.into())?;

        self.resolve(
            &logical_id,
            "destinationBucket",
            ResourceKind::Bucket,
            props.destination_bucket.logical_id(),
        )?;

        if props.sources.is_empty() {
            return Err(DeclarationError::EmptyField {
                resource: logical_id,
                field: "sources",
            });
        }
        let mut destinations = HashSet::new();
        for source in &props.sources {
            if !crate::model::is_object_path(&source.destination) {
                return Err(DeclarationError::InvalidValue {
                    resource: logical_id,
                    field: "sources.destination",
                    value: source.destination.clone(),
                    reason: "must be an absolute object path such as '/index.html' \
                             without empty, '.' or '..' segments"
                        .to_string(),
                });
            }
            if !destinations.insert(source.object_key()) {
                return Err(DeclarationError::DuplicateDestination {
                    resource: logical_id,
                    path: source.destination.clone(),
                });
            }
            if let SourceContent::Asset { sha256, .. } = &source.content {
                if !crate::model::is_sha256_hex(sha256) {
                    return Err(DeclarationError::InvalidValue {
                        resource: logical_id,
                        field: "sources.sha256",
                        value: sha256.clone(),
                        reason: "expected 64 hex characters".to_string(),
                    });
                }
            }
        }

        match &props.distribution {
            Some(distribution) => {
                self.resolve(
                    &logical_id,
                    "distribution",
                    ResourceKind::Distribution,
                    distribution.logical_id(),
                )?;
                if props.distribution_paths.is_empty() {
                    props.distribution_paths.push(INVALIDATE_ALL.to_string());
                }
            }
            None if !props.distribution_paths.is_empty() => {
                return Err(DeclarationError::EmptyField {
                    resource: logical_id,
                    field: "distribution",
                });
            }
            None => {}
        }
        if let Some(path) = props
            .distribution_paths
            .iter()
            .find(|p| !p.starts_with('/'))
        {
            return Err(DeclarationError::InvalidValue {
                resource: logical_id,
                field: "distributionPaths",
                value: path.clone(),
                reason: "must start with '/'".to_string(),
            });
        }

        tracing::debug!(
            "Declared deployment {} ({} sources)",
            logical_id,
            props.sources.len()
        );
        self.resources
            .push(Resource::BucketDeployment(DeploymentAction {
                logical_id,
                props,
            }));
        Ok(())
    }

    /// Freeze the declarations into an immutable graph
    pub fn build(self) -> ResourceGraph {
        ResourceGraph {
            scope: self.scope,
            stack_name: self.stack_name,
            environment: self.environment,
            resources: self.resources,
        }
    }

    fn claim_logical_id(&self, logical_id: String) -> Result<String> {
        if logical_id.is_empty() {
            return Err(DeclarationError::EmptyField {
                resource: self.stack_name.clone(),
                field: "logicalId",
            });
        }
        if logical_id.len() > MAX_LOGICAL_ID_LEN
            || !logical_id.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(DeclarationError::InvalidValue {
                resource: logical_id.clone(),
                field: "logicalId",
                value: logical_id,
                reason: "must be alphanumeric and at most 255 characters".to_string(),
            });
        }
        if self.resources.iter().any(|r| r.logical_id() == logical_id) {
            return Err(DeclarationError::DuplicateLogicalId {
                resource: logical_id,
            });
        }
        Ok(logical_id)
    }

    fn resolve(
        &self,
        resource: &str,
        field: &'static str,
        kind: ResourceKind,
        target: &str,
    ) -> Result<()> {
        let declared = self
            .resources
            .iter()
            .any(|r| r.kind() == kind && r.logical_id() == target);
        if declared {
            Ok(())
        } else {
            Err(DeclarationError::UnresolvedReference {
                resource: resource.to_string(),
                field,
                kind,
                target: target.to_string(),
            })
        }
    }
}

fn is_valid_stack_name(name: &str) -> bool {
    name.len() <= MAX_STACK_NAME_LEN
        && name.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn check_comment(resource: &str, field: &'static str, comment: &str) -> Result<()> {
    if comment.is_empty() {
        return Err(DeclarationError::EmptyField {
            resource: resource.to_string(),
            field,
        });
    }
    if comment.chars().count() > MAX_COMMENT_LEN {
        return Err(DeclarationError::InvalidValue {
            resource: resource.to_string(),
            field,
            value: comment.to_string(),
            reason: format!("longer than {} characters", MAX_COMMENT_LEN),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        BehaviorOptions, ErrorResponse, S3Origin, S3_GET_OBJECT, Source,
    };
    use std::time::Duration;

    fn builder() -> StackBuilder {
        StackBuilder::new("app", "TestStack", Environment::new("123", "us-east-1")).unwrap()
    }

    fn read_statement(bucket: &BucketRef, identity: &IdentityRef) -> PolicyStatement {
        PolicyStatement::allow()
            .with_action(S3_GET_OBJECT)
            .with_principal(Principal::canonical_user(identity))
            .with_resource(PolicyResource::objects_of(bucket))
    }

    /// Bucket + identity + policy, ready for a distribution
    fn with_origin(stack: &mut StackBuilder) -> (BucketRef, IdentityRef) {
        let bucket = stack
            .bucket("Site", BucketProps::new(RemovalPolicy::Destroy))
            .unwrap();
        let identity = stack.origin_access_identity("Oai", "site").unwrap();
        stack
            .add_to_resource_policy(&bucket, read_statement(&bucket, &identity))
            .unwrap();
        (bucket, identity)
    }

    #[test]
    fn test_invalid_stack_name() {
        let err = StackBuilder::new("app", "1stack", Environment::agnostic()).unwrap_err();
        assert!(matches!(
            err,
            DeclarationError::InvalidValue { field: "stackName", .. }
        ));

        let err = StackBuilder::new("app", "", Environment::agnostic()).unwrap_err();
        assert!(matches!(
            err,
            DeclarationError::EmptyField { field: "stackName", .. }
        ));
    }

    #[test]
    fn test_empty_region_rejected() {
        let env = Environment {
            account: Some("123".to_string()),
            region: Some(String::new()),
        };
        let err = StackBuilder::new("app", "TestStack", env).unwrap_err();
        assert_eq!(
            err,
            DeclarationError::EmptyField {
                resource: "TestStack".to_string(),
                field: "region",
            }
        );
    }

    #[test]
    fn test_duplicate_logical_id() {
        let mut stack = builder();
        stack
            .bucket("Site", BucketProps::new(RemovalPolicy::Retain))
            .unwrap();
        let err = stack
            .origin_access_identity("Site", "comment")
            .unwrap_err();
        assert_eq!(
            err,
            DeclarationError::DuplicateLogicalId {
                resource: "Site".to_string()
            }
        );
    }

    #[test]
    fn test_logical_id_must_be_alphanumeric() {
        let mut stack = builder();
        let err = stack
            .bucket("my-bucket", BucketProps::new(RemovalPolicy::Retain))
            .unwrap_err();
        assert!(matches!(
            err,
            DeclarationError::InvalidValue { field: "logicalId", .. }
        ));
    }

    #[test]
    fn test_auto_delete_requires_destroy() {
        let mut stack = builder();
        let err = stack
            .bucket(
                "Site",
                BucketProps::new(RemovalPolicy::Retain).with_auto_delete_objects(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            DeclarationError::InvalidValue { field: "autoDeleteObjects", .. }
        ));
    }

    #[test]
    fn test_empty_identity_comment() {
        let mut stack = builder();
        let err = stack.origin_access_identity("Oai", "").unwrap_err();
        assert_eq!(
            err,
            DeclarationError::EmptyField {
                resource: "Oai".to_string(),
                field: "comment"
            }
        );
    }

    #[test]
    fn test_policy_without_identity_is_unresolved() {
        let mut stack = builder();
        let bucket = stack
            .bucket("Site", BucketProps::new(RemovalPolicy::Destroy))
            .unwrap();
        let identity = IdentityRef::named("Oai");

        let err = stack
            .add_to_resource_policy(&bucket, read_statement(&bucket, &identity))
            .unwrap_err();
        assert_eq!(
            err,
            DeclarationError::UnresolvedReference {
                resource: "SitePolicy".to_string(),
                field: "principals",
                kind: ResourceKind::OriginAccessIdentity,
                target: "Oai".to_string(),
            }
        );
    }

    #[test]
    fn test_policy_on_undeclared_bucket() {
        let mut stack = builder();
        let identity = stack.origin_access_identity("Oai", "site").unwrap();
        let bucket = BucketRef::named("Site");

        let err = stack
            .add_to_resource_policy(&bucket, read_statement(&bucket, &identity))
            .unwrap_err();
        assert!(matches!(
            err,
            DeclarationError::UnresolvedReference { field: "bucket", kind: ResourceKind::Bucket, .. }
        ));
    }

    #[test]
    fn test_policy_with_empty_actions() {
        let mut stack = builder();
        let bucket = stack
            .bucket("Site", BucketProps::new(RemovalPolicy::Destroy))
            .unwrap();
        let identity = stack.origin_access_identity("Oai", "site").unwrap();

        let statement = PolicyStatement::allow()
            .with_principal(Principal::canonical_user(&identity))
            .with_resource(PolicyResource::objects_of(&bucket));
        let err = stack.add_to_resource_policy(&bucket, statement).unwrap_err();
        assert_eq!(
            err,
            DeclarationError::EmptyField {
                resource: "SitePolicy".to_string(),
                field: "actions"
            }
        );
    }

    #[test]
    fn test_policy_without_object_read() {
        let mut stack = builder();
        let bucket = stack
            .bucket("Site", BucketProps::new(RemovalPolicy::Destroy))
            .unwrap();
        let identity = stack.origin_access_identity("Oai", "site").unwrap();

        let statement = PolicyStatement::allow()
            .with_action("s3:PutObject")
            .with_principal(Principal::canonical_user(&identity))
            .with_resource(PolicyResource::objects_of(&bucket));
        let err = stack.add_to_resource_policy(&bucket, statement).unwrap_err();
        assert!(matches!(
            err,
            DeclarationError::InvalidValue { field: "actions", .. }
        ));
    }

    #[test]
    fn test_policy_rejects_bucket_root() {
        let mut stack = builder();
        let bucket = stack
            .bucket("Site", BucketProps::new(RemovalPolicy::Destroy))
            .unwrap();
        let identity = stack.origin_access_identity("Oai", "site").unwrap();

        let statement = PolicyStatement::allow()
            .with_action(S3_GET_OBJECT)
            .with_principal(Principal::canonical_user(&identity))
            .with_resource(PolicyResource::bucket(&bucket));
        let err = stack.add_to_resource_policy(&bucket, statement).unwrap_err();
        assert_eq!(
            err,
            DeclarationError::BucketLevelGrant {
                resource: "SitePolicy".to_string(),
                pattern: "${Site.Arn}".to_string(),
            }
        );
    }

    #[test]
    fn test_policy_rejects_foreign_bucket() {
        let mut stack = builder();
        let bucket = stack
            .bucket("Site", BucketProps::new(RemovalPolicy::Destroy))
            .unwrap();
        let other = stack
            .bucket("Logs", BucketProps::new(RemovalPolicy::Destroy))
            .unwrap();
        let identity = stack.origin_access_identity("Oai", "site").unwrap();

        let err = stack
            .add_to_resource_policy(&bucket, read_statement(&other, &identity))
            .unwrap_err();
        assert!(matches!(
            err,
            DeclarationError::InvalidValue { field: "resources", .. }
        ));
    }

    #[test]
    fn test_second_statement_appends_to_policy() {
        let mut stack = builder();
        let (bucket, identity) = with_origin(&mut stack);
        stack
            .add_to_resource_policy(&bucket, read_statement(&bucket, &identity))
            .unwrap();

        let graph = stack.build();
        let policies: Vec<_> = graph.bucket_policies().collect();
        assert_eq!(policies.len(), 1);
        assert_eq!(policies[0].statements.len(), 2);
    }

    #[test]
    fn test_distribution_requires_policy_grant() {
        let mut stack = builder();
        let bucket = stack
            .bucket("Site", BucketProps::new(RemovalPolicy::Destroy))
            .unwrap();
        let identity = stack.origin_access_identity("Oai", "site").unwrap();

        let props = DistributionProps::new(BehaviorOptions::read_only(S3Origin::new(
            &bucket, &identity,
        )));
        let err = stack.distribution("Cdn", props).unwrap_err();
        assert_eq!(
            err,
            DeclarationError::OriginNotGranted {
                resource: "Cdn".to_string(),
                bucket: "Site".to_string(),
                identity: "Oai".to_string(),
            }
        );
    }

    #[test]
    fn test_distribution_rejects_allow_all() {
        let mut stack = builder();
        let (bucket, identity) = with_origin(&mut stack);

        let mut behavior = BehaviorOptions::read_only(S3Origin::new(&bucket, &identity));
        behavior.viewer_protocol_policy = ViewerProtocolPolicy::AllowAll;
        let err = stack
            .distribution("Cdn", DistributionProps::new(behavior))
            .unwrap_err();
        assert_eq!(
            err,
            DeclarationError::InsecureViewerProtocol {
                resource: "Cdn".to_string()
            }
        );
    }

    #[test]
    fn test_distribution_cached_methods_subset() {
        let mut stack = builder();
        let (bucket, identity) = with_origin(&mut stack);

        let mut behavior = BehaviorOptions::read_only(S3Origin::new(&bucket, &identity));
        behavior.cached_methods = CachedMethods::GetHeadOptions;
        let err = stack
            .distribution("Cdn", DistributionProps::new(behavior))
            .unwrap_err();
        assert!(matches!(
            err,
            DeclarationError::InvalidValue { field: "defaultBehavior.cachedMethods", .. }
        ));
    }

    #[test]
    fn test_distribution_error_responses() {
        let mut stack = builder();
        let (bucket, identity) = with_origin(&mut stack);
        let behavior = BehaviorOptions::read_only(S3Origin::new(&bucket, &identity));

        let props = DistributionProps::new(behavior.clone())
            .with_error_response(ErrorResponse::page(404, "error.html", Duration::from_secs(300)));
        let err = stack.distribution("Cdn", props).unwrap_err();
        assert!(matches!(
            err,
            DeclarationError::InvalidValue { field: "errorResponses.responsePagePath", .. }
        ));

        let props = DistributionProps::new(behavior.clone())
            .with_error_response(ErrorResponse::page(404, "/a.html", Duration::from_secs(1)))
            .with_error_response(ErrorResponse::page(404, "/b.html", Duration::from_secs(1)));
        let err = stack.distribution("Cdn", props).unwrap_err();
        assert!(matches!(
            err,
            DeclarationError::InvalidValue { field: "errorResponses.httpStatus", .. }
        ));

        let props = DistributionProps::new(behavior)
            .with_error_response(ErrorResponse::page(200, "/a.html", Duration::from_secs(1)));
        let err = stack.distribution("Cdn", props).unwrap_err();
        assert!(matches!(
            err,
            DeclarationError::InvalidValue { field: "errorResponses.httpStatus", .. }
        ));
    }

    #[test]
    fn test_distribution_root_object_without_slash() {
        let mut stack = builder();
        let (bucket, identity) = with_origin(&mut stack);

        let props = DistributionProps::new(BehaviorOptions::read_only(S3Origin::new(
            &bucket, &identity,
        )))
        .with_default_root_object("/index.html");
        let err = stack.distribution("Cdn", props).unwrap_err();
        assert!(matches!(
            err,
            DeclarationError::InvalidValue { field: "defaultRootObject", .. }
        ));
    }

    #[test]
    fn test_deployment_duplicate_destination() {
        let mut stack = builder();
        let bucket = stack
            .bucket("Site", BucketProps::new(RemovalPolicy::Destroy))
            .unwrap();

        let props = DeploymentProps::new(&bucket)
            .with_source(Source::data("/index.html", "a"))
            .with_source(Source::data("/index.html", "b"));
        let err = stack.bucket_deployment("Deploy", props).unwrap_err();
        assert_eq!(
            err,
            DeclarationError::DuplicateDestination {
                resource: "Deploy".to_string(),
                path: "/index.html".to_string(),
            }
        );
    }

    #[test]
    fn test_deployment_requires_sources() {
        let mut stack = builder();
        let bucket = stack
            .bucket("Site", BucketProps::new(RemovalPolicy::Destroy))
            .unwrap();

        let err = stack
            .bucket_deployment("Deploy", DeploymentProps::new(&bucket))
            .unwrap_err();
        assert_eq!(
            err,
            DeclarationError::EmptyField {
                resource: "Deploy".to_string(),
                field: "sources"
            }
        );
    }

    #[test]
    fn test_deployment_relative_destination() {
        let mut stack = builder();
        let bucket = stack
            .bucket("Site", BucketProps::new(RemovalPolicy::Destroy))
            .unwrap();

        let props = DeploymentProps::new(&bucket).with_source(Source::data("index.html", "a"));
        let err = stack.bucket_deployment("Deploy", props).unwrap_err();
        assert!(matches!(
            err,
            DeclarationError::InvalidValue { field: "sources.destination", .. }
        ));
    }

    #[test]
    fn test_deployment_rejects_same_key_spelled_twice() {
        let mut stack = builder();
        let bucket = stack
            .bucket("Site", BucketProps::new(RemovalPolicy::Destroy))
            .unwrap();

        let props = DeploymentProps::new(&bucket)
            .with_source(Source::data("/index.html", "a"))
            .with_source(Source::data("//index.html", "b"));
        let err = stack.bucket_deployment("Deploy", props).unwrap_err();
        assert_eq!(err.resource(), "Deploy");
        assert!(matches!(
            err,
            DeclarationError::InvalidValue { field: "sources.destination", ref value, .. }
                if value == "//index.html"
        ));
    }

    #[test]
    fn test_deployment_rejects_dot_segments() {
        for destination in ["/../../escaped.txt", "/a/./b.html", "/a\\b.html", "/a//b.html"] {
            let mut stack = builder();
            let bucket = stack
                .bucket("Site", BucketProps::new(RemovalPolicy::Destroy))
                .unwrap();

            let props = DeploymentProps::new(&bucket).with_source(Source::data(destination, "x"));
            let err = stack.bucket_deployment("Deploy", props).unwrap_err();
            assert!(
                matches!(
                    err,
                    DeclarationError::InvalidValue { field: "sources.destination", .. }
                ),
                "{} was accepted",
                destination
            );
        }
    }

    #[test]
    fn test_deployment_invalid_asset_hash() {
        let mut stack = builder();
        let bucket = stack
            .bucket("Site", BucketProps::new(RemovalPolicy::Destroy))
            .unwrap();

        let props = DeploymentProps::new(&bucket)
            .with_source(Source::asset("/logo.png", "logo.png", "not-a-hash"));
        let err = stack.bucket_deployment("Deploy", props).unwrap_err();
        assert!(matches!(
            err,
            DeclarationError::InvalidValue { field: "sources.sha256", .. }
        ));
    }

    #[test]
    fn test_deployment_unresolved_distribution() {
        let mut stack = builder();
        let bucket = stack
            .bucket("Site", BucketProps::new(RemovalPolicy::Destroy))
            .unwrap();

        let props = DeploymentProps::new(&bucket)
            .with_source(Source::data("/index.html", "a"))
            .with_invalidation(&DistributionRef::named("Cdn"), ["/*"]);
        let err = stack.bucket_deployment("Deploy", props).unwrap_err();
        assert!(matches!(
            err,
            DeclarationError::UnresolvedReference { field: "distribution", kind: ResourceKind::Distribution, .. }
        ));
    }

    #[test]
    fn test_deployment_paths_without_distribution() {
        let mut stack = builder();
        let bucket = stack
            .bucket("Site", BucketProps::new(RemovalPolicy::Destroy))
            .unwrap();

        let mut props = DeploymentProps::new(&bucket).with_source(Source::data("/index.html", "a"));
        props.distribution_paths.push("/*".to_string());
        let err = stack.bucket_deployment("Deploy", props).unwrap_err();
        assert_eq!(
            err,
            DeclarationError::EmptyField {
                resource: "Deploy".to_string(),
                field: "distribution"
            }
        );
    }

    #[test]
    fn test_deployment_defaults_to_invalidate_all() {
        let mut stack = builder();
        let (bucket, identity) = with_origin(&mut stack);
        let distribution = stack
            .distribution(
                "Cdn",
                DistributionProps::new(BehaviorOptions::read_only(S3Origin::new(
                    &bucket, &identity,
                ))),
            )
            .unwrap();

        let props = DeploymentProps::new(&bucket)
            .with_source(Source::data("/index.html", "a"))
            .with_invalidation(&distribution, Vec::<String>::new());
        stack.bucket_deployment("Deploy", props).unwrap();

        let graph = stack.build();
        let deployment = graph.deployments().next().unwrap();
        assert_eq!(deployment.props.distribution_paths, vec![INVALIDATE_ALL]);
    }

    #[test]
    fn test_dependencies_follow_references() {
        let mut stack = builder();
        let (bucket, identity) = with_origin(&mut stack);
        stack
            .distribution(
                "Cdn",
                DistributionProps::new(BehaviorOptions::read_only(S3Origin::new(
                    &bucket, &identity,
                ))),
            )
            .unwrap();

        let graph = stack.build();
        let cdn = graph.get("Cdn").unwrap();
        assert_eq!(
            graph.dependencies_of(cdn),
            vec!["Oai".to_string(), "Site".to_string(), "SitePolicy".to_string()]
        );
        let bucket = graph.get("Site").unwrap();
        assert!(graph.dependencies_of(bucket).is_empty());
    }
}

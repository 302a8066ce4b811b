//! The static website stack

use crate::builder::{INVALIDATE_ALL, StackBuilder};
use crate::environment::Environment;
use crate::error::DeclarationError;
use crate::graph::ResourceGraph;
use crate::model::{
    BehaviorOptions, BucketProps, DeploymentProps, DistributionProps, ErrorResponse,
    PolicyResource, PolicyStatement, PriceClass, Principal, RemovalPolicy, S3_GET_OBJECT,
    S3Origin, Source,
};
use std::time::Duration;

pub const DEFAULT_STACK_NAME: &str = "AwsCdkServerlessStack";

pub const INDEX_HTML: &str = "<html><body><h1>Hello World</h1></body></html>";
pub const ERROR_HTML: &str = "<html><body><h1>Error!!!!!!!!!!!!!</h1></body></html>";

pub const ERROR_PAGE_PATH: &str = "/error.html";
pub const ERROR_CACHE_TTL: Duration = Duration::from_secs(300);

/// Declare the website: a private bucket served through a CDN, with a small
/// fixed set of pages uploaded into it.
///
/// Resources are declared in the order bucket, access identity, bucket
/// policy, distribution, deployment.
pub fn website_stack(
    scope: &str,
    stack_name: &str,
    environment: &Environment,
) -> Result<ResourceGraph, DeclarationError> {
    let mut stack = StackBuilder::new(scope, stack_name, environment.clone())?;

    let bucket = stack.bucket("WebsiteBucket", BucketProps::new(RemovalPolicy::Destroy))?;

    let identity = stack.origin_access_identity(
        "OriginAccessIdentity",
        "website-distribution-originAccessIdentity",
    )?;

    stack.add_to_resource_policy(
        &bucket,
        PolicyStatement::allow()
            .with_action(S3_GET_OBJECT)
            .with_principal(Principal::canonical_user(&identity))
            .with_resource(PolicyResource::objects_of(&bucket)),
    )?;

    let distribution = stack.distribution(
        "distribution",
        DistributionProps::new(BehaviorOptions::read_only(S3Origin::new(&bucket, &identity)))
            .with_comment("website-distribution")
            .with_default_root_object("index.html")
            .with_error_response(ErrorResponse::page(403, ERROR_PAGE_PATH, ERROR_CACHE_TTL))
            .with_error_response(ErrorResponse::page(404, ERROR_PAGE_PATH, ERROR_CACHE_TTL))
            .with_price_class(PriceClass::All),
    )?;

    stack.bucket_deployment(
        "WebsiteDeploy",
        DeploymentProps::new(&bucket)
            .with_source(Source::data("/index.html", INDEX_HTML))
            .with_source(Source::data(ERROR_PAGE_PATH, ERROR_HTML))
            .with_source(Source::data("/favicon.ico", ""))
            .with_invalidation(&distribution, [INVALIDATE_ALL]),
    )?;

    let graph = stack.build();
    tracing::info!(
        "Declared stack {} with {} resources ({})",
        graph.stack_name(),
        graph.len(),
        graph.environment()
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{BucketRef, IdentityRef, ResourceKind};
    use crate::model::{CachePolicy, ViewerProtocolPolicy};
    use std::collections::HashSet;

    fn graph() -> ResourceGraph {
        website_stack("app", DEFAULT_STACK_NAME, &Environment::new("123", "us-east-1")).unwrap()
    }

    #[test]
    fn test_creation_order() {
        assert_eq!(
            graph().kinds(),
            vec![
                ResourceKind::Bucket,
                ResourceKind::OriginAccessIdentity,
                ResourceKind::BucketPolicy,
                ResourceKind::Distribution,
                ResourceKind::BucketDeployment,
            ]
        );
    }

    #[test]
    fn test_policy_scoped_to_objects() {
        let graph = graph();
        let bucket = graph.buckets().next().unwrap();
        let policy = graph.bucket_policies().next().unwrap();

        for statement in &policy.statements {
            for resource in &statement.resources {
                assert_eq!(resource.pattern(), format!("{}/*", bucket.arn()));
                assert_ne!(resource.pattern(), bucket.arn());
            }
            assert_eq!(statement.actions, vec![S3_GET_OBJECT]);
        }
        assert!(policy.grants_object_read(&IdentityRef::named("OriginAccessIdentity")));
        assert_eq!(policy.bucket, BucketRef::named("WebsiteBucket"));
    }

    #[test]
    fn test_distribution_redirects_to_https() {
        let graph = graph();
        let distribution = graph.distributions().next().unwrap();
        let behavior = &distribution.props.default_behavior;

        assert_eq!(
            behavior.viewer_protocol_policy,
            ViewerProtocolPolicy::RedirectToHttps
        );
        assert_eq!(behavior.cache_policy, CachePolicy::CachingOptimized);
        assert_eq!(distribution.props.comment.as_deref(), Some("website-distribution"));
    }

    #[test]
    fn test_deployment_destinations() {
        let graph = graph();
        let deployment = graph.deployments().next().unwrap();

        let destinations: Vec<&str> = deployment.destinations().collect();
        let unique: HashSet<&str> = destinations.iter().copied().collect();
        assert_eq!(destinations.len(), unique.len());
        assert_eq!(
            unique,
            HashSet::from(["/index.html", "/error.html", "/favicon.ico"])
        );
    }

    #[test]
    fn test_declaration_is_idempotent() {
        let env = Environment::new("123", "us-east-1");
        let first = website_stack("app", DEFAULT_STACK_NAME, &env).unwrap();
        let second = website_stack("app", DEFAULT_STACK_NAME, &env).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_scenario_us_east_1() {
        let graph = graph();
        assert_eq!(graph.environment(), &Environment::new("123", "us-east-1"));

        let buckets: Vec<_> = graph.buckets().collect();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].props.removal_policy, RemovalPolicy::Destroy);

        let distributions: Vec<_> = graph.distributions().collect();
        assert_eq!(distributions.len(), 1);
        let props = &distributions[0].props;
        assert_eq!(props.default_root_object.as_deref(), Some("index.html"));
        assert_eq!(props.error_responses.len(), 2);
        for (response, status) in props.error_responses.iter().zip([403, 404]) {
            assert_eq!(response.http_status, status);
            assert_eq!(response.response_page_path.as_deref(), Some("/error.html"));
            assert_eq!(response.ttl, Duration::from_secs(300));
        }

        let deployments: Vec<_> = graph.deployments().collect();
        assert_eq!(deployments.len(), 1);
        assert_eq!(deployments[0].props.sources.len(), 3);
        assert_eq!(deployments[0].props.distribution_paths, vec!["/*"]);
    }

    #[test]
    fn test_invalid_stack_name_fails_whole_declaration() {
        let err = website_stack("app", "not a name", &Environment::agnostic()).unwrap_err();
        assert!(matches!(err, DeclarationError::InvalidValue { field: "stackName", .. }));
    }
}

//! Template synthesis
//!
//! Turns a [`ResourceGraph`] into a CloudFormation-shaped JSON template.
//! Cross-resource references become `Ref` / `Fn::GetAtt` intrinsics so the
//! provisioning engine resolves them at apply time.

use crate::graph::{Resource, ResourceGraph};
use crate::model::{
    AccessIdentity, Bucket, BucketPolicy, DeploymentAction, Distribution, PolicyResource,
    PolicyStatement, Principal, POLICY_VERSION,
};
use serde_json::{Map, Value, json};

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// Parameter carrying the deployment handler's service token
pub const DEPLOYMENT_SERVICE_TOKEN_PARAMETER: &str = "BucketDeploymentServiceToken";

/// Synthesize the whole graph
pub fn synthesize(graph: &ResourceGraph) -> Value {
    let mut resources = Map::new();
    for resource in graph.resources() {
        resources.insert(
            resource.logical_id().to_string(),
            resource_entry(graph, resource),
        );
    }

    let mut template = Map::new();
    template.insert(
        "AWSTemplateFormatVersion".to_string(),
        json!(TEMPLATE_FORMAT_VERSION),
    );
    template.insert(
        "Description".to_string(),
        json!(format!(
            "{} ({}) deployed to {}",
            graph.stack_name(),
            graph.scope(),
            graph.environment()
        )),
    );
    if graph.deployments().next().is_some() {
        let mut parameters = Map::new();
        parameters.insert(
            DEPLOYMENT_SERVICE_TOKEN_PARAMETER.to_string(),
            json!({
                "Type": "String",
                "Description": "ARN of the function that performs bucket deployments"
            }),
        );
        template.insert("Parameters".to_string(), Value::Object(parameters));
    }
    template.insert("Resources".to_string(), Value::Object(resources));

    let outputs = outputs(graph);
    if !outputs.is_empty() {
        template.insert("Outputs".to_string(), Value::Object(outputs));
    }

    Value::Object(template)
}

/// Template entry of a single resource
pub fn resource_entry(graph: &ResourceGraph, resource: &Resource) -> Value {
    let mut entry = Map::new();
    entry.insert("Type".to_string(), json!(resource.kind().template_type()));

    let properties = match resource {
        Resource::Bucket(bucket) => bucket_properties(bucket),
        Resource::OriginAccessIdentity(identity) => identity_properties(identity),
        Resource::BucketPolicy(policy) => policy_properties(policy),
        Resource::Distribution(distribution) => distribution_properties(distribution),
        Resource::BucketDeployment(deployment) => deployment_properties(deployment),
    };
    if !properties.is_empty() {
        entry.insert("Properties".to_string(), Value::Object(properties));
    }

    if let Resource::Bucket(bucket) = resource {
        let policy = bucket.props.removal_policy.as_template_value();
        entry.insert("UpdateReplacePolicy".to_string(), json!(policy));
        entry.insert("DeletionPolicy".to_string(), json!(policy));
    }

    let deps = graph.dependencies_of(resource);
    if !deps.is_empty() {
        entry.insert("DependsOn".to_string(), json!(deps));
    }

    entry.insert(
        "Metadata".to_string(),
        json!({ "sitestack:path": format!("{}/{}", graph.stack_name(), resource.logical_id()) }),
    );

    Value::Object(entry)
}

fn reference(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

fn get_att(logical_id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, attribute] })
}

fn bucket_properties(bucket: &Bucket) -> Map<String, Value> {
    let mut properties = Map::new();
    if bucket.props.versioned {
        properties.insert(
            "VersioningConfiguration".to_string(),
            json!({ "Status": "Enabled" }),
        );
    }
    if bucket.props.auto_delete_objects {
        properties.insert(
            "Tags".to_string(),
            json!([{ "Key": "sitestack:auto-delete-objects", "Value": "true" }]),
        );
    }
    properties
}

fn identity_properties(identity: &AccessIdentity) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(
        "CloudFrontOriginAccessIdentityConfig".to_string(),
        json!({ "Comment": identity.comment }),
    );
    properties
}

fn policy_properties(policy: &BucketPolicy) -> Map<String, Value> {
    let statements: Vec<Value> = policy.statements.iter().map(statement_document).collect();

    let mut properties = Map::new();
    properties.insert("Bucket".to_string(), reference(policy.bucket.logical_id()));
    properties.insert(
        "PolicyDocument".to_string(),
        json!({
            "Statement": statements,
            "Version": POLICY_VERSION,
        }),
    );
    properties
}

/// Policy statement in policy-document form
pub fn statement_document(statement: &PolicyStatement) -> Value {
    let principals: Vec<Value> = statement
        .principals
        .iter()
        .map(|p| match p {
            Principal::CanonicalUser(identity) => {
                get_att(identity.logical_id(), "S3CanonicalUserId")
            }
        })
        .collect();
    let resources: Vec<Value> = statement
        .resources
        .iter()
        .map(|r| match r {
            PolicyResource::Bucket(bucket) => get_att(bucket.logical_id(), "Arn"),
            PolicyResource::Objects(bucket) => json!({
                "Fn::Join": ["", [get_att(bucket.logical_id(), "Arn"), "/*"]]
            }),
        })
        .collect();

    json!({
        "Action": single_or_list(statement.actions.iter().map(|a| json!(a)).collect()),
        "Effect": statement.effect.as_str(),
        "Principal": { "CanonicalUser": single_or_list(principals) },
        "Resource": single_or_list(resources),
    })
}

fn single_or_list(mut values: Vec<Value>) -> Value {
    if values.len() == 1 {
        values.remove(0)
    } else {
        Value::Array(values)
    }
}

fn distribution_properties(distribution: &Distribution) -> Map<String, Value> {
    let props = &distribution.props;
    let behavior = &props.default_behavior;
    let origin_id = distribution.origin_id();

    let mut config = Map::new();
    config.insert("Enabled".to_string(), json!(true));
    config.insert("HttpVersion".to_string(), json!("http2"));
    config.insert("IPV6Enabled".to_string(), json!(true));
    config.insert("PriceClass".to_string(), json!(props.price_class.as_str()));
    if let Some(comment) = &props.comment {
        config.insert("Comment".to_string(), json!(comment));
    }
    if let Some(root) = &props.default_root_object {
        config.insert("DefaultRootObject".to_string(), json!(root));
    }
    if !props.error_responses.is_empty() {
        let responses: Vec<Value> = props
            .error_responses
            .iter()
            .map(|r| {
                let mut response = Map::new();
                response.insert("ErrorCode".to_string(), json!(r.http_status));
                response.insert("ErrorCachingMinTTL".to_string(), json!(r.ttl.as_secs()));
                if let Some(status) = r.response_http_status {
                    response.insert("ResponseCode".to_string(), json!(status));
                }
                if let Some(path) = &r.response_page_path {
                    response.insert("ResponsePagePath".to_string(), json!(path));
                }
                Value::Object(response)
            })
            .collect();
        config.insert("CustomErrorResponses".to_string(), json!(responses));
    }
    config.insert(
        "DefaultCacheBehavior".to_string(),
        json!({
            "AllowedMethods": behavior.allowed_methods.methods(),
            "CachedMethods": behavior.cached_methods.methods(),
            "CachePolicyId": behavior.cache_policy.id(),
            "Compress": true,
            "TargetOriginId": origin_id,
            "ViewerProtocolPolicy": behavior.viewer_protocol_policy.as_str(),
        }),
    );
    config.insert(
        "Origins".to_string(),
        json!([{
            "DomainName": get_att(behavior.origin.bucket.logical_id(), "RegionalDomainName"),
            "Id": origin_id,
            "S3OriginConfig": {
                "OriginAccessIdentity": {
                    "Fn::Join": ["", [
                        "origin-access-identity/cloudfront/",
                        reference(behavior.origin.identity.logical_id())
                    ]]
                }
            }
        }]),
    );

    let mut properties = Map::new();
    properties.insert("DistributionConfig".to_string(), Value::Object(config));
    properties
}

fn deployment_properties(deployment: &DeploymentAction) -> Map<String, Value> {
    let props = &deployment.props;
    let sources: Vec<Value> = props
        .sources
        .iter()
        .map(|s| {
            json!({
                "AssetHash": s.content_hash(),
                "DestinationKey": s.object_key(),
            })
        })
        .collect();

    let mut properties = Map::new();
    properties.insert(
        "ServiceToken".to_string(),
        reference(DEPLOYMENT_SERVICE_TOKEN_PARAMETER),
    );
    properties.insert("Sources".to_string(), json!(sources));
    properties.insert(
        "DestinationBucketName".to_string(),
        reference(props.destination_bucket.logical_id()),
    );
    properties.insert("Prune".to_string(), json!(true));
    if let Some(distribution) = &props.distribution {
        properties.insert(
            "DistributionId".to_string(),
            reference(distribution.logical_id()),
        );
        properties.insert(
            "DistributionPaths".to_string(),
            json!(props.distribution_paths),
        );
    }
    properties
}

fn outputs(graph: &ResourceGraph) -> Map<String, Value> {
    let mut outputs = Map::new();
    for bucket in graph.buckets() {
        outputs.insert(
            format!("{}Name", bucket.logical_id),
            json!({ "Value": reference(&bucket.logical_id) }),
        );
    }
    for distribution in graph.distributions() {
        outputs.insert(
            format!("{}DomainName", distribution.logical_id),
            json!({ "Value": get_att(&distribution.logical_id, "DomainName") }),
        );
    }
    outputs
}

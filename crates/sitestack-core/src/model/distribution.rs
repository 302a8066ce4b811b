//! CDN distribution

use crate::graph::{BucketRef, IdentityRef};
use std::time::Duration;

/// Managed cache policy id for `CachingOptimized`
pub const CACHING_OPTIMIZED_POLICY_ID: &str = "658327ea-f89d-4fab-a63d-7e88639e58f6";

/// Managed cache policy id for `CachingDisabled`
pub const CACHING_DISABLED_POLICY_ID: &str = "4135ea2d-6df8-44a3-9df3-4b5a84be39ad";

/// Methods the distribution forwards to the origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowedMethods {
    GetHead,
    GetHeadOptions,
    All,
}

impl AllowedMethods {
    pub fn methods(&self) -> &'static [&'static str] {
        match self {
            AllowedMethods::GetHead => &["GET", "HEAD"],
            AllowedMethods::GetHeadOptions => &["GET", "HEAD", "OPTIONS"],
            AllowedMethods::All => &["GET", "HEAD", "OPTIONS", "PUT", "PATCH", "POST", "DELETE"],
        }
    }
}

/// Methods whose responses are cached at the edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachedMethods {
    GetHead,
    GetHeadOptions,
}

impl CachedMethods {
    pub fn methods(&self) -> &'static [&'static str] {
        match self {
            CachedMethods::GetHead => &["GET", "HEAD"],
            CachedMethods::GetHeadOptions => &["GET", "HEAD", "OPTIONS"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachePolicy {
    CachingOptimized,
    CachingDisabled,
    /// Id of a cache policy managed elsewhere
    Custom(String),
}

impl CachePolicy {
    pub fn id(&self) -> &str {
        match self {
            CachePolicy::CachingOptimized => CACHING_OPTIMIZED_POLICY_ID,
            CachePolicy::CachingDisabled => CACHING_DISABLED_POLICY_ID,
            CachePolicy::Custom(id) => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerProtocolPolicy {
    RedirectToHttps,
    HttpsOnly,
    /// Rejected by the stack builder
    AllowAll,
}

impl ViewerProtocolPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewerProtocolPolicy::RedirectToHttps => "redirect-to-https",
            ViewerProtocolPolicy::HttpsOnly => "https-only",
            ViewerProtocolPolicy::AllowAll => "allow-all",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceClass {
    All,
    Class200,
    Class100,
}

impl PriceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceClass::All => "PriceClass_All",
            PriceClass::Class200 => "PriceClass_200",
            PriceClass::Class100 => "PriceClass_100",
        }
    }
}

/// Custom response for an origin error status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Status returned by the origin
    pub http_status: u16,

    /// Status returned to the viewer
    pub response_http_status: Option<u16>,

    /// Page served instead of the origin's error body
    pub response_page_path: Option<String>,

    /// How long the error response is cached at the edge
    pub ttl: Duration,
}

impl ErrorResponse {
    /// Serve `page` for `status`, keeping the status code
    pub fn page(status: u16, page: impl Into<String>, ttl: Duration) -> Self {
        Self {
            http_status: status,
            response_http_status: Some(status),
            response_page_path: Some(page.into()),
            ttl,
        }
    }
}

/// Private bucket origin read through an access identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Origin {
    pub bucket: BucketRef,
    pub identity: IdentityRef,
}

impl S3Origin {
    pub fn new(bucket: &BucketRef, identity: &IdentityRef) -> Self {
        Self {
            bucket: bucket.clone(),
            identity: identity.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BehaviorOptions {
    pub origin: S3Origin,
    pub allowed_methods: AllowedMethods,
    pub cached_methods: CachedMethods,
    pub cache_policy: CachePolicy,
    pub viewer_protocol_policy: ViewerProtocolPolicy,
}

impl BehaviorOptions {
    /// Read-only, HTTPS-only behavior for a static site
    pub fn read_only(origin: S3Origin) -> Self {
        Self {
            origin,
            allowed_methods: AllowedMethods::GetHead,
            cached_methods: CachedMethods::GetHead,
            cache_policy: CachePolicy::CachingOptimized,
            viewer_protocol_policy: ViewerProtocolPolicy::RedirectToHttps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionProps {
    pub comment: Option<String>,
    pub default_root_object: Option<String>,
    pub error_responses: Vec<ErrorResponse>,
    pub default_behavior: BehaviorOptions,
    pub price_class: PriceClass,
}

impl DistributionProps {
    pub fn new(default_behavior: BehaviorOptions) -> Self {
        Self {
            comment: None,
            default_root_object: None,
            error_responses: Vec::new(),
            default_behavior,
            price_class: PriceClass::All,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_default_root_object(mut self, object: impl Into<String>) -> Self {
        self.default_root_object = Some(object.into());
        self
    }

    pub fn with_error_response(mut self, response: ErrorResponse) -> Self {
        self.error_responses.push(response);
        self
    }

    pub fn with_price_class(mut self, price_class: PriceClass) -> Self {
        self.price_class = price_class;
        self
    }
}

/// A declared distribution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    pub logical_id: String,
    pub props: DistributionProps,
}

impl Distribution {
    /// Id of the single origin inside the distribution config
    pub fn origin_id(&self) -> String {
        format!("{}Origin1", self.logical_id)
    }
}

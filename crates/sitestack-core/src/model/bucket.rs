//! Object storage bucket

/// What happens to a resource when its stack is torn down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalPolicy {
    /// Delete the resource together with the stack
    Destroy,
    /// Orphan the resource; it outlives the stack
    Retain,
}

impl RemovalPolicy {
    /// Value used for `DeletionPolicy` / `UpdateReplacePolicy`
    pub fn as_template_value(&self) -> &'static str {
        match self {
            RemovalPolicy::Destroy => "Delete",
            RemovalPolicy::Retain => "Retain",
        }
    }
}

impl std::fmt::Display for RemovalPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemovalPolicy::Destroy => write!(f, "destroy"),
            RemovalPolicy::Retain => write!(f, "retain"),
        }
    }
}

/// Bucket settings.
///
/// The removal policy has no default: callers must decide whether bucket
/// data survives a teardown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketProps {
    pub removal_policy: RemovalPolicy,

    /// Keep every version of every object
    pub versioned: bool,

    /// Empty the bucket before deleting it (requires `RemovalPolicy::Destroy`)
    pub auto_delete_objects: bool,
}

impl BucketProps {
    pub fn new(removal_policy: RemovalPolicy) -> Self {
        Self {
            removal_policy,
            versioned: false,
            auto_delete_objects: false,
        }
    }

    pub fn with_versioning(mut self) -> Self {
        self.versioned = true;
        self
    }

    pub fn with_auto_delete_objects(mut self) -> Self {
        self.auto_delete_objects = true;
        self
    }
}

/// A declared bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub logical_id: String,
    pub props: BucketProps,
}

impl Bucket {
    /// Symbolic ARN of the bucket, resolved by the provisioning engine
    pub fn arn(&self) -> String {
        bucket_arn(&self.logical_id)
    }
}

pub(crate) fn bucket_arn(logical_id: &str) -> String {
    format!("${{{}.Arn}}", logical_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_props_builders() {
        let props = BucketProps::new(RemovalPolicy::Destroy)
            .with_versioning()
            .with_auto_delete_objects();
        assert!(props.versioned);
        assert!(props.auto_delete_objects);
        assert_eq!(props.removal_policy, RemovalPolicy::Destroy);
    }

    #[test]
    fn test_removal_policy_template_value() {
        assert_eq!(RemovalPolicy::Destroy.as_template_value(), "Delete");
        assert_eq!(RemovalPolicy::Retain.as_template_value(), "Retain");
    }

    #[test]
    fn test_arn() {
        let bucket = Bucket {
            logical_id: "WebsiteBucket".to_string(),
            props: BucketProps::new(RemovalPolicy::Retain),
        };
        assert_eq!(bucket.arn(), "${WebsiteBucket.Arn}");
    }
}

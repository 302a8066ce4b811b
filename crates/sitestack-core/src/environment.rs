//! Deployment target environment

use serde::{Deserialize, Serialize};

/// Target account and region of a stack.
///
/// Either field may be absent, in which case the stack is environment
/// agnostic and the provisioning engine decides where it lands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Account identifier
    pub account: Option<String>,

    /// Region name (e.g. "us-east-1")
    pub region: Option<String>,
}

impl Environment {
    pub fn new(account: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account: Some(account.into()),
            region: Some(region.into()),
        }
    }

    /// Environment with neither account nor region pinned
    pub fn agnostic() -> Self {
        Self::default()
    }

    pub fn is_agnostic(&self) -> bool {
        self.account.is_none() && self.region.is_none()
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "aws://{}/{}",
            self.account.as_deref().unwrap_or("unknown-account"),
            self.region.as_deref().unwrap_or("unknown-region")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            Environment::new("123", "us-east-1").to_string(),
            "aws://123/us-east-1"
        );
        assert_eq!(
            Environment::agnostic().to_string(),
            "aws://unknown-account/unknown-region"
        );
    }

    #[test]
    fn test_agnostic() {
        assert!(Environment::agnostic().is_agnostic());
        assert!(!Environment::new("123", "us-east-1").is_agnostic());
    }
}

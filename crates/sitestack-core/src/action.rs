//! Planned changes to a deployed stack

use crate::graph::{Resource, ResourceGraph};
use crate::model::{RemovalPolicy, sha256_hex};
use crate::state::StackState;
use crate::template;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Represents a planned action for a resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Unique identifier for the action
    pub id: String,

    /// Type of action to perform
    pub action_type: ActionType,

    /// Template resource type (e.g., "AWS::S3::Bucket")
    pub resource_type: String,

    /// Logical id of the resource
    pub resource_id: String,

    /// Description of the action
    pub description: String,

    /// Additional details about the action
    pub details: HashMap<String, serde_json::Value>,
}

impl Action {
    fn new(
        action_type: ActionType,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        description: String,
    ) -> Self {
        let resource_id = resource_id.into();
        Self {
            id: format!("{}-{}", action_type, resource_id),
            action_type,
            resource_type: resource_type.into(),
            resource_id,
            description,
            details: HashMap::new(),
        }
    }

    fn with_detail(mut self, key: &str, value: serde_json::Value) -> Self {
        self.details.insert(key.to_string(), value);
        self
    }

    /// Get a detail value as a specific type
    pub fn detail<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.details
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Type of action to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Create a new resource
    Create,
    /// Update an existing resource
    Update,
    /// Delete a resource
    Delete,
    /// No changes needed
    NoOp,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Update => write!(f, "update"),
            ActionType::Delete => write!(f, "delete"),
            ActionType::NoOp => write!(f, "no-op"),
        }
    }
}

/// Result of applying actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyResult {
    /// Successfully applied actions
    pub succeeded: Vec<ActionResult>,

    /// Failed actions
    pub failed: Vec<ActionResult>,

    /// Resources left in place because of their removal policy
    pub retained: Vec<String>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl ApplyResult {
    pub fn new() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
            retained: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn add_success(&mut self, action_id: String, message: String) {
        self.succeeded.push(ActionResult {
            action_id,
            success: true,
            message,
            error: None,
        });
    }

    pub fn add_failure(&mut self, action_id: String, error: String) {
        self.failed.push(ActionResult {
            action_id,
            success: false,
            message: String::new(),
            error: Some(error),
        });
    }
}

impl Default for ApplyResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a single action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    /// ID of the action
    pub action_id: String,

    /// Whether the action succeeded
    pub success: bool,

    /// Success message
    pub message: String,

    /// Error message if failed
    pub error: Option<String>,
}

/// Plan containing all actions to be applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// List of actions to perform
    pub actions: Vec<Action>,

    /// Whether the plan has any changes
    pub has_changes: bool,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        let has_changes = actions.iter().any(|a| a.action_type != ActionType::NoOp);
        Self {
            actions,
            has_changes,
        }
    }

    pub fn empty() -> Self {
        Self {
            actions: Vec::new(),
            has_changes: false,
        }
    }

    /// Diff the desired graph against recorded state.
    ///
    /// Creates and updates follow the graph's creation order; deletes of
    /// resources that left the graph come last, newest first.
    pub fn diff(graph: &ResourceGraph, current: &StackState) -> Self {
        let mut actions = Vec::new();

        for (position, resource) in graph.resources().iter().enumerate() {
            let logical_id = resource.logical_id();
            let resource_type = resource.kind().template_type();
            let fingerprint = fingerprint(graph, resource);

            let action = match current.get_resource(logical_id) {
                None => Action::new(
                    ActionType::Create,
                    resource_type,
                    logical_id,
                    format!("Create {} {}", resource.kind(), logical_id),
                ),
                Some(existing) if existing.resource_type != resource_type => Action::new(
                    ActionType::Update,
                    resource_type,
                    logical_id,
                    format!(
                        "Replace {} {} (was {})",
                        resource.kind(),
                        logical_id,
                        existing.resource_type
                    ),
                )
                .with_detail("replace", serde_json::json!(true)),
                Some(existing) if existing.fingerprint != fingerprint => Action::new(
                    ActionType::Update,
                    resource_type,
                    logical_id,
                    format!("Update {} {}", resource.kind(), logical_id),
                ),
                Some(_) => Action::new(
                    ActionType::NoOp,
                    resource_type,
                    logical_id,
                    format!("{} {} is up to date", resource.kind(), logical_id),
                ),
            };

            actions.push(
                action
                    .with_detail("position", serde_json::json!(position))
                    .with_detail("fingerprint", serde_json::json!(fingerprint))
                    .with_detail(
                        "retain_on_delete",
                        serde_json::json!(retains_on_delete(resource)),
                    ),
            );
        }

        for (logical_id, state) in current.in_creation_order().into_iter().rev() {
            if graph.get(logical_id).is_some() {
                continue;
            }
            actions.push(
                Action::new(
                    ActionType::Delete,
                    state.resource_type.clone(),
                    logical_id.clone(),
                    format!("Delete {} {}", state.resource_type, logical_id),
                )
                .with_detail(
                    "retain_on_delete",
                    serde_json::json!(state.retain_on_delete),
                ),
            );
        }

        Self::new(actions)
    }

    /// Get actions by type
    pub fn actions_by_type(&self, action_type: ActionType) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .collect()
    }

    /// Summary of the plan
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            create: self.actions_by_type(ActionType::Create).len(),
            update: self.actions_by_type(ActionType::Update).len(),
            delete: self.actions_by_type(ActionType::Delete).len(),
            no_change: self.actions_by_type(ActionType::NoOp).len(),
        }
    }
}

/// Summary of planned actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub delete: usize,
    pub no_change: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} to delete, {} unchanged",
            self.create, self.update, self.delete, self.no_change
        )
    }
}

/// SHA-256 of a resource's synthesized template entry
pub fn fingerprint(graph: &ResourceGraph, resource: &Resource) -> String {
    let entry = template::resource_entry(graph, resource);
    sha256_hex(entry.to_string().as_bytes())
}

/// Whether tearing down the stack leaves `resource` in place
pub fn retains_on_delete(resource: &Resource) -> bool {
    matches!(resource, Resource::Bucket(b) if b.props.removal_policy == RemovalPolicy::Retain)
}

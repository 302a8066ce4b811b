//! Provisioning engine abstraction

use crate::action::{ActionType, ApplyResult, Plan, retains_on_delete};
use crate::assembly::{Assembly, AssetSource, MANIFEST_FILE};
use crate::error::{EngineError, Result};
use crate::graph::ResourceGraph;
use crate::model::{is_object_path, sha256_hex};
use crate::state::{ResourceState, ResourceStatus, StateManager};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Something that turns a resource graph into real resources.
///
/// The engine owns ordering, retries and rollback of remote operations;
/// callers only hand it validated graphs and propagate its errors.
#[async_trait]
pub trait ProvisioningEngine: Send + Sync {
    /// Returns the engine name (e.g., "local")
    fn name(&self) -> &str;

    /// Render the graph into a deployable assembly
    async fn synthesize(&self, graph: &ResourceGraph) -> Result<Assembly>;

    /// Calculate the diff between the graph and what is deployed
    async fn plan(&self, graph: &ResourceGraph) -> Result<Plan>;

    /// Apply the planned actions
    async fn apply(&self, graph: &ResourceGraph, plan: &Plan) -> Result<ApplyResult>;

    /// Tear down every resource of a stack, honouring removal policies
    async fn destroy(&self, stack_name: &str) -> Result<ApplyResult>;
}

/// Engine that writes assemblies to a directory and tracks deployed state
/// on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalEngine {
    out_dir: PathBuf,
    state: StateManager,
}

impl LocalEngine {
    /// `out_dir` receives assemblies; state lives under `project_root`
    pub fn new(out_dir: impl AsRef<Path>, project_root: impl AsRef<Path>) -> Self {
        Self {
            out_dir: out_dir.as_ref().to_path_buf(),
            state: StateManager::new(project_root),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn state(&self) -> &StateManager {
        &self.state
    }

    async fn stage_assets(&self, assembly: &Assembly) -> Result<()> {
        for asset in &assembly.assets {
            if !is_object_path(&asset.destination) {
                return Err(EngineError::Asset(format!(
                    "{}: destination '{}' is not a plain object path",
                    asset.deployment, asset.destination
                )));
            }
            let target = self.out_dir.join(asset.staged_path());
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).await?;
            }

            match &asset.source {
                AssetSource::Inline(body) => {
                    fs::write(&target, body).await?;
                }
                AssetSource::File(path) => {
                    let bytes = fs::read(path).await.map_err(|e| {
                        EngineError::Asset(format!("{}: {}", path.display(), e))
                    })?;
                    let actual = sha256_hex(&bytes);
                    if actual != asset.hash {
                        return Err(EngineError::Asset(format!(
                            "{}: expected sha256 {}, found {}",
                            path.display(),
                            asset.hash,
                            actual
                        )));
                    }
                    fs::write(&target, bytes).await?;
                }
            }
            tracing::debug!("Staged asset {} -> {}", asset.destination, target.display());
        }
        Ok(())
    }
}

#[async_trait]
impl ProvisioningEngine for LocalEngine {
    fn name(&self) -> &str {
        "local"
    }

    async fn synthesize(&self, graph: &ResourceGraph) -> Result<Assembly> {
        let assembly = Assembly::from_graph(graph);
        fs::create_dir_all(&self.out_dir).await?;

        let template_path = self.out_dir.join(assembly.template_file_name());
        fs::write(&template_path, assembly.template_json()?).await?;

        self.stage_assets(&assembly).await?;

        let manifest = serde_json::to_string_pretty(&assembly.manifest()?)?;
        fs::write(self.out_dir.join(MANIFEST_FILE), manifest).await?;

        tracing::info!(
            "Synthesized {} ({} assets) to {}",
            assembly.stack_name,
            assembly.assets.len(),
            self.out_dir.display()
        );
        Ok(assembly)
    }

    async fn plan(&self, graph: &ResourceGraph) -> Result<Plan> {
        let current = self.state.load(graph.stack_name()).await?;
        Ok(Plan::diff(graph, &current))
    }

    async fn apply(&self, graph: &ResourceGraph, plan: &Plan) -> Result<ApplyResult> {
        let mut result = ApplyResult::new();
        let start = std::time::Instant::now();

        let lock = self.state.acquire_lock(graph.stack_name()).await?;
        self.synthesize(graph).await?;
        let mut state = self.state.load(graph.stack_name()).await?;
        state.environment = Some(graph.environment().to_string());

        for action in &plan.actions {
            match action.action_type {
                ActionType::Create | ActionType::Update => {
                    let Some(resource) = graph.get(&action.resource_id) else {
                        result.add_failure(
                            action.id.clone(),
                            format!("{} is not part of the stack", action.resource_id),
                        );
                        continue;
                    };
                    let (Some(position), Some(fingerprint)) = (
                        action.detail::<usize>("position"),
                        action.detail::<String>("fingerprint"),
                    ) else {
                        result.add_failure(
                            action.id.clone(),
                            "action is missing position or fingerprint".to_string(),
                        );
                        continue;
                    };

                    tracing::info!("{} {}", action.action_type, action.resource_id);
                    let resource_state = match state.remove_resource(&action.resource_id) {
                        Some(existing) if action.action_type == ActionType::Update => {
                            existing.updated(position, fingerprint)
                        }
                        _ => ResourceState::new(action.resource_type.clone(), position, fingerprint),
                    };
                    state.set_resource(
                        action.resource_id.clone(),
                        resource_state
                            .with_status(ResourceStatus::Deployed)
                            .with_retain_on_delete(retains_on_delete(resource)),
                    );
                    result.add_success(action.id.clone(), action.description.clone());
                }
                ActionType::Delete => {
                    tracing::info!("delete {}", action.resource_id);
                    if let Some(removed) = state.remove_resource(&action.resource_id) {
                        if removed.retain_on_delete {
                            result.retained.push(action.resource_id.clone());
                        }
                    }
                    result.add_success(action.id.clone(), action.description.clone());
                }
                ActionType::NoOp => {
                    // Nothing to do
                }
            }
        }

        self.state.save(&state).await?;
        lock.release().await?;

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }

    async fn destroy(&self, stack_name: &str) -> Result<ApplyResult> {
        let mut result = ApplyResult::new();
        let start = std::time::Instant::now();

        let lock = self.state.acquire_lock(stack_name).await?;
        let mut state = self.state.load(stack_name).await?;
        if state.is_empty() {
            lock.release().await?;
            return Err(EngineError::StackNotFound(stack_name.to_string()));
        }

        let order: Vec<(String, bool)> = state
            .in_creation_order()
            .into_iter()
            .rev()
            .map(|(id, r)| (id.clone(), r.retain_on_delete))
            .collect();
        for (logical_id, retain) in order {
            state.remove_resource(&logical_id);
            if retain {
                tracing::warn!("Retaining {} (removal policy: retain)", logical_id);
                result.retained.push(logical_id.clone());
                result.add_success(
                    format!("retain-{}", logical_id),
                    format!("{} retained", logical_id),
                );
            } else {
                tracing::info!("delete {}", logical_id);
                result.add_success(
                    format!("delete-{}", logical_id),
                    format!("{} deleted", logical_id),
                );
            }
        }

        self.state.save(&state).await?;
        lock.release().await?;

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }
}

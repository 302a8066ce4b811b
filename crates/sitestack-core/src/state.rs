//! Deployed state of stacks
//!
//! Manages `.sitestack/<stack>.state.json`, which records what the last
//! successful apply left behind for each stack.

use crate::error::{EngineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const STATE_VERSION: u32 = 1;
pub const STATE_DIR: &str = ".sitestack";

/// Recorded state of one stack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackState {
    /// State file version
    pub version: u32,

    pub stack_name: String,

    /// Environment the stack was applied to
    pub environment: Option<String>,

    /// Last modified timestamp
    pub updated_at: DateTime<Utc>,

    /// Resources indexed by logical id
    pub resources: BTreeMap<String, ResourceState>,
}

impl StackState {
    pub fn new(stack_name: impl Into<String>) -> Self {
        Self {
            version: STATE_VERSION,
            stack_name: stack_name.into(),
            environment: None,
            updated_at: Utc::now(),
            resources: BTreeMap::new(),
        }
    }

    /// Add or update a resource
    pub fn set_resource(&mut self, logical_id: String, state: ResourceState) {
        self.resources.insert(logical_id, state);
        self.updated_at = Utc::now();
    }

    /// Remove a resource
    pub fn remove_resource(&mut self, logical_id: &str) -> Option<ResourceState> {
        let result = self.resources.remove(logical_id);
        if result.is_some() {
            self.updated_at = Utc::now();
        }
        result
    }

    pub fn get_resource(&self, logical_id: &str) -> Option<&ResourceState> {
        self.resources.get(logical_id)
    }

    /// Resources in the order they were created
    pub fn in_creation_order(&self) -> Vec<(&String, &ResourceState)> {
        let mut resources: Vec<_> = self.resources.iter().collect();
        resources.sort_by_key(|(_, r)| r.position);
        resources
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// State of a single deployed resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceState {
    /// Template resource type
    pub resource_type: String,

    /// Position in the stack's creation order
    pub position: usize,

    /// SHA-256 of the resource's template entry
    pub fingerprint: String,

    /// Whether the resource survives a teardown
    pub retain_on_delete: bool,

    pub status: ResourceStatus,

    /// When the resource was created
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl ResourceState {
    pub fn new(
        resource_type: impl Into<String>,
        position: usize,
        fingerprint: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            resource_type: resource_type.into(),
            position,
            fingerprint: fingerprint.into(),
            retain_on_delete: false,
            status: ResourceStatus::Unknown,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_status(mut self, status: ResourceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_retain_on_delete(mut self, retain: bool) -> Self {
        self.retain_on_delete = retain;
        self
    }

    /// Record a new fingerprint after an update
    pub fn updated(mut self, position: usize, fingerprint: impl Into<String>) -> Self {
        self.position = position;
        self.fingerprint = fingerprint.into();
        self.updated_at = Utc::now();
        self
    }
}

/// Status of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    /// Resource is applied and matches its fingerprint
    Deployed,
    /// Apply failed for this resource
    Error,
    /// Status is unknown
    Unknown,
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceStatus::Deployed => write!(f, "deployed"),
            ResourceStatus::Error => write!(f, "error"),
            ResourceStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// State manager for reading/writing state files
#[derive(Debug, Clone)]
pub struct StateManager {
    /// Project root directory
    project_root: PathBuf,
}

impl StateManager {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
        }
    }

    /// Get the state directory path
    pub fn state_dir(&self) -> PathBuf {
        self.project_root.join(STATE_DIR)
    }

    fn state_path(&self, stack_name: &str) -> PathBuf {
        self.state_dir().join(format!("{}.state.json", stack_name))
    }

    fn backup_path(&self, stack_name: &str) -> PathBuf {
        self.state_dir()
            .join(format!("{}.state.json.backup", stack_name))
    }

    fn lock_path(&self, stack_name: &str) -> PathBuf {
        self.state_dir().join(format!("{}.lock.json", stack_name))
    }

    /// Ensure the state directory exists
    async fn ensure_state_dir(&self) -> Result<()> {
        let dir = self.state_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
            tracing::debug!("Created state directory: {}", dir.display());
        }
        Ok(())
    }

    /// Load the state of a stack; a stack never applied has empty state
    pub async fn load(&self, stack_name: &str) -> Result<StackState> {
        let path = self.state_path(stack_name);
        if !path.exists() {
            tracing::debug!("State file not found, returning empty state");
            return Ok(StackState::new(stack_name));
        }

        let content = fs::read_to_string(&path).await?;
        let state: StackState = serde_json::from_str(&content)?;

        if state.version > STATE_VERSION {
            return Err(EngineError::StateError(format!(
                "State file version {} is newer than supported version {}",
                state.version, STATE_VERSION
            )));
        }
        if state.stack_name != stack_name {
            return Err(EngineError::StateError(format!(
                "State file {} belongs to stack '{}'",
                path.display(),
                state.stack_name
            )));
        }

        tracing::debug!("Loaded state with {} resources", state.resources.len());
        Ok(state)
    }

    /// Save the state, keeping the previous file as a backup
    pub async fn save(&self, state: &StackState) -> Result<()> {
        self.ensure_state_dir().await?;

        let path = self.state_path(&state.stack_name);
        let backup = self.backup_path(&state.stack_name);

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
            tracing::debug!("Created state backup");
        }

        let content = serde_json::to_string_pretty(state)?;
        fs::write(&path, content).await?;

        tracing::debug!("Saved state with {} resources", state.resources.len());
        Ok(())
    }

    /// Acquire a lock for exclusive access to a stack's state.
    ///
    /// The lock file is created with `create_new`, so only one caller can
    /// win even when several race for it.
    pub async fn acquire_lock(&self, stack_name: &str) -> Result<StateLock> {
        self.ensure_state_dir().await?;

        let lock_path = self.lock_path(stack_name);
        let lock_info = LockInfo {
            holder: format!("pid-{}", std::process::id()),
            acquired_at: Utc::now(),
        };
        let content = serde_json::to_string_pretty(&lock_info)?;

        // One retry after clearing a stale lock
        for _ in 0..2 {
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_path)
                .await
            {
                Ok(mut file) => {
                    file.write_all(content.as_bytes()).await?;
                    file.flush().await?;
                    tracing::debug!("Acquired state lock for {}", stack_name);
                    return Ok(StateLock {
                        lock_path,
                        released: false,
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    self.clear_stale_lock(stack_name, &lock_path).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(EngineError::LockError(format!(
            "Stack {} is locked by another process",
            stack_name
        )))
    }

    /// Remove the lock at `lock_path` if it is older than an hour
    async fn clear_stale_lock(&self, stack_name: &str, lock_path: &Path) -> Result<()> {
        let content = match fs::read_to_string(lock_path).await {
            Ok(content) => content,
            // Released between our attempt and this read
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        // A lock still being written has no parsable body yet; treat it as held
        let Ok(lock_info) = serde_json::from_str::<LockInfo>(&content) else {
            return Err(EngineError::LockError(format!(
                "Stack {} is locked by another process",
                stack_name
            )));
        };

        let age = Utc::now().signed_duration_since(lock_info.acquired_at);
        if age.num_hours() < 1 {
            return Err(EngineError::LockError(format!(
                "Stack {} is locked by {} since {}",
                stack_name, lock_info.holder, lock_info.acquired_at
            )));
        }

        tracing::warn!("Removing stale lock from {}", lock_info.holder);
        match fs::remove_file(lock_path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Lock information
#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    holder: String,
    acquired_at: DateTime<Utc>,
}

/// RAII guard for state lock
#[derive(Debug)]
pub struct StateLock {
    lock_path: PathBuf,
    released: bool,
}

impl StateLock {
    /// Release the lock
    pub async fn release(mut self) -> Result<()> {
        if !self.released {
            if self.lock_path.exists() {
                fs::remove_file(&self.lock_path).await?;
                tracing::debug!("Released state lock");
            }
            self.released = true;
        }
        Ok(())
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if !self.released && self.lock_path.exists() {
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_state_save_load() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let mut state = StackState::new("WebsiteStack");
        state.set_resource(
            "WebsiteBucket".to_string(),
            ResourceState::new("AWS::S3::Bucket", 0, "abc")
                .with_status(ResourceStatus::Deployed),
        );

        manager.save(&state).await.unwrap();

        let loaded = manager.load("WebsiteStack").await.unwrap();
        assert_eq!(loaded.resources.len(), 1);
        assert_eq!(
            loaded.get_resource("WebsiteBucket").unwrap().status,
            ResourceStatus::Deployed
        );
    }

    #[tokio::test]
    async fn test_empty_state() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let state = manager.load("WebsiteStack").await.unwrap();
        assert!(state.is_empty());
        assert_eq!(state.stack_name, "WebsiteStack");
    }

    #[tokio::test]
    async fn test_save_keeps_backup() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let state = StackState::new("WebsiteStack");
        manager.save(&state).await.unwrap();
        manager.save(&state).await.unwrap();

        assert!(
            temp_dir
                .path()
                .join(STATE_DIR)
                .join("WebsiteStack.state.json.backup")
                .exists()
        );
    }

    #[tokio::test]
    async fn test_lock_is_exclusive() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let lock = manager.acquire_lock("WebsiteStack").await.unwrap();
        let second = manager.acquire_lock("WebsiteStack").await;
        assert!(matches!(second, Err(EngineError::LockError(_))));

        lock.release().await.unwrap();
        let again = manager.acquire_lock("WebsiteStack").await.unwrap();
        drop(again);
        assert!(!temp_dir.path().join(STATE_DIR).join("WebsiteStack.lock.json").exists());
    }

    #[tokio::test]
    async fn test_concurrent_lock_has_single_winner() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let (first, second) = tokio::join!(
            manager.acquire_lock("WebsiteStack"),
            manager.acquire_lock("WebsiteStack")
        );
        assert_eq!(
            [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(),
            1
        );
    }

    #[tokio::test]
    async fn test_stale_lock_is_replaced() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());
        let lock_path = temp_dir.path().join(STATE_DIR).join("WebsiteStack.lock.json");

        std::fs::create_dir_all(lock_path.parent().unwrap()).unwrap();
        let stale = LockInfo {
            holder: "pid-1".to_string(),
            acquired_at: Utc::now() - chrono::Duration::hours(2),
        };
        std::fs::write(&lock_path, serde_json::to_string(&stale).unwrap()).unwrap();

        let lock = manager.acquire_lock("WebsiteStack").await.unwrap();
        let info: LockInfo =
            serde_json::from_str(&std::fs::read_to_string(&lock_path).unwrap()).unwrap();
        assert_eq!(info.holder, format!("pid-{}", std::process::id()));
        lock.release().await.unwrap();
    }

    #[test]
    fn test_creation_order() {
        let mut state = StackState::new("WebsiteStack");
        state.set_resource(
            "distribution".to_string(),
            ResourceState::new("AWS::CloudFront::Distribution", 3, "d"),
        );
        state.set_resource(
            "WebsiteBucket".to_string(),
            ResourceState::new("AWS::S3::Bucket", 0, "b"),
        );

        let order: Vec<&str> = state
            .in_creation_order()
            .into_iter()
            .map(|(id, _)| id.as_str())
            .collect();
        assert_eq!(order, vec!["WebsiteBucket", "distribution"]);
    }
}

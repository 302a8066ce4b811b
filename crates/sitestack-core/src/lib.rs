//! SiteStack core
//!
//! Declares the infrastructure of a static website (bucket, origin access
//! identity, bucket policy, CDN distribution and file deployment) as an
//! immutable resource graph, synthesizes it into a CloudFormation-shaped
//! template and hands it to a provisioning engine.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  sitestack CLI                   │
//! │        (synth / diff / deploy / destroy)         │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                 sitestack-core                   │
//! │  ┌──────────────┐  ┌──────────────┐             │
//! │  │ StackBuilder │─▶│ResourceGraph │             │
//! │  └──────────────┘  └──────┬───────┘             │
//! │                   ┌───────▼───────┐             │
//! │                   │   template /  │             │
//! │                   │   assembly    │             │
//! │                   └───────┬───────┘             │
//! │  ┌────────────────────────▼─────────────────┐   │
//! │  │  trait ProvisioningEngine { ... }        │   │
//! │  └────────────────────────┬─────────────────┘   │
//! └───────────────────────────┼─────────────────────┘
//!                     ┌───────▼───────┐
//!                     │  LocalEngine  │
//!                     │ (files+state) │
//!                     └───────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use sitestack_core::{Environment, ResourceKind, website_stack};
//!
//! let graph = website_stack("app", "WebsiteStack", &Environment::new("123", "us-east-1"))?;
//! assert_eq!(graph.kinds()[0], ResourceKind::Bucket);
//! # Ok::<(), sitestack_core::DeclarationError>(())
//! ```

pub mod action;
pub mod assembly;
pub mod builder;
pub mod engine;
pub mod environment;
pub mod error;
pub mod graph;
pub mod model;
pub mod stack;
pub mod state;
pub mod template;

// Re-exports
pub use action::{Action, ActionType, ApplyResult, Plan, PlanSummary};
pub use assembly::{Asset, AssetSource, Assembly, Manifest};
pub use builder::StackBuilder;
pub use engine::{LocalEngine, ProvisioningEngine};
pub use environment::Environment;
pub use error::{DeclarationError, EngineError, Result};
pub use graph::{BucketRef, DistributionRef, IdentityRef, Resource, ResourceGraph, ResourceKind};
pub use stack::{DEFAULT_STACK_NAME, website_stack};
pub use state::{ResourceState, ResourceStatus, StackState, StateLock, StateManager};

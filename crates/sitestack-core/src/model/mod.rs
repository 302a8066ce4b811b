//! Resource declarations
//!
//! Plain data describing the desired end state of each resource. Nothing in
//! here talks to a provider; validation happens when a declaration is added
//! to a [`StackBuilder`](crate::StackBuilder).

mod bucket;
mod deployment;
mod distribution;
mod identity;
mod policy;

// Re-exports
pub use bucket::*;
pub use deployment::*;
pub use distribution::*;
pub use identity::*;
pub use policy::*;

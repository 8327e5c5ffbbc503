//! Namespace Scope Module
//!
//! - [`NamespaceSnapshot`]: bindings inherited from the ancestors of a
//!   captured fragment, frozen at mark time
//! - [`NamespaceResolver`]: depth-tagged binding stack with
//!   nearest-declaration-wins lookup and empty-URI masking

pub mod resolver;
pub mod snapshot;

pub use resolver::{ns, NamespaceResolver};
pub use snapshot::NamespaceSnapshot;

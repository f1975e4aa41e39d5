//! Dictum Registry
//!
//! Tenant-scoped cache of compiled models.
//!
//! Responsibilities:
//! - Compile and publish models, keeping namespace bookkeeping consistent
//! - Resolve elements by QName through namespace URI -> model mappings
//! - Let a tenant override shared models by schema name
//! - Rebuild a tenant's cache from the persistent store, in import order

mod bootstrap;
mod config;
mod entry;
mod error;
mod registry;
mod store;
mod tenant;

pub use bootstrap::bootstrap_order;
pub use config::RegistryConfig;
pub use entry::RegistrySnapshot;
pub use error::{RegistryError, RegistryResult};
pub use registry::ModelRegistry;
pub use store::{InMemoryModelStore, ModelStore};
pub use tenant::{SingleTenant, TenantGuard, TenantProvider, ThreadTenant};

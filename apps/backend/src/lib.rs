#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod backends;
pub mod config;
pub mod entities;
pub mod env;
pub mod error;
pub mod repos;

#[cfg(test)]
pub mod test_bootstrap;

// Re-exports for public API
pub use backends::{BackendKind, StorageBackend};
pub use config::{Config, Profile, ProfileConfig};
pub use env::{DbEnv, LoadedEnv};
pub use error::{BackendError, ErrorKind};
pub use repos::authinfos::AuthInfo;
pub use repos::computers::Computer;
pub use repos::logs::{LogMessage, LogTarget};
pub use repos::users::User;
pub use repos::workflows::{Workflow, WorkflowListFilter, WorkflowState};

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    test_bootstrap::logging::init();
}

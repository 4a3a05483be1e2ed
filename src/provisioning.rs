//! Container provisioning: create or adopt a container, reconcile its
//! packages and create user accounts inside it.

pub mod environment;
pub mod packages;
pub mod users;
pub mod workflow;

pub use environment::{ensure_linux, HostProbe, SpecOverrides};
pub use packages::PackageSet;
pub use users::{collect_users, UserRecord};
pub use workflow::{ProvisionPlan, ProvisionReport, ProvisionedUser, Provisioner};

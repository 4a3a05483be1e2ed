pub mod configuration;
pub mod container_management;
pub mod error_handling;
pub mod logging;
pub mod provisioning;
pub mod teardown;

pub use container_management::{ContainerHandle, ContainerSpec, ContainerState};
pub use teardown::{Destroyer, NukeOutcome};

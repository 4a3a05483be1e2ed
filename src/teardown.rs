//! Finds a container and tears it down, stopping it first when it runs.

use log::{debug, info};

use crate::container_management::runner::CommandRunner;
use crate::container_management::types::ContainerState;
use crate::container_management::ContainerHandle;
use crate::error_handling::types::DestroyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NukeOutcome {
    /// The container was not listed; nothing was stopped or destroyed.
    NothingToNuke,
    Destroyed { was_running: bool },
}

pub struct Destroyer<'a, R> {
    handle: &'a ContainerHandle<R>,
}

impl<'a, R: CommandRunner> Destroyer<'a, R> {
    pub fn new(handle: &'a ContainerHandle<R>) -> Self {
        Self { handle }
    }

    /// Queries the toolkit for the current state of `name`. Never cached.
    pub async fn state(&self, name: &str) -> Result<ContainerState, DestroyError> {
        let plain = self
            .handle
            .list(false)
            .await
            .map_err(DestroyError::ListFailed)?;
        if !ContainerState::is_listed(&plain, name) {
            return Ok(ContainerState::Absent);
        }
        self.running_state(name).await
    }

    async fn running_state(&self, name: &str) -> Result<ContainerState, DestroyError> {
        let fancy = self
            .handle
            .list(true)
            .await
            .map_err(|source| DestroyError::StateQueryFailed {
                name: name.to_string(),
                source,
            })?;
        let state = ContainerState::from_fancy_listing(&fancy, name);
        debug!("Container [{}] state: {:?}", name, state);
        Ok(state)
    }

    pub async fn nuke(&self, name: &str) -> Result<NukeOutcome, DestroyError> {
        info!("Checking if container [{}] exists...", name);
        let state = self.state(name).await?;
        if state == ContainerState::Absent {
            info!("Container [{}] does not exist, nothing to nuke.", name);
            return Ok(NukeOutcome::NothingToNuke);
        }
        info!("Container [{}] found, working to nuke container...", name);

        let was_running = state == ContainerState::Running;
        if was_running {
            info!("Container [{}] is running, stopping the container...", name);
            self.handle
                .stop(name)
                .await
                .map_err(|source| DestroyError::StopFailed {
                    name: name.to_string(),
                    source,
                })?;
            info!("Container [{}] has been stopped, we can now destroy it.", name);
        } else {
            info!(
                "Container [{}] is not running, attempting to destroy container...",
                name
            );
        }

        info!("Now attempting to destroy container [{}]...", name);
        self.handle
            .destroy(name)
            .await
            .map_err(|source| DestroyError::DestroyFailed {
                name: name.to_string(),
                source,
            })?;
        info!("Container [{}] nuked successfully.", name);

        Ok(NukeOutcome::Destroyed { was_running })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::types::ToolkitConfig;
    use crate::container_management::tests::{failed, noisy, ok, ScriptedRunner};
    use tokio_test::{assert_err, assert_ok};

    const FANCY_HEADER: &str = "NAME   STATE   AUTOSTART GROUPS IPV4      IPV6\n";

    fn handle(runner: ScriptedRunner) -> ContainerHandle<ScriptedRunner> {
        ContainerHandle::with_runner(ToolkitConfig::default(), runner)
    }

    fn fancy(rows: &str) -> String {
        format!("{}{}", FANCY_HEADER, rows)
    }

    #[tokio::test]
    async fn test_absent_container_is_not_touched() {
        let h = handle(ScriptedRunner::new().respond("lxc-ls", ok("db\nweb2\n")));
        let outcome = assert_ok!(Destroyer::new(&h).nuke("web").await);

        assert_eq!(outcome, NukeOutcome::NothingToNuke);
        assert_eq!(h.runner().count("lxc-stop"), 0);
        assert_eq!(h.runner().count("lxc-destroy"), 0);
        assert_eq!(h.runner().count("--fancy"), 0);
    }

    #[tokio::test]
    async fn test_running_container_is_stopped_once_then_destroyed() {
        let h = handle(
            ScriptedRunner::new()
                .respond("lxc-ls --fancy", ok(&fancy("web    RUNNING 0         -      10.0.3.12 -\n")))
                .respond("lxc-ls", ok("db web\n")),
        );
        let outcome = assert_ok!(Destroyer::new(&h).nuke("web").await);

        assert_eq!(outcome, NukeOutcome::Destroyed { was_running: true });
        let runner = h.runner();
        assert_eq!(runner.count("lxc-stop -n web"), 1);
        assert_eq!(runner.count("lxc-destroy -n web"), 1);
        assert!(runner.position("lxc-stop").unwrap() < runner.position("lxc-destroy").unwrap());
    }

    #[tokio::test]
    async fn test_stopped_container_is_destroyed_without_stop() {
        let h = handle(
            ScriptedRunner::new()
                .respond("lxc-ls --fancy", ok(&fancy("web    STOPPED 0         -      -         -\n")))
                .respond("lxc-ls", ok("web\n")),
        );
        let outcome = assert_ok!(Destroyer::new(&h).nuke("web").await);

        assert_eq!(outcome, NukeOutcome::Destroyed { was_running: false });
        assert_eq!(h.runner().count("lxc-stop"), 0);
        assert_eq!(h.runner().count("lxc-destroy -n web"), 1);
    }

    #[tokio::test]
    async fn test_running_marker_of_another_container_is_ignored() {
        let h = handle(
            ScriptedRunner::new()
                .respond(
                    "lxc-ls --fancy",
                    ok(&fancy("web    STOPPED 0 - - -\nweb2   RUNNING 0 - 10.0.3.5 -\n")),
                )
                .respond("lxc-ls", ok("web web2\n")),
        );
        assert_eq!(
            assert_ok!(Destroyer::new(&h).state("web").await),
            ContainerState::Stopped
        );
    }

    #[tokio::test]
    async fn test_listing_error_aborts() {
        let h = handle(ScriptedRunner::new().respond("lxc-ls", noisy("lxc-ls: cannot open lxcpath")));
        let err = assert_err!(Destroyer::new(&h).nuke("web").await);
        assert!(matches!(err, DestroyError::ListFailed(_)));
        assert_eq!(h.runner().count("lxc-destroy"), 0);
    }

    #[tokio::test]
    async fn test_running_query_error_aborts() {
        let h = handle(
            ScriptedRunner::new()
                .respond("lxc-ls --fancy", noisy("lxc-ls: failed to get state"))
                .respond("lxc-ls", ok("web\n")),
        );
        let err = assert_err!(Destroyer::new(&h).nuke("web").await);
        assert!(matches!(err, DestroyError::StateQueryFailed { .. }));
        assert_eq!(h.runner().count("lxc-stop"), 0);
        assert_eq!(h.runner().count("lxc-destroy"), 0);
    }

    #[tokio::test]
    async fn test_stop_error_aborts_before_destroy() {
        let h = handle(
            ScriptedRunner::new()
                .respond("lxc-ls --fancy", ok(&fancy("web RUNNING 0 - - -\n")))
                .respond("lxc-ls", ok("web\n"))
                .respond("lxc-stop", noisy("lxc-stop: web: Failed to stop")),
        );
        let err = assert_err!(Destroyer::new(&h).nuke("web").await);
        assert!(matches!(err, DestroyError::StopFailed { .. }));
        assert_eq!(h.runner().count("lxc-destroy"), 0);
    }

    #[tokio::test]
    async fn test_destroy_error_is_reported() {
        let h = handle(
            ScriptedRunner::new()
                .respond("lxc-ls --fancy", ok(&fancy("web STOPPED 0 - - -\n")))
                .respond("lxc-ls", ok("web\n"))
                .respond("lxc-destroy", failed(1, "lxc-destroy: web: busy")),
        );
        let err = assert_err!(Destroyer::new(&h).nuke("web").await);
        match err {
            DestroyError::DestroyFailed { name, .. } => assert_eq!(name, "web"),
            other => panic!("Expected DestroyFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_listing_parsers_match_exact_names() {
        assert!(ContainerState::is_listed("db\nweb\n", "web"));
        assert!(!ContainerState::is_listed("web2 webapp\n", "web"));

        let running = fancy("web RUNNING 0 - - -\n");
        assert_eq!(
            ContainerState::from_fancy_listing(&running, "web"),
            ContainerState::Running
        );
        assert_eq!(
            ContainerState::from_fancy_listing(&fancy(""), "web"),
            ContainerState::Stopped
        );
    }
}

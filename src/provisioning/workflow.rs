use log::{error, info, warn};

use crate::configuration::types::UserDefaults;
use crate::container_management::command::{accounts, apt};
use crate::container_management::runner::CommandRunner;
use crate::container_management::types::ContainerSpec;
use crate::container_management::ContainerHandle;
use crate::error_handling::types::{ContainerError, ProvisionError, UserProvisionError};
use crate::provisioning::packages::PackageSet;
use crate::provisioning::users::UserRecord;

/// `delgroup` exit status when the group does not exist.
const DELGROUP_NO_SUCH_GROUP: i32 = 3;
/// `delgroup --only-if-empty` exit status when the group still has members.
const DELGROUP_NOT_EMPTY: i32 = 5;

/// Everything a provisioning run needs, resolved before the first toolkit call.
#[derive(Debug, Clone)]
pub struct ProvisionPlan {
    pub spec: ContainerSpec,
    /// Adopt an existing container instead of creating one.
    pub use_existing: bool,
    pub packages: PackageSet,
    pub autoremove: bool,
    /// Default admin first, then the user-data records, in file order.
    pub users: Vec<UserRecord>,
}

/// An account that was created, with the ids it received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedUser {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
    pub is_admin: bool,
}

#[derive(Debug, Default)]
pub struct ProvisionReport {
    pub provisioned: Vec<ProvisionedUser>,
    /// Users that were skipped, with the reason.
    pub failed: Vec<(String, UserProvisionError)>,
}

impl ProvisionReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// uid/gid pairs for `users`, sequential from `first_id` in record order.
/// Fails without assigning anything when the range would pass `u32::MAX`.
pub fn assign_ids(
    first_id: u32,
    users: &[UserRecord],
) -> Result<Vec<(u32, &UserRecord)>, ProvisionError> {
    let exhausted = || ProvisionError::IdRangeExhausted {
        first_id,
        users: users.len(),
    };
    users
        .iter()
        .enumerate()
        .map(|(idx, user)| {
            let offset = u32::try_from(idx).map_err(|_| exhausted())?;
            let id = first_id.checked_add(offset).ok_or_else(exhausted)?;
            Ok((id, user))
        })
        .collect()
}

/// Drives create → start → packages → users against one container.
///
/// Setup steps abort the run on the first failure and nothing is rolled
/// back. Individual user failures are logged and skipped.
pub struct Provisioner<'a, R> {
    handle: &'a ContainerHandle<R>,
    settings: &'a UserDefaults,
}

impl<'a, R: CommandRunner> Provisioner<'a, R> {
    pub fn new(handle: &'a ContainerHandle<R>, settings: &'a UserDefaults) -> Self {
        Self { handle, settings }
    }

    pub async fn run(&self, plan: &ProvisionPlan) -> Result<ProvisionReport, ProvisionError> {
        let name = plan.spec.name.as_str();

        if plan.use_existing {
            info!("Bootstrapping existing container {}, skipping creation", name);
        } else {
            self.handle
                .create(&plan.spec)
                .await
                .map_err(ProvisionError::CreateFailed)?;
        }

        self.handle
            .start(name)
            .await
            .map_err(ProvisionError::StartFailed)?;

        self.bootstrap_packages(name, &plan.packages, plan.autoremove)
            .await?;

        let report = self.bootstrap_users(name, &plan.users).await?;
        info!(
            "Bootstrap of {} finished: {} user(s) provisioned, {} failed",
            name,
            report.provisioned.len(),
            report.failed.len()
        );
        Ok(report)
    }

    pub async fn bootstrap_packages(
        &self,
        name: &str,
        packages: &PackageSet,
        autoremove: bool,
    ) -> Result<(), ProvisionError> {
        if packages.to_install().is_empty() {
            info!("No packages to install");
        } else {
            info!("Installing {} package(s)", packages.to_install().len());
            self.handle
                .exec_in(name, apt::install(packages.to_install()))
                .await
                .map_err(ProvisionError::InstallFailed)?;
        }

        if packages.to_exclude().is_empty() {
            info!("No packages to remove");
        } else {
            info!("Removing {} package(s)", packages.to_exclude().len());
            self.handle
                .exec_in(name, apt::remove(packages.to_exclude()))
                .await
                .map_err(ProvisionError::RemoveFailed)?;
        }

        if autoremove {
            info!("Cleaning up with autoremove");
            self.handle
                .exec_in(name, apt::autoremove())
                .await
                .map_err(ProvisionError::AutoremoveFailed)?;
        }
        Ok(())
    }

    /// Removes the template's default account, then creates `users` in order.
    pub async fn bootstrap_users(
        &self,
        name: &str,
        users: &[UserRecord],
    ) -> Result<ProvisionReport, ProvisionError> {
        let assigned = assign_ids(self.settings.first_uid, users)?;
        self.remove_default_user(name).await?;

        let mut report = ProvisionReport::default();
        for (id, user) in assigned {
            match self.create_user(name, user, id, id).await {
                Ok(()) => {
                    info!("Provisioned user '{}' (uid/gid {})", user.name(), id);
                    report.provisioned.push(ProvisionedUser {
                        name: user.name().to_string(),
                        uid: id,
                        gid: id,
                        is_admin: user.is_admin(),
                    });
                }
                Err(e) => {
                    error!(
                        "Something went wrong when bootstrapping user '{}': {}",
                        user.name(),
                        e
                    );
                    report.failed.push((user.name().to_string(), e));
                }
            }
        }
        Ok(report)
    }

    async fn remove_default_user(&self, name: &str) -> Result<(), ProvisionError> {
        let default_user = self.settings.image_default_user.as_str();
        info!("Removing default user and group '{}'", default_user);

        self.handle
            .exec_in(name, accounts::deluser(default_user))
            .await
            .map_err(ProvisionError::DefaultUserCleanupFailed)?;

        match self
            .handle
            .exec_in(name, accounts::delgroup_if_empty(default_user))
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => match e.exit_code() {
                Some(DELGROUP_NO_SUCH_GROUP) => Ok(()),
                Some(DELGROUP_NOT_EMPTY) => {
                    warn!(
                        "Could not delete default group '{}', it's not empty!",
                        default_user
                    );
                    Ok(())
                }
                _ => Err(ProvisionError::DefaultUserCleanupFailed(e)),
            },
        }
    }

    async fn create_user(
        &self,
        name: &str,
        user: &UserRecord,
        uid: u32,
        gid: u32,
    ) -> Result<(), UserProvisionError> {
        let shadow = user.shadow_password()?;

        // The private group must exist before `useradd -g` can reference it
        self.exec(name, accounts::groupadd(gid, user.name())).await?;
        self.exec(
            name,
            accounts::useradd(uid, gid, &shadow, &self.settings.shell, user.name()),
        )
        .await?;

        if user.is_admin() {
            self.exec(
                name,
                accounts::add_to_group(&self.settings.admin_group, user.name()),
            )
            .await?;
        }
        Ok(())
    }

    async fn exec(&self, name: &str, argv: Vec<String>) -> Result<(), ContainerError> {
        self.handle.exec_in(name, argv).await.map(|_| ())
    }
}

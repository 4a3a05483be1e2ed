use clap::Parser;
use log::{error, info, warn};
use lxc_helpers::configuration::Config;
use lxc_helpers::container_management::ContainerHandle;
use lxc_helpers::logging;
use lxc_helpers::provisioning::{
    collect_users, ensure_linux, HostProbe, PackageSet, ProvisionPlan, Provisioner, SpecOverrides,
};
use std::path::PathBuf;

/// Creates (or adopts) an LXC container from the download template, reconciles
/// its packages and provisions user accounts inside it.
#[derive(Parser, Debug)]
#[command(name = "lxc-bootstrap")]
#[command(version)]
#[command(about = "LXC Container Bootstrapper Assistant")]
struct Args {
    /// Don't create a container, run bootstrapping on an already-existing container
    #[arg(short = 'e', long, visible_alias = "bootstrap-existing")]
    existing: bool,

    /// The name to assign to the LXC container
    #[arg(short, long)]
    name: String,

    /// The architecture for the container (detected from the host when omitted)
    #[arg(short, long)]
    arch: Option<String>,

    /// The distribution for the container (detected with lsb_release when omitted)
    #[arg(short, long, visible_alias = "distro")]
    dist: Option<String>,

    /// The specific release of the container (detected with lsb_release when omitted)
    #[arg(short, long, visible_alias = "codename")]
    release: Option<String>,

    /// Comma-separated list of packages to add to the container
    #[arg(long)]
    add_packages: Option<String>,

    /// Comma-separated list of packages to exclude from the container
    #[arg(long)]
    exclude_packages: Option<String>,

    /// File with one user per line in USERNAME:PASSWORD:SALT:ADMIN format, where
    /// SALT is an optional 8-character alphanumeric string and ADMIN is 1/0 or True/False
    #[arg(long, visible_aliases = ["userdata", "userfile"])]
    users: Option<PathBuf>,

    /// Run `apt-get autoremove --purge` after removing packages
    #[arg(long)]
    autoremove: bool,

    /// TOML configuration file (falls back to $LXC_HELPERS_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    logging::init(args.verbose);

    if let Err(e) = run(args).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    ensure_linux()?;
    let config = Config::load(args.config.as_deref())?;
    let handle = ContainerHandle::new(config.toolkit.clone());

    let spec = HostProbe::new(handle.runner(), &config.toolkit)
        .spec_for(
            &args.name,
            SpecOverrides {
                architecture: args.arch,
                distribution: args.dist,
                release: args.release,
            },
            args.existing,
        )
        .await?;

    let packages = PackageSet::resolve(
        &config.packages,
        args.add_packages.as_deref(),
        args.exclude_packages.as_deref(),
    );
    let users = collect_users(&config.users.default_admin, args.users.as_deref())?;
    info!("{} user(s) to provision", users.len());

    let plan = ProvisionPlan {
        spec,
        use_existing: args.existing,
        packages,
        autoremove: args.autoremove,
        users,
    };

    let report = Provisioner::new(&handle, &config.users).run(&plan).await?;
    for (name, e) in &report.failed {
        warn!("User '{}' was not provisioned: {}", name, e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_args() {
        let args = Args::try_parse_from(["lxc-bootstrap", "--name", "web"]).unwrap();
        assert_eq!(args.name, "web");
        assert!(!args.existing);
        assert!(!args.autoremove);
        assert!(args.arch.is_none());
        assert!(args.users.is_none());
    }

    #[test]
    fn test_aliases_and_short_flags() {
        let args = Args::try_parse_from([
            "lxc-bootstrap",
            "--bootstrap-existing",
            "-n",
            "'web'",
            "-a",
            "arm64",
            "--distro",
            "debian",
            "--codename",
            "bookworm",
            "--userfile",
            "/tmp/users",
            "--add-packages",
            "vim,lxc",
        ])
        .unwrap();
        assert!(args.existing);
        assert_eq!(args.name, "'web'");
        assert_eq!(args.arch.as_deref(), Some("arm64"));
        assert_eq!(args.dist.as_deref(), Some("debian"));
        assert_eq!(args.release.as_deref(), Some("bookworm"));
        assert_eq!(args.users, Some(PathBuf::from("/tmp/users")));
        assert_eq!(args.add_packages.as_deref(), Some("vim,lxc"));
    }

    #[test]
    fn test_name_is_required() {
        assert!(Args::try_parse_from(["lxc-bootstrap", "--existing"]).is_err());
    }
}

use clap::Parser;
use log::error;
use lxc_helpers::configuration::Config;
use lxc_helpers::container_management::ContainerHandle;
use lxc_helpers::logging;
use lxc_helpers::teardown::Destroyer;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lxc-nuke")]
#[command(version)]
#[command(
    about = "A script that can find and destroy both active and inactive LXC containers."
)]
struct Args {
    /// The name of the container to 'nuke'
    name: String,

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

    let config = Config::load(args.config.as_deref()).unwrap_or_else(|e| {
        error!("Unable to load configuration: {}", e);
        std::process::exit(1);
    });

    let handle = ContainerHandle::new(config.toolkit);
    if let Err(e) = Destroyer::new(&handle).nuke(&args.name).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_name() {
        let args = Args::try_parse_from(["lxc-nuke", "web"]).unwrap();
        assert_eq!(args.name, "web");
        assert!(args.config.is_none());
    }

    #[test]
    fn test_name_is_required() {
        assert!(Args::try_parse_from(["lxc-nuke"]).is_err());
    }
}

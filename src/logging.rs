//! env_logger setup shared by both binaries.
//!
//! Operator messages are `info!` lines and go to stdout together with the
//! mirrored toolkit output. `RUST_LOG` still applies on top of the level chosen
//! here.

use log::LevelFilter;

pub fn level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

pub fn init(verbose: bool) {
    // https://docs.rs/env_logger/latest/env_logger/
    let _ = env_logger::Builder::new()
        .filter_level(level(verbose))
        .parse_default_env()
        .format_target(false)
        .target(env_logger::Target::Stdout)
        .try_init();
}

use log::debug;
use std::collections::BTreeSet;

use crate::configuration::types::PackageDefaults;

/// Packages to install and to purge inside the container.
///
/// The two sets are always disjoint: a name that is both requested and
/// excluded is only ever removed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackageSet {
    to_install: BTreeSet<String>,
    to_exclude: BTreeSet<String>,
}

impl PackageSet {
    /// Merges the configured defaults with the operator's comma-separated
    /// `--add-packages` / `--exclude-packages` lists.
    pub fn resolve(defaults: &PackageDefaults, add: Option<&str>, exclude: Option<&str>) -> Self {
        let mut to_install: BTreeSet<String> = normalize(defaults.install.iter().map(String::as_str));
        let mut to_exclude: BTreeSet<String> = normalize(defaults.exclude.iter().map(String::as_str));

        if let Some(add) = add {
            to_install.extend(parse_list(add));
        }
        if let Some(exclude) = exclude {
            to_exclude.extend(parse_list(exclude));
        }

        to_install.retain(|p| !to_exclude.contains(p));
        debug!(
            "Resolved packages: install={:?} exclude={:?}",
            to_install, to_exclude
        );

        Self {
            to_install,
            to_exclude,
        }
    }

    pub fn to_install(&self) -> &BTreeSet<String> {
        &self.to_install
    }

    pub fn to_exclude(&self) -> &BTreeSet<String> {
        &self.to_exclude
    }
}

/// Splits a comma-separated package list, lowercasing and dropping blanks.
pub fn parse_list(list: &str) -> BTreeSet<String> {
    normalize(list.split(','))
}

fn normalize<'a>(names: impl Iterator<Item = &'a str>) -> BTreeSet<String> {
    names
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect()
}

//! Package installation resource.
use std::collections::HashSet;

use anyhow::Result;

use super::{Applicable, ResourceChange, ResourceState};
use crate::exec::Executor;
use crate::packages::PackageManager;

/// A system package resource that can be checked and installed.
#[derive(Debug)]
pub struct PackageResource<'a> {
    /// Package name.
    pub name: String,
    /// Package manager to use.
    pub manager: PackageManager,
    /// Executor for running package manager commands.
    executor: &'a dyn Executor,
}

impl<'a> PackageResource<'a> {
    /// Create a new package resource.
    #[must_use]
    pub const fn new(name: String, manager: PackageManager, executor: &'a dyn Executor) -> Self {
        Self {
            name,
            manager,
            executor,
        }
    }

    /// Determine the resource state from a pre-fetched set of installed package names.
    #[must_use]
    pub fn state_from_installed(&self, installed: &HashSet<String>) -> ResourceState {
        if installed.contains(&self.name) {
            ResourceState::Correct
        } else {
            ResourceState::Missing
        }
    }
}

/// Query which of `names` are installed, with a single command.
///
/// # Errors
///
/// Returns an error if the query command cannot be executed.
pub fn get_installed_packages(
    manager: PackageManager,
    names: &[&str],
    executor: &dyn Executor,
) -> Result<HashSet<String>> {
    if names.is_empty() {
        return Ok(HashSet::new());
    }
    let mut set = HashSet::new();
    match manager {
        PackageManager::Apt => {
            // One line per known package: "<name> <want> <flag> <status>".
            // Unknown packages make dpkg-query exit 1 but still report the rest.
            let mut args = vec!["-W", "-f=${Package} ${Status}\\n"];
            args.extend_from_slice(names);
            let result = executor.run_unchecked(manager.query_program(), &args)?;
            for line in result.stdout.lines() {
                if let Some((name, status)) = line.split_once(' ')
                    && status.trim() == "install ok installed"
                {
                    set.insert(name.to_string());
                }
            }
        }
        PackageManager::Yum | PackageManager::Zypper => {
            // Installed packages print their name; missing ones print
            // "package <name> is not installed".
            let mut args = vec!["-q", "--qf", "%{NAME}\\n"];
            args.extend_from_slice(names);
            let result = executor.run_unchecked(manager.query_program(), &args)?;
            for line in result.stdout.lines() {
                let line = line.trim();
                if names.contains(&line) {
                    set.insert(line.to_string());
                }
            }
        }
    }
    Ok(set)
}

/// Install command for `manager`, without package names.
const fn install_command(manager: PackageManager) -> (&'static str, &'static [&'static str]) {
    match manager {
        PackageManager::Apt => ("apt-get", &["install", "-y", "-q"]),
        PackageManager::Yum => ("yum", &["install", "-y", "-q"]),
        PackageManager::Zypper => ("zypper", &["--non-interactive", "install"]),
    }
}

/// Install a batch of packages in one command per package manager.
///
/// # Errors
///
/// Returns an error if any package manager command fails.
pub fn batch_install_packages(resources: &[&PackageResource<'_>]) -> Result<()> {
    for manager in [PackageManager::Apt, PackageManager::Yum, PackageManager::Zypper] {
        let group: Vec<&&PackageResource<'_>> =
            resources.iter().filter(|r| r.manager == manager).collect();
        let Some(first) = group.first() else {
            continue;
        };
        let (program, base) = install_command(manager);
        let mut args: Vec<&str> = base.to_vec();
        args.extend(group.iter().map(|r| r.name.as_str()));
        first.executor.run(program, &args)?;
    }
    Ok(())
}

impl Applicable for PackageResource<'_> {
    fn description(&self) -> String {
        format!("{} ({})", self.name, self.manager)
    }

    fn apply(&self) -> Result<ResourceChange> {
        let (program, base) = install_command(self.manager);
        let mut args: Vec<&str> = base.to_vec();
        args.push(&self.name);
        self.executor.run(program, &args)?;
        Ok(ResourceChange::Applied)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;

    #[test]
    fn description_names_manager() {
        let executor = MockExecutor::ok("");
        let resource = PackageResource::new("pam".to_string(), PackageManager::Yum, &executor);
        assert_eq!(resource.description(), "pam (yum)");
    }

    #[test]
    fn dpkg_status_is_parsed() {
        let executor = MockExecutor::ok(
            "libpam0g install ok installed\n\
             libpam-modules deinstall ok config-files\n\
             libpam-runtime install ok installed\n",
        );
        let installed = get_installed_packages(
            PackageManager::Apt,
            &["libpam0g", "libpam-modules", "libpam-runtime"],
            &executor,
        )
        .unwrap();
        assert!(installed.contains("libpam0g"));
        assert!(installed.contains("libpam-runtime"));
        assert!(!installed.contains("libpam-modules"));
        assert!(executor.calls()[0].starts_with("dpkg-query -W"));
    }

    #[test]
    fn rpm_output_is_parsed() {
        let executor = MockExecutor::with_responses(vec![(
            false,
            "package pam is not installed\n".to_string(),
        )]);
        let installed = get_installed_packages(PackageManager::Yum, &["pam"], &executor).unwrap();
        assert!(installed.is_empty());

        let executor = MockExecutor::ok("pam\n");
        let installed =
            get_installed_packages(PackageManager::Zypper, &["pam"], &executor).unwrap();
        assert!(installed.contains("pam"));
    }

    #[test]
    fn empty_query_runs_nothing() {
        let executor = MockExecutor::ok("");
        let installed = get_installed_packages(PackageManager::Apt, &[], &executor).unwrap();
        assert!(installed.is_empty());
        assert_eq!(executor.call_count(), 0);
    }

    #[test]
    fn state_from_installed() {
        let executor = MockExecutor::ok("");
        let resource = PackageResource::new("pam".to_string(), PackageManager::Yum, &executor);
        let mut installed = HashSet::new();
        assert_eq!(resource.state_from_installed(&installed), ResourceState::Missing);
        installed.insert("pam".to_string());
        assert_eq!(resource.state_from_installed(&installed), ResourceState::Correct);
    }

    #[test]
    fn batch_install_issues_one_command() {
        let executor = MockExecutor::ok("");
        let a = PackageResource::new("libpam0g".to_string(), PackageManager::Apt, &executor);
        let b = PackageResource::new("libpam-modules".to_string(), PackageManager::Apt, &executor);
        batch_install_packages(&[&a, &b]).unwrap();
        assert_eq!(
            executor.calls(),
            vec!["apt-get install -y -q libpam0g libpam-modules"]
        );
    }

    #[test]
    fn failed_install_propagates() {
        let executor = MockExecutor::fail();
        let resource = PackageResource::new("pam".to_string(), PackageManager::Zypper, &executor);
        assert!(resource.apply().is_err());
        assert_eq!(executor.calls(), vec!["zypper --non-interactive install pam"]);
    }
}

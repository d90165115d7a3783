use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::future::Future;

use shellboot_backend::{
    InstalledPackage, ModuleRegistry, PackageManager, SourceError, UpdateNotice, UpdateResult,
    UpdateTarget,
};

/// What a source knows about one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionProbe {
    NotInstalled,
    Versions { installed: String, available: String },
}

/// Compare installed and available versions for every target, in order.
///
/// Versions are compared as plain strings: any difference is reported.
/// Identifiers are case-insensitive, so `Git.Git` and `git.git` are one target.
/// Targets that are not installed, or whose probe fails, are skipped with a
/// warning. A source-level failure ends the check early and yields
/// [`UpdateResult::UpToDate`].
pub async fn check_updates<F, Fut>(
    checker: &'static str,
    targets: &[UpdateTarget],
    mut probe: F,
) -> UpdateResult
where
    F: FnMut(&UpdateTarget) -> Fut,
    Fut: Future<Output = Result<VersionProbe, SourceError>>,
{
    let mut notices = Vec::new();
    let mut seen = HashSet::new();

    for target in targets {
        if !seen.insert(target.identifier.to_lowercase()) {
            debug!("{checker}: ignoring duplicate target {target}");
            continue;
        }

        match probe(target).await {
            Ok(VersionProbe::NotInstalled) => {
                warn!("{checker}: {target} is not installed, skipping");
            }
            Ok(VersionProbe::Versions {
                installed,
                available,
            }) => {
                let (installed, available) = (installed.trim(), available.trim());
                if installed == available {
                    debug!("{checker}: {target} is up to date at {installed}");
                } else {
                    notices.push(UpdateNotice::version_mismatch(
                        &target.identifier,
                        installed,
                        available,
                    ));
                }
            }
            Err(e) if e.is_source_level() => {
                warn!("{checker}: source unavailable, reporting no updates: {e}");
                return UpdateResult::UpToDate;
            }
            Err(e) => {
                warn!("{checker}: could not query {target}, skipping: {e}");
            }
        }
    }

    UpdateResult::from_notices(notices)
}

/// Package-manager checker: one batched listing, then a per-target lookup.
pub async fn check_package_updates(
    manager: &dyn PackageManager,
    targets: &[UpdateTarget],
) -> UpdateResult {
    if targets.is_empty() {
        return UpdateResult::UpToDate;
    }

    let ids: Vec<String> = targets.iter().map(|t| t.identifier.clone()).collect();
    let installed = match manager.list_installed(&ids).await {
        Ok(installed) => installed,
        Err(e) => {
            warn!(
                "packages: listing through {} failed, reporting no updates: {e}",
                manager.name()
            );
            return UpdateResult::UpToDate;
        }
    };

    // Package ids are case-insensitive for the managers we talk to.
    let by_id: HashMap<String, InstalledPackage> = installed
        .into_iter()
        .map(|package| (package.id.to_lowercase(), package))
        .collect();

    check_updates("packages", targets, |target| {
        let probe = match by_id.get(&target.identifier.to_lowercase()) {
            None => VersionProbe::NotInstalled,
            Some(package) => VersionProbe::Versions {
                installed: package.version.clone(),
                available: package
                    .available
                    .clone()
                    .unwrap_or_else(|| package.version.clone()),
            },
        };
        std::future::ready(Ok(probe))
    })
    .await
}

/// Module-registry checker: installed version, then the repository's version.
pub async fn check_module_updates(
    registry: &dyn ModuleRegistry,
    targets: &[UpdateTarget],
) -> UpdateResult {
    check_updates("modules", targets, |target| {
        probe_module(registry, target.identifier.clone(), target.source.clone())
    })
    .await
}

async fn probe_module(
    registry: &dyn ModuleRegistry,
    module: String,
    repository: String,
) -> Result<VersionProbe, SourceError> {
    let Some(installed) = registry.installed_version(&module).await? else {
        return Ok(VersionProbe::NotInstalled);
    };
    let available = registry.available_version(&module, &repository).await?;
    Ok(VersionProbe::Versions {
        installed,
        available,
    })
}

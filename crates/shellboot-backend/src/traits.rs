use async_trait::async_trait;

use crate::error::SourceError;
use crate::types::InstalledPackage;

/// A package manager that can report installed packages together with the
/// version it would upgrade them to.
#[async_trait]
pub trait PackageManager: Send + Sync + PackageManagerClone {
    fn name(&self) -> &'static str;

    /// List the installed packages whose id is in `ids`. Ids that are not
    /// installed are simply absent from the result.
    async fn list_installed(&self, ids: &[String]) -> Result<Vec<InstalledPackage>, SourceError>;
}

/// A module registry with a local install location.
#[async_trait]
pub trait ModuleRegistry: Send + Sync + ModuleRegistryClone {
    fn name(&self) -> &'static str;

    /// Installed version of `module`, or `None` when it is not installed.
    async fn installed_version(&self, module: &str) -> Result<Option<String>, SourceError>;

    async fn available_version(&self, module: &str, repository: &str)
    -> Result<String, SourceError>;

    async fn install(&self, module: &str, repository: &str) -> Result<(), SourceError>;
}

pub trait PackageManagerClone: Send + Sync {
    fn clone_box(&self) -> Box<dyn PackageManager>;
}

impl<T> PackageManagerClone for T
where
    T: 'static + PackageManager + Clone,
{
    fn clone_box(&self) -> Box<dyn PackageManager> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn PackageManager> {
    fn clone(&self) -> Box<dyn PackageManager> {
        self.clone_box()
    }
}

pub trait ModuleRegistryClone: Send + Sync {
    fn clone_box(&self) -> Box<dyn ModuleRegistry>;
}

impl<T> ModuleRegistryClone for T
where
    T: 'static + ModuleRegistry + Clone,
{
    fn clone_box(&self) -> Box<dyn ModuleRegistry> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn ModuleRegistry> {
    fn clone(&self) -> Box<dyn ModuleRegistry> {
        self.clone_box()
    }
}

use async_trait::async_trait;
use log::{debug, info};

use shellboot_backend::{ModuleRegistry, SourceError};

use crate::client::PowerShellClient;

/// PowerShell modules managed through PowerShellGet.
#[derive(Debug, Clone)]
pub struct PsGalleryRegistry {
    client: PowerShellClient,
}

impl PsGalleryRegistry {
    #[must_use]
    pub fn new(client: PowerShellClient) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn detect() -> Self {
        Self::new(PowerShellClient::detect())
    }
}

#[async_trait]
impl ModuleRegistry for PsGalleryRegistry {
    fn name(&self) -> &'static str {
        "psgallery"
    }

    async fn installed_version(&self, module: &str) -> Result<Option<String>, SourceError> {
        debug!("psgallery: looking up installed version of {module}");
        self.client.installed_version(module).await
    }

    async fn available_version(
        &self,
        module: &str,
        repository: &str,
    ) -> Result<String, SourceError> {
        debug!("psgallery: looking up {module} in {repository}");
        self.client.available_version(module, repository).await
    }

    async fn install(&self, module: &str, repository: &str) -> Result<(), SourceError> {
        info!("psgallery: installing {module} from {repository}");
        self.client.install(module, repository).await
    }
}

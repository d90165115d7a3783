mod error;
mod traits;
mod types;

pub use error::SourceError;
pub use traits::{ModuleRegistry, ModuleRegistryClone, PackageManager, PackageManagerClone};
pub use types::{InstalledPackage, UpdateNotice, UpdateResult, UpdateTarget};

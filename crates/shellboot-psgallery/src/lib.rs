mod backend;
mod client;

pub use backend::PsGalleryRegistry;
pub use client::{PowerShellClient, detect_powershell};

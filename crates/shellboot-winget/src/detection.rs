use std::path::PathBuf;
use which::which;

/// Locate the `winget` executable, preferring `PATH`.
#[must_use]
pub fn detect_winget() -> Option<PathBuf> {
    if let Ok(path) = which("winget") {
        return Some(path);
    }

    common_winget_paths().into_iter().find(|path| path.exists())
}

fn common_winget_paths() -> Vec<PathBuf> {
    #[allow(unused_mut)]
    let mut paths = Vec::new();

    #[cfg(target_os = "windows")]
    {
        if let Some(local_app_data) = dirs::data_local_dir() {
            paths.push(
                local_app_data
                    .join("Microsoft")
                    .join("WindowsApps")
                    .join("winget.exe"),
            );
        }
    }

    paths
}

use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Directory holding persisted results and the log file
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("flick"),
            )
        } else {
            ProjectDirs::from("", "", "flick").map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn results_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join(crate::results::NAMESPACE_KEY).with_extension("json"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("flick.log"))
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "flick").map(|pd| pd.config_dir().join("config.json"))
    }
}

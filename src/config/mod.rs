pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{PacingSettings, Settings};

use crate::error::AppResult;

const DEFAULT_PROFILE: &str = "default";

pub fn resolve_profile(requested: &str) -> String {
    match requested.trim() {
        "" => DEFAULT_PROFILE.to_string(),
        name => name.to_string(),
    }
}

pub fn load_settings(paths: &AppPaths, profile: &str) -> AppResult<Settings> {
    settings::load(paths.settings_file(profile))
}

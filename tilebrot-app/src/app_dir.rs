//! Where the binary keeps its own files when no path is given. The settings
//! file and the default output folder both sit beside the executable.

use std::path::PathBuf;

const SETTINGS_FILE: &str = "settings.json";
const OUTPUT_DIR: &str = "images";

/// Folder holding the running executable, or the working directory when
/// the executable path cannot be resolved.
fn install_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn default_settings_path() -> PathBuf {
    install_dir().join(SETTINGS_FILE)
}

/// Frames land here unless `output_dir` is set.
pub fn default_output_dir() -> PathBuf {
    install_dir().join(OUTPUT_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_share_the_install_dir() {
        let settings = default_settings_path();
        let output = default_output_dir();
        assert_eq!(settings.parent(), output.parent());
        assert_eq!(settings.file_name().unwrap(), SETTINGS_FILE);
        assert_eq!(output.file_name().unwrap(), OUTPUT_DIR);
    }
}

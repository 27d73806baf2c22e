//! Platform directory lookup.

use std::path::PathBuf;

use crate::constants::APP_DIR_NAME;
use crate::error::{EhError, EhResult};

/// Get the platform-specific data directory (log files live here).
///
/// - Windows: `%APPDATA%/everhome`
/// - macOS: `~/Library/Application Support/everhome`
/// - Linux: `~/.local/share/everhome`
pub fn data_dir() -> EhResult<PathBuf> {
    let base = dirs::data_dir()
        .ok_or_else(|| EhError::Config("could not determine data directory".into()))?;
    Ok(base.join(APP_DIR_NAME))
}

/// Get the platform-specific configuration directory.
///
/// - Windows: `%APPDATA%/everhome`
/// - macOS: `~/Library/Application Support/everhome`
/// - Linux: `~/.config/everhome`
pub fn config_dir() -> EhResult<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| EhError::Config("could not determine config directory".into()))?;
    Ok(base.join(APP_DIR_NAME))
}

//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Environment variable holding the software root directory.
pub const SW_ROOT_ENV_VAR: &str = "STREETBOT_SW_ROOT";

/// Get the software root directory.
///
/// The root is read from `STREETBOT_SW_ROOT`. If the variable is not set the current working
/// directory is used instead, so the executable can be run straight from a checkout.
pub fn get_sw_root() -> std::io::Result<PathBuf> {
    match env::var_os(SW_ROOT_ENV_VAR) {
        Some(root) => Ok(PathBuf::from(root)),
        None => env::current_dir(),
    }
}

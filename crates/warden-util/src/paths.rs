//! Default paths for wardend components
//!
//! wardend normally runs as a system service, so the defaults live
//! under /etc and /run. Both can be overridden (config via the
//! `--config` flag, socket via `$WARDEN_SOCKET` or `--socket`).

use std::path::PathBuf;

/// Environment variable for overriding the socket path
pub const WARDEN_SOCKET_ENV: &str = "WARDEN_SOCKET";

/// Socket filename within the socket directory
const SOCKET_FILENAME: &str = "wardend.sock";

/// Application subdirectory name
const APP_DIR: &str = "wardend";

/// Get the default configuration file path.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("/etc/warden/warden.toml")
}

/// Get the default socket path.
///
/// Order of precedence:
/// 1. `$WARDEN_SOCKET` environment variable (if set)
/// 2. `$XDG_RUNTIME_DIR/wardend/wardend.sock` (unprivileged runs)
/// 3. `/run/wardend/wardend.sock`
pub fn default_socket_path() -> PathBuf {
    if let Ok(path) = std::env::var(WARDEN_SOCKET_ENV) {
        return PathBuf::from(path);
    }

    socket_path_without_env()
}

/// Get the socket path without checking the WARDEN_SOCKET env var.
/// Used for default values in configs where the env var is checked
/// separately.
pub fn socket_path_without_env() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(runtime_dir)
            .join(APP_DIR)
            .join(SOCKET_FILENAME);
    }

    PathBuf::from("/run").join(APP_DIR).join(SOCKET_FILENAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_path_names_the_daemon() {
        let path = socket_path_without_env();
        assert!(path.to_string_lossy().contains("wardend"));
        assert!(path.to_string_lossy().contains(".sock"));
    }

    #[test]
    fn config_path_is_under_etc() {
        assert!(default_config_path().starts_with("/etc/warden"));
    }
}

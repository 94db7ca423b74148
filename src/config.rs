use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Sorriso";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the application data directory
/// ~/Sorriso/ on all platforms (user-visible, per clinic request)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Sorriso")
}

/// Get the path of the practice database
pub fn database_path() -> PathBuf {
    app_data_dir().join("sorriso.db")
}

/// Default tracing filter when RUST_LOG is not set
pub fn default_log_filter() -> &'static str {
    "sorriso=info,tower_http=warn"
}

/// Address the admin API binds to. `SORRISO_BIND` overrides the default.
pub fn bind_addr() -> SocketAddr {
    std::env::var("SORRISO_BIND")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8600)))
}

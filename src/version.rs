// Build-time version from Cargo.toml

/// Package version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name (from Cargo.toml).
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Console window title.
pub fn window_title() -> String {
    format!("RIG Poller ({} v{})", NAME, VERSION)
}

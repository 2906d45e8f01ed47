//! Configuration for TrayStore
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a FileStorage instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all tray files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── .index          (encoded key metadata)
    ///     └── <key>           (one file per key)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Cache Configuration
    // -------------------------------------------------------------------------
    /// Read every live tray's file into its cache while opening.
    /// When false, caches fill on first read or write.
    pub eager_load: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./traystore_data"),
            eager_load: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all tray files)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Enable or disable cache hydration on open
    pub fn eager_load(mut self, enabled: bool) -> Self {
        self.config.eager_load = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

//! Application paths for config, cache, and data.

use directories::{BaseDirs, ProjectDirs};
use std::path::{Path, PathBuf};

/// Application paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Configuration directory.
    pub config: PathBuf,
    /// Cache directory.
    pub cache: PathBuf,
    /// Data directory.
    pub data: PathBuf,
}

impl AppPaths {
    /// Create paths for the shopdir application.
    #[must_use]
    pub fn new() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("com", "shopdir", "shopdir") {
            Self {
                config: proj_dirs.config_dir().to_path_buf(),
                cache: proj_dirs.cache_dir().to_path_buf(),
                data: proj_dirs.data_dir().to_path_buf(),
            }
        } else {
            // Fallback to home directory
            let home = BaseDirs::new().map_or_else(|| PathBuf::from("."), |b| b.home_dir().to_path_buf());
            Self {
                config: home.join(".config/shopdir"),
                cache: home.join(".cache/shopdir"),
                data: home.join(".local/share/shopdir"),
            }
        }
    }

    /// All three directories under one root (tests, portable installs).
    #[must_use]
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            config: root.join("config"),
            cache: root.join("cache"),
            data: root.join("data"),
        }
    }

    /// Path to the config file.
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.toml")
    }

    /// Path to the plain preference store (fallback token backend).
    #[must_use]
    pub fn preferences_file(&self) -> PathBuf {
        self.config.join("preferences.json")
    }

    /// Path to the database holding the home cache and search history.
    #[must_use]
    pub fn database_file(&self) -> PathBuf {
        self.data.join("shopdir.sqlite")
    }

    /// Ensure all directories exist.
    ///
    /// # Errors
    /// Returns an error if any directory cannot be created.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config)?;
        std::fs::create_dir_all(&self.cache)?;
        std::fs::create_dir_all(&self.data)?;
        Ok(())
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

/// Module-level function for accessing dirs crate.
mod dirs {
    use std::path::PathBuf;

    pub fn home_dir() -> Option<PathBuf> {
        directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
    }
}

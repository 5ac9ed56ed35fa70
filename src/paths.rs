//! Writable per-application directories.

use std::path::PathBuf;

const APP_DIR_NAME: &str = "contact_list";

/// Supplies the directory holding writable databases.
pub trait PathResolver: Send + Sync {
    fn database_dir(&self) -> PathBuf;
}

/// `<data dir>/contact_list/databases`, falling back to the working directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct AppDataPaths;

impl PathResolver for AppDataPaths {
    fn database_dir(&self) -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
            .join("databases")
    }
}

/// An explicitly configured directory.
#[derive(Debug, Clone)]
pub struct FixedPaths(pub PathBuf);

impl PathResolver for FixedPaths {
    fn database_dir(&self) -> PathBuf {
        self.0.clone()
    }
}

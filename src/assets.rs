//! Read-only access to files bundled next to the application.

use std::{
    fs::File,
    io::{self, Read},
    path::{Component, Path, PathBuf},
};

/// First numeric suffix used for split asset parts (`<name>.101`).
pub const SPLIT_SUFFIX_BASE: u32 = 100;

/// Keyed provider of bundled, read-only blobs.
pub trait AssetStore: Send + Sync {
    /// Opens the named asset for streaming.
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + Send>>;
}

/// Returns the key of the `part`-th piece (1-based) of a split asset.
pub fn split_part_name(asset_name: &str, part: u32) -> String {
    format!("{}.{}", asset_name, SPLIT_SUFFIX_BASE + part)
}

/// Assets served from a directory shipped with the executable.
#[derive(Debug, Clone)]
pub struct DirAssetStore {
    root: PathBuf,
}

impl DirAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<executable dir>/assets`, or `./assets` when the executable path is unknown.
    pub fn beside_executable() -> Self {
        let root = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("assets");
        Self::new(root)
    }

    fn resolve(&self, name: &str) -> io::Result<PathBuf> {
        let relative = Path::new(name);
        let is_plain_file_name = !name.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)))
            && relative.components().count() == 1;
        if !is_plain_file_name {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("asset name must be a plain file name: {name:?}"),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl AssetStore for DirAssetStore {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + Send>> {
        let path = self.resolve(name)?;
        let file = File::open(&path)?;
        Ok(Box::new(file))
    }
}

#[cfg(test)]
pub(crate) use self::memory::MemoryAssetStore;

//! First-run materialization of the bundled city database into the app data directory.

use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use log::{debug, info, warn};
use rusqlite::{Connection, OpenFlags};

use crate::{
    assets::{split_part_name, AssetStore},
    db_manager::{open_versioned_with_flags, NoSchema, SchemaHook},
    paths::PathResolver,
};

/// Failure while materializing or opening the bundled database.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("could not create database directory {}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("could not remove stale database {}", .path.display())]
    RemoveStale { path: PathBuf, source: io::Error },
    #[error("could not create empty database {}", .path.display())]
    CreateEmpty {
        path: PathBuf,
        source: rusqlite::Error,
    },
    #[error("could not open {} for writing", .path.display())]
    OpenTarget { path: PathBuf, source: io::Error },
    #[error("could not open bundled asset `{name}`")]
    OpenAsset { name: String, source: io::Error },
    #[error("could not copy asset `{name}` into {}", .path.display())]
    CopyAsset {
        name: String,
        path: PathBuf,
        source: io::Error,
    },
    #[error("could not flush {}", .path.display())]
    Flush { path: PathBuf, source: io::Error },
    #[error("a split asset needs at least one part")]
    NoParts,
    #[error("could not open database {}", .path.display())]
    OpenWritable {
        path: PathBuf,
        source: rusqlite::Error,
    },
    #[error("database query failed")]
    Query(#[source] rusqlite::Error),
}

/// Names and schema version of the materialized database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub target_name: String,
    pub asset_name: String,
    pub version: u32,
}

/// Result of a successful `ensure` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// A readable database was already in place; nothing was touched.
    AlreadyPresent,
    /// The asset was copied; carries the number of bytes written.
    Copied(u64),
}

/// Copies the bundled database into a writable location exactly once.
///
/// `ensure` and `ensure_large` block on file and asset I/O and must run off
/// the UI thread. Calls within one process are serialized internally.
pub struct DatabaseBootstrapper {
    assets: Arc<dyn AssetStore>,
    paths: Arc<dyn PathResolver>,
    settings: DatabaseSettings,
    hook: Box<dyn SchemaHook>,
    materialize_lock: Mutex<()>,
    writable: Mutex<Option<Connection>>,
}

impl DatabaseBootstrapper {
    pub fn new(
        assets: Arc<dyn AssetStore>,
        paths: Arc<dyn PathResolver>,
        settings: DatabaseSettings,
    ) -> Self {
        Self {
            assets,
            paths,
            settings,
            hook: Box::new(NoSchema),
            materialize_lock: Mutex::new(()),
            writable: Mutex::new(None),
        }
    }

    pub fn version(&self) -> u32 {
        self.settings.version
    }

    pub fn database_dir(&self) -> PathBuf {
        self.paths.database_dir()
    }

    pub fn target_path(&self) -> PathBuf {
        self.database_dir().join(&self.settings.target_name)
    }

    /// Copies the single asset blob into place unless a readable database exists.
    pub fn ensure(&self) -> Result<EnsureOutcome, BootstrapError> {
        self.materialize(|target, output| {
            self.copy_asset(&self.settings.asset_name, target, output)
        })
    }

    /// Like [`Self::ensure`], but concatenates `parts` pieces named
    /// `<asset>.101 ..= <asset>.(100 + parts)` in ascending order.
    pub fn ensure_large(&self, parts: u32) -> Result<EnsureOutcome, BootstrapError> {
        if parts == 0 {
            return Err(BootstrapError::NoParts);
        }
        self.materialize(|target, output| {
            let mut total = 0u64;
            for part in 1..=parts {
                let name = split_part_name(&self.settings.asset_name, part);
                total += self.copy_asset(&name, target, output)?;
                output.flush().map_err(|source| BootstrapError::Flush {
                    path: target.to_path_buf(),
                    source,
                })?;
            }
            Ok(total)
        })
    }

    /// Runs `query` against the cached read/write connection, opening it at
    /// the configured version on first use.
    ///
    /// Never creates the target: call [`Self::ensure`] first, or this fails
    /// with [`BootstrapError::OpenWritable`].
    pub fn with_writable<T>(
        &self,
        query: impl FnOnce(&Connection) -> Result<T, rusqlite::Error>,
    ) -> Result<T, BootstrapError> {
        let mut slot = self
            .writable
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let conn = match &mut *slot {
            Some(conn) => conn,
            empty => {
                let path = self.target_path();
                let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX
                    | OpenFlags::SQLITE_OPEN_URI;
                let conn = open_versioned_with_flags(
                    &path,
                    flags,
                    self.settings.version,
                    self.hook.as_ref(),
                )
                .map_err(|source| BootstrapError::OpenWritable { path, source })?;
                empty.insert(conn)
            }
        };
        query(conn).map_err(BootstrapError::Query)
    }

    /// Drops the cached connection, if any.
    pub fn close(&self) {
        let previous = self
            .writable
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_some() {
            debug!("Closed cached database handle");
        }
    }

    fn materialize<F>(&self, copy: F) -> Result<EnsureOutcome, BootstrapError>
    where
        F: FnOnce(&Path, &mut BufWriter<File>) -> Result<u64, BootstrapError>,
    {
        let _guard = self
            .materialize_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let dir = self.paths.database_dir();
        let target = dir.join(&self.settings.target_name);
        if database_is_readable(&target) {
            debug!("Database already present. path={}", target.display());
            return Ok(EnsureOutcome::AlreadyPresent);
        }

        fs::create_dir_all(&dir).map_err(|source| BootstrapError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        if target.exists() {
            warn!(
                "Removing unusable database before re-copy. path={}",
                target.display()
            );
            fs::remove_file(&target).map_err(|source| BootstrapError::RemoveStale {
                path: target.clone(),
                source,
            })?;
        }
        // Registers the path with SQLite before the bytes are replaced.
        drop(
            Connection::open(&target).map_err(|source| BootstrapError::CreateEmpty {
                path: target.clone(),
                source,
            })?,
        );

        match write_target(&target, copy) {
            Ok(bytes) => {
                info!(
                    "Materialized bundled database. path={} bytes={}",
                    target.display(),
                    bytes
                );
                Ok(EnsureOutcome::Copied(bytes))
            }
            Err(err) => {
                if let Err(remove_err) = fs::remove_file(&target) {
                    warn!(
                        "Could not remove partial database. path={} error={}",
                        target.display(),
                        remove_err
                    );
                }
                Err(err)
            }
        }
    }

    fn copy_asset(
        &self,
        name: &str,
        target: &Path,
        output: &mut BufWriter<File>,
    ) -> Result<u64, BootstrapError> {
        let mut input = self
            .assets
            .open(name)
            .map_err(|source| BootstrapError::OpenAsset {
                name: name.to_string(),
                source,
            })?;
        io::copy(&mut input, output).map_err(|source| BootstrapError::CopyAsset {
            name: name.to_string(),
            path: target.to_path_buf(),
            source,
        })
    }
}

fn write_target<F>(target: &Path, copy: F) -> Result<u64, BootstrapError>
where
    F: FnOnce(&Path, &mut BufWriter<File>) -> Result<u64, BootstrapError>,
{
    let file = File::create(target).map_err(|source| BootstrapError::OpenTarget {
        path: target.to_path_buf(),
        source,
    })?;
    let mut output = BufWriter::new(file);
    let bytes = copy(target, &mut output)?;
    let flush_error = |source: io::Error| BootstrapError::Flush {
        path: target.to_path_buf(),
        source,
    };
    let file = output
        .into_inner()
        .map_err(|err| flush_error(err.into_error()))?;
    file.sync_all().map_err(flush_error)?;
    Ok(bytes)
}

/// True when `path` is a non-empty file SQLite can open read-only and query.
///
/// Any failure means "not a usable database", including a corrupt file.
fn database_is_readable(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_file() && metadata.len() > 0 => {}
        _ => return false,
    }
    let Ok(conn) = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    ) else {
        return false;
    };
    conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
        row.get::<_, i64>(0)
    })
    .is_ok()
}

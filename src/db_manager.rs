//! Versioned SQLite opening, first-open schema hooks, and the recent-city store.

use std::path::Path;

use log::debug;
use rusqlite::{params, Connection, OpenFlags};

/// First-open and upgrade callbacks run when a database is opened at a version.
pub trait SchemaHook: Send + Sync {
    fn on_create(&self, conn: &Connection) -> Result<(), rusqlite::Error>;

    fn on_upgrade(
        &self,
        conn: &Connection,
        old_version: u32,
        new_version: u32,
    ) -> Result<(), rusqlite::Error>;
}

/// Hooks for databases whose schema ships inside the bundled file.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSchema;

impl SchemaHook for NoSchema {
    fn on_create(&self, _conn: &Connection) -> Result<(), rusqlite::Error> {
        Ok(())
    }

    fn on_upgrade(
        &self,
        _conn: &Connection,
        _old_version: u32,
        _new_version: u32,
    ) -> Result<(), rusqlite::Error> {
        Ok(())
    }
}

/// Creates the `recentcity` table on first open.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecentCitySchema;

pub const RECENT_CITY_DDL: &str = "CREATE TABLE IF NOT EXISTS recentcity (id INTEGER PRIMARY KEY AUTOINCREMENT, name VARCHAR(40), date INTEGER)";

impl SchemaHook for RecentCitySchema {
    fn on_create(&self, conn: &Connection) -> Result<(), rusqlite::Error> {
        debug!("Creating recentcity table");
        conn.execute(RECENT_CITY_DDL, [])?;
        Ok(())
    }

    fn on_upgrade(
        &self,
        _conn: &Connection,
        _old_version: u32,
        _new_version: u32,
    ) -> Result<(), rusqlite::Error> {
        Ok(())
    }
}

/// Opens `path` read/write (creating it) and brings it to `version` through `hook`.
pub fn open_versioned(
    path: &Path,
    version: u32,
    hook: &dyn SchemaHook,
) -> Result<Connection, rusqlite::Error> {
    open_versioned_with_flags(path, OpenFlags::default(), version, hook)
}

/// [`open_versioned`] with explicit open flags; without `SQLITE_OPEN_CREATE`
/// a missing file is an error.
pub fn open_versioned_with_flags(
    path: &Path,
    flags: OpenFlags,
    version: u32,
    hook: &dyn SchemaHook,
) -> Result<Connection, rusqlite::Error> {
    let mut conn = Connection::open_with_flags(path, flags)?;
    apply_schema_version(&mut conn, version, hook)?;
    Ok(conn)
}

/// Runs the create/upgrade hook and stores `version` in one transaction.
///
/// A stored version of 0 means the database has never been opened by the
/// application. A stored version above `version` is left untouched.
pub fn apply_schema_version(
    conn: &mut Connection,
    version: u32,
    hook: &dyn SchemaHook,
) -> Result<(), rusqlite::Error> {
    let current: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if current >= version {
        if current > version {
            debug!(
                "Database version {} is newer than requested {}; leaving as is",
                current, version
            );
        }
        return Ok(());
    }

    let tx = conn.transaction()?;
    if current == 0 {
        hook.on_create(&tx)?;
    } else {
        debug!("Upgrading database schema from {} to {}", current, version);
        hook.on_upgrade(&tx, current, version)?;
    }
    tx.execute_batch(&format!("PRAGMA user_version = {}", version))?;
    tx.commit()
}

/// Recently chosen cities, newest first.
pub struct RecentCities {
    conn: Connection,
}

impl RecentCities {
    /// Opens the store; the parent directory must already exist.
    pub fn open(path: &Path, version: u32) -> Result<Self, rusqlite::Error> {
        let conn = open_versioned(path, version, &RecentCitySchema)?;
        Ok(Self { conn })
    }

    pub fn record(&self, name: &str, date: i64) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO recentcity (name, date) VALUES (?1, ?2)",
            params![name, date],
        )?;
        Ok(())
    }

    pub fn latest(&self, limit: usize) -> Result<Vec<String>, rusqlite::Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM recentcity ORDER BY date DESC, id DESC LIMIT ?1")?;
        let names = stmt.query_map(params![limit as i64], |row| row.get::<_, String>(0))?;

        let mut cities = Vec::new();
        for name in names {
            cities.push(name?);
        }
        Ok(cities)
    }
}

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::StoreError;
use crate::models::HistoryRecord;
use crate::store::HistoryStore;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS history (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    nav   TEXT NOT NULL,
    role  TEXT NOT NULL
);
";

pub fn open_db(path: &Path) -> Result<Connection, StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| StoreError::Unavailable {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let conn = Connection::open(path)?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

pub fn insert_record(conn: &Connection, record: &HistoryRecord) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO history (nav, role) VALUES (?1, ?2)",
        rusqlite::params![record.nav, record.role],
    )?;
    Ok(())
}

pub fn fetch_all_records(conn: &Connection) -> Result<Vec<HistoryRecord>, StoreError> {
    let mut stmt = conn.prepare("SELECT nav, role FROM history ORDER BY id ASC")?;
    let records = stmt
        .query_map([], |row| {
            Ok(HistoryRecord {
                nav: row.get(0)?,
                role: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

/// Historique dans une base SQLite : l'ajout insère une ligne sans réécrire les précédentes.
pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = open_db(path)?;
        migrate(&conn)?;
        Ok(Self { conn, path: path.to_path_buf() })
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        migrate(&conn)?;
        Ok(Self { conn, path: PathBuf::from(":memory:") })
    }
}

impl HistoryStore for SqliteStore {
    fn load(&self) -> Result<Vec<HistoryRecord>, StoreError> {
        fetch_all_records(&self.conn)
    }

    fn save(&mut self, records: &[HistoryRecord]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM history", [])?;
        for record in records {
            insert_record(&tx, record)?;
        }
        tx.commit()?;
        info!(rows = records.len(), path = ?self.path, "historique SQLite réécrit");
        Ok(())
    }

    fn append(&mut self, record: &HistoryRecord) -> Result<(), StoreError> {
        insert_record(&self.conn, record)?;
        info!(nav = %record.nav, role = %record.role, "ligne ajoutée (SQLite)");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }
}

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::db::SqliteStore;
use crate::error::StoreError;
use crate::models::HistoryRecord;

/// Source de vérité de l'historique (nav, role), injectée dans les commandes.
pub trait HistoryStore {
    fn load(&self) -> Result<Vec<HistoryRecord>, StoreError>;
    /// Remplace intégralement le contenu.
    fn save(&mut self, records: &[HistoryRecord]) -> Result<(), StoreError>;
    fn append(&mut self, record: &HistoryRecord) -> Result<(), StoreError>;
    fn describe(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Csv,
    Sqlite,
}

impl Backend {
    pub fn default_path(&self) -> PathBuf {
        let mut path = std::env::current_dir().unwrap_or_default();
        path.push("data");
        match self {
            Backend::Csv => path.push("granbelm_history.csv"),
            Backend::Sqlite => path.push("granbelm.db"),
        }
        path
    }
}

pub fn open_store(backend: Backend, path: &Path) -> Result<Box<dyn HistoryStore>, StoreError> {
    debug!(?backend, ?path, "ouverture du stockage");
    Ok(match backend {
        Backend::Csv => Box::new(CsvStore::new(path)),
        Backend::Sqlite => Box::new(SqliteStore::open(path)?),
    })
}

/// Fichier CSV à deux colonnes `nav,role`, réécrit en entier à chaque sauvegarde.
/// L'ajout écrit seulement la nouvelle ligne.
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: &Path) -> Self {
        Self { path: path.to_path_buf() }
    }

    fn csv_error(&self, source: csv::Error) -> StoreError {
        StoreError::Csv { path: self.path.clone(), source }
    }
}

impl HistoryStore for CsvStore {
    fn load(&self) -> Result<Vec<HistoryRecord>, StoreError> {
        if !self.path.exists() {
            debug!(path = ?self.path, "fichier absent, historique vide");
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| self.csv_error(e))?;
        reader
            .deserialize::<HistoryRecord>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| self.csv_error(e))
    }

    fn save(&mut self, records: &[HistoryRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Unavailable {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let mut writer = csv::Writer::from_path(&self.path).map_err(|e| self.csv_error(e))?;
        // En-tête écrit explicitement pour qu'une table vide garde ses colonnes
        writer.write_record(["nav", "role"]).map_err(|e| self.csv_error(e))?;
        for record in records {
            writer
                .write_record([record.nav.as_str(), record.role.as_str()])
                .map_err(|e| self.csv_error(e))?;
        }
        writer.flush().map_err(|source| StoreError::Unavailable {
            path: self.path.clone(),
            source,
        })?;
        info!(rows = records.len(), path = ?self.path, "historique CSV réécrit");
        Ok(())
    }

    /// Ajoute une ligne en fin de fichier sans relire ni réécrire l'existant.
    fn append(&mut self, record: &HistoryRecord) -> Result<(), StoreError> {
        let unavailable = |source| StoreError::Unavailable { path: self.path.clone(), source };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Unavailable {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(unavailable)?;

        let len = file.metadata().map_err(unavailable)?.len();
        let needs_newline = if len > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1)).map_err(unavailable)?;
            file.read_exact(&mut last).map_err(unavailable)?;
            last[0] != b'\n'
        } else {
            false
        };
        if needs_newline {
            file.write_all(b"\n").map_err(unavailable)?;
        }

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if len == 0 {
            writer.write_record(["nav", "role"]).map_err(|e| self.csv_error(e))?;
        }
        writer
            .write_record([record.nav.as_str(), record.role.as_str()])
            .map_err(|e| self.csv_error(e))?;
        writer.flush().map_err(unavailable)?;
        info!(nav = %record.nav, role = %record.role, path = ?self.path, "ligne ajoutée (CSV)");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }
}

/// Stockage en mémoire, pour les tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<HistoryRecord>,
}

impl MemoryStore {
    pub fn new(records: Vec<HistoryRecord>) -> Self {
        Self { records }
    }
}

impl HistoryStore for MemoryStore {
    fn load(&self) -> Result<Vec<HistoryRecord>, StoreError> {
        Ok(self.records.clone())
    }

    fn save(&mut self, records: &[HistoryRecord]) -> Result<(), StoreError> {
        self.records = records.to_vec();
        Ok(())
    }

    fn append(&mut self, record: &HistoryRecord) -> Result<(), StoreError> {
        self.records.push(record.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Code, Outcome};

    fn sample() -> Vec<HistoryRecord> {
        vec![
            HistoryRecord::new(Code::ALL[0], Outcome::Bonus),
            HistoryRecord::new(Code::ALL[5], Outcome::Bell),
            HistoryRecord::new(Code::ALL[2], Outcome::Replay),
        ]
    }

    #[test]
    fn test_csv_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(&dir.path().join("absent.csv"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_csv_round_trip_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvStore::new(&dir.path().join("data").join("history.csv"));
        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), sample());
    }

    #[test]
    fn test_csv_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let mut store = CsvStore::new(&path);
        store.save(&sample()[..1]).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "nav,role\n123,魔力目\n");
    }

    #[test]
    fn test_csv_empty_table_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let mut store = CsvStore::new(&path);
        store.save(&sample()).unwrap();
        store.save(&[]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "nav,role\n");
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_csv_append() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvStore::new(&dir.path().join("history.csv"));
        for record in sample() {
            store.append(&record).unwrap();
        }
        assert_eq!(store.load().unwrap(), sample());
    }

    #[test]
    fn test_csv_append_onto_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        std::fs::write(&path, "nav,role\n123,魔力目,extra\n").unwrap();
        let mut store = CsvStore::new(&path);
        assert!(store.load().is_err());

        store.append(&sample()[1]).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "nav,role\n123,魔力目,extra\n321,ベル\n"
        );
    }

    #[test]
    fn test_csv_append_after_missing_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        std::fs::write(&path, "nav,role\n123,魔力目").unwrap();
        let mut store = CsvStore::new(&path);
        store.append(&sample()[1]).unwrap();
        assert_eq!(store.load().unwrap(), sample()[..2].to_vec());
    }

    #[test]
    fn test_csv_append_on_empty_file_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        std::fs::write(&path, "").unwrap();
        let mut store = CsvStore::new(&path);
        store.append(&sample()[0]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "nav,role\n123,魔力目\n");
    }

    #[test]
    fn test_csv_preserves_malformed_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        std::fs::write(&path, "nav,role\n12,魔力目\n321,ベル\n").unwrap();
        let records = CsvStore::new(&path).load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].nav, "12");
        assert_eq!(records[0].code(), None);
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::default();
        store.append(&sample()[0]).unwrap();
        assert_eq!(store.load().unwrap().len(), 1);
        store.save(&[]).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_open_store_backends() {
        let dir = tempfile::tempdir().unwrap();
        let csv = open_store(Backend::Csv, &dir.path().join("h.csv")).unwrap();
        assert!(csv.describe().starts_with("csv:"));
        let sqlite = open_store(Backend::Sqlite, &dir.path().join("h.db")).unwrap();
        assert!(sqlite.describe().starts_with("sqlite:"));
    }
}

use std::io::Read;
use std::path::{Path, PathBuf};

use granbelm_db::error::StoreError;
use granbelm_db::models::{Code, HistoryRecord, Outcome};
use granbelm_db::store::HistoryStore;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("colonne obligatoire absente : '{0}'")]
    MissingColumn(&'static str),

    #[error("impossible de lire {path:?} : {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Default, PartialEq)]
pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub errors: u32,
}

fn parse_record(record: &csv::StringRecord, nav_idx: usize, role_idx: usize) -> Option<HistoryRecord> {
    let code: Code = record.get(nav_idx)?.parse().ok()?;
    let outcome: Outcome = record.get(role_idx)?.parse().ok()?;
    Some(HistoryRecord::new(code, outcome))
}

/// Lit un CSV avec au moins les colonnes `nav` et `role` (ordre libre).
/// Les lignes invalides sont comptées puis ignorées.
pub fn parse_csv<R: Read>(input: R, path: &Path) -> Result<(Vec<HistoryRecord>, ImportResult), ImportError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    let read_error = |source| ImportError::Read { path: path.to_path_buf(), source };

    let headers = reader.headers().map_err(read_error)?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or(ImportError::MissingColumn(name))
    };
    let nav_idx = column("nav")?;
    let role_idx = column("role")?;

    let mut records = Vec::new();
    let mut result = ImportResult::default();

    for record_result in reader.records() {
        result.total_records += 1;
        match record_result {
            Ok(record) => match parse_record(&record, nav_idx, role_idx) {
                Some(parsed) => {
                    records.push(parsed);
                    result.inserted += 1;
                }
                None => {
                    warn!(line = result.total_records, "ligne ignorée : nav ou rôle invalide");
                    result.errors += 1;
                }
            },
            Err(e) => {
                warn!(line = result.total_records, "ligne illisible : {e}");
                result.errors += 1;
            }
        }
    }

    Ok((records, result))
}

/// Ajoute les lignes valides à l'historique existant, en une seule sauvegarde.
/// En cas d'erreur, le stockage n'est pas modifié.
pub fn import_csv(store: &mut dyn HistoryStore, path: &Path) -> Result<ImportResult, ImportError> {
    let file = std::fs::File::open(path).map_err(|e| ImportError::Read {
        path: path.to_path_buf(),
        source: csv::Error::from(e),
    })?;
    let (records, result) = parse_csv(file, path)?;

    let mut history = store.load()?;
    history.extend(records);
    store.save(&history)?;
    Ok(result)
}
